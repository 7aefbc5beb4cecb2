use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use crate::database::AccountStore;
use crate::errors::{Error, Result};
use crate::models::{NewUser, Order, OrderItem, Role, User};

/// Contains the SQL queries used to interact with the database
pub mod sql_queries {
    pub const CREATE_TABLES: &str = "
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'CUSTOMER',
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            items TEXT NOT NULL,
            total_price REAL NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS orders_by_user ON orders (user_id, created_at);";

    pub const INSERT_USER: &str =
        "INSERT INTO users (name, phone, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";
    pub const SELECT_USER_BY_ID: &str =
        "SELECT id, name, phone, password, role, created_at FROM users WHERE id = ?1";
    pub const SELECT_USER_BY_PHONE: &str =
        "SELECT id, name, phone, password, role, created_at FROM users WHERE phone = ?1";

    pub const INSERT_ORDER: &str =
        "INSERT INTO orders (user_id, items, total_price, created_at) VALUES (?1, ?2, ?3, ?4)";
    pub const SELECT_ORDERS_BY_USER: &str = "SELECT id, user_id, items, total_price, created_at \
         FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC";
}

/// Users and orders kept in SQLite
pub struct SqliteAccountStore {
    conn: Mutex<Connection>,
}

impl SqliteAccountStore {
    /// Open (and create if needed) the database stored at `path`
    pub fn open(path: &str) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create a new empty database living in memory
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(sql_queries::CREATE_TABLES)?;
        Ok(SqliteAccountStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        password_hash: row.get(3)?,
        // Only values written by this store end up here
        role: role.parse().unwrap_or_default(),
        created_at: row.get(5)?,
    })
}

fn find_user(conn: &Connection, query: &str, key: impl rusqlite::ToSql) -> Result<Option<User>> {
    Ok(conn
        .query_row(query, params![key], user_from_row)
        .optional()?)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl AccountStore for SqliteAccountStore {
    fn create_user(&self, user: NewUser) -> Result<User> {
        let conn = self.conn()?;
        let conflict = || Error::Conflict("User with phone number already exists".to_string());

        if find_user(&conn, sql_queries::SELECT_USER_BY_PHONE, &user.phone)?.is_some() {
            return Err(conflict());
        }

        let created_at = Utc::now();
        conn.execute(
            sql_queries::INSERT_USER,
            params![
                user.name,
                user.phone,
                user.password_hash,
                user.role.as_str(),
                created_at
            ],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                conflict()
            } else {
                err.into()
            }
        })?;

        let id = conn.last_insert_rowid();
        debug!(user_id = id, "User row inserted");
        Ok(User {
            id,
            name: user.name,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            created_at,
        })
    }

    fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        find_user(&conn, sql_queries::SELECT_USER_BY_ID, id)
    }

    fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        find_user(&conn, sql_queries::SELECT_USER_BY_PHONE, phone)
    }

    fn create_order(&self, user_id: i64, items: Vec<OrderItem>, total_price: f64) -> Result<Order> {
        let conn = self.conn()?;
        let created_at = Utc::now();
        conn.execute(
            sql_queries::INSERT_ORDER,
            params![user_id, serde_json::to_string(&items)?, total_price, created_at],
        )?;

        Ok(Order {
            id: conn.last_insert_rowid(),
            user_id,
            items,
            total_price,
            created_at,
        })
    }

    fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql_queries::SELECT_ORDERS_BY_USER)?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, DateTime<Utc>>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, user_id, items, total_price, created_at)| -> Result<Order> {
                Ok(Order {
                    id,
                    user_id,
                    items: serde_json::from_str(&items)?,
                    total_price,
                    created_at,
                })
            })
            .collect()
    }
}
