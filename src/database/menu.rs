use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::api::{MenuItemPatch, NewMenuItem};
use crate::database::MenuStore;
use crate::errors::{Error, Result};
use crate::models::{Category, MenuItem};

/// Contains the SQL queries used to interact with the database
pub mod sql_queries {
    pub const CREATE_COLLECTION: &str =
        "CREATE TABLE IF NOT EXISTS menu_items (id TEXT PRIMARY KEY, document TEXT NOT NULL)";

    pub const INSERT_DOCUMENT: &str = "INSERT INTO menu_items (id, document) VALUES (?1, ?2)";
    pub const REPLACE_DOCUMENT: &str = "UPDATE menu_items SET document = ?2 WHERE id = ?1";
    pub const SELECT_DOCUMENT: &str = "SELECT document FROM menu_items WHERE id = ?1";
    pub const SELECT_DOCUMENTS: &str = "SELECT document FROM menu_items \
         WHERE ?1 IS NULL OR json_extract(document, '$.category') = ?1 ORDER BY rowid";
}

/// Menu items stored as JSON documents, one per row, in their own SQLite file.
pub struct DocumentMenuStore {
    conn: Mutex<Connection>,
}

impl DocumentMenuStore {
    /// Open (and create if needed) the collection stored at `path`
    pub fn open(path: &str) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create a new empty collection living in memory
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(sql_queries::CREATE_COLLECTION, [])?;
        Ok(DocumentMenuStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }
}

fn fetch(conn: &Connection, id: &str) -> Result<Option<MenuItem>> {
    let document: Option<String> = conn
        .query_row(sql_queries::SELECT_DOCUMENT, params![id], |row| row.get(0))
        .optional()?;
    Ok(document
        .map(|document| serde_json::from_str(&document))
        .transpose()?)
}

impl MenuStore for DocumentMenuStore {
    fn list(&self, category: Option<Category>) -> Result<Vec<MenuItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql_queries::SELECT_DOCUMENTS)?;
        let documents = stmt
            .query_map(params![category.map(|c| c.as_str())], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        documents
            .iter()
            .map(|document| serde_json::from_str(document).map_err(Error::from))
            .collect()
    }

    fn get(&self, id: &str) -> Result<Option<MenuItem>> {
        let conn = self.conn()?;
        fetch(&conn, id)
    }

    fn insert(&self, item: NewMenuItem) -> Result<MenuItem> {
        let now = Utc::now();
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            name: item.name,
            description: item.description,
            category: item.category,
            price: item.price,
            created_at: now,
            updated_at: now,
        };

        self.conn()?.execute(
            sql_queries::INSERT_DOCUMENT,
            params![item.id, serde_json::to_string(&item)?],
        )?;
        Ok(item)
    }

    fn update(&self, id: &str, patch: MenuItemPatch) -> Result<Option<MenuItem>> {
        let conn = self.conn()?;
        let Some(mut item) = fetch(&conn, id)? else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        item.updated_at = Utc::now();

        conn.execute(
            sql_queries::REPLACE_DOCUMENT,
            params![item.id, serde_json::to_string(&item)?],
        )?;
        Ok(Some(item))
    }
}
