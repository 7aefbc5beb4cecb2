//! Domain records shared by the stores, the endpoints and the client.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Permission level of a user
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "CUSTOMER" => Ok(Role::Customer),
            _ => Err(Error::BadRequest("Invalid role provided".to_string())),
        }
    }
}

/// A registered user, as stored. Holds the password hash and must never be serialized
/// back to a client, use [`PublicUser`] for that.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub phone: String,
    /// argon2id PHC string
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
}

/// A user with every sensitive field stripped
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name.clone(),
            phone: user.phone.clone(),
            role: user.role,
        }
    }
}

/// Section of the menu an item belongs to
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Starter,
    MainCourse,
    Dessert,
    Drinks,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Starter,
        Category::MainCourse,
        Category::Dessert,
        Category::Drinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Starter => "starter",
            Category::MainCourse => "main-course",
            Category::Dessert => "dessert",
            Category::Drinks => "drinks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| Error::BadRequest(format!("Invalid category '{}'", s)))
    }
}

/// An entry of the menu
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Unique ID, given by the server on creation
    pub id: String,
    pub name: String,
    #[serde(alias = "desc")]
    pub description: String,
    pub category: Category,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a menu item inside an order.
///
/// Prices are copied at checkout time so later menu updates don't rewrite history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderItem {
    /// ID of the menu item this line refers to
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub category: Category,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Sum of unit price times quantity over every line
pub fn order_total(items: &[OrderItem]) -> f64 {
    items.iter().map(OrderItem::line_total).sum()
}

/// A placed order, as returned by the API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}
