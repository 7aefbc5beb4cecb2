use crate::api::{MenuItemPatch, NewMenuItem};
use crate::errors::Result;
use crate::models::{Category, MenuItem, NewUser, Order, OrderItem, User};

pub mod accounts;
pub mod menu;

pub use accounts::SqliteAccountStore;
pub use menu::DocumentMenuStore;

/// Trait hiding the menu storage.
///
/// Menu items are independent documents, nothing else references them by key.
pub trait MenuStore: Send + Sync {
    /// Every item, optionally restricted to one category, in insertion order
    fn list(&self, category: Option<Category>) -> Result<Vec<MenuItem>>;

    /// Retrieve a single item, None if there is no item with this id
    fn get(&self, id: &str) -> Result<Option<MenuItem>>;

    /// Store a new item, assigning its id and timestamps
    fn insert(&self, item: NewMenuItem) -> Result<MenuItem>;

    /// Apply the present fields of `patch` to an item and bump its update time.
    ///
    /// Returns None if there is no item with this id
    fn update(&self, id: &str, patch: MenuItemPatch) -> Result<Option<MenuItem>>;
}

/// Trait hiding the relational storage of users and their orders
pub trait AccountStore: Send + Sync {
    /// Insert a new user.
    ///
    /// Should return a Conflict error if the phone number is already registered
    fn create_user(&self, user: NewUser) -> Result<User>;

    fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>>;

    /// Persist an order for the given user. The total is stored as given, computing it is the
    /// caller's job.
    fn create_order(&self, user_id: i64, items: Vec<OrderItem>, total_price: f64) -> Result<Order>;

    /// Every order of a user, newest first
    fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>>;
}
