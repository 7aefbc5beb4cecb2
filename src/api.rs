// This file contains the basic types used to communicate through the API
use serde::{Deserialize, Serialize};

use crate::models::{Category, OrderItem, PublicUser};

/// Envelope wrapping every successful response
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, data: T, message: &str) -> Self {
        ApiResponse {
            status_code,
            data,
            message: message.to_string(),
            success: true,
        }
    }
}

/// Envelope of every error response
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
}

/// Body of a registration request.
///
/// Fields are optional so that a missing one is reported as a validation error instead of a
/// JSON parsing error.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    /// `ADMIN` or `CUSTOMER`, defaults to `CUSTOMER`
    pub role: Option<String>,
}

/// Body of a login request
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Body of a refresh request, used when the refresh cookie isn't available
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Returned by register, login and refresh
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a new menu item request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewMenuItem {
    pub name: String,
    #[serde(alias = "desc")]
    pub description: String,
    pub category: Category,
    pub price: f64,
}

/// Body of a menu item update. Absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<f64>,
}

/// Body of new order request
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Cart content at checkout
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    /// Total computed by the client. Never trusted, the server always recomputes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}
