use tracing::info;

use super::parse_body;
use crate::api::{MenuItemPatch, NewMenuItem};
use crate::auth::{authenticate, require_admin};
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::models::Category;
use crate::routes::{params, HttpParams};
use crate::state::AppState;

fn item_id(params: &HttpParams) -> Result<&str> {
    params
        .get(params::ITEM_ID)
        .map(String::as_str)
        .ok_or_else(|| Error::BadRequest("Menu item id is required".to_string()))
}

fn check_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::BadRequest(format!("Menu item {} cannot be empty", field)));
    }
    Ok(value.to_string())
}

fn check_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::BadRequest(
            "Menu item price must be a non-negative number".to_string(),
        ));
    }
    Ok(price)
}

/// List the menu, optionally restricted to the `category` query parameter
pub fn list_menu(request: Request, _: HttpParams, state: &AppState) -> Result<Response> {
    let category = request
        .query()
        .get("category")
        .filter(|category| !category.is_empty())
        .map(|category| category.parse::<Category>())
        .transpose()?;

    let items = state.menu.list(category)?;
    if items.is_empty() {
        return Err(Error::NotFound("No menu items found at this time".to_string()));
    }

    Response::json(200, items, "Menu fetched successfully")
}

pub fn get_menu_item(_: Request, params: HttpParams, state: &AppState) -> Result<Response> {
    let item = state
        .menu
        .get(item_id(&params)?)?
        .ok_or_else(|| Error::NotFound("Menu item not found".to_string()))?;

    Response::json(200, item, "Menu item fetched successfully")
}

pub fn add_menu_item(request: Request, _: HttpParams, state: &AppState) -> Result<Response> {
    let user = authenticate(&request, state)?;
    require_admin(&user)?;

    let body: NewMenuItem = parse_body(&request)?;
    let item = NewMenuItem {
        name: check_text("name", &body.name)?,
        description: check_text("description", &body.description)?,
        category: body.category,
        price: check_price(body.price)?,
    };

    let item = state.menu.insert(item)?;
    info!(item_id = %item.id, admin_id = user.id, "Menu item added");

    Response::json(201, item, "Menu item added successfully")
}

/// Apply a partial update to a menu item, fields absent from the body stay as they are
pub fn update_menu_item(request: Request, params: HttpParams, state: &AppState) -> Result<Response> {
    let user = authenticate(&request, state)?;
    require_admin(&user)?;

    let body: MenuItemPatch = parse_body(&request)?;
    let patch = MenuItemPatch {
        name: body.name.as_deref().map(|name| check_text("name", name)).transpose()?,
        description: body
            .description
            .as_deref()
            .map(|description| check_text("description", description))
            .transpose()?,
        category: body.category,
        price: body.price.map(check_price).transpose()?,
    };

    let id = item_id(&params)?;
    let item = state
        .menu
        .update(id, patch)?
        .ok_or_else(|| Error::NotFound("Menu item not found".to_string()))?;
    info!(item_id = %item.id, admin_id = user.id, "Menu item updated");

    Response::json(200, item, "Menu item updated successfully")
}
