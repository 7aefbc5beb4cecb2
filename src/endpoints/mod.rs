use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::routes::*;
use crate::state::AppState;

mod menu;
mod order;
mod user;

/// Build the router serving the whole API
pub fn create_http_router() -> Result<HttpRouter> {
    let mut router = HttpRouter::new()?;

    router.add_route("POST", endpoints::REGISTER, user::register);
    router.add_route("POST", endpoints::LOGIN, user::login);
    router.add_route("POST", endpoints::REFRESH, user::refresh);

    router.add_route("GET", endpoints::MENU, menu::list_menu);
    router.add_route("GET", endpoints::MENU_ITEM, menu::get_menu_item);
    router.add_route("POST", endpoints::MENU_ADD, menu::add_menu_item);
    router.add_route("PUT", endpoints::MENU_UPDATE, menu::update_menu_item);

    router.add_route("POST", endpoints::ORDERS, order::create_order);
    router.add_route("GET", endpoints::ORDERS, order::list_orders);

    Ok(router)
}

/// Route a request and turn whatever comes out into a response for the client
pub fn dispatch(router: &HttpRouter, state: &AppState, request: Request) -> Response {
    let method = request.method.clone();
    let path = request.route_path().to_string();

    let response = match router.route(request, state) {
        Ok(response) => response,
        Err(err) => {
            match err.status_code() {
                500 => error!(%method, %path, error = %err, "Request failed"),
                code => warn!(%method, %path, code, error = %err, "Request rejected"),
            }
            Response::from_error(&err)
        }
    };
    debug!(%method, %path, status = response.status.unwrap_or(500), "Request handled");

    response
        .with_header("Access-Control-Allow-Origin", &state.config.cors_origin)
        .with_header("Access-Control-Allow-Credentials", "true")
}

/// Deserialize a JSON request body, reporting failures as a bad request
fn parse_body<T: DeserializeOwned>(request: &Request) -> Result<T> {
    let body = if request.body.trim().is_empty() {
        "{}"
    } else {
        request.body.as_str()
    };
    serde_json::from_str(body).map_err(|err| Error::BadRequest(format!("Invalid request body: {}", err)))
}

/// Trimmed value of a required text field, None if absent or blank
fn required(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
