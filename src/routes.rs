use std::collections::HashMap;

use matchit::Router;

use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::state::AppState;

/// Utility macro generating a constant for the HTTP endpoint, and associate it with
/// an identifier. Matchit requires both
macro_rules! make_paths {
    ($($name:ident: $path:expr,)*) => {
        pub mod paths {
            $(
                pub const $name: &str = concat!("/api/v1", $path);
            )*
        }
        pub mod endpoints {
            $(
                pub const $name: &str = stringify!($name);
            )*
        }

        /// Every known route, used to build the matchit router
        const ALL_ROUTES: &[(&str, &str)] = &[$((paths::$name, endpoints::$name),)*];
    };
}

make_paths! {
    REGISTER: "/user/register",
    LOGIN: "/user/login",
    REFRESH: "/user/refresh",
    MENU: "/menu",
    MENU_ITEM: "/menu/{item_id}",
    MENU_ADD: "/menu/add",
    MENU_UPDATE: "/menu/update/{item_id}",
    ORDERS: "/order/orders",
}

/// Names of the parameters in the HTTP paths, used to extract them
/// from the parameters inside of request handling
pub mod params {
    /// Key of menu item ids in HTTP paths
    pub const ITEM_ID: &str = "item_id";
}

/// Return the HTTP path of a menu item based on its id
pub fn menu_item(item_id: &str) -> String {
    paths::MENU_ITEM.replace("{item_id}", item_id)
}

/// Return the HTTP path updating a menu item
pub fn menu_update(item_id: &str) -> String {
    paths::MENU_UPDATE.replace("{item_id}", item_id)
}

/// Return the menu listing path, filtered by category when one is given
pub fn menu_listing(category: Option<&str>) -> String {
    match category {
        Some(category) => format!("{}?category={}", paths::MENU, category),
        None => paths::MENU.to_string(),
    }
}

/// Create a new router with the paths defined in this module
///
/// Errors from this functions are programming errors, most likely steming from a
/// misuse of matchit
fn new_router() -> Result<Router<&'static str>> {
    let mut router = Router::new();
    for (path, endpoint) in ALL_ROUTES {
        router.insert(*path, *endpoint)?;
    }
    Ok(router)
}

/// Type of the object containing the HTTP path parameters passed to handlers
pub type HttpParams = HashMap<String, String>;
/// Type of the function that handles HTTP requests
pub type HttpHandler = fn(Request, HttpParams, &AppState) -> Result<Response>;

/// The router is in charge of taking in raw HTTP requests and to dispatch them to
/// the appropriate handler function.
pub struct HttpRouter {
    routes: Router<&'static str>,
    handlers: HashMap<&'static str, HashMap<&'static str, HttpHandler>>,
}

impl HttpRouter {
    /// Creates a new empty router
    ///
    /// Although the matchit router is not empty, there are no methods associated
    /// to the routes yet, so no request can be processed
    /// Errors in this function are programming errors.
    pub fn new() -> Result<Self> {
        let routes = new_router()?;
        Ok(HttpRouter {
            routes,
            handlers: HashMap::new(),
        })
    }

    /// Add a new route to the router
    pub fn add_route(&mut self, method: &'static str, route: &'static str, handler: HttpHandler) {
        let method_to_handler = self.handlers.entry(route).or_default();
        method_to_handler.insert(method, handler);
    }

    /// Sends a request to the appropriate handler if it exists
    ///
    /// If there is a route matching the request, its handler will be called and the result of the
    /// function will be the result of the handler. If no route is defined for this request,
    /// return Error::NotFound
    ///
    /// Checking that all parameters are presents and that the body is correct is the
    /// responsibility of the handler
    pub fn route(&self, request: Request, state: &AppState) -> Result<Response> {
        let route = self
            .routes
            .at(request.route_path())
            .map_err(|_| Error::NotFound(format!("Cannot {} {}", request.method, request.route_path())))?;
        let handler = self
            .handlers
            .get(route.value)
            .and_then(|method_to_handler| method_to_handler.get(request.method.as_str()))
            .ok_or_else(|| {
                Error::NotFound(format!("Cannot {} {}", request.method, request.route_path()))
            })?;

        let params: HttpParams = route
            .params
            .iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        handler(request, params, state)
    }
}

/// Utility to create easily hashmaps of parameters for testing
#[cfg(test)]
macro_rules! make_params {
    () => {
        std::collections::HashMap::new()
    };
    ($name:ident: $value:expr $(, $name2:ident: $value2:expr)* ) => {
        {
            let mut map = std::collections::HashMap::new();
            map.insert(params::$name.to_string(), $value.to_string());
            $(
                map.insert(params::$name2.to_string(), $value2.to_string());
            )*
            map
        }
    }
}

#[cfg(test)]
pub(crate) use make_params;
