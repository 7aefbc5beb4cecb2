use std::process::ExitCode;

use common::api::{LoginRequest, RegisterRequest};
use common::cart::Cart;
use common::cli::{parse_cli_args, Action};
use common::errors::{Error, Result};
use common::http::{code_to_string, HttpClient, Response};
use common::models::MenuItem;
use common::routes;

/// Client talking to the API, one connection per request
struct ApiClient {
    target: String,
    cookie: String,
}

impl ApiClient {
    fn new(target: String) -> Self {
        let cookie = [("accessToken", "ACCESS_TOKEN"), ("refreshToken", "REFRESH_TOKEN")]
            .iter()
            .filter_map(|(cookie, var)| {
                std::env::var(var)
                    .ok()
                    .filter(|token| !token.is_empty())
                    .map(|token| format!("{}={}", cookie, token))
            })
            .collect::<Vec<_>>()
            .join("; ");
        ApiClient { target, cookie }
    }

    fn send(&self, method: &str, endpoint: &str, body: &str) -> Result<Response> {
        let mut client = HttpClient::new(&self.target)?;
        let headers: Vec<(&str, &str)> = if self.cookie.is_empty() {
            Vec::new()
        } else {
            vec![("Cookie", self.cookie.as_str())]
        };
        client.send(method, endpoint, &headers, body)
    }
}

fn print_response(response: &Response) {
    match response.status {
        Some(code) => println!("Response Status: {} - {}", code, code_to_string(code)),
        None => println!("No status in response"),
    }
    for cookie in response.header_values("Set-Cookie") {
        println!("Set-Cookie: {}", cookie);
    }
    if !response.body.is_empty() {
        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(json) => match serde_json::to_string_pretty(&json) {
                Ok(pretty) => println!("{}", pretty),
                Err(_) => println!("{}", response.body),
            },
            Err(e) => println!("Error parsing response body: {}\n{:?}", e, response.body),
        }
    }
}

/// Fetch a menu item, to snapshot it into the cart
fn fetch_item(api: &ApiClient, id: &str) -> Result<MenuItem> {
    let response = api.send("GET", &routes::menu_item(id), "")?;
    if response.status != Some(200) {
        print_response(&response);
        return Err(Error::NotFound(format!("Menu item '{}' is not available", id)));
    }
    let envelope: common::api::ApiResponse<MenuItem> = serde_json::from_str(&response.body)?;
    Ok(envelope.data)
}

fn run() -> Result<()> {
    let options = parse_cli_args(std::env::args())?;
    let api = ApiClient::new(options.target);

    let response = match options.action {
        Action::Register {
            name,
            phone,
            password,
            role,
        } => {
            let body = RegisterRequest {
                name: Some(name),
                phone: Some(phone),
                password: Some(password),
                role,
            };
            api.send("POST", routes::paths::REGISTER, &serde_json::to_string(&body)?)?
        }
        Action::Login { phone, password } => {
            let body = LoginRequest {
                phone: Some(phone),
                password: Some(password),
            };
            api.send("POST", routes::paths::LOGIN, &serde_json::to_string(&body)?)?
        }
        Action::Refresh => api.send("POST", routes::paths::REFRESH, "")?,
        Action::Menu { category } => {
            let category = category.map(|category| category.as_str());
            api.send("GET", &routes::menu_listing(category), "")?
        }
        Action::Item { id } => api.send("GET", &routes::menu_item(&id), "")?,
        Action::Add(item) => {
            api.send("POST", routes::paths::MENU_ADD, &serde_json::to_string(&item)?)?
        }
        Action::Order(lines) => {
            let mut cart = Cart::new();
            for (id, quantity) in lines {
                let item = fetch_item(&api, &id)?;
                cart.add(&item);
                for _ in 1..quantity {
                    cart.increment(&item.id);
                }
            }
            for line in cart.items() {
                println!(
                    "{} x{} @ {:.2} = {:.2}",
                    line.name,
                    line.quantity,
                    line.price,
                    line.line_total()
                );
            }
            println!("Cart total: {:.2}", cart.total());

            let body = serde_json::to_string(&cart.to_order())?;
            api.send("POST", routes::paths::ORDERS, &body)?
        }
        Action::History => api.send("GET", routes::paths::ORDERS, "")?,
    };

    print_response(&response);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
