use regex::Regex;
use thiserror::Error;

use crate::api::NewMenuItem;
use crate::models::Category;

/// Default address for both the client and the server
///
/// This is a convenience value to avoid having to provide an
/// address everytime the client or server is started. The server reads `SERVER_ADDRESS`
/// to override it.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9898";

/// Errors that can occur when parsing the command line arguments
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CLIError {
    #[error("Invalid target format. Should be <host>:<port>")]
    InvalidUrlFormat,
    #[error("Missing parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("Invalid parameter '{0}'")]
    InvalidParameter(String),
    #[error("Unknown action '{0}'")]
    UnknownAction(String),
}

/// Validate the format of the TCP address provided by the user
///
/// Returns its input if the address is in the format <host>:<port>, otherwise InvalidUrlFormat
pub fn validate_address(url: &str) -> std::result::Result<&str, CLIError> {
    let re = Regex::new(r"^[a-zA-Z0-9\.\-]+:\d{1,5}$").map_err(|_| CLIError::InvalidUrlFormat)?;
    if re.is_match(url) {
        Ok(url)
    } else {
        Err(CLIError::InvalidUrlFormat)
    }
}

/// What the client was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Register {
        name: String,
        phone: String,
        password: String,
        role: Option<String>,
    },
    Login {
        phone: String,
        password: String,
    },
    Refresh,
    Menu {
        category: Option<Category>,
    },
    Item {
        id: String,
    },
    Add(NewMenuItem),
    /// Menu item ids with the quantity wanted for each
    Order(Vec<(String, u32)>),
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CLIOptions {
    pub target: String,
    pub action: Action,
}

/// Split an `id[:qty]` order argument. The quantity defaults to 1.
pub fn parse_order_line(arg: &str) -> std::result::Result<(String, u32), CLIError> {
    let invalid = || CLIError::InvalidParameter(arg.to_string());
    let (id, quantity) = match arg.split_once(':') {
        Some((id, quantity)) => (id, quantity.parse::<u32>().map_err(|_| invalid())?),
        None => (arg, 1),
    };
    if id.is_empty() || quantity == 0 {
        return Err(invalid());
    }
    Ok((id.to_string(), quantity))
}

fn parse_action<I>(action: &str, mut args: I) -> std::result::Result<Action, CLIError>
where
    I: Iterator<Item = String>,
{
    let mut next = |name: &'static str| args.next().ok_or(CLIError::MissingParameter(name));

    let action = match action.to_ascii_lowercase().as_str() {
        "register" => Action::Register {
            name: next("name")?,
            phone: next("phone")?,
            password: next("password")?,
            role: next("role").ok(),
        },
        "login" => Action::Login {
            phone: next("phone")?,
            password: next("password")?,
        },
        "refresh" => Action::Refresh,
        "menu" => Action::Menu {
            category: next("category")
                .ok()
                .map(|category| {
                    category
                        .parse::<Category>()
                        .map_err(|_| CLIError::InvalidParameter(category))
                })
                .transpose()?,
        },
        "item" => Action::Item { id: next("id")? },
        "add" => {
            let name = next("name")?;
            let category = next("category")?;
            let category = category
                .parse::<Category>()
                .map_err(|_| CLIError::InvalidParameter(category))?;
            let price = next("price")?;
            let price = price
                .parse::<f64>()
                .map_err(|_| CLIError::InvalidParameter(price))?;
            let description = std::iter::from_fn(|| next("description").ok())
                .collect::<Vec<_>>()
                .join(" ");
            if description.is_empty() {
                return Err(CLIError::MissingParameter("description"));
            }
            Action::Add(NewMenuItem {
                name,
                description,
                category,
                price,
            })
        }
        "order" => {
            let lines = std::iter::from_fn(|| next("item").ok())
                .map(|arg| parse_order_line(&arg))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if lines.is_empty() {
                return Err(CLIError::MissingParameter("item"));
            }
            Action::Order(lines)
        }
        "history" => Action::History,
        other => return Err(CLIError::UnknownAction(other.to_string())),
    };
    Ok(action)
}

/// Parse `client [<host>:<port>] <action> [args]`
///
/// The first item of `args` is the program name.
pub fn parse_cli_args<I>(mut args: I) -> std::result::Result<CLIOptions, CLIError>
where
    I: Iterator<Item = String>,
{
    args.next(); // Skip the program name
    let maybe_target = args
        .next()
        .ok_or(CLIError::MissingParameter("target or action"))?;

    let (target, action) = match validate_address(&maybe_target) {
        Ok(target) => (
            target.to_string(),
            args.next().ok_or(CLIError::MissingParameter("action"))?,
        ),
        Err(_) => (DEFAULT_ADDRESS.to_string(), maybe_target),
    };

    Ok(CLIOptions {
        target,
        action: parse_action(&action, args)?,
    })
}
