use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use std::{env, fs};

use regex::Regex;
use tracing::{info, warn};

use crate::cli::DEFAULT_ADDRESS;
use crate::errors::{Error, Result};

/// Cost parameters recommended for argon2id
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;
pub const DEFAULT_HASH_ITERATIONS: u32 = 2;

/// Server configuration, drawn from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the server binds to, `<host>:<port>`
    pub address: String,
    /// SQLite file backing the menu documents
    pub menu_db: String,
    /// SQLite file backing users and orders
    pub accounts_db: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry: Duration,
    pub refresh_token_expiry: Duration,
    /// Enables `Secure` cookies
    pub production: bool,
    /// Origin allowed to send credentialed cross-origin requests
    pub cors_origin: String,
    pub workers: usize,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

impl Config {
    /// Configuration with default values everywhere except the token secrets
    pub fn with_secrets(access_token_secret: &str, refresh_token_secret: &str) -> Self {
        Config {
            address: DEFAULT_ADDRESS.to_string(),
            menu_db: "menu.db".to_string(),
            accounts_db: "accounts.db".to_string(),
            access_token_secret: access_token_secret.to_string(),
            refresh_token_secret: refresh_token_secret.to_string(),
            access_token_expiry: Duration::from_secs(24 * 60 * 60),
            refresh_token_expiry: Duration::from_secs(7 * 24 * 60 * 60),
            production: false,
            cors_origin: "http://localhost:3000".to_string(),
            workers: std::thread::available_parallelism()
                .map(|x| x.into())
                .unwrap_or(4),
            hash_memory_kib: DEFAULT_HASH_MEMORY_KIB,
            hash_iterations: DEFAULT_HASH_ITERATIONS,
        }
    }

    /// Load the configuration from environment variables, falling back to defaults for
    /// everything but the secrets.
    pub fn load() -> Result<Self> {
        let defaults = Config::with_secrets("", "");

        let access_token_secret = read_secret("ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = read_secret("REFRESH_TOKEN_SECRET")?;
        if access_token_secret == refresh_token_secret {
            warn!("Access and refresh tokens share the same secret");
        }

        Ok(Config {
            address: try_load("SERVER_ADDRESS", defaults.address)?,
            menu_db: try_load("MENU_DB_PATH", defaults.menu_db)?,
            accounts_db: try_load("ACCOUNTS_DB_PATH", defaults.accounts_db)?,
            access_token_secret,
            refresh_token_secret,
            access_token_expiry: parse_duration(&try_load(
                "ACCESS_TOKEN_EXPIRY",
                "1d".to_string(),
            )?)?,
            refresh_token_expiry: parse_duration(&try_load(
                "REFRESH_TOKEN_EXPIRY",
                "7d".to_string(),
            )?)?,
            production: try_load("APP_ENV", "development".to_string())? == "production",
            cors_origin: try_load("CORS_ORIGIN", defaults.cors_origin)?,
            workers: try_load("WORKER_THREADS", defaults.workers)?,
            hash_memory_kib: try_load("PASSWORD_HASH_MEMORY_KIB", defaults.hash_memory_kib)?,
            hash_iterations: try_load("PASSWORD_HASH_ITERATIONS", defaults.hash_iterations)?,
        })
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {key} value: {e}"))),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Secrets come either from the environment or from a mounted secret file
fn read_secret(name: &str) -> Result<String> {
    if let Ok(value) = env::var(name) {
        if !value.is_empty() {
            return Ok(value);
        }
    }

    let path = format!("/run/secrets/{name}");
    fs::read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {name} from {path}: {e}");
            Error::Config(format!("{name} is not set"))
        })
        .and_then(|s| {
            if s.is_empty() {
                Err(Error::Config(format!("{name} is empty")))
            } else {
                Ok(s)
            }
        })
}

/// Parse a duration such as `90s`, `15m`, `12h` or `3d`. A bare number is taken as seconds.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let re = Regex::new(r"^(\d+)\s*([smhd]?)$").map_err(|e| Error::Config(e.to_string()))?;
    let captures = re
        .captures(value.trim())
        .ok_or_else(|| Error::Config(format!("Invalid duration '{}'", value)))?;

    let amount: u64 = captures[1]
        .parse()
        .map_err(|_| Error::Config(format!("Invalid duration '{}'", value)))?;
    let unit = match &captures[2] {
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => 1,
    };

    match amount.checked_mul(unit) {
        Some(0) | None => Err(Error::Config(format!("Invalid duration '{}'", value))),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}
