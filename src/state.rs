use tracing::info;

use crate::auth::{PasswordHashing, TokenIssuer};
use crate::config::Config;
use crate::database::{AccountStore, DocumentMenuStore, MenuStore, SqliteAccountStore};
use crate::errors::Result;

/// Everything a request handler can reach. Shared read-only between the worker threads, the
/// stores synchronize internally.
pub struct AppState {
    pub config: Config,
    pub menu: Box<dyn MenuStore>,
    pub accounts: Box<dyn AccountStore>,
    pub tokens: TokenIssuer,
    pub passwords: PasswordHashing,
}

impl AppState {
    /// Build the state with both stores opened from the configured files
    pub fn new(config: Config) -> Result<Self> {
        info!(path = %config.menu_db, "Opening menu store");
        let menu = DocumentMenuStore::open(&config.menu_db)?;
        info!(path = %config.accounts_db, "Opening account store");
        let accounts = SqliteAccountStore::open(&config.accounts_db)?;

        Self::with_stores(config, Box::new(menu), Box::new(accounts))
    }

    /// Build the state with both stores in memory
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_stores(
            config,
            Box::new(DocumentMenuStore::in_memory()?),
            Box::new(SqliteAccountStore::in_memory()?),
        )
    }

    pub fn with_stores(
        config: Config,
        menu: Box<dyn MenuStore>,
        accounts: Box<dyn AccountStore>,
    ) -> Result<Self> {
        Ok(AppState {
            tokens: TokenIssuer::new(&config),
            passwords: PasswordHashing::new(config.hash_memory_kib, config.hash_iterations)?,
            config,
            menu,
            accounts,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// In-memory state with cheap password hashing
    pub fn state() -> AppState {
        let mut config = Config::with_secrets("test-access-secret", "test-refresh-secret");
        config.hash_memory_kib = 1024;
        config.hash_iterations = 1;
        AppState::in_memory(config).unwrap()
    }
}
