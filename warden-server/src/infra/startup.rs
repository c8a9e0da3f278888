use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use warden_core::{
    AccountService, CredentialHasher, PostgresDatabase, PostgresUserStorage, TokenService,
    UserStore,
};

use super::config::Config;

/// Everything a storage-backed command needs, wired from [`Config`].
#[derive(Debug, Clone)]
pub struct AppContext {
    pub accounts: AccountService<PostgresUserStorage>,
}

impl AppContext {
    /// Validate token settings, connect the pool and build the account
    /// service. Token configuration errors are fatal before any connection
    /// is attempted.
    pub async fn connect(config: &Config) -> Result<Self> {
        let tokens = Arc::new(token_service(config)?);
        let database = connect_database(config).await?;

        let hasher = CredentialHasher::new().context("failed to initialise password hasher")?;
        let store = UserStore::new(Arc::new(hasher));
        let accounts = AccountService::new(database.users(), store, tokens);

        Ok(Self { accounts })
    }
}

pub fn token_service(config: &Config) -> Result<TokenService> {
    TokenService::new(config.token_settings()).context("invalid token configuration")
}

pub async fn connect_database(config: &Config) -> Result<PostgresDatabase> {
    let url = config.require_database_url()?;
    let database = PostgresDatabase::connect(url, &config.pool_settings())
        .await
        .context("failed to connect to PostgreSQL")?;
    info!("Connected to PostgreSQL");
    Ok(database)
}
