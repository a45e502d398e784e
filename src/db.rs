use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;
use crate::store::memory::InMemoryStore;
use crate::store::mysql::MySqlStore;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Picks the store backend from config.
pub async fn init_state(config: &Config) -> Result<AppState> {
    match &config.database_url {
        Some(url) => {
            let store = Arc::new(MySqlStore::new(init_db(url).await?));
            info!("Using MySQL store");
            Ok(AppState::new(store.clone(), store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Ok(AppState::new(store.clone(), store))
        }
    }
}
