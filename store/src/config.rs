use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub struct StoreConfig {
    pub url: String,
    pub max_connections: u32,
}

impl StoreConfig {
    /// Resolution order: `DATABASE_URL` env var, then the value from a
    /// loaded config file, then an in-memory database.
    pub fn from_env_or_yaml(yaml_url: Option<String>) -> Self {
        let url = if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else if let Some(yaml) = yaml_url {
            yaml
        } else {
            "sqlite::memory:".to_string()
        };

        Self {
            url,
            max_connections: 5,
        }
    }

    pub async fn create_pool(&self) -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&self.url)?.create_if_missing(true);
        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await
    }
}
