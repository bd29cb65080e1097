use std::sync::Arc;

use anyhow::Context;
use mongodb::{Client, Database};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let client = Client::with_uri_str(&config.mongodb_uri)
            .await
            .context("connect to database")?;
        let db = client.database(&config.database);
        Ok(Self { db, config })
    }

    /// State for unit tests. The driver connects lazily, so nothing here
    /// touches a real server as long as the test never runs a query.
    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::JwtConfig;

        let client = Client::with_uri_str("mongodb://127.0.0.1:27017")
            .await
            .expect("client from static uri");
        let config = Arc::new(AppConfig {
            mongodb_uri: "mongodb://127.0.0.1:27017".into(),
            database: "userhub_test".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 5,
            },
        });
        Self {
            db: client.database(&config.database),
            config,
        }
    }
}
