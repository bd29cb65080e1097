use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub database: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mongodb_uri = std::env::var("MONGODB_URI")?;
        let database = std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "userhub".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        Ok(Self {
            mongodb_uri,
            database,
            jwt,
        })
    }
}
