use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub redis_url: Option<String>,
    pub store_rest_url: Option<String>,
    pub store_api_key: Option<String>,
    pub cors_origin: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using development default");
                "dev-secret-change-in-production".to_string()
            }),
            redis_url: env::var("REDIS_URL").ok(),
            store_rest_url: env::var("STORE_REST_URL").ok(),
            store_api_key: env::var("STORE_API_KEY").ok(),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| {
                warn!("CORS_ORIGIN not set, defaulting to http://localhost:5173");
                "http://localhost:5173".to_string()
            }),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
        };

        if config.redis_url.is_none() {
            warn!("REDIS_URL not set, cache and socket tokens will use in-process backends");
        }
        if !config.is_rest_store_configured() {
            warn!("STORE_REST_URL not set, persistence will use the in-memory store");
        }

        config
    }

    pub fn is_rest_store_configured(&self) -> bool {
        self.store_rest_url.is_some() && self.store_api_key.is_some()
    }
}
