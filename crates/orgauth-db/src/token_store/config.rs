use std::env;

/// Token store connection settings.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    /// Redis connection URL (e.g. `redis://127.0.0.1:6379/`).
    pub redis_url: String,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379/".into(),
        }
    }
}

impl TokenStoreConfig {
    /// Load from `REDIS_URL`, or build one from `REDIS_HOST` on the
    /// default port when only a host is given.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("REDIS_URL") {
            config.redis_url = url;
        } else if let Ok(host) = env::var("REDIS_HOST") {
            config.redis_url = format!("redis://{host}:6379/");
        }

        config
    }
}
