//! Authentication configuration.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Upper bound on the access token lifetime. Access tokens cannot be
/// revoked, so anything beyond a day is a configuration mistake.
pub const MAX_ACCESS_TOKEN_LIFETIME_SECS: u64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("access and refresh token secrets must differ")]
    SharedSecret,
}

fn parse_u64(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

/// Configuration for the authentication service.
///
/// Built once at startup and handed to each component; nothing here is
/// read from process globals after construction.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens (HS256).
    pub access_token_secret: String,
    /// Secret keying the refresh-token namespace in the token store.
    pub refresh_token_secret: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    pub access_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Deadline applied to every record-store and token-store call.
    pub store_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_token_lifetime_secs: 900,
            jwt_issuer: "orgauth".into(),
            pepper: None,
            store_timeout: Duration::from_millis(5_000),
        }
    }
}

impl AuthConfig {
    /// Load from `ACCESS_SECRET`, `REFRESH_SECRET`, `PASSWORD_PEPPER`,
    /// `JWT_ISSUER`, `ACCESS_TOKEN_LIFETIME_SECS` and `STORE_TIMEOUT_MS`.
    /// The result is validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            access_token_secret: env::var("ACCESS_SECRET")
                .map_err(|_| ConfigError::Missing("ACCESS_SECRET"))?,
            refresh_token_secret: env::var("REFRESH_SECRET")
                .map_err(|_| ConfigError::Missing("REFRESH_SECRET"))?,
            pepper: env::var("PASSWORD_PEPPER").ok().filter(|p| !p.is_empty()),
            ..Self::default()
        };

        if let Ok(issuer) = env::var("JWT_ISSUER") {
            config.jwt_issuer = issuer;
        }
        if let Ok(raw) = env::var("ACCESS_TOKEN_LIFETIME_SECS") {
            config.access_token_lifetime_secs = parse_u64("ACCESS_TOKEN_LIFETIME_SECS", &raw)?;
        }
        if let Ok(raw) = env::var("STORE_TIMEOUT_MS") {
            config.store_timeout = Duration::from_millis(parse_u64("STORE_TIMEOUT_MS", &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make tokens forgeable or
    /// unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.is_empty() {
            return Err(ConfigError::Missing("ACCESS_SECRET"));
        }
        if self.refresh_token_secret.is_empty() {
            return Err(ConfigError::Missing("REFRESH_SECRET"));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }
        if self.access_token_lifetime_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_LIFETIME_SECS",
                reason: "must be positive".into(),
            });
        }
        if self.access_token_lifetime_secs > MAX_ACCESS_TOKEN_LIFETIME_SECS {
            return Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_LIFETIME_SECS",
                reason: format!("must be at most {MAX_ACCESS_TOKEN_LIFETIME_SECS}"),
            });
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "STORE_TIMEOUT_MS",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}
