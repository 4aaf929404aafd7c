//! Record-store connection for the server binary.
//!
//! Tests open the in-memory engine directly; only production goes
//! through [`DbManager`], which speaks WebSocket to a SurrealDB server.

use std::env;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Where the record store lives and how to sign in to it.
///
/// Every field can be overridden from the environment; see
/// [`DbConfig::from_env`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB server.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "orgauth".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Defaults, overridden by `SURREAL_URL`, `SURREAL_NAMESPACE`,
    /// `SURREAL_DATABASE`, `SURREAL_USERNAME` and `SURREAL_PASSWORD`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, fallback: String| env::var(name).unwrap_or(fallback);

        Self {
            url: var("SURREAL_URL", defaults.url),
            namespace: var("SURREAL_NAMESPACE", defaults.namespace),
            database: var("SURREAL_DATABASE", defaults.database),
            username: var("SURREAL_USERNAME", defaults.username),
            password: var("SURREAL_PASSWORD", defaults.password),
        }
    }
}

/// An authenticated client scoped to the configured namespace and
/// database. Cheap to clone; repositories take their own copy.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening record store connection"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Record store connection ready");
        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
