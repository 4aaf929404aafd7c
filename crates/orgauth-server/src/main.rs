//! orgauth server: wires configuration, stores, and the auth service.
//!
//! Only startup failures are fatal. The HTTP gateway that fronts
//! [`AuthService`] lives outside this binary.

use anyhow::Context;
use orgauth_auth::{AuthConfig, AuthService};
use orgauth_db::repository::{SurrealOrganizationRepository, SurrealUserRepository};
use orgauth_db::{DbConfig, DbManager, RedisTokenStore, TokenStoreConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orgauth=info")),
        )
        .json()
        .init();

    tracing::info!("Starting orgauth server...");

    let auth_config = AuthConfig::from_env().context("invalid auth configuration")?;
    let db_config = DbConfig::from_env();
    let store_config = TokenStoreConfig::from_env();

    let db = DbManager::connect(&db_config)
        .await
        .with_context(|| format!("connecting to record store at {}", db_config.url))?;
    orgauth_db::run_migrations(db.client())
        .await
        .context("applying record store migrations")?;

    let tokens = RedisTokenStore::connect(&store_config)
        .await
        .with_context(|| format!("connecting to token store at {}", store_config.redis_url))?;

    let client = db.client().clone();
    let _service = AuthService::new(
        SurrealUserRepository::new(client.clone()),
        SurrealOrganizationRepository::new(client),
        tokens,
        auth_config,
    );

    tracing::info!(
        namespace = %db_config.namespace,
        database = %db_config.database,
        "orgauth server ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    tracing::info!("orgauth server stopped.");
    Ok(())
}
