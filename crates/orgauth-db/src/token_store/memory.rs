//! In-process token store.

use std::collections::HashMap;
use std::sync::Arc;

use orgauth_core::error::CoreResult;
use orgauth_core::repository::TokenStore;
use tokio::sync::RwLock;

/// Token store backed by a shared `HashMap`. Clones share state.
///
/// Contents are lost on restart, which matches the volatility contract
/// of the token store; intended for tests and single-process setups.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live mappings.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn set_mapping(&self, key: &str, value: &str) -> CoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_mapping(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete_mapping(&self, key: &str) -> CoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
