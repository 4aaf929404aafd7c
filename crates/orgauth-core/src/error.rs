//! Error types returned by record-store and token-store implementations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("Store call exceeded its deadline")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for `NotFound` errors on the given entity kind.
    pub fn is_not_found(&self, kind: &str) -> bool {
        matches!(self, CoreError::NotFound { entity, .. } if entity == kind)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
