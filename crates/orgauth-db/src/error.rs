//! Database-specific error types and conversions.

use orgauth_core::error::CoreError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[source] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// The statement lost an optimistic transaction race and can be
    /// re-run unchanged.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },
}

/// SurrealDB reports write-write and read-write conflicts between
/// concurrent transactions only through the error text.
fn is_conflict_message(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    msg.contains("transaction conflict")
        || msg.contains("write conflict")
        || msg.contains("read or write conflict")
        || msg.contains("retry the transaction")
        || msg.contains("can be retried")
}

impl DbError {
    /// Classify a statement error from `Response::check`. Transaction
    /// conflicts become `Conflict`; unique-index and duplicate-record
    /// violations become `AlreadyExists` for `entity`.
    pub(crate) fn from_statement(err: surrealdb::Error, entity: &str) -> Self {
        let msg = err.to_string();
        if is_conflict_message(&msg) {
            DbError::Conflict(msg)
        } else if msg.contains("already exists") || msg.contains("already contains") {
            DbError::AlreadyExists {
                entity: entity.into(),
            }
        } else {
            DbError::Query(msg)
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if is_conflict_message(&msg) {
            DbError::Conflict(msg)
        } else {
            DbError::Surreal(err)
        }
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => CoreError::AlreadyExists { entity },
            DbError::InvalidRecord(msg) => CoreError::Internal(msg),
            other => CoreError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_messages_are_recognised() {
        assert!(is_conflict_message(
            "Transaction conflict: Write conflict, retry the transaction"
        ));
        assert!(is_conflict_message(
            "Failed to commit transaction due to a read or write conflict. \
             This transaction can be retried"
        ));
        assert!(!is_conflict_message(
            "Database record `user:⟨a@x.com⟩` already exists"
        ));
        assert!(!is_conflict_message("Parse error: unexpected token"));
    }

    #[test]
    fn exhausted_conflict_surfaces_as_database_error() {
        let err: CoreError = DbError::Conflict("write conflict".into()).into();
        assert!(matches!(err, CoreError::Database(ref m) if m.contains("write conflict")));
    }
}
