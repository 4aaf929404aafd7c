//! Authentication error kinds.
//!
//! Causes that must not be told apart by callers share a variant:
//! unknown email and wrong password are both `InvalidCredentials`, and a
//! revoked refresh token is indistinguishable from one never issued.

use orgauth_core::error::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("unknown refresh token")]
    UnknownRefreshToken,

    #[error("invalid access token")]
    InvalidToken,

    #[error("refresh token belongs to another user")]
    NotOwner,

    #[error("operation not permitted")]
    Forbidden,

    #[error("unknown user")]
    UnknownUser,

    #[error("user is already a member of this organization")]
    AlreadyMember,

    #[error("unknown organization")]
    UnknownOrg,

    #[error("organization already has an admin")]
    AdminAlreadyAssigned,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl AuthError {
    /// Stable machine-readable code for the gateway to render.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::UnknownRefreshToken => "unknown_refresh_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::NotOwner => "not_owner",
            AuthError::Forbidden => "forbidden",
            AuthError::UnknownUser => "unknown_user",
            AuthError::AlreadyMember => "already_member",
            AuthError::UnknownOrg => "unknown_org",
            AuthError::AdminAlreadyAssigned => "admin_already_assigned",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::MalformedHash(_) => "malformed_hash",
            AuthError::Crypto(_) => "crypto",
        }
    }

    /// True for transient infrastructure failures worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(_))
    }
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, .. } if entity == "user" => AuthError::UnknownUser,
            CoreError::NotFound { entity, .. } if entity == "organization" => {
                AuthError::UnknownOrg
            }
            CoreError::AlreadyExists { entity } if entity == "user" => AuthError::DuplicateEmail,
            CoreError::AlreadyExists { entity } if entity == "member" => AuthError::AlreadyMember,
            CoreError::AlreadyExists { entity } if entity == "admin" => {
                AuthError::AdminAlreadyAssigned
            }
            other => AuthError::StoreUnavailable(other.to_string()),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_domain_kinds() {
        let err: AuthError = CoreError::NotFound {
            entity: "organization".into(),
            id: "x".into(),
        }
        .into();
        assert!(matches!(err, AuthError::UnknownOrg));

        let err: AuthError = CoreError::AlreadyExists {
            entity: "member".into(),
        }
        .into();
        assert!(matches!(err, AuthError::AlreadyMember));

        let err: AuthError = CoreError::AlreadyExists {
            entity: "admin".into(),
        }
        .into();
        assert!(matches!(err, AuthError::AdminAlreadyAssigned));
    }

    #[test]
    fn infrastructure_errors_are_store_unavailable() {
        let err: AuthError = CoreError::Timeout.into();
        assert!(err.is_transient());
        assert_eq!(err.code(), "store_unavailable");

        let err: AuthError = CoreError::Database("connection reset".into()).into();
        assert!(
            matches!(err, AuthError::StoreUnavailable(ref m) if m.contains("connection reset"))
        );
    }
}
