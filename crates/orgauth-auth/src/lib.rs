//! orgauth auth: credential verification, token lifecycle, and
//! organization membership rules.

pub mod config;
pub mod deadline;
pub mod error;
pub mod membership;
pub mod password;
pub mod service;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, AuthResult};
pub use membership::MembershipAuthority;
pub use service::{AuthService, SignInInput, SignUpInput, TokenPair};
pub use token::{AccessTokenClaims, TokenService};
