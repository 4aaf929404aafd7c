//! SurrealDB repository implementations.

mod organization;
mod user;

pub use organization::SurrealOrganizationRepository;
pub use user::SurrealUserRepository;
