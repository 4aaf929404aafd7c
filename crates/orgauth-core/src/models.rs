//! Domain models shared across the orgauth crates.

pub mod membership;
pub mod organization;
pub mod user;
