//! orgauth core: domain models, store error types, and the narrow
//! repository traits through which the auth layer reaches the record
//! store and the token store.

pub mod error;
pub mod models;
pub mod repository;
