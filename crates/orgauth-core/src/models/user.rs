//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. The email is the identity; there is no separate
/// numeric id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Mirror of the organizations whose member list contains this user.
    pub organizations: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn belongs_to(&self, org_id: Uuid) -> bool {
        self.organizations.contains(&org_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Already-hashed password; repositories never see plaintext.
    pub password_hash: String,
}
