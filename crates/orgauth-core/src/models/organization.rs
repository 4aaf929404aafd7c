//! Organization domain model.
//!
//! An organization owns an ordered member list. Each member entry is
//! mirrored by the organization's id in the member's user record; the two
//! copies live in different records with no transactional link.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Projection of a user inside an organization's member list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Members in insertion order.
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Email of the first member holding the admin role.
    pub fn admin(&self) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.role == Role::Admin)
            .map(|m| m.email.as_str())
    }

    pub fn has_member(&self, email: &str) -> bool {
        self.members.iter().any(|m| m.email == email)
    }
}

/// Fields required to create a new organization. The member list always
/// starts empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org_with(members: Vec<Member>) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "Eng".into(),
            description: "engineering".into(),
            members,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn member(email: &str, role: Role) -> Member {
        Member {
            name: email.split('@').next().unwrap_or_default().into(),
            email: email.into(),
            role,
        }
    }

    #[test]
    fn admin_is_first_admin_member() {
        let org = org_with(vec![
            member("bob@x.com", Role::User),
            member("alice@x.com", Role::Admin),
        ]);
        assert_eq!(org.admin(), Some("alice@x.com"));
    }

    #[test]
    fn no_admin_yields_none() {
        let org = org_with(vec![member("bob@x.com", Role::User)]);
        assert_eq!(org.admin(), None);
        assert!(org.has_member("bob@x.com"));
        assert!(!org.has_member("carol@x.com"));
    }

    #[test]
    fn role_string_roundtrip() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("owner".parse::<Role>().is_err());
    }
}
