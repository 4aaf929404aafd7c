//! Membership consistency report.
//!
//! Membership is stored twice: as a member entry on the organization and
//! as an organization id on the user. A repair job consumes these
//! variants; this crate only describes them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MembershipInconsistency {
    /// The organization lists the member, the user record does not list
    /// the organization.
    MissingUserMirror { org_id: Uuid, email: String },
    /// The user record lists an existing organization that does not list
    /// the user.
    MissingOrganizationMirror { org_id: Uuid, email: String },
    /// The user record lists an organization that no longer exists.
    DanglingOrganization { org_id: Uuid, email: String },
}
