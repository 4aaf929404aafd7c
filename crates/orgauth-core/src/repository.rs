//! Repository trait definitions for data access abstraction.
//!
//! All operations are async and return [`CoreResult`]. The record store
//! holds users and organizations; the token store is a flat key-value
//! namespace used for refresh tokens.

use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::{
    organization::{CreateOrganization, Member, Organization, UpdateOrganization},
    user::{CreateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> PaginatedResult<T> {
    /// Pagination for the page following this one, if any.
    pub fn next_page(&self) -> Option<Pagination> {
        let next = self.offset + self.items.len() as u64;
        (!self.items.is_empty() && next < self.total).then_some(Pagination {
            offset: next,
            limit: self.limit,
        })
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists { entity: "user" }` if the email is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = CoreResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CoreResult<User>> + Send;
    /// Append `org_id` to the user's organization list. Set semantics:
    /// appending an id already present is a no-op.
    fn add_organization(
        &self,
        email: &str,
        org_id: Uuid,
    ) -> impl Future<Output = CoreResult<()>> + Send;
    /// Remove `org_id` from every user that lists it. Returns the number
    /// of user records touched.
    fn remove_organization_from_all(
        &self,
        org_id: Uuid,
    ) -> impl Future<Output = CoreResult<u64>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CoreResult<PaginatedResult<User>>> + Send;
}

pub trait OrganizationRepository: Send + Sync {
    /// Creates the organization with an empty member list.
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = CoreResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CoreResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = CoreResult<Organization>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CoreResult<()>> + Send;
    /// Atomically append a member.
    ///
    /// Fails with `AlreadyExists { entity: "member" }` if the email is
    /// already listed and `AlreadyExists { entity: "admin" }` when
    /// appending an admin to an organization that already has one.
    fn append_member(
        &self,
        id: Uuid,
        member: Member,
    ) -> impl Future<Output = CoreResult<Organization>> + Send;
    /// Fetch the organizations with the given ids. Missing ids are skipped.
    fn list_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = CoreResult<Vec<Organization>>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CoreResult<PaginatedResult<Organization>>> + Send;
}

// ---------------------------------------------------------------------------
// Token store
// ---------------------------------------------------------------------------

/// Volatile key-value store backing refresh tokens. Mappings never expire
/// on their own.
pub trait TokenStore: Send + Sync {
    fn set_mapping(&self, key: &str, value: &str) -> impl Future<Output = CoreResult<()>> + Send;
    fn get_mapping(&self, key: &str) -> impl Future<Output = CoreResult<Option<String>>> + Send;
    fn delete_mapping(&self, key: &str) -> impl Future<Output = CoreResult<()>> + Send;
}
