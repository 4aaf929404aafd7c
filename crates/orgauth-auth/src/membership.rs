//! Organization membership and role-gated mutations.
//!
//! Membership is written twice: a member entry on the organization and
//! the organization id on the user. The organization's member list is
//! authoritative for reads. The two writes are not transactional; when
//! the second one fails the gap is logged at `error` level and the error
//! is returned without rolling back the first.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use orgauth_core::models::membership::MembershipInconsistency;
use orgauth_core::models::organization::{
    CreateOrganization, Member, Organization, Role, UpdateOrganization,
};
use orgauth_core::models::user::User;
use orgauth_core::repository::{OrganizationRepository, Pagination, UserRepository};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::deadline::bounded;
use crate::error::{AuthError, AuthResult};

/// Answers membership queries and enforces admin-only mutations.
pub struct MembershipAuthority<U: UserRepository, O: OrganizationRepository> {
    users: U,
    orgs: O,
    timeout: Duration,
}

impl<U: UserRepository, O: OrganizationRepository> MembershipAuthority<U, O> {
    pub fn new(users: U, orgs: O, timeout: Duration) -> Self {
        Self {
            users,
            orgs,
            timeout,
        }
    }

    pub(crate) fn organizations(&self) -> &O {
        &self.orgs
    }

    pub(crate) async fn load_org(&self, org_id: Uuid) -> AuthResult<Organization> {
        Ok(bounded(self.timeout, self.orgs.get_by_id(org_id)).await?)
    }

    pub(crate) async fn load_user(&self, email: &str) -> AuthResult<User> {
        Ok(bounded(self.timeout, self.users.get_by_email(email)).await?)
    }

    /// True iff `email` appears in the organization's member list. A
    /// missing organization has no members.
    pub async fn is_member(&self, org_id: Uuid, email: &str) -> AuthResult<bool> {
        match bounded(self.timeout, self.orgs.get_by_id(org_id)).await {
            Ok(org) => Ok(org.has_member(email)),
            Err(e) if e.is_not_found("organization") => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Email of the organization's admin, or `None` if it has none.
    pub async fn admin_of(&self, org_id: Uuid) -> AuthResult<Option<String>> {
        let org = self.load_org(org_id).await?;
        Ok(org.admin().map(str::to_string))
    }

    /// Succeed with the organization only when `requester_email` is its
    /// admin. An organization without an admin admits nobody.
    pub async fn authorize_admin_action(
        &self,
        org_id: Uuid,
        requester_email: &str,
    ) -> AuthResult<Organization> {
        let org = self.load_org(org_id).await?;

        if org.admin() != Some(requester_email) {
            warn!(
                %org_id,
                requester = %requester_email,
                "Admin action rejected"
            );
            return Err(AuthError::Forbidden);
        }

        Ok(org)
    }

    /// Add an existing user to the organization with the `user` role.
    pub async fn invite(
        &self,
        org_id: Uuid,
        requester_email: &str,
        invitee_email: &str,
    ) -> AuthResult<()> {
        let org = self.authorize_admin_action(org_id, requester_email).await?;

        let invitee = self.load_user(invitee_email).await?;
        if org.has_member(&invitee.email) {
            return Err(AuthError::AlreadyMember);
        }

        self.add_member(org_id, &invitee, Role::User).await?;

        info!(
            %org_id,
            invitee = %invitee.email,
            invited_by = %requester_email,
            "User invited to organization"
        );
        Ok(())
    }

    /// Create an organization with `creator_email` as its sole admin.
    pub async fn create_organization(
        &self,
        creator_email: &str,
        input: CreateOrganization,
    ) -> AuthResult<Organization> {
        let creator = self.load_user(creator_email).await?;

        let org = bounded(self.timeout, self.orgs.create(input)).await?;

        // No admin exists yet, so the admin check is skipped here.
        let org = self.add_member(org.id, &creator, Role::Admin).await?;

        info!(org_id = %org.id, admin = %creator.email, "Organization created");
        Ok(org)
    }

    pub async fn update_organization(
        &self,
        org_id: Uuid,
        requester_email: &str,
        input: UpdateOrganization,
    ) -> AuthResult<Organization> {
        self.authorize_admin_action(org_id, requester_email).await?;

        let org = bounded(self.timeout, self.orgs.update(org_id, input)).await?;

        info!(%org_id, "Organization updated");
        Ok(org)
    }

    /// Delete the organization, then strip its id from every user.
    pub async fn delete_organization(&self, org_id: Uuid, requester_email: &str) -> AuthResult<()> {
        let org = self.authorize_admin_action(org_id, requester_email).await?;

        bounded(self.timeout, self.orgs.delete(org_id)).await?;

        match bounded(self.timeout, self.users.remove_organization_from_all(org_id)).await {
            Ok(touched) => {
                if touched as usize != org.members.len() {
                    warn!(
                        %org_id,
                        members = org.members.len(),
                        users_updated = touched,
                        "Organization member count and user mirrors disagreed at deletion"
                    );
                }
                info!(%org_id, users_updated = touched, "Organization deleted");
                Ok(())
            }
            Err(e) => {
                error!(
                    %org_id,
                    members = org.members.len(),
                    error = %e,
                    "Organization deleted but user mirrors were not cleared"
                );
                Err(e.into())
            }
        }
    }

    /// Shared write path for creation and invites: append the member to
    /// the organization, then mirror the organization id onto the user.
    async fn add_member(&self, org_id: Uuid, user: &User, role: Role) -> AuthResult<Organization> {
        let member = Member {
            name: user.name.clone(),
            email: user.email.clone(),
            role,
        };

        let org = bounded(self.timeout, self.orgs.append_member(org_id, member)).await?;

        let mirror = self.users.add_organization(&user.email, org_id);
        if let Err(e) = bounded(self.timeout, mirror).await {
            error!(
                %org_id,
                email = %user.email,
                error = %e,
                "Member appended to organization but user mirror write failed"
            );
            return Err(e.into());
        }

        Ok(org)
    }

    /// Compare both membership copies across all records.
    ///
    /// Read-only; intended for a repair job. The scan is not a snapshot,
    /// so writes racing with it can show up as transient findings.
    pub async fn list_inconsistencies(&self) -> AuthResult<Vec<MembershipInconsistency>> {
        let orgs = self.all_organizations().await?;
        let users = self.all_users().await?;

        let by_id: HashMap<Uuid, &Organization> = orgs.iter().map(|o| (o.id, o)).collect();
        let mirrors: HashSet<(Uuid, &str)> = users
            .iter()
            .flat_map(|u| u.organizations.iter().map(|id| (*id, u.email.as_str())))
            .collect();

        let mut found = Vec::new();

        for org in &orgs {
            for member in &org.members {
                if !mirrors.contains(&(org.id, member.email.as_str())) {
                    found.push(MembershipInconsistency::MissingUserMirror {
                        org_id: org.id,
                        email: member.email.clone(),
                    });
                }
            }
        }

        for user in &users {
            for org_id in &user.organizations {
                match by_id.get(org_id) {
                    None => found.push(MembershipInconsistency::DanglingOrganization {
                        org_id: *org_id,
                        email: user.email.clone(),
                    }),
                    Some(org) if !org.has_member(&user.email) => {
                        found.push(MembershipInconsistency::MissingOrganizationMirror {
                            org_id: *org_id,
                            email: user.email.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        if !found.is_empty() {
            warn!(count = found.len(), "Membership inconsistencies found");
        }
        Ok(found)
    }

    async fn all_organizations(&self) -> AuthResult<Vec<Organization>> {
        let mut out = Vec::new();
        let mut page = Pagination::default();
        loop {
            let result = bounded(self.timeout, self.orgs.list(page)).await?;
            let next = result.next_page();
            out.extend(result.items);
            match next {
                Some(p) => page = p,
                None => return Ok(out),
            }
        }
    }

    async fn all_users(&self) -> AuthResult<Vec<User>> {
        let mut out = Vec::new();
        let mut page = Pagination::default();
        loop {
            let result = bounded(self.timeout, self.users.list(page)).await?;
            let next = result.next_page();
            out.extend(result.items);
            match next {
                Some(p) => page = p,
                None => return Ok(out),
            }
        }
    }
}

