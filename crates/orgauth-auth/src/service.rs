//! Auth facade: the operations the gateway calls.
//!
//! Holds no state of its own beyond store handles and configuration.
//! Identity is always the email resolved from a validated access token;
//! the gateway passes it in as `caller_email`.

use chrono::{DateTime, Utc};
use orgauth_core::models::membership::MembershipInconsistency;
use orgauth_core::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use orgauth_core::models::user::{CreateUser, User};
use orgauth_core::repository::{OrganizationRepository, TokenStore, UserRepository};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::error::{AuthError, AuthResult};
use crate::membership::MembershipAuthority;
use crate::password;
use crate::token::TokenService;

/// Input for sign-up.
#[derive(Debug)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Input for sign-in.
#[derive(Debug)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Tokens handed back on sign-in and refresh.
#[derive(Debug)]
pub struct TokenPair {
    /// Signed JWT access token.
    pub access_token: String,
    /// Opaque refresh token. Refresh echoes the presented one back.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Authentication and organization service.
///
/// Generic over repository and token-store implementations so that the
/// auth layer has no dependency on the database crate.
pub struct AuthService<U, O, T>
where
    U: UserRepository + Clone,
    O: OrganizationRepository,
    T: TokenStore,
{
    users: U,
    membership: MembershipAuthority<U, O>,
    tokens: TokenService<T>,
    config: AuthConfig,
}

impl<U, O, T> AuthService<U, O, T>
where
    U: UserRepository + Clone,
    O: OrganizationRepository,
    T: TokenStore,
{
    pub fn new(users: U, orgs: O, token_store: T, config: AuthConfig) -> Self {
        Self {
            membership: MembershipAuthority::new(users.clone(), orgs, config.store_timeout),
            tokens: TokenService::new(token_store, config.clone()),
            users,
            config,
        }
    }

    pub fn tokens(&self) -> &TokenService<T> {
        &self.tokens
    }

    pub fn membership(&self) -> &MembershipAuthority<U, O> {
        &self.membership
    }

    // -----------------------------------------------------------------
    // Accounts and tokens
    // -----------------------------------------------------------------

    /// Register a new user. The email must not be taken.
    pub async fn sign_up(&self, input: SignUpInput) -> AuthResult<User> {
        let existing = bounded(self.config.store_timeout, self.users.get_by_email(&input.email));
        match existing.await {
            Ok(_) => return Err(AuthError::DuplicateEmail),
            Err(e) if e.is_not_found("user") => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash =
            password::hash_password(&input.password, self.config.pepper.as_deref())?;

        // The store's unique index settles a race between two sign-ups
        // that both passed the lookup above.
        let user = bounded(
            self.config.store_timeout,
            self.users.create(CreateUser {
                name: input.name,
                email: input.email,
                password_hash,
            }),
        )
        .await?;

        info!(email = %user.email, "User signed up");
        Ok(user)
    }

    /// Verify credentials and issue a token pair.
    ///
    /// An unknown email and a wrong password fail identically.
    pub async fn sign_in(&self, input: SignInInput) -> AuthResult<TokenPair> {
        let lookup = bounded(self.config.store_timeout, self.users.get_by_email(&input.email));
        let user = match lookup.await {
            Ok(u) => u,
            Err(e) if e.is_not_found("user") => {
                password::verify_dummy(&input.password, self.config.pepper.as_deref());
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let valid = match password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        ) {
            Ok(valid) => valid,
            Err(AuthError::MalformedHash(reason)) => {
                error!(email = %user.email, %reason, "Stored password hash is malformed");
                false
            }
            Err(e) => return Err(e),
        };

        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let refresh_token = self.tokens.issue_refresh_token(&user).await?;
        let access_token = self.tokens.issue_access_token(&refresh_token).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Mint a new access token from an active refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        self.refresh_at(refresh_token, Utc::now()).await
    }

    pub async fn refresh_at(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<TokenPair> {
        let access_token = self.tokens.issue_access_token_at(refresh_token, now).await?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in: self.config.access_token_lifetime_secs,
        })
    }

    /// Resolve the caller's email from an access token.
    pub fn authenticate(&self, access_token: &str) -> AuthResult<String> {
        self.tokens.validate_access_token(access_token)
    }

    pub fn authenticate_at(&self, access_token: &str, now: DateTime<Utc>) -> AuthResult<String> {
        self.tokens.validate_access_token_at(access_token, now)
    }

    /// Revoke a refresh token owned by `requester_email`.
    pub async fn revoke(&self, refresh_token: &str, requester_email: &str) -> AuthResult<()> {
        self.tokens
            .revoke_refresh_token(refresh_token, requester_email)
            .await
    }

    // -----------------------------------------------------------------
    // Organizations
    // -----------------------------------------------------------------

    pub async fn create_org(
        &self,
        caller_email: &str,
        input: CreateOrganization,
    ) -> AuthResult<Organization> {
        self.membership.create_organization(caller_email, input).await
    }

    /// Read an organization the caller belongs to.
    pub async fn read_org(&self, org_id: Uuid, caller_email: &str) -> AuthResult<Organization> {
        let org = self.membership.load_org(org_id).await?;
        if !org.has_member(caller_email) {
            return Err(AuthError::Forbidden);
        }
        Ok(org)
    }

    /// Organizations listed on the caller's own user record.
    pub async fn list_orgs(&self, caller_email: &str) -> AuthResult<Vec<Organization>> {
        let user = self.membership.load_user(caller_email).await?;
        if user.organizations.is_empty() {
            return Ok(Vec::new());
        }

        let orgs = bounded(
            self.config.store_timeout,
            self.membership.organizations().list_by_ids(&user.organizations),
        )
        .await?;
        Ok(orgs)
    }

    pub async fn update_org(
        &self,
        org_id: Uuid,
        caller_email: &str,
        input: UpdateOrganization,
    ) -> AuthResult<Organization> {
        self.membership
            .update_organization(org_id, caller_email, input)
            .await
    }

    pub async fn delete_org(&self, org_id: Uuid, caller_email: &str) -> AuthResult<()> {
        self.membership.delete_organization(org_id, caller_email).await
    }

    pub async fn invite(
        &self,
        org_id: Uuid,
        caller_email: &str,
        invitee_email: &str,
    ) -> AuthResult<()> {
        self.membership
            .invite(org_id, caller_email, invitee_email)
            .await
    }

    pub async fn list_inconsistencies(&self) -> AuthResult<Vec<MembershipInconsistency>> {
        self.membership.list_inconsistencies().await
    }
}
