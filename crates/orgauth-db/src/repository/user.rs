//! SurrealDB implementation of [`UserRepository`].
//!
//! User records are keyed by email, so `CREATE` on an existing email
//! fails at the storage layer without touching the existing record.

use chrono::{DateTime, Utc};
use orgauth_core::error::CoreResult;
use orgauth_core::models::user::{CreateUser, User};
use orgauth_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::retry;

#[derive(Debug, SurrealValue)]
struct UserRow {
    name: String,
    email: String,
    password_hash: String,
    organizations: Vec<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let organizations = self
            .organizations
            .iter()
            .map(|id| {
                Uuid::parse_str(id).map_err(|e| {
                    DbError::InvalidRecord(format!("invalid organization UUID on user: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(User {
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            organizations,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn try_create(&self, input: &CreateUser) -> Result<User, DbError> {
        let result = self
            .db
            .query(
                "CREATE type::record('user', $email) SET \
                 name = $name, email = $email, \
                 password_hash = $password_hash, \
                 organizations = []",
            )
            .bind(("email", input.email.clone()))
            .bind(("name", input.name.clone()))
            .bind(("password_hash", input.password_hash.clone()))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "user"))?;

        let rows: Vec<UserRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: input.email.clone(),
        })?;

        row.try_into_user()
    }

    async fn try_add_organization(&self, email: &str, org_id: Uuid) -> Result<(), DbError> {
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $email) SET \
                 organizations = array::union(organizations, [$org_id])",
            )
            .bind(("email", email.to_string()))
            .bind(("org_id", org_id.to_string()))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "user"))?;

        let rows: Vec<UserRow> = result.take(0)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: email.to_string(),
            });
        }

        Ok(())
    }

    async fn try_remove_organization(&self, org_id: Uuid) -> Result<u64, DbError> {
        let result = self
            .db
            .query(
                "UPDATE user SET \
                 organizations = array::complement(organizations, [$org_id]) \
                 WHERE organizations CONTAINS $org_id",
            )
            .bind(("org_id", org_id.to_string()))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "user"))?;

        let rows: Vec<UserRow> = result.take(0)?;
        Ok(rows.len() as u64)
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> CoreResult<User> {
        // A sign-up that loses a race on the same email is retried and
        // then fails on the existing record.
        let input = &input;
        Ok(retry::on_conflict("user.create", move || self.try_create(input)).await?)
    }

    async fn get_by_email(&self, email: &str) -> CoreResult<User> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $email)")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: email.to_string(),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn add_organization(&self, email: &str, org_id: Uuid) -> CoreResult<()> {
        Ok(retry::on_conflict("user.add_organization", move || {
            self.try_add_organization(email, org_id)
        })
        .await?)
    }

    async fn remove_organization_from_all(&self, org_id: Uuid) -> CoreResult<u64> {
        let touched = retry::on_conflict("user.remove_organization", move || {
            self.try_remove_organization(org_id)
        })
        .await?;

        debug!(%org_id, users = touched, "Removed organization from user records");
        Ok(touched)
    }

    async fn list(&self, pagination: Pagination) -> CoreResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
