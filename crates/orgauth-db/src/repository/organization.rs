//! SurrealDB implementation of [`OrganizationRepository`].
//!
//! Member appends are single-statement conditional updates on the
//! organization record. A statement aborted by a concurrent writer is
//! re-run, so the `WHERE` guard, not the storage engine, decides whether
//! an invite lands: racing invites never lose each other's entries and
//! never duplicate an email.

use chrono::{DateTime, Utc};
use orgauth_core::error::CoreResult;
use orgauth_core::models::organization::{
    CreateOrganization, Member, Organization, Role, UpdateOrganization,
};
use orgauth_core::repository::{OrganizationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::retry;

#[derive(Debug, SurrealValue)]
struct MemberRow {
    name: String,
    email: String,
    role: String,
}

impl MemberRow {
    fn try_into_member(self) -> Result<Member, DbError> {
        let role = self.role.parse::<Role>().map_err(DbError::InvalidRecord)?;
        Ok(Member {
            name: self.name,
            email: self.email,
            role,
        })
    }
}

fn members_from_rows(rows: Vec<MemberRow>) -> Result<Vec<Member>, DbError> {
    rows.into_iter().map(MemberRow::try_into_member).collect()
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    name: String,
    description: String,
    members: Vec<MemberRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn try_into_organization(self, id: Uuid) -> Result<Organization, DbError> {
        Ok(Organization {
            id,
            name: self.name,
            description: self.description,
            members: members_from_rows(self.members)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct OrganizationRowWithId {
    record_id: String,
    name: String,
    description: String,
    members: Vec<MemberRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRowWithId {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::InvalidRecord(format!("invalid UUID: {e}")))?;
        Ok(Organization {
            id,
            name: self.name,
            description: self.description,
            members: members_from_rows(self.members)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn not_found(id: &str) -> DbError {
        DbError::NotFound {
            entity: "organization".into(),
            id: id.to_string(),
        }
    }

    async fn try_update(
        &self,
        id: Uuid,
        input: &UpdateOrganization,
    ) -> Result<Option<Organization>, DbError> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('organization', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(name) = &input.name {
            builder = builder.bind(("name", name.clone()));
        }
        if let Some(description) = &input.description {
            builder = builder.bind(("description", description.clone()));
        }

        let mut result = builder
            .await?
            .check()
            .map_err(|e| DbError::from_statement(e, "organization"))?;

        let rows: Vec<OrganizationRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_organization(id))
            .transpose()
    }

    async fn try_delete(&self, id: Uuid) -> Result<(), DbError> {
        self.db
            .query("DELETE type::record('organization', $id)")
            .bind(("id", id.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::from_statement(e, "organization"))?;

        Ok(())
    }

    /// The guarded append. `None` means a guard rejected the entry or the
    /// record does not exist.
    async fn try_append_member(
        &self,
        id: Uuid,
        member: &Member,
    ) -> Result<Option<Organization>, DbError> {
        let entry = serde_json::json!({
            "name": member.name,
            "email": member.email,
            "role": member.role.as_str(),
        });

        let mut result = self
            .db
            .query(
                "UPDATE type::record('organization', $id) SET \
                 members += $member, updated_at = time::now() \
                 WHERE $email NOTINSIDE members.email \
                 AND ($is_admin = false OR 'admin' NOTINSIDE members.role)",
            )
            .bind(("id", id.to_string()))
            .bind(("member", entry))
            .bind(("email", member.email.clone()))
            .bind(("is_admin", member.role == Role::Admin))
            .await?
            .check()
            .map_err(|e| DbError::from_statement(e, "member"))?;

        let rows: Vec<OrganizationRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_organization(id))
            .transpose()
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> CoreResult<Organization> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('organization', $id) SET \
                 name = $name, description = $description, members = []",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, "organization"))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(&id_str))?;

        Ok(row.try_into_organization(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CoreResult<Organization> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('organization', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(&id_str))?;

        Ok(row.try_into_organization(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> CoreResult<Organization> {
        let input = &input;
        let updated =
            retry::on_conflict("organization.update", move || self.try_update(id, input)).await?;

        Ok(updated.ok_or_else(|| Self::not_found(&id.to_string()))?)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<()> {
        Ok(retry::on_conflict("organization.delete", move || self.try_delete(id)).await?)
    }

    async fn append_member(&self, id: Uuid, member: Member) -> CoreResult<Organization> {
        let entry = &member;
        let appended = retry::on_conflict("organization.append_member", move || {
            self.try_append_member(id, entry)
        })
        .await?;

        if let Some(org) = appended {
            return Ok(org);
        }

        // The guarded update matched nothing; work out which guard failed.
        let current = self.get_by_id(id).await?;
        let entity = if current.has_member(&member.email) {
            "member"
        } else if member.role == Role::Admin && current.admin().is_some() {
            "admin"
        } else {
            return Err(DbError::Query(format!(
                "member append on organization {id} matched no record"
            ))
            .into());
        };

        Err(DbError::AlreadyExists {
            entity: entity.into(),
        }
        .into())
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> CoreResult<Vec<Organization>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organization \
                 WHERE meta::id(id) INSIDE $ids \
                 ORDER BY created_at ASC",
            )
            .bind(("ids", id_strs))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_organization())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn list(&self, pagination: Pagination) -> CoreResult<PaginatedResult<Organization>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM organization GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organization \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_organization())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
