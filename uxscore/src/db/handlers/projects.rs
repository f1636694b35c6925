//! Database repository for projects.

use crate::db::{
    errors::{DbError, Result},
    handlers::{Scope, repository::Repository},
    models::projects::{ProjectCreateDBRequest, ProjectRow, ProjectUpdateDBRequest, join_websites},
};
use crate::types::{ProjectId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing projects. Listing is always newest-first; no paging,
/// matching the API surface.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {}

pub struct Projects<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Projects<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Projects<'c> {
    type CreateRequest = ProjectCreateDBRequest;
    type UpdateRequest = ProjectUpdateDBRequest;
    type Response = ProjectRow;
    type Id = ProjectId;
    type Filter = ProjectFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest, scope: &Scope) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects (name, description, websites, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(join_websites(&request.websites))
        .bind(&scope.username)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self, scope), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id, scope: &Scope) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE id = $1 AND ($2 OR created_by = $3)",
        )
        .bind(id)
        .bind(scope.is_admin)
        .bind(&scope.username)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip_all, err)]
    async fn list(&mut self, _filter: &Self::Filter, scope: &Scope) -> Result<Vec<Self::Response>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE ($1 OR created_by = $2) ORDER BY created_at DESC",
        )
        .bind(scope.is_admin)
        .bind(&scope.username)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self, request, scope), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest, scope: &Scope) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            UPDATE projects SET
                name = $4,
                description = $5,
                websites = $6,
                updated_at = NOW(),
                updated_by = $3
            WHERE id = $1 AND ($2 OR created_by = $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope.is_admin)
        .bind(&scope.username)
        .bind(&request.name)
        .bind(&request.description)
        .bind(join_websites(&request.websites))
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row)
    }

    #[instrument(skip(self, scope), fields(project_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id, scope: &Scope) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND ($2 OR created_by = $3)")
            .bind(id)
            .bind(scope.is_admin)
            .bind(&scope.username)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
