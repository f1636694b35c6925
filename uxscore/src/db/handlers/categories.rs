//! Database repository for the category catalog.
//!
//! Categories are global (not caller-scoped), so this repository does not
//! take a [`Scope`](crate::db::handlers::Scope); the admin gate lives at the
//! API layer.

use crate::db::{
    errors::{DbError, Result},
    models::categories::{CategoryRow, CategoryWriteDBRequest},
};
use crate::types::{CategoryId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Categories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Active categories only, in display order. Public surface.
    #[instrument(skip_all, err)]
    pub async fn list_active(&mut self) -> Result<Vec<CategoryRow>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE is_active ORDER BY display_order",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Every category regardless of active flag, same ordering.
    #[instrument(skip_all, err)]
    pub async fn list_all(&mut self) -> Result<Vec<CategoryRow>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY display_order")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: CategoryId) -> Result<Option<CategoryRow>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(row)
    }

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    pub async fn create(&mut self, request: &CategoryWriteDBRequest) -> Result<CategoryRow> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (name, description, is_active, display_order)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.is_active)
        .bind(request.display_order)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self, request), fields(category_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: CategoryId, request: &CategoryWriteDBRequest) -> Result<CategoryRow> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories SET
                name = $2,
                description = $3,
                is_active = $4,
                display_order = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.is_active)
        .bind(request.display_order)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row)
    }

    /// Flip `is_active` atomically in SQL.
    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    pub async fn toggle_active(&mut self, id: CategoryId) -> Result<CategoryRow> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "UPDATE categories SET is_active = NOT is_active WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row)
    }

    /// Physical delete. Fails with a foreign-key violation when any score
    /// still cites the category; callers map that to the in-use response.
    #[instrument(skip(self), fields(category_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
