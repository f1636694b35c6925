//! Database repository for performance metric samples.
//!
//! Metrics are append-only from the API's point of view (no update route),
//! so this repository carries its own method set instead of the full
//! [`Repository`](crate::db::handlers::Repository) trait.

use crate::db::{
    errors::Result,
    handlers::Scope,
    models::performance_metrics::{MetricRow, MetricWriteDBRequest},
};
use crate::types::{MetricId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct PerformanceMetrics<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PerformanceMetrics<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(website_url = %request.website_url), err)]
    pub async fn create(&mut self, request: &MetricWriteDBRequest, scope: &Scope) -> Result<MetricRow> {
        let row = sqlx::query_as::<_, MetricRow>(
            r#"
            INSERT INTO performance_metrics
                (website_url, load_time_ms, response_time_ms, dom_content_loaded_ms,
                 first_paint_ms, performance_score, test_date, test_location, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&request.website_url)
        .bind(request.load_time_ms)
        .bind(request.response_time_ms)
        .bind(request.dom_content_loaded_ms)
        .bind(request.first_paint_ms)
        .bind(request.performance_score)
        .bind(request.test_date)
        .bind(&request.test_location)
        .bind(&scope.username)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip(self, scope), fields(metric_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: MetricId, scope: &Scope) -> Result<Option<MetricRow>> {
        let row = sqlx::query_as::<_, MetricRow>(
            "SELECT * FROM performance_metrics WHERE id = $1 AND ($2 OR created_by = $3)",
        )
        .bind(id)
        .bind(scope.is_admin)
        .bind(&scope.username)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }

    #[instrument(skip_all, err)]
    pub async fn list(&mut self, scope: &Scope) -> Result<Vec<MetricRow>> {
        let rows = sqlx::query_as::<_, MetricRow>(
            "SELECT * FROM performance_metrics WHERE ($1 OR created_by = $2) ORDER BY test_date DESC",
        )
        .bind(scope.is_admin)
        .bind(&scope.username)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self, scope), fields(metric_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: MetricId, scope: &Scope) -> Result<bool> {
        let result = sqlx::query("DELETE FROM performance_metrics WHERE id = $1 AND ($2 OR created_by = $3)")
            .bind(id)
            .bind(scope.is_admin)
            .bind(&scope.username)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
