//! Read-only aggregation queries behind the report endpoints.

use crate::db::{
    errors::Result,
    handlers::Scope,
    models::{
        evaluations::EvaluationRow,
        projects::ProjectRow,
        reports::{ProjectHeader, ReportEvaluation, ReportScore},
    },
};
use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

/// Report filters. Date bounds are inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub project_id: Option<ProjectId>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub struct Reports<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reports<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// One row per evaluation, grouped by project (newest project first) and
    /// newest evaluation first within a project.
    #[instrument(skip_all, err)]
    pub async fn evaluation_report(&mut self, filter: &ReportFilter, scope: &Scope) -> Result<Vec<ReportEvaluation>> {
        // Visible projects that have at least one visible evaluation.
        let projects = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT p.* FROM projects p
            WHERE ($1 OR p.created_by = $2)
              AND EXISTS (
                  SELECT 1 FROM evaluations e
                  WHERE e.project_id = p.id AND ($1 OR e.created_by = $2)
              )
              AND ($3::uuid IS NULL OR p.id = $3)
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(scope.is_admin)
        .bind(&scope.username)
        .bind(filter.project_id)
        .fetch_all(&mut *self.db)
        .await?;

        let mut rows = Vec::new();
        for project in projects {
            let evaluations = sqlx::query_as::<_, EvaluationRow>(
                r#"
                SELECT * FROM evaluations
                WHERE project_id = $1 AND ($2 OR created_by = $3)
                  AND ($4::timestamptz IS NULL OR created_at >= $4)
                  AND ($5::timestamptz IS NULL OR created_at <= $5)
                ORDER BY created_at DESC
                "#,
            )
            .bind(project.id)
            .bind(scope.is_admin)
            .bind(&scope.username)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_all(&mut *self.db)
            .await?;

            for evaluation in evaluations {
                let scores = sqlx::query_as::<_, ReportScore>(
                    r#"
                    SELECT cs.id, c.name AS category_name, cs.score, cs.comment,
                           cs.annotation, cs.screenshot
                    FROM category_scores cs
                    JOIN categories c ON c.id = cs.category_id
                    WHERE cs.evaluation_id = $1
                    ORDER BY c.display_order
                    "#,
                )
                .bind(evaluation.id)
                .fetch_all(&mut *self.db)
                .await?;

                rows.push(ReportEvaluation {
                    evaluation_id: evaluation.id,
                    project_id: project.id,
                    project_name: project.name.clone(),
                    project_description: project.description.clone(),
                    project_websites: project.websites_vec(),
                    website_url: evaluation.website_url,
                    notes: evaluation.notes,
                    created_at: evaluation.created_at,
                    created_by: evaluation.created_by,
                    scores,
                });
            }
        }

        Ok(rows)
    }

    /// Visible projects that have at least one evaluation, for the report
    /// filter dropdown.
    #[instrument(skip_all, err)]
    pub async fn projects_with_evaluations(&mut self, scope: &Scope) -> Result<Vec<ProjectHeader>> {
        let rows = sqlx::query_as::<_, ProjectHeader>(
            r#"
            SELECT p.id, p.name FROM projects p
            WHERE ($1 OR p.created_by = $2)
              AND EXISTS (SELECT 1 FROM evaluations e WHERE e.project_id = p.id)
            ORDER BY p.name
            "#,
        )
        .bind(scope.is_admin)
        .bind(&scope.username)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::evaluations::Evaluations;
    use crate::db::handlers::projects::Projects;
    use crate::db::handlers::repository::Repository;
    use crate::db::models::evaluations::{EvaluationCreateDBRequest, ScoreEntry};
    use crate::db::models::projects::ProjectCreateDBRequest;
    use sqlx::PgPool;

    const NAVIGATION: &str = "550e8400-e29b-41d4-a716-446655440001";
    const SEARCH: &str = "00839fa9-1488-4f9b-9850-d9c9b63ceb88";
    const VISUAL: &str = "cc0b54e0-9d3e-4fd7-9223-75f1f2c8aea5";

    fn entry(category_id: &str, score: i32) -> ScoreEntry {
        ScoreEntry {
            category_id: category_id.parse().unwrap(),
            score,
            comment: String::new(),
            annotation: String::new(),
            screenshot: None,
        }
    }

    async fn seed(pool: &PgPool, scope: &Scope, scores: Vec<ScoreEntry>) -> ProjectId {
        let mut conn = pool.acquire().await.unwrap();
        let project_id = {
            let mut projects = Projects::new(&mut conn);
            projects
                .create(
                    &ProjectCreateDBRequest {
                        name: "Portal".to_string(),
                        description: "desc".to_string(),
                        websites: vec!["https://a.example".to_string()],
                    },
                    scope,
                )
                .await
                .unwrap()
                .id
        };
        let mut evaluations = Evaluations::new(&mut conn);
        evaluations
            .create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://a.example".to_string(),
                    notes: "pass".to_string(),
                    scores,
                },
                scope,
            )
            .await
            .unwrap();
        project_id
    }

    #[sqlx::test]
    async fn test_report_rows_and_average(pool: PgPool) {
        let alice = Scope::new("alice", false);
        seed(
            &pool,
            &alice,
            vec![entry(NAVIGATION, 4), entry(SEARCH, 4), entry(VISUAL, 4)],
        )
        .await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reports = Reports::new(&mut conn);
        let rows = reports.evaluation_report(&ReportFilter::default(), &alice).await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.scores.len(), 3);
        assert_eq!(row.average_score(), 4.0);
        assert_eq!(row.created_by, "alice");
        assert_eq!(row.project_websites, vec!["https://a.example".to_string()]);
        // Scores come back in category display order
        assert_eq!(row.scores[0].category_name, "Navigation and Flow");
        assert_eq!(row.scores[1].category_name, "Search and Filters");
        assert_eq!(row.scores[2].category_name, "Visual Design");
    }

    #[sqlx::test]
    async fn test_report_excludes_other_users(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let bob = Scope::new("bob", false);
        let admin = Scope::new("root", true);
        seed(&pool, &alice, vec![entry(NAVIGATION, 5)]).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reports = Reports::new(&mut conn);

        assert!(reports
            .evaluation_report(&ReportFilter::default(), &bob)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            reports
                .evaluation_report(&ReportFilter::default(), &admin)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[sqlx::test]
    async fn test_report_date_bounds_are_inclusive(pool: PgPool) {
        let alice = Scope::new("alice", false);
        seed(&pool, &alice, vec![entry(NAVIGATION, 3)]).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reports = Reports::new(&mut conn);

        let rows = reports.evaluation_report(&ReportFilter::default(), &alice).await.unwrap();
        let created_at = rows[0].created_at;

        // Exactly-on-bound timestamps are kept
        let filter = ReportFilter {
            project_id: None,
            start_date: Some(created_at),
            end_date: Some(created_at),
        };
        assert_eq!(reports.evaluation_report(&filter, &alice).await.unwrap().len(), 1);

        // A window entirely after the evaluation drops it
        let filter = ReportFilter {
            project_id: None,
            start_date: Some(created_at + chrono::Duration::seconds(1)),
            end_date: None,
        };
        assert!(reports.evaluation_report(&filter, &alice).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn test_projects_with_evaluations_filters_empty_projects(pool: PgPool) {
        let alice = Scope::new("alice", false);
        seed(&pool, &alice, vec![]).await;

        let mut conn = pool.acquire().await.unwrap();
        {
            let mut projects = Projects::new(&mut conn);
            projects
                .create(
                    &ProjectCreateDBRequest {
                        name: "No evals yet".to_string(),
                        description: String::new(),
                        websites: vec![],
                    },
                    &alice,
                )
                .await
                .unwrap();
        }

        let mut reports = Reports::new(&mut conn);
        let headers = reports.projects_with_evaluations(&alice).await.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name, "Portal");
    }
}
