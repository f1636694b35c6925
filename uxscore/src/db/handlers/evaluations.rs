//! Database repository for evaluations and their category scores.
//!
//! An evaluation and its scores are treated as one bundle: creates and
//! replacements touch both, so callers are expected to run them inside a
//! transaction (hand the repository the transaction's connection).

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::{Scope, repository::Repository},
    models::evaluations::{
        CategoryScoreRow, EvaluationBundle, EvaluationCreateDBRequest, EvaluationReplaceDBRequest,
        EvaluationRow, ScoreEntry,
    },
};
use crate::types::{CategoryId, EvaluationId, ProjectId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing evaluations.
#[derive(Debug, Clone, Default)]
pub struct EvaluationFilter {
    pub project_id: Option<ProjectId>,
}

pub struct Evaluations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Evaluations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Headers of all evaluations under one project, newest first. Used when
    /// embedding evaluations in project responses; project visibility has
    /// already been checked by then.
    #[instrument(skip(self), fields(project_id = %abbrev_uuid(&project_id)), err)]
    pub async fn list_headers_for_project(&mut self, project_id: ProjectId) -> Result<Vec<EvaluationRow>> {
        let rows = sqlx::query_as::<_, EvaluationRow>(
            "SELECT * FROM evaluations WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    async fn scores_for(&mut self, evaluation_id: EvaluationId) -> Result<Vec<CategoryScoreRow>> {
        let rows = sqlx::query_as::<_, CategoryScoreRow>(
            r#"
            SELECT cs.* FROM category_scores cs
            JOIN categories c ON c.id = cs.category_id
            WHERE cs.evaluation_id = $1
            ORDER BY c.display_order
            "#,
        )
        .bind(evaluation_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    async fn insert_score(&mut self, evaluation_id: EvaluationId, entry: &ScoreEntry) -> Result<CategoryScoreRow> {
        let row = sqlx::query_as::<_, CategoryScoreRow>(
            r#"
            INSERT INTO category_scores (evaluation_id, category_id, score, comment, annotation, screenshot)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(evaluation_id)
        .bind(entry.category_id)
        .bind(entry.score)
        .bind(&entry.comment)
        .bind(&entry.annotation)
        .bind(&entry.screenshot)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Evaluations<'c> {
    type CreateRequest = EvaluationCreateDBRequest;
    type UpdateRequest = EvaluationReplaceDBRequest;
    type Response = EvaluationBundle;
    type Id = EvaluationId;
    type Filter = EvaluationFilter;

    #[instrument(skip(self, request), fields(project_id = %abbrev_uuid(&request.project_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest, scope: &Scope) -> Result<Self::Response> {
        let evaluation = sqlx::query_as::<_, EvaluationRow>(
            r#"
            INSERT INTO evaluations (project_id, website_url, notes, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, NOW(), $4)
            RETURNING *
            "#,
        )
        .bind(request.project_id)
        .bind(&request.website_url)
        .bind(&request.notes)
        .bind(&scope.username)
        .fetch_one(&mut *self.db)
        .await?;

        let mut scores = Vec::with_capacity(request.scores.len());
        for entry in &request.scores {
            scores.push(self.insert_score(evaluation.id, entry).await?);
        }

        Ok(EvaluationBundle { evaluation, scores })
    }

    #[instrument(skip(self, scope), fields(evaluation_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id, scope: &Scope) -> Result<Option<Self::Response>> {
        let evaluation = sqlx::query_as::<_, EvaluationRow>(
            "SELECT * FROM evaluations WHERE id = $1 AND ($2 OR created_by = $3)",
        )
        .bind(id)
        .bind(scope.is_admin)
        .bind(&scope.username)
        .fetch_optional(&mut *self.db)
        .await?;

        match evaluation {
            Some(evaluation) => {
                let scores = self.scores_for(evaluation.id).await?;
                Ok(Some(EvaluationBundle { evaluation, scores }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip_all, err)]
    async fn list(&mut self, filter: &Self::Filter, scope: &Scope) -> Result<Vec<Self::Response>> {
        let evaluations = sqlx::query_as::<_, EvaluationRow>(
            r#"
            SELECT * FROM evaluations
            WHERE ($1 OR created_by = $2) AND ($3::uuid IS NULL OR project_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope.is_admin)
        .bind(&scope.username)
        .bind(filter.project_id)
        .fetch_all(&mut *self.db)
        .await?;

        let mut bundles = Vec::with_capacity(evaluations.len());
        for evaluation in evaluations {
            let scores = self.scores_for(evaluation.id).await?;
            bundles.push(EvaluationBundle { evaluation, scores });
        }

        Ok(bundles)
    }

    /// Full replacement: header fields are rewritten, every existing score
    /// row is deleted and the submitted set re-inserted. Screenshots (and,
    /// when the new annotation is empty, annotations) carry over from the
    /// previous rows by category.
    #[instrument(skip(self, request, scope), fields(evaluation_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest, scope: &Scope) -> Result<Self::Response> {
        let existing = self.get_by_id(id, scope).await?.ok_or(DbError::NotFound)?;

        // Snapshot existing screenshots by category before the wipe.
        let snapshot: HashMap<CategoryId, (Vec<u8>, String)> = existing
            .scores
            .iter()
            .filter_map(|s| {
                s.screenshot
                    .as_ref()
                    .map(|blob| (s.category_id, (blob.clone(), s.annotation.clone())))
            })
            .collect();

        let evaluation = sqlx::query_as::<_, EvaluationRow>(
            r#"
            UPDATE evaluations SET
                website_url = COALESCE($4, website_url),
                notes = $5,
                updated_at = NOW(),
                updated_by = $3
            WHERE id = $1 AND ($2 OR created_by = $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope.is_admin)
        .bind(&scope.username)
        .bind(&request.website_url)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        sqlx::query("DELETE FROM category_scores WHERE evaluation_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        let mut scores = Vec::with_capacity(request.scores.len());
        for entry in &request.scores {
            let mut entry = entry.clone();
            if entry.screenshot.is_none() {
                if let Some((blob, old_annotation)) = snapshot.get(&entry.category_id) {
                    entry.screenshot = Some(blob.clone());
                    if entry.annotation.is_empty() && !old_annotation.is_empty() {
                        entry.annotation = old_annotation.clone();
                    }
                }
            }
            scores.push(self.insert_score(id, &entry).await?);
        }

        Ok(EvaluationBundle { evaluation, scores })
    }

    #[instrument(skip(self, scope), fields(evaluation_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id, scope: &Scope) -> Result<bool> {
        let result = sqlx::query("DELETE FROM evaluations WHERE id = $1 AND ($2 OR created_by = $3)")
            .bind(id)
            .bind(scope.is_admin)
            .bind(&scope.username)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::projects::{ProjectFilter, Projects};
    use crate::db::models::projects::ProjectCreateDBRequest;
    use sqlx::PgPool;

    const NAVIGATION: &str = "550e8400-e29b-41d4-a716-446655440001";
    const SEARCH: &str = "00839fa9-1488-4f9b-9850-d9c9b63ceb88";

    async fn seed_project(pool: &PgPool, scope: &Scope) -> ProjectId {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Projects::new(&mut conn);
        repo.create(
            &ProjectCreateDBRequest {
                name: "Portal".to_string(),
                description: String::new(),
                websites: vec![],
            },
            scope,
        )
        .await
        .unwrap()
        .id
    }

    fn entry(category_id: &str, score: i32, screenshot: Option<Vec<u8>>, annotation: &str) -> ScoreEntry {
        ScoreEntry {
            category_id: category_id.parse().unwrap(),
            score,
            comment: "fine".to_string(),
            annotation: annotation.to_string(),
            screenshot,
        }
    }

    #[sqlx::test]
    async fn test_create_persists_header_and_scores(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let project_id = seed_project(&pool, &alice).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Evaluations::new(&mut conn);
        let bundle = repo
            .create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://example.com".to_string(),
                    notes: "first pass".to_string(),
                    scores: vec![entry(NAVIGATION, 4, None, ""), entry(SEARCH, 2, None, "")],
                },
                &alice,
            )
            .await
            .unwrap();

        assert_eq!(bundle.evaluation.created_by, "alice");
        // Creation stamps both sets of audit fields
        assert_eq!(bundle.evaluation.updated_at, Some(bundle.evaluation.created_at));
        assert_eq!(bundle.evaluation.updated_by.as_deref(), Some("alice"));
        assert_eq!(bundle.scores.len(), 2);

        let fetched = repo.get_by_id(bundle.evaluation.id, &alice).await.unwrap().unwrap();
        assert_eq!(fetched.scores.len(), 2);
    }

    #[sqlx::test]
    async fn test_out_of_range_score_is_rejected_by_check(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let project_id = seed_project(&pool, &alice).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Evaluations::new(&mut conn);
        let result = repo
            .create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://example.com".to_string(),
                    notes: String::new(),
                    scores: vec![entry(NAVIGATION, 6, None, "")],
                },
                &alice,
            )
            .await;

        assert!(matches!(result, Err(DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    async fn test_replace_carries_over_screenshot_and_annotation(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let project_id = seed_project(&pool, &alice).await;
        let blob = vec![0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a];

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Evaluations::new(&mut conn);
        let created = repo
            .create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://example.com".to_string(),
                    notes: String::new(),
                    scores: vec![entry(NAVIGATION, 3, Some(blob.clone()), "menu is hidden")],
                },
                &alice,
            )
            .await
            .unwrap();

        // Resubmit the same category without a screenshot or annotation.
        let replaced = repo
            .update(
                created.evaluation.id,
                &EvaluationReplaceDBRequest {
                    website_url: None,
                    notes: "second pass".to_string(),
                    scores: vec![entry(NAVIGATION, 5, None, "")],
                },
                &alice,
            )
            .await
            .unwrap();

        assert_eq!(replaced.scores.len(), 1);
        let score = &replaced.scores[0];
        assert_eq!(score.score, 5);
        // Byte-identical blob and the old annotation survive
        assert_eq!(score.screenshot.as_deref(), Some(blob.as_slice()));
        assert_eq!(score.annotation, "menu is hidden");
        // Old rows are gone, not diffed: the id is fresh
        assert_ne!(score.id, created.scores[0].id);
    }

    #[sqlx::test]
    async fn test_replace_new_screenshot_wins_over_snapshot(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let project_id = seed_project(&pool, &alice).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Evaluations::new(&mut conn);
        let created = repo
            .create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://example.com".to_string(),
                    notes: String::new(),
                    scores: vec![entry(NAVIGATION, 3, Some(vec![1, 2, 3]), "old note")],
                },
                &alice,
            )
            .await
            .unwrap();

        let replaced = repo
            .update(
                created.evaluation.id,
                &EvaluationReplaceDBRequest {
                    website_url: Some("https://other.example".to_string()),
                    notes: String::new(),
                    scores: vec![entry(NAVIGATION, 4, Some(vec![9, 9]), "new note")],
                },
                &alice,
            )
            .await
            .unwrap();

        let score = &replaced.scores[0];
        assert_eq!(score.screenshot.as_deref(), Some(&[9u8, 9][..]));
        assert_eq!(score.annotation, "new note");
        assert_eq!(replaced.evaluation.website_url, "https://other.example");
        assert_eq!(replaced.evaluation.notes, "");
    }

    #[sqlx::test]
    async fn test_replace_keeps_website_url_when_absent(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let project_id = seed_project(&pool, &alice).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Evaluations::new(&mut conn);
        let created = repo
            .create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://keep.example".to_string(),
                    notes: "original".to_string(),
                    scores: vec![],
                },
                &alice,
            )
            .await
            .unwrap();

        let replaced = repo
            .update(
                created.evaluation.id,
                &EvaluationReplaceDBRequest {
                    website_url: None,
                    notes: String::new(),
                    scores: vec![],
                },
                &alice,
            )
            .await
            .unwrap();

        assert_eq!(replaced.evaluation.website_url, "https://keep.example");
        assert_eq!(replaced.evaluation.created_at, created.evaluation.created_at);
        assert!(replaced.evaluation.updated_at.is_some());
    }

    #[sqlx::test]
    async fn test_visibility_hides_other_users_evaluations(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let bob = Scope::new("bob", false);
        let project_id = seed_project(&pool, &alice).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Evaluations::new(&mut conn);
        let created = repo
            .create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://example.com".to_string(),
                    notes: String::new(),
                    scores: vec![],
                },
                &alice,
            )
            .await
            .unwrap();

        assert!(repo.get_by_id(created.evaluation.id, &bob).await.unwrap().is_none());
        assert!(matches!(
            repo.update(
                created.evaluation.id,
                &EvaluationReplaceDBRequest {
                    website_url: None,
                    notes: String::new(),
                    scores: vec![],
                },
                &bob,
            )
            .await,
            Err(DbError::NotFound)
        ));
        assert!(!repo.delete(created.evaluation.id, &bob).await.unwrap());
    }

    #[sqlx::test]
    async fn test_project_delete_cascades_to_evaluations_and_scores(pool: PgPool) {
        let alice = Scope::new("alice", false);
        let project_id = seed_project(&pool, &alice).await;

        let mut conn = pool.acquire().await.unwrap();
        let evaluation_id = {
            let mut repo = Evaluations::new(&mut conn);
            repo.create(
                &EvaluationCreateDBRequest {
                    project_id,
                    website_url: "https://example.com".to_string(),
                    notes: String::new(),
                    scores: vec![entry(NAVIGATION, 4, None, "")],
                },
                &alice,
            )
            .await
            .unwrap()
            .evaluation
            .id
        };

        {
            let mut projects = Projects::new(&mut conn);
            assert!(projects.delete(project_id, &alice).await.unwrap());
            assert!(projects.list(&ProjectFilter::default(), &alice).await.unwrap().is_empty());
        }

        let mut repo = Evaluations::new(&mut conn);
        assert!(repo.get_by_id(evaluation_id, &alice).await.unwrap().is_none());
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category_scores")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
