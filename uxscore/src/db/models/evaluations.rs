//! Database models for evaluations and their category scores.

use crate::types::{CategoryId, CategoryScoreId, EvaluationId, ProjectId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct EvaluationRow {
    pub id: EvaluationId,
    pub project_id: ProjectId,
    pub website_url: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryScoreRow {
    pub id: CategoryScoreId,
    pub evaluation_id: EvaluationId,
    pub category_id: CategoryId,
    pub score: i32,
    pub comment: String,
    pub annotation: String,
    pub screenshot: Option<Vec<u8>>,
}

/// One validated score entry from a submission, ready to insert.
#[derive(Debug, Clone)]
pub struct ScoreEntry {
    pub category_id: CategoryId,
    pub score: i32,
    pub comment: String,
    pub annotation: String,
    pub screenshot: Option<Vec<u8>>,
}

/// Database request for creating an evaluation with its scores
#[derive(Debug, Clone)]
pub struct EvaluationCreateDBRequest {
    pub project_id: ProjectId,
    pub website_url: String,
    pub notes: String,
    pub scores: Vec<ScoreEntry>,
}

/// Database request for replacing an evaluation's content.
///
/// `website_url` is `Some` only when the submission carried a non-empty
/// value; `notes` is always set verbatim. The score set is a full
/// replacement; screenshot carry-over happens inside the repository against
/// the stored rows.
#[derive(Debug, Clone)]
pub struct EvaluationReplaceDBRequest {
    pub website_url: Option<String>,
    pub notes: String,
    pub scores: Vec<ScoreEntry>,
}

/// An evaluation header together with its score rows.
#[derive(Debug, Clone)]
pub struct EvaluationBundle {
    pub evaluation: EvaluationRow,
    pub scores: Vec<CategoryScoreRow>,
}
