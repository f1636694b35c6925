//! DTOs for evaluations and category scores.

use crate::db::models::evaluations::{CategoryScoreRow, EvaluationBundle, EvaluationRow};
use crate::types::{CategoryId, CategoryScoreId, EvaluationId, ProjectId};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Evaluation header fields, without scores. Returned from create and
/// embedded in project responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationHeader {
    #[schema(value_type = uuid::Uuid)]
    pub id: EvaluationId,
    #[schema(value_type = uuid::Uuid)]
    pub project_id: ProjectId,
    pub website_url: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl From<EvaluationRow> for EvaluationHeader {
    fn from(row: EvaluationRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            website_url: row.website_url,
            notes: row.notes,
            created_at: row.created_at,
            created_by: row.created_by,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScoreResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: CategoryScoreId,
    #[schema(value_type = uuid::Uuid)]
    pub category_id: CategoryId,
    pub score: i32,
    pub comment: String,
    pub annotation: String,
    /// Base64-encoded blob, absent when no screenshot was captured
    pub screenshot: Option<String>,
}

impl From<CategoryScoreRow> for CategoryScoreResponse {
    fn from(row: CategoryScoreRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            score: row.score,
            comment: row.comment,
            annotation: row.annotation,
            screenshot: row.screenshot.map(|blob| STANDARD.encode(blob)),
        }
    }
}

/// Full evaluation with its scores, for list/fetch/replace responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    #[serde(flatten)]
    pub header: EvaluationHeader,
    pub category_scores: Vec<CategoryScoreResponse>,
}

impl From<EvaluationBundle> for EvaluationResponse {
    fn from(bundle: EvaluationBundle) -> Self {
        Self {
            header: EvaluationHeader::from(bundle.evaluation),
            category_scores: bundle.scores.into_iter().map(Into::into).collect(),
        }
    }
}

/// Query parameters for the evaluation listing.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationListQuery {
    #[serde(default)]
    #[param(value_type = Option<uuid::Uuid>)]
    pub project_id: Option<ProjectId>,
}
