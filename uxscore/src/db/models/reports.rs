//! Aggregated report rows produced by the reports repository.

use crate::types::{CategoryScoreId, EvaluationId, ProjectId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One score row joined with its category, ordered by category display order.
#[derive(Debug, Clone, FromRow)]
pub struct ReportScore {
    pub id: CategoryScoreId,
    pub category_name: String,
    pub score: i32,
    pub comment: String,
    pub annotation: String,
    pub screenshot: Option<Vec<u8>>,
}

/// One evaluation with its project context and joined scores.
#[derive(Debug, Clone)]
pub struct ReportEvaluation {
    pub evaluation_id: EvaluationId,
    pub project_id: ProjectId,
    pub project_name: String,
    pub project_description: String,
    pub project_websites: Vec<String>,
    pub website_url: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub scores: Vec<ReportScore>,
}

impl ReportEvaluation {
    /// Mean of the score values rounded to one decimal place, `0.0` when the
    /// evaluation has no scores.
    pub fn average_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let sum: i32 = self.scores.iter().map(|s| s.score).sum();
        let mean = f64::from(sum) / self.scores.len() as f64;
        (mean * 10.0).round() / 10.0
    }
}

/// Minimal project header for the report filter dropdown.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectHeader {
    pub id: ProjectId,
    pub name: String,
}
