//! DTOs and query parameters for the report endpoints.

use crate::db::models::reports::ReportEvaluation;
use crate::types::{CategoryScoreId, EvaluationId, ProjectId};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters shared by the report endpoints. Dates accept RFC 3339
/// timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(default)]
    #[param(value_type = Option<uuid::Uuid>)]
    pub project_id: Option<ProjectId>,
    #[serde(default, deserialize_with = "deserialize_flexible_date")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_flexible_date")]
    pub end_date: Option<DateTime<Utc>>,
}

pub fn parse_flexible_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| format!("invalid date: {s}"))?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }
    Err(format!("invalid date: {s}"))
}

fn deserialize_flexible_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_flexible_date(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportScoreDto {
    #[schema(value_type = uuid::Uuid)]
    pub id: CategoryScoreId,
    pub category: String,
    pub score: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotAnnotationDto {
    #[schema(value_type = uuid::Uuid)]
    pub id: CategoryScoreId,
    pub category: String,
    /// The score's annotation text
    pub comment: String,
    /// Base64-encoded screenshot
    pub screenshot: String,
}

/// One report row per evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[schema(value_type = uuid::Uuid)]
    pub evaluation_id: EvaluationId,
    #[schema(value_type = uuid::Uuid)]
    pub project_id: ProjectId,
    pub project_name: String,
    pub project_description: String,
    pub project_websites: Vec<String>,
    pub website_url: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    /// Username of the evaluator
    pub user_id: String,
    pub average_score: f64,
    pub category_scores: Vec<ReportScoreDto>,
    pub screenshot_annotations: Vec<ScreenshotAnnotationDto>,
}

impl From<ReportEvaluation> for ReportRow {
    fn from(row: ReportEvaluation) -> Self {
        let average_score = row.average_score();
        let category_scores = row
            .scores
            .iter()
            .map(|s| ReportScoreDto {
                id: s.id,
                category: s.category_name.clone(),
                score: s.score,
                comment: s.comment.clone(),
            })
            .collect();
        let screenshot_annotations = row
            .scores
            .iter()
            .filter_map(|s| {
                s.screenshot.as_ref().map(|blob| ScreenshotAnnotationDto {
                    id: s.id,
                    category: s.category_name.clone(),
                    comment: s.annotation.clone(),
                    screenshot: STANDARD.encode(blob),
                })
            })
            .collect();

        Self {
            evaluation_id: row.evaluation_id,
            project_id: row.project_id,
            project_name: row.project_name,
            project_description: row.project_description,
            project_websites: row.project_websites,
            website_url: row.website_url,
            notes: row.notes,
            created_at: row.created_at,
            user_id: row.created_by,
            average_score,
            category_scores,
            screenshot_annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flexible_date() {
        let date_only = parse_flexible_date("2025-03-14").unwrap();
        assert_eq!(date_only.to_rfc3339(), "2025-03-14T00:00:00+00:00");

        let full = parse_flexible_date("2025-03-14T12:30:00Z").unwrap();
        assert_eq!(full.timestamp(), date_only.timestamp() + 12 * 3600 + 30 * 60);

        assert!(parse_flexible_date("14/03/2025").is_err());
    }

    #[test]
    fn test_report_query_from_query_string() {
        let query: ReportQuery =
            serde_urlencoded::from_str("startDate=2025-01-01&endDate=2025-12-31T23:59:59Z").unwrap();
        assert!(query.project_id.is_none());
        assert!(query.start_date.is_some());
        assert!(query.end_date.is_some());
    }
}
