//! DTOs for performance metric samples.

use crate::db::models::performance_metrics::{MetricRow, MetricWriteDBRequest};
use crate::types::MetricId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: MetricId,
    pub website_url: String,
    pub load_time_ms: i32,
    pub response_time_ms: i32,
    pub dom_content_loaded_ms: i32,
    pub first_paint_ms: i32,
    pub performance_score: i32,
    pub test_date: DateTime<Utc>,
    pub test_location: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl From<MetricRow> for MetricResponse {
    fn from(row: MetricRow) -> Self {
        Self {
            id: row.id,
            website_url: row.website_url,
            load_time_ms: row.load_time_ms,
            response_time_ms: row.response_time_ms,
            dom_content_loaded_ms: row.dom_content_loaded_ms,
            first_paint_ms: row.first_paint_ms,
            performance_score: row.performance_score,
            test_date: row.test_date,
            test_location: row.test_location,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricCreateRequest {
    pub website_url: String,
    pub load_time_ms: i32,
    pub response_time_ms: i32,
    pub dom_content_loaded_ms: i32,
    pub first_paint_ms: i32,
    pub performance_score: i32,
    pub test_date: DateTime<Utc>,
    #[serde(default)]
    pub test_location: Option<String>,
}

impl From<MetricCreateRequest> for MetricWriteDBRequest {
    fn from(request: MetricCreateRequest) -> Self {
        Self {
            website_url: request.website_url,
            load_time_ms: request.load_time_ms,
            response_time_ms: request.response_time_ms,
            dom_content_loaded_ms: request.dom_content_loaded_ms,
            first_paint_ms: request.first_paint_ms,
            performance_score: request.performance_score,
            test_date: request.test_date,
            test_location: request.test_location.unwrap_or_default(),
        }
    }
}
