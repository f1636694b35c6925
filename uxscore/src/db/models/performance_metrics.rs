//! Database models for performance metrics.

use crate::types::MetricId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct MetricRow {
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
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

/// Database request for creating a metric sample.
#[derive(Debug, Clone)]
pub struct MetricWriteDBRequest {
    pub website_url: String,
    pub load_time_ms: i32,
    pub response_time_ms: i32,
    pub dom_content_loaded_ms: i32,
    pub first_paint_ms: i32,
    pub performance_score: i32,
    pub test_date: DateTime<Utc>,
    pub test_location: String,
}
