//! DTOs for projects and their website lists.

use crate::api::models::evaluations::EvaluationHeader;
use crate::db::models::projects::ProjectRow;
use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Create/update payload. Description and websites are optional on the
/// wire and default to empty.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWriteRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub websites: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub websites: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub evaluations: Vec<EvaluationHeader>,
}

impl ProjectResponse {
    pub fn from_row(row: ProjectRow, evaluations: Vec<EvaluationHeader>) -> Self {
        let websites = row.websites_vec();
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            websites,
            created_at: row.created_at,
            created_by: row.created_by,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
            evaluations,
        }
    }
}

/// One URL of one project, for the flattened website listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteEntry {
    #[schema(value_type = uuid::Uuid)]
    pub id: ProjectId,
    pub url: String,
    pub project_name: String,
}
