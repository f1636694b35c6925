//! DTOs for the category catalog.

use crate::db::models::categories::{CategoryRow, CategoryWriteDBRequest};
use crate::types::CategoryId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    #[schema(value_type = uuid::Uuid)]
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub display_order: i32,
}

impl From<CategoryRow> for CategoryResponse {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            display_order: row.display_order,
        }
    }
}

/// Create/update payload; both operations set the full field set.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWriteRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
}

fn default_true() -> bool {
    true
}

impl From<CategoryWriteRequest> for CategoryWriteDBRequest {
    fn from(request: CategoryWriteRequest) -> Self {
        Self {
            name: request.name,
            description: request.description.unwrap_or_default(),
            is_active: request.is_active,
            display_order: request.display_order,
        }
    }
}
