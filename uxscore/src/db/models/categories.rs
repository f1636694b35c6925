//! Database models for evaluation categories.

use crate::types::CategoryId;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub display_order: i32,
}

/// Database request for creating or updating a category. Both operations set
/// the full field set.
#[derive(Debug, Clone)]
pub struct CategoryWriteDBRequest {
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub display_order: i32,
}
