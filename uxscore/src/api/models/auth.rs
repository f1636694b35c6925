//! Login DTOs.

use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub roles: Vec<String>,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginUser {
    #[schema(value_type = uuid::Uuid)]
    pub id: UserId,
    pub username: String,
    pub email: String,
}
