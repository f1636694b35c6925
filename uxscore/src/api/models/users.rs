//! DTOs for authentication context and user administration.

use crate::db::handlers::Scope;
use crate::db::models::users::UserWithRoles;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default role when a user somehow has none assigned.
pub const DEFAULT_ROLE: &str = "Evaluator";

pub const ADMIN_ROLE: &str = "Admin";

/// The verified caller, reconstructed from token claims.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = uuid::Uuid)]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }

    /// The store-level visibility scope for this caller.
    pub fn scope(&self) -> Scope {
        Scope::new(self.username.clone(), self.is_admin())
    }
}

/// Administrative view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[schema(value_type = uuid::Uuid)]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub lockout_enabled: bool,
    pub is_locked_out: bool,
    pub access_failed_count: i32,
    /// First assigned role, defaulting to "Evaluator"
    pub role: String,
}

impl From<UserWithRoles> for UserView {
    fn from(value: UserWithRoles) -> Self {
        let UserWithRoles { user, roles } = value;
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            email_confirmed: user.email_confirmed,
            lockout_enabled: user.lockout_enabled,
            is_locked_out: user.is_locked_out(),
            access_failed_count: user.access_failed_count,
            role: roles.first().cloned().unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email_confirmed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::users::UserRow;
    use chrono::Utc;

    #[test]
    fn test_role_defaults_to_evaluator() {
        let user = UserRow {
            id: uuid::Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            email_confirmed: true,
            password_hash: String::new(),
            lockout_enabled: true,
            lockout_end: None,
            access_failed_count: 0,
            created_at: Utc::now(),
        };
        let view = UserView::from(UserWithRoles { user, roles: vec![] });
        assert_eq!(view.role, "Evaluator");
        assert!(!view.is_locked_out);
    }
}
