//! Database models for identity: users, roles, reset tokens.

use crate::types::{RoleId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub password_hash: String,
    pub lockout_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub access_failed_count: i32,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// A user is locked out while a future lockout end is set.
    pub fn is_locked_out(&self) -> bool {
        self.lockout_enabled
            && self
                .lockout_end
                .map(|end| end > Utc::now())
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: RoleId,
    pub name: String,
}

/// A user together with its role names.
#[derive(Debug, Clone)]
pub struct UserWithRoles {
    pub user: UserRow,
    pub roles: Vec<String>,
}

/// Database request for creating a user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    pub email_confirmed: bool,
    pub password_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ResetTokenRow {
    pub id: uuid::Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(lockout_end: Option<DateTime<Utc>>, lockout_enabled: bool) -> UserRow {
        UserRow {
            id: uuid::Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            email_confirmed: true,
            password_hash: String::new(),
            lockout_enabled,
            lockout_end,
            access_failed_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_lockout_state() {
        assert!(!user(None, true).is_locked_out());
        assert!(user(Some(Utc::now() + Duration::days(1)), true).is_locked_out());
        assert!(!user(Some(Utc::now() - Duration::days(1)), true).is_locked_out());
        // Lockout disabled overrides a future end date
        assert!(!user(Some(Utc::now() + Duration::days(1)), false).is_locked_out());
    }
}
