//! Database repository for identity: users, roles, password reset tokens.
//!
//! The role registry is tiny (Admin, Evaluator) but kept as a real table so
//! role assignment can validate against it, the way the identity layer the
//! API fronts for does.

use chrono::{Duration, Utc};
use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    models::users::{ResetTokenRow, RoleRow, UserCreateDBRequest, UserRow, UserWithRoles},
};
use crate::types::{UserId, abbrev_uuid};

/// Reset tokens are short-lived; they exist only to bridge the
/// issue-then-apply password change flow.
const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// Lock means "indefinitely": a hundred years out.
const LOCKOUT_YEARS: i64 = 100;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    async fn roles_for(&mut self, user_id: UserId) -> Result<Vec<String>> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(roles)
    }

    async fn with_roles(&mut self, user: UserRow) -> Result<UserWithRoles> {
        let roles = self.roles_for(user.id).await?;
        Ok(UserWithRoles { user, roles })
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserWithRoles>> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        match user {
            Some(user) => Ok(Some(self.with_roles(user).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserWithRoles>> {
        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match user {
            Some(user) => Ok(Some(self.with_roles(user).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, err)]
    pub async fn list(&mut self) -> Result<Vec<UserWithRoles>> {
        let users = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY username")
            .fetch_all(&mut *self.db)
            .await?;

        let mut out = Vec::with_capacity(users.len());
        for user in users {
            out.push(self.with_roles(user).await?);
        }
        Ok(out)
    }

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserRow> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, email_confirmed, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(request.email_confirmed)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    /// Set username/email (one string serves as both) and the confirmed flag.
    #[instrument(skip(self, username), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update_identity(&mut self, id: UserId, username: &str, email_confirmed: bool) -> Result<UserRow> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET username = $2, email = $2, email_confirmed = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email_confirmed)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    #[instrument(skip(self, password_hash), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn set_password_hash(&mut self, id: UserId, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn lock(&mut self, id: UserId) -> Result<UserRow> {
        let lockout_end = Utc::now() + Duration::days(365 * LOCKOUT_YEARS);
        let user = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET lockout_end = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(lockout_end)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn unlock(&mut self, id: UserId) -> Result<UserRow> {
        let user = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET lockout_end = NULL, access_failed_count = 0 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    // Role registry -------------------------------------------------------

    #[instrument(skip_all, err)]
    pub async fn list_roles(&mut self) -> Result<Vec<RoleRow>> {
        let roles = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(roles)
    }

    #[instrument(skip(self), err)]
    pub async fn role_exists(&mut self, name: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1)")
            .bind(name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Insert the role if the registry does not know it yet. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn ensure_role(&mut self, name: &str) -> Result<RoleRow> {
        let role = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING *
            "#,
        )
        .bind(name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(role)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn assign_role(&mut self, user_id: UserId, role_name: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, id FROM roles WHERE name = $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_name)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    /// Drop every current role and assign the given one.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn replace_roles(&mut self, user_id: UserId, role_name: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        self.assign_role(user_id, role_name).await
    }

    // Password reset tokens ------------------------------------------------

    /// Issue a reset token for the user and return the raw token. Only the
    /// hash is stored.
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn issue_reset_token(&mut self, user_id: UserId, token_hash: &str) -> Result<ResetTokenRow> {
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Mark a token consumed; returns the rows still valid for the user so
    /// the caller can verify the raw token against their hashes.
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn valid_reset_tokens(&mut self, user_id: UserId) -> Result<Vec<ResetTokenRow>> {
        let rows = sqlx::query_as::<_, ResetTokenRow>(
            r#"
            SELECT * FROM password_reset_tokens
            WHERE user_id = $1 AND used_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), fields(token_id = %abbrev_uuid(&token_id)), err)]
    pub async fn consume_reset_token(&mut self, token_id: uuid::Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL",
        )
        .bind(token_id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
