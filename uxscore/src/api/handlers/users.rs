//! User administration endpoints. Every route here requires the Admin role.

use crate::api::models::users::{UserCreateRequest, UserUpdateRequest, UserView};
use crate::auth::middleware::RequireAdmin;
use crate::auth::password::{generate_reset_token, hash_string, validate_password, verify_string};
use crate::db::errors::DbError;
use crate::db::handlers::Users;
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::{Error, Result};
use crate::types::UserId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sqlx::{Acquire, PgConnection};

fn user_not_found() -> Error {
    Error::NotFound {
        resource: "User".to_string(),
    }
}

/// Change a user's password through the reset-token flow: issue a token,
/// verify it back against the stored hash, consume it, then store the new
/// password hash. Single-use and time-bounded even when both halves happen
/// in one request.
async fn reset_password(conn: &mut PgConnection, id: UserId, new_password: &str) -> Result<()> {
    let policy_errors = validate_password(new_password);
    if !policy_errors.is_empty() {
        return Err(Error::IdentityErrors { errors: policy_errors });
    }

    let mut users = Users::new(conn);
    let raw_token = generate_reset_token();
    users.issue_reset_token(id, &hash_string(&raw_token)?).await?;

    let candidates = users.valid_reset_tokens(id).await?;
    let matched = candidates
        .into_iter()
        .find(|row| verify_string(&raw_token, &row.token_hash).unwrap_or(false))
        .ok_or(Error::Internal {
            operation: "password reset token round-trip".to_string(),
        })?;

    users.consume_reset_token(matched.id).await?;
    users.set_password_hash(id, &hash_string(new_password)?).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List all user accounts",
    responses(
        (status = 200, description = "All accounts", body = Vec<UserView>),
        (status = 403, description = "Not an admin")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list(State(state): State<AppState>, _: RequireAdmin) -> Result<Json<Vec<UserView>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut conn).list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Fetch one user account",
    responses(
        (status = 200, description = "The account", body = UserView),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get(State(state): State<AppState>, _: RequireAdmin, Path(id): Path<UserId>) -> Result<Json<UserView>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/users/roles",
    tag = "users",
    summary = "List assignable role names",
    responses(
        (status = 200, description = "Role names", body = Vec<String>),
        (status = 403, description = "Not an admin")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_roles(State(state): State<AppState>, _: RequireAdmin) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let roles = Users::new(&mut conn).list_roles().await?;
    Ok(Json(roles.into_iter().map(|r| r.name).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create a user account",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "Created", body = UserView),
        (status = 400, description = "Password policy violations, username taken, or unknown role"),
        (status = 403, description = "Not an admin")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(username = %request.username))]
pub async fn create(
    State(state): State<AppState>,
    _: RequireAdmin,
    Json(request): Json<UserCreateRequest>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<UserView>)> {
    if request.username.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Username is required.".to_string(),
        });
    }
    let policy_errors = validate_password(&request.password);
    if !policy_errors.is_empty() {
        return Err(Error::IdentityErrors { errors: policy_errors });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let view = {
        let conn = tx.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut users = Users::new(conn);

        // The role registry is fixed; requests cannot grow it
        if !users.role_exists(&request.role).await? {
            return Err(Error::BadRequest {
                message: format!("Role '{}' does not exist.", request.role),
            });
        }
        let created = users
            .create(&UserCreateDBRequest {
                username: request.username.clone(),
                email: request.username.clone(),
                email_confirmed: true,
                password_hash: hash_string(&request.password)?,
            })
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => Error::IdentityErrors {
                    errors: vec![format!("Username '{}' is already taken.", request.username)],
                },
                other => other.into(),
            })?;

        users.assign_role(created.id, &request.role).await?;
        UserView::from(users.get_by_id(created.id).await?.ok_or_else(user_not_found)?)
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let location = format!("/api/users/{}", view.id);
    Ok((
        StatusCode::CREATED,
        [(axum::http::header::LOCATION, location)],
        Json(view),
    ))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    summary = "Update a user account",
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Updated", body = UserView),
        (status = 400, description = "Password policy violations or username taken"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<UserId>,
    Json(request): Json<UserUpdateRequest>,
) -> Result<Json<UserView>> {
    if request.username.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Username is required.".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let view = {
        let conn = tx.acquire().await.map_err(|e| Error::Database(e.into()))?;

        {
            let mut users = Users::new(&mut *conn);
            users.get_by_id(id).await?.ok_or_else(user_not_found)?;
            users
                .update_identity(id, &request.username, request.email_confirmed)
                .await
                .map_err(|e| match e {
                    DbError::UniqueViolation { .. } => Error::IdentityErrors {
                        errors: vec![format!("Username '{}' is already taken.", request.username)],
                    },
                    other => other.into(),
                })?;
        }

        if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
            reset_password(&mut *conn, id, password).await?;
        }

        let mut users = Users::new(&mut *conn);
        if let Some(role) = request.role.as_deref().filter(|r| !r.is_empty()) {
            // An unknown role is ignored rather than created on the fly
            if users.role_exists(role).await? {
                users.replace_roles(id, role).await?;
            }
        }

        UserView::from(users.get_by_id(id).await?.ok_or_else(user_not_found)?)
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(view))
}

#[utoipa::path(
    put,
    path = "/users/{id}/lock",
    tag = "users",
    summary = "Lock a user account indefinitely",
    responses(
        (status = 200, description = "Locked", body = UserView),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn lock(State(state): State<AppState>, _: RequireAdmin, Path(id): Path<UserId>) -> Result<Json<UserView>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    users.lock(id).await.map_err(|e| match e {
        DbError::NotFound => user_not_found(),
        other => other.into(),
    })?;
    Ok(Json(users.get_by_id(id).await?.ok_or_else(user_not_found)?.into()))
}

#[utoipa::path(
    put,
    path = "/users/{id}/unlock",
    tag = "users",
    summary = "Unlock a user account and reset its failure counter",
    responses(
        (status = 200, description = "Unlocked", body = UserView),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn unlock(State(state): State<AppState>, _: RequireAdmin, Path(id): Path<UserId>) -> Result<Json<UserView>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    users.unlock(id).await.map_err(|e| match e {
        DbError::NotFound => user_not_found(),
        other => other.into(),
    })?;
    Ok(Json(users.get_by_id(id).await?.ok_or_else(user_not_found)?.into()))
}
