//! Login endpoint.

use crate::api::models::auth::{LoginRequest, LoginResponse, LoginUser};
use crate::api::models::users::CurrentUser;
use crate::auth::{password::verify_string, token::create_token};
use crate::db::handlers::Users;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{Json, extract::State};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    summary = "Authenticate and issue a bearer token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid username or password"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(username = %request.username))]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let found = users
        .get_by_username(&request.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    // A locked account answers exactly like a bad password
    if found.user.is_locked_out() {
        return Err(invalid_credentials());
    }

    if !verify_string(&request.password, &found.user.password_hash)? {
        return Err(invalid_credentials());
    }

    let current = CurrentUser {
        id: found.user.id,
        username: found.user.username.clone(),
        email: found.user.email.clone(),
        roles: found.roles.clone(),
    };
    let token = create_token(&current, &state.config)?;

    Ok(Json(LoginResponse {
        token,
        roles: found.roles,
        user: LoginUser {
            id: found.user.id,
            username: found.user.username,
            email: found.user.email,
        },
    }))
}
