//! Request extractors that gate handlers on a verified bearer token.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::{AppState, api::models::users::CurrentUser, auth::token::verify_token, errors::Error};

fn bearer_token(parts: &Parts) -> Result<&str, Error> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(Error::Unauthenticated { message: None })?
        .to_str()
        .map_err(|_| Error::Unauthenticated { message: None })?;

    header
        .strip_prefix("Bearer ")
        .ok_or(Error::Unauthenticated { message: None })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        verify_token(token, &state.config)
    }
}

/// Extractor for admin-only routes. Role failure is 403; per-row visibility
/// misses elsewhere stay 404.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(Error::Forbidden);
        }
        Ok(RequireAdmin(user))
    }
}
