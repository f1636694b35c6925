//! Category catalog endpoints. Reads of the active list are public; all
//! other operations are admin-only.

use crate::api::models::categories::{CategoryResponse, CategoryWriteRequest};
use crate::auth::middleware::RequireAdmin;
use crate::db::handlers::Categories;
use crate::db::models::categories::CategoryWriteDBRequest;
use crate::errors::{Error, Result};
use crate::types::CategoryId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

const CATEGORY_IN_USE: &str = "Cannot delete category that is in use by evaluations.";

#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    summary = "List active categories",
    responses(
        (status = 200, description = "Active categories in display order", body = Vec<CategoryResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Categories::new(&mut conn).list_active().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/categories/admin",
    tag = "categories",
    summary = "List all categories, including inactive",
    responses(
        (status = 200, description = "All categories in display order", body = Vec<CategoryResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_all(State(state): State<AppState>, _: RequireAdmin) -> Result<Json<Vec<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Categories::new(&mut conn).list_all().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Fetch one category",
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Categories::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Category".to_string(),
        })?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    summary = "Create a category",
    request_body = CategoryWriteRequest,
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not an admin")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    _: RequireAdmin,
    Json(request): Json<CategoryWriteRequest>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<CategoryResponse>)> {
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Category name is required.".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Categories::new(&mut conn)
        .create(&CategoryWriteDBRequest::from(request))
        .await?;

    let location = format!("/api/categories/{}", row.id);
    Ok((
        StatusCode::CREATED,
        [(axum::http::header::LOCATION, location)],
        Json(row.into()),
    ))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Update a category",
    request_body = CategoryWriteRequest,
    responses(
        (status = 200, description = "Updated", body = CategoryResponse),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(request): Json<CategoryWriteRequest>,
) -> Result<Json<CategoryResponse>> {
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Category name is required.".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Categories::new(&mut conn)
        .update(id, &CategoryWriteDBRequest::from(request))
        .await?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    put,
    path = "/categories/{id}/toggle",
    tag = "categories",
    summary = "Flip a category's active flag",
    responses(
        (status = 200, description = "Toggled", body = CategoryResponse),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn toggle(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Categories::new(&mut conn).toggle_active(id).await?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Delete a category",
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Category is cited by evaluations"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete(State(state): State<AppState>, _: RequireAdmin, Path(id): Path<CategoryId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = match Categories::new(&mut conn).delete(id).await {
        Ok(deleted) => deleted,
        Err(e) if e.is_category_in_use() => {
            return Err(Error::BadRequest {
                message: CATEGORY_IN_USE.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !deleted {
        return Err(Error::NotFound {
            resource: "Category".to_string(),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
