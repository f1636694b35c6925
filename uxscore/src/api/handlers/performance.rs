//! Performance metric endpoints. Samples are append-only: create, read,
//! delete, no update.

use crate::api::models::performance::{MetricCreateRequest, MetricResponse};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::PerformanceMetrics;
use crate::db::models::performance_metrics::MetricWriteDBRequest;
use crate::errors::{Error, Result};
use crate::types::MetricId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/performance",
    tag = "performance",
    summary = "Record a performance sample",
    request_body = MetricCreateRequest,
    responses(
        (status = 201, description = "Created", body = MetricResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<MetricCreateRequest>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<MetricResponse>)> {
    if request.website_url.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Website URL is required.".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = PerformanceMetrics::new(&mut conn)
        .create(&MetricWriteDBRequest::from(request), &user.scope())
        .await?;

    let location = format!("/api/performance/{}", row.id);
    Ok((
        StatusCode::CREATED,
        [(axum::http::header::LOCATION, location)],
        Json(row.into()),
    ))
}

#[utoipa::path(
    get,
    path = "/performance",
    tag = "performance",
    summary = "List visible samples",
    responses(
        (status = 200, description = "Samples newest test date first", body = Vec<MetricResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<MetricResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = PerformanceMetrics::new(&mut conn).list(&user.scope()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/performance/{id}",
    tag = "performance",
    summary = "Fetch one sample",
    responses(
        (status = 200, description = "The sample", body = MetricResponse),
        (status = 404, description = "Not found or not visible")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<MetricId>,
) -> Result<Json<MetricResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = PerformanceMetrics::new(&mut conn)
        .get_by_id(id, &user.scope())
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Performance metric".to_string(),
        })?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    delete,
    path = "/performance/{id}",
    tag = "performance",
    summary = "Delete a sample",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not visible")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<MetricId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = PerformanceMetrics::new(&mut conn).delete(id, &user.scope()).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Performance metric".to_string(),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
