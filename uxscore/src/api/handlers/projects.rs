//! Project endpoints.

use crate::api::models::projects::{ProjectResponse, ProjectWriteRequest, WebsiteEntry};
use crate::api::models::users::CurrentUser;
use crate::auth::middleware::RequireAdmin;
use crate::db::handlers::projects::ProjectFilter;
use crate::db::handlers::{Evaluations, Projects, Repository};
use crate::db::models::projects::{ProjectCreateDBRequest, ProjectRow, ProjectUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::ProjectId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sqlx::PgConnection;

/// URLs are stored comma-joined, so a comma inside one would corrupt the
/// list on read.
fn validate_websites(websites: &[String]) -> Result<()> {
    if websites.iter().any(|url| url.contains(',')) {
        return Err(Error::BadRequest {
            message: "Website URLs must not contain commas.".to_string(),
        });
    }
    Ok(())
}

async fn to_response(conn: &mut PgConnection, row: ProjectRow) -> Result<ProjectResponse> {
    let headers = Evaluations::new(conn)
        .list_headers_for_project(row.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ProjectResponse::from_row(row, headers))
}

#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    summary = "Create a project",
    request_body = ProjectWriteRequest,
    responses(
        (status = 201, description = "Created", body = ProjectResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ProjectWriteRequest>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<ProjectResponse>)> {
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Project name is required.".to_string(),
        });
    }
    let websites = request.websites.unwrap_or_default();
    validate_websites(&websites)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Projects::new(&mut conn)
        .create(
            &ProjectCreateDBRequest {
                name: request.name,
                description: request.description.unwrap_or_default(),
                websites,
            },
            &user.scope(),
        )
        .await?;

    let location = format!("/api/projects/{}", row.id);
    let response = to_response(&mut conn, row).await?;
    Ok((
        StatusCode::CREATED,
        [(axum::http::header::LOCATION, location)],
        Json(response),
    ))
}

#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    summary = "List visible projects",
    responses(
        (status = 200, description = "Projects newest first", body = Vec<ProjectResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<ProjectResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Projects::new(&mut conn).list(&ProjectFilter::default(), &user.scope()).await?;

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        responses.push(to_response(&mut conn, row).await?);
    }
    Ok(Json(responses))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    summary = "Fetch one project",
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 404, description = "Not found or not visible")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Projects::new(&mut conn)
        .get_by_id(id, &user.scope())
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Project".to_string(),
        })?;
    Ok(Json(to_response(&mut conn, row).await?))
}

#[utoipa::path(
    get,
    path = "/projects/websites",
    tag = "projects",
    summary = "Flatten all visible projects' websites",
    responses(
        (status = 200, description = "One entry per URL", body = Vec<WebsiteEntry>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_websites(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<WebsiteEntry>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Projects::new(&mut conn).list(&ProjectFilter::default(), &user.scope()).await?;

    let entries = rows
        .iter()
        .flat_map(|row| {
            row.websites_vec().into_iter().map(|url| WebsiteEntry {
                id: row.id,
                url,
                project_name: row.name.clone(),
            })
        })
        .collect();
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/projects/{id}/websites",
    tag = "projects",
    summary = "One project's websites",
    responses(
        (status = 200, description = "One entry per URL", body = Vec<WebsiteEntry>),
        (status = 404, description = "Not found or not visible")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_websites(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ProjectId>,
) -> Result<Json<Vec<WebsiteEntry>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Projects::new(&mut conn)
        .get_by_id(id, &user.scope())
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Project".to_string(),
        })?;

    let entries = row
        .websites_vec()
        .into_iter()
        .map(|url| WebsiteEntry {
            id: row.id,
            url,
            project_name: row.name.clone(),
        })
        .collect();
    Ok(Json(entries))
}

#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "projects",
    summary = "Update a project",
    request_body = ProjectWriteRequest,
    responses(
        (status = 200, description = "Updated", body = ProjectResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<ProjectId>,
    Json(request): Json<ProjectWriteRequest>,
) -> Result<Json<ProjectResponse>> {
    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Project name is required.".to_string(),
        });
    }
    let websites = request.websites.unwrap_or_default();
    validate_websites(&websites)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let row = Projects::new(&mut conn)
        .update(
            id,
            &ProjectUpdateDBRequest {
                name: request.name,
                description: request.description.unwrap_or_default(),
                websites,
            },
            &user.scope(),
        )
        .await?;
    Ok(Json(to_response(&mut conn, row).await?))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "projects",
    summary = "Delete a project and its evaluations",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<ProjectId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Projects::new(&mut conn).delete(id, &user.scope()).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Project".to_string(),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
