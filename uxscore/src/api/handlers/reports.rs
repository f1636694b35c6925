//! Report endpoints: the evaluation report as JSON, CSV, or PDF, plus the
//! project list feeding the report filter.

use crate::api::models::reports::{ReportQuery, ReportRow};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::reports::{ReportFilter, Reports};
use crate::errors::{Error, Result};
use crate::reports::{csv, pdf, report_filename};
use crate::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportProject {
    #[schema(value_type = uuid::Uuid)]
    pub id: crate::types::ProjectId,
    pub name: String,
}

impl From<ReportQuery> for ReportFilter {
    fn from(query: ReportQuery) -> Self {
        Self {
            project_id: query.project_id.filter(|id| !id.is_nil()),
            start_date: query.start_date,
            end_date: query.end_date,
        }
    }
}

fn attachment_headers(content_type: &'static str, filename: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type.parse().map_err(|_| Error::Internal {
        operation: "build report response headers".to_string(),
    })?);
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\"")
            .parse()
            .map_err(|_| Error::Internal {
                operation: "build report response headers".to_string(),
            })?,
    );
    Ok(headers)
}

#[utoipa::path(
    get,
    path = "/reports/evaluation-report",
    tag = "reports",
    summary = "Evaluation report rows",
    params(ReportQuery),
    responses(
        (status = 200, description = "One row per visible evaluation", body = Vec<ReportRow>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn evaluation_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ReportRow>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Reports::new(&mut conn)
        .evaluation_report(&query.into(), &user.scope())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/reports/evaluation-report/csv",
    tag = "reports",
    summary = "Evaluation report as a CSV download",
    params(ReportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn evaluation_report_csv(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Reports::new(&mut conn)
        .evaluation_report(&query.into(), &user.scope())
        .await?;

    let headers = attachment_headers("text/csv", &report_filename("csv"))?;
    Ok((headers, csv::render(&rows)))
}

#[utoipa::path(
    get,
    path = "/reports/evaluation-report/pdf",
    tag = "reports",
    summary = "Evaluation report as a PDF download",
    params(ReportQuery),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf"),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn evaluation_report_pdf(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Reports::new(&mut conn)
        .evaluation_report(&query.into(), &user.scope())
        .await?;

    let headers = attachment_headers("application/pdf", &report_filename("pdf"))?;
    Ok((headers, pdf::render(&rows)?))
}

#[utoipa::path(
    get,
    path = "/reports/projects",
    tag = "reports",
    summary = "Visible projects that have evaluations",
    responses(
        (status = 200, description = "Projects for the report filter", body = Vec<ReportProject>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn projects_for_filter(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ReportProject>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let headers = Reports::new(&mut conn).projects_with_evaluations(&user.scope()).await?;
    Ok(Json(
        headers
            .into_iter()
            .map(|h| ReportProject { id: h.id, name: h.name })
            .collect(),
    ))
}
