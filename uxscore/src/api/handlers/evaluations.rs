//! Evaluation endpoints.
//!
//! Submissions arrive as multipart forms with a zero-indexed repeating
//! `categoryScores[i].*` group. The form is drained fully into memory first,
//! then the group is walked index by index; enumeration stops at the first
//! index where both the category and the score are absent.

use std::collections::HashMap;

use crate::api::models::evaluations::{EvaluationHeader, EvaluationListQuery, EvaluationResponse};
use crate::api::models::users::CurrentUser;
use crate::db::handlers::evaluations::EvaluationFilter;
use crate::db::handlers::{Evaluations, Repository};
use crate::db::models::evaluations::{EvaluationCreateDBRequest, EvaluationReplaceDBRequest, ScoreEntry};
use crate::errors::{Error, Result};
use crate::types::EvaluationId;
use crate::AppState;
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use sqlx::Acquire;
use uuid::Uuid;

/// A fully-drained multipart submission.
#[derive(Debug, Default)]
struct EvaluationForm {
    texts: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
}

impl EvaluationForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
            message: format!("malformed multipart body: {e}"),
        })? {
            let name = field.name().unwrap_or_default().to_string();
            if name.ends_with(".screenshot") {
                let bytes = field.bytes().await.map_err(|e| Error::BadRequest {
                    message: format!("failed to read uploaded file: {e}"),
                })?;
                form.files.insert(name, bytes.to_vec());
            } else {
                let text = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("malformed multipart field: {e}"),
                })?;
                form.texts.insert(name, text);
            }
        }
        Ok(form)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }

    fn scores(&self) -> Vec<ScoreEntry> {
        parse_scores(&self.texts, &self.files)
    }
}

/// Walk `categoryScores[i].*` from i = 0. Stops when both `.categoryId` and
/// `.score` are absent; entries with an unparseable UUID or an out-of-range
/// score are skipped without failing the submission.
fn parse_scores(texts: &HashMap<String, String>, files: &HashMap<String, Vec<u8>>) -> Vec<ScoreEntry> {
    let mut entries = Vec::new();
    let mut i = 0usize;
    loop {
        let category_raw = texts.get(&format!("categoryScores[{i}].categoryId"));
        let score_raw = texts.get(&format!("categoryScores[{i}].score"));
        if category_raw.is_none() && score_raw.is_none() {
            break;
        }

        if let (Some(category_raw), Some(score_raw)) = (category_raw, score_raw) {
            let parsed = (category_raw.parse::<Uuid>(), score_raw.parse::<i32>());
            if let (Ok(category_id), Ok(score)) = parsed {
                if (1..=5).contains(&score) {
                    let screenshot = files
                        .get(&format!("categoryScores[{i}].screenshot"))
                        .filter(|bytes| !bytes.is_empty())
                        .cloned();
                    entries.push(ScoreEntry {
                        category_id,
                        score,
                        comment: texts
                            .get(&format!("categoryScores[{i}].comment"))
                            .cloned()
                            .unwrap_or_default(),
                        annotation: texts
                            .get(&format!("categoryScores[{i}].annotation"))
                            .cloned()
                            .unwrap_or_default(),
                        screenshot,
                    });
                }
            }
        }

        i += 1;
    }
    entries
}

#[utoipa::path(
    post,
    path = "/evaluations",
    tag = "evaluations",
    summary = "Create an evaluation from a multipart form",
    responses(
        (status = 201, description = "Created", body = EvaluationHeader),
        (status = 400, description = "Missing or invalid projectId / websiteUrl"),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<EvaluationHeader>)> {
    let form = EvaluationForm::from_multipart(multipart).await?;

    let project_id = form
        .text("projectId")
        .and_then(|raw| raw.parse::<Uuid>().ok())
        .filter(|id| !id.is_nil())
        .ok_or_else(|| Error::BadRequest {
            message: "Valid Project ID is required.".to_string(),
        })?;

    let website_url = form
        .text("websiteUrl")
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::BadRequest {
            message: "Website URL is required.".to_string(),
        })?
        .to_string();

    let request = EvaluationCreateDBRequest {
        project_id,
        website_url,
        notes: form.text("notes").unwrap_or_default().to_string(),
        scores: form.scores(),
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let bundle = {
        let mut repo = Evaluations::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        repo.create(&request, &user.scope()).await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let location = format!("/api/evaluations/{}", bundle.evaluation.id);
    Ok((
        StatusCode::CREATED,
        [(axum::http::header::LOCATION, location)],
        Json(EvaluationHeader::from(bundle.evaluation)),
    ))
}

#[utoipa::path(
    get,
    path = "/evaluations",
    tag = "evaluations",
    summary = "List visible evaluations",
    params(EvaluationListQuery),
    responses(
        (status = 200, description = "Evaluations newest first, with scores", body = Vec<EvaluationResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<EvaluationListQuery>,
) -> Result<Json<Vec<EvaluationResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let filter = EvaluationFilter {
        project_id: query.project_id.filter(|id| !id.is_nil()),
    };
    let bundles = Evaluations::new(&mut conn).list(&filter, &user.scope()).await?;
    Ok(Json(bundles.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/evaluations/{id}",
    tag = "evaluations",
    summary = "Fetch one evaluation with its scores",
    responses(
        (status = 200, description = "The evaluation", body = EvaluationResponse),
        (status = 404, description = "Not found or not visible")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<EvaluationId>,
) -> Result<Json<EvaluationResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let bundle = Evaluations::new(&mut conn)
        .get_by_id(id, &user.scope())
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Evaluation".to_string(),
        })?;
    Ok(Json(bundle.into()))
}

#[utoipa::path(
    put,
    path = "/evaluations/{id}",
    tag = "evaluations",
    summary = "Replace an evaluation's content from a multipart form",
    responses(
        (status = 200, description = "Replaced", body = EvaluationResponse),
        (status = 404, description = "Not found or not visible")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn replace(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<EvaluationId>,
    multipart: Multipart,
) -> Result<Json<EvaluationResponse>> {
    let form = EvaluationForm::from_multipart(multipart).await?;

    let request = EvaluationReplaceDBRequest {
        website_url: form
            .text("websiteUrl")
            .filter(|url| !url.is_empty())
            .map(String::from),
        notes: form.text("notes").unwrap_or_default().to_string(),
        scores: form.scores(),
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let bundle = {
        let mut repo = Evaluations::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        repo.update(id, &request, &user.scope()).await.map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::NotFound {
                resource: "Evaluation".to_string(),
            },
            other => other.into(),
        })?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(bundle.into()))
}

#[utoipa::path(
    delete,
    path = "/evaluations/{id}",
    tag = "evaluations",
    summary = "Delete an evaluation and its scores",
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
    Path(id): Path<EvaluationId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Evaluations::new(&mut conn).delete(id, &user.scope()).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Evaluation".to_string(),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
