//! # uxscore: UX evaluation service
//!
//! `uxscore` is a multi-user web service for recording and reporting
//! qualitative UX evaluations of websites. Evaluators group their work into
//! projects, submit evaluations scoring a website against a configurable
//! category catalog (optionally attaching annotated screenshots), and record
//! standalone performance samples. Reports aggregate the evaluations per
//! project and export as JSON, CSV, or PDF.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum) with PostgreSQL
//! for all persistence. The **API layer** ([`api`]) exposes RESTful routes
//! under `/api/*`; the **authentication layer** ([`auth`]) issues and
//! verifies JWT bearer tokens and enforces the Admin/Evaluator role split;
//! the **database layer** ([`db`]) uses the repository pattern, with each
//! repository scoping reads and writes to the caller (admins see everything,
//! evaluators see their own rows).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use uxscore::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = uxscore::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     uxscore::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod reports;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::{ADMIN_ROLE, DEFAULT_ROLE},
    auth::password,
    db::handlers::Users,
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Redirect};
use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Evaluations carry screenshot uploads, so their routes take larger bodies.
const MAX_EVALUATION_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the uxscore database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Ensure the role registry and the two default accounts exist.
///
/// Idempotent: existing users are left untouched, including their passwords.
#[instrument(skip_all)]
pub async fn seed_identity(db: &PgPool) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    for role in [ADMIN_ROLE, DEFAULT_ROLE] {
        users.ensure_role(role).await?;
    }

    let defaults = [
        ("admin", "admin@uxscore.com", "Admin123!", ADMIN_ROLE),
        ("evaluator", "evaluator@uxscore.com", "Evaluator123!", DEFAULT_ROLE),
    ];

    for (username, email, password, role) in defaults {
        if users.get_by_username(username).await?.is_some() {
            continue;
        }
        let created = users
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: email.to_string(),
                email_confirmed: true,
                password_hash: password::hash_string(password)?,
            })
            .await?;
        users.assign_role(created.id, role).await?;
        info!(username, role, "Created default user");
    }

    tx.commit().await?;
    Ok(())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .expose_headers(vec![header::LOCATION, header::CONTENT_DISPOSITION]))
}

/// Redirect plain HTTP to HTTPS when running behind a TLS-terminating proxy.
async fn https_redirect(request: axum::extract::Request, next: axum::middleware::Next) -> axum::response::Response {
    let forwarded_proto = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok());

    if forwarded_proto == Some("http")
        && let Some(host) = request.headers().get(header::HOST).and_then(|v| v.to_str().ok())
    {
        let target = format!("https://{host}{}", request.uri());
        return Redirect::permanent(&target).into_response();
    }

    next.run(request).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy!",
        "timestamp": chrono::Utc::now(),
        "service": "UXScore.API",
    }))
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Multipart evaluation routes get a raised body limit for screenshots
    let evaluation_routes = Router::new()
        .route(
            "/evaluations",
            post(api::handlers::evaluations::create).get(api::handlers::evaluations::list),
        )
        .route(
            "/evaluations/{id}",
            get(api::handlers::evaluations::get)
                .put(api::handlers::evaluations::replace)
                .delete(api::handlers::evaluations::delete),
        )
        .layer(DefaultBodyLimit::max(MAX_EVALUATION_BODY_BYTES));

    let api_routes = Router::new()
        .route("/auth/login", post(api::handlers::auth::login))
        // Projects
        .route(
            "/projects",
            get(api::handlers::projects::list).post(api::handlers::projects::create),
        )
        .route("/projects/websites", get(api::handlers::projects::list_websites))
        .route(
            "/projects/{id}",
            get(api::handlers::projects::get)
                .put(api::handlers::projects::update)
                .delete(api::handlers::projects::delete),
        )
        .route("/projects/{id}/websites", get(api::handlers::projects::get_websites))
        // Evaluations
        .merge(evaluation_routes)
        // Categories
        .route(
            "/categories",
            get(api::handlers::categories::list_active).post(api::handlers::categories::create),
        )
        .route("/categories/admin", get(api::handlers::categories::list_all))
        .route(
            "/categories/{id}",
            get(api::handlers::categories::get)
                .put(api::handlers::categories::update)
                .delete(api::handlers::categories::delete),
        )
        .route("/categories/{id}/toggle", put(api::handlers::categories::toggle))
        // Performance metrics
        .route(
            "/performance",
            get(api::handlers::performance::list).post(api::handlers::performance::create),
        )
        .route(
            "/performance/{id}",
            get(api::handlers::performance::get).delete(api::handlers::performance::delete),
        )
        // Reports
        .route("/reports/evaluation-report", get(api::handlers::reports::evaluation_report))
        .route(
            "/reports/evaluation-report/csv",
            get(api::handlers::reports::evaluation_report_csv),
        )
        .route(
            "/reports/evaluation-report/pdf",
            get(api::handlers::reports::evaluation_report_pdf),
        )
        .route("/reports/projects", get(api::handlers::reports::projects_for_filter))
        // User administration
        .route("/users", get(api::handlers::users::list).post(api::handlers::users::create))
        .route("/users/roles", get(api::handlers::users::list_roles))
        .route(
            "/users/{id}",
            get(api::handlers::users::get).put(api::handlers::users::update),
        )
        .route("/users/{id}/lock", put(api::handlers::users::lock))
        .route("/users/{id}/unlock", put(api::handlers::users::unlock));

    let cors_layer = create_cors_layer(&state.config)?;
    let use_https_redirection = state.config.use_https_redirection;

    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if use_https_redirection {
        router = router.layer(axum::middleware::from_fn(https_redirect));
    }

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the database, run migrations, seed identity, and build the
    /// router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPool::connect(&config.database_url).await?;
        migrator().run(&pool).await?;
        seed_identity(&pool).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("UX Score API listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
