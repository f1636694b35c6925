//! OpenAPI documentation for the API, served at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token from `POST /api/auth/login`. Include it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "UX Score API",
        description = "Multi-user service for recording and reporting qualitative UX evaluations of websites"
    ),
    servers(
        (url = "/api", description = "API server")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::login,
        api::handlers::projects::create,
        api::handlers::projects::list,
        api::handlers::projects::get,
        api::handlers::projects::list_websites,
        api::handlers::projects::get_websites,
        api::handlers::projects::update,
        api::handlers::projects::delete,
        api::handlers::evaluations::create,
        api::handlers::evaluations::list,
        api::handlers::evaluations::get,
        api::handlers::evaluations::replace,
        api::handlers::evaluations::delete,
        api::handlers::categories::list_active,
        api::handlers::categories::list_all,
        api::handlers::categories::get,
        api::handlers::categories::create,
        api::handlers::categories::update,
        api::handlers::categories::toggle,
        api::handlers::categories::delete,
        api::handlers::performance::create,
        api::handlers::performance::list,
        api::handlers::performance::get,
        api::handlers::performance::delete,
        api::handlers::reports::evaluation_report,
        api::handlers::reports::evaluation_report_csv,
        api::handlers::reports::evaluation_report_pdf,
        api::handlers::reports::projects_for_filter,
        api::handlers::users::list,
        api::handlers::users::get,
        api::handlers::users::list_roles,
        api::handlers::users::create,
        api::handlers::users::update,
        api::handlers::users::lock,
        api::handlers::users::unlock,
    ),
    components(
        schemas(
            api::models::auth::LoginRequest,
            api::models::auth::LoginResponse,
            api::models::auth::LoginUser,
            api::models::projects::ProjectWriteRequest,
            api::models::projects::ProjectResponse,
            api::models::projects::WebsiteEntry,
            api::models::evaluations::EvaluationHeader,
            api::models::evaluations::EvaluationResponse,
            api::models::evaluations::CategoryScoreResponse,
            api::models::categories::CategoryResponse,
            api::models::categories::CategoryWriteRequest,
            api::models::performance::MetricResponse,
            api::models::performance::MetricCreateRequest,
            api::models::reports::ReportRow,
            api::models::reports::ReportScoreDto,
            api::models::reports::ScreenshotAnnotationDto,
            api::handlers::reports::ReportProject,
            api::models::users::UserView,
            api::models::users::UserCreateRequest,
            api::models::users::UserUpdateRequest,
        )
    ),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "projects", description = "Project management"),
        (name = "evaluations", description = "UX evaluations with category scores and screenshots"),
        (name = "categories", description = "Evaluation category catalog"),
        (name = "performance", description = "Website performance samples"),
        (name = "reports", description = "Evaluation reporting and exports"),
        (name = "users", description = "User administration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_builds() {
        let spec = ApiDoc::openapi();
        let json = spec.to_json().unwrap();
        assert!(json.contains("/auth/login"));
        assert!(json.contains("/reports/evaluation-report/pdf"));
        assert!(json.contains("BearerAuth"));
    }
}
