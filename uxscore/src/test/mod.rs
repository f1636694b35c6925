//! End-to-end tests exercising the HTTP surface against a real database.

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;
use sqlx::PgPool;

use crate::test_utils::{create_test_app, login};

const NAVIGATION: &str = "550e8400-e29b-41d4-a716-446655440001";
const VISUAL: &str = "cc0b54e0-9d3e-4fd7-9223-75f1f2c8aea5";

async fn create_project(server: &TestServer, token: &str, name: &str) -> Value {
    let response = server
        .post("/api/projects")
        .authorization_bearer(token)
        .json(&serde_json::json!({
            "name": name,
            "description": "test project",
            "websites": ["https://a.example"]
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

fn evaluation_form(project_id: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("projectId", project_id.to_string())
        .add_text("websiteUrl", "https://a.example")
        .add_text("notes", "first pass")
        .add_text("categoryScores[0].categoryId", NAVIGATION)
        .add_text("categoryScores[0].score", "4")
        .add_text("categoryScores[0].comment", "clear")
        .add_text("categoryScores[0].annotation", "menu highlighted")
        .add_part(
            "categoryScores[0].screenshot",
            Part::bytes(vec![0x89, 0x50, 0x4e, 0x47]).file_name("nav.png").mime_type("image/png"),
        )
        .add_text("categoryScores[1].categoryId", VISUAL)
        .add_text("categoryScores[1].score", "3")
        .add_text("categoryScores[1].comment", "")
}

#[sqlx::test]
#[test_log::test]
async fn test_login_and_invalid_credentials(pool: PgPool) {
    let server = create_test_app(pool).await;

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "admin", "password": "Admin123!" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["roles"][0], "Admin");
    assert_eq!(body["user"]["username"], "admin");

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "admin", "password": "wrong" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid username or password");

    // Unknown users get the same answer
    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "nobody", "password": "wrong" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
#[test_log::test]
async fn test_routes_require_a_bearer_token(pool: PgPool) {
    let server = create_test_app(pool).await;

    server
        .get("/api/projects")
        .await
        .assert_status(axum::http::StatusCode::UNAUTHORIZED);

    // The active category list is the one public read
    let response = server.get("/api/categories").await;
    response.assert_status_ok();
    let categories: Vec<Value> = response.json();
    assert_eq!(categories.len(), 10);
    assert_eq!(categories[0]["name"], "Navigation and Flow");
}

#[sqlx::test]
#[test_log::test]
async fn test_evaluation_lifecycle_and_visibility(pool: PgPool) {
    let server = create_test_app(pool).await;
    let evaluator = login(&server, "evaluator", "Evaluator123!").await;
    let admin = login(&server, "admin", "Admin123!").await;

    let project = create_project(&server, &evaluator, "Portal").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    // Create: response is the header only, no scores
    let response = server
        .post("/api/evaluations")
        .authorization_bearer(&evaluator)
        .multipart(evaluation_form(&project_id))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let header: Value = response.json();
    assert_eq!(header["projectId"].as_str().unwrap(), project_id);
    assert!(header.get("categoryScores").is_none());
    let evaluation_id = header["id"].as_str().unwrap().to_string();

    // Fetch: full bundle with base64 screenshots
    let response = server
        .get(&format!("/api/evaluations/{evaluation_id}"))
        .authorization_bearer(&evaluator)
        .await;
    response.assert_status_ok();
    let full: Value = response.json();
    let scores = full["categoryScores"].as_array().unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0]["screenshot"].as_str().unwrap(), "iVBORw=="); // 0x89504e47
    assert!(scores[1]["screenshot"].is_null());

    // Admins see everything; another evaluator sees nothing
    server
        .get(&format!("/api/evaluations/{evaluation_id}"))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();

    server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&serde_json::json!({ "username": "carol", "password": "Carol1234", "role": "Evaluator" }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    let carol = login(&server, "carol", "Carol1234").await;

    server
        .get(&format!("/api/evaluations/{evaluation_id}"))
        .authorization_bearer(&carol)
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);

    // Delete, then the evaluation is gone
    server
        .delete(&format!("/api/evaluations/{evaluation_id}"))
        .authorization_bearer(&evaluator)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/evaluations/{evaluation_id}"))
        .authorization_bearer(&evaluator)
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[sqlx::test]
#[test_log::test]
async fn test_replace_carries_screenshots_forward(pool: PgPool) {
    let server = create_test_app(pool).await;
    let token = login(&server, "evaluator", "Evaluator123!").await;

    let project = create_project(&server, &token, "Portal").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let response = server
        .post("/api/evaluations")
        .authorization_bearer(&token)
        .multipart(evaluation_form(&project_id))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let evaluation_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // Replace the same category's score without re-uploading the screenshot
    // or repeating the annotation
    let form = MultipartForm::new()
        .add_text("notes", "second pass")
        .add_text("categoryScores[0].categoryId", NAVIGATION)
        .add_text("categoryScores[0].score", "2")
        .add_text("categoryScores[0].comment", "regressed")
        .add_text("categoryScores[0].annotation", "");

    let response = server
        .put(&format!("/api/evaluations/{evaluation_id}"))
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    response.assert_status_ok();

    let replaced: Value = response.json();
    assert_eq!(replaced["notes"], "second pass");
    // websiteUrl was absent from the form, so the old one is kept
    assert_eq!(replaced["websiteUrl"], "https://a.example");

    let scores = replaced["categoryScores"].as_array().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0]["score"], 2);
    assert_eq!(scores[0]["screenshot"].as_str().unwrap(), "iVBORw==");
    assert_eq!(scores[0]["annotation"], "menu highlighted");
}

#[sqlx::test]
#[test_log::test]
async fn test_project_writes_are_admin_only(pool: PgPool) {
    let server = create_test_app(pool).await;
    let evaluator = login(&server, "evaluator", "Evaluator123!").await;
    let admin = login(&server, "admin", "Admin123!").await;

    let project = create_project(&server, &evaluator, "Portal").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    server
        .put(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&evaluator)
        .json(&serde_json::json!({ "name": "Renamed" }))
        .await
        .assert_status(axum::http::StatusCode::FORBIDDEN);

    let response = server
        .put(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&admin)
        .json(&serde_json::json!({ "name": "Renamed" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "Renamed");

    server
        .delete(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&admin)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
}

#[sqlx::test]
#[test_log::test]
async fn test_csv_report_download(pool: PgPool) {
    let server = create_test_app(pool).await;
    let token = login(&server, "evaluator", "Evaluator123!").await;

    let project = create_project(&server, &token, "Portal").await;
    let project_id = project["id"].as_str().unwrap().to_string();
    server
        .post("/api/evaluations")
        .authorization_bearer(&token)
        .multipart(evaluation_form(&project_id))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .get("/api/reports/evaluation-report/csv")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.headers()["content-type"].to_str().unwrap(), "text/csv");
    assert!(
        response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"evaluation_report_")
    );

    let csv = response.text();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Project Name,Project Description,Evaluation Website URL,Notes,Created At,User,Category,Score,Comment,Average Score"
    );
    // One row per score, 3.5 average for scores 4 and 3
    assert!(lines.next().unwrap().contains("\"Navigation and Flow\",4,\"clear\",3.5"));
    assert!(lines.next().unwrap().contains("\"Visual Design\",3,\"\",3.5"));

    // The report filter dropdown lists the project
    let response = server.get("/api/reports/projects").authorization_bearer(&token).await;
    response.assert_status_ok();
    let projects: Vec<Value> = response.json();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Portal");
}

#[sqlx::test]
#[test_log::test]
async fn test_pdf_report_download(pool: PgPool) {
    let server = create_test_app(pool).await;
    let token = login(&server, "evaluator", "Evaluator123!").await;

    let response = server
        .get("/api/reports/evaluation-report/pdf")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.headers()["content-type"].to_str().unwrap(), "application/pdf");
    assert!(response.as_bytes().starts_with(b"%PDF"));
}

#[sqlx::test]
#[test_log::test]
async fn test_user_administration_flow(pool: PgPool) {
    let server = create_test_app(pool).await;
    let admin = login(&server, "admin", "Admin123!").await;
    let evaluator = login(&server, "evaluator", "Evaluator123!").await;

    // Non-admins are rejected outright
    server
        .get("/api/users")
        .authorization_bearer(&evaluator)
        .await
        .assert_status(axum::http::StatusCode::FORBIDDEN);

    // Policy violations come back as an error list
    let response = server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&serde_json::json!({ "username": "dave", "password": "short", "role": "Evaluator" }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["errors"].as_array().unwrap().len() >= 2);

    let response = server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&serde_json::json!({ "username": "dave", "password": "Dave12345", "role": "Evaluator" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let user_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // Duplicate usernames are rejected
    let response = server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&serde_json::json!({ "username": "dave", "password": "Dave12345", "role": "Evaluator" }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // Locked accounts answer logins like a bad password
    let response = server
        .put(&format!("/api/users/{user_id}/lock"))
        .authorization_bearer(&admin)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["isLockedOut"], true);

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "dave", "password": "Dave12345" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid username or password");

    server
        .put(&format!("/api/users/{user_id}/unlock"))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();
    login(&server, "dave", "Dave12345").await;

    // Role change and password change through update
    let response = server
        .put(&format!("/api/users/{user_id}"))
        .authorization_bearer(&admin)
        .json(&serde_json::json!({
            "username": "dave",
            "password": "NewDave12345",
            "role": "Admin",
            "emailConfirmed": true
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "Admin");
    login(&server, "dave", "NewDave12345").await;

    let response = server.get("/api/users/roles").authorization_bearer(&admin).await;
    response.assert_status_ok();
    let roles: Vec<String> = response.json();
    assert_eq!(roles, vec!["Admin".to_string(), "Evaluator".to_string()]);
}

#[sqlx::test]
#[test_log::test]
async fn test_create_with_unknown_role_does_not_grow_the_registry(pool: PgPool) {
    let server = create_test_app(pool).await;
    let admin = login(&server, "admin", "Admin123!").await;

    let response = server
        .post("/api/users")
        .authorization_bearer(&admin)
        .json(&serde_json::json!({ "username": "eve", "password": "Eve123456", "role": "Superuser" }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Role 'Superuser' does not exist.");

    // No account and no new role were created
    let users: Vec<Value> = server.get("/api/users").authorization_bearer(&admin).await.json();
    assert!(users.iter().all(|u| u["username"] != "eve"));
    let roles: Vec<String> = server.get("/api/users/roles").authorization_bearer(&admin).await.json();
    assert_eq!(roles, vec!["Admin".to_string(), "Evaluator".to_string()]);
}

#[sqlx::test]
#[test_log::test]
async fn test_category_administration(pool: PgPool) {
    let server = create_test_app(pool).await;
    let admin = login(&server, "admin", "Admin123!").await;

    // Toggle one off: the public list shrinks, the admin list does not
    let response = server
        .put(&format!("/api/categories/{NAVIGATION}/toggle"))
        .authorization_bearer(&admin)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["isActive"], false);

    let active: Vec<Value> = server.get("/api/categories").await.json();
    assert_eq!(active.len(), 9);
    let all: Vec<Value> = server
        .get("/api/categories/admin")
        .authorization_bearer(&admin)
        .await
        .json();
    assert_eq!(all.len(), 10);

    // An unused category can be deleted
    server
        .delete(&format!("/api/categories/{NAVIGATION}"))
        .authorization_bearer(&admin)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
}

#[sqlx::test]
#[test_log::test]
async fn test_health_endpoint(pool: PgPool) {
    let server = create_test_app(pool).await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy!");
    assert_eq!(body["service"], "UXScore.API");
}
