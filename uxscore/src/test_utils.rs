//! Shared helpers for integration tests.

use axum_test::TestServer;
use sqlx::PgPool;

use crate::{AppState, Config, build_router, seed_identity};

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused-in-tests".to_string(),
        jwt_secret_key: "integration-test-secret".to_string(),
        ..Config::default()
    }
}

/// Seed the default identity and stand up a test server over the pool.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    seed_identity(&pool).await.expect("Failed to seed default identity");
    let state = AppState::builder().db(pool).config(test_config()).build();
    let router = build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Log in and return the bearer token.
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": username, "password": password }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    body["token"].as_str().expect("login response has a token").to_string()
}
