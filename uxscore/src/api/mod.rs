//! HTTP API: axum handlers and their DTOs.

pub mod handlers;
pub mod models;
