//! Request and response DTOs for the HTTP API.

pub mod auth;
pub mod categories;
pub mod evaluations;
pub mod performance;
pub mod projects;
pub mod reports;
pub mod users;
