//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (so callers choose whether to
//! run inside a transaction), provides strongly-typed operations, and returns
//! row models from [`crate::db::models`].
//!
//! The scoped repositories ([`Projects`], [`Evaluations`],
//! [`PerformanceMetrics`]) implement the [`Repository`] trait and take a
//! [`Scope`] on every call; [`Categories`], [`Users`] and [`Reports`] have
//! their own method sets.

pub mod categories;
pub mod evaluations;
pub mod performance_metrics;
pub mod projects;
pub mod reports;
pub mod repository;
pub mod users;

pub use categories::Categories;
pub use evaluations::Evaluations;
pub use performance_metrics::PerformanceMetrics;
pub use projects::Projects;
pub use reports::Reports;
pub use repository::Repository;
pub use users::Users;

/// Caller identity as seen by the store: the username rows are owned by, and
/// whether the admin override applies.
#[derive(Debug, Clone)]
pub struct Scope {
    pub username: String,
    pub is_admin: bool,
}

impl Scope {
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            username: username.into(),
            is_admin,
        }
    }
}
