//! Row models and write-request types used by the repositories.

pub mod categories;
pub mod evaluations;
pub mod performance_metrics;
pub mod projects;
pub mod reports;
pub mod users;
