//! Database layer: repositories, row models, error categorization.

pub mod errors;
pub mod handlers;
pub mod models;
