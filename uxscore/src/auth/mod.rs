//! Authentication: password hashing, JWT tokens, request extractors.

pub mod middleware;
pub mod password;
pub mod token;
