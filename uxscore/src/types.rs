//! Shared identifier aliases.
//!
//! Every entity key is a UUID; the aliases keep signatures readable and make
//! it harder to pass a project id where an evaluation id is expected.

use uuid::Uuid;

pub type ProjectId = Uuid;
pub type EvaluationId = Uuid;
pub type CategoryId = Uuid;
pub type CategoryScoreId = Uuid;
pub type MetricId = Uuid;
pub type UserId = Uuid;
pub type RoleId = Uuid;

/// Shorten a UUID for log fields.
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
