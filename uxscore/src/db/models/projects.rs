//! Database models for projects.

use crate::types::ProjectId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A project row as stored. `websites` holds the comma-joined URL list;
/// the codec below owns the encoding so the rest of the crate only sees
/// `Vec<String>`.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub websites: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl ProjectRow {
    pub fn websites_vec(&self) -> Vec<String> {
        split_websites(self.websites.as_deref())
    }
}

/// Database request for creating a project
#[derive(Debug, Clone)]
pub struct ProjectCreateDBRequest {
    pub name: String,
    pub description: String,
    pub websites: Vec<String>,
}

/// Database request for updating a project (full replacement of fields)
#[derive(Debug, Clone)]
pub struct ProjectUpdateDBRequest {
    pub name: String,
    pub description: String,
    pub websites: Vec<String>,
}

/// Join a URL list into the stored form. Empty list stores as NULL.
pub fn join_websites(websites: &[String]) -> Option<String> {
    if websites.is_empty() {
        None
    } else {
        Some(websites.join(","))
    }
}

/// Split the stored form back into a URL list, dropping empty tokens.
/// NULL round-trips to the empty list.
pub fn split_websites(stored: Option<&str>) -> Vec<String> {
    stored
        .map(|s| {
            s.split(',')
                .filter(|part| !part.is_empty())
                .map(|part| part.to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websites_round_trip() {
        let urls = vec!["https://a.example".to_string(), "https://b.example".to_string()];
        let stored = join_websites(&urls);
        assert_eq!(stored.as_deref(), Some("https://a.example,https://b.example"));
        assert_eq!(split_websites(stored.as_deref()), urls);
    }

    #[test]
    fn test_empty_list_stores_as_null() {
        assert_eq!(join_websites(&[]), None);
        assert_eq!(split_websites(None), Vec::<String>::new());
    }

    #[test]
    fn test_empty_tokens_dropped_on_read() {
        assert_eq!(
            split_websites(Some(",https://a.example,,")),
            vec!["https://a.example".to_string()]
        );
        assert_eq!(split_websites(Some("")), Vec::<String>::new());
    }
}
