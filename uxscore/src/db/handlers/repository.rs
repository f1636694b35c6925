//! Base repository trait for database operations.

use crate::db::errors::Result;
use crate::db::handlers::Scope;

/// Base repository trait for the caller-scoped entities (projects,
/// evaluations, performance metrics).
///
/// Every operation takes the caller [`Scope`]; the visibility predicate
/// (admin, or `created_by` equals the caller's username) is applied inside
/// the SQL so reads and writes answer identically for rows the caller cannot
/// see.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity owned by the caller
    async fn create(&mut self, request: &Self::CreateRequest, scope: &Scope) -> Result<Self::Response>;

    /// Get an entity by ID if it is visible to the caller
    async fn get_by_id(&mut self, id: Self::Id, scope: &Scope) -> Result<Option<Self::Response>>;

    /// List entities visible to the caller
    async fn list(&mut self, filter: &Self::Filter, scope: &Scope) -> Result<Vec<Self::Response>>;

    /// Update an entity by ID; invisible rows report not-found
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest, scope: &Scope) -> Result<Self::Response>;

    /// Delete an entity by ID; returns false when the row is absent or invisible
    async fn delete(&mut self, id: Self::Id, scope: &Scope) -> Result<bool>;
}
