//! Storage trait for catalog resources.

use crate::db::errors::Result;
use crate::db::models::resources::{ResourceCreateDBRequest, ResourceDBResponse, ResourceUpdateDBRequest};
use crate::query::ResourceQuery;
use crate::reviews::ReviewSummary;
use crate::types::{ResourceId, ResourceKind};

/// Data access layer for hotel and restaurant documents.
///
/// Every operation names the collection it works on through a [`ResourceKind`], so a single
/// store instance serves all kinds. Implementations must bump `version` on every write; review
/// writes use it for optimistic concurrency (see [`ResourceStore::save_reviews`]).
#[async_trait::async_trait]
pub trait ResourceStore: Send + Sync {
    /// Insert a new document with empty reviews and zero aggregates
    async fn create(&self, kind: ResourceKind, request: &ResourceCreateDBRequest) -> Result<ResourceDBResponse>;

    /// Get a document by ID
    async fn get_by_id(&self, kind: ResourceKind, id: ResourceId) -> Result<Option<ResourceDBResponse>>;

    /// Documents matching the query, ordered by creation time, windowed if the query is paginated
    async fn list(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<Vec<ResourceDBResponse>>;

    /// Number of documents matching the query, ignoring any pagination window
    async fn count(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<i64>;

    /// Apply a partial update. Returns [`crate::db::errors::DbError::NotFound`] if the document is
    /// gone, and [`crate::db::errors::DbError::StaleVersion`] if `expected_version` is given and no
    /// longer matches.
    async fn update(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        expected_version: Option<i64>,
        request: &ResourceUpdateDBRequest,
    ) -> Result<ResourceDBResponse>;

    /// Replace the review list and aggregates if the stored version still equals
    /// `expected_version`. Returns false when the document changed (or disappeared) since it
    /// was read.
    async fn save_reviews(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        expected_version: i64,
        summary: &ReviewSummary,
    ) -> Result<bool>;

    /// Delete a document. Returns false if it did not exist.
    async fn delete(&self, kind: ResourceKind, id: ResourceId) -> Result<bool>;
}
