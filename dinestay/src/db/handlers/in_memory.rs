//! In-memory resource store.
//!
//! Documents live in a per-kind vector in insertion order, which doubles as creation order.
//! Suitable for tests and local development; everything is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::store::ResourceStore,
    models::resources::{ResourceCreateDBRequest, ResourceDBResponse, ResourceUpdateDBRequest},
};
use crate::query::ResourceQuery;
use crate::reviews::ReviewSummary;
use crate::types::{ResourceId, ResourceKind};

#[derive(Clone, Default)]
pub struct InMemoryResourceStore {
    collections: Arc<RwLock<HashMap<ResourceKind, Vec<ResourceDBResponse>>>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn create(&self, kind: ResourceKind, request: &ResourceCreateDBRequest) -> Result<ResourceDBResponse> {
        let resource = ResourceDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            description: request.description.clone(),
            phone_no: request.phone_no,
            address: request.address.clone(),
            ratings: 0.0,
            images: request.images.clone(),
            category: request.category.clone(),
            num_of_reviews: 0,
            reviews: Vec::new(),
            created_by: request.created_by,
            created_at: Utc::now(),
            version: 0,
        };

        self.collections.write().entry(kind).or_default().push(resource.clone());

        Ok(resource)
    }

    async fn get_by_id(&self, kind: ResourceKind, id: ResourceId) -> Result<Option<ResourceDBResponse>> {
        let collections = self.collections.read();
        Ok(collections
            .get(&kind)
            .and_then(|docs| docs.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn list(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<Vec<ResourceDBResponse>> {
        let collections = self.collections.read();
        let matching = collections
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|r| query.matches(r))
            .cloned();

        Ok(match query.window() {
            Some(window) => matching
                .skip(window.skip.max(0) as usize)
                .take(window.limit.max(0) as usize)
                .collect(),
            None => matching.collect(),
        })
    }

    async fn count(&self, kind: ResourceKind, query: &ResourceQuery) -> Result<i64> {
        let collections = self.collections.read();
        let count = collections
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|r| query.matches(r))
            .count();
        Ok(count as i64)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        expected_version: Option<i64>,
        request: &ResourceUpdateDBRequest,
    ) -> Result<ResourceDBResponse> {
        let mut collections = self.collections.write();
        let resource = collections
            .get_mut(&kind)
            .and_then(|docs| docs.iter_mut().find(|r| r.id == id))
            .ok_or(DbError::NotFound)?;

        if expected_version.is_some_and(|v| v != resource.version) {
            return Err(DbError::StaleVersion);
        }

        if let Some(name) = &request.name {
            resource.name = name.clone();
        }
        if let Some(description) = &request.description {
            resource.description = description.clone();
        }
        if let Some(phone_no) = request.phone_no {
            resource.phone_no = phone_no;
        }
        if let Some(address) = &request.address {
            resource.address = address.clone();
        }
        if let Some(category) = &request.category {
            resource.category = category.clone();
        }
        if let Some(images) = &request.images {
            resource.images = images.clone();
        }
        resource.version += 1;

        Ok(resource.clone())
    }

    async fn save_reviews(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        expected_version: i64,
        summary: &ReviewSummary,
    ) -> Result<bool> {
        let mut collections = self.collections.write();
        let Some(resource) = collections
            .get_mut(&kind)
            .and_then(|docs| docs.iter_mut().find(|r| r.id == id))
        else {
            return Ok(false);
        };

        if resource.version != expected_version {
            return Ok(false);
        }

        resource.reviews = summary.reviews.clone();
        resource.ratings = summary.ratings;
        resource.num_of_reviews = summary.num_of_reviews;
        resource.version += 1;

        Ok(true)
    }

    async fn delete(&self, kind: ResourceKind, id: ResourceId) -> Result<bool> {
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(&kind) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|r| r.id != id);
        Ok(docs.len() < before)
    }
}
