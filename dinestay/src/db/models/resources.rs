//! Database models for catalog resources (hotels and restaurants).

use crate::types::{ResourceId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A media-host reference embedded in a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub public_id: String,
    pub url: String,
}

/// A review embedded in a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    pub user: UserId,
    /// Author display name at the time of writing, not re-synced afterwards
    pub name: String,
    pub rating: f64,
    pub comment: String,
}

/// Database request for creating a new resource
#[derive(Debug, Clone)]
pub struct ResourceCreateDBRequest {
    pub name: String,
    pub description: String,
    pub phone_no: i64,
    pub address: String,
    pub category: String,
    pub images: Vec<Image>,
    pub created_by: UserId,
}

/// Database request for a partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub phone_no: Option<i64>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub images: Option<Vec<Image>>,
}

/// Database response for a resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDBResponse {
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    pub phone_no: i64,
    pub address: String,
    pub ratings: f64,
    pub images: Vec<Image>,
    pub category: String,
    pub num_of_reviews: i32,
    pub reviews: Vec<Review>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    /// Incremented on every write; compared on review writes
    pub version: i64,
}
