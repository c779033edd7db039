//! Common type definitions shared across the crate.
//!
//! This module defines:
//! - Type aliases for entity IDs (ResourceId, ReviewId, UserId)
//! - [`ResourceKind`], the runtime description of a catalog collection
//! - [`ResourceType`] marker types used to register one set of generic handlers per kind
//! - [`Role`] for session-based authorization
//!
//! # Resource kinds
//!
//! Hotels and restaurants share one implementation. Everything that differs between them
//! (table name, URL segments, media folder, human readable label) is derived from
//! [`ResourceKind`]:
//!
//! ```ignore
//! use dinestay::types::ResourceKind;
//!
//! assert_eq!(ResourceKind::Hotel.collection(), "hotels");
//! assert_eq!(ResourceKind::Restaurant.folder(), "restaurants");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type ResourceId = Uuid;
pub type ReviewId = Uuid;
pub type UserId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// The catalog collections served by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Hotel,
    Restaurant,
}

impl ResourceKind {
    /// Plural name, used for the table name, list URLs and list response keys.
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Hotel => "hotels",
            ResourceKind::Restaurant => "restaurants",
        }
    }

    /// Singular name, used for detail URLs and single-document response keys.
    pub fn singular(self) -> &'static str {
        match self {
            ResourceKind::Hotel => "hotel",
            ResourceKind::Restaurant => "restaurant",
        }
    }

    /// Media host folder that holds this kind's images.
    pub fn folder(self) -> &'static str {
        self.collection()
    }

    /// Capitalized label for user-facing messages ("Hotel not found").
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Hotel => "Hotel",
            ResourceKind::Restaurant => "Restaurant",
        }
    }

    /// Name of the body/query field carrying the parent id on review routes (`hotelId`).
    pub fn id_field(self) -> &'static str {
        match self {
            ResourceKind::Hotel => "hotelId",
            ResourceKind::Restaurant => "restaurantId",
        }
    }

    /// Response key for the total document count (`hotelsCount`).
    pub fn count_key(self) -> &'static str {
        match self {
            ResourceKind::Hotel => "hotelsCount",
            ResourceKind::Restaurant => "restaurantsCount",
        }
    }

    /// Response key for the filtered document count (`filteredHotelsCount`).
    pub fn filtered_count_key(self) -> &'static str {
        match self {
            ResourceKind::Hotel => "filteredHotelsCount",
            ResourceKind::Restaurant => "filteredRestaurantsCount",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compile-time handle on a [`ResourceKind`], so handlers can be written once and registered
/// per kind (`get(list_resources::<Hotels>)`).
pub trait ResourceType: Send + Sync + 'static {
    const KIND: ResourceKind;
}

pub struct Hotels;

pub struct Restaurants;

impl ResourceType for Hotels {
    const KIND: ResourceKind = ResourceKind::Hotel;
}

impl ResourceType for Restaurants {
    const KIND: ResourceKind = ResourceKind::Restaurant;
}

/// Roles carried in session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
