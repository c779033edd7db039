//! Database record structures.
//!
//! These types are the storage-side view of a resource. They are converted into API
//! response types in [`crate::api::models`] before leaving the service.

pub mod resources;
