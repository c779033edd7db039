//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers, generic over the resource kind
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: Extractors that reject with the JSON error envelope
//!
//! # API Structure
//!
//! Everything is served under `/api/v1`. Hotels and restaurants expose the same surface
//! (see [`handlers::resource_routes`]):
//!
//! - **Catalog** (`/hotels`, `/hotel/{id}`): public listing with search, filters and pages
//! - **Administration** (`/admin/...`): create, update and delete, admin role required
//! - **Reviews** (`/hotel_review`, `/hotel_reviews`): one review per user and resource
//!
//! Responses use a `{success: true, ...}` envelope; errors are `{success: false, message}`.

pub mod extract;
pub mod handlers;
pub mod models;
