//! Persistence layer for catalog resources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │  Arc<dyn ResourceStore>
//!        ↓
//! ┌─────────────┐
//! │   Stores    │  (db::handlers - PostgreSQL or in-memory)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: the [`handlers::ResourceStore`] trait and its implementations
//! - [`models`]: Database record structures
//! - [`errors`]: Database-specific error types
//!
//! The backing store is chosen at startup from `database.type` in the configuration. The
//! PostgreSQL schema is managed by migrations under `migrations/`, applied on startup.

pub mod errors;
pub mod handlers;
pub mod models;
