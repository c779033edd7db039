//! Resource store implementations.
//!
//! - [`PgResourceStore`]: one PostgreSQL table per resource kind, embedded images and reviews as JSONB
//! - [`InMemoryResourceStore`]: process-local store for tests and local development

pub mod in_memory;
pub mod resources;
pub mod store;

pub use in_memory::InMemoryResourceStore;
pub use resources::PgResourceStore;
pub use store::ResourceStore;
