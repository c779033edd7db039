//! API request and response data models.
//!
//! API models are distinct from database models: requests are validated here and converted into
//! [`crate::db::models`] requests, responses are built from database records.
//!
//! - [`resources`]: hotel/restaurant create and update bodies, and the resource response
//! - [`reviews`]: review submission body and id parsing

pub mod resources;
pub mod reviews;
