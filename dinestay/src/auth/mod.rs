//! Session authentication.
//!
//! Accounts live in a separate service, which issues HS256 JWT session tokens. This service only
//! verifies them:
//!
//! - the token is read from the session cookie (default `token`) or an `Authorization: Bearer`
//!   header
//! - the claims carry the user id, display name and [`crate::types::Role`]
//!
//! Handlers opt in through extractors: [`current_user::CurrentUser`] for any authenticated user,
//! [`current_user::RequireAdmin`] for admin-only routes. Missing or invalid tokens are rejected
//! with 401, authenticated users without the admin role with 403.

pub mod current_user;
pub mod session;
