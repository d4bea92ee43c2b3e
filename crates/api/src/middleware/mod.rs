//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac`] -- Manager-only checks for field-level rules.

pub mod auth;
pub mod rbac;
