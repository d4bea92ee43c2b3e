//! Authentication primitives.
//!
//! - [`jwt`] -- staff token verification, token digests and a token issuer
//!   for tests and local tooling.

pub mod jwt;
