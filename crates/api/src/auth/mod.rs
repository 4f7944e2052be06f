//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation.
//!
//! Users and token issuance belong to the identity service; this server only
//! verifies bearer tokens signed with the shared secret.

pub mod jwt;
