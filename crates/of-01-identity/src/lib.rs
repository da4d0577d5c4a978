//! # OF-01: Identity
//!
//! Bearer-credential verification and the envelope authentication middleware
//! that sits in front of every command handler.
//!
//! The flow: an edge issues a signed token ([`TokenIssuer`]), the raw
//! `Bearer <token>` string travels on the envelope, and the
//! [`IdentityExtractor`] verifies it and writes a [`shared_types::UserClaims`]
//! onto the envelope's `user` slot. Handlers read that slot and never touch
//! the raw credential.

#![allow(clippy::module_name_repetitions)]

pub mod extractor;
pub mod token;

pub use extractor::IdentityExtractor;
pub use token::{AuthError, Claims, TokenIssuer, TokenVerifier, BEARER_SCHEME};
