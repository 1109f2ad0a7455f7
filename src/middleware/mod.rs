//! Request extractors.
//!
//! - [`auth`]: resolves the bearer token to the acting user's claims
//!
//! The extractor only proves the token is valid. Whether the user still
//! exists and is active is checked by [`crate::utils::guard::Guard::actor`].

pub mod auth;
