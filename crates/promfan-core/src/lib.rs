//! promfan core: exposition data model, text codec, and the shared error type.
//!
//! This crate carries no transport or runtime dependencies. The proxy crate
//! feeds it raw upstream bodies and gets structured metric families back, then
//! hands merged families to the encoder.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed upstream
//! text must surface as `PromfanError::Decode`, never as a crash, since one bad
//! target must not take the whole scrape down with it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;

/// Shared result type.
pub use error::{Result, PromfanError};
