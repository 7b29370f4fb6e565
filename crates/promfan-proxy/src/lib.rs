//! promfan proxy library entry.
//!
//! Wires config, the target registry, the scrape pipeline, and the HTTP
//! surface together. Consumed by the binary (`main.rs`) and by integration
//! tests.

pub mod app_state;
pub mod config;
pub mod ops;
pub mod registry;
pub mod router;
pub mod scrape;
