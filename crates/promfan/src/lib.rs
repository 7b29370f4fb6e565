//! Top-level facade crate for promfan.
//!
//! Re-exports the core codec types and the proxy library so users can depend on a single crate.

pub mod core {
    pub use promfan_core::*;
}

pub mod proxy {
    pub use promfan_proxy::*;
}
