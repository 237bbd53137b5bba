//! Top-level facade crate for promkit.
//!
//! Re-exports the metric primitives and the axum middleware so users can depend on a single crate.

pub mod core {
    pub use promkit_core::*;
}

pub mod middleware {
    pub use promkit_middleware::*;
}
