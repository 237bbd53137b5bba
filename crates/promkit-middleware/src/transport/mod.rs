//! Transport layer (HTTP).
//!
//! Request instrumentation hooks that sit between the framework and the
//! user's handlers.

pub mod http;

pub use http::track_requests;
