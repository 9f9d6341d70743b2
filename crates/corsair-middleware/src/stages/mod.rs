//! Middleware stages.
//!
//! - [`cors`] - Preflight answering and CORS response headers

pub mod cors;

pub use cors::{CorsDecision, CorsMiddleware};
