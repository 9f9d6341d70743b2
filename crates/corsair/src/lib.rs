//! # Corsair
//!
//! **CORS policy middleware**
//!
//! Corsair decides which `Access-Control-*` headers a response gets:
//!
//! - **Named policies** – several origin/method/header rule sets, chosen per request
//! - **Origin patterns** – `*`, `copy`, or shell-style lists like `https://*.example.com`
//! - **Preflight handling** – `OPTIONS` checks answered with `204` before the handler runs
//! - **Cached selection** – a bounded concurrent cache in front of policy matching
//!
//! ## Quick Start
//!
//! ```
//! use bytes::Bytes;
//! use corsair::prelude::*;
//! use http_body_util::Full;
//!
//! let config = ConfigLoader::new()
//!     .with_string(
//!         r#"
//!         [cors]
//!         policy = "site"
//!         site_origin = "https://*.example.com"
//!         site_methods = "GET, POST"
//!         site_maxage = 600
//!         "#,
//!         "toml",
//!     )
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! let pipeline = Pipeline::builder()
//!     .stage(corsair::cors_middleware(&config))
//!     .build();
//!
//! let preflight = http::Request::builder()
//!     .method("OPTIONS")
//!     .header("origin", "https://app.example.com")
//!     .header("access-control-request-method", "POST")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//!
//! # tokio_test::block_on(async {
//! let response = pipeline
//!     .process(MiddlewareContext::new(), preflight, |_ctx, _req| {
//!         Box::pin(async { http::Response::new(Full::new(Bytes::new())) })
//!     })
//!     .await;
//!
//! assert_eq!(response.status(), 204);
//! assert_eq!(
//!     response.headers()["access-control-allow-origin"],
//!     "https://app.example.com"
//! );
//! assert_eq!(response.headers()["access-control-max-age"], "600");
//! # });
//! ```
//!
//! ## Crates
//!
//! - [`core`] – policy model, origin matching, selection and header values
//! - [`middleware`] – async pipeline and the CORS stage
//! - [`config`] – layered TOML/JSON/env loading
//! - [`telemetry`] – logging and Prometheus metrics setup

#![doc(html_root_url = "https://docs.rs/corsair/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use corsair_core as core;

// Re-export middleware types
pub use corsair_middleware as middleware;

// Re-export configuration types
pub use corsair_config as config;

// Re-export telemetry types
pub use corsair_telemetry as telemetry;

use corsair_config::CorsairConfig;
use corsair_core::PolicySelector;
use corsair_middleware::stages::CorsMiddleware;

/// Builds the CORS stage for a loaded configuration, with the default
/// bounded selection cache.
#[must_use]
pub fn cors_middleware(config: &CorsairConfig) -> CorsMiddleware {
    CorsMiddleware::new(PolicySelector::new(config.policy_set()))
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use corsair::prelude::*;
///
/// let set = PolicySet::direct([("origin", "copy")]);
/// assert_eq!(set.strategy(), MatchStrategy::FirstMatch);
/// ```
pub mod prelude {
    pub use corsair_core::{
        ActualGrant, BoundedCache, FlatConfig, MatchStrategy, NoCache, Policy, PolicyDiagnostic,
        PolicySelector, PolicySet, PreflightGrant, Selection, SelectionCache,
    };

    pub use corsair_middleware::stages::{CorsDecision, CorsMiddleware};
    pub use corsair_middleware::{
        Middleware, MiddlewareContext, Next, Pipeline, Request, RequestKind, Response,
    };

    pub use corsair_config::{ConfigError, ConfigLoader, CorsairConfig, LogFormat};

    pub use corsair_telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
}
