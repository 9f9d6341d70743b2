//! # Corsair Middleware
//!
//! The HTTP side of Corsair: a small async middleware pipeline and the CORS
//! stage that sits at its front.
//!
//! ```text
//! Request → [CORS] → other stages → Handler
//!             │                        ↓
//!             │ preflight: 204         │
//!             ↓                        ↓
//! Response ← [CORS adds headers] ← ────┘
//! ```
//!
//! ## Key Types
//!
//! - [`Middleware`] / [`Next`] - The stage trait and the continuation it calls
//! - [`Pipeline`] - An immutable, ordered list of stages
//! - [`RequestKind`] - Preflight vs. actual request classification
//! - [`stages::CorsMiddleware`] - Applies a policy set to requests and responses
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use corsair_middleware::stages::CorsMiddleware;
//! use corsair_middleware::{MiddlewareContext, Pipeline};
//! use http_body_util::Full;
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::builder()
//!     .stage(CorsMiddleware::direct([("origin", "*")]))
//!     .build();
//!
//! let request = http::Request::builder()
//!     .header("origin", "https://app.example")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//!
//! let response = pipeline
//!     .process(MiddlewareContext::new(), request, |_ctx, _req| {
//!         Box::pin(async { http::Response::new(Full::new(Bytes::from("hi"))) })
//!     })
//!     .await;
//!
//! assert_eq!(response.headers()["access-control-allow-origin"], "*");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/corsair-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use classify::RequestKind;
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use types::{Request, Response, ResponseExt};
