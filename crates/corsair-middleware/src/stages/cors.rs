//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! [`CorsMiddleware`] applies a [`PolicySet`] to every request:
//!
//! - **Preflight** requests are answered here with `204 No Content`. The
//!   downstream handler never runs. A granted preflight carries
//!   `Allow-Origin`, `Allow-Methods`, `Allow-Headers`, `Allow-Credentials`
//!   and `Max-Age` as the winning policy dictates; a denied or unmatched one
//!   carries no CORS headers at all.
//! - **Actual** requests always reach the handler. Once the response is
//!   back, the policy is selected for `(origin, method)` and, if granted,
//!   `Allow-Origin`, `Allow-Credentials`, `Expose-Headers` and `Vary: Origin`
//!   are appended. Status and body are never touched.
//!
//! Header values are only emitted when non-empty. A value that is not a
//! legal HTTP header value is skipped.
//!
//! ## Example
//!
//! ```
//! use corsair_core::FlatConfig;
//! use corsair_middleware::stages::CorsMiddleware;
//!
//! let cfg = FlatConfig::new()
//!     .with("policy", "internal,public,deny")
//!     .with("internal_origin", "*.corp.example")
//!     .with("internal_credentials", "true")
//!     .with("public_origin", "*")
//!     .with("public_methods", "GET");
//!
//! let cors = CorsMiddleware::from_config(&cfg);
//! assert_eq!(cors.selector().policies().active_policies(), ["internal", "public", "deny"]);
//! ```

use crate::classify::RequestKind;
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use corsair_core::{ActualGrant, FlatConfig, PolicySelector, PolicySet, PreflightGrant, Selection};
use http::{HeaderMap, HeaderValue};

/// CORS header names.
pub mod headers {
    pub use crate::classify::headers::*;

    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// What the CORS stage decided for a request.
///
/// Stored as a [`MiddlewareContext`] extension so later stages and the
/// handler can inspect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    /// How the request was classified.
    pub kind: RequestKind,
    /// The selection, or `None` for an actual request without an origin.
    pub selection: Option<Selection>,
}

impl CorsDecision {
    /// `granted`, `denied`, `unmatched` or `no_origin`.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        self.selection.as_ref().map_or("no_origin", Selection::outcome)
    }

    /// Returns `true` if CORS headers were granted.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self.selection, Some(Selection::Granted { .. }))
    }
}

/// CORS middleware driven by an ordered policy set.
///
/// Runs first in the pipeline so that preflight requests are answered
/// before any other stage does work.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    selector: PolicySelector,
}

impl CorsMiddleware {
    /// Creates the middleware from a configured selector.
    #[must_use]
    pub fn new(selector: PolicySelector) -> Self {
        Self { selector }
    }

    /// Builds the policy set from flat configuration, with the default
    /// selection cache.
    #[must_use]
    pub fn from_config(config: &FlatConfig) -> Self {
        Self::new(PolicySelector::new(PolicySet::from_config(config)))
    }

    /// Builds a single-policy middleware from unprefixed fields.
    ///
    /// ```
    /// use corsair_middleware::stages::CorsMiddleware;
    ///
    /// let cors = CorsMiddleware::direct([("origin", "copy"), ("credentials", "true")]);
    /// assert_eq!(cors.selector().policies().active_policies(), ["direct"]);
    /// ```
    #[must_use]
    pub fn direct<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::new(PolicySelector::new(PolicySet::direct(fields)))
    }

    /// The policy selector in use.
    #[must_use]
    pub fn selector(&self) -> &PolicySelector {
        &self.selector
    }

    /// Answers a preflight request.
    fn preflight_response(
        &self,
        origin: &str,
        requested_method: &str,
        requested_headers: Option<&str>,
    ) -> (Response, Selection) {
        let selection = self.selector.select(origin, Some(requested_method));
        let mut response = Response::no_content();

        match PreflightGrant::compute(&selection, Some(requested_method), requested_headers) {
            Some(grant) => {
                let map = response.headers_mut();
                set_header(map, headers::ALLOW_ORIGIN, &grant.allow_origin);
                if let Some(methods) = &grant.allow_methods {
                    set_header(map, headers::ALLOW_METHODS, methods);
                }
                if let Some(allowed) = &grant.allow_headers {
                    set_header(map, headers::ALLOW_HEADERS, allowed);
                }
                if grant.allow_credentials {
                    set_header(map, headers::ALLOW_CREDENTIALS, "true");
                }
                if let Some(max_age) = grant.max_age {
                    set_header(map, headers::MAX_AGE, &max_age.to_string());
                }
                tracing::debug!(
                    origin,
                    requested_method,
                    policy = ?selection.policy_name(),
                    "CORS preflight granted"
                );
            }
            None => {
                tracing::debug!(
                    origin,
                    requested_method,
                    outcome = selection.outcome(),
                    "CORS preflight not granted"
                );
            }
        }

        (response, selection)
    }

    /// Appends CORS headers to the handler's response for an actual request.
    fn decorate(&self, response: &mut Response, origin: &str, method: &str) -> Selection {
        let selection = self.selector.select(origin, Some(method));

        if let Some(grant) = ActualGrant::compute(&selection, origin) {
            let map = response.headers_mut();
            append_header(map, headers::ALLOW_ORIGIN, &grant.allow_origin);
            if grant.allow_credentials {
                append_header(map, headers::ALLOW_CREDENTIALS, "true");
            }
            if let Some(expose) = &grant.expose_headers {
                append_header(map, headers::EXPOSE_HEADERS, expose);
            }
            if grant.vary_origin {
                map.append(http::header::VARY, HeaderValue::from_static("Origin"));
            }
            tracing::trace!(
                origin,
                method,
                policy = ?selection.policy_name(),
                allow_origin = %grant.allow_origin,
                "CORS headers added"
            );
        }

        selection
    }
}

fn header_value(name: &str, value: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(value) {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::debug!(header = name, value, "Skipping CORS header with invalid value");
            None
        }
    }
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Some(v) = header_value(name, value) {
        headers.insert(name, v);
    }
}

fn append_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Some(v) = header_value(name, value) {
        headers.append(name, v);
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let kind = RequestKind::classify(&request);

            if let RequestKind::Preflight {
                origin,
                requested_method,
                requested_headers,
            } = &kind
            {
                let (response, selection) =
                    self.preflight_response(origin, requested_method, requested_headers.as_deref());
                corsair_telemetry::metrics::record_preflight(selection.outcome());
                ctx.set_extension(CorsDecision {
                    kind,
                    selection: Some(selection),
                });
                return response;
            }

            let origin = kind.origin().filter(|o| !o.is_empty()).map(str::to_string);
            let mut response = next.run(ctx, request).await;

            let selection = origin
                .as_deref()
                .map(|origin| self.decorate(&mut response, origin, kind.method()));
            let decision = CorsDecision { kind, selection };
            corsair_telemetry::metrics::record_actual(decision.outcome());
            ctx.set_extension(decision);

            response
        })
    }
}
