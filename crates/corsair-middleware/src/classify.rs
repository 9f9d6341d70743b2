//! Request classification.
//!
//! A request is a CORS preflight iff its method is `OPTIONS` and it carries
//! both `Origin` and `Access-Control-Request-Method`. Everything else is an
//! actual request, with or without an `Origin`.
//!
//! Presence alone decides the kind. A preflight header whose value is not
//! visible ASCII is read as an empty string, so the request is still answered
//! without reaching the handler. On an actual request such an `Origin` is
//! treated as absent.

use crate::types::Request;
use http::{HeaderMap, Method};

/// CORS request header names.
pub mod headers {
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header (preflight).
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
}

/// How the CORS stage treats a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// An `OPTIONS` permission check. Answered without reaching the handler.
    Preflight {
        /// The `Origin` header.
        origin: String,
        /// The `Access-Control-Request-Method` header.
        requested_method: String,
        /// The `Access-Control-Request-Headers` header, if sent.
        requested_headers: Option<String>,
    },
    /// Any other request. Passed to the handler.
    Actual {
        /// The `Origin` header, if sent.
        origin: Option<String>,
        /// The request method.
        method: Method,
    },
}

impl RequestKind {
    /// Classifies a request.
    ///
    /// ```
    /// use bytes::Bytes;
    /// use corsair_middleware::RequestKind;
    /// use http_body_util::Full;
    ///
    /// let request = http::Request::builder()
    ///     .method("OPTIONS")
    ///     .header("origin", "https://app.example")
    ///     .header("access-control-request-method", "PUT")
    ///     .body(Full::new(Bytes::new()))
    ///     .unwrap();
    /// assert!(RequestKind::classify(&request).is_preflight());
    /// ```
    #[must_use]
    pub fn classify(request: &Request) -> Self {
        let headers = request.headers();
        let origin = header_str(headers, headers::ORIGIN);

        if request.method() == Method::OPTIONS
            && headers.contains_key(headers::ORIGIN)
            && headers.contains_key(headers::REQUEST_METHOD)
        {
            return Self::Preflight {
                origin: origin.unwrap_or_default().to_string(),
                requested_method: header_str(headers, headers::REQUEST_METHOD)
                    .unwrap_or_default()
                    .to_string(),
                requested_headers: header_str(headers, headers::REQUEST_HEADERS)
                    .map(str::to_string),
            };
        }

        Self::Actual {
            origin: origin.map(str::to_string),
            method: request.method().clone(),
        }
    }

    /// Returns `true` for preflight requests.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::Preflight { .. })
    }

    /// The request origin, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Preflight { origin, .. } => Some(origin),
            Self::Actual { origin, .. } => origin.as_deref(),
        }
    }

    /// The method policies are matched against: the requested method for a
    /// preflight, the request method otherwise.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Preflight {
                requested_method, ..
            } => requested_method,
            Self::Actual { method, .. } => method.as_str(),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::HeaderValue;
    use http_body_util::Full;

    fn build(method: Method, headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().method(method).uri("/resource");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[test]
    fn test_preflight() {
        let request = build(
            Method::OPTIONS,
            &[
                ("Origin", "https://a.example"),
                ("Access-Control-Request-Method", "DELETE"),
                ("Access-Control-Request-Headers", "x-token, content-type"),
            ],
        );
        let kind = RequestKind::classify(&request);
        assert_eq!(
            kind,
            RequestKind::Preflight {
                origin: "https://a.example".to_string(),
                requested_method: "DELETE".to_string(),
                requested_headers: Some("x-token, content-type".to_string()),
            }
        );
        assert_eq!(kind.method(), "DELETE");
        assert_eq!(kind.origin(), Some("https://a.example"));
    }

    #[test]
    fn test_options_without_request_method_is_actual() {
        let request = build(Method::OPTIONS, &[("Origin", "https://a.example")]);
        let kind = RequestKind::classify(&request);
        assert!(!kind.is_preflight());
        assert_eq!(kind.method(), "OPTIONS");
        assert_eq!(kind.origin(), Some("https://a.example"));
    }

    #[test]
    fn test_options_without_origin_is_actual() {
        let request = build(Method::OPTIONS, &[("Access-Control-Request-Method", "GET")]);
        let kind = RequestKind::classify(&request);
        assert_eq!(
            kind,
            RequestKind::Actual {
                origin: None,
                method: Method::OPTIONS,
            }
        );
    }

    #[test]
    fn test_get_with_request_method_is_actual() {
        let request = build(
            Method::GET,
            &[
                ("Origin", "https://a.example"),
                ("Access-Control-Request-Method", "GET"),
            ],
        );
        assert!(!RequestKind::classify(&request).is_preflight());
    }

    #[test]
    fn test_opaque_origin_is_absent() {
        let mut request = build(Method::GET, &[]);
        request.headers_mut().insert(
            headers::ORIGIN,
            HeaderValue::from_bytes(b"https://\xffbad").unwrap(),
        );
        assert_eq!(RequestKind::classify(&request).origin(), None);
    }

    #[test]
    fn test_opaque_origin_still_makes_preflight() {
        let mut request = build(Method::OPTIONS, &[("Access-Control-Request-Method", "GET")]);
        request.headers_mut().insert(
            headers::ORIGIN,
            HeaderValue::from_bytes(b"https://b\xc3\xbccher.example").unwrap(),
        );
        assert_eq!(
            RequestKind::classify(&request),
            RequestKind::Preflight {
                origin: String::new(),
                requested_method: "GET".to_string(),
                requested_headers: None,
            }
        );
    }
}
