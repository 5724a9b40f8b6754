//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Every response a handler produces falls in one of three classes:
//!
//! | Class | Status | Body |
//! |---|---|---|
//! | Success | `200 OK` | the JSON payload ([`Json`]) |
//! | Validation error | `400 Bad Request` | `application/problem+json` |
//! | Internal error | `500 Internal Server Error` | `application/problem+json` |

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types this crate emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,        // application/json
    ProblemJson, // application/problem+json  (RFC 9457)
    Text,        // text/plain; charset=utf-8
}

impl ContentType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Json        => "application/json",
            Self::ProblemJson => "application/problem+json",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use sluice::Response;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// Response::problem(StatusCode::BAD_REQUEST, "Invalid page", "value \"x\" at page is not a valid [UInt]");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) body: Bytes,
    pub(crate) headers: HeaderMap,
    pub(crate) status: StatusCode,
}

/// Problem-details body shared by validation and internal errors.
#[derive(Serialize)]
struct Problem<'a> {
    title: &'a str,
    detail: &'a str,
    status: u16,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().bytes(ContentType::Json, body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::builder().bytes(ContentType::Text, body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Bytes::new(), headers: HeaderMap::new(), status: code }
    }

    /// `application/problem+json` body with the given status.
    pub fn problem(code: StatusCode, title: &str, detail: &str) -> Self {
        let problem = Problem { title, detail, status: code.as_u16() };
        match serde_json::to_vec(&problem) {
            Ok(bytes) => Self::builder().status(code).bytes(ContentType::ProblemJson, bytes),
            Err(_) => Self::status(code),
        }
    }

    /// `400 Bad Request` problem.
    pub fn validation_error(title: &str, detail: &str) -> Self {
        Self::problem(StatusCode::BAD_REQUEST, title, detail)
    }

    /// `500 Internal Server Error` problem carrying `detail`.
    pub fn internal_error(detail: &str) -> Self {
        Self::problem(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", detail)
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Converts into the `http` type hyper writes to the wire.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Adds a header. Names or values that are not valid HTTP are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    /// Terminate with a typed body.
    pub fn bytes(mut self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        Response { body: body.into(), headers: self.headers, status: self.status }
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Business handlers return `Result<impl IntoResponse, Rejection>`; the
/// handler adapter calls this on the success side.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// A JSON success payload: `200 OK` with the serialised value.
///
/// A value that fails to serialise becomes an internal error rather than a
/// truncated body.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => Response::internal_error(&e.to_string()),
        }
    }
}
