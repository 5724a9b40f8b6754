//! Incoming HTTP request type.
//!
//! A [`Request`] is the immutable snapshot every middleware reads from. It is
//! built once per request and handed out by shared reference only, so no
//! middleware can observe another one's work.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};

/// An incoming HTTP request with its query string already parsed.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: HashMap<String, String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Request {
    pub(crate) fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: uri.path().to_owned(),
            query: parse_query(uri.query()),
            headers,
            body,
        }
    }

    /// Builder for requests constructed by hand (tests, in-process calls).
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::GET,
            path: "/".to_owned(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Returns a query parameter. When a key is repeated, the last value wins.
    ///
    /// `?param=a,b` yields `Some("a,b")`; `?param=` yields `Some("")`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    raw.and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Fluent builder for [`Request`]. Defaults to `GET /` with no body.
pub struct RequestBuilder {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_owned();
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Adds a header. Names or values that are not valid HTTP are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialises `value` as the body and sets `content-type: application/json`.
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_decoded() {
        let uri: Uri = "/merchants?param=shopping%2Centertainment&name=a+b&empty=".parse().unwrap();
        let req = Request::new(Method::GET, &uri, HeaderMap::new(), Bytes::new());
        assert_eq!(req.path(), "/merchants");
        assert_eq!(req.query("param"), Some("shopping,entertainment"));
        assert_eq!(req.query("name"), Some("a b"));
        assert_eq!(req.query("empty"), Some(""));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let uri: Uri = "/?k=1&k=2".parse().unwrap();
        let req = Request::new(Method::GET, &uri, HeaderMap::new(), Bytes::new());
        assert_eq!(req.query("k"), Some("2"));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = Request::builder().header("X-Request-Id", "abc").build();
        assert_eq!(req.header("x-request-id"), Some("abc"));
    }
}
