//! Request-path failures.
//!
//! A middleware or business handler that cannot produce its value returns a
//! [`Rejection`]. There are exactly two kinds, and each maps to one response
//! class:
//!
//! - [`ValidationFailure`]: the client sent something the codecs refuse
//!   (`400`, every decode error listed);
//! - [`InternalFailure`]: a collaborator failed (`500`, message only).

use std::fmt;

use thiserror::Error;

use crate::codec::DecodeError;
use crate::response::{IntoResponse, Response};

/// Where a rejected value was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A named query parameter.
    Query(String),
    /// The whole request body.
    Body,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(name) => write!(f, "query parameter '{name}'"),
            Self::Body => f.write_str("request body"),
        }
    }
}

/// A field- or body-scoped decoding failure, surfaced to the client.
#[derive(Debug, Clone, Error)]
#[error("invalid {scope}: {errors}")]
pub struct ValidationFailure {
    scope: Scope,
    codec: String,
    errors: DecodeError,
}

impl ValidationFailure {
    pub fn new(scope: Scope, codec: impl Into<String>, errors: DecodeError) -> Self {
        Self { scope, codec: codec.into(), errors }
    }

    pub fn scope(&self) -> &Scope { &self.scope }

    /// Name of the codec that refused the value.
    pub fn codec(&self) -> &str { &self.codec }

    pub fn errors(&self) -> &DecodeError { &self.errors }

    /// Problem title, e.g. `Invalid ProductCategory`.
    pub fn title(&self) -> String {
        format!("Invalid {}", self.codec)
    }

    /// One line per decode error.
    pub fn detail(&self) -> String {
        self.errors.to_string()
    }
}

/// A downstream fault. Only the message reaches the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InternalFailure {
    message: String,
}

impl InternalFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str { &self.message }
}

/// Why a request did not produce a success response.
#[derive(Debug, Clone, Error)]
pub enum Rejection {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error(transparent)]
    Internal(#[from] InternalFailure),
}

impl Rejection {
    /// Shorthand for an [`InternalFailure`] rejection.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(InternalFailure::new(message))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(failure) => Response::validation_error(&failure.title(), &failure.detail()),
            Self::Internal(failure) => Response::internal_error(failure.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Context;
    use http::StatusCode;
    use serde_json::{Value, json};

    #[test]
    fn validation_failure_lists_every_error() {
        let ctx = Context::root("param", "CommaSeparatedListOf<ProductCategory>");
        let errors = DecodeError::failure(json!("x"), ctx.push("0", "ProductCategory"))
            .merge(DecodeError::failure(json!("y"), ctx.push("1", "ProductCategory")));
        let failure = ValidationFailure::new(Scope::Query("param".into()), "ProductCategory", errors);

        let res = Rejection::from(failure).into_response();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["title"], "Invalid ProductCategory");
        let detail = body["detail"].as_str().unwrap();
        assert_eq!(detail.lines().count(), 2);
        assert!(detail.contains(r#""x" at param.0"#));
        assert!(detail.contains(r#""y" at param.1"#));
    }

    #[test]
    fn internal_failure_exposes_only_the_message() {
        let res = Rejection::internal("connection refused").into_response();
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["detail"], "connection refused");
    }
}
