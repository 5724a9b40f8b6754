//! Unified error type.

use thiserror::Error;

/// The error type returned by sluice's fallible infrastructure operations.
///
/// Request-level failures (bad input, failing collaborators) are expressed as
/// [`Rejection`](crate::Rejection)s and turned into responses, never as
/// `Error`s. This type surfaces failures to start or run the service.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    Address(String),

    #[error("configuration: {}", .0.join("; "))]
    Config(Vec<String>),
}
