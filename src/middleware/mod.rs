//! Request middlewares.
//!
//! A middleware extracts one piece of data from a [`Request`] and either
//! yields a typed value or rejects the request. Middlewares never see each
//! other's outputs: each reads the same immutable request.
//!
//! Middlewares are grouped into a [`Chain`] (any tuple of up to eight of them)
//! and run left to right; the first rejection stops the chain.
//!
//! ```rust
//! use sluice::codec::{Str, UInt};
//! use sluice::middleware::{Chain, OptionalQueryParam};
//! use sluice::Request;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let chain = (
//!     OptionalQueryParam::new("name", Str),
//!     OptionalQueryParam::new("page", UInt),
//! );
//! let req = Request::builder().query("page", "3").build();
//! let (name, page) = chain.run(&req).await.unwrap();
//! assert_eq!(name, None);
//! assert_eq!(page, Some(3));
//! # }
//! ```

mod body;
mod chain;
mod query;

use std::future::Future;
use std::pin::Pin;

use crate::rejection::Rejection;
use crate::request::Request;

pub use body::RequiredBody;
pub use chain::Chain;
pub use query::OptionalQueryParam;

/// A heap-allocated, type-erased future borrowing for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One extraction step.
///
/// Implementations must not hold per-request state: the same middleware value
/// serves every request, concurrently.
pub trait Middleware: Send + Sync {
    type Output: Send;

    fn run<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, Result<Self::Output, Rejection>>;
}

/// A synchronous middleware built from a closure.
pub struct FromFn<F>(F);

/// Wraps `f` as a [`Middleware`].
///
/// ```rust
/// use sluice::middleware::from_fn;
/// use sluice::{Rejection, Request};
///
/// let request_id = from_fn(|req: &Request| -> Result<Option<String>, Rejection> {
///     Ok(req.header("x-request-id").map(str::to_owned))
/// });
/// ```
pub fn from_fn<F, T>(f: F) -> FromFn<F>
where
    F: Fn(&Request) -> Result<T, Rejection> + Send + Sync,
    T: Send + 'static,
{
    FromFn(f)
}

impl<F, T> Middleware for FromFn<F>
where
    F: Fn(&Request) -> Result<T, Rejection> + Send + Sync,
    T: Send + 'static,
{
    type Output = T;

    fn run<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, Result<T, Rejection>> {
        let result = (self.0)(req);
        Box::pin(std::future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_value(name: &'static str) -> impl Middleware<Output = Option<String>> {
        from_fn(move |req: &Request| -> Result<Option<String>, Rejection> {
            Ok(req.header(name).map(str::to_owned))
        })
    }

    #[tokio::test]
    async fn closure_middleware_reads_the_request() {
        let req = Request::builder().header("x-request-id", "abc").build();
        assert_eq!(header_value("x-request-id").run(&req).await.unwrap().as_deref(), Some("abc"));
        assert_eq!(header_value("x-trace-id").run(&req).await.unwrap(), None);
    }

    #[tokio::test]
    async fn closure_middleware_can_reject() {
        let deny = from_fn(|_: &Request| -> Result<(), Rejection> { Err(Rejection::internal("denied")) });
        let err = deny.run(&Request::builder().build()).await.unwrap_err();
        assert!(!err.is_validation());
    }
}
