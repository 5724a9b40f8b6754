//! Handler trait, type erasure, and the handler adapter.
//!
//! # How async handlers are stored
//!
//! The server holds one handler of a concrete type it cannot name, so the
//! handler is hidden behind a trait object (`dyn ErasedHandler`):
//!
//! ```text
//! async fn health(req: Request) -> Response { … }   ← user writes this
//!        ↓ Server::serve(health)
//! health.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(health))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                ← one vtable dispatch
//! ```
//!
//! # The adapter
//!
//! [`adapt`] joins a middleware [`Chain`] and a business handler into a
//! [`Handler`]:
//!
//! ```text
//! request ─▶ chain.run ──Err(rejection)──▶ rejection response (handler skipped)
//!                 │      ──panic───────────▶ 500 internal error (handler skipped)
//!                 Ok((a, b, …))
//!                 ▼
//!          business(a, b, …) ──Ok(payload)────▶ payload response
//!                 │          ──Err(rejection)──▶ rejection response
//!                 └── panic ────────────────────▶ 500 internal error
//! ```

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{error, warn};

use crate::middleware::{BoxFuture, Chain};
use crate::rejection::Rejection;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Response>;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every request handler.
///
/// Satisfied automatically by any function or closure with the signature
///
/// ```text
/// Fn(Request) -> impl Future<Output = impl IntoResponse>
/// ```
///
/// which includes everything returned by [`adapt`]. The trait is sealed.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Business handlers ─────────────────────────────────────────────────────────

/// Business logic invoked with the outputs of a [`Chain`], spread as
/// separate arguments.
///
/// Implemented for every `Fn(A, B, …) -> impl Future<Output = Result<T, Rejection>>`
/// with one to eight arguments, `T: IntoResponse`.
pub trait BusinessHandler<Args>: Send + Sync + 'static {
    type Output: IntoResponse;
    type Future: Future<Output = Result<Self::Output, Rejection>> + Send + 'static;

    fn call(&self, args: Args) -> Self::Future;
}

macro_rules! impl_business_handler {
    ($($arg:ident),+) => {
        impl<F, Fut, T, $($arg),+> BusinessHandler<($($arg,)+)> for F
        where
            F: Fn($($arg),+) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Result<T, Rejection>> + Send + 'static,
            T: IntoResponse,
        {
            type Output = T;
            type Future = Fut;

            #[allow(non_snake_case)]
            fn call(&self, ($($arg,)+): ($($arg,)+)) -> Fut {
                (self)($($arg),+)
            }
        }
    };
}

impl_business_handler!(A0);
impl_business_handler!(A0, A1);
impl_business_handler!(A0, A1, A2);
impl_business_handler!(A0, A1, A2, A3);
impl_business_handler!(A0, A1, A2, A3, A4);
impl_business_handler!(A0, A1, A2, A3, A4, A5);
impl_business_handler!(A0, A1, A2, A3, A4, A5, A6);
impl_business_handler!(A0, A1, A2, A3, A4, A5, A6, A7);

// ── Adapter ───────────────────────────────────────────────────────────────────

/// Joins a middleware chain and a business handler into a request handler.
///
/// - A rejected chain is answered with the rejection's response; the business
///   handler is not called.
/// - Otherwise the business handler runs with the extracted values. Its
///   `Ok` payload becomes the response, its `Err` the matching error
///   response, and a panic a `500`.
///
/// ```rust
/// use sluice::codec::Str;
/// use sluice::handler::adapt;
/// use sluice::middleware::OptionalQueryParam;
/// use sluice::{Json, Rejection};
///
/// let greet = adapt(
///     (OptionalQueryParam::new("name", Str),),
///     |name: Option<String>| async move {
///         Ok::<_, Rejection>(Json(format!("hello {}", name.as_deref().unwrap_or("world"))))
///     },
/// );
/// # let _ = greet;
/// ```
pub fn adapt<C, H>(chain: C, handler: H) -> impl Handler
where
    C: Chain,
    H: BusinessHandler<C::Output>,
{
    let chain = Arc::new(chain);
    let handler = Arc::new(handler);
    move |req: Request| {
        let chain = Arc::clone(&chain);
        let handler = Arc::clone(&handler);
        async move { process(&*chain, &*handler, req).await }
    }
}

async fn process<C, H>(chain: &C, handler: &H, req: Request) -> Response
where
    C: Chain,
    H: BusinessHandler<C::Output>,
{
    // Both steps run under `catch_unwind`, and the calls sit inside async
    // blocks so that a panic while building either future is caught too.
    let values = match AssertUnwindSafe(async { chain.run(&req).await }).catch_unwind().await {
        Ok(Ok(values)) => values,
        Ok(Err(rejection)) => return rejection.into_response(),
        Err(panic) => return panicked(&req, "middleware", &*panic),
    };

    let outcome = AssertUnwindSafe(async move { BusinessHandler::call(handler, values).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(payload)) => payload.into_response(),
        Ok(Err(rejection)) => {
            if let Rejection::Internal(failure) = &rejection {
                warn!(method = %req.method(), path = req.path(), error = %failure, "handler failed");
            }
            rejection.into_response()
        }
        Err(panic) => panicked(&req, "handler", &*panic),
    }
}

fn panicked(req: &Request, stage: &'static str, panic: &(dyn Any + Send)) -> Response {
    let message = panic_message(panic);
    error!(method = %req.method(), path = req.path(), stage, panic = message, "request panicked");
    Rejection::internal(message).into_response()
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "request panicked"
    }
}
