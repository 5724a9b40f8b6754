//! Middleware composition.
//!
//! A tuple of middlewares is itself a [`Chain`]. Running it awaits each
//! member in declaration order against the same request. The first rejection
//! is returned as-is and the members after it are never run; on success the
//! outputs come back as a tuple in the same order.

use tracing::debug;

use crate::rejection::Rejection;
use crate::request::Request;

use super::{BoxFuture, Middleware};

/// An ordered, short-circuiting group of middlewares.
pub trait Chain: Send + Sync + 'static {
    type Output: Send;

    fn run<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, Result<Self::Output, Rejection>>;
}

fn rejected(position: usize, rejection: Rejection) -> Rejection {
    match &rejection {
        Rejection::Validation(failure) => debug!(
            position,
            scope = %failure.scope(),
            codec = failure.codec(),
            "middleware chain rejected request"
        ),
        Rejection::Internal(failure) => debug!(
            position,
            error = %failure,
            "middleware chain failed"
        ),
    }
    rejection
}

macro_rules! impl_chain {
    ($($ty:ident $idx:tt $out:ident),+) => {
        impl<$($ty),+> Chain for ($($ty,)+)
        where
            $($ty: Middleware + 'static,)+
        {
            type Output = ($(<$ty as Middleware>::Output,)+);

            fn run<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, Result<Self::Output, Rejection>> {
                Box::pin(async move {
                    $(
                        let $out = self.$idx.run(req).await.map_err(|r| rejected($idx, r))?;
                    )+
                    Ok(($($out,)+))
                })
            }
        }
    };
}

impl_chain!(M0 0 o0);
impl_chain!(M0 0 o0, M1 1 o1);
impl_chain!(M0 0 o0, M1 1 o1, M2 2 o2);
impl_chain!(M0 0 o0, M1 1 o1, M2 2 o2, M3 3 o3);
impl_chain!(M0 0 o0, M1 1 o1, M2 2 o2, M3 3 o3, M4 4 o4);
impl_chain!(M0 0 o0, M1 1 o1, M2 2 o2, M3 3 o3, M4 4 o4, M5 5 o5);
impl_chain!(M0 0 o0, M1 1 o1, M2 2 o2, M3 3 o3, M4 4 o4, M5 5 o5, M6 6 o6);
impl_chain!(M0 0 o0, M1 1 o1, M2 2 o2, M3 3 o3, M4 4 o4, M5 5 o5, M6 6 o6, M7 7 o7);

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::codec::{Str, UInt};
    use crate::middleware::{OptionalQueryParam, from_fn};

    fn counting<T: Clone + Send + Sync + 'static>(
        calls: Arc<AtomicUsize>,
        value: T,
    ) -> impl Middleware<Output = T> + 'static {
        from_fn(move |_: &Request| -> Result<T, Rejection> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value.clone())
        })
    }

    #[tokio::test]
    async fn outputs_come_back_in_declaration_order() {
        let req = Request::builder().query("name", "acme").query("page", "2").build();
        let chain = (
            OptionalQueryParam::new("page", UInt),
            OptionalQueryParam::new("name", Str),
            from_fn(|req: &Request| -> Result<String, Rejection> { Ok(req.path().to_owned()) }),
        );

        let (page, name, path) = chain.run(&req).await.unwrap();
        assert_eq!(page, Some(2));
        assert_eq!(name.as_deref(), Some("acme"));
        assert_eq!(path, "/");
    }

    #[tokio::test]
    async fn first_failure_stops_the_chain() {
        let later = Arc::new(AtomicUsize::new(0));
        let chain = (
            from_fn(|_: &Request| -> Result<(), Rejection> { Err(Rejection::internal("m1 failed")) }),
            counting(Arc::clone(&later), 7_u32),
        );

        let err = chain.run(&Request::builder().build()).await.unwrap_err();
        assert_eq!(later.load(Ordering::SeqCst), 0);
        let failure = match err {
            Rejection::Internal(failure) => failure,
            other => panic!("expected m1's failure, got {other:?}"),
        };
        assert_eq!(failure.message(), "m1 failed");
    }

    #[tokio::test]
    async fn leftmost_failure_is_reported() {
        let req = Request::builder().query("a", "x").query("b", "y").build();
        let chain = (
            OptionalQueryParam::new("a", UInt),
            OptionalQueryParam::new("b", UInt),
        );

        let Err(Rejection::Validation(failure)) = chain.run(&req).await else {
            panic!("expected a validation failure");
        };
        assert_eq!(failure.scope(), &crate::rejection::Scope::Query("a".into()));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn rejection_is_logged_with_field_and_codec() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let req = Request::builder().query("page", "ten").build();
        let chain = (OptionalQueryParam::new("name", Str), OptionalQueryParam::new("page", UInt));
        assert!(chain.run(&req).await.is_err());

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("middleware chain rejected request"), "{logs}");
        assert!(logs.contains("query parameter 'page'"), "{logs}");
        assert!(logs.contains("UInt"), "{logs}");
        assert!(logs.contains("position=1"), "{logs}");
    }

    #[tokio::test]
    async fn every_member_runs_once_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = (
            counting(Arc::clone(&calls), 1_u8),
            counting(Arc::clone(&calls), 2_u8),
            counting(Arc::clone(&calls), 3_u8),
        );
        let outputs = chain.run(&Request::builder().build()).await.unwrap();
        assert_eq!(outputs, (1, 2, 3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
