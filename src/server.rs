//! HTTP server and graceful shutdown.
//!
//! The server drives exactly one [`Handler`]. Each request is read in full,
//! turned into a [`Request`], handed to the handler, and the resulting
//! [`Response`] written back. There is no routing: put one server behind
//! each handler, or route in the proxy in front.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Stops accepting connections.
//! 2. Lets every in-flight connection finish.
//! 3. Returns from [`Server::serve`].
//!
//! Under Kubernetes, keep `terminationGracePeriodSeconds` above the slowest
//! request.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use sluice::Server;
    ///
    /// assert!(Server::bind("0.0.0.0:3000").is_ok());
    /// assert!(Server::bind("localhost").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|_| Error::Address(addr.to_owned()))?;
        Ok(Self { addr })
    }

    /// Accepts connections and answers every request with `handler`.
    ///
    /// Returns after a full graceful shutdown, or with the error that
    /// prevented binding.
    pub async fn serve(self, handler: impl Handler) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let handler = handler.into_boxed_handler();

        info!(addr = %self.addr, "sluice listening");

        let mut tasks = JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown wins over queued connections.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let handler = Arc::clone(&handler);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| dispatch(Arc::clone(&handler), req));

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set stays small.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("sluice stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads one request in full and answers it. Every failure becomes a
/// response, so hyper never sees an error.
async fn dispatch(
    handler: BoxedHandler,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let response = match body.collect().await {
        Ok(collected) => {
            let req = Request::new(parts.method, &parts.uri, parts.headers, collected.to_bytes());
            handler.call(req).await
        }
        Err(e) => {
            debug!(path = parts.uri.path(), "failed to read request body: {e}");
            Response::status(http::StatusCode::BAD_REQUEST)
        }
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. Only Ctrl-C exists off Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_rejects_invalid_addresses() {
        let err = Server::bind("not-an-address").unwrap_err();
        assert!(matches!(err, Error::Address(ref a) if a == "not-an-address"));
        assert_eq!(err.to_string(), "invalid socket address `not-an-address`");
    }
}
