//! # sluice
//!
//! Typed request decoding for small HTTP services.
//!
//! A request passes through a fixed pipeline:
//!
//! ```text
//! Request ─▶ middleware chain ─▶ (a, b, …) ─▶ business handler ─▶ Response
//!                 │                                  │
//!                 └── first failure ─▶ 400           └── failure / panic ─▶ 500
//! ```
//!
//! - [`codec`]: self-describing validators from untyped JSON to typed values,
//!   including the comma-separated list combinator.
//! - [`middleware`]: extractors built from codecs (optional query fields,
//!   required JSON bodies) and the short-circuiting [`Chain`](middleware::Chain).
//! - [`handler`]: [`adapt`] joins a chain and a business handler, mapping every
//!   outcome to one of three responses: `200` JSON, `400` or `500` problem JSON.
//! - [`health`]: configuration-gated health checks that report every problem.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sluice::codec::UInt;
//! use sluice::middleware::OptionalQueryParam;
//! use sluice::{Json, Rejection, Server, adapt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sluice::Error> {
//!     let page = adapt(
//!         (OptionalQueryParam::new("page", UInt),),
//!         |page: Option<u64>| async move {
//!             Ok::<_, Rejection>(Json(page.unwrap_or(1)))
//!         },
//!     );
//!
//!     Server::bind("0.0.0.0:3000")?.serve(page).await
//! }
//! ```

mod category;
mod config;
mod error;
mod rejection;
mod request;
mod response;
mod server;

pub mod codec;
pub mod handler;
pub mod health;
pub mod merchants;
pub mod middleware;

pub use category::{ProductCategory, ProductCategoryList, optional_product_category_list};
pub use config::Config;
pub use error::Error;
pub use handler::{Handler, adapt};
pub use rejection::{InternalFailure, Rejection, Scope, ValidationFailure};
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use server::Server;
