//! Application health.
//!
//! Two questions get answered here:
//!
//! | Probe | Handler | Question |
//! |---|---|---|
//! | **Liveness** | [`liveness`] | Is the process alive? |
//! | **Health** | [`handler`] | Is the configuration valid, and can we reach what we depend on? |
//!
//! The health answer comes from a [`HealthAggregator`]:
//!
//! ```text
//! check config ──Err(problems)──▶ Err(config problems)      (nothing else runs)
//!      │
//!      Ok(config)
//!      ▼
//! check₁(config) ┐
//! check₂(config) ├─ all run, concurrently ──▶ Err(every problem, in declaration order)
//! checkₙ(config) ┘                            or Ok(())
//! ```
//!
//! ```rust,no_run
//! use sluice::Config;
//! use sluice::health::{HealthAggregator, probe};
//!
//! # async fn run() {
//! let health = HealthAggregator::new(Config::load)
//!     .with_check(|config: &Config| probe::check_database(config.database_url.clone()));
//!
//! if let Err(problems) = health.run().await {
//!     for problem in problems {
//!         eprintln!("{problem}");
//!     }
//! }
//! # }
//! ```

pub mod probe;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use http::StatusCode;
use tracing::warn;

use crate::handler::Handler;
use crate::middleware::BoxFuture;
use crate::request::Request;
use crate::response::Response;

// ── Problems ──────────────────────────────────────────────────────────────────

/// The subsystem a [`HealthProblem`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemSource {
    Config,
    Database,
    ObjectStorage,
    Url,
}

impl fmt::Display for ProblemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Config => "Config",
            Self::Database => "Database",
            Self::ObjectStorage => "ObjectStorage",
            Self::Url => "Url",
        })
    }
}

/// One thing that is wrong, and where it was found.
///
/// Displays as `Source|message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthProblem {
    pub source: ProblemSource,
    pub message: String,
}

impl HealthProblem {
    /// Newlines in `message` are flattened so each problem stays on one line.
    pub fn new(source: ProblemSource, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self { source, message: message.replace(['\r', '\n'], " ") }
    }
}

impl fmt::Display for HealthProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.source, self.message)
    }
}

/// `Ok` when the checked condition holds, otherwise every problem found.
pub type HealthCheckResult<T = ()> = Result<T, Vec<HealthProblem>>;

/// Runs a configuration loader, giving each of its errors its own problem.
pub fn check_config<C, E>(
    load: impl FnOnce() -> Result<C, Vec<E>>,
) -> HealthCheckResult<C>
where
    E: fmt::Display,
{
    load().map_err(|errors| {
        errors.iter()
            .map(|e| HealthProblem::new(ProblemSource::Config, e.to_string()))
            .collect()
    })
}

// ── Aggregator ────────────────────────────────────────────────────────────────

type ConfigLoader<C> = Box<dyn Fn() -> Result<C, Vec<String>> + Send + Sync>;
type Check<C> = Box<dyn Fn(&C) -> BoxFuture<'static, HealthCheckResult> + Send + Sync>;

/// A configuration check gating any number of independent checks.
pub struct HealthAggregator<C> {
    load_config: ConfigLoader<C>,
    checks: Vec<Check<C>>,
}

impl<C: Send + Sync + 'static> HealthAggregator<C> {
    pub fn new<L>(load_config: L) -> Self
    where
        L: Fn() -> Result<C, Vec<String>> + Send + Sync + 'static,
    {
        Self { load_config: Box::new(load_config), checks: Vec::new() }
    }

    /// Registers a check that runs once the configuration is known to be valid.
    ///
    /// The check receives the loaded configuration and must copy out whatever
    /// it needs: its future outlives the borrow.
    pub fn with_check<F, Fut>(mut self, check: F) -> Self
    where
        F: Fn(&C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HealthCheckResult> + Send + 'static,
    {
        self.checks.push(Box::new(move |config: &C| -> BoxFuture<'static, HealthCheckResult> {
            Box::pin(check(config))
        }));
        self
    }

    /// Runs the configuration check, then every registered check.
    ///
    /// Problems are concatenated in the order the checks were registered,
    /// whatever order they finish in.
    pub async fn run(&self) -> HealthCheckResult {
        let config = check_config(|| (self.load_config)()).inspect_err(|problems| log(problems))?;

        let results = join_all(self.checks.iter().map(|check| check(&config))).await;
        let problems: Vec<HealthProblem> = results.into_iter()
            .filter_map(Result::err)
            .flatten()
            .collect();

        if problems.is_empty() {
            Ok(())
        } else {
            log(&problems);
            Err(problems)
        }
    }
}

fn log(problems: &[HealthProblem]) {
    for problem in problems {
        warn!(source = %problem.source, message = %problem.message, "health problem");
    }
}

// ── HTTP handlers ─────────────────────────────────────────────────────────────

/// Exposes `aggregator` as a request handler.
///
/// `200 OK` with `{"status":"ok"}`, or `500` problem JSON whose detail lists
/// every problem, one per line.
pub fn handler<C: Send + Sync + 'static>(aggregator: HealthAggregator<C>) -> impl Handler {
    let aggregator = Arc::new(aggregator);
    move |_req: Request| {
        let aggregator = Arc::clone(&aggregator);
        async move {
            match aggregator.run().await {
                Ok(()) => Response::json(r#"{"status":"ok"}"#),
                Err(problems) => {
                    let detail: Vec<String> = problems.iter().map(ToString::to_string).collect();
                    Response::problem(StatusCode::INTERNAL_SERVER_ERROR, "Unhealthy", &detail.join("\n"))
                }
            }
        }
    }
}

/// Liveness probe handler. Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}
