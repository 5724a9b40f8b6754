//! Reachability probes for [`HealthAggregator`](super::HealthAggregator).

use std::time::Duration;

use futures_util::future::join_all;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{HealthAggregator, HealthCheckResult, HealthProblem, ProblemSource};
use crate::config::{self, Config};

/// How long a probe may wait before reporting the target unreachable.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks that the database named by `database_url` accepts TCP connections.
pub async fn check_database(database_url: String) -> HealthCheckResult {
    let (host, port) = config::database_address(&database_url)
        .map_err(|message| vec![HealthProblem::new(ProblemSource::Database, message)])?;

    check_tcp(ProblemSource::Database, &host, port).await
}

/// Checks that `host:port` accepts TCP connections within [`PROBE_TIMEOUT`].
pub async fn check_tcp(source: ProblemSource, host: &str, port: u16) -> HealthCheckResult {
    match timeout(PROBE_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(vec![HealthProblem::new(source, format!("{host}:{port}: {e}"))]),
        Err(_) => Err(vec![HealthProblem::new(
            source,
            format!("{host}:{port}: no answer within {PROBE_TIMEOUT:?}"),
        )]),
    }
}

/// Checks that `url` answers a `HEAD` request. Any HTTP status counts as an
/// answer; only transport failures are problems.
pub async fn check_url(url: String) -> HealthCheckResult {
    let problem = |message: String| vec![HealthProblem::new(ProblemSource::Url, message)];

    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| problem(e.to_string()))?;

    client.head(&url)
        .send()
        .await
        .map(|_| ())
        .map_err(|e| problem(format!("{url}: {e}")))
}

/// The service's own health: a valid [`Config`], a reachable database and
/// every configured reachability URL answering.
pub fn service_health() -> HealthAggregator<Config> {
    HealthAggregator::new(Config::load)
        .with_check(|config: &Config| check_database(config.database_url.clone()))
        .with_check(|config: &Config| check_urls(config.reachability_urls.clone()))
}

/// Probes every URL concurrently, reporting each one that does not answer.
pub async fn check_urls(urls: Vec<String>) -> HealthCheckResult {
    let problems: Vec<HealthProblem> = join_all(urls.into_iter().map(check_url))
        .await
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();

    if problems.is_empty() { Ok(()) } else { Err(problems) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// A port nothing listens on: bind, read the port, drop the listener.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn reachable_database_is_healthy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = check_database(format!("postgres://reader@127.0.0.1:{port}/cgn")).await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn unreachable_database_is_a_database_problem() {
        let port = closed_port().await;
        let problems = check_database(format!("postgres://127.0.0.1:{port}/cgn")).await.unwrap_err();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].source, ProblemSource::Database);
        assert!(problems[0].message.contains(&port.to_string()));
    }

    #[tokio::test]
    async fn malformed_database_url_is_a_database_problem() {
        let problems = check_database("not a url".to_owned()).await.unwrap_err();
        assert_eq!(problems[0].source, ProblemSource::Database);
        assert!(problems[0].message.starts_with("database_url"));
    }

    #[tokio::test]
    async fn database_problems_match_config_validation() {
        let url = "postgres:///cgn".to_owned();
        let config_error = config::database_address(&url).unwrap_err();

        let problems = check_database(url).await.unwrap_err();
        assert_eq!(problems, vec![HealthProblem::new(ProblemSource::Database, config_error)]);
    }

    #[tokio::test]
    async fn unreachable_url_is_a_url_problem() {
        let port = closed_port().await;
        let problems = check_url(format!("http://127.0.0.1:{port}/")).await.unwrap_err();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].source, ProblemSource::Url);
    }

    #[tokio::test]
    async fn every_unreachable_url_is_reported() {
        let (a, b) = (closed_port().await, closed_port().await);
        let problems = check_urls(vec![
            format!("http://127.0.0.1:{a}/"),
            format!("http://127.0.0.1:{b}/"),
        ])
        .await
        .unwrap_err();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].message.contains(&a.to_string()));
        assert!(problems[1].message.contains(&b.to_string()));
    }

    #[tokio::test]
    async fn no_urls_is_healthy() {
        assert_eq!(check_urls(Vec::new()).await, Ok(()));
    }
}
