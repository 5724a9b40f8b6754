//! Service configuration.
//!
//! Values are read with [`figment`] from defaults and then from environment
//! variables prefixed with `SLUICE_`:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `SLUICE_DATABASE_URL` | `database_url` | required |
//! | `SLUICE_REACHABILITY_URLS` | `reachability_urls` | `[]` |
//! | `SLUICE_BIND_ADDRESS` | `bind_address` | `0.0.0.0:3000` |
//!
//! Loading reports every problem it finds, one message per problem, so the
//! health check can list them all.

use figment::Figment;
use figment::providers::{Env, Serialized};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Port assumed when the database URL does not name one.
pub const DEFAULT_DATABASE_PORT: u16 = 5432;

/// Validated service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Connection URL of the merchant database, e.g. `postgres://user@db:5432/cgn`.
    pub database_url: String,

    /// Extra URLs that must answer a `HEAD` request for the service to be healthy.
    #[serde(default)]
    pub reachability_urls: Vec<String>,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_owned()
}

/// Defaults merged under every other provider. `database_url` has none.
#[derive(Serialize)]
struct Defaults {
    reachability_urls: Vec<String>,
    bind_address: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self { reachability_urls: Vec::new(), bind_address: default_bind_address() }
    }
}

impl Config {
    /// Loads from defaults and `SLUICE_`-prefixed environment variables.
    pub fn load() -> Result<Self, Vec<String>> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Defaults::default()))
                .merge(Env::prefixed("SLUICE_")),
        )
    }

    /// Extracts and validates a configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self, Vec<String>> {
        let config: Self = figment
            .extract()
            .map_err(|e| e.into_iter().map(|e| e.to_string()).collect::<Vec<_>>())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if let Err(e) = self.database_address() {
            problems.push(e);
        }
        for url in &self.reachability_urls {
            if let Err(e) = Url::parse(url) {
                problems.push(format!("reachability url `{url}`: {e}"));
            }
        }
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            problems.push(format!("bind_address `{}` is not a socket address", self.bind_address));
        }

        if problems.is_empty() { Ok(()) } else { Err(problems) }
    }

    /// Host and port of the database, taken from `database_url`.
    pub fn database_address(&self) -> Result<(String, u16), String> {
        database_address(&self.database_url)
    }
}

/// Host and port named by a database URL. The port defaults to
/// [`DEFAULT_DATABASE_PORT`].
pub(crate) fn database_address(database_url: &str) -> Result<(String, u16), String> {
    let url = Url::parse(database_url)
        .map_err(|e| format!("database_url: {e}"))?;
    let host = url.host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| "database_url: missing host".to_owned())?;
    Ok((host.to_owned(), url.port().unwrap_or(DEFAULT_DATABASE_PORT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use figment::providers::{Format, Json};

    #[test]
    fn loads_from_environment_with_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("SLUICE_DATABASE_URL", "postgres://reader@db.internal/cgn");
            let config = Config::load().map_err(|e| e.join("; "))?;
            assert_eq!(config.database_url, "postgres://reader@db.internal/cgn");
            assert!(config.reachability_urls.is_empty());
            assert_eq!(config.bind_address, "0.0.0.0:3000");
            assert_eq!(config.database_address().unwrap(), ("db.internal".to_owned(), 5432));
            Ok(())
        });
    }

    #[test]
    fn missing_database_url_is_reported() {
        Jail::expect_with(|_| {
            let problems = Config::load().unwrap_err();
            assert_eq!(problems.len(), 1);
            assert!(problems[0].contains("database_url"));
            Ok(())
        });
    }

    #[test]
    fn every_invalid_value_is_reported() {
        let figment = Figment::new().merge(Json::string(
            r#"{
                "database_url": "not a url",
                "reachability_urls": ["https://ok.example", "::nope"],
                "bind_address": "nowhere"
            }"#,
        ));
        let problems = Config::from_figment(figment).unwrap_err();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].starts_with("database_url"));
        assert!(problems[1].contains("::nope"));
        assert!(problems[2].contains("nowhere"));
    }

    #[test]
    fn explicit_database_port_is_kept() {
        let figment = Figment::new().merge(Json::string(
            r#"{ "database_url": "postgres://db:6543/cgn" }"#,
        ));
        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.database_address().unwrap(), ("db".to_owned(), 6543));
    }
}
