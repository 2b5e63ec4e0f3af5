//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "OB_";

/// Endpoints and tuning for an [`ObeliskClient`](crate::ObeliskClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Request/response endpoint.
    pub endpoint: String,
    /// Heartbeat feed endpoint.
    pub heartbeat_endpoint: String,
    /// Block feed endpoint.
    pub block_endpoint: String,
    /// Unconfirmed transaction feed endpoint.
    pub transaction_endpoint: String,
    /// Log verbosity, either a `tracing` filter directive or one of the
    /// legacy names `silent`, `verbose` and `silly`.
    pub log_level: String,
    /// Fail requests that get no reply within this long. Disabled when `None`.
    pub request_timeout: Option<Duration>,
    /// How often an address watch renews its subscription.
    pub renew_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "tcp://127.0.0.1:9091".to_string(),
            heartbeat_endpoint: "tcp://127.0.0.1:9092".to_string(),
            block_endpoint: "tcp://127.0.0.1:9093".to_string(),
            transaction_endpoint: "tcp://127.0.0.1:9094".to_string(),
            log_level: "warn".to_string(),
            request_timeout: None,
            renew_interval: Duration::from_secs(120),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the `OB_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_vars(std::env::vars())
    }

    /// Defaults overlaid with `OB_*` pairs from `vars`.
    ///
    /// Recognised keys are `OB_PORT`, `OB_HBPORT`, `OB_BLKPORT`, `OB_TXPORT`,
    /// `OB_LOGLEVEL` and `OB_TIMEOUT` (whole seconds, 0 disables). Other keys
    /// are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.into();
            match name.to_ascii_lowercase().as_str() {
                "port" => config.endpoint = value,
                "hbport" => config.heartbeat_endpoint = value,
                "blkport" => config.block_endpoint = value,
                "txport" => config.transaction_endpoint = value,
                "loglevel" => config.log_level = value,
                "timeout" => {
                    let secs: u64 = value.trim().parse().map_err(|_| {
                        let reason = format!("OB_TIMEOUT must be whole seconds, got {:?}", value);
                        ClientError::Config(reason)
                    })?;
                    config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// The log level as a `tracing` filter directive.
    pub fn log_filter(&self) -> &str {
        match self.log_level.as_str() {
            "silent" => "off",
            "verbose" => "debug",
            "silly" => "trace",
            other => other,
        }
    }
}
