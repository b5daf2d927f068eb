//! Configuration for the store client, the engine timers and the daemon.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default address of the daemon's HTTP API.
pub const DEFAULT_API_ADDR: &str = "127.0.0.1:7786";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store root, e.g. `https://example.firebaseio.com`.
    pub base_url: String,

    /// Name of the alarm collection under the root.
    pub collection: String,

    /// Appended to every request path. `.json` for Firebase, empty for
    /// plain REST stores.
    pub path_suffix: String,

    /// Per-request timeout. A request that exceeds it is a network error.
    pub request_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            collection: "alarms".to_string(),
            path_suffix: String::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the repository polls the store.
    pub refresh_interval: Duration,

    /// Clock resolution. Triggering assumes ticks land in every second.
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(5),
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Everything the daemon needs, read from `ALARM_*` environment variables.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub api_addr: SocketAddr,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// | Variable             | Default            |
    /// |----------------------|--------------------|
    /// | `ALARM_STORE_URL`    | required           |
    /// | `ALARM_STORE_SUFFIX` | empty              |
    /// | `ALARM_REFRESH_SECS` | 5                  |
    /// | `ALARM_API_ADDR`     | `127.0.0.1:7786`   |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("ALARM_STORE_URL").context("ALARM_STORE_URL is not set")?;

        let mut store = StoreConfig {
            base_url,
            ..StoreConfig::default()
        };
        if let Some(suffix) = lookup("ALARM_STORE_SUFFIX") {
            store.path_suffix = suffix;
        }

        let mut engine = EngineConfig::default();
        if let Some(secs) = lookup("ALARM_REFRESH_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid ALARM_REFRESH_SECS {secs:?}"))?;
            anyhow::ensure!(secs > 0, "ALARM_REFRESH_SECS must be positive");
            engine.refresh_interval = Duration::from_secs(secs);
        }

        let api_addr = lookup("ALARM_API_ADDR").unwrap_or_else(|| DEFAULT_API_ADDR.to_string());
        let api_addr = api_addr
            .parse()
            .with_context(|| format!("invalid ALARM_API_ADDR {api_addr:?}"))?;

        Ok(Self {
            store,
            engine,
            api_addr,
        })
    }
}
