// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for pgconf-propagator.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

const DEFAULT_DATABASE_URL: &str = "postgres://postgres@localhost:5432/postgres";

/// Basic-auth credentials for the coordinator REST API.
///
/// Loaded once per run. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How often and how long to wait for the coordinator to report a pending restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPollSettings {
    /// Number of status checks.
    pub iterations: u32,
    /// Sleep before every check.
    pub interval: Duration,
}

impl Default for RestartPollSettings {
    fn default() -> Self {
        Self {
            iterations: 5,
            interval: Duration::from_secs(3),
        }
    }
}

/// Propagator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection URL of the local engine
    pub database_url: String,
    /// Connect timeout for every engine lookup
    pub db_connect_timeout: Duration,
    /// Server-side statement timeout for every engine lookup
    pub db_statement_timeout: Duration,
    /// Port of the coordinator REST API on this member
    pub coordinator_port: u16,
    /// Explicit address of this member, preferred over interface lookup
    pub pod_ip: Option<String>,
    /// Interface inspected when no explicit address is given
    pub network_interface: String,
    /// Coordinator REST API credentials
    pub credentials: Option<Credentials>,
    /// Cluster the member belongs to
    pub cluster_name: Option<String>,
    /// Name of this member inside the cluster
    pub member_name: String,
    /// Path of the coordinator configuration passed to `patronictl`
    pub patroni_config_path: PathBuf,
    /// `patronictl` executable
    pub patronictl_bin: String,
    /// Pending-restart polling budget
    pub restart_poll: RestartPollSettings,
    /// Retry policy for coordinator requests
    pub http_retry: RetryPolicy,
    /// Timeout of a single coordinator request
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required once there is something to submit (checked by
    /// [`Config::credentials`] and [`Config::cluster_name`]):
    /// - `PATRONI_REST_API_USER`, `PATRONI_REST_API_PASSWORD`: coordinator credentials
    /// - `PG_CLUST_NAME`: cluster name
    ///
    /// Optional (with defaults):
    /// - `PGCONF_DATABASE_URL` (default: postgres://postgres@localhost:5432/postgres)
    /// - `PGCONF_DB_CONNECT_TIMEOUT_MS`, `PGCONF_DB_STATEMENT_TIMEOUT_MS` (default: 3000)
    /// - `PATRONI_API_PORT` (default: 8008)
    /// - `POD_IP` (default: unset), `PGCONF_NETWORK_INTERFACE` (default: eth0)
    /// - `PATRONI_NAME` (default: host name)
    /// - `PATRONI_CONFIG_FILE` (default: /patroni/pg_node.yml)
    /// - `PATRONICTL_BIN` (default: patronictl)
    /// - `CHANGE_SETTINGS_RETRIES` (default: 5), `CHANGE_SETTINGS_INTERVAL` seconds (default: 3)
    /// - `PGCONF_HTTP_RETRIES` (default: 5, <= 0 retries forever)
    /// - `PGCONF_HTTP_RETRY_DELAY_MS` (default: 1000), `PGCONF_HTTP_RETRY_BACKOFF` (default: 1.0)
    /// - `PGCONF_HTTP_TIMEOUT_MS` (default: 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url =
            var("PGCONF_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let db_connect_timeout = Duration::from_millis(parse_or(
            var("PGCONF_DB_CONNECT_TIMEOUT_MS"),
            3000u64,
            "PGCONF_DB_CONNECT_TIMEOUT_MS",
            "must be a number of milliseconds",
        )?);
        let db_statement_timeout = Duration::from_millis(parse_or(
            var("PGCONF_DB_STATEMENT_TIMEOUT_MS"),
            3000u64,
            "PGCONF_DB_STATEMENT_TIMEOUT_MS",
            "must be a number of milliseconds",
        )?);

        let coordinator_port: u16 = parse_or(
            var("PATRONI_API_PORT"),
            8008,
            "PATRONI_API_PORT",
            "must be a valid port number",
        )?;

        let credentials = match (
            var("PATRONI_REST_API_USER"),
            var("PATRONI_REST_API_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        };

        let member_name = match var("PATRONI_NAME") {
            Some(name) => name,
            None => local_hostname()?,
        };

        let iterations: u32 = parse_or(
            var("CHANGE_SETTINGS_RETRIES"),
            5,
            "CHANGE_SETTINGS_RETRIES",
            "must be a non-negative integer",
        )?;
        let interval_secs: u64 = parse_or(
            var("CHANGE_SETTINGS_INTERVAL"),
            3,
            "CHANGE_SETTINGS_INTERVAL",
            "must be a number of seconds",
        )?;

        let max_attempts: i32 = parse_or(
            var("PGCONF_HTTP_RETRIES"),
            5,
            "PGCONF_HTTP_RETRIES",
            "must be an integer",
        )?;
        let retry_delay_ms: u64 = parse_or(
            var("PGCONF_HTTP_RETRY_DELAY_MS"),
            1000,
            "PGCONF_HTTP_RETRY_DELAY_MS",
            "must be a number of milliseconds",
        )?;
        let backoff_factor: f64 = parse_or(
            var("PGCONF_HTTP_RETRY_BACKOFF"),
            1.0,
            "PGCONF_HTTP_RETRY_BACKOFF",
            "must be a number",
        )?;
        if !backoff_factor.is_finite() || backoff_factor < 0.0 {
            return Err(ConfigError::Invalid(
                "PGCONF_HTTP_RETRY_BACKOFF",
                "must be a non-negative number",
            ));
        }

        let http_timeout_ms: u64 = parse_or(
            var("PGCONF_HTTP_TIMEOUT_MS"),
            10_000,
            "PGCONF_HTTP_TIMEOUT_MS",
            "must be a number of milliseconds",
        )?;

        Ok(Self {
            database_url,
            db_connect_timeout,
            db_statement_timeout,
            coordinator_port,
            pod_ip: var("POD_IP").map(|ip| ip.trim().to_string()),
            network_interface: var("PGCONF_NETWORK_INTERFACE")
                .unwrap_or_else(|| "eth0".to_string()),
            credentials,
            cluster_name: var("PG_CLUST_NAME"),
            member_name,
            patroni_config_path: PathBuf::from(
                var("PATRONI_CONFIG_FILE").unwrap_or_else(|| "/patroni/pg_node.yml".to_string()),
            ),
            patronictl_bin: var("PATRONICTL_BIN").unwrap_or_else(|| "patronictl".to_string()),
            restart_poll: RestartPollSettings {
                iterations,
                interval: Duration::from_secs(interval_secs),
            },
            http_retry: RetryPolicy::new(
                max_attempts,
                Duration::from_millis(retry_delay_ms),
                backoff_factor,
            ),
            http_timeout: Duration::from_millis(http_timeout_ms),
        })
    }
}

impl Config {
    /// Coordinator credentials, or the first missing variable.
    pub fn credentials(&self) -> Result<&Credentials, ConfigError> {
        self.credentials.as_ref().ok_or(ConfigError::Missing(
            "PATRONI_REST_API_USER or PATRONI_REST_API_PASSWORD",
        ))
    }

    /// Cluster name used to address restarts.
    pub fn cluster_name(&self) -> Result<&str, ConfigError> {
        self.cluster_name
            .as_deref()
            .ok_or(ConfigError::Missing("PG_CLUST_NAME"))
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    default: T,
    key: &'static str,
    reason: &'static str,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, reason)),
        None => Ok(default),
    }
}

fn local_hostname() -> Result<String, ConfigError> {
    nix::unistd::gethostname()
        .map_err(|_| ConfigError::Invalid("PATRONI_NAME", "not set and host name is unavailable"))?
        .into_string()
        .map_err(|_| ConfigError::Invalid("PATRONI_NAME", "not set and host name is not UTF-8"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
