// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Coordinator (Patroni) REST API access.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Submit parameter patch | `PATCH /config` |
//! | Read member status | `GET /` |
//!
//! Both requests use basic auth and are addressed to the local member.

mod patch;
mod poller;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;

use crate::config::{Config, Credentials};
use crate::error::Result;
use crate::host::resolve_local_host;

pub use patch::{ConfigPatch, EngineSection, PatchSubmitter, SubmitOutcome};
pub use poller::RestartPoller;

/// Status document returned by `GET /` on a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MemberStatus {
    /// A parameter change is waiting for a restart.
    #[serde(default)]
    pub pending_restart: bool,
    /// Engine state, e.g. "running".
    #[serde(default)]
    pub state: Option<String>,
    /// Member role, e.g. "master" or "replica".
    #[serde(default)]
    pub role: Option<String>,
}

/// Authenticated HTTP client bound to the local member's REST API.
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl CoordinatorClient {
    /// Create a client for `base_url` (scheme, host and port, no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Create a client for the local member described by `config`.
    ///
    /// Resolves the member address and checks the credentials, so this is
    /// only called once there is something to submit.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config.credentials()?.clone();
        let host = resolve_local_host(config.pod_ip.as_deref(), &config.network_interface)?;
        Self::new(
            format!("http://{}:{}", host, config.coordinator_port),
            credentials,
            config.http_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    /// Fetch the member status document.
    pub async fn member_status(&self) -> Result<MemberStatus> {
        // Replicas answer with a non-2xx status but still carry the document.
        let status = self
            .request(Method::GET, "/")
            .send()
            .await?
            .json::<MemberStatus>()
            .await?;
        Ok(status)
    }
}
