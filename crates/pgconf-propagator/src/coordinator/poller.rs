// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pending-restart polling.

use std::time::Duration;

use tracing::{info, warn};

use super::CoordinatorClient;
use crate::retry::RetryPolicy;

/// Watches the member status for a pending restart.
#[derive(Debug, Clone)]
pub struct RestartPoller {
    client: CoordinatorClient,
    retry: RetryPolicy,
}

impl RestartPoller {
    pub fn new(client: CoordinatorClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Poll up to `iterations` times, sleeping `interval` before each check.
    ///
    /// Returns `true` on the first positive reading. A check that still fails
    /// after the retry policy counts as "not pending" for that iteration.
    pub async fn poll_pending_restart(&self, iterations: u32, interval: Duration) -> bool {
        for iteration in 1..=iterations {
            tokio::time::sleep(interval).await;

            match self
                .retry
                .run("restart state check", || self.client.member_status())
                .await
            {
                Ok(status) => {
                    info!(
                        iteration,
                        pending_restart = status.pending_restart,
                        state = status.state.as_deref().unwrap_or("unknown"),
                        "Checking restart state"
                    );
                    if status.pending_restart {
                        return true;
                    }
                }
                Err(e) => {
                    warn!(iteration, error = %e, "Cannot read restart state");
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn poller(uri: &str) -> RestartPoller {
        let client = CoordinatorClient::new(
            uri,
            Credentials::new("patroni", "patroni"),
            Duration::from_secs(5),
        )
        .unwrap();
        RestartPoller::new(client, RetryPolicy::no_retry())
    }

    fn status(pending: bool) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "state": "running",
            "role": "master",
            "pending_restart": pending
        }))
    }

    #[tokio::test]
    async fn test_stops_on_first_pending_reading() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(status(true))
            .expect(1)
            .mount(&server)
            .await;

        assert!(
            poller(&server.uri())
                .poll_pending_restart(5, Duration::ZERO)
                .await
        );
    }

    #[tokio::test]
    async fn test_exhausts_budget_when_never_pending() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(status(false))
            .expect(4)
            .mount(&server)
            .await;

        assert!(
            !poller(&server.uri())
                .poll_pending_restart(4, Duration::ZERO)
                .await
        );
    }

    #[tokio::test]
    async fn test_pending_on_third_poll() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(status(false))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(status(true))
            .expect(1)
            .mount(&server)
            .await;

        assert!(
            poller(&server.uri())
                .poll_pending_restart(5, Duration::ZERO)
                .await
        );
    }

    #[tokio::test]
    async fn test_missing_flag_counts_as_not_pending() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(2)
            .mount(&server)
            .await;

        assert!(
            !poller(&server.uri())
                .poll_pending_restart(2, Duration::ZERO)
                .await
        );
    }

    #[tokio::test]
    async fn test_failed_check_counts_as_not_pending() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(status(true))
            .expect(1)
            .mount(&server)
            .await;

        assert!(
            poller(&server.uri())
                .poll_pending_restart(3, Duration::ZERO)
                .await
        );
    }

    #[tokio::test]
    async fn test_zero_iterations_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(status(true))
            .expect(0)
            .mount(&server)
            .await;

        assert!(
            !poller(&server.uri())
                .poll_pending_restart(0, Duration::ZERO)
                .await
        );
    }

    #[tokio::test]
    async fn test_sleeps_before_first_check() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(status(true))
            .mount(&server)
            .await;

        let start = std::time::Instant::now();
        poller(&server.uri())
            .poll_pending_restart(1, Duration::from_millis(200))
            .await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
