// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for pgconf-propagator pipeline tests.
//!
//! Provides TestContext wiring a mock engine, a mock coordinator and a
//! recording restart backend into a Pipeline.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pgconf_propagator::config::{Credentials, RestartPollSettings};
use pgconf_propagator::coordinator::CoordinatorClient;
use pgconf_propagator::inspector::MockInspector;
use pgconf_propagator::pipeline::Pipeline;
use pgconf_propagator::restart::{MockRestartCommand, RestartOrchestrator};
use pgconf_propagator::retry::RetryPolicy;

pub const CLUSTER: &str = "patroni";
pub const MEMBER: &str = "pg-node-0";

/// Test context that manages the mock coordinator and restart backend.
pub struct TestContext {
    pub server: MockServer,
    pub restarts: Arc<MockRestartCommand>,
    pub pipeline: Pipeline,
}

impl TestContext {
    /// Create a new test context around `inspector` polling `iterations` times.
    pub async fn new(inspector: MockInspector, iterations: u32) -> Self {
        Self::with_inspector(Arc::new(inspector), iterations).await
    }

    pub async fn with_inspector(inspector: Arc<MockInspector>, iterations: u32) -> Self {
        let server = MockServer::start().await;
        let restarts = Arc::new(MockRestartCommand::new());

        let client = CoordinatorClient::new(
            server.uri(),
            Credentials::new("patroni", "patroni"),
            Duration::from_secs(5),
        )
        .expect("Failed to create coordinator client");

        let pipeline = Pipeline::new(
            inspector,
            client,
            RestartOrchestrator::new(restarts.clone(), CLUSTER, MEMBER),
            RestartPollSettings {
                iterations,
                interval: Duration::ZERO,
            },
            RetryPolicy::new(2, Duration::from_millis(10), 1.0),
        );

        Self {
            server,
            restarts,
            pipeline,
        }
    }

    /// Accept `PATCH /config` with `status`, expecting `times` calls.
    pub async fn expect_patch(&self, status: u16, times: u64) {
        Mock::given(method("PATCH"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({})))
            .expect(times)
            .named("config patch")
            .mount(&self.server)
            .await;
    }

    /// Answer `GET /` with `pending_restart`, at most `times` times.
    pub async fn status_reply(&self, pending_restart: bool, times: u64) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(status_body(pending_restart))
            .up_to_n_times(times)
            .expect(times)
            .named("member status")
            .mount(&self.server)
            .await;
    }

    /// Number of requests the coordinator received for `http_method`.
    pub async fn request_count(&self, http_method: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method)
            .count()
    }
}

pub fn status_body(pending_restart: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "state": "running",
        "role": "master",
        "pending_restart": pending_restart
    }))
}

/// Helper macro to skip tests if database URL is not set.
#[macro_export]
macro_rules! skip_if_no_db {
    () => {
        if std::env::var("TEST_PGCONF_DATABASE_URL").is_err() {
            eprintln!("Skipping test: TEST_PGCONF_DATABASE_URL not set");
            return;
        }
    };
}
