// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parameter patch submission.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::{error, info};

use super::CoordinatorClient;
use crate::error::Result;
use crate::reconciler::ConfigDiff;
use crate::retry::RetryPolicy;
use crate::settings::LOG_LINE_PREFIX;

/// Body of `PATCH /config`.
///
/// Only the engine parameters section is present, so the coordinator merges
/// it without touching the rest of its dynamic configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigPatch {
    pub engine: EngineSection,
}

/// Engine section of a [`ConfigPatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSection {
    pub parameters: ConfigDiff,
}

impl ConfigPatch {
    /// Build the patch for `diff`.
    ///
    /// Backslashes are doubled in every value except `log_line_prefix`, so
    /// the coordinator writes them literally into the engine configuration.
    pub fn from_diff(diff: &ConfigDiff) -> Self {
        let parameters = diff
            .iter()
            .map(|(name, value)| (name.as_str(), escape_value(name, value)))
            .collect();

        Self {
            engine: EngineSection { parameters },
        }
    }
}

fn escape_value(name: &str, value: &str) -> String {
    if name == LOG_LINE_PREFIX {
        value.to_string()
    } else {
        value.replace('\\', "\\\\")
    }
}

/// Result of a completed patch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub status: StatusCode,
}

impl SubmitOutcome {
    /// Whether the coordinator accepted the patch.
    pub fn is_accepted(&self) -> bool {
        self.status.is_success()
    }
}

/// Sends configuration diffs to the coordinator.
#[derive(Debug, Clone)]
pub struct PatchSubmitter {
    client: CoordinatorClient,
    retry: RetryPolicy,
}

impl PatchSubmitter {
    pub fn new(client: CoordinatorClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Submit `diff` as a single patch.
    ///
    /// Any HTTP response counts as a completed submission and is returned
    /// as-is; only transport failures are retried.
    pub async fn submit(&self, diff: &ConfigDiff) -> Result<SubmitOutcome> {
        let body = serde_json::to_vec(&ConfigPatch::from_diff(diff))?;

        let status = self
            .retry
            .run("config patch", || self.send(body.clone()))
            .await?;

        let outcome = SubmitOutcome { status };
        if outcome.is_accepted() {
            info!(status = status.as_u16(), count = diff.len(), "Patch submitted");
        } else {
            error!(status = status.as_u16(), "Coordinator rejected the patch");
        }
        Ok(outcome)
    }

    async fn send(&self, body: Vec<u8>) -> std::result::Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .request(Method::PATCH, "/config")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Ok(response.status())
    }
}
