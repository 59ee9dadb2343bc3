// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock restart backend for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{RestartCommand, RestartOutcome};
use crate::error::{Error, Result};

/// Records restart requests instead of issuing them.
#[derive(Debug, Default)]
pub struct MockRestartCommand {
    requests: Mutex<Vec<(String, String)>>,
    /// If true, every request fails
    pub fail_by_default: bool,
}

impl MockRestartCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose requests always fail.
    pub fn failing() -> Self {
        Self {
            fail_by_default: true,
            ..Self::default()
        }
    }

    /// `(cluster, member)` pairs received so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestartCommand for MockRestartCommand {
    fn command_type(&self) -> &'static str {
        "mock"
    }

    async fn restart_member(&self, cluster: &str, member: &str) -> Result<RestartOutcome> {
        self.requests
            .lock()
            .unwrap()
            .push((cluster.to_string(), member.to_string()));

        if self.fail_by_default {
            return Err(Error::RestartCommand("mock failure".to_string()));
        }
        Ok(RestartOutcome {
            cluster: cluster.to_string(),
            member: member.to_string(),
            pid: None,
        })
    }
}
