// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Targeted restart of the local cluster member.
//!
//! The restart is always addressed to one named member and forced past the
//! interactive confirmation. It is fire-and-forget: the process issuing it
//! may itself be restarted, so completion is never awaited.

pub mod mock;
pub mod patronictl;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::Result;

pub use mock::MockRestartCommand;
pub use patronictl::PatronictlRestart;

/// What was issued by a restart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartOutcome {
    pub cluster: String,
    pub member: String,
    /// PID of the spawned command, when one was spawned.
    pub pid: Option<u32>,
}

/// Backend that issues the restart of a single member.
#[async_trait]
pub trait RestartCommand: Send + Sync {
    /// Backend identifier (e.g. "patronictl", "mock")
    fn command_type(&self) -> &'static str;

    /// Issue a forced restart of `member` in `cluster` without waiting for it.
    async fn restart_member(&self, cluster: &str, member: &str) -> Result<RestartOutcome>;
}

/// Schedules restarts of this member through a [`RestartCommand`].
pub struct RestartOrchestrator {
    command: Arc<dyn RestartCommand>,
    cluster_name: String,
    member_name: String,
}

impl RestartOrchestrator {
    pub fn new(
        command: Arc<dyn RestartCommand>,
        cluster_name: impl Into<String>,
        member_name: impl Into<String>,
    ) -> Self {
        Self {
            command,
            cluster_name: cluster_name.into(),
            member_name: member_name.into(),
        }
    }

    /// Orchestrator using `patronictl` for the member described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(PatronictlRestart::from_config(config)),
            config.cluster_name()?,
            &config.member_name,
        ))
    }

    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    /// Issue one restart command for the local member.
    pub async fn schedule_restart(&self) -> Result<RestartOutcome> {
        info!(
            cluster = %self.cluster_name,
            member = %self.member_name,
            command = self.command.command_type(),
            "Schedule restart"
        );
        self.command
            .restart_member(&self.cluster_name, &self.member_name)
            .await
    }
}
