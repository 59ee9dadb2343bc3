// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `patronictl` restart backend.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{RestartCommand, RestartOutcome};
use crate::config::Config;
use crate::error::{Error, Result};

/// Spawns `patronictl -c <config> restart <cluster> <member> --force`.
#[derive(Debug, Clone)]
pub struct PatronictlRestart {
    binary: String,
    config_path: PathBuf,
}

impl PatronictlRestart {
    pub fn new(binary: impl Into<String>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            config_path: config_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.patronictl_bin, &config.patroni_config_path)
    }

    /// Arguments for a forced restart of exactly one member.
    pub fn restart_args(&self, cluster: &str, member: &str) -> Vec<String> {
        vec![
            "-c".to_string(),
            self.config_path.to_string_lossy().into_owned(),
            "restart".to_string(),
            cluster.to_string(),
            member.to_string(),
            "--force".to_string(),
        ]
    }
}

#[async_trait]
impl RestartCommand for PatronictlRestart {
    fn command_type(&self) -> &'static str {
        "patronictl"
    }

    async fn restart_member(&self, cluster: &str, member: &str) -> Result<RestartOutcome> {
        let args = self.restart_args(cluster, member);
        debug!(binary = %self.binary, args = ?args, "Spawning restart command");

        // The child is detached from our lifetime; dropping the handle does not kill it.
        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::RestartCommand(format!("cannot spawn {}: {}", self.binary, e)))?;

        let pid = child.id();
        info!(pid = ?pid, cluster, member, "Restart command issued");

        Ok(RestartOutcome {
            cluster: cluster.to_string(),
            member: member.to_string(),
            pid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_args_target_single_member_with_force() {
        let restart = PatronictlRestart::new("patronictl", "/patroni/pg_node.yml");

        assert_eq!(
            restart.restart_args("main", "pg-node-1"),
            vec![
                "-c",
                "/patroni/pg_node.yml",
                "restart",
                "main",
                "pg-node-1",
                "--force"
            ]
        );
    }

    #[tokio::test]
    async fn test_restart_member_spawns_command() {
        // `true` ignores its arguments and exits immediately.
        let restart = PatronictlRestart::new("true", "/patroni/pg_node.yml");

        let outcome = restart.restart_member("main", "pg-node-1").await.unwrap();

        assert_eq!(outcome.member, "pg-node-1");
        assert!(outcome.pid.is_some());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let restart = PatronictlRestart::new("/nonexistent/patronictl", "/patroni/pg_node.yml");

        let err = restart.restart_member("main", "pg-0").await.unwrap_err();
        assert!(matches!(err, Error::RestartCommand(_)));
    }
}
