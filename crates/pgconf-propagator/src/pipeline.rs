// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Propagation and validation runs.
//!
//! Stages run strictly one after another:
//!
//! ```text
//! settings file ─► Reconciler ◄─ LiveStateInspector
//!                      │
//!                      ▼
//!               PatchSubmitter ─► RestartPoller ─► RestartOrchestrator
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, RestartPollSettings};
use crate::coordinator::{CoordinatorClient, PatchSubmitter, RestartPoller};
use crate::error::Result;
use crate::inspector::{LiveStateInspector, PostgresInspector};
use crate::reconciler::Reconciler;
use crate::restart::RestartOrchestrator;
use crate::retry::RetryPolicy;
use crate::settings::{DesiredSettings, read_property_file};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Live state already matches.
    NoChanges,
    /// Differences were applied (or only detected) and no restart is pending.
    Applied,
    /// The coordinator answered the patch with a non-success status.
    Rejected { status: u16 },
    /// A restart is pending and was not requested.
    RestartPending,
    /// A restart of this member was issued.
    RestartScheduled,
}

impl RunOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoChanges | Self::Applied => 0,
            Self::Rejected { .. } | Self::RestartPending | Self::RestartScheduled => 1,
        }
    }
}

/// Components that talk to the coordinator and restart the member.
struct Coordination {
    submitter: PatchSubmitter,
    poller: RestartPoller,
    orchestrator: RestartOrchestrator,
}

impl Coordination {
    fn new(
        client: CoordinatorClient,
        orchestrator: RestartOrchestrator,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            submitter: PatchSubmitter::new(client.clone(), retry),
            poller: RestartPoller::new(client, retry),
            orchestrator,
        }
    }

    fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            CoordinatorClient::from_config(config)?,
            RestartOrchestrator::from_config(config)?,
            config.http_retry,
        ))
    }
}

enum CoordinationSource {
    Ready(Arc<Coordination>),
    /// Built on first use; a run without changes never resolves it.
    FromConfig(Box<Config>),
}

/// Wires the components for one run.
pub struct Pipeline {
    inspector: Arc<dyn LiveStateInspector>,
    coordination: CoordinationSource,
    poll: RestartPollSettings,
}

impl Pipeline {
    pub fn new(
        inspector: Arc<dyn LiveStateInspector>,
        client: CoordinatorClient,
        orchestrator: RestartOrchestrator,
        poll: RestartPollSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inspector,
            coordination: CoordinationSource::Ready(Arc::new(Coordination::new(
                client,
                orchestrator,
                retry,
            ))),
            poll,
        }
    }

    /// Pipeline whose coordinator side is built from `config` once a diff
    /// needs it.
    ///
    /// The member address, credentials and cluster name are only checked
    /// then, so a run with nothing to change succeeds without them.
    pub fn with_config(inspector: Arc<dyn LiveStateInspector>, config: Config) -> Self {
        Self {
            inspector,
            poll: config.restart_poll,
            coordination: CoordinationSource::FromConfig(Box::new(config)),
        }
    }

    /// Production wiring: engine inspector, local member API and `patronictl`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_config(
            Arc::new(PostgresInspector::from_config(config)?),
            config.clone(),
        ))
    }

    fn coordination(&self) -> Result<Arc<Coordination>> {
        match &self.coordination {
            CoordinationSource::Ready(coordination) => Ok(coordination.clone()),
            CoordinationSource::FromConfig(config) => {
                Ok(Arc::new(Coordination::from_config(config)?))
            }
        }
    }

    /// Apply the settings of `path` to the cluster.
    pub async fn propagate_file(&self, path: &Path) -> Result<RunOutcome> {
        info!(path = %path.display(), "Try to propagate property file to cluster");
        let desired = read_property_file(path)?;
        self.propagate(&desired).await
    }

    /// Apply `desired` to the cluster.
    ///
    /// Fails without contacting the coordinator if any changed parameter is
    /// of internal context.
    pub async fn propagate(&self, desired: &DesiredSettings) -> Result<RunOutcome> {
        let diff = Reconciler::new(self.inspector.clone()).reconcile(desired).await?;
        if diff.is_empty() {
            return Ok(RunOutcome::NoChanges);
        }

        let coordination = self.coordination()?;

        let outcome = coordination.submitter.submit(&diff).await?;
        if !outcome.is_accepted() {
            return Ok(RunOutcome::Rejected {
                status: outcome.status.as_u16(),
            });
        }

        if coordination
            .poller
            .poll_pending_restart(self.poll.iterations, self.poll.interval)
            .await
        {
            coordination.orchestrator.schedule_restart().await?;
            return Ok(RunOutcome::RestartScheduled);
        }

        info!("Settings applied without restart");
        Ok(RunOutcome::Applied)
    }

    /// Check the settings of `path` against the running engine.
    pub async fn validate_file(&self, path: &Path, restart: bool) -> Result<RunOutcome> {
        info!(path = %path.display(), "Start settings validation");
        let desired = read_property_file(path)?;
        self.validate(&desired, restart).await
    }

    /// Check `desired` against the running engine without submitting anything.
    ///
    /// When settings differ and a restart is pending, either according to the
    /// coordinator or to the engine itself, the member is restarted if
    /// `restart` is set.
    pub async fn validate(&self, desired: &DesiredSettings, restart: bool) -> Result<RunOutcome> {
        let diff = Reconciler::new(self.inspector.clone())
            .without_context_check()
            .reconcile(desired)
            .await?;
        if diff.is_empty() {
            return Ok(RunOutcome::NoChanges);
        }

        let coordination = self.coordination()?;

        let pending = coordination
            .poller
            .poll_pending_restart(self.poll.iterations, self.poll.interval)
            .await
            || self.inspector.has_pending_restart().await?;

        if !pending {
            info!("Differences do not require a restart");
            return Ok(RunOutcome::Applied);
        }

        if restart {
            info!("Schedule restart because some settings require restart");
            coordination.orchestrator.schedule_restart().await?;
            Ok(RunOutcome::RestartScheduled)
        } else {
            warn!(
                member = coordination.orchestrator.member_name(),
                "Restart is pending and restart was not requested"
            );
            Ok(RunOutcome::RestartPending)
        }
    }
}
