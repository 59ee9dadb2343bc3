// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! pgconf-propagator - PostgreSQL Settings Reconciliation for Patroni Members
//!
//! This crate brings the parameters of a running PostgreSQL member in line
//! with a property file and restarts the member through Patroni when a
//! change only takes effect after a restart.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐
//! │  Property file   │      │    PostgreSQL    │
//! │  key=value lines │      │   pg_settings    │
//! └──────────────────┘      └──────────────────┘
//!          │                         │
//!          ▼                         ▼
//! ┌──────────────────┐      ┌──────────────────┐
//! │     settings     │─────►│    reconciler    │◄── inspector
//! └──────────────────┘      └──────────────────┘
//!                                    │ ConfigDiff
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Patroni REST API (port 8008)                │
//! │   PATCH /config            GET /  (pending_restart)         │
//! └─────────────────────────────────────────────────────────────┘
//!                                    │ pending
//!                                    ▼
//!                       patronictl restart <cluster> <member> --force
//! ```
//!
//! # Runs
//!
//! | Run | Description |
//! |-----|-------------|
//! | `propagate` | Diff, reject internal-context changes, patch, poll, restart |
//! | `validate` | Diff only; restart if a restart is pending and requested |
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Nothing to change, or changes applied without restart |
//! | 1 | Fatal error, patch rejected, or restart pending/scheduled |
//!
//! # Failure handling
//!
//! Single-parameter engine reads are best-effort (`Option`), the
//! pending-restart aggregate is strict (`Result`). Coordinator requests run
//! under a [`RetryPolicy`].

pub mod config;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod inspector;
pub mod pipeline;
pub mod reconciler;
pub mod restart;
pub mod retry;
pub mod settings;

pub use config::{Config, Credentials, RestartPollSettings};
pub use coordinator::{CoordinatorClient, PatchSubmitter, RestartPoller};
pub use error::{Error, Result};
pub use inspector::{LiveStateInspector, MockInspector, PostgresInspector, SettingContext};
pub use pipeline::{Pipeline, RunOutcome};
pub use reconciler::{ConfigDiff, Reconciler, Setting};
pub use restart::{MockRestartCommand, RestartCommand, RestartOrchestrator};
pub use retry::RetryPolicy;
