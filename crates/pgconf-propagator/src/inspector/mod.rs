// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Live engine state lookups.
//!
//! Single-parameter reads are best-effort and return `None` when the engine
//! cannot answer. The pending-restart aggregate gates a restart decision, so
//! its failures are returned to the caller.

pub mod mock;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

pub use mock::MockInspector;
pub use postgres::PostgresInspector;

/// Mutability class of an engine parameter (`pg_settings.context`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingContext {
    /// Fixed at compile or initdb time, cannot be changed.
    Internal,
    /// Requires a server restart.
    Postmaster,
    /// Applied on configuration reload.
    Sighup,
    /// Fixed per session at connection start.
    Backend,
    /// Changeable by superusers at runtime.
    Superuser,
    /// Changeable by any user at runtime.
    User,
    /// Anything the engine reports that is not recognised.
    Unknown,
}

impl SettingContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Postmaster => "postmaster",
            Self::Sighup => "sighup",
            Self::Backend => "backend",
            Self::Superuser => "superuser",
            Self::User => "user",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a change to this parameter is rejected outright.
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

impl From<&str> for SettingContext {
    fn from(value: &str) -> Self {
        match value.trim() {
            "internal" => Self::Internal,
            "postmaster" => Self::Postmaster,
            "sighup" => Self::Sighup,
            "backend" | "superuser-backend" => Self::Backend,
            "superuser" => Self::Superuser,
            "user" => Self::User,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for SettingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the running engine.
#[async_trait]
pub trait LiveStateInspector: Send + Sync {
    /// Current effective value, or `None` if unknown or the engine is unreachable.
    async fn current_value(&self, name: &str) -> Option<String>;

    /// Mutability class, or `None` if unknown or the engine is unreachable.
    async fn context(&self, name: &str) -> Option<SettingContext>;

    /// Whether any parameter is waiting for a restart.
    async fn has_pending_restart(&self) -> Result<bool>;
}
