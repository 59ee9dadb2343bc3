// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for pgconf-propagator.

use thiserror::Error;

/// Propagator errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database did not accept a connection in time.
    #[error("Database connection timed out after {0}ms")]
    DatabaseTimeout(u64),

    /// HTTP request to the coordinator failed at the transport level.
    #[error("Coordinator request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A change was requested for a parameter that cannot be changed at runtime.
    #[error("Cannot change parameter of internal context: {0}")]
    ImmutableSetting(String),

    /// The restart command could not be issued.
    #[error("Restart command failed: {0}")]
    RestartCommand(String),

    /// The local member address could not be determined.
    #[error("Cannot resolve local address: {0}")]
    HostResolution(String),
}

/// Result type using propagator Error.
pub type Result<T> = std::result::Result<T, Error>;
