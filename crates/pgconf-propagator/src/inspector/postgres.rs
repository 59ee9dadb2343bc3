// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL-backed live state inspector.
//!
//! Every lookup opens its own connection, runs one parameterised query and
//! closes the connection before returning, so nothing stays open between
//! pipeline stages.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection};
use tracing::{debug, warn};

use super::{LiveStateInspector, SettingContext};
use crate::config::Config;
use crate::error::{Error, Result};

/// Inspector talking to the local engine.
#[derive(Debug, Clone)]
pub struct PostgresInspector {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PostgresInspector {
    /// Create an inspector for `database_url`.
    pub fn new(
        database_url: &str,
        connect_timeout: Duration,
        statement_timeout: Duration,
    ) -> Result<Self> {
        let options = PgConnectOptions::from_str(database_url)?.options([(
            "statement_timeout",
            statement_timeout.as_millis().to_string(),
        )]);

        Ok(Self {
            options,
            connect_timeout,
        })
    }

    /// Create an inspector from the propagator configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.database_url,
            config.db_connect_timeout,
            config.db_statement_timeout,
        )
    }

    async fn connect(&self) -> Result<PgConnection> {
        match tokio::time::timeout(self.connect_timeout, self.options.connect()).await {
            Ok(conn) => Ok(conn?),
            Err(_) => Err(Error::DatabaseTimeout(
                self.connect_timeout.as_millis() as u64,
            )),
        }
    }

    /// Run a single-row text lookup on a fresh connection, closing it whatever the outcome.
    async fn fetch_optional_text(&self, sql: &str, name: &str) -> Result<Option<String>> {
        let mut conn = self.connect().await?;

        let result = sqlx::query_scalar::<_, Option<String>>(sql)
            .bind(name)
            .fetch_optional(&mut conn)
            .await
            .map(Option::flatten);

        close(conn).await;
        Ok(result?)
    }
}

async fn close(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!(error = %e, "Failed to close engine connection cleanly");
    }
}

#[async_trait]
impl LiveStateInspector for PostgresInspector {
    async fn current_value(&self, name: &str) -> Option<String> {
        match self
            .fetch_optional_text("SELECT current_setting($1, true)", name)
            .await
        {
            Ok(value) => {
                debug!(setting = name, value = ?value, "Read current value");
                value
            }
            Err(e) => {
                warn!(setting = name, error = %e, "Cannot read current value");
                None
            }
        }
    }

    async fn context(&self, name: &str) -> Option<SettingContext> {
        match self
            .fetch_optional_text("SELECT context FROM pg_settings WHERE name = $1", name)
            .await
        {
            Ok(context) => context.as_deref().map(SettingContext::from),
            Err(e) => {
                warn!(setting = name, error = %e, "Cannot read parameter context");
                None
            }
        }
    }

    async fn has_pending_restart(&self) -> Result<bool> {
        let mut conn = self.connect().await?;

        let result = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM pg_settings WHERE pending_restart",
        )
        .fetch_one(&mut conn)
        .await;

        close(conn).await;

        match result {
            Ok(count) => Ok(count > 0),
            Err(e) => {
                warn!(error = %e, "Cannot get amount of parameters which require restart");
                Err(e.into())
            }
        }
    }
}
