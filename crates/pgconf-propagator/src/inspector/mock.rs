// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock inspector for testing.
//!
//! An in-memory stand-in for the engine that records every lookup.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LiveStateInspector, SettingContext};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct MockState {
    values: HashMap<String, String>,
    contexts: HashMap<String, SettingContext>,
    lookups: Vec<String>,
}

/// Mock inspector for testing.
#[derive(Debug, Default)]
pub struct MockInspector {
    state: Mutex<MockState>,
    /// Answer for `has_pending_restart`
    pub pending_restart: bool,
    /// If true, every read behaves as if the engine were down
    pub unreachable: bool,
}

impl MockInspector {
    /// Create an empty mock inspector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock inspector whose engine never answers.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Register a live parameter.
    pub fn with_setting(self, name: &str, value: &str, context: SettingContext) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.values.insert(name.to_string(), value.to_string());
            state.contexts.insert(name.to_string(), context);
        }
        self
    }

    /// Register a live value whose context lookup finds nothing.
    pub fn with_value(self, name: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Set the answer of the pending-restart aggregate.
    pub fn with_pending_restart(mut self, pending: bool) -> Self {
        self.pending_restart = pending;
        self
    }

    /// Names passed to `current_value` and `context`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups.clone()
    }

    fn record(&self, name: &str) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push(name.to_string());
        state
    }
}

#[async_trait]
impl LiveStateInspector for MockInspector {
    async fn current_value(&self, name: &str) -> Option<String> {
        let state = self.record(name);
        if self.unreachable {
            return None;
        }
        state.values.get(name).cloned()
    }

    async fn context(&self, name: &str) -> Option<SettingContext> {
        let state = self.record(name);
        if self.unreachable {
            return None;
        }
        state.contexts.get(name).copied()
    }

    async fn has_pending_restart(&self) -> Result<bool> {
        if self.unreachable {
            return Err(Error::DatabaseTimeout(0));
        }
        Ok(self.pending_restart)
    }
}
