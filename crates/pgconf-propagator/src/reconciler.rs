// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Desired vs live settings diff.
//!
//! A pass either yields the complete diff or fails before anything is
//! submitted; a partially applied set of changes is never produced.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::inspector::{LiveStateInspector, SettingContext};
use crate::settings::DesiredSettings;

/// A parameter observed during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub name: String,
    pub desired_value: String,
    pub current_value: Option<String>,
    pub context: SettingContext,
}

impl Setting {
    /// Whether the desired value differs from a known live value.
    pub fn is_changed(&self) -> bool {
        self.current_value
            .as_deref()
            .is_some_and(|current| current != self.desired_value)
    }
}

/// Parameters that must change, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigDiff(BTreeMap<String, String>);

impl ConfigDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigDiff {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Computes the diff between desired settings and the running engine.
pub struct Reconciler {
    inspector: Arc<dyn LiveStateInspector>,
    enforce_context: bool,
}

impl Reconciler {
    /// Create a reconciler that rejects changes to internal parameters.
    pub fn new(inspector: Arc<dyn LiveStateInspector>) -> Self {
        Self {
            inspector,
            enforce_context: true,
        }
    }

    /// Skip the context lookup; used when only detecting drift.
    pub fn without_context_check(mut self) -> Self {
        self.enforce_context = false;
        self
    }

    /// Build the diff for `desired`.
    ///
    /// Parameters whose live value is unknown are skipped. The first changed
    /// parameter of `internal` context aborts the pass with
    /// [`Error::ImmutableSetting`].
    pub async fn reconcile(&self, desired: &DesiredSettings) -> Result<ConfigDiff> {
        let mut diff = ConfigDiff::new();

        for (name, desired_value) in desired {
            let Some(setting) = self.inspect(name, desired_value).await else {
                continue;
            };
            if !setting.is_changed() {
                continue;
            }

            if self.enforce_context && setting.context.is_immutable() {
                error!(
                    setting = %setting.name,
                    "We cannot change variable of internal context"
                );
                return Err(Error::ImmutableSetting(setting.name));
            }

            info!(
                setting = %setting.name,
                current = setting.current_value.as_deref().unwrap_or_default(),
                desired = %setting.desired_value,
                context = %setting.context,
                "Setting requires update"
            );
            diff.insert(setting.name, setting.desired_value);
        }

        if diff.is_empty() {
            info!("No properties to update");
        } else {
            info!(count = diff.len(), "Properties to update");
        }
        Ok(diff)
    }

    async fn inspect(&self, name: &str, desired_value: &str) -> Option<Setting> {
        let Some(current_value) = self.inspector.current_value(name).await else {
            warn!(setting = name, "Live value is unknown, skipping");
            return None;
        };
        debug!(
            setting = name,
            current = %current_value,
            desired = desired_value,
            "Compared setting"
        );

        // The context is only needed for parameters that actually change.
        let context = if self.enforce_context && current_value != desired_value {
            self.inspector
                .context(name)
                .await
                .unwrap_or(SettingContext::Unknown)
        } else {
            SettingContext::Unknown
        };

        Some(Setting {
            name: name.to_string(),
            desired_value: desired_value.to_string(),
            current_value: Some(current_value),
            context,
        })
    }
}
