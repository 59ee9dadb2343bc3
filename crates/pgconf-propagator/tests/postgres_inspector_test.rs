// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgresInspector tests against a real engine.
//!
//! Run with `TEST_PGCONF_DATABASE_URL=postgres://... cargo test`.

mod common;

use std::time::Duration;

use pgconf_propagator::inspector::{LiveStateInspector, PostgresInspector, SettingContext};

fn inspector() -> PostgresInspector {
    let url = std::env::var("TEST_PGCONF_DATABASE_URL").expect("TEST_PGCONF_DATABASE_URL");
    PostgresInspector::new(&url, Duration::from_secs(3), Duration::from_secs(3))
        .expect("Failed to build inspector")
}

#[tokio::test]
async fn test_current_value_of_known_parameter() {
    skip_if_no_db!();

    let value = inspector().current_value("max_connections").await;

    let parsed: u32 = value
        .expect("max_connections should be readable")
        .parse()
        .expect("max_connections should be numeric");
    assert!(parsed > 0);
}

#[tokio::test]
async fn test_current_value_of_unknown_parameter_is_none() {
    skip_if_no_db!();

    assert_eq!(
        inspector().current_value("no_such_parameter_xyz").await,
        None
    );
}

#[tokio::test]
async fn test_contexts_of_known_parameters() {
    skip_if_no_db!();
    let inspector = inspector();

    assert_eq!(
        inspector.context("block_size").await,
        Some(SettingContext::Internal)
    );
    assert_eq!(
        inspector.context("max_connections").await,
        Some(SettingContext::Postmaster)
    );
    assert_eq!(
        inspector.context("work_mem").await,
        Some(SettingContext::User)
    );
    assert_eq!(inspector.context("no_such_parameter_xyz").await, None);
}

#[tokio::test]
async fn test_pending_restart_aggregate_is_readable() {
    skip_if_no_db!();

    assert!(inspector().has_pending_restart().await.is_ok());
}

#[tokio::test]
async fn test_repeated_lookups_do_not_leak_connections() {
    skip_if_no_db!();
    let inspector = inspector();

    // Far more lookups than a default max_connections would allow if leaked.
    for _ in 0..150 {
        assert!(inspector.current_value("work_mem").await.is_some());
    }
}
