//! Integration tests for the watcher scheduler lifecycle
//!
//! The scheduler runs against a fully wired `TestEnv`; the cron cadence is
//! never waited on, only start/stop/restart transitions and the immediate
//! check fired on start.

mod common;

use common::fixtures::*;
use std::time::Duration;

use dns_manager::database::{WatchedRecordType, WatcherSettings, WatcherStatus};
use dns_manager::watcher::SchedulerStatus;

const WATCHER_ID: &str = "w-home";
const RECORD: &str = "home.example.com";

/// Poll until the watcher has been reconciled at least once
async fn wait_for_status(env: &TestEnv) -> Option<WatcherStatus> {
    for _ in 0..50 {
        let stored = env.db().get_watcher_by_id(WATCHER_ID).await.unwrap().unwrap();
        if stored.status.is_some() {
            return stored.status;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    None
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_before_start_reports_default_interval() {
    let env = TestEnv::start().await.unwrap();

    assert_eq!(
        env.scheduler().status().await,
        SchedulerStatus {
            running: false,
            interval: 5
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_runs_an_immediate_check() {
    let env = TestEnv::start().await.unwrap();
    env.db().insert_zone(&default_zone()).await.unwrap();
    env.db()
        .insert_watcher(&watcher(WATCHER_ID, RECORD, WatchedRecordType::A))
        .await
        .unwrap();
    env.ip.mock_ips(SERVER_IPV4, None).await;
    env.cloudflare
        .mock_list_records(ZONE_ID, vec![cf_record("r1", RECORD, "A", SERVER_IPV4)])
        .await;

    env.scheduler().start().await.unwrap();

    assert_eq!(
        env.scheduler().status().await,
        SchedulerStatus {
            running: true,
            interval: 5
        }
    );
    assert_eq!(wait_for_status(&env).await, Some(WatcherStatus::Ok));

    env.scheduler().stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_twice_keeps_one_job() {
    let env = TestEnv::start().await.unwrap();

    env.scheduler().start().await.unwrap();
    env.scheduler().start().await.unwrap();
    assert!(env.scheduler().status().await.running);

    // A single stop is enough to halt it
    env.scheduler().stop().await.unwrap();
    assert!(!env.scheduler().status().await.running);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_is_idempotent() {
    let env = TestEnv::start().await.unwrap();
    env.scheduler().start().await.unwrap();

    env.scheduler().stop().await.unwrap();
    env.scheduler().stop().await.unwrap();

    assert!(!env.scheduler().status().await.running);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restart_picks_up_persisted_interval() {
    let env = TestEnv::start().await.unwrap();
    env.scheduler().start().await.unwrap();

    env.set_watcher_settings(WatcherSettings {
        check_interval_minutes: 7,
        ..WatcherSettings::default()
    })
    .await
    .unwrap();

    env.scheduler().restart().await.unwrap();
    let first = env.scheduler().status().await;
    env.scheduler().restart().await.unwrap();
    let second = env.scheduler().status().await;

    let expected = SchedulerStatus {
        running: true,
        interval: 7,
    };
    assert_eq!(first, expected);
    assert_eq!(second, expected);

    env.scheduler().stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_restart_from_stopped_starts() {
    let env = TestEnv::start().await.unwrap();

    env.scheduler().restart().await.unwrap();

    assert!(env.scheduler().status().await.running);
    env.scheduler().stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_apply_interval_restarts_only_on_change() {
    let env = TestEnv::start().await.unwrap();
    env.scheduler().start().await.unwrap();

    assert!(!env.scheduler().apply_interval(5).await.unwrap());

    env.set_watcher_settings(WatcherSettings {
        check_interval_minutes: 15,
        ..WatcherSettings::default()
    })
    .await
    .unwrap();
    assert!(env.scheduler().apply_interval(15).await.unwrap());
    assert_eq!(env.scheduler().status().await.interval, 15);

    assert!(!env.scheduler().apply_interval(15).await.unwrap());

    env.scheduler().stop().await.unwrap();
}
