//! Watcher reconciliation: compares monitored DNS records against the host's
//! public IP and keeps watcher state, notifications and audit in step.
//!
//! `WatcherEngine::run_check` is the single entry point used by both the
//! cron scheduler and the manual trigger endpoint.

pub mod engine;
pub mod scheduler;

pub use engine::{CheckOutcome, CheckStatus, IpSync, WatcherCheckResult, WatcherEngine};
pub use scheduler::{interval_to_cron, SchedulerStatus, WatcherScheduler};
