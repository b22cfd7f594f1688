//! Cron-driven trigger for the reconciliation engine.
//!
//! The check interval (minutes) is converted into a 6-field cron expression
//! (sec min hour day month dow) for tokio-cron-scheduler:
//!
//! - intervals dividing 60 use a step, `5` becomes `0 */5 * * * *`
//! - other intervals up to 60 list their minutes, `7` becomes
//!   `0 0,7,14,21,28,35,42,49,56 * * * *` (the last gap of each hour is shorter)
//! - longer intervals must be whole hours and apply the same rule to the hour
//!   field, `120` becomes `0 0 */2 * * *`

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::engine::WatcherEngine;
use crate::constants::watcher::{
    DEFAULT_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES,
};
use crate::database::Database;
use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval: u32,
}

struct SchedulerState {
    job_id: Option<Uuid>,
    interval: u32,
    scheduler_started: bool,
}

pub struct WatcherScheduler {
    engine: Arc<WatcherEngine>,
    database: Arc<Database>,
    scheduler: JobScheduler,
    state: Mutex<SchedulerState>,
}

/// Values of the cron field for an interval that fits within one cycle
fn cycle_field(step: u32, cycle: u32) -> String {
    if step == cycle {
        "0".to_string()
    } else if cycle % step == 0 {
        format!("*/{}", step)
    } else {
        (0..cycle)
            .step_by(step as usize)
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn interval_to_cron(minutes: u32) -> Result<String, ValidationError> {
    if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        return Err(ValidationError::invalid(
            "checkIntervalMinutes",
            format!(
                "must be between {} and {} minutes",
                MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES
            ),
        ));
    }

    if minutes <= 60 {
        return Ok(format!("0 {} * * * *", cycle_field(minutes, 60)));
    }

    if minutes % 60 != 0 {
        return Err(ValidationError::invalid(
            "checkIntervalMinutes",
            "intervals above 60 minutes must be a whole number of hours",
        ));
    }

    Ok(format!("0 0 {} * * *", cycle_field(minutes / 60, 24)))
}

pub fn validate_6_field_cron(schedule: &str) -> Result<()> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();

    if parts.len() != 6 {
        return Err(anyhow!(
            "tokio-cron-scheduler requires exactly 6 fields: second minute hour day month dayofweek. Got {} fields: '{}'",
            parts.len(),
            schedule
        ));
    }

    validate_cron_field(parts[0], "second", 0, 59)?;
    validate_cron_field(parts[1], "minute", 0, 59)?;
    validate_cron_field(parts[2], "hour", 0, 23)?;
    validate_cron_field(parts[3], "day", 1, 31)?;
    validate_cron_field(parts[4], "month", 1, 12)?;
    validate_cron_field(parts[5], "dayofweek", 0, 7)?;

    Ok(())
}

fn validate_cron_field(field: &str, name: &str, min: u32, max: u32) -> Result<()> {
    if field == "*" || field == "?" {
        return Ok(());
    }

    if let Some(step_str) = field.strip_prefix("*/") {
        let step = step_str
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid {} step value: {}", name, step_str))?;
        if step == 0 || step > max {
            return Err(anyhow!("{} step value {} is out of range", name, step));
        }
        return Ok(());
    }

    for part in field.split(',') {
        let value = part
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, part))?;
        if value < min || value > max {
            return Err(anyhow!(
                "{} value {} is outside valid range {}-{}",
                name,
                value,
                min,
                max
            ));
        }
    }

    Ok(())
}

impl WatcherScheduler {
    pub async fn new(engine: Arc<WatcherEngine>, database: Arc<Database>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            engine,
            database,
            scheduler,
            state: Mutex::new(SchedulerState {
                job_id: None,
                interval: DEFAULT_INTERVAL_MINUTES,
                scheduler_started: false,
            }),
        })
    }

    /// Schedule checks at the persisted interval and run one right away.
    /// Calling it while already running is a no-op.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.job_id.is_some() {
            return Ok(());
        }
        self.start_locked(&mut state).await
    }

    /// Cancel future checks; an in-flight check is left to finish
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await
    }

    pub async fn restart(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await?;
        self.start_locked(&mut state).await
    }

    /// Restart only when the interval actually changed
    pub async fn apply_interval(&self, interval: u32) -> Result<bool> {
        let current = self.status().await;
        if current.running && current.interval == interval {
            return Ok(false);
        }
        self.restart().await?;
        Ok(true)
    }

    pub async fn status(&self) -> SchedulerStatus {
        let state = self.state.lock().await;
        SchedulerStatus {
            running: state.job_id.is_some(),
            interval: state.interval,
        }
    }

    async fn start_locked(&self, state: &mut SchedulerState) -> Result<()> {
        let settings = self.database.get_watcher_settings_or_default().await?;
        let interval = settings.check_interval_minutes;
        let schedule = interval_to_cron(interval)?;
        validate_6_field_cron(&schedule)
            .map_err(|e| anyhow!("Invalid 6-field cron schedule '{}': {}", schedule, e))?;

        let engine = self.engine.clone();
        let job = Job::new_async(schedule.as_str(), move |_uuid, _scheduler| {
            let engine = engine.clone();
            Box::pin(async move {
                let outcome = engine.run_check().await;
                if !outcome.success {
                    warn!(
                        "Scheduled watcher check finished with {} errors",
                        outcome.errors.len()
                    );
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create watcher job: {}", e))?;

        let job_id = self.scheduler.add(job).await?;
        if !state.scheduler_started {
            self.scheduler.start().await?;
            state.scheduler_started = true;
        }
        state.job_id = Some(job_id);
        state.interval = interval;

        info!(
            "Watcher scheduler running every {} minutes ({})",
            interval, schedule
        );

        let engine = self.engine.clone();
        tokio::spawn(async move {
            let outcome = engine.run_check().await;
            if !outcome.success {
                error!("Initial watcher check errors: {:?}", outcome.errors);
            }
        });

        Ok(())
    }

    async fn stop_locked(&self, state: &mut SchedulerState) -> Result<()> {
        if let Some(job_id) = state.job_id.take() {
            self.scheduler.remove(&job_id).await?;
            info!("Watcher scheduler stopped");
        }
        Ok(())
    }
}
