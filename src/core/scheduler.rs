//! Scheduler for periodic learning runs.
//!
//! Intervals that map exactly onto a cron step follow the wall clock; any
//! other interval runs on a fixed tokio period.

use crate::learning::{LearningDispatcher, LearningTrigger};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Six-field cron expression (second minute hour day month weekday) that
/// fires exactly every `interval_seconds`.
///
/// Cron steps restart at each field boundary, so only intervals that divide
/// their field evenly are expressible. Anything else yields `None`.
pub fn interval_to_cron(interval_seconds: u64) -> Option<String> {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 3600;
    const DAY: u64 = 86_400;

    match interval_seconds {
        0 => None,
        s if s < MINUTE => (MINUTE % s == 0).then(|| format!("*/{} * * * * *", s)),
        s if s < HOUR => {
            let minutes = s / MINUTE;
            (s % MINUTE == 0 && MINUTE % minutes == 0)
                .then(|| format!("0 */{} * * * *", minutes))
        }
        s if s < DAY => {
            let hours = s / HOUR;
            (s % HOUR == 0 && 24 % hours == 0).then(|| format!("0 0 */{} * * *", hours))
        }
        DAY => Some("0 0 0 * * *".to_string()),
        _ => None,
    }
}

/// How the scheduler decides when the next run is due
#[derive(Debug, Clone)]
pub enum Cadence {
    /// Wall-clock aligned cron schedule
    Cron(Schedule),
    /// Fixed period measured from scheduler start
    Every(Duration),
}

impl Cadence {
    pub fn for_interval(interval_seconds: u64) -> Result<Self, cron::error::Error> {
        match interval_to_cron(interval_seconds) {
            Some(expr) => Ok(Self::Cron(Schedule::from_str(&expr)?)),
            None => Ok(Self::Every(Duration::from_secs(interval_seconds))),
        }
    }
}

/// Scheduler that periodically dispatches a `Scheduled` learning run
pub struct JobScheduler {
    dispatcher: Arc<dyn LearningDispatcher>,
    cadence: Cadence,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl JobScheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `dispatcher` - where scheduled runs are queued
    /// * `interval_seconds` - Learning interval in seconds (0 = disabled)
    pub fn new(
        dispatcher: Arc<dyn LearningDispatcher>,
        interval_seconds: u64,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if interval_seconds == 0 {
            return Err("Scheduler disabled: interval_seconds is 0".into());
        }

        let cadence = Cadence::for_interval(interval_seconds).map_err(|e| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid schedule for {}s: {}", interval_seconds, e),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;

        match &cadence {
            Cadence::Cron(schedule) => info!(
                interval = interval_seconds,
                cron = %schedule,
                "JobScheduler: created with interval {}s (cron)",
                interval_seconds
            ),
            Cadence::Every(_) => info!(
                interval = interval_seconds,
                "JobScheduler: created with interval {}s (fixed period)",
                interval_seconds
            ),
        }

        Ok(Self {
            dispatcher,
            cadence,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let dispatcher = self.dispatcher.clone();
        let cadence = self.cadence.clone();

        let handle = tokio::spawn(async move {
            match cadence {
                Cadence::Cron(schedule) => {
                    info!("JobScheduler: started, waiting for cron schedule...");
                    loop {
                        let next_tick = schedule.upcoming(chrono::Utc).next();
                        match next_tick {
                            Some(next_tick) => {
                                let now = chrono::Utc::now();
                                if next_tick > now {
                                    let duration = (next_tick - now).to_std().unwrap_or_default();
                                    tokio::time::sleep(duration).await;
                                }
                            }
                            None => {
                                tokio::time::sleep(Duration::from_secs(60)).await;
                                continue;
                            }
                        }
                        dispatch_scheduled(dispatcher.as_ref()).await;
                    }
                }
                Cadence::Every(period) => {
                    info!(period_secs = period.as_secs(), "JobScheduler: started with fixed period");
                    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        dispatch_scheduled(dispatcher.as_ref()).await;
                    }
                }
            }
        });

        {
            let mut h = self.handle.write().await;
            *h = Some(handle);
        }

        info!("JobScheduler: started successfully");
        Ok(())
    }

    /// Stop the scheduler
    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("JobScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}

async fn dispatch_scheduled(dispatcher: &dyn LearningDispatcher) {
    match dispatcher.dispatch(LearningTrigger::Scheduled).await {
        Ok(run_id) => {
            debug!(run_id = %run_id, "JobScheduler: dispatched scheduled learning run");
        }
        Err(e) => {
            error!(error = %e, "JobScheduler: failed to dispatch scheduled learning run");
        }
    }
}
