use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use vitalwatch_core::medication::ScheduleTime;

use super::delayed_interval;
use crate::handle::MonitorHandle;

/// Source of the wall-clock time of day the compliance scan compares against.
pub trait WallClock: Send + Sync {
    fn time_of_day(&self) -> ScheduleTime;
}

/// The host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl WallClock for LocalClock {
    fn time_of_day(&self) -> ScheduleTime {
        ScheduleTime::of(Local::now().time())
    }
}

/// Evaluate the medication schedule once per `period` until cancelled.
///
/// The time of day is read at each tick, never captured up front.
pub async fn run(
    handle: MonitorHandle,
    clock: Arc<dyn WallClock>,
    period: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(period_secs = period.as_secs(), "Compliance ticker started");
    let mut interval = delayed_interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let now = clock.time_of_day();
                match handle.evaluate_compliance(now).await {
                    Ok(0) => tracing::debug!(at = %now, "Compliance scan clean"),
                    Ok(missed) => tracing::info!(at = %now, missed, "Compliance scan raised alerts"),
                    Err(_) => {
                        tracing::debug!("Monitor gone, compliance ticker exiting");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("Compliance ticker stopped");
}
