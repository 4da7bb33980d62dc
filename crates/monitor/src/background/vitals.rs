use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::delayed_interval;
use crate::handle::MonitorHandle;

/// Submit one "record vitals" intent per `period` until cancelled.
pub async fn run(handle: MonitorHandle, period: Duration, cancel: CancellationToken) {
    tracing::info!(period_ms = period.as_millis() as u64, "Vitals ticker started");
    let mut interval = delayed_interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if handle.record_vitals().await.is_err() {
                    tracing::debug!("Monitor gone, vitals ticker exiting");
                    break;
                }
            }
        }
    }

    tracing::info!("Vitals ticker stopped");
}
