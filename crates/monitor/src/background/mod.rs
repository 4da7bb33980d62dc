//! Periodic tasks that drive the monitor.
//!
//! Every loop here submits intents through a [`MonitorHandle`] or a weak
//! command sender and never touches [`PatientState`] directly, so each tick
//! acts on the live aggregate held by the actor. All loops exit when their
//! [`CancellationToken`] fires or the actor goes away.
//!
//! [`MonitorHandle`]: crate::MonitorHandle
//! [`PatientState`]: vitalwatch_core::PatientState
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod compliance;
pub mod countdown;
pub mod vitals;

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Interval whose first tick lands one `period` from now.
pub(crate) fn delayed_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
