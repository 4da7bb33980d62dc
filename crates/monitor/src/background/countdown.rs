use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::delayed_interval;
use crate::actor::Command;

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// One countdown second per tick for SOS session `generation`.
///
/// The actor decides what a tick means; it cancels `cancel` when the session
/// resolves, is superseded, or the count reaches zero.
pub(crate) async fn run(
    commands: mpsc::WeakSender<Command>,
    generation: u64,
    cancel: CancellationToken,
) {
    tracing::debug!(generation, "Countdown started");
    let mut interval = delayed_interval(COUNTDOWN_STEP);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(tx) = commands.upgrade() else { break };
                if tx.send(Command::CountdownTick { generation }).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(generation, "Countdown stopped");
}
