//! Drives a [`DeliveryTracker`] in real (or paused tokio) time.

use crate::core::delivery::{DeliveryStage, DeliveryTracker};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::debug;

/// Period of the countdown callback.
pub const TICK: Duration = Duration::from_secs(1);

/// Runs the active order to completion.
///
/// Sleeps until the next stage deadline while calling `on_tick` once per [`TICK`]; the
/// callback gets the tracker so it can render a countdown or cancel the order. Returns
/// the final stage once no deadline is pending, or `None` if the order went away.
/// Dropping the future cancels the pending timers.
pub async fn track<F>(tracker: &mut DeliveryTracker, mut on_tick: F) -> Option<DeliveryStage>
where
    F: FnMut(&mut DeliveryTracker),
{
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while let Some(remaining) = tracker.remaining() {
        tokio::select! {
            () = sleep(remaining) => {
                if let Some(stage) = tracker.advance_stage_if_due() {
                    debug!("Tracker reached {}", stage.as_str());
                }
            }
            _ = ticker.tick() => on_tick(tracker),
        }
    }

    tracker.active_order().map(|order| order.current_stage)
}
