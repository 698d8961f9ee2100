use crate::state::{LiveState, SharedWorld, ViewTx};
use rail_core::Event;
use std::time::Duration;

/// Drives the live world: poll telemetry, tick, derive, publish.
///
/// `ticks_per_sec <= 0` runs flat out, yielding between ticks.
pub async fn run_tick_loop(sim: SharedWorld, view_tx: ViewTx, ticks_per_sec: f64, max_ticks: Option<u64>) {
    let mut interval = if ticks_per_sec > 0.0 {
        let mut iv = tokio::time::interval(Duration::from_secs_f64(1.0 / ticks_per_sec));
        iv.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Burst);
        Some(iv)
    } else {
        None
    };

    loop {
        let (view, done) = {
            let mut guard = sim.lock();
            let LiveState {
                ref mut world,
                ref constants,
                ref mut feed,
                ref mut latest_view,
            } = *guard;
            let updates = feed.poll(world, constants);
            let events = rail_core::tick(world, &updates, constants);
            for event in &events {
                if let Event::UpdateRejected { train_id, reason } = &event.event {
                    tracing::warn!(tick = event.tick, train = %train_id, "update rejected: {reason}");
                }
            }
            *latest_view = rail_core::derive(world, constants);

            let done = max_ticks.is_some_and(|max| world.meta.tick >= max);
            (latest_view.clone(), done)
        };

        // No subscribers is fine; the latest view stays readable on the state.
        let _ = view_tx.send(view);

        if done {
            break;
        }

        if let Some(ref mut iv) = interval {
            iv.tick().await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}
