use crate::{Constants, Event, EventEnvelope, TelemetryUpdate, WorldState};

/// Advance the live world by one tick.
///
/// Order of operations:
/// 1. Apply telemetry updates in the order given.
/// 2. Advance the clock by `tick_interval_secs`.
/// 3. Increment the tick counter.
///
/// Only position, speed and delay are written. Each position step is bounded
/// by `max_position_step_km` and kept inside the section; speed never goes
/// negative. Returns the events produced this tick.
pub fn tick(
    world: &mut WorldState,
    updates: &[TelemetryUpdate],
    constants: &Constants,
) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    let current_tick = world.meta.tick;

    for update in updates {
        let event = apply_update(world, update, constants);
        events.push(crate::emit(&mut world.counters, current_tick, event));
    }

    world.meta.clock += chrono::Duration::seconds(i64::from(constants.tick_interval_secs));
    world.meta.tick += 1;
    events
}

fn apply_update(world: &mut WorldState, update: &TelemetryUpdate, constants: &Constants) -> Event {
    if !update.position_km.is_finite() || !update.speed_kmh.is_finite() {
        return Event::UpdateRejected {
            train_id: update.train_id.clone(),
            reason: "non-finite reading".to_string(),
        };
    }
    let start_km = world.topology.start_km();
    let end_km = world.topology.section_length();
    let Some(train) = world.train_mut(&update.train_id) else {
        return Event::UpdateRejected {
            train_id: update.train_id.clone(),
            reason: "unknown train".to_string(),
        };
    };

    let max_step = constants.max_position_step_km;
    let step = (update.position_km - train.position_km).clamp(-max_step, max_step);
    let position_km = (train.position_km + step).clamp(start_km, end_km);
    let clamped = (position_km - update.position_km).abs() > 1e-9;

    train.position_km = position_km;
    train.speed_kmh = update.speed_kmh.max(0.0);
    train.delay_minutes = update.delay_minutes;

    Event::TrainUpdated {
        train_id: train.id.clone(),
        position_km,
        speed_kmh: train.speed_kmh,
        delay_minutes: train.delay_minutes,
        clamped,
    }
}
