//! Integration test: live ticks → derived view → what-if projection on the
//! Indore–Ujjain fixture.

use rail_core::test_fixtures::{base_content, base_state, fleet, hm, tid};
use rail_core::*;

/// Moves every running train forward by what it covers in one tick.
fn dead_reckoning(world: &WorldState, constants: &Constants) -> Vec<TelemetryUpdate> {
    let hours = f64::from(constants.tick_interval_secs) / 3600.0;
    world
        .trains
        .iter()
        .map(|train| TelemetryUpdate {
            train_id: train.id.clone(),
            position_km: train.position_km + train.direction.sign() * train.speed_kmh * hours,
            speed_kmh: train.speed_kmh,
            delay_minutes: train.delay_minutes,
        })
        .collect()
}

#[test]
fn conflicts_tighten_as_trains_close_in() {
    let content = base_content();
    let constants = &content.constants;
    let mut world = base_state(fleet());

    let initial = derive(&world, constants);
    let first_catch_up = initial
        .conflicts
        .iter()
        .find(|c| c.kind == ConflictKind::Overtake)
        .unwrap()
        .clone();

    // Five minutes of dead reckoning.
    for _ in 0..60 {
        let updates = dead_reckoning(&world, constants);
        let events = tick(&mut world, &updates, constants);
        assert!(events
            .iter()
            .all(|e| matches!(e.event, Event::TrainUpdated { clamped: false, .. })));
    }
    assert_eq!(world.meta.tick, 60);
    assert_eq!(world.meta.clock, hm(10, 35));

    let later = derive(&world, constants);
    let same_pair = later
        .conflicts
        .iter()
        .find(|c| c.trains == first_catch_up.trains)
        .unwrap();
    assert!(same_pair.time_to_conflict_minutes < first_catch_up.time_to_conflict_minutes);

    // Ranking invariant holds on every derived view.
    for pair in later.conflicts.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.priority.rank() > b.priority.rank()
                || (a.priority == b.priority
                    && a.time_to_conflict_minutes <= b.time_to_conflict_minutes)
        );
    }
}

#[test]
fn projection_leaves_live_world_alone() {
    let content = base_content();
    let world = base_state(fleet());
    let before = derive(&world, &content.constants);

    let scenario = Scenario {
        train_id: tid("19303"),
        station_id: StationId("DWX".to_string()),
        delay_minutes: 30,
        action: ScenarioAction::Halt,
    };
    let result = run_scenario(&world, &scenario, &content.constants, world.meta.seed).unwrap();
    assert_eq!(result.timeline.len(), 5);
    assert!(!result.recommendations.is_empty());

    let after = derive(&world, &content.constants);
    assert_eq!(before, after);
}
