//! Integration test: shipped content driven by the seeded feed through the
//! core tick, the same way the daemon loop does.

use rail_control::{SeededTelemetry, TelemetrySource};
use rail_core::{derive, tick, Event, WorldState};
use rail_world::{build_initial_state, load_content};

fn content_dir() -> String {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    format!("{manifest}/../../content")
}

fn run(seed: u64, ticks: u64) -> WorldState {
    let content = load_content(&content_dir()).unwrap();
    let constants = &content.network.constants;
    let mut world = build_initial_state(&content, seed);
    let mut feed = SeededTelemetry::new(seed);
    for _ in 0..ticks {
        let updates = feed.poll(&world, constants);
        let events = tick(&mut world, &updates, constants);
        assert!(events
            .iter()
            .all(|e| !matches!(e.event, Event::UpdateRejected { .. })));
    }
    world
}

#[test]
fn trains_stay_on_the_section() {
    let world = run(42, 720);
    assert_eq!(world.meta.tick, 720);
    for train in &world.trains {
        assert!(world.topology.contains_position(train.position_km));
        assert!(train.speed_kmh >= 0.0);
    }
}

#[test]
fn same_seed_same_trajectory() {
    let a = run(5, 100);
    let b = run(5, 100);
    assert_eq!(a, b);
}

#[test]
fn views_stay_ranked_while_running() {
    let content = load_content(&content_dir()).unwrap();
    let constants = &content.network.constants;
    let mut world = build_initial_state(&content, 1);
    let mut feed = SeededTelemetry::new(1);
    for _ in 0..200 {
        let updates = feed.poll(&world, constants);
        tick(&mut world, &updates, constants);
        let view = derive(&world, constants);
        for pair in view.conflicts.windows(2) {
            assert!(pair[0].priority.rank() >= pair[1].priority.rank());
        }
        assert_eq!(view.signals.len(), 8);
    }
}
