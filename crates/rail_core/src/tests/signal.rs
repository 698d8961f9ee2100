use super::*;
use crate::signal::resolve_signal;

fn colors(world: &WorldState) -> Vec<(String, SignalColor)> {
    resolve_signals(world, &constants())
        .into_iter()
        .map(|s| (s.station_id.0, s.color))
        .collect()
}

#[test]
fn test_fleet_signals_in_section_order() {
    let world = fleet_state();
    let expected = [
        ("INDB", SignalColor::Green),
        ("MYG", SignalColor::Yellow),
        ("DCY", SignalColor::Yellow),
        ("DWX", SignalColor::Yellow),
        ("NJP", SignalColor::Yellow),
        ("UDS", SignalColor::Yellow),
        ("VKN", SignalColor::Green),
        ("UJN", SignalColor::Yellow),
    ];
    let expected: Vec<(String, SignalColor)> = expected
        .into_iter()
        .map(|(code, color)| (code.to_string(), color))
        .collect();
    assert_eq!(colors(&world), expected);
}

#[test]
fn test_red_when_assigned_platform_held_by_another_train() {
    let mut arriving = train("A", 90.0, 80.0, Direction::Up);
    arriving.platform_assigned = Some(3);
    let world = base_state(vec![arriving]);

    let ujn = world.topology.station(&sid("UJN")).unwrap();
    assert_eq!(resolve_signal(ujn, &world.trains, &constants()), SignalColor::Red);
}

#[test]
fn test_red_takes_precedence_over_proximity() {
    let mut arriving = train("A", 99.0, 40.0, Direction::Up);
    arriving.platform_assigned = Some(3);
    let world = base_state(vec![arriving]);

    let ujn = world.topology.station(&sid("UJN")).unwrap();
    assert_eq!(resolve_signal(ujn, &world.trains, &constants()), SignalColor::Red);
}

#[test]
fn test_free_assigned_platform_is_not_red() {
    let mut arriving = train("A", 90.0, 80.0, Direction::Up);
    arriving.platform_assigned = Some(2);
    let world = base_state(vec![arriving]);

    let ujn = world.topology.station(&sid("UJN")).unwrap();
    assert_eq!(resolve_signal(ujn, &world.trains, &constants()), SignalColor::Yellow);
}

#[test]
fn test_red_only_for_the_arrival_station() {
    // Passing through DWX, terminating at UJN: DWX platform 1 is not its concern.
    let mut passing = train("A", 40.0, 80.0, Direction::Up);
    passing.platform_assigned = Some(1);
    let world = base_state(vec![passing]);

    let dwx = world.topology.station(&sid("DWX")).unwrap();
    assert_eq!(resolve_signal(dwx, &world.trains, &constants()), SignalColor::Yellow);
}

#[test]
fn test_proximity_boundary_is_exclusive() {
    let world = base_state(vec![train("A", 25.0, 80.0, Direction::Up)]);
    let myg = world.topology.station(&sid("MYG")).unwrap();
    // Exactly 10 km from MYG.
    assert_eq!(resolve_signal(myg, &world.trains, &constants()), SignalColor::Green);
}

#[test]
fn test_empty_section_is_all_green() {
    let world = base_state(vec![]);
    assert!(colors(&world)
        .iter()
        .all(|(_, color)| *color == SignalColor::Green));
}
