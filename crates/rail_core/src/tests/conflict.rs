use super::*;

// --- Overtake -------------------------------------------------------------

#[test]
fn test_overtake_detected_for_faster_trailing_train() {
    let world = overtake_pair();
    let conflicts = detect_conflicts(&world, &constants());

    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::Overtake);
    assert!(approx(conflict.time_to_conflict_minutes, 45.0));
    assert_eq!(conflict.priority, ConflictPriority::Medium);
    assert_eq!(conflict.status, ConflictStatus::Pending);
    assert_eq!(conflict.trains.as_slice(), &[tid("A"), tid("B")]);
    // A catches B at km 100.5.
    assert_eq!(conflict.location, "Between Y and Z");
}

#[test]
fn test_overtake_holds_slower_train_at_nearest_loop() {
    let world = overtake_pair();
    let conflict = &detect_conflicts(&world, &constants())[0];

    // A reaches Y in 42/110 h, B in 18/78 h; difference plus 3 min headway.
    assert_eq!(conflict.impact, ConflictImpact::new(0, 13));
    assert_eq!(conflict.impact.network_delay, 13);
    assert_eq!(
        conflict.recommendation,
        "Halt Train B at Y loop line for 13 minutes"
    );
    assert_eq!(conflict.description, "Train A will overtake Train B");
}

#[test]
fn test_no_overtake_when_trailing_train_is_slower() {
    let world = base_state(vec![
        train("A", 18.0, 70.0, Direction::Up),
        train("B", 42.0, 78.0, Direction::Up),
    ]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_no_overtake_beyond_horizon() {
    let world = base_state(vec![
        train("A", 0.0, 80.0, Direction::Up),
        train("B", 90.0, 79.0, Direction::Up),
    ]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_no_overtake_past_leading_train_arrival() {
    let mut world = overtake_pair();
    // B terminates at Y (km 60), well before the catch-up at km 100.5.
    world.train_mut(&tid("B")).unwrap().route = vec![sid("X"), sid("Y")];
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_no_overtake_past_trailing_train_arrival() {
    let mut world = overtake_pair();
    world.train_mut(&tid("A")).unwrap().route = vec![sid("X"), sid("Y")];
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_no_overtake_past_section_end() {
    // Same pair on the 100 km fixture section: the catch-up point lies
    // beyond UJN.
    let world = base_state(vec![
        train("A", 18.0, 110.0, Direction::Up),
        train("B", 42.0, 78.0, Direction::Up),
    ]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_overtake_at_arrival_within_tolerance() {
    let mut world = overtake_pair();
    // Catch-up at km 100.5; Z moved to km 100.2 is within the 0.5 km margin.
    world.topology = TrackTopology::new(vec![
        line_station("X", 0.0, 0),
        line_station("Y", 60.0, 1),
        line_station("Z", 100.2, 0),
    ])
    .unwrap();
    assert_eq!(detect_conflicts(&world, &constants()).len(), 1);
}

#[test]
fn test_level_trains_are_not_an_overtake() {
    let world = base_state(vec![
        train("A", 20.0, 110.0, Direction::Up),
        train("B", 20.0, 78.0, Direction::Up),
    ]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_halted_train_in_loop_is_off_the_line() {
    let mut held = train("B", 45.0, 0.0, Direction::Up);
    held.status = TrainStatus::Halted;
    let world = base_state(vec![train("A", 18.0, 110.0, Direction::Up), held]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_halted_train_between_stations_still_blocks() {
    let mut held = train("B", 40.0, 0.0, Direction::Up);
    held.status = TrainStatus::Halted;
    let world = base_state(vec![train("A", 18.0, 110.0, Direction::Up), held]);

    let conflicts = detect_conflicts(&world, &constants());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::Overtake);
    assert!(approx(conflicts[0].time_to_conflict_minutes, 12.0));
    assert_eq!(conflicts[0].priority, ConflictPriority::High);
}

// --- Crossing -------------------------------------------------------------

#[test]
fn test_crossing_on_plain_line() {
    let world = base_state(vec![
        train("A", 30.0, 60.0, Direction::Up),
        train("B", 50.0, 60.0, Direction::Down),
    ]);
    let conflicts = detect_conflicts(&world, &constants());

    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.kind, ConflictKind::Crossing);
    assert!(approx(conflict.time_to_conflict_minutes, 10.0));
    assert_eq!(conflict.priority, ConflictPriority::High);
    assert_eq!(conflict.location, "Between DCY and DWX");
    // Equal priority and type: detection order decides.
    assert_eq!(conflict.trains.as_slice(), &[tid("A"), tid("B")]);
    assert_eq!(conflict.impact, ConflictImpact::new(0, 13));
    assert_eq!(
        conflict.recommendation,
        "Priority to Train A; Train B to take DWX loop line for 13 minutes"
    );
}

#[test]
fn test_crossing_precedence_follows_dispatch_priority() {
    let mut down = train("B", 50.0, 60.0, Direction::Down);
    down.priority = 8;
    let world = base_state(vec![train("A", 30.0, 60.0, Direction::Up), down]);

    let conflict = &detect_conflicts(&world, &constants())[0];
    assert_eq!(conflict.trains.as_slice(), &[tid("B"), tid("A")]);
    assert_eq!(conflict.delay_for(&tid("A")), conflict.impact.delay_train2);
    assert_eq!(conflict.delay_for(&tid("B")), 0);
}

#[test]
fn test_meeting_at_loop_station_is_not_a_conflict() {
    let world = base_state(vec![
        train("A", 35.0, 60.0, Direction::Up),
        train("B", 55.0, 60.0, Direction::Down),
    ]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_no_crossing_past_arrival_station() {
    // B terminates at DWX (km 45); the trains would only meet at km 40.
    let mut down = train("B", 50.0, 60.0, Direction::Down);
    down.route = vec![sid("UJN"), sid("VKN"), sid("UDS"), sid("NJP"), sid("DWX")];
    down.next_station = sid("DWX");
    let world = base_state(vec![train("A", 30.0, 60.0, Direction::Up), down]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_trains_moving_apart_do_not_cross() {
    let world = base_state(vec![
        train("A", 60.0, 60.0, Direction::Up),
        train("B", 40.0, 60.0, Direction::Down),
    ]);
    assert!(detect_conflicts(&world, &constants()).is_empty());
}

#[test]
fn test_crossing_without_loop_escalates_to_high() {
    let topology = TrackTopology::new(vec![
        line_station("X", 0.0, 0),
        line_station("Y", 50.0, 0),
        line_station("Z", 100.0, 0),
    ])
    .unwrap();
    let mut up = train("A", 10.0, 20.0, Direction::Up);
    up.route = vec![sid("X"), sid("Y"), sid("Z")];
    up.next_station = sid("Y");
    let mut down = train("B", 40.0, 20.0, Direction::Down);
    down.route = vec![sid("Z"), sid("Y"), sid("X")];
    down.next_station = sid("X");
    let world = state_on(topology, vec![up, down]);

    let conflicts = detect_conflicts(&world, &constants());
    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert!(approx(conflict.time_to_conflict_minutes, 45.0));
    assert_eq!(conflict.priority, ConflictPriority::High);
    assert_eq!(conflict.impact, ConflictImpact::new(0, 93));
    assert!(conflict.recommendation.starts_with("No loop line"));
}

// --- Platform -------------------------------------------------------------

#[test]
fn test_platform_clash_with_earlier_occupant() {
    let world = fleet_state();
    let conflicts = detect_conflicts(&world, &constants());
    let platform: Vec<&Conflict> = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::Platform)
        .collect();

    assert_eq!(platform.len(), 1);
    let conflict = platform[0];
    assert_eq!(conflict.trains.as_slice(), &[tid("22911")]);
    assert_eq!(conflict.location, "UJN Platform 3");
    assert_eq!(conflict.recommendation, "Re-assign Shipra Express to Platform 1");
    assert_eq!(conflict.impact, ConflictImpact::default());
    assert!(approx(conflict.time_to_conflict_minutes, 82.0 / 110.0 * 60.0));
    assert_eq!(conflict.priority, ConflictPriority::Medium);
}

#[test]
fn test_own_platform_is_not_a_clash() {
    // 19303 is booked on DWX platform 1, which it already holds.
    let world = fleet_state();
    let conflicts = detect_conflicts(&world, &constants());
    assert!(!conflicts
        .iter()
        .any(|c| c.kind == ConflictKind::Platform && c.trains.contains(&tid("19303"))));
}

#[test]
fn test_platform_cleared_before_arrival() {
    let mut world = fleet_state();
    world.meta.clock = hm(12, 0);
    let conflicts = detect_conflicts(&world, &constants());
    assert!(!conflicts.iter().any(|c| c.kind == ConflictKind::Platform));
}

#[test]
fn test_missing_clear_time_counts_as_not_clear() {
    let mut world = fleet_state();
    world.meta.clock = hm(12, 0);
    world
        .topology
        .platform_mut(&sid("UJN"), 3)
        .unwrap()
        .occupy(tid("09351"), None);

    let conflicts = detect_conflicts(&world, &constants());
    assert_eq!(
        conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::Platform)
            .count(),
        1
    );
}

#[test]
fn test_platform_clash_with_no_free_platform_escalates() {
    let mut world = fleet_state();
    for platform in [1, 2, 4, 5] {
        world
            .topology
            .platform_mut(&sid("UJN"), platform)
            .unwrap()
            .occupy(tid("OTHER"), Some(hm(13, 0)));
    }

    let conflicts = detect_conflicts(&world, &constants());
    let conflict = conflicts
        .iter()
        .find(|c| c.kind == ConflictKind::Platform)
        .unwrap();
    assert_eq!(conflict.priority, ConflictPriority::High);
    // Clears in 105 min, arrival in ~44.7 min.
    assert_eq!(conflict.impact, ConflictImpact::new(61, 0));
    assert!(conflict.recommendation.starts_with("No free platform at UJN"));
}

#[test]
fn test_stationary_train_has_no_platform_clash() {
    let mut world = fleet_state();
    world.train_mut(&tid("22911")).unwrap().speed_kmh = 0.0;
    let conflicts = detect_conflicts(&world, &constants());
    assert!(!conflicts.iter().any(|c| c.kind == ConflictKind::Platform));
}

// --- Whole pass -----------------------------------------------------------

#[test]
fn test_fleet_detection_order_and_ids() {
    let world = fleet_state();
    let conflicts = detect_conflicts(&world, &constants());

    assert_eq!(ids(&conflicts), ["conf_001", "conf_002"]);
    let kinds: Vec<ConflictKind> = conflicts.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, [ConflictKind::Overtake, ConflictKind::Platform]);
}

#[test]
fn test_fleet_has_one_real_catch_up() {
    // Shipra closes on Malwa and meets it near km 69.3. Every other
    // same-direction pair would meet past an arrival station.
    let world = fleet_state();
    let conflicts = detect_conflicts(&world, &constants());
    let overtake = &conflicts[0];

    assert_eq!(overtake.trains.as_slice(), &[tid("22911"), tid("12919")]);
    assert!(approx(overtake.time_to_conflict_minutes, 28.0));
    assert_eq!(overtake.priority, ConflictPriority::Medium);
    assert_eq!(overtake.location, "Between NJP and UDS");
    assert_eq!(overtake.impact, ConflictImpact::new(0, 7));
    assert_eq!(
        overtake.recommendation,
        "Halt Malwa SF Express at DCY loop line for 7 minutes"
    );
}

#[test]
fn test_detection_is_deterministic() {
    let world = fleet_state();
    assert_eq!(
        detect_conflicts(&world, &constants()),
        detect_conflicts(&world, &constants())
    );
}

#[test]
fn test_malformed_train_is_skipped() {
    let mut world = overtake_pair();
    world.trains.push(train("X", 150.0, 200.0, Direction::Up));
    let mut reversed = train("Y", 10.0, 200.0, Direction::Up);
    reversed.route.reverse();
    world.trains.push(reversed);

    let conflicts = detect_conflicts(&world, &constants());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].trains.as_slice(), &[tid("A"), tid("B")]);
}

#[test]
fn test_validate_train_reports_reason() {
    let world = overtake_pair();
    let mut bad = train("X", 20.0, -5.0, Direction::Up);
    assert!(matches!(
        validate::validate_train(&bad, &world.topology),
        Err(MalformedTrainError::InvalidSpeed { .. })
    ));
    bad.speed_kmh = 50.0;
    bad.route.clear();
    assert_eq!(
        validate::validate_train(&bad, &world.topology),
        Err(MalformedTrainError::MissingRoute(tid("X")))
    );
}

#[test]
fn test_classify_thresholds() {
    let c = constants();
    assert_eq!(classify(0.0, &c), ConflictPriority::High);
    assert_eq!(classify(19.9, &c), ConflictPriority::High);
    assert_eq!(classify(20.0, &c), ConflictPriority::Medium);
    assert_eq!(classify(59.9, &c), ConflictPriority::Medium);
    assert_eq!(classify(60.0, &c), ConflictPriority::Low);
}
