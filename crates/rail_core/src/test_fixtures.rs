//! Shared test fixtures for rail_core and downstream crates.
//!
//! `section_stations()` is the Indore–Ujjain section (8 stations, 100 km).
//! `fleet()` is the five-train snapshot used by the integration tests;
//! `train()` builds a single plain train for targeted cases.

use chrono::NaiveTime;

use crate::{
    Constants, Counters, Direction, MetaState, NetworkContent, Platform, Station, StationId,
    TrackTopology, Train, TrainId, TrainStatus, TrainType, WorldState,
};

pub const FIXTURE_SEED: u64 = 42;

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time of day")
}

pub fn sid(code: &str) -> StationId {
    StationId(code.to_string())
}

pub fn tid(id: &str) -> TrainId {
    TrainId(id.to_string())
}

fn station(code: &str, name: &str, position_km: f64, platforms: Vec<Platform>, loop_lines: u32) -> Station {
    Station {
        id: sid(code),
        code: code.to_string(),
        name: name.to_string(),
        position_km,
        platforms,
        loop_lines,
    }
}

pub fn section_stations() -> Vec<Station> {
    vec![
        station(
            "INDB",
            "Indore Junction",
            0.0,
            vec![
                Platform::occupied(1, tid("12919"), Some(hm(10, 45))),
                Platform::free(2),
                Platform::free(3),
                Platform::maintenance(4),
            ],
            2,
        ),
        station("MYG", "Mangliya Gaon", 15.0, vec![Platform::free(1), Platform::free(2)], 1),
        station("DCY", "Dakachiya", 28.0, vec![Platform::free(1)], 1),
        station(
            "DWX",
            "Dewas Junction",
            45.0,
            vec![
                Platform::occupied(1, tid("19303"), Some(hm(11, 20))),
                Platform::free(2),
                Platform::free(3),
            ],
            2,
        ),
        station("NJP", "Naranjipura", 58.0, vec![Platform::free(1)], 1),
        station("UDS", "Undasa", 72.0, vec![Platform::free(1)], 1),
        station("VKN", "Vikramnagar", 85.0, vec![Platform::free(1)], 1),
        station(
            "UJN",
            "Ujjain Junction",
            100.0,
            vec![
                Platform::free(1),
                Platform::free(2),
                Platform::occupied(3, tid("09351"), Some(hm(12, 15))),
                Platform::free(4),
                Platform::free(5),
            ],
            3,
        ),
    ]
}

pub fn section_topology() -> TrackTopology {
    TrackTopology::new(section_stations()).expect("fixture section is valid")
}

pub fn base_content() -> NetworkContent {
    NetworkContent {
        section_name: "Indore-Ujjain".to_string(),
        content_version: "test".to_string(),
        constants: Constants::default(),
    }
}

/// A world on the fixture section at 10:30 holding `trains`.
pub fn base_state(trains: Vec<Train>) -> WorldState {
    state_on(section_topology(), trains)
}

pub fn state_on(topology: TrackTopology, trains: Vec<Train>) -> WorldState {
    WorldState {
        meta: MetaState {
            tick: 0,
            seed: FIXTURE_SEED,
            clock: hm(10, 30),
            content_version: "test".to_string(),
        },
        topology,
        trains,
        counters: Counters::default(),
    }
}

/// Plain express train running end to end in `direction` on the fixture
/// section. Next station is the first station strictly ahead.
pub fn train(id: &str, position_km: f64, speed_kmh: f64, direction: Direction) -> Train {
    let mut route: Vec<StationId> = section_stations().into_iter().map(|s| s.id).collect();
    if direction == Direction::Down {
        route.reverse();
    }
    let next_station = section_stations()
        .into_iter()
        .filter(|s| direction.is_ahead(position_km, s.position_km))
        .min_by(|a, b| {
            (a.position_km - position_km)
                .abs()
                .total_cmp(&(b.position_km - position_km).abs())
        })
        .map_or_else(|| route[route.len() - 1].clone(), |s| s.id);
    Train {
        id: tid(id),
        name: format!("Train {id}"),
        train_type: TrainType::Express,
        status: TrainStatus::Running,
        position_km,
        speed_kmh,
        delay_minutes: 0,
        priority: 5,
        direction,
        route,
        next_station,
        platform_assigned: None,
    }
}

/// Five trains at 10:30 on the Indore–Ujjain section.
pub fn fleet() -> Vec<Train> {
    let mut malwa = train("12919", 25.0, 95.0, Direction::Up);
    malwa.name = "Malwa SF Express".to_string();
    malwa.train_type = TrainType::Superfast;
    malwa.delay_minutes = 5;
    malwa.priority = 9;

    let mut bhopal = train("19303", 42.0, 78.0, Direction::Up);
    bhopal.name = "Indore-Bhopal Express".to_string();
    bhopal.delay_minutes = 12;
    bhopal.priority = 7;
    bhopal.route = vec![sid("INDB"), sid("MYG"), sid("DCY"), sid("DWX")];
    bhopal.platform_assigned = Some(1);

    let mut shipra = train("22911", 18.0, 110.0, Direction::Up);
    shipra.name = "Shipra Express".to_string();
    shipra.train_type = TrainType::Superfast;
    shipra.status = TrainStatus::Approaching;
    shipra.delay_minutes = -3;
    shipra.priority = 9;
    shipra.platform_assigned = Some(3);

    let mut passenger = train("09351", 100.0, 0.0, Direction::Down);
    passenger.name = "Ujjain-Indore Passenger Special".to_string();
    passenger.train_type = TrainType::Passenger;
    passenger.status = TrainStatus::Halted;
    passenger.delay_minutes = 8;
    passenger.priority = 4;
    passenger.next_station = sid("VKN");
    passenger.platform_assigned = Some(3);

    let mut goods = train("GOODS001", 65.0, 55.0, Direction::Up);
    goods.name = "Freight Service".to_string();
    goods.train_type = TrainType::Goods;
    goods.delay_minutes = 25;
    goods.priority = 2;

    vec![malwa, bhopal, shipra, passenger, goods]
}
