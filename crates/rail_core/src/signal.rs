use serde::{Deserialize, Serialize};

use crate::{Constants, SignalColor, Station, StationId, Train, WorldState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSignal {
    pub station_id: StationId,
    pub color: SignalColor,
}

/// Derives the aspect shown at `station`.
///
/// Precedence is fixed: red when a train bound for this station will find
/// its assigned platform held by another train, yellow when any train is
/// within `signal_proximity_km`, green otherwise.
pub fn resolve_signal(station: &Station, trains: &[Train], constants: &Constants) -> SignalColor {
    let platform_blocked = trains.iter().any(|train| {
        train.next_station == station.id
            && train.arrival_station() == Some(&station.id)
            && train
                .platform_assigned
                .and_then(|id| station.platform(id))
                .is_some_and(|platform| platform.is_held_by_other(&train.id))
    });
    if platform_blocked {
        return SignalColor::Red;
    }

    let nearby = trains
        .iter()
        .any(|train| (train.position_km - station.position_km).abs() < constants.signal_proximity_km);
    if nearby {
        SignalColor::Yellow
    } else {
        SignalColor::Green
    }
}

/// Signals for every station, in section order.
pub fn resolve_signals(world: &WorldState, constants: &Constants) -> Vec<StationSignal> {
    world
        .topology
        .stations()
        .iter()
        .map(|station| StationSignal {
            station_id: station.id.clone(),
            color: resolve_signal(station, &world.trains, constants),
        })
        .collect()
}
