use crate::error::MalformedTrainError;
use crate::topology::TrackTopology;
use crate::{Train, WorldState};

/// Checks that a train can be placed on the section and follows a usable route.
pub fn validate_train(train: &Train, topology: &TrackTopology) -> Result<(), MalformedTrainError> {
    if train.route.is_empty() {
        return Err(MalformedTrainError::MissingRoute(train.id.clone()));
    }
    if !topology.contains_position(train.position_km) {
        return Err(MalformedTrainError::PositionOutOfBounds {
            train: train.id.clone(),
            position_km: train.position_km,
        });
    }
    if !train.speed_kmh.is_finite() || train.speed_kmh < 0.0 {
        return Err(MalformedTrainError::InvalidSpeed {
            train: train.id.clone(),
            speed_kmh: train.speed_kmh,
        });
    }

    let mut previous: Option<f64> = None;
    for station_id in &train.route {
        let position = topology.position_of(station_id).map_err(|_| {
            MalformedTrainError::UnknownStation {
                train: train.id.clone(),
                station: station_id.clone(),
            }
        })?;
        if previous.is_some_and(|prev| !train.direction.is_ahead(prev, position)) {
            return Err(MalformedTrainError::RouteAgainstDirection(train.id.clone()));
        }
        previous = Some(position);
    }
    if !topology.contains(&train.next_station) {
        return Err(MalformedTrainError::UnknownStation {
            train: train.id.clone(),
            station: train.next_station.clone(),
        });
    }
    Ok(())
}

/// Trains that pass [`validate_train`], in ingestion order. The rest are
/// logged and left out.
pub fn well_formed_trains(world: &WorldState) -> Vec<&Train> {
    world
        .trains
        .iter()
        .filter(|train| match validate_train(train, &world.topology) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(tick = world.meta.tick, "skipping train: {err}");
                false
            }
        })
        .collect()
}
