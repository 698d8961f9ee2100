use thiserror::Error;

use crate::{StationId, TrainId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("topology has no stations")]
    Empty,
    #[error("station '{0}' appears more than once")]
    DuplicateStation(StationId),
    #[error("station '{station}' at {position_km} km is not after the preceding station")]
    NonIncreasing { station: StationId, position_km: f64 },
    #[error("station '{station}' has invalid position {position_km} km")]
    InvalidPosition { station: StationId, position_km: f64 },
    #[error("unknown station '{0}'")]
    UnknownStation(StationId),
    #[error("position {position_km} km is outside the section [{start_km}, {end_km}]")]
    OutOfBounds {
        position_km: f64,
        start_km: f64,
        end_km: f64,
    },
}

/// A train that cannot take part in detection. The detector logs and skips it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedTrainError {
    #[error("train '{0}' has no route")]
    MissingRoute(TrainId),
    #[error("train '{train}' position {position_km} km is outside the section")]
    PositionOutOfBounds { train: TrainId, position_km: f64 },
    #[error("train '{train}' has invalid speed {speed_kmh} km/h")]
    InvalidSpeed { train: TrainId, speed_kmh: f64 },
    #[error("train '{train}' references unknown station '{station}'")]
    UnknownStation { train: TrainId, station: StationId },
    #[error("train '{0}' route runs against its direction")]
    RouteAgainstDirection(TrainId),
}

/// Rejected before any simulation work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("unknown train '{0}'")]
    UnknownTrain(TrainId),
    #[error("unknown station '{0}'")]
    UnknownStation(StationId),
    #[error("delay of {0} minutes is outside 1..=120")]
    DelayOutOfRange(u32),
    #[error("unknown scenario action '{0}'")]
    UnknownAction(String),
}
