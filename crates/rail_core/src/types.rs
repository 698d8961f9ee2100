//! Type definitions for `rail_core`.
//!
//! Stations, platforms, trains, conflicts and the world snapshot that ties
//! them together.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::topology::TrackTopology;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(StationId);
string_id!(TrainId);
string_id!(ConflictId);
string_id!(EventId);

/// Platform numbers are only unique within their station.
pub type PlatformId = u32;

/// Involved trains of a conflict: one for platform conflicts, two otherwise.
pub type InvolvedTrains = SmallVec<[TrainId; 2]>;

// ---------------------------------------------------------------------------
// Train enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainType {
    Superfast,
    Express,
    Passenger,
    Goods,
}

impl TrainType {
    /// Tie-break weight when two trains carry the same dispatch priority.
    pub fn rank(self) -> u8 {
        match self {
            TrainType::Superfast => 4,
            TrainType::Express => 3,
            TrainType::Passenger => 2,
            TrainType::Goods => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainStatus {
    Running,
    Halted,
    Approaching,
}

/// `Up` runs towards increasing kilometre markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }

    /// True when `to` lies strictly ahead of `from` for a train moving this way.
    pub fn is_ahead(self, from: f64, to: f64) -> bool {
        (to - from) * self.sign() > 0.0
    }
}

// ---------------------------------------------------------------------------
// Stations and platforms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformStatus {
    Free,
    Occupied,
    Maintenance,
}

/// Occupancy of a platform. The occupant only exists in the `Occupied` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupancy {
    Free,
    Occupied {
        train: TrainId,
        estimated_clear: Option<NaiveTime>,
    },
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PlatformRecord", into = "PlatformRecord")]
pub struct Platform {
    pub id: PlatformId,
    pub occupancy: Occupancy,
}

impl Platform {
    pub fn free(id: PlatformId) -> Self {
        Self {
            id,
            occupancy: Occupancy::Free,
        }
    }

    pub fn occupied(id: PlatformId, train: TrainId, estimated_clear: Option<NaiveTime>) -> Self {
        Self {
            id,
            occupancy: Occupancy::Occupied {
                train,
                estimated_clear,
            },
        }
    }

    pub fn maintenance(id: PlatformId) -> Self {
        Self {
            id,
            occupancy: Occupancy::Maintenance,
        }
    }

    pub fn status(&self) -> PlatformStatus {
        match self.occupancy {
            Occupancy::Free => PlatformStatus::Free,
            Occupancy::Occupied { .. } => PlatformStatus::Occupied,
            Occupancy::Maintenance => PlatformStatus::Maintenance,
        }
    }

    pub fn occupant(&self) -> Option<&TrainId> {
        match &self.occupancy {
            Occupancy::Occupied { train, .. } => Some(train),
            Occupancy::Free | Occupancy::Maintenance => None,
        }
    }

    pub fn estimated_clear(&self) -> Option<NaiveTime> {
        match &self.occupancy {
            Occupancy::Occupied {
                estimated_clear, ..
            } => *estimated_clear,
            Occupancy::Free | Occupancy::Maintenance => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self.occupancy, Occupancy::Free)
    }

    /// Occupied by some train other than `train`.
    pub fn is_held_by_other(&self, train: &TrainId) -> bool {
        self.occupant().is_some_and(|occupant| occupant != train)
    }

    pub fn occupy(&mut self, train: TrainId, estimated_clear: Option<NaiveTime>) {
        self.occupancy = Occupancy::Occupied {
            train,
            estimated_clear,
        };
    }
}

/// Flat wire shape of a platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub id: PlatformId,
    pub status: PlatformStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train: Option<TrainId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_clear_time: Option<NaiveTime>,
}

impl TryFrom<PlatformRecord> for Platform {
    type Error = String;

    fn try_from(record: PlatformRecord) -> Result<Self, Self::Error> {
        match (record.status, record.train) {
            (PlatformStatus::Occupied, Some(train)) => Ok(Platform::occupied(
                record.id,
                train,
                record.estimated_clear_time,
            )),
            (PlatformStatus::Occupied, None) => Err(format!(
                "platform {} is occupied but names no occupant",
                record.id
            )),
            (status, Some(train)) => Err(format!(
                "platform {} is {status:?} but names occupant '{train}'",
                record.id
            )),
            (PlatformStatus::Free, None) => Ok(Platform::free(record.id)),
            (PlatformStatus::Maintenance, None) => Ok(Platform::maintenance(record.id)),
        }
    }
}

impl From<Platform> for PlatformRecord {
    fn from(platform: Platform) -> Self {
        let status = platform.status();
        match platform.occupancy {
            Occupancy::Occupied {
                train,
                estimated_clear,
            } => PlatformRecord {
                id: platform.id,
                status,
                train: Some(train),
                estimated_clear_time: estimated_clear,
            },
            Occupancy::Free | Occupancy::Maintenance => PlatformRecord {
                id: platform.id,
                status,
                train: None,
                estimated_clear_time: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub code: String,
    pub name: String,
    /// Kilometre marker along the section.
    pub position_km: f64,
    pub platforms: Vec<Platform>,
    pub loop_lines: u32,
}

impl Station {
    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn first_free_platform(&self) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.is_free())
    }

    pub fn has_loop(&self) -> bool {
        self.loop_lines > 0
    }
}

// ---------------------------------------------------------------------------
// Trains
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub name: String,
    #[serde(rename = "type")]
    pub train_type: TrainType,
    pub status: TrainStatus,
    pub position_km: f64,
    pub speed_kmh: f64,
    /// Negative means ahead of schedule.
    pub delay_minutes: i32,
    /// 1 (lowest) to 10 (highest).
    pub priority: u8,
    pub direction: Direction,
    pub route: Vec<StationId>,
    pub next_station: StationId,
    #[serde(default)]
    pub platform_assigned: Option<PlatformId>,
}

impl Train {
    /// Last station of the route; the assigned platform belongs to it.
    pub fn arrival_station(&self) -> Option<&StationId> {
        self.route.last()
    }

    pub fn is_halted(&self) -> bool {
        self.status == TrainStatus::Halted || self.speed_kmh <= 0.0
    }
}

// ---------------------------------------------------------------------------
// Conflicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Overtake,
    Crossing,
    Platform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPriority {
    High,
    Medium,
    Low,
}

impl ConflictPriority {
    pub fn rank(self) -> u8 {
        match self {
            ConflictPriority::High => 3,
            ConflictPriority::Medium => 2,
            ConflictPriority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStatus {
    Pending,
    Monitoring,
    Resolved,
}

/// Minutes of delay a conflict resolution adds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictImpact {
    pub delay_train1: u32,
    pub delay_train2: u32,
    pub network_delay: u32,
}

impl ConflictImpact {
    pub fn new(delay_train1: u32, delay_train2: u32) -> Self {
        Self {
            delay_train1,
            delay_train2,
            network_delay: delay_train1 + delay_train2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: ConflictId,
    pub kind: ConflictKind,
    pub priority: ConflictPriority,
    pub time_to_conflict_minutes: f64,
    /// Index 0 is the train given precedence (or the only train affected).
    pub trains: InvolvedTrains,
    pub location: String,
    pub description: String,
    pub recommendation: String,
    pub impact: ConflictImpact,
    pub status: ConflictStatus,
}

impl Conflict {
    /// Delay this conflict assigns to `train`, zero if not involved.
    pub fn delay_for(&self, train: &TrainId) -> u32 {
        match self.trains.iter().position(|t| t == train) {
            Some(0) => self.impact.delay_train1,
            Some(1) => self.impact.delay_train2,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalColor {
    Green,
    Yellow,
    Red,
}

// ---------------------------------------------------------------------------
// Content and world state
// ---------------------------------------------------------------------------

/// Tunable thresholds. Loaded from `constants.json`; missing keys fall back
/// to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    pub signal_proximity_km: f64,
    pub overtake_horizon_minutes: f64,
    pub crossing_horizon_minutes: f64,
    pub high_priority_minutes: f64,
    pub medium_priority_minutes: f64,
    pub clearance_headway_minutes: f64,
    pub station_tolerance_km: f64,
    pub tick_interval_secs: u32,
    pub max_position_step_km: f64,
    pub recovery_threshold_minutes: f64,
    pub slow_speed_factor: f64,
    pub sandbox_latency_ms: u64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            signal_proximity_km: 10.0,
            overtake_horizon_minutes: 120.0,
            crossing_horizon_minutes: 120.0,
            high_priority_minutes: 20.0,
            medium_priority_minutes: 60.0,
            clearance_headway_minutes: 3.0,
            station_tolerance_km: 0.5,
            tick_interval_secs: 5,
            max_position_step_km: 2.0,
            recovery_threshold_minutes: 20.0,
            slow_speed_factor: 0.5,
            sandbox_latency_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkContent {
    pub section_name: String,
    pub content_version: String,
    pub constants: Constants,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaState {
    pub tick: u64,
    pub seed: u64,
    /// Wall-clock time of day of the snapshot.
    pub clock: NaiveTime,
    pub content_version: String,
}

/// Complete mutable snapshot of stations and trains at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub meta: MetaState,
    pub topology: TrackTopology,
    /// Ingestion order; detection walks trains in this order.
    pub trains: Vec<Train>,
    pub counters: Counters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
}

impl WorldState {
    pub fn train(&self, id: &TrainId) -> Option<&Train> {
        self.trains.iter().find(|t| &t.id == id)
    }

    pub fn train_mut(&mut self, id: &TrainId) -> Option<&mut Train> {
        self.trains.iter_mut().find(|t| &t.id == id)
    }
}

// ---------------------------------------------------------------------------
// Telemetry and tick events
// ---------------------------------------------------------------------------

/// Raw per-train reading delivered to the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryUpdate {
    pub train_id: TrainId,
    pub position_km: f64,
    pub speed_kmh: f64,
    pub delay_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    TrainUpdated {
        train_id: TrainId,
        position_km: f64,
        speed_kmh: f64,
        delay_minutes: i32,
        /// Set when the reported position had to be clamped.
        clamped: bool,
    },
    UpdateRejected {
        train_id: TrainId,
        reason: String,
    },
}
