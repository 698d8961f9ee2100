//! Derived, read-only view of one snapshot.

use chrono::NaiveTime;
use serde::Serialize;

use crate::conflict::detect_conflicts;
use crate::metrics::{compute_overview, NetworkOverview};
use crate::ranking::rank;
use crate::signal::{resolve_signals, StationSignal};
use crate::{Conflict, Constants, StationId, TrainId, WorldState};

/// A train placed between two stations for map projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainPlacement {
    pub train_id: TrainId,
    pub preceding: StationId,
    pub following: Option<StationId>,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkView {
    pub tick: u64,
    pub clock: NaiveTime,
    pub signals: Vec<StationSignal>,
    /// Ranked, most urgent first.
    pub conflicts: Vec<Conflict>,
    pub placements: Vec<TrainPlacement>,
    pub overview: NetworkOverview,
}

/// Trains that cannot be placed on the section are left out.
pub fn place_trains(world: &WorldState) -> Vec<TrainPlacement> {
    world
        .trains
        .iter()
        .filter_map(|train| match world.topology.interpolate(train.position_km) {
            Ok(interp) => Some(TrainPlacement {
                train_id: train.id.clone(),
                preceding: interp.preceding.id.clone(),
                following: interp.following.map(|s| s.id.clone()),
                progress: interp.progress,
            }),
            Err(err) => {
                tracing::debug!(train = %train.id, "not placed: {err}");
                None
            }
        })
        .collect()
}

/// Full recomputation pass after a tick.
pub fn derive(world: &WorldState, constants: &Constants) -> NetworkView {
    let conflicts = rank(detect_conflicts(world, constants));
    let overview = compute_overview(world, &conflicts);
    NetworkView {
        tick: world.meta.tick,
        clock: world.meta.clock,
        signals: resolve_signals(world, constants),
        conflicts,
        placements: place_trains(world),
        overview,
    }
}
