//! Snapshot metrics computed from `WorldState`.
//!
//! Network overview KPIs and per-station platform counts. No state mutation,
//! no IO.

use chrono::NaiveTime;
use serde::Serialize;

use crate::{Conflict, ConflictPriority, PlatformStatus, Station, StationId, TrainStatus, WorldState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkOverview {
    pub tick: u64,
    pub clock: NaiveTime,

    // Fleet
    pub total_trains: u32,
    pub running: u32,
    pub halted: u32,
    pub approaching: u32,

    // Punctuality
    pub delayed: u32,
    pub on_time: u32,
    /// Mean of positive delays over all trains.
    pub avg_delay_minutes: f64,

    // Conflicts
    pub conflicts_total: u32,
    pub conflicts_high: u32,
    pub conflicts_medium: u32,
    pub conflicts_low: u32,
    pub network_delay_minutes: u32,

    // Platforms
    pub platforms_free: u32,
    pub platforms_occupied: u32,
    pub platforms_maintenance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformSummary {
    pub station_id: StationId,
    pub total: u32,
    pub free: u32,
    pub occupied: u32,
    pub maintenance: u32,
}

pub fn platform_summary(station: &Station) -> PlatformSummary {
    let mut summary = PlatformSummary {
        station_id: station.id.clone(),
        total: 0,
        free: 0,
        occupied: 0,
        maintenance: 0,
    };
    for platform in &station.platforms {
        summary.total += 1;
        match platform.status() {
            PlatformStatus::Free => summary.free += 1,
            PlatformStatus::Occupied => summary.occupied += 1,
            PlatformStatus::Maintenance => summary.maintenance += 1,
        }
    }
    summary
}

pub fn compute_overview(world: &WorldState, conflicts: &[Conflict]) -> NetworkOverview {
    let mut overview = NetworkOverview {
        tick: world.meta.tick,
        clock: world.meta.clock,
        total_trains: 0,
        running: 0,
        halted: 0,
        approaching: 0,
        delayed: 0,
        on_time: 0,
        avg_delay_minutes: 0.0,
        conflicts_total: 0,
        conflicts_high: 0,
        conflicts_medium: 0,
        conflicts_low: 0,
        network_delay_minutes: 0,
        platforms_free: 0,
        platforms_occupied: 0,
        platforms_maintenance: 0,
    };

    let mut positive_delay_sum = 0i64;
    for train in &world.trains {
        overview.total_trains += 1;
        match train.status {
            TrainStatus::Running => overview.running += 1,
            TrainStatus::Halted => overview.halted += 1,
            TrainStatus::Approaching => overview.approaching += 1,
        }
        if train.delay_minutes > 0 {
            overview.delayed += 1;
            positive_delay_sum += i64::from(train.delay_minutes);
        } else {
            overview.on_time += 1;
        }
    }
    if overview.total_trains > 0 {
        overview.avg_delay_minutes = positive_delay_sum as f64 / f64::from(overview.total_trains);
    }

    for conflict in conflicts {
        overview.conflicts_total += 1;
        overview.network_delay_minutes += conflict.impact.network_delay;
        match conflict.priority {
            ConflictPriority::High => overview.conflicts_high += 1,
            ConflictPriority::Medium => overview.conflicts_medium += 1,
            ConflictPriority::Low => overview.conflicts_low += 1,
        }
    }

    for station in world.topology.stations() {
        let summary = platform_summary(station);
        overview.platforms_free += summary.free;
        overview.platforms_occupied += summary.occupied;
        overview.platforms_maintenance += summary.maintenance;
    }

    overview
}
