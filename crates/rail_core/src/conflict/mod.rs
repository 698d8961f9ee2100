//! Conflict prediction over a world snapshot.
//!
//! One pass walks every pair of well-formed trains (overtake and crossing on
//! the running line) and then every platform assignment. Records come back in
//! detection order with sequential ids; ranking is a separate step.

mod line;
mod platform;

use chrono::NaiveTime;

use crate::topology::TrackTopology;
use crate::validate::well_formed_trains;
use crate::{
    Conflict, ConflictId, ConflictImpact, ConflictKind, ConflictPriority, ConflictStatus,
    Constants, InvolvedTrains, Train, WorldState,
};

/// Read-only inputs shared by the individual checks.
pub(crate) struct DetectionContext<'a> {
    pub topology: &'a TrackTopology,
    pub constants: &'a Constants,
    pub clock: NaiveTime,
}

/// A conflict before id and status assignment.
pub(crate) struct Draft {
    pub kind: ConflictKind,
    pub time_to_conflict_minutes: f64,
    pub trains: InvolvedTrains,
    pub location: String,
    pub description: String,
    pub recommendation: String,
    pub impact: ConflictImpact,
    /// Forces `High` regardless of time-to-conflict.
    pub escalate: bool,
}

/// Runs a full detection pass. Malformed trains are logged and skipped.
pub fn detect_conflicts(world: &WorldState, constants: &Constants) -> Vec<Conflict> {
    let ctx = DetectionContext {
        topology: &world.topology,
        constants,
        clock: world.meta.clock,
    };
    let trains = well_formed_trains(world);
    let drafts = collect_drafts(&trains, &ctx);
    finish(drafts, constants)
}

fn collect_drafts(trains: &[&Train], ctx: &DetectionContext<'_>) -> Vec<Draft> {
    let mut drafts = Vec::new();
    for (i, first) in trains.iter().enumerate() {
        for second in &trains[i + 1..] {
            let draft = if first.direction == second.direction {
                line::overtake(first, second, ctx)
            } else {
                line::crossing(first, second, ctx)
            };
            drafts.extend(draft);
        }
    }
    for train in trains {
        drafts.extend(platform::platform_clash(train, ctx));
    }
    drafts
}

fn finish(drafts: Vec<Draft>, constants: &Constants) -> Vec<Conflict> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let priority = if draft.escalate {
                ConflictPriority::High
            } else {
                classify(draft.time_to_conflict_minutes, constants)
            };
            let status = match priority {
                ConflictPriority::High | ConflictPriority::Medium => ConflictStatus::Pending,
                ConflictPriority::Low => ConflictStatus::Monitoring,
            };
            Conflict {
                id: ConflictId(format!("conf_{:03}", i + 1)),
                kind: draft.kind,
                priority,
                time_to_conflict_minutes: draft.time_to_conflict_minutes,
                trains: draft.trains,
                location: draft.location,
                description: draft.description,
                recommendation: draft.recommendation,
                impact: draft.impact,
                status,
            }
        })
        .collect()
}

/// Priority from how soon the conflict materialises.
pub fn classify(time_to_conflict_minutes: f64, constants: &Constants) -> ConflictPriority {
    if time_to_conflict_minutes < constants.high_priority_minutes {
        ConflictPriority::High
    } else if time_to_conflict_minutes < constants.medium_priority_minutes {
        ConflictPriority::Medium
    } else {
        ConflictPriority::Low
    }
}

/// Minutes to cover `distance_km` at `speed_kmh`; zero for a stationary train.
pub(crate) fn travel_minutes(distance_km: f64, speed_kmh: f64) -> f64 {
    if speed_kmh > 0.0 {
        distance_km.abs() / speed_kmh * 60.0
    } else {
        0.0
    }
}

/// Whole minutes, rounded up, never negative.
pub(crate) fn whole_minutes(minutes: f64) -> u32 {
    if minutes.is_finite() && minutes > 0.0 {
        minutes.ceil() as u32
    } else {
        0
    }
}

/// `km` is not beyond the train's arrival station, allowing
/// `station_tolerance_km`. A train without a known arrival station reaches
/// nothing.
pub(crate) fn reaches(train: &Train, km: f64, ctx: &DetectionContext<'_>) -> bool {
    let Some(arrival_km) = train
        .arrival_station()
        .and_then(|id| ctx.topology.position_of(id).ok())
    else {
        return false;
    };
    let limit = arrival_km + train.direction.sign() * ctx.constants.station_tolerance_km;
    !train.direction.is_ahead(limit, km)
}

/// A train standing at a loop-bearing station is clear of the running line.
pub(crate) fn is_in_loop(train: &Train, ctx: &DetectionContext<'_>) -> bool {
    train.is_halted()
        && ctx
            .topology
            .loop_station_near(train.position_km, ctx.constants.station_tolerance_km)
            .is_some()
}
