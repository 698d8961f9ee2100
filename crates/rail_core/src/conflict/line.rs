//! Running-line conflicts between two trains: overtakes and crossings.

use smallvec::smallvec;

use super::{is_in_loop, reaches, travel_minutes, whole_minutes, DetectionContext, Draft};
use crate::{ConflictImpact, ConflictKind, Direction, Station, Train};

/// Same-direction catch-up. The faster trailing train gets precedence; the
/// slower one is held at the nearest loop ahead of it.
pub(super) fn overtake(a: &Train, b: &Train, ctx: &DetectionContext<'_>) -> Option<Draft> {
    if is_in_loop(a, ctx) || is_in_loop(b, ctx) {
        return None;
    }
    let direction = a.direction;
    // Level on the same kilometre means one of them already stands aside;
    // there is no catch-up left to predict.
    let (trailing, leading) = if direction.is_ahead(a.position_km, b.position_km) {
        (a, b)
    } else if direction.is_ahead(b.position_km, a.position_km) {
        (b, a)
    } else {
        return None;
    };

    let closing_speed = trailing.speed_kmh - leading.speed_kmh;
    if closing_speed <= 0.0 {
        return None;
    }
    let gap_km = (leading.position_km - trailing.position_km).abs();
    let time_to_conflict = gap_km / closing_speed * 60.0;
    if time_to_conflict > ctx.constants.overtake_horizon_minutes {
        return None;
    }

    let meeting_km =
        leading.position_km + direction.sign() * leading.speed_kmh * time_to_conflict / 60.0;
    if !reaches(trailing, meeting_km, ctx) || !reaches(leading, meeting_km, ctx) {
        return None;
    }
    let hold_at = nearest_loop_ahead(leading, ctx);
    let (hold_km, hold_code, escalate) = match hold_at {
        Some(station) => (station.position_km, station.code.clone(), false),
        None => {
            let next = ctx.topology.station(&leading.next_station)?;
            (next.position_km, next.code.clone(), true)
        }
    };
    let hold = hold_minutes(trailing, leading, hold_km, ctx);

    let recommendation = if escalate {
        format!(
            "No loop line ahead of {}; hold at {hold_code} for {hold} minutes until {} clears",
            leading.name, trailing.name
        )
    } else {
        format!(
            "Halt {} at {hold_code} loop line for {hold} minutes",
            leading.name
        )
    };

    Some(Draft {
        kind: ConflictKind::Overtake,
        time_to_conflict_minutes: time_to_conflict,
        trains: smallvec![trailing.id.clone(), leading.id.clone()],
        location: ctx.topology.describe_location(meeting_km),
        description: format!("{} will overtake {}", trailing.name, leading.name),
        recommendation,
        impact: ConflictImpact::new(0, hold),
        escalate,
    })
}

/// Opposing trains converging on plain single line. The train with the
/// higher dispatch priority runs through; the other clears into a loop.
pub(super) fn crossing(a: &Train, b: &Train, ctx: &DetectionContext<'_>) -> Option<Draft> {
    if is_in_loop(a, ctx) || is_in_loop(b, ctx) {
        return None;
    }
    let (up, down) = if a.direction == Direction::Up { (a, b) } else { (b, a) };
    if up.position_km > down.position_km {
        return None;
    }
    let closing_speed = up.speed_kmh + down.speed_kmh;
    if closing_speed <= 0.0 {
        return None;
    }
    let gap_km = down.position_km - up.position_km;
    let time_to_conflict = gap_km / closing_speed * 60.0;
    if time_to_conflict > ctx.constants.crossing_horizon_minutes {
        return None;
    }
    let meeting_km = up.position_km + up.speed_kmh * time_to_conflict / 60.0;
    if !reaches(up, meeting_km, ctx) || !reaches(down, meeting_km, ctx) {
        return None;
    }
    if ctx
        .topology
        .loop_station_near(meeting_km, ctx.constants.station_tolerance_km)
        .is_some()
    {
        // They meet at a loop: an ordinary crossing.
        return None;
    }

    let (high, low) = if outranks(b, a) { (b, a) } else { (a, b) };
    let headway = ctx.constants.clearance_headway_minutes;
    let clear_into = ctx
        .topology
        .loop_stations_between(low.position_km, meeting_km)
        .last()
        .copied()
        .or_else(|| {
            ctx.topology
                .loop_station_near(low.position_km, ctx.constants.station_tolerance_km)
        });

    let (delay, recommendation, escalate) = match clear_into {
        Some(station) => {
            let high_arrives = travel_minutes(station.position_km - high.position_km, high.speed_kmh);
            let low_arrives = travel_minutes(station.position_km - low.position_km, low.speed_kmh);
            let delay = whole_minutes((high_arrives - low_arrives).max(0.0) + headway);
            (
                delay,
                format!(
                    "Priority to {}; {} to take {} loop line for {delay} minutes",
                    high.name, low.name, station.code
                ),
                false,
            )
        }
        None => {
            let passes = travel_minutes(low.position_km - high.position_km, high.speed_kmh);
            let delay = whole_minutes(passes + headway);
            (
                delay,
                format!(
                    "No loop line before the meeting point; hold {} at km {:.1} for {delay} minutes",
                    low.name, low.position_km
                ),
                true,
            )
        }
    };

    Some(Draft {
        kind: ConflictKind::Crossing,
        time_to_conflict_minutes: time_to_conflict,
        trains: smallvec![high.id.clone(), low.id.clone()],
        location: ctx.topology.describe_location(meeting_km),
        description: format!("{} and {} crossing on single line", high.name, low.name),
        recommendation,
        impact: ConflictImpact::new(0, delay),
        escalate,
    })
}

/// Strictly higher dispatch priority, then train type.
fn outranks(a: &Train, b: &Train) -> bool {
    (a.priority, a.train_type.rank()) > (b.priority, b.train_type.rank())
}

/// Nearest loop-bearing station ahead of `train`, not beyond its arrival station.
fn nearest_loop_ahead<'a>(train: &Train, ctx: &DetectionContext<'a>) -> Option<&'a Station> {
    let arrival_km = train
        .arrival_station()
        .and_then(|id| ctx.topology.position_of(id).ok())?;
    let direction = train.direction;
    let mut candidates: Vec<&Station> = ctx
        .topology
        .stations()
        .iter()
        .filter(|s| {
            s.has_loop()
                && direction.is_ahead(train.position_km, s.position_km)
                && !direction.is_ahead(arrival_km, s.position_km)
        })
        .collect();
    candidates.sort_by(|x, y| {
        let dx = (x.position_km - train.position_km).abs();
        let dy = (y.position_km - train.position_km).abs();
        dx.total_cmp(&dy)
    });
    candidates.first().copied()
}

/// Hold needed at `hold_km` so the faster train clears, plus headway.
fn hold_minutes(fast: &Train, slow: &Train, hold_km: f64, ctx: &DetectionContext<'_>) -> u32 {
    let fast_arrives = travel_minutes(hold_km - fast.position_km, fast.speed_kmh);
    let slow_arrives = travel_minutes(hold_km - slow.position_km, slow.speed_kmh);
    whole_minutes((fast_arrives - slow_arrives).max(0.0) + ctx.constants.clearance_headway_minutes)
}
