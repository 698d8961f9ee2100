//! Arrival platform clashes.

use chrono::NaiveTime;
use smallvec::smallvec;

use super::{travel_minutes, whole_minutes, DetectionContext, Draft};
use crate::{ConflictImpact, ConflictKind, Train};

/// Minutes from `from` until the next occurrence of `to`, wrapping at midnight.
pub(crate) fn minutes_until(from: NaiveTime, to: NaiveTime) -> f64 {
    let minutes = to.signed_duration_since(from).num_seconds() as f64 / 60.0;
    if minutes < 0.0 {
        minutes + 24.0 * 60.0
    } else {
        minutes
    }
}

/// The train's assigned platform at its arrival station is held by another
/// train that will not have cleared by the time this one arrives.
pub(super) fn platform_clash(train: &Train, ctx: &DetectionContext<'_>) -> Option<Draft> {
    let platform_id = train.platform_assigned?;
    let station = ctx.topology.station(train.arrival_station()?)?;
    let Some(platform) = station.platform(platform_id) else {
        tracing::warn!(
            train = %train.id,
            station = %station.id,
            "assigned platform {platform_id} does not exist"
        );
        return None;
    };
    let occupant = platform.occupant()?;
    if occupant == &train.id {
        return None;
    }
    if train.speed_kmh <= 0.0 {
        tracing::debug!(train = %train.id, "no arrival estimate for a stationary train");
        return None;
    }

    let remaining_km = station.position_km - train.position_km;
    if remaining_km.abs() > ctx.constants.station_tolerance_km
        && !train.direction.is_ahead(train.position_km, station.position_km)
    {
        return None;
    }
    let eta_minutes = travel_minutes(remaining_km, train.speed_kmh);
    let clears_in = platform
        .estimated_clear()
        .map_or(f64::INFINITY, |clear| minutes_until(ctx.clock, clear));
    if clears_in <= eta_minutes {
        return None;
    }

    let (recommendation, impact, escalate) = match station.first_free_platform() {
        Some(free) => (
            format!("Re-assign {} to Platform {}", train.name, free.id),
            ConflictImpact::new(0, 0),
            false,
        ),
        None => {
            let wait = if clears_in.is_finite() {
                whole_minutes(clears_in - eta_minutes)
            } else {
                whole_minutes(ctx.constants.clearance_headway_minutes)
            };
            (
                format!(
                    "No free platform at {}; hold {} until Platform {platform_id} clears",
                    station.code, train.name
                ),
                ConflictImpact::new(wait, 0),
                true,
            )
        }
    };

    Some(Draft {
        kind: ConflictKind::Platform,
        time_to_conflict_minutes: eta_minutes,
        trains: smallvec![train.id.clone()],
        location: format!("{} Platform {platform_id}", station.code),
        description: format!(
            "Platform {platform_id} occupied by {occupant} during {} arrival",
            train.name
        ),
        recommendation,
        impact,
        escalate,
    })
}
