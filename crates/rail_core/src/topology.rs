//! Ordered station model of the section.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::TopologyError;
use crate::{Platform, PlatformId, Station, StationId};

/// Stations of a single-line section, kept in kilometre order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Station>", into = "Vec<Station>")]
pub struct TrackTopology {
    stations: Vec<Station>,
}

/// Where a kilometre position falls between two consecutive stations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolation<'a> {
    pub preceding: &'a Station,
    /// `None` only at the last station of the section.
    pub following: Option<&'a Station>,
    /// 0.0 at `preceding`, approaching 1.0 towards `following`.
    pub progress: f64,
}

impl TrackTopology {
    pub fn new(stations: Vec<Station>) -> Result<Self, TopologyError> {
        if stations.is_empty() {
            return Err(TopologyError::Empty);
        }
        let mut seen = HashSet::new();
        let mut previous: Option<f64> = None;
        for station in &stations {
            if !seen.insert(&station.id) {
                return Err(TopologyError::DuplicateStation(station.id.clone()));
            }
            if !station.position_km.is_finite() || station.position_km < 0.0 {
                return Err(TopologyError::InvalidPosition {
                    station: station.id.clone(),
                    position_km: station.position_km,
                });
            }
            if previous.is_some_and(|prev| station.position_km <= prev) {
                return Err(TopologyError::NonIncreasing {
                    station: station.id.clone(),
                    position_km: station.position_km,
                });
            }
            previous = Some(station.position_km);
        }
        Ok(Self { stations })
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &StationId) -> bool {
        self.station(id).is_some()
    }

    pub fn position_of(&self, id: &StationId) -> Result<f64, TopologyError> {
        self.station(id)
            .map(|s| s.position_km)
            .ok_or_else(|| TopologyError::UnknownStation(id.clone()))
    }

    pub fn start_km(&self) -> f64 {
        self.stations.first().map_or(0.0, |s| s.position_km)
    }

    /// Kilometre marker of the last station.
    pub fn section_length(&self) -> f64 {
        self.stations.last().map_or(0.0, |s| s.position_km)
    }

    pub fn contains_position(&self, position_km: f64) -> bool {
        position_km.is_finite()
            && position_km >= self.start_km()
            && position_km <= self.section_length()
    }

    pub fn clamp_position(&self, position_km: f64) -> f64 {
        position_km.clamp(self.start_km(), self.section_length())
    }

    pub fn interpolate(&self, position_km: f64) -> Result<Interpolation<'_>, TopologyError> {
        if !self.contains_position(position_km) {
            return Err(TopologyError::OutOfBounds {
                position_km,
                start_km: self.start_km(),
                end_km: self.section_length(),
            });
        }
        // At least the first station satisfies the predicate after the bounds check.
        let idx = self
            .stations
            .partition_point(|s| s.position_km <= position_km);
        let preceding = &self.stations[idx - 1];
        let following = self.stations.get(idx);
        let progress = following.map_or(0.0, |next| {
            (position_km - preceding.position_km) / (next.position_km - preceding.position_km)
        });
        Ok(Interpolation {
            preceding,
            following,
            progress,
        })
    }

    /// Human-readable placement, e.g. "Between DCY and DWX" or "At UJN".
    pub fn describe_location(&self, position_km: f64) -> String {
        match self.interpolate(self.clamp_position(position_km)) {
            Ok(Interpolation {
                preceding,
                following: Some(next),
                progress,
            }) if progress > 0.0 => format!("Between {} and {}", preceding.code, next.code),
            Ok(interp) => format!("At {}", interp.preceding.code),
            Err(_) => format!("km {position_km:.1}"),
        }
    }

    /// Loop-bearing stations strictly between `from_km` and `to_km`, ordered
    /// from `from_km` towards `to_km`.
    pub fn loop_stations_between(&self, from_km: f64, to_km: f64) -> Vec<&Station> {
        let (lo, hi) = if from_km <= to_km {
            (from_km, to_km)
        } else {
            (to_km, from_km)
        };
        let mut found: Vec<&Station> = self
            .stations
            .iter()
            .filter(|s| s.has_loop() && s.position_km > lo && s.position_km < hi)
            .collect();
        if from_km > to_km {
            found.reverse();
        }
        found
    }

    /// A loop-bearing station within `tolerance_km` of `position_km`, if any.
    pub fn loop_station_near(&self, position_km: f64, tolerance_km: f64) -> Option<&Station> {
        self.stations
            .iter()
            .find(|s| s.has_loop() && (s.position_km - position_km).abs() <= tolerance_km)
    }

    /// Only mutation path into station data: platform occupancy.
    pub fn platform_mut(&mut self, station: &StationId, platform: PlatformId) -> Option<&mut Platform> {
        self.stations
            .iter_mut()
            .find(|s| &s.id == station)
            .and_then(|s| s.platforms.iter_mut().find(|p| p.id == platform))
    }
}

impl TryFrom<Vec<Station>> for TrackTopology {
    type Error = TopologyError;

    fn try_from(stations: Vec<Station>) -> Result<Self, Self::Error> {
        Self::new(stations)
    }
}

impl From<TrackTopology> for Vec<Station> {
    fn from(topology: TrackTopology) -> Self {
        topology.stations
    }
}
