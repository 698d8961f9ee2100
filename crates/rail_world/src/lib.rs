//! Content loading and initial world construction shared between rail_cli
//! and rail_daemon.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use rail_core::{
    Constants, Counters, MetaState, NetworkContent, TrackTopology, Train, TrainId, WorldState,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Deserialize)]
struct SectionFile {
    section_name: String,
    content_version: String,
    stations: TrackTopology,
}

#[derive(Deserialize)]
struct TrainsFile {
    clock: NaiveTime,
    trains: Vec<Train>,
}

/// Everything read from a content directory.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldContent {
    pub network: NetworkContent,
    pub topology: TrackTopology,
    /// Time of day the train snapshot was taken.
    pub clock: NaiveTime,
    pub trains: Vec<Train>,
}

/// Validates cross-references in loaded content, panicking on any authoring error.
///
/// Station ordering is already enforced when the topology deserializes; this
/// catches trains naming stations or platforms the section does not have,
/// duplicate train ids, and thresholds that would invert priority classes.
pub fn validate_content(content: &WorldContent) {
    let c = &content.network.constants;
    assert!(
        !content.network.section_name.trim().is_empty(),
        "section_name must not be empty"
    );
    assert!(c.tick_interval_secs > 0, "tick_interval_secs must be positive");
    assert!(
        c.high_priority_minutes > 0.0 && c.high_priority_minutes < c.medium_priority_minutes,
        "priority thresholds must satisfy 0 < high ({}) < medium ({})",
        c.high_priority_minutes,
        c.medium_priority_minutes,
    );
    assert!(
        c.slow_speed_factor > 0.0 && c.slow_speed_factor <= 1.0,
        "slow_speed_factor {} must be in (0, 1]",
        c.slow_speed_factor,
    );
    assert!(
        c.max_position_step_km > 0.0,
        "max_position_step_km must be positive"
    );

    for station in content.topology.stations() {
        let mut platform_ids = HashSet::new();
        for platform in &station.platforms {
            assert!(
                platform_ids.insert(platform.id),
                "station '{}' lists platform {} twice",
                station.id,
                platform.id,
            );
        }
    }

    let mut train_ids: HashSet<&TrainId> = HashSet::new();
    for train in &content.trains {
        assert!(
            train_ids.insert(&train.id),
            "train id '{}' appears more than once",
            train.id,
        );
        for station_id in train.route.iter().chain(std::iter::once(&train.next_station)) {
            assert!(
                content.topology.contains(station_id),
                "train '{}' references unknown station '{}'",
                train.id,
                station_id,
            );
        }
        if let (Some(platform), Some(arrival)) = (train.platform_assigned, train.arrival_station()) {
            let exists = content
                .topology
                .station(arrival)
                .is_some_and(|s| s.platform(platform).is_some());
            assert!(
                exists,
                "train '{}' is assigned platform {} which '{}' does not have",
                train.id,
                platform,
                arrival,
            );
        }
    }
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let text = std::fs::read_to_string(dir.join(file)).with_context(|| format!("reading {file}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {file}"))
}

pub fn load_content(content_dir: &str) -> Result<WorldContent> {
    let dir = Path::new(content_dir);
    let constants: Constants = read_json(dir, "constants.json")?;
    let section: SectionFile = read_json(dir, "section.json")?;
    let roster: TrainsFile = read_json(dir, "trains.json")?;
    let content = WorldContent {
        network: NetworkContent {
            section_name: section.section_name,
            content_version: section.content_version,
            constants,
        },
        topology: section.stations,
        clock: roster.clock,
        trains: roster.trains,
    };
    validate_content(&content);
    Ok(content)
}

pub fn build_initial_state(content: &WorldContent, seed: u64) -> WorldState {
    WorldState {
        meta: MetaState {
            tick: 0,
            seed,
            clock: content.clock,
            content_version: content.network.content_version.clone(),
        },
        topology: content.topology.clone(),
        trains: content.trains.clone(),
        counters: Counters::default(),
    }
}
