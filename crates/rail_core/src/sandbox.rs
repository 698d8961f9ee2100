//! What-if projections on a cloned snapshot.
//!
//! The live world is only ever borrowed; every perturbation is applied to a
//! clone, so a sandbox run can be dropped at any point without side effects.

use std::str::FromStr;

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conflict::{detect_conflicts, whole_minutes};
use crate::error::ScenarioError;
use crate::ranking::rank;
use crate::{Conflict, ConflictKind, Constants, StationId, Train, TrainId, TrainStatus, WorldState};

pub const MIN_SCENARIO_DELAY: u32 = 1;
pub const MAX_SCENARIO_DELAY: u32 = 120;
const MAX_PRIORITY: u8 = 10;
/// Ranked conflict recommendations carried into the result.
const CONFLICT_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioAction {
    Halt,
    Slow,
    Reroute,
    Priority,
}

impl ScenarioAction {
    pub const ALL: [ScenarioAction; 4] = [
        ScenarioAction::Halt,
        ScenarioAction::Slow,
        ScenarioAction::Reroute,
        ScenarioAction::Priority,
    ];

    /// Wire name, matching the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioAction::Halt => "halt",
            ScenarioAction::Slow => "slow",
            ScenarioAction::Reroute => "reroute",
            ScenarioAction::Priority => "priority",
        }
    }
}

impl FromStr for ScenarioAction {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ScenarioError::UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub train_id: TrainId,
    pub station_id: StationId,
    pub delay_minutes: u32,
    pub action: ScenarioAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedImpact {
    /// Network delay of the projection minus the baseline; negative when the
    /// scenario relieves the network.
    pub total_delay_impact_minutes: i64,
    pub affected_trains: u32,
    pub recovery_time_minutes: u32,
    pub alternative_routes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub offset_minutes: u32,
    pub event: String,
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: Uuid,
    pub scenario: Scenario,
    pub predictions: PredictedImpact,
    pub recommendations: Vec<String>,
    pub timeline: Vec<Milestone>,
    /// Ranked conflicts of the perturbed snapshot.
    pub projected_conflicts: Vec<Conflict>,
}

pub fn validate_scenario(world: &WorldState, scenario: &Scenario) -> Result<(), ScenarioError> {
    if world.train(&scenario.train_id).is_none() {
        return Err(ScenarioError::UnknownTrain(scenario.train_id.clone()));
    }
    if !world.topology.contains(&scenario.station_id) {
        return Err(ScenarioError::UnknownStation(scenario.station_id.clone()));
    }
    if !(MIN_SCENARIO_DELAY..=MAX_SCENARIO_DELAY).contains(&scenario.delay_minutes) {
        return Err(ScenarioError::DelayOutOfRange(scenario.delay_minutes));
    }
    Ok(())
}

/// Projects `scenario` against a clone of `world`.
///
/// Identical world, scenario and seed always produce an identical result.
pub fn run_scenario(
    world: &WorldState,
    scenario: &Scenario,
    constants: &Constants,
    seed: u64,
) -> Result<SimulationResult, ScenarioError> {
    validate_scenario(world, scenario)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let run_id = crate::generate_uuid(&mut rng);

    let baseline = detect_conflicts(world, constants);
    let mut projected_world = world.clone();
    let station_label = apply_perturbation(&mut projected_world, scenario, constants)?;
    let projected = rank(detect_conflicts(&projected_world, constants));

    let total_delay_impact_minutes = network_delay(&projected) - network_delay(&baseline);
    let imposed_before = imposed_delays(&baseline);
    let imposed_after = imposed_delays(&projected);
    let affected_trains = world
        .trains
        .iter()
        .zip(&projected_world.trains)
        .filter(|(before, after)| {
            projected_delay(before, &imposed_before) != projected_delay(after, &imposed_after)
        })
        .count() as u32;
    let recovery_time_minutes = recovery_time(scenario, &projected, constants);
    let alternative_routes = alternative_routes(world, &scenario.train_id);

    let predictions = PredictedImpact {
        total_delay_impact_minutes,
        affected_trains,
        recovery_time_minutes,
        alternative_routes,
    };
    let recommendations = recommendations(world, scenario, &station_label, &predictions, &projected);
    let timeline = timeline(scenario, &predictions, &mut rng);

    tracing::debug!(
        train = %scenario.train_id,
        action = ?scenario.action,
        impact = total_delay_impact_minutes,
        "scenario projected"
    );

    Ok(SimulationResult {
        run_id,
        scenario: scenario.clone(),
        predictions,
        recommendations,
        timeline,
        projected_conflicts: projected,
    })
}

/// Station facts needed after the train has been borrowed mutably.
pub(crate) struct StationLabel {
    code: String,
    has_loop: bool,
}

pub(crate) fn apply_perturbation(
    world: &mut WorldState,
    scenario: &Scenario,
    constants: &Constants,
) -> Result<StationLabel, ScenarioError> {
    let station = world
        .topology
        .station(&scenario.station_id)
        .ok_or_else(|| ScenarioError::UnknownStation(scenario.station_id.clone()))?;
    let label = StationLabel {
        code: station.code.clone(),
        has_loop: station.has_loop(),
    };
    let station_km = station.position_km;
    let train = world
        .train_mut(&scenario.train_id)
        .ok_or_else(|| ScenarioError::UnknownTrain(scenario.train_id.clone()))?;
    let delay = i32::try_from(scenario.delay_minutes).unwrap_or(i32::MAX);

    match scenario.action {
        ScenarioAction::Halt => {
            train.delay_minutes = train.delay_minutes.saturating_add(delay);
            train.speed_kmh = 0.0;
            train.status = TrainStatus::Halted;
        }
        ScenarioAction::Slow => {
            train.delay_minutes = train.delay_minutes.saturating_add(delay);
            train.speed_kmh *= constants.slow_speed_factor;
        }
        ScenarioAction::Reroute => {
            train.delay_minutes = train.delay_minutes.saturating_add(delay);
            train.position_km = station_km;
            train.speed_kmh = 0.0;
            train.status = TrainStatus::Halted;
        }
        ScenarioAction::Priority => {
            train.priority = MAX_PRIORITY;
            if train.delay_minutes > 0 {
                train.delay_minutes = (train.delay_minutes - delay).max(0);
            }
        }
    }
    Ok(label)
}

fn network_delay(conflicts: &[Conflict]) -> i64 {
    conflicts
        .iter()
        .map(|c| i64::from(c.impact.network_delay))
        .sum()
}

/// Minutes each train would lose across the whole conflict set.
fn imposed_delays(conflicts: &[Conflict]) -> AHashMap<&TrainId, i64> {
    let mut imposed = AHashMap::new();
    for conflict in conflicts {
        for train in &conflict.trains {
            *imposed.entry(train).or_insert(0) += i64::from(conflict.delay_for(train));
        }
    }
    imposed
}

fn projected_delay(train: &Train, imposed: &AHashMap<&TrainId, i64>) -> i64 {
    i64::from(train.delay_minutes) + imposed.get(&train.id).copied().unwrap_or(0)
}

/// Minutes until no urgent conflict remains in the projection.
fn recovery_time(scenario: &Scenario, projected: &[Conflict], constants: &Constants) -> u32 {
    projected
        .iter()
        .filter(|c| c.time_to_conflict_minutes < constants.recovery_threshold_minutes)
        .map(|c| whole_minutes(c.time_to_conflict_minutes + f64::from(c.impact.network_delay)))
        .fold(scenario.delay_minutes, u32::max)
}

/// Loop-bearing stations between the train and its destination.
fn alternative_routes(world: &WorldState, train_id: &TrainId) -> u32 {
    let Some(train) = world.train(train_id) else {
        return 0;
    };
    let Some(destination_km) = train
        .arrival_station()
        .and_then(|id| world.topology.position_of(id).ok())
    else {
        return 0;
    };
    world
        .topology
        .loop_stations_between(train.position_km, destination_km)
        .len() as u32
}

fn recommendations(
    world: &WorldState,
    scenario: &Scenario,
    station: &StationLabel,
    predictions: &PredictedImpact,
    projected: &[Conflict],
) -> Vec<String> {
    let name = world
        .train(&scenario.train_id)
        .map_or_else(|| scenario.train_id.to_string(), |t| t.name.clone());
    let minutes = scenario.delay_minutes;
    let code = &station.code;

    let mut recs = vec![match scenario.action {
        ScenarioAction::Halt => format!("Halt {name} at {code} for {minutes} minutes"),
        ScenarioAction::Slow => {
            format!("Run {name} at reduced speed towards {code}, allowing {minutes} minutes")
        }
        ScenarioAction::Reroute if station.has_loop => {
            format!("Divert {name} into {code} loop line for {minutes} minutes")
        }
        ScenarioAction::Reroute => {
            format!("Hold {name} at {code} for {minutes} minutes; no loop line available")
        }
        ScenarioAction::Priority => format!("Give {name} precedence through {code}"),
    }];

    for conflict in projected.iter().take(CONFLICT_RECOMMENDATIONS) {
        if !recs.contains(&conflict.recommendation) {
            recs.push(conflict.recommendation.clone());
        }
    }
    if projected.iter().any(|c| c.kind == ConflictKind::Platform) {
        recs.push("Reroute following trains to alternative platforms".to_string());
    }
    if predictions.total_delay_impact_minutes > 0 {
        recs.push("Adjust signal timing for optimal flow recovery".to_string());
    }
    if predictions.affected_trains > 0 {
        recs.push(format!(
            "Notify passengers of expected delays on {} trains",
            predictions.affected_trains
        ));
    }
    recs
}

/// Fixed five-step timeline with strictly increasing offsets.
fn timeline(scenario: &Scenario, predictions: &PredictedImpact, rng: &mut impl Rng) -> Vec<Milestone> {
    let assessment_jitter: u32 = rng.gen_range(0..=2);
    let assessment = 5 + assessment_jitter;
    let adjustment = assessment + scenario.delay_minutes.div_ceil(2).max(1);
    let recovery_begins = (adjustment + 1).max(scenario.delay_minutes);
    let restored = (recovery_begins + 1).max(predictions.recovery_time_minutes);

    [
        (0, "Simulation Start", MilestoneStatus::Completed),
        (assessment, "Impact Assessment", MilestoneStatus::Active),
        (adjustment, "Network Adjustment", MilestoneStatus::Pending),
        (recovery_begins, "Recovery Begins", MilestoneStatus::Pending),
        (restored, "Normal Operations Restored", MilestoneStatus::Pending),
    ]
    .into_iter()
    .map(|(offset_minutes, event, status)| Milestone {
        offset_minutes,
        event: event.to_string(),
        status,
    })
    .collect()
}
