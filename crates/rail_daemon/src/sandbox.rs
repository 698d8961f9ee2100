//! Background what-if jobs against a snapshot of the live world.

use crate::state::{snapshot, SharedWorld};
use anyhow::{anyhow, Result};
use rail_core::sandbox::validate_scenario;
use rail_core::{Scenario, ScenarioError, SimulationResult};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct SandboxJob {
    handle: JoinHandle<Result<SimulationResult, ScenarioError>>,
}

impl SandboxJob {
    /// Aborts the job. The live world is never touched either way.
    pub fn cancel(&self) {
        self.handle.abort();
        tracing::info!("sandbox job cancelled");
    }

    pub async fn join(&mut self) -> Result<SimulationResult> {
        match (&mut self.handle).await {
            Ok(result) => Ok(result?),
            Err(err) if err.is_cancelled() => Err(anyhow!("sandbox job cancelled")),
            Err(err) => Err(anyhow!("sandbox job failed: {err}")),
        }
    }
}

/// Validates `scenario`, snapshots the live world and projects it after the
/// configured latency. Invalid scenarios are rejected before anything is
/// spawned.
pub fn spawn_sandbox(sim: &SharedWorld, scenario: Scenario, seed: u64) -> Result<SandboxJob, ScenarioError> {
    let (world, constants) = snapshot(sim);
    validate_scenario(&world, &scenario)?;
    let latency = Duration::from_millis(constants.sandbox_latency_ms);

    let handle = tokio::spawn(async move {
        tokio::time::sleep(latency).await;
        let result = rail_core::run_scenario(&world, &scenario, &constants, seed);
        match &result {
            Ok(done) => tracing::info!(
                run_id = %done.run_id,
                train = %scenario.train_id,
                impact = done.predictions.total_delay_impact_minutes,
                "sandbox run finished"
            ),
            Err(err) => tracing::warn!("sandbox run rejected: {err}"),
        }
        result
    });
    Ok(SandboxJob { handle })
}

/// Waits for `job` to finish unless `shutdown` resolves first, in which case
/// the job is cancelled and `None` comes back.
pub async fn drain(mut job: SandboxJob, shutdown: impl Future<Output = ()>) -> Result<Option<SimulationResult>> {
    let finished = tokio::select! {
        result = job.join() => Some(result),
        () = shutdown => None,
    };
    match finished {
        Some(result) => result.map(Some),
        None => {
            job.cancel();
            Ok(None)
        }
    }
}
