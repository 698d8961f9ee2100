mod sandbox;
mod state;
mod tick_loop;

use anyhow::Result;
use clap::Parser;
use rail_control::SeededTelemetry;
use rail_core::{Scenario, StationId, TrainId};
use rail_world::{build_initial_state, load_content};
use state::{shared, LiveState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rail_daemon", about = "Live conflict-prediction loop")]
struct Cli {
    #[arg(long, default_value = "./content")]
    content_dir: String,
    /// Telemetry seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Defaults to one tick per `tick_interval_secs` of content time. 0 runs flat out.
    #[arg(long)]
    ticks_per_sec: Option<f64>,
    #[arg(long)]
    max_ticks: Option<u64>,
    /// Queue one what-if run at startup, e.g. `22911:DCY:10:halt`.
    #[arg(long)]
    scenario: Option<String>,
}

fn parse_scenario(raw: &str) -> Result<Scenario> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [train, station, delay, action] = parts.as_slice() else {
        anyhow::bail!("scenario must look like TRAIN:STATION:MINUTES:ACTION, got '{raw}'");
    };
    Ok(Scenario {
        train_id: TrainId((*train).to_string()),
        station_id: StationId((*station).to_string()),
        delay_minutes: delay.parse()?,
        action: action.parse()?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let content = load_content(&cli.content_dir)?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let constants = content.network.constants.clone();
    let ticks_per_sec = cli
        .ticks_per_sec
        .unwrap_or_else(|| 1.0 / f64::from(constants.tick_interval_secs.max(1)));
    let world = build_initial_state(&content, seed);
    let sim = shared(LiveState::new(
        world,
        constants,
        Box::new(SeededTelemetry::new(seed)),
    ));
    let (view_tx, mut view_rx) = tokio::sync::broadcast::channel(64);

    tracing::info!(
        section = %content.network.section_name,
        seed,
        ticks_per_sec,
        "starting live loop"
    );

    let job = match cli.scenario.as_deref().map(parse_scenario).transpose()? {
        Some(scenario) => Some(sandbox::spawn_sandbox(&sim, scenario, seed)?),
        None => None,
    };

    let mut tick_task = tokio::spawn(tick_loop::run_tick_loop(
        sim.clone(),
        view_tx,
        ticks_per_sec,
        cli.max_ticks,
    ));

    let reporter = tokio::spawn(async move {
        loop {
            match view_rx.recv().await {
                Ok(view) => match view.conflicts.first() {
                    Some(top) => tracing::info!(
                        tick = view.tick,
                        conflicts = view.conflicts.len(),
                        "top: [{:?}] {}",
                        top.priority,
                        top.recommendation
                    ),
                    None => tracing::debug!(tick = view.tick, "no conflicts"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "view reporter lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let interrupted = tokio::select! {
        joined = &mut tick_task => {
            if let Err(err) = joined {
                tracing::error!("tick loop stopped: {err}");
            }
            false
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            tick_task.abort();
            true
        }
    };
    reporter.abort();

    let final_tick = sim.lock().world.meta.tick;
    tracing::info!(tick = final_tick, "live loop finished");

    match job {
        Some(job) if interrupted => job.cancel(),
        Some(job) => {
            tracing::info!("waiting for sandbox job");
            if let Some(result) = sandbox::drain(job, ctrl_c()).await? {
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        None => {}
    }
    Ok(())
}

/// Resolves on ctrl-c. Never resolves where the signal cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("ctrl-c handler unavailable: {err}");
        std::future::pending::<()>().await;
    }
}
