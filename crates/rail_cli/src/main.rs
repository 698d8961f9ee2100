use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rail_control::{SeededTelemetry, TelemetryNoise, TelemetrySource};
use rail_core::{NetworkView, Scenario, ScenarioAction, SignalColor, StationId, TrainId};
use rail_world::{build_initial_state, load_content};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "rail_cli", about = "Rail section conflict predictor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live loop offline for a fixed number of ticks.
    Run {
        #[arg(long)]
        ticks: u64,
        /// Telemetry seed; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "./content")]
        content_dir: String,
        #[arg(long, default_value_t = 12)]
        print_every: u64,
        /// Pure dead reckoning, no random walk on the feed.
        #[arg(long)]
        no_noise: bool,
    },
    /// Project one what-if scenario against the loaded snapshot and print it as JSON.
    Simulate {
        #[arg(long)]
        train: String,
        #[arg(long)]
        station: String,
        #[arg(long)]
        delay: u32,
        #[arg(long, value_enum, default_value_t = Action::Halt)]
        action: Action,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value = "./content")]
        content_dir: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    Halt,
    Slow,
    Reroute,
    Priority,
}

impl From<Action> for ScenarioAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Halt => ScenarioAction::Halt,
            Action::Slow => ScenarioAction::Slow,
            Action::Reroute => ScenarioAction::Reroute,
            Action::Priority => ScenarioAction::Priority,
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run(ticks: u64, seed: Option<u64>, content_dir: &str, print_every: u64, no_noise: bool) -> Result<()> {
    let content = load_content(content_dir)?;
    let constants = &content.network.constants;
    let resolved_seed = seed.unwrap_or_else(rand::random);
    let mut world = build_initial_state(&content, resolved_seed);
    let mut feed = SeededTelemetry::new(resolved_seed);
    if no_noise {
        feed = feed.with_noise(TelemetryNoise::none());
    }

    println!(
        "Starting live loop: ticks={ticks} seed={resolved_seed} section={} content_version={}",
        content.network.section_name, content.network.content_version,
    );
    println!("{}", "-".repeat(80));
    print_status(&rail_core::derive(&world, constants));

    let print_every = print_every.max(1);
    for _ in 0..ticks {
        let updates = feed.poll(&world, constants);
        let events = rail_core::tick(&mut world, &updates, constants);
        for event in &events {
            if let rail_core::Event::UpdateRejected { train_id, reason } = &event.event {
                tracing::warn!(tick = event.tick, train = %train_id, "update rejected: {reason}");
            }
        }

        if world.meta.tick % print_every == 0 {
            let view = rail_core::derive(&world, constants);
            print_status(&view);
            if let Some(top) = view.conflicts.first() {
                println!("    next: [{:?}] {} ({})", top.priority, top.recommendation, top.location);
            }
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final view at tick {}:", world.meta.tick);
    print_status(&rail_core::derive(&world, constants));
    Ok(())
}

fn simulate(scenario: &Scenario, seed: u64, content_dir: &str) -> Result<()> {
    let content = load_content(content_dir)?;
    let world = build_initial_state(&content, seed);
    let result = rail_core::run_scenario(&world, scenario, &content.network.constants, seed)
        .context("running scenario")?;
    let json = serde_json::to_string_pretty(&result).context("serializing simulation result")?;
    println!("{json}");
    Ok(())
}

fn print_status(view: &NetworkView) {
    let o = &view.overview;
    let signals: String = view
        .signals
        .iter()
        .map(|s| match s.color {
            SignalColor::Green => 'G',
            SignalColor::Yellow => 'Y',
            SignalColor::Red => 'R',
        })
        .collect();
    println!(
        "[tick={tick:05}  {clock}]  running={running} approaching={approaching} halted={halted}  \
         delayed={delayed} avg_delay={avg:.1}m  conflicts={total} (H{high}/M{medium}/L{low})  \
         network_delay={net}m  signals={signals}",
        tick = view.tick,
        clock = view.clock.format("%H:%M:%S"),
        running = o.running,
        approaching = o.approaching,
        halted = o.halted,
        delayed = o.delayed,
        avg = o.avg_delay_minutes,
        total = o.conflicts_total,
        high = o.conflicts_high,
        medium = o.conflicts_medium,
        low = o.conflicts_low,
        net = o.network_delay_minutes,
    );
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            ticks,
            seed,
            content_dir,
            print_every,
            no_noise,
        } => run(ticks, seed, &content_dir, print_every, no_noise)?,
        Commands::Simulate {
            train,
            station,
            delay,
            action,
            seed,
            content_dir,
        } => {
            let scenario = Scenario {
                train_id: TrainId(train),
                station_id: StationId(station),
                delay_minutes: delay,
                action: action.into(),
            };
            simulate(&scenario, seed, &content_dir)?;
        }
    }
    Ok(())
}
