//! Command-line runner for the Antix puck-foraging simulation.

mod telemetry;

use anyhow::{Context, Result};
use antix_controllers::ControllerKind;
use antix_core::{RunConfig, RunSummary, SimConfig, TrigMode};
use antix_world::{Simulation, SnapshotHandle, World};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "antix-sim",
    version,
    about = "Robots foraging for pucks on a toroidal world"
)]
struct Cli {
    /// JSON configuration file; command-line options override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of pucks.
    #[arg(short = 'a', long)]
    pucks: Option<usize>,

    /// Robots per home.
    #[arg(short = 'p', long)]
    population: Option<usize>,

    /// Number of homes.
    #[arg(long)]
    homes: Option<usize>,

    /// Side length of the world.
    #[arg(short = 's', long)]
    world_size: Option<f64>,

    /// Sensor field of view, in degrees.
    #[arg(short = 'f', long)]
    fov: Option<f64>,

    /// Sensor range. Also sets the pickup range to a fifth of it unless
    /// --pickup-range is given.
    #[arg(short = 'r', long)]
    range: Option<f64>,

    #[arg(long)]
    pickup_range: Option<f64>,

    /// Ticks a delivered puck must rest before it scores.
    #[arg(long)]
    score_time: Option<u64>,

    /// Stop after this many ticks; 0 runs until interrupted.
    #[arg(short = 'u', long)]
    updates: Option<u64>,

    /// Milliseconds to sleep between ticks.
    #[arg(short = 'z', long)]
    sleep_ms: Option<u64>,

    /// Milliseconds between score reports.
    #[arg(short = 'g', long)]
    report_ms: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Use approximate trigonometry.
    #[arg(long)]
    fast_trig: bool,

    /// Refresh sensors on the rayon thread pool.
    #[arg(long)]
    parallel_sensing: bool,

    /// Robot behaviour: forager or swarmer.
    #[arg(long, default_value_t = ControllerKind::Forager)]
    controller: ControllerKind,

    /// Reverse the swarmer's avoidance turn.
    #[arg(short = 'i', long)]
    invert: bool,

    /// Write the run summary as JSON to this path.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Log JSON lines instead of text.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Load the config file (or defaults) and apply command-line overrides.
    fn sim_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => SimConfig::default(),
        };

        if let Some(pucks) = self.pucks {
            config.world.puck_count = pucks;
        }
        if let Some(population) = self.population {
            config.world.home_population = population;
        }
        if let Some(homes) = self.homes {
            config.world.home_count = homes;
        }
        if let Some(size) = self.world_size {
            config.world.world_size = size;
        }
        if let Some(fov) = self.fov {
            config.sensor.fov = fov.to_radians();
        }
        if let Some(range) = self.range {
            config.sensor.range = range;
            config.sensor.pickup_range = range / 5.0;
        }
        if let Some(pickup_range) = self.pickup_range {
            config.sensor.pickup_range = pickup_range;
        }
        if let Some(score_time) = self.score_time {
            config.economy.score_time = score_time;
        }
        if let Some(updates) = self.updates {
            config.run.updates_max = updates;
        }
        if let Some(sleep_ms) = self.sleep_ms {
            config.run.sleep_msec = sleep_ms;
        }
        if let Some(report_ms) = self.report_ms {
            config.run.report_interval_ms = report_ms;
        }
        if let Some(seed) = self.seed {
            config.run.seed = seed;
        }
        if self.fast_trig {
            config.sensor.trig = TrigMode::Approximate;
        }
        if self.parallel_sensing {
            config.run.parallel_sensing = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_json)?;

    let config = cli.sim_config()?;
    info!(
        world_size = config.world.world_size,
        homes = config.world.home_count,
        robots_per_home = config.world.home_population,
        pucks = config.world.puck_count,
        range = config.sensor.range,
        fov_degrees = config.sensor.fov.to_degrees(),
        controller = %cli.controller,
        "Starting Antix simulation"
    );

    let run = config.run.clone();
    let world = World::new(config)?;
    let (kind, invert) = (cli.controller, cli.invert);
    let mut sim = Simulation::new(world, |robot| kind.build(robot.id(), run.seed, invert));

    let snapshots = SnapshotHandle::new();
    snapshots.publish(sim.snapshot());

    let reporter = tokio::spawn(report_scores(
        snapshots.clone(),
        Duration::from_millis(run.report_interval_ms.max(1)),
    ));
    let pause_requests = spawn_pause_listener();

    let interrupted = tokio::select! {
        _ = run_loop(&mut sim, &snapshots, &run, pause_requests) => false,
        _ = shutdown_signal() => true,
    };
    reporter.abort();

    let summary = sim.summary();
    log_summary(&summary, interrupted);

    if let Some(path) = &cli.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        info!(path = %path.display(), "Summary written");
    }

    Ok(())
}

/// Step the simulation at the configured pace until the tick ceiling,
/// publishing a snapshot after every tick.
async fn run_loop(
    sim: &mut Simulation,
    snapshots: &SnapshotHandle,
    run: &RunConfig,
    mut pause_requests: mpsc::UnboundedReceiver<()>,
) {
    let mut pacer = (run.sleep_msec > 0).then(|| {
        let mut pacer = interval(Duration::from_millis(run.sleep_msec));
        pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        pacer
    });

    while !sim.is_finished() {
        if sim.is_paused() {
            if pause_requests.recv().await.is_none() {
                break;
            }
            sim.toggle_pause();
            snapshots.publish(sim.snapshot());
            continue;
        }

        tokio::select! {
            Some(()) = pause_requests.recv() => {
                sim.toggle_pause();
                snapshots.publish(sim.snapshot());
            }
            _ = pace(&mut pacer) => {
                if sim.step() {
                    snapshots.publish(sim.snapshot());
                }
            }
        }
    }
}

async fn pace(pacer: &mut Option<Interval>) {
    match pacer {
        Some(pacer) => {
            pacer.tick().await;
        }
        None => tokio::task::yield_now().await,
    }
}

/// Log the latest published scores at a fixed wall-clock interval.
async fn report_scores(snapshots: SnapshotHandle, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let (tick, paused, scores) = snapshots.with_latest(|s| (s.tick, s.paused, s.scores()));
        info!(event = "score_report", tick, paused, scores = ?scores, "Scores");
    }
}

/// Each line reading `p` on stdin toggles pause. Runs on its own thread
/// so a blocked read never holds up runtime shutdown.
fn spawn_pause_listener() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("p") && tx.send(()).is_err() {
                break;
            }
        }
        debug!("Pause listener finished");
    });
    rx
}

fn log_summary(summary: &RunSummary, interrupted: bool) {
    if interrupted {
        warn!(tick = summary.total_ticks, "Run interrupted");
    }
    for home in &summary.homes {
        info!(
            home = %home.home,
            score = home.score,
            deliveries = home.deliveries,
            pucks_lost = home.pucks_lost,
            conversion_rate = format!("{:.2}", home.conversion_rate()),
            "Home result"
        );
    }
    info!(
        event = "run_summary",
        total_ticks = summary.total_ticks,
        total_score = summary.total_score(),
        leader = ?summary.leader().map(|h| h.home),
        pickups = summary.pickups,
        drops = summary.drops,
        relocations = summary.relocations,
        "Run complete"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "antix-sim", "-a", "50", "-p", "8", "--homes", "3", "-r", "0.2", "-f", "180",
            "-u", "100", "-z", "0", "--fast-trig", "--controller", "swarmer",
        ])
        .unwrap();
        let config = cli.sim_config().unwrap();

        assert_eq!(config.world.puck_count, 50);
        assert_eq!(config.world.home_population, 8);
        assert_eq!(config.world.home_count, 3);
        assert!((config.sensor.pickup_range - 0.04).abs() < 1e-12);
        assert!((config.sensor.fov - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(config.run.updates_max, 100);
        assert_eq!(config.run.sleep_msec, 0);
        assert_eq!(config.sensor.trig, TrigMode::Approximate);
        assert_eq!(cli.controller, ControllerKind::Swarmer);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let cli = Cli::try_parse_from(["antix-sim", "--pickup-range", "0.5"]).unwrap();
        assert!(cli.sim_config().is_err());
        assert!(Cli::try_parse_from(["antix-sim", "--controller", "flocker"]).is_err());
    }
}
