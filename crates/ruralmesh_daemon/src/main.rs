mod config;
mod notify;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing::info;

use crate::config::{mesh_data_dir, Config};
use crate::notify::{LogNotifier, NotificationScheduler, Notifier, WebhookNotifier};
use ruralmesh_sim::{FeatureRecorder, RunLog, SessionPaths, SimSession};

#[derive(Parser)]
#[command(name = "ruralmesh")]
#[command(about = "Rural mesh network simulator with failure prediction")]
struct Cli {
    /// Data directory (defaults to ~/.ruralmesh)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance the simulation by N cycles
    Run {
        /// Number of cycles to run
        #[arg(long, default_value_t = 1)]
        cycles: u64,
        /// RNG seed override for a reproducible trajectory
        #[arg(long)]
        seed: Option<u64>,
        /// Attach synthetic temperature readings
        #[arg(long)]
        sensors: bool,
        /// Print each cycle report as JSON instead of the text summary
        #[arg(long)]
        json: bool,
    },
    /// Report dataset, run-log and model state
    Status,
    /// Delete the generated dataset, run log and model artifact
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(mesh_data_dir);
    let config = Config::load_from(&data_dir)?;
    let paths = SessionPaths::new(&data_dir);

    match cli.command {
        Commands::Run {
            cycles,
            seed,
            sensors,
            json,
        } => run(&paths, &config, cycles, seed, sensors, json).await,
        Commands::Status => status(&paths),
        Commands::Reset => reset(&paths),
    }
}

async fn run(
    paths: &SessionPaths,
    config: &Config,
    cycles: u64,
    seed: Option<u64>,
    sensors: bool,
    json: bool,
) -> Result<()> {
    let seed = seed.or(config.simulation.seed);
    let sensors = sensors || config.simulation.sensors;
    let mut session = SimSession::new(paths, seed)?;

    let mut scheduler = if config.notification.enabled {
        let notifier: Arc<dyn Notifier> = match &config.notification.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())?),
            None => Arc::new(LogNotifier),
        };
        Some(NotificationScheduler::new(
            notifier,
            Duration::from_secs(config.notification.delay_secs),
        ))
    } else {
        None
    };

    for _ in 0..cycles {
        if sensors {
            attach_temperature_readings(&mut session);
        }

        let report = session.run_cycle()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}\n", report.summary_text());
        }

        if let Some(scheduler) = scheduler.as_mut() {
            if session.try_claim_notification() {
                scheduler.schedule(report.summary_text());
            }
        }
    }

    // Orderly shutdown: let the pending summaries go out. Aborting the
    // process instead (ctrl-c) cancels them via the scheduler's Drop.
    if let Some(mut scheduler) = scheduler {
        scheduler.drain().await;
    }
    Ok(())
}

/// Synthetic village temperature: a slow swing plus sensor jitter. Drawn
/// from `thread_rng`, never from the session RNG, so a seeded status
/// trajectory stays reproducible with sensors on or off.
fn attach_temperature_readings(session: &mut SimSession) {
    let cycle = session.cycle() + 1;
    let mut rng = rand::thread_rng();
    let names: Vec<String> = session.nodes().iter().map(|n| n.name.clone()).collect();
    for name in names {
        let value = 25.0 + (cycle as f64 * 0.1).sin() * 5.0 + rng.gen_range(-0.5..0.5);
        session.record_reading(&name, "temperatura", (value * 100.0).round() / 100.0);
    }
}

fn status(paths: &SessionPaths) -> Result<()> {
    let dataset_rows = FeatureRecorder::new(paths.dataset()).row_count()?;
    let run_log_rows = RunLog::new(paths.run_log()).data_row_count()?;
    let model = if paths.model().exists() {
        "present"
    } else {
        "absent"
    };

    info!(
        data_dir = %paths.data_dir().display(),
        dataset_rows,
        run_log_rows,
        model,
        "Simulation data"
    );
    Ok(())
}

fn reset(paths: &SessionPaths) -> Result<()> {
    for path in [paths.dataset(), paths.run_log(), paths.model()] {
        if path.exists() {
            std::fs::remove_file(&path)?;
            info!(path = %path.display(), "Removed");
        }
    }
    Ok(())
}
