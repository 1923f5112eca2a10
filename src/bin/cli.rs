//! Skyshard CLI - scaffold, run and probe simulations headlessly

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nalgebra::Vector3;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use skyshard::config::{SimConfig, CONFIG_FILE_NAME};
use skyshard::game::constants::physics as physics_consts;
use skyshard::game::{ScriptedInput, Simulation};

#[derive(Parser)]
#[command(name = "skyshard")]
#[command(about = "Local-gravity player simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter sim.toml
    Init {
        /// Directory to write into (created if missing)
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Run a level headlessly, replaying its [[script]] input
    Run {
        /// Config file (default: ./sim.toml, or built-in defaults when absent)
        #[arg(short, long, env = "SKYSHARD_CONFIG")]
        config: Option<PathBuf>,
        /// Frames to simulate
        #[arg(short, long, default_value_t = 600)]
        frames: u64,
        /// Raw frame delta in seconds, clamped like a real frame
        #[arg(long, default_value_t = physics_consts::TIMESTEP)]
        dt: f32,
        /// Print a snapshot every N frames (the last frame is always printed)
        #[arg(short, long, default_value_t = 60)]
        every: u64,
    },
    /// Print gravity and up at a point
    #[command(allow_negative_numbers = true)]
    Probe {
        #[arg(short, long, env = "SKYSHARD_CONFIG")]
        config: Option<PathBuf>,
        x: f32,
        y: f32,
        z: f32,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { dir } => init_config(&dir),
        Commands::Run {
            config,
            frames,
            dt,
            every,
        } => run_sim(config.as_deref(), frames, dt, every),
        Commands::Probe { config, x, y, z } => probe(config.as_deref(), Vector3::new(x, y, z)),
    }
}

fn init_tracing() -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("skyshard=info".parse()?))
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => {
            let local = Path::new(".").join(CONFIG_FILE_NAME);
            if local.exists() {
                SimConfig::from_file(&local).context("loading ./sim.toml")
            } else {
                info!("no {} found, using defaults", CONFIG_FILE_NAME);
                Ok(SimConfig::default())
            }
        }
    }
}

// =============================================================================
// Init Command
// =============================================================================

fn init_config(dir: &Path) -> Result<()> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let body = SimConfig::sample().to_toml_string()?;
    let content = format!(
        "# Skyshard level\n# Run with: skyshard run --config {}\n\n{}",
        path.display(),
        body
    );
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;

    println!("Created {}", path.display());
    Ok(())
}

// =============================================================================
// Run Command
// =============================================================================

fn run_sim(config: Option<&Path>, frames: u64, dt: f32, every: u64) -> Result<()> {
    let config = load_config(config)?;
    let mut sim = Simulation::from_config(&config).context("building simulation")?;
    let mut input = ScriptedInput::new(config.script.iter().copied());
    let every = every.max(1);

    info!(frames, dt, "running");

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut resets = 0u32;

    for frame in 1..=frames {
        let report = sim.frame_from(&mut input, dt);
        if report.bounds.was_reset() {
            resets += 1;
        }
        if frame % every == 0 || frame == frames {
            serde_json::to_writer(&mut out, &sim.snapshot())?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    let snapshot = sim.snapshot();
    info!(
        elapsed = snapshot.elapsed,
        shards = snapshot.shards_collected,
        resets,
        "run finished"
    );
    Ok(())
}

// =============================================================================
// Probe Command
// =============================================================================

#[derive(Serialize)]
struct ProbeResult {
    position: [f32; 3],
    acceleration: [f32; 3],
    up: [f32; 3],
    /// Index of the governing well in registration order
    well: Option<usize>,
}

fn probe(config: Option<&Path>, position: Vector3<f32>) -> Result<()> {
    let config = load_config(config)?;
    let field = config.gravity.build_field()?;

    let well = field.wells().iter().position(|w| w.contains(&position));
    let result = ProbeResult {
        position: position.into(),
        acceleration: field.query_acceleration(&position).into(),
        up: field.up_at(&position).into(),
        well,
    };
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
