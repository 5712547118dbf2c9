mod view_app;

use clap::{Parser, Subcommand};
use log::info;
use orbitlab_core::diagnostics::{format_config_error, format_parse_error};
use orbitlab_core::{
    default_table, parse_scene, GravityField, Scene, SceneError, SimulationConfig,
    SimulationDriver,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orbitlab")]
#[command(about = "Orbitlab - compare numerical integrators on a central-force orbit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Advance a scene headlessly and report where every slot ended up
    Run {
        /// Scene file (built-in comparison table if omitted)
        scene: Option<PathBuf>,
        /// Host frames to advance
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Simulation repetitions per host frame
        #[arg(long, default_value_t = 1)]
        warp: i32,
    },
    /// Open the interactive viewer
    View {
        /// Scene file, reloaded whenever it changes on disk
        scene: Option<PathBuf>,
        /// Initial time warp
        #[arg(long, default_value_t = 1)]
        warp: i32,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scene,
            frames,
            warp,
        } => run_headless(scene.as_deref(), frames, warp),
        Commands::View { scene, warp } => view_app::run(scene, warp),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Load a scene file, or the built-in comparison when no path is given
pub fn load_scene(path: Option<&Path>) -> Result<Scene, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(Scene {
            gravity: GravityField::default(),
            config: SimulationConfig::default(),
            slots: default_table(),
        });
    };

    let source = fs::read_to_string(path)?;
    match parse_scene(&source) {
        Ok(scene) => {
            info!("loaded {} slots from {}", scene.slots.len(), path.display());
            Ok(scene)
        }
        Err(SceneError::Parse(e)) => Err(format_parse_error(&e, &source).into()),
        Err(SceneError::Config(e)) => Err(format_config_error(&e).into()),
    }
}

fn run_headless(
    scene: Option<&Path>,
    frames: u32,
    warp: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = load_scene(scene)?;
    let gravity = scene.gravity;
    let mut driver = SimulationDriver::new(gravity, scene.config, scene.slots)?;
    driver.set_warp(warp);

    let e0: Vec<f32> = driver
        .particles()
        .iter()
        .map(|p| gravity.specific_energy(p))
        .collect();

    let mut snapshots = 0u64;
    for _ in 0..frames {
        snapshots += u64::from(driver.advance_frame(&mut ()));
    }
    info!("{} frames, {} snapshots", frames, snapshots);

    println!(
        "{:>4}  {:<20} {:>6}  {:>26}  {:>9}  {:>12}",
        "slot", "integrator", "steps", "position", "elapsed", "energy drift"
    );
    for (i, (slot, particle)) in driver.slots().iter().zip(driver.particles()).enumerate() {
        let drift = (gravity.specific_energy(particle) - e0[i]) / e0[i].abs();
        println!(
            "{:>4}  {:<20} {:>6}  ({:>11.3}, {:>11.3})  {:>8.3}s  {:>+12.3e}",
            i,
            slot.integrator.name(),
            slot.sub_steps,
            particle.pos.x,
            particle.pos.y,
            driver.elapsed(i).unwrap_or_default(),
            drift
        );
    }

    Ok(())
}
