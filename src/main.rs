use gravity_sim::ensemble::Ensemble;
use gravity_sim::initial_condition::{InitialCondition, Sphere, UniformLattice};
use gravity_sim::io::{write_positions, write_results, TableSource};
use gravity_sim::{NBodySimulation, SimulationParameters, Vec3};

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use structopt::StructOpt;

/// Frames recorded by `--snapshot-dir` when no interval is given.
const MAX_DEFAULT_SNAPSHOTS: usize = 100;

#[derive(StructOpt, Debug)]
#[structopt(name = "gravity_sim")]
struct Opt {
    /// Log more (-v for debug, -vv for trace)
    #[structopt(short, long, parse(from_occurrences), global = true)]
    verbose: u8,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Simulate matter and dark matter particles read from CSV tables
    Run {
        #[structopt(short, long)]
        matter: PathBuf,
        /// Leave out to simulate ordinary matter only
        #[structopt(short, long)]
        dark_matter: Option<PathBuf>,
        /// JSON file with simulation parameters. Flags below override it.
        #[structopt(short, long)]
        settings: Option<PathBuf>,
        #[structopt(short, long, default_value = "simulation_results.csv")]
        output: PathBuf,
        /// Write each recorded snapshot to `<dir>/<frame>.csv`. Every snapshot is a full copy
        /// of the ensemble held in memory until the run completes, so without
        /// `--snapshot-interval` at most 100 frames are recorded.
        #[structopt(long)]
        snapshot_dir: Option<PathBuf>,
        /// Record a snapshot every this many steps
        #[structopt(long)]
        snapshot_interval: Option<usize>,
        #[structopt(long)]
        steps: Option<usize>,
        #[structopt(long)]
        dt: Option<f64>,
        #[structopt(long)]
        block_size: Option<usize>,
        #[structopt(long)]
        no_population_column: bool,
    },
    /// Write a table of randomly placed particles
    Generate {
        #[structopt(short, long)]
        output: PathBuf,
        #[structopt(short = "n", long, default_value = "1000")]
        count: usize,
        /// Side length of the cube the particles are placed in
        #[structopt(long, default_value = "100")]
        size: usize,
        /// Place particles in a ball of this radius at the center of the cube instead
        #[structopt(long)]
        sphere_radius: Option<f64>,
        #[structopt(long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> eyre::Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match opt.command {
        Command::Run {
            matter,
            dark_matter,
            settings,
            output,
            snapshot_dir,
            snapshot_interval,
            steps,
            dt,
            block_size,
            no_population_column,
        } => {
            let mut params = match settings {
                Some(path) => load_settings(&path)?,
                None => SimulationParameters::default(),
            };
            if let Some(steps) = steps {
                params.num_steps = steps;
            }
            if let Some(dt) = dt {
                params.delta_time = dt;
            }
            if let Some(block_size) = block_size {
                params.block_size = block_size;
            }
            if snapshot_interval.is_some() {
                params.snapshot_interval = snapshot_interval;
            }
            if snapshot_dir.is_some() && params.snapshot_interval.is_none() {
                params.snapshot_interval =
                    Some(params.interval_for_frames(MAX_DEFAULT_SNAPSHOTS));
            }

            let ensemble = match dark_matter {
                Some(dark_matter) if params.include_dark_matter => Ensemble::build(
                    TableSource::open(&matter)?,
                    TableSource::open(&dark_matter)?,
                    params.dark_matter_factor,
                )?,
                _ => Ensemble::build_matter_only(TableSource::open(&matter)?)?,
            };

            let outcome = NBodySimulation::new(ensemble, params)?.run()?;

            tracing::info!("Saving results to {:?}", output);
            let file = std::fs::File::create(&output)
                .wrap_err_with(|| format!("Failed to create output file: {:?}", output))?;
            write_results(&outcome.ensemble, file, !no_population_column)?;

            if let Some(dir) = snapshot_dir {
                std::fs::create_dir_all(&dir)
                    .wrap_err_with(|| format!("Failed to create snapshot directory: {:?}", dir))?;

                for (frame, snapshot) in outcome.snapshots.iter().enumerate() {
                    let mut path = dir.clone();
                    path.push(format!("{:03}.csv", frame));
                    let file = std::fs::File::create(&path)?;
                    write_results(&snapshot.ensemble, file, !no_population_column)?;
                }
                tracing::info!(
                    "Wrote {} snapshots to {:?}",
                    outcome.snapshots.len(),
                    dir
                );
            }
        }
        Command::Generate {
            output,
            count,
            size,
            sphere_radius,
            seed,
        } => {
            if size == 0 {
                return Err(eyre::eyre!("Size must be at least 1."));
            }

            let positions = match sphere_radius {
                Some(radius) => Sphere {
                    num_particles: count,
                    center: Vec3::from_element(size as f64 / 2.),
                    radius,
                    seed,
                }
                .positions(),
                None => UniformLattice {
                    num_particles: count,
                    size,
                    seed,
                }
                .positions(),
            };

            let file = std::fs::File::create(&output)
                .wrap_err_with(|| format!("Failed to create output file: {:?}", output))?;
            write_positions(&positions, file)?;
            tracing::info!("Wrote {} particles to {:?}", positions.len(), output);
        }
    }

    Ok(())
}

fn load_settings(path: &Path) -> eyre::Result<SimulationParameters> {
    std::fs::read(path)
        .wrap_err_with(|| format!("Failed to read JSON settings file: {:?}", path))
        .and_then(|json| {
            serde_json::from_slice(&json).wrap_err("Serde failed to deserialize JSON.")
        })
}
