use clap::Parser;
use indicatif::ProgressBar;
use nalgebra::Vector2;

mod datatypes;
mod editor;
mod error;
mod exchange;
mod geometry;
mod post_processor;
mod tracer;
mod water;

use datatypes::{ForceBreakdown, Point};
use error::FloodgateError;

// range the authoring controls expose; the engine itself does not clamp
const WATER_LEVEL_MIN: f64 = 0.0;
const WATER_LEVEL_MAX: f64 = 5.0;

/// Traces a rod-and-rope structure and computes its wetted-region polygon
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Scenario file in the simulation-exchange json format
    scenario: String,

    /// Simulation result json to replay frame by frame
    #[arg(long)]
    results: Option<String>,

    /// Override the scenario's water level, in meters
    #[arg(long)]
    water_level: Option<f64>,

    /// Expand pending edge subdivisions before tracing
    #[arg(long)]
    apply_splits: bool,

    /// Randomize subdivision points instead of spacing them evenly
    #[arg(long)]
    random_splits: bool,

    /// Write the prepared structure back out as simulation input json
    #[arg(long)]
    export: Option<String>,

    /// Output csv path
    #[arg(long, default_value = "polygon.csv")]
    output: String,
}

fn run(args: &Args) -> Result<(), FloodgateError> {
    let (mut structure, mut water_level, settings) = exchange::load_scenario(&args.scenario)?;

    if let Some(level) = args.water_level {
        water_level = level;
    }
    if !(WATER_LEVEL_MIN..=WATER_LEVEL_MAX).contains(&water_level) {
        println!(
            "warning: water level {} is outside the usual {}-{} m range",
            water_level, WATER_LEVEL_MIN, WATER_LEVEL_MAX
        );
    }

    if args.apply_splits {
        let mut rng = rand::rng();
        structure = editor::apply_pending_splits(&structure, args.random_splits, &mut rng)?;
        println!(
            "info: structure has {} vertices and {} edges after subdivision",
            structure.vertices.len(),
            structure.edges.len()
        );
    }

    if let Some(path) = &args.export {
        let data = exchange::to_exchange(&structure, water_level, &settings);
        if let Err(err) = std::fs::write(path, data.dump()) {
            return Err(FloodgateError::Output(format!(
                "Failed to write {path}: {err}"
            )));
        }
        println!("info: exported simulation input to {}", path);
    }

    let mut polygons: Vec<Vec<Point>> = Vec::new();

    match &args.results {
        Some(results_path) => {
            let batch = exchange::load_result_batch(results_path)?;
            let buoyant_radii = structure.buoyant_radii();

            if !batch.forces.is_empty() {
                let peak = |component: fn(&ForceBreakdown) -> &Vector2<f64>| {
                    batch
                        .forces
                        .iter()
                        .flatten()
                        .map(|force| component(force).norm())
                        .fold(0.0_f64, f64::max)
                };
                println!(
                    "info: peak forces: total {:.3}, water pressure {:.3}, tensor {:.3}, gravity {:.3}, buoyancy {:.3}",
                    peak(|force| &force.total),
                    peak(|force| &force.water_pressure),
                    peak(|force| &force.tensor),
                    peak(|force| &force.gravity),
                    peak(|force| &force.buoyancy)
                );
            }

            println!(
                "info: replaying {} simulation steps...",
                batch.vertex_positions.len()
            );
            let bar = ProgressBar::new(batch.vertex_positions.len() as u64);

            for (step, positions) in batch.vertex_positions.iter().enumerate() {
                bar.inc(1);

                let level = batch.water_level.get(step).copied().unwrap_or(water_level);
                polygons.push(water::run_with_positions(
                    positions,
                    &buoyant_radii,
                    &structure.edges,
                    level,
                ));
            }
            bar.finish();
        }
        None => {
            polygons.push(water::run(&structure, water_level));
        }
    }

    post_processor::csv_output(&polygons, &args.output)?;

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(err) = run(&args) {
        println!("{}", err);
        std::process::exit(1)
    }
}
