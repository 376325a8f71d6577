//! Draws a single dot as a small ring and replays it.
//!
//! The frame is compiled once: travel from the dot's centre to the ring,
//! the ring itself, then flyback, padded to the device buffer size.
//!
//! Run with: `cargo run --example dot -- --x 2048 --y 2048 --radius 84`

mod common;

use clap::Parser;
use common::OutputArgs;
use laser_motion::{
    point_budget_for, Color, Compiler, Pipeline, PipelineConfig, Position, Result, Shape,
    StaticFrame,
};

#[derive(Parser)]
#[command(about = "Stream a single dot to simulated laser DACs")]
struct Args {
    /// Dot centre, x (0-4095)
    #[arg(long, default_value_t = 2048.0)]
    x: f64,

    /// Dot centre, y (0-4095)
    #[arg(long, default_value_t = 2048.0)]
    y: f64,

    /// Ring radius in DAC units
    #[arg(long, default_value_t = 84.0)]
    radius: f64,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    common::init_logging();
    let args = Args::parse();
    let pps = args.output.pps;

    let shape = Shape::dot(Position::new(args.x, args.y), args.radius, Color::WHITE);
    let compiler = Compiler::default();
    let budget = point_budget_for(args.output.frame_time(), pps);

    let path = compiler.plan(&shape, budget, pps)?;
    println!(
        "Budget {} points: {} drawn, {} total before padding",
        budget,
        path.draw_len(),
        path.len()
    );
    let frame = compiler.compile(&shape, budget, pps)?;
    println!(
        "Frame: {} points, plays for {:?}",
        frame.len(),
        frame.duration()
    );

    let dac = args.output.open_dac();
    let handle = Pipeline::new(dac, PipelineConfig::default())?.start(StaticFrame(frame))?;
    let stats = common::run_for(handle, args.output.seconds)?;

    println!("Done.");
    common::print_stats(&stats);
    Ok(())
}
