//! Draws a triangle with corner dwells and prints its segment layout.
//!
//! Run with: `cargo run --example pattern -- --size 1200`

mod common;

use clap::Parser;
use common::OutputArgs;
use laser_motion::{
    point_budget_for, Color, CompileConfig, Compiler, Pipeline, PipelineConfig, Position, Result,
    Shape, StaticFrame,
};

#[derive(Parser)]
#[command(about = "Stream a triangle to simulated laser DACs")]
struct Args {
    /// Distance from the centre to each corner, in DAC units
    #[arg(long, default_value_t = 1200.0)]
    size: f64,

    /// Corner dwell in microseconds
    #[arg(long, default_value_t = 200)]
    dwell_us: u64,

    #[command(flatten)]
    output: OutputArgs,
}

fn triangle(size: f64) -> Shape {
    let c = Position::new(2048.0, 2048.0);
    let corners = (0..3)
        .map(|i| {
            let a = std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::TAU / 3.0;
            Position::new(c.x + size * a.cos(), c.y + size * a.sin())
        })
        .collect();
    Shape::polygon(corners, Color::rgb8(0, 255, 0, 255))
}

fn main() -> Result<()> {
    common::init_logging();
    let args = Args::parse();
    let pps = args.output.pps;

    let config = CompileConfig::default()
        .with_corner_dwell(std::time::Duration::from_micros(args.dwell_us));
    let compiler = Compiler::new(config)?;
    let shape = triangle(args.size);

    // Triangles need a longer frame than a dot; never go below what fits
    let budget = point_budget_for(args.output.frame_time(), pps)
        .max(compiler.min_point_budget(&shape, pps)?);

    let path = compiler.plan(&shape, budget, pps)?;
    println!("Budget {} points:", budget);
    for segment in path.segments() {
        println!("  {:?}: {} points", segment.kind, segment.len());
    }

    let frame = compiler.compile(&shape, budget, pps)?;
    let dac = args.output.open_dac();
    let handle = Pipeline::new(dac, PipelineConfig::default())?.start(StaticFrame(frame))?;
    let stats = common::run_for(handle, args.output.seconds)?;

    println!("Done.");
    common::print_stats(&stats);
    Ok(())
}
