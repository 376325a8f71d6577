//! Renders a scanning vertical line on the producer thread while the output
//! thread streams the freshest frame.
//!
//! Run with: `cargo run --example concurrent -- --fps 30 --period 4`

mod common;

use clap::Parser;
use common::OutputArgs;
use laser_motion::{
    point_budget_for, Color, Compiler, Pipeline, PipelineConfig, Position, Result, Shape,
    ShapeAnimation,
};

#[derive(Parser)]
#[command(about = "Stream an animated scanning line to simulated laser DACs")]
struct Args {
    /// Frames rendered per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Seconds for one sweep from left to right
    #[arg(long, default_value_t = 4.0)]
    period: f64,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    common::init_logging();
    let args = Args::parse();
    let pps = args.output.pps;
    let period = args.period.max(0.1);

    let compiler = Compiler::default();
    let budget = point_budget_for(args.output.frame_time(), pps);

    let source = ShapeAnimation::new(compiler, budget, pps, move |state| {
        let phase = (state.elapsed.as_secs_f64() / period).fract();
        let x = 512.0 + phase * 3072.0;
        Shape::line(
            Position::new(x, 1024.0),
            Position::new(x, 3072.0),
            Color::rgb8(255, 0, 0, 255),
        )
    });

    let config = PipelineConfig::default().with_frame_rate(args.fps);
    let dac = args.output.open_dac();
    let handle = Pipeline::new(dac, config)?.start(source)?;
    let stats = common::run_for(handle, args.output.seconds)?;

    println!("Done.");
    common::print_stats(&stats);
    Ok(())
}
