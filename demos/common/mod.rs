//! Shared code for demos.

use clap::Args;
use laser_motion::{Dac, OutputStats, PipelineHandle, PointFormat, SimulatedDac};
use std::thread;
use std::time::Duration;

/// Output options shared by every demo.
#[derive(Args)]
pub struct OutputArgs {
    /// Output rate in points per second
    #[arg(long, default_value_t = 50_000)]
    pub pps: u32,

    /// Frame time used to size the point budget, in milliseconds
    #[arg(long, default_value_t = 15)]
    pub frame_ms: u64,

    /// Number of simulated devices
    #[arg(long, default_value_t = 1)]
    pub devices: usize,

    /// How long to stream, in seconds
    #[arg(long, default_value_t = 5)]
    pub seconds: u64,
}

impl OutputArgs {
    pub fn frame_time(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub fn open_dac(&self) -> SimulatedDac {
        SimulatedDac::new(self.devices, PointFormat::Standard)
    }
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Streams for `seconds`, then stops the pipeline and every device.
pub fn run_for<D: Dac>(
    handle: PipelineHandle<D>,
    seconds: u64,
) -> laser_motion::Result<OutputStats> {
    println!("Streaming for {}s...\n", seconds);
    thread::sleep(Duration::from_secs(seconds));

    let (mut dac, stats) = handle.stop()?;
    for device in 0..dac.device_count() {
        dac.stop(device)?;
    }
    Ok(stats)
}

pub fn print_stats(stats: &OutputStats) {
    println!("  Frames produced: {}", stats.frames_produced);
    println!("  Device writes:   {}", stats.frames_written);
    println!("  Frames skipped:  {}", stats.frames_skipped);
    println!("  Busy polls:      {}", stats.busy_polls);
    println!("  Device errors:   {}", stats.device_errors);
    println!("  Write errors:    {}", stats.write_errors);
}
