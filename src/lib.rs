//! Motion planning and realtime frame streaming for galvo laser DACs.
//!
//! This crate turns simple shapes into sample buffers that a galvanometer
//! scanner can trace cleanly, and streams those buffers to a DAC from a
//! dedicated output thread without stalling it.
//!
//! # Coordinate System
//!
//! Samples use the native 12-bit DAC space:
//! - X, Y: 0 to 4095 (`GALVO_MAX`), centre at 2048
//! - Colors: 0-65535 for R, G, B and intensity (downscaled per point format)
//!
//! Planning happens in `f64` positions; samples are rounded and clamped when
//! they are emitted. Shape inputs outside the addressable range are rejected.
//!
//! # Frame Anatomy
//!
//! A compiled frame is a closed loop:
//!
//! 1. blanked travel from the shape's rest position to where drawing starts,
//!    eased with smoothstep and followed by a settle hold
//! 2. the lit feature (ring, line or polygon edges with corner dwells)
//! 3. blanked flyback to the rest position
//!
//! The feature and its lead-in share `feature_ratio` (0.8) of the point
//! budget; the rest is reserved for the flyback. The finished loop is
//! replicated end-to-end until it holds at least `target_buffer_points`
//! (2000) samples.
//!
//! # Realtime Output
//!
//! [`Pipeline`] runs a producer that renders frames at a fixed rate and an
//! output thread that always writes the freshest frame to every ready
//! device, never more often than `replay_ratio` (0.9) of a frame's play
//! time. See the [`pipeline`] module for details.
//!
//! ```no_run
//! use laser_motion::{
//!     Color, Compiler, PipelineConfig, Pipeline, PointFormat, Position, Shape,
//!     ShapeAnimation, SimulatedDac,
//! };
//!
//! # fn main() -> laser_motion::Result<()> {
//! let dac = SimulatedDac::new(1, PointFormat::Standard);
//! let source = ShapeAnimation::new(Compiler::default(), 750, 50_000, |state| {
//!     let x = 1024.0 + (state.tick % 60) as f64 * 32.0;
//!     Shape::dot(Position::new(x, 2048.0), 84.0, Color::WHITE)
//! });
//! let handle = Pipeline::new(dac, PipelineConfig::default())?.start(source)?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! let (_dac, stats) = handle.stop()?;
//! println!("{} frames written", stats.frames_written);
//! # Ok(())
//! # }
//! ```

pub mod compile;
pub mod dac;
pub mod ease;
mod error;
pub mod layout;
pub mod path;
pub mod pipeline;
pub mod sim;
pub mod types;

// Error types
pub use error::{Error, Result};

// Types
pub use types::{
    Color, Frame, Position, Sample, Segment, SegmentKind, WriteFrameFlags, GALVO_FULL_SCALE,
    GALVO_MAX,
};

// Planning
pub use compile::{
    compile, is_addressable, pad_to_length, point_budget_for, CompileConfig, Compiler, Path, Shape,
};
pub use ease::{lerp, smoothstep, Easing};
pub use path::{plan_arc, plan_dwell, plan_line, plan_travel, samples_for_duration, TravelTiming};

// Output
pub use dac::{Dac, DeviceStatus};
pub use layout::{encode_samples, write_samples, PointFormat};
pub use pipeline::{
    AnimationState, CancellationToken, FrameSource, OutputStats, Pipeline, PipelineConfig,
    PipelineHandle, PipelineState, ShapeAnimation, StaticFrame,
};
pub use sim::{SimulatedDac, WriteLog, WriteRecord};
