//! Segment generators: blanked travel, dwell holds and lit strokes.
//!
//! Every generator is a pure function of its inputs and the output rate.
//! Durations convert to sample counts with [`samples_for_duration`], which
//! rounds up and never returns fewer than one sample.

use std::time::Duration;

pub mod dwell;
pub mod line;
pub mod travel;

pub use dwell::plan_dwell;
pub use line::{plan_arc, plan_line};
pub use travel::{plan_travel, TravelTiming};

/// Number of samples needed to cover `duration` at `pps`, rounded up, minimum 1.
///
/// Computed in integer nanoseconds so that exact products such as
/// 150 µs at 50 kpps (7.5 samples) always round the same way.
pub fn samples_for_duration(duration: Duration, pps: u32) -> usize {
    let numerator = duration.as_nanos() * pps as u128;
    let samples = (numerator + 999_999_999) / 1_000_000_000;
    (samples as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_for_duration_rounds_up() {
        assert_eq!(samples_for_duration(Duration::from_micros(150), 50_000), 8);
        assert_eq!(samples_for_duration(Duration::from_micros(1000), 30_000), 30);
        assert_eq!(samples_for_duration(Duration::from_millis(15), 50_000), 750);
    }

    #[test]
    fn test_samples_for_duration_minimum_one() {
        assert_eq!(samples_for_duration(Duration::ZERO, 50_000), 1);
        assert_eq!(samples_for_duration(Duration::from_nanos(1), 1), 1);
    }
}
