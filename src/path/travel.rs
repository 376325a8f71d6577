//! Blanked travel moves between positions.
//!
//! Galvo step response scales with angular displacement, so the travel
//! length is interpolated between a small-angle and a large-angle settling
//! time according to the normalized jump distance.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::samples_for_duration;
use crate::ease::Easing;
use crate::error::{Error, Result};
use crate::types::{Position, Sample, Segment, SegmentKind, GALVO_FULL_SCALE};

/// Settling model for blanked travel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TravelTiming {
    /// Settling time for sub-resolution moves (0.1° step).
    pub small_angle: Duration,
    /// Settling time for full-range jumps (40° optical step).
    pub large_angle: Duration,
    /// Blanked hold at the destination before the laser is re-enabled.
    pub settle: Duration,
    /// Progress curve for the move itself.
    pub easing: Easing,
}

impl Default for TravelTiming {
    fn default() -> Self {
        Self {
            small_angle: Duration::from_micros(250),
            large_angle: Duration::from_micros(1000),
            settle: Duration::from_micros(150),
            easing: Easing::SmoothStep,
        }
    }
}

impl TravelTiming {
    /// Set the small/large angle settling times (builder pattern).
    pub fn with_step_response(mut self, small_angle: Duration, large_angle: Duration) -> Self {
        self.small_angle = small_angle;
        self.large_angle = large_angle;
        self
    }

    /// Set the destination settle time (builder pattern).
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Set the travel easing (builder pattern).
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Rejects a large-angle time shorter than the small-angle time.
    pub fn validate(&self) -> Result<()> {
        if self.large_angle < self.small_angle {
            return Err(Error::invalid_config(format!(
                "large-angle settling ({:?}) is shorter than small-angle settling ({:?})",
                self.large_angle, self.small_angle
            )));
        }
        Ok(())
    }

    /// Settling time for a jump of `distance` galvo units.
    pub fn required_duration(&self, distance: f64) -> Duration {
        let ratio = (distance / GALVO_FULL_SCALE).clamp(0.0, 1.0);
        // NaN distance: assume the worst case
        let ratio = if ratio.is_nan() { 1.0 } else { ratio };
        let span = self.large_angle.saturating_sub(self.small_angle);
        self.small_angle + span.mul_f64(ratio)
    }

    /// Sample count of [`plan`](Self::plan) without building the segment.
    pub fn travel_len(&self, start: Position, end: Position, pps: u32) -> usize {
        let moving = samples_for_duration(self.required_duration(start.distance(end)), pps);
        moving + samples_for_duration(self.settle, pps)
    }

    /// Blanked move from `start` to `end` followed by the settle hold.
    ///
    /// The move does not repeat `start`: sample `k` of `n` sits at
    /// `easing(k / n)`, so the last moving sample is exactly `end`.
    pub fn plan(&self, start: Position, end: Position, pps: u32) -> Segment {
        let moving = samples_for_duration(self.required_duration(start.distance(end)), pps);
        let settle = samples_for_duration(self.settle, pps);

        let mut samples = Vec::with_capacity(moving + settle);
        for k in 1..=moving {
            let alpha = self.easing.apply(k as f64 / moving as f64);
            samples.push(Sample::blanked(start.lerp(end, alpha)));
        }

        let rest = Sample::blanked(end);
        samples.resize(moving + settle, rest);

        Segment::new(SegmentKind::Travel, samples)
    }
}

/// Blanked travel with the default settling model.
pub fn plan_travel(start: Position, end: Position, pps: u32) -> Segment {
    TravelTiming::default().plan(start, end, pps)
}
