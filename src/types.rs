//! Sample, segment and frame types.
//!
//! Positions are planned in `f64` galvo units and quantized to 12-bit
//! samples only when a segment is emitted:
//! - x: 0 (left) to 4095 (right)
//! - y: 0 (bottom) to 4095 (top)
//! - Colors: 0-65535 for R, G, B, and intensity

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

use bitflags::bitflags;

use crate::ease::lerp;
use crate::error::{Error, Result};

/// Highest addressable galvo coordinate (12 bit).
pub const GALVO_MAX: u16 = 4095;

/// Full coordinate span, used to normalize travel distances.
pub const GALVO_FULL_SCALE: f64 = 4096.0;

/// A position in galvo units, before quantization.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(&self, other: Position, t: f64) -> Position {
        Position {
            x: lerp(self.x, other.x, t),
            y: lerp(self.y, other.y, t),
        }
    }

    /// True when both coordinates are finite and within 0..=4095.
    pub fn is_addressable(&self) -> bool {
        let max = GALVO_MAX as f64;
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=max).contains(&self.x)
            && (0.0..=max).contains(&self.y)
    }

    /// Returns `Err(CoordinateOutOfRange)` unless the position is addressable.
    pub fn validate(&self) -> Result<()> {
        if self.is_addressable() {
            Ok(())
        } else {
            Err(Error::CoordinateOutOfRange {
                x: self.x,
                y: self.y,
            })
        }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Position { x, y }
    }
}

/// 16-bit color channels. 8-bit output profiles downscale with `>> 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub intensity: u16,
}

impl Color {
    /// Laser off.
    pub const BLANK: Color = Color::new(0, 0, 0, 0);

    /// Full white at full intensity.
    pub const WHITE: Color = Color::new(u16::MAX, u16::MAX, u16::MAX, u16::MAX);

    pub const fn new(r: u16, g: u16, b: u16, intensity: u16) -> Self {
        Self { r, g, b, intensity }
    }

    /// Creates a color from 8-bit channels (scaled by 257, so 255 -> 65535).
    pub const fn rgb8(r: u8, g: u8, b: u8, intensity: u8) -> Self {
        Self {
            r: r as u16 * 257,
            g: g as u16 * 257,
            b: b as u16 * 257,
            intensity: intensity as u16 * 257,
        }
    }

    /// Downscales to 8-bit channels `(r, g, b, intensity)`.
    pub fn to_rgb8(&self) -> (u8, u8, u8, u8) {
        (
            (self.r >> 8) as u8,
            (self.g >> 8) as u8,
            (self.b >> 8) as u8,
            (self.intensity >> 8) as u8,
        )
    }

    /// True when every channel is zero.
    pub fn is_blank(&self) -> bool {
        *self == Color::BLANK
    }

    /// Channel-wise linear ramp towards `other`.
    pub fn lerp(&self, other: Color, t: f64) -> Color {
        let ch = |a: u16, b: u16| lerp(a as f64, b as f64, t).round().clamp(0.0, 65535.0) as u16;
        Color {
            r: ch(self.r, other.r),
            g: ch(self.g, other.g),
            b: ch(self.b, other.b),
            intensity: ch(self.intensity, other.intensity),
        }
    }
}

/// A single hardware-bound point.
///
/// Coordinates are 12-bit (0-4095). Samples built with [`Sample::at`] are
/// always in range; the fields stay public for output adapters, which
/// re-check the range when marshalling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    pub x: u16,
    pub y: u16,
    pub color: Color,
}

impl Sample {
    /// Quantizes a planned position: rounds to the nearest unit and clamps
    /// into the addressable range.
    pub fn at(position: Position, color: Color) -> Self {
        let max = GALVO_MAX as f64;
        Self {
            x: position.x.round().clamp(0.0, max) as u16,
            y: position.y.round().clamp(0.0, max) as u16,
            color,
        }
    }

    /// Creates a blanked sample at the given position.
    pub fn blanked(position: Position) -> Self {
        Self::at(position, Color::BLANK)
    }

    /// Creates a sample from raw coordinates, rejecting values above 4095.
    pub fn try_new(x: u16, y: u16, color: Color) -> Result<Self> {
        if x > GALVO_MAX || y > GALVO_MAX {
            return Err(Error::CoordinateOutOfRange {
                x: x as f64,
                y: y as f64,
            });
        }
        Ok(Self { x, y, color })
    }

    /// The sample position in galvo units.
    pub fn position(&self) -> Position {
        Position::new(self.x as f64, self.y as f64)
    }

    /// True when the laser is off for this sample.
    pub fn is_blanked(&self) -> bool {
        self.color.is_blank()
    }

    /// Same position with the laser off.
    pub fn to_blanked(self) -> Self {
        Self {
            color: Color::BLANK,
            ..self
        }
    }
}

/// Semantic role of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SegmentKind {
    /// Blanked transition between positions.
    Travel,
    /// Static hold, lit or blanked.
    Dwell,
    /// The visible shape.
    Draw,
}

/// A contiguous run of samples with one role.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub samples: Vec<Sample>,
}

impl Segment {
    pub fn new(kind: SegmentKind, samples: Vec<Sample>) -> Self {
        Self { kind, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

bitflags! {
    /// Flags passed through to the DAC write call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct WriteFrameFlags: u8 {
        /// Replace the playing frame right away instead of after its last point.
        const START_IMMEDIATELY = 0b0000_0001;
        /// Play the frame once rather than looping until the next write.
        const SINGLE_MODE = 0b0000_0010;
        /// Return from the write call before the transfer completes.
        const DONT_BLOCK = 0b0000_0100;
    }
}

/// One playback cycle of samples at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Rate of output in points per second
    pub pps: u32,
    /// Frame flags (default is empty)
    pub flags: WriteFrameFlags,
    /// Samples in emission order
    pub samples: Vec<Sample>,
}

impl Frame {
    /// Create a new frame with the given point rate and samples.
    pub fn new(pps: u32, samples: Vec<Sample>) -> Self {
        Frame {
            pps,
            flags: WriteFrameFlags::empty(),
            samples,
        }
    }

    /// Create a new frame with specific flags.
    pub fn new_with_flags(pps: u32, samples: Vec<Sample>, flags: WriteFrameFlags) -> Self {
        Frame {
            pps,
            flags,
            samples,
        }
    }

    /// Concatenates segments in emission order.
    pub fn from_segments(pps: u32, segments: &[Segment]) -> Self {
        let total = segments.iter().map(Segment::len).sum();
        let mut samples = Vec::with_capacity(total);
        for segment in segments {
            samples.extend_from_slice(&segment.samples);
        }
        Frame::new(pps, samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback time of one cycle: `len / pps`. Zero when `pps` is zero.
    pub fn duration(&self) -> Duration {
        if self.pps == 0 {
            return Duration::ZERO;
        }
        let nanos = self.samples.len() as u128 * 1_000_000_000 / self.pps as u128;
        Duration::from_nanos(nanos as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Sample Tests
    // ==========================================================================

    #[test]
    fn test_sample_at_rounds_to_nearest_unit() {
        let s = Sample::at(Position::new(2131.6, 2047.9999), Color::WHITE);
        assert_eq!((s.x, s.y), (2132, 2048));
    }

    #[test]
    fn test_sample_at_clamps_out_of_range() {
        let s = Sample::at(Position::new(-12.0, 5000.0), Color::BLANK);
        assert_eq!((s.x, s.y), (0, 4095));

        let s = Sample::at(Position::new(f64::INFINITY, f64::NEG_INFINITY), Color::BLANK);
        assert_eq!((s.x, s.y), (4095, 0));
    }

    #[test]
    fn test_sample_at_nan_does_not_panic() {
        let s = Sample::at(Position::new(f64::NAN, f64::NAN), Color::BLANK);
        assert!(s.x <= GALVO_MAX);
        assert!(s.y <= GALVO_MAX);
    }

    #[test]
    fn test_sample_try_new_rejects_above_12_bit() {
        assert!(Sample::try_new(4095, 0, Color::WHITE).is_ok());
        let err = Sample::try_new(4096, 0, Color::WHITE).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_sample_blanked_sets_all_colors_to_zero() {
        let s = Sample::blanked(Position::new(10.0, 20.0));
        assert_eq!((s.x, s.y), (10, 20));
        assert!(s.is_blanked());
        assert!(!Sample::at(Position::new(1.0, 1.0), Color::WHITE).is_blanked());
    }

    // ==========================================================================
    // Position / Color Tests
    // ==========================================================================

    #[test]
    fn test_position_addressable_bounds() {
        assert!(Position::new(0.0, 4095.0).is_addressable());
        assert!(!Position::new(-0.5, 10.0).is_addressable());
        assert!(!Position::new(10.0, 4095.5).is_addressable());
        assert!(!Position::new(f64::NAN, 10.0).is_addressable());
    }

    #[test]
    fn test_color_rgb8_roundtrips_through_downscale() {
        let c = Color::rgb8(255, 128, 0, 200);
        assert_eq!(c.r, 65535);
        assert_eq!(c.to_rgb8(), (255, 128, 0, 200));
    }

    #[test]
    fn test_color_lerp_midpoint() {
        let c = Color::BLANK.lerp(Color::new(1000, 2000, 0, 65535), 0.5);
        assert_eq!(c, Color::new(500, 1000, 0, 32768));
    }

    // ==========================================================================
    // Frame Tests
    // ==========================================================================

    #[test]
    fn test_frame_duration_is_len_over_pps() {
        let frame = Frame::new(50_000, vec![Sample::default(); 750]);
        assert_eq!(frame.duration(), Duration::from_millis(15));
    }

    #[test]
    fn test_frame_duration_zero_pps() {
        let frame = Frame::new(0, vec![Sample::default(); 10]);
        assert_eq!(frame.duration(), Duration::ZERO);
    }

    #[test]
    fn test_frame_from_segments_preserves_order() {
        let a = Segment::new(SegmentKind::Travel, vec![Sample::blanked(Position::new(1.0, 1.0))]);
        let b = Segment::new(
            SegmentKind::Draw,
            vec![Sample::at(Position::new(2.0, 2.0), Color::WHITE); 2],
        );
        let frame = Frame::from_segments(30_000, &[a, b]);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.samples[0].x, 1);
        assert_eq!(frame.samples[2].x, 2);
        assert!(frame.flags.is_empty());
    }
}
