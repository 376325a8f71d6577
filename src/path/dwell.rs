//! Static holds for corner accentuation and initial/final settling.

use std::time::Duration;

use super::samples_for_duration;
use crate::types::{Sample, Segment, SegmentKind};

/// Holds `at` for `ceil(duration * pps)` samples (minimum 1).
///
/// The hold keeps `at`'s color when `lit`, otherwise it is blanked.
pub fn plan_dwell(at: Sample, duration: Duration, lit: bool, pps: u32) -> Segment {
    let sample = if lit { at } else { at.to_blanked() };
    let count = samples_for_duration(duration, pps);
    Segment::new(SegmentKind::Dwell, vec![sample; count])
}
