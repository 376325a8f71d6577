//! Lit strokes: straight lines and circular arcs.
//!
//! Strokes never repeat their start point. A stroke of `count` samples
//! places sample `i` (1-based) at progress `i / count`, so consecutive
//! strokes chain without duplicate vertices and every stroke ends exactly
//! on its target.

use std::f64::consts::TAU;

use crate::types::{Color, Position, Sample, Segment, SegmentKind};

/// Straight line from `from` to `to` with linear spacing.
///
/// A blank `color` yields a `Travel` segment, anything else a `Draw`.
pub fn plan_line(from: Position, to: Position, color: Color, count: usize) -> Segment {
    let samples = (1..=count)
        .map(|i| Sample::at(from.lerp(to, i as f64 / count as f64), color))
        .collect();
    let kind = if color.is_blank() {
        SegmentKind::Travel
    } else {
        SegmentKind::Draw
    };
    Segment::new(kind, samples)
}

/// Arc around `center`, sweeping `sweep` radians from `start_angle`.
///
/// A full ring is `sweep = TAU`; its last sample lands back on the start
/// angle.
pub fn plan_arc(
    center: Position,
    radius: f64,
    start_angle: f64,
    sweep: f64,
    color: Color,
    count: usize,
) -> Segment {
    let samples = (1..=count)
        .map(|i| {
            let theta = start_angle + sweep * (i as f64 / count as f64);
            Sample::at(point_on_circle(center, radius, theta), color)
        })
        .collect();
    Segment::new(SegmentKind::Draw, samples)
}

/// Point on a circle at `angle`.
pub(crate) fn point_on_circle(center: Position, radius: f64, angle: f64) -> Position {
    Position::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

/// A full ring starting and closing at angle 0.
pub(crate) fn plan_ring(center: Position, radius: f64, color: Color, count: usize) -> Segment {
    plan_arc(center, radius, 0.0, TAU, color, count)
}
