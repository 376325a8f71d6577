//! Shape compiler: turns a [`Shape`] into a frame that fits a point budget.
//!
//! A compiled path always has the same structure:
//!
//! 1. blanked travel from the shape's rest position to where drawing starts
//! 2. the shape itself (draw strokes and lit corner dwells)
//! 3. blanked travel from the last drawn sample back to the rest position
//!
//! Steps 1 and 2 share `feature_ratio` of the budget. Step 3 lives in the
//! remainder, so playback that wraps around starts from the same position
//! it ended on and never shows a snap.
//!
//! Compilation is pure: the same shape, budget and rate always give the
//! same frame. Animation is expressed by compiling a different shape per
//! tick (see [`crate::pipeline::ShapeAnimation`]).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::path::line::{plan_ring, point_on_circle};
use crate::path::{plan_dwell, plan_line, samples_for_duration, TravelTiming};
use crate::types::{
    Color, Frame, Position, Sample, Segment, SegmentKind, WriteFrameFlags, GALVO_MAX,
};

// =============================================================================
// Shapes
// =============================================================================

/// A target shape in galvo units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// A small ring, drawn once around `center` starting at angle 0.
    Dot {
        center: Position,
        radius: f64,
        color: Color,
    },
    /// A straight line with a lit hold at both ends.
    Line {
        from: Position,
        to: Position,
        color: Color,
    },
    /// A closed outline with a lit hold at every corner.
    Polygon { vertices: Vec<Position>, color: Color },
}

impl Shape {
    pub fn dot(center: Position, radius: f64, color: Color) -> Self {
        Shape::Dot {
            center,
            radius,
            color,
        }
    }

    pub fn line(from: Position, to: Position, color: Color) -> Self {
        Shape::Line { from, to, color }
    }

    pub fn polygon(vertices: Vec<Position>, color: Color) -> Self {
        Shape::Polygon { vertices, color }
    }

    /// Where the beam parks between loops.
    ///
    /// Dot: its center. Line: its midpoint. Polygon: the vertex centroid.
    pub fn rest(&self) -> Position {
        match self {
            Shape::Dot { center, .. } => *center,
            Shape::Line { from, to, .. } => from.lerp(*to, 0.5),
            Shape::Polygon { vertices, .. } => {
                let n = vertices.len().max(1) as f64;
                let (sx, sy) = vertices
                    .iter()
                    .fold((0.0, 0.0), |(sx, sy), v| (sx + v.x, sy + v.y));
                Position::new(sx / n, sy / n)
            }
        }
    }

    /// First lit position.
    fn start(&self) -> Position {
        match self {
            Shape::Dot { center, radius, .. } => point_on_circle(*center, *radius, 0.0),
            Shape::Line { from, .. } => *from,
            Shape::Polygon { vertices, .. } => vertices[0],
        }
    }

    /// Last lit position.
    fn end(&self) -> Position {
        match self {
            Shape::Dot { .. } | Shape::Polygon { .. } => self.start(),
            Shape::Line { to, .. } => *to,
        }
    }

    /// Number of strokes, each of which needs at least one sample.
    fn stroke_count(&self) -> usize {
        match self {
            Shape::Dot { .. } | Shape::Line { .. } => 1,
            Shape::Polygon { vertices, .. } => vertices.len(),
        }
    }

    /// Rejects shapes that would leave the addressable range.
    ///
    /// Out-of-range input is a configuration error; nothing is clamped here.
    pub fn validate(&self) -> Result<()> {
        match self {
            Shape::Dot { center, radius, .. } => {
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(Error::invalid_config(format!(
                        "dot radius must be finite and non-negative, got {}",
                        radius
                    )));
                }
                center.validate()?;
                for (dx, dy) in [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)] {
                    Position::new(center.x + dx * radius, center.y + dy * radius).validate()?;
                }
                Ok(())
            }
            Shape::Line { from, to, .. } => {
                from.validate()?;
                to.validate()
            }
            Shape::Polygon { vertices, .. } => {
                if vertices.len() < 3 {
                    return Err(Error::invalid_config(format!(
                        "polygon needs at least 3 vertices, got {}",
                        vertices.len()
                    )));
                }
                vertices.iter().try_for_each(Position::validate)
            }
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Compiler policy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompileConfig {
    /// Share of the point budget for the feature (travel in + shape).
    /// The remainder is reserved for the return travel.
    pub feature_ratio: f64,
    /// Smallest acceptable number of draw samples.
    pub min_feature_points: usize,
    /// Frames shorter than this are replicated until they reach it.
    /// Zero disables padding.
    pub target_buffer_points: usize,
    /// Lit hold at line ends and polygon corners.
    pub corner_dwell: Duration,
    /// Settling model for blanked travel.
    pub travel: TravelTiming,
    /// Flags attached to compiled frames.
    pub flags: WriteFrameFlags,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            feature_ratio: 0.8,
            min_feature_points: 10,
            target_buffer_points: 2000,
            corner_dwell: Duration::from_micros(200),
            travel: TravelTiming::default(),
            flags: WriteFrameFlags::empty(),
        }
    }
}

impl CompileConfig {
    /// Set the feature share of the budget (builder pattern).
    pub fn with_feature_ratio(mut self, ratio: f64) -> Self {
        self.feature_ratio = ratio;
        self
    }

    /// Set the minimum draw sample count (builder pattern).
    pub fn with_min_feature_points(mut self, points: usize) -> Self {
        self.min_feature_points = points;
        self
    }

    /// Set the padding target (builder pattern).
    pub fn with_target_buffer_points(mut self, points: usize) -> Self {
        self.target_buffer_points = points;
        self
    }

    /// Set the corner dwell duration (builder pattern).
    pub fn with_corner_dwell(mut self, dwell: Duration) -> Self {
        self.corner_dwell = dwell;
        self
    }

    /// Set the travel settling model (builder pattern).
    pub fn with_travel(mut self, travel: TravelTiming) -> Self {
        self.travel = travel;
        self
    }

    /// Set the frame flags (builder pattern).
    pub fn with_flags(mut self, flags: WriteFrameFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.feature_ratio > 0.0 && self.feature_ratio < 1.0) {
            return Err(Error::invalid_config(format!(
                "feature_ratio must be within (0, 1), got {}",
                self.feature_ratio
            )));
        }
        if self.min_feature_points == 0 {
            return Err(Error::invalid_config("min_feature_points must be at least 1"));
        }
        self.travel.validate()
    }
}

// =============================================================================
// Compiled Path
// =============================================================================

/// Ordered segments of one compiled loop, before padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total sample count.
    pub fn len(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of visible draw samples.
    pub fn draw_len(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Draw)
            .map(Segment::len)
            .sum()
    }

    pub fn last_sample(&self) -> Option<&Sample> {
        self.segments.iter().rev().find_map(Segment::last)
    }

    pub fn into_frame(self, pps: u32, flags: WriteFrameFlags) -> Frame {
        let mut frame = Frame::from_segments(pps, &self.segments);
        frame.flags = flags;
        frame
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Sample counts of the non-draw parts of a shape's path.
struct Overhead {
    /// Travel in plus dwells, charged to the feature budget.
    feature: usize,
    /// Return travel, charged to the reserve.
    flyback: usize,
}

/// Compiles shapes under a [`CompileConfig`].
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompileConfig,
}

impl Compiler {
    pub fn new(config: CompileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Points available to the feature: `floor(budget * feature_ratio)`.
    pub fn feature_budget(&self, point_budget: usize) -> usize {
        (point_budget as f64 * self.config.feature_ratio).floor() as usize
    }

    /// Compiles and pads `shape` into a frame ready for output.
    pub fn compile(&self, shape: &Shape, point_budget: usize, pps: u32) -> Result<Frame> {
        let frame = self
            .plan(shape, point_budget, pps)?
            .into_frame(pps, self.config.flags);
        Ok(pad_to_length(frame, self.config.target_buffer_points))
    }

    /// Builds the unpadded segment list for `shape`.
    pub fn plan(&self, shape: &Shape, point_budget: usize, pps: u32) -> Result<Path> {
        check_rate_and_budget(point_budget, pps)?;
        shape.validate()?;

        let overhead = self.overhead(shape, pps);
        let feature_budget = self.feature_budget(point_budget);
        let reserve = point_budget - feature_budget;
        let min_draw = self.min_draw(shape);

        let draw = feature_budget.saturating_sub(overhead.feature);
        if draw < min_draw {
            return Err(Error::BudgetExhausted {
                required: overhead.feature + min_draw,
                available: feature_budget,
            });
        }
        if reserve < overhead.flyback {
            return Err(Error::BudgetExhausted {
                required: overhead.flyback,
                available: reserve,
            });
        }

        let rest = shape.rest();
        let travel = &self.config.travel;
        let mut segments = vec![travel.plan(rest, shape.start(), pps)];
        self.plan_feature(shape, draw, pps, &mut segments);

        let last = segments
            .iter()
            .rev()
            .find_map(Segment::last)
            .map(Sample::position)
            .unwrap_or(rest);
        segments.push(travel.plan(last, rest, pps));

        Ok(Path { segments })
    }

    /// Smallest budget for which [`plan`](Self::plan) succeeds.
    pub fn min_point_budget(&self, shape: &Shape, pps: u32) -> Result<usize> {
        check_rate_and_budget(1, pps)?;
        shape.validate()?;

        let overhead = self.overhead(shape, pps);
        let need = overhead.feature + self.min_draw(shape);
        // Both the feature share and the reserve grow monotonically with
        // the budget, so the first fit is the minimum.
        let fits = |b: usize| {
            let feature = self.feature_budget(b);
            feature >= need && b - feature >= overhead.flyback
        };
        Ok((need..).find(|&b| fits(b)).unwrap_or(usize::MAX))
    }

    fn min_draw(&self, shape: &Shape) -> usize {
        self.config.min_feature_points.max(shape.stroke_count())
    }

    fn overhead(&self, shape: &Shape, pps: u32) -> Overhead {
        let travel = &self.config.travel;
        let rest = shape.rest();
        let dwell = samples_for_duration(self.config.corner_dwell, pps);
        let dwells = match shape {
            Shape::Dot { .. } => 0,
            Shape::Line { .. } => 2,
            Shape::Polygon { vertices, .. } => vertices.len() + 1,
        };
        let end = Sample::blanked(shape.end()).position();
        Overhead {
            feature: travel.travel_len(rest, shape.start(), pps) + dwells * dwell,
            flyback: travel.travel_len(end, rest, pps),
        }
    }

    fn plan_feature(&self, shape: &Shape, draw: usize, pps: u32, segments: &mut Vec<Segment>) {
        let hold = self.config.corner_dwell;
        match shape {
            Shape::Dot {
                center,
                radius,
                color,
            } => {
                segments.push(plan_ring(*center, *radius, *color, draw));
            }
            Shape::Line { from, to, color } => {
                segments.push(plan_dwell(Sample::at(*from, *color), hold, true, pps));
                segments.push(plan_line(*from, *to, *color, draw));
                segments.push(plan_dwell(Sample::at(*to, *color), hold, true, pps));
            }
            Shape::Polygon { vertices, color } => {
                let n = vertices.len();
                let lengths: Vec<f64> = (0..n)
                    .map(|i| vertices[i].distance(vertices[(i + 1) % n]))
                    .collect();
                let counts = allocate_strokes(&lengths, draw);

                segments.push(plan_dwell(Sample::at(vertices[0], *color), hold, true, pps));
                for (i, count) in counts.into_iter().enumerate() {
                    let (a, b) = (vertices[i], vertices[(i + 1) % n]);
                    segments.push(plan_line(a, b, *color, count));
                    segments.push(plan_dwell(Sample::at(b, *color), hold, true, pps));
                }
            }
        }
    }
}

/// Compiles `shape` with the default [`CompileConfig`].
pub fn compile(shape: &Shape, point_budget: usize, pps: u32) -> Result<Frame> {
    Compiler::default().compile(shape, point_budget, pps)
}

fn check_rate_and_budget(point_budget: usize, pps: u32) -> Result<()> {
    if pps == 0 {
        return Err(Error::invalid_config("pps must be greater than 0"));
    }
    if point_budget == 0 {
        return Err(Error::invalid_config("point budget must be greater than 0"));
    }
    Ok(())
}

/// Shares `total` samples among strokes proportionally to their length.
///
/// Every stroke gets at least one sample and the counts sum to `total`
/// (callers guarantee `total >= lengths.len()`). Degenerate outlines with
/// zero perimeter are split evenly.
fn allocate_strokes(lengths: &[f64], total: usize) -> Vec<usize> {
    let n = lengths.len();
    let spare = total - n;
    let perimeter: f64 = lengths.iter().sum();

    let mut counts = Vec::with_capacity(n);
    let mut covered = 0.0;
    let mut prev = 0;
    for (i, len) in lengths.iter().enumerate() {
        covered += len;
        let boundary = if i + 1 == n {
            spare
        } else if perimeter > 0.0 {
            ((spare as f64 * covered / perimeter).round() as usize).min(spare)
        } else {
            spare * (i + 1) / n
        };
        let boundary = boundary.max(prev);
        counts.push(1 + boundary - prev);
        prev = boundary;
    }
    counts
}

// =============================================================================
// Padding
// =============================================================================

/// Replicates `frame` end-to-end until it holds at least `target` samples.
///
/// Only whole copies are appended, so the loop is never cut mid-segment.
/// Frames already at or above `target` (and empty frames) are returned
/// unchanged.
pub fn pad_to_length(frame: Frame, target: usize) -> Frame {
    let len = frame.samples.len();
    if len == 0 || len >= target {
        return frame;
    }

    let copies = (target + len - 1) / len;
    let mut samples = vec![Sample::default(); copies * len];
    for chunk in samples.chunks_exact_mut(len) {
        chunk.copy_from_slice(&frame.samples);
    }

    Frame { samples, ..frame }
}

/// Point budget for a frame time: `floor(frame_time * pps)`.
pub fn point_budget_for(frame_time: Duration, pps: u32) -> usize {
    (frame_time.as_nanos() * pps as u128 / 1_000_000_000) as usize
}

/// True when every sample of the frame is addressable.
pub fn is_addressable(frame: &Frame) -> bool {
    frame
        .samples
        .iter()
        .all(|s| s.x <= GALVO_MAX && s.y <= GALVO_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn center() -> Position {
        Position::new(2048.0, 2048.0)
    }

    fn dot() -> Shape {
        Shape::dot(center(), 84.0, Color::WHITE)
    }

    fn triangle() -> Shape {
        Shape::polygon(
            vec![
                Position::new(1000.0, 1000.0),
                Position::new(2048.0, 3500.0),
                Position::new(3096.0, 1000.0),
            ],
            Color::rgb8(0, 255, 0, 255),
        )
    }

    // ==========================================================================
    // Dot Scenario
    // ==========================================================================

    #[test]
    fn test_dot_scenario_budget_split() {
        let budget = point_budget_for(Duration::from_millis(15), 50_000);
        assert_eq!(budget, 750);

        let path = Compiler::default().plan(&dot(), budget, 50_000).unwrap();
        let kinds: Vec<SegmentKind> = path.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Travel, SegmentKind::Draw, SegmentKind::Travel]
        );

        // Feature (travel in + ring) uses exactly 80% of the budget
        let feature = path.segments()[0].len() + path.segments()[1].len();
        assert_eq!(feature, 600);
        assert!(path.len() <= budget);
    }

    #[test]
    fn test_dot_scenario_ring_closes_at_two_pi() {
        let path = Compiler::default().plan(&dot(), 750, 50_000).unwrap();
        let ring = &path.segments()[1];
        let last = ring.last().unwrap();

        let expected = Sample::at(point_on_circle(center(), 84.0, TAU), Color::WHITE);
        assert_eq!(*last, expected);
        assert_eq!((last.x, last.y), (2132, 2048));
        assert!((last.position().distance(center()) - 84.0).abs() < 1e-9);
    }

    #[test]
    fn test_dot_scenario_flyback_ends_at_center() {
        let path = Compiler::default().plan(&dot(), 750, 50_000).unwrap();
        let flyback = path.segments().last().unwrap();
        assert_eq!(flyback.kind, SegmentKind::Travel);
        assert!(flyback.samples.iter().all(Sample::is_blanked));
        let end = flyback.last().unwrap();
        assert_eq!((end.x, end.y), (2048, 2048));
    }

    #[test]
    fn test_dot_compile_pads_with_whole_replicas() {
        let compiler = Compiler::default();
        let single = compiler.plan(&dot(), 750, 50_000).unwrap().len();
        let frame = compiler.compile(&dot(), 750, 50_000).unwrap();

        assert!(frame.len() >= 2000);
        assert_eq!(frame.len() % single, 0);
        assert!(frame.len() - single < 2000);
        assert_eq!(frame.samples[..single], frame.samples[single..2 * single]);
        assert!(is_addressable(&frame));
    }

    // ==========================================================================
    // Determinism & Padding
    // ==========================================================================

    #[test]
    fn test_compile_is_deterministic() {
        let a = compile(&triangle(), 1500, 30_000).unwrap();
        let b = compile(&triangle(), 1500, 30_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pad_is_idempotent_at_or_above_target() {
        let frame = Frame::new(30_000, vec![Sample::default(); 2000]);
        assert_eq!(pad_to_length(frame.clone(), 2000), frame);
        assert_eq!(pad_to_length(frame.clone(), 100), frame);

        let padded = pad_to_length(Frame::new(30_000, vec![Sample::default(); 300]), 1000);
        assert_eq!(padded.len(), 1200);
        assert_eq!(pad_to_length(padded.clone(), 1000), padded);
    }

    #[test]
    fn test_pad_empty_frame_unchanged() {
        let frame = Frame::new(30_000, Vec::new());
        assert!(pad_to_length(frame, 2000).is_empty());
    }

    #[test]
    fn test_pad_keeps_rate_and_flags() {
        let frame = Frame::new_with_flags(
            45_000,
            vec![Sample::default(); 7],
            WriteFrameFlags::SINGLE_MODE,
        );
        let padded = pad_to_length(frame, 20);
        assert_eq!(padded.len(), 21);
        assert_eq!(padded.pps, 45_000);
        assert_eq!(padded.flags, WriteFrameFlags::SINGLE_MODE);
    }

    // ==========================================================================
    // Budget Boundaries
    // ==========================================================================

    #[test]
    fn test_min_point_budget_boundary() {
        let compiler = Compiler::default();
        let min = compiler.min_point_budget(&dot(), 50_000).unwrap();

        let path = compiler.plan(&dot(), min, 50_000).unwrap();
        assert!(path.draw_len() >= 10);

        let err = compiler.plan(&dot(), min - 1, 50_000).unwrap_err();
        assert!(err.is_budget_exhausted());
    }

    #[test]
    fn test_feature_floor_boundary() {
        let compiler =
            Compiler::new(CompileConfig::default().with_feature_ratio(0.5)).unwrap();
        let min = compiler.min_point_budget(&dot(), 50_000).unwrap();

        // 22 travel samples + 10 draw samples = 32 = half of 64
        assert_eq!(min, 64);
        let path = compiler.plan(&dot(), min, 50_000).unwrap();
        assert_eq!(path.draw_len(), 10);

        match compiler.plan(&dot(), min - 1, 50_000) {
            Err(Error::BudgetExhausted {
                required,
                available,
            }) => {
                assert_eq!(required, 32);
                assert_eq!(available, 31);
            }
            other => panic!("expected BudgetExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_flyback_must_fit_reserve() {
        let compiler =
            Compiler::new(CompileConfig::default().with_feature_ratio(0.99)).unwrap();
        let line = Shape::line(
            Position::new(0.0, 0.0),
            Position::new(4095.0, 4095.0),
            Color::WHITE,
        );
        let err = compiler.plan(&line, 750, 50_000).unwrap_err();
        assert!(err.is_budget_exhausted());
    }

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================

    #[test]
    fn test_zero_budget_and_rate_are_config_errors() {
        assert!(compile(&dot(), 0, 50_000).unwrap_err().is_config());
        assert!(compile(&dot(), 750, 0).unwrap_err().is_config());
    }

    #[test]
    fn test_out_of_range_shapes_are_rejected() {
        let near_edge = Shape::dot(Position::new(4050.0, 2048.0), 84.0, Color::WHITE);
        assert!(matches!(
            compile(&near_edge, 750, 50_000),
            Err(Error::CoordinateOutOfRange { .. })
        ));

        let line = Shape::line(
            Position::new(0.0, 0.0),
            Position::new(4096.0, 0.0),
            Color::WHITE,
        );
        assert!(compile(&line, 750, 50_000).unwrap_err().is_config());

        let negative = Shape::dot(center(), -1.0, Color::WHITE);
        assert!(compile(&negative, 750, 50_000).unwrap_err().is_config());
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let shape = Shape::polygon(
            vec![Position::new(0.0, 0.0), Position::new(10.0, 10.0)],
            Color::WHITE,
        );
        assert!(compile(&shape, 750, 50_000).unwrap_err().is_config());
    }

    #[test]
    fn test_compile_config_validation() {
        assert!(Compiler::new(CompileConfig::default().with_feature_ratio(1.0)).is_err());
        assert!(Compiler::new(CompileConfig::default().with_feature_ratio(0.0)).is_err());
        assert!(Compiler::new(CompileConfig::default().with_feature_ratio(f64::NAN)).is_err());
        assert!(Compiler::new(CompileConfig::default().with_min_feature_points(0)).is_err());
    }

    // ==========================================================================
    // Lines & Polygons
    // ==========================================================================

    #[test]
    fn test_triangle_segment_structure() {
        let path = Compiler::default().plan(&triangle(), 1500, 30_000).unwrap();
        let kinds: Vec<SegmentKind> = path.segments().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Travel,
                SegmentKind::Dwell,
                SegmentKind::Draw,
                SegmentKind::Dwell,
                SegmentKind::Draw,
                SegmentKind::Dwell,
                SegmentKind::Draw,
                SegmentKind::Dwell,
                SegmentKind::Travel,
            ]
        );
        for seg in path.segments() {
            match seg.kind {
                SegmentKind::Travel => assert!(seg.samples.iter().all(Sample::is_blanked)),
                _ => assert!(seg.samples.iter().all(|s| !s.is_blanked())),
            }
        }
        // Feature fills its share exactly
        let flyback = path.segments().last().unwrap().len();
        assert_eq!(path.len() - flyback, 1200);
    }

    #[test]
    fn test_triangle_returns_to_centroid() {
        let shape = triangle();
        let path = Compiler::default().plan(&shape, 1500, 30_000).unwrap();
        let rest = Sample::blanked(shape.rest());
        assert_eq!(path.last_sample(), Some(&rest));
        assert_eq!(path.segments()[0].first().map(|s| s.is_blanked()), Some(true));
    }

    #[test]
    fn test_line_has_dwell_at_both_ends() {
        let shape = Shape::line(
            Position::new(500.0, 500.0),
            Position::new(3500.0, 500.0),
            Color::WHITE,
        );
        let path = Compiler::default().plan(&shape, 750, 50_000).unwrap();
        let segs = path.segments();
        assert_eq!(segs.len(), 5);
        assert_eq!((segs[1].kind, segs[1].samples[0].x), (SegmentKind::Dwell, 500));
        assert_eq!((segs[3].kind, segs[3].samples[0].x), (SegmentKind::Dwell, 3500));
        assert_eq!(segs[2].last().map(|s| s.x), Some(3500));
    }

    #[test]
    fn test_allocate_strokes_proportional_and_exact() {
        let counts = allocate_strokes(&[100.0, 300.0, 0.0], 103);
        assert_eq!(counts.iter().sum::<usize>(), 103);
        assert!(counts.iter().all(|&c| c >= 1));
        assert_eq!(counts, vec![26, 76, 1]);
    }

    #[test]
    fn test_allocate_strokes_degenerate_outline() {
        let counts = allocate_strokes(&[0.0, 0.0, 0.0], 10);
        assert_eq!(counts.iter().sum::<usize>(), 10);
        assert!(counts.iter().all(|&c| c >= 3));
    }
}
