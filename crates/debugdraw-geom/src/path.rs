//! Drawing paths: an ordered list of move/line/arc/close commands.
//!
//! A [`Path`] is built incrementally for one draw call and then lowered into
//! a [`lyon::path::Path`] with [`Path::to_lyon`]. Lines map one to one; arcs
//! become quadratic béziers which the tessellator flattens with the view's
//! tolerance. Arcs come in two flavors:
//!
//! - [`Path::arc`]: center, radius and start/end angles. The current point is
//!   joined to the arc start with a straight line.
//! - [`Path::arc_to`]: the canvas-style tangent arc. Given the current point,
//!   a `corner` and a point `to`, it draws a line to the first tangent point
//!   and an arc of the given radius that is tangent to both lines, ending at
//!   the second tangent point.
//!
//! Angles are in radians with `(cos, sin)` orientation. On a y-down screen a
//! positive sweep turns clockwise, hence [`ArcDirection::Clockwise`].

use std::f64::consts::{PI, TAU};

use kurbo::Vec2;
use lyon::geom::{Angle, Arc};
use lyon::math::{point, vector, Point};
use lyon::path::path::Builder;
use lyon::path::Path as LyonPath;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Sweep direction for [`Path::arc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    /// Increasing angle (clockwise on a y-down screen).
    Clockwise,
    /// Decreasing angle.
    CounterClockwise,
}

/// One drawing command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath.
    MoveTo(Vec2),
    /// Straight line from the current point.
    LineTo(Vec2),
    /// Tangent arc through the corner formed by the current point, `corner` and `to`.
    ArcTo {
        /// Corner the arc rounds off.
        corner: Vec2,
        /// Point that, with `corner`, defines the outgoing tangent line.
        to: Vec2,
        /// Arc radius.
        radius: f64,
    },
    /// Circular arc around `center`.
    Arc {
        /// Arc center.
        center: Vec2,
        /// Arc radius.
        radius: f64,
        /// Start angle in radians.
        start_angle: f64,
        /// End angle in radians.
        end_angle: f64,
        /// Sweep direction.
        direction: ArcDirection,
    },
    /// Close the current subpath.
    Close,
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// An ordered sequence of drawing commands.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
    /// Where the pen is after the last command.
    current: Option<Vec2>,
    /// Start of the current subpath, where `Close` returns to.
    subpath_start: Option<Vec2>,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new subpath at `p`.
    pub fn move_to(&mut self, p: Vec2) {
        self.commands.push(PathCommand::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    /// Line from the current point to `p`. Starts a subpath if there is none.
    pub fn line_to(&mut self, p: Vec2) {
        self.commands.push(PathCommand::LineTo(p));
        if self.current.is_none() {
            self.subpath_start = Some(p);
        }
        self.current = Some(p);
    }

    /// Tangent arc of `radius` rounding the corner at `corner` towards `to`.
    pub fn arc_to(&mut self, corner: Vec2, to: Vec2, radius: f64) {
        self.commands.push(PathCommand::ArcTo { corner, to, radius });
        match self.current {
            None => {
                self.subpath_start = Some(corner);
                self.current = Some(corner);
            }
            Some(from) => {
                let end = TangentArc::new(from, corner, to, radius).map_or(corner, |arc| arc.end);
                self.current = Some(end);
            }
        }
    }

    /// Circular arc around `center` from `start_angle` to `end_angle`.
    pub fn arc(
        &mut self,
        center: Vec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        direction: ArcDirection,
    ) {
        self.commands.push(PathCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            direction,
        });
        let sweep = arc_sweep(start_angle, end_angle, direction);
        let start = polar(center, radius, start_angle);
        if self.current.is_none() {
            self.subpath_start = Some(start);
        }
        self.current = Some(polar(center, radius, start_angle + sweep));
    }

    /// Close the current subpath.
    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
        self.current = self.subpath_start;
    }

    /// The recorded commands.
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command has been recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether the last command closes a subpath.
    pub fn is_closed(&self) -> bool {
        matches!(self.commands.last(), Some(PathCommand::Close))
    }

    /// The pen position after the last command.
    pub fn current_point(&self) -> Option<Vec2> {
        self.current
    }

    /// Lower into a lyon path in the same coordinates.
    ///
    /// A degenerate `ArcTo` corner reduces to a line to the corner. A line
    /// after `Close` starts a new subpath at the closed subpath's start.
    pub fn to_lyon(&self) -> LyonPath {
        let mut lowering = Lowering::new();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => lowering.begin(p),
                PathCommand::LineTo(p) => lowering.line_to(p),
                PathCommand::ArcTo { corner, to, radius } => {
                    let Some(from) = lowering.resume() else {
                        lowering.begin(corner);
                        continue;
                    };
                    match TangentArc::new(from, corner, to, radius) {
                        Some(arc) => {
                            lowering.line_to(arc.start);
                            lowering.arc(arc.center, radius, arc.start_angle, arc.sweep);
                            lowering.current = Some(arc.end);
                        }
                        None => lowering.line_to(corner),
                    }
                }
                PathCommand::Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                    direction,
                } => {
                    let start = polar(center, radius, start_angle);
                    match lowering.resume() {
                        Some(_) => lowering.line_to(start),
                        None => lowering.begin(start),
                    }
                    let sweep = arc_sweep(start_angle, end_angle, direction);
                    lowering.arc(center, radius, start_angle, sweep);
                }
                PathCommand::Close => lowering.close(),
            }
        }
        lowering.finish()
    }
}

// ---------------------------------------------------------------------------
// Lowering
// ---------------------------------------------------------------------------

/// Tracks the open/closed state lyon's builder requires.
struct Lowering {
    builder: Builder,
    open: bool,
    current: Option<Vec2>,
    subpath_start: Option<Vec2>,
}

impl Lowering {
    fn new() -> Self {
        Self {
            builder: LyonPath::builder(),
            open: false,
            current: None,
            subpath_start: None,
        }
    }

    fn begin(&mut self, p: Vec2) {
        if self.open {
            self.builder.end(false);
        }
        self.builder.begin(to_point(p));
        self.open = true;
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    /// The current point, reopening a subpath there after a `Close`.
    fn resume(&mut self) -> Option<Vec2> {
        let current = self.current?;
        if !self.open {
            self.builder.begin(to_point(current));
            self.open = true;
            self.subpath_start = Some(current);
        }
        Some(current)
    }

    fn line_to(&mut self, p: Vec2) {
        if self.resume().is_none() {
            self.begin(p);
            return;
        }
        self.builder.line_to(to_point(p));
        self.current = Some(p);
    }

    /// Arc from the current point, which must already sit on the arc start.
    fn arc(&mut self, center: Vec2, radius: f64, start_angle: f64, sweep: f64) {
        let arc = Arc {
            center: to_point(center),
            radii: vector(radius as f32, radius as f32),
            start_angle: Angle::radians(start_angle as f32),
            sweep_angle: Angle::radians(sweep as f32),
            x_rotation: Angle::zero(),
        };
        let builder = &mut self.builder;
        arc.for_each_quadratic_bezier(&mut |segment| {
            builder.quadratic_bezier_to(segment.ctrl, segment.to);
        });
        self.current = Some(polar(center, radius, start_angle + sweep));
    }

    fn close(&mut self) {
        if self.open {
            self.builder.end(true);
            self.open = false;
        }
        self.current = self.subpath_start;
    }

    fn finish(mut self) -> LyonPath {
        if self.open {
            self.builder.end(false);
        }
        self.builder.build()
    }
}

fn to_point(v: Vec2) -> Point {
    point(v.x as f32, v.y as f32)
}

fn polar(center: Vec2, radius: f64, angle: f64) -> Vec2 {
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Signed sweep for an arc, at most one full turn.
///
/// A request spanning a whole turn or more draws the full circle; anything
/// shorter wraps into `[0, TAU)` in the arc's direction.
fn arc_sweep(start_angle: f64, end_angle: f64, direction: ArcDirection) -> f64 {
    let delta = match direction {
        ArcDirection::Clockwise => end_angle - start_angle,
        ArcDirection::CounterClockwise => start_angle - end_angle,
    };
    let sweep = if delta >= TAU {
        TAU
    } else if delta.is_finite() {
        delta.rem_euclid(TAU)
    } else {
        0.0
    };
    match direction {
        ArcDirection::Clockwise => sweep,
        ArcDirection::CounterClockwise => -sweep,
    }
}

// ---------------------------------------------------------------------------
// Tangent arc geometry
// ---------------------------------------------------------------------------

/// The arc drawn by an `ArcTo` command.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TangentArc {
    /// Tangent point on the incoming line.
    start: Vec2,
    /// Tangent point on the outgoing line.
    end: Vec2,
    center: Vec2,
    start_angle: f64,
    /// Signed sweep, always shorter than a half turn.
    sweep: f64,
}

impl TangentArc {
    /// `None` when the corner is degenerate and the command reduces to a line.
    fn new(from: Vec2, corner: Vec2, to: Vec2, radius: f64) -> Option<Self> {
        if radius <= 0.0 || !radius.is_finite() {
            return None;
        }
        let a = from - corner;
        let b = to - corner;
        let (la, lb) = (a.hypot(), b.hypot());
        if la <= f64::EPSILON || lb <= f64::EPSILON {
            return None;
        }
        let (da, db) = (a / la, b / lb);
        if da.cross(db).abs() <= 1e-12 {
            return None;
        }
        // Half of the angle between the two legs at the corner.
        let half = da.dot(db).clamp(-1.0, 1.0).acos() / 2.0;
        let tangent_distance = radius / half.tan();
        let start = corner + da * tangent_distance;
        let end = corner + db * tangent_distance;
        let bisector = da + db;
        let center = corner + bisector / bisector.hypot() * (radius / half.sin());

        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let end_angle = (end.y - center.y).atan2(end.x - center.x);
        let mut sweep = end_angle - start_angle;
        if sweep > PI {
            sweep -= TAU;
        } else if sweep < -PI {
            sweep += TAU;
        }
        Some(Self {
            start,
            end,
            center,
            start_angle,
            sweep,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Flattened subpaths of a lowered path as `(points, closed)`.
#[cfg(test)]
pub(crate) fn polylines(path: &Path, tolerance: f32) -> Vec<(Vec<Vec2>, bool)> {
    use lyon::path::iterator::PathIterator;
    use lyon::path::PathEvent;

    let to_vec2 = |p: Point| Vec2::new(f64::from(p.x), f64::from(p.y));
    let mut out: Vec<(Vec<Vec2>, bool)> = Vec::new();
    for event in path.to_lyon().iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => out.push((vec![to_vec2(at)], false)),
            PathEvent::Line { to, .. } => {
                if let Some((points, _)) = out.last_mut() {
                    points.push(to_vec2(to));
                }
            }
            PathEvent::End { close, .. } => {
                if let Some((_, closed)) = out.last_mut() {
                    *closed = close;
                }
            }
            _ => {}
        }
    }
    out
}
