//! Physics shape descriptions and their outline paths.
//!
//! Each [`ShapeDescriptor`] variant has a path generator. The polygon
//! generator performs the rounded outline extrusion: every vertex is pushed
//! outward along its miter direction so that the same closed path serves
//! both the filled body and the stroked border, with a minimum visible
//! thickness of `1 / LINE_SCALE` even for sharp (zero radius) polygons.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use kurbo::Vec2;

use crate::path::{ArcDirection, Path};
use crate::GeomError;

/// Controls the minimum outline thickness, independent of the corner radius.
pub const LINE_SCALE: f64 = 1.0;

/// Longest allowed miter offset, in units of the extrusion distance.
///
/// Adjacent edges that fold back on each other have normals with a dot
/// product near -1, where the miter length grows without bound.
pub const MITER_LIMIT: f64 = 4.0;

// ---------------------------------------------------------------------------
// ShapeDescriptor
// ---------------------------------------------------------------------------

/// Geometry of one shape to draw, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDescriptor {
    /// Circle with a radius line showing its rotation.
    Circle {
        /// Center.
        pos: Vec2,
        /// Rotation in radians.
        angle: f64,
        /// Radius.
        radius: f64,
    },
    /// Hairline segment.
    Segment {
        /// First endpoint.
        a: Vec2,
        /// Second endpoint.
        b: Vec2,
    },
    /// Segment with rounded caps (a capsule).
    FatSegment {
        /// First endpoint.
        a: Vec2,
        /// Second endpoint.
        b: Vec2,
        /// Cap radius.
        radius: f64,
    },
    /// Convex polygon, optionally with rounded corners.
    Polygon {
        /// Vertices in a consistent winding order.
        vertices: Vec<Vec2>,
        /// Corner radius.
        radius: f64,
    },
    /// Small filled dot.
    Dot {
        /// Center.
        pos: Vec2,
        /// Diameter.
        size: f64,
    },
}

// ---------------------------------------------------------------------------
// Path generators
// ---------------------------------------------------------------------------

/// Closed full circle.
pub fn circle_path(pos: Vec2, radius: f64) -> Path {
    let mut path = Path::new();
    path.arc(pos, radius, 0.0, TAU, ArcDirection::Clockwise);
    path.close();
    path
}

/// Append the rotation indicator: a line from the center to the rim at `angle`.
pub fn append_radius_line(path: &mut Path, pos: Vec2, angle: f64, radius: f64) {
    path.move_to(pos);
    path.line_to(pos + Vec2::new(angle.cos(), angle.sin()) * radius);
    path.close();
}

/// Hairline segment path.
pub fn segment_path(a: Vec2, b: Vec2) -> Path {
    let mut path = Path::new();
    path.move_to(a);
    path.line_to(b);
    path.close();
    path
}

/// Capsule outline: a half circle around each endpoint, joined by straight sides.
pub fn fat_segment_path(a: Vec2, b: Vec2, radius: f64) -> Path {
    let d = b - a;
    let t1 = d.y.atan2(d.x) + FRAC_PI_2;
    let t2 = t1 + PI;
    let mut path = Path::new();
    path.arc(a, radius, t1, t1 + PI, ArcDirection::Clockwise);
    path.arc(b, radius, t2, t2 + PI, ArcDirection::Clockwise);
    path.close();
    path
}

/// Dot of diameter `size`.
pub fn dot_path(pos: Vec2, size: f64) -> Path {
    circle_path(pos, size / 2.0)
}

// ---------------------------------------------------------------------------
// Polygon extrusion
// ---------------------------------------------------------------------------

/// Per-vertex extrusion data.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ExtrudeVertex {
    /// Miter direction, scaled so that moving by `offset * d` keeps both
    /// adjacent edges at distance `d`.
    offset: Vec2,
    /// Outward normal of the edge leaving this vertex.
    normal: Vec2,
}

/// Right-hand perpendicular `(y, -x)`; outward for counter-clockwise polygons.
fn rperp(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// Unit vector in the direction of `v`, or zero for a zero-length vector.
fn normalize_or_zero(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len > f64::EPSILON {
        v / len
    } else {
        Vec2::ZERO
    }
}

/// Miter offset for two unit normals: `(n1 + n2) / (n1 . n2 + 1)`.
///
/// The denominator is clamped so the result never exceeds [`MITER_LIMIT`].
pub fn miter_offset(n1: Vec2, n2: Vec2) -> Vec2 {
    let min_denominator = 2.0 / (MITER_LIMIT * MITER_LIMIT);
    let denominator = (n1.dot(n2) + 1.0).max(min_denominator);
    (n1 + n2) / denominator
}

fn extrude_vertices(vertices: &[Vec2]) -> Vec<ExtrudeVertex> {
    let count = vertices.len();
    (0..count)
        .map(|i| {
            let v0 = vertices[(i + count - 1) % count];
            let v1 = vertices[i];
            let v2 = vertices[(i + 1) % count];

            let n1 = normalize_or_zero(rperp(v1 - v0));
            let n2 = normalize_or_zero(rperp(v2 - v1));
            ExtrudeVertex {
                offset: miter_offset(n1, n2),
                normal: n2,
            }
        })
        .collect()
}

/// Inward and outward extrusion distances for a corner radius.
///
/// Returns `(inset, outset)`; the outline sits at `inset + outset` from the
/// polygon edges, which is never less than `1 / LINE_SCALE`.
pub fn extrusion_distances(radius: f64) -> (f64, f64) {
    let inset = -(1.0 / LINE_SCALE - radius).max(0.0);
    let outset = 1.0 / LINE_SCALE + radius - inset;
    (inset, outset)
}

/// Closed outline of a polygon extruded outward by the line thickness plus `radius`.
///
/// With `radius > 0` every corner is rounded with a tangent arc; with
/// `radius == 0` the corner is a straight miter and the path holds only lines.
///
/// # Errors
///
/// Fails with [`GeomError::TooFewVertices`] for fewer than three vertices
/// and [`GeomError::NonFiniteVertex`] for NaN or infinite coordinates.
pub fn polygon_path(vertices: &[Vec2], radius: f64) -> Result<Path, GeomError> {
    let count = vertices.len();
    if count < 3 {
        return Err(GeomError::TooFewVertices { count });
    }
    if let Some((index, v)) = vertices
        .iter()
        .enumerate()
        .find(|(_, v)| !v.x.is_finite() || !v.y.is_finite())
    {
        return Err(GeomError::NonFiniteVertex {
            index,
            x: v.x,
            y: v.y,
        });
    }
    let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };

    let extrude = extrude_vertices(vertices);
    let (inset, outset) = extrusion_distances(radius);

    let mut path = Path::new();
    let mut j = count - 1;
    for i in 0..count {
        let (va, vb) = (vertices[i], vertices[j]);
        let (ea, eb) = (extrude[i], extrude[j]);

        let inner_a = va + ea.offset * inset;
        let inner_b = vb + eb.offset * inset;

        let outer0 = inner_a + eb.normal * outset;
        let outer1 = inner_b + eb.normal * outset;
        let outer2 = inner_a + ea.offset * outset;
        let outer4 = inner_a + ea.normal * outset;

        if i == 0 {
            path.move_to(outer1);
        } else {
            path.line_to(outer1);
        }
        path.line_to(outer0);
        if radius > 0.0 {
            path.arc_to(outer2, outer4, radius);
        } else {
            path.line_to(outer2);
        }

        j = i;
    }
    path.close();
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
