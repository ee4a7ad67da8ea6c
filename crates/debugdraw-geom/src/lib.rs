//! debugdraw-geom -- geometry, transforms and meshing for physics debug drawing.
//!
//! This crate turns physics shape descriptions into triangle meshes in screen
//! space. It knows nothing about any particular physics engine: callers hand
//! it positions, radii and vertex lists, and receive meshes through the
//! [`TriangleSink`](mesh::TriangleSink) seam.
//!
//! The pipeline for every draw call is:
//!
//! 1. [`shape`] builds a [`Path`](path::Path) for the shape (the rounded
//!    polygon extrusion lives here).
//! 2. [`mesh`] lowers the path into a lyon path, tessellates it (lyon
//!    flattens the arcs), then maps every vertex through the
//!    [`View`](view::View) forward transform.
//! 3. The mesh is handed to the sink together with its [`DrawOptions`](mesh::DrawOptions).
//!
//! # Quick Start
//!
//! ```
//! use debugdraw_geom::prelude::*;
//!
//! let view = View::new(800.0, 600.0);
//! let style = DrawStyle::default();
//! let mut batch = MeshBatch::new();
//!
//! let mut drawer = DebugDrawer::new(&view, &style, &mut batch);
//! let square = [
//!     Vec2::new(-10.0, -10.0),
//!     Vec2::new(10.0, -10.0),
//!     Vec2::new(10.0, 10.0),
//!     Vec2::new(-10.0, 10.0),
//! ];
//! drawer.draw_polygon(&square, 2.0, Color::WHITE, Color::BLACK, 0);
//!
//! assert_eq!(batch.draw_count(), 2); // fill + outline
//! assert_eq!(view.world_to_screen(Vec2::ZERO), Vec2::new(400.0, 300.0));
//! ```

#![deny(unsafe_code)]

pub mod color;
pub mod draw;
pub mod mesh;
pub mod path;
pub mod shape;
pub mod view;

/// Re-export of the vector and matrix types used across the public API.
pub use kurbo::{Affine, Vec2};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while turning geometry into meshes.
#[derive(Debug, thiserror::Error)]
pub enum GeomError {
    /// A polygon needs at least three vertices to enclose an area.
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices {
        count: usize,
    },

    /// A vertex coordinate was NaN or infinite.
    #[error("vertex {index} is not finite: ({x}, {y})")]
    NonFiniteVertex {
        index: usize,
        x: f64,
        y: f64,
    },

    /// The path had no segment to draw.
    #[error("path has no drawable segment")]
    EmptyPath,

    /// lyon rejected the lowered path.
    #[error("tessellation failed: {0}")]
    Tessellation(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::color::{BodyActivity, Color, Theme};
    pub use crate::draw::{DebugDraw, DebugDrawer, DrawFlags, DrawStyle, UserData};
    pub use crate::mesh::{DrawOptions, FillRule, Mesh, MeshBatch, MeshVertex, TriangleSink};
    pub use crate::path::{ArcDirection, Path, PathCommand};
    pub use crate::shape::ShapeDescriptor;
    pub use crate::view::{Camera, View};
    pub use crate::GeomError;
    pub use kurbo::{Affine, Vec2};
}
