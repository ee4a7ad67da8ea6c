//! Path tessellation into screen-space triangle meshes.
//!
//! Paths are lowered to lyon paths in world space and tessellated there, with
//! lyon flattening the arcs to a tolerance derived from the view's zoom.
//! Every output vertex is then mapped through the view's forward transform. All
//! vertices carry the texture coordinate `(1, 1)` (a solid white texel in
//! the renderer) and the flat draw color.

use kurbo::Vec2;
use lyon::path::{Path as LyonPath, PathEvent};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, LineJoin, StrokeOptions,
    StrokeTessellator, StrokeVertex, VertexBuffers,
};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::path::Path;
use crate::view::{View, SINGULAR_DETERMINANT};
use crate::GeomError;

/// Maximum chord error of flattened arcs, in screen pixels.
pub const SCREEN_TOLERANCE: f64 = 0.25;

// ---------------------------------------------------------------------------
// Vertex and mesh types
// ---------------------------------------------------------------------------

/// One screen-space vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    /// Position in screen pixels.
    pub position: [f32; 2],
    /// Texture coordinate; always `(1, 1)` for debug geometry.
    pub uv: [f32; 2],
    /// RGBA color.
    pub color: [f32; 4],
}

/// An indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Polygon fill rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    /// Fill where the winding number is non-zero.
    #[default]
    NonZero,
    /// Fill where the winding number is odd.
    EvenOdd,
}

impl From<FillRule> for lyon::tessellation::FillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::NonZero => lyon::tessellation::FillRule::NonZero,
            FillRule::EvenOdd => lyon::tessellation::FillRule::EvenOdd,
        }
    }
}

/// Options handed to the sink with every mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawOptions {
    /// Applied by [`fill_mesh`] during tessellation; sinks receive it for
    /// reference only.
    pub fill_rule: FillRule,
    /// Request for edge anti-aliasing. Honoring it is up to the sink.
    pub anti_alias: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            fill_rule: FillRule::NonZero,
            anti_alias: true,
        }
    }
}

// ---------------------------------------------------------------------------
// TriangleSink
// ---------------------------------------------------------------------------

/// The renderer's triangle draw primitive.
///
/// Meshes arrive already in screen space. Implementations must not keep
/// references to the mesh past the call.
pub trait TriangleSink {
    fn draw_triangles(&mut self, mesh: &Mesh, options: &DrawOptions);
}

/// Range of one draw call inside a [`MeshBatch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRange {
    /// First index in [`MeshBatch::indices`].
    pub first_index: u32,
    /// Number of indices.
    pub index_count: u32,
    pub options: DrawOptions,
}

/// A [`TriangleSink`] that concatenates every mesh drawn during a frame.
///
/// Indices are re-based as meshes are appended, so the whole batch can be
/// uploaded as one vertex and one index buffer.
#[derive(Debug, Clone, Default)]
pub struct MeshBatch {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    draws: Vec<DrawRange>,
}

impl MeshBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all geometry, keeping the allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draws(&self) -> &[DrawRange] {
        &self.draws
    }

    /// Number of `draw_triangles` calls recorded since the last clear.
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl TriangleSink for MeshBatch {
    fn draw_triangles(&mut self, mesh: &Mesh, options: &DrawOptions) {
        let base = self.vertices.len() as u32;
        let first_index = self.indices.len() as u32;
        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend(mesh.indices.iter().map(|i| i + base));
        self.draws.push(DrawRange {
            first_index,
            index_count: mesh.indices.len() as u32,
            options: *options,
        });
    }
}

// ---------------------------------------------------------------------------
// Tessellation
// ---------------------------------------------------------------------------

/// Flattening tolerance in world units for a given view.
pub fn world_tolerance(view: &View) -> f64 {
    let scale = view.pixel_scale();
    if scale.is_finite() && scale * scale >= SINGULAR_DETERMINANT {
        SCREEN_TOLERANCE / scale
    } else {
        SCREEN_TOLERANCE
    }
}

/// Lower `path`, rejecting paths with nothing to draw.
fn lower_checked(path: &Path) -> Result<LyonPath, GeomError> {
    let lowered = path.to_lyon();
    let drawable = lowered
        .iter()
        .any(|event| !matches!(event, PathEvent::Begin { .. } | PathEvent::End { .. }));
    if !drawable {
        return Err(GeomError::EmptyPath);
    }
    Ok(lowered)
}

/// Maps a world-space lyon vertex into a screen-space [`MeshVertex`].
struct ScreenVertex {
    affine: kurbo::Affine,
    color: [f32; 4],
}

impl ScreenVertex {
    fn make(&self, position: lyon::math::Point) -> MeshVertex {
        let world = Vec2::new(f64::from(position.x), f64::from(position.y));
        let screen = self.affine * world.to_point();
        MeshVertex {
            position: [screen.x as f32, screen.y as f32],
            uv: [1.0, 1.0],
            color: self.color,
        }
    }
}

fn into_mesh(buffers: VertexBuffers<MeshVertex, u32>) -> Mesh {
    Mesh {
        vertices: buffers.vertices,
        indices: buffers.indices,
    }
}

/// Tessellate the interior of `path` into a screen-space mesh.
///
/// # Errors
///
/// [`GeomError::EmptyPath`] when the path has no segment and
/// [`GeomError::Tessellation`] when lyon rejects the geometry.
pub fn fill_mesh(
    path: &Path,
    view: &View,
    color: Color,
    options: &DrawOptions,
) -> Result<Mesh, GeomError> {
    let tolerance = world_tolerance(view);
    let lyon_path = lower_checked(path)?;

    let emit = ScreenVertex {
        affine: view.world_to_screen_affine(),
        color: color.to_array(),
    };
    let fill_options = FillOptions::default()
        .with_fill_rule(options.fill_rule.into())
        .with_tolerance(tolerance as f32);

    let mut buffers: VertexBuffers<MeshVertex, u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &lyon_path,
            &fill_options,
            &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| emit.make(v.position())),
        )
        .map_err(|e| GeomError::Tessellation(format!("{e:?}")))?;

    Ok(into_mesh(buffers))
}

/// Tessellate the outline of `path` with the given width in world units.
///
/// # Errors
///
/// Same as [`fill_mesh`].
pub fn stroke_mesh(
    path: &Path,
    view: &View,
    color: Color,
    width: f64,
    _options: &DrawOptions,
) -> Result<Mesh, GeomError> {
    let tolerance = world_tolerance(view);
    let lyon_path = lower_checked(path)?;

    let emit = ScreenVertex {
        affine: view.world_to_screen_affine(),
        color: color.to_array(),
    };
    let stroke_options = StrokeOptions::default()
        .with_line_width(width as f32)
        .with_line_join(LineJoin::Round)
        .with_tolerance(tolerance as f32);

    let mut buffers: VertexBuffers<MeshVertex, u32> = VertexBuffers::new();
    StrokeTessellator::new()
        .tessellate_path(
            &lyon_path,
            &stroke_options,
            &mut BuffersBuilder::new(&mut buffers, |v: StrokeVertex| emit.make(v.position())),
        )
        .map_err(|e| GeomError::Tessellation(format!("{e:?}")))?;

    Ok(into_mesh(buffers))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
