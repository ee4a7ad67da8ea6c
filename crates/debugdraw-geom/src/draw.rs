//! The debug-draw callback set and its mesh-emitting implementation.
//!
//! [`DebugDraw`] is the interface a physics world drives once per frame.
//! [`DebugDrawer`] implements it by building shape paths, tessellating them
//! through the [`View`] and handing the meshes to a [`TriangleSink`]. A
//! drawer is cheap to build and borrows its configuration, so a new one is
//! made for every frame.

use kurbo::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::{BodyActivity, Color, Theme};
use crate::mesh::{fill_mesh, stroke_mesh, DrawOptions, TriangleSink};
use crate::path::Path;
use crate::shape::{
    append_radius_line, circle_path, dot_path, fat_segment_path, polygon_path, segment_path,
    ShapeDescriptor,
};
use crate::view::View;
use crate::GeomError;

/// Opaque per-shape tag forwarded by the physics world. Never interpreted here.
pub type UserData = u128;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which categories of debug geometry to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawFlags {
    pub shapes: bool,
    pub constraints: bool,
    pub collision_points: bool,
}

impl Default for DrawFlags {
    fn default() -> Self {
        Self {
            shapes: true,
            constraints: true,
            collision_points: true,
        }
    }
}

/// Per-frame drawing style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawStyle {
    /// Palette.
    pub theme: Theme,
    /// Outline width in world units.
    pub stroke_width: f64,
    /// Options for filled interiors.
    pub fill_options: DrawOptions,
    /// Options for outlines.
    pub stroke_options: DrawOptions,
    /// Enabled categories.
    pub flags: DrawFlags,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            stroke_width: 1.0,
            fill_options: DrawOptions::default(),
            stroke_options: DrawOptions::default(),
            flags: DrawFlags::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// DebugDraw
// ---------------------------------------------------------------------------

/// Callbacks a physics world invokes to visualize its state.
pub trait DebugDraw {
    /// Filled circle with an outline and a radius line at `angle`.
    fn draw_circle(
        &mut self,
        pos: Vec2,
        angle: f64,
        radius: f64,
        outline: Color,
        fill: Color,
        data: UserData,
    );

    /// Hairline segment.
    fn draw_segment(&mut self, a: Vec2, b: Vec2, color: Color, data: UserData);

    /// Capsule between `a` and `b`.
    fn draw_fat_segment(
        &mut self,
        a: Vec2,
        b: Vec2,
        radius: f64,
        outline: Color,
        fill: Color,
        data: UserData,
    );

    /// Convex polygon with corner radius `radius`.
    fn draw_polygon(
        &mut self,
        vertices: &[Vec2],
        radius: f64,
        outline: Color,
        fill: Color,
        data: UserData,
    );

    /// Filled dot of diameter `size`.
    fn draw_dot(&mut self, size: f64, pos: Vec2, color: Color, data: UserData);

    fn flags(&self) -> DrawFlags;
    fn outline_color(&self) -> Color;
    fn shape_color(&self, activity: BodyActivity) -> Color;
    fn constraint_color(&self) -> Color;
    fn collision_point_color(&self) -> Color;
}

// ---------------------------------------------------------------------------
// DebugDrawer
// ---------------------------------------------------------------------------

/// [`DebugDraw`] implementation that emits meshes into a [`TriangleSink`].
pub struct DebugDrawer<'a, S: TriangleSink> {
    view: &'a View,
    style: &'a DrawStyle,
    sink: &'a mut S,
    skipped: usize,
}

impl<'a, S: TriangleSink> DebugDrawer<'a, S> {
    pub fn new(view: &'a View, style: &'a DrawStyle, sink: &'a mut S) -> Self {
        Self {
            view,
            style,
            sink,
            skipped: 0,
        }
    }

    /// Number of shapes dropped because their geometry could not be meshed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Draw a shape from its descriptor.
    pub fn draw_shape(&mut self, shape: &ShapeDescriptor, outline: Color, fill: Color, data: UserData) {
        match shape {
            ShapeDescriptor::Circle { pos, angle, radius } => {
                self.draw_circle(*pos, *angle, *radius, outline, fill, data)
            }
            ShapeDescriptor::Segment { a, b } => self.draw_segment(*a, *b, fill, data),
            ShapeDescriptor::FatSegment { a, b, radius } => {
                self.draw_fat_segment(*a, *b, *radius, outline, fill, data)
            }
            ShapeDescriptor::Polygon { vertices, radius } => {
                self.draw_polygon(vertices, *radius, outline, fill, data)
            }
            ShapeDescriptor::Dot { pos, size } => self.draw_dot(*size, *pos, fill, data),
        }
    }

    fn fill(&mut self, path: &Path, color: Color) -> Result<(), GeomError> {
        let mesh = fill_mesh(path, self.view, color, &self.style.fill_options)?;
        self.sink.draw_triangles(&mesh, &self.style.fill_options);
        Ok(())
    }

    fn stroke(&mut self, path: &Path, color: Color) -> Result<(), GeomError> {
        let mesh = stroke_mesh(
            path,
            self.view,
            color,
            self.style.stroke_width,
            &self.style.stroke_options,
        )?;
        self.sink.draw_triangles(&mesh, &self.style.stroke_options);
        Ok(())
    }

    fn skip(&mut self, kind: &'static str, result: Result<(), GeomError>) {
        if let Err(e) = result {
            self.skipped += 1;
            tracing::warn!(error = %e, shape = kind, "skipping debug shape");
        }
    }
}

impl<S: TriangleSink> DebugDraw for DebugDrawer<'_, S> {
    fn draw_circle(
        &mut self,
        pos: Vec2,
        angle: f64,
        radius: f64,
        outline: Color,
        fill: Color,
        _data: UserData,
    ) {
        let mut path = circle_path(pos, radius);
        let result = self.fill(&path, fill).and_then(|()| {
            append_radius_line(&mut path, pos, angle, radius);
            self.stroke(&path, outline)
        });
        self.skip("circle", result);
    }

    fn draw_segment(&mut self, a: Vec2, b: Vec2, color: Color, _data: UserData) {
        let result = self.stroke(&segment_path(a, b), color);
        self.skip("segment", result);
    }

    fn draw_fat_segment(
        &mut self,
        a: Vec2,
        b: Vec2,
        radius: f64,
        outline: Color,
        fill: Color,
        _data: UserData,
    ) {
        let path = fat_segment_path(a, b, radius);
        let result = self
            .fill(&path, fill)
            .and_then(|()| self.stroke(&path, outline));
        self.skip("fat segment", result);
    }

    fn draw_polygon(
        &mut self,
        vertices: &[Vec2],
        radius: f64,
        outline: Color,
        fill: Color,
        _data: UserData,
    ) {
        let result = polygon_path(vertices, radius).and_then(|path| {
            self.fill(&path, fill)?;
            self.stroke(&path, outline)
        });
        self.skip("polygon", result);
    }

    fn draw_dot(&mut self, size: f64, pos: Vec2, color: Color, _data: UserData) {
        let result = self.fill(&dot_path(pos, size), color);
        self.skip("dot", result);
    }

    fn flags(&self) -> DrawFlags {
        self.style.flags
    }

    fn outline_color(&self) -> Color {
        self.style.theme.outline
    }

    fn shape_color(&self, activity: BodyActivity) -> Color {
        self.style.theme.shape_color(activity)
    }

    fn constraint_color(&self) -> Color {
        self.style.theme.constraint
    }

    fn collision_point_color(&self) -> Color {
        self.style.theme.collision_point
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
