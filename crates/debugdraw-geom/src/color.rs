//! Flat colors and the debug-draw theme.
//!
//! Colors are stored as linear `f32` channels in `[0, 1]`, which is the form
//! the mesh emitter stamps onto every vertex. The [`Theme`] holds the palette
//! used by debug drawing and picks a shape color from a body's sleep state.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An RGBA color with `f32` channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    /// Create a color from float channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
            a: f32::from(a) / 255.0,
        }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Channels as `[r, g, b, a]`, the layout used by [`MeshVertex`](crate::mesh::MeshVertex).
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

// ---------------------------------------------------------------------------
// BodyActivity
// ---------------------------------------------------------------------------

/// Sleep-related state of the body that owns a shape.
///
/// Only used to choose a shape color; the physics collaborator fills it in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyActivity {
    /// Whether the body is asleep.
    pub sleeping: bool,
    /// Seconds the body has been below the sleep velocity thresholds.
    pub idle_time: f64,
    /// Idle time after which a body is considered idle.
    pub sleep_threshold: f64,
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Palette for debug drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Outline color for every shape.
    pub outline: Color,
    /// Fill color for awake shapes.
    pub shape: Color,
    /// Fill color for shapes whose body is asleep.
    pub shape_sleeping: Color,
    /// Fill color for awake shapes that have been idle past the threshold.
    pub shape_idle: Color,
    /// Color for joints.
    pub constraint: Color,
    /// Color for contact points.
    pub collision_point: Color,
}

impl Theme {
    /// Pick the fill color for a shape from its body's activity.
    pub fn shape_color(&self, activity: BodyActivity) -> Color {
        if activity.sleeping {
            return self.shape_sleeping;
        }
        if activity.idle_time > activity.sleep_threshold {
            return self.shape_idle;
        }
        self.shape
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            outline: Color::from_rgba8(200, 210, 230, 255),
            shape: Color::from_rgba8(101, 130, 168, 255),
            shape_sleeping: Color::from_rgba8(128, 128, 128, 255),
            shape_idle: Color::from_rgba8(160, 160, 200, 255),
            constraint: Color::from_rgba8(0, 191, 0, 255),
            collision_point: Color::from_rgba8(255, 0, 0, 255),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
