//! World/screen transform pipeline.
//!
//! A [`View`] is the per-call camera configuration: the caller's affine
//! matrix (rotation, zoom, pan), a camera offset, an optional vertical flip
//! and the screen size used for centering. It is a plain value; nothing in
//! this crate mutates it.
//!
//! # Forward mapping (world -> screen)
//!
//! 1. apply the caller's matrix;
//! 2. scale Y by -1 when `flip_y` is set;
//! 3. translate by the negative camera offset (Y scaled by the same sign);
//! 4. translate by half the screen size so the origin lands in the center.
//!
//! # Inverse mapping (screen -> world)
//!
//! The exact inverses of steps 4, 3, 2 followed by the inverted matrix. A
//! singular matrix has no inverse; [`View::screen_to_world`] then returns a
//! vector with both components NaN, which callers must detect with
//! [`is_undefined`] and discard.

use kurbo::{Affine, Vec2};
use serde::{Deserialize, Serialize};

/// Matrices whose determinant magnitude falls below this are treated as singular.
pub const SINGULAR_DETERMINANT: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Camera translation applied after the caller's matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    /// World-space point that ends up in the center of the screen.
    pub offset: Vec2,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Immutable transform configuration for one draw or query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    /// Caller-supplied camera matrix.
    pub matrix: Affine,
    /// Camera offset.
    pub camera: Camera,
    /// Flip the Y axis (world Y up, screen Y down).
    pub flip_y: bool,
    /// Screen width in pixels.
    pub screen_width: f64,
    /// Screen height in pixels.
    pub screen_height: f64,
}

impl View {
    /// Identity view for a screen of the given size.
    pub fn new(screen_width: f64, screen_height: f64) -> Self {
        Self {
            matrix: Affine::IDENTITY,
            camera: Camera::default(),
            flip_y: false,
            screen_width,
            screen_height,
        }
    }

    /// Replace the camera matrix.
    pub fn with_matrix(mut self, matrix: Affine) -> Self {
        self.matrix = matrix;
        self
    }

    /// Replace the camera offset.
    pub fn with_camera_offset(mut self, offset: Vec2) -> Self {
        self.camera.offset = offset;
        self
    }

    /// Enable or disable the vertical flip.
    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    fn y_sign(&self) -> f64 {
        if self.flip_y {
            -1.0
        } else {
            1.0
        }
    }

    fn center(&self) -> Vec2 {
        Vec2::new(self.screen_width / 2.0, self.screen_height / 2.0)
    }

    /// The full world -> screen matrix.
    pub fn world_to_screen_affine(&self) -> Affine {
        let f = self.y_sign();
        let offset = self.camera.offset;
        Affine::translate(self.center())
            * Affine::translate(Vec2::new(-offset.x, -offset.y * f))
            * Affine::scale_non_uniform(1.0, f)
            * self.matrix
    }

    /// Map a world point to screen pixels.
    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        (self.world_to_screen_affine() * point.to_point()).to_vec2()
    }

    /// Whether the camera matrix can be inverted.
    pub fn is_invertible(&self) -> bool {
        let det = self.matrix.determinant();
        det.is_finite() && det.abs() >= SINGULAR_DETERMINANT
    }

    /// The full screen -> world matrix, or `None` if the camera matrix is singular.
    pub fn screen_to_world_affine(&self) -> Option<Affine> {
        if !self.is_invertible() {
            return None;
        }
        let f = self.y_sign();
        let offset = self.camera.offset;
        Some(
            self.matrix.inverse()
                * Affine::scale_non_uniform(1.0, f)
                * Affine::translate(Vec2::new(offset.x, offset.y * f))
                * Affine::translate(-self.center()),
        )
    }

    /// Map a screen point to world space.
    ///
    /// Returns `(NaN, NaN)` when the camera matrix is singular.
    pub fn screen_to_world(&self, point: Vec2) -> Vec2 {
        match self.screen_to_world_affine() {
            Some(inverse) => (inverse * point.to_point()).to_vec2(),
            None => Vec2::new(f64::NAN, f64::NAN),
        }
    }

    /// Approximate number of screen pixels per world unit.
    ///
    /// The flip and the translations preserve lengths, so only the camera
    /// matrix contributes. Used to pick a flattening tolerance.
    pub fn pixel_scale(&self) -> f64 {
        self.matrix.determinant().abs().sqrt()
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Whether a vector is the "undefined" sentinel returned by a singular inverse.
pub fn is_undefined(v: Vec2) -> bool {
    v.x.is_nan() || v.y.is_nan()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!(
            (a - b).hypot() < 1e-9,
            "expected {b:?}, got {a:?}"
        );
    }

    #[test]
    fn origin_maps_to_screen_center() {
        let view = View::new(800.0, 600.0);
        assert_close(view.world_to_screen(Vec2::ZERO), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn screen_click_maps_back_to_world() {
        let view = View::new(800.0, 600.0);
        assert_close(
            view.screen_to_world(Vec2::new(800.0, 300.0)),
            Vec2::new(400.0, 0.0),
        );
    }

    #[test]
    fn flip_inverts_world_y() {
        let view = View::new(800.0, 600.0).with_flip_y(true);
        assert_close(
            view.world_to_screen(Vec2::new(0.0, 100.0)),
            Vec2::new(400.0, 200.0),
        );
    }

    #[test]
    fn camera_offset_is_centered() {
        let view = View::new(800.0, 600.0).with_camera_offset(Vec2::new(50.0, 20.0));
        assert_close(
            view.world_to_screen(Vec2::new(50.0, 20.0)),
            Vec2::new(400.0, 300.0),
        );
    }

    #[test]
    fn flipped_camera_offset_is_centered() {
        let view = View::new(640.0, 480.0)
            .with_flip_y(true)
            .with_camera_offset(Vec2::new(-30.0, 75.0));
        assert_close(
            view.world_to_screen(Vec2::new(-30.0, 75.0)),
            Vec2::new(320.0, 240.0),
        );
    }

    #[test]
    fn zoomed_rotated_round_trip() {
        let view = View::new(1024.0, 768.0)
            .with_matrix(Affine::rotate(0.7) * Affine::scale(2.5))
            .with_camera_offset(Vec2::new(12.0, -8.0))
            .with_flip_y(true);
        let p = Vec2::new(3.25, -41.0);
        assert_close(view.screen_to_world(view.world_to_screen(p)), p);
    }

    #[test]
    fn singular_matrix_yields_nan() {
        let view = View::new(800.0, 600.0).with_matrix(Affine::scale_non_uniform(1.0, 0.0));
        assert!(!view.is_invertible());
        assert!(view.screen_to_world_affine().is_none());
        let w = view.screen_to_world(Vec2::new(10.0, 10.0));
        assert!(w.x.is_nan() && w.y.is_nan());
        assert!(is_undefined(w));
    }

    #[test]
    fn pixel_scale_follows_zoom() {
        let view = View::new(800.0, 600.0).with_matrix(Affine::scale(3.0));
        assert!((view.pixel_scale() - 3.0).abs() < 1e-12);
        let flipped = view.with_flip_y(true);
        assert!((flipped.pixel_scale() - 3.0).abs() < 1e-12);
    }
}
