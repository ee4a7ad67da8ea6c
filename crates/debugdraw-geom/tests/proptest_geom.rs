//! Property tests for the transform pipeline and the polygon outline.
//!
//! These tests generate random cameras and random convex polygons and check
//! the invariants the drawer relies on: screen/world mapping is invertible
//! for non-singular matrices, singular matrices produce the NaN sentinel, and
//! polygon outlines are closed, finite and never cut into the polygon.

use std::f64::consts::{PI, TAU};

use debugdraw_geom::prelude::*;
use debugdraw_geom::shape::polygon_path;
use debugdraw_geom::view::is_undefined;
use lyon::path::iterator::PathIterator;
use lyon::path::PathEvent;
use proptest::prelude::*;

/// Strategy for finite coordinates in a sane world range.
fn coord() -> impl Strategy<Value = f64> {
    (-100_000i32..100_000i32).prop_map(|v| f64::from(v) * 0.01)
}

/// Strategy for a non-singular camera view.
fn view_strategy() -> impl Strategy<Value = View> {
    (
        0.0..TAU,
        0.1f64..10.0,
        coord(),
        coord(),
        any::<bool>(),
        100.0f64..4000.0,
        100.0f64..4000.0,
    )
        .prop_map(|(angle, zoom, ox, oy, flip, w, h)| {
            View::new(w, h)
                .with_matrix(Affine::rotate(angle) * Affine::scale(zoom))
                .with_camera_offset(Vec2::new(ox, oy))
                .with_flip_y(flip)
        })
}

/// Flattened outline points and the number of closed subpaths.
fn outline(path: &Path, tolerance: f32) -> (Vec<Vec2>, usize) {
    let mut points = Vec::new();
    let mut closed = 0;
    for event in path.to_lyon().iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => points.push(Vec2::new(f64::from(at.x), f64::from(at.y))),
            PathEvent::Line { to, .. } => points.push(Vec2::new(f64::from(to.x), f64::from(to.y))),
            PathEvent::End { close: true, .. } => closed += 1,
            _ => {}
        }
    }
    (points, closed)
}

fn regular_polygon(n: usize, center: Vec2, radius: f64, rotation: f64) -> Vec<Vec2> {
    (0..n)
        .map(|k| {
            let a = rotation + TAU * k as f64 / n as f64;
            center + Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn screen_world_round_trip(view in view_strategy(), x in coord(), y in coord()) {
        let p = Vec2::new(x, y);
        let back = view.screen_to_world(view.world_to_screen(p));
        let tolerance = 1e-6 * (1.0 + p.hypot() + view.camera.offset.hypot());
        prop_assert!((back - p).hypot() < tolerance, "{:?} -> {:?}", p, back);
    }

    #[test]
    fn singular_matrix_is_undefined(sx in -10.0f64..10.0, x in coord(), y in coord(), flip in any::<bool>()) {
        let view = View::new(800.0, 600.0)
            .with_matrix(Affine::scale_non_uniform(sx, 0.0))
            .with_flip_y(flip);
        prop_assert!(is_undefined(view.screen_to_world(Vec2::new(x, y))));
    }

    #[test]
    fn polygon_outline_is_closed_finite_and_outside(
        n in 3usize..12,
        cx in coord(),
        cy in coord(),
        size in 2.0f64..200.0,
        rotation in 0.0..PI,
        radius in 0.0f64..5.0,
    ) {
        let center = Vec2::new(cx, cy);
        let vertices = regular_polygon(n, center, size, rotation);
        let path = polygon_path(&vertices, radius).unwrap();
        prop_assert!(path.is_closed());

        let (points, closed) = outline(&path, 0.05);
        prop_assert_eq!(closed, 1);

        // The outline keeps at least the minimum line thickness off every edge.
        let apothem = size * (PI / n as f64).cos();
        for p in &points {
            prop_assert!(p.x.is_finite() && p.y.is_finite());
            prop_assert!((*p - center).hypot() >= apothem + 1.0 - 0.1, "{:?}", p);
        }
    }
}
