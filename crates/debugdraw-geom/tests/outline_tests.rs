//! Integration tests for shape outlines as seen through the drawer.

use debugdraw_geom::prelude::*;
use debugdraw_geom::shape::{extrusion_distances, polygon_path, LINE_SCALE};

fn square(half: f64) -> Vec<Vec2> {
    vec![
        Vec2::new(-half, -half),
        Vec2::new(half, -half),
        Vec2::new(half, half),
        Vec2::new(-half, half),
    ]
}

fn bounds(batch: &MeshBatch) -> (f32, f32, f32, f32) {
    batch.vertices().iter().fold(
        (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
        |(x0, y0, x1, y1), v| {
            (
                x0.min(v.position[0]),
                y0.min(v.position[1]),
                x1.max(v.position[0]),
                y1.max(v.position[1]),
            )
        },
    )
}

#[test]
fn sharp_polygon_keeps_minimum_thickness() {
    let (inset, outset) = extrusion_distances(0.0);
    assert_eq!(inset + outset, 1.0 / LINE_SCALE);

    let view = View::new(800.0, 600.0);
    let style = DrawStyle {
        stroke_width: 0.0001,
        ..DrawStyle::default()
    };
    let mut batch = MeshBatch::new();
    DebugDrawer::new(&view, &style, &mut batch).draw_polygon(
        &square(10.0),
        0.0,
        Color::WHITE,
        Color::BLACK,
        0,
    );

    // fill spans the square grown by one unit on every side
    let (x0, y0, x1, y1) = bounds(&batch);
    assert!((x0 - 389.0).abs() < 1e-3 && (x1 - 411.0).abs() < 1e-3);
    assert!((y0 - 289.0).abs() < 1e-3 && (y1 - 311.0).abs() < 1e-3);
}

#[test]
fn rounded_polygon_grows_with_radius() {
    let view = View::new(800.0, 600.0);
    let style = DrawStyle::default();

    let mut small = MeshBatch::new();
    DebugDrawer::new(&view, &style, &mut small).draw_polygon(
        &square(10.0),
        1.0,
        Color::WHITE,
        Color::BLACK,
        0,
    );
    let mut large = MeshBatch::new();
    DebugDrawer::new(&view, &style, &mut large).draw_polygon(
        &square(10.0),
        4.0,
        Color::WHITE,
        Color::BLACK,
        0,
    );

    let (sx0, _, sx1, _) = bounds(&small);
    let (lx0, _, lx1, _) = bounds(&large);
    assert!(lx1 - lx0 > sx1 - sx0);
}

#[test]
fn flipped_view_mirrors_polygon() {
    let triangle = [Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), Vec2::new(0.0, 20.0)];
    let style = DrawStyle::default();

    let mut upright = MeshBatch::new();
    let view = View::new(800.0, 600.0);
    DebugDrawer::new(&view, &style, &mut upright).draw_polygon(
        &triangle,
        0.0,
        Color::WHITE,
        Color::BLACK,
        0,
    );
    let mut flipped = MeshBatch::new();
    let view = view.with_flip_y(true);
    DebugDrawer::new(&view, &style, &mut flipped).draw_polygon(
        &triangle,
        0.0,
        Color::WHITE,
        Color::BLACK,
        0,
    );

    let (_, uy0, _, uy1) = bounds(&upright);
    let (_, fy0, _, fy1) = bounds(&flipped);
    assert!((uy1 - 300.0 - (300.0 - fy0)).abs() < 1e-2);
    assert!((300.0 - uy0 - (fy1 - 300.0)).abs() < 1e-2);
}

#[test]
fn polygon_path_rejects_bad_input() {
    assert!(matches!(
        polygon_path(&[], 1.0),
        Err(GeomError::TooFewVertices { count: 0 })
    ));
    let bad = [Vec2::ZERO, Vec2::new(1.0, f64::INFINITY), Vec2::new(0.0, 1.0)];
    assert!(matches!(
        polygon_path(&bad, 1.0),
        Err(GeomError::NonFiniteVertex { index: 1, .. })
    ));
}
