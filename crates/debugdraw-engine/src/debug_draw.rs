//! Walks a [`PhysicsWorld`] and issues [`DebugDraw`] calls.
//!
//! Shapes are drawn first, then joints, then contact points, each category
//! gated by the drawer's [`DrawFlags`](debugdraw_geom::draw::DrawFlags).

use debugdraw_geom::color::BodyActivity;
use debugdraw_geom::draw::DebugDraw;
use kurbo::Vec2;
use rapier2d::parry::shape::TypedShape;
use rapier2d::prelude::*;

use crate::physics::{to_vec2, PhysicsWorld};

/// Diameter of the dots marking joint anchors.
pub const JOINT_DOT_SIZE: f64 = 5.0;

/// Diameter of the dots marking contact points.
pub const CONTACT_DOT_SIZE: f64 = 2.0;

/// Draw every collider, joint and contact point of `world`.
pub fn draw_world<D: DebugDraw>(world: &PhysicsWorld, drawer: &mut D) {
    let flags = drawer.flags();

    if flags.shapes {
        for (_, collider) in world.colliders().iter() {
            draw_collider(world, collider, drawer);
        }
    }

    if flags.constraints {
        let color = drawer.constraint_color();
        for (a, b) in world.joint_anchors() {
            drawer.draw_segment(a, b, color, 0);
            drawer.draw_dot(JOINT_DOT_SIZE, a, color, 0);
            drawer.draw_dot(JOINT_DOT_SIZE, b, color, 0);
        }
    }

    if flags.collision_points {
        let color = drawer.collision_point_color();
        for point in world.contact_points() {
            drawer.draw_dot(CONTACT_DOT_SIZE, point, color, 0);
        }
    }
}

fn draw_collider<D: DebugDraw>(world: &PhysicsWorld, collider: &Collider, drawer: &mut D) {
    let activity = collider
        .parent()
        .and_then(|body| world.body_activity(body))
        .unwrap_or(BodyActivity {
            sleep_threshold: world.sleep_time_threshold(),
            ..BodyActivity::default()
        });
    let fill = drawer.shape_color(activity);
    let outline = drawer.outline_color();
    let data = collider.user_data;

    let iso = collider.position();
    let to_world = |p: &Point<Real>| to_vec2(iso * p);

    match collider.shape().as_typed_shape() {
        TypedShape::Ball(ball) => {
            let center = to_vec2(iso * Point::origin());
            let angle = f64::from(iso.rotation.angle());
            drawer.draw_circle(center, angle, f64::from(ball.radius), outline, fill, data);
        }
        TypedShape::Cuboid(cuboid) => {
            let vertices = cuboid_corners(cuboid.half_extents);
            let vertices: Vec<Vec2> = vertices.iter().map(to_world).collect();
            drawer.draw_polygon(&vertices, 0.0, outline, fill, data);
        }
        TypedShape::RoundCuboid(round) => {
            let vertices = cuboid_corners(round.inner_shape.half_extents);
            let vertices: Vec<Vec2> = vertices.iter().map(to_world).collect();
            let radius = f64::from(round.border_radius);
            drawer.draw_polygon(&vertices, radius, outline, fill, data);
        }
        TypedShape::ConvexPolygon(poly) => {
            let vertices: Vec<Vec2> = poly.points().iter().map(to_world).collect();
            drawer.draw_polygon(&vertices, 0.0, outline, fill, data);
        }
        TypedShape::RoundConvexPolygon(round) => {
            let vertices: Vec<Vec2> = round.inner_shape.points().iter().map(to_world).collect();
            let radius = f64::from(round.border_radius);
            drawer.draw_polygon(&vertices, radius, outline, fill, data);
        }
        TypedShape::Capsule(capsule) => {
            let a = to_world(&capsule.segment.a);
            let b = to_world(&capsule.segment.b);
            let radius = f64::from(capsule.radius);
            drawer.draw_fat_segment(a, b, radius, outline, fill, data);
        }
        TypedShape::Segment(segment) => {
            drawer.draw_segment(to_world(&segment.a), to_world(&segment.b), fill, data);
        }
        _ => {
            tracing::debug!(shape = ?collider.shape().shape_type(), "no debug drawing for shape");
        }
    }
}

/// Corners of a box in counter-clockwise order.
fn cuboid_corners(half_extents: Vector<Real>) -> [Point<Real>; 4] {
    let (hx, hy) = (half_extents.x, half_extents.y);
    [
        point![-hx, -hy],
        point![hx, -hy],
        point![hx, hy],
        point![-hx, hy],
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyDesc, ColliderShape};
    use debugdraw_geom::color::{Color, Theme};
    use debugdraw_geom::draw::{DrawFlags, UserData};

    /// Records calls instead of meshing them.
    #[derive(Default)]
    struct Recorder {
        flags: DrawFlags,
        theme: Theme,
        calls: Vec<(&'static str, UserData)>,
        polygons: Vec<(Vec<Vec2>, f64)>,
        dots: Vec<(f64, Vec2, Color)>,
    }

    impl DebugDraw for Recorder {
        fn draw_circle(&mut self, _: Vec2, _: f64, _: f64, _: Color, _: Color, data: UserData) {
            self.calls.push(("circle", data));
        }
        fn draw_segment(&mut self, _: Vec2, _: Vec2, _: Color, data: UserData) {
            self.calls.push(("segment", data));
        }
        fn draw_fat_segment(&mut self, _: Vec2, _: Vec2, _: f64, _: Color, _: Color, data: UserData) {
            self.calls.push(("fat_segment", data));
        }
        fn draw_polygon(&mut self, v: &[Vec2], r: f64, _: Color, _: Color, data: UserData) {
            self.calls.push(("polygon", data));
            self.polygons.push((v.to_vec(), r));
        }
        fn draw_dot(&mut self, size: f64, pos: Vec2, color: Color, data: UserData) {
            self.calls.push(("dot", data));
            self.dots.push((size, pos, color));
        }
        fn flags(&self) -> DrawFlags {
            self.flags
        }
        fn outline_color(&self) -> Color {
            self.theme.outline
        }
        fn shape_color(&self, activity: BodyActivity) -> Color {
            self.theme.shape_color(activity)
        }
        fn constraint_color(&self) -> Color {
            self.theme.constraint
        }
        fn collision_point_color(&self) -> Color {
            self.theme.collision_point
        }
    }

    #[test]
    fn every_shape_kind_is_dispatched() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let shapes = [
            ColliderShape::Ball { radius: 1.0 },
            ColliderShape::Box {
                half_width: 1.0,
                half_height: 2.0,
            },
            ColliderShape::RoundBox {
                half_width: 1.0,
                half_height: 1.0,
                border_radius: 0.5,
            },
            ColliderShape::Capsule {
                a: Vec2::new(0.0, -1.0),
                b: Vec2::new(0.0, 1.0),
                radius: 0.5,
            },
            ColliderShape::Segment {
                a: Vec2::ZERO,
                b: Vec2::new(3.0, 0.0),
            },
            ColliderShape::Polygon {
                vertices: vec![Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(0.0, 2.0)],
            },
        ];
        for (i, shape) in shapes.into_iter().enumerate() {
            let desc = BodyDesc::fixed(shape)
                .at(Vec2::new(i as f64 * 10.0, 0.0))
                .with_user_data(i as u128 + 100);
            world.add_body(&desc).unwrap();
        }

        let mut recorder = Recorder::default();
        draw_world(&world, &mut recorder);

        let mut kinds: Vec<&str> = recorder.calls.iter().map(|c| c.0).collect();
        kinds.sort_unstable();
        assert_eq!(
            kinds,
            vec!["circle", "fat_segment", "polygon", "polygon", "polygon", "segment"]
        );
        let mut tags: Vec<UserData> = recorder.calls.iter().map(|c| c.1).collect();
        tags.sort_unstable();
        assert_eq!(tags, (100..106).collect::<Vec<UserData>>());
        assert!(recorder.polygons.iter().any(|(_, r)| (*r - 0.5).abs() < 1e-6));
    }

    #[test]
    fn box_vertices_follow_body_transform() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world
            .add_body(
                &BodyDesc::fixed(ColliderShape::Box {
                    half_width: 2.0,
                    half_height: 1.0,
                })
                .at(Vec2::new(5.0, 5.0)),
            )
            .unwrap();
        let mut recorder = Recorder::default();
        draw_world(&world, &mut recorder);

        let (vertices, radius) = &recorder.polygons[0];
        assert_eq!(*radius, 0.0);
        assert!((vertices[0] - Vec2::new(3.0, 4.0)).hypot() < 1e-5);
        assert!((vertices[2] - Vec2::new(7.0, 6.0)).hypot() < 1e-5);
    }

    #[test]
    fn flags_gate_categories() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world
            .add_body(&BodyDesc::dynamic(ColliderShape::Ball { radius: 1.0 }))
            .unwrap();
        let mut recorder = Recorder {
            flags: DrawFlags {
                shapes: false,
                constraints: true,
                collision_points: true,
            },
            ..Recorder::default()
        };
        draw_world(&world, &mut recorder);
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn joints_draw_segment_and_anchor_dots() {
        use crate::drag::{GrabSpace, PivotJoint};

        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world
            .add_body(&BodyDesc::dynamic(ColliderShape::Ball { radius: 1.0 }))
            .unwrap();
        let anchor = world.add_anchor_body(Vec2::new(4.0, 0.0));
        world.add_pivot_joint(PivotJoint {
            body_a: anchor,
            body_b: body,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            max_force: 1.0,
            error_bias: 0.5,
        });

        let mut recorder = Recorder {
            flags: DrawFlags {
                shapes: false,
                constraints: true,
                collision_points: false,
            },
            ..Recorder::default()
        };
        draw_world(&world, &mut recorder);

        let kinds: Vec<&str> = recorder.calls.iter().map(|c| c.0).collect();
        assert_eq!(kinds, vec!["segment", "dot", "dot"]);
        assert!(recorder
            .dots
            .iter()
            .all(|(size, _, color)| *size == JOINT_DOT_SIZE && *color == recorder.theme.constraint));
        assert!((recorder.dots[0].1 - Vec2::new(4.0, 0.0)).hypot() < 1e-5);
    }

    #[test]
    fn contacts_drawn_as_dots() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -9.81));
        world
            .add_body(&BodyDesc::fixed(ColliderShape::Box {
                half_width: 10.0,
                half_height: 0.1,
            }))
            .unwrap();
        world
            .add_body(&BodyDesc::dynamic(ColliderShape::Ball { radius: 0.5 }).at(Vec2::new(0.0, 0.7)))
            .unwrap();
        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        let mut recorder = Recorder {
            flags: DrawFlags {
                shapes: false,
                constraints: false,
                collision_points: true,
            },
            ..Recorder::default()
        };
        draw_world(&world, &mut recorder);
        assert!(!recorder.dots.is_empty());
        assert!(recorder
            .dots
            .iter()
            .all(|(size, _, color)| *size == CONTACT_DOT_SIZE && *color == recorder.theme.collision_point));
    }
}
