//! rapier2d physics world used by the debug drawer and the drag controller.
//!
//! [`PhysicsWorld`] owns the full rapier simulation state (bodies, colliders,
//! joints, islands, broad and narrow phase, CCD and the query pipeline). It
//! exposes a small body-oriented API for building scenes, implements
//! [`GrabSpace`] so the [`DragController`](crate::drag::DragController) can
//! pick bodies and attach drag joints, and hands out read access to the
//! rapier sets for [`draw_world`](crate::debug_draw::draw_world).
//!
//! # Grabbable shapes
//!
//! Every collider is a member of all interaction groups except that a
//! non-grabbable collider drops the [`GRABBABLE_MASK_BIT`] group. Pointer
//! queries filter on that bit, so non-interactive geometry (walls, ground)
//! is invisible to the pointer while still colliding normally.
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`. With a fixed timestep the
//! simulation is deterministic on the same platform.

use debugdraw_geom::color::BodyActivity;
use kurbo::Vec2;
use rapier2d::parry::query::PointQuery;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::drag::{GrabFilter, GrabSpace, NearestHit, PivotJoint, GRABBABLE_MASK_BIT};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while building bodies.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// A shape dimension was zero, negative, NaN or infinite.
    #[error("shape dimension `{name}` must be positive and finite, got {value}")]
    InvalidDimension {
        name: &'static str,
        value: f64,
    },

    /// The convex hull of the given points has no area.
    #[error("convex hull of {count} points is degenerate")]
    DegenerateHull {
        count: usize,
    },
}

// ---------------------------------------------------------------------------
// Body descriptors
// ---------------------------------------------------------------------------

/// How rapier treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Fully simulated.
    Dynamic,
    /// Moved by setting its velocity.
    Kinematic,
    /// Immovable.
    Static,
}

/// Collider geometry in the body's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Ball {
        radius: f64,
    },
    Box {
        half_width: f64,
        half_height: f64,
    },
    /// Box with rounded corners; the border extends the half extents.
    RoundBox {
        half_width: f64,
        half_height: f64,
        border_radius: f64,
    },
    Capsule {
        a: Vec2,
        b: Vec2,
        radius: f64,
    },
    Segment {
        a: Vec2,
        b: Vec2,
    },
    /// Convex hull of the given points.
    Polygon {
        vertices: Vec<Vec2>,
    },
    /// Convex hull with rounded corners.
    RoundPolygon {
        vertices: Vec<Vec2>,
        border_radius: f64,
    },
}

/// Everything needed to create one body with a single collider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    /// Rotation in radians.
    pub angle: f64,
    pub velocity: Vec2,
    pub collider: ColliderShape,
    pub density: f64,
    /// Coefficient of restitution. 0.0 = no bounce, 1.0 = perfect bounce.
    pub restitution: f64,
    pub friction: f64,
    /// Whether the pointer may pick this body.
    pub grabbable: bool,
    /// Opaque tag forwarded to the debug drawer.
    pub user_data: u128,
}

impl BodyDesc {
    /// A grabbable dynamic body at the origin.
    pub fn dynamic(collider: ColliderShape) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            collider,
            density: 1.0,
            restitution: 0.0,
            friction: 0.7,
            grabbable: true,
            user_data: 0,
        }
    }

    /// A non-grabbable static body at the origin.
    pub fn fixed(collider: ColliderShape) -> Self {
        Self {
            kind: BodyKind::Static,
            grabbable: false,
            ..Self::dynamic(collider)
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_grabbable(mut self, grabbable: bool) -> Self {
        self.grabbable = grabbable;
        self
    }

    pub fn with_user_data(mut self, user_data: u128) -> Self {
        self.user_data = user_data;
        self
    }
}

// ---------------------------------------------------------------------------
// PhysicsConfig
// ---------------------------------------------------------------------------

/// World-level physics settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration.
    pub gravity: Vec2,
    /// Seconds of rest after which a body is drawn as idle.
    pub sleep_time_threshold: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -100.0),
            sleep_time_threshold: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub(crate) fn to_vec2(p: Point<Real>) -> Vec2 {
    Vec2::new(f64::from(p.x), f64::from(p.y))
}

fn to_point(v: Vec2) -> Point<Real> {
    point![v.x as Real, v.y as Real]
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x as Real, v.y as Real]
}

fn require_positive(name: &'static str, value: f64) -> Result<Real, PhysicsError> {
    if value.is_finite() && value > 0.0 {
        Ok(value as Real)
    } else {
        Err(PhysicsError::InvalidDimension { name, value })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<Real, PhysicsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value as Real)
    } else {
        Err(PhysicsError::InvalidDimension { name, value })
    }
}

fn build_shape(shape: &ColliderShape) -> Result<SharedShape, PhysicsError> {
    let shape = match shape {
        ColliderShape::Ball { radius } => SharedShape::ball(require_positive("radius", *radius)?),
        ColliderShape::Box {
            half_width,
            half_height,
        } => SharedShape::cuboid(
            require_positive("half_width", *half_width)?,
            require_positive("half_height", *half_height)?,
        ),
        ColliderShape::RoundBox {
            half_width,
            half_height,
            border_radius,
        } => SharedShape::round_cuboid(
            require_positive("half_width", *half_width)?,
            require_positive("half_height", *half_height)?,
            require_non_negative("border_radius", *border_radius)?,
        ),
        ColliderShape::Capsule { a, b, radius } => {
            SharedShape::capsule(to_point(*a), to_point(*b), require_positive("radius", *radius)?)
        }
        ColliderShape::Segment { a, b } => SharedShape::segment(to_point(*a), to_point(*b)),
        ColliderShape::Polygon { vertices } => {
            let points: Vec<Point<Real>> = vertices.iter().copied().map(to_point).collect();
            SharedShape::convex_hull(&points).ok_or(PhysicsError::DegenerateHull {
                count: vertices.len(),
            })?
        }
        ColliderShape::RoundPolygon {
            vertices,
            border_radius,
        } => {
            let points: Vec<Point<Real>> = vertices.iter().copied().map(to_point).collect();
            let border = require_non_negative("border_radius", *border_radius)?;
            SharedShape::round_convex_hull(&points, border).ok_or(PhysicsError::DegenerateHull {
                count: vertices.len(),
            })?
        }
    };
    Ok(shape)
}

/// Critically damped spring gains for the drag joint motors.
///
/// `error_bias` is the fraction of error left after one second, so the error
/// decays at `-ln(error_bias)` per second.
fn drag_gains(error_bias: f64) -> (Real, Real) {
    let rate = -error_bias.clamp(f64::MIN_POSITIVE, 1.0).ln();
    ((rate * rate) as Real, (2.0 * rate) as Real)
}

fn error_bias_from_stiffness(stiffness: Real) -> f64 {
    (-f64::from(stiffness).sqrt()).exp()
}

fn collision_groups(grabbable: bool) -> InteractionGroups {
    let grab_bit = Group::from_bits_truncate(GRABBABLE_MASK_BIT);
    let memberships = if grabbable {
        Group::ALL
    } else {
        Group::ALL.difference(grab_bit)
    };
    InteractionGroups::new(memberships, Group::ALL)
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Owns the rapier2d simulation.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    sleep_time_threshold: f64,
}

impl PhysicsWorld {
    /// Create an empty world with the given gravity.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vector(gravity),
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            sleep_time_threshold: PhysicsConfig::default().sleep_time_threshold,
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        let mut world = Self::new(config.gravity);
        world.sleep_time_threshold = config.sleep_time_threshold;
        world
    }

    /// Add a body with one collider.
    ///
    /// # Errors
    ///
    /// Fails when the collider geometry is invalid; nothing is added then.
    pub fn add_body(&mut self, desc: &BodyDesc) -> Result<RigidBodyHandle, PhysicsError> {
        let shape = build_shape(&desc.collider)?;

        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let mut builder = builder
            .translation(to_vector(desc.position))
            .rotation(desc.angle as Real);
        if desc.kind != BodyKind::Static {
            builder = builder.linvel(to_vector(desc.velocity));
        }
        let body_handle = self.rigid_body_set.insert(builder.build());

        let collider = ColliderBuilder::new(shape)
            .density(desc.density as Real)
            .restitution(desc.restitution as Real)
            .friction(desc.friction as Real)
            .collision_groups(collision_groups(desc.grabbable))
            .user_data(desc.user_data)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        self.query_pipeline.update(&self.collider_set);

        tracing::debug!(?body_handle, kind = ?desc.kind, "body added");
        Ok(body_handle)
    }

    /// Remove a body with its colliders and joints. Returns whether it existed.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        let removed = self
            .rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some();
        if removed {
            self.query_pipeline.update(&self.collider_set);
        }
        removed
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.integration_params.dt = dt as Real;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(), // physics hooks
            &(), // events
        );
    }

    /// Number of bodies, including drag anchors.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Number of impulse joints, including drag joints.
    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }

    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set
            .get(handle)
            .map(|rb| Vec2::new(f64::from(rb.translation().x), f64::from(rb.translation().y)))
    }

    pub fn body_angle(&self, handle: RigidBodyHandle) -> Option<f64> {
        self.rigid_body_set
            .get(handle)
            .map(|rb| f64::from(rb.rotation().angle()))
    }

    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.rigid_body_set
            .get(handle)
            .map(|rb| Vec2::new(f64::from(rb.linvel().x), f64::from(rb.linvel().y)))
    }

    /// Sleep state of a body, for picking its debug color.
    pub fn body_activity(&self, handle: RigidBodyHandle) -> Option<BodyActivity> {
        self.rigid_body_set.get(handle).map(|rb| BodyActivity {
            sleeping: rb.is_sleeping(),
            idle_time: f64::from(rb.activation().time_since_can_sleep),
            sleep_threshold: self.sleep_time_threshold,
        })
    }

    pub fn sleep_time_threshold(&self) -> f64 {
        self.sleep_time_threshold
    }

    /// World-space points of every active contact.
    pub fn contact_points(&self) -> Vec<Vec2> {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .flat_map(|pair| pair.manifolds.iter())
            .flat_map(|manifold| manifold.data.solver_contacts.iter())
            .map(|contact| to_vec2(contact.point))
            .collect()
    }

    /// World-space anchor points of every impulse joint.
    pub fn joint_anchors(&self) -> Vec<(Vec2, Vec2)> {
        self.impulse_joint_set
            .iter()
            .filter_map(|(_, joint)| {
                let rb1 = self.rigid_body_set.get(joint.body1)?;
                let rb2 = self.rigid_body_set.get(joint.body2)?;
                let a = rb1.position() * joint.data.local_anchor1();
                let b = rb2.position() * joint.data.local_anchor2();
                Some((to_vec2(a), to_vec2(b)))
            })
            .collect()
    }

    /// Parameters of a drag joint created through [`GrabSpace::add_pivot_joint`],
    /// read back from the joint's motors.
    pub fn pivot_joint(&self, handle: ImpulseJointHandle) -> Option<PivotJoint<RigidBodyHandle>> {
        let joint = self.impulse_joint_set.get(handle)?;
        let motor = joint.data.motor(JointAxis::LinX)?;
        Some(PivotJoint {
            body_a: joint.body1,
            body_b: joint.body2,
            anchor_a: to_vec2(joint.data.local_anchor1()),
            anchor_b: to_vec2(joint.data.local_anchor2()),
            max_force: f64::from(motor.max_force),
            error_bias: error_bias_from_stiffness(motor.stiffness),
        })
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.rigid_body_set
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.collider_set
    }

    pub fn impulse_joints(&self) -> &ImpulseJointSet {
        &self.impulse_joint_set
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::from_config(&PhysicsConfig::default())
    }
}

// ---------------------------------------------------------------------------
// GrabSpace
// ---------------------------------------------------------------------------

impl GrabSpace for PhysicsWorld {
    type Body = RigidBodyHandle;
    type Joint = ImpulseJointHandle;

    fn point_query_nearest(
        &self,
        point: Vec2,
        max_distance: f64,
        filter: GrabFilter,
    ) -> Option<NearestHit<RigidBodyHandle>> {
        let groups = InteractionGroups::new(
            Group::from_bits_truncate(filter.categories),
            Group::from_bits_truncate(filter.mask),
        );
        let query = to_point(point);
        let (handle, projection) = self.query_pipeline.project_point(
            &self.rigid_body_set,
            &self.collider_set,
            &query,
            true,
            QueryFilter::new().groups(groups),
        )?;
        let collider = self.collider_set.get(handle)?;
        let body = collider.parent()?;

        let (surface, distance) = if projection.is_inside {
            let boundary = collider
                .shape()
                .project_point(collider.position(), &query, false);
            let surface = to_vec2(boundary.point);
            let depth = (surface - point).hypot();
            // No unique boundary point at a ball's center; parry yields NaN there.
            if depth.is_finite() {
                (surface, -depth)
            } else {
                (point, 0.0)
            }
        } else {
            let surface = to_vec2(projection.point);
            (surface, (surface - point).hypot())
        };

        (distance <= max_distance).then_some(NearestHit {
            body,
            point: surface,
            distance,
        })
    }

    fn body_mass(&self, body: RigidBodyHandle) -> f64 {
        self.rigid_body_set
            .get(body)
            .filter(|rb| rb.is_dynamic())
            .map_or(f64::INFINITY, |rb| f64::from(rb.mass()))
    }

    fn world_to_local(&self, body: RigidBodyHandle, point: Vec2) -> Vec2 {
        match self.rigid_body_set.get(body) {
            Some(rb) => to_vec2(rb.position().inverse_transform_point(&to_point(point))),
            None => point,
        }
    }

    fn add_anchor_body(&mut self, position: Vec2) -> RigidBodyHandle {
        let anchor = RigidBodyBuilder::kinematic_velocity_based()
            .translation(to_vector(position))
            .build();
        self.rigid_body_set.insert(anchor)
    }

    fn remove_anchor_body(&mut self, body: RigidBodyHandle) {
        self.remove_body(body);
    }

    fn set_anchor_state(&mut self, body: RigidBodyHandle, position: Vec2, velocity: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(body) {
            rb.set_translation(to_vector(position), true);
            rb.set_linvel(to_vector(velocity), true);
        }
    }

    /// Free joint whose two linear axes are position motors pulling the
    /// anchors together, each limited to `max_force`.
    fn add_pivot_joint(&mut self, joint: PivotJoint<RigidBodyHandle>) -> ImpulseJointHandle {
        let (stiffness, damping) = drag_gains(joint.error_bias);
        let max_force = joint.max_force as Real;
        let pivot = GenericJointBuilder::new(JointAxesMask::empty())
            .local_anchor1(to_point(joint.anchor_a))
            .local_anchor2(to_point(joint.anchor_b))
            .motor_position(JointAxis::LinX, 0.0, stiffness, damping)
            .motor_position(JointAxis::LinY, 0.0, stiffness, damping)
            .motor_max_force(JointAxis::LinX, max_force)
            .motor_max_force(JointAxis::LinY, max_force)
            .contacts_enabled(false)
            .build();
        self.impulse_joint_set
            .insert(joint.body_a, joint.body_b, pivot, true)
    }

    fn remove_joint(&mut self, joint: ImpulseJointHandle) {
        self.impulse_joint_set.remove(joint, true);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(radius: f64) -> ColliderShape {
        ColliderShape::Ball { radius }
    }

    #[test]
    fn world_starts_empty() {
        let pw = PhysicsWorld::new(Vec2::ZERO);
        assert_eq!(pw.body_count(), 0);
        assert_eq!(pw.joint_count(), 0);
        assert_eq!(pw.sleep_time_threshold(), 2.0);
    }

    #[test]
    fn from_config_keeps_threshold() {
        let config = PhysicsConfig {
            gravity: Vec2::ZERO,
            sleep_time_threshold: 0.5,
        };
        assert_eq!(PhysicsWorld::from_config(&config).sleep_time_threshold(), 0.5);
    }

    #[test]
    fn add_and_remove_body() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let h = pw.add_body(&BodyDesc::dynamic(ball(1.0))).unwrap();
        assert_eq!(pw.body_count(), 1);
        assert!(pw.remove_body(h));
        assert_eq!(pw.body_count(), 0);
        assert!(!pw.remove_body(h));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let err = pw.add_body(&BodyDesc::dynamic(ball(-1.0))).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidDimension { name: "radius", .. }));

        let collinear = ColliderShape::Polygon {
            vertices: vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)],
        };
        let err = pw.add_body(&BodyDesc::dynamic(collinear)).unwrap_err();
        assert!(matches!(err, PhysicsError::DegenerateHull { count: 3 }));
        assert_eq!(pw.body_count(), 0);
    }

    #[test]
    fn dynamic_body_moves_after_step() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let h = pw
            .add_body(&BodyDesc::dynamic(ball(0.5)).with_velocity(Vec2::new(10.0, 0.0)))
            .unwrap();
        pw.step(1.0 / 60.0);
        let pos = pw.body_position(h).unwrap();
        assert!(pos.x > 0.0, "ball should move right, got x={}", pos.x);
    }

    #[test]
    fn static_body_has_infinite_mass() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let wall = pw
            .add_body(&BodyDesc::fixed(ColliderShape::Box {
                half_width: 1.0,
                half_height: 1.0,
            }))
            .unwrap();
        let ball = pw.add_body(&BodyDesc::dynamic(ball(1.0)).at(Vec2::new(5.0, 0.0))).unwrap();
        assert_eq!(pw.body_mass(wall), f64::INFINITY);
        assert!(pw.body_mass(ball).is_finite());
        assert!(pw.body_mass(ball) > 0.0);
    }

    #[test]
    fn query_inside_reports_negative_distance() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let h = pw.add_body(&BodyDesc::dynamic(ball(10.0))).unwrap();
        let hit = pw
            .point_query_nearest(Vec2::new(2.0, 0.0), 5.0, GrabFilter::GRABBABLE)
            .unwrap();
        assert_eq!(hit.body, h);
        assert!((hit.distance + 8.0).abs() < 1e-4);
        assert!((hit.point - Vec2::new(10.0, 0.0)).hypot() < 1e-4);
    }

    #[test]
    fn query_at_ball_center_attaches_at_pointer() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let h = pw
            .add_body(&BodyDesc::dynamic(ball(10.0)).at(Vec2::new(400.0, 0.0)))
            .unwrap();
        let hit = pw
            .point_query_nearest(Vec2::new(400.0, 0.0), 5.0, GrabFilter::GRABBABLE)
            .expect("center of a ball is grabbable");
        assert_eq!(hit.body, h);
        assert!(hit.distance.is_finite() && hit.distance <= 0.0);
        assert_eq!(hit.point, Vec2::new(400.0, 0.0));
    }

    #[test]
    fn query_outside_respects_radius() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        pw.add_body(&BodyDesc::dynamic(ball(10.0))).unwrap();
        let near = pw.point_query_nearest(Vec2::new(13.0, 0.0), 5.0, GrabFilter::GRABBABLE);
        assert!((near.unwrap().distance - 3.0).abs() < 1e-4);
        assert!(pw
            .point_query_nearest(Vec2::new(16.0, 0.0), 5.0, GrabFilter::GRABBABLE)
            .is_none());
    }

    #[test]
    fn non_grabbable_is_invisible_to_pointer() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        pw.add_body(&BodyDesc::dynamic(ball(10.0)).with_grabbable(false))
            .unwrap();
        assert!(pw
            .point_query_nearest(Vec2::ZERO, 5.0, GrabFilter::GRABBABLE)
            .is_none());
    }

    #[test]
    fn pivot_joint_lifecycle() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let body = pw.add_body(&BodyDesc::dynamic(ball(1.0))).unwrap();
        let anchor = pw.add_anchor_body(Vec2::ZERO);
        let joint = pw.add_pivot_joint(PivotJoint {
            body_a: anchor,
            body_b: body,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            max_force: 50_000.0,
            error_bias: 0.5,
        });
        assert_eq!(pw.joint_count(), 1);
        assert_eq!(pw.pivot_joint(joint).unwrap().max_force, 50_000.0);
        assert_eq!(pw.body_mass(anchor), f64::INFINITY);

        pw.remove_joint(joint);
        pw.remove_anchor_body(anchor);
        assert_eq!(pw.joint_count(), 0);
        assert!(pw.pivot_joint(joint).is_none());
        assert_eq!(pw.body_count(), 1);
    }

    #[test]
    fn pivot_joint_drives_both_axes_with_limited_motors() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let body = pw.add_body(&BodyDesc::dynamic(ball(1.0))).unwrap();
        let anchor = pw.add_anchor_body(Vec2::ZERO);
        let joint = pw.add_pivot_joint(PivotJoint {
            body_a: anchor,
            body_b: body,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::new(0.5, 0.0),
            max_force: 1234.0,
            error_bias: 0.25,
        });

        let data = &pw.impulse_joints().get(joint).unwrap().data;
        assert!(data.locked_axes.is_empty());
        for axis in [JointAxis::LinX, JointAxis::LinY] {
            let motor = data.motor(axis).expect("linear motor");
            assert_eq!(motor.max_force, 1234.0);
            assert_eq!(motor.target_pos, 0.0);
            assert!(motor.stiffness > 0.0 && motor.damping > 0.0);
        }
        assert!(data.motor(JointAxis::AngX).is_none());

        let read = pw.pivot_joint(joint).unwrap();
        assert!((read.error_bias - 0.25).abs() < 1e-6);
        assert!((read.anchor_b - Vec2::new(0.5, 0.0)).hypot() < 1e-6);
        assert_eq!(read.body_a, anchor);
    }

    #[test]
    fn drag_gains_are_critically_damped() {
        let (stiffness, damping) = drag_gains(0.85f64.powi(60));
        let rate = -(0.85f64.powi(60)).ln();
        assert!((f64::from(stiffness) - rate * rate).abs() < 1e-3);
        assert!((f64::from(damping * damping) - 4.0 * f64::from(stiffness)).abs() < 1e-2);
        assert_eq!(drag_gains(1.0), (0.0, 0.0));
        let (k, d) = drag_gains(0.0);
        assert!(k.is_finite() && d.is_finite());
    }

    #[test]
    fn removing_body_drops_its_joints() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let body = pw.add_body(&BodyDesc::dynamic(ball(1.0))).unwrap();
        let anchor = pw.add_anchor_body(Vec2::ZERO);
        let joint = pw.add_pivot_joint(PivotJoint {
            body_a: anchor,
            body_b: body,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            max_force: 1.0,
            error_bias: 0.5,
        });
        pw.remove_body(body);
        assert_eq!(pw.joint_count(), 0);
        assert!(pw.pivot_joint(joint).is_none());
    }

    #[test]
    fn world_to_local_undoes_body_transform() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let h = pw
            .add_body(
                &BodyDesc::dynamic(ball(1.0))
                    .at(Vec2::new(10.0, 5.0))
                    .with_angle(std::f64::consts::FRAC_PI_2),
            )
            .unwrap();
        let local = pw.world_to_local(h, Vec2::new(10.0, 7.0));
        assert!((local - Vec2::new(2.0, 0.0)).hypot() < 1e-5);
    }

    #[test]
    fn resting_ball_produces_contacts() {
        let mut pw = PhysicsWorld::new(Vec2::new(0.0, -9.81));
        pw.add_body(&BodyDesc::fixed(ColliderShape::Box {
            half_width: 10.0,
            half_height: 0.1,
        }))
        .unwrap();
        pw.add_body(&BodyDesc::dynamic(ball(0.5)).at(Vec2::new(0.0, 0.7)))
            .unwrap();
        for _ in 0..60 {
            pw.step(1.0 / 60.0);
        }
        let contacts = pw.contact_points();
        assert!(!contacts.is_empty(), "ball should rest on the ground");
        for c in contacts {
            assert!(c.y.abs() < 0.5, "contact far from ground: {c:?}");
        }
    }

    #[test]
    fn activity_reports_threshold() {
        let mut pw = PhysicsWorld::new(Vec2::ZERO);
        let h = pw.add_body(&BodyDesc::dynamic(ball(1.0))).unwrap();
        let activity = pw.body_activity(h).unwrap();
        assert!(!activity.sleeping);
        assert_eq!(activity.sleep_threshold, 2.0);
    }
}
