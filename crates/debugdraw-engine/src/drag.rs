//! Pointer drag interaction.
//!
//! The [`DragController`] lets the user grab a body with the mouse or a
//! single touch and pull it around. A grab creates two objects in the
//! physics world:
//!
//! - a kinematic *anchor* body that follows the pointer, and
//! - a pivot joint between the anchor and the grabbed body, attached at the
//!   clicked point in the body's local frame.
//!
//! Both live in the physics world; the controller only keeps their handles
//! so it can remove them on release. The physics world is reached through
//! the [`GrabSpace`] trait, which keeps this module independent of rapier
//! and lets tests drive it with a fake world.
//!
//! # States
//!
//! ```text
//!   Idle --(press on a finite-mass grabbable shape)--> Dragging
//!   Dragging --(pointer moves)--> Dragging   (anchor smoothed toward pointer)
//!   Dragging --(release)--> Idle             (joint and anchor removed)
//! ```
//!
//! Only one pointer is tracked at a time. While dragging, presses from other
//! touches are ignored.

use debugdraw_geom::view::{is_undefined, View};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

use crate::input::{PointerInput, TouchId};

/// Category bit carried by every shape the pointer may grab.
pub const GRABBABLE_MASK_BIT: u32 = 1 << 31;

// ---------------------------------------------------------------------------
// Physics interface
// ---------------------------------------------------------------------------

/// Category/mask pair restricting a point query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabFilter {
    /// Categories the query belongs to.
    pub categories: u32,
    /// Categories the query accepts.
    pub mask: u32,
}

impl GrabFilter {
    /// Matches only grabbable shapes.
    pub const GRABBABLE: GrabFilter = GrabFilter {
        categories: GRABBABLE_MASK_BIT,
        mask: GRABBABLE_MASK_BIT,
    };
}

/// Result of a nearest-shape point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestHit<B> {
    /// Body owning the nearest shape.
    pub body: B,
    /// Closest point on the shape surface.
    pub point: Vec2,
    /// Distance to the surface; negative when the query point is inside.
    pub distance: f64,
}

/// Pivot joint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotJoint<B> {
    pub body_a: B,
    pub body_b: B,
    /// Attachment point in `body_a`'s local frame.
    pub anchor_a: Vec2,
    /// Attachment point in `body_b`'s local frame.
    pub anchor_b: Vec2,
    /// Largest force the joint may apply.
    pub max_force: f64,
    /// Fraction of joint error left uncorrected after one second.
    pub error_bias: f64,
}

/// The physics operations the drag controller needs.
pub trait GrabSpace {
    /// Body handle.
    type Body: Copy + Eq + std::fmt::Debug;
    /// Joint handle.
    type Joint: Copy + Eq + std::fmt::Debug;

    /// Nearest shape within `max_distance` of `point` that passes `filter`.
    fn point_query_nearest(
        &self,
        point: Vec2,
        max_distance: f64,
        filter: GrabFilter,
    ) -> Option<NearestHit<Self::Body>>;

    /// Mass of a body; `f64::INFINITY` for static and kinematic bodies.
    fn body_mass(&self, body: Self::Body) -> f64;

    /// Convert a world point into `body`'s local frame.
    fn world_to_local(&self, body: Self::Body, point: Vec2) -> Vec2;

    /// Create a kinematic anchor body at `position`.
    fn add_anchor_body(&mut self, position: Vec2) -> Self::Body;

    fn remove_anchor_body(&mut self, body: Self::Body);

    fn set_anchor_state(&mut self, body: Self::Body, position: Vec2, velocity: Vec2);

    fn add_pivot_joint(&mut self, joint: PivotJoint<Self::Body>) -> Self::Joint;

    fn remove_joint(&mut self, joint: Self::Joint);
}

// ---------------------------------------------------------------------------
// DragConfig
// ---------------------------------------------------------------------------

/// Tuning for the drag interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Query radius around the pointer, in world units.
    pub pick_radius: f64,
    /// Maximum force of the drag joint.
    pub max_force: f64,
    /// Fraction of the joint's positional error left after one second; the
    /// smaller, the stiffer the pull.
    pub error_bias: f64,
    /// Fraction of the remaining distance the anchor covers each frame.
    pub smoothing: f64,
    /// Update rate the anchor velocity is scaled by.
    pub update_rate_hz: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            pick_radius: 5.0,
            max_force: 50_000.0,
            error_bias: (1.0f64 - 0.15).powf(60.0),
            smoothing: 0.25,
            update_rate_hz: 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// DragSession
// ---------------------------------------------------------------------------

/// Which pointer owns a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch(TouchId),
}

/// State of an active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession<B, J> {
    pub pointer: PointerKind,
    /// Kinematic anchor body following the pointer.
    pub anchor: B,
    /// Grabbed body.
    pub body: B,
    /// Pivot joint between `anchor` and `body`.
    pub joint: J,
    /// Anchor position after the last update.
    pub anchor_position: Vec2,
    /// Anchor velocity after the last update.
    pub anchor_velocity: Vec2,
}

// ---------------------------------------------------------------------------
// DragController
// ---------------------------------------------------------------------------

/// Mouse/touch drag state machine.
pub struct DragController<S: GrabSpace> {
    config: DragConfig,
    tracked_touch: Option<TouchId>,
    session: Option<DragSession<S::Body, S::Joint>>,
}

impl<S: GrabSpace> DragController<S> {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            tracked_touch: None,
            session: None,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The active drag, if any.
    pub fn session(&self) -> Option<&DragSession<S::Body, S::Joint>> {
        self.session.as_ref()
    }

    /// Touch currently used as the pointer, if any.
    pub fn tracked_touch(&self) -> Option<TouchId> {
        self.tracked_touch
    }

    /// Run one interaction update. Call once per frame.
    pub fn update(&mut self, space: &mut S, input: &PointerInput, view: &View) {
        // An active touch that lifted, vanished, or reports the origin ends.
        if let Some(id) = self.tracked_touch {
            let position = input.touch_position(id);
            if input.touch_released(id) || position.map_or(true, |p| p == Vec2::ZERO) {
                if matches!(self.session, Some(s) if s.pointer == PointerKind::Touch(id)) {
                    self.release(space);
                }
                tracing::debug!(touch = id.0, "touch released");
                self.tracked_touch = None;
            }
        }

        let mut just_touched = false;
        if self.session.is_none() {
            let claimed = input
                .touches_pressed
                .iter()
                .copied()
                .find(|id| input.touch_position(*id).is_some());
            if let Some(id) = claimed {
                self.tracked_touch = Some(id);
                just_touched = true;
            }
        }

        let screen = self
            .tracked_touch
            .and_then(|id| input.touch_position(id))
            .unwrap_or(input.cursor);
        let world = view.screen_to_world(screen);

        if is_undefined(world) {
            tracing::debug!(x = screen.x, y = screen.y, "pointer has no world position");
        } else {
            if self.session.is_none() && (input.mouse_pressed || just_touched) {
                let pointer = match self.tracked_touch {
                    Some(id) if just_touched => PointerKind::Touch(id),
                    _ => PointerKind::Mouse,
                };
                self.grab(space, world, pointer);
            }
            self.move_anchor(space, world, just_touched);
        }

        if input.mouse_released
            && matches!(self.session, Some(s) if s.pointer == PointerKind::Mouse)
        {
            self.release(space);
        }
    }

    /// End the active drag, removing its joint and anchor. No-op when idle.
    pub fn release(&mut self, space: &mut S) {
        let Some(session) = self.session.take() else {
            return;
        };
        space.remove_joint(session.joint);
        space.remove_anchor_body(session.anchor);
        tracing::debug!(body = ?session.body, "drag released");
    }

    fn grab(&mut self, space: &mut S, world: Vec2, pointer: PointerKind) {
        let Some(hit) =
            space.point_query_nearest(world, self.config.pick_radius, GrabFilter::GRABBABLE)
        else {
            tracing::debug!(x = world.x, y = world.y, "nothing to grab");
            return;
        };
        if !space.body_mass(hit.body).is_finite() {
            tracing::debug!(body = ?hit.body, "cannot grab body with infinite mass");
            return;
        }

        let nearest = if hit.distance > 0.0 { hit.point } else { world };
        let anchor = space.add_anchor_body(world);
        let joint = space.add_pivot_joint(PivotJoint {
            body_a: anchor,
            body_b: hit.body,
            anchor_a: Vec2::ZERO,
            anchor_b: space.world_to_local(hit.body, nearest),
            max_force: self.config.max_force,
            error_bias: self.config.error_bias,
        });

        tracing::debug!(body = ?hit.body, ?pointer, "drag started");
        self.session = Some(DragSession {
            pointer,
            anchor,
            body: hit.body,
            joint,
            anchor_position: world,
            anchor_velocity: Vec2::ZERO,
        });
    }

    fn move_anchor(&mut self, space: &mut S, target: Vec2, snap: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if snap {
            session.anchor_position = target;
            session.anchor_velocity = Vec2::ZERO;
        } else {
            let old = session.anchor_position;
            let new = old.lerp(target, self.config.smoothing);
            session.anchor_velocity = (new - old) * self.config.update_rate_hz;
            session.anchor_position = new;
        }
        space.set_anchor_state(
            session.anchor,
            session.anchor_position,
            session.anchor_velocity,
        );
    }
}

impl<S: GrabSpace> Default for DragController<S> {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
