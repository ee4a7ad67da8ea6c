//! debugdraw-engine -- rapier2d world, pointer dragging and debug drawing.
//!
//! This crate connects [`debugdraw_geom`] to a rapier2d simulation: it walks
//! the physics world and feeds shapes, joints and contacts to a
//! [`DebugDraw`](debugdraw_geom::draw::DebugDraw) implementation, and it lets
//! the user grab bodies with the mouse or a touch through a pivot joint.
//!
//! With the `renderer` feature the [`render`] module opens a winit window and
//! draws the debug meshes with wgpu.
//!
//! # Quick Start
//!
//! ```
//! use debugdraw_engine::prelude::*;
//!
//! let mut world = PhysicsWorld::new(Vec2::ZERO);
//! let ball = world
//!     .add_body(&BodyDesc::dynamic(ColliderShape::Ball { radius: 10.0 }).at(Vec2::new(400.0, 0.0)))
//!     .unwrap();
//!
//! let view = View::new(800.0, 600.0);
//! let mut drag = DragController::<PhysicsWorld>::default();
//!
//! // Clicking at screen (800, 300) lands on world (400, 0).
//! drag.update(&mut world, &PointerInput::mouse_press(Vec2::new(800.0, 300.0)), &view);
//! assert!(drag.is_dragging());
//! assert_eq!(world.joint_count(), 1);
//!
//! drag.update(&mut world, &PointerInput::mouse_release(Vec2::new(800.0, 300.0)), &view);
//! assert_eq!(world.joint_count(), 0);
//! # let _ = ball;
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod debug_draw;
pub mod drag;
pub mod frame;
pub mod input;
pub mod physics;
pub mod render;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the geometry crate for convenience.
pub use debugdraw_geom;

/// Re-export rapier for handle types and direct world access.
pub use rapier2d;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use debugdraw_geom::prelude::*;

    pub use crate::config::{ConfigError, EngineConfig, ViewConfig};
    pub use crate::debug_draw::draw_world;
    pub use crate::drag::{
        DragConfig, DragController, DragSession, GrabFilter, GrabSpace, NearestHit, PivotJoint,
        PointerKind, GRABBABLE_MASK_BIT,
    };
    pub use crate::frame::{FrameConfig, FrameDiagnostics, FrameLoop};
    pub use crate::input::{InputTracker, PointerInput, TouchId};
    pub use crate::physics::{
        BodyDesc, BodyKind, ColliderShape, PhysicsConfig, PhysicsError, PhysicsWorld,
    };
}
