//! Fixed-timestep frame loop.
//!
//! The [`FrameLoop`] owns the physics world and the drag controller and runs
//! one frame at a time. Each frame:
//!
//! 1. The drag controller consumes the frame's [`PointerInput`].
//! 2. The physics world steps once by `fixed_dt`.
//! 3. The world is debug-drawn into the caller's [`TriangleSink`] (skipped
//!    in headless mode).
//!
//! Simulation time is `frame_count * fixed_dt`, so it does not drift.
//!
//! # Example
//!
//! ```
//! use debugdraw_engine::prelude::*;
//!
//! let mut frames = FrameLoop::new(PhysicsWorld::default(), EngineConfig::default()).unwrap();
//! let mut batch = MeshBatch::new();
//!
//! for _ in 0..10 {
//!     batch.clear();
//!     frames.frame(&PointerInput::default(), (800.0, 600.0), &mut batch);
//! }
//!
//! assert_eq!(frames.frame_count(), 10);
//! ```

use std::time::{Duration, Instant};

use debugdraw_geom::draw::DebugDrawer;
use debugdraw_geom::mesh::TriangleSink;
use debugdraw_geom::view::View;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, EngineConfig};
use crate::debug_draw::draw_world;
use crate::drag::DragController;
use crate::input::PointerInput;
use crate::physics::PhysicsWorld;

// ---------------------------------------------------------------------------
// FrameConfig
// ---------------------------------------------------------------------------

/// Configuration for the frame loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Fixed time step in seconds per frame. Must be positive and finite.
    pub fixed_dt: f64,
    /// Headless mode: no debug drawing.
    pub headless: bool,
}

impl Default for FrameConfig {
    /// Defaults to 60 Hz, headless off.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            headless: false,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Time spent in the drag controller.
    pub input_time: Duration,
    /// Time spent stepping physics.
    pub physics_time: Duration,
    /// Time spent meshing debug geometry.
    pub draw_time: Duration,
    /// Whole frame.
    pub total_time: Duration,
    /// Shapes the drawer could not mesh.
    pub skipped_shapes: usize,
}

// ---------------------------------------------------------------------------
// FrameLoop
// ---------------------------------------------------------------------------

/// Drives input, physics and debug drawing one frame at a time.
pub struct FrameLoop {
    world: PhysicsWorld,
    drag: DragController<PhysicsWorld>,
    config: EngineConfig,
    frame_counter: u64,
    last_diagnostics: FrameDiagnostics,
}

impl FrameLoop {
    /// Create a frame loop around an existing world.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the configuration is out of range.
    pub fn new(world: PhysicsWorld, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world,
            drag: DragController::new(config.drag.clone()),
            config,
            frame_counter: 0,
            last_diagnostics: FrameDiagnostics::default(),
        })
    }

    /// Run one frame for a screen of `screen_size` pixels.
    ///
    /// Returns the view used for the frame.
    pub fn frame<S: TriangleSink>(
        &mut self,
        input: &PointerInput,
        screen_size: (f64, f64),
        sink: &mut S,
    ) -> View {
        let frame_start = Instant::now();
        let view = self.view(screen_size);

        let input_start = Instant::now();
        self.drag.update(&mut self.world, input, &view);
        let input_time = input_start.elapsed();

        let physics_start = Instant::now();
        self.world.step(self.config.frame.fixed_dt);
        let physics_time = physics_start.elapsed();

        let draw_start = Instant::now();
        let mut skipped_shapes = 0;
        if !self.config.frame.headless {
            let mut drawer = DebugDrawer::new(&view, &self.config.draw, sink);
            draw_world(&self.world, &mut drawer);
            skipped_shapes = drawer.skipped();
        }
        let draw_time = draw_start.elapsed();

        self.frame_counter += 1;
        self.last_diagnostics = FrameDiagnostics {
            input_time,
            physics_time,
            draw_time,
            total_time: frame_start.elapsed(),
            skipped_shapes,
        };
        if skipped_shapes > 0 {
            tracing::warn!(frame = self.frame_counter, skipped_shapes, "frame dropped shapes");
        }

        view
    }

    /// The view for a screen of the given size under the current config.
    pub fn view(&self, (width, height): (f64, f64)) -> View {
        self.config.view.view(width, height)
    }

    // -- accessors ----------------------------------------------------------

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// Simulation time in seconds, computed as `frame_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.frame_counter as f64 * self.config.frame.fixed_dt
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Mutable access to the physics world, for scene setup.
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn drag(&self) -> &DragController<PhysicsWorld> {
        &self.drag
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutable access to the configuration.
    ///
    /// Changes to `drag` only take effect for a new [`FrameLoop`].
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }

    pub fn is_headless(&self) -> bool {
        self.config.frame.headless
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
