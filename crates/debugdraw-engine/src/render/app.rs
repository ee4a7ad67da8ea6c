//! Windowed application runner.
//!
//! [`run_windowed`] takes ownership of a [`FrameLoop`] and drives it inside a
//! winit event loop. Window events feed an [`InputTracker`]; each
//! `RedrawRequested` takes the frame's [`PointerInput`](crate::input::PointerInput),
//! runs one frame into a [`MeshBatch`] and renders it.

use std::sync::Arc;

use debugdraw_geom::mesh::MeshBatch;
use kurbo::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{WindowAttributes, WindowId};

use super::renderer::MeshRenderer;
use crate::frame::FrameLoop;
use crate::input::{InputTracker, TouchId};

/// Run the frame loop in a window until it is closed.
///
/// The left mouse button and touches grab bodies; Escape quits.
///
/// # Errors
///
/// Returns an error if the event loop cannot be created or the window or
/// renderer fail to initialize.
pub fn run_windowed(
    frame_loop: FrameLoop,
    window_title: &str,
    width: u32,
    height: u32,
) -> Result<(), anyhow::Error> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App {
        frame_loop,
        input: InputTracker::new(),
        batch: MeshBatch::new(),
        state: AppState::Pending {
            title: window_title.to_owned(),
            width,
            height,
        },
        init_failed: false,
    };

    event_loop.run_app(&mut app)?;

    if app.init_failed {
        return Err(anyhow::anyhow!(
            "failed to initialize windowed renderer (see logs for details)"
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal state machine
// ---------------------------------------------------------------------------

/// Winit 0.30 creates windows inside `resumed`, so the renderer only exists
/// once the app is `Running`.
enum AppState {
    Pending {
        title: String,
        width: u32,
        height: u32,
    },
    Running {
        renderer: MeshRenderer,
    },
    Failed,
}

struct App {
    frame_loop: FrameLoop,
    input: InputTracker,
    batch: MeshBatch,
    state: AppState,
    init_failed: bool,
}

impl App {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running { renderer } = &mut self.state else {
            return;
        };

        let (width, height) = renderer.size();
        let input = self.input.take_frame();
        self.batch.clear();
        self.frame_loop
            .frame(&input, (f64::from(width), f64::from(height)), &mut self.batch);

        match renderer.render(&self.batch) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = renderer.window().inner_size();
                renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory -- exiting");
                event_loop.exit();
            }
            Err(e) => {
                tracing::warn!(error = %e, "surface error during render");
            }
        }

        renderer.window().request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending {
            title,
            width,
            height,
        } = &self.state
        else {
            return;
        };
        let (width, height) = (*width, *height);

        let attrs = WindowAttributes::default()
            .with_title(title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!(error = %e, "failed to create window -- exiting");
                self.init_failed = true;
                self.state = AppState::Failed;
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(MeshRenderer::new(window.clone())) {
            Ok(renderer) => {
                tracing::info!(width, height, "debug draw window created");
                window.request_redraw();
                self.state = AppState::Running { renderer };
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to initialize renderer -- exiting");
                self.init_failed = true;
                self.state = AppState::Failed;
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if !matches!(self.state, AppState::Running { .. }) {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                tracing::info!(
                    frames = self.frame_loop.frame_count(),
                    "window close requested -- shutting down"
                );
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!(width = new_size.width, height = new_size.height, "window resized");
                if let AppState::Running { renderer } = &mut self.state {
                    renderer.resize(new_size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(Vec2::new(position.x, position.y));
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.input.mouse_button(state == ElementState::Pressed);
            }
            WindowEvent::Touch(touch) => {
                let id = TouchId(touch.id);
                let position = Vec2::new(touch.location.x, touch.location.y);
                match touch.phase {
                    TouchPhase::Started => self.input.touch_started(id, position),
                    TouchPhase::Moved => self.input.touch_moved(id, position),
                    TouchPhase::Ended | TouchPhase::Cancelled => self.input.touch_ended(id),
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
