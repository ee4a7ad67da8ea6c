//! Windowed debug view of a [`FrameLoop`](crate::frame::FrameLoop).
//!
//! This module is feature-gated behind `renderer`. Without the feature it
//! compiles to nothing and the engine stays headless: the debug meshes are
//! still produced into any [`TriangleSink`](debugdraw_geom::mesh::TriangleSink),
//! they are just never put on screen.
//!
//! With the feature, [`MeshRenderer`] uploads a
//! [`MeshBatch`](debugdraw_geom::mesh::MeshBatch) to wgpu each frame and
//! [`run_windowed`] drives the whole loop from winit events, translating
//! mouse and touch events into [`PointerInput`](crate::input::PointerInput).

#[cfg(feature = "renderer")]
pub mod app;
#[cfg(feature = "renderer")]
pub mod renderer;

#[cfg(feature = "renderer")]
pub use app::run_windowed;
#[cfg(feature = "renderer")]
pub use renderer::MeshRenderer;
