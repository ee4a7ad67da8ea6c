//! wgpu renderer for debug meshes.
//!
//! The renderer does NOT own the event loop. Each frame the caller fills a
//! [`MeshBatch`] (usually through [`FrameLoop::frame`](crate::frame::FrameLoop::frame))
//! and hands it to [`MeshRenderer::render`], which uploads the vertices and
//! indices and issues one indexed draw.
//!
//! Vertices are already in screen pixels. The shader only needs the surface
//! size to map them to clip space, so the single uniform is the screen size.
//!
//! # Draw options
//!
//! `fill_rule` is applied when the mesh is tessellated and needs nothing here.
//! `anti_alias` selects the sample count, and a render pass has exactly one:
//! a frame is drawn with 4x MSAA when any of its draws asks for it, otherwise
//! at one sample per pixel.

use std::sync::Arc;

use debugdraw_geom::color::Color;
use debugdraw_geom::mesh::{MeshBatch, MeshVertex};
use wgpu::util::DeviceExt;

// ---------------------------------------------------------------------------
// Vertex
// ---------------------------------------------------------------------------

/// GPU copy of a [`MeshVertex`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl From<&MeshVertex> for GpuVertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            position: v.position,
            uv: v.uv,
            color: v.color,
        }
    }
}

impl GpuVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Convert a batch's vertices for upload.
pub fn gpu_vertices(batch: &MeshBatch) -> Vec<GpuVertex> {
    batch.vertices().iter().map(GpuVertex::from).collect()
}

/// Screen-size uniform, padded to 16 bytes.
fn screen_uniform(width: u32, height: u32) -> [f32; 4] {
    [width.max(1) as f32, height.max(1) as f32, 0.0, 0.0]
}

/// Sample count of the anti-aliased pipeline.
const MSAA_SAMPLES: u32 = 4;

/// Sample count a batch is drawn with, given the multisampled count available.
pub fn batch_sample_count(batch: &MeshBatch, msaa_samples: u32) -> u32 {
    if msaa_samples > 1 && batch.draws().iter().any(|draw| draw.options.anti_alias) {
        msaa_samples
    } else {
        1
    }
}

/// Initial buffer capacity, in elements.
const INITIAL_CAPACITY: usize = 4096;

/// Grow `capacity` to the next power of two that holds `needed`.
fn grown_capacity(capacity: usize, needed: usize) -> usize {
    if needed <= capacity {
        capacity
    } else {
        needed.next_power_of_two()
    }
}

// ---------------------------------------------------------------------------
// MeshRenderer
// ---------------------------------------------------------------------------

/// Draws a [`MeshBatch`] into a window surface.
///
/// Create it with [`MeshRenderer::new`] from an `Arc<winit::window::Window>`.
/// If no suitable GPU is available the error is returned and the caller can
/// keep running headless.
pub struct MeshRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    /// Pipeline and color target for anti-aliased frames; `None` when the
    /// surface format cannot be multisampled.
    msaa: Option<Multisample>,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_buffer: wgpu::Buffer,
    index_capacity: usize,
    screen_buffer: wgpu::Buffer,
    screen_bind_group: wgpu::BindGroup,
    window: Arc<winit::window::Window>,
    /// Color the surface is cleared to each frame.
    pub clear_color: Color,
}

impl MeshRenderer {
    /// Initialize wgpu: surface, device, queue, pipeline.
    ///
    /// Async because adapter and device selection are. Call with
    /// `pollster::block_on`.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable GPU adapter or device is available.
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, anyhow::Error> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("debugdraw_renderer"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no texture formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("debugdraw_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let screen_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen_uniform"),
            contents: bytemuck::cast_slice(&screen_uniform(width, height)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let screen_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("screen_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let screen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("screen_bind_group"),
            layout: &screen_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("debugdraw_pipeline_layout"),
            bind_group_layouts: &[&screen_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, config.format, 1);

        let msaa = if adapter
            .get_texture_format_features(config.format)
            .flags
            .sample_count_supported(MSAA_SAMPLES)
        {
            Some(Multisample {
                pipeline: create_pipeline(
                    &device,
                    &pipeline_layout,
                    &shader,
                    config.format,
                    MSAA_SAMPLES,
                ),
                target: create_msaa_target(&device, &config),
            })
        } else {
            tracing::warn!(format = ?config.format, "surface format cannot be multisampled; anti-aliasing disabled");
            None
        };

        let vertex_buffer = create_vertex_buffer(&device, INITIAL_CAPACITY);
        let index_buffer = create_index_buffer(&device, INITIAL_CAPACITY);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            msaa,
            vertex_buffer,
            vertex_capacity: INITIAL_CAPACITY,
            index_buffer,
            index_capacity: INITIAL_CAPACITY,
            screen_buffer,
            screen_bind_group,
            window,
            clear_color: Color::new(0.05, 0.05, 0.1, 1.0),
        })
    }

    /// Render one frame from a batch and present it.
    ///
    /// Buffers grow to fit the batch; they never shrink.
    ///
    /// # Errors
    ///
    /// Returns a [`wgpu::SurfaceError`] if the surface cannot provide an
    /// output texture (window minimized, surface lost).
    pub fn render(&mut self, batch: &MeshBatch) -> Result<(), wgpu::SurfaceError> {
        self.queue.write_buffer(
            &self.screen_buffer,
            0,
            bytemuck::cast_slice(&screen_uniform(self.config.width, self.config.height)),
        );

        let vertices = gpu_vertices(batch);
        let indices = batch.indices();
        self.reserve(vertices.len(), indices.len());
        if !indices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
            self.queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(indices));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let msaa_samples = if self.msaa.is_some() { MSAA_SAMPLES } else { 1 };
        let (target, resolve_target, store, pipeline) =
            match (&self.msaa, batch_sample_count(batch, msaa_samples)) {
                (Some(msaa), samples) if samples > 1 => (
                    &msaa.target,
                    Some(&view),
                    wgpu::StoreOp::Discard,
                    &msaa.pipeline,
                ),
                _ => (&view, None, wgpu::StoreOp::Store, &self.render_pipeline),
            };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("debugdraw_encoder"),
            });

        {
            let clear = self.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("debugdraw_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear.r),
                            g: f64::from(clear.g),
                            b: f64::from(clear.b),
                            a: f64::from(clear.a),
                        }),
                        store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !indices.is_empty() {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.screen_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                // Draw ranges are contiguous and share one pipeline.
                render_pass.draw_indexed(0..indices.len() as u32, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn reserve(&mut self, vertices: usize, indices: usize) {
        let vertex_capacity = grown_capacity(self.vertex_capacity, vertices);
        if vertex_capacity != self.vertex_capacity {
            tracing::debug!(from = self.vertex_capacity, to = vertex_capacity, "growing vertex buffer");
            self.vertex_buffer = create_vertex_buffer(&self.device, vertex_capacity);
            self.vertex_capacity = vertex_capacity;
        }
        let index_capacity = grown_capacity(self.index_capacity, indices);
        if index_capacity != self.index_capacity {
            tracing::debug!(from = self.index_capacity, to = index_capacity, "growing index buffer");
            self.index_buffer = create_index_buffer(&self.device, index_capacity);
            self.index_capacity = index_capacity;
        }
    }

    /// Resize the surface when the window size changes.
    ///
    /// Zero-sized requests (minimized windows) are ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            if let Some(msaa) = &mut self.msaa {
                msaa.target = create_msaa_target(&self.device, &self.config);
            }
        }
    }

    /// Current surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn window(&self) -> &winit::window::Window {
        &self.window
    }
}

/// Multisampled pipeline and the color target it renders into before
/// resolving to the surface.
struct Multisample {
    pipeline: wgpu::RenderPipeline,
    target: wgpu::TextureView,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("debugdraw_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[GpuVertex::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Flipped views reverse winding.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn create_msaa_target(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("debugdraw_msaa_target"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: MSAA_SAMPLES,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("debugdraw_vertices"),
        size: (capacity * std::mem::size_of::<GpuVertex>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("debugdraw_indices"),
        size: (capacity * std::mem::size_of::<u32>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use debugdraw_geom::mesh::{DrawOptions, Mesh, TriangleSink};

    #[test]
    fn gpu_vertex_matches_mesh_vertex_layout() {
        assert_eq!(std::mem::size_of::<GpuVertex>(), std::mem::size_of::<MeshVertex>());
        assert_eq!(std::mem::size_of::<GpuVertex>(), 32);
    }

    #[test]
    fn batch_vertices_convert_field_for_field() {
        let vertex = MeshVertex {
            position: [10.0, 20.0],
            uv: [1.0, 1.0],
            color: [0.1, 0.2, 0.3, 0.4],
        };
        let mut batch = MeshBatch::new();
        batch.draw_triangles(
            &Mesh {
                vertices: vec![vertex; 3],
                indices: vec![0, 1, 2],
            },
            &DrawOptions::default(),
        );
        let gpu = gpu_vertices(&batch);
        assert_eq!(gpu.len(), 3);
        assert_eq!(gpu[0].position, [10.0, 20.0]);
        assert_eq!(gpu[2].color, [0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn buffers_grow_to_power_of_two() {
        assert_eq!(grown_capacity(4096, 100), 4096);
        assert_eq!(grown_capacity(4096, 5000), 8192);
        assert_eq!(grown_capacity(4096, 4096), 4096);
    }

    fn batch_with(options: &[DrawOptions]) -> MeshBatch {
        let vertex = MeshVertex {
            position: [0.0, 0.0],
            uv: [1.0, 1.0],
            color: [1.0; 4],
        };
        let mesh = Mesh {
            vertices: vec![vertex; 3],
            indices: vec![0, 1, 2],
        };
        let mut batch = MeshBatch::new();
        for o in options {
            batch.draw_triangles(&mesh, o);
        }
        batch
    }

    #[test]
    fn anti_aliased_draw_multisamples_the_frame() {
        let aliased = DrawOptions {
            anti_alias: false,
            ..DrawOptions::default()
        };
        assert_eq!(batch_sample_count(&batch_with(&[]), MSAA_SAMPLES), 1);
        assert_eq!(batch_sample_count(&batch_with(&[aliased, aliased]), MSAA_SAMPLES), 1);
        assert_eq!(
            batch_sample_count(&batch_with(&[aliased, DrawOptions::default()]), MSAA_SAMPLES),
            MSAA_SAMPLES
        );
        // Without multisampling support every frame is single-sampled.
        assert_eq!(batch_sample_count(&batch_with(&[DrawOptions::default()]), 1), 1);
    }

    #[test]
    fn screen_uniform_never_zero() {
        assert_eq!(screen_uniform(0, 0), [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(screen_uniform(800, 600), [800.0, 600.0, 0.0, 0.0]);
    }
}
