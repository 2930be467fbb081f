//! `wgpu` implementation of [`FrameBackend`].

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use winit::window::Window;

use super::backend::{Acquired, FrameBackend, PresentStatus};
use super::geometry::GeometryBuffer;
use super::surface::{ConfigChange, Extent, SurfaceCapabilities, SurfaceConfig};
use crate::error::RenderError;
use crate::strip::Vertex;

const BUILTIN_SHADER: &str = include_str!("shader.wgsl");

/// The built-in shader, or the file at `path` when given.
pub fn load_shader_source(path: Option<&Path>) -> Result<Cow<'static, str>, RenderError> {
    match path {
        None => Ok(Cow::Borrowed(BUILTIN_SHADER)),
        Some(path) => {
            let source =
                std::fs::read_to_string(path).map_err(|source| RenderError::ShaderLoad {
                    path: path.to_path_buf(),
                    source,
                })?;
            log::info!("Loaded shader override from {}", path.display());
            Ok(Cow::Owned(source))
        }
    }
}

/// Instance-level objects: surface, adapter, device and queue.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            surface,
            adapter,
            device,
            queue,
        })
    }
}

/// Per-slot recording state. wgpu encoders are single-use, so a slot only
/// carries what stays fixed across its submissions.
pub struct GpuSlot {
    label: String,
}

pub struct WgpuBackend {
    gpu: GpuContext,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    /// Built on first configure, rebuilt only when the target format changes
    pipeline: Option<wgpu::RenderPipeline>,
    /// Vertex region followed by index region, mirrored from [`GeometryBuffer`]
    geometry: wgpu::Buffer,
    vertex_bytes: u64,
    index_count: u32,
    clear_color: wgpu::Color,
}

impl WgpuBackend {
    /// Allocate the GPU geometry buffer once, sized for `geometry`, and
    /// upload its topology. Only the vertex region is rewritten per frame.
    pub fn new(
        gpu: GpuContext,
        shader_source: Cow<'static, str>,
        geometry: &GeometryBuffer,
        clear_color: [f64; 3],
    ) -> Self {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Spectrum Shader"),
                source: wgpu::ShaderSource::Wgsl(shader_source),
            });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Spectrum Pipeline Layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        let geometry_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Geometry Buffer"),
            size: geometry.as_bytes().len() as u64,
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::INDEX
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue.write_buffer(&geometry_buffer, 0, geometry.as_bytes());

        Self {
            gpu,
            shader,
            pipeline_layout,
            pipeline: None,
            geometry: geometry_buffer,
            vertex_bytes: geometry.vertex_bytes(),
            index_count: geometry.index_count() as u32,
            clear_color: wgpu::Color {
                r: clear_color[0],
                g: clear_color[1],
                b: clear_color[2],
                a: 1.0,
            },
        }
    }

    fn create_pipeline(&self, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        self.gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Spectrum Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 0,
                                format: wgpu::VertexFormat::Float32x2,
                            },
                            wgpu::VertexAttribute {
                                offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x3,
                            },
                        ],
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Ring segments wind clockwise, strip quads counter-clockwise
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }
}

impl FrameBackend for WgpuBackend {
    type Slot = GpuSlot;
    type Image = wgpu::SurfaceTexture;
    type Fence = wgpu::SubmissionIndex;

    fn capabilities(&self) -> SurfaceCapabilities {
        let caps = self.gpu.surface.get_capabilities(&self.gpu.adapter);
        let max_dimension = self.gpu.device.limits().max_texture_dimension_2d;
        SurfaceCapabilities {
            formats: caps.formats,
            present_modes: caps.present_modes,
            alpha_modes: caps.alpha_modes,
            // wgpu surfaces always take their size from the client
            current_extent: None,
            min_extent: Extent::new(1, 1),
            max_extent: Extent::new(max_dimension, max_dimension),
            min_image_count: 2,
            max_image_count: None,
        }
    }

    fn create_slot(&mut self, index: usize) -> GpuSlot {
        GpuSlot {
            label: format!("Frame Encoder {}", index),
        }
    }

    fn wait_fence(&mut self, fence: wgpu::SubmissionIndex) -> Result<(), RenderError> {
        self.gpu.device.poll(wgpu::Maintain::wait_for(fence));
        Ok(())
    }

    fn acquire(&mut self) -> Result<Acquired<wgpu::SurfaceTexture>, RenderError> {
        match self.gpu.surface.get_current_texture() {
            Ok(texture) => Ok(Acquired::Image(texture)),
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => Ok(Acquired::Stale),
            Err(wgpu::SurfaceError::Timeout) => Ok(Acquired::Timeout),
            Err(e) => Err(RenderError::Acquire(e)),
        }
    }

    fn submit(
        &mut self,
        slot: &mut GpuSlot,
        image: &wgpu::SurfaceTexture,
        geometry: &GeometryBuffer,
    ) -> Result<wgpu::SubmissionIndex, RenderError> {
        self.gpu
            .queue
            .write_buffer(&self.geometry, 0, geometry.vertex_region_bytes());

        let view = image
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(slot.label.as_str()),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Spectrum Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(pipeline) = &self.pipeline {
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, self.geometry.slice(..self.vertex_bytes));
                render_pass.set_index_buffer(
                    self.geometry.slice(self.vertex_bytes..),
                    wgpu::IndexFormat::Uint32,
                );
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
        }

        Ok(self.gpu.queue.submit(std::iter::once(encoder.finish())))
    }

    fn present(&mut self, image: wgpu::SurfaceTexture) -> PresentStatus {
        let suboptimal = image.suboptimal;
        image.present();
        if suboptimal {
            PresentStatus::Suboptimal
        } else {
            PresentStatus::Optimal
        }
    }

    fn wait_idle(&mut self) -> Result<(), RenderError> {
        self.gpu.device.poll(wgpu::Maintain::Wait);
        Ok(())
    }

    fn rebuild(&mut self, config: &SurfaceConfig, change: ConfigChange) -> Result<(), RenderError> {
        self.gpu.surface.configure(
            &self.gpu.device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: config.format,
                width: config.extent.width,
                height: config.extent.height,
                present_mode: config.present_mode,
                alpha_mode: config.alpha_mode,
                view_formats: vec![],
                desired_maximum_frame_latency: config.frame_latency(),
            },
        );

        if change.needs_pipeline() || self.pipeline.is_none() {
            log::debug!("Building render pipeline for {:?}", config.format);
            self.pipeline = Some(self.create_pipeline(config.format));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_shader_has_entry_points() {
        let source = load_shader_source(None).unwrap();
        assert!(source.contains("fn vs_main"));
        assert!(source.contains("fn fs_main"));
    }

    #[test]
    fn test_shader_override_is_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "// custom").unwrap();
        let source = load_shader_source(Some(file.path())).unwrap();
        assert_eq!(source, "// custom\n");
    }

    #[test]
    fn test_missing_shader_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.wgsl");
        match load_shader_source(Some(&path)) {
            Err(RenderError::ShaderLoad { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected ShaderLoad error, got {:?}", other.map(|_| ())),
        }
    }
}
