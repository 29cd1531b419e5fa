// Mesh viewer: one triangle mesh, point light, smooth/flat shading toggle
// Left-drag orbits the camera, WASD moves, F toggles shading, F1 shows stats

mod config;
mod engine;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    event::{Event as WinitEvent, WindowEvent},
    event_loop::EventLoop,
    window::Window,
};

use config::ViewerConfig;
use engine::debug_overlay::{DebugOverlay, DebugStats};
use engine::input::InputState;
use engine::{DeviceError, MeshAsset, RenderableMesh, Scene};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

// ============================================================================
// MESH STATS (kept after the CPU-side asset is dropped)
// ============================================================================

struct MeshStats {
    vertex_count: usize,
    triangle_count: usize,
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    // Declared first so the buffers go before the device that created them.
    mesh: RenderableMesh,
    mesh_stats: MeshStats,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    scene: Scene,
    input: InputState,
    overlay: DebugOverlay,
    move_step: f32,

    // Frame timing for the overlay
    frame_count: u32,
    last_fps_update: std::time::Instant,
    fps: u32,
    frame_time_avg_ms: f32,
}

impl State {
    async fn new(window: Arc<Window>, viewer: &ViewerConfig, asset: &MeshAsset) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(DeviceError::from)
            .context("initialising graphics device")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DeviceError::Adapter)
            .context("initialising graphics device")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(DeviceError::from)
            .context("initialising graphics device")?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let scene = Scene::new((config.width, config.height), viewer.light_step);

        use wgpu::util::DeviceExt;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[scene.uniforms()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &engine::renderable::vertex_layouts(),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // No culling: meshes with mixed winding still show up (dark on the inverted side).
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let mut mesh = RenderableMesh::upload(&device, asset).context("uploading mesh to GPU")?;
        mesh.set_mode(viewer.initial_mode());

        let mesh_stats = MeshStats {
            vertex_count: asset.vertex_count(),
            triangle_count: asset.face_count(),
        };

        let mut overlay = DebugOverlay::new(&window, &device, surface_format);
        overlay.visible = viewer.overlay;

        Ok(Self {
            mesh,
            mesh_stats,
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            depth_view,
            uniform_buffer,
            uniform_bind_group,
            scene,
            input: InputState::new(),
            overlay,
            move_step: viewer.move_step,
            frame_count: 0,
            last_fps_update: std::time::Instant::now(),
            fps: 0,
            frame_time_avg_ms: 0.0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
            self.scene.resize(new_size.width, new_size.height);
        }
    }

    /// Consume this frame's input. Returns false when the viewer should exit.
    fn update(&mut self) -> bool {
        let signals = self.input.signals(self.move_step);
        self.input.end_frame();

        if signals.exit {
            return false;
        }
        if signals.toggle_shading {
            self.mesh.toggle_mode();
        }
        if signals.toggle_overlay {
            self.overlay.toggle();
        }
        self.scene.apply_input(&signals);

        let now = std::time::Instant::now();
        self.frame_count += 1;
        let elapsed = (now - self.last_fps_update).as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.frame_count;
            self.frame_time_avg_ms = elapsed * 1000.0 / self.frame_count as f32;
            log::debug!("FPS: {} | Shading: {}", self.fps, self.mesh.mode().label());
            self.frame_count = 0;
            self.last_fps_update = now;
        }

        true
    }

    fn render(&mut self, window: &Window) -> Result<(), DeviceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.scene.uniforms()]),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            self.mesh.draw(&mut render_pass);
        }

        if self.overlay.visible {
            let stats = DebugStats {
                fps: self.fps,
                frame_time_avg_ms: self.frame_time_avg_ms,
                resolution: (self.size.width, self.size.height),
                shading: self.mesh.mode(),
                vertex_count: self.mesh_stats.vertex_count,
                triangle_count: self.mesh_stats.triangle_count,
                vertices_submitted: self.mesh.draw_call().vertices_submitted(),
                camera_position: self.scene.camera.position().to_array(),
                light_position: self.scene.light.position.to_array(),
            };
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: window.scale_factor() as f32,
            };
            self.overlay.render(
                &self.device,
                &self.queue,
                &mut encoder,
                window,
                &view,
                &screen_descriptor,
                &stats,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // The light moves once per presented frame.
        self.scene.advance_light();

        Ok(())
    }
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let viewer = ViewerConfig::parse();

    // Load before opening a window so a bad file fails fast with its path/line.
    let asset = MeshAsset::load(&viewer.mesh)
        .with_context(|| format!("loading mesh {}", viewer.mesh.display()))?;

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title(format!("facet_view - {}", viewer.mesh.display()))
        .with_inner_size(winit::dpi::LogicalSize::new(viewer.width, viewer.height));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), &viewer, &asset))?;
    // GPU copies are all the renderer needs from here on.
    drop(asset);

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let response = state.overlay.handle_window_event(&window, event);
                state.input.process_event(event, response.consumed);

                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        if !state.update() {
                            control_flow.exit();
                            return;
                        }
                        match state.render(&window) {
                            Ok(_) => {}
                            Err(DeviceError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                                state.resize(state.size)
                            }
                            Err(DeviceError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                                log::error!("GPU out of memory, exiting");
                                control_flow.exit();
                            }
                            Err(e) => log::error!("Frame dropped: {}", e),
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
