//! wgpu backend of the [`Gpu`] seam.
//!
//! A [`Context`] owns the window surface, the device and every program and
//! buffer a mount allocated through it. Handles are plain ids into those
//! tables; bind groups are built lazily per (program, group, buffers) and
//! dropped together with the program or any buffer they reference.

use std::{collections::HashMap, sync::Arc};

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    data_structures::texture::DepthTexture,
    error::EngineError,
    gpu::{BufferHandle, BufferKind, Gpu, ProgramDesc, ProgramHandle},
    pipelines::basic::mk_render_pipeline,
    render::{DrawCall, Frame},
    shader::BlockLayout,
};

#[derive(Debug)]
struct GroupLayout {
    layout: wgpu::BindGroupLayout,
    bindings: Vec<u32>,
}

#[derive(Debug)]
struct Program {
    pipeline: wgpu::RenderPipeline,
    /// Indexed by group. Groups the shaders skip get an empty layout.
    groups: Vec<GroupLayout>,
}

type BindGroupKey = (ProgramHandle, u32, Vec<(u32, BufferHandle)>);

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    depth_texture: DepthTexture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    is_surface_configured: bool,
    next_id: u32,
    programs: HashMap<ProgramHandle, Program>,
    buffers: HashMap<BufferHandle, wgpu::Buffer>,
    bind_groups: HashMap<BindGroupKey, wgpu::BindGroup>,
}

impl Context {
    /// Acquires a device for `window`. Any failure along the way means the
    /// page has no usable rendering context.
    pub async fn new(window: Arc<Window>) -> Result<Self, EngineError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| EngineError::ContextUnavailable(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EngineError::ContextUnavailable(e.to_string()))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| EngineError::ContextUnavailable(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                EngineError::ContextUnavailable("surface reports no texture formats".into())
            })?;
        // Overlay surfaces blend with the page behind them when supported.
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::CompositeAlphaMode::PreMultiplied)
            .unwrap_or(surface_caps.alpha_modes[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let depth_texture =
            DepthTexture::new(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            is_surface_configured: false,
            next_id: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            bind_groups: HashMap::new(),
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn group_layouts(&self, label: &str, blocks: &[BlockLayout]) -> Vec<GroupLayout> {
        let groups = blocks.iter().map(|b| b.group + 1).max().unwrap_or(0);
        (0..groups)
            .map(|group| {
                let entries: Vec<wgpu::BindGroupLayoutEntry> = blocks
                    .iter()
                    .filter(|b| b.group == group)
                    .map(|b| {
                        let mut visibility = wgpu::ShaderStages::NONE;
                        if b.stages.vertex {
                            visibility |= wgpu::ShaderStages::VERTEX;
                        }
                        if b.stages.fragment {
                            visibility |= wgpu::ShaderStages::FRAGMENT;
                        }
                        wgpu::BindGroupLayoutEntry {
                            binding: b.binding,
                            visibility,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: wgpu::BufferSize::new(b.size as u64),
                            },
                            count: None,
                        }
                    })
                    .collect();
                let mut bindings: Vec<u32> = entries.iter().map(|e| e.binding).collect();
                bindings.sort();
                GroupLayout {
                    layout: self
                        .device
                        .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                            label: Some(&format!("{label} group {group}")),
                            entries: &entries,
                        }),
                    bindings,
                }
            })
            .collect()
    }

    /// Builds the bind groups `draw` needs that are not cached yet.
    fn prepare_bind_groups(&mut self, draw: &DrawCall) {
        let Some(program) = self.programs.get(&draw.program) else {
            return;
        };
        for (group, layout) in program.groups.iter().enumerate() {
            let group = group as u32;
            let supplied: Vec<(u32, BufferHandle)> = draw
                .group_bindings(group)
                .into_iter()
                .map(|b| (b.binding, b.buffer))
                .collect();
            let key = (draw.program, group, supplied);
            if self.bind_groups.contains_key(&key) {
                continue;
            }
            let slots: Vec<u32> = key.2.iter().map(|(binding, _)| *binding).collect();
            if slots != layout.bindings {
                log::warn!(
                    "draw supplies bindings {slots:?} for group {group}, program expects {:?}",
                    layout.bindings
                );
                continue;
            }
            let entries: Option<Vec<wgpu::BindGroupEntry>> = key
                .2
                .iter()
                .map(|(binding, buffer)| {
                    self.buffers.get(buffer).map(|buffer| wgpu::BindGroupEntry {
                        binding: *binding,
                        resource: buffer.as_entire_binding(),
                    })
                })
                .collect();
            let Some(entries) = entries else {
                log::warn!("draw references a released buffer in group {group}");
                continue;
            };
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &layout.layout,
                entries: &entries,
                label: Some("uniform_bind_group"),
            });
            self.bind_groups.insert(key, bind_group);
        }
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = DepthTexture::new(
            &self.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
        self.is_surface_configured = true;
    }
}

impl Gpu for Context {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, EngineError> {
        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} vertex", desc.label)),
                source: wgpu::ShaderSource::Wgsl(desc.vertex_source.into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} fragment", desc.label)),
                source: wgpu::ShaderSource::Wgsl(desc.fragment_source.into()),
            });

        let groups = self.group_layouts(desc.label, desc.blocks);
        let layouts: Vec<&wgpu::BindGroupLayout> = groups.iter().map(|g| &g.layout).collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} pipeline layout", desc.label)),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });
        let pipeline = mk_render_pipeline(
            &self.device,
            desc.label,
            &pipeline_layout,
            self.config.format,
            desc.state,
            DepthTexture::DEPTH_FORMAT,
            &[desc.layout.buffer_layout()],
            &vertex,
            &fragment,
        );

        let handle = ProgramHandle::new(self.next_id());
        self.programs.insert(handle, Program { pipeline, groups });
        Ok(handle)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.bind_groups.retain(|(p, _, _), _| *p != program);
    }

    fn create_buffer(&mut self, label: &str, kind: BufferKind, contents: &[u8]) -> BufferHandle {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        let handle = BufferHandle::new(self.next_id());
        self.buffers.insert(handle, buffer);
        handle
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        match self.buffers.get(&buffer) {
            Some(target) => self.queue.write_buffer(target, offset, data),
            None => log::warn!("write to released buffer {buffer:?}"),
        }
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if let Some(released) = self.buffers.remove(&buffer) {
            released.destroy();
        }
        self.bind_groups
            .retain(|(_, _, entries), _| entries.iter().all(|(_, b)| *b != buffer));
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.reconfigure();
        }
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), EngineError> {
        self.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        for draw in frame.draws {
            self.prepare_bind_groups(draw);
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(EngineError::ContextUnavailable(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

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
                        load: wgpu::LoadOp::Clear(frame.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for draw in frame.draws {
                let Some(program) = self.programs.get(&draw.program) else {
                    log::warn!("draw with released program {:?}", draw.program);
                    continue;
                };
                let Some(vertices) = self.buffers.get(&draw.vertex_buffer) else {
                    continue;
                };
                render_pass.set_pipeline(&program.pipeline);
                let mut bound = true;
                for group in 0..program.groups.len() as u32 {
                    let key = (
                        draw.program,
                        group,
                        draw.group_bindings(group)
                            .into_iter()
                            .map(|b| (b.binding, b.buffer))
                            .collect(),
                    );
                    match self.bind_groups.get(&key) {
                        Some(bind_group) => render_pass.set_bind_group(group, bind_group, &[]),
                        None => bound = false,
                    }
                }
                if !bound {
                    continue;
                }
                render_pass.set_vertex_buffer(0, vertices.slice(..));
                match draw.index {
                    Some((index, count)) => {
                        let Some(indices) = self.buffers.get(&index) else {
                            continue;
                        };
                        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..count, 0, 0..draw.instance_count);
                    }
                    None => render_pass.draw(0..draw.vertex_count, 0..draw.instance_count),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
