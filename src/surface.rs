//! One mounted render surface.
//!
//! [`SurfaceMount::try_mount`] acquires everything a surface needs in a fixed
//! order (programs, scene buffers, listeners, frame loop) and gives it all back
//! in reverse on [`SurfaceMount::dispose`]. [`SurfaceMount::mount`] is the
//! forgiving variant the page uses: a failure is logged once and leaves a
//! surface that draws nothing. Its scroll regions and particles do not depend
//! on the scene and keep working; the host drives them through
//! [`SurfaceMount::tick`].

use std::collections::HashMap;

use cgmath::Matrix4;
use rand::Rng;

use crate::{
    camera,
    config::EngineConfig,
    data_structures::{
        geometry::MeshData,
        scene_graph::{Lights, Scene, SceneObject, UniformValue},
        uniform_block::UniformBlock,
        vertex::PointVertex,
    },
    error::EngineError,
    gpu::{BufferHandle, BufferKind, Gpu},
    host::{FrameRequest, Host, ListenerId, ListenerKind, SurfaceId},
    particles::ParticleField,
    pipelines::ProgramKind,
    pointer::PointerTracker,
    render::{DrawCall, Frame},
    render_loop::{FrameStats, HoverFlag, RenderLoop},
    scene_builder::{ModelKind, SceneBuilder},
    scroll::{RegionId, ScrollAnimationScheduler, ScrollTrigger, StyleMutation, Timeline},
    shader::{ShaderProgram, ShaderProgramManager},
    viewport::{SurfaceSize, ViewportResizeBinder},
};

#[derive(Debug, Clone, Copy)]
enum Value {
    F32(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    Mat4(Matrix4<f32>),
}

impl From<UniformValue> for Value {
    fn from(value: UniformValue) -> Self {
        match value {
            UniformValue::Float(v) => Value::F32(v),
            UniformValue::Vec4(v) => Value::Vec4(v),
        }
    }
}

/// Writes `value` into whichever of `blocks` holds `name`. Names the program
/// does not declare are skipped.
fn write(program: &ShaderProgram, blocks: &mut [UniformBlock], name: &str, value: Value) -> bool {
    let Some(location) = program.uniform(name) else {
        return false;
    };
    let Some(block) = blocks.iter_mut().find(|b| b.holds(location)) else {
        return false;
    };
    match value {
        Value::F32(v) => block.set_f32(location, v),
        Value::Vec2(v) => block.set_vec2(location, v),
        Value::Vec4(v) => block.set_vec4(location, v),
        Value::Mat4(v) => block.set_mat4(location, v),
    }
    true
}

/// GPU side of one drawable scene object.
#[derive(Debug)]
struct MeshDraw {
    program: ProgramKind,
    vertex_buffer: BufferHandle,
    index: Option<(BufferHandle, u32)>,
    vertex_count: u32,
    instance_count: u32,
    /// Per-object blocks (`@group(1)` and up).
    blocks: Vec<UniformBlock>,
}

#[derive(Debug)]
struct Live {
    scene: Scene,
    programs: ShaderProgramManager,
    /// Frame-level blocks (`@group(0)`), per program.
    frame_blocks: HashMap<ProgramKind, Vec<UniformBlock>>,
    /// One entry per drawable, in [`Scene::drawables`] order. `None` for
    /// objects whose geometry tessellated to nothing.
    meshes: Vec<Option<MeshDraw>>,
    render_loop: RenderLoop,
    viewport: ViewportResizeBinder,
    pointer: Option<PointerTracker>,
    hover_listeners: Vec<ListenerId>,
    resolution: (u32, u32),
    last_time: f32,
}

impl Live {
    fn new(scene: Scene, surface: SurfaceId, config: &EngineConfig) -> Self {
        Self {
            scene,
            programs: ShaderProgramManager::new(),
            frame_blocks: HashMap::new(),
            meshes: Vec::new(),
            render_loop: RenderLoop::new(),
            viewport: ViewportResizeBinder::new(surface, config.max_pixel_ratio),
            pointer: None,
            hover_listeners: Vec::new(),
            resolution: (1, 1),
            last_time: 0.0,
        }
    }

    /// Acquires programs, scene buffers, listeners and the frame loop, in
    /// that order. A failed step releases what the earlier ones allocated.
    fn acquire<R: Rng>(
        surface: SurfaceId,
        kind: ModelKind,
        config: &EngineConfig,
        size: SurfaceSize,
        host: &mut Host<'_>,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        let gpu = host
            .gpu
            .as_deref_mut()
            .ok_or_else(|| EngineError::ContextUnavailable(format!("no GPU context for {surface:?}")))?;

        let builder = SceneBuilder {
            globe_points: config.globe_points,
            motion: config.motion,
        };
        let scene = builder.build(kind, &config.style, rng);
        let mut live = Live::new(scene, surface, config);

        let acquired = live
            .compile_programs(gpu)
            .and_then(|()| live.upload_meshes(gpu));
        if let Err(e) = acquired {
            live.release_gpu(gpu);
            return Err(e);
        }

        live.viewport.apply(size, &mut live.scene.projection, gpu);
        live.resolution = size.physical(config.max_pixel_ratio);

        live.viewport.bind(host.listeners);
        if kind.is_interactive() {
            live.hover_listeners = vec![
                host.listeners.add_listener(surface, ListenerKind::PointerEnter),
                host.listeners.add_listener(surface, ListenerKind::PointerLeave),
            ];
        }
        if kind == ModelKind::BackgroundPlane {
            let mut pointer = PointerTracker::new(surface);
            pointer.bind(host.listeners);
            live.pointer = Some(pointer);
        }

        live.render_loop.start(host.scheduler, host.clock);
        log::info!(
            "mounted {kind:?} on {surface:?}: {} programs, {} meshes",
            live.programs.len(),
            live.meshes.len()
        );
        Ok(live)
    }

    fn compile_programs(&mut self, gpu: &mut dyn Gpu) -> Result<(), EngineError> {
        for kind in self.scene.programs() {
            let program = self.programs.program_for(kind, gpu)?;
            let blocks = program
                .blocks()
                .iter()
                .filter(|layout| layout.group == 0)
                .map(|layout| {
                    UniformBlock::new(gpu, &format!("{} {}", kind.label(), layout.name), layout)
                })
                .collect();
            self.frame_blocks.insert(kind, blocks);
        }
        Ok(())
    }

    fn upload_meshes(&mut self, gpu: &mut dyn Gpu) -> Result<(), EngineError> {
        for object in self.scene.drawables() {
            let (Some(geometry), Some(material)) = (&object.geometry, &object.material) else {
                self.meshes.push(None);
                continue;
            };
            let data = geometry.tessellate();
            if data.is_empty() {
                log::debug!("`{}` has no geometry to draw", object.name);
                self.meshes.push(None);
                continue;
            }
            let program = self
                .programs
                .get(material.program)
                .ok_or_else(|| EngineError::Link(format!("{} not compiled", material.program.label())))?;

            let mut mesh = match &data {
                MeshData::Indexed { vertices, indices } => MeshDraw {
                    program: material.program,
                    vertex_buffer: gpu.create_buffer(
                        &format!("{} vertices", object.name),
                        BufferKind::Vertex,
                        bytemuck::cast_slice(vertices),
                    ),
                    index: Some((
                        gpu.create_buffer(
                            &format!("{} indices", object.name),
                            BufferKind::Index,
                            bytemuck::cast_slice(indices),
                        ),
                        indices.len() as u32,
                    )),
                    vertex_count: vertices.len() as u32,
                    instance_count: 1,
                    blocks: Vec::new(),
                },
                MeshData::Points(points) => MeshDraw {
                    program: material.program,
                    vertex_buffer: gpu.create_buffer(
                        &format!("{} instances", object.name),
                        BufferKind::Vertex,
                        bytemuck::cast_slice(points),
                    ),
                    index: None,
                    vertex_count: PointVertex::QUAD_VERTICES,
                    instance_count: points.len() as u32,
                    blocks: Vec::new(),
                },
            };
            mesh.blocks = program
                .blocks()
                .iter()
                .filter(|layout| layout.group > 0)
                .map(|layout| {
                    UniformBlock::new(gpu, &format!("{} {}", object.name, layout.name), layout)
                })
                .collect();
            self.meshes.push(Some(mesh));
        }
        Ok(())
    }

    /// Writes every uniform of the frame at absolute time `t`.
    fn write_uniforms(&mut self, config: &EngineConfig, t: f32, hovered: bool) {
        let view_proj = camera::view_projection(&self.scene.camera, &self.scene.projection);
        let eye = self.scene.camera.eye;
        let resolution = [self.resolution.0 as f32, self.resolution.1 as f32];
        let intensity = config.motion.point_intensity(t, hovered);

        for (kind, blocks) in self.frame_blocks.iter_mut() {
            let Some(program) = self.programs.get(*kind) else {
                continue;
            };
            write(program, blocks, "time", Value::F32(t));
            write(program, blocks, "intensity", Value::F32(intensity));
            write(program, blocks, "view_proj", Value::Mat4(view_proj));
            write(program, blocks, "eye", Value::Vec4([eye.x, eye.y, eye.z, 1.0]));
            write(program, blocks, "resolution", Value::Vec2(resolution));
            if let Some(lights) = &self.scene.lights {
                write_lights(program, blocks, lights);
            }
        }

        for (object, mesh) in self.scene.drawables().into_iter().zip(self.meshes.iter_mut()) {
            let Some(mesh) = mesh else {
                continue;
            };
            let Some(program) = self.programs.get(mesh.program) else {
                continue;
            };
            write_object(program, &mut mesh.blocks, object);
            if let Some(material) = &object.material {
                for (name, value) in &material.overrides {
                    let value = Value::from(*value);
                    if !write(program, &mut mesh.blocks, name, value) {
                        if let Some(blocks) = self.frame_blocks.get_mut(&mesh.program) {
                            write(program, blocks, name, value);
                        }
                    }
                }
            }
        }
    }

    fn flush(&mut self, gpu: &mut dyn Gpu) {
        for block in self.frame_blocks.values_mut().flatten() {
            block.flush(gpu);
        }
        for mesh in self.meshes.iter_mut().flatten() {
            for block in &mut mesh.blocks {
                block.flush(gpu);
            }
        }
    }

    fn draw_calls(&self) -> Vec<DrawCall> {
        self.meshes
            .iter()
            .flatten()
            .filter_map(|mesh| {
                let program = self.programs.get(mesh.program)?;
                let bindings = self
                    .frame_blocks
                    .get(&mesh.program)
                    .into_iter()
                    .flatten()
                    .chain(&mesh.blocks)
                    .map(UniformBlock::binding)
                    .collect();
                Some(DrawCall {
                    program: program.handle(),
                    vertex_buffer: mesh.vertex_buffer,
                    index: mesh.index,
                    vertex_count: mesh.vertex_count,
                    instance_count: mesh.instance_count,
                    bindings,
                })
            })
            .collect()
    }

    /// Buffers first, then programs.
    fn release_gpu(&mut self, gpu: &mut dyn Gpu) {
        for mesh in self.meshes.drain(..).flatten() {
            gpu.release_buffer(mesh.vertex_buffer);
            if let Some((index, _)) = mesh.index {
                gpu.release_buffer(index);
            }
            for block in mesh.blocks {
                block.release(gpu);
            }
        }
        for (_, blocks) in self.frame_blocks.drain() {
            for block in blocks {
                block.release(gpu);
            }
        }
        self.programs.release_all(gpu);
    }
}

fn write_lights(program: &ShaderProgram, blocks: &mut [UniformBlock], lights: &Lights) {
    let coloured = |c: [f32; 3], w: f32| Value::Vec4([c[0], c[1], c[2], w]);
    let positioned = |p: [f32; 3]| Value::Vec4([p[0], p[1], p[2], 1.0]);
    write(
        program,
        blocks,
        "ambient",
        coloured(lights.ambient.color, lights.ambient.intensity),
    );
    write(
        program,
        blocks,
        "directional_color",
        coloured(lights.directional.color, lights.directional.intensity),
    );
    write(
        program,
        blocks,
        "directional_position",
        positioned(lights.directional.position),
    );
    write(
        program,
        blocks,
        "point_color",
        coloured(lights.point.color, lights.point.range),
    );
    write(program, blocks, "point_position", positioned(lights.point.position));
}

fn write_object(program: &ShaderProgram, blocks: &mut [UniformBlock], object: &SceneObject) {
    let world = object.world();
    write(program, blocks, "model", Value::Mat4(world.to_matrix()));
    write(program, blocks, "normal_matrix", Value::Mat4(world.normal_matrix()));
    if let Some(material) = &object.material {
        write(program, blocks, "color", Value::Vec4(material.color));
        write(program, blocks, "metalness", Value::F32(material.metalness));
        write(program, blocks, "roughness", Value::F32(material.roughness));
        write(program, blocks, "opacity", Value::F32(material.opacity));
    }
}

/// A surface and everything acquired for it.
#[derive(Debug)]
pub struct SurfaceMount {
    surface: SurfaceId,
    kind: ModelKind,
    config: EngineConfig,
    hover: HoverFlag,
    scroll: ScrollAnimationScheduler,
    scroll_listener: Option<ListenerId>,
    particles: ParticleField,
    mutations: Vec<StyleMutation>,
    live: Option<Live>,
}

impl SurfaceMount {
    /// A mount that draws nothing and ignores every event.
    pub fn inert(surface: SurfaceId, kind: ModelKind, config: &EngineConfig) -> Self {
        Self {
            surface,
            kind,
            config: config.clone(),
            hover: HoverFlag::new(),
            scroll: ScrollAnimationScheduler::new(),
            scroll_listener: None,
            particles: ParticleField::new(),
            mutations: Vec::new(),
            live: None,
        }
    }

    /// Page-side state that works with or without a rendering context: the
    /// scroll listener and, behind the hero, the particle batch.
    fn page<R: Rng>(
        surface: SurfaceId,
        kind: ModelKind,
        config: &EngineConfig,
        host: &mut Host<'_>,
        rng: &mut R,
    ) -> Self {
        let mut mount = Self::inert(surface, kind, config);
        mount.scroll_listener = Some(host.listeners.add_listener(surface, ListenerKind::Scroll));
        if kind == ModelKind::BackgroundPlane {
            mount.particles.regenerate(config.particle_count, rng);
        }
        mount
    }

    /// Mounts `kind` on `surface`. A scene that cannot be acquired is logged
    /// and leaves a mount that draws nothing but still drives its scroll
    /// regions and particles.
    pub fn mount<R: Rng>(
        surface: SurfaceId,
        kind: ModelKind,
        config: &EngineConfig,
        size: SurfaceSize,
        host: &mut Host<'_>,
        rng: &mut R,
    ) -> Self {
        let mut mount = Self::page(surface, kind, config, host, rng);
        match Live::acquire(surface, kind, config, size, host, rng) {
            Ok(live) => mount.live = Some(live),
            Err(e) if e.is_benign() => log::warn!("{surface:?} ({kind:?}) stays blank: {e}"),
            Err(e) => log::error!("{surface:?} ({kind:?}) failed to mount: {e}"),
        }
        mount
    }

    /// Mounts `kind` on `surface`, or gives everything back and fails.
    pub fn try_mount<R: Rng>(
        surface: SurfaceId,
        kind: ModelKind,
        config: &EngineConfig,
        size: SurfaceSize,
        host: &mut Host<'_>,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        let mut mount = Self::page(surface, kind, config, host, rng);
        match Live::acquire(surface, kind, config, size, host, rng) {
            Ok(live) => {
                mount.live = Some(live);
                Ok(mount)
            }
            Err(e) => {
                mount.dispose(host);
                Err(e)
            }
        }
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Whether the surface renders. False for inert and disposed mounts.
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    pub fn hover_flag(&self) -> HoverFlag {
        self.hover.clone()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.live.as_ref().map(|live| &live.scene)
    }

    pub fn program(&self, kind: ProgramKind) -> Option<&ShaderProgram> {
        self.live.as_ref()?.programs.get(kind)
    }

    pub fn stats(&self) -> FrameStats {
        self.live
            .as_ref()
            .map(|live| live.render_loop.stats())
            .unwrap_or_default()
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.live.as_ref()?.render_loop.pending()
    }

    pub fn scroll(&mut self) -> &mut ScrollAnimationScheduler {
        &mut self.scroll
    }

    /// Registers `timeline` under the configured default start threshold.
    pub fn register_region(&mut self, name: &str, timeline: Timeline) -> RegionId {
        let trigger = ScrollTrigger::new(self.config.default_start);
        self.scroll.register(name, trigger, timeline)
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    /// Current parallax offset in pixels, if the surface tracks the pointer.
    pub fn parallax(&self) -> Option<[f32; 2]> {
        self.live.as_ref()?.pointer.as_ref().map(PointerTracker::offset)
    }

    /// Style side effects produced since the last call.
    pub fn take_mutations(&mut self) -> Vec<StyleMutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Moves the scroll playheads by `dt` seconds. Live mounts do this on
    /// every frame; a mount without a scene needs the host to call it.
    pub fn tick(&mut self, dt: f32) {
        self.mutations.extend(self.scroll.advance(dt));
    }

    /// Whether [`tick`](Self::tick) still has playheads to move.
    pub fn is_animating(&self) -> bool {
        self.scroll.is_animating()
    }

    pub fn on_pointer_enter(&self) {
        if self.live.is_some() {
            self.hover.set(true);
        }
    }

    pub fn on_pointer_leave(&self) {
        self.hover.set(false);
    }

    pub fn on_pointer_move(&mut self, client_x: f32, client_y: f32, viewport: (f32, f32)) {
        if let Some(pointer) = self.live.as_mut().and_then(|live| live.pointer.as_mut()) {
            pointer.on_move(client_x, client_y, viewport);
        }
    }

    pub fn on_resize(&mut self, size: SurfaceSize, host: &mut Host<'_>) {
        let (Some(live), Some(gpu)) = (self.live.as_mut(), host.gpu.as_deref_mut()) else {
            return;
        };
        live.viewport.apply(size, &mut live.scene.projection, gpu);
        live.resolution = size.physical(self.config.max_pixel_ratio);
    }

    /// Renders one frame if `request` is the frame this surface asked for.
    /// Returns whether a frame was rendered.
    pub fn on_frame(&mut self, request: FrameRequest, host: &mut Host<'_>) -> bool {
        if host.gpu.is_none() {
            return false;
        }
        let (elapsed, t, dt) = {
            let Some(live) = self.live.as_mut() else {
                return false;
            };
            let Some(elapsed) = live.render_loop.on_frame(request, host.scheduler, host.clock)
            else {
                return false;
            };
            let t = elapsed.as_secs_f32();
            let dt = (t - live.last_time).max(0.0);
            live.last_time = t;
            (elapsed, t, dt)
        };
        self.tick(dt);

        let (Some(live), Some(gpu)) = (self.live.as_mut(), host.gpu.as_deref_mut()) else {
            return false;
        };
        let hovered = self.hover.get();
        if let Some(pointer) = live.pointer.as_mut() {
            pointer.advance(dt);
        }

        live.scene.update(t, hovered);
        live.write_uniforms(&self.config, t, hovered);
        live.flush(gpu);

        let draws = live.draw_calls();
        let frame = Frame {
            clear_colour: self.config.clear_colour,
            draws: &draws,
        };
        match gpu.render(&frame) {
            Ok(()) => {
                live.render_loop.record_render(elapsed);
                true
            }
            Err(e) => {
                log::warn!("{:?} skipped a frame: {e}", self.surface);
                false
            }
        }
    }

    /// Stops the loop, removes listeners and releases buffers and programs,
    /// in that order. Returns the style values that undo every scroll region.
    /// Disposing twice is a no-op.
    pub fn dispose(&mut self, host: &mut Host<'_>) -> Vec<StyleMutation> {
        let mut live = self.live.take();
        let scroll_listener = self.scroll_listener.take();
        if live.is_none() && scroll_listener.is_none() {
            return self.scroll.revert();
        }
        if let Some(live) = live.as_mut() {
            live.render_loop.stop(host.scheduler);
            live.viewport.unbind(host.listeners);
            if let Some(pointer) = live.pointer.as_mut() {
                pointer.unbind(host.listeners);
            }
            for id in live.hover_listeners.drain(..) {
                host.listeners.remove_listener(id);
            }
        }
        if let Some(id) = scroll_listener {
            host.listeners.remove_listener(id);
        }
        if let Some(mut live) = live {
            match host.gpu.as_deref_mut() {
                Some(gpu) => live.release_gpu(gpu),
                None => log::warn!(
                    "{:?} disposed without a GPU context; its resources went with it",
                    self.surface
                ),
            }
        }
        self.hover.set(false);
        self.particles.clear();
        log::info!("disposed {:?}", self.surface);
        self.scroll.revert()
    }
}
