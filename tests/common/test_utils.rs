#![allow(dead_code)]

use std::{
    cell::Cell,
    collections::{BTreeMap, HashMap},
};

use instant::Duration;
use stage_ngin::{
    error::EngineError,
    gpu::{BufferHandle, BufferKind, Gpu, ProgramDesc, ProgramHandle},
    host::{Clock, EventRouter, FrameQueue, Host},
    render::{DrawCall, Frame},
    shader::ShaderProgram,
};

/// What the engine asked the backend to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GpuCall {
    CreateProgram(ProgramHandle),
    ReleaseProgram(ProgramHandle),
    CreateBuffer(BufferHandle, BufferKind),
    ReleaseBuffer(BufferHandle),
    Resize(u32, u32),
    Render,
}

/// One submitted frame with a snapshot of every uniform buffer it bound.
#[derive(Debug, Clone)]
pub(crate) struct RecordedFrame {
    pub(crate) draws: Vec<DrawCall>,
    pub(crate) uniforms: HashMap<BufferHandle, Vec<u8>>,
}

impl RecordedFrame {
    /// Reads the `f32` uniform `name` as bound for `program` in this frame.
    pub(crate) fn uniform_f32(&self, program: &ShaderProgram, name: &str) -> Option<f32> {
        let location = program.uniform(name)?;
        let draw = self.draws.iter().find(|d| d.program == program.handle())?;
        let binding = draw
            .bindings
            .iter()
            .find(|b| b.group == location.group && b.binding == location.binding)?;
        let bytes = self.uniforms.get(&binding.buffer)?;
        let start = location.offset as usize;
        let raw = bytes.get(start..start + 4)?;
        Some(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

/// A [`Gpu`] that keeps everything in memory and records every call.
#[derive(Debug, Default)]
pub(crate) struct RecordingGpu {
    next: u32,
    pub(crate) programs: BTreeMap<ProgramHandle, String>,
    pub(crate) buffers: HashMap<BufferHandle, (BufferKind, Vec<u8>)>,
    pub(crate) frames: Vec<RecordedFrame>,
    pub(crate) calls: Vec<GpuCall>,
    /// Fails every program creation once this many programs exist.
    pub(crate) program_limit: Option<usize>,
}

impl RecordingGpu {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next += 1;
        self.next
    }

    pub(crate) fn created_programs(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, GpuCall::CreateProgram(_)))
            .count()
    }

    pub(crate) fn resizes(&self) -> Vec<(u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::Resize(w, h) => Some((*w, *h)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }
}

impl Gpu for RecordingGpu {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, EngineError> {
        if self.program_limit.is_some_and(|limit| self.programs.len() >= limit) {
            return Err(EngineError::Link(format!("{}: out of program slots", desc.label)));
        }
        let handle = ProgramHandle::new(self.next_id());
        self.programs.insert(handle, desc.label.to_string());
        self.calls.push(GpuCall::CreateProgram(handle));
        Ok(handle)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.calls.push(GpuCall::ReleaseProgram(program));
    }

    fn create_buffer(&mut self, _label: &str, kind: BufferKind, contents: &[u8]) -> BufferHandle {
        let handle = BufferHandle::new(self.next_id());
        self.buffers.insert(handle, (kind, contents.to_vec()));
        self.calls.push(GpuCall::CreateBuffer(handle, kind));
        handle
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        if let Some((_, bytes)) = self.buffers.get_mut(&buffer) {
            let start = offset as usize;
            bytes[start..start + data.len()].copy_from_slice(data);
        }
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        self.calls.push(GpuCall::ReleaseBuffer(buffer));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(GpuCall::Resize(width, height));
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), EngineError> {
        let uniforms = frame
            .draws
            .iter()
            .flat_map(|d| d.bindings.iter())
            .filter_map(|b| {
                self.buffers
                    .get(&b.buffer)
                    .map(|(_, bytes)| (b.buffer, bytes.clone()))
            })
            .collect();
        self.frames.push(RecordedFrame {
            draws: frame.draws.to_vec(),
            uniforms,
        });
        self.calls.push(GpuCall::Render);
        Ok(())
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub(crate) struct ManualClock(Cell<Duration>);

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn advance(&self, secs: f32) {
        self.0.set(self.0.get() + Duration::from_secs_f32(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Every host service a test drives by hand.
#[derive(Debug, Default)]
pub(crate) struct TestHost {
    pub(crate) gpu: RecordingGpu,
    pub(crate) frames: FrameQueue,
    pub(crate) listeners: EventRouter,
    pub(crate) clock: ManualClock,
}

impl TestHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn host(&mut self) -> Host<'_> {
        Host {
            gpu: Some(&mut self.gpu),
            scheduler: &mut self.frames,
            listeners: &mut self.listeners,
            clock: &self.clock,
        }
    }

    /// A host whose page never produced a rendering context.
    pub(crate) fn host_without_gpu(&mut self) -> Host<'_> {
        Host {
            gpu: None,
            scheduler: &mut self.frames,
            listeners: &mut self.listeners,
            clock: &self.clock,
        }
    }
}
