//! The GPU seam.
//!
//! Everything the engine needs from a graphics backend goes through [`Gpu`]:
//! allocating linked programs, uploading buffers and submitting a frame. The
//! wgpu implementation lives in [`crate::context`]; tests drive the same code
//! with a recording fake.

use crate::{
    data_structures::vertex::VertexLayout,
    error::EngineError,
    pipelines::RenderState,
    render::Frame,
    shader::BlockLayout,
};

/// Backend handle of a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(u32);

impl ProgramHandle {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// Backend handle of a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(u32);

impl BufferHandle {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

/// Everything a backend needs to turn two validated stages into a program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    /// Uniform blocks the program reads, as reflected from both stages.
    pub blocks: &'a [BlockLayout],
    pub state: RenderState,
    pub layout: VertexLayout,
}

pub trait Gpu {
    /// Links a program from two stages that already passed validation.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle, EngineError>;
    fn release_program(&mut self, program: ProgramHandle);

    fn create_buffer(&mut self, label: &str, kind: BufferKind, contents: &[u8]) -> BufferHandle;
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Resizes the drawing buffer, in physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Clears the target and issues every draw of `frame`, in order.
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), EngineError>;
}
