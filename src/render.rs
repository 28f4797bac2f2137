//! Frame description handed to the [`Gpu`](crate::gpu::Gpu) seam.
//!
//! A [`Frame`] is a flat, ordered list of [`DrawCall`]s. Batching by pipeline is
//! left to the backend; scenes here are small enough that draw order is simply
//! scene order (opaque background first, transparent overlays last).

use crate::gpu::{BufferHandle, ProgramHandle};

/// A uniform buffer bound at `@group(group) @binding(binding)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformBinding {
    pub group: u32,
    pub binding: u32,
    pub buffer: BufferHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramHandle,
    pub vertex_buffer: BufferHandle,
    /// Index buffer and index count for indexed meshes.
    pub index: Option<(BufferHandle, u32)>,
    pub vertex_count: u32,
    pub instance_count: u32,
    pub bindings: Vec<UniformBinding>,
}

impl DrawCall {
    /// Bindings that belong to `group`, ordered by binding slot.
    pub fn group_bindings(&self, group: u32) -> Vec<UniformBinding> {
        let mut bindings: Vec<UniformBinding> = self
            .bindings
            .iter()
            .copied()
            .filter(|b| b.group == group)
            .collect();
        bindings.sort();
        bindings
    }

    /// Highest bind group index the draw uses, if any.
    pub fn max_group(&self) -> Option<u32> {
        self.bindings.iter().map(|b| b.group).max()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub clear_colour: wgpu::Color,
    pub draws: &'a [DrawCall],
}
