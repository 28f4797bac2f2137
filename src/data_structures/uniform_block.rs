//! CPU-side mirror of a uniform buffer.
//!
//! Values are written by [`UniformLocation`], i.e. by the offset reflection
//! found for a name, and uploaded in one `write_buffer` per frame when dirty.

use crate::{
    gpu::{BufferHandle, BufferKind, Gpu},
    render::UniformBinding,
    shader::{BlockLayout, UniformLocation},
};

#[derive(Debug, Clone)]
pub struct UniformBlock {
    group: u32,
    binding: u32,
    bytes: Vec<u8>,
    buffer: BufferHandle,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(gpu: &mut dyn Gpu, label: &str, layout: &BlockLayout) -> Self {
        let bytes = vec![0u8; layout.size as usize];
        let buffer = gpu.create_buffer(label, BufferKind::Uniform, &bytes);
        Self {
            group: layout.group,
            binding: layout.binding,
            bytes,
            buffer,
            dirty: false,
        }
    }

    pub fn binding(&self) -> UniformBinding {
        UniformBinding {
            group: self.group,
            binding: self.binding,
            buffer: self.buffer,
        }
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether `location` points into this block.
    pub fn holds(&self, location: UniformLocation) -> bool {
        location.group == self.group && location.binding == self.binding
    }

    fn write(&mut self, location: UniformLocation, data: &[u8]) {
        if !self.holds(location) {
            return;
        }
        let start = location.offset as usize;
        let len = data.len().min(location.size as usize);
        let Some(target) = self.bytes.get_mut(start..start + len) else {
            log::warn!(
                "uniform write at {start}..{} exceeds block of {} bytes",
                start + len,
                self.bytes.len()
            );
            return;
        };
        if target != &data[..len] {
            target.copy_from_slice(&data[..len]);
            self.dirty = true;
        }
    }

    pub fn set_f32(&mut self, location: UniformLocation, value: f32) {
        self.write(location, bytemuck::bytes_of(&value));
    }

    pub fn set_vec2(&mut self, location: UniformLocation, value: [f32; 2]) {
        self.write(location, bytemuck::cast_slice(&value));
    }

    pub fn set_vec4(&mut self, location: UniformLocation, value: [f32; 4]) {
        self.write(location, bytemuck::cast_slice(&value));
    }

    pub fn set_mat4(&mut self, location: UniformLocation, value: cgmath::Matrix4<f32>) {
        let columns: [[f32; 4]; 4] = value.into();
        self.write(location, bytemuck::cast_slice(&columns));
    }

    pub fn get_f32(&self, location: UniformLocation) -> Option<f32> {
        if !self.holds(location) {
            return None;
        }
        let start = location.offset as usize;
        self.bytes
            .get(start..start + 4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Uploads pending changes.
    pub fn flush(&mut self, gpu: &mut dyn Gpu) {
        if self.dirty {
            gpu.write_buffer(self.buffer, 0, &self.bytes);
            self.dirty = false;
        }
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        gpu.release_buffer(self.buffer);
    }
}
