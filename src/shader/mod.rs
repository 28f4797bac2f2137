//! Shader programs: compile, link, reflect and own.
//!
//! A [`ShaderProgram`] only exists once both stages validated, linked against
//! each other and were allocated on the GPU. Uniform and attribute locations
//! are resolved exactly once, at compile time, and looked up by name after.

mod reflect;

use std::collections::HashMap;

pub use reflect::{BlockLayout, StageMask, UniformLocation};

use crate::{
    data_structures::vertex::VertexLayout,
    error::{EngineError, NameKind, ShaderStage},
    gpu::{Gpu, ProgramDesc, ProgramHandle},
    pipelines::{ProgramKind, RenderState},
};

#[derive(Debug, Clone)]
pub struct ShaderProgram {
    label: String,
    vertex_source: String,
    fragment_source: String,
    handle: ProgramHandle,
    uniforms: HashMap<String, UniformLocation>,
    attributes: HashMap<String, u32>,
    blocks: Vec<BlockLayout>,
}

impl ShaderProgram {
    /// Validates both stages, links them and allocates the program.
    ///
    /// Nothing is allocated on `gpu` unless both stages compile and link.
    pub fn compile(
        gpu: &mut dyn Gpu,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        state: RenderState,
        layout: VertexLayout,
    ) -> Result<Self, EngineError> {
        let vertex = reflect::compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = reflect::compile_stage(ShaderStage::Fragment, fragment_source)?;
        let interface = reflect::link(&vertex, &fragment)?;

        for (name, location) in &interface.attributes {
            if !layout.locations().contains(location) {
                return Err(EngineError::Link(format!(
                    "attribute `{name}` at @location({location}) is not provided by the {layout:?} vertex layout"
                )));
            }
        }

        let handle = gpu.create_program(&ProgramDesc {
            label,
            vertex_source,
            fragment_source,
            blocks: &interface.blocks,
            state,
            layout,
        })?;
        log::debug!(
            "linked `{label}`: {} uniforms, {} attributes",
            interface.uniforms.len(),
            interface.attributes.len()
        );

        Ok(Self {
            label: label.to_string(),
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
            handle,
            uniforms: interface.uniforms,
            attributes: interface.attributes,
            blocks: interface.blocks,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// Location of a uniform, either bare (`time`) or qualified (`globals.time`).
    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, UniformLocation)> {
        self.uniforms.iter().map(|(name, loc)| (name.as_str(), *loc))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, u32)> {
        self.attributes.iter().map(|(name, loc)| (name.as_str(), *loc))
    }

    pub fn blocks(&self) -> &[BlockLayout] {
        &self.blocks
    }

    pub fn block(&self, group: u32, binding: u32) -> Option<&BlockLayout> {
        self.blocks
            .iter()
            .find(|b| b.group == group && b.binding == binding)
    }

    /// Checks that every listed name is declared by the program.
    pub fn require(&self, uniforms: &[&str], attributes: &[&str]) -> Result<(), EngineError> {
        let missing = |kind, name: &&str| EngineError::UnknownName {
            kind,
            name: name.to_string(),
            program: self.label.clone(),
        };
        if let Some(name) = uniforms.iter().find(|n| !self.uniforms.contains_key(**n)) {
            return Err(missing(NameKind::Uniform, name));
        }
        if let Some(name) = attributes.iter().find(|n| !self.attributes.contains_key(**n)) {
            return Err(missing(NameKind::Attribute, name));
        }
        Ok(())
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        gpu.release_program(self.handle);
    }
}

/// Built-in programs of one surface, compiled lazily and at most once each.
#[derive(Debug, Default)]
pub struct ShaderProgramManager {
    programs: HashMap<ProgramKind, ShaderProgram>,
}

impl ShaderProgramManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles an arbitrary stage pair. The caller owns the result.
    pub fn compile(
        &self,
        gpu: &mut dyn Gpu,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderProgram, EngineError> {
        ShaderProgram::compile(
            gpu,
            "custom",
            vertex_source,
            fragment_source,
            RenderState::OPAQUE,
            VertexLayout::Model,
        )
    }

    /// Returns the program for `kind`, compiling and checking it on first use.
    pub fn program_for(
        &mut self,
        kind: ProgramKind,
        gpu: &mut dyn Gpu,
    ) -> Result<&ShaderProgram, EngineError> {
        if !self.programs.contains_key(&kind) {
            let (vertex_source, fragment_source) = kind.sources();
            let program = ShaderProgram::compile(
                gpu,
                kind.label(),
                vertex_source,
                fragment_source,
                kind.render_state(),
                kind.vertex_layout(),
            )?;
            if let Err(e) = program.require(kind.required_uniforms(), kind.required_attributes()) {
                program.release(gpu);
                return Err(e);
            }
            self.programs.insert(kind, program);
        }
        self.programs
            .get(&kind)
            .ok_or_else(|| EngineError::Link(format!("{} was not retained", kind.label())))
    }

    pub fn get(&self, kind: ProgramKind) -> Option<&ShaderProgram> {
        self.programs.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProgramKind, &ShaderProgram)> {
        self.programs.iter().map(|(kind, program)| (*kind, program))
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn release_all(&mut self, gpu: &mut dyn Gpu) {
        for (_, program) in self.programs.drain() {
            program.release(gpu);
        }
    }
}
