//! Stage validation and interface reflection on top of naga.

use std::collections::{BTreeMap, HashMap};

use wgpu::naga::{
    self, AddressSpace, Binding, Handle, Module, Type, TypeInner,
    valid::{Capabilities, ValidationFlags, Validator},
};

use crate::error::{EngineError, ShaderStage};

/// Where a uniform lives: the block it belongs to and its byte range inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageMask {
    pub vertex: bool,
    pub fragment: bool,
}

/// A `var<uniform>` block, merged across stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub size: u32,
    pub stages: StageMask,
}

/// Interface of a linked program as seen from the host.
#[derive(Debug, Clone, Default)]
pub(crate) struct Interface {
    pub(crate) uniforms: HashMap<String, UniformLocation>,
    pub(crate) attributes: HashMap<String, u32>,
    pub(crate) blocks: Vec<BlockLayout>,
}

/// A location-bound value crossing a stage boundary.
struct Varying {
    name: String,
    location: u32,
    inner: TypeInner,
}

/// Parses and validates one stage, returning the module for reflection.
pub(crate) fn compile_stage(stage: ShaderStage, source: &str) -> Result<Module, EngineError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| EngineError::Compile {
        stage,
        diagnostic: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| EngineError::Compile {
            stage,
            diagnostic: e.emit_to_string(source),
        })?;

    let entries = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == naga_stage(stage))
        .count();
    if entries != 1 {
        return Err(EngineError::Compile {
            stage,
            diagnostic: format!("expected exactly one @{stage} entry point, found {entries}"),
        });
    }
    Ok(module)
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

fn entry_point(module: &Module, stage: ShaderStage) -> Option<&naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage(stage))
}

/// Flattens a (possibly struct-typed) binding into its location-bound parts.
fn collect_varyings(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(Varying {
            name: name.unwrap_or_default().to_string(),
            location: *location,
            inner: module.types[ty].inner.clone(),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_varyings(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.as_deref(),
                        out,
                    );
                }
            }
        }
    }
}

fn stage_inputs(module: &Module, stage: ShaderStage) -> Vec<Varying> {
    let mut out = Vec::new();
    if let Some(ep) = entry_point(module, stage) {
        for arg in &ep.function.arguments {
            collect_varyings(module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut out);
        }
    }
    out
}

fn stage_outputs(module: &Module, stage: ShaderStage) -> Vec<Varying> {
    let mut out = Vec::new();
    if let Some(result) = entry_point(module, stage).and_then(|ep| ep.function.result.as_ref()) {
        collect_varyings(module, result.ty, result.binding.as_ref(), None, &mut out);
    }
    out
}

/// Uniform blocks of one stage keyed by (group, binding), with member locations.
fn uniform_blocks(
    module: &Module,
    stage: ShaderStage,
) -> BTreeMap<(u32, u32), (BlockLayout, Vec<(String, UniformLocation)>)> {
    let ctx = module.to_ctx();
    let mut blocks = BTreeMap::new();

    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let Some(rb) = var.binding.as_ref() else {
            continue;
        };
        let inner = &module.types[var.ty].inner;
        let size = inner.size(ctx);
        let name = var.name.clone().unwrap_or_default();

        let mut members = vec![(
            name.clone(),
            UniformLocation {
                group: rb.group,
                binding: rb.binding,
                offset: 0,
                size,
            },
        )];
        if let TypeInner::Struct { members: fields, .. } = inner {
            for field in fields {
                let Some(field_name) = field.name.clone() else {
                    continue;
                };
                members.push((
                    field_name,
                    UniformLocation {
                        group: rb.group,
                        binding: rb.binding,
                        offset: field.offset,
                        size: module.types[field.ty].inner.size(ctx),
                    },
                ));
            }
        }

        let stages = StageMask {
            vertex: stage == ShaderStage::Vertex,
            fragment: stage == ShaderStage::Fragment,
        };
        blocks.insert(
            (rb.group, rb.binding),
            (
                BlockLayout {
                    name,
                    group: rb.group,
                    binding: rb.binding,
                    size,
                    stages,
                },
                members,
            ),
        );
    }
    blocks
}

/// Checks the two stages against each other and reflects the program interface.
pub(crate) fn link(vertex: &Module, fragment: &Module) -> Result<Interface, EngineError> {
    let produced = stage_outputs(vertex, ShaderStage::Vertex);
    for input in stage_inputs(fragment, ShaderStage::Fragment) {
        match produced.iter().find(|out| out.location == input.location) {
            None => {
                return Err(EngineError::Link(format!(
                    "fragment input `{}` at @location({}) is not written by the vertex stage",
                    input.name, input.location
                )));
            }
            Some(out) if out.inner != input.inner => {
                return Err(EngineError::Link(format!(
                    "@location({}) is {:?} in the vertex stage but {:?} in the fragment stage",
                    input.location, out.inner, input.inner
                )));
            }
            Some(_) => {}
        }
    }

    let mut merged = uniform_blocks(vertex, ShaderStage::Vertex);
    for (key, (block, members)) in uniform_blocks(fragment, ShaderStage::Fragment) {
        match merged.get_mut(&key) {
            Some((existing, _)) if existing.size != block.size => {
                return Err(EngineError::Link(format!(
                    "uniform block at @group({}) @binding({}) is {} bytes in the vertex stage but {} in the fragment stage",
                    key.0, key.1, existing.size, block.size
                )));
            }
            Some((existing, _)) => existing.stages.fragment = true,
            None => {
                merged.insert(key, (block, members));
            }
        }
    }

    let mut interface = Interface::default();
    // Bare member names are only usable while they are unambiguous.
    let mut ambiguous = Vec::new();
    for (block, members) in merged.values() {
        for (name, location) in members {
            if name != &block.name {
                interface
                    .uniforms
                    .insert(format!("{}.{}", block.name, name), *location);
            }
            match interface.uniforms.get(name) {
                Some(existing) if existing != location => ambiguous.push(name.clone()),
                Some(_) => {}
                None => {
                    interface.uniforms.insert(name.clone(), *location);
                }
            }
        }
        interface.blocks.push(block.clone());
    }
    for name in ambiguous {
        log::debug!("uniform name `{name}` is ambiguous, use the qualified form");
        interface.uniforms.remove(&name);
    }

    for input in stage_inputs(vertex, ShaderStage::Vertex) {
        interface.attributes.insert(input.name, input.location);
    }

    Ok(interface)
}
