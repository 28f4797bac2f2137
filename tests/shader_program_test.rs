use stage_ngin::{
    data_structures::vertex::VertexLayout,
    error::{EngineError, NameKind, ShaderStage},
    pipelines::{ProgramKind, RenderState},
    shader::{ShaderProgram, ShaderProgramManager},
};

use crate::common::test_utils::RecordingGpu;

mod common;

const VERTEX: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    tint: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> camera: Camera;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(v: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.uv = v.uv;
    out.clip_position = camera.view_proj * vec4<f32>(v.position + v.normal * 0.0, 1.0);
    return out;
}
"#;

const FRAGMENT: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    tint: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(0) @binding(1)
var<uniform> time: f32;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return camera.tint * vec4<f32>(in.uv, sin(time), 1.0);
}
"#;

fn compile(gpu: &mut RecordingGpu, vertex: &str, fragment: &str) -> Result<ShaderProgram, EngineError> {
    ShaderProgram::compile(
        gpu,
        "test",
        vertex,
        fragment,
        RenderState::OPAQUE,
        VertexLayout::Model,
    )
}

#[test]
fn should_resolve_every_declared_name() {
    let mut gpu = RecordingGpu::new();
    let program = compile(&mut gpu, VERTEX, FRAGMENT).expect("valid pair links");

    for name in ["view_proj", "tint", "camera.view_proj", "camera.tint", "time"] {
        assert!(program.uniform(name).is_some(), "`{name}` unresolved");
    }
    assert_eq!(program.attribute("position"), Some(0));
    assert_eq!(program.attribute("normal"), Some(1));
    assert_eq!(program.attribute("uv"), Some(2));

    let tint = program.uniform("tint").unwrap();
    assert_eq!((tint.group, tint.binding, tint.offset, tint.size), (0, 0, 64, 16));
    let time = program.uniform("time").unwrap();
    assert_eq!((time.group, time.binding, time.offset, time.size), (0, 1, 0, 4));

    let camera = program.block(0, 0).expect("camera block");
    assert_eq!(camera.size, 80);
    assert!(camera.stages.vertex && camera.stages.fragment);
    let time_block = program.block(0, 1).expect("time block");
    assert!(!time_block.stages.vertex && time_block.stages.fragment);

    assert_eq!(gpu.created_programs(), 1);
    assert!(program.require(&["time", "view_proj"], &["position", "uv"]).is_ok());
}

#[test]
fn should_not_allocate_when_fragment_fails_to_compile() {
    let mut gpu = RecordingGpu::new();
    let broken = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(undefined_value); }";

    let err = compile(&mut gpu, VERTEX, broken).unwrap_err();

    match err {
        EngineError::Compile { stage, diagnostic } => {
            assert_eq!(stage, ShaderStage::Fragment);
            assert!(!diagnostic.is_empty());
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
    assert_eq!(gpu.created_programs(), 0);
    assert!(gpu.programs.is_empty());
}

#[test]
fn should_reject_stage_without_entry_point() {
    let mut gpu = RecordingGpu::new();
    let no_entry = "fn helper() -> f32 { return 1.0; }";

    let err = compile(&mut gpu, no_entry, FRAGMENT).unwrap_err();

    assert!(matches!(
        err,
        EngineError::Compile {
            stage: ShaderStage::Vertex,
            ..
        }
    ));
    assert_eq!(gpu.created_programs(), 0);
}

#[test]
fn should_fail_to_link_mismatched_varyings() {
    let mut gpu = RecordingGpu::new();
    let fragment = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec3<f32>,
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.uv, 1.0);
}
"#;

    let err = compile(&mut gpu, VERTEX, fragment).unwrap_err();

    assert!(matches!(err, EngineError::Link(_)), "{err:?}");
    assert_eq!(gpu.created_programs(), 0);
}

#[test]
fn should_fail_to_link_missing_varying() {
    let mut gpu = RecordingGpu::new();
    let fragment = r#"
@fragment
fn fs_main(@location(3) shade: f32) -> @location(0) vec4<f32> {
    return vec4<f32>(shade);
}
"#;

    let err = compile(&mut gpu, VERTEX, fragment).unwrap_err();

    assert!(matches!(err, EngineError::Link(_)), "{err:?}");
}

#[test]
fn should_report_unknown_names() {
    let mut gpu = RecordingGpu::new();
    let program = compile(&mut gpu, VERTEX, FRAGMENT).unwrap();

    match program.require(&["time", "intensity"], &[]) {
        Err(EngineError::UnknownName { kind, name, .. }) => {
            assert_eq!(kind, NameKind::Uniform);
            assert_eq!(name, "intensity");
        }
        other => panic!("expected an unknown uniform, got {other:?}"),
    }
    assert!(matches!(
        program.require(&[], &["color"]),
        Err(EngineError::UnknownName {
            kind: NameKind::Attribute,
            ..
        })
    ));
    assert!(program.uniform("intensity").is_none());
}

#[test]
fn should_release_program_handle() {
    let mut gpu = RecordingGpu::new();
    let program = compile(&mut gpu, VERTEX, FRAGMENT).unwrap();
    assert_eq!(gpu.programs.len(), 1);

    program.release(&mut gpu);

    assert!(gpu.programs.is_empty());
}

#[test]
fn should_link_every_builtin_program() {
    let mut gpu = RecordingGpu::new();
    let mut manager = ShaderProgramManager::new();

    for kind in ProgramKind::ALL {
        let program = manager
            .program_for(kind, &mut gpu)
            .unwrap_or_else(|e| panic!("{} failed: {e}", kind.label()));
        for name in kind.required_uniforms() {
            assert!(program.uniform(name).is_some(), "{}: `{name}`", kind.label());
        }
        for name in kind.required_attributes() {
            assert!(program.attribute(name).is_some(), "{}: `{name}`", kind.label());
        }
        let time = program.uniform("time").unwrap();
        assert_eq!(time.size, 4);
    }

    assert_eq!(manager.len(), ProgramKind::ALL.len());
    assert_eq!(gpu.created_programs(), ProgramKind::ALL.len());
}

#[test]
fn should_compile_builtin_programs_once() {
    let mut gpu = RecordingGpu::new();
    let mut manager = ShaderProgramManager::new();

    let first = manager.program_for(ProgramKind::Standard, &mut gpu).unwrap().handle();
    let second = manager.program_for(ProgramKind::Standard, &mut gpu).unwrap().handle();

    assert_eq!(first, second);
    assert_eq!(gpu.created_programs(), 1);

    manager.release_all(&mut gpu);
    assert!(manager.is_empty());
    assert!(gpu.programs.is_empty());
}

#[test]
fn should_compile_custom_pair_through_manager() {
    let mut gpu = RecordingGpu::new();
    let manager = ShaderProgramManager::new();

    let program = manager.compile(&mut gpu, VERTEX, FRAGMENT).unwrap();

    assert_eq!(program.label(), "custom");
    assert_eq!(program.vertex_source(), VERTEX);
    assert_eq!(program.fragment_source(), FRAGMENT);
    // the caller owns it, the manager does not track it
    assert!(manager.is_empty());
}
