//! Built-in programs and their fixed-function state.
//!
//! Each [`ProgramKind`] pairs a vertex and a fragment WGSL stage with the blend,
//! cull and depth state the scene expects, plus the names the engine writes
//! every frame. Those names are checked once when the program is linked.

pub mod basic;

use crate::data_structures::vertex::VertexLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blend {
    Opaque,
    Alpha,
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub blend: Blend,
    pub cull_back: bool,
    pub depth_test: bool,
    pub depth_write: bool,
}

impl RenderState {
    pub const OPAQUE: RenderState = RenderState {
        blend: Blend::Opaque,
        cull_back: true,
        depth_test: true,
        depth_write: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramKind {
    /// Full-screen animated noise behind the hero section.
    Background,
    /// Translucent grid sphere.
    Globe,
    /// Pulsing, additively blended point sprites.
    Points,
    /// Lit metal/rough surfaces for the prize models.
    Standard,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 4] = [
        ProgramKind::Background,
        ProgramKind::Globe,
        ProgramKind::Points,
        ProgramKind::Standard,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProgramKind::Background => "background",
            ProgramKind::Globe => "globe",
            ProgramKind::Points => "points",
            ProgramKind::Standard => "standard",
        }
    }

    /// WGSL sources as (vertex, fragment).
    pub fn sources(self) -> (&'static str, &'static str) {
        match self {
            ProgramKind::Background => (
                include_str!("shaders/background.vert.wgsl"),
                include_str!("shaders/background.frag.wgsl"),
            ),
            ProgramKind::Globe => (
                include_str!("shaders/globe.vert.wgsl"),
                include_str!("shaders/globe.frag.wgsl"),
            ),
            ProgramKind::Points => (
                include_str!("shaders/points.vert.wgsl"),
                include_str!("shaders/points.frag.wgsl"),
            ),
            ProgramKind::Standard => (
                include_str!("shaders/standard.vert.wgsl"),
                include_str!("shaders/standard.frag.wgsl"),
            ),
        }
    }

    pub fn render_state(self) -> RenderState {
        match self {
            ProgramKind::Background => RenderState {
                blend: Blend::Opaque,
                cull_back: false,
                depth_test: false,
                depth_write: false,
            },
            ProgramKind::Globe => RenderState {
                blend: Blend::Alpha,
                cull_back: false,
                depth_test: true,
                depth_write: false,
            },
            ProgramKind::Points => RenderState {
                blend: Blend::Additive,
                cull_back: false,
                depth_test: true,
                depth_write: false,
            },
            ProgramKind::Standard => RenderState::OPAQUE,
        }
    }

    pub fn vertex_layout(self) -> VertexLayout {
        match self {
            ProgramKind::Points => VertexLayout::PointInstance,
            _ => VertexLayout::Model,
        }
    }

    /// Uniforms the engine writes for this program.
    pub fn required_uniforms(self) -> &'static [&'static str] {
        match self {
            ProgramKind::Background => &["time", "resolution"],
            ProgramKind::Globe => &[
                "time",
                "view_proj",
                "eye",
                "model",
                "normal_matrix",
                "color",
                "opacity",
                "rim",
            ],
            ProgramKind::Points => &["time", "view_proj", "resolution", "model"],
            ProgramKind::Standard => &[
                "time",
                "intensity",
                "view_proj",
                "eye",
                "model",
                "normal_matrix",
                "color",
                "metalness",
                "roughness",
                "opacity",
                "ambient",
                "directional_color",
                "directional_position",
                "point_color",
                "point_position",
            ],
        }
    }

    pub fn required_attributes(self) -> &'static [&'static str] {
        match self {
            ProgramKind::Points => &["position", "size", "color"],
            ProgramKind::Background => &["position", "uv"],
            _ => &["position", "normal", "uv"],
        }
    }
}
