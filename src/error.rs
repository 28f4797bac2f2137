//! Engine error taxonomy.
//!
//! Every variant is local to the surface it was raised for. A decorative scene
//! that fails to initialise is logged once and turns into an inert surface; it
//! never takes the rest of the page down with it.

use std::fmt;

/// The shader stage a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// What kind of name failed to resolve against a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Uniform,
    Attribute,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Uniform => f.write_str("uniform"),
            NameKind::Attribute => f.write_str("attribute"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    Compile {
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("program failed to link: {0}")]
    Link(String),

    #[error("{kind} `{name}` is not declared by program `{program}`")]
    UnknownName {
        kind: NameKind,
        name: String,
        program: String,
    },

    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("surface is not mounted: {0}")]
    MissingSurface(String),

    #[error("invalid scroll threshold `{0}`")]
    InvalidThreshold(String),

    #[error("invalid easing `{0}`")]
    InvalidEasing(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Failures that only mean "nothing to draw here yet" rather than a broken program.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EngineError::ContextUnavailable(_) | EngineError::MissingSurface(_)
        )
    }
}
