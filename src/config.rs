//! Engine-wide configuration applied at mount time.

use crate::{
    motion::MotionConfig,
    scene_builder::StyleParams,
    scroll::Threshold,
};

/// Knobs a surface picks up when it is mounted.
///
/// Everything has a sensible default matching the landing page the engine was
/// built for, so most callers only override the style.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Colour the drawing buffer is cleared to before the scene is drawn.
    pub clear_colour: wgpu::Color,
    /// Upper bound for the device pixel ratio used to size the drawing buffer.
    pub max_pixel_ratio: f64,
    pub particle_count: usize,
    pub globe_points: usize,
    pub style: StyleParams,
    /// Start threshold used for regions registered without an explicit one.
    pub default_start: Threshold,
    pub motion: MotionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clear_colour: wgpu::Color::TRANSPARENT,
            max_pixel_ratio: 2.0,
            particle_count: 30,
            globe_points: 100,
            style: StyleParams::default(),
            default_start: Threshold::TOP_80,
            motion: MotionConfig::default(),
        }
    }
}
