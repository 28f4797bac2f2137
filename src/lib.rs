//! stage-ngin
//!
//! A small shader-driven scene renderer and scroll-synchronised animation
//! engine for single-page sites, running natively and on WASM. Each render
//! surface is mounted as a unit: its programs, buffers, listeners and frame
//! loop are acquired together and released together.
//!
//! High-level modules
//! - `shader`: compiling, linking and reflecting WGSL stage pairs
//! - `scene_builder`: procedural scenes for the site's model kinds
//! - `render_loop`: per-surface frame driver and the hover side channel
//! - `viewport`: keeps drawing buffer and lens in step with the surface size
//! - `scroll`: scroll triggers, timelines, easing and the region scheduler
//! - `particles`: the decorative particle batch
//! - `pointer`: normalised pointer position and parallax
//! - `surface`: mounting and disposing a surface
//! - `host` / `gpu`: the seams to the page and to the graphics backend
//! - `context`: the wgpu implementation of the graphics seam
//! - `flow`: the winit application shell
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod gpu;
pub mod host;
pub mod motion;
pub mod particles;
pub mod pipelines;
pub mod pointer;
pub mod render;
pub mod render_loop;
pub mod scene_builder;
pub mod scroll;
pub mod shader;
pub mod surface;
pub mod viewport;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use scene_builder::{ModelKind, StyleParams};
pub use surface::SurfaceMount;
pub use wgpu;
pub use winit;
