//! Engine data structures: geometry, transforms, scene graphs and GPU mirrors.
//!
//! - `geometry` describes and tessellates procedural meshes
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` holds the depth attachment
//! - `transform` holds local position / rotation / scale
//! - `uniform_block` mirrors a uniform buffer on the CPU
//! - `vertex` defines vertex formats and buffer layouts

pub mod geometry;
pub mod scene_graph;
pub mod texture;
pub mod transform;
pub mod uniform_block;
pub mod vertex;
