//! Engine data structures: scene nodes, geometry, GPU textures and targets.
//!
//! - `scene_graph` is the node arena with parent/child links and transforms
//! - `camera` and `light` are the non-drawable node payloads
//! - `geometry` holds named CPU-side vertex attributes
//! - `mesh` binds a geometry to a material and owns its GPU buffers
//! - `texture` wraps GPU textures, `render_target` pairs color with depth

pub mod camera;
pub mod geometry;
pub mod light;
pub mod mesh;
pub mod render_target;
pub mod scene_graph;
pub mod texture;
