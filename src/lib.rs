//! lumen-ngin
//!
//! A small real-time 3D scene renderer on top of wgpu. Scenes are trees of
//! mesh, light and camera nodes kept in an arena; meshes draw with
//! materials whose uniforms are typed and declared once; the renderer
//! supports one shadow-casting light, back-to-front transparency and
//! full-screen post-processing chains.
//!
//! High-level modules
//! - `context`: GPU device, queue and the surface (or headless stand-in)
//! - `data_structures`: scene graph, cameras, lights, geometry, meshes, textures
//! - `flow`: window, event loop and the per-frame update call
//! - `input`: keyboard and mouse state per frame
//! - `material`: materials, the uniform table and the built-in library
//! - `math`: matrix builders and transforms
//! - `pipelines`: render pipeline variants
//! - `postprocess`: effect chains and the built-in effects
//! - `render`: the frame renderer and the world it draws from
//! - `resources`: texture and OBJ loading
//! - `shadow`: shadow mapping for one light
//!

pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod material;
pub mod math;
pub mod pipelines;
pub mod postprocess;
pub mod render;
pub mod resources;
pub mod shadow;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::keyboard::KeyCode;
