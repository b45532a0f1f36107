//! Render pipeline construction.
//!
//! wgpu bakes blend, depth and rasterizer state into pipelines, so every
//! material keeps one pipeline per [`PipelineKey`] it has been drawn with.

pub mod basic;

pub use basic::mk_render_pipeline;

use crate::material::DrawStyle;

/// How a pass uses the depth buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthMode {
    /// No depth attachment (full-screen effects).
    None,
    /// Depth test and depth writes (shadow and opaque passes).
    ReadWrite,
    /// Depth test without writes (transparent pass).
    ReadOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// `None` for depth-only passes.
    pub color_format: Option<wgpu::TextureFormat>,
    pub depth: DepthMode,
    pub topology: DrawStyle,
    pub cull: bool,
    pub wireframe: bool,
    pub blend: bool,
}
