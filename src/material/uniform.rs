//! Typed uniform values and their uniform-buffer layout.
//!
//! Offsets follow the WGSL uniform address space rules, so the struct
//! declared from [`UniformKind::wgsl_type`] and the bytes written by
//! [`write_value`] always agree.

use cgmath::{Matrix4, Vector2, Vector3, Vector4};

use crate::data_structures::{light::LightData, texture::Texture};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Sampler2D,
    Light,
    Shadow,
}

impl UniformKind {
    /// WGSL type of the member inside the uniform struct, `None` for kinds
    /// that are bound as textures only.
    pub fn wgsl_type(&self) -> Option<&'static str> {
        match self {
            UniformKind::Bool => Some("u32"),
            UniformKind::Int => Some("i32"),
            UniformKind::Float => Some("f32"),
            UniformKind::Vec2 => Some("vec2<f32>"),
            UniformKind::Vec3 => Some("vec3<f32>"),
            UniformKind::Vec4 => Some("vec4<f32>"),
            UniformKind::Mat4 => Some("mat4x4<f32>"),
            UniformKind::Light => Some("Light"),
            UniformKind::Shadow => Some("Shadow"),
            UniformKind::Sampler2D => None,
        }
    }

    pub fn align(&self) -> u32 {
        match self {
            UniformKind::Bool | UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Sampler2D => 1,
            _ => 16,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            UniformKind::Bool | UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
            UniformKind::Light => LIGHT_STRUCT_SIZE,
            UniformKind::Shadow => SHADOW_STRUCT_SIZE,
            UniformKind::Sampler2D => 0,
        }
    }

    /// Number of group-1 bindings (texture + sampler) the kind occupies.
    pub fn texture_bindings(&self) -> u32 {
        match self {
            UniformKind::Sampler2D | UniformKind::Shadow => 2,
            _ => 0,
        }
    }
}

pub const LIGHT_STRUCT_SIZE: u32 = 96;
pub const SHADOW_STRUCT_SIZE: u32 = 160;

pub const LIGHT_STRUCT_WGSL: &str = "struct Light {
    light_type: i32,
    color: vec3<f32>,
    direction: vec3<f32>,
    position: vec3<f32>,
    attenuation: vec3<f32>,
    cutoff: f32,
    inner_cutoff: f32,
}
";

pub const SHADOW_STRUCT_WGSL: &str = "struct Shadow {
    light_direction: vec3<f32>,
    strength: f32,
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    bias: f32,
}
";

/// Shadow parameters as seen by a consuming material.
#[derive(Clone, Debug)]
pub struct ShadowData {
    pub light_direction: [f32; 3],
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub strength: f32,
    pub bias: f32,
    pub depth: Option<Texture>,
}

impl Default for ShadowData {
    fn default() -> Self {
        let identity = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            light_direction: [0.0, -1.0, 0.0],
            projection: identity,
            view: identity,
            strength: 0.0,
            bias: 0.01,
            depth: None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
    /// `None` binds the context's white fallback texture.
    Sampler2D(Option<Texture>),
    Light(LightData),
    Shadow(ShadowData),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Sampler2D(_) => UniformKind::Sampler2D,
            UniformValue::Light(_) => UniformKind::Light,
            UniformValue::Shadow(_) => UniformKind::Shadow,
        }
    }

    /// Id of the bound texture, if the value binds one.
    pub(crate) fn texture_id(&self) -> Option<u64> {
        match self {
            UniformValue::Sampler2D(tex) => tex.as_ref().map(Texture::id),
            UniformValue::Shadow(shadow) => shadow.depth.as_ref().map(Texture::id),
            _ => None,
        }
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Vector2<f32>> for UniformValue {
    fn from(v: Vector2<f32>) -> Self {
        UniformValue::Vec2(v.into())
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(v: Vector3<f32>) -> Self {
        UniformValue::Vec3(v.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(v: Vector4<f32>) -> Self {
        UniformValue::Vec4(v.into())
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(m: Matrix4<f32>) -> Self {
        UniformValue::Mat4(m.into())
    }
}

impl From<Texture> for UniformValue {
    fn from(t: Texture) -> Self {
        UniformValue::Sampler2D(Some(t))
    }
}

impl From<LightData> for UniformValue {
    fn from(l: LightData) -> Self {
        UniformValue::Light(l)
    }
}

impl From<ShadowData> for UniformValue {
    fn from(s: ShadowData) -> Self {
        UniformValue::Shadow(s)
    }
}

pub(crate) fn align_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

fn put<T: bytemuck::Pod>(out: &mut [u8], offset: u32, value: &T) {
    let bytes = bytemuck::bytes_of(value);
    let start = offset as usize;
    out[start..start + bytes.len()].copy_from_slice(bytes);
}

/// Writes `value` at `offset` of a uniform buffer image.
///
/// `out` must be at least `offset + kind.size()` bytes long.
pub fn write_value(out: &mut [u8], offset: u32, value: &UniformValue) {
    match value {
        UniformValue::Bool(b) => put(out, offset, &(*b as u32)),
        UniformValue::Int(i) => put(out, offset, i),
        UniformValue::Float(f) => put(out, offset, f),
        UniformValue::Vec2(v) => put(out, offset, v),
        UniformValue::Vec3(v) => put(out, offset, v),
        UniformValue::Vec4(v) => put(out, offset, v),
        UniformValue::Mat4(m) => put(out, offset, m),
        UniformValue::Light(l) => {
            put(out, offset, &l.light_type);
            put(out, offset + 16, &l.color);
            put(out, offset + 32, &l.direction);
            put(out, offset + 48, &l.position);
            put(out, offset + 64, &l.attenuation);
            put(out, offset + 76, &l.cutoff);
            put(out, offset + 80, &l.inner_cutoff);
        }
        UniformValue::Shadow(s) => {
            put(out, offset, &s.light_direction);
            put(out, offset + 12, &s.strength);
            put(out, offset + 16, &s.projection);
            put(out, offset + 80, &s.view);
            put(out, offset + 144, &s.bias);
        }
        UniformValue::Sampler2D(_) => {}
    }
}
