//! Full-screen effect materials.
//!
//! Every effect reads the running image from `textureSampler`, which the
//! [`Postprocessor`](super::Postprocessor) rebinds before each draw, and
//! writes an opaque color.

use crate::{
    data_structures::{geometry::attribute, texture::Texture},
    material::{Material, RenderSettings, uniform::UniformValue},
};

/// Passes clip-space quad corners through and hands the UVs on.
const QUAD_VS: &str = "
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.vertexPosition, 0.0, 1.0);
    out.uv = in.vertexUV;
    return out;
}
";

fn effect(name: &str) -> crate::material::MaterialBuilder {
    Material::builder(name)
        .input(attribute::POSITION, 2)
        .input(attribute::UV, 2)
        .uniform("textureSampler", UniformValue::Sampler2D(None))
        .settings(RenderSettings {
            double_sided: true,
            blend: false,
            ..Default::default()
        })
}

fn with_fragment(fragment: &str) -> String {
    format!("{QUAD_VS}\n{fragment}")
}

/// Copies the input unchanged.
pub fn copy() -> Material {
    effect("copy effect")
        .body(with_fragment(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(textureSampler, textureSampler_sampler, in.uv);
}
",
        ))
        .build()
}

/// Grayscale multiplied by `tintColor`.
pub fn tint(color: [f32; 3]) -> Material {
    effect("tint effect")
        .uniform("tintColor", color)
        .body(with_fragment(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(textureSampler, textureSampler_sampler, in.uv);
    let gray = (color.r + color.g + color.b) / 3.0;
    return vec4<f32>(gray * u.tintColor, 1.0);
}
",
        ))
        .build()
}

/// Rounds every channel to `levels` steps.
pub fn color_reduce(levels: f32) -> Material {
    effect("color reduce effect")
        .uniform("levels", levels)
        .body(with_fragment(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(textureSampler, textureSampler_sampler, in.uv);
    let reduced = round(color.rgb * u.levels) / u.levels;
    return vec4<f32>(reduced, 1.0);
}
",
        ))
        .build()
}

/// Samples once per `pixelSize` block of a `resolution`-sized image.
pub fn pixelate(pixel_size: f32, resolution: [f32; 2]) -> Material {
    effect("pixelate effect")
        .uniform("pixelSize", pixel_size)
        .uniform("resolution", resolution)
        .body(with_fragment(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let factor = u.resolution / u.pixelSize;
    let uv = floor(in.uv * factor) / factor;
    return textureSample(textureSampler, textureSampler_sampler, uv);
}
",
        ))
        .build()
}

/// Fades towards `dimColor` between `dimStart` and `dimEnd`, measured from
/// the image center in clip units.
pub fn vignette(dim_start: f32, dim_end: f32, dim_color: [f32; 3]) -> Material {
    effect("vignette effect")
        .uniform("dimStart", dim_start)
        .uniform("dimEnd", dim_end)
        .uniform("dimColor", dim_color)
        .body(with_fragment(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(textureSampler, textureSampler_sampler, in.uv);
    let d = length(2.0 * in.uv - vec2<f32>(1.0, 1.0));
    let b = clamp((d - u.dimEnd) / (u.dimStart - u.dimEnd), 0.0, 1.0);
    return vec4<f32>(b * color.rgb + (1.0 - b) * u.dimColor, 1.0);
}
",
        ))
        .build()
}

fn blur(name: &str, texture_size: [f32; 2], radius: i32, axis: &str) -> Material {
    effect(name)
        .uniform("textureSize", texture_size)
        .uniform("blurRadius", radius)
        .body(with_fragment(&format!(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let texel = 1.0 / u.textureSize;
    var sum = vec4<f32>(0.0, 0.0, 0.0, 0.0);
    for (var o = -u.blurRadius; o <= u.blurRadius; o++) {{
        let weight = f32(u.blurRadius - abs(o) + 1);
        let offset = {axis} * f32(o) * texel;
        sum += textureSampleLevel(textureSampler, textureSampler_sampler, in.uv + offset, 0.0) * weight;
    }}
    return sum / sum.a;
}}
"
        )))
        .build()
}

/// Triangle-weighted blur along x. Weights are normalised by the summed
/// alpha, so the output alpha is 1 for opaque input.
pub fn horizontal_blur(texture_size: [f32; 2], radius: i32) -> Material {
    blur("horizontal blur effect", texture_size, radius, "vec2<f32>(1.0, 0.0)")
}

/// [`horizontal_blur`] along y.
pub fn vertical_blur(texture_size: [f32; 2], radius: i32) -> Material {
    blur("vertical blur effect", texture_size, radius, "vec2<f32>(0.0, 1.0)")
}

/// Keeps pixels whose channel sum reaches `threshold`, blackens the rest.
pub fn bright_filter(threshold: f32) -> Material {
    effect("bright filter effect")
        .uniform("threshold", threshold)
        .body(with_fragment(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(textureSampler, textureSampler_sampler, in.uv);
    if (color.r + color.g + color.b < u.threshold) {
        return vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }
    return color;
}
",
        ))
        .build()
}

/// `originalStrength * input + blendStrength * blendTexture`.
///
/// The blend texture is usually a [`RenderTarget`](crate::data_structures::render_target::RenderTarget)
/// color texture, e.g. the scene before a bright-pass/blur chain or a
/// separately rendered glow scene.
pub fn additive_blend(blend_texture: Texture, original_strength: f32, blend_strength: f32) -> Material {
    effect("additive blend effect")
        .uniform("blendTexture", blend_texture)
        .uniform("originalStrength", original_strength)
        .uniform("blendStrength", blend_strength)
        .body(with_fragment(
            "
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let original = textureSample(textureSampler, textureSampler_sampler, in.uv);
    let blend = textureSample(blendTexture, blendTexture_sampler, in.uv);
    return u.originalStrength * original + u.blendStrength * blend;
}
",
        ))
        .build()
}
