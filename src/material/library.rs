//! Built-in scene materials.
//!
//! Every constructor returns a plain [`Material`]; the uniforms each one
//! declares are listed on the constructor. All of them declare
//! `modelMatrix`, `viewMatrix` and `projectionMatrix`.

use std::fmt::Write as _;

use crate::{
    data_structures::{geometry::attribute, light::LightData, texture::Texture},
    material::{
        Material, RenderSettings,
        uniform::{ShadowData, UniformValue},
    },
};

/// Shared lighting routine, one branch per light type.
const LAMBERT_LIGHT_WGSL: &str = "
fn calculate_light(light: Light, point_position: vec3<f32>, point_normal: vec3<f32>) -> vec3<f32> {
    var ambient = 0.0;
    var diffuse = 0.0;
    var attenuation = 1.0;
    var light_direction = vec3<f32>(0.0, 0.0, 0.0);
    if (light.light_type == 1) {
        ambient = 1.0;
    } else if (light.light_type == 2) {
        light_direction = normalize(light.direction);
    } else if (light.light_type == 3 || light.light_type == 4) {
        light_direction = normalize(point_position - light.position);
        let distance = length(light.position - point_position);
        attenuation = 1.0 / (light.attenuation.x
            + light.attenuation.y * distance
            + light.attenuation.z * distance * distance);
        if (light.light_type == 4) {
            let theta = dot(light_direction, normalize(light.direction));
            attenuation = attenuation * smoothstep(light.cutoff, light.inner_cutoff, theta);
            if (theta < light.cutoff) {
                attenuation = 0.0;
            }
        }
    }
    if (light.light_type > 1) {
        let normal = normalize(point_normal);
        diffuse = abs(dot(normal, -light_direction)) * attenuation;
    }
    return light.color * (ambient + diffuse);
}
";

const PHONG_LIGHT_WGSL: &str = "
fn calculate_light(light: Light, point_position: vec3<f32>, point_normal: vec3<f32>) -> vec3<f32> {
    var ambient = 0.0;
    var diffuse = 0.0;
    var specular = 0.0;
    var attenuation = 1.0;
    var light_direction = vec3<f32>(0.0, 0.0, 0.0);
    if (light.light_type == 1) {
        ambient = 1.0;
    } else if (light.light_type == 2) {
        light_direction = normalize(light.direction);
    } else if (light.light_type == 3 || light.light_type == 4) {
        light_direction = normalize(point_position - light.position);
        let distance = length(light.position - point_position);
        attenuation = 1.0 / (light.attenuation.x
            + light.attenuation.y * distance
            + light.attenuation.z * distance * distance);
        if (light.light_type == 4) {
            let theta = dot(light_direction, normalize(light.direction));
            attenuation = attenuation * smoothstep(light.cutoff, light.inner_cutoff, theta);
            if (theta < light.cutoff) {
                attenuation = 0.0;
            }
        }
    }
    if (light.light_type > 1) {
        let normal = normalize(point_normal);
        diffuse = max(dot(normal, -light_direction), 0.0) * attenuation;
        if (diffuse > 0.0) {
            let view_direction = normalize(u.viewPosition - point_position);
            let reflect_direction = reflect(light_direction, normal);
            specular = max(dot(view_direction, reflect_direction), 0.0);
            specular = u.specularStrength * pow(specular, u.shininess) * attenuation;
        }
    }
    return light.color * (ambient + diffuse + specular);
}
";

/// Single-sample hard shadow test against `shadow0`.
const SHADOW_WGSL: &str = "
fn shadow_factor(shadow_position: vec4<f32>, point_normal: vec3<f32>) -> f32 {
    let cos_angle = dot(normalize(point_normal), -normalize(u.shadow0.light_direction));
    let ndc = shadow_position.xyz / shadow_position.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    let outside = uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 || ndc.z > 1.0;
    let closest = textureSampleLevel(shadow0_map, shadow0_sampler, clamp(uv, vec2<f32>(0.0), vec2<f32>(1.0)), 0);
    let in_shadow = ndc.z > closest + u.shadow0.bias;
    if (cos_angle > 0.01 && in_shadow && !outside) {
        return 1.0 - u.shadow0.strength;
    }
    return 1.0;
}
";

/// Options shared by the lit materials.
#[derive(Clone, Debug)]
pub struct LitOptions {
    pub number_of_lights: usize,
    pub base_color: [f32; 3],
    pub texture: Option<Texture>,
    pub use_shadow: bool,
    /// Phong only.
    pub specular_strength: f32,
    /// Phong only.
    pub shininess: f32,
}

impl Default for LitOptions {
    fn default() -> Self {
        Self {
            number_of_lights: 1,
            base_color: [1.0, 1.0, 1.0],
            texture: None,
            use_shadow: false,
            specular_strength: 1.0,
            shininess: 32.0,
        }
    }
}

fn double_sided() -> RenderSettings {
    RenderSettings {
        double_sided: true,
        ..Default::default()
    }
}

/// Vertex colors and an optional texture, no lighting.
///
/// Uniforms: `baseColor`, `useVertexColors`, `useTexture`, `textureSampler`.
pub fn surface(base_color: [f32; 3], texture: Option<Texture>) -> Material {
    Material::builder("surface")
        .input(attribute::POSITION, 3)
        .input(attribute::UV, 2)
        .input(attribute::COLOR, 3)
        .transform_uniforms()
        .uniform("baseColor", base_color)
        .uniform("useVertexColors", false)
        .uniform("useTexture", texture.is_some())
        .uniform("textureSampler", UniformValue::Sampler2D(texture))
        .body(
            "
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = u.projectionMatrix * u.viewMatrix * u.modelMatrix
        * vec4<f32>(in.vertexPosition, 1.0);
    out.color = in.vertexColor;
    out.uv = in.vertexUV;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(u.baseColor, 1.0);
    if (u.useVertexColors != 0u) {
        color = color * vec4<f32>(in.color, 1.0);
    }
    let texel = textureSample(textureSampler, textureSampler_sampler, in.uv);
    if (u.useTexture != 0u) {
        color = color * texel;
    }
    return color;
}
",
        )
        .settings(double_sided())
        .build()
}

/// Textured, unlit; fragments with alpha below 0.1 are discarded.
///
/// Uniforms: `textureSampler`, `baseColor`, `repeatUV`, `offsetUV`.
pub fn texture(texture: Texture) -> Material {
    Material::builder("texture")
        .input(attribute::POSITION, 3)
        .input(attribute::UV, 2)
        .transform_uniforms()
        .uniform("textureSampler", texture)
        .uniform("baseColor", [1.0, 1.0, 1.0])
        .uniform("repeatUV", [1.0, 1.0])
        .uniform("offsetUV", [0.0, 0.0])
        .body(
            "
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = u.projectionMatrix * u.viewMatrix * u.modelMatrix
        * vec4<f32>(in.vertexPosition, 1.0);
    out.uv = in.vertexUV * u.repeatUV + u.offsetUV;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = vec4<f32>(u.baseColor, 1.0)
        * textureSample(textureSampler, textureSampler_sampler, in.uv);
    if (color.a < 0.1) {
        discard;
    }
    return color;
}
",
        )
        .settings(double_sided())
        .build()
}

fn lit(name: &str, options: LitOptions, light_routine: &str) -> Material {
    let phong = name == "phong";
    let mut builder = Material::builder(name)
        .input(attribute::POSITION, 3)
        .input(attribute::UV, 2)
        .input(attribute::NORMAL, 3)
        .transform_uniforms()
        .uniform("baseColor", options.base_color)
        .uniform("useTexture", options.texture.is_some())
        .uniform(
            "textureSampler",
            UniformValue::Sampler2D(options.texture),
        );
    for i in 0..options.number_of_lights {
        builder = builder.uniform(&format!("light{i}"), LightData::default());
    }
    if phong {
        builder = builder
            .uniform("viewPosition", [0.0, 0.0, 0.0])
            .uniform("specularStrength", options.specular_strength)
            .uniform("shininess", options.shininess);
    }
    if options.use_shadow {
        builder = builder.uniform("shadow0", ShadowData::default());
    }

    let shadow = options.use_shadow;
    let mut body = String::from(light_routine);
    if shadow {
        body.push_str(SHADOW_WGSL);
    }
    body.push_str(
        "
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
",
    );
    if shadow {
        body.push_str("    @location(3) shadow_position0: vec4<f32>,\n");
    }
    body.push_str(
        "}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = u.modelMatrix * vec4<f32>(in.vertexPosition, 1.0);
    out.position = world.xyz;
    out.uv = in.vertexUV;
    out.normal = (u.modelMatrix * vec4<f32>(in.vertexNormal, 0.0)).xyz;
    out.clip_position = u.projectionMatrix * u.viewMatrix * world;
",
    );
    if shadow {
        body.push_str("    out.shadow_position0 = u.shadow0.projection * u.shadow0.view * world;\n");
    }
    body.push_str(
        "    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var color = vec4<f32>(u.baseColor, 1.0);
    let texel = textureSample(textureSampler, textureSampler_sampler, in.uv);
    if (u.useTexture != 0u) {
        color = color * texel;
    }
",
    );
    if options.number_of_lights == 0 {
        body.push_str("    var light = vec3<f32>(1.0, 1.0, 1.0);\n");
    } else {
        body.push_str("    var light = vec3<f32>(0.0, 0.0, 0.0);\n");
        for i in 0..options.number_of_lights {
            let _ = writeln!(
                body,
                "    light = light + calculate_light(u.light{i}, in.position, in.normal);"
            );
        }
    }
    body.push_str("    color = vec4<f32>(color.rgb * light, color.a);\n");
    if shadow {
        body.push_str(
            "    color = vec4<f32>(color.rgb * shadow_factor(in.shadow_position0, in.normal), color.a);\n",
        );
    }
    body.push_str("    return color;\n}\n");

    builder.body(body).settings(double_sided()).build()
}

/// Diffuse lighting from `number_of_lights` lights.
///
/// Uniforms: `baseColor`, `useTexture`, `textureSampler`, `light0..lightN-1`,
/// and `shadow0` when shadows are requested.
pub fn lambert(options: LitOptions) -> Material {
    lit("lambert", options, LAMBERT_LIGHT_WGSL)
}

/// Lambert plus specular highlights.
///
/// Adds `viewPosition`, `specularStrength` and `shininess` to the lambert set.
pub fn phong(options: LitOptions) -> Material {
    lit("phong", options, PHONG_LIGHT_WGSL)
}

/// Flat color with constant opacity; drawn in the transparent pass while
/// `opacity` is below 1.
///
/// Uniforms: `baseColor`, `opacity`.
pub fn transparent(color: [f32; 3], opacity: f32) -> Material {
    Material::builder("transparent")
        .input(attribute::POSITION, 3)
        .transform_uniforms()
        .uniform("baseColor", color)
        .uniform("opacity", opacity)
        .body(
            "
@vertex
fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
    return u.projectionMatrix * u.viewMatrix * u.modelMatrix * vec4<f32>(in.vertexPosition, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.baseColor, u.opacity);
}
",
        )
        .settings(double_sided())
        .build()
}

/// Self-lit color, unaffected by lights.
///
/// Uniforms: `emissiveColor`, `intensity` (1 by default), `useTexture`,
/// `textureSampler`.
pub fn emissive(color: [f32; 3], texture: Option<Texture>) -> Material {
    Material::builder("emissive")
        .input(attribute::POSITION, 3)
        .input(attribute::UV, 2)
        .transform_uniforms()
        .uniform("emissiveColor", color)
        .uniform("intensity", 1.0)
        .uniform("useTexture", texture.is_some())
        .uniform("textureSampler", UniformValue::Sampler2D(texture))
        .body(
            "
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = u.projectionMatrix * u.viewMatrix * u.modelMatrix
        * vec4<f32>(in.vertexPosition, 1.0);
    out.uv = in.vertexUV;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var base = vec4<f32>(u.emissiveColor * u.intensity, 1.0);
    let texel = textureSample(textureSampler, textureSampler_sampler, in.uv);
    if (u.useTexture != 0u) {
        base = base * texel;
    }
    return base;
}
",
        )
        .settings(double_sided())
        .build()
}

/// Soft glow sprite: alpha falls off with the distance from the object's
/// local origin.
///
/// Uniforms: `lightColor`, `intensity`.
pub fn light_glow(color: [f32; 3], intensity: f32) -> Material {
    Material::builder("light_glow")
        .input(attribute::POSITION, 3)
        .transform_uniforms()
        .uniform("lightColor", color)
        .uniform("intensity", intensity)
        .body(
            "
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.local = in.vertexPosition;
    out.clip_position = u.projectionMatrix * u.viewMatrix * u.modelMatrix
        * vec4<f32>(in.vertexPosition, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let alpha = pow(clamp(1.0 - length(in.local.xy), 0.0, 1.0), 3.0);
    let color = vec4<f32>(u.lightColor, alpha * u.intensity);
    if (color.a < 0.01) {
        discard;
    }
    return color;
}
",
        )
        .settings(double_sided())
        .build()
}

/// Depth-only material used by the shadow pass.
///
/// Uniforms: the three transform matrices only.
pub fn depth() -> Material {
    Material::builder("depth")
        .input(attribute::POSITION, 3)
        .transform_uniforms()
        .body(
            "
@vertex
fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
    return u.projectionMatrix * u.viewMatrix * u.modelMatrix * vec4<f32>(in.vertexPosition, 1.0);
}
",
        )
        .settings(double_sided())
        .build()
}
