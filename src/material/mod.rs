//! Materials: a WGSL program, a typed uniform table and render settings.
//!
//! A [`Material`] is assembled by a [`MaterialBuilder`] from vertex inputs,
//! named uniforms and a WGSL body with `vs_main`/`fs_main` entry points. At
//! build time the uniform table is resolved once: every buffer uniform gets a
//! byte offset, every texture gets a binding slot, and the matching WGSL
//! declarations are generated in front of the body. The body refers to buffer
//! uniforms as `u.<name>`, to textures as `<name>` / `<name>_sampler` and to
//! shadow maps as `<name>_map` / `<name>_sampler`.
//!
//! GPU objects (shader module, layouts, pipeline variants, texture bind
//! group) are created lazily by [`Material::prepare`] and cached.

pub mod cache;
pub mod library;
pub mod uniform;

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Write as _,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    context::Context,
    data_structures::geometry::vertex_format,
    pipelines::{self, DepthMode, PipelineKey},
};
use uniform::{LIGHT_STRUCT_WGSL, SHADOW_STRUCT_WGSL, UniformKind, UniformValue, align_up};

slotmap::new_key_type! {
    /// Handle of a material stored in a [`World`](crate::render::World).
    pub struct MaterialId;
}

static NEXT_MATERIAL_UID: AtomicU64 = AtomicU64::new(1);

/// Primitive assembly used when drawing a mesh with this material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawStyle {
    #[default]
    Triangles,
    Lines,
    LineStrip,
    Points,
}

impl DrawStyle {
    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        match self {
            DrawStyle::Triangles => wgpu::PrimitiveTopology::TriangleList,
            DrawStyle::Lines => wgpu::PrimitiveTopology::LineList,
            DrawStyle::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            DrawStyle::Points => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// Render-state flags. Changes apply to the next draw using the material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub double_sided: bool,
    pub wireframe: bool,
    /// Only 1.0 is supported by the backend; other values are reported when a
    /// pipeline variant is built.
    pub line_width: f32,
    pub draw_style: DrawStyle,
    /// Alpha blending (src-alpha, one-minus-src-alpha). Disable to overwrite.
    pub blend: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            double_sided: false,
            wireframe: false,
            line_width: 1.0,
            draw_style: DrawStyle::Triangles,
            blend: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexInput {
    pub name: String,
    pub components: u32,
}

#[derive(Clone, Debug)]
pub struct Uniform {
    pub value: UniformValue,
    /// Byte offset inside the uniform buffer, for buffer kinds.
    pub offset: Option<u32>,
    /// First group-1 binding, for texture kinds.
    pub binding: Option<u32>,
}

pub struct MaterialBuilder {
    name: String,
    inputs: Vec<VertexInput>,
    uniforms: Vec<(String, UniformValue)>,
    body: String,
    settings: RenderSettings,
}

impl MaterialBuilder {
    pub fn input(mut self, name: &str, components: u32) -> Self {
        self.inputs.push(VertexInput {
            name: name.to_string(),
            components: components.clamp(1, 4),
        });
        self
    }

    pub fn uniform(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.uniforms.push((name.to_string(), value.into()));
        self
    }

    /// Adds `modelMatrix`, `viewMatrix` and `projectionMatrix`.
    pub fn transform_uniforms(self) -> Self {
        let identity = crate::math::identity();
        self.uniform("modelMatrix", identity)
            .uniform("viewMatrix", identity)
            .uniform("projectionMatrix", identity)
    }

    pub fn body(mut self, wgsl: impl Into<String>) -> Self {
        self.body = wgsl.into();
        self
    }

    pub fn settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Material {
        let mut table = BTreeMap::new();
        for (name, value) in self.uniforms {
            table.insert(
                name,
                Uniform {
                    value,
                    offset: None,
                    binding: None,
                },
            );
        }

        let mut cursor = 0;
        let mut binding = 0;
        for uniform in table.values_mut() {
            let kind = uniform.value.kind();
            if kind.wgsl_type().is_some() {
                let offset = align_up(cursor, kind.align());
                uniform.offset = Some(offset);
                cursor = offset + kind.size();
            }
            if kind.texture_bindings() > 0 {
                uniform.binding = Some(binding);
                binding += kind.texture_bindings();
            }
        }

        Material {
            uid: NEXT_MATERIAL_UID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            inputs: self.inputs,
            uniforms: table,
            uniform_size: align_up(cursor, 16),
            body: self.body,
            settings: self.settings,
            gpu: None,
            bound_textures: Vec::new(),
        }
    }
}

struct MaterialGpu {
    shader: wgpu::ShaderModule,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    texture_bind_group: Option<wgpu::BindGroup>,
}

pub struct Material {
    uid: u64,
    name: String,
    inputs: Vec<VertexInput>,
    uniforms: BTreeMap<String, Uniform>,
    uniform_size: u32,
    body: String,
    pub settings: RenderSettings,
    gpu: Option<MaterialGpu>,
    /// Texture ids the current texture bind group was built from.
    bound_textures: Vec<Option<u64>>,
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("uniforms", &self.uniforms.keys().collect::<Vec<_>>())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Material {
    pub fn builder(name: &str) -> MaterialBuilder {
        MaterialBuilder {
            name: name.to_string(),
            inputs: Vec::new(),
            uniforms: Vec::new(),
            body: String::new(),
            settings: RenderSettings::default(),
        }
    }

    /// Process-unique id; mesh bindings use it to notice material swaps.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[VertexInput] {
        &self.inputs
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Current `opacity`, if the material declares one.
    pub fn opacity(&self) -> Option<f32> {
        match self.uniforms.get("opacity").map(|u| &u.value) {
            Some(UniformValue::Float(o)) => Some(*o),
            _ => None,
        }
    }

    /// Writes a uniform value.
    ///
    /// Unknown names are ignored so one scene can mix materials with
    /// different inputs. Returns whether the value was stored.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> bool {
        let value = value.into();
        let Some(uniform) = self.uniforms.get_mut(name) else {
            log::debug!("Material {} has no uniform {name}; value ignored.", self.name);
            return false;
        };
        if uniform.value.kind() != value.kind() {
            debug_assert!(
                false,
                "Uniform {name} of material {} is {:?}, not {:?}",
                self.name,
                uniform.value.kind(),
                value.kind()
            );
            log::warn!(
                "Uniform {name} of material {} is {:?}; ignoring a {:?} value.",
                self.name,
                uniform.value.kind(),
                value.kind()
            );
            return false;
        }
        uniform.value = value;
        true
    }

    /// Size in bytes of the uniform buffer image, 0 if the material has no
    /// buffer uniforms.
    pub fn uniform_size(&self) -> u32 {
        self.uniform_size
    }

    /// Serializes every buffer uniform into `out` (resized to fit).
    pub fn write_uniforms(&self, out: &mut Vec<u8>) {
        out.clear();
        out.resize(self.uniform_size as usize, 0);
        for uniform in self.uniforms.values() {
            if let Some(offset) = uniform.offset {
                uniform::write_value(out, offset, &uniform.value);
            }
        }
    }

    /// Generated declarations for this material's uniforms and vertex inputs.
    pub fn wgsl_declarations(&self) -> String {
        let mut src = String::new();
        let kinds: Vec<UniformKind> = self.uniforms.values().map(|u| u.value.kind()).collect();
        if kinds.contains(&UniformKind::Light) {
            src.push_str(LIGHT_STRUCT_WGSL);
        }
        if kinds.contains(&UniformKind::Shadow) {
            src.push_str(SHADOW_STRUCT_WGSL);
        }

        if self.uniform_size > 0 {
            src.push_str("struct Uniforms {\n");
            for (name, uniform) in &self.uniforms {
                if let Some(ty) = uniform.value.kind().wgsl_type() {
                    let _ = writeln!(src, "    {name}: {ty},");
                }
            }
            src.push_str("}\n@group(0) @binding(0) var<uniform> u: Uniforms;\n");
        }

        for (name, uniform) in &self.uniforms {
            let Some(binding) = uniform.binding else {
                continue;
            };
            match uniform.value.kind() {
                UniformKind::Shadow => {
                    let _ = writeln!(
                        src,
                        "@group(1) @binding({binding}) var {name}_map: texture_depth_2d;"
                    );
                }
                _ => {
                    let _ = writeln!(
                        src,
                        "@group(1) @binding({binding}) var {name}: texture_2d<f32>;"
                    );
                }
            }
            let _ = writeln!(
                src,
                "@group(1) @binding({}) var {name}_sampler: sampler;",
                binding + 1
            );
        }

        if !self.inputs.is_empty() {
            src.push_str("struct VertexInput {\n");
            for (location, input) in self.inputs.iter().enumerate() {
                let ty = match input.components {
                    1 => "f32".to_string(),
                    n => format!("vec{n}<f32>"),
                };
                let _ = writeln!(src, "    @location({location}) {}: {ty},", input.name);
            }
            src.push_str("}\n");
        }
        src
    }

    /// Complete WGSL module: generated declarations followed by the body.
    pub fn wgsl_source(&self) -> String {
        let mut src = self.wgsl_declarations();
        src.push('\n');
        src.push_str(&self.body);
        src
    }

    /// One vertex buffer per input, bound at the input's location.
    pub(crate) fn vertex_attributes(&self) -> Vec<[wgpu::VertexAttribute; 1]> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(location, input)| {
                [wgpu::VertexAttribute {
                    format: vertex_format(input.components),
                    offset: 0,
                    shader_location: location as u32,
                }]
            })
            .collect()
    }

    /// Creates the shader module and layouts on first use and refreshes the
    /// texture bind group when a bound texture changed.
    ///
    /// An invalid WGSL body is reported through the device's uncaptured
    /// error handler, which aborts.
    pub fn prepare(&mut self, ctx: &Context) {
        if self.gpu.is_none() {
            self.gpu = Some(self.create_gpu(ctx));
        }
        let current: Vec<Option<u64>> = self
            .uniforms
            .values()
            .filter(|u| u.binding.is_some())
            .map(|u| u.value.texture_id())
            .collect();
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        if gpu.texture_bind_group.is_some() && current == self.bound_textures {
            return;
        }
        let group = self.create_texture_bind_group(ctx, &gpu.texture_layout);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.texture_bind_group = Some(group);
        }
        self.bound_textures = current;
    }

    fn create_gpu(&self, ctx: &Context) -> MaterialGpu {
        let device = &ctx.device;
        let source = self.wgsl_source();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let uniform_entries: Vec<wgpu::BindGroupLayoutEntry> = if self.uniform_size > 0 {
            vec![wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }]
        } else {
            Vec::new()
        };
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &uniform_entries,
            label: Some("material uniform layout"),
        });

        let mut texture_entries = Vec::new();
        for uniform in self.uniforms.values() {
            let Some(binding) = uniform.binding else {
                continue;
            };
            let (sample_type, sampler_type) = match uniform.value.kind() {
                UniformKind::Shadow => (
                    wgpu::TextureSampleType::Depth,
                    wgpu::SamplerBindingType::NonFiltering,
                ),
                _ => (
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::SamplerBindingType::Filtering,
                ),
            };
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type,
                },
                count: None,
            });
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: binding + 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(sampler_type),
                count: None,
            });
        }
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &texture_entries,
            label: Some("material texture layout"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&self.name),
            bind_group_layouts: &[Some(&uniform_layout), Some(&texture_layout)],
            immediate_size: 0,
        });

        MaterialGpu {
            shader,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            texture_bind_group: None,
        }
    }

    fn create_texture_bind_group(
        &self,
        ctx: &Context,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let mut entries = Vec::new();
        for uniform in self.uniforms.values() {
            let Some(binding) = uniform.binding else {
                continue;
            };
            let texture = match &uniform.value {
                UniformValue::Shadow(shadow) => shadow.depth.as_ref().unwrap_or(&ctx.fallback.depth),
                UniformValue::Sampler2D(tex) => tex.as_ref().unwrap_or(&ctx.fallback.white),
                _ => continue,
            };
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: binding + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some("material texture bind group"),
        })
    }

    /// Creates the pipeline variant for `key` if it does not exist yet.
    pub(crate) fn ensure_pipeline(&mut self, ctx: &Context, key: PipelineKey) {
        let attributes = self.vertex_attributes();
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.pipelines.contains_key(&key) {
            return;
        }
        log::debug!("Creating pipeline variant {:?} for material {}.", key, self.name);
        if self.settings.wireframe && !key.wireframe {
            log::warn!(
                "Material {}: wireframe needs the polygon-line device feature, drawing filled.",
                self.name
            );
        }
        if self.settings.line_width != 1.0 {
            log::warn!(
                "Material {}: line width {} is not supported, drawing 1px lines.",
                self.name,
                self.settings.line_width
            );
        }
        let layouts: Vec<wgpu::VertexBufferLayout> = self
            .inputs
            .iter()
            .zip(attributes.iter())
            .map(|(input, attrs)| wgpu::VertexBufferLayout {
                array_stride: (input.components * 4) as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();
        let pipeline = pipelines::mk_render_pipeline(
            &ctx.device,
            &gpu.pipeline_layout,
            &gpu.shader,
            &layouts,
            &key,
        );
        gpu.pipelines.insert(key, pipeline);
    }

    /// Pipeline key for drawing with the current settings into a target.
    pub(crate) fn pipeline_key(
        &self,
        ctx: &Context,
        color_format: Option<wgpu::TextureFormat>,
        depth: DepthMode,
    ) -> PipelineKey {
        let settings = self.settings;
        PipelineKey {
            color_format,
            depth,
            topology: settings.draw_style,
            cull: !settings.double_sided,
            wireframe: settings.wireframe && ctx.supports_wireframe(),
            blend: settings.blend,
        }
    }

    pub(crate) fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.gpu.as_ref().and_then(|gpu| gpu.pipelines.get(key))
    }

    pub(crate) fn uniform_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.gpu.as_ref().map(|gpu| &gpu.uniform_layout)
    }

    pub(crate) fn texture_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().and_then(|gpu| gpu.texture_bind_group.as_ref())
    }
}
