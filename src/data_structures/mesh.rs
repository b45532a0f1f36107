//! A drawable: one [`Geometry`] bound to one material.
//!
//! The material lives in the world's material arena and is referenced by
//! [`MaterialId`], so any number of meshes can share it. Each mesh owns its
//! vertex buffers and one uniform buffer per material it is drawn with; the
//! buffers are created the first time the mesh is drawn.

use std::{collections::HashMap, sync::Arc};

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::geometry::{Geometry, default_value},
    material::{Material, MaterialId},
    pipelines::PipelineKey,
};

/// Which of a mesh's two material bindings a draw uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BindingSlot {
    /// The mesh's own material.
    Main,
    /// The shadow pass depth material.
    Depth,
}

#[derive(Debug)]
struct MeshBinding {
    material_uid: u64,
    buffer: Option<wgpu::Buffer>,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Default)]
struct MeshGpu {
    /// Vertex buffers keyed by attribute name and component count.
    buffers: HashMap<(String, u32), wgpu::Buffer>,
    main: Option<MeshBinding>,
    depth: Option<MeshBinding>,
}

#[derive(Debug)]
pub struct Mesh {
    geometry: Arc<Geometry>,
    material: MaterialId,
    /// Invisible meshes are skipped by every pass.
    pub visible: bool,
    gpu: Option<MeshGpu>,
}

impl Mesh {
    pub fn new(mut geometry: Geometry, material: MaterialId) -> Self {
        geometry.count_vertices();
        Self::from_shared(Arc::new(geometry), material)
    }

    /// Shares an already counted geometry between meshes.
    pub fn from_shared(geometry: Arc<Geometry>, material: MaterialId) -> Self {
        Self {
            geometry,
            material,
            visible: true,
            gpu: None,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Swaps the material; vertex inputs are re-associated on the next draw.
    pub fn set_material(&mut self, material: MaterialId) {
        self.material = material;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.main = None;
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.geometry.vertex_count() as u32
    }

    /// Uploads missing vertex buffers for `material`'s inputs, (re)creates the
    /// uniform binding if the material changed and writes `uniforms` to it.
    pub(crate) fn prepare(
        &mut self,
        ctx: &Context,
        material: &Material,
        slot: BindingSlot,
        uniforms: &[u8],
    ) {
        let count = self.geometry.vertex_count();
        let gpu = self.gpu.get_or_insert_with(MeshGpu::default);
        if count == 0 {
            return;
        }

        for input in material.inputs() {
            let key = (input.name.clone(), input.components);
            if gpu.buffers.contains_key(&key) {
                continue;
            }
            let data = vertex_data(&self.geometry, &input.name, input.components, count);
            let buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&input.name),
                    contents: bytemuck::cast_slice(&data),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            gpu.buffers.insert(key, buffer);
        }

        let binding = match slot {
            BindingSlot::Main => &mut gpu.main,
            BindingSlot::Depth => &mut gpu.depth,
        };
        let stale = binding
            .as_ref()
            .is_none_or(|b| b.material_uid != material.uid());
        if stale {
            let Some(layout) = material.uniform_layout() else {
                return;
            };
            *binding = Some(create_binding(ctx, material, layout));
        }
        if let Some(MeshBinding {
            buffer: Some(buffer),
            ..
        }) = binding.as_ref()
        {
            ctx.queue.write_buffer(buffer, 0, uniforms);
        }
    }

    /// Records the draw. Does nothing if [`prepare`](Self::prepare) has not
    /// run for this material and pipeline variant.
    pub(crate) fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        material: &Material,
        slot: BindingSlot,
        key: &PipelineKey,
    ) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        let binding = match slot {
            BindingSlot::Main => gpu.main.as_ref(),
            BindingSlot::Depth => gpu.depth.as_ref(),
        };
        let (Some(binding), Some(pipeline), Some(textures)) = (
            binding,
            material.pipeline(key),
            material.texture_bind_group(),
        ) else {
            return;
        };
        if binding.material_uid != material.uid() {
            return;
        }

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &binding.bind_group, &[]);
        pass.set_bind_group(1, textures, &[]);
        for (location, input) in material.inputs().iter().enumerate() {
            let Some(buffer) = gpu.buffers.get(&(input.name.clone(), input.components)) else {
                return;
            };
            pass.set_vertex_buffer(location as u32, buffer.slice(..));
        }
        pass.draw(0..self.vertex_count(), 0..1);
    }
}

fn create_binding(ctx: &Context, material: &Material, layout: &wgpu::BindGroupLayout) -> MeshBinding {
    let buffer = (material.uniform_size() > 0).then(|| {
        ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh uniform buffer"),
            size: material.uniform_size() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    });
    let entries: Vec<wgpu::BindGroupEntry> = buffer
        .iter()
        .map(|buffer| wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        })
        .collect();
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &entries,
        label: Some("mesh uniform bind group"),
    });
    MeshBinding {
        material_uid: material.uid(),
        buffer,
        bind_group,
    }
}

/// Per-vertex data for one material input.
///
/// Attributes the geometry lacks are default-filled; attributes with a
/// different component count are truncated or padded with defaults.
pub fn vertex_data(geometry: &Geometry, name: &str, components: u32, count: usize) -> Vec<f32> {
    let fill = default_value(name, components);
    let Some(attr) = geometry.attribute(name) else {
        log::debug!("Geometry has no {name} attribute; using defaults.");
        return fill.iter().copied().cycle().take(count * fill.len()).collect();
    };
    let have = attr.components as usize;
    let want = components as usize;
    if have == want {
        return attr.data.clone();
    }
    let mut data = Vec::with_capacity(count * want);
    for v in 0..count {
        for c in 0..want {
            let value = if c < have {
                attr.data.get(v * have + c).copied().unwrap_or(fill[c])
            } else {
                fill[c]
            };
            data.push(value);
        }
    }
    data
}
