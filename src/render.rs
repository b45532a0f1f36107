//! Frame rendering: shadow pass, opaque pass, back-to-front transparent pass.
//!
//! [`Renderer::render`] works in two phases. The prepare phase walks the
//! scene once, resolves every mesh's uniforms and uploads them; the encode
//! phase records the passes into one command buffer and submits it. Nothing
//! but scratch buffers survives from one call to the next.
//!
//! # Key types
//!
//! - [`World`] owns the scene graph and the material arena
//! - [`Renderer`] owns the optional shadow map and the per-frame scratch lists
//! - [`Destination`] is the screen frame or an off-screen [`RenderTarget`]

use std::{collections::HashSet, iter};

use anyhow::{Result, bail};
use cgmath::{InnerSpace, Vector3};
use slotmap::SlotMap;

use crate::{
    context::Context,
    data_structures::{
        geometry::Geometry,
        light::LightData,
        mesh::{BindingSlot, Mesh},
        render_target::RenderTarget,
        scene_graph::{Node, NodeId, NodeKind, SceneGraph},
    },
    material::{DrawStyle, Material, MaterialId},
    math::{self, OPENGL_TO_WGPU_MATRIX},
    pipelines::{DepthMode, PipelineKey},
    shadow::{ShadowMap, ShadowSettings},
};

/// Everything a frame is drawn from.
#[derive(Debug, Default)]
pub struct World {
    pub graph: SceneGraph,
    pub materials: SlotMap<MaterialId, Material>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Creates a mesh node under `parent`.
    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        geometry: Geometry,
        material: MaterialId,
    ) -> Result<NodeId> {
        if !self.materials.contains_key(material) {
            bail!("Material {material:?} does not exist.");
        }
        let mesh = Mesh::new(geometry, material);
        self.graph.insert_child(parent, Node::new(NodeKind::Mesh(mesh)))
    }
}

/// Where a render call draws to.
#[derive(Clone, Copy, Debug)]
pub enum Destination<'a> {
    /// The frame acquired with [`Context::acquire_frame`].
    Screen,
    Target(&'a RenderTarget),
}

impl<'a> Destination<'a> {
    /// Color view, depth view and color format of the destination.
    pub(crate) fn views(
        &self,
        ctx: &'a Context,
    ) -> Result<(&'a wgpu::TextureView, &'a wgpu::TextureView, wgpu::TextureFormat)> {
        match self {
            Destination::Screen => {
                let Some(frame) = ctx.frame() else {
                    bail!("No frame acquired; call Context::acquire_frame before drawing to the screen.");
                };
                Ok((&frame.view, &ctx.depth_texture.view, ctx.config.format))
            }
            Destination::Target(target) => {
                Ok((&target.color.view, &target.depth.view, target.format()))
            }
        }
    }
}

/// Per-call clear behavior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    pub clear_color: wgpu::Color,
    pub clear_color_buffer: bool,
    pub clear_depth_buffer: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            clear_color_buffer: true,
            clear_depth_buffer: true,
        }
    }
}

/// Meshes whose material has an `opacity` below 1 go through the
/// transparent pass.
pub fn is_transparent(opacity: Option<f32>) -> bool {
    opacity.is_some_and(|o| o < 1.0)
}

pub fn squared_distance(a: Vector3<f32>, b: Vector3<f32>) -> f32 {
    (a - b).magnitude2()
}

/// Orders `(item, squared distance)` pairs farthest first. Equal distances
/// keep their input order.
pub fn sort_back_to_front<T>(items: &mut [(T, f32)]) {
    items.sort_by(|a, b| b.1.total_cmp(&a.1));
}

type Draw = (NodeId, PipelineKey);

#[derive(Debug, Default)]
pub struct Renderer {
    shadow: Option<ShadowMap>,
    descendants: Vec<NodeId>,
    meshes: Vec<NodeId>,
    lights: Vec<LightData>,
    light_names: Vec<String>,
    shadow_draws: Vec<NodeId>,
    opaque: Vec<Draw>,
    transparent: Vec<(Draw, f32)>,
    uniform_bytes: Vec<u8>,
    /// Meshes already reported as skipped by the shadow pass.
    shadow_skipped: HashSet<NodeId>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Casts shadows from `light`. Replaces any previous shadow map.
    pub fn enable_shadows(
        &mut self,
        ctx: &Context,
        world: &mut World,
        light: NodeId,
        settings: &ShadowSettings,
    ) -> Result<()> {
        self.disable_shadows(world);
        self.shadow = Some(ShadowMap::new(ctx, &mut world.graph, light, settings)?);
        Ok(())
    }

    /// Drops the shadow map and its camera node.
    pub fn disable_shadows(&mut self, world: &mut World) {
        if let Some(shadow) = self.shadow.take() {
            world.graph.despawn(shadow.camera());
        }
    }

    pub fn shadow(&self) -> Option<&ShadowMap> {
        self.shadow.as_ref()
    }

    pub fn shadow_mut(&mut self) -> Option<&mut ShadowMap> {
        self.shadow.as_mut()
    }

    /// Draws every visible mesh below `scene` as seen by `camera`.
    ///
    /// Fails if `camera` is not a camera node or the screen is the
    /// destination and no frame was acquired.
    pub fn render(
        &mut self,
        ctx: &Context,
        world: &mut World,
        scene: NodeId,
        camera: NodeId,
        options: &RenderOptions,
        destination: Destination<'_>,
    ) -> Result<()> {
        let (color_view, depth_view, format) = destination.views(ctx)?;
        let shadow_key = self.prepare(ctx, world, scene, camera, format)?;

        let World { graph, materials } = world;
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if let (Some(shadow), Some(key)) = (&self.shadow, shadow_key) {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &shadow.depth_texture().view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                multiview_mask: None,
                timestamp_writes: None,
            });
            for id in &self.shadow_draws {
                if let Some(mesh) = graph.mesh(*id) {
                    mesh.draw(&mut pass, &shadow.material, BindingSlot::Depth, &key);
                }
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: if options.clear_color_buffer {
                            wgpu::LoadOp::Clear(options.clear_color)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: if options.clear_depth_buffer {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                multiview_mask: None,
                timestamp_writes: None,
            });

            let draws = self
                .opaque
                .iter()
                .chain(self.transparent.iter().map(|(draw, _)| draw));
            for (id, key) in draws {
                let Some(mesh) = graph.mesh(*id) else {
                    continue;
                };
                if let Some(material) = materials.get(mesh.material()) {
                    mesh.draw(&mut pass, material, BindingSlot::Main, key);
                }
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        Ok(())
    }

    /// Resolves uniforms, uploads them and fills the draw lists. Returns the
    /// shadow pass pipeline key when shadows are on.
    fn prepare(
        &mut self,
        ctx: &Context,
        world: &mut World,
        scene: NodeId,
        camera: NodeId,
        format: wgpu::TextureFormat,
    ) -> Result<Option<PipelineKey>> {
        let World { graph, materials } = world;

        graph.descendants_into(scene, &mut self.descendants);
        self.meshes.clear();
        self.lights.clear();
        for id in &self.descendants {
            let Some(node) = graph.get(*id) else {
                continue;
            };
            match &node.kind {
                NodeKind::Mesh(_) => self.meshes.push(*id),
                NodeKind::Light(light) => {
                    self.lights.push(light.data(&graph.global_matrix(*id)));
                }
                NodeKind::Group | NodeKind::Camera(_) => {}
            }
        }

        let camera_global = graph.global_matrix(camera);
        let Some(cam) = graph.camera_mut(camera) else {
            bail!("Node {camera:?} is not a camera.");
        };
        cam.update_view_matrix(&camera_global);
        let view = cam.view_matrix();
        let projection = OPENGL_TO_WGPU_MATRIX * cam.projection_matrix();
        let camera_position = math::position_of(&camera_global);

        let (shadow_key, shadow_data) = match self.shadow.as_mut() {
            Some(shadow) => {
                let key = prepare_shadow(
                    ctx,
                    shadow,
                    graph,
                    materials,
                    &self.meshes,
                    &mut self.shadow_draws,
                    &mut self.shadow_skipped,
                    &mut self.uniform_bytes,
                );
                (Some(key), Some(shadow.data(graph)))
            }
            None => {
                self.shadow_draws.clear();
                (None, None)
            }
        };

        self.opaque.clear();
        self.transparent.clear();
        for id in &self.meshes {
            let global = graph.global_matrix(*id);
            let Some(mesh) = graph.mesh_mut(*id) else {
                continue;
            };
            if !mesh.visible {
                continue;
            }
            let Some(material) = materials.get_mut(mesh.material()) else {
                log::warn!("Mesh {id:?} uses a material that no longer exists.");
                continue;
            };

            material.set("modelMatrix", global);
            material.set("viewMatrix", view);
            material.set("projectionMatrix", projection);
            if material.has_uniform("viewPosition") {
                material.set("viewPosition", camera_position);
            }
            if let Some(data) = &shadow_data {
                if material.has_uniform("shadow0") {
                    material.set("shadow0", data.clone());
                }
            }
            push_lights(material, &self.lights, &mut self.light_names);

            let transparent = is_transparent(material.opacity());
            let depth = if transparent {
                DepthMode::ReadOnly
            } else {
                DepthMode::ReadWrite
            };
            material.prepare(ctx);
            let key = material.pipeline_key(ctx, Some(format), depth);
            material.ensure_pipeline(ctx, key);
            material.write_uniforms(&mut self.uniform_bytes);
            mesh.prepare(ctx, material, BindingSlot::Main, &self.uniform_bytes);

            if transparent {
                let distance = squared_distance(math::position_of(&global), camera_position);
                self.transparent.push(((*id, key), distance));
            } else {
                self.opaque.push((*id, key));
            }
        }
        sort_back_to_front(&mut self.transparent);
        Ok(shadow_key)
    }
}

#[allow(clippy::too_many_arguments)]
fn prepare_shadow(
    ctx: &Context,
    shadow: &mut ShadowMap,
    graph: &mut SceneGraph,
    materials: &SlotMap<MaterialId, Material>,
    meshes: &[NodeId],
    draws: &mut Vec<NodeId>,
    skipped: &mut HashSet<NodeId>,
    bytes: &mut Vec<u8>,
) -> PipelineKey {
    shadow.update(graph);
    shadow.material.prepare(ctx);
    let key = shadow.material.pipeline_key(ctx, None, DepthMode::ReadWrite);
    shadow.material.ensure_pipeline(ctx, key);

    draws.clear();
    for id in meshes {
        let global = graph.global_matrix(*id);
        let Some(mesh) = graph.mesh_mut(*id) else {
            continue;
        };
        if !mesh.visible {
            continue;
        }
        let style = materials.get(mesh.material()).map(|m| m.settings.draw_style);
        if style != Some(DrawStyle::Triangles) {
            if skipped.insert(*id) {
                log::warn!("Mesh {id:?} is not drawn as triangles and casts no shadow.");
            }
            continue;
        }
        shadow.material.set("modelMatrix", global);
        shadow.material.write_uniforms(bytes);
        mesh.prepare(ctx, &shadow.material, BindingSlot::Depth, bytes);
        draws.push(*id);
    }
    key
}

/// Fills `light0`, `light1`, ... for as many slots as the material declares.
/// Slots without a light in the scene are reset to an inactive light.
fn push_lights(material: &mut Material, lights: &[LightData], names: &mut Vec<String>) {
    if !material.has_uniform("light0") {
        return;
    }
    for i in 0.. {
        if names.len() <= i {
            names.push(format!("light{i}"));
        }
        let name = &names[i];
        if !material.has_uniform(name) {
            break;
        }
        material.set(name, lights.get(i).copied().unwrap_or_default());
    }
}

