//! Post-processing chains.
//!
//! A [`Postprocessor`] renders a scene into an off-screen target and then
//! runs an ordered list of full-screen effects over it. The scene target is
//! never written by an effect, so late effects can still sample it; the
//! effects themselves ping-pong between two further targets. The last effect
//! writes to the caller's output target, or to the screen when there is
//! none. With no effects the scene is rendered straight into the output.

pub mod effects;

use std::{iter, sync::Arc};

use anyhow::Result;

use crate::{
    context::Context,
    data_structures::{
        geometry::Geometry,
        mesh::{BindingSlot, Mesh},
        render_target::RenderTarget,
        scene_graph::NodeId,
        texture::Texture,
    },
    material::{Material, MaterialId},
    pipelines::DepthMode,
    render::{Destination, RenderOptions, Renderer, World},
};

/// A stage's input or output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// An intermediate target. `0` holds the scene, `1` and `2` alternate
    /// between effects.
    PingPong(usize),
    /// The output target, or the screen.
    Output,
}

/// Which slot each stage of a chain reads and writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainPlan {
    /// Where the scene itself is rendered.
    pub scene: Slot,
    /// `(input, output)` for every effect, in order.
    pub steps: Vec<(Slot, Slot)>,
}

impl ChainPlan {
    pub fn new(effect_count: usize) -> Self {
        if effect_count == 0 {
            return Self {
                scene: Slot::Output,
                steps: Vec::new(),
            };
        }
        // Target 0 holds the scene for the whole chain; effects alternate
        // between targets 1 and 2.
        let steps = (0..effect_count)
            .map(|i| {
                let input = if i == 0 {
                    Slot::PingPong(0)
                } else {
                    Slot::PingPong(1 + (i - 1) % 2)
                };
                let output = if i + 1 == effect_count {
                    Slot::Output
                } else {
                    Slot::PingPong(1 + i % 2)
                };
                (input, output)
            })
            .collect();
        Self {
            scene: Slot::PingPong(0),
            steps,
        }
    }

    /// Number of intermediate targets the chain touches.
    pub fn ping_pong_count(&self) -> usize {
        iter::once(self.scene)
            .chain(self.steps.iter().flat_map(|(i, o)| [*i, *o]))
            .filter_map(|slot| match slot {
                Slot::PingPong(i) => Some(i + 1),
                Slot::Output => None,
            })
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug)]
struct Effect {
    material: Material,
    /// Owns the quad's vertex buffers and uniform binding for this effect.
    quad: Mesh,
}

#[derive(Debug)]
pub struct Postprocessor {
    scene: NodeId,
    camera: NodeId,
    output: Option<RenderTarget>,
    targets: Vec<RenderTarget>,
    quad: Arc<Geometry>,
    effects: Vec<Effect>,
    /// Clear behavior of the scene render.
    pub options: RenderOptions,
    uniform_bytes: Vec<u8>,
}

impl Postprocessor {
    /// Targets are sized like `output`, or like the screen without one.
    pub fn new(ctx: &Context, scene: NodeId, camera: NodeId, output: Option<RenderTarget>) -> Self {
        let size = output
            .as_ref()
            .map(RenderTarget::size)
            .unwrap_or([ctx.width(), ctx.height()]);
        Self {
            scene,
            camera,
            output,
            targets: vec![RenderTarget::new(ctx, size)],
            quad: Arc::new(Geometry::fullscreen_quad()),
            effects: Vec::new(),
            options: RenderOptions::default(),
            uniform_bytes: Vec::new(),
        }
    }

    /// Appends an effect. Returns its index in the chain.
    pub fn add_effect(&mut self, ctx: &Context, material: Material) -> usize {
        let quad = Mesh::from_shared(self.quad.clone(), MaterialId::default());
        self.effects.push(Effect { material, quad });
        let needed = ChainPlan::new(self.effects.len()).ping_pong_count();
        while self.targets.len() < needed {
            self.targets.push(RenderTarget::new(ctx, self.size()));
        }
        self.effects.len() - 1
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn effect_mut(&mut self, index: usize) -> Option<&mut Material> {
        self.effects.get_mut(index).map(|e| &mut e.material)
    }

    /// The target the scene is rendered into. No effect writes to it, so its
    /// texture is what an additive blend at the end of a bloom chain
    /// composites back.
    pub fn scene_texture(&self) -> Option<&Texture> {
        self.targets.first().map(|t| &t.color)
    }

    pub fn output(&self) -> Option<&RenderTarget> {
        self.output.as_ref()
    }

    pub fn size(&self) -> [u32; 2] {
        self.targets
            .first()
            .map(RenderTarget::size)
            .unwrap_or([1, 1])
    }

    /// Reallocates the intermediate targets at the screen size. Chains with
    /// an output target keep their size.
    pub fn resize(&mut self, ctx: &Context) {
        if self.output.is_some() {
            return;
        }
        let size = [ctx.width(), ctx.height()];
        for target in &mut self.targets {
            *target = RenderTarget::new(ctx, size);
        }
    }

    /// Renders the scene and runs every effect in order.
    ///
    /// Effects that sample the first target (see [`scene_texture`](Self::scene_texture))
    /// hold their own handle to it, so [`resize`](Self::resize) requires
    /// setting it again.
    pub fn render(&mut self, ctx: &Context, renderer: &mut Renderer, world: &mut World) -> Result<()> {
        let plan = ChainPlan::new(self.effects.len());
        let scene_destination = destination(&self.targets, self.output.as_ref(), plan.scene);
        renderer.render(
            ctx,
            world,
            self.scene,
            self.camera,
            &self.options,
            scene_destination,
        )?;

        for (effect, (input, output)) in self.effects.iter_mut().zip(plan.steps) {
            if let Slot::PingPong(i) = input {
                effect.material.set("textureSampler", self.targets[i].color.clone());
            }
            let destination = destination(&self.targets, self.output.as_ref(), output);
            draw_effect(ctx, effect, destination, &mut self.uniform_bytes)?;
        }
        Ok(())
    }
}

fn destination<'a>(
    targets: &'a [RenderTarget],
    output: Option<&'a RenderTarget>,
    slot: Slot,
) -> Destination<'a> {
    match (slot, output) {
        (Slot::PingPong(i), _) => Destination::Target(&targets[i]),
        (Slot::Output, Some(target)) => Destination::Target(target),
        (Slot::Output, None) => Destination::Screen,
    }
}

fn draw_effect(
    ctx: &Context,
    effect: &mut Effect,
    destination: Destination<'_>,
    bytes: &mut Vec<u8>,
) -> Result<()> {
    let (color_view, _, format) = destination.views(ctx)?;
    let material = &mut effect.material;
    material.prepare(ctx);
    let key = material.pipeline_key(ctx, Some(format), DepthMode::None);
    material.ensure_pipeline(ctx, key);
    material.write_uniforms(bytes);
    effect.quad.prepare(ctx, material, BindingSlot::Main, bytes);

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Effect Encoder"),
        });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(material.name()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            multiview_mask: None,
            timestamp_writes: None,
        });
        effect.quad.draw(&mut pass, material, BindingSlot::Main, &key);
    }
    ctx.queue.submit(iter::once(encoder.finish()));
    Ok(())
}
