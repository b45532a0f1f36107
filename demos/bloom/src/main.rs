//! Light bloom: the bright parts of the scene are filtered out, blurred in
//! two passes and added back on top of the untouched scene.
//!
//! Run with `cargo run` from this directory; Escape quits.

use anyhow::Result;
use lumen_ngin::{
    context::Context,
    data_structures::{
        camera::Camera,
        geometry::Geometry,
        scene_graph::{Node, NodeId, NodeKind},
    },
    flow::{self, Application, WindowSettings},
    input::Input,
    material::library,
    postprocess::{Postprocessor, effects},
    render::{Renderer, World},
};

#[derive(Default)]
struct Bloom {
    renderer: Renderer,
    postprocessor: Option<Postprocessor>,
    camera: Option<NodeId>,
    sphere: Option<NodeId>,
}

impl Bloom {
    fn build_chain(ctx: &Context, scene: NodeId, camera: NodeId) -> Postprocessor {
        let size = [ctx.width() as f32, ctx.height() as f32];
        let mut postprocessor = Postprocessor::new(ctx, scene, camera, None);
        postprocessor.add_effect(ctx, effects::bright_filter(2.4));
        postprocessor.add_effect(ctx, effects::horizontal_blur(size, 35));
        postprocessor.add_effect(ctx, effects::vertical_blur(size, 35));
        if let Some(scene_texture) = postprocessor.scene_texture().cloned() {
            postprocessor.add_effect(ctx, effects::additive_blend(scene_texture, 1.0, 0.6));
        }
        postprocessor
    }
}

impl Application for Bloom {
    async fn initialize(&mut self, ctx: &Context, world: &mut World) -> Result<()> {
        let scene = world.graph.add_group("scene");

        let camera = Camera::perspective(60.0, ctx.aspect(), 0.1, 1000.0)?;
        let camera = world
            .graph
            .insert_child(scene, Node::new(NodeKind::Camera(camera)).with_name("camera"))?;
        world.graph.set_position(camera, 0.0, 1.0, 4.0);

        let mut sky = library::surface([0.15, 0.25, 0.5], None);
        sky.settings.double_sided = true;
        let sky = world.add_material(sky);
        world.add_mesh(scene, Geometry::sphere(50.0, 32, 16), sky)?;

        let grass = world.add_material(library::surface([0.2, 0.45, 0.15], None));
        let grass = world.add_mesh(scene, Geometry::rectangle(100.0, 100.0), grass)?;
        world.graph.rotate_x(grass, -std::f32::consts::FRAC_PI_2, true);

        let glow = world.add_material(library::emissive([1.0, 0.9, 0.7], None));
        let sphere = world.add_mesh(scene, Geometry::sphere(1.0, 32, 16), glow)?;
        world.graph.set_position(sphere, 0.0, 1.0, 0.0);

        self.postprocessor = Some(Self::build_chain(ctx, scene, camera));
        self.camera = Some(camera);
        self.sphere = Some(sphere);
        Ok(())
    }

    fn update(&mut self, ctx: &Context, world: &mut World, _input: &Input, dt: f32) -> Result<()> {
        if let Some(sphere) = self.sphere {
            world.graph.rotate_y(sphere, 0.8 * dt, true);
        }
        if let Some(postprocessor) = self.postprocessor.as_mut() {
            postprocessor.render(ctx, &mut self.renderer, world)?;
        }
        Ok(())
    }

    fn resized(&mut self, ctx: &Context, world: &mut World) {
        if let Some(camera) = self.camera.and_then(|id| world.graph.camera_mut(id)) {
            camera.set_aspect(ctx.aspect());
        }
        // Blur sizes and the blend texture depend on the screen size.
        let scene = self.sphere.and_then(|id| world.graph.parent(id));
        let (Some(scene), Some(camera)) = (scene, self.camera) else {
            return;
        };
        self.postprocessor = Some(Self::build_chain(ctx, scene, camera));
    }
}

fn main() -> Result<()> {
    flow::run(
        WindowSettings {
            title: "lumen-ngin: bloom".to_string(),
            ..Default::default()
        },
        Bloom::default(),
    )
}
