//! A spinning box over a floor, lit by an ambient and a shadow-casting
//! directional light, with a vignette over the result.
//!
//! Run with `cargo run` from this directory; Escape quits.

use anyhow::Result;
use lumen_ngin::{
    KeyCode,
    context::Context,
    data_structures::{
        camera::Camera,
        geometry::Geometry,
        light::Light,
        scene_graph::{Node, NodeId, NodeKind},
    },
    flow::{self, Application, WindowSettings},
    input::Input,
    material::library::{self, LitOptions},
    postprocess::{Postprocessor, effects},
    render::{Renderer, World},
    shadow::ShadowSettings,
    wgpu,
};

#[derive(Default)]
struct Shadows {
    renderer: Renderer,
    postprocessor: Option<Postprocessor>,
    camera: Option<NodeId>,
    cube: Option<NodeId>,
    paused: bool,
}

impl Application for Shadows {
    async fn initialize(&mut self, ctx: &Context, world: &mut World) -> Result<()> {
        let scene = world.graph.add_group("scene");

        let camera = Camera::perspective(60.0, ctx.aspect(), 0.1, 1000.0)?;
        let camera = world
            .graph
            .insert_child(scene, Node::new(NodeKind::Camera(camera)).with_name("camera"))?;
        world.graph.set_position(camera, 0.0, 3.0, 7.0);
        world.graph.look_at(camera, [0.0, 0.5, 0.0].into());

        world.graph.insert_child(
            scene,
            Node::new(NodeKind::Light(Light::ambient([0.2, 0.2, 0.2]))).with_name("ambient"),
        )?;
        let sun = world.graph.insert_child(
            scene,
            Node::new(NodeKind::Light(Light::directional([0.8, 0.8, 0.8]))).with_name("sun"),
        )?;
        world.graph.set_position(sun, 2.0, 6.0, 2.0);
        world.graph.look_at(sun, [0.0, 0.0, 0.0].into());

        let lit = |color| {
            library::lambert(LitOptions {
                number_of_lights: 2,
                base_color: color,
                use_shadow: true,
                ..Default::default()
            })
        };
        let floor_material = world.add_material(lit([0.6, 0.7, 0.6]));
        let floor = world.add_mesh(scene, Geometry::rectangle(10.0, 10.0), floor_material)?;
        world.graph.rotate_x(floor, -std::f32::consts::FRAC_PI_2, true);

        let cube_material = world.add_material(lit([0.9, 0.5, 0.3]));
        let cube = world.add_mesh(scene, Geometry::box_geometry(1.0, 1.0, 1.0), cube_material)?;
        world.graph.set_position(cube, 0.0, 1.0, 0.0);

        let glass = world.add_material(library::transparent([0.3, 0.5, 1.0], 0.4));
        let sphere = world.add_mesh(scene, Geometry::sphere(0.5, 32, 16), glass)?;
        world.graph.set_position(sphere, 1.5, 0.75, 1.0);

        self.renderer
            .enable_shadows(ctx, world, sun, &ShadowSettings::default())?;

        let mut postprocessor = Postprocessor::new(ctx, scene, camera, None);
        postprocessor.options.clear_color = wgpu::Color {
            r: 0.05,
            g: 0.05,
            b: 0.1,
            a: 1.0,
        };
        postprocessor.add_effect(ctx, effects::vignette(0.4, 1.0, [0.0, 0.0, 0.0]));

        self.postprocessor = Some(postprocessor);
        self.camera = Some(camera);
        self.cube = Some(cube);
        Ok(())
    }

    fn update(&mut self, ctx: &Context, world: &mut World, input: &Input, dt: f32) -> Result<()> {
        if input.is_key_down(KeyCode::Space) {
            self.paused = !self.paused;
        }
        if let (Some(cube), false) = (self.cube, self.paused) {
            world.graph.rotate_y(cube, dt, true);
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
        if let Some(postprocessor) = self.postprocessor.as_mut() {
            postprocessor.resize(ctx);
        }
    }
}

fn main() -> Result<()> {
    flow::run(
        WindowSettings {
            title: "lumen-ngin: shadows".to_string(),
            ..Default::default()
        },
        Shadows::default(),
    )
}
