//! GPU round trips through a headless context. Needs an adapter, so these
//! only run with `--features integration-tests`.
#![cfg(feature = "integration-tests")]

use futures::executor::block_on;
use lumen_ngin::{
    context::Context,
    data_structures::{
        camera::Camera,
        geometry::Geometry,
        light::Light,
        render_target::{RenderTarget, read_texture},
        scene_graph::{Node, NodeId, NodeKind},
    },
    material::library::{self, LitOptions},
    postprocess::{Postprocessor, effects},
    render::{Destination, RenderOptions, Renderer, World},
    shadow::ShadowSettings,
};

const SIZE: u32 = 32;

fn context() -> Context {
    block_on(Context::headless(SIZE, SIZE)).expect("headless context")
}

fn scene(world: &mut World) -> (NodeId, NodeId) {
    let scene = world.graph.add_group("scene");
    let camera = Camera::perspective(60.0, 1.0, 0.1, 100.0).unwrap();
    let camera = world
        .graph
        .insert_child(scene, Node::new(NodeKind::Camera(camera)))
        .unwrap();
    world.graph.set_position(camera, 0.0, 0.0, 5.0);
    (scene, camera)
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> &[u8] {
    let at = ((y * SIZE + x) * 4) as usize;
    &pixels[at..at + 4]
}

fn clear(color: wgpu::Color) -> RenderOptions {
    RenderOptions {
        clear_color: color,
        ..Default::default()
    }
}

#[test]
fn empty_scene_renders_the_clear_color_to_the_screen() {
    let mut ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let mut renderer = Renderer::new();

    ctx.acquire_frame().unwrap();
    renderer
        .render(
            &ctx,
            &mut world,
            scene,
            camera,
            &clear(wgpu::Color::WHITE),
            Destination::Screen,
        )
        .unwrap();
    let pixels = block_on(read_texture(&ctx, ctx.screen_texture().unwrap())).unwrap();
    ctx.present();

    assert_eq!(pixels.len(), (SIZE * SIZE * 4) as usize);
    assert!(pixels.iter().all(|&b| b == 255));
}

#[test]
fn unlit_mesh_covers_the_center_of_a_target() {
    let ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let mut material = library::surface([1.0, 0.0, 0.0], None);
    material.settings.double_sided = true;
    let material = world.add_material(material);
    world
        .add_mesh(scene, Geometry::rectangle(1.0, 1.0), material)
        .unwrap();
    let target = RenderTarget::with_format(&ctx, [SIZE, SIZE], wgpu::TextureFormat::Rgba8Unorm);
    let mut renderer = Renderer::new();

    renderer
        .render(
            &ctx,
            &mut world,
            scene,
            camera,
            &clear(wgpu::Color::BLACK),
            Destination::Target(&target),
        )
        .unwrap();
    let pixels = block_on(target.read_pixels(&ctx)).unwrap();

    assert_eq!(pixel(&pixels, SIZE / 2, SIZE / 2), &[255, 0, 0, 255]);
    assert_eq!(pixel(&pixels, 0, 0), &[0, 0, 0, 255]);
}

#[test]
fn chain_without_effects_renders_straight_into_the_output() {
    let ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let output = RenderTarget::with_format(&ctx, [SIZE, SIZE], wgpu::TextureFormat::Rgba8Unorm);
    let mut postprocessor = Postprocessor::new(&ctx, scene, camera, Some(output));
    postprocessor.options = clear(wgpu::Color::RED);
    let mut renderer = Renderer::new();

    postprocessor.render(&ctx, &mut renderer, &mut world).unwrap();
    let pixels = block_on(postprocessor.output().unwrap().read_pixels(&ctx)).unwrap();

    assert_eq!(postprocessor.effect_count(), 0);
    for rgba in pixels.chunks(4) {
        assert_eq!(rgba, &[255, 0, 0, 255]);
    }
}

#[test]
fn copy_chain_reproduces_the_scene_in_the_output() {
    let ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let output = RenderTarget::with_format(&ctx, [SIZE, SIZE], wgpu::TextureFormat::Rgba8Unorm);
    let mut postprocessor = Postprocessor::new(&ctx, scene, camera, Some(output));
    postprocessor.options = clear(wgpu::Color::GREEN);
    postprocessor.add_effect(&ctx, effects::copy());
    postprocessor.add_effect(&ctx, effects::copy());
    let mut renderer = Renderer::new();

    postprocessor.render(&ctx, &mut renderer, &mut world).unwrap();
    let pixels = block_on(postprocessor.output().unwrap().read_pixels(&ctx)).unwrap();

    for rgba in pixels.chunks(4) {
        assert_eq!(rgba, &[0, 255, 0, 255]);
    }
}

#[test]
fn tint_effect_multiplies_the_image() {
    let ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let output = RenderTarget::with_format(&ctx, [SIZE, SIZE], wgpu::TextureFormat::Rgba8Unorm);
    let mut postprocessor = Postprocessor::new(&ctx, scene, camera, Some(output));
    postprocessor.options = clear(wgpu::Color::WHITE);
    postprocessor.add_effect(&ctx, effects::tint([0.0, 0.0, 1.0]));
    let mut renderer = Renderer::new();

    postprocessor.render(&ctx, &mut renderer, &mut world).unwrap();
    let pixels = block_on(postprocessor.output().unwrap().read_pixels(&ctx)).unwrap();

    assert_eq!(pixel(&pixels, 3, 7), &[0, 0, 255, 255]);
}

#[test]
fn hidden_mesh_leaves_the_clear_color() {
    let ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let mut material = library::surface([1.0, 0.0, 0.0], None);
    material.settings.double_sided = true;
    let material = world.add_material(material);
    let mesh = world
        .add_mesh(scene, Geometry::rectangle(1.0, 1.0), material)
        .unwrap();
    world.graph.mesh_mut(mesh).unwrap().visible = false;
    let target = RenderTarget::with_format(&ctx, [SIZE, SIZE], wgpu::TextureFormat::Rgba8Unorm);
    let mut renderer = Renderer::new();

    renderer
        .render(
            &ctx,
            &mut world,
            scene,
            camera,
            &clear(wgpu::Color::BLUE),
            Destination::Target(&target),
        )
        .unwrap();
    let pixels = block_on(target.read_pixels(&ctx)).unwrap();

    assert_eq!(pixel(&pixels, SIZE / 2, SIZE / 2), &[0, 0, 255, 255]);
}

/// A floor in the xy plane facing the camera, a directional light shining
/// along (-1, 0, -1) and a small box between them whose shadow falls on the
/// floor's center.
fn shadowed_floor(world: &mut World, scene: NodeId) -> NodeId {
    let floor = world.add_material(library::lambert(LitOptions {
        base_color: [1.0, 1.0, 1.0],
        use_shadow: true,
        ..Default::default()
    }));
    world
        .add_mesh(scene, Geometry::rectangle(10.0, 10.0), floor)
        .unwrap();

    let occluder = world.add_material(library::surface([1.0, 1.0, 1.0], None));
    let occluder = world
        .add_mesh(scene, Geometry::box_geometry(0.5, 0.5, 0.5), occluder)
        .unwrap();
    world.graph.set_position(occluder, 1.0, 0.0, 1.0);

    let light = world
        .graph
        .insert_child(scene, Node::new(NodeKind::Light(Light::directional([1.0; 3]))))
        .unwrap();
    world.graph.set_position(light, 3.0, 0.0, 3.0);
    world.graph.look_at(light, [0.0, 0.0, 0.0].into());
    light
}

#[test]
fn shadow_camera_is_parented_to_the_light() {
    let ctx = context();
    let mut world = World::new();
    let (scene, _) = scene(&mut world);
    let light = shadowed_floor(&mut world, scene);
    let mut renderer = Renderer::new();

    renderer
        .enable_shadows(&ctx, &mut world, light, &ShadowSettings::default())
        .unwrap();
    let shadow_camera = renderer.shadow().unwrap().camera();

    assert_eq!(world.graph.parent(shadow_camera), Some(light));
    assert!(world.graph.camera(shadow_camera).is_some());

    renderer.disable_shadows(&mut world);
    assert!(!world.graph.contains(shadow_camera));
}

#[test]
fn occluded_floor_is_darkened_by_the_shadow_strength() {
    let ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let light = shadowed_floor(&mut world, scene);
    let target = RenderTarget::with_format(&ctx, [SIZE, SIZE], wgpu::TextureFormat::Rgba8Unorm);
    let mut renderer = Renderer::new();
    let render = |renderer: &mut Renderer, world: &mut World| {
        renderer
            .render(
                &ctx,
                world,
                scene,
                camera,
                &clear(wgpu::Color::BLACK),
                Destination::Target(&target),
            )
            .unwrap();
        block_on(target.read_pixels(&ctx)).unwrap()
    };

    let unshadowed = render(&mut renderer, &mut world);
    renderer
        .enable_shadows(&ctx, &mut world, light, &ShadowSettings::default())
        .unwrap();
    let shadowed = render(&mut renderer, &mut world);

    // Floor at the origin, under the box's shadow.
    let center = pixel(&shadowed, SIZE / 2, SIZE / 2)[0] as u32;
    // Floor around x = -2, outside of it.
    let side = pixel(&shadowed, 4, SIZE / 2)[0] as u32;
    let center_without = pixel(&unshadowed, SIZE / 2, SIZE / 2)[0] as u32;

    assert!(side > 100, "lit floor is too dark: {side}");
    assert!(center_without.abs_diff(side) <= 2);
    assert!(center * 4 < side * 3, "{center} is not darker than {side}");
    assert!(center > 0);
}

#[test]
fn bloom_chain_composites_the_untouched_scene() {
    let ctx = context();
    let mut world = World::new();
    let (scene, camera) = scene(&mut world);
    let output = RenderTarget::with_format(&ctx, [SIZE, SIZE], wgpu::TextureFormat::Rgba8Unorm);
    let mut postprocessor = Postprocessor::new(&ctx, scene, camera, Some(output));
    postprocessor.options = clear(wgpu::Color {
        r: 0.2,
        g: 0.2,
        b: 0.2,
        a: 1.0,
    });
    let size = [SIZE as f32, SIZE as f32];
    // The dim scene is filtered to black, so only the scene itself can
    // brighten the output.
    postprocessor.add_effect(&ctx, effects::bright_filter(1.0));
    postprocessor.add_effect(&ctx, effects::horizontal_blur(size, 4));
    postprocessor.add_effect(&ctx, effects::vertical_blur(size, 4));
    let scene_texture = postprocessor.scene_texture().unwrap().clone();
    postprocessor.add_effect(&ctx, effects::additive_blend(scene_texture, 1.0, 1.0));
    let mut renderer = Renderer::new();

    postprocessor.render(&ctx, &mut renderer, &mut world).unwrap();
    let pixels = block_on(postprocessor.output().unwrap().read_pixels(&ctx)).unwrap();

    for rgba in pixels.chunks(4) {
        assert!(rgba[0].abs_diff(51) <= 1, "{rgba:?}");
        assert_eq!(rgba[0], rgba[2]);
    }
}
