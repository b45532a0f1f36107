//! Shadow mapping for one light.
//!
//! A [`ShadowMap`] owns a camera node parented to its light, a depth texture
//! and the depth-only material used to fill it. Each frame the renderer draws
//! the visible triangle meshes from the light's point of view, then hands the
//! resulting [`ShadowData`] to every material that declares a `shadow0` slot.
//! The test itself is a single hard sample; see [`in_shadow`].

use anyhow::{Result, bail};

use crate::{
    context::Context,
    data_structures::{
        camera::{Camera, OrthoBounds},
        light::Light,
        scene_graph::{Node, NodeId, NodeKind, SceneGraph},
        texture::Texture,
    },
    material::{Material, library, uniform::ShadowData},
    math::{self, OPENGL_TO_WGPU_MATRIX},
};

/// Perspective shadow camera parameters for spot lights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotShadow {
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for SpotShadow {
    fn default() -> Self {
        Self { fov: 45.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// How much a shadowed fragment is darkened, 0 to 1.
    pub strength: f32,
    pub resolution: [u32; 2],
    /// Orthographic volume, used unless the light declares its own bounds.
    pub bounds: OrthoBounds,
    pub bias: f32,
    /// Use a perspective camera instead of the orthographic volume.
    pub spot: Option<SpotShadow>,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            strength: 0.5,
            resolution: [512, 512],
            bounds: OrthoBounds::new(-5.0, 5.0, -5.0, 5.0, 0.0, 20.0),
            bias: 0.01,
            spot: None,
        }
    }
}

/// The camera a shadow map renders its depth pass with.
///
/// Spot shadows use a square perspective frustum from 0.1 to 100; everything
/// else is orthographic, preferring the light's own bounds. Degenerate
/// volumes are an error.
pub fn shadow_camera(light: &Light, settings: &ShadowSettings) -> Result<Camera> {
    if let Some(spot) = settings.spot {
        return Camera::perspective(spot.fov, 1.0, 0.1, 100.0);
    }
    let bounds = light.shadow_bounds.unwrap_or(settings.bounds);
    Camera::orthographic(bounds)
}

/// Hard shadow classification: a fragment is shadowed when it lies further
/// from the light than the closest occluder plus `bias`.
pub fn in_shadow(fragment_depth: f32, closest_depth: f32, bias: f32) -> bool {
    fragment_depth > closest_depth + bias
}

/// Shadow-map texture coordinates of a point in the shadow camera's
/// normalized device space. `v` grows downwards, like the texture rows.
pub fn shadow_uv(ndc_x: f32, ndc_y: f32) -> [f32; 2] {
    [ndc_x * 0.5 + 0.5, 0.5 - ndc_y * 0.5]
}

#[derive(Debug)]
pub struct ShadowMap {
    light: NodeId,
    camera: NodeId,
    depth: Texture,
    pub(crate) material: Material,
    pub strength: f32,
    pub bias: f32,
}

impl ShadowMap {
    /// Attaches a shadow camera to `light` and allocates the depth map.
    pub fn new(
        ctx: &Context,
        graph: &mut SceneGraph,
        light: NodeId,
        settings: &ShadowSettings,
    ) -> Result<Self> {
        let Some(light_payload) = graph.light(light) else {
            bail!("Node {light:?} is not a light and cannot cast shadows.");
        };
        let camera = shadow_camera(light_payload, settings)?;
        let camera = graph.insert_child(
            light,
            Node::new(NodeKind::Camera(camera)).with_name("shadow camera"),
        )?;

        // Without border sampling the material shader bounds-checks instead.
        let address_mode = if ctx.supports_border_clamp() {
            wgpu::AddressMode::ClampToBorder
        } else {
            wgpu::AddressMode::ClampToEdge
        };
        let depth =
            Texture::create_depth_texture(&ctx.device, settings.resolution, "shadow map", address_mode);

        Ok(Self {
            light,
            camera,
            depth,
            material: library::depth(),
            strength: settings.strength,
            bias: settings.bias,
        })
    }

    pub fn light(&self) -> NodeId {
        self.light
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn depth_texture(&self) -> &Texture {
        &self.depth
    }

    /// Refreshes the shadow camera from the light's current transform and
    /// stages its matrices into the depth material.
    pub fn update(&mut self, graph: &mut SceneGraph) {
        let global = graph.global_matrix(self.camera);
        let Some(camera) = graph.camera_mut(self.camera) else {
            log::warn!("Shadow camera {:?} was removed from the scene graph.", self.camera);
            return;
        };
        camera.update_view_matrix(&global);
        let view = camera.view_matrix();
        let projection = OPENGL_TO_WGPU_MATRIX * camera.projection_matrix();
        self.material.set("viewMatrix", view);
        self.material.set("projectionMatrix", projection);
    }

    /// Light-space matrices and parameters for consuming materials.
    pub fn data(&self, graph: &SceneGraph) -> ShadowData {
        let (view, projection) = graph
            .camera(self.camera)
            .map(|c| (c.view_matrix(), OPENGL_TO_WGPU_MATRIX * c.projection_matrix()))
            .unwrap_or_else(|| (math::identity(), math::identity()));
        ShadowData {
            light_direction: graph.direction(self.light).into(),
            projection: projection.into(),
            view: view.into(),
            strength: self.strength,
            bias: self.bias,
            depth: Some(self.depth.clone()),
        }
    }
}
