//! Light payloads for scene nodes.
//!
//! A [`Light`] only carries color, attenuation and cone parameters. Position
//! and direction always come from the owning node's global matrix, so moving
//! or re-parenting the node moves the light.

use cgmath::{InnerSpace, Matrix4, Vector3};

use crate::{data_structures::camera::OrthoBounds, math};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
    /// Cone cosines, `cutoff` is the outer edge and `inner_cutoff` the fully lit core.
    Spot { cutoff: f32, inner_cutoff: f32 },
}

impl LightKind {
    /// Tag written into the `light_type` field of the shader-side light struct.
    pub fn type_id(&self) -> i32 {
        match self {
            LightKind::Ambient => 1,
            LightKind::Directional => 2,
            LightKind::Point => 3,
            LightKind::Spot { .. } => 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGB, values above 1 are allowed.
    pub color: [f32; 3],
    /// Constant, linear and quadratic terms; only point and spot lights use them.
    pub attenuation: [f32; 3],
    /// Optional orthographic view volume used when this light casts shadows.
    pub shadow_bounds: Option<OrthoBounds>,
}

impl Light {
    pub fn ambient(color: [f32; 3]) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            attenuation: [1.0, 0.0, 0.0],
            shadow_bounds: None,
        }
    }

    pub fn directional(color: [f32; 3]) -> Self {
        Self {
            kind: LightKind::Directional,
            ..Self::ambient(color)
        }
    }

    /// A directional light whose shadow volume encloses a cone of
    /// `angle_deg` out to `distance`.
    pub fn directional_cone(color: [f32; 3], angle_deg: f32, distance: f32) -> Self {
        Self {
            shadow_bounds: Some(OrthoBounds::from_cone(angle_deg, distance)),
            ..Self::directional(color)
        }
    }

    pub fn point(color: [f32; 3], attenuation: [f32; 3]) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            attenuation,
            shadow_bounds: None,
        }
    }

    /// A spot light with cone half-angles given in degrees.
    pub fn spot(
        color: [f32; 3],
        attenuation: [f32; 3],
        cutoff_angle: f32,
        inner_cutoff_angle: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot {
                cutoff: cutoff_angle.to_radians().cos(),
                inner_cutoff: inner_cutoff_angle.to_radians().cos(),
            },
            color,
            attenuation,
            shadow_bounds: None,
        }
    }

    /// Flattens the light and its node transform into the shader-side layout.
    pub fn data(&self, global: &Matrix4<f32>) -> LightData {
        let (cutoff, inner_cutoff) = match self.kind {
            LightKind::Spot {
                cutoff,
                inner_cutoff,
            } => (cutoff, inner_cutoff),
            _ => (0.98, 0.98),
        };
        LightData {
            light_type: self.kind.type_id(),
            color: self.color,
            direction: math::forward_of(global).into(),
            position: math::position_of(global).into(),
            attenuation: self.attenuation,
            cutoff,
            inner_cutoff,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::ambient([1.0, 1.0, 1.0])
    }
}

/// Resolved light, as uploaded into a material's `lightN` slot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LightData {
    pub light_type: i32,
    pub color: [f32; 3],
    pub direction: [f32; 3],
    pub position: [f32; 3],
    pub attenuation: [f32; 3],
    pub cutoff: f32,
    pub inner_cutoff: f32,
}

impl LightData {
    /// CPU mirror of the shader lighting routine: the light's color scaled by
    /// its ambient or diffuse contribution at `point` with surface `normal`.
    pub fn contribution(&self, point: Vector3<f32>, normal: Vector3<f32>) -> Vector3<f32> {
        let color = Vector3::from(self.color);
        let mut ambient = 0.0;
        let mut diffuse = 0.0;
        let mut attenuation = 1.0;
        let mut direction = Vector3::new(0.0, 0.0, 0.0);

        match self.light_type {
            1 => ambient = 1.0,
            2 => direction = Vector3::from(self.direction).normalize(),
            3 | 4 => {
                let offset = point - Vector3::from(self.position);
                let distance = offset.magnitude();
                direction = if distance > 0.0 {
                    offset / distance
                } else {
                    offset
                };
                let [c, l, q] = self.attenuation;
                attenuation = 1.0 / (c + l * distance + q * distance * distance);
                if self.light_type == 4 {
                    let theta = direction.dot(Vector3::from(self.direction).normalize());
                    attenuation *= smoothstep(self.cutoff, self.inner_cutoff, theta);
                    if theta < self.cutoff {
                        attenuation = 0.0;
                    }
                }
            }
            _ => {}
        }

        if self.light_type > 1 {
            let n = if normal.magnitude2() > 0.0 {
                normal.normalize()
            } else {
                normal
            };
            diffuse = n.dot(-direction).abs() * attenuation;
        }
        color * (ambient + diffuse)
    }
}

/// Hermite interpolation matching WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
