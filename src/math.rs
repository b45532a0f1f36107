//! Stateless 4x4 matrix builders.
//!
//! All builders return column-major [`cgmath::Matrix4<f32>`] values and follow
//! the OpenGL clip convention (device z in `[-1, 1]`). The renderer converts
//! projections with [`OPENGL_TO_WGPU_MATRIX`] right before they reach the GPU,
//! so everything scene-side stays in one convention.
//!
//! [`Transform`] composes scale, then rotation, then translation into a local
//! matrix. Children inherit that pivot behavior through the scene graph.

use cgmath::{Deg, InnerSpace, Matrix4, One, Quaternion, Rad, Vector3, Vector4};

/// Maps OpenGL clip space (z in `[-1, 1]`) onto wgpu clip space (z in `[0, 1]`).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// World-space reference up vector used by [`look_at`].
pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Offset added to the up reference when forward is parallel to it.
const UP_PERTURBATION: Vector3<f32> = Vector3::new(0.0, 0.0, -0.001);

pub fn identity() -> Matrix4<f32> {
    Matrix4::one()
}

pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(x, y, z))
}

/// Right-handed rotation about the x axis, angle in radians.
pub fn rotation_x(angle: f32) -> Matrix4<f32> {
    Matrix4::from_angle_x(Rad(angle))
}

/// Right-handed rotation about the y axis, angle in radians.
pub fn rotation_y(angle: f32) -> Matrix4<f32> {
    Matrix4::from_angle_y(Rad(angle))
}

/// Right-handed rotation about the z axis, angle in radians.
pub fn rotation_z(angle: f32) -> Matrix4<f32> {
    Matrix4::from_angle_z(Rad(angle))
}

pub fn scale(s: f32) -> Matrix4<f32> {
    Matrix4::from_scale(s)
}

/// Perspective projection with a vertical field of view in degrees.
///
/// Near maps to device z = -1 and far to +1 after the perspective divide.
pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let a = Rad::from(Deg(fov_deg)).0;
    let d = 1.0 / (a / 2.0).tan();
    let b = (far + near) / (near - far);
    let c = 2.0 * far * near / (near - far);
    #[rustfmt::skip]
    let m = Matrix4::new(
        d / aspect, 0.0, 0.0,  0.0,
        0.0,        d,   0.0,  0.0,
        0.0,        0.0, b,   -1.0,
        0.0,        0.0, c,    0.0,
    );
    m
}

/// Orthographic projection from six clip-plane bounds.
pub fn orthographic(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Matrix4<f32> {
    #[rustfmt::skip]
    let m = Matrix4::new(
        2.0 / (right - left), 0.0, 0.0, 0.0,
        0.0, 2.0 / (top - bottom), 0.0, 0.0,
        0.0, 0.0, -2.0 / (far - near), 0.0,
        -(right + left) / (right - left),
        -(top + bottom) / (top - bottom),
        -(far + near) / (far - near),
        1.0,
    );
    m
}

/// Object-to-world matrix placing a node at `position` with its forward axis
/// (-z) pointing at `target`.
///
/// When forward is parallel to [`WORLD_UP`] the up reference is nudged by a
/// small offset so the basis stays well defined. Returns `None` if `target`
/// coincides with `position`.
pub fn look_at(position: Vector3<f32>, target: Vector3<f32>) -> Option<Matrix4<f32>> {
    let forward = target - position;
    if forward.magnitude2() < f32::EPSILON {
        return None;
    }
    let mut right = forward.cross(WORLD_UP);
    if right.magnitude() < 1e-6 {
        right = forward.cross(WORLD_UP + UP_PERTURBATION);
    }
    let up = right.cross(forward);

    let forward = forward.normalize();
    let right = right.normalize();
    let up = up.normalize();

    Some(Matrix4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        (-forward).extend(0.0),
        Vector4::new(position.x, position.y, position.z, 1.0),
    ))
}

/// Translation column of a homogeneous matrix.
pub fn position_of(m: &Matrix4<f32>) -> Vector3<f32> {
    m.w.truncate()
}

/// Forward direction (-z column) of a homogeneous matrix, normalized.
pub fn forward_of(m: &Matrix4<f32>) -> Vector3<f32> {
    let z = m.z.truncate();
    if z.magnitude2() < f32::EPSILON {
        return Vector3::new(0.0, 0.0, -1.0);
    }
    -z.normalize()
}

/// Independent position/rotation/scale state.
///
/// [`to_matrix`](Self::to_matrix) applies scale first, then rotation, then
/// translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: f32,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: 1.0,
        }
    }

    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::new()
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_scale(self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
