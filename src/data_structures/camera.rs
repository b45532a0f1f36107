//! Cameras: projection state plus a view matrix derived from a node transform.

use anyhow::bail;
use cgmath::{Matrix4, SquareMatrix};

use crate::math;

/// Six clip-plane bounds of an orthographic volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoBounds {
    pub const fn new(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
            near,
            far,
        }
    }

    /// Square bounds enclosing a cone of half-angle `angle_deg` out to `distance`.
    pub fn from_cone(angle_deg: f32, distance: f32) -> Self {
        let size = distance * angle_deg.to_radians().tan();
        Self::new(-size, size, -size, size, 0.0, distance)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.near >= self.far {
            bail!(
                "Degenerate orthographic bounds: near ({}) must be less than far ({}).",
                self.near,
                self.far
            );
        }
        if self.left == self.right || self.bottom == self.top {
            bail!("Degenerate orthographic bounds: zero width or height ({:?}).", self);
        }
        Ok(())
    }
}

impl Default for OrthoBounds {
    fn default() -> Self {
        Self::new(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective {
        fov_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic(OrthoBounds),
}

impl Projection {
    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            Projection::Perspective {
                fov_deg,
                aspect,
                near,
                far,
            } => {
                if near >= far || *near <= 0.0 {
                    bail!(
                        "Degenerate perspective: expected 0 < near < far, got near={near}, far={far}."
                    );
                }
                if *fov_deg <= 0.0 || *fov_deg >= 180.0 {
                    bail!("Perspective field of view must lie in (0, 180) degrees, got {fov_deg}.");
                }
                if *aspect <= 0.0 {
                    bail!("Perspective aspect ratio must be positive, got {aspect}.");
                }
                Ok(())
            }
            Projection::Orthographic(bounds) => bounds.validate(),
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        match *self {
            Projection::Perspective {
                fov_deg,
                aspect,
                near,
                far,
            } => math::perspective(fov_deg, aspect, near, far),
            Projection::Orthographic(b) => {
                math::orthographic(b.left, b.right, b.bottom, b.top, b.near, b.far)
            }
        }
    }
}

/// A camera node payload.
///
/// The view matrix is the inverse of the owning node's global matrix and is
/// refreshed by the renderer at the start of every pass that uses the camera.
#[derive(Clone, Debug)]
pub struct Camera {
    projection: Projection,
    view: Matrix4<f32>,
}

impl Camera {
    pub fn new(projection: Projection) -> anyhow::Result<Self> {
        projection.validate()?;
        Ok(Self {
            projection,
            view: Matrix4::identity(),
        })
    }

    pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> anyhow::Result<Self> {
        Self::new(Projection::Perspective {
            fov_deg,
            aspect,
            near,
            far,
        })
    }

    pub fn orthographic(bounds: OrthoBounds) -> anyhow::Result<Self> {
        Self::new(Projection::Orthographic(bounds))
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) -> anyhow::Result<()> {
        projection.validate()?;
        self.projection = projection;
        Ok(())
    }

    /// Updates the aspect ratio of a perspective camera; orthographic cameras ignore it.
    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            if new_aspect > 0.0 {
                *aspect = new_aspect;
            }
        }
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn update_view_matrix(&mut self, global: &Matrix4<f32>) {
        match global.invert() {
            Some(view) => self.view = view,
            None => log::warn!("Camera transform is singular; keeping the previous view matrix."),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective {
                fov_deg: 60.0,
                aspect: 1.0,
                near: 0.1,
                far: 1000.0,
            },
            view: Matrix4::identity(),
        }
    }
}
