//! CPU-side vertex data.
//!
//! A [`Geometry`] maps attribute names to flat `f32` arrays that all describe
//! the same number of vertices. The GPU copy is made by the owning
//! [`Mesh`](crate::data_structures::mesh::Mesh) the first time it is drawn.
//!
//! Texture coordinates produced by the builders in this module use the wgpu
//! texture origin: `v = 0` is the top row of an image.

use std::{collections::BTreeMap, f32::consts::PI};

/// Attribute names shared by geometry builders and material vertex inputs.
pub mod attribute {
    pub const POSITION: &str = "vertexPosition";
    pub const UV: &str = "vertexUV";
    pub const NORMAL: &str = "vertexNormal";
    pub const COLOR: &str = "vertexColor";
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    /// Floats per vertex, 1 to 4.
    pub components: u32,
    pub data: Vec<f32>,
}

impl Attribute {
    pub fn vertex_len(&self) -> usize {
        self.data.len() / self.components.max(1) as usize
    }

    pub fn format(&self) -> wgpu::VertexFormat {
        vertex_format(self.components)
    }
}

pub(crate) fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// Fill value used when an attribute is missing or has the wrong length.
///
/// Normals default to +z, colors to white, anything else to zero.
pub fn default_value(name: &str, components: u32) -> Vec<f32> {
    let mut value = vec![0.0; components as usize];
    match name {
        attribute::NORMAL if components >= 3 => value[2] = 1.0,
        attribute::COLOR => value.iter_mut().for_each(|c| *c = 1.0),
        _ => {}
    }
    value
}

/// One named surface of a loaded mesh file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGroup {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
}

#[derive(Clone, Debug, Default)]
pub struct Geometry {
    attributes: BTreeMap<String, Attribute>,
    vertex_count: Option<usize>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches (or replaces) an attribute.
    ///
    /// Once the vertex count is fixed, data of the wrong length is replaced
    /// with a default-filled array of the right length and a warning is logged.
    pub fn add_attribute(&mut self, name: &str, components: u32, data: Vec<f32>) {
        if !(1..=4).contains(&components) {
            log::warn!("Ignoring attribute {name}: {components} components per vertex is not supported.");
            return;
        }
        let mut attr = Attribute { components, data };
        if attr.data.len() % components as usize != 0 {
            log::warn!(
                "Attribute {name} has {} floats, not a multiple of {components}.",
                attr.data.len()
            );
            attr.data.truncate(attr.vertex_len() * components as usize);
        }
        if let Some(count) = self.vertex_count {
            conform(name, &mut attr, count);
        }
        self.attributes.insert(name.to_string(), attr);
    }

    pub fn add_vec2(&mut self, name: &str, data: &[[f32; 2]]) {
        self.add_attribute(name, 2, data.iter().flatten().copied().collect());
    }

    pub fn add_vec3(&mut self, name: &str, data: &[[f32; 3]]) {
        self.add_attribute(name, 3, data.iter().flatten().copied().collect());
    }

    /// Fixes the vertex count and returns it.
    ///
    /// The position attribute (or the first attribute if there is none) is the
    /// reference; other attributes of a different length are default-filled.
    /// Later calls return the count fixed by the first one.
    pub fn count_vertices(&mut self) -> usize {
        if let Some(count) = self.vertex_count {
            return count;
        }
        let count = self
            .attributes
            .get(attribute::POSITION)
            .or_else(|| self.attributes.values().next())
            .map_or(0, Attribute::vertex_len);
        for (name, attr) in self.attributes.iter_mut() {
            conform(name, attr, count);
        }
        self.vertex_count = Some(count);
        count
    }

    /// The fixed vertex count, or 0 before [`count_vertices`](Self::count_vertices).
    pub fn vertex_count(&self) -> usize {
        self.vertex_count.unwrap_or(0)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn from_group(group: &MeshGroup) -> Self {
        let mut geometry = Self::new();
        geometry.add_vec3(attribute::POSITION, &group.positions);
        geometry.count_vertices();
        geometry.add_vec2(attribute::UV, &group.uvs);
        geometry.add_vec3(attribute::NORMAL, &group.normals);
        geometry
    }

    /// Flat rectangle in the xy plane, centered on the origin, facing +z.
    pub fn rectangle(width: f32, height: f32) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        let p = [[-w, -h, 0.0], [w, -h, 0.0], [-w, h, 0.0], [w, h, 0.0]];
        let t = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
        let order = [0, 1, 3, 0, 3, 2];

        let mut geometry = Self::new();
        geometry.add_vec3(attribute::POSITION, &order.map(|i| p[i]));
        geometry.add_vec2(attribute::UV, &order.map(|i| t[i]));
        geometry.add_vec3(attribute::NORMAL, &[[0.0, 0.0, 1.0]; 6]);
        geometry.count_vertices();
        geometry
    }

    /// Two triangles covering clip space `[-1, 1]²`, with 2D positions.
    pub fn fullscreen_quad() -> Self {
        let p = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];
        let t = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
        let order = [0, 1, 3, 0, 3, 2];

        let mut geometry = Self::new();
        geometry.add_vec2(attribute::POSITION, &order.map(|i| p[i]));
        geometry.add_vec2(attribute::UV, &order.map(|i| t[i]));
        geometry.count_vertices();
        geometry
    }

    /// Axis-aligned box centered on the origin; each face gets its own color.
    pub fn box_geometry(width: f32, height: f32, depth: f32) -> Self {
        let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
        let c = [
            [-x, -y, -z],
            [x, -y, -z],
            [-x, y, -z],
            [x, y, -z],
            [-x, -y, z],
            [x, -y, z],
            [-x, y, z],
            [x, y, z],
        ];
        // Corners of each face, counter-clockwise seen from outside:
        // bottom-left, bottom-right, top-left, top-right.
        let faces: [([usize; 4], [f32; 3], [f32; 3]); 6] = [
            ([5, 1, 7, 3], [1.0, 0.0, 0.0], [1.0, 0.5, 0.5]),
            ([0, 4, 2, 6], [-1.0, 0.0, 0.0], [0.5, 0.0, 0.0]),
            ([6, 7, 2, 3], [0.0, 1.0, 0.0], [0.5, 1.0, 0.5]),
            ([0, 1, 4, 5], [0.0, -1.0, 0.0], [0.0, 0.5, 0.0]),
            ([4, 5, 6, 7], [0.0, 0.0, 1.0], [0.5, 0.5, 1.0]),
            ([1, 0, 3, 2], [0.0, 0.0, -1.0], [0.0, 0.0, 0.5]),
        ];
        let t = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
        let order = [0, 1, 3, 0, 3, 2];

        let mut positions = Vec::with_capacity(36);
        let mut uvs = Vec::with_capacity(36);
        let mut normals = Vec::with_capacity(36);
        let mut colors = Vec::with_capacity(36);
        for (corners, normal, color) in faces {
            for i in order {
                positions.push(c[corners[i]]);
                uvs.push(t[i]);
                normals.push(normal);
                colors.push(color);
            }
        }

        let mut geometry = Self::new();
        geometry.add_vec3(attribute::POSITION, &positions);
        geometry.add_vec2(attribute::UV, &uvs);
        geometry.add_vec3(attribute::NORMAL, &normals);
        geometry.add_vec3(attribute::COLOR, &colors);
        geometry.count_vertices();
        geometry
    }

    /// UV sphere made of `radius_segments` slices and `height_segments` stacks.
    pub fn sphere(radius: f32, radius_segments: u32, height_segments: u32) -> Self {
        let us = radius_segments.max(3);
        let vs = height_segments.max(2);
        let point = |i: u32, j: u32| -> ([f32; 3], [f32; 3], [f32; 2]) {
            let u = 2.0 * PI * i as f32 / us as f32;
            let v = -PI / 2.0 + PI * j as f32 / vs as f32;
            let n = [u.sin() * v.cos(), v.sin(), u.cos() * v.cos()];
            let p = [radius * n[0], radius * n[1], radius * n[2]];
            let t = [i as f32 / us as f32, 1.0 - j as f32 / vs as f32];
            (p, n, t)
        };

        let count = (us * vs * 6) as usize;
        let mut positions = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);
        for i in 0..us {
            for j in 0..vs {
                let quad = [point(i, j), point(i + 1, j), point(i + 1, j + 1), point(i, j + 1)];
                for k in [0, 1, 2, 0, 2, 3] {
                    let (p, n, t) = quad[k];
                    positions.push(p);
                    normals.push(n);
                    uvs.push(t);
                }
            }
        }

        let mut geometry = Self::new();
        geometry.add_vec3(attribute::POSITION, &positions);
        geometry.add_vec2(attribute::UV, &uvs);
        geometry.add_vec3(attribute::NORMAL, &normals);
        geometry.count_vertices();
        geometry
    }
}

fn conform(name: &str, attr: &mut Attribute, count: usize) {
    let len = attr.vertex_len();
    if len == count {
        return;
    }
    log::warn!(
        "Attribute {name} describes {len} vertices but the geometry has {count}; using defaults."
    );
    let fill = default_value(name, attr.components);
    attr.data = fill.iter().copied().cycle().take(count * fill.len()).collect();
}
