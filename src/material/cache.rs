//! Shares materials and textures between meshes that ask for the same thing.

use std::collections::HashMap;

use anyhow::{Result, bail};
use slotmap::SlotMap;

use crate::{
    context::Context,
    data_structures::texture::Texture,
    material::{Material, MaterialId, library},
    resources,
};

/// Material types the cache knows how to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialType {
    Surface,
    Texture,
    Lambert,
    Phong,
    Transparent,
    Emissive,
}

impl MaterialType {
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "surface" => MaterialType::Surface,
            "texture" => MaterialType::Texture,
            "lambert" => MaterialType::Lambert,
            "phong" => MaterialType::Phong,
            "transparent" => MaterialType::Transparent,
            "emissive" => MaterialType::Emissive,
            other => bail!("Unknown material type {other:?}."),
        })
    }
}

/// Properties a cached material is built from. Two requests with equal
/// properties share one material.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialProps {
    pub color: [f32; 3],
    pub opacity: f32,
    /// Loaded through the texture cache; required by `"texture"`.
    pub texture: Option<String>,
    pub number_of_lights: usize,
    pub use_shadow: bool,
}

impl Default for MaterialProps {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 0.1,
            texture: None,
            number_of_lights: 1,
            use_shadow: false,
        }
    }
}

/// Cache key of a material request.
pub fn material_key(kind: MaterialType, props: &MaterialProps) -> String {
    format!("{kind:?}_{props:?}")
}

#[derive(Debug, Default)]
pub struct MaterialCache {
    materials: HashMap<String, MaterialId>,
    textures: HashMap<String, Texture>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the material for `type_name` and `props`, building and storing
    /// it in `materials` on first request.
    ///
    /// An unknown type name is an error, as is a `"texture"` request without
    /// a texture path.
    pub fn material(
        &mut self,
        ctx: &Context,
        materials: &mut SlotMap<MaterialId, Material>,
        type_name: &str,
        props: &MaterialProps,
    ) -> Result<MaterialId> {
        let kind = MaterialType::from_name(type_name)?;
        let key = material_key(kind, props);
        if let Some(id) = self.materials.get(&key) {
            if materials.contains_key(*id) {
                return Ok(*id);
            }
        }

        let texture = match &props.texture {
            Some(path) => Some(self.texture(ctx, path)?),
            None => None,
        };
        let lit = library::LitOptions {
            number_of_lights: props.number_of_lights,
            base_color: props.color,
            texture: texture.clone(),
            use_shadow: props.use_shadow,
            ..Default::default()
        };
        let material = match kind {
            MaterialType::Surface => library::surface(props.color, texture),
            MaterialType::Texture => {
                let Some(texture) = texture else {
                    bail!("Material type \"texture\" needs a texture path.");
                };
                let mut material = library::texture(texture);
                material.set("baseColor", props.color);
                material
            }
            MaterialType::Lambert => library::lambert(lit),
            MaterialType::Phong => library::phong(lit),
            MaterialType::Transparent => library::transparent(props.color, props.opacity),
            MaterialType::Emissive => library::emissive(props.color, texture),
        };
        let id = materials.insert(material);
        self.materials.insert(key, id);
        Ok(id)
    }

    /// Loads a texture once per path.
    pub fn texture(&mut self, ctx: &Context, path: &str) -> Result<Texture> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }
        let texture = resources::load_texture(ctx, path)?;
        self.textures.insert(path.to_string(), texture.clone());
        Ok(texture)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn clear(&mut self) {
        self.materials.clear();
        self.textures.clear();
    }
}
