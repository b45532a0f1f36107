//! Loading of external files: raw bytes, textures and OBJ meshes.
//!
//! Relative paths are resolved against `./assets`; absolute paths are used
//! as given.

use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};

use crate::{
    context::Context,
    data_structures::{geometry::MeshGroup, texture::Texture},
};

pub fn asset_path(file_name: &str) -> PathBuf {
    Path::new("./").join("assets").join(file_name)
}

pub async fn load_string(file_name: &str) -> Result<String> {
    let path = asset_path(file_name);
    std::fs::read_to_string(&path).with_context(|| format!("Cannot read {}", path.display()))
}

pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    let path = asset_path(file_name);
    std::fs::read(&path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Decodes an image file into an sRGB texture with a repeating, filtering
/// sampler.
pub fn load_texture(ctx: &Context, file_name: &str) -> Result<Texture> {
    let path = asset_path(file_name);
    let bytes = std::fs::read(&path).with_context(|| format!("Cannot read {}", path.display()))?;
    Texture::from_bytes(&ctx.device, &ctx.queue, &bytes, file_name, None)
        .with_context(|| format!("Cannot decode {}", path.display()))
}

/// Loads an OBJ file as one [`MeshGroup`] per object/group, triangulated and
/// expanded to one entry per triangle corner.
///
/// Texture `v` is flipped to the wgpu origin. Groups without texture
/// coordinates get `[0, 0]`, groups without normals get `[0, 0, 1]`; both
/// are reported.
pub async fn load_obj_groups(file_name: &str) -> Result<Vec<MeshGroup>> {
    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    // Only the geometry is used; material libraries are parsed for
    // validation and then dropped.
    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            match load_string(&p).await {
                Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                Err(e) => {
                    log::warn!("Material library {p} referenced by an OBJ file is unavailable: {e:#}");
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .await
    .with_context(|| format!("Cannot parse {file_name}"))?;

    Ok(models
        .iter()
        .map(|model| obj_group(file_name, model))
        .collect())
}

fn obj_group(file_name: &str, model: &tobj::Model) -> MeshGroup {
    let mesh = &model.mesh;
    let has_uvs = !mesh.texcoords.is_empty();
    let has_normals = !mesh.normals.is_empty();
    if !has_uvs {
        log::warn!(
            "Group {} of {file_name} has no texture coordinates; using [0, 0].",
            model.name
        );
    }
    if !has_normals {
        log::warn!(
            "Group {} of {file_name} has no normals; using [0, 0, 1].",
            model.name
        );
    }

    let mut group = MeshGroup {
        name: model.name.clone(),
        ..Default::default()
    };
    for index in &mesh.indices {
        let i = *index as usize;
        let get = |data: &[f32], at: usize, fallback: f32| data.get(at).copied().unwrap_or(fallback);
        group.positions.push([
            get(&mesh.positions, i * 3, 0.0),
            get(&mesh.positions, i * 3 + 1, 0.0),
            get(&mesh.positions, i * 3 + 2, 0.0),
        ]);
        group.uvs.push(if has_uvs {
            [
                get(&mesh.texcoords, i * 2, 0.0),
                1.0 - get(&mesh.texcoords, i * 2 + 1, 1.0),
            ]
        } else {
            [0.0, 0.0]
        });
        group.normals.push(if has_normals {
            [
                get(&mesh.normals, i * 3, 0.0),
                get(&mesh.normals, i * 3 + 1, 0.0),
                get(&mesh.normals, i * 3 + 2, 1.0),
            ]
        } else {
            [0.0, 0.0, 1.0]
        });
    }
    group
}
