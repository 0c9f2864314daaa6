use super::mesh::{Mesh, Vertex};
use super::texture::Texture;
use super::{AssetError, Material};
use crate::render::backend::{DrawCall, DrawTarget, RenderOptions, Renderable};
use glam::{Mat4, Vec2, Vec3};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ModelMesh {
    pub mesh: Mesh,
    pub material_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ModelMaterial {
    pub name: String,
    pub diffuse: Arc<Texture>,
    pub normal_map: Option<Arc<Texture>>,
}

/// Multi-mesh OBJ model with per-material textures.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    meshes: Vec<ModelMesh>,
    materials: Vec<ModelMaterial>,
    bounds: (Vec3, Vec3),
}

impl Model {
    /// Loads an OBJ file. Diffuse textures resolve by file name under `textures_dir`.
    pub fn load(path: &Path, textures_dir: &Path) -> Result<Self, AssetError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| AssetError::Model {
            path: path.display().to_string(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("No materials for {}: {err}", path.display());
            Vec::new()
        });

        let materials: Vec<ModelMaterial> = materials
            .iter()
            .map(|mtl| load_material(mtl, textures_dir))
            .collect();

        let meshes: Vec<ModelMesh> = models
            .iter()
            .map(|model| ModelMesh {
                mesh: convert_mesh(&model.mesh),
                material_index: model
                    .mesh
                    .material_id
                    .filter(|&index| index < materials.len()),
            })
            .filter(|model_mesh| !model_mesh.mesh.is_empty())
            .collect();

        let bounds = meshes
            .iter()
            .filter_map(|model_mesh| model_mesh.mesh.bounds())
            .reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
            .unwrap_or((Vec3::ZERO, Vec3::ZERO));

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "Model".to_string());

        log::info!(
            "Loaded model {} ({} meshes, {} materials)",
            path.display(),
            meshes.len(),
            materials.len()
        );

        Ok(Self {
            name,
            meshes,
            materials,
            bounds,
        })
    }

    pub fn from_parts(name: &str, meshes: Vec<ModelMesh>, materials: Vec<ModelMaterial>) -> Self {
        let bounds = meshes
            .iter()
            .filter_map(|model_mesh| model_mesh.mesh.bounds())
            .reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
            .unwrap_or((Vec3::ZERO, Vec3::ZERO));
        Self {
            name: name.to_string(),
            meshes,
            materials,
            bounds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[ModelMesh] {
        &self.meshes
    }

    pub fn materials(&self) -> &[ModelMaterial] {
        &self.materials
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.bounds
    }
}

impl Renderable for Model {
    fn render(
        &self,
        target: &mut dyn DrawTarget,
        model: Mat4,
        material: Option<&Material>,
        options: &RenderOptions,
    ) {
        for model_mesh in &self.meshes {
            let model_material = model_mesh
                .material_index
                .and_then(|index| self.materials.get(index));
            target.draw(&DrawCall {
                mesh: &model_mesh.mesh,
                model,
                texture: model_material.map(|m| m.diffuse.as_ref()),
                normal_map: if options.use_normal_map {
                    model_material.and_then(|m| m.normal_map.as_deref())
                } else {
                    None
                },
                material,
            });
        }
    }
}

fn load_material(mtl: &tobj::Material, textures_dir: &Path) -> ModelMaterial {
    let diffuse_path = mtl
        .diffuse_texture
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| textures_dir.join(file_name_of(name)));

    let Some(diffuse_path) = diffuse_path else {
        return ModelMaterial {
            name: mtl.name.clone(),
            diffuse: Arc::new(Texture::placeholder()),
            normal_map: None,
        };
    };

    let diffuse = Arc::new(Texture::load_or_placeholder(&diffuse_path));
    let normal_path = mtl
        .normal_texture
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| textures_dir.join(file_name_of(name)))
        .unwrap_or_else(|| normal_map_path(&diffuse_path));

    let normal_map = if normal_path.exists() {
        match Texture::load(&normal_path) {
            Ok(texture) => Some(Arc::new(texture)),
            Err(err) => {
                log::warn!("{err}; normal mapping disabled for {}", mtl.name);
                None
            }
        }
    } else {
        None
    };

    ModelMaterial {
        name: mtl.name.clone(),
        diffuse,
        normal_map,
    }
}

/// Strips any directories an exporter baked into a texture reference.
fn file_name_of(reference: &str) -> &str {
    reference
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(reference)
}

/// `bricks.png` -> `bricks_normal.png`, in the same directory.
pub fn normal_map_path(diffuse: &Path) -> PathBuf {
    let stem = diffuse
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match diffuse.extension() {
        Some(ext) => format!("{stem}_normal.{}", ext.to_string_lossy()),
        None => format!("{stem}_normal"),
    };
    diffuse.with_file_name(file_name)
}

fn convert_mesh(source: &tobj::Mesh) -> Mesh {
    let vertex_count = source.positions.len() / 3;
    let has_normals = source.normals.len() == source.positions.len();
    let has_uvs = source.texcoords.len() / 2 == vertex_count;

    let vertices = (0..vertex_count)
        .map(|i| {
            let position = Vec3::new(
                source.positions[3 * i],
                source.positions[3 * i + 1],
                source.positions[3 * i + 2],
            );
            let uv = if has_uvs {
                Vec2::new(source.texcoords[2 * i], 1.0 - source.texcoords[2 * i + 1])
            } else {
                Vec2::ZERO
            };
            let normal = if has_normals {
                Vec3::new(
                    source.normals[3 * i],
                    source.normals[3 * i + 1],
                    source.normals[3 * i + 2],
                )
            } else {
                Vec3::ZERO
            };
            Vertex::new(position, uv, normal)
        })
        .collect();

    let mut mesh = Mesh::new(vertices, source.indices.clone());
    if !has_normals {
        mesh.compute_smooth_normals();
    }
    mesh.compute_tangents();
    mesh
}
