pub mod index;
pub mod mesh;
pub mod model;
pub mod texture;

pub use index::{AssetEntry, AssetIndex, AssetKind};
pub use mesh::{Mesh, PrimitiveKind, Vertex};
pub use model::Model;
pub use texture::Texture;

use crate::config::EditorConfig;
use crate::render::backend::UniformSink;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load model {path}: {source}")]
    Model {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
}

/// Specular response shared by every object that references it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub specular_intensity: f32,
    pub shininess: f32,
}

impl Material {
    pub const SHINY: Self = Self::new(1.0, 32.0);
    pub const DULL: Self = Self::new(0.3, 4.0);
    pub const PLAIN: Self = Self::new(0.1, 32.0);

    pub const fn new(specular_intensity: f32, shininess: f32) -> Self {
        Self {
            specular_intensity,
            shininess,
        }
    }

    pub fn upload(&self, sink: &mut dyn UniformSink) {
        sink.set_f32("material.specularIntensity", self.specular_intensity);
        sink.set_f32("material.shininess", self.shininess);
    }
}

/// Owns every mesh, texture, model and material; scene objects hold `Arc`s into it.
pub struct ResourceManager {
    textures_dir: PathBuf,
    models_dir: PathBuf,
    textures: HashMap<PathBuf, Arc<Texture>>,
    models: HashMap<PathBuf, Arc<Model>>,
    primitives: HashMap<PrimitiveKind, Arc<Mesh>>,
    materials: Vec<(String, Arc<Material>)>,
    default_texture: Arc<Texture>,
}

impl ResourceManager {
    pub fn new(config: &EditorConfig) -> Self {
        let primitives = PrimitiveKind::ALL
            .iter()
            .map(|&kind| (kind, Arc::new(kind.build())))
            .collect();
        let materials = vec![
            ("Shiny".to_string(), Arc::new(Material::SHINY)),
            ("Dull".to_string(), Arc::new(Material::DULL)),
            ("Plain".to_string(), Arc::new(Material::PLAIN)),
        ];
        let textures_dir = config.textures_dir();
        let default_texture = Arc::new(Texture::load_or_placeholder(&textures_dir.join("plain.png")));

        Self {
            textures_dir,
            models_dir: config.models_dir(),
            textures: HashMap::new(),
            models: HashMap::new(),
            primitives,
            materials,
            default_texture,
        }
    }

    pub fn textures_dir(&self) -> &Path {
        &self.textures_dir
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn primitive(&self, kind: PrimitiveKind) -> Arc<Mesh> {
        match self.primitives.get(&kind) {
            Some(mesh) => Arc::clone(mesh),
            None => Arc::new(kind.build()),
        }
    }

    pub fn default_texture(&self) -> Arc<Texture> {
        Arc::clone(&self.default_texture)
    }

    pub fn default_material(&self) -> Arc<Material> {
        self.material("Plain")
            .unwrap_or_else(|| Arc::new(Material::PLAIN))
    }

    pub fn material(&self, name: &str) -> Option<Arc<Material>> {
        self.materials
            .iter()
            .find(|(material_name, _)| material_name == name)
            .map(|(_, material)| Arc::clone(material))
    }

    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|(name, _)| name.as_str())
    }

    /// Cached load; failures yield the placeholder so callers always get a texture.
    pub fn texture(&mut self, path: &Path) -> Arc<Texture> {
        if let Some(texture) = self.textures.get(path) {
            return Arc::clone(texture);
        }
        let texture = Arc::new(Texture::load_or_placeholder(path));
        if !texture.is_placeholder() {
            self.textures.insert(path.to_path_buf(), Arc::clone(&texture));
        }
        texture
    }

    /// Looks for `<stem>_normal.<ext>` next to `diffuse`.
    pub fn normal_map_for(&mut self, diffuse: &Path) -> Option<Arc<Texture>> {
        let candidate = model::normal_map_path(diffuse);
        if !candidate.exists() {
            return None;
        }
        let texture = self.texture(&candidate);
        (!texture.is_placeholder()).then_some(texture)
    }

    pub fn model(&mut self, path: &Path) -> Result<Arc<Model>, AssetError> {
        if let Some(model) = self.models.get(path) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(Model::load(path, &self.textures_dir)?);
        self.models.insert(path.to_path_buf(), Arc::clone(&model));
        Ok(model)
    }

    pub fn loaded_texture_count(&self) -> usize {
        self.textures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Material, PrimitiveKind, ResourceManager};
    use crate::config::EditorConfig;
    use std::sync::Arc;

    fn manager() -> ResourceManager {
        let config = EditorConfig {
            assets_root: std::env::temp_dir().join("stagehand_missing_assets_root"),
            ..EditorConfig::default()
        };
        ResourceManager::new(&config)
    }

    #[test]
    fn primitives_are_shared() {
        let resources = manager();
        let a = resources.primitive(PrimitiveKind::Cube);
        let b = resources.primitive(PrimitiveKind::Cube);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.vertices().len(), 24);
    }

    #[test]
    fn material_presets_resolve_by_name() {
        let resources = manager();
        assert_eq!(*resources.material("Shiny").expect("shiny"), Material::new(1.0, 32.0));
        assert_eq!(*resources.material("Dull").expect("dull"), Material::new(0.3, 4.0));
        assert_eq!(*resources.default_material(), Material::PLAIN);
        assert!(resources.material("Chrome").is_none());
    }

    #[test]
    fn failed_texture_is_not_cached() {
        let mut resources = manager();
        let missing = resources.textures_dir().join("absent.png");
        assert!(resources.texture(&missing).is_placeholder());
        assert_eq!(resources.loaded_texture_count(), 0);
        assert!(resources.default_texture().is_placeholder());
        assert!(resources.normal_map_for(&missing).is_none());
    }
}
