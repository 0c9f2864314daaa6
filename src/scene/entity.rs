use super::transform::Transform;
use crate::assets::{Material, Mesh, Model, Texture};
use crate::render::backend::{DrawCall, DrawTarget, RenderOptions, Renderable};
use glam::Mat4;
use std::sync::Arc;

/// What an object draws. Models carry their own textures; primitives use the object's.
#[derive(Debug, Clone, Default)]
pub enum Visual {
    Model(Arc<Model>),
    Primitive(Arc<Mesh>),
    #[default]
    Empty,
}

#[derive(Debug, Clone)]
pub struct GameObject {
    pub name: String,
    pub transform: Transform,
    pub visual: Visual,
    pub texture: Option<Arc<Texture>>,
    pub normal_map: Option<Arc<Texture>>,
    pub material: Option<Arc<Material>>,
}

impl GameObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            visual: Visual::Empty,
            texture: None,
            normal_map: None,
            material: None,
        }
    }

    pub fn with_primitive(name: impl Into<String>, mesh: Arc<Mesh>) -> Self {
        Self {
            visual: Visual::Primitive(mesh),
            ..Self::new(name)
        }
    }

    pub fn with_model(name: impl Into<String>, model: Arc<Model>) -> Self {
        Self {
            visual: Visual::Model(model),
            ..Self::new(name)
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    /// Every mesh this object rasterizes, for passes that only need geometry.
    pub fn meshes(&self) -> Vec<&Mesh> {
        match &self.visual {
            Visual::Model(model) => model.meshes().iter().map(|m| &m.mesh).collect(),
            Visual::Primitive(mesh) => vec![mesh.as_ref()],
            Visual::Empty => Vec::new(),
        }
    }

    pub fn draw(&self, target: &mut dyn DrawTarget, options: &RenderOptions) {
        self.render(
            target,
            self.model_matrix(),
            self.material.as_deref(),
            options,
        );
    }
}

impl Renderable for GameObject {
    fn render(
        &self,
        target: &mut dyn DrawTarget,
        model: Mat4,
        material: Option<&Material>,
        options: &RenderOptions,
    ) {
        match &self.visual {
            Visual::Model(loaded) => loaded.render(target, model, material, options),
            Visual::Primitive(mesh) => target.draw(&DrawCall {
                mesh,
                model,
                texture: self.texture.as_deref(),
                normal_map: if options.use_normal_map {
                    self.normal_map.as_deref()
                } else {
                    None
                },
                material,
            }),
            Visual::Empty => {}
        }
    }
}
