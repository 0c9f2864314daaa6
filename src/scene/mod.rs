pub mod entity;
pub mod light;
pub mod light_object;
pub mod manager;
pub mod registry;
pub mod selection;
pub mod transform;

pub use entity::{GameObject, Visual};
pub use light::{
    Attenuation, DirectionalLight, LightBase, LightKind, LightMut, LightRef, PointLight, ShadowMap,
    SpotLight,
};
pub use light_object::LightObject;
pub use manager::SceneManager;
pub use registry::{LightHandle, LightRegistry, RegistryError};
pub use selection::Selection;
pub use transform::Transform;

use crate::config::EditorConfig;
use crate::render::backend::ShadowKind;
use glam::Vec3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("the scene already has its directional light")]
    DirectionalExists,
    #[error("light index {0} is out of range")]
    NoSuchLight(usize),
}

/// The warm, low "Sun" every scene starts with.
pub fn default_sun(config: &EditorConfig) -> DirectionalLight {
    let size = config.directional_shadow_size;
    DirectionalLight::new(
        LightBase::new(
            Vec3::new(1.0, 0.6, 0.3),
            0.6,
            0.7,
            ShadowMap::new(ShadowKind::Directional, size, size),
        ),
        Vec3::new(-10.0, -5.0, 20.0),
    )
}

pub fn default_point_light(config: &EditorConfig) -> PointLight {
    let size = config.omni_shadow_size;
    PointLight::new(
        LightBase::new(Vec3::ONE, 0.0, 0.4, ShadowMap::new(ShadowKind::Omni, size, size)),
        Vec3::new(0.0, 5.0, 0.0),
        Attenuation::default(),
        config.shadow_near,
        config.shadow_far,
    )
}

pub fn default_spot_light(config: &EditorConfig) -> SpotLight {
    let size = config.omni_shadow_size;
    let point = PointLight::new(
        LightBase::new(Vec3::ONE, 0.0, 2.0, ShadowMap::new(ShadowKind::Omni, size, size)),
        Vec3::new(0.0, 8.0, 0.0),
        Attenuation {
            constant: 1.0,
            linear: 0.01,
            exponent: 0.01,
        },
        config.shadow_near,
        config.shadow_far,
    );
    SpotLight::new(point, Vec3::NEG_Y, 20.0)
}
