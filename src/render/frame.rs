//! One frame of rendering: shadow passes first, then the lit main pass and overlays.

use super::backend::{RenderBackend, RenderOptions};
use super::ray::ViewContext;
use crate::scene::{LightRegistry, PointLight, SceneManager};

pub const DIRECTIONAL_SHADOW_UNIT: u32 = 3;
/// Omni maps take consecutive units from here: point lights first, then spot lights.
pub const OMNI_SHADOW_UNIT_START: u32 = 4;

pub fn render_frame<B: RenderBackend>(
    backend: &mut B,
    scene: &SceneManager,
    registry: &mut LightRegistry,
    view: &ViewContext,
) {
    registry.init_shadow_maps(backend);
    directional_shadow_pass(backend, scene, registry);
    for light in registry.points() {
        omni_shadow_pass(backend, scene, light);
    }
    for light in registry.spots() {
        omni_shadow_pass(backend, scene, &light.point);
    }
    main_pass(backend, scene, registry, view);
}

pub fn directional_shadow_pass<B: RenderBackend>(
    backend: &mut B,
    scene: &SceneManager,
    registry: &LightRegistry,
) {
    let light = registry.directional();
    if !light.base.shadow.begin_write(backend) {
        return;
    }
    backend.set_mat4("directionalLightTransform", &light.light_transform());
    scene.render_all(backend, &RenderOptions::SIMPLIFIED);
    backend.end_shadow_write();
}

/// Renders depth into all six faces of the light's cube map in one pass.
pub fn omni_shadow_pass<B: RenderBackend>(backend: &mut B, scene: &SceneManager, light: &PointLight) {
    if !light.base.shadow.begin_write(backend) {
        return;
    }
    backend.set_vec3("lightPos", light.position);
    backend.set_f32("farPlane", light.far_plane);
    for (face, transform) in light.face_transforms().iter().enumerate() {
        backend.set_mat4(&format!("lightMatrices[{face}]"), transform);
    }
    scene.render_all(backend, &RenderOptions::SIMPLIFIED);
    backend.end_shadow_write();
}

pub fn main_pass<B: RenderBackend>(
    backend: &mut B,
    scene: &SceneManager,
    registry: &LightRegistry,
    view: &ViewContext,
) {
    backend.set_mat4("projection", &view.projection);
    backend.set_mat4("view", &view.view);
    backend.set_vec3("eyePosition", view.camera_position);

    let directional = registry.directional();
    directional.upload(backend);
    backend.set_mat4("directionalLightTransform", &directional.light_transform());
    if directional.base.shadow.bind_for_read(backend, DIRECTIONAL_SHADOW_UNIT) {
        backend.set_i32("directionalShadowMap", DIRECTIONAL_SHADOW_UNIT as i32);
    }

    backend.set_i32("pointLightCount", registry.point_count() as i32);
    for (index, light) in registry.points().enumerate() {
        light.upload(backend, index);
    }
    backend.set_i32("spotLightCount", registry.spot_count() as i32);
    for (index, light) in registry.spots().enumerate() {
        light.upload(backend, index);
    }

    let omni = registry
        .points()
        .chain(registry.spots().map(|spot| &spot.point));
    for (slot, light) in omni.enumerate() {
        let unit = OMNI_SHADOW_UNIT_START + slot as u32;
        if light.base.shadow.bind_for_read(backend, unit) {
            backend.set_i32(&format!("omniShadowMaps[{slot}].shadowMap"), unit as i32);
            backend.set_f32(&format!("omniShadowMaps[{slot}].farPlane"), light.far_plane);
        }
    }

    scene.render_all(backend, &RenderOptions::FULL);
    scene.render_overlays(backend, registry, view);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{PrimitiveKind, ResourceManager};
    use crate::config::EditorConfig;
    use crate::render::software::{ShadowOp, SoftwareBackend};
    use crate::scene::{default_sun, LightKind};
    use glam::{Mat4, Vec2, Vec3};
    use std::path::PathBuf;

    #[test]
    fn shadow_passes_run_before_the_main_pass_and_bind_their_units() {
        let config = EditorConfig {
            assets_root: PathBuf::from("no-such-assets-root"),
            ..EditorConfig::default()
        };
        let resources = ResourceManager::new(&config);
        let mut registry = LightRegistry::new(default_sun(&config), 3, 3);
        let mut scene = SceneManager::with_default_scene(&config, &resources);
        scene.create_game_object(PrimitiveKind::Cube, &resources);
        scene.create_light(LightKind::Point, &mut registry).expect("point");
        scene.create_light(LightKind::Spot, &mut registry).expect("spot");
        scene.clear_selection();

        let view = ViewContext::new(
            Mat4::perspective_rh_gl(1.0, 1.5, 0.1, 1000.0),
            Mat4::look_at_rh(Vec3::new(0.0, 4.0, 12.0), Vec3::ZERO, Vec3::Y),
            Vec2::new(1200.0, 800.0),
        );
        let mut backend = SoftwareBackend::new();
        render_frame(&mut backend, &scene, &mut registry, &view);

        let ops = backend.shadow_ops();
        let creates = ops.iter().filter(|op| matches!(op, ShadowOp::Create(..))).count();
        assert_eq!(creates, 3);
        let writes = ops.iter().filter(|op| matches!(op, ShadowOp::BeginWrite(_))).count();
        assert_eq!(writes, 3);
        let units: Vec<u32> = ops
            .iter()
            .filter_map(|op| match op {
                ShadowOp::Bind { unit, .. } => Some(*unit),
                _ => None,
            })
            .collect();
        assert_eq!(units, vec![3, 4, 5]);
        let last_write = ops.iter().rposition(|op| *op == ShadowOp::EndWrite);
        let first_bind = ops.iter().position(|op| matches!(op, ShadowOp::Bind { .. }));
        assert!(last_write < first_bind);

        // Two objects drawn in three shadow passes plus the main pass.
        let draws = backend.draws();
        assert_eq!(draws.len(), 8);
        assert!(draws[..6].iter().all(|draw| !draw.normal_mapped));
        assert_eq!(backend.int("pointLightCount"), Some(1));
        assert_eq!(backend.int("spotLightCount"), Some(1));
        assert_eq!(backend.int("omniShadowMaps[1].shadowMap"), Some(5));
        assert_eq!(backend.float("omniShadowMaps[0].farPlane"), Some(config.shadow_far));
        assert!(backend.vec3("spotLights[0].direction").is_some());
        assert!(backend.float("material.shininess").is_some());
        // Two light icons, no gizmo without a selection.
        assert_eq!(backend.overlays().len(), 2);
    }

    #[test]
    fn lights_without_shadow_maps_skip_their_passes() {
        let config = EditorConfig {
            assets_root: PathBuf::from("no-such-assets-root"),
            ..EditorConfig::default()
        };
        let resources = ResourceManager::new(&config);
        let registry = LightRegistry::new(default_sun(&config), 3, 3);
        let scene = SceneManager::with_default_scene(&config, &resources);
        let view = ViewContext::new(
            Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0),
            Mat4::look_at_rh(Vec3::new(0.0, 4.0, 12.0), Vec3::ZERO, Vec3::Y),
            Vec2::new(100.0, 100.0),
        );
        let mut backend = SoftwareBackend::new();
        directional_shadow_pass(&mut backend, &scene, &registry);
        main_pass(&mut backend, &scene, &registry, &view);

        assert!(backend.shadow_ops().is_empty());
        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.int("directionalShadowMap"), None);
        assert_eq!(backend.int("pointLightCount"), Some(0));
        assert!(backend.vec3("directionalLight.direction").is_some());
        assert_eq!(
            backend.mat4("directionalLightTransform"),
            Some(registry.directional().light_transform())
        );
    }
}
