use super::ray::ViewContext;
use crate::assets::{Mesh, Vertex};
use crate::scene::{LightKind, LightObject, LightRegistry};
use glam::{Mat4, Vec2, Vec3};

const MIN_ICON_SCALE: f32 = 0.1;
const MAX_ICON_SCALE: f32 = 3.0;

/// Camera-facing marker for one point or spot light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightIcon {
    /// Index into the scene's light list, which is also its pick-band slot.
    pub light: usize,
    pub kind: LightKind,
    pub model: Mat4,
    pub tint: [f32; 4],
}

pub fn icon_scale(position: Vec3, camera_position: Vec3, screen_factor: f32) -> f32 {
    let distance = position.distance(camera_position).max(0.1);
    (distance * screen_factor).clamp(MIN_ICON_SCALE, MAX_ICON_SCALE)
}

/// Billboard matrix: the quad keeps the camera's orientation so it always faces the viewer.
pub fn icon_model(position: Vec3, view: &ViewContext, screen_factor: f32) -> Mat4 {
    let scale = icon_scale(position, view.camera_position, screen_factor);
    Mat4::from_translation(position)
        * Mat4::from_mat3(view.camera_rotation())
        * Mat4::from_scale(Vec3::splat(scale))
}

pub fn icon_tint(kind: LightKind, selected: bool) -> [f32; 4] {
    let base: [f32; 3] = match kind {
        LightKind::Directional => [1.0, 0.92, 0.50],
        LightKind::Point => [0.45, 0.90, 1.0],
        LightKind::Spot => [0.95, 0.65, 0.40],
    };
    let boost: f32 = if selected { 1.35 } else { 1.0 };
    [
        (base[0] * boost).min(1.5),
        (base[1] * boost).min(1.5),
        (base[2] * boost).min(1.5),
        if selected { 1.0 } else { 0.88 },
    ]
}

/// Unit quad in XY facing +Z.
pub fn icon_quad() -> Mesh {
    let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
    let vertices = corners
        .iter()
        .map(|&(x, y)| Vertex::new(Vec3::new(x, y, 0.0), Vec2::new(x + 0.5, y + 0.5), Vec3::Z))
        .collect();
    Mesh::new(vertices, vec![0, 1, 2, 0, 2, 3])
}

/// Icons for every positional light; the directional light has none.
pub fn collect_icons(
    lights: &[LightObject],
    registry: &LightRegistry,
    view: &ViewContext,
    screen_factor: f32,
    selected: Option<usize>,
) -> Vec<LightIcon> {
    lights
        .iter()
        .enumerate()
        .filter_map(|(index, light)| {
            let position = light.light(registry)?.position()?;
            Some(LightIcon {
                light: index,
                kind: light.kind(),
                model: icon_model(position, view, screen_factor),
                tint: icon_tint(light.kind(), selected == Some(index)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_grows_with_distance_within_limits() {
        assert!((icon_scale(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO, 0.05) - 0.5).abs() < 1e-6);
        assert_eq!(icon_scale(Vec3::ZERO, Vec3::ZERO, 0.05), MIN_ICON_SCALE);
        assert_eq!(icon_scale(Vec3::new(0.0, 0.0, -500.0), Vec3::ZERO, 0.05), MAX_ICON_SCALE);
    }

    #[test]
    fn billboard_faces_the_camera() {
        let view = ViewContext::new(
            Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0),
            Mat4::look_at_rh(Vec3::new(4.0, 3.0, 6.0), Vec3::ZERO, Vec3::Y),
            Vec2::new(100.0, 100.0),
        );
        let model = icon_model(Vec3::new(1.0, 0.0, 0.0), &view, 0.05);
        let facing = model.transform_vector3(Vec3::Z).normalize();
        assert!(facing.dot(-view.forward()) > 0.9999);
    }

    #[test]
    fn selection_brightens_the_tint() {
        let idle = icon_tint(LightKind::Point, false);
        let selected = icon_tint(LightKind::Point, true);
        assert!(selected[3] > idle[3]);
        assert!(selected[0] > idle[0]);
        assert!((selected[2] - 1.35).abs() < 1e-6);
        assert!((idle[3] - 0.88).abs() < 1e-6);
    }
}
