use super::ray::ViewContext;
use crate::config::EditorConfig;
use glam::{Mat4, Vec2, Vec3};

const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraMovement {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub aim_left: bool,
    pub aim_right: bool,
    pub aim_up: bool,
    pub aim_down: bool,
}

/// Yaw/pitch fly camera. Angles are radians; yaw 0 looks down +X.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::looking_at(Vec3::new(0.0, 4.0, 12.0), Vec3::ZERO)
    }
}

impl CameraController {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
        }
    }

    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let (yaw, pitch) = forward_to_yaw_pitch(target - position);
        Self::new(position, yaw, pitch)
    }

    pub fn from_bounds(min: Vec3, max: Vec3) -> Self {
        let center = (min + max) * 0.5;
        let radius = (max - min).max_element() * 0.5;
        let distance = if radius > 0.0 { radius * 3.0 } else { 3.0 };
        let position = center + Vec3::new(distance, distance * 0.4, distance);
        Self::looking_at(position, center)
    }

    /// (forward, right, up), all unit length.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let cos_pitch = self.pitch.cos();
        let forward = Vec3::new(
            self.yaw.cos() * cos_pitch,
            self.pitch.sin(),
            self.yaw.sin() * cos_pitch,
        );
        let right = Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos());
        let up = right.cross(forward).normalize_or_zero();
        (forward, right, up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (forward, _, up) = self.basis();
        Mat4::look_at_rh(self.position, self.position + forward, up)
    }

    pub fn projection(&self, config: &EditorConfig, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(
            config.fov_y_degrees.to_radians(),
            aspect.max(1e-3),
            config.near_plane,
            config.far_plane,
        )
    }

    pub fn view_context(&self, config: &EditorConfig, viewport: Vec2) -> ViewContext {
        let aspect = viewport.x / viewport.y.max(1.0);
        ViewContext::new(self.projection(config, aspect), self.view_matrix(), viewport)
    }

    /// Mouse look. `degrees_per_pixel` scales raw cursor deltas.
    pub fn look(&mut self, delta: Vec2, degrees_per_pixel: f32) {
        self.yaw += (delta.x * degrees_per_pixel).to_radians();
        self.pitch -= (delta.y * degrees_per_pixel).to_radians();
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        if self.yaw.is_finite() {
            self.yaw = (self.yaw + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
                - std::f32::consts::PI;
        }
    }

    pub fn move_horizontal(&mut self, right: f32, up: f32, forward: f32) {
        let forward_dir = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        let right_dir = Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos());
        self.position += right_dir * right + Vec3::Y * up + forward_dir * forward;
    }

    pub fn update_movement(&mut self, input: &CameraMovement, frame_dt: f32, move_speed: f32) -> bool {
        let step = move_speed * frame_dt;
        let aim_step = 1.8 * frame_dt;
        let mut changed = false;

        let yaw = f32::from(input.aim_right) - f32::from(input.aim_left);
        let pitch = f32::from(input.aim_up) - f32::from(input.aim_down);
        if yaw != 0.0 || pitch != 0.0 {
            self.yaw += yaw * aim_step;
            self.pitch = (self.pitch + pitch * aim_step).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            changed = true;
        }

        let forward = f32::from(input.move_forward) - f32::from(input.move_backward);
        let right = f32::from(input.move_right) - f32::from(input.move_left);
        let up = f32::from(input.move_up) - f32::from(input.move_down);
        if forward != 0.0 || right != 0.0 || up != 0.0 {
            self.move_horizontal(right * step, up * step, forward * step);
            changed = true;
        }

        changed
    }
}

fn forward_to_yaw_pitch(forward: Vec3) -> (f32, f32) {
    let dir = forward.normalize_or_zero();
    if dir == Vec3::ZERO {
        return (0.0, 0.0);
    }
    (dir.z.atan2(dir.x), dir.y.clamp(-1.0, 1.0).asin())
}

#[cfg(test)]
mod tests {
    use super::{CameraController, CameraMovement, PITCH_LIMIT};
    use crate::config::EditorConfig;
    use glam::{Vec2, Vec3};

    #[test]
    fn from_bounds_produces_finite_state() {
        let camera = CameraController::from_bounds(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(3.0, 4.0, 5.0));
        assert!(camera.position.is_finite());
        assert!(camera.yaw.is_finite());
        assert!(camera.pitch.is_finite());
    }

    #[test]
    fn view_matrix_looks_down_the_basis_forward() {
        let camera = CameraController::looking_at(Vec3::new(3.0, 2.0, 5.0), Vec3::ZERO);
        let (forward, _, _) = camera.basis();
        assert!((forward - (-camera.position).normalize()).length() < 1e-5);
        let in_view = camera.view_matrix().transform_vector3(forward);
        assert!((in_view - Vec3::NEG_Z).length() < 1e-5);

        let view = camera.view_context(&EditorConfig::default(), Vec2::new(1366.0, 768.0));
        assert!((view.camera_position - camera.position).length() < 1e-4);
    }

    #[test]
    fn movement_update_keeps_finite_values() {
        let mut camera = CameraController::new(Vec3::new(0.0, 0.0, 5.0), 0.0, 0.0);
        let movement = CameraMovement {
            move_forward: true,
            move_right: true,
            move_up: true,
            aim_right: true,
            aim_up: true,
            ..CameraMovement::default()
        };
        assert!(camera.update_movement(&movement, 1.0 / 60.0, 5.0));
        assert!(camera.position.is_finite());
        assert!(camera.position.y > 0.0);
        assert!(!camera.update_movement(&CameraMovement::default(), 1.0 / 60.0, 5.0));
    }

    #[test]
    fn look_clamps_pitch() {
        let mut camera = CameraController::default();
        camera.look(Vec2::new(0.0, -10_000.0), 0.2);
        assert!((camera.pitch - PITCH_LIMIT).abs() < 1e-6);
        camera.look(Vec2::new(0.0, 20_000.0), 0.2);
        assert!((camera.pitch + PITCH_LIMIT).abs() < 1e-6);
    }
}
