use glam::{Mat4, Vec2, Vec3, Vec4};

/// Below this `|dot(normal, direction)|` a ray is treated as parallel to a plane.
pub const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Camera matrices and viewport for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewContext {
    pub projection: Mat4,
    pub view: Mat4,
    pub camera_position: Vec3,
    /// Window size in the same units as cursor positions.
    pub viewport: Vec2,
}

impl ViewContext {
    pub fn new(projection: Mat4, view: Mat4, viewport: Vec2) -> Self {
        let camera_position = view.inverse().w_axis.truncate();
        Self {
            projection,
            view,
            camera_position,
            viewport,
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn forward(&self) -> Vec3 {
        self.view
            .inverse()
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or_zero()
    }

    /// Camera-to-world rotation, for billboards.
    pub fn camera_rotation(&self) -> glam::Mat3 {
        glam::Mat3::from_mat4(self.view.inverse())
    }

    pub fn mouse_ray(&self, cursor: Vec2) -> Ray {
        mouse_ray(cursor, self.viewport, &self.projection, &self.view)
    }

    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        project_to_screen(point, &self.view_proj(), self.viewport)
    }
}

/// World-space ray through `cursor` (top-left origin).
///
/// The cursor is unprojected through the inverse projection, pinned to
/// `z = -1` in eye space as a direction, then taken through the inverse view.
pub fn mouse_ray(cursor: Vec2, viewport: Vec2, projection: &Mat4, view: &Mat4) -> Ray {
    let ndc_x = 2.0 * cursor.x / viewport.x.max(1.0) - 1.0;
    let ndc_y = 1.0 - 2.0 * cursor.y / viewport.y.max(1.0);
    let clip = Vec4::new(ndc_x, ndc_y, -1.0, 1.0);

    let mut eye = projection.inverse() * clip;
    eye.z = -1.0;
    eye.w = 0.0;

    let inverse_view = view.inverse();
    let direction = (inverse_view * eye).truncate();
    Ray::new(inverse_view.w_axis.truncate(), direction)
}

/// Hit point of `ray` on the plane through `plane_point` with `plane_normal`.
///
/// Misses when the ray runs parallel to the plane or the plane lies behind the origin.
pub fn ray_plane(ray: &Ray, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = plane_normal.dot(ray.direction);
    if denom.abs() <= PARALLEL_EPSILON {
        return None;
    }
    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.point_at(t))
}

/// Screen position (top-left origin) of `point`, or `None` behind the camera.
pub fn project_to_screen(point: Vec3, view_proj: &Mat4, viewport: Vec2) -> Option<Vec2> {
    let clip = *view_proj * point.extend(1.0);
    if clip.w <= PARALLEL_EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(
        (ndc.x * 0.5 + 0.5) * viewport.x,
        (0.5 - ndc.y * 0.5) * viewport.y,
    ))
}

#[cfg(test)]
mod tests {
    use super::{ray_plane, Ray, ViewContext};
    use glam::{Mat4, Vec2, Vec3};

    fn view() -> ViewContext {
        ViewContext::new(
            Mat4::perspective_rh_gl(60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0),
            Mat4::look_at_rh(Vec3::new(2.0, 3.0, 8.0), Vec3::ZERO, Vec3::Y),
            Vec2::new(1600.0, 900.0),
        )
    }

    #[test]
    fn centre_ray_points_along_camera_forward() {
        let view = view();
        let ray = view.mouse_ray(Vec2::new(800.0, 450.0));
        assert!((ray.origin - Vec3::new(2.0, 3.0, 8.0)).length() < 1e-4);
        assert!((ray.direction - view.forward()).length() < 1e-4);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn projected_point_unprojects_back_onto_itself() {
        let view = view();
        let target = Vec3::new(0.7, -0.4, 1.2);
        let screen = view.project(target).expect("in front of camera");
        let ray = view.mouse_ray(screen);
        let to_target = (target - ray.origin).normalize();
        assert!(ray.direction.dot(to_target) > 0.99999);
    }

    #[test]
    fn parallel_and_backward_rays_miss() {
        let along_plane = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert_eq!(ray_plane(&along_plane, Vec3::ZERO, Vec3::Y), None);

        let nearly_parallel = Ray {
            origin: Vec3::new(0.0, 1.0, 0.0),
            direction: Vec3::new(1.0, 5e-7, 0.0),
        };
        assert_eq!(ray_plane(&nearly_parallel, Vec3::ZERO, Vec3::Y), None);

        let away = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert_eq!(ray_plane(&away, Vec3::ZERO, Vec3::Y), None);

        let down = Ray::new(Vec3::new(3.0, 2.0, 0.0), Vec3::NEG_Y);
        assert_eq!(ray_plane(&down, Vec3::ZERO, Vec3::Y), Some(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        let view = view();
        assert!(view.project(Vec3::new(4.0, 6.0, 16.0)).is_none());
    }
}
