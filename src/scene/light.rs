use crate::render::backend::{RenderError, ShadowBackend, ShadowHandle, ShadowKind, UniformSink};
use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Directional => "Directional",
            Self::Point => "Point",
            Self::Spot => "Spot",
        }
    }

    /// Hierarchy prefix.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Directional => "[D]",
            Self::Point => "[P]",
            Self::Spot => "[S]",
        }
    }
}

/// Depth map owned by one light. The GPU resource is created lazily by the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMap {
    pub kind: ShadowKind,
    pub width: u32,
    pub height: u32,
    handle: Option<ShadowHandle>,
}

impl ShadowMap {
    pub fn new(kind: ShadowKind, width: u32, height: u32) -> Self {
        Self {
            kind,
            width: width.max(1),
            height: height.max(1),
            handle: None,
        }
    }

    pub fn handle(&self) -> Option<ShadowHandle> {
        self.handle
    }

    pub fn init(&mut self, backend: &mut dyn ShadowBackend) -> Result<ShadowHandle, RenderError> {
        if let Some(handle) = self.handle {
            return Ok(handle);
        }
        let handle = backend.create_shadow_map(self.kind, self.width, self.height)?;
        self.handle = Some(handle);
        Ok(handle)
    }

    pub fn begin_write(&self, backend: &mut dyn ShadowBackend) -> bool {
        match self.handle {
            Some(handle) => {
                backend.begin_shadow_write(handle);
                true
            }
            None => false,
        }
    }

    pub fn bind_for_read(&self, backend: &mut dyn ShadowBackend, texture_unit: u32) -> bool {
        match self.handle {
            Some(handle) => {
                backend.bind_shadow_for_read(handle, texture_unit);
                true
            }
            None => false,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBase {
    pub color: Vec3,
    pub ambient_intensity: f32,
    pub diffuse_intensity: f32,
    pub shadow: ShadowMap,
}

impl LightBase {
    pub fn new(color: Vec3, ambient_intensity: f32, diffuse_intensity: f32, shadow: ShadowMap) -> Self {
        Self {
            color,
            ambient_intensity,
            diffuse_intensity,
            shadow,
        }
    }

    fn upload(&self, sink: &mut dyn UniformSink, prefix: &str) {
        sink.set_vec3(&format!("{prefix}.colour"), self.color);
        sink.set_f32(&format!("{prefix}.ambientIntensity"), self.ambient_intensity);
        sink.set_f32(&format!("{prefix}.diffuseIntensity"), self.diffuse_intensity);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub base: LightBase,
    pub direction: Vec3,
}

impl DirectionalLight {
    pub fn new(base: LightBase, direction: Vec3) -> Self {
        Self { base, direction }
    }

    /// Orthographic view from the far side of the scene towards the origin.
    pub fn light_transform(&self) -> Mat4 {
        let projection = Mat4::orthographic_rh_gl(-20.0, 20.0, -20.0, 20.0, 0.1, 100.0);
        let eye = -self.direction;
        projection * Mat4::look_at_rh(eye, Vec3::ZERO, stable_up(self.direction))
    }

    pub fn upload(&self, sink: &mut dyn UniformSink) {
        self.base.upload(sink, "directionalLight.base");
        sink.set_vec3("directionalLight.direction", self.direction);
    }
}

/// Distance falloff `1 / (exponent*d^2 + linear*d + constant)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub exponent: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 0.3,
            linear: 0.01,
            exponent: 0.01,
        }
    }
}

impl Attenuation {
    pub fn factor(&self, distance: f32) -> f32 {
        let denominator = self.exponent * distance * distance + self.linear * distance + self.constant;
        if denominator > f32::EPSILON {
            1.0 / denominator
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub base: LightBase,
    pub position: Vec3,
    pub attenuation: Attenuation,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl PointLight {
    pub fn new(base: LightBase, position: Vec3, attenuation: Attenuation, near_plane: f32, far_plane: f32) -> Self {
        Self {
            base,
            position,
            attenuation,
            near_plane,
            far_plane,
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            90f32.to_radians(),
            self.base.shadow.aspect(),
            self.near_plane,
            self.far_plane,
        )
    }

    /// One view-projection per cube face in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn face_transforms(&self) -> [Mat4; 6] {
        let projection = self.projection();
        let p = self.position;
        let faces = [
            (Vec3::X, Vec3::NEG_Y),
            (Vec3::NEG_X, Vec3::NEG_Y),
            (Vec3::Y, Vec3::Z),
            (Vec3::NEG_Y, Vec3::NEG_Z),
            (Vec3::Z, Vec3::NEG_Y),
            (Vec3::NEG_Z, Vec3::NEG_Y),
        ];
        faces.map(|(axis, up)| projection * Mat4::look_at_rh(p, p + axis, up))
    }

    pub fn upload(&self, sink: &mut dyn UniformSink, index: usize) {
        self.upload_with_prefix(sink, &format!("pointLights[{index}]"));
    }

    fn upload_with_prefix(&self, sink: &mut dyn UniformSink, prefix: &str) {
        self.base.upload(sink, &format!("{prefix}.base"));
        sink.set_vec3(&format!("{prefix}.position"), self.position);
        sink.set_f32(&format!("{prefix}.constant"), self.attenuation.constant);
        sink.set_f32(&format!("{prefix}.linear"), self.attenuation.linear);
        sink.set_f32(&format!("{prefix}.exponent"), self.attenuation.exponent);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub point: PointLight,
    direction: Vec3,
    /// Cone half-angle in degrees.
    pub edge: f32,
}

impl SpotLight {
    pub fn new(point: PointLight, direction: Vec3, edge: f32) -> Self {
        let mut light = Self {
            point,
            direction: Vec3::NEG_Y,
            edge,
        };
        light.set_direction(direction);
        light
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Zero vectors are ignored.
    pub fn set_direction(&mut self, direction: Vec3) {
        if let Some(direction) = direction.try_normalize() {
            self.direction = direction;
        }
    }

    pub fn processed_edge(&self) -> f32 {
        self.edge.to_radians().cos()
    }

    pub fn light_transform(&self) -> Mat4 {
        let p = self.point.position;
        self.point.projection() * Mat4::look_at_rh(p, p + self.direction, stable_up(self.direction))
    }

    pub fn upload(&self, sink: &mut dyn UniformSink, index: usize) {
        let prefix = format!("spotLights[{index}]");
        self.point.upload_with_prefix(sink, &format!("{prefix}.base"));
        sink.set_vec3(&format!("{prefix}.direction"), self.direction);
        sink.set_f32(&format!("{prefix}.edge"), self.processed_edge());
    }
}

/// Shared view over the three light variants.
#[derive(Debug, Clone, Copy)]
pub enum LightRef<'a> {
    Directional(&'a DirectionalLight),
    Point(&'a PointLight),
    Spot(&'a SpotLight),
}

impl LightRef<'_> {
    pub fn kind(&self) -> LightKind {
        match self {
            Self::Directional(_) => LightKind::Directional,
            Self::Point(_) => LightKind::Point,
            Self::Spot(_) => LightKind::Spot,
        }
    }

    pub fn base(&self) -> &LightBase {
        match self {
            Self::Directional(light) => &light.base,
            Self::Point(light) => &light.base,
            Self::Spot(light) => &light.point.base,
        }
    }

    pub fn position(&self) -> Option<Vec3> {
        match self {
            Self::Directional(_) => None,
            Self::Point(light) => Some(light.position),
            Self::Spot(light) => Some(light.point.position),
        }
    }

    pub fn direction(&self) -> Option<Vec3> {
        match self {
            Self::Directional(light) => Some(light.direction),
            Self::Point(_) => None,
            Self::Spot(light) => Some(light.direction()),
        }
    }
}

#[derive(Debug)]
pub enum LightMut<'a> {
    Directional(&'a mut DirectionalLight),
    Point(&'a mut PointLight),
    Spot(&'a mut SpotLight),
}

impl LightMut<'_> {
    pub fn base_mut(&mut self) -> &mut LightBase {
        match self {
            Self::Directional(light) => &mut light.base,
            Self::Point(light) => &mut light.base,
            Self::Spot(light) => &mut light.point.base,
        }
    }

    /// Returns `false` for the directional light, which has no position.
    pub fn set_position(&mut self, position: Vec3) -> bool {
        match self {
            Self::Directional(_) => false,
            Self::Point(light) => {
                light.position = position;
                true
            }
            Self::Spot(light) => {
                light.point.position = position;
                true
            }
        }
    }
}

fn stable_up(forward: Vec3) -> Vec3 {
    if forward.normalize_or_zero().dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Attenuation, DirectionalLight, LightBase, LightMut, LightRef, PointLight, ShadowMap, SpotLight,
    };
    use crate::render::backend::{ShadowKind, UniformSink};
    use glam::{Mat4, Vec3};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Uniforms {
        floats: HashMap<String, f32>,
        vectors: HashMap<String, Vec3>,
    }

    impl UniformSink for Uniforms {
        fn set_f32(&mut self, name: &str, value: f32) {
            self.floats.insert(name.to_string(), value);
        }
        fn set_i32(&mut self, name: &str, value: i32) {
            self.floats.insert(name.to_string(), value as f32);
        }
        fn set_vec3(&mut self, name: &str, value: Vec3) {
            self.vectors.insert(name.to_string(), value);
        }
        fn set_mat4(&mut self, _name: &str, _value: &Mat4) {}
    }

    fn base(kind: ShadowKind) -> LightBase {
        LightBase::new(Vec3::ONE, 0.1, 0.8, ShadowMap::new(kind, 1024, 1024))
    }

    fn point_at(position: Vec3) -> PointLight {
        PointLight::new(base(ShadowKind::Omni), position, Attenuation::default(), 0.01, 100.0)
    }

    fn ndc(matrix: Mat4, point: Vec3) -> Vec3 {
        matrix.project_point3(point)
    }

    #[test]
    fn directional_transform_centres_the_origin() {
        let light = DirectionalLight::new(base(ShadowKind::Directional), Vec3::new(-10.0, -5.0, 20.0));
        let centre = ndc(light.light_transform(), Vec3::ZERO);
        assert!(centre.x.abs() < 1e-5 && centre.y.abs() < 1e-5);
        assert!(centre.z > -1.0 && centre.z < 1.0);
    }

    #[test]
    fn directional_straight_down_stays_finite() {
        let light = DirectionalLight::new(base(ShadowKind::Directional), Vec3::NEG_Y);
        assert!(light.light_transform().is_finite());
    }

    #[test]
    fn point_faces_look_down_each_axis() {
        let light = point_at(Vec3::new(1.0, 2.0, 3.0));
        let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (matrix, axis) in light.face_transforms().iter().zip(axes) {
            let p = ndc(*matrix, light.position + axis * 5.0);
            assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4, "{axis:?} -> {p:?}");
        }
    }

    #[test]
    fn spot_normalizes_direction_and_processes_edge() {
        let mut light = SpotLight::new(point_at(Vec3::ZERO), Vec3::new(0.0, -4.0, 0.0), 60.0);
        assert!((light.direction() - Vec3::NEG_Y).length() < 1e-6);
        assert!((light.processed_edge() - 0.5).abs() < 1e-6);
        light.set_direction(Vec3::ZERO);
        assert!((light.direction() - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn uploads_use_indexed_uniform_names() {
        let mut uniforms = Uniforms::default();
        let spot = SpotLight::new(point_at(Vec3::new(0.0, 3.0, 0.0)), Vec3::NEG_Y, 60.0);
        spot.upload(&mut uniforms, 2);
        point_at(Vec3::X).upload(&mut uniforms, 1);

        assert_eq!(uniforms.vectors["spotLights[2].base.position"], Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(uniforms.vectors["spotLights[2].base.base.colour"], Vec3::ONE);
        assert!((uniforms.floats["spotLights[2].edge"] - 0.5).abs() < 1e-6);
        assert_eq!(uniforms.floats["pointLights[1].constant"], 0.3);
        assert_eq!(uniforms.vectors["pointLights[1].position"], Vec3::X);
    }

    #[test]
    fn dispatch_views_expose_variant_fields() {
        let mut directional = DirectionalLight::new(base(ShadowKind::Directional), Vec3::NEG_Y);
        assert_eq!(LightRef::Directional(&directional).position(), None);
        assert!(!LightMut::Directional(&mut directional).set_position(Vec3::ONE));

        let mut point = point_at(Vec3::ZERO);
        assert_eq!(LightRef::Point(&point).direction(), None);
        assert!(LightMut::Point(&mut point).set_position(Vec3::ONE));
        assert_eq!(point.position, Vec3::ONE);
    }

    #[test]
    fn attenuation_falls_off_with_distance() {
        let attenuation = Attenuation::default();
        assert!(attenuation.factor(1.0) > attenuation.factor(10.0));
    }
}
