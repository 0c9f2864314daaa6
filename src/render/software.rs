//! CPU reference backend.
//!
//! The pick buffer is a real rasterizer (flat color, depth test, back-face
//! culling) so picking behaves exactly as it would on a GPU. Lit draws,
//! overlays, uniforms and shadow-map traffic are recorded for inspection
//! instead of shaded.

use super::backend::{
    DrawCall, DrawTarget, PickTarget, RasterState, RenderError, ShadowBackend, ShadowHandle,
    ShadowKind, UniformSink,
};
use crate::assets::{Material, Mesh};
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::collections::HashMap;

const MIN_CLIP_W: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub vertex_count: usize,
    pub model: Mat4,
    pub textured: bool,
    pub normal_mapped: bool,
    pub material: Option<Material>,
    pub depth_test: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOverlay {
    pub vertex_count: usize,
    pub model: Mat4,
    pub tint: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowOp {
    Create(ShadowHandle, ShadowKind),
    BeginWrite(ShadowHandle),
    EndWrite,
    Bind { handle: ShadowHandle, unit: u32 },
}

#[derive(Debug, Default)]
struct PickBuffer {
    width: u32,
    height: u32,
    color: Vec<[u8; 3]>,
    depth: Vec<f32>,
}

impl PickBuffer {
    fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![[0; 3]; len],
            depth: vec![f32::INFINITY; len],
        }
    }

    fn clear(&mut self) {
        self.color.fill([0; 3]);
        self.depth.fill(f32::INFINITY);
    }

    fn fill(&mut self, clip: [Vec4; 3], rgb: [u8; 3], depth_test: bool, face_culling: bool) {
        if clip.iter().any(|c| c.w <= MIN_CLIP_W) {
            return;
        }
        let size = Vec2::new(self.width as f32, self.height as f32);
        let screen = clip.map(|c| to_screen(c, size));
        let area = edge(screen[0].truncate(), screen[1].truncate(), screen[2].truncate());
        if area == 0.0 || (face_culling && area < 0.0) {
            return;
        }

        let min = screen[0].min(screen[1]).min(screen[2]);
        let max = screen[0].max(screen[1]).max(screen[2]);
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(screen[1].truncate(), screen[2].truncate(), p) / area;
                let w1 = edge(screen[2].truncate(), screen[0].truncate(), p) / area;
                let w2 = edge(screen[0].truncate(), screen[1].truncate(), p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * screen[0].z + w1 * screen[1].z + w2 * screen[2].z;
                if !(-1.0..=1.0).contains(&z) {
                    continue;
                }
                let index = (y * self.width + x) as usize;
                if depth_test {
                    if z >= self.depth[index] {
                        continue;
                    }
                    self.depth[index] = z;
                }
                self.color[index] = rgb;
            }
        }
    }
}

#[derive(Debug)]
pub struct SoftwareBackend {
    depth_test: bool,
    face_culling: bool,
    pick: Option<PickBuffer>,
    pick_fails: bool,
    pick_draws: usize,
    next_shadow_handle: u32,
    draws: Vec<RecordedDraw>,
    overlays: Vec<RecordedOverlay>,
    shadow_ops: Vec<ShadowOp>,
    floats: HashMap<String, f32>,
    ints: HashMap<String, i32>,
    vec3s: HashMap<String, Vec3>,
    mat4s: HashMap<String, Mat4>,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            depth_test: true,
            face_culling: true,
            pick: None,
            pick_fails: false,
            pick_draws: 0,
            next_shadow_handle: 1,
            draws: Vec::new(),
            overlays: Vec::new(),
            shadow_ops: Vec::new(),
            floats: HashMap::new(),
            ints: HashMap::new(),
            vec3s: HashMap::new(),
            mat4s: HashMap::new(),
        }
    }

    /// Backend whose pick framebuffer never completes.
    pub fn failing_pick_buffer() -> Self {
        Self {
            pick_fails: true,
            ..Self::new()
        }
    }

    pub fn pick_draw_count(&self) -> usize {
        self.pick_draws
    }

    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn overlays(&self) -> &[RecordedOverlay] {
        &self.overlays
    }

    pub fn shadow_ops(&self) -> &[ShadowOp] {
        &self.shadow_ops
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.ints.get(name).copied()
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        self.vec3s.get(name).copied()
    }

    pub fn mat4(&self, name: &str) -> Option<Mat4> {
        self.mat4s.get(name).copied()
    }

    /// Forgets recorded draws and shadow traffic; uniforms persist like GPU program state.
    pub fn reset_frame(&mut self) {
        self.draws.clear();
        self.overlays.clear();
        self.shadow_ops.clear();
    }

    fn rasterize(&mut self, mesh: &Mesh, mvp: &Mat4, rgb: [u8; 3]) {
        let depth_test = self.depth_test;
        let face_culling = self.face_culling;
        let Some(buffer) = self.pick.as_mut() else {
            return;
        };

        for triangle in mesh.triangles() {
            let clip = triangle.map(|v| *mvp * v.position.extend(1.0));
            let polygon = clip_near(clip);
            for k in 1..polygon.len().saturating_sub(1) {
                let fan = [polygon[0], polygon[k], polygon[k + 1]];
                buffer.fill(fan, rgb, depth_test, face_culling);
            }
        }
    }
}

/// Sutherland-Hodgman against the near plane `z >= -w`. The result is a convex
/// polygon of 0, 3 or 4 vertices with the input winding.
fn clip_near(triangle: [Vec4; 3]) -> Vec<Vec4> {
    let mut polygon = Vec::with_capacity(4);
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let da = a.z + a.w;
        let db = b.z + b.w;
        if da >= 0.0 {
            polygon.push(a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            polygon.push(a.lerp(b, da / (da - db)));
        }
    }
    polygon
}

/// Pixel coordinates with a bottom-left origin; z stays in NDC.
fn to_screen(clip: Vec4, size: Vec2) -> Vec3 {
    let ndc = clip.truncate() / clip.w;
    Vec3::new(
        (ndc.x * 0.5 + 0.5) * size.x,
        (ndc.y * 0.5 + 0.5) * size.y,
        ndc.z,
    )
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl RasterState for SoftwareBackend {
    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.face_culling = enabled;
    }

    fn depth_test(&self) -> bool {
        self.depth_test
    }

    fn face_culling(&self) -> bool {
        self.face_culling
    }
}

impl DrawTarget for SoftwareBackend {
    fn draw(&mut self, call: &DrawCall<'_>) {
        if let Some(material) = call.material {
            material.upload(self);
        }
        self.draws.push(RecordedDraw {
            vertex_count: call.mesh.vertices().len(),
            model: call.model,
            textured: call.texture.is_some(),
            normal_mapped: call.normal_map.is_some(),
            material: call.material.copied(),
            depth_test: self.depth_test,
        });
    }

    fn draw_overlay(&mut self, mesh: &Mesh, model: &Mat4, tint: [f32; 4]) {
        self.overlays.push(RecordedOverlay {
            vertex_count: mesh.vertices().len(),
            model: *model,
            tint,
        });
    }
}

impl UniformSink for SoftwareBackend {
    fn set_f32(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_owned(), value);
    }

    fn set_i32(&mut self, name: &str, value: i32) {
        self.ints.insert(name.to_owned(), value);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.vec3s.insert(name.to_owned(), value);
    }

    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.mat4s.insert(name.to_owned(), *value);
    }
}

impl ShadowBackend for SoftwareBackend {
    fn create_shadow_map(
        &mut self,
        kind: ShadowKind,
        width: u32,
        height: u32,
    ) -> Result<ShadowHandle, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ShadowMap {
                kind,
                width,
                height,
            });
        }
        let handle = ShadowHandle(self.next_shadow_handle);
        self.next_shadow_handle += 1;
        self.shadow_ops.push(ShadowOp::Create(handle, kind));
        Ok(handle)
    }

    fn begin_shadow_write(&mut self, handle: ShadowHandle) {
        self.shadow_ops.push(ShadowOp::BeginWrite(handle));
    }

    fn end_shadow_write(&mut self) {
        self.shadow_ops.push(ShadowOp::EndWrite);
    }

    fn bind_shadow_for_read(&mut self, handle: ShadowHandle, texture_unit: u32) {
        self.shadow_ops.push(ShadowOp::Bind {
            handle,
            unit: texture_unit,
        });
    }
}

impl PickTarget for SoftwareBackend {
    fn create_pick_buffer(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.pick_fails || width == 0 || height == 0 {
            self.pick = None;
            return Err(RenderError::IncompleteFramebuffer {
                width,
                height,
                reason: "missing color attachment".to_owned(),
            });
        }
        self.pick = Some(PickBuffer::new(width, height));
        Ok(())
    }

    fn pick_buffer_size(&self) -> (u32, u32) {
        self.pick
            .as_ref()
            .map_or((0, 0), |buffer| (buffer.width, buffer.height))
    }

    fn begin_pick_pass(&mut self) {
        if let Some(buffer) = self.pick.as_mut() {
            buffer.clear();
        }
    }

    fn draw_pick(&mut self, mesh: &Mesh, model: &Mat4, view_proj: &Mat4, color: [f32; 3]) {
        self.pick_draws += 1;
        let rgb = color.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8);
        self.rasterize(mesh, &(*view_proj * *model), rgb);
    }

    fn finish(&mut self) {}

    fn read_pixel(&mut self, x: u32, y: u32) -> [u8; 3] {
        let Some(buffer) = self.pick.as_ref() else {
            return [0; 3];
        };
        if x >= buffer.width || y >= buffer.height {
            return [0; 3];
        }
        buffer.color[(y * buffer.width + x) as usize]
    }

    fn end_pick_pass(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mesh;

    fn camera() -> Mat4 {
        Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0)
            * Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn nearer_geometry_wins_with_depth_test() {
        let mut backend = SoftwareBackend::new();
        backend.create_pick_buffer(32, 32).expect("pick buffer");
        backend.begin_pick_pass();
        let cube = mesh::cube();
        let near = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0));
        backend.draw_pick(&cube, &near, &camera(), [1.0, 0.0, 0.0]);
        backend.draw_pick(&cube, &Mat4::IDENTITY, &camera(), [0.0, 1.0, 0.0]);
        assert_eq!(backend.read_pixel(16, 16), [255, 0, 0]);

        backend.set_depth_test(false);
        backend.draw_pick(&cube, &Mat4::IDENTITY, &camera(), [0.0, 0.0, 1.0]);
        assert_eq!(backend.read_pixel(16, 16), [0, 0, 255]);
        assert_eq!(backend.read_pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn back_faces_are_culled_only_when_enabled() {
        let mut backend = SoftwareBackend::new();
        backend.create_pick_buffer(16, 16).expect("pick buffer");
        let plane = mesh::plane();
        // Seen from below, the +Y facing plane shows its back.
        let below = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0)
            * Mat4::look_at_rh(Vec3::new(0.0, -3.0, 0.0), Vec3::ZERO, Vec3::Z);
        backend.begin_pick_pass();
        backend.draw_pick(&plane, &Mat4::IDENTITY, &below, [1.0, 1.0, 1.0]);
        assert_eq!(backend.read_pixel(8, 8), [0, 0, 0]);

        backend.set_face_culling(false);
        backend.draw_pick(&plane, &Mat4::IDENTITY, &below, [1.0, 1.0, 1.0]);
        assert_eq!(backend.read_pixel(8, 8), [255, 255, 255]);
    }

    #[test]
    fn triangles_crossing_the_near_plane_are_clipped_not_dropped() {
        let inside = Vec4::new(0.0, 0.0, 0.5, 1.0);
        let behind = Vec4::new(0.0, 1.0, -3.0, -1.0);
        let polygon = clip_near([inside, behind, Vec4::new(1.0, 0.0, 0.5, 1.0)]);
        assert_eq!(polygon.len(), 4);
        assert!(polygon.iter().all(|v| v.z + v.w >= -1e-6));
        assert!(clip_near([behind; 3]).is_empty());
        assert_eq!(clip_near([inside; 3]).len(), 3);
    }

    #[test]
    fn ground_plane_under_the_camera_stays_pickable() {
        let mut backend = SoftwareBackend::new();
        backend.create_pick_buffer(64, 64).expect("pick buffer");
        let plane = mesh::plane();
        let ground = Mat4::from_scale(Vec3::splat(10.0));
        let view_proj = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0)
            * Mat4::look_at_rh(Vec3::new(0.0, 4.0, 0.0), Vec3::new(0.0, 0.0, -5.0), Vec3::Y);

        backend.set_face_culling(true);
        backend.begin_pick_pass();
        backend.draw_pick(&plane, &ground, &view_proj, [1.0, 0.0, 0.0]);
        assert_eq!(backend.read_pixel(32, 32), [255, 0, 0]);
        // The bottom rows look at ground that runs behind the camera.
        assert_eq!(backend.read_pixel(32, 2), [255, 0, 0]);
    }

    #[test]
    fn shadow_traffic_is_recorded_in_order() {
        let mut backend = SoftwareBackend::new();
        let handle = backend
            .create_shadow_map(ShadowKind::Omni, 8, 8)
            .expect("shadow map");
        backend.begin_shadow_write(handle);
        backend.end_shadow_write();
        backend.bind_shadow_for_read(handle, 4);
        assert_eq!(
            backend.shadow_ops(),
            &[
                ShadowOp::Create(handle, ShadowKind::Omni),
                ShadowOp::BeginWrite(handle),
                ShadowOp::EndWrite,
                ShadowOp::Bind { handle, unit: 4 },
            ]
        );
        assert!(backend.create_shadow_map(ShadowKind::Directional, 0, 8).is_err());
    }
}
