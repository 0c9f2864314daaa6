//! Narrow contracts between the editor core and whatever draws pixels.
//!
//! The core never talks to a graphics API directly. It issues draws, uniform
//! uploads, shadow-map binds and pick-buffer reads through these traits; a GPU
//! backend maps them onto its API and [`SoftwareBackend`](super::software::SoftwareBackend)
//! implements them on the CPU.

use crate::assets::{Material, Mesh, Texture};
use glam::{Mat4, Vec3};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("pick framebuffer incomplete ({width}x{height}): {reason}")]
    IncompleteFramebuffer {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("failed to create {kind:?} shadow map ({width}x{height})")]
    ShadowMap {
        kind: ShadowKind,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowKind {
    /// Single 2D depth map.
    Directional,
    /// Cube depth map, one face per axis direction.
    Omni,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShadowHandle(pub u32);

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub use_normal_map: bool,
}

impl RenderOptions {
    pub const FULL: Self = Self {
        use_normal_map: true,
    };
    /// Shadow and other depth-only passes skip normal maps.
    pub const SIMPLIFIED: Self = Self {
        use_normal_map: false,
    };
}

pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub model: Mat4,
    pub texture: Option<&'a Texture>,
    pub normal_map: Option<&'a Texture>,
    pub material: Option<&'a Material>,
}

pub trait RasterState {
    fn set_depth_test(&mut self, enabled: bool);
    fn set_face_culling(&mut self, enabled: bool);
    fn depth_test(&self) -> bool;
    fn face_culling(&self) -> bool;
}

pub trait DrawTarget: RasterState {
    fn draw(&mut self, call: &DrawCall<'_>);
    /// Unlit tinted draw for icons and gizmo handles.
    fn draw_overlay(&mut self, mesh: &Mesh, model: &Mat4, tint: [f32; 4]);
}

pub trait UniformSink {
    fn set_f32(&mut self, name: &str, value: f32);
    fn set_i32(&mut self, name: &str, value: i32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_mat4(&mut self, name: &str, value: &Mat4);
}

pub trait ShadowBackend {
    fn create_shadow_map(
        &mut self,
        kind: ShadowKind,
        width: u32,
        height: u32,
    ) -> Result<ShadowHandle, RenderError>;
    fn begin_shadow_write(&mut self, handle: ShadowHandle);
    fn end_shadow_write(&mut self);
    fn bind_shadow_for_read(&mut self, handle: ShadowHandle, texture_unit: u32);
}

/// Off-screen RGB color-ID buffer with a depth attachment.
pub trait PickTarget: RasterState {
    fn create_pick_buffer(&mut self, width: u32, height: u32) -> Result<(), RenderError>;
    fn pick_buffer_size(&self) -> (u32, u32);
    /// Binds the buffer, sets the viewport and clears color to black.
    fn begin_pick_pass(&mut self);
    fn draw_pick(&mut self, mesh: &Mesh, model: &Mat4, view_proj: &Mat4, color: [f32; 3]);
    /// Blocks until every queued pick draw has landed in the buffer.
    fn finish(&mut self);
    /// Bottom-left origin.
    fn read_pixel(&mut self, x: u32, y: u32) -> [u8; 3];
    fn end_pick_pass(&mut self);
}

pub trait RenderBackend: DrawTarget + PickTarget + UniformSink + ShadowBackend {}

impl<T: DrawTarget + PickTarget + UniformSink + ShadowBackend> RenderBackend for T {}

/// Anything a scene object can carry as its visual.
pub trait Renderable {
    fn render(
        &self,
        target: &mut dyn DrawTarget,
        model: Mat4,
        material: Option<&Material>,
        options: &RenderOptions,
    );
}
