//! Translate/rotate gizmo: handle geometry and the drag state machine.
//!
//! Translation constrains motion to a world axis by intersecting the mouse
//! ray with a plane that contains that axis. Rotation tracks the cursor's
//! screen-space angle around the projected pivot. Both compute the new value
//! from the state captured at press time, so a drag never accumulates error.

use super::ray::{ray_plane, ViewContext};
use crate::assets::{Mesh, Vertex};
use glam::{Mat3, Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Self::X, Self::Y, Self::Z];

    pub fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn color(self) -> [f32; 4] {
        match self {
            Self::X => [1.0, 0.31, 0.31, 1.0],
            Self::Y => [0.31, 1.0, 0.31, 1.0],
            Self::Z => [0.31, 0.63, 1.0, 1.0],
        }
    }

    /// Normals of the two axis-aligned planes that contain this axis.
    fn containing_plane_normals(self) -> [Vec3; 2] {
        match self {
            Self::X => [Vec3::Y, Vec3::Z],
            Self::Y => [Vec3::X, Vec3::Z],
            Self::Z => [Vec3::X, Vec3::Y],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
}

impl GizmoMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Translate => "Translate",
            Self::Rotate => "Rotate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GizmoHandle {
    pub mode: GizmoMode,
    pub axis: Axis,
}

impl GizmoHandle {
    pub fn all(mode: GizmoMode) -> [GizmoHandle; 3] {
        Axis::ALL.map(|axis| GizmoHandle { mode, axis })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Object(usize),
    Light(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslateDrag {
    pub target: DragTarget,
    pub axis: Axis,
    pub start_position: Vec3,
    pub plane_normal: Vec3,
    pub start_hit: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateDrag {
    pub target: DragTarget,
    pub axis: Axis,
    pub start_rotation: Vec3,
    pub center: Vec2,
    pub start_angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Translating(TranslateDrag),
    Rotating(RotateDrag),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    Position { target: DragTarget, position: Vec3 },
    Rotation { target: DragTarget, rotation: Vec3 },
}

/// Of the two world planes containing `axis`, the one whose normal is less aligned with the view.
pub fn choose_drag_plane(axis: Axis, camera_forward: Vec3) -> Vec3 {
    let [first, second] = axis.containing_plane_normals();
    if second.dot(camera_forward).abs() < first.dot(camera_forward).abs() {
        second
    } else {
        first
    }
}

fn screen_angle(cursor: Vec2, center: Vec2) -> f32 {
    let delta = cursor - center;
    delta.y.atan2(delta.x)
}

#[derive(Debug, Default)]
pub struct GizmoController {
    mode: GizmoMode,
    state: DragState,
}

impl GizmoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GizmoMode) {
        if self.mode != mode {
            log::debug!("Gizmo mode -> {}", mode.label());
        }
        self.mode = mode;
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn target(&self) -> Option<DragTarget> {
        match self.state {
            DragState::Idle => None,
            DragState::Translating(drag) => Some(drag.target),
            DragState::Rotating(drag) => Some(drag.target),
        }
    }

    pub fn active_axis(&self) -> Option<Axis> {
        match self.state {
            DragState::Idle => None,
            DragState::Translating(drag) => Some(drag.axis),
            DragState::Rotating(drag) => Some(drag.axis),
        }
    }

    /// Starts an axis-constrained move. Stays idle if the first ray misses the drag plane.
    pub fn begin_translate(
        &mut self,
        target: DragTarget,
        axis: Axis,
        position: Vec3,
        cursor: Vec2,
        view: &ViewContext,
    ) -> bool {
        let plane_normal = choose_drag_plane(axis, view.forward());
        let Some(start_hit) = ray_plane(&view.mouse_ray(cursor), position, plane_normal) else {
            log::debug!("Translate drag on {axis:?} not started: ray misses drag plane");
            return false;
        };
        self.state = DragState::Translating(TranslateDrag {
            target,
            axis,
            start_position: position,
            plane_normal,
            start_hit,
        });
        true
    }

    /// Starts a rotation about `axis`. Stays idle if the pivot is behind the camera.
    pub fn begin_rotate(
        &mut self,
        target: DragTarget,
        axis: Axis,
        rotation: Vec3,
        pivot: Vec3,
        cursor: Vec2,
        view: &ViewContext,
    ) -> bool {
        let Some(center) = view.project(pivot) else {
            log::debug!("Rotate drag on {axis:?} not started: pivot is off screen");
            return false;
        };
        self.state = DragState::Rotating(RotateDrag {
            target,
            axis,
            start_rotation: rotation,
            center,
            start_angle: screen_angle(cursor, center),
        });
        true
    }

    /// New absolute value for the drag target, or `None` when idle or degenerate this frame.
    pub fn update(&self, cursor: Vec2, view: &ViewContext) -> Option<DragUpdate> {
        match &self.state {
            DragState::Idle => None,
            DragState::Translating(drag) => {
                let hit = ray_plane(&view.mouse_ray(cursor), drag.start_position, drag.plane_normal)?;
                let axis = drag.axis.unit();
                let displacement = (hit - drag.start_hit).dot(axis);
                Some(DragUpdate::Position {
                    target: drag.target,
                    position: drag.start_position + axis * displacement,
                })
            }
            DragState::Rotating(drag) => {
                let current = screen_angle(cursor, drag.center);
                let delta = -(current - drag.start_angle).to_degrees();
                let mut rotation = drag.start_rotation;
                rotation[drag.axis.index()] += delta;
                Some(DragUpdate::Rotation {
                    target: drag.target,
                    rotation,
                })
            }
        }
    }

    /// Ends any drag. Returns whether one was active.
    pub fn end(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}

/// World-space size that keeps the gizmo roughly constant on screen.
pub fn gizmo_scale(pivot: Vec3, camera_position: Vec3, screen_factor: f32) -> f32 {
    (pivot.distance(camera_position) * screen_factor).max(0.01)
}

pub fn handle_model(pivot: Vec3, scale: f32) -> Mat4 {
    Mat4::from_translation(pivot) * Mat4::from_scale(Vec3::splat(scale))
}

/// Unit-length handle geometry, built once.
pub struct GizmoMeshes {
    arrows: [Mesh; 3],
    rings: [Mesh; 3],
}

impl Default for GizmoMeshes {
    fn default() -> Self {
        Self::new()
    }
}

impl GizmoMeshes {
    pub fn new() -> Self {
        let arrow = merge(&[
            create_box_mesh(Vec3::new(0.4, 0.0, 0.0), Vec3::new(0.8, 0.04, 0.04)),
            create_cone_mesh(0.78, 1.0, 0.07, 12),
        ]);
        // +X arrow re-oriented for each axis.
        let arrows = [
            arrow.clone(),
            transform_mesh(&arrow, Mat3::from_rotation_z(FRAC_PI_2)),
            transform_mesh(&arrow, Mat3::from_rotation_y(-FRAC_PI_2)),
        ];
        let rings = [
            create_ring_mesh(1.1, 0.04, 64, Mat3::from_rotation_y(FRAC_PI_2)),
            create_ring_mesh(1.1, 0.04, 64, Mat3::from_rotation_x(-FRAC_PI_2)),
            create_ring_mesh(1.1, 0.04, 64, Mat3::IDENTITY),
        ];
        Self { arrows, rings }
    }

    pub fn mesh(&self, handle: GizmoHandle) -> &Mesh {
        match handle.mode {
            GizmoMode::Translate => &self.arrows[handle.axis.index()],
            GizmoMode::Rotate => &self.rings[handle.axis.index()],
        }
    }
}

fn create_box_mesh(center: Vec3, size: Vec3) -> Mesh {
    let unit = crate::assets::mesh::cube();
    let vertices = unit
        .vertices()
        .iter()
        .map(|v| Vertex {
            position: center + v.position * size,
            ..*v
        })
        .collect();
    Mesh::new(vertices, unit.indices().to_vec())
}

/// Cone along +X from `base_x` to the apex at `tip_x`.
fn create_cone_mesh(base_x: f32, tip_x: f32, radius: f32, segments: usize) -> Mesh {
    let n = segments.max(3);
    let mut vertices = Vec::with_capacity(n + 2);
    vertices.push(Vertex::new(Vec3::new(tip_x, 0.0, 0.0), Vec2::ZERO, Vec3::X));
    vertices.push(Vertex::new(Vec3::new(base_x, 0.0, 0.0), Vec2::ZERO, Vec3::NEG_X));
    for i in 0..n {
        let t = i as f32 / n as f32 * TAU;
        let dir = Vec3::new(0.0, t.cos(), t.sin());
        vertices.push(Vertex::new(
            Vec3::new(base_x, 0.0, 0.0) + dir * radius,
            Vec2::ZERO,
            dir,
        ));
    }
    let mut indices = Vec::with_capacity(n * 6);
    for i in 0..n {
        let a = (2 + i) as u32;
        let b = (2 + (i + 1) % n) as u32;
        indices.extend_from_slice(&[0, a, b, 1, b, a]);
    }
    Mesh::new(vertices, indices)
}

/// Flat annulus in the XY plane, then rotated by `rotation`.
fn create_ring_mesh(radius: f32, thickness: f32, segments: usize, rotation: Mat3) -> Mesh {
    let n = segments.max(16);
    let normal = rotation * Vec3::Z;
    let mut vertices = Vec::with_capacity(n * 2);
    for i in 0..n {
        let t = i as f32 / n as f32 * TAU;
        let dir = Vec3::new(t.cos(), t.sin(), 0.0);
        vertices.push(Vertex::new(rotation * (dir * (radius + thickness)), Vec2::ZERO, normal));
        vertices.push(Vertex::new(rotation * (dir * (radius - thickness)), Vec2::ZERO, normal));
    }
    let mut indices = Vec::with_capacity(n * 6);
    for i in 0..n {
        let outer = (i * 2) as u32;
        let inner = outer + 1;
        let next_outer = (((i + 1) % n) * 2) as u32;
        let next_inner = next_outer + 1;
        indices.extend_from_slice(&[outer, next_outer, next_inner, outer, next_inner, inner]);
    }
    Mesh::new(vertices, indices)
}

fn transform_mesh(mesh: &Mesh, rotation: Mat3) -> Mesh {
    let vertices = mesh
        .vertices()
        .iter()
        .map(|v| Vertex {
            position: rotation * v.position,
            normal: rotation * v.normal,
            tangent: rotation * v.tangent,
            bitangent: rotation * v.bitangent,
            ..*v
        })
        .collect();
    Mesh::new(vertices, mesh.indices().to_vec())
}

fn merge(parts: &[Mesh]) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for part in parts {
        let base = vertices.len() as u32;
        vertices.extend_from_slice(part.vertices());
        indices.extend(part.indices().iter().map(|index| index + base));
    }
    Mesh::new(vertices, indices)
}
