//! Color-ID picking.
//!
//! Every pickable thing is drawn into an off-screen RGB buffer with a flat
//! color that encodes an integer ID. A click reads the one pixel under the
//! cursor back and decodes it into a [`PickId`].
//!
//! ## ID bands
//!
//! | Range | Meaning |
//! |---|---|
//! | 0 | background |
//! | 1 ..= N | object index + 1 |
//! | 10000 .. 10000 + M | light index + 10000 |
//! | 20001 ..= 20003 | translate handles X/Y/Z |
//! | 20004 ..= 20006 | rotate handles X/Y/Z |
//!
//! The ID is packed little-endian into the color: `r = id & 0xFF`,
//! `g = (id >> 8) & 0xFF`, `b = (id >> 16) & 0xFF`.

use super::backend::PickTarget;
use super::gizmo::{Axis, GizmoHandle, GizmoMode};
use crate::assets::Mesh;
use glam::{Mat4, Vec2};
use std::collections::HashSet;

pub const BACKGROUND_ID: u32 = 0;
pub const OBJECT_BAND_START: u32 = 1;
pub const LIGHT_BAND_START: u32 = 10_000;
pub const TRANSLATE_X_ID: u32 = 20_001;
pub const TRANSLATE_Y_ID: u32 = 20_002;
pub const TRANSLATE_Z_ID: u32 = 20_003;
pub const ROTATE_X_ID: u32 = 20_004;
pub const ROTATE_Y_ID: u32 = 20_005;
pub const ROTATE_Z_ID: u32 = 20_006;

/// Decoded meaning of a pick-buffer pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickId {
    Nothing,
    Object(usize),
    Light(usize),
    Handle(GizmoHandle),
}

impl PickId {
    /// Objects whose ID would run into the light band are not pickable.
    pub fn object(index: usize) -> Option<Self> {
        let id = index as u64 + OBJECT_BAND_START as u64;
        (id < LIGHT_BAND_START as u64).then_some(Self::Object(index))
    }

    pub fn light(index: usize) -> Option<Self> {
        let id = index as u64 + LIGHT_BAND_START as u64;
        (id < TRANSLATE_X_ID as u64).then_some(Self::Light(index))
    }

    pub fn encode(self) -> u32 {
        match self {
            Self::Nothing => BACKGROUND_ID,
            Self::Object(index) => index as u32 + OBJECT_BAND_START,
            Self::Light(index) => index as u32 + LIGHT_BAND_START,
            Self::Handle(handle) => handle.id(),
        }
    }

    /// Single decoder for every band; IDs outside the live ranges mean nothing.
    pub fn decode(id: u32, object_count: usize, light_count: usize) -> Self {
        if id >= OBJECT_BAND_START && id < LIGHT_BAND_START {
            let index = (id - OBJECT_BAND_START) as usize;
            return if index < object_count {
                Self::Object(index)
            } else {
                Self::Nothing
            };
        }
        if id >= LIGHT_BAND_START && id < TRANSLATE_X_ID {
            let index = (id - LIGHT_BAND_START) as usize;
            return if index < light_count {
                Self::Light(index)
            } else {
                Self::Nothing
            };
        }
        GizmoHandle::from_id(id).map_or(Self::Nothing, Self::Handle)
    }
}

impl GizmoHandle {
    pub fn id(self) -> u32 {
        let base = match self.mode {
            GizmoMode::Translate => TRANSLATE_X_ID,
            GizmoMode::Rotate => ROTATE_X_ID,
        };
        base + self.axis.index() as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        let (mode, offset) = match id {
            TRANSLATE_X_ID..=TRANSLATE_Z_ID => (GizmoMode::Translate, id - TRANSLATE_X_ID),
            ROTATE_X_ID..=ROTATE_Z_ID => (GizmoMode::Rotate, id - ROTATE_X_ID),
            _ => return None,
        };
        Some(Self {
            mode,
            axis: Axis::from_index(offset as usize)?,
        })
    }
}

pub fn id_to_rgb(id: u32) -> [u8; 3] {
    [
        (id & 0xFF) as u8,
        ((id >> 8) & 0xFF) as u8,
        ((id >> 16) & 0xFF) as u8,
    ]
}

pub fn rgb_to_id(rgb: [u8; 3]) -> u32 {
    rgb[0] as u32 + rgb[1] as u32 * 256 + rgb[2] as u32 * 65_536
}

/// Normalized color for the flat pick shader.
pub fn id_to_color(id: u32) -> [f32; 3] {
    id_to_rgb(id).map(|channel| channel as f32 / 255.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickLayer {
    /// Depth-tested scene geometry.
    Scene,
    /// Icons and gizmo handles, drawn on top without depth test or culling.
    Overlay,
}

pub struct Pickable<'a> {
    pub id: PickId,
    pub mesh: &'a Mesh,
    pub model: Mat4,
    pub layer: PickLayer,
}

/// Owns the pick buffer lifecycle and runs pick passes against a [`PickTarget`].
#[derive(Debug, Default)]
pub struct PickSystem {
    initialized: bool,
    staged: HashSet<u32>,
}

impl PickSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)creates the buffer. On failure the system stays unusable and picks report nothing.
    pub fn init(&mut self, target: &mut dyn PickTarget, width: u32, height: u32) -> bool {
        match target.create_pick_buffer(width.max(1), height.max(1)) {
            Ok(()) => {
                log::info!("PickSystem initialized ({}x{})", width.max(1), height.max(1));
                self.initialized = true;
            }
            Err(err) => {
                log::warn!("PickSystem disabled: {err}");
                self.initialized = false;
            }
        }
        self.initialized
    }

    /// Renders `pickables` and returns the raw ID under `cursor`.
    ///
    /// `cursor` is in window coordinates with a top-left origin; it is rescaled
    /// to the pick buffer, which may differ in size on high-DPI displays.
    pub fn pick_raw(
        &mut self,
        target: &mut dyn PickTarget,
        pickables: &[Pickable<'_>],
        cursor: Vec2,
        window_size: Vec2,
        view_proj: &Mat4,
    ) -> u32 {
        if !self.initialized {
            return BACKGROUND_ID;
        }
        let (width, height) = target.pick_buffer_size();
        if width == 0 || height == 0 || window_size.x <= 0.0 || window_size.y <= 0.0 {
            return BACKGROUND_ID;
        }

        self.staged.clear();
        target.begin_pick_pass();
        let saved_depth = target.depth_test();
        let saved_cull = target.face_culling();

        target.set_depth_test(true);
        target.set_face_culling(true);
        for pickable in pickables.iter().filter(|p| p.layer == PickLayer::Scene) {
            self.draw(target, pickable, view_proj);
        }

        target.set_depth_test(false);
        target.set_face_culling(false);
        for pickable in pickables.iter().filter(|p| p.layer == PickLayer::Overlay) {
            self.draw(target, pickable, view_proj);
        }

        target.set_depth_test(saved_depth);
        target.set_face_culling(saved_cull);
        target.finish();

        let fb_x = cursor.x * width as f32 / window_size.x;
        let fb_y = cursor.y * height as f32 / window_size.y;
        let inside = fb_x >= 0.0 && fb_y >= 0.0 && fb_x < width as f32 && fb_y < height as f32;
        let id = if inside {
            let px = (fb_x as u32).min(width - 1);
            let py = height - 1 - (fb_y as u32).min(height - 1);
            rgb_to_id(target.read_pixel(px, py))
        } else {
            BACKGROUND_ID
        };
        target.end_pick_pass();

        if id != BACKGROUND_ID && !self.staged.contains(&id) {
            log::debug!("Discarding unstaged pick id {id}");
            return BACKGROUND_ID;
        }
        id
    }

    fn draw(&mut self, target: &mut dyn PickTarget, pickable: &Pickable<'_>, view_proj: &Mat4) {
        let id = pickable.id.encode();
        self.staged.insert(id);
        target.draw_pick(pickable.mesh, &pickable.model, view_proj, id_to_color(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::mesh;
    use crate::render::backend::RasterState;
    use crate::render::software::SoftwareBackend;
    use glam::Vec3;

    #[test]
    fn object_band_round_trips_for_every_count() {
        for object_count in [1usize, 2, 17, 500, 9_999] {
            for index in [0, object_count / 2, object_count - 1] {
                let id = PickId::Object(index).encode();
                assert_eq!(id, index as u32 + 1);
                assert_eq!(PickId::decode(id, object_count, 0), PickId::Object(index));
            }
            assert_eq!(PickId::decode(object_count as u32 + 1, object_count, 0), PickId::Nothing);
        }
    }

    #[test]
    fn light_band_is_independent_of_object_count() {
        for object_count in [0usize, 5, 9_999, 50_000] {
            for light_count in [1usize, 3, 6] {
                for index in 0..light_count {
                    let id = LIGHT_BAND_START + index as u32;
                    assert_eq!(
                        PickId::decode(id, object_count, light_count),
                        PickId::Light(index)
                    );
                }
                assert_eq!(
                    PickId::decode(LIGHT_BAND_START + light_count as u32, object_count, light_count),
                    PickId::Nothing
                );
            }
        }
    }

    #[test]
    fn handle_ids_decode_to_modes_and_axes() {
        let expected = [
            (TRANSLATE_X_ID, GizmoMode::Translate, Axis::X),
            (TRANSLATE_Y_ID, GizmoMode::Translate, Axis::Y),
            (TRANSLATE_Z_ID, GizmoMode::Translate, Axis::Z),
            (ROTATE_X_ID, GizmoMode::Rotate, Axis::X),
            (ROTATE_Y_ID, GizmoMode::Rotate, Axis::Y),
            (ROTATE_Z_ID, GizmoMode::Rotate, Axis::Z),
        ];
        for (id, mode, axis) in expected {
            let handle = GizmoHandle { mode, axis };
            assert_eq!(handle.id(), id);
            assert_eq!(PickId::decode(id, 0, 0), PickId::Handle(handle));
        }
        assert_eq!(PickId::decode(20_000, 0, 0), PickId::Nothing);
        assert_eq!(PickId::decode(20_007, 0, 0), PickId::Nothing);
        assert_eq!(PickId::decode(BACKGROUND_ID, 10, 10), PickId::Nothing);
    }

    #[test]
    fn color_packing_matches_byte_layout() {
        assert_eq!(id_to_rgb(20_004), [0x24, 0x4E, 0x00]);
        assert_eq!(rgb_to_id(id_to_rgb(0x0A_0B_0C)), 0x0A_0B_0C);
        assert!(id_to_color(LIGHT_BAND_START).iter().all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn objects_reaching_the_light_band_are_not_pickable() {
        assert_eq!(PickId::object(9_998), Some(PickId::Object(9_998)));
        assert_eq!(PickId::object(9_999), None);
        assert_eq!(PickId::light(10_001), None);
    }

    #[test]
    fn uninitialized_system_reports_nothing() {
        let mut backend = SoftwareBackend::failing_pick_buffer();
        let mut picks = PickSystem::new();
        assert!(!picks.init(&mut backend, 64, 64));

        let cube = mesh::cube();
        let pickables = [Pickable {
            id: PickId::Object(0),
            mesh: &cube,
            model: Mat4::IDENTITY,
            layer: PickLayer::Scene,
        }];
        let id = picks.pick_raw(
            &mut backend,
            &pickables,
            Vec2::new(32.0, 32.0),
            Vec2::new(64.0, 64.0),
            &Mat4::IDENTITY,
        );
        assert_eq!(id, BACKGROUND_ID);
        assert_eq!(backend.pick_draw_count(), 0);
    }

    fn camera() -> Mat4 {
        let projection = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        projection * view
    }

    #[test]
    fn cube_under_cursor_is_picked_and_background_is_not() {
        let mut backend = SoftwareBackend::new();
        let mut picks = PickSystem::new();
        assert!(picks.init(&mut backend, 64, 64));

        let cube = mesh::cube();
        let pickables = [Pickable {
            id: PickId::Object(4),
            mesh: &cube,
            model: Mat4::IDENTITY,
            layer: PickLayer::Scene,
        }];
        let window = Vec2::new(64.0, 64.0);
        let hit = picks.pick_raw(&mut backend, &pickables, Vec2::new(32.0, 32.0), window, &camera());
        assert_eq!(hit, 5);
        let miss = picks.pick_raw(&mut backend, &pickables, Vec2::new(1.0, 1.0), window, &camera());
        assert_eq!(miss, BACKGROUND_ID);
    }

    #[test]
    fn overlay_wins_over_nearer_scene_geometry_and_state_is_restored() {
        let mut backend = SoftwareBackend::new();
        let mut picks = PickSystem::new();
        picks.init(&mut backend, 64, 64);
        backend.set_face_culling(false);

        let cube = mesh::cube();
        let handle = GizmoHandle {
            mode: GizmoMode::Translate,
            axis: Axis::Y,
        };
        let pickables = [
            Pickable {
                id: PickId::Handle(handle),
                mesh: &cube,
                model: Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0)),
                layer: PickLayer::Overlay,
            },
            Pickable {
                id: PickId::Object(0),
                mesh: &cube,
                model: Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0)),
                layer: PickLayer::Scene,
            },
        ];
        let id = picks.pick_raw(
            &mut backend,
            &pickables,
            Vec2::new(32.0, 32.0),
            Vec2::new(64.0, 64.0),
            &camera(),
        );
        assert_eq!(id, TRANSLATE_Y_ID);
        assert!(backend.depth_test());
        assert!(!backend.face_culling());
    }

    #[test]
    fn cursor_is_rescaled_to_a_larger_buffer() {
        let mut backend = SoftwareBackend::new();
        let mut picks = PickSystem::new();
        picks.init(&mut backend, 128, 128);

        let cube = mesh::cube();
        let pickables = [Pickable {
            id: PickId::Light(2),
            mesh: &cube,
            model: Mat4::from_translation(Vec3::new(1.5, 1.5, 0.0)) * Mat4::from_scale(Vec3::splat(0.5)),
            layer: PickLayer::Overlay,
        }];
        // Window is half the buffer size; the cube sits in the upper-right quadrant.
        let window = Vec2::new(64.0, 64.0);
        let id = picks.pick_raw(&mut backend, &pickables, Vec2::new(48.0, 16.0), window, &camera());
        assert_eq!(id, LIGHT_BAND_START + 2);
        let miss = picks.pick_raw(&mut backend, &pickables, Vec2::new(16.0, 48.0), window, &camera());
        assert_eq!(miss, BACKGROUND_ID);
    }
}
