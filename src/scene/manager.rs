//! Scene orchestration: objects, light wrappers, selection, picking and gizmo drags.
//!
//! The manager never owns meshes, textures or the [`LightRegistry`]. Callers
//! pass the registry in for every operation that touches light data.

use super::entity::GameObject;
use super::light::{LightKind, PointLight, SpotLight};
use super::light_object::LightObject;
use super::registry::{LightHandle, LightRegistry, RegistryError};
use super::selection::Selection;
use super::{default_point_light, default_spot_light, SceneError};
use crate::assets::{Mesh, Model, PrimitiveKind, ResourceManager};
use crate::config::EditorConfig;
use crate::render::backend::{DrawTarget, PickTarget, RenderOptions};
use crate::render::gizmo::{
    gizmo_scale, handle_model, DragTarget, DragUpdate, GizmoController, GizmoHandle, GizmoMeshes,
    GizmoMode,
};
use crate::render::icons::{collect_icons, icon_quad};
use crate::render::pick::{PickId, PickLayer, PickSystem, Pickable};
use crate::render::ray::ViewContext;
use glam::{Mat4, Vec2, Vec3};
use std::sync::Arc;

const ACTIVE_HANDLE_TINT: [f32; 4] = [1.0, 0.9, 0.2, 1.0];

/// Where the gizmo sits this frame and what it drives.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GizmoAnchor {
    target: DragTarget,
    pivot: Vec3,
    rotation: Vec3,
    mode: GizmoMode,
}

pub struct SceneManager {
    objects: Vec<GameObject>,
    lights: Vec<LightObject>,
    selection: Selection,
    gizmo: GizmoController,
    picks: PickSystem,
    gizmo_meshes: GizmoMeshes,
    icon_quad: Mesh,
    point_template: PointLight,
    spot_template: SpotLight,
    gizmo_screen_factor: f32,
    icon_screen_factor: f32,
}

impl SceneManager {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            objects: Vec::new(),
            lights: Vec::new(),
            selection: Selection::None,
            gizmo: GizmoController::new(),
            picks: PickSystem::new(),
            gizmo_meshes: GizmoMeshes::new(),
            icon_quad: icon_quad(),
            point_template: default_point_light(config),
            spot_template: default_spot_light(config),
            gizmo_screen_factor: config.gizmo_screen_factor,
            icon_screen_factor: config.icon_screen_factor,
        }
    }

    /// Ground plane plus the wrapper for the registry's directional light.
    pub fn with_default_scene(config: &EditorConfig, resources: &ResourceManager) -> Self {
        let mut scene = Self::new(config);
        let mut plane = GameObject::with_primitive("Plane", resources.primitive(PrimitiveKind::Plane));
        plane.transform.scale = Vec3::splat(10.0);
        plane.texture = Some(resources.default_texture());
        plane.material = resources.material("Plain");
        scene.add_object(plane);
        scene.add_light(LightObject::new("Sun", LightHandle::Directional));
        scene
    }

    // Objects

    pub fn add_object(&mut self, object: GameObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Removes the first object called `name`.
    pub fn remove_object(&mut self, name: &str) -> bool {
        let Some(index) = self.objects.iter().position(|object| object.name == name) else {
            return false;
        };
        self.remove_object_at(index);
        true
    }

    fn remove_object_at(&mut self, index: usize) -> GameObject {
        self.gizmo.end();
        self.selection = self.selection.after_object_removed(index);
        let removed = self.objects.remove(index);
        log::info!("Deleted object '{}'", removed.name);
        removed
    }

    pub fn find_object(&self, name: &str) -> Option<&GameObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn find_object_mut(&mut self, name: &str) -> Option<&mut GameObject> {
        self.objects.iter_mut().find(|object| object.name == name)
    }

    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&GameObject> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut GameObject> {
        self.objects.get_mut(index)
    }

    /// Appends a primitive named after its kind and the current object count, and selects it.
    pub fn create_game_object(&mut self, kind: PrimitiveKind, resources: &ResourceManager) -> usize {
        let name = format!("{} {}", kind.label(), self.objects.len());
        let mut object = GameObject::with_primitive(name, resources.primitive(kind));
        object.texture = Some(resources.default_texture());
        object.material = Some(resources.default_material());
        log::info!("Created object '{}'", object.name);
        let index = self.add_object(object);
        self.select_object(index);
        index
    }

    pub fn spawn_model(&mut self, model: Arc<Model>, resources: &ResourceManager) -> usize {
        let name = format!("{} {}", model.name(), self.objects.len());
        let mut object = GameObject::with_model(name, model);
        object.material = Some(resources.default_material());
        log::info!("Spawned model '{}'", object.name);
        let index = self.add_object(object);
        self.select_object(index);
        index
    }

    // Lights

    pub fn add_light(&mut self, light: LightObject) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn lights(&self) -> &[LightObject] {
        &self.lights
    }

    pub fn light(&self, index: usize) -> Option<&LightObject> {
        self.lights.get(index)
    }

    /// Adds a default point or spot light to the registry and selects its wrapper.
    pub fn create_light(
        &mut self,
        kind: LightKind,
        registry: &mut LightRegistry,
    ) -> Result<usize, SceneError> {
        let added = match kind {
            LightKind::Directional => return Err(SceneError::DirectionalExists),
            LightKind::Point => registry
                .add_point(self.point_template)
                .map(|handle| (handle, registry.point_count())),
            LightKind::Spot => registry
                .add_spot(self.spot_template)
                .map(|handle| (handle, registry.spot_count())),
        };
        let (handle, count) = added.inspect_err(|err| log::warn!("Light not created: {err}"))?;
        let name = format!("{} Light {count}", kind.label());
        log::info!("Created light '{name}'");
        let index = self.add_light(LightObject::new(name, handle));
        self.select_light(index);
        Ok(index)
    }

    /// Removes the wrapper at `index` together with its registry entry.
    ///
    /// Surviving handles need no patching: their array indices resolve one
    /// lower through the registry's order.
    pub fn remove_light(
        &mut self,
        index: usize,
        registry: &mut LightRegistry,
    ) -> Result<LightObject, SceneError> {
        let handle = self
            .lights
            .get(index)
            .map(LightObject::handle)
            .ok_or(SceneError::NoSuchLight(index))?;
        match registry.remove(handle) {
            Ok(_) | Err(RegistryError::StaleHandle) => {}
            Err(err) => {
                log::warn!("Light {index} not removed: {err}");
                return Err(err.into());
            }
        }
        self.gizmo.end();
        self.selection = self.selection.after_light_removed(index);
        let removed = self.lights.remove(index);
        log::info!("Deleted light '{}'", removed.name);
        Ok(removed)
    }

    // Selection

    pub fn selection(&self) -> Selection {
        self.selection.validated(self.objects.len(), self.lights.len())
    }

    pub fn select_object(&mut self, index: usize) {
        self.selection = Selection::Object(index);
    }

    pub fn select_light(&mut self, index: usize) {
        self.selection = Selection::Light(index);
    }

    pub fn set_selected_object(&mut self, index: Option<usize>) {
        match index {
            Some(index) => self.select_object(index),
            None if self.selection.object().is_some() => self.selection = Selection::None,
            None => {}
        }
    }

    pub fn set_selected_light(&mut self, index: Option<usize>) {
        match index {
            Some(index) => self.select_light(index),
            None if self.selection.light().is_some() => self.selection = Selection::None,
            None => {}
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected_object(&self) -> Option<usize> {
        self.selection().object()
    }

    pub fn selected_light(&self) -> Option<usize> {
        self.selection().light()
    }

    /// Deletes whatever is selected. The directional light refuses and stays selected.
    pub fn delete_selected(&mut self, registry: &mut LightRegistry) -> Result<bool, SceneError> {
        match self.selection() {
            Selection::Object(index) => {
                self.remove_object_at(index);
                Ok(true)
            }
            Selection::Light(index) => self.remove_light(index, registry).map(|_| true),
            Selection::None => Ok(false),
        }
    }

    /// Drops every object and light wrapper. Registry contents are the caller's to reset.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.lights.clear();
        self.selection = Selection::None;
        self.gizmo.end();
    }

    // Rendering

    pub fn render_all(&self, target: &mut dyn DrawTarget, options: &RenderOptions) {
        for object in &self.objects {
            object.draw(target, options);
        }
    }

    /// Light icons and the gizmo, drawn over the scene without depth testing.
    pub fn render_overlays(
        &self,
        target: &mut dyn DrawTarget,
        registry: &LightRegistry,
        view: &ViewContext,
    ) {
        let saved_depth = target.depth_test();
        target.set_depth_test(false);

        let icons = collect_icons(
            &self.lights,
            registry,
            view,
            self.icon_screen_factor,
            self.selected_light(),
        );
        for icon in &icons {
            target.draw_overlay(&self.icon_quad, &icon.model, icon.tint);
        }

        if let Some(anchor) = self.gizmo_anchor(registry) {
            let model = self.handle_transform(anchor.pivot, view);
            for handle in GizmoHandle::all(anchor.mode) {
                let tint = if self.gizmo.active_axis() == Some(handle.axis) {
                    ACTIVE_HANDLE_TINT
                } else {
                    handle.axis.color()
                };
                target.draw_overlay(self.gizmo_meshes.mesh(handle), &model, tint);
            }
        }

        target.set_depth_test(saved_depth);
    }

    // Picking and input

    /// (Re)creates the pick buffer, e.g. after a resize.
    pub fn init_picking(&mut self, target: &mut dyn PickTarget, width: u32, height: u32) -> bool {
        self.picks.init(target, width, height)
    }

    pub fn pick(
        &mut self,
        target: &mut dyn PickTarget,
        registry: &LightRegistry,
        cursor: Vec2,
        view: &ViewContext,
    ) -> PickId {
        let icons = collect_icons(&self.lights, registry, view, self.icon_screen_factor, None);
        let gizmo = self
            .gizmo_anchor(registry)
            .map(|anchor| (anchor.mode, self.handle_transform(anchor.pivot, view)));

        let mut pickables = object_pickables(&self.objects);
        pickables.extend(icons.iter().filter_map(|icon| {
            Some(Pickable {
                id: PickId::light(icon.light)?,
                mesh: &self.icon_quad,
                model: icon.model,
                layer: PickLayer::Overlay,
            })
        }));
        if let Some((mode, model)) = gizmo {
            pickables.extend(GizmoHandle::all(mode).map(|handle| Pickable {
                id: PickId::Handle(handle),
                mesh: self.gizmo_meshes.mesh(handle),
                model,
                layer: PickLayer::Overlay,
            }));
        }

        let raw = self
            .picks
            .pick_raw(target, &pickables, cursor, view.viewport, &view.view_proj());
        let picked = PickId::decode(raw, self.objects.len(), self.lights.len());
        log::debug!("Pick at ({:.0}, {:.0}) -> {raw} ({picked:?})", cursor.x, cursor.y);
        picked
    }

    /// Left-button press: start a drag on a handle, otherwise select what was hit.
    pub fn handle_mouse_press(
        &mut self,
        target: &mut dyn PickTarget,
        registry: &LightRegistry,
        cursor: Vec2,
        view: &ViewContext,
    ) -> PickId {
        let picked = self.pick(target, registry, cursor, view);
        match picked {
            PickId::Handle(handle) => {
                if let Some(anchor) = self.gizmo_anchor(registry) {
                    self.begin_drag(anchor, handle, cursor, view);
                }
            }
            PickId::Object(index) => self.select_object(index),
            PickId::Light(index) => self.select_light(index),
            PickId::Nothing => self.clear_selection(),
        }
        picked
    }

    /// Applies the active drag. Returns whether anything moved.
    pub fn handle_mouse_move(
        &mut self,
        registry: &mut LightRegistry,
        cursor: Vec2,
        view: &ViewContext,
    ) -> bool {
        let Some(update) = self.gizmo.update(cursor, view) else {
            return false;
        };
        match update {
            DragUpdate::Position {
                target: DragTarget::Object(index),
                position,
            } => self
                .objects
                .get_mut(index)
                .map(|object| object.transform.position = position)
                .is_some(),
            DragUpdate::Position {
                target: DragTarget::Light(index),
                position,
            } => {
                let Some(handle) = self.lights.get(index).map(LightObject::handle) else {
                    return false;
                };
                registry
                    .get_mut(handle)
                    .is_some_and(|mut light| light.set_position(position))
            }
            DragUpdate::Rotation {
                target: DragTarget::Object(index),
                rotation,
            } => self
                .objects
                .get_mut(index)
                .map(|object| object.transform.rotation = rotation)
                .is_some(),
            DragUpdate::Rotation {
                target: DragTarget::Light(_),
                ..
            } => false,
        }
    }

    pub fn handle_mouse_release(&mut self) -> bool {
        self.gizmo.end()
    }

    pub fn is_dragging(&self) -> bool {
        self.gizmo.is_dragging()
    }

    pub fn gizmo_mode(&self) -> GizmoMode {
        self.gizmo.mode()
    }

    pub fn set_gizmo_mode(&mut self, mode: GizmoMode) {
        self.gizmo.set_mode(mode);
    }

    fn begin_drag(&mut self, anchor: GizmoAnchor, handle: GizmoHandle, cursor: Vec2, view: &ViewContext) {
        let started = match handle.mode {
            GizmoMode::Translate => {
                self.gizmo
                    .begin_translate(anchor.target, handle.axis, anchor.pivot, cursor, view)
            }
            GizmoMode::Rotate => self.gizmo.begin_rotate(
                anchor.target,
                handle.axis,
                anchor.rotation,
                anchor.pivot,
                cursor,
                view,
            ),
        };
        if started {
            log::debug!("{} drag on {:?} started", handle.mode.label(), handle.axis);
        }
    }

    /// Objects get the current mode; positional lights only translate; the directional light has no gizmo.
    fn gizmo_anchor(&self, registry: &LightRegistry) -> Option<GizmoAnchor> {
        match self.selection() {
            Selection::Object(index) => {
                let transform = &self.objects[index].transform;
                Some(GizmoAnchor {
                    target: DragTarget::Object(index),
                    pivot: transform.position,
                    rotation: transform.rotation,
                    mode: self.gizmo.mode(),
                })
            }
            Selection::Light(index) => {
                let pivot = self.lights[index].light(registry)?.position()?;
                Some(GizmoAnchor {
                    target: DragTarget::Light(index),
                    pivot,
                    rotation: Vec3::ZERO,
                    mode: GizmoMode::Translate,
                })
            }
            Selection::None => None,
        }
    }

    fn handle_transform(&self, pivot: Vec3, view: &ViewContext) -> Mat4 {
        handle_model(
            pivot,
            gizmo_scale(pivot, view.camera_position, self.gizmo_screen_factor),
        )
    }
}

fn object_pickables(objects: &[GameObject]) -> Vec<Pickable<'_>> {
    objects
        .iter()
        .enumerate()
        .filter_map(|(index, object)| Some((PickId::object(index)?, object)))
        .flat_map(|(id, object)| {
            let model = object.model_matrix();
            object.meshes().into_iter().map(move |mesh| Pickable {
                id,
                mesh,
                model,
                layer: PickLayer::Scene,
            })
        })
        .collect()
}
