//! Editor panels: toolbar, hierarchy, inspector and asset browser.
//!
//! Field edits (transforms, light parameters) are applied while the panels
//! are drawn. Anything that changes the shape of the scene or touches the
//! filesystem comes back as a [`UiAction`] and is applied after the frame by
//! [`EditorUi::apply`].

use crate::assets::{AssetEntry, AssetError, AssetIndex, AssetKind, PrimitiveKind, ResourceManager};
use crate::render::gizmo::GizmoMode;
use crate::scene::{
    Attenuation, GameObject, LightKind, LightMut, LightRegistry, SceneError, SceneManager,
    Selection,
};
use glam::Vec3;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    CreateObject(PrimitiveKind),
    CreateLight(LightKind),
    DeleteSelected,
    SetGizmoMode(GizmoMode),
    SpawnModel(PathBuf),
    AssignTexture(PathBuf),
    EnterFolder(PathBuf),
    GoUp,
    RefreshAssets,
    ImportAsset(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("select an object before assigning a texture")]
    NoObjectSelected,
}

#[derive(Default)]
pub struct EditorUi {
    thumbnails: HashMap<String, egui::TextureHandle>,
    status: String,
}

impl EditorUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last action result shown in the toolbar.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        scene: &mut SceneManager,
        registry: &mut LightRegistry,
        resources: &ResourceManager,
        assets: &AssetIndex,
    ) -> Vec<UiAction> {
        let mut actions = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar(ui, scene, registry, &self.status, &mut actions);
        });

        egui::SidePanel::left("hierarchy")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    hierarchy(ui, scene);
                    ui.separator();
                    inspector(ui, scene, registry, resources);
                });
            });

        egui::TopBottomPanel::bottom("assets")
            .resizable(true)
            .default_height(150.0)
            .show(ctx, |ui| {
                self.asset_browser(ui, assets, &mut actions);
            });

        actions
    }

    /// Applies structural edits collected during the frame. Failures are logged and shown as status.
    pub fn apply(
        &mut self,
        actions: Vec<UiAction>,
        scene: &mut SceneManager,
        registry: &mut LightRegistry,
        resources: &mut ResourceManager,
        assets: &mut AssetIndex,
    ) {
        for action in actions {
            match apply_action(&action, scene, registry, resources, assets) {
                Ok(()) => self.status.clear(),
                Err(err) => {
                    log::warn!("{action:?} failed: {err}");
                    self.status = err.to_string();
                }
            }
        }
    }

    fn asset_browser(&mut self, ui: &mut egui::Ui, assets: &AssetIndex, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            ui.heading("Assets");
            ui.label(assets.current_dir().display().to_string());
            if ui.add_enabled(!assets.at_root(), egui::Button::new("Up")).clicked() {
                actions.push(UiAction::GoUp);
            }
            if ui.button("Refresh").clicked() {
                actions.push(UiAction::RefreshAssets);
            }
            if ui.button("Import…").clicked() {
                if let Some(path) = rfd::FileDialog::new().pick_file() {
                    actions.push(UiAction::ImportAsset(path));
                }
            }
        });
        ui.separator();

        egui::ScrollArea::horizontal().show(ui, |ui| {
            ui.horizontal(|ui| {
                for entry in assets.entries() {
                    self.asset_tile(ui, assets, entry, actions);
                }
            });
        });
    }

    fn asset_tile(
        &mut self,
        ui: &mut egui::Ui,
        assets: &AssetIndex,
        entry: &AssetEntry,
        actions: &mut Vec<UiAction>,
    ) {
        let tile = egui::vec2(64.0, 64.0);
        ui.vertical(|ui| {
            ui.set_width(tile.x + 8.0);
            let response = match self.thumbnail_texture(ui.ctx(), assets, entry) {
                Some(texture) => ui.add(egui::Image::new((texture.id(), tile)).sense(egui::Sense::click())),
                None => ui.add(egui::Button::new(entry.kind.label()).min_size(tile)),
            };
            ui.add(egui::Label::new(entry.name.as_str()).truncate());

            match entry.kind {
                AssetKind::Folder if response.double_clicked() => {
                    actions.push(UiAction::EnterFolder(entry.path.clone()));
                }
                AssetKind::Model if response.double_clicked() => {
                    actions.push(UiAction::SpawnModel(entry.path.clone()));
                }
                AssetKind::Texture if response.clicked() => {
                    actions.push(UiAction::AssignTexture(entry.path.clone()));
                }
                _ => {}
            }
            response.on_hover_text(entry.path.display().to_string());
        });
    }

    fn thumbnail_texture(
        &mut self,
        ctx: &egui::Context,
        assets: &AssetIndex,
        entry: &AssetEntry,
    ) -> Option<egui::TextureHandle> {
        let key = entry.thumbnail.as_ref()?;
        if let Some(texture) = self.thumbnails.get(key) {
            return Some(texture.clone());
        }
        let image = assets.thumbnail(entry)?;
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        let texture = ctx.load_texture(format!("thumb-{key}"), color, egui::TextureOptions::LINEAR);
        self.thumbnails.insert(key.clone(), texture.clone());
        Some(texture)
    }
}

fn apply_action(
    action: &UiAction,
    scene: &mut SceneManager,
    registry: &mut LightRegistry,
    resources: &mut ResourceManager,
    assets: &mut AssetIndex,
) -> Result<(), ActionError> {
    match action {
        UiAction::CreateObject(kind) => {
            scene.create_game_object(*kind, resources);
        }
        UiAction::CreateLight(kind) => {
            scene.create_light(*kind, registry)?;
        }
        UiAction::DeleteSelected => {
            scene.delete_selected(registry)?;
        }
        UiAction::SetGizmoMode(mode) => scene.set_gizmo_mode(*mode),
        UiAction::SpawnModel(path) => {
            let model = resources.model(path)?;
            scene.spawn_model(model, resources);
        }
        UiAction::AssignTexture(path) => {
            let index = scene.selected_object().ok_or(ActionError::NoObjectSelected)?;
            let texture = resources.texture(path);
            let normal_map = resources.normal_map_for(path);
            if let Some(object) = scene.object_mut(index) {
                object.texture = Some(texture);
                object.normal_map = normal_map;
            }
        }
        UiAction::EnterFolder(path) => assets.enter(path)?,
        UiAction::GoUp => {
            assets.go_up()?;
        }
        UiAction::RefreshAssets => assets.refresh()?,
        UiAction::ImportAsset(path) => {
            assets.import(path)?;
        }
    }
    Ok(())
}

fn toolbar(
    ui: &mut egui::Ui,
    scene: &SceneManager,
    registry: &LightRegistry,
    status: &str,
    actions: &mut Vec<UiAction>,
) {
    ui.horizontal(|ui| {
        ui.menu_button("Create", |ui| {
            for kind in PrimitiveKind::ALL {
                if ui.button(kind.label()).clicked() {
                    actions.push(UiAction::CreateObject(kind));
                    ui.close_menu();
                }
            }
            ui.separator();
            let lights = [
                (LightKind::Point, registry.point_count(), registry.point_capacity()),
                (LightKind::Spot, registry.spot_count(), registry.spot_capacity()),
            ];
            for (kind, count, capacity) in lights {
                let label = format!("{} Light ({count}/{capacity})", kind.label());
                if ui.add_enabled(count < capacity, egui::Button::new(label)).clicked() {
                    actions.push(UiAction::CreateLight(kind));
                    ui.close_menu();
                }
            }
        });

        let has_selection = !scene.selection().is_none();
        if ui.add_enabled(has_selection, egui::Button::new("Delete")).clicked() {
            actions.push(UiAction::DeleteSelected);
        }

        ui.separator();
        let mode = scene.gizmo_mode();
        for (candidate, label) in [(GizmoMode::Translate, "Translate (T)"), (GizmoMode::Rotate, "Rotate (R)")] {
            if ui.selectable_label(mode == candidate, label).clicked() && mode != candidate {
                actions.push(UiAction::SetGizmoMode(candidate));
            }
        }

        if !status.is_empty() {
            ui.separator();
            ui.colored_label(egui::Color32::LIGHT_RED, status);
        }
    });
}

fn hierarchy(ui: &mut egui::Ui, scene: &mut SceneManager) {
    let selection = scene.selection();

    let mut picked = None;
    egui::CollapsingHeader::new("Objects")
        .default_open(true)
        .show(ui, |ui| {
            for (index, object) in scene.objects().iter().enumerate() {
                let selected = selection == Selection::Object(index);
                if ui.selectable_label(selected, object.name.as_str()).clicked() {
                    picked = Some(Selection::Object(index));
                }
            }
        });
    egui::CollapsingHeader::new("Lights")
        .default_open(true)
        .show(ui, |ui| {
            for (index, light) in scene.lights().iter().enumerate() {
                let selected = selection == Selection::Light(index);
                if ui.selectable_label(selected, light.display_name()).clicked() {
                    picked = Some(Selection::Light(index));
                }
            }
        });

    match picked {
        Some(Selection::Object(index)) => scene.select_object(index),
        Some(Selection::Light(index)) => scene.select_light(index),
        _ => {}
    }
}

fn inspector(
    ui: &mut egui::Ui,
    scene: &mut SceneManager,
    registry: &mut LightRegistry,
    resources: &ResourceManager,
) {
    ui.heading("Inspector");
    match scene.selection() {
        Selection::Object(index) => {
            if let Some(object) = scene.object_mut(index) {
                object_inspector(ui, object, resources);
            }
        }
        Selection::Light(index) => {
            let Some(light) = scene.light(index) else {
                return;
            };
            ui.label(light.display_name());
            ui.label(format!("Type: {} Light", light.kind().label()));
            if let Some(light) = light.light_mut(registry) {
                light_inspector(ui, light);
            }
        }
        Selection::None => {
            ui.label("Nothing selected");
        }
    }
}

fn object_inspector(ui: &mut egui::Ui, object: &mut GameObject, resources: &ResourceManager) {
    ui.horizontal(|ui| {
        ui.label("Name");
        ui.text_edit_singleline(&mut object.name);
    });
    let transform = &mut object.transform;
    vec3_row(ui, "Position", &mut transform.position, 0.1, None);
    vec3_row(ui, "Rotation", &mut transform.rotation, 1.0, None);
    vec3_row(ui, "Scale", &mut transform.scale, 0.01, Some(0.01..=100.0));

    let current = resources
        .material_names()
        .find(|name| resources.material(name).as_deref() == object.material.as_deref())
        .unwrap_or("None")
        .to_owned();
    egui::ComboBox::from_label("Material")
        .selected_text(current.as_str())
        .show_ui(ui, |ui| {
            for name in resources.material_names() {
                if ui.selectable_label(current == name, name).clicked() {
                    object.material = resources.material(name);
                }
            }
        });

    let texture = object
        .texture
        .as_ref()
        .and_then(|texture| texture.path())
        .map_or_else(|| "default".to_owned(), |path| path.display().to_string());
    ui.label(format!("Texture: {texture}"));
    if object.normal_map.is_some() {
        ui.label("Normal map: yes");
    }
}

fn light_inspector(ui: &mut egui::Ui, mut light: LightMut<'_>) {
    {
        let base = light.base_mut();
        ui.horizontal(|ui| {
            ui.label("Color");
            let mut color = base.color.to_array();
            if ui.color_edit_button_rgb(&mut color).changed() {
                base.color = Vec3::from_array(color);
            }
        });
        ui.add(egui::Slider::new(&mut base.ambient_intensity, 0.0..=1.0).text("Ambient"));
        ui.add(egui::Slider::new(&mut base.diffuse_intensity, 0.0..=2.0).text("Diffuse"));
    }
    ui.separator();

    match light {
        LightMut::Directional(light) => {
            vec3_row(ui, "Direction", &mut light.direction, 0.1, None);
        }
        LightMut::Point(light) => {
            vec3_row(ui, "Position", &mut light.position, 0.1, None);
            attenuation_sliders(ui, &mut light.attenuation);
        }
        LightMut::Spot(light) => {
            vec3_row(ui, "Position", &mut light.point.position, 0.1, None);
            let mut direction = light.direction();
            if vec3_row(ui, "Direction", &mut direction, 0.01, None) {
                light.set_direction(direction);
            }
            attenuation_sliders(ui, &mut light.point.attenuation);
            ui.add(egui::Slider::new(&mut light.edge, 1.0..=89.0).text("Edge (deg)"));
        }
    }
}

fn attenuation_sliders(ui: &mut egui::Ui, attenuation: &mut Attenuation) {
    ui.label("Attenuation");
    ui.add(egui::Slider::new(&mut attenuation.constant, 0.01..=2.0).text("Constant"));
    ui.add(egui::Slider::new(&mut attenuation.linear, 0.001..=0.5).text("Linear"));
    ui.add(egui::Slider::new(&mut attenuation.exponent, 0.001..=0.5).text("Exponent"));
}

fn vec3_row(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut Vec3,
    speed: f64,
    range: Option<RangeInclusive<f32>>,
) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut changed = false;
        for component in [&mut value.x, &mut value.y, &mut value.z] {
            let mut drag = egui::DragValue::new(component).speed(speed);
            if let Some(range) = &range {
                drag = drag.range(range.clone());
            }
            changed |= ui.add(drag).changed();
        }
        changed
    })
    .inner
}
