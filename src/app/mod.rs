mod egui_host;
mod input;
mod timing;

use crate::assets::{AssetIndex, ResourceManager};
use crate::config::{EditorConfig, DEFAULT_CONFIG_FILE};
use crate::render::frame::render_frame;
use crate::render::{CameraController, SoftwareBackend, ViewContext};
use crate::scene::{default_sun, LightRegistry, SceneManager, Selection};
use crate::ui::EditorUi;
use egui_host::{EguiHost, UiCapture};
use input::{InputAction, InputState};
use timing::FrameTiming;

use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "Stagehand";

pub struct App {
    config: EditorConfig,
    window: Option<Arc<Window>>,
    egui: Option<EguiHost>,
    backend: SoftwareBackend,
    resources: ResourceManager,
    assets: AssetIndex,
    scene: SceneManager,
    registry: LightRegistry,
    ui: EditorUi,
    input: InputState,
    camera: CameraController,
    viewport: Vec2,
    cursor: Option<Vec2>,
    // Last cursor position while the right button is held.
    look_anchor: Option<Vec2>,
    left_down: bool,
    ui_capture: UiCapture,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(config: EditorConfig) -> Self {
        let resources = ResourceManager::new(&config);
        let mut assets = AssetIndex::new(&config.assets_root, config.thumbnail_size);
        if let Err(err) = assets.refresh() {
            log::warn!("Asset browser unavailable: {err}");
        }
        let registry = LightRegistry::new(
            default_sun(&config),
            config.max_point_lights,
            config.max_spot_lights,
        );
        let scene = SceneManager::with_default_scene(&config, &resources);
        let now = Instant::now();

        Self {
            viewport: Vec2::new(config.window_width as f32, config.window_height as f32),
            window: None,
            egui: None,
            backend: SoftwareBackend::new(),
            resources,
            assets,
            scene,
            registry,
            ui: EditorUi::new(),
            input: InputState::default(),
            camera: CameraController::default(),
            cursor: None,
            look_anchor: None,
            left_down: false,
            ui_capture: UiCapture::default(),
            timing: FrameTiming::new(WINDOW_TITLE.to_string(), now),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: now,
            config,
        }
    }

    fn view_context(&self) -> ViewContext {
        self.camera.view_context(&self.config, self.viewport)
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        let (width, height) = (size.width.max(1), size.height.max(1));
        self.viewport = Vec2::new(width as f32, height as f32);
        if !self.scene.init_picking(&mut self.backend, width, height) {
            log::warn!("Pick buffer unavailable at {width}x{height}");
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(millihz) = window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz())
        {
            let hz = millihz as f32 / 1000.0;
            if hz > 1.0 {
                target = Duration::from_secs_f32(1.0 / hz);
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_key_action(&mut self, event_loop: &ActiveEventLoop, action: InputAction) {
        match action {
            InputAction::Exit => event_loop.exit(),
            InputAction::SetGizmoMode(mode) => self.scene.set_gizmo_mode(mode),
            InputAction::DeleteSelected => {
                if let Err(err) = self.scene.delete_selected(&mut self.registry) {
                    log::warn!("Delete failed: {err}");
                }
            }
            InputAction::None => {}
        }
    }

    fn handle_cursor_moved(&mut self, cursor: Vec2) {
        if let Some(anchor) = self.look_anchor {
            self.camera.look(cursor - anchor, self.config.camera_turn_speed);
            self.look_anchor = Some(cursor);
        }
        if self.scene.is_dragging() {
            let view = self.view_context();
            self.scene.handle_mouse_move(&mut self.registry, cursor, &view);
        }
        self.cursor = Some(cursor);
    }

    fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        match (button, pressed) {
            (MouseButton::Left, true) => {
                if self.left_down {
                    return;
                }
                self.left_down = true;
                let Some(cursor) = self.cursor.filter(|_| !self.ui_capture.pointer) else {
                    return;
                };
                let view = self.view_context();
                self.scene
                    .handle_mouse_press(&mut self.backend, &self.registry, cursor, &view);
            }
            (MouseButton::Left, false) => {
                if std::mem::take(&mut self.left_down) {
                    self.scene.handle_mouse_release();
                }
            }
            (MouseButton::Right, true) if !self.ui_capture.pointer => self.look_anchor = self.cursor,
            (MouseButton::Right, false) => self.look_anchor = None,
            _ => {}
        }
    }

    fn selection_label(&self) -> String {
        match self.scene.selection() {
            Selection::Object(index) => self
                .scene
                .object(index)
                .map_or_else(String::new, |object| object.name.clone()),
            Selection::Light(index) => self
                .scene
                .light(index)
                .map_or_else(String::new, |light| light.display_name()),
            Selection::None => "no selection".to_string(),
        }
    }

    fn render(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if let Some(fps) = self.timing.update(Instant::now()) {
            window.set_title(&self.timing.title(fps, &self.selection_label()));
        }
        self.camera.update_movement(
            &self.input.movement(),
            self.timing.frame_dt,
            self.config.camera_move_speed,
        );

        let view = self.view_context();
        self.backend.reset_frame();
        render_frame(&mut self.backend, &self.scene, &mut self.registry, &view);

        let Some(egui) = self.egui.as_mut() else {
            return;
        };
        let (ui, scene, registry) = (&mut self.ui, &mut self.scene, &mut self.registry);
        let (resources, assets) = (&self.resources, &self.assets);
        let mut actions = Vec::new();
        self.ui_capture = egui.run_ui(&window, |ctx| {
            actions = ui.show(ctx, scene, registry, resources, assets);
        });
        log::trace!("{} scene draws recorded", self.backend.draws().len());

        self.ui.apply(
            actions,
            &mut self.scene,
            &mut self.registry,
            &mut self.resources,
            &mut self.assets,
        );
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        self.egui = Some(EguiHost::new(&window));
        self.handle_resize(window.inner_size());
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui), Some(window)) = (self.egui.as_mut(), self.window.as_ref()) {
            self.ui_capture = egui.on_window_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }
            WindowEvent::Focused(false) => {
                self.input.release_all();
                self.look_anchor = None;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if pressed && self.ui_capture.keyboard {
                    return;
                }
                let action = self.input.handle_key(event.physical_key, pressed);
                self.handle_key_action(event_loop, action);
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Window resized to {}x{}", new_size.width, new_size.height);
                self.handle_resize(new_size);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(button, state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

/// Entry point: logging, config from the first argument (or `stagehand.json`), then the event loop.
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
    let config = EditorConfig::load_or_default(&config_path);
    log::info!("Stagehand editor, assets at {}", config.assets_root.display());
    log::info!("   Press ESC or close window to exit");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
    }

    log::info!("Goodbye!");
}
