//! egui on top of the winit window. The editor only consumes egui's input
//! routing; the tessellated UI is not presented.

use egui_winit::winit::event::WindowEvent;
use winit::window::Window;

/// Input egui claimed during the last frame. Claimed input never reaches the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiCapture {
    pub pointer: bool,
    pub keyboard: bool,
}

impl UiCapture {
    fn of(context: &egui::Context) -> Self {
        Self {
            pointer: context.wants_pointer_input() || context.is_pointer_over_area(),
            keyboard: context.wants_keyboard_input(),
        }
    }
}

pub struct EguiHost {
    context: egui::Context,
    winit_state: egui_winit::State,
    capture: UiCapture,
}

impl EguiHost {
    pub fn new(window: &Window) -> Self {
        let context = egui::Context::default();
        let winit_state = egui_winit::State::new(
            context.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        Self {
            context,
            winit_state,
            capture: UiCapture::default(),
        }
    }

    /// Feeds the event to egui and returns the capture from the last frame.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> UiCapture {
        let response = self.winit_state.on_window_event(window, event);
        if response.repaint {
            window.request_redraw();
        }
        self.capture
    }

    pub fn run_ui<F>(&mut self, window: &Window, run_ui: F) -> UiCapture
    where
        F: FnMut(&egui::Context),
    {
        let raw_input = self.winit_state.take_egui_input(window);
        let (platform_output, capture) = run_frame(&self.context, raw_input, run_ui);
        self.winit_state.handle_platform_output(window, platform_output);
        self.capture = capture;
        capture
    }
}

/// One egui pass. Shapes and texture deltas are dropped after counting.
fn run_frame<F>(
    context: &egui::Context,
    raw_input: egui::RawInput,
    run_ui: F,
) -> (egui::PlatformOutput, UiCapture)
where
    F: FnMut(&egui::Context),
{
    let output = context.run(raw_input, run_ui);
    log::trace!(
        "ui frame: {} shapes, {} texture updates not presented",
        output.shapes.len(),
        output.textures_delta.set.len()
    );
    (output.platform_output, UiCapture::of(context))
}
