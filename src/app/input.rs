use crate::render::{CameraMovement, GizmoMode};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Exit,
    SetGizmoMode(GizmoMode),
    DeleteSelected,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub aim_left: bool,
    pub aim_right: bool,
    pub aim_up: bool,
    pub aim_down: bool,
}

impl InputState {
    /// Held keys update movement flags; T, R, Delete and Escape fire once on press.
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> InputAction {
        let PhysicalKey::Code(code) = key else {
            return InputAction::None;
        };
        match code {
            KeyCode::KeyW => self.move_forward = pressed,
            KeyCode::KeyS => self.move_backward = pressed,
            KeyCode::KeyA => self.move_left = pressed,
            KeyCode::KeyD => self.move_right = pressed,
            KeyCode::KeyE | KeyCode::Space => self.move_up = pressed,
            KeyCode::KeyQ | KeyCode::ShiftLeft => self.move_down = pressed,
            KeyCode::ArrowLeft => self.aim_left = pressed,
            KeyCode::ArrowRight => self.aim_right = pressed,
            KeyCode::ArrowUp => self.aim_up = pressed,
            KeyCode::ArrowDown => self.aim_down = pressed,
            KeyCode::KeyT if pressed => return InputAction::SetGizmoMode(GizmoMode::Translate),
            KeyCode::KeyR if pressed => return InputAction::SetGizmoMode(GizmoMode::Rotate),
            KeyCode::Delete if pressed => return InputAction::DeleteSelected,
            KeyCode::Escape if pressed => return InputAction::Exit,
            _ => {}
        }
        InputAction::None
    }

    /// Drops every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    pub fn movement(&self) -> CameraMovement {
        CameraMovement {
            move_forward: self.move_forward,
            move_backward: self.move_backward,
            move_left: self.move_left,
            move_right: self.move_right,
            move_up: self.move_up,
            move_down: self.move_down,
            aim_left: self.aim_left,
            aim_right: self.aim_right,
            aim_up: self.aim_up,
            aim_down: self.aim_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> PhysicalKey {
        PhysicalKey::Code(code)
    }

    #[test]
    fn held_keys_drive_movement() {
        let mut input = InputState::default();
        assert_eq!(input.handle_key(key(KeyCode::KeyW), true), InputAction::None);
        input.handle_key(key(KeyCode::KeyQ), true);
        input.handle_key(key(KeyCode::ArrowLeft), true);

        let movement = input.movement();
        assert!(movement.move_forward && movement.move_down && movement.aim_left);
        assert!(!movement.move_backward);

        input.handle_key(key(KeyCode::KeyW), false);
        assert!(!input.movement().move_forward);

        input.release_all();
        assert!(!input.movement().move_down);
    }

    #[test]
    fn editor_shortcuts_fire_on_press_only() {
        let mut input = InputState::default();
        assert_eq!(
            input.handle_key(key(KeyCode::KeyR), true),
            InputAction::SetGizmoMode(GizmoMode::Rotate)
        );
        assert_eq!(
            input.handle_key(key(KeyCode::KeyT), true),
            InputAction::SetGizmoMode(GizmoMode::Translate)
        );
        assert_eq!(input.handle_key(key(KeyCode::Delete), true), InputAction::DeleteSelected);
        assert_eq!(input.handle_key(key(KeyCode::Delete), false), InputAction::None);
        assert_eq!(input.handle_key(key(KeyCode::Escape), true), InputAction::Exit);
    }
}
