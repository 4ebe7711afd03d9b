use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::ModifiersState;

use super::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
}

const BUTTON_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ButtonStates {
    down: [bool; BUTTON_COUNT],
}

impl ButtonStates {
    pub(crate) fn set(&mut self, button: PointerButton, is_down: bool) {
        self.down[button.index()] = is_down;
    }

    pub(crate) fn is_down(&self, button: PointerButton) -> bool {
        self.down[button.index()]
    }
}

impl PointerButton {
    const fn index(self) -> usize {
        match self {
            PointerButton::Left => 0,
            PointerButton::Right => 1,
        }
    }

    fn from_winit(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(PointerButton::Left),
            MouseButton::Right => Some(PointerButton::Right),
            _ => None,
        }
    }
}

/// Level-triggered pointer sample for one simulation tick.
///
/// Buttons report whether they are held right now, not whether they changed;
/// consumers that need press/release semantics keep their own latch.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    buttons: ButtonStates,
    cursor_position_px: Option<Vec2>,
    shift_down: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, button: PointerButton) -> bool {
        self.buttons.is_down(button)
    }

    pub fn with_button_down(mut self, button: PointerButton, is_down: bool) -> Self {
        self.buttons.set(button, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_shift_down(mut self, shift_down: bool) -> Self {
        self.shift_down = shift_down;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn shift_down(&self) -> bool {
        self.shift_down
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

/// Folds window events into the pointer state sampled once per tick.
#[derive(Debug, Default)]
pub struct InputCollector {
    buttons: ButtonStates,
    cursor_position_px: Option<Vec2>,
    shift_down: bool,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    pub fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.handle_cursor_moved(*position),
            WindowEvent::CursorLeft { .. } => self.clear_cursor_position(),
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_input(*button, *state);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.handle_modifiers(modifiers.state());
            }
            WindowEvent::Resized(size) => self.handle_resized(*size),
            // Focus loss swallows the matching release event.
            WindowEvent::Focused(false) => self.buttons = ButtonStates::default(),
            _ => {}
        }
    }

    pub fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor_position_px = Some(Vec2 {
            x: position.x as f32,
            y: position.y as f32,
        });
    }

    pub fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    pub fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let Some(button) = PointerButton::from_winit(button) else {
            return;
        };
        self.buttons.set(button, state == ElementState::Pressed);
    }

    pub fn handle_modifiers(&mut self, modifiers: ModifiersState) {
        self.shift_down = modifiers.shift_key();
    }

    pub fn handle_resized(&mut self, size: PhysicalSize<u32>) {
        self.window_width = size.width;
        self.window_height = size.height;
    }

    pub fn snapshot_for_tick(&self) -> InputSnapshot {
        InputSnapshot {
            buttons: self.buttons,
            cursor_position_px: self.cursor_position_px,
            shift_down: self.shift_down,
            window_width: self.window_width,
            window_height: self.window_height,
        }
    }
}
