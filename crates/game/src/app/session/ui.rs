use engine::{EntityId, Vec2};

use crate::app::cursor::{ModalStack, UiHitTest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScreenRect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl ScreenRect {
    fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Screen-space panels that swallow pointer input.
#[derive(Debug, Default)]
pub(crate) struct UiOverlay {
    occluders: Vec<ScreenRect>,
}

impl UiOverlay {
    pub(crate) fn with_occluder(mut self, rect: ScreenRect) -> Self {
        self.occluders.push(rect);
        self
    }
}

impl UiHitTest for UiOverlay {
    fn is_occluded(&self, screen_point: Vec2) -> bool {
        self.occluders.iter().any(|rect| rect.contains(screen_point))
    }
}

#[derive(Debug, Default)]
pub(crate) struct ModalState {
    dialog_with: Option<EntityId>,
    menu_open: bool,
}

impl ModalState {
    pub(crate) fn open_dialog(&mut self, speaker: EntityId) {
        self.dialog_with = Some(speaker);
    }

    pub(crate) fn dialog_with(&self) -> Option<EntityId> {
        self.dialog_with
    }

    pub(crate) fn open_menu(&mut self) {
        self.menu_open = true;
    }
}

impl ModalStack for ModalState {
    fn dialog_open(&self) -> bool {
        self.dialog_with.is_some()
    }

    fn close_dialog(&mut self) {
        self.dialog_with = None;
    }

    fn menu_open(&self) -> bool {
        self.menu_open
    }

    fn close_menu(&mut self) {
        self.menu_open = false;
    }
}
