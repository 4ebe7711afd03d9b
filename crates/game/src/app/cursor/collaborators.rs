use engine::{EntityId, InputSnapshot, Interactable, InteractableKind, Item, Vec2};

use super::events::CursorEventBus;
use super::held_item::HeldItemSlot;

/// Answers whether an overlay element consumes a screen point.
pub(crate) trait UiHitTest {
    fn is_occluded(&self, screen_point: Vec2) -> bool;
}

pub(crate) trait ModalStack {
    fn dialog_open(&self) -> bool;
    fn close_dialog(&mut self);
    fn menu_open(&self) -> bool;
    fn close_menu(&mut self);
}

/// Entities under the pointer this frame, topmost first.
pub(crate) trait HoverSet {
    fn current(&self) -> &[EntityId];
}

pub(crate) trait CameraProjection {
    fn project_to_world(&self, screen_point: Vec2) -> Vec2;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PathGeneration(pub(crate) u64);

impl PathGeneration {
    pub(crate) fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PathDestination {
    Entity(EntityId),
    Point(Vec2),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PathRequest {
    pub(crate) entity: EntityId,
    pub(crate) destination: PathDestination,
    pub(crate) stop_at_interact_range: bool,
    pub(crate) generation: PathGeneration,
}

/// Accepts path requests; results arrive on later frames and a newer
/// generation for the same entity supersedes older ones.
pub(crate) trait Pathfinder {
    fn request_path(&mut self, request: PathRequest);
}

pub(crate) trait WorldStore {
    fn position(&self, entity: EntityId) -> Option<Vec2>;
    fn interactable(&self, entity: EntityId) -> Option<Interactable>;
    fn spawn_item(&mut self, item: Item, position: Vec2) -> EntityId;
}

pub(crate) trait InteractionHandler {
    fn interact(&mut self, kind: InteractableKind, src: EntityId, target: EntityId);
}

/// Everything the cursor system touches during one frame.
pub(crate) struct CursorFrameContext<'a> {
    pub(crate) controlled: EntityId,
    pub(crate) input: &'a InputSnapshot,
    pub(crate) ui: &'a dyn UiHitTest,
    pub(crate) modals: &'a mut dyn ModalStack,
    pub(crate) hover: &'a dyn HoverSet,
    pub(crate) camera: &'a dyn CameraProjection,
    pub(crate) pathfinder: &'a mut dyn Pathfinder,
    pub(crate) world: &'a mut dyn WorldStore,
    pub(crate) interactions: &'a mut dyn InteractionHandler,
    pub(crate) held_item: &'a mut HeldItemSlot,
    pub(crate) events: &'a mut CursorEventBus,
}
