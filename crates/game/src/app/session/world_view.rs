use engine::{
    screen_to_world_px, Camera2D, EntityId, Interactable, InteractableKind, Item, SceneWorld,
    Transform, Vec2,
};

use crate::app::cursor::{CameraProjection, HoverSet, WorldStore};

pub(crate) const DROPPED_ITEM_PICKUP_RANGE: f32 = 1.0;

/// Cursor-facing view of the session's entity storage.
pub(crate) struct SceneWorldStore<'w> {
    world: &'w mut SceneWorld,
}

impl<'w> SceneWorldStore<'w> {
    pub(crate) fn new(world: &'w mut SceneWorld) -> Self {
        Self { world }
    }
}

impl WorldStore for SceneWorldStore<'_> {
    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.world
            .find_entity(entity)
            .map(|found| found.transform.position)
    }

    fn interactable(&self, entity: EntityId) -> Option<Interactable> {
        self.world
            .find_entity(entity)
            .and_then(|found| found.interactable)
    }

    fn spawn_item(&mut self, item: Item, position: Vec2) -> EntityId {
        self.world.spawn_item(
            Transform { position },
            item,
            Interactable {
                kind: InteractableKind::PickUp,
                range: DROPPED_ITEM_PICKUP_RANGE,
            },
        )
    }
}

/// Entities under the cursor, captured once at the start of a frame.
#[derive(Debug, Default)]
pub(crate) struct HoverSnapshot {
    hovered: Vec<EntityId>,
}

impl HoverSnapshot {
    pub(crate) fn refresh(
        &mut self,
        world: &SceneWorld,
        cursor_position_px: Option<Vec2>,
        window_size: (u32, u32),
        exclude: Option<EntityId>,
    ) {
        match cursor_position_px {
            Some(cursor_px) => {
                world.pick_hoverable_at_cursor(cursor_px, window_size, exclude, &mut self.hovered)
            }
            None => self.hovered.clear(),
        }
    }
}

impl HoverSet for HoverSnapshot {
    fn current(&self) -> &[EntityId] {
        &self.hovered
    }
}

pub(crate) struct CameraView {
    camera: Camera2D,
    window_size: (u32, u32),
}

impl CameraView {
    pub(crate) fn new(camera: Camera2D, window_size: (u32, u32)) -> Self {
        Self {
            camera,
            window_size,
        }
    }
}

impl CameraProjection for CameraView {
    fn project_to_world(&self, screen_point: Vec2) -> Vec2 {
        screen_to_world_px(&self.camera, self.window_size, screen_point)
    }
}
