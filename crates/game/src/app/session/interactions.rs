use engine::{EntityId, InteractableKind, SceneWorld};
use tracing::{info, warn};

use super::ui::ModalState;
use super::world_view::SceneWorldStore;
use crate::app::cursor::{HeldItemSlot, InteractionHandler, WorldStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingInteraction {
    kind: InteractableKind,
    src: EntityId,
    target: EntityId,
}

/// Collects interactions fired during a frame and applies them once the
/// cursor system has released its borrows of the world.
#[derive(Debug, Default)]
pub(crate) struct SessionInteractions {
    pending: Vec<PendingInteraction>,
    applied_total: u64,
}

impl InteractionHandler for SessionInteractions {
    fn interact(&mut self, kind: InteractableKind, src: EntityId, target: EntityId) {
        self.pending.push(PendingInteraction { kind, src, target });
    }
}

impl SessionInteractions {
    pub(crate) fn applied_total(&self) -> u64 {
        self.applied_total
    }

    pub(crate) fn apply_pending(
        &mut self,
        world: &mut SceneWorld,
        modals: &mut ModalState,
        held_item: &mut HeldItemSlot,
    ) {
        for PendingInteraction { kind, src, target } in self.pending.drain(..) {
            self.applied_total = self.applied_total.saturating_add(1);
            match kind {
                InteractableKind::PickUp => pick_up(world, held_item, src, target),
                InteractableKind::Open => {
                    modals.open_menu();
                    info!(src = src.0, target = target.0, "container_opened");
                }
                InteractableKind::Talk => {
                    modals.open_dialog(target);
                    info!(src = src.0, target = target.0, "dialog_opened");
                }
                InteractableKind::Attack => {
                    info!(src = src.0, target = target.0, "attack_requested");
                }
            }
        }
    }
}

fn pick_up(world: &mut SceneWorld, held_item: &mut HeldItemSlot, src: EntityId, target: EntityId) {
    let Some(entity) = world.find_entity_mut(target) else {
        warn!(src = src.0, target = target.0, "pick_up_target_missing");
        return;
    };
    let Some(item) = entity.item.take() else {
        warn!(src = src.0, target = target.0, "pick_up_target_has_no_item");
        return;
    };
    let ground = entity.transform;
    world.despawn(target);
    info!(
        src = src.0,
        target = target.0,
        item_id = item.id.0,
        item = %item.name,
        "item_picked_up"
    );

    // The cursor holds one item; whatever it carried goes back on the ground.
    if let Some(displaced) = held_item.set(item) {
        let dropped = SceneWorldStore::new(world).spawn_item(displaced, ground.position);
        info!(entity_id = dropped.0, "held_item_swapped_to_ground");
    }
}
