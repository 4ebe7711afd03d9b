use engine::{EntityId, Vec2};
use tracing::debug;

use super::collaborators::{CursorFrameContext, PathDestination, PathGeneration, PathRequest};
use super::dispatch::DropAction;
use super::events::CursorEvent;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Acquire {
    Entity(EntityId),
    Point(Vec2),
    Nothing,
}

/// Press latch plus the controlled entity's current target.
#[derive(Debug, Default)]
pub(crate) struct TargetStateMachine {
    require_release: bool,
    target: Option<EntityId>,
    generation: PathGeneration,
}

impl TargetStateMachine {
    pub(crate) fn require_release(&self) -> bool {
        self.require_release
    }

    pub(crate) fn target(&self) -> Option<EntityId> {
        self.target
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> PathGeneration {
        self.generation
    }

    pub(crate) fn clear_latch(&mut self) {
        self.require_release = false;
    }

    /// Runs one frame of a live press. Only the first two branches latch; the
    /// others repeat every frame the button stays down.
    pub(crate) fn on_press(
        &mut self,
        ctx: &mut CursorFrameContext<'_>,
        src_pos: Vec2,
    ) -> Option<DropAction> {
        if let Some(item) = ctx.held_item.take() {
            self.require_release = true;
            return Some(DropAction {
                item,
                position: src_pos,
            });
        }

        if ctx.modals.dialog_open() {
            ctx.modals.close_dialog();
            self.require_release = true;
            ctx.events.emit(CursorEvent::DialogClosed);
            debug!("cursor_dialog_closed");
            return None;
        }

        if ctx.modals.menu_open() {
            ctx.modals.close_menu();
            ctx.events.emit(CursorEvent::MenuClosed);
            debug!("cursor_menu_closed");
        }

        if let Some(&hovered) = ctx.hover.current().first() {
            self.acquire(ctx, Acquire::Entity(hovered));
            return None;
        }

        match ctx.input.cursor_position_px() {
            Some(cursor_px) => {
                let point = ctx.camera.project_to_world(cursor_px);
                self.acquire(ctx, Acquire::Point(point));
            }
            None => debug!("cursor_press_without_position"),
        }
        None
    }

    pub(crate) fn acquire(
        &mut self,
        ctx: &mut CursorFrameContext<'_>,
        acquire: Acquire,
    ) -> PathGeneration {
        self.generation = self.generation.next();
        let generation = self.generation;
        let (destination, stop_at_interact_range) = match acquire {
            Acquire::Entity(target) => {
                self.target = Some(target);
                ctx.events
                    .emit(CursorEvent::TargetAcquired { target, generation });
                debug!(target = target.0, generation = generation.0, "cursor_target_acquired");
                (PathDestination::Entity(target), true)
            }
            Acquire::Point(point) => {
                self.target = None;
                ctx.events
                    .emit(CursorEvent::PointTargeted { point, generation });
                debug!(
                    x = point.x,
                    y = point.y,
                    generation = generation.0,
                    "cursor_point_targeted"
                );
                (PathDestination::Point(point), false)
            }
            Acquire::Nothing => {
                let previous = self.target.take();
                ctx.events.emit(CursorEvent::TargetCleared {
                    previous,
                    generation,
                });
                debug!(
                    previous = previous.map(|id| id.0),
                    generation = generation.0,
                    "cursor_target_cleared"
                );
                (PathDestination::Clear, false)
            }
        };

        ctx.pathfinder.request_path(PathRequest {
            entity: ctx.controlled,
            destination,
            stop_at_interact_range,
            generation,
        });
        generation
    }
}
