use engine::PointerButton;
use tracing::debug;

use super::collaborators::CursorFrameContext;
use super::dispatch::ActionDispatcher;
use super::events::{CastSlot, CursorEvent};
use super::range_gate::{RangeGate, RangeGateMode};
use super::target::TargetStateMachine;

/// Turns per-frame pointer samples into drop, target, and interaction actions
/// for the controlled entity.
pub(crate) struct CursorMovementSystem {
    targeting: TargetStateMachine,
    dispatcher: ActionDispatcher,
    range_gate: RangeGate,
    was_left_down: bool,
}

impl CursorMovementSystem {
    pub(crate) fn new(dispatcher: ActionDispatcher, range_gate_mode: RangeGateMode) -> Self {
        Self {
            targeting: TargetStateMachine::default(),
            dispatcher,
            range_gate: RangeGate::new(range_gate_mode),
            was_left_down: false,
        }
    }

    pub(crate) fn targeting(&self) -> &TargetStateMachine {
        &self.targeting
    }

    pub(crate) fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub(crate) fn range_gate_mode(&self) -> RangeGateMode {
        self.range_gate.mode()
    }

    pub(crate) fn process_frame(&mut self, ctx: &mut CursorFrameContext<'_>) {
        self.dispatcher.pump();

        let left_down = ctx.input.is_down(PointerButton::Left);
        let released_this_frame = self.was_left_down && !left_down;
        self.was_left_down = left_down;
        // The latch never outlives the physical press, even on frames that
        // return before the range gate.
        if !left_down {
            self.targeting.clear_latch();
        }

        if let Some(cursor_px) = ctx.input.cursor_position_px() {
            if ctx.ui.is_occluded(cursor_px) {
                ctx.events.emit(CursorEvent::Occluded);
                return;
            }
        }

        let cast = if left_down && ctx.input.shift_down() {
            Some(CastSlot::Primary)
        } else if ctx.input.is_down(PointerButton::Right) {
            Some(CastSlot::Secondary)
        } else {
            None
        };
        if let Some(cast) = cast {
            ctx.events.emit(CursorEvent::CastIntent {
                caster: ctx.controlled,
                cast,
            });
            debug!(caster = ctx.controlled.0, cast = ?cast, "cursor_cast_intent");
            return;
        }

        let Some(src_pos) = ctx.world.position(ctx.controlled) else {
            debug!(controlled = ctx.controlled.0, "cursor_controlled_missing");
            return;
        };

        if !left_down {
            self.range_gate
                .evaluate(released_this_frame, &mut self.targeting, ctx, src_pos);
            return;
        }
        if self.targeting.require_release() {
            return;
        }
        if let Some(drop) = self.targeting.on_press(ctx, src_pos) {
            self.dispatcher
                .dispatch_drop(drop, &mut *ctx.world, &mut *ctx.events);
        }
    }
}
