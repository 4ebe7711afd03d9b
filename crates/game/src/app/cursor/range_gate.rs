use engine::Vec2;
use tracing::debug;

use super::collaborators::CursorFrameContext;
use super::events::CursorEvent;
use super::target::{Acquire, TargetStateMachine};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum RangeGateMode {
    /// Check every frame the button is up, so an approach that finishes
    /// after release still triggers the interaction.
    #[default]
    WhileReleased,
    /// Check only on the frame the button goes up.
    ReleaseEdgeOnly,
}

impl RangeGateMode {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "released" => Some(Self::WhileReleased),
            "release_edge" => Some(Self::ReleaseEdgeOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RangeGate {
    mode: RangeGateMode,
}

impl RangeGate {
    pub(crate) fn new(mode: RangeGateMode) -> Self {
        Self { mode }
    }

    pub(crate) fn mode(&self) -> RangeGateMode {
        self.mode
    }

    /// Runs on a frame where the left button is up.
    pub(crate) fn evaluate(
        &self,
        released_this_frame: bool,
        targeting: &mut TargetStateMachine,
        ctx: &mut CursorFrameContext<'_>,
        src_pos: Vec2,
    ) {
        targeting.clear_latch();
        if self.mode == RangeGateMode::ReleaseEdgeOnly && !released_this_frame {
            return;
        }

        let Some(target) = targeting.target() else {
            return;
        };
        let Some(target_pos) = ctx.world.position(target) else {
            debug!(target = target.0, "cursor_target_vanished");
            targeting.acquire(ctx, Acquire::Nothing);
            return;
        };
        let Some(interactable) = ctx.world.interactable(target) else {
            return;
        };

        let distance = src_pos.distance(target_pos);
        if distance > interactable.range {
            return;
        }

        targeting.acquire(ctx, Acquire::Nothing);
        ctx.interactions
            .interact(interactable.kind, ctx.controlled, target);
        ctx.events.emit(CursorEvent::InteractionFired {
            src: ctx.controlled,
            target,
            kind: interactable.kind,
        });
        debug!(
            src = ctx.controlled.0,
            target = target.0,
            kind = interactable.kind.as_token(),
            distance,
            range = interactable.range,
            "cursor_interaction_fired"
        );
    }
}
