//! Per-frame pointer intent: drop the held item, pick a target, walk to it,
//! and interact once it is in range.

mod collaborators;
mod dispatch;
mod events;
mod held_item;
mod range_gate;
mod system;
mod target;

pub(crate) use collaborators::{
    CameraProjection, CursorFrameContext, HoverSet, InteractionHandler, ModalStack,
    PathDestination, PathGeneration, PathRequest, Pathfinder, UiHitTest, WorldStore,
};
pub(crate) use dispatch::ActionDispatcher;
pub(crate) use events::{CursorEventBus, CursorEventCounts};
pub(crate) use held_item::HeldItemSlot;
pub(crate) use range_gate::RangeGateMode;
pub(crate) use system::CursorMovementSystem;

#[cfg(test)]
mod tests;
