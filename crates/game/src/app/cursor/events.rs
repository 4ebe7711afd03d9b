use engine::{EntityId, InteractableKind, ItemId, Vec2};

use super::collaborators::PathGeneration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CastSlot {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CursorEvent {
    Occluded,
    CastIntent {
        caster: EntityId,
        cast: CastSlot,
    },
    DropSpawnedLocally {
        item_id: ItemId,
        entity_id: EntityId,
        position: Vec2,
    },
    DropSent {
        item_id: ItemId,
    },
    DropSendFailed {
        item_id: ItemId,
    },
    DialogClosed,
    MenuClosed,
    TargetAcquired {
        target: EntityId,
        generation: PathGeneration,
    },
    PointTargeted {
        point: Vec2,
        generation: PathGeneration,
    },
    TargetCleared {
        previous: Option<EntityId>,
        generation: PathGeneration,
    },
    InteractionFired {
        src: EntityId,
        target: EntityId,
        kind: InteractableKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorEventKind {
    Occluded,
    CastIntent,
    DropSpawnedLocally,
    DropSent,
    DropSendFailed,
    DialogClosed,
    MenuClosed,
    TargetAcquired,
    PointTargeted,
    TargetCleared,
    InteractionFired,
}

impl CursorEvent {
    fn kind(self) -> CursorEventKind {
        match self {
            Self::Occluded => CursorEventKind::Occluded,
            Self::CastIntent { .. } => CursorEventKind::CastIntent,
            Self::DropSpawnedLocally { .. } => CursorEventKind::DropSpawnedLocally,
            Self::DropSent { .. } => CursorEventKind::DropSent,
            Self::DropSendFailed { .. } => CursorEventKind::DropSendFailed,
            Self::DialogClosed => CursorEventKind::DialogClosed,
            Self::MenuClosed => CursorEventKind::MenuClosed,
            Self::TargetAcquired { .. } => CursorEventKind::TargetAcquired,
            Self::PointTargeted { .. } => CursorEventKind::PointTargeted,
            Self::TargetCleared { .. } => CursorEventKind::TargetCleared,
            Self::InteractionFired { .. } => CursorEventKind::InteractionFired,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CursorEventCounts {
    pub(crate) total: u32,
    pub(crate) occluded: u32,
    pub(crate) cast_intent: u32,
    pub(crate) drop_spawned_locally: u32,
    pub(crate) drop_sent: u32,
    pub(crate) drop_send_failed: u32,
    pub(crate) dialog_closed: u32,
    pub(crate) menu_closed: u32,
    pub(crate) target_acquired: u32,
    pub(crate) point_targeted: u32,
    pub(crate) target_cleared: u32,
    pub(crate) interaction_fired: u32,
}

impl CursorEventCounts {
    fn record(&mut self, kind: CursorEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            CursorEventKind::Occluded => &mut self.occluded,
            CursorEventKind::CastIntent => &mut self.cast_intent,
            CursorEventKind::DropSpawnedLocally => &mut self.drop_spawned_locally,
            CursorEventKind::DropSent => &mut self.drop_sent,
            CursorEventKind::DropSendFailed => &mut self.drop_send_failed,
            CursorEventKind::DialogClosed => &mut self.dialog_closed,
            CursorEventKind::MenuClosed => &mut self.menu_closed,
            CursorEventKind::TargetAcquired => &mut self.target_acquired,
            CursorEventKind::PointTargeted => &mut self.point_targeted,
            CursorEventKind::TargetCleared => &mut self.target_cleared,
            CursorEventKind::InteractionFired => &mut self.interaction_fired,
        };
        *slot = slot.saturating_add(1);
    }

    pub(crate) fn accumulate(&mut self, other: &CursorEventCounts) {
        self.total = self.total.saturating_add(other.total);
        self.occluded = self.occluded.saturating_add(other.occluded);
        self.cast_intent = self.cast_intent.saturating_add(other.cast_intent);
        self.drop_spawned_locally = self
            .drop_spawned_locally
            .saturating_add(other.drop_spawned_locally);
        self.drop_sent = self.drop_sent.saturating_add(other.drop_sent);
        self.drop_send_failed = self.drop_send_failed.saturating_add(other.drop_send_failed);
        self.dialog_closed = self.dialog_closed.saturating_add(other.dialog_closed);
        self.menu_closed = self.menu_closed.saturating_add(other.menu_closed);
        self.target_acquired = self.target_acquired.saturating_add(other.target_acquired);
        self.point_targeted = self.point_targeted.saturating_add(other.point_targeted);
        self.target_cleared = self.target_cleared.saturating_add(other.target_cleared);
        self.interaction_fired = self
            .interaction_fired
            .saturating_add(other.interaction_fired);
    }
}

/// Decisions made by the cursor system during the current frame.
#[derive(Debug, Default)]
pub(crate) struct CursorEventBus {
    current_frame_events: Vec<CursorEvent>,
    last_frame_counts: CursorEventCounts,
}

impl CursorEventBus {
    pub(crate) fn emit(&mut self, event: CursorEvent) {
        self.current_frame_events.push(event);
    }

    #[cfg(test)]
    pub(crate) fn iter_emitted_so_far(&self) -> impl Iterator<Item = &CursorEvent> {
        self.current_frame_events.iter()
    }

    pub(crate) fn finish_frame_rollover(&mut self) {
        let mut counts = CursorEventCounts::default();
        for event in &self.current_frame_events {
            counts.record(event.kind());
        }
        self.last_frame_counts = counts;
        self.current_frame_events.clear();
    }

    pub(crate) fn last_frame_counts(&self) -> CursorEventCounts {
        self.last_frame_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollover_counts_last_frame_and_clears_current() {
        let mut bus = CursorEventBus::default();
        bus.emit(CursorEvent::MenuClosed);
        bus.emit(CursorEvent::TargetAcquired {
            target: EntityId(4),
            generation: PathGeneration(1),
        });
        bus.emit(CursorEvent::TargetAcquired {
            target: EntityId(4),
            generation: PathGeneration(2),
        });
        assert_eq!(bus.iter_emitted_so_far().count(), 3);

        bus.finish_frame_rollover();
        let counts = bus.last_frame_counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.menu_closed, 1);
        assert_eq!(counts.target_acquired, 2);
        assert_eq!(bus.iter_emitted_so_far().count(), 0);

        bus.finish_frame_rollover();
        assert_eq!(bus.last_frame_counts(), CursorEventCounts::default());
    }

    #[test]
    fn accumulate_sums_per_kind() {
        let mut bus = CursorEventBus::default();
        bus.emit(CursorEvent::DropSent { item_id: ItemId(7) });
        bus.finish_frame_rollover();

        let mut totals = CursorEventCounts::default();
        totals.accumulate(&bus.last_frame_counts());
        totals.accumulate(&bus.last_frame_counts());
        assert_eq!(totals.total, 2);
        assert_eq!(totals.drop_sent, 2);
    }
}
