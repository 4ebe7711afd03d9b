mod interactions;
mod pathing;
mod ui;
mod world_view;

use engine::{
    EntityId, InputSnapshot, Interactable, InteractableKind, Item, ItemId, Scene, SceneCommand,
    SceneWorld, Transform, Vec2,
};
use tracing::info;

use crate::app::cursor::{
    CursorEventBus, CursorEventCounts, CursorFrameContext, CursorMovementSystem, HeldItemSlot,
};
use interactions::SessionInteractions;
use pathing::StraightLinePathfinder;
pub(crate) use ui::{ModalState, ScreenRect, UiOverlay};
use world_view::{CameraView, HoverSnapshot, SceneWorldStore};

const PLAYER_START: Vec2 = Vec2 { x: 0.0, y: 0.0 };
const CHEST_POS: Vec2 = Vec2 { x: 4.0, y: 0.0 };
const NPC_POS: Vec2 = Vec2 { x: -3.0, y: 2.0 };
const MONSTER_POS: Vec2 = Vec2 { x: 0.0, y: -5.0 };
const GROUND_ITEM_POS: Vec2 = Vec2 { x: 2.0, y: 3.0 };
const CONTAINER_RANGE: f32 = 1.5;
const TALK_RANGE: f32 = 2.0;
const MELEE_RANGE: f32 = 1.0;
const PICKUP_RANGE: f32 = 1.0;

/// One playable session: a controlled player in a small demo world, driven
/// by the cursor system every tick.
pub(crate) struct CursorScene {
    cursor: CursorMovementSystem,
    ui: UiOverlay,
    modals: ModalState,
    hover: HoverSnapshot,
    pathfinder: StraightLinePathfinder,
    interactions: SessionInteractions,
    held_item: HeldItemSlot,
    events: CursorEventBus,
    totals: CursorEventCounts,
    player: Option<EntityId>,
    frames: u64,
}

impl CursorScene {
    pub(crate) fn new(cursor: CursorMovementSystem, ui: UiOverlay) -> Self {
        Self {
            cursor,
            ui,
            modals: ModalState::default(),
            hover: HoverSnapshot::default(),
            pathfinder: StraightLinePathfinder::default(),
            interactions: SessionInteractions::default(),
            held_item: HeldItemSlot::default(),
            events: CursorEventBus::default(),
            totals: CursorEventCounts::default(),
            player: None,
            frames: 0,
        }
    }

    pub(crate) fn totals(&self) -> CursorEventCounts {
        self.totals
    }

    #[cfg(test)]
    pub(crate) fn player(&self) -> Option<EntityId> {
        self.player
    }

    fn spawn_demo_world(&mut self, world: &mut SceneWorld) {
        let player = world.spawn_hoverable(at(PLAYER_START), "player");
        world.spawn_interactable(
            at(CHEST_POS),
            "chest",
            Interactable {
                kind: InteractableKind::Open,
                range: CONTAINER_RANGE,
            },
        );
        world.spawn_interactable(
            at(NPC_POS),
            "npc",
            Interactable {
                kind: InteractableKind::Talk,
                range: TALK_RANGE,
            },
        );
        world.spawn_interactable(
            at(MONSTER_POS),
            "monster",
            Interactable {
                kind: InteractableKind::Attack,
                range: MELEE_RANGE,
            },
        );
        world.spawn_item(
            at(GROUND_ITEM_POS),
            Item {
                id: ItemId(2),
                name: "rune".to_string(),
            },
            Interactable {
                kind: InteractableKind::PickUp,
                range: PICKUP_RANGE,
            },
        );
        self.player = Some(player);
        self.held_item = HeldItemSlot::holding(Item {
            id: ItemId(1),
            name: "minor healing potion".to_string(),
        });
    }
}

impl Scene for CursorScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.clear();
        self.spawn_demo_world(world);
        info!(
            networked = self.cursor.dispatcher().is_networked(),
            range_gate = ?self.cursor.range_gate_mode(),
            "cursor_scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let Some(player) = self.player else {
            return SceneCommand::None;
        };

        let window_size = input.window_size();
        self.hover
            .refresh(world, input.cursor_position_px(), window_size, Some(player));
        let camera = CameraView::new(*world.camera(), window_size);
        {
            let mut store = SceneWorldStore::new(world);
            let mut ctx = CursorFrameContext {
                controlled: player,
                input,
                ui: &self.ui,
                modals: &mut self.modals,
                hover: &self.hover,
                camera: &camera,
                pathfinder: &mut self.pathfinder,
                world: &mut store,
                interactions: &mut self.interactions,
                held_item: &mut self.held_item,
                events: &mut self.events,
            };
            self.cursor.process_frame(&mut ctx);
        }

        self.interactions
            .apply_pending(world, &mut self.modals, &mut self.held_item);
        self.pathfinder.step(world, fixed_dt_seconds);

        self.events.finish_frame_rollover();
        self.totals.accumulate(&self.events.last_frame_counts());
        self.frames = self.frames.saturating_add(1);
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        let player_position = self
            .player
            .and_then(|player| world.find_entity(player))
            .map(|player| player.transform.position);
        info!(
            frames = self.frames,
            entity_count = world.entity_count(),
            player_x = player_position.map(|position| position.x),
            player_y = player_position.map(|position| position.y),
            target = self.cursor.targeting().target().map(|target| target.0),
            held_item = self.held_item.peek().map(|item| item.id.0),
            dialog_with = self.modals.dialog_with().map(|speaker| speaker.0),
            interactions = self.interactions.applied_total(),
            stale_paths = self.pathfinder.stale_discarded(),
            "cursor_scene_unload"
        );
        self.player = None;
        self.hover = HoverSnapshot::default();
        self.events = CursorEventBus::default();
    }
}

fn at(position: Vec2) -> Transform {
    Transform { position }
}
