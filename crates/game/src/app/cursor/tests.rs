use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener};
use std::rc::Rc;
use std::time::Duration;

use engine::{
    EntityId, InputSnapshot, Interactable, InteractableKind, Item, ItemId, PointerButton, Vec2,
};

use super::events::{CastSlot, CursorEvent};
use super::*;
use crate::app::net::envelope::decode_size_prefixed;
use crate::app::net::envelope::LENGTH_PREFIX_BYTES;
use crate::app::net::{
    ClientPacket, DropItem, TcpCommandTransport, Transport, TransportError,
    DEFAULT_OUTBOUND_CAP_BYTES,
};

const PLAYER: EntityId = EntityId(1);
const CHEST: EntityId = EntityId(42);
const NPC: EntityId = EntityId(43);
const CURSOR_PX: Vec2 = Vec2 { x: 64.0, y: 96.0 };

#[derive(Default)]
struct FakeWorld {
    positions: HashMap<EntityId, Vec2>,
    interactables: HashMap<EntityId, Interactable>,
    spawned: Vec<(EntityId, Item, Vec2)>,
    next_spawn_id: u64,
}

impl FakeWorld {
    fn place(&mut self, entity: EntityId, x: f32, y: f32) {
        self.positions.insert(entity, Vec2 { x, y });
    }
}

impl WorldStore for FakeWorld {
    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.positions.get(&entity).copied()
    }

    fn interactable(&self, entity: EntityId) -> Option<Interactable> {
        self.interactables.get(&entity).copied()
    }

    fn spawn_item(&mut self, item: Item, position: Vec2) -> EntityId {
        self.next_spawn_id += 1;
        let id = EntityId(1_000 + self.next_spawn_id);
        self.spawned.push((id, item, position));
        id
    }
}

#[derive(Default)]
struct FakeModals {
    dialog: bool,
    menu: bool,
}

impl ModalStack for FakeModals {
    fn dialog_open(&self) -> bool {
        self.dialog
    }

    fn close_dialog(&mut self) {
        self.dialog = false;
    }

    fn menu_open(&self) -> bool {
        self.menu
    }

    fn close_menu(&mut self) {
        self.menu = false;
    }
}

#[derive(Default)]
struct FakeHover(Vec<EntityId>);

impl HoverSet for FakeHover {
    fn current(&self) -> &[EntityId] {
        &self.0
    }
}

#[derive(Default)]
struct FakeUi {
    occluded: bool,
}

impl UiHitTest for FakeUi {
    fn is_occluded(&self, _screen_point: Vec2) -> bool {
        self.occluded
    }
}

struct PixelCamera;

impl CameraProjection for PixelCamera {
    fn project_to_world(&self, screen_point: Vec2) -> Vec2 {
        Vec2 {
            x: screen_point.x / 32.0,
            y: screen_point.y / 32.0,
        }
    }
}

#[derive(Default)]
struct RecordingPathfinder(Vec<PathRequest>);

impl Pathfinder for RecordingPathfinder {
    fn request_path(&mut self, request: PathRequest) {
        self.0.push(request);
    }
}

#[derive(Default)]
struct RecordingInteractions(Vec<(InteractableKind, EntityId, EntityId)>);

impl InteractionHandler for RecordingInteractions {
    fn interact(&mut self, kind: InteractableKind, src: EntityId, target: EntityId) {
        self.0.push((kind, src, target));
    }
}

#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Rc<RefCell<Vec<Vec<u8>>>>,
    fail: bool,
}

impl Transport for RecordingTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Disconnected);
        }
        self.sent.borrow_mut().push(bytes.to_vec());
        Ok(())
    }
}

/// Accepts every send but fails every flush with `flush_error`.
struct BrokenFlushTransport {
    flushes: Rc<Cell<u32>>,
    flush_error: fn() -> TransportError,
}

impl Transport for BrokenFlushTransport {
    fn send(&mut self, _bytes: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.flushes.set(self.flushes.get() + 1);
        Err((self.flush_error)())
    }
}

struct Harness {
    system: CursorMovementSystem,
    world: FakeWorld,
    modals: FakeModals,
    hover: FakeHover,
    ui: FakeUi,
    pathfinder: RecordingPathfinder,
    interactions: RecordingInteractions,
    held_item: HeldItemSlot,
    events: CursorEventBus,
}

impl Harness {
    fn with_dispatcher(dispatcher: ActionDispatcher, mode: RangeGateMode) -> Self {
        let mut world = FakeWorld::default();
        world.place(PLAYER, 0.0, 0.0);
        Self {
            system: CursorMovementSystem::new(dispatcher, mode),
            world,
            modals: FakeModals::default(),
            hover: FakeHover::default(),
            ui: FakeUi::default(),
            pathfinder: RecordingPathfinder::default(),
            interactions: RecordingInteractions::default(),
            held_item: HeldItemSlot::default(),
            events: CursorEventBus::default(),
        }
    }

    fn local() -> Self {
        Self::with_dispatcher(ActionDispatcher::local(), RangeGateMode::WhileReleased)
    }

    fn networked(transport: RecordingTransport) -> Self {
        Self::with_dispatcher(
            ActionDispatcher::networked(Box::new(transport)),
            RangeGateMode::WhileReleased,
        )
    }

    fn with_interactable(mut self, entity: EntityId, x: f32, y: f32, range: f32) -> Self {
        self.world.place(entity, x, y);
        self.world.interactables.insert(
            entity,
            Interactable {
                kind: InteractableKind::Open,
                range,
            },
        );
        self
    }

    fn frame(&mut self, input: InputSnapshot) -> Vec<CursorEvent> {
        let mut ctx = CursorFrameContext {
            controlled: PLAYER,
            input: &input,
            ui: &self.ui,
            modals: &mut self.modals,
            hover: &self.hover,
            camera: &PixelCamera,
            pathfinder: &mut self.pathfinder,
            world: &mut self.world,
            interactions: &mut self.interactions,
            held_item: &mut self.held_item,
            events: &mut self.events,
        };
        self.system.process_frame(&mut ctx);
        let emitted = self.events.iter_emitted_so_far().copied().collect();
        self.events.finish_frame_rollover();
        emitted
    }

    fn target(&self) -> Option<EntityId> {
        self.system.targeting().target()
    }

    fn latched(&self) -> bool {
        self.system.targeting().require_release()
    }
}

fn left_down() -> InputSnapshot {
    InputSnapshot::empty()
        .with_button_down(PointerButton::Left, true)
        .with_cursor_position_px(Some(CURSOR_PX))
        .with_window_size((800, 600))
}

fn left_up() -> InputSnapshot {
    InputSnapshot::empty()
        .with_cursor_position_px(Some(CURSOR_PX))
        .with_window_size((800, 600))
}

fn potion(id: u32) -> Item {
    Item {
        id: ItemId(id),
        name: "potion".to_string(),
    }
}

#[test]
fn held_item_press_in_local_mode_spawns_at_controlled_position() {
    let mut harness = Harness::local();
    harness.world.place(PLAYER, 2.0, 3.0);
    harness.held_item = HeldItemSlot::holding(potion(7));

    let events = harness.frame(left_down());

    assert_eq!(harness.world.spawned.len(), 1);
    let (spawned_id, item, position) = &harness.world.spawned[0];
    assert_eq!(item.id, ItemId(7));
    assert_eq!(*position, Vec2 { x: 2.0, y: 3.0 });
    assert!(harness.held_item.is_empty());
    assert!(harness.latched());
    assert!(harness.pathfinder.0.is_empty());
    assert_eq!(
        events,
        vec![CursorEvent::DropSpawnedLocally {
            item_id: ItemId(7),
            entity_id: *spawned_id,
            position: Vec2 { x: 2.0, y: 3.0 },
        }]
    );
}

#[test]
fn held_press_produces_one_action_for_the_whole_press() {
    let mut harness = Harness::local();
    harness.held_item = HeldItemSlot::holding(potion(7));
    harness.hover.0 = vec![CHEST];

    for _ in 0..5 {
        harness.frame(left_down());
    }

    assert_eq!(harness.world.spawned.len(), 1);
    assert!(harness.pathfinder.0.is_empty());
    assert_eq!(harness.target(), None);
    assert!(harness.latched());

    harness.frame(left_up());
    assert!(!harness.latched());
}

#[test]
fn held_item_press_in_networked_mode_sends_exactly_one_envelope() {
    let transport = RecordingTransport::default();
    let sent = Rc::clone(&transport.sent);
    let mut harness = Harness::networked(transport);
    harness.held_item = HeldItemSlot::holding(potion(7));

    let events = harness.frame(left_down());
    for _ in 0..3 {
        harness.frame(left_down());
    }
    harness.frame(left_up());
    harness.frame(left_down());
    harness.frame(left_up());

    assert!(harness.world.spawned.is_empty());
    assert!(harness.held_item.is_empty());
    assert_eq!(events, vec![CursorEvent::DropSent { item_id: ItemId(7) }]);

    let sent = sent.borrow();
    assert_eq!(sent.len(), 1);
    let (packet, consumed) = decode_size_prefixed(&sent[0])
        .expect("decode")
        .expect("complete frame");
    assert_eq!(consumed, sent[0].len());
    assert_eq!(packet, ClientPacket::DropItem(DropItem { item_id: 7 }));
}

#[test]
fn failed_send_is_not_retried_and_item_stays_cleared() {
    let transport = RecordingTransport {
        fail: true,
        ..RecordingTransport::default()
    };
    let sent = Rc::clone(&transport.sent);
    let mut harness = Harness::networked(transport);
    harness.held_item = HeldItemSlot::holding(potion(9));

    let events = harness.frame(left_down());
    harness.frame(left_down());

    assert_eq!(
        events,
        vec![CursorEvent::DropSendFailed { item_id: ItemId(9) }]
    );
    assert!(sent.borrow().is_empty());
    assert!(harness.held_item.is_empty());
    assert!(harness.world.spawned.is_empty());
    assert!(harness.latched());
    assert!(harness.system.dispatcher().is_networked());
}

#[test]
fn drop_preempts_dialog_and_targeting_on_same_press() {
    let mut harness = Harness::local();
    harness.held_item = HeldItemSlot::holding(potion(7));
    harness.modals.dialog = true;
    harness.modals.menu = true;
    harness.hover.0 = vec![CHEST];

    harness.frame(left_down());

    assert_eq!(harness.world.spawned.len(), 1);
    assert!(harness.modals.dialog);
    assert!(harness.modals.menu);
    assert_eq!(harness.target(), None);
}

#[test]
fn dialog_close_latches_without_changing_target() {
    let mut harness = Harness::local();
    harness.modals.dialog = true;
    harness.hover.0 = vec![CHEST];

    let events = harness.frame(left_down());
    harness.frame(left_down());

    assert_eq!(events, vec![CursorEvent::DialogClosed]);
    assert!(!harness.modals.dialog);
    assert!(harness.latched());
    assert_eq!(harness.target(), None);
    assert!(harness.pathfinder.0.is_empty());

    harness.frame(left_up());
    assert!(!harness.latched());
    harness.frame(left_down());
    assert_eq!(harness.target(), Some(CHEST));
}

#[test]
fn menu_close_falls_through_to_targeting() {
    let mut harness = Harness::local();
    harness.modals.menu = true;
    harness.hover.0 = vec![CHEST];

    let events = harness.frame(left_down());

    assert!(!harness.modals.menu);
    assert!(!harness.latched());
    assert_eq!(harness.target(), Some(CHEST));
    assert_eq!(events[0], CursorEvent::MenuClosed);
    assert!(matches!(
        events[1],
        CursorEvent::TargetAcquired { target: CHEST, .. }
    ));
}

#[test]
fn hover_press_acquires_first_member_with_stop_at_range() {
    let mut harness = Harness::local();
    harness.hover.0 = vec![CHEST, NPC];

    harness.frame(left_down());

    assert_eq!(harness.target(), Some(CHEST));
    assert_eq!(
        harness.pathfinder.0,
        vec![PathRequest {
            entity: PLAYER,
            destination: PathDestination::Entity(CHEST),
            stop_at_interact_range: true,
            generation: PathGeneration(1),
        }]
    );
}

#[test]
fn holding_reissues_path_requests_with_newer_generations() {
    let mut harness = Harness::local();
    harness.hover.0 = vec![CHEST];
    harness.frame(left_down());
    harness.frame(left_down());

    harness.hover.0.clear();
    harness.frame(left_down());
    harness.frame(left_down());

    let generations: Vec<u64> = harness
        .pathfinder
        .0
        .iter()
        .map(|request| request.generation.0)
        .collect();
    assert_eq!(generations, vec![1, 2, 3, 4]);
    assert_eq!(
        harness.pathfinder.0[1].destination,
        PathDestination::Entity(CHEST)
    );
    assert_eq!(
        harness.pathfinder.0[3],
        PathRequest {
            entity: PLAYER,
            destination: PathDestination::Point(Vec2 { x: 2.0, y: 3.0 }),
            stop_at_interact_range: false,
            generation: PathGeneration(4),
        }
    );
    assert!(!harness.latched());
    assert_eq!(harness.target(), None);
    assert_eq!(harness.system.targeting().generation(), PathGeneration(4));
}

#[test]
fn retargeting_keeps_at_most_one_target() {
    let mut harness = Harness::local()
        .with_interactable(CHEST, 10.0, 0.0, 1.0)
        .with_interactable(NPC, -10.0, 0.0, 1.0);

    harness.hover.0 = vec![CHEST];
    harness.frame(left_down());
    harness.frame(left_up());
    assert_eq!(harness.target(), Some(CHEST));

    harness.hover.0 = vec![NPC];
    harness.frame(left_down());
    harness.frame(left_up());
    assert_eq!(harness.target(), Some(NPC));

    harness.hover.0.clear();
    harness.frame(left_down());
    assert_eq!(harness.target(), None);
}

#[test]
fn release_without_target_is_inert() {
    let mut harness = Harness::local();

    for _ in 0..3 {
        assert!(harness.frame(left_up()).is_empty());
    }

    assert!(harness.pathfinder.0.is_empty());
    assert!(harness.interactions.0.is_empty());
    assert!(harness.world.spawned.is_empty());
}

#[test]
fn in_range_release_interacts_once_and_clears_target() {
    let mut harness = Harness::local().with_interactable(CHEST, 1.5, 0.0, 2.0);
    harness.hover.0 = vec![CHEST];
    harness.frame(left_down());

    let events = harness.frame(left_up());
    harness.frame(left_up());
    harness.frame(left_up());

    assert_eq!(
        harness.interactions.0,
        vec![(InteractableKind::Open, PLAYER, CHEST)]
    );
    assert_eq!(harness.target(), None);
    assert_eq!(
        harness.pathfinder.0.last().map(|request| request.destination),
        Some(PathDestination::Clear)
    );
    assert!(events.contains(&CursorEvent::InteractionFired {
        src: PLAYER,
        target: CHEST,
        kind: InteractableKind::Open,
    }));
}

#[test]
fn out_of_range_release_keeps_target_until_approach_finishes() {
    let mut harness = Harness::local().with_interactable(CHEST, 3.0, 0.0, 2.0);
    harness.hover.0 = vec![CHEST];
    harness.frame(left_down());

    harness.frame(left_up());
    assert!(harness.interactions.0.is_empty());
    assert_eq!(harness.target(), Some(CHEST));

    harness.world.place(PLAYER, 1.5, 0.0);
    harness.frame(left_up());
    assert_eq!(harness.interactions.0.len(), 1);
    assert_eq!(harness.target(), None);
}

#[test]
fn range_boundary_is_inclusive() {
    let mut at_range = Harness::local().with_interactable(CHEST, 2.0, 0.0, 2.0);
    at_range.hover.0 = vec![CHEST];
    at_range.frame(left_down());
    at_range.frame(left_up());
    assert_eq!(at_range.interactions.0.len(), 1);

    let mut past_range = Harness::local().with_interactable(CHEST, 2.0 + 1e-3, 0.0, 2.0);
    past_range.hover.0 = vec![CHEST];
    past_range.frame(left_down());
    past_range.frame(left_up());
    assert!(past_range.interactions.0.is_empty());
    assert_eq!(past_range.target(), Some(CHEST));
}

#[test]
fn target_without_interactable_keeps_relation() {
    let mut harness = Harness::local();
    harness.world.place(NPC, 0.5, 0.0);
    harness.hover.0 = vec![NPC];
    harness.frame(left_down());

    harness.frame(left_up());
    harness.frame(left_up());

    assert!(harness.interactions.0.is_empty());
    assert_eq!(harness.target(), Some(NPC));
    assert_eq!(harness.pathfinder.0.len(), 1);
}

#[test]
fn vanished_target_is_cleared_without_interaction() {
    let mut harness = Harness::local().with_interactable(CHEST, 5.0, 0.0, 1.0);
    harness.hover.0 = vec![CHEST];
    harness.frame(left_down());
    harness.world.positions.remove(&CHEST);

    let events = harness.frame(left_up());

    assert_eq!(harness.target(), None);
    assert!(harness.interactions.0.is_empty());
    assert_eq!(
        harness.pathfinder.0.last().map(|request| request.destination),
        Some(PathDestination::Clear)
    );
    assert!(matches!(
        events.as_slice(),
        [CursorEvent::TargetCleared {
            previous: Some(CHEST),
            ..
        }]
    ));
}

#[test]
fn release_edge_mode_checks_only_on_the_release_frame() {
    let mut harness = Harness::with_dispatcher(
        ActionDispatcher::local(),
        RangeGateMode::ReleaseEdgeOnly,
    )
    .with_interactable(CHEST, 3.0, 0.0, 2.0);
    assert_eq!(
        harness.system.range_gate_mode(),
        RangeGateMode::ReleaseEdgeOnly
    );
    harness.hover.0 = vec![CHEST];
    harness.frame(left_down());
    harness.frame(left_up());

    harness.world.place(PLAYER, 2.0, 0.0);
    harness.frame(left_up());
    assert!(harness.interactions.0.is_empty());
    assert_eq!(harness.target(), Some(CHEST));

    harness.frame(left_down());
    harness.frame(left_up());
    assert_eq!(harness.interactions.0.len(), 1);
}

#[test]
fn occluded_frame_takes_no_action() {
    let mut harness = Harness::local();
    harness.held_item = HeldItemSlot::holding(potion(7));
    harness.hover.0 = vec![CHEST];
    harness.ui.occluded = true;

    let events = harness.frame(left_down());

    assert_eq!(events, vec![CursorEvent::Occluded]);
    assert!(!harness.held_item.is_empty());
    assert!(harness.world.spawned.is_empty());
    assert!(harness.pathfinder.0.is_empty());
}

#[test]
fn latch_clears_on_release_even_over_ui() {
    let mut harness = Harness::local();
    harness.held_item = HeldItemSlot::holding(potion(7));
    harness.frame(left_down());
    assert!(harness.latched());

    harness.ui.occluded = true;
    harness.frame(left_up());
    assert!(!harness.latched());
}

#[test]
fn cast_buttons_skip_targeting_and_drop() {
    let mut harness = Harness::local();
    harness.held_item = HeldItemSlot::holding(potion(7));
    harness.hover.0 = vec![CHEST];

    let primary = harness.frame(left_down().with_shift_down(true));
    let secondary = harness.frame(left_up().with_button_down(PointerButton::Right, true));

    assert_eq!(
        primary,
        vec![CursorEvent::CastIntent {
            caster: PLAYER,
            cast: CastSlot::Primary,
        }]
    );
    assert_eq!(
        secondary,
        vec![CursorEvent::CastIntent {
            caster: PLAYER,
            cast: CastSlot::Secondary,
        }]
    );
    assert!(!harness.held_item.is_empty());
    assert!(harness.pathfinder.0.is_empty());
    assert_eq!(harness.target(), None);
}

#[test]
fn missing_controlled_entity_skips_the_frame() {
    let mut harness = Harness::local();
    harness.world.positions.remove(&PLAYER);
    harness.held_item = HeldItemSlot::holding(potion(7));

    assert!(harness.frame(left_down()).is_empty());
    assert!(!harness.held_item.is_empty());
}

#[test]
fn press_without_cursor_position_does_not_project() {
    let mut harness = Harness::local();

    harness.frame(
        InputSnapshot::empty()
            .with_button_down(PointerButton::Left, true)
            .with_window_size((800, 600)),
    );

    assert!(harness.pathfinder.0.is_empty());
    assert_eq!(harness.target(), None);
}

#[test]
fn networked_drop_reaches_peer_socket_over_loopback() {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).expect("bind");
    let addr = listener.local_addr().expect("addr");
    let transport =
        TcpCommandTransport::connect(addr, DEFAULT_OUTBOUND_CAP_BYTES, Duration::from_secs(1))
            .expect("connect");
    let (mut peer, _) = listener.accept().expect("accept");
    peer.set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set_read_timeout");

    let mut harness = Harness::with_dispatcher(
        ActionDispatcher::networked(Box::new(transport)),
        RangeGateMode::WhileReleased,
    );
    harness.held_item = HeldItemSlot::holding(potion(11));

    let events = harness.frame(left_down());
    harness.frame(left_up());
    assert_eq!(events, vec![CursorEvent::DropSent { item_id: ItemId(11) }]);

    let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
    peer.read_exact(&mut prefix).expect("read prefix");
    let mut frame = prefix.to_vec();
    frame.resize(LENGTH_PREFIX_BYTES + u32::from_le_bytes(prefix) as usize, 0);
    peer.read_exact(&mut frame[LENGTH_PREFIX_BYTES..])
        .expect("read payload");

    let (packet, consumed) = decode_size_prefixed(&frame)
        .expect("decode")
        .expect("complete frame");
    assert_eq!(consumed, frame.len());
    assert_eq!(packet, ClientPacket::DropItem(DropItem { item_id: 11 }));
    assert!(harness.world.spawned.is_empty());
}

#[test]
fn failing_flush_is_logged_and_frame_still_runs() {
    for flush_error in [
        (|| TransportError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "reset")))
            as fn() -> TransportError,
        || TransportError::Disconnected,
    ] {
        let flushes = Rc::new(Cell::new(0));
        let transport = BrokenFlushTransport {
            flushes: Rc::clone(&flushes),
            flush_error,
        };
        let mut harness = Harness::with_dispatcher(
            ActionDispatcher::networked(Box::new(transport)),
            RangeGateMode::WhileReleased,
        )
        .with_interactable(CHEST, 3.0, 0.0, 1.0);
        harness.hover = FakeHover(vec![CHEST]);

        harness.frame(left_down());
        harness.frame(left_up());

        assert_eq!(flushes.get(), 2);
        assert_eq!(harness.target(), Some(CHEST));
        assert_eq!(harness.pathfinder.0.len(), 1);
    }
}
