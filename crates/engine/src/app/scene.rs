use super::input::InputSnapshot;
use super::projection::world_to_screen_px;

/// Half extent, in screen pixels, of the square used to pick an entity under the cursor.
pub const PICK_HALF_SIZE_PX: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractableKind {
    PickUp,
    Open,
    Talk,
    Attack,
}

impl InteractableKind {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::PickUp => "pick_up",
            Self::Open => "open",
            Self::Talk => "talk",
            Self::Attack => "attack",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interactable {
    pub kind: InteractableKind,
    pub range: f32,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub debug_name: &'static str,
    pub hoverable: bool,
    pub interactable: Option<Interactable>,
    pub item: Option<Item>,
    applied_spawn_order: u64,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entity storage for one session. Spawns and despawns are deferred until
/// [`SceneWorld::apply_pending`], which the loop runner calls after every tick.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, debug_name: &'static str) -> EntityId {
        self.spawn_internal(transform, debug_name, false, None, None)
    }

    pub fn spawn_hoverable(&mut self, transform: Transform, debug_name: &'static str) -> EntityId {
        self.spawn_internal(transform, debug_name, true, None, None)
    }

    pub fn spawn_interactable(
        &mut self,
        transform: Transform,
        debug_name: &'static str,
        interactable: Interactable,
    ) -> EntityId {
        self.spawn_internal(transform, debug_name, true, Some(interactable), None)
    }

    pub fn spawn_item(
        &mut self,
        transform: Transform,
        item: Item,
        interactable: Interactable,
    ) -> EntityId {
        self.spawn_internal(transform, "item", true, Some(interactable), Some(item))
    }

    fn spawn_internal(
        &mut self,
        transform: Transform,
        debug_name: &'static str,
        hoverable: bool,
        interactable: Option<Interactable>,
        item: Option<Item>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            debug_name,
            hoverable,
            interactable,
            item,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_spawns.retain(|entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_err()
            });
            self.pending_despawns.clear();
        }

        if !self.pending_spawns.is_empty() {
            for mut entity in self.pending_spawns.drain(..) {
                entity.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.entities.push(entity);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    /// Hoverable entities under the cursor, topmost (most recently applied) first.
    pub fn pick_hoverable_at_cursor(
        &self,
        cursor_position_px: Vec2,
        window_size: (u32, u32),
        exclude: Option<EntityId>,
        out: &mut Vec<EntityId>,
    ) {
        out.clear();
        let cursor_x = cursor_position_px.x.round() as i32;
        let cursor_y = cursor_position_px.y.round() as i32;
        let mut hits: Vec<(u64, EntityId)> = Vec::new();

        for entity in &self.entities {
            if !entity.hoverable || Some(entity.id) == exclude {
                continue;
            }

            let (cx, cy) =
                world_to_screen_px(self.camera(), window_size, entity.transform.position);
            let in_bounds = cursor_x >= cx - PICK_HALF_SIZE_PX
                && cursor_x <= cx + PICK_HALF_SIZE_PX
                && cursor_y >= cy - PICK_HALF_SIZE_PX
                && cursor_y <= cy + PICK_HALF_SIZE_PX;
            if in_bounds {
                hits.push((entity.applied_spawn_order, entity.id));
            }
        }

        hits.sort_by(|a, b| b.0.cmp(&a.0));
        out.extend(hits.into_iter().map(|(_, id)| id));
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> Transform {
        Transform {
            position: Vec2 { x, y },
        }
    }

    fn chest() -> Interactable {
        Interactable {
            kind: InteractableKind::Open,
            range: 1.0,
        }
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn scene_world_spawn_and_despawn_updates_count() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), "spawned");
        assert_eq!(world.entity_count(), 0);
        world.apply_pending();
        assert_eq!(world.entity_count(), 1);

        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.despawn(id));
    }

    #[test]
    fn despawn_of_pending_spawn_never_materializes() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Transform::default(), "short_lived");
        assert!(world.despawn(id));
        world.apply_pending();
        assert!(world.find_entity(id).is_none());
    }

    #[test]
    fn spawn_item_keeps_payload_and_interactable() {
        let mut world = SceneWorld::default();
        let item = Item {
            id: ItemId(7),
            name: "rune".to_string(),
        };
        let id = world.spawn_item(
            at(1.0, 2.0),
            item.clone(),
            Interactable {
                kind: InteractableKind::PickUp,
                range: 0.5,
            },
        );
        world.apply_pending();

        let entity = world.find_entity(id).expect("item entity");
        assert_eq!(entity.item.as_ref(), Some(&item));
        assert_eq!(
            entity.interactable.map(|interactable| interactable.kind),
            Some(InteractableKind::PickUp)
        );
        assert!(entity.hoverable);
    }

    #[test]
    fn pick_orders_topmost_first_and_skips_non_hoverable() {
        let mut world = SceneWorld::default();
        let hidden = world.spawn(at(0.0, 0.0), "floor_decal");
        let first = world.spawn_interactable(at(0.0, 0.0), "chest", chest());
        let second = world.spawn_hoverable(at(0.1, 0.0), "statue");
        world.apply_pending();

        let mut out = Vec::new();
        world.pick_hoverable_at_cursor(Vec2 { x: 400.0, y: 300.0 }, (800, 600), None, &mut out);
        assert_eq!(out, vec![second, first]);
        assert!(!out.contains(&hidden));
    }

    #[test]
    fn pick_excludes_requested_entity_and_empty_space() {
        let mut world = SceneWorld::default();
        let player = world.spawn_hoverable(at(0.0, 0.0), "player");
        world.apply_pending();

        let mut out = vec![EntityId(99)];
        world.pick_hoverable_at_cursor(
            Vec2 { x: 400.0, y: 300.0 },
            (800, 600),
            Some(player),
            &mut out,
        );
        assert!(out.is_empty());

        world.pick_hoverable_at_cursor(Vec2 { x: 10.0, y: 10.0 }, (800, 600), None, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn vec2_distance_is_euclidean() {
        let a = Vec2 { x: 0.0, y: 0.0 };
        let b = Vec2 { x: 3.0, y: 4.0 };
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn camera_zoom_is_clamped() {
        let mut camera = Camera2D::default();
        camera.set_zoom_clamped(10.0);
        assert_eq!(camera.effective_zoom(), CAMERA_ZOOM_MAX);
        camera.zoom = f32::NAN;
        assert_eq!(camera.effective_zoom(), CAMERA_ZOOM_DEFAULT);
    }
}
