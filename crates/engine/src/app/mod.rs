mod input;
mod loop_runner;
mod projection;
mod scene;

pub use input::{InputCollector, InputSnapshot, PointerButton};
pub use loop_runner::{run_headless, InputSource, LoopConfig, LoopError, LoopSummary, StopReason};
pub use projection::{
    screen_to_world, screen_to_world_px, world_to_screen, world_to_screen_px, Viewport,
    PIXELS_PER_WORLD,
};
pub use scene::{
    Camera2D, Entity, EntityId, EntityIdAllocator, Interactable, InteractableKind, Item, ItemId,
    Scene, SceneCommand, SceneWorld, Transform, Vec2, PICK_HALF_SIZE_PX,
};
