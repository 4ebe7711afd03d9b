pub mod app;

pub use app::{
    run_headless, screen_to_world_px, world_to_screen_px, Camera2D, Entity, EntityId,
    InputCollector, InputSnapshot, InputSource, Interactable, InteractableKind, Item, ItemId,
    LoopConfig, LoopError, LoopSummary, PointerButton, Scene, SceneCommand, SceneWorld,
    StopReason, Transform, Vec2, PICK_HALF_SIZE_PX, PIXELS_PER_WORLD,
};
