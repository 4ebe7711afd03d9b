use crate::app::{Camera2D, Vec2};

pub const PIXELS_PER_WORLD: f32 = 32.0;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

pub fn world_to_screen(
    world: Vec2,
    camera: &Camera2D,
    viewport: Viewport,
    pixels_per_world: f32,
) -> (i32, i32) {
    let x = (world.x - camera.position.x) * pixels_per_world + viewport.width as f32 * 0.5;
    let y = viewport.height as f32 * 0.5 - (world.y - camera.position.y) * pixels_per_world;
    (x.round() as i32, y.round() as i32)
}

/// Inverse of [`world_to_screen`]; screen y grows downward, world y grows upward.
pub fn screen_to_world(
    screen: Vec2,
    camera: &Camera2D,
    viewport: Viewport,
    pixels_per_world: f32,
) -> Vec2 {
    let safe_pixels_per_world = if pixels_per_world.is_finite() && pixels_per_world > 0.0 {
        pixels_per_world
    } else {
        PIXELS_PER_WORLD
    };
    Vec2 {
        x: (screen.x - viewport.width as f32 * 0.5) / safe_pixels_per_world + camera.position.x,
        y: (viewport.height as f32 * 0.5 - screen.y) / safe_pixels_per_world + camera.position.y,
    }
}

pub fn world_to_screen_px(camera: &Camera2D, window_size: (u32, u32), world: Vec2) -> (i32, i32) {
    world_to_screen(
        world,
        camera,
        viewport_from_window(window_size),
        PIXELS_PER_WORLD * camera.effective_zoom(),
    )
}

pub fn screen_to_world_px(camera: &Camera2D, window_size: (u32, u32), screen_px: Vec2) -> Vec2 {
    screen_to_world(
        screen_px,
        camera,
        viewport_from_window(window_size),
        PIXELS_PER_WORLD * camera.effective_zoom(),
    )
}

fn viewport_from_window(window_size: (u32, u32)) -> Viewport {
    Viewport {
        width: window_size.0,
        height: window_size.1,
    }
}
