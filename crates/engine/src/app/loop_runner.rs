use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use super::{InputSnapshot, Scene, SceneCommand, SceneWorld};

const PROGRESS_LOG_EVERY_TICKS: u64 = 600;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_ticks: Option<u64>,
    /// Sleep between ticks so the run is paced like a live session.
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: None,
            realtime: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("target_tps must be greater than zero")]
    ZeroTickRate,
}

/// Supplies one pointer sample per simulation tick; `None` ends the run.
pub trait InputSource {
    fn next_snapshot(&mut self) -> Option<InputSnapshot>;
}

impl<I> InputSource for I
where
    I: Iterator<Item = InputSnapshot>,
{
    fn next_snapshot(&mut self) -> Option<InputSnapshot> {
        self.next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    InputExhausted,
    SceneQuit,
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks_run: u64,
    pub stop_reason: StopReason,
}

pub fn run_headless(
    config: &LoopConfig,
    scene: &mut dyn Scene,
    world: &mut SceneWorld,
    input: &mut dyn InputSource,
) -> Result<LoopSummary, LoopError> {
    let fixed_dt = fixed_dt_from_tps(config.target_tps)?;
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    scene.load(world);
    world.apply_pending();
    info!(
        target_tps = config.target_tps,
        entity_count = world.entity_count(),
        "headless_loop_started"
    );

    let mut ticks_run = 0u64;
    let stop_reason = loop {
        if config.max_ticks.is_some_and(|max| ticks_run >= max) {
            break StopReason::TickLimit;
        }
        let Some(snapshot) = input.next_snapshot() else {
            break StopReason::InputExhausted;
        };

        let tick_started = Instant::now();
        let command = scene.update(fixed_dt_seconds, &snapshot, world);
        world.apply_pending();
        ticks_run = ticks_run.saturating_add(1);

        if ticks_run % PROGRESS_LOG_EVERY_TICKS == 0 {
            debug!(
                ticks_run,
                entity_count = world.entity_count(),
                "headless_loop_progress"
            );
        }
        if command == SceneCommand::Quit {
            break StopReason::SceneQuit;
        }
        if config.realtime {
            if let Some(remaining) = fixed_dt.checked_sub(tick_started.elapsed()) {
                thread::sleep(remaining);
            }
        }
    };

    scene.unload(world);
    info!(ticks_run, stop = ?stop_reason, "headless_loop_finished");
    Ok(LoopSummary {
        ticks_run,
        stop_reason,
    })
}

fn fixed_dt_from_tps(target_tps: u32) -> Result<Duration, LoopError> {
    if target_tps == 0 {
        return Err(LoopError::ZeroTickRate);
    }
    Ok(Duration::from_secs_f64(1.0 / target_tps as f64))
}
