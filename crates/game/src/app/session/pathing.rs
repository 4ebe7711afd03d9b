use std::collections::HashMap;

use engine::{EntityId, SceneWorld, Vec2};
use tracing::debug;

use crate::app::cursor::{PathDestination, PathGeneration, PathRequest, Pathfinder};

const MOVE_SPEED_UNITS_PER_SECOND: f32 = 4.0;
const MOVE_ARRIVAL_THRESHOLD: f32 = 0.1;
/// Walkers headed for an interactable stop at this fraction of its range.
const INTERACT_STOP_FRACTION: f32 = 0.9;

#[derive(Debug, Clone, Copy)]
struct ActivePath {
    destination: PathDestination,
    stop_at_interact_range: bool,
    generation: PathGeneration,
}

/// Steers entities in a straight line toward their latest requested
/// destination. Requests are resolved on the next `step`, where anything older
/// than the newest generation seen for that entity is dropped.
#[derive(Debug, Default)]
pub(crate) struct StraightLinePathfinder {
    pending: Vec<PathRequest>,
    active: HashMap<EntityId, ActivePath>,
    latest_generation: HashMap<EntityId, PathGeneration>,
    stale_discarded: u64,
}

impl Pathfinder for StraightLinePathfinder {
    fn request_path(&mut self, request: PathRequest) {
        self.pending.push(request);
    }
}

impl StraightLinePathfinder {
    #[cfg(test)]
    pub(crate) fn is_moving(&self, entity: EntityId) -> bool {
        self.active.contains_key(&entity)
    }

    pub(crate) fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    pub(crate) fn step(&mut self, world: &mut SceneWorld, fixed_dt_seconds: f32) {
        self.resolve_pending();

        let mut finished = Vec::new();
        for (&entity, path) in &self.active {
            let Some(current) = world
                .find_entity(entity)
                .map(|walker| walker.transform.position)
            else {
                finished.push(entity);
                continue;
            };

            let (next, arrived) = match path.destination {
                PathDestination::Point(point) => step_toward(
                    current,
                    point,
                    MOVE_SPEED_UNITS_PER_SECOND,
                    fixed_dt_seconds,
                    MOVE_ARRIVAL_THRESHOLD,
                ),
                PathDestination::Entity(target) => {
                    let Some(goal) = world.find_entity(target) else {
                        debug!(entity = entity.0, target = target.0, "path_target_missing");
                        finished.push(entity);
                        continue;
                    };
                    // Never stop outside the range, however small it is.
                    let stop_distance = match goal.interactable {
                        Some(interactable) if path.stop_at_interact_range => {
                            (interactable.range * INTERACT_STOP_FRACTION).max(0.0)
                        }
                        _ => MOVE_ARRIVAL_THRESHOLD,
                    };
                    step_until_within(
                        current,
                        goal.transform.position,
                        MOVE_SPEED_UNITS_PER_SECOND,
                        fixed_dt_seconds,
                        stop_distance,
                    )
                }
                PathDestination::Clear => (current, true),
            };

            if let Some(walker) = world.find_entity_mut(entity) {
                walker.transform.position = next;
            }
            if arrived {
                debug!(
                    entity = entity.0,
                    generation = path.generation.0,
                    "path_arrived"
                );
                finished.push(entity);
            }
        }

        for entity in finished {
            self.active.remove(&entity);
        }
    }

    fn resolve_pending(&mut self) {
        for request in self.pending.drain(..) {
            let latest = self
                .latest_generation
                .entry(request.entity)
                .or_default();
            if request.generation < *latest {
                self.stale_discarded = self.stale_discarded.saturating_add(1);
                debug!(
                    entity = request.entity.0,
                    generation = request.generation.0,
                    latest = latest.0,
                    "path_request_stale"
                );
                continue;
            }
            *latest = request.generation;

            match request.destination {
                PathDestination::Clear => {
                    self.active.remove(&request.entity);
                }
                destination => {
                    self.active.insert(
                        request.entity,
                        ActivePath {
                            destination,
                            stop_at_interact_range: request.stop_at_interact_range,
                            generation: request.generation,
                        },
                    );
                }
            }
        }
    }
}

fn step_toward(
    current: Vec2,
    target: Vec2,
    speed: f32,
    fixed_dt_seconds: f32,
    arrival_threshold: f32,
) -> (Vec2, bool) {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let distance_sq = dx * dx + dy * dy;
    let threshold_sq = arrival_threshold * arrival_threshold;
    if distance_sq <= threshold_sq {
        return (target, true);
    }

    let distance = distance_sq.sqrt();
    let max_step = speed * fixed_dt_seconds;
    if max_step >= distance {
        return (target, true);
    }

    let inv_distance = distance.recip();
    (
        Vec2 {
            x: current.x + dx * inv_distance * max_step,
            y: current.y + dy * inv_distance * max_step,
        },
        false,
    )
}

/// Like [`step_toward`] but halts `stop_distance` short of `target` instead of
/// snapping onto it.
fn step_until_within(
    current: Vec2,
    target: Vec2,
    speed: f32,
    fixed_dt_seconds: f32,
    stop_distance: f32,
) -> (Vec2, bool) {
    let distance = current.distance(target);
    if distance <= stop_distance {
        return (current, true);
    }

    let remaining = distance - stop_distance;
    let max_step = speed * fixed_dt_seconds;
    let travel = remaining.min(max_step);
    let scale = travel / distance;
    let next = Vec2 {
        x: current.x + (target.x - current.x) * scale,
        y: current.y + (target.y - current.y) * scale,
    };
    (next, max_step >= remaining)
}
