use std::process::ExitCode;

use engine::{run_headless, SceneWorld};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut scene,
        script,
    } = app;
    let mut world = SceneWorld::default();
    let mut input = script.snapshots();

    match run_headless(&config, &mut scene, &mut world, &mut input) {
        Ok(summary) => {
            let totals = scene.totals();
            info!(
                ticks_run = summary.ticks_run,
                stop = ?summary.stop_reason,
                drops_local = totals.drop_spawned_locally,
                drops_sent = totals.drop_sent,
                drops_failed = totals.drop_send_failed,
                targets_acquired = totals.target_acquired,
                points_targeted = totals.point_targeted,
                interactions = totals.interaction_fired,
                casts = totals.cast_intent,
                occluded = totals.occluded,
                "session_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}
