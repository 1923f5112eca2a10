use tracing::trace;

use super::{FrameReport, Simulation};
use crate::game::input::InputIntent;

/// Executes simulation phases for one frame.
/// Ordered: physics -> look -> up -> movement -> camera -> bounds -> props.
pub(super) fn run_frame_phases(sim: &mut Simulation, intent: &InputIntent, dt: f32) -> FrameReport {
    // State broken between frames must not reach the engine.
    let recovered = sim.player.check_bounds(&mut sim.world);

    // Gravity forces for every dynamic body, then the fixed-step engine call.
    let step = sim.integrator.step(dt, &mut sim.world, &sim.field);

    sim.player.on_look(intent.look);

    // Up is re-derived at the post-step position; never carried over.
    let body = sim.player.body();
    if let Some(position) = sim.world.position(body) {
        sim.up = sim.field.up_at(&position);
    }
    let up = sim.up;

    let plan = sim.player.update(&mut sim.world, intent, &up);

    sim.player.sync_camera(&sim.world, &up);

    let mut bounds = sim.player.check_bounds(&mut sim.world);
    if bounds.was_reset() {
        // Next frame starts from spawn; reflect that in up and the camera right away.
        sim.up = sim.field.up_at(&sim.player.bounds().spawn_position());
        sim.player.sync_camera(&sim.world, &sim.up);
    } else if recovered.was_reset() {
        bounds = recovered;
    }

    let props = sim
        .props
        .update(sim.clock.elapsed(), &mut sim.world, body, &sim.up);

    let report = FrameReport {
        frame: sim.clock.frames(),
        dt,
        step,
        jumped: plan.map(|p| p.jumped).unwrap_or(false),
        grounded: plan.map(|p| p.grounded).unwrap_or(false),
        bounds,
        props,
    };
    trace!(?report, "frame");
    report
}
