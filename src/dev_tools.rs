//! Development tools for the board, not included in release builds.

use bevy::{input::common_conditions::input_just_pressed, prelude::*};

use crate::{
    AppSystems,
    board::{EventGate, GateChanged, OperationFinished},
};

const TOGGLE_KEY: KeyCode = KeyCode::F3;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ShowHelpers>();
    app.add_systems(
        Update,
        (
            toggle_helpers.run_if(input_just_pressed(TOGGLE_KEY)),
            draw_helpers.run_if(|show: Res<ShowHelpers>| show.0),
        )
            .chain()
            .in_set(AppSystems::Update),
    );
    app.add_systems(Last, log_board_activity);
}

/// Whether the axis and light helpers are drawn.
#[derive(Resource, Debug, Default)]
struct ShowHelpers(bool);

fn toggle_helpers(mut show: ResMut<ShowHelpers>) {
    show.0 = !show.0;
    info!("Board helpers {}", if show.0 { "on" } else { "off" });
}

fn draw_helpers(mut gizmos: Gizmos, lights: Query<&GlobalTransform, With<SpotLight>>) {
    gizmos.axes(Transform::IDENTITY, 1000.0);
    for light in &lights {
        let origin = light.translation();
        gizmos.arrow(origin, origin + light.forward() * 40.0, Color::srgb(1.0, 0.9, 0.2));
        gizmos.sphere(Isometry3d::from_translation(origin), 4.0, Color::srgb(1.0, 0.9, 0.2));
    }
}

fn log_board_activity(
    gate: Res<EventGate>,
    mut gate_changes: MessageReader<GateChanged>,
    mut finished: MessageReader<OperationFinished>,
) {
    for change in gate_changes.read() {
        debug!(
            "gate {:?} = {} (held {:?}, {:?})",
            change.flags,
            change.value,
            gate.held(),
            gate.mode()
        );
    }
    for done in finished.read() {
        debug!("operation {:?} done, gate {:?}", done.0, gate.mode());
    }
}
