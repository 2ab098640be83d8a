//! The interactive card board.

mod backdrop;
mod behavior;
mod card;
mod choreo;
mod gate;
mod motion;
mod orbit;
mod pointer;
mod scene;
mod zones;

use bevy::prelude::*;

pub use backdrop::Backdrop;
pub use behavior::BoardRequest;
pub use card::{Card, CastsShadow, Facing, Location};
pub use choreo::OperationFinished;
pub use gate::{EventGate, GateChanged, GateFlags};
pub use motion::InFlight;
pub use zones::Zones;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        logic_plugin,
        pointer::plugin,
        scene::plugin,
        orbit::plugin,
    ));
}

/// Board state and the animation coordinator, without input or rendering.
pub(crate) fn logic_plugin(app: &mut App) {
    app.add_plugins((
        card::plugin,
        gate::plugin,
        zones::plugin,
        behavior::plugin,
        motion::plugin,
        backdrop::plugin,
        choreo::plugin,
    ));
}
