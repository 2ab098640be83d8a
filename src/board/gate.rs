//! Event gate - advisory flags deciding which interaction handlers may run.

use std::ops::BitOr;

use bevy::{ecs::message::Message, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<EventGate>();
    app.add_message::<GateChanged>();
}

/// A set of gate flags, combined with `|`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub struct GateFlags(u8);

impl GateFlags {
    pub const NONE: GateFlags = GateFlags(0);
    /// Browsing: board actions and hover feedback.
    pub const MAIN: GateFlags = GateFlags(1 << 0);
    /// Inspecting a zoomed card.
    pub const HOP_UP: GateFlags = GateFlags(1 << 1);
    pub const MOUSE_OVER: GateFlags = GateFlags(1 << 2);
    pub const CLICK: GateFlags = GateFlags(1 << 3);

    pub fn contains(self, other: GateFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for GateFlags {
    type Output = GateFlags;

    fn bitor(self, rhs: GateFlags) -> GateFlags {
        GateFlags(self.0 | rhs.0)
    }
}

/// Interaction mode implied by the `main`/`hop_up` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateMode {
    Browsing,
    Inspecting,
    /// Neither flag holds, e.g. while a draw is animating.
    Busy,
    /// Both flags hold. Never produced by the coordinator.
    Conflicted,
}

/// Message fired whenever the coordinator flips gate flags.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateChanged {
    pub flags: GateFlags,
    pub value: bool,
}

/// The board's gate. Starts out browsing with hover and click enabled.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Resource)]
pub struct EventGate {
    held: GateFlags,
}

impl Default for EventGate {
    fn default() -> Self {
        Self {
            held: GateFlags::MAIN | GateFlags::MOUSE_OVER | GateFlags::CLICK,
        }
    }
}

impl EventGate {
    #[cfg(test)]
    fn with_flags(held: GateFlags) -> Self {
        Self { held }
    }

    /// True iff every flag in `flags` currently holds.
    pub fn is_allowed(&self, flags: GateFlags) -> bool {
        self.held.contains(flags)
    }

    pub fn set(&mut self, flags: GateFlags, value: bool) {
        if value {
            self.held.0 |= flags.0;
        } else {
            self.held.0 &= !flags.0;
        }
    }

    /// Browsing -> inspecting. `main` and `hop_up` always move together.
    pub fn enter_inspection(&mut self) {
        self.set(GateFlags::MAIN, false);
        self.set(GateFlags::HOP_UP, true);
    }

    pub fn leave_inspection(&mut self) {
        self.set(GateFlags::MAIN, true);
        self.set(GateFlags::HOP_UP, false);
    }

    pub fn held(&self) -> GateFlags {
        self.held
    }

    pub fn mode(&self) -> GateMode {
        match (
            self.is_allowed(GateFlags::MAIN),
            self.is_allowed(GateFlags::HOP_UP),
        ) {
            (true, false) => GateMode::Browsing,
            (false, true) => GateMode::Inspecting,
            (false, false) => GateMode::Busy,
            (true, true) => GateMode::Conflicted,
        }
    }
}
