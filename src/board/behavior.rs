//! Per-location behaviour for hover enter, hover exit, and click.

use bevy::{ecs::message::Message, math::curve::easing::EaseFunction, prelude::*};

use super::{
    EventGate, GateFlags, Location,
    motion::{Axes, Motion},
};
use crate::config::BoardSettings;

pub(super) fn plugin(app: &mut App) {
    app.add_message::<BoardRequest>();
}

/// An operation for the animation coordinator.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardRequest {
    Draw { count: usize },
    ZoomUp(Entity),
    ZoomDown(Entity),
    Flip(Entity),
}

/// What clicking a card does, by location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickAction {
    Draw(usize),
    ZoomUp,
    Flip,
    Nothing,
}

pub fn click_action(location: Location) -> ClickAction {
    match location {
        Location::Deck => ClickAction::Draw(1),
        Location::Hand => ClickAction::ZoomUp,
        Location::MenuOpen => ClickAction::Flip,
        Location::Set
        | Location::Field
        | Location::Graveyard
        | Location::DeckDouble => ClickAction::Nothing,
    }
}

/// Hover feedback when the pointer first enters a card.
pub fn hover_enter(location: Location, settings: &BoardSettings) -> Option<Motion> {
    match location {
        Location::Hand => {
            let duration = BoardSettings::millis(settings.hover_ms);
            Some(
                Motion::new()
                    .move_to(
                        Axes::yz(
                            settings.hand_height + settings.hover_rise,
                            settings.hand_depth + settings.hover_advance,
                        ),
                        duration,
                        EaseFunction::SineIn,
                    )
                    .scale_to(
                        Axes::xy(settings.hover_scale, settings.hover_scale),
                        duration,
                        EaseFunction::SineIn,
                    ),
            )
        }
        Location::MenuOpen
        | Location::Set
        | Location::Field
        | Location::Deck
        | Location::Graveyard
        | Location::DeckDouble => None,
    }
}

/// Undo [`hover_enter`]. Targets are absolute, so repeated hover cycles can't drift.
pub fn hover_exit(location: Location, settings: &BoardSettings) -> Option<Motion> {
    match location {
        Location::Hand => {
            let duration = BoardSettings::millis(settings.hover_ms);
            Some(
                Motion::new()
                    .move_to(
                        Axes::yz(settings.hand_height, settings.hand_depth),
                        duration,
                        EaseFunction::SineIn,
                    )
                    .scale_to(Axes::xy(1.0, 1.0), duration, EaseFunction::SineIn),
            )
        }
        Location::MenuOpen
        | Location::Set
        | Location::Field
        | Location::Deck
        | Location::Graveyard
        | Location::DeckDouble => None,
    }
}

/// Resolve a click against the gate.
///
/// Browsing clicks act on the hit card by its location. While inspecting,
/// any click zooms the inspected card back down, whatever was under the pointer.
pub fn dispatch_click(
    gate: &EventGate,
    hit: Option<(Entity, Location)>,
    inspected: Option<Entity>,
) -> Option<BoardRequest> {
    if gate.is_allowed(GateFlags::MAIN | GateFlags::CLICK) {
        let (card, location) = hit?;
        return match click_action(location) {
            ClickAction::Draw(count) => Some(BoardRequest::Draw { count }),
            ClickAction::ZoomUp => Some(BoardRequest::ZoomUp(card)),
            ClickAction::Flip => Some(BoardRequest::Flip(card)),
            ClickAction::Nothing => None,
        };
    }
    if gate.is_allowed(GateFlags::HOP_UP | GateFlags::CLICK) {
        let card = inspected.or(hit.map(|(card, _)| card))?;
        return Some(BoardRequest::ZoomDown(card));
    }
    None
}
