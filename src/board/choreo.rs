//! Animation coordinator - sequences draws, hand layout, zoom, and flips.
//!
//! Requests are expanded into [`Step`]s and run FIFO by [`run_choreography`].
//! Each frame the driver executes steps until one has to wait; a join step
//! waits for a set of cards to finish their motions, which is how "all hand
//! cards moved" and "the zoom finished" become ordering points. Everything
//! runs in `AppSystems::Update`, and nothing else writes the gate.

use std::{collections::VecDeque, f32::consts::PI};

use bevy::{
    ecs::{message::Message, system::SystemParam},
    math::curve::easing::EaseFunction,
    prelude::*,
};

use super::{
    Backdrop, BoardRequest, Card, CastsShadow, EventGate, Facing, GateChanged, GateFlags,
    InFlight, Location, Zones,
    motion::{Axes, Motion, start_motion},
};
use crate::{AppSystems, config::BoardSettings};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Choreography>();
    app.add_message::<OperationFinished>();
    app.add_message::<DeckExhausted>();
    app.add_systems(
        Update,
        (queue_requests, run_choreography)
            .chain()
            .in_set(AppSystems::Update),
    );
}

/// Coordinator operations, reported back through [`OperationFinished`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Draw,
    ZoomUp,
    ZoomDown,
    Flip,
}

/// Fired when the last step of an operation has run.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationFinished(pub Operation);

/// Fired when a draw finds the deck empty. The rest of that draw is skipped.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeckExhausted;

#[derive(Clone, Copy, Debug)]
enum BackdropStep {
    Show,
    Hide,
    FadeTo(f32),
}

#[derive(Clone, Debug)]
enum Step {
    Gate { flags: GateFlags, value: bool },
    /// `Some` enters inspection of a card, `None` leaves it.
    Inspect(Option<Entity>),
    Drawing { remaining: usize },
    AdjustHand,
    /// Wait until none of `cards` is in flight. Always waits at least one frame
    /// so motions started this frame are visible.
    Join { cards: Vec<Entity>, armed: bool },
    ZoomTo(Entity),
    Flip(Entity),
    Shadow { card: Entity, cast: bool },
    Backdrop(BackdropStep),
    Finish(Operation),
}

/// Pending coordinator steps.
#[derive(Resource, Debug, Default)]
pub struct Choreography {
    steps: VecDeque<Step>,
}

impl Choreography {
    /// Expand a request into steps at the back of the queue.
    ///
    /// A zoom-down already waiting in the queue absorbs further ones, since
    /// every click while inspecting asks for one.
    pub fn enqueue(&mut self, request: BoardRequest) {
        if matches!(request, BoardRequest::ZoomDown(_)) && self.zoom_down_pending() {
            debug!("zoom-down already queued, dropping {:?}", request);
            return;
        }
        let steps: Vec<Step> = match request {
            BoardRequest::Draw { count } => vec![
                Step::Gate {
                    flags: GateFlags::MAIN,
                    value: false,
                },
                Step::Drawing { remaining: count },
                Step::Gate {
                    flags: GateFlags::MAIN,
                    value: true,
                },
                Step::Finish(Operation::Draw),
            ],
            BoardRequest::ZoomUp(card) => vec![
                Step::Inspect(Some(card)),
                Step::Shadow { card, cast: false },
                Step::Backdrop(BackdropStep::Show),
                Step::ZoomTo(card),
                Step::Join {
                    cards: vec![card],
                    armed: false,
                },
                Step::Backdrop(BackdropStep::FadeTo(1.0)),
                Step::Finish(Operation::ZoomUp),
            ],
            // Interaction only resumes once the hand has settled, so no click
            // lands on a card that is still sliding into place.
            BoardRequest::ZoomDown(card) => vec![
                Step::Backdrop(BackdropStep::FadeTo(0.0)),
                Step::AdjustHand,
                Step::Backdrop(BackdropStep::Hide),
                Step::Shadow { card, cast: true },
                Step::Inspect(None),
                Step::Finish(Operation::ZoomDown),
            ],
            BoardRequest::Flip(card) => vec![Step::Flip(card), Step::Finish(Operation::Flip)],
        };
        self.steps.extend(steps);
    }

    fn zoom_down_pending(&self) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(step, Step::Finish(Operation::ZoomDown)))
    }
}

/// Centre x of each hand slot, left to right, symmetric about zero.
pub fn hand_layout(count: usize, pitch: f32) -> Vec<f32> {
    let left = -(pitch / 2.0) * count.saturating_sub(1) as f32;
    (0..count).map(|i| left + pitch * i as f32).collect()
}

fn queue_requests(mut requests: MessageReader<BoardRequest>, mut choreo: ResMut<Choreography>) {
    for request in requests.read() {
        info!("queueing {:?}", request);
        choreo.enqueue(*request);
    }
}

/// World access for the coordinator's steps.
#[derive(SystemParam)]
struct Stage<'w, 's> {
    commands: Commands<'w, 's>,
    zones: ResMut<'w, Zones>,
    gate: ResMut<'w, EventGate>,
    settings: Res<'w, BoardSettings>,
    cards: Query<'w, 's, (&'static mut Card, &'static mut Facing, &'static Transform)>,
    shadows: Query<'w, 's, &'static mut CastsShadow>,
    in_flight: Query<'w, 's, (), With<InFlight>>,
    backdrops: Query<'w, 's, (&'static mut Backdrop, &'static mut Visibility)>,
    gate_changes: MessageWriter<'w, GateChanged>,
    exhausted: MessageWriter<'w, DeckExhausted>,
    finished: MessageWriter<'w, OperationFinished>,
}

impl Stage<'_, '_> {
    fn set_gate(&mut self, flags: GateFlags, value: bool) {
        debug!("gate {:?} -> {}", flags, value);
        self.gate.set(flags, value);
        self.gate_changes.write(GateChanged { flags, value });
    }

    fn inspect(&mut self, card: Option<Entity>) {
        let entering = card.is_some();
        self.zones.inspected = card;
        if entering {
            self.gate.enter_inspection();
        } else {
            self.gate.leave_inspection();
        }
        self.gate_changes.write(GateChanged {
            flags: GateFlags::MAIN,
            value: !entering,
        });
        self.gate_changes.write(GateChanged {
            flags: GateFlags::HOP_UP,
            value: entering,
        });
    }

    /// Move the top deck card into the hand.
    fn draw_one(&mut self) -> bool {
        let top = match self.zones.top_of_deck() {
            Ok(top) => top,
            Err(err) => {
                warn!("draw stopped: {}", err);
                self.exhausted.write(DeckExhausted);
                return false;
            }
        };
        match self.cards.get_mut(top) {
            Ok((mut card, _, _)) => self.zones.relocate(top, &mut card, Location::Hand),
            Err(_) => {
                // A deck entry without a card entity: drop it rather than stall.
                self.zones.deck.pop();
            }
        }
        debug!("drew {:?}", top);
        true
    }

    /// Send every hand card to its slot. Returns the cards now moving.
    fn adjust_hand(&mut self) -> Vec<Entity> {
        let hand = self.zones.hand.clone();
        let slots = hand_layout(hand.len(), self.settings.hand_pitch());
        let move_time = BoardSettings::millis(self.settings.hand_move_ms);
        let turn_time = BoardSettings::millis(self.settings.hand_turn_ms);

        for (card, x) in hand.iter().zip(slots) {
            let Ok((_, mut facing, transform)) = self.cards.get_mut(*card) else {
                continue;
            };
            let start = *transform;
            facing.0 = Vec3::new(self.settings.hand_tilt, 0.0, facing.0.z);
            let motion = Motion::new()
                .move_to(
                    Axes::xyz(Vec3::new(
                        x,
                        self.settings.hand_height,
                        self.settings.hand_depth,
                    )),
                    move_time,
                    EaseFunction::SineInOut,
                )
                .turn_to(facing.quat(), turn_time, EaseFunction::SineIn);
            start_motion(&mut self.commands, *card, start, motion);
        }
        hand
    }

    fn zoom_to(&mut self, card: Entity) {
        let Ok((_, _, transform)) = self.cards.get(card) else {
            return;
        };
        let start = *transform;
        let duration = BoardSettings::millis(self.settings.zoom_ms);
        let motion = Motion::new()
            .move_to(
                Axes::xyz(self.settings.inspect_position),
                duration,
                EaseFunction::Linear,
            )
            .scale_to(Axes::xyz(Vec3::ONE), duration, EaseFunction::Linear);
        start_motion(&mut self.commands, card, start, motion);
    }

    /// Rise and fall while turning over; the turn spans both halves.
    fn flip(&mut self, card: Entity) {
        let Ok((_, mut facing, transform)) = self.cards.get_mut(card) else {
            return;
        };
        let half = BoardSettings::millis(self.settings.flip_half_ms);
        let start = *transform;
        let resting_y = start.translation.y;
        let turned = Vec3::new(facing.0.x, -PI - facing.0.y, -PI / 2.0 - facing.0.z);
        facing.0 = turned;

        let motion = Motion::new()
            .move_to(
                Axes::y(resting_y + self.settings.flip_rise),
                half,
                EaseFunction::SineIn,
            )
            .move_to(Axes::y(resting_y), half, EaseFunction::SineOut)
            .turn_to(Facing(turned).quat(), half * 2, EaseFunction::SineInOut);
        start_motion(&mut self.commands, card, start, motion);
    }

    fn cast_shadow(&mut self, card: Entity, cast: bool) {
        if let Ok(mut shadow) = self.shadows.get_mut(card) {
            shadow.0 = cast;
        }
    }

    fn backdrop(&mut self, step: BackdropStep) {
        let Ok((mut backdrop, mut visibility)) = self.backdrops.single_mut() else {
            return;
        };
        let fade = BoardSettings::millis(self.settings.fade_ms);
        match step {
            BackdropStep::Show => *visibility = Visibility::Visible,
            BackdropStep::Hide => *visibility = Visibility::Hidden,
            BackdropStep::FadeTo(level) => {
                backdrop.fade_to(level * self.settings.backdrop_opacity, fade)
            }
        }
    }

    fn settled(&self, cards: &[Entity]) -> bool {
        !cards.iter().any(|card| self.in_flight.contains(*card))
    }
}

fn run_choreography(mut choreo: ResMut<Choreography>, mut stage: Stage) {
    while let Some(step) = choreo.steps.pop_front() {
        match step {
            Step::Gate { flags, value } => stage.set_gate(flags, value),
            Step::Inspect(card) => stage.inspect(card),
            Step::Drawing { remaining } => {
                if remaining > 0 && stage.draw_one() {
                    choreo.steps.push_front(Step::Drawing {
                        remaining: remaining - 1,
                    });
                    choreo.steps.push_front(Step::AdjustHand);
                }
            }
            Step::AdjustHand => {
                let cards = stage.adjust_hand();
                choreo.steps.push_front(Step::Join {
                    cards,
                    armed: false,
                });
            }
            Step::Join { cards, armed } => {
                if !armed || !stage.settled(&cards) {
                    choreo.steps.push_front(Step::Join { cards, armed: true });
                    return;
                }
            }
            Step::ZoomTo(card) => stage.zoom_to(card),
            Step::Flip(card) => stage.flip(card),
            Step::Shadow { card, cast } => stage.cast_shadow(card, cast),
            Step::Backdrop(step) => stage.backdrop(step),
            Step::Finish(operation) => {
                info!("{:?} finished", operation);
                stage.finished.write(OperationFinished(operation));
            }
        }
    }
}
