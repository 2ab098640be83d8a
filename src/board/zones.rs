//! Location collections - deck, hand, and board, kept in step with card tags.

use bevy::prelude::*;
use thiserror::Error;

use super::{Card, Location};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Zones>();
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DrawError {
    #[error("the deck is empty")]
    DeckExhausted,
}

/// Ordered card collections. The last deck entry is the top of the deck.
#[derive(Resource, Debug, Default, Clone)]
pub struct Zones {
    pub deck: Vec<Entity>,
    pub hand: Vec<Entity>,
    pub board: Vec<Entity>,
    /// Hand card currently zoomed up for inspection.
    pub inspected: Option<Entity>,
}

impl Zones {
    fn collection_mut(&mut self, location: Location) -> &mut Vec<Entity> {
        match location {
            Location::Deck | Location::DeckDouble => &mut self.deck,
            Location::Hand => &mut self.hand,
            Location::MenuOpen
            | Location::Set
            | Location::Field
            | Location::Graveyard => &mut self.board,
        }
    }

    /// Register a freshly spawned card under its current tag.
    pub fn place(&mut self, entity: Entity, card: &Card) {
        self.collection_mut(card.location).push(entity);
    }

    /// Move a card to `to`, updating both its collection and its tag.
    pub fn relocate(&mut self, entity: Entity, card: &mut Card, to: Location) {
        let from = self.collection_mut(card.location);
        if let Some(index) = from.iter().position(|e| *e == entity) {
            from.remove(index);
        }
        card.location = to;
        self.collection_mut(to).push(entity);
    }

    /// The card a draw would take.
    pub fn top_of_deck(&self) -> Result<Entity, DrawError> {
        self.deck.last().copied().ok_or(DrawError::DeckExhausted)
    }
}
