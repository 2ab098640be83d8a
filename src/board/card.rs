//! Card entities and the zone tag they carry.

use bevy::prelude::*;

pub fn plugin(app: &mut App) {
    app.register_type::<Card>();
    app.register_type::<Location>();
    app.register_type::<CastsShadow>();
    app.register_type::<Facing>();
}

/// Logical zone a card occupies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect)]
pub enum Location {
    /// Face-up menu card lying on the board.
    MenuOpen,
    Set,
    Field,
    #[default]
    Deck,
    Hand,
    Graveyard,
    DeckDouble,
}

/// A card on the board. Entity identity is card identity.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Transform, Visibility, CastsShadow, Facing)]
pub struct Card {
    pub location: Location,
}

impl Card {
    pub fn at(location: Location) -> Self {
        Self { location }
    }
}

/// Whether the card's meshes cast shadows. Cleared while a card is inspected.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CastsShadow(pub bool);

impl Default for CastsShadow {
    fn default() -> Self {
        Self(true)
    }
}

/// Euler angles (XYZ order) the card is turned to, or turning towards.
/// Rotation targets are computed from these rather than decomposed from the transform.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Facing(pub Vec3);

impl Facing {
    pub fn quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.0.x, self.0.y, self.0.z)
    }
}
