//! Handle types for the duel arena.
//!
//! Every card instance and every modifier in a duel is owned by the
//! [`Duel`](crate::duel::Duel) arena and addressed by a stable integer
//! handle. Links between cards (equip, overlay, targeting) are stored as
//! handles, never as owning references.

use serde::{Deserialize, Serialize};

/// Player index that means "no player" (e.g. overlay material has no
/// controller of its own).
pub const PLAYER_NONE: u8 = 0xff;

/// Stable identifier of a card instance inside a duel.
///
/// Handles are never reused while the duel is alive; a handle stays valid
/// even when the card leaves every zone (overlay material, removed tokens).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardHandle(pub u32);

impl CardHandle {
    /// Get the raw index value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Stable identifier of a modifier (effect) inside a duel.
///
/// Distinct from the modifier's *application id*: the handle names the
/// object, the id records attach order and decides fold ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectHandle(pub u32);

impl EffectHandle {
    /// Get the raw index value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}
