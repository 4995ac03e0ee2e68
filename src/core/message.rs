//! Outbound event messages.
//!
//! The rules core does not talk to clients directly; every externally
//! visible side effect (an equip forming, a counter changing, a material
//! detaching) is appended to the duel-wide message buffer in the order it
//! happened. The embedding scheduler drains the buffer and encodes it for
//! its transport.

use serde::{Deserialize, Serialize};

use crate::core::ids::{CardHandle, EffectHandle};

/// A card's place on the field as seen by a client: controller, zone,
/// slot index, and face/battle position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPlace {
    pub controller: u8,
    pub location: u32,
    pub sequence: u32,
    pub position: u32,
}

impl FieldPlace {
    /// The packed wire form: one byte each of controller, location,
    /// sequence, and position, low to high.
    #[must_use]
    pub fn packed(self) -> u32 {
        u32::from(self.controller)
            | (self.location & 0xff) << 8
            | (self.sequence & 0xff) << 16
            | (self.position & 0xff) << 24
    }
}

/// Client hint subtypes carried by [`Message::CardHint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintKind {
    /// A described modifier attached to the card.
    DescAdd,
    /// A described modifier left the card.
    DescRemove,
    /// The card's turn counter advanced.
    Turn,
}

/// One externally visible event. Emission order is event order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// A card moved between zones (used for overlay stack/unstack moves).
    Move {
        card: CardHandle,
        code: u32,
        previous: FieldPlace,
        current: FieldPlace,
        reason: u32,
    },
    /// An equip relation formed.
    Equip {
        equip: FieldPlace,
        target: FieldPlace,
    },
    /// A targeting relation formed.
    CardTarget {
        card: FieldPlace,
        target: FieldPlace,
    },
    /// A targeting relation was severed.
    CancelTarget {
        card: FieldPlace,
        target: FieldPlace,
    },
    /// Counters of `kind` were placed on a card.
    AddCounter {
        kind: u16,
        place: FieldPlace,
        count: u16,
    },
    /// Counters of `kind` left a card.
    RemoveCounter {
        kind: u16,
        place: FieldPlace,
        count: u16,
    },
    /// A client-facing annotation changed on a card.
    CardHint {
        place: FieldPlace,
        hint: HintKind,
        value: u64,
        source: Option<EffectHandle>,
    },
}
