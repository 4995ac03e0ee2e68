//! Mutable per-card state snapshots and the resolution scratch space.

use serde::{Deserialize, Serialize};

use crate::core::ids::{CardHandle, PLAYER_NONE};

/// Where a card is and why it got there. Each card carries two of these:
/// `current` and `previous` (the state before the last move).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardState {
    pub controller: u8,
    /// One bit of [`location`](crate::core::consts::location), or 0 when
    /// the card is nowhere (fresh, or detached material).
    pub location: u32,
    /// Slot index inside the location; for overlay material, the index
    /// in the host's material stack.
    pub sequence: u32,
    pub position: u32,
    /// Why the card moved here, see [`reason`](crate::core::consts::reason).
    pub reason: u32,
    pub reason_card: Option<CardHandle>,
    pub reason_player: u8,
}

impl Default for CardState {
    fn default() -> Self {
        Self {
            controller: PLAYER_NONE,
            location: 0,
            sequence: 0,
            position: 0,
            reason: 0,
            reason_card: None,
            reason_player: PLAYER_NONE,
        }
    }
}

/// Re-entrancy slot for one derived attribute.
///
/// Attribute getters evaluate modifier scripts, and a script is free to
/// read the attribute being folded. The getter parks its running partial
/// here so the nested read observes the fold-so-far instead of recursing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Computing {
    #[default]
    Idle,
    InProgress(i64),
}

impl Computing {
    /// The running partial, if a fold for this attribute is on the stack.
    #[must_use]
    pub fn in_progress(self) -> Option<i64> {
        match self {
            Computing::Idle => None,
            Computing::InProgress(v) => Some(v),
        }
    }
}

/// One [`Computing`] slot per derived attribute. Level and rank share a
/// slot; they are the same printed field read through two getters, and a
/// level fold re-entered from a rank script must still short-circuit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeScratch {
    pub code: Computing,
    pub card_type: Computing,
    pub level: Computing,
    pub attribute: Computing,
    pub race: Computing,
    pub attack: Computing,
    pub base_attack: Computing,
    pub defence: Computing,
    pub base_defence: Computing,
    pub lscale: Computing,
    pub rscale: Computing,
}

/// Shadow attribute override. While set, the matching getter returns the
/// stored value without folding (used by summon-legality probes that ask
/// "what if this card were level N").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assume {
    Code,
    Type,
    Level,
    Rank,
    Attribute,
    Race,
    Attack,
    Defence,
}

/// Last values written to the query wire for this card. Delta queries
/// compare against these and skip unchanged fields.
///
/// Initialized to all-ones so every field reads as dirty before the
/// first snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCache {
    pub code: u32,
    pub alias: u32,
    pub card_type: u32,
    pub level: u32,
    pub rank: u32,
    pub attribute: u32,
    pub race: u32,
    pub attack: i32,
    pub defence: i32,
    pub base_attack: i32,
    pub base_defence: i32,
    pub reason: u32,
    pub is_disabled: u32,
    pub lscale: u32,
    pub rscale: u32,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self {
            code: !0,
            alias: !0,
            card_type: !0,
            level: !0,
            rank: !0,
            attribute: !0,
            race: !0,
            attack: -1,
            defence: -1,
            base_attack: -1,
            base_defence: -1,
            reason: !0,
            is_disabled: !0,
            lscale: !0,
            rscale: !0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_has_no_owner() {
        let st = CardState::default();
        assert_eq!(st.controller, PLAYER_NONE);
        assert_eq!(st.location, 0);
        assert_eq!(st.reason_card, None);
    }

    #[test]
    fn test_computing_partial() {
        assert_eq!(Computing::Idle.in_progress(), None);
        assert_eq!(Computing::InProgress(1800).in_progress(), Some(1800));
    }

    #[test]
    fn test_query_cache_starts_dirty() {
        let qc = QueryCache::default();
        assert_eq!(qc.code, u32::MAX);
        assert_eq!(qc.attack, -1);
    }
}
