//! The card object: printed face, state, modifier containers, and links.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::cards::printed::PrintedData;
use crate::cards::state::{Assume, CardState, ComputeScratch, QueryCache};
use crate::core::consts::position;
use crate::core::ids::{CardHandle, EffectHandle};

/// Handles attached under one modifier code. Most codes carry one or two.
pub type EffectSlot = SmallVec<[EffectHandle; 2]>;

/// Which of a card's three containers a modifier lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Affects the handler itself.
    Single,
    /// Projects over a zone range while the handler sits in it.
    Field,
    /// Affects whatever the handler is equipped to.
    Equip,
}

/// A card instance inside a duel arena.
///
/// Everything that references another card or modifier does so by handle;
/// the arena in [`Duel`](crate::duel::Duel) owns the objects.
#[derive(Debug)]
pub struct Card {
    pub handle: CardHandle,
    pub data: PrintedData,
    /// The player who brought the card to the duel. Control can move;
    /// ownership never does.
    pub owner: u8,
    pub current: CardState,
    pub previous: CardState,
    pub scratch: ComputeScratch,
    pub status: u32,
    /// Shadow attribute override, see [`Assume`].
    pub assume: Option<(Assume, u32)>,
    pub turn_counter: u16,

    pub single_effects: FxHashMap<u32, EffectSlot>,
    pub field_effects: FxHashMap<u32, EffectSlot>,
    pub equip_effects: FxHashMap<u32, EffectSlot>,
    /// Modifiers currently granting this card immunity, kept sorted by
    /// application id. Refreshed, never folded lazily.
    pub immune_effects: SmallVec<[EffectHandle; 4]>,

    pub equip_target: Option<CardHandle>,
    /// The card this was last equipped to before the relation broke.
    pub pre_equip_target: Option<CardHandle>,
    /// Cards equipped to this card.
    pub equips: FxHashSet<CardHandle>,

    pub overlay_target: Option<CardHandle>,
    /// Overlay material stacked under this card, bottom first. Material
    /// sequence numbers always mirror the index here.
    pub overlay_materials: Vec<CardHandle>,
    /// Cards consumed to summon this card.
    pub summon_materials: FxHashSet<CardHandle>,

    /// Cards this card targets with a continuous effect.
    pub targeting: FxHashSet<CardHandle>,
    /// Cards targeting this card.
    pub targeted_by: FxHashSet<CardHandle>,

    /// Counter kind to count. Ordered so wire output is deterministic.
    pub counters: BTreeMap<u16, u16>,
    /// Card relations with the cause bits that sever them.
    pub relations: FxHashMap<CardHandle, u32>,
    /// Refcounted effect relations.
    pub effect_relations: FxHashMap<EffectHandle, u32>,

    pub announced_cards: FxHashSet<CardHandle>,
    pub attacked_cards: FxHashSet<CardHandle>,
    pub battled_cards: FxHashSet<CardHandle>,
    pub announce_count: u32,
    pub attacked_count: u32,
    pub attack_all_target: bool,

    /// Field-wide uniqueness registration (one copy per side rules).
    pub unique_code: u32,
    pub unique_pos: [u32; 2],

    pub query_cache: QueryCache,
}

impl Card {
    #[must_use]
    pub fn new(handle: CardHandle, data: PrintedData, owner: u8) -> Self {
        Self {
            handle,
            data,
            owner,
            current: CardState::default(),
            previous: CardState::default(),
            scratch: ComputeScratch::default(),
            status: 0,
            assume: None,
            turn_counter: 0,
            single_effects: FxHashMap::default(),
            field_effects: FxHashMap::default(),
            equip_effects: FxHashMap::default(),
            immune_effects: SmallVec::new(),
            equip_target: None,
            pre_equip_target: None,
            equips: FxHashSet::default(),
            overlay_target: None,
            overlay_materials: Vec::new(),
            summon_materials: FxHashSet::default(),
            targeting: FxHashSet::default(),
            targeted_by: FxHashSet::default(),
            counters: BTreeMap::new(),
            relations: FxHashMap::default(),
            effect_relations: FxHashMap::default(),
            announced_cards: FxHashSet::default(),
            attacked_cards: FxHashSet::default(),
            battled_cards: FxHashSet::default(),
            announce_count: 0,
            attacked_count: 0,
            attack_all_target: true,
            unique_code: 0,
            unique_pos: [0, 0],
            query_cache: QueryCache::default(),
        }
    }

    #[must_use]
    pub fn is_status(&self, bits: u32) -> bool {
        self.status & bits != 0
    }

    pub fn set_status(&mut self, bits: u32, enabled: bool) {
        if enabled {
            self.status |= bits;
        } else {
            self.status &= !bits;
        }
    }

    #[must_use]
    pub fn is_position(&self, pos: u32) -> bool {
        self.current.position & pos != 0
    }

    #[must_use]
    pub fn is_location(&self, loc: u32) -> bool {
        self.current.location & loc != 0
    }

    #[must_use]
    pub fn is_faceup(&self) -> bool {
        self.is_position(position::FACEUP)
    }

    /// Counters of `kind` currently on the card.
    #[must_use]
    pub fn counter(&self, kind: u16) -> u16 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn container(&self, kind: ContainerKind) -> &FxHashMap<u32, EffectSlot> {
        match kind {
            ContainerKind::Single => &self.single_effects,
            ContainerKind::Field => &self.field_effects,
            ContainerKind::Equip => &self.equip_effects,
        }
    }

    pub fn container_mut(&mut self, kind: ContainerKind) -> &mut FxHashMap<u32, EffectSlot> {
        match kind {
            ContainerKind::Single => &mut self.single_effects,
            ContainerKind::Field => &mut self.field_effects,
            ContainerKind::Equip => &mut self.equip_effects,
        }
    }

    /// Handles under `code` in one container, in insertion order.
    #[must_use]
    pub fn effects_with_code(&self, kind: ContainerKind, code: u32) -> &[EffectHandle] {
        self.container(kind).get(&code).map_or(&[], |slot| slot.as_slice())
    }

    /// Shadow an attribute with a fixed value.
    pub fn set_assume(&mut self, which: Assume, value: u32) {
        self.assume = Some((which, value));
    }

    pub fn clear_assume(&mut self) {
        self.assume = None;
    }

    /// The assumed value for `which`, if one is set.
    #[must_use]
    pub fn assumed(&self, which: Assume) -> Option<u32> {
        match self.assume {
            Some((a, v)) if a == which => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::consts::status;

    fn sample() -> Card {
        Card::new(CardHandle(0), PrintedData::monster(1234, 4, 1800, 1200), 0)
    }

    #[test]
    fn test_status_bits() {
        let mut c = sample();
        assert!(!c.is_status(status::DISABLED));
        c.set_status(status::DISABLED | status::UNION, true);
        assert!(c.is_status(status::DISABLED));
        c.set_status(status::DISABLED, false);
        assert!(!c.is_status(status::DISABLED));
        assert!(c.is_status(status::UNION));
    }

    #[test]
    fn test_counter_lookup_defaults_to_zero() {
        let mut c = sample();
        assert_eq!(c.counter(0x1001), 0);
        c.counters.insert(0x1001, 3);
        assert_eq!(c.counter(0x1001), 3);
    }

    #[test]
    fn test_assume_only_matches_its_slot() {
        let mut c = sample();
        c.set_assume(Assume::Level, 8);
        assert_eq!(c.assumed(Assume::Level), Some(8));
        assert_eq!(c.assumed(Assume::Attack), None);
        c.clear_assume();
        assert_eq!(c.assumed(Assume::Level), None);
    }
}
