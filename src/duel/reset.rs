//! Reset delivery: lifecycle events tearing down per-card state and the
//! scoped modifiers that die with them.
//!
//! A reset is delivered to one card with a cause bitset and a
//! [`ResetKind`]. Event resets first clear the card-side bookkeeping
//! keyed on the cause (relations, battle history, counters, targeting),
//! then sweep every modifier attached to the card through
//! [`crate::effects::Effect::should_reset`] and detach the ones that
//! match. Phase and
//! chain boundaries are duel-wide sweeps over the scoped index sets.

use smallvec::SmallVec;

use crate::core::consts::{counter, status};
use crate::core::ids::{CardHandle, EffectHandle, PLAYER_NONE};
use crate::core::message::Message;
use crate::duel::{Duel, EffectSet};
use crate::effects::{codes, etype, flag, reset, Callable, ResetKind, ResolutionContext};

/// Events that orphan a card's relation to its own modifiers.
const RESET_RELATE_EFFECT: u32 = reset::TO_GRAVE
    | reset::REMOVE
    | reset::TEMP_REMOVE
    | reset::TO_HAND
    | reset::TO_DECK
    | reset::OVERLAY;

/// Events that wipe the card's attack declarations for the turn.
const RESET_ATTACK_HISTORY: u32 = RESET_RELATE_EFFECT | reset::LEAVE | reset::TO_FIELD;

/// Events that end the card's battle history and recharge its
/// limited-use modifiers.
const RESET_BATTLE_HISTORY: u32 = RESET_ATTACK_HISTORY | reset::TURN_SET;

/// Events that drop counters and sever continuous targeting links.
const RESET_COUNTERS_TARGETS: u32 = reset::TURN_SET
    | reset::TO_GRAVE
    | reset::REMOVE
    | reset::TEMP_REMOVE
    | reset::TO_HAND
    | reset::TO_DECK
    | reset::TO_FIELD
    | reset::OVERLAY;

/// Events that clear the transient half of zone-grant modifier values.
const RESET_ZONE_GRANTS: u32 = reset::TURN_SET
    | reset::TO_GRAVE
    | reset::REMOVE
    | reset::TEMP_REMOVE
    | reset::TO_HAND
    | reset::TO_DECK
    | reset::LEAVE
    | reset::TO_FIELD
    | reset::CONTROL;

/// Reset bits stamped on the control hold synthesized when a held card
/// is set face-down.
const RESET_CONTROL_HOLD: u32 = reset::EVENT
    | reset::TO_GRAVE
    | reset::REMOVE
    | reset::TO_HAND
    | reset::TO_DECK
    | reset::LEAVE;

impl Duel {
    /// Deliver a reset to one card.
    pub fn reset(&mut self, ch: CardHandle, cause: u32, kind: ResetKind) {
        if kind == ResetKind::Event {
            self.reset_card_state(ch, cause);
        }
        let mut attached: EffectSet = SmallVec::new();
        for container in [
            &self.card(ch).single_effects,
            &self.card(ch).field_effects,
            &self.card(ch).equip_effects,
        ] {
            for slot in container.values() {
                attached.extend(slot.iter().copied());
            }
        }
        let turn_player = self.info.turn_player;
        let mut dead: EffectSet = SmallVec::new();
        for eh in attached {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let owner_code = self.card(e.owner).data.code;
            let handler_player = self.handler_player(eh);
            let Some(e) = self.effects.get_mut(&eh) else {
                continue;
            };
            if e.should_reset(cause, kind, owner_code, handler_player, turn_player) {
                dead.push(eh);
            }
        }
        for eh in dead {
            self.detach(eh);
        }
    }

    /// The card-side bookkeeping keyed on event bits.
    fn reset_card_state(&mut self, ch: CardHandle, cause: u32) {
        {
            let card = self.card_mut(ch);
            card.relations
                .retain(|_, bits| *bits & 0xffff_0000 & cause == 0);
        }
        if cause & RESET_RELATE_EFFECT != 0 {
            self.card_mut(ch).effect_relations.clear();
        }
        if cause & RESET_ATTACK_HISTORY != 0 {
            let card = self.card_mut(ch);
            card.announced_cards.clear();
            card.attacked_cards.clear();
            card.announce_count = 0;
            card.attacked_count = 0;
            card.attack_all_target = true;
        }
        if cause & RESET_BATTLE_HISTORY != 0 {
            self.card_mut(ch).battled_cards.clear();
            self.reset_effect_count(ch);
            self.override_field_values(ch, codes::DISABLE_FIELD, |_| 0);
            self.card_mut(ch).set_status(status::UNION, false);
        }
        if cause & RESET_COUNTERS_TARGETS != 0 {
            self.card_mut(ch).counters.clear();
            self.sever_targeting(ch);
        }
        if cause & RESET_ZONE_GRANTS != 0 {
            self.override_field_values(ch, codes::USE_EXTRA_MZONE, |v| v & 0xffff);
            self.override_field_values(ch, codes::USE_EXTRA_SZONE, |v| v & 0xffff);
        }
        if cause & reset::DISABLE != 0 {
            self.strip_enable_counters(ch);
        }
        if cause & reset::TURN_SET != 0 {
            self.preserve_equip_control(ch);
        }
    }

    /// Recharge every limited-use modifier attached to the card.
    pub fn reset_effect_count(&mut self, ch: CardHandle) {
        let mut limited: EffectSet = SmallVec::new();
        for container in [
            &self.card(ch).single_effects,
            &self.card(ch).field_effects,
            &self.card(ch).equip_effects,
        ] {
            for slot in container.values() {
                for &eh in slot {
                    if self
                        .effects
                        .get(&eh)
                        .is_some_and(|e| e.is_flag(flag::COUNT_LIMIT))
                    {
                        limited.push(eh);
                    }
                }
            }
        }
        for eh in limited {
            if let Some(e) = self.effects.get_mut(&eh) {
                e.recharge();
            }
        }
    }

    fn override_field_values(&mut self, ch: CardHandle, code: u32, f: impl Fn(i64) -> i64) {
        let slot: SmallVec<[EffectHandle; 2]> = self
            .card(ch)
            .field_effects
            .get(&code)
            .cloned()
            .unwrap_or_default();
        for eh in slot {
            if let Some(e) = self.effects.get_mut(&eh) {
                let old = e.value.constant().unwrap_or(0);
                e.value = Callable::Constant(f(old));
            }
        }
    }

    /// Break every continuous targeting link in both directions. Single
    /// modifiers a targeter projected onto this card die with the link.
    fn sever_targeting(&mut self, ch: CardHandle) {
        let targeted_by: Vec<CardHandle> = self.card(ch).targeted_by.iter().copied().collect();
        for origin in targeted_by {
            self.card_mut(origin).targeting.remove(&ch);
            let mut projected: EffectSet = SmallVec::new();
            for slot in self.card(ch).single_effects.values() {
                for &eh in slot {
                    if self
                        .effects
                        .get(&eh)
                        .is_some_and(|e| e.owner == origin && e.is_flag(flag::OWNER_RELATE))
                    {
                        projected.push(eh);
                    }
                }
            }
            for eh in projected {
                self.detach(eh);
            }
        }
        let targeting: Vec<CardHandle> = self.card(ch).targeting.iter().copied().collect();
        for target in targeting {
            self.card_mut(target).targeted_by.remove(&ch);
            let mut projected: EffectSet = SmallVec::new();
            for slot in self.card(target).single_effects.values() {
                for &eh in slot {
                    if self
                        .effects
                        .get(&eh)
                        .is_some_and(|e| e.owner == ch && e.is_flag(flag::OWNER_RELATE))
                    {
                        projected.push(eh);
                    }
                }
            }
            for eh in projected {
                self.detach(eh);
            }
        }
        let card = self.card_mut(ch);
        card.targeted_by.clear();
        card.targeting.clear();
    }

    fn strip_enable_counters(&mut self, ch: CardHandle) {
        let doomed: Vec<(u16, u16)> = self
            .card(ch)
            .counters
            .iter()
            .filter(|(kind, _)| *kind & counter::NEED_ENABLE != 0)
            .map(|(&k, &c)| (k, c))
            .collect();
        for (kind, count) in doomed {
            let place = self.field_place(ch);
            self.emit(Message::RemoveCounter { kind, place, count });
            self.card_mut(ch).counters.remove(&kind);
        }
    }

    /// A card set face-down while held through an equip keeps its
    /// controller: the hold is rewritten as a plain control modifier
    /// carrying its source's application order.
    fn preserve_equip_control(&mut self, ch: CardHandle) {
        let Some(src) = self.check_equip_control_effect(ch) else {
            return;
        };
        let Some(e) = self.effects.get(&src) else {
            return;
        };
        let src_id = e.id;
        let controller = self.card(ch).current.controller;
        if controller == PLAYER_NONE {
            return;
        }
        let hold = self
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::SET_CONTROL)
            .with_flag(flag::CANNOT_DISABLE)
            .with_reset(RESET_CONTROL_HOLD, 0)
            .with_value(Callable::Constant(i64::from(controller)));
        if let Some(eh) = self.attach(ch, hold, &ResolutionContext::default()) {
            if let Some(e) = self.effects.get_mut(&eh) {
                e.id = src_id;
            }
        }
    }

    // -- duel-wide sweeps --------------------------------------------------

    /// Detach everything scoped to a phase boundary that just passed.
    pub fn reset_phase(&mut self, phase: u32) {
        let scoped: Vec<EffectHandle> = self.phase_scoped.iter().copied().collect();
        let turn_player = self.info.turn_player;
        let mut dead: Vec<EffectHandle> = Vec::new();
        for eh in scoped {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let owner_code = self.card(e.owner).data.code;
            let handler_player = self.handler_player(eh);
            let Some(e) = self.effects.get_mut(&eh) else {
                continue;
            };
            if e.should_reset(phase, ResetKind::Phase, owner_code, handler_player, turn_player) {
                dead.push(eh);
            }
        }
        for eh in dead {
            self.detach(eh);
        }
    }

    /// Detach everything scoped to the chain that just resolved.
    pub fn reset_chain(&mut self) {
        let scoped: Vec<EffectHandle> = self.chain_scoped.iter().copied().collect();
        for eh in scoped {
            self.detach(eh);
        }
    }

    /// Restore the use count of every rechargeable modifier; runs at the
    /// turn boundary.
    pub fn recharge_counts(&mut self) {
        let scoped: Vec<EffectHandle> = self.rechargeable.iter().copied().collect();
        for eh in scoped {
            if let Some(e) = self.effects.get_mut(&eh) {
                e.recharge();
            }
        }
    }
}
