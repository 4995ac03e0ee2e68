//! Card-to-card links: equips, overlay materials, summon materials,
//! targeting, counters, and relation bookkeeping.
//!
//! Every mutator here keeps a pair invariant in both directions in one
//! call (equipper and wearer, targeter and targeted, host and material)
//! and emits the matching client message, so callers never touch the
//! other side themselves.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::core::consts::{location, reason, status};
use crate::core::ids::{CardHandle, EffectHandle, PLAYER_NONE};
use crate::core::message::{FieldPlace, HintKind, Message};
use crate::duel::{Duel, EffectSet};
use crate::effects::{codes, reset, ResetKind};

impl Duel {
    // -- equips ------------------------------------------------------------

    /// Link an equip card to its wearer. No-op when already equipped.
    pub fn equip(&mut self, equip: CardHandle, target: CardHandle, send_msg: bool) {
        if self.card(equip).equip_target.is_some() {
            return;
        }
        self.card_mut(target).equips.insert(equip);
        self.card_mut(equip).equip_target = Some(target);
        let mut related: EffectSet = SmallVec::new();
        for slot in self.card(equip).equip_effects.values() {
            for &eh in slot {
                if self
                    .effects
                    .get(&eh)
                    .is_some_and(crate::effects::Effect::is_disable_related)
                {
                    related.push(eh);
                }
            }
        }
        if !related.is_empty() {
            self.add_to_disable_check_list(target);
        }
        if send_msg {
            let msg = Message::Equip {
                equip: self.field_place(equip),
                target: self.field_place(target),
            };
            self.emit(msg);
        }
    }

    /// Sever an equip link. The wearer is remembered in
    /// `pre_equip_target` until the equip card settles somewhere else.
    pub fn unequip(&mut self, equip: CardHandle) {
        let Some(target) = self.card(equip).equip_target else {
            return;
        };
        let mut related = false;
        for slot in self.card(equip).equip_effects.values() {
            for &eh in slot {
                if self
                    .effects
                    .get(&eh)
                    .is_some_and(crate::effects::Effect::is_disable_related)
                {
                    related = true;
                }
            }
        }
        if related {
            self.add_to_disable_check_list(target);
        }
        self.card_mut(target).equips.remove(&equip);
        let card = self.card_mut(equip);
        card.pre_equip_target = Some(target);
        card.equip_target = None;
    }

    /// Equip cards whose wearer is held by a control-changing equip
    /// modifier yield the highest-stamped such modifier.
    pub fn check_equip_control_effect(&mut self, ch: CardHandle) -> Option<EffectHandle> {
        let equippers: Vec<CardHandle> = self.card(ch).equips.iter().copied().collect();
        let mut best: Option<(u32, EffectHandle)> = None;
        for eq in equippers {
            if let Some(slot) = self.card(eq).equip_effects.get(&codes::SET_CONTROL) {
                for &eh in slot {
                    if let Some(e) = self.effects.get(&eh) {
                        if best.map_or(true, |(id, _)| e.id > id) {
                            best = Some((e.id, eh));
                        }
                    }
                }
            }
        }
        best.map(|(_, eh)| eh)
    }

    // -- overlay materials -------------------------------------------------

    /// Stack materials under a host. Materials are detached from their
    /// zones, their scoped modifiers reset, and their own equips
    /// severed; the severed equips are returned so the caller can route
    /// them to the graveyard.
    pub fn overlay(&mut self, host: CardHandle, materials: &[CardHandle]) -> Vec<CardHandle> {
        let mut mats: Vec<CardHandle> = materials.to_vec();
        if mats.len() > 1 {
            self.sort_for_operation(&mut mats);
        }
        let mut severed: Vec<CardHandle> = Vec::new();
        for mat in mats {
            self.reset(mat, reset::LEAVE | reset::OVERLAY, ResetKind::Event);
            if self.card(mat).unique_code != 0 {
                self.remove_unique_card(mat);
            }
            self.stack_material(host, mat, &mut severed);
        }
        severed
    }

    /// Move one card under a host. Its equips are severed into `severed`.
    pub fn stack_material(
        &mut self,
        host: CardHandle,
        mat: CardHandle,
        severed: &mut Vec<CardHandle>,
    ) {
        if self.card(mat).overlay_target == Some(host) {
            return;
        }
        let previous = self.field_place(mat);
        let prev_state = self.card(mat).current;
        if self.card(mat).overlay_target.is_none() {
            self.enable_card_effects(mat, false);
            self.cancel_field_effects(mat);
        } else if let Some(old_host) = self.card(mat).overlay_target {
            self.unstack_material(old_host, mat);
        }
        let host_place = self.field_place(host);
        let current = FieldPlace {
            controller: host_place.controller,
            location: host_place.location | location::OVERLAY,
            sequence: host_place.sequence,
            position: 0,
        };
        let code = self.card(mat).data.code;
        self.emit(Message::Move {
            card: mat,
            code,
            previous,
            current,
            reason: reason::XYZ | reason::MATERIAL,
        });
        self.card_mut(host).overlay_materials.push(mat);
        let sequence = self.card(host).overlay_materials.len() as u32 - 1;
        let own_equips: Vec<CardHandle> = self.card(mat).equips.iter().copied().collect();
        for eq in own_equips {
            self.unequip(eq);
            severed.push(eq);
        }
        let card = self.card_mut(mat);
        card.overlay_target = Some(host);
        card.previous.controller = prev_state.controller;
        card.previous.location = prev_state.location;
        card.previous.sequence = prev_state.sequence;
        card.current.controller = PLAYER_NONE;
        card.current.location = location::OVERLAY;
        card.current.sequence = sequence;
        card.current.reason = reason::XYZ | reason::MATERIAL;
        card.current.reason_card = Some(host);
    }

    /// Pull one material out from under its host. Remaining materials
    /// are renumbered to stay contiguous.
    pub fn unstack_material(&mut self, host: CardHandle, mat: CardHandle) {
        if self.card(mat).overlay_target != Some(host) {
            return;
        }
        let seq = self.card(mat).current.sequence as usize;
        self.card_mut(host).overlay_materials.remove(seq);
        {
            let card = self.card_mut(mat);
            card.previous.controller = card.current.controller;
            card.previous.location = card.current.location;
            card.previous.sequence = card.current.sequence;
            card.current.controller = PLAYER_NONE;
            card.current.location = 0;
            card.current.sequence = 0;
            card.overlay_target = None;
        }
        let remaining: Vec<CardHandle> = self.card(host).overlay_materials.clone();
        for (i, m) in remaining.into_iter().enumerate() {
            self.card_mut(m).current.sequence = i as u32;
        }
    }

    // -- summon materials --------------------------------------------------

    /// Record the cards consumed by a summon and let the summoned card's
    /// material checks observe them.
    pub fn set_materials(&mut self, ch: CardHandle, materials: FxHashSet<CardHandle>) {
        for &m in &materials {
            self.card_mut(m).current.reason_card = Some(ch);
        }
        self.card_mut(ch).summon_materials = materials;
        let checks = self.filter_effects(ch, codes::MATERIAL_CHECK);
        for eh in checks {
            self.effect_value_on(eh, ch);
        }
    }

    /// Count equipped union monsters.
    #[must_use]
    pub fn union_count(&self, ch: CardHandle) -> usize {
        self.card(ch)
            .equips
            .iter()
            .filter(|&&eq| {
                let c = self.card(eq);
                c.data.card_type & crate::core::consts::card_type::UNION != 0
                    && c.is_status(status::UNION)
            })
            .count()
    }

    // -- counters ----------------------------------------------------------

    /// Whether a counter of this kind could legally be placed right now.
    pub fn can_add_counter(&mut self, ch: CardHandle, kind: u16, count: u16) -> bool {
        {
            let card = self.card(ch);
            if card.current.location & location::ONFIELD == 0 || !card.is_faceup() {
                return false;
            }
        }
        use crate::core::consts::counter;
        if kind & counter::NEED_ENABLE != 0 && self.card(ch).is_status(status::DISABLED) {
            return false;
        }
        let base_kind = u32::from(kind & 0xffff);
        if kind & counter::NEED_PERMIT != 0
            && self
                .is_affected_by(ch, codes::COUNTER_PERMIT | base_kind)
                .is_none()
        {
            return false;
        }
        let limits = self.filter_effects(ch, codes::COUNTER_LIMIT | base_kind);
        if let Some(&last) = limits.last() {
            let limit = self.effect_value_raw(last);
            let current = i64::from(self.card(ch).counter(kind));
            if limit > 0 && current + i64::from(count) > limit {
                return false;
            }
        }
        true
    }

    /// Place counters. Legality is the caller's concern; pair with
    /// [`Duel::can_add_counter`] when the placement is rule-driven.
    pub fn add_counter(&mut self, ch: CardHandle, kind: u16, count: u16) {
        *self.card_mut(ch).counters.entry(kind).or_insert(0) += count;
        let place = self.field_place(ch);
        self.emit(Message::AddCounter { kind, place, count });
    }

    /// Remove counters, clamped at zero. Returns false when the card
    /// holds none of this kind.
    pub fn remove_counter(&mut self, ch: CardHandle, kind: u16, count: u16) -> bool {
        let Some(&current) = self.card(ch).counters.get(&kind) else {
            return false;
        };
        if count >= current {
            self.card_mut(ch).counters.remove(&kind);
        } else {
            *self.card_mut(ch).counters.get_mut(&kind).unwrap() -= count;
        }
        let place = self.field_place(ch);
        self.emit(Message::RemoveCounter { kind, place, count });
        true
    }

    // -- targeting ---------------------------------------------------------

    /// Record that `card` targets `target` with a continuous link.
    pub fn add_card_target(&mut self, card: CardHandle, target: CardHandle) {
        self.card_mut(card).targeting.insert(target);
        self.card_mut(target).targeted_by.insert(card);
        let msg = Message::CardTarget {
            card: self.field_place(card),
            target: self.field_place(target),
        };
        self.emit(msg);
    }

    /// Drop a continuous targeting link if it exists.
    pub fn cancel_card_target(&mut self, card: CardHandle, target: CardHandle) {
        if !self.card(card).targeting.contains(&target) {
            return;
        }
        self.card_mut(card).targeting.remove(&target);
        self.card_mut(target).targeted_by.remove(&card);
        let msg = Message::CancelTarget {
            card: self.field_place(card),
            target: self.field_place(target),
        };
        self.emit(msg);
    }

    // -- relations ---------------------------------------------------------

    /// Remember that `ch` is related to `other`, dying on the given
    /// reset bits. Re-adding keeps the original bits.
    pub fn add_relation(&mut self, ch: CardHandle, other: CardHandle, reset_bits: u32) {
        self.card_mut(ch).relations.entry(other).or_insert(reset_bits);
    }

    #[must_use]
    pub fn has_relation(&self, ch: CardHandle, other: CardHandle) -> bool {
        self.card(ch).relations.contains_key(&other)
    }

    pub fn remove_relation(&mut self, ch: CardHandle, other: CardHandle) {
        self.card_mut(ch).relations.remove(&other);
    }

    /// Refcounted relation to a modifier; used by actions that resolve
    /// in stages.
    pub fn add_effect_relation(&mut self, ch: CardHandle, eh: EffectHandle) {
        *self.card_mut(ch).effect_relations.entry(eh).or_insert(0) += 1;
    }

    pub fn remove_effect_relation(&mut self, ch: CardHandle, eh: EffectHandle) {
        if let Some(n) = self.card_mut(ch).effect_relations.get_mut(&eh) {
            *n -= 1;
            if *n == 0 {
                self.card_mut(ch).effect_relations.remove(&eh);
            }
        }
    }

    #[must_use]
    pub fn has_effect_relation(&self, ch: CardHandle, eh: EffectHandle) -> bool {
        self.card(ch).effect_relations.contains_key(&eh)
    }

    /// Stamp the turn a card has been face-up on the field, with a
    /// client hint.
    pub fn count_turn(&mut self, ch: CardHandle, turns: u16) {
        self.card_mut(ch).turn_counter = turns;
        let place = self.field_place(ch);
        self.emit(Message::CardHint {
            place,
            hint: HintKind::Turn,
            value: u64::from(turns),
            source: None,
        });
    }

    // -- status refreshers -------------------------------------------------

    /// Recompute a card's disabled bit from the modifiers reaching it.
    /// Returns the new state.
    pub fn refresh_disable_status(&mut self, ch: CardHandle) -> bool {
        let pre = self.card(ch).is_status(status::DISABLED);
        self.refresh_immunity(ch);
        let disabled = self.is_affected_by(ch, codes::CANNOT_DISABLE).is_none()
            && self.is_affected_by(ch, codes::DISABLE).is_some();
        self.card_mut(ch).set_status(status::DISABLED, disabled);
        if disabled != pre {
            self.refresh_immunity(ch);
        }
        disabled
    }

    /// The controller the card should settle to: its owner, unless a
    /// control-changing modifier holds it and brainwashing removal is
    /// not in force. The caller applies the result.
    pub fn refresh_control_status(&mut self, ch: CardHandle) -> u8 {
        let owner = self.card(ch).owner;
        if self.remove_brainwashing > 0 {
            return owner;
        }
        let holds = self.filter_effects(ch, codes::SET_CONTROL);
        let Some(&last) = holds.last() else {
            return owner;
        };
        let value = self.effect_value_on(last, ch);
        value as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::PrintedData;
    use crate::core::consts::position;
    use crate::effects::{etype, flag, Callable, ResolutionContext};

    fn monster_at(duel: &mut Duel, code: u32, controller: u8, sequence: u32) -> CardHandle {
        let ch = duel.new_card(PrintedData::monster(code, 4, 1700, 1000), controller);
        let card = duel.card_mut(ch);
        card.current.controller = controller;
        card.current.location = location::MZONE;
        card.current.sequence = sequence;
        card.current.position = position::FACEUP_ATTACK;
        card.set_status(status::EFFECT_ENABLED, true);
        ch
    }

    #[test]
    fn test_equip_links_both_sides() {
        let mut duel = Duel::new();
        let wearer = monster_at(&mut duel, 1, 0, 0);
        let sword = duel.new_card(PrintedData::monster(2, 0, 0, 0), 0);
        duel.equip(sword, wearer, true);
        assert_eq!(duel.card(sword).equip_target, Some(wearer));
        assert!(duel.card(wearer).equips.contains(&sword));
        duel.unequip(sword);
        assert_eq!(duel.card(sword).equip_target, None);
        assert_eq!(duel.card(sword).pre_equip_target, Some(wearer));
        assert!(duel.card(wearer).equips.is_empty());
    }

    #[test]
    fn test_double_equip_is_a_noop() {
        let mut duel = Duel::new();
        let a = monster_at(&mut duel, 1, 0, 0);
        let b = monster_at(&mut duel, 2, 1, 0);
        let sword = duel.new_card(PrintedData::monster(3, 0, 0, 0), 0);
        duel.equip(sword, a, false);
        duel.equip(sword, b, false);
        assert_eq!(duel.card(sword).equip_target, Some(a));
        assert!(!duel.card(b).equips.contains(&sword));
    }

    #[test]
    fn test_overlay_sequences_stay_contiguous() {
        let mut duel = Duel::new();
        let host = monster_at(&mut duel, 10, 0, 0);
        let m1 = monster_at(&mut duel, 11, 0, 1);
        let m2 = monster_at(&mut duel, 12, 0, 2);
        let m3 = monster_at(&mut duel, 13, 0, 3);
        duel.overlay(host, &[m1, m2, m3]);
        assert_eq!(duel.card(host).overlay_materials.len(), 3);
        let mid = duel.card(host).overlay_materials[1];
        duel.unstack_material(host, mid);
        let mats = duel.card(host).overlay_materials.clone();
        assert_eq!(mats.len(), 2);
        for (i, m) in mats.iter().enumerate() {
            assert_eq!(duel.card(*m).current.sequence, i as u32);
        }
        assert_eq!(duel.card(mid).overlay_target, None);
    }

    #[test]
    fn test_overlay_severs_material_equips() {
        let mut duel = Duel::new();
        let host = monster_at(&mut duel, 10, 0, 0);
        let mat = monster_at(&mut duel, 11, 0, 1);
        let sword = duel.new_card(PrintedData::monster(12, 0, 0, 0), 0);
        duel.equip(sword, mat, false);
        let severed = duel.overlay(host, &[mat]);
        assert_eq!(severed, vec![sword]);
        assert_eq!(duel.card(sword).equip_target, None);
        assert_eq!(duel.card(mat).current.location, location::OVERLAY);
        assert_eq!(duel.card(mat).current.controller, PLAYER_NONE);
    }

    #[test]
    fn test_counter_removal_clamps() {
        let mut duel = Duel::new();
        let ch = monster_at(&mut duel, 1, 0, 0);
        duel.add_counter(ch, 0x1, 3);
        assert_eq!(duel.card(ch).counter(0x1), 3);
        assert!(duel.remove_counter(ch, 0x1, 5));
        assert_eq!(duel.card(ch).counter(0x1), 0);
        assert!(!duel.remove_counter(ch, 0x1, 1));
    }

    #[test]
    fn test_counter_limit_blocks_placement() {
        let mut duel = Duel::new();
        let ch = monster_at(&mut duel, 1, 0, 0);
        let ctx = ResolutionContext::default();
        let limit = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::COUNTER_LIMIT | 0x1)
            .with_value(Callable::Constant(2));
        duel.attach(ch, limit, &ctx).unwrap();
        assert!(duel.can_add_counter(ch, 0x1, 2));
        duel.add_counter(ch, 0x1, 2);
        assert!(!duel.can_add_counter(ch, 0x1, 1));
    }

    #[test]
    fn test_counter_permit_required() {
        use crate::core::consts::counter;
        let mut duel = Duel::new();
        let ch = monster_at(&mut duel, 1, 0, 0);
        let kind = counter::NEED_PERMIT | 0x3;
        assert!(!duel.can_add_counter(ch, kind, 1));
        let ctx = ResolutionContext::default();
        let permit = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::COUNTER_PERMIT | u32::from(kind & 0xffff));
        duel.attach(ch, permit, &ctx).unwrap();
        assert!(duel.can_add_counter(ch, kind, 1));
    }

    #[test]
    fn test_card_target_symmetry() {
        let mut duel = Duel::new();
        let a = monster_at(&mut duel, 1, 0, 0);
        let b = monster_at(&mut duel, 2, 1, 0);
        duel.add_card_target(a, b);
        assert!(duel.card(a).targeting.contains(&b));
        assert!(duel.card(b).targeted_by.contains(&a));
        duel.cancel_card_target(a, b);
        assert!(duel.card(a).targeting.is_empty());
        assert!(duel.card(b).targeted_by.is_empty());
        // Cancelling an absent link emits nothing.
        let before = duel.messages().len();
        duel.cancel_card_target(a, b);
        assert_eq!(duel.messages().len(), before);
    }

    #[test]
    fn test_effect_relations_refcount() {
        let mut duel = Duel::new();
        let ch = monster_at(&mut duel, 1, 0, 0);
        let eh = EffectHandle(77);
        duel.add_effect_relation(ch, eh);
        duel.add_effect_relation(ch, eh);
        duel.remove_effect_relation(ch, eh);
        assert!(duel.has_effect_relation(ch, eh));
        duel.remove_effect_relation(ch, eh);
        assert!(!duel.has_effect_relation(ch, eh));
    }

    #[test]
    fn test_control_refresh_takes_latest_hold() {
        let mut duel = Duel::new();
        let ch = monster_at(&mut duel, 1, 0, 0);
        let ctx = ResolutionContext::default();
        let older = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::SET_CONTROL)
            .with_value(Callable::Constant(1));
        duel.attach(ch, older, &ctx).unwrap();
        let newer = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::SET_CONTROL)
            .with_value(Callable::Constant(0));
        duel.attach(ch, newer, &ctx).unwrap();
        assert_eq!(duel.refresh_control_status(ch), 0);
    }

    #[test]
    fn test_brainwashing_removal_restores_owner() {
        let mut duel = Duel::new();
        let ch = monster_at(&mut duel, 1, 0, 0);
        let ctx = ResolutionContext::default();
        let hold = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::SET_CONTROL)
            .with_value(Callable::Constant(1));
        duel.attach(ch, hold, &ctx).unwrap();
        assert_eq!(duel.refresh_control_status(ch), 1);
        let field = duel.alloc_effect(ch).with_code(codes::REMOVE_BRAINWASHING);
        duel.attach_field_only(field);
        assert_eq!(duel.refresh_control_status(ch), 0);
    }

    #[test]
    fn test_disable_refresh_flips_status() {
        let mut duel = Duel::new();
        let ch = monster_at(&mut duel, 1, 0, 0);
        let ctx = ResolutionContext::default();
        assert!(!duel.refresh_disable_status(ch));
        let negate = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::DISABLE)
            .with_flag(flag::CANNOT_DISABLE);
        duel.attach(ch, negate, &ctx).unwrap();
        assert!(duel.refresh_disable_status(ch));
        assert!(duel.card(ch).is_status(status::DISABLED));
    }
}
