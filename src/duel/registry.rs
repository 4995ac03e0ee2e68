//! Modifier registry: attach, detach, filtering, availability, and
//! immunity.
//!
//! ## Lifecycle
//!
//! A modifier joins a card through [`Duel::attach`] and leaves through
//! [`Duel::detach`]; every other death route (resets, eviction,
//! copy teardown) funnels into `detach`. The global indexer maps each
//! live modifier to its card and container, which makes duplicate
//! attaches observable and detaches O(1).
//!
//! ## Filtering
//!
//! [`Duel::filter_effects`] answers "which modifiers of this code reach
//! this card right now": the card's own singles, equip modifiers
//! projected by its equippers, and the field-wide aura pool, each gated
//! by availability, range, targeting, and immunity, sorted by
//! application id so folds replay attach order.

use smallvec::SmallVec;

use crate::cards::card::EffectSlot;
use crate::cards::ContainerKind;
use crate::core::consts::{location, position, status};
use crate::core::ids::{CardHandle, EffectHandle, PLAYER_NONE};
use crate::core::message::{HintKind, Message};
use crate::duel::{CopyScope, Duel, EffectSet};
use crate::effects::{codes, estatus, etype, flag, reset, Effect, ResolutionContext};

impl Duel {
    // -- availability ------------------------------------------------------

    /// Whether a modifier currently applies at all.
    ///
    /// Action effects never do; passive effects must have a live, owned
    /// handler in the right zone and face, with the disable rules
    /// honored. A dynamic condition is consulted last; the modifier's
    /// application id is re-stamped when the condition turns true after
    /// having been false, so newly available modifiers fold last.
    pub fn effect_is_available(&mut self, eh: EffectHandle) -> bool {
        let Some(e) = self.effects.get(&eh) else {
            return false;
        };
        let (etype_, flags, range, owner, handler) = (e.etype, e.flag, e.range, e.owner, e.handler);
        let has_condition = !matches!(e.condition, crate::effects::Callable::None);
        if etype_ & etype::ACTIONS != 0 {
            return false;
        }
        if etype_ & etype::SINGLE != 0 {
            let h = self.card(handler);
            if h.current.controller == PLAYER_NONE {
                return false;
            }
            if flags & flag::SINGLE_RANGE != 0 {
                if range & h.current.location == 0 {
                    return false;
                }
                if h.current.location & location::ONFIELD != 0
                    && (h.is_position(position::FACEDOWN) || !h.is_status(status::EFFECT_ENABLED))
                {
                    return false;
                }
            }
            if flags & flag::OWNER_RELATE != 0
                && flags & flag::CANNOT_DISABLE == 0
                && self.card(owner).is_status(status::DISABLED)
            {
                return false;
            }
            if owner == handler
                && flags & flag::CANNOT_DISABLE == 0
                && self.card(handler).is_status(status::DISABLED)
            {
                return false;
            }
        }
        if etype_ & etype::EQUIP != 0 {
            if self.card(handler).current.controller == PLAYER_NONE {
                return false;
            }
            if flags & flag::OWNER_RELATE != 0
                && flags & flag::CANNOT_DISABLE == 0
                && self.card(owner).is_status(status::DISABLED)
            {
                return false;
            }
            if owner == handler
                && flags & flag::CANNOT_DISABLE == 0
                && self.card(handler).is_status(status::DISABLED)
            {
                return false;
            }
            if flags & flag::SET_AVAILABLE == 0 {
                let h = self.card(handler);
                if !h.is_status(status::EFFECT_ENABLED) || !h.is_position(position::FACEUP) {
                    return false;
                }
            }
        }
        if etype_ & etype::FIELD != 0 && flags & flag::FIELD_ONLY == 0 {
            let h = self.card(handler);
            if h.current.controller == PLAYER_NONE {
                return false;
            }
            if flags & flag::OWNER_RELATE != 0
                && flags & flag::CANNOT_DISABLE == 0
                && self.card(owner).is_status(status::DISABLED)
            {
                return false;
            }
            if owner == handler
                && flags & flag::CANNOT_DISABLE == 0
                && self.card(handler).is_status(status::DISABLED)
            {
                return false;
            }
            let h = self.card(handler);
            if h.is_status(status::BATTLE_DESTROYED) && flags & flag::AVAILABLE_BD == 0 {
                return false;
            }
            if !h.is_status(status::EFFECT_ENABLED) {
                return false;
            }
            if range & h.current.location == 0 {
                return false;
            }
            if h.current.location & location::ONFIELD != 0 && !h.is_position(position::FACEUP) {
                return false;
            }
        }
        if !has_condition {
            return true;
        }
        let res = self.effect_condition(eh);
        if let Some(e) = self.effects.get_mut(&eh) {
            if res {
                if e.status & estatus::AVAILABLE == 0 {
                    e.id = self.info.field_id;
                    self.info.field_id += 1;
                }
                e.status |= estatus::AVAILABLE;
            } else {
                e.status &= !estatus::AVAILABLE;
            }
        }
        res
    }

    /// Whether a field-wide modifier reaches a given card.
    pub fn effect_is_target(&mut self, eh: EffectHandle, ch: CardHandle) -> bool {
        let Some(e) = self.effects.get(&eh) else {
            return false;
        };
        let (etype_, flags, s_range, o_range) = (e.etype, e.flag, e.s_range, e.o_range);
        if etype_ & etype::ACTIONS != 0 {
            return false;
        }
        if etype_ & (etype::SINGLE | etype::EQUIP) != 0 {
            return true;
        }
        {
            let c = self.card(ch);
            if flags & flag::SET_AVAILABLE == 0
                && c.current.location & location::ONFIELD != 0
                && !c.is_position(position::FACEUP)
            {
                return false;
            }
        }
        if flags & flag::IGNORE_RANGE == 0 {
            let c = self.card(ch);
            if c.is_status(status::SUMMONING | status::SUMMON_DISABLED) {
                return false;
            }
            let (controller, loc) = (c.current.controller, c.current.location);
            let own_side = if flags & flag::ABSOLUTE_TARGET != 0 {
                controller == 0
            } else {
                controller == self.handler_player(eh)
            };
            let range = if own_side { s_range } else { o_range };
            if range & loc == 0 {
                return false;
            }
        }
        self.effect_target_check(eh, ch)
    }

    // -- immunity ----------------------------------------------------------

    /// Rebuild a card's immunity set from the modifiers currently
    /// reaching it.
    pub fn refresh_immunity(&mut self, ch: CardHandle) {
        let mut set: EffectSet = SmallVec::new();
        let singles: EffectSlot = self
            .card(ch)
            .single_effects
            .get(&codes::IMMUNE_EFFECT)
            .cloned()
            .unwrap_or_default();
        for eh in singles {
            if self.effect_is_available(eh) {
                set.push(eh);
            }
        }
        let equippers: Vec<CardHandle> = self.card(ch).equips.iter().copied().collect();
        for eq in equippers {
            let slot: EffectSlot = self
                .card(eq)
                .equip_effects
                .get(&codes::IMMUNE_EFFECT)
                .cloned()
                .unwrap_or_default();
            for eh in slot {
                if self.effect_is_available(eh) {
                    set.push(eh);
                }
            }
        }
        let aura: EffectSlot = self
            .aura
            .get(&codes::IMMUNE_EFFECT)
            .cloned()
            .unwrap_or_default();
        for eh in aura {
            if self.effect_is_target(eh, ch) && self.effect_is_available(eh) {
                set.push(eh);
            }
        }
        self.sort_by_id(&mut set);
        self.card_mut(ch).immune_effects = SmallVec::from_iter(set);
    }

    /// Whether the card's immunity set blocks an incoming modifier.
    ///
    /// Immunity granted by the incoming modifier's own source never
    /// blocks it; finding such a grant ends the scan entirely.
    pub(crate) fn effect_is_immuned(&mut self, eh: EffectHandle, ch: CardHandle) -> bool {
        let Some(e) = self.effects.get(&eh) else {
            return false;
        };
        let (etype_, owner, handler) = (e.etype, e.owner, e.handler);
        let immune: SmallVec<[EffectHandle; 4]> = self.card(ch).immune_effects.clone();
        for ih in immune {
            let Some(ie) = self.effects.get(&ih) else {
                continue;
            };
            if etype_ & etype::ACTIONS != 0 {
                if ie.owner == handler {
                    return false;
                }
            } else if ie.owner == owner {
                return false;
            }
            let has_value = !matches!(ie.value, crate::effects::Callable::None);
            if has_value && self.effect_value_vs(ih, eh) != 0 {
                return true;
            }
        }
        false
    }

    /// Whether a card is subject to a modifier at all. Cards mid-summon
    /// are untouchable; immunity-piercing modifiers always land.
    pub fn can_affect(&mut self, eh: Option<EffectHandle>, ch: CardHandle) -> bool {
        if self.card(ch).is_status(status::SUMMONING) {
            return false;
        }
        let Some(eh) = eh else {
            return true;
        };
        if self
            .effects
            .get(&eh)
            .is_some_and(|e| e.is_flag(flag::IGNORE_IMMUNE))
        {
            return true;
        }
        !self.effect_is_immuned(eh, ch)
    }

    // -- filtering ---------------------------------------------------------

    pub(crate) fn gather_effects(&mut self, ch: CardHandle, code: u32, out: &mut EffectSet) {
        let singles: EffectSlot = self
            .card(ch)
            .single_effects
            .get(&code)
            .cloned()
            .unwrap_or_default();
        for eh in singles {
            if self.effect_is_available(eh) {
                let ranged = self
                    .effects
                    .get(&eh)
                    .is_some_and(|e| e.is_flag(flag::SINGLE_RANGE));
                if !ranged || self.can_affect(Some(eh), ch) {
                    out.push(eh);
                }
            }
        }
        let equippers: Vec<CardHandle> = self.card(ch).equips.iter().copied().collect();
        for eq in equippers {
            let slot: EffectSlot = self
                .card(eq)
                .equip_effects
                .get(&code)
                .cloned()
                .unwrap_or_default();
            for eh in slot {
                if self.effect_is_available(eh) && self.can_affect(Some(eh), ch) {
                    out.push(eh);
                }
            }
        }
        let aura: EffectSlot = self.aura.get(&code).cloned().unwrap_or_default();
        for eh in aura {
            let player_target = self
                .effects
                .get(&eh)
                .is_some_and(|e| e.is_flag(flag::PLAYER_TARGET));
            if !player_target
                && self.effect_is_available(eh)
                && self.effect_is_target(eh, ch)
                && self.can_affect(Some(eh), ch)
            {
                out.push(eh);
            }
        }
    }

    /// All modifiers of `code` reaching a card, in application order.
    pub fn filter_effects(&mut self, ch: CardHandle, code: u32) -> EffectSet {
        let mut out: EffectSet = SmallVec::new();
        self.gather_effects(ch, code, &mut out);
        self.sort_by_id(&mut out);
        out
    }

    /// Raw container walk: the card's singles plus its equippers' equip
    /// modifiers of `code`, with no availability or immunity gating.
    pub fn filter_single_continuous(&mut self, ch: CardHandle, code: u32) -> EffectSet {
        let mut out: EffectSet = SmallVec::new();
        if let Some(slot) = self.card(ch).single_effects.get(&code) {
            out.extend(slot.iter().copied());
        }
        let equippers: Vec<CardHandle> = self.card(ch).equips.iter().copied().collect();
        for eq in equippers {
            if let Some(slot) = self.card(eq).equip_effects.get(&code) {
                out.extend(slot.iter().copied());
            }
        }
        self.sort_by_id(&mut out);
        out
    }

    /// First modifier of `code` reaching the card, if any.
    pub fn is_affected_by(&mut self, ch: CardHandle, code: u32) -> Option<EffectHandle> {
        let mut out: EffectSet = SmallVec::new();
        self.gather_effects(ch, code, &mut out);
        out.first().copied()
    }

    /// Like [`Duel::is_affected_by`], but the modifier's value must also
    /// accept a second card (permit-style checks).
    pub fn is_affected_by_target(
        &mut self,
        ch: CardHandle,
        code: u32,
        target: CardHandle,
    ) -> Option<EffectHandle> {
        let mut out: EffectSet = SmallVec::new();
        self.gather_effects(ch, code, &mut out);
        out.into_iter()
            .find(|&eh| self.effect_value_on(eh, target) != 0)
    }

    // -- attach / detach ---------------------------------------------------

    /// Attach a modifier to a card. Returns the handle on success;
    /// `None` when the modifier is already attached somewhere, is
    /// rejected by a copy bracket, or has no container type.
    pub fn attach(
        &mut self,
        ch: CardHandle,
        mut effect: Effect,
        ctx: &ResolutionContext,
    ) -> Option<EffectHandle> {
        let eh = effect.handle;
        if self.card(ch).is_status(status::COPYING_EFFECT) && effect.is_flag(flag::UNCOPYABLE) {
            return None;
        }
        if self.indexer.contains_key(&eh) {
            return None;
        }
        let kind = if effect.etype & etype::SINGLE != 0 {
            ContainerKind::Single
        } else if effect.etype & etype::FIELD != 0 {
            ContainerKind::Field
        } else if effect.etype & etype::EQUIP != 0 {
            ContainerKind::Equip
        } else {
            return None;
        };
        // A zone-wide set evicts earlier sets of the same stat; a
        // set-final additionally evicts pending updates. Ranged sets
        // coexist and never evict.
        if kind == ContainerKind::Single && !effect.is_flag(flag::SINGLE_RANGE) {
            let evicted: Option<&[u32]> = match effect.code {
                codes::SET_ATTACK => Some(&[codes::SET_ATTACK, codes::SET_ATTACK_FINAL]),
                codes::SET_ATTACK_FINAL => Some(&[
                    codes::UPDATE_ATTACK,
                    codes::SET_ATTACK,
                    codes::SET_ATTACK_FINAL,
                ]),
                codes::SET_DEFENCE => Some(&[codes::SET_DEFENCE, codes::SET_DEFENCE_FINAL]),
                codes::SET_DEFENCE_FINAL => Some(&[
                    codes::UPDATE_DEFENCE,
                    codes::SET_DEFENCE,
                    codes::SET_DEFENCE_FINAL,
                ]),
                _ => None,
            };
            if let Some(victim_codes) = evicted {
                let mut victims: EffectSet = SmallVec::new();
                for &vc in victim_codes {
                    if let Some(slot) = self.card(ch).single_effects.get(&vc) {
                        for &veh in slot {
                            if self
                                .effects
                                .get(&veh)
                                .is_some_and(|e| !e.is_flag(flag::SINGLE_RANGE))
                            {
                                victims.push(veh);
                            }
                        }
                    }
                }
                for veh in victims {
                    self.detach(veh);
                }
            }
        }
        effect.id = self.info.field_id;
        self.info.field_id += 1;
        effect.card_type = self.card(ch).data.card_type;
        effect.handler = ch;
        if self.card(ch).is_status(status::INITIALIZING) {
            effect.flag |= flag::INITIAL;
        }
        if self.card(ch).is_status(status::COPYING_EFFECT) {
            if let Some(scope) = self.copy_scope {
                effect.copy_id = self.info.copy_id;
                effect.reset_flag |= scope.reset_flag;
                effect.reset_count = scope.reset_count;
            }
        }
        if effect.is_flag(flag::COPY_INHERIT) {
            if let Some(reh) = ctx.reason_effect {
                if let Some(re) = self.effects.get(&reh) {
                    if re.copy_id != 0 {
                        effect.copy_id = re.copy_id;
                        effect.reset_flag |= re.reset_flag;
                        if effect.reset_count > re.reset_count {
                            effect.reset_count = re.reset_count;
                        }
                    }
                }
            }
        }
        if effect.reset_flag & reset::PHASE != 0 && effect.reset_count == 0 {
            effect.reset_count = 1;
        }
        let code = effect.code;
        let etype_ = effect.etype;
        let flags = effect.flag;
        let reset_flag = effect.reset_flag;
        let description = effect.description;
        let disable_related = effect.is_disable_related();
        let in_range = effect.in_range(self.card(ch).current.location);

        self.card_mut(ch)
            .container_mut(kind)
            .entry(code)
            .or_default()
            .push(eh);
        self.effects.insert(eh, effect);
        self.indexer.insert(eh, (ch, kind));

        if etype_ & etype::FIELD != 0 && in_range {
            self.aura_insert(eh);
        }
        let check_target = match kind {
            ContainerKind::Equip => self.card(ch).equip_target,
            _ => Some(ch),
        };
        if self.card(ch).current.controller != PLAYER_NONE && disable_related {
            if let Some(t) = check_target {
                self.add_to_disable_check_list(t);
            }
        }
        if flags & flag::OATH != 0 {
            self.oath.insert(eh, ctx.reason_effect);
        }
        if reset_flag & reset::PHASE != 0 {
            self.phase_scoped.insert(eh);
        }
        if reset_flag & reset::CHAIN != 0 {
            self.chain_scoped.insert(eh);
        }
        if flags & flag::COUNT_LIMIT != 0 {
            self.rechargeable.insert(eh);
        }
        if flags & flag::CLIENT_HINT != 0 {
            let place = self.field_place(ch);
            self.emit(Message::CardHint {
                place,
                hint: HintKind::DescAdd,
                value: u64::from(description),
                source: Some(eh),
            });
        }
        Some(eh)
    }

    /// Register a handler-less field-wide modifier directly into the
    /// aura pool.
    pub fn attach_field_only(&mut self, mut effect: Effect) -> EffectHandle {
        let eh = effect.handle;
        effect.flag |= flag::FIELD_ONLY;
        effect.etype |= etype::FIELD;
        effect.id = self.info.field_id;
        self.info.field_id += 1;
        self.effects.insert(eh, effect);
        self.aura_insert(eh);
        eh
    }

    /// Detach a modifier wherever it lives. Safe to call twice; the
    /// second call is a no-op.
    pub fn detach(&mut self, eh: EffectHandle) {
        if let Some(&(ch, kind)) = self.indexer.get(&eh) {
            let Some(e) = self.effects.get(&eh).cloned() else {
                return;
            };
            if let Some(slot) = self.card_mut(ch).container_mut(kind).get_mut(&e.code) {
                slot.retain(|h| *h != eh);
                if slot.is_empty() {
                    self.card_mut(ch).container_mut(kind).remove(&e.code);
                }
            }
            let mut check_target = Some(ch);
            match kind {
                ContainerKind::Single => {}
                ContainerKind::Field => {
                    check_target = None;
                    let card = self.card(ch);
                    let in_range = e.in_range(card.current.location);
                    if in_range
                        && card.is_status(status::EFFECT_ENABLED)
                        && !card.is_status(status::DISABLED)
                        && e.is_disable_related()
                    {
                        self.update_disable_check_list(eh);
                    }
                    if in_range {
                        self.aura_remove(eh);
                    }
                }
                ContainerKind::Equip => {
                    check_target = self.card(ch).equip_target;
                }
            }
            if self.card(ch).current.controller != PLAYER_NONE
                && !self.card(ch).is_status(status::DISABLED)
                && e.is_disable_related()
            {
                if let Some(t) = check_target {
                    self.add_to_disable_check_list(t);
                }
            }
            self.indexer.remove(&eh);
            if e.is_flag(flag::OATH) {
                self.oath.remove(&eh);
            }
            if e.reset_flag & reset::PHASE != 0 {
                self.phase_scoped.remove(&eh);
            }
            if e.reset_flag & reset::CHAIN != 0 {
                self.chain_scoped.remove(&eh);
            }
            if e.is_flag(flag::COUNT_LIMIT) {
                self.rechargeable.remove(&eh);
            }
            // Detaching a counter permit strips the counters it allowed.
            if e.code & codes::COUNTER_FAMILY_MASK == codes::COUNTER_PERMIT
                && e.etype & etype::SINGLE != 0
            {
                let counter_kind = (e.code & 0xffff) as u16;
                if let Some(count) = self.card(ch).counters.get(&counter_kind).copied() {
                    let place = self.field_place(ch);
                    self.emit(Message::RemoveCounter {
                        kind: counter_kind,
                        place,
                        count,
                    });
                    self.card_mut(ch).counters.remove(&counter_kind);
                }
            }
            if e.is_flag(flag::CLIENT_HINT) {
                let place = self.field_place(ch);
                self.emit(Message::CardHint {
                    place,
                    hint: HintKind::DescRemove,
                    value: u64::from(e.description),
                    source: Some(eh),
                });
            }
            if e.code == codes::UNIQUE_CHECK {
                self.remove_unique_card(ch);
                let card = self.card_mut(ch);
                card.unique_pos = [0, 0];
                card.unique_code = 0;
            }
        } else {
            // Handler-less aura entries bypass the indexer.
            if self.effects.contains_key(&eh) {
                self.aura_remove(eh);
            }
        }
        self.effects.remove(&eh);
    }

    // -- aura pool ---------------------------------------------------------

    pub(crate) fn aura_insert(&mut self, eh: EffectHandle) {
        let Some(e) = self.effects.get(&eh) else {
            return;
        };
        let code = e.code;
        if code == codes::REMOVE_BRAINWASHING {
            self.remove_brainwashing += 1;
        }
        self.aura.entry(code).or_default().push(eh);
    }

    pub(crate) fn aura_remove(&mut self, eh: EffectHandle) {
        let Some(e) = self.effects.get(&eh) else {
            return;
        };
        let code = e.code;
        if let Some(slot) = self.aura.get_mut(&code) {
            let before = slot.len();
            slot.retain(|h| *h != eh);
            if slot.len() != before && code == codes::REMOVE_BRAINWASHING {
                self.remove_brainwashing = self.remove_brainwashing.saturating_sub(1);
            }
            if slot.is_empty() {
                self.aura.remove(&code);
            }
        }
    }

    /// Register a card's field-wide modifiers when it lands in their
    /// range, plus its uniqueness claim when it hits the field.
    pub fn apply_field_effects(&mut self, ch: CardHandle) {
        if self.card(ch).current.controller == PLAYER_NONE {
            return;
        }
        let loc = self.card(ch).current.location;
        let mut to_add: EffectSet = SmallVec::new();
        for slot in self.card(ch).field_effects.values() {
            for &eh in slot {
                if self.effects.get(&eh).is_some_and(|e| e.in_range(loc)) {
                    to_add.push(eh);
                }
            }
        }
        for eh in to_add {
            self.aura_insert(eh);
        }
        if self.card(ch).unique_code != 0 && loc & location::ONFIELD != 0 {
            self.add_unique_card(ch);
        }
    }

    /// Undo [`Duel::apply_field_effects`] when the card leaves the range.
    pub fn cancel_field_effects(&mut self, ch: CardHandle) {
        if self.card(ch).current.controller == PLAYER_NONE {
            return;
        }
        let loc = self.card(ch).current.location;
        let mut to_remove: EffectSet = SmallVec::new();
        for slot in self.card(ch).field_effects.values() {
            for &eh in slot {
                if self.effects.get(&eh).is_some_and(|e| e.in_range(loc)) {
                    to_remove.push(eh);
                }
            }
        }
        for eh in to_remove {
            self.aura_remove(eh);
        }
        if self.card(ch).unique_code != 0 && loc & location::ONFIELD != 0 {
            self.remove_unique_card(ch);
        }
    }

    /// Turn a card's passive surface on or off (flip, faceup landing,
    /// facedown set). Re-enabling re-stamps the ids of its in-range
    /// modifiers so they fold after everything older, and delivers the
    /// disable reset if the card comes back disabled.
    pub fn enable_card_effects(&mut self, ch: CardHandle, enabled: bool) {
        if self.card(ch).current.location == 0 {
            return;
        }
        if enabled == self.card(ch).is_status(status::EFFECT_ENABLED) {
            return;
        }
        self.refresh_disable_status(ch);
        if enabled {
            self.card_mut(ch).set_status(status::EFFECT_ENABLED, true);
            let loc = self.card(ch).current.location;
            let mut to_stamp: EffectSet = SmallVec::new();
            for slot in self.card(ch).single_effects.values() {
                for &eh in slot {
                    if self
                        .effects
                        .get(&eh)
                        .is_some_and(|e| e.is_flag(flag::SINGLE_RANGE) && e.in_range(loc))
                    {
                        to_stamp.push(eh);
                    }
                }
            }
            for slot in self.card(ch).field_effects.values() {
                for &eh in slot {
                    if self.effects.get(&eh).is_some_and(|e| e.in_range(loc)) {
                        to_stamp.push(eh);
                    }
                }
            }
            if loc == location::SZONE {
                for slot in self.card(ch).equip_effects.values() {
                    to_stamp.extend(slot.iter().copied());
                }
            }
            self.sort_by_id(&mut to_stamp);
            for eh in to_stamp {
                if let Some(e) = self.effects.get_mut(&eh) {
                    e.id = self.info.field_id;
                    self.info.field_id += 1;
                }
            }
            if self.card(ch).is_status(status::DISABLED) {
                self.reset(ch, reset::DISABLE, crate::effects::ResetKind::Event);
            }
        } else {
            self.card_mut(ch).set_status(status::EFFECT_ENABLED, false);
        }
        self.refresh_immunity(ch);
        if self.card(ch).is_status(status::DISABLED) {
            return;
        }
        self.schedule_disable_related(ch);
    }

    /// Queue rechecks for everything this card's disable-related
    /// modifiers might reach.
    pub(crate) fn schedule_disable_related(&mut self, ch: CardHandle) {
        let mut field_like: EffectSet = SmallVec::new();
        let mut equip_like = false;
        for (kind, container) in [
            (ContainerKind::Single, &self.card(ch).single_effects),
            (ContainerKind::Field, &self.card(ch).field_effects),
            (ContainerKind::Equip, &self.card(ch).equip_effects),
        ] {
            for slot in container.values() {
                for &eh in slot {
                    if self.effects.get(&eh).is_some_and(Effect::is_disable_related) {
                        match kind {
                            ContainerKind::Field => field_like.push(eh),
                            ContainerKind::Equip => equip_like = true,
                            ContainerKind::Single => {}
                        }
                    }
                }
            }
        }
        for eh in field_like {
            self.update_disable_check_list(eh);
        }
        if equip_like {
            if let Some(t) = self.card(ch).equip_target {
                self.add_to_disable_check_list(t);
            }
        }
    }

    /// Queue a recheck for every on-field card a field-wide modifier
    /// reaches.
    pub fn update_disable_check_list(&mut self, eh: EffectHandle) {
        let mut targets: Vec<CardHandle> = Vec::new();
        for idx in 0..self.cards.len() {
            let h = CardHandle(idx as u32);
            if self.card(h).current.location & location::ONFIELD != 0
                && self.effect_is_target(eh, h)
            {
                targets.push(h);
            }
        }
        for h in targets {
            self.add_to_disable_check_list(h);
        }
    }

    // -- uniqueness --------------------------------------------------------

    pub(crate) fn add_unique_card(&mut self, ch: CardHandle) {
        let controller = self.card(ch).current.controller;
        if (controller as usize) < 2 {
            self.unique_cards[controller as usize].insert(ch);
        }
    }

    pub(crate) fn remove_unique_card(&mut self, ch: CardHandle) {
        let controller = self.card(ch).current.controller;
        if (controller as usize) < 2 {
            self.unique_cards[controller as usize].remove(&ch);
        }
    }

    // -- copy brackets -----------------------------------------------------

    /// Open a copy bracket: effects attached to `ch` until
    /// [`Duel::finish_copy`] are stamped with a fresh copy generation
    /// and the given reset metadata.
    pub fn begin_copy(&mut self, ch: CardHandle, reset_flag: u32, reset_count: u8) {
        self.card_mut(ch).set_status(status::COPYING_EFFECT, true);
        self.copy_scope = Some(CopyScope {
            reset_flag,
            reset_count,
        });
    }

    /// Close the copy bracket and return the generation id it minted.
    pub fn finish_copy(&mut self, ch: CardHandle) -> u32 {
        self.card_mut(ch).set_status(status::COPYING_EFFECT, false);
        self.copy_scope = None;
        let generation = self.info.copy_id;
        self.info.copy_id += 1;
        generation
    }
}
