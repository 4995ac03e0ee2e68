//! Derived card attributes.
//!
//! Nothing here is stored: every getter folds the printed face through
//! the modifiers currently reaching the card, in application order. The
//! getters are re-entrant; a modifier value that reads the attribute
//! being folded observes the partial parked in the card's
//! [`ComputeScratch`](crate::cards::ComputeScratch) slot instead of
//! recursing. An [`Assume`] override short-circuits the whole fold.

use smallvec::SmallVec;

use crate::cards::state::{Assume, Computing};
use crate::core::consts::{card_type, location};
use crate::core::ids::CardHandle;
use crate::duel::{Duel, EffectSet};
use crate::effects::{codes, etype, flag};

/// Zones where a card presents an effective code (mzone, szone, grave).
const CODE_ZONES: u32 = location::MZONE | location::SZONE | location::GRAVE;
/// Zones where a card presents an effective type.
const TYPE_ZONES: u32 = location::HAND | location::MZONE | location::SZONE | location::GRAVE;

impl Duel {
    fn merged_effects(&mut self, ch: CardHandle, codes_: &[u32]) -> EffectSet {
        let mut out: EffectSet = SmallVec::new();
        for &code in codes_ {
            self.gather_effects(ch, code, &mut out);
        }
        self.sort_by_id(&mut out);
        out
    }

    fn is_single_unranged(&self, eh: crate::core::ids::EffectHandle) -> bool {
        self.effects
            .get(&eh)
            .is_some_and(|e| e.etype & etype::SINGLE != 0 && !e.is_flag(flag::SINGLE_RANGE))
    }

    // -- code --------------------------------------------------------------

    /// The card's effective code: printed code, through code-changing
    /// modifiers, collapsed to the alias when one applies.
    pub fn code(&mut self, ch: CardHandle) -> u32 {
        if let Some(v) = self.card(ch).assumed(Assume::Code) {
            return v;
        }
        {
            let card = self.card(ch);
            if card.current.location & CODE_ZONES == 0 {
                return if card.data.alias != 0 {
                    card.data.alias
                } else {
                    card.data.code
                };
            }
            if let Some(v) = card.scratch.code.in_progress() {
                return v as u32;
            }
        }
        let mut code = self.card(ch).data.code;
        self.card_mut(ch).scratch.code = Computing::InProgress(i64::from(code));
        // Only the newest code change matters; earlier ones are never
        // evaluated.
        let changes = self.filter_effects(ch, codes::CHANGE_CODE);
        if let Some(&last) = changes.last() {
            code = self.effect_value_on(last, ch) as u32;
        }
        self.card_mut(ch).scratch.code = Computing::Idle;
        if code == self.card(ch).data.code {
            if self.card(ch).data.alias != 0 {
                code = self.card(ch).data.alias;
            }
        } else if let Some(dat) = self.printed(code) {
            if dat.alias != 0 {
                code = dat.alias;
            }
        }
        code
    }

    /// The secondary code granted by a code-adding modifier, or 0.
    pub fn another_code(&mut self, ch: CardHandle) -> u32 {
        let adds = self.filter_effects(ch, codes::ADD_CODE);
        let Some(&last) = adds.last() else {
            return 0;
        };
        let otcode = self.effect_value_on(last, ch) as u32;
        if self.code(ch) != otcode {
            return otcode;
        }
        if self.card(ch).data.alias == otcode {
            return self.card(ch).data.code;
        }
        0
    }

    /// Whether the card's effective code belongs to an archetype.
    pub fn is_set_card(&mut self, ch: CardHandle, set_code: u32) -> bool {
        let code = self.code(ch);
        if code == self.card(ch).data.code {
            self.card(ch).data.matches_setcode(set_code)
        } else {
            self.printed(code)
                .is_some_and(|dat| dat.matches_setcode(set_code))
        }
    }

    // -- type --------------------------------------------------------------

    pub fn card_type(&mut self, ch: CardHandle) -> u32 {
        if let Some(v) = self.card(ch).assumed(Assume::Type) {
            return v;
        }
        {
            let card = self.card(ch);
            if card.current.location & TYPE_ZONES == 0 {
                return card.data.card_type;
            }
            // Pendulum zone cards present as pendulum spells.
            if card.current.location == location::SZONE && card.current.sequence >= 6 {
                return card_type::PENDULUM | card_type::SPELL;
            }
            if let Some(v) = card.scratch.card_type.in_progress() {
                return v as u32;
            }
        }
        let mut ty = self.card(ch).data.card_type;
        self.card_mut(ch).scratch.card_type = Computing::InProgress(i64::from(ty));
        let eset = self.merged_effects(
            ch,
            &[codes::ADD_TYPE, codes::REMOVE_TYPE, codes::CHANGE_TYPE],
        );
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let v = self.effect_value_on(eh, ch) as u32;
            match code {
                codes::ADD_TYPE => ty |= v,
                codes::REMOVE_TYPE => ty &= !v,
                _ => ty = v,
            }
            self.card_mut(ch).scratch.card_type = Computing::InProgress(i64::from(ty));
        }
        self.card_mut(ch).scratch.card_type = Computing::Idle;
        ty
    }

    // -- level / rank ------------------------------------------------------

    pub fn level(&mut self, ch: CardHandle) -> u32 {
        if self.card(ch).data.card_type & card_type::XYZ != 0 {
            return 0;
        }
        if let Some(v) = self.card(ch).assumed(Assume::Level) {
            return v;
        }
        {
            let card = self.card(ch);
            if card.current.location & (location::MZONE | location::HAND) == 0 {
                return card.data.level;
            }
            if let Some(v) = card.scratch.level.in_progress() {
                return v as u32;
            }
        }
        let mut level = i64::from(self.card(ch).data.level);
        let mut up = 0i64;
        let mut upc = 0i64;
        self.card_mut(ch).scratch.level = Computing::InProgress(level);
        let eset = self.merged_effects(ch, &[codes::UPDATE_LEVEL, codes::CHANGE_LEVEL]);
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let v = self.effect_value_on(eh, ch);
            if code == codes::UPDATE_LEVEL {
                if self.is_single_unranged(eh) {
                    up += v;
                } else {
                    upc += v;
                }
            } else {
                level = v;
                up = 0;
            }
            self.card_mut(ch).scratch.level = Computing::InProgress(level + up + upc);
        }
        level += up + upc;
        if level < 1 && self.card_type(ch) & card_type::MONSTER != 0 {
            level = 1;
        }
        self.card_mut(ch).scratch.level = Computing::Idle;
        level as u32
    }

    pub fn rank(&mut self, ch: CardHandle) -> u32 {
        if self.card(ch).data.card_type & card_type::XYZ == 0 {
            return 0;
        }
        if let Some(v) = self.card(ch).assumed(Assume::Rank) {
            return v;
        }
        {
            let card = self.card(ch);
            if card.current.location != location::MZONE {
                return card.data.level;
            }
            if let Some(v) = card.scratch.level.in_progress() {
                return v as u32;
            }
        }
        let mut rank = i64::from(self.card(ch).data.level);
        let mut up = 0i64;
        let mut upc = 0i64;
        self.card_mut(ch).scratch.level = Computing::InProgress(rank);
        let eset = self.merged_effects(ch, &[codes::UPDATE_RANK, codes::CHANGE_RANK]);
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let v = self.effect_value_on(eh, ch);
            if code == codes::UPDATE_RANK {
                if self.is_single_unranged(eh) {
                    up += v;
                } else {
                    upc += v;
                }
            } else {
                rank = v;
                up = 0;
            }
            self.card_mut(ch).scratch.level = Computing::InProgress(rank + up + upc);
        }
        rank += up + upc;
        if rank < 1 && self.card_type(ch) & card_type::MONSTER != 0 {
            rank = 1;
        }
        self.card_mut(ch).scratch.level = Computing::Idle;
        rank as u32
    }

    /// The level this card contributes to a synchro summon using it.
    pub fn synchro_level(&mut self, ch: CardHandle, for_card: CardHandle) -> u32 {
        if self.card(ch).data.card_type & card_type::XYZ != 0 {
            return 0;
        }
        let eset = self.filter_effects(ch, codes::SYNCHRO_LEVEL);
        match eset.first() {
            Some(&eh) => self.effect_value_on(eh, for_card) as u32,
            None => self.level(ch),
        }
    }

    /// The level this card contributes to a ritual summon using it.
    pub fn ritual_level(&mut self, ch: CardHandle, for_card: CardHandle) -> u32 {
        if self.card(ch).data.card_type & card_type::XYZ != 0 {
            return 0;
        }
        let eset = self.filter_effects(ch, codes::RITUAL_LEVEL);
        match eset.first() {
            Some(&eh) => self.effect_value_on(eh, for_card) as u32,
            None => self.level(ch),
        }
    }

    /// Whether this card can serve as a level-`lv` xyz material for
    /// `for_card`. A modifier may pack two acceptable levels into one
    /// value, low half and high half.
    pub fn is_xyz_level(&mut self, ch: CardHandle, for_card: CardHandle, lv: u32) -> bool {
        if self.card(ch).data.card_type & card_type::XYZ != 0 {
            return false;
        }
        let eset = self.filter_effects(ch, codes::XYZ_LEVEL);
        let lev = match eset.first() {
            Some(&eh) => self.effect_value_on(eh, for_card) as u32,
            None => self.level(ch),
        };
        (lev & 0xffff) == lv || (lev >> 16) == lv
    }

    // -- attribute / race --------------------------------------------------

    pub fn attribute(&mut self, ch: CardHandle) -> u32 {
        if let Some(v) = self.card(ch).assumed(Assume::Attribute) {
            return v;
        }
        {
            let card = self.card(ch);
            if card.current.location & (location::MZONE | location::GRAVE) == 0 {
                return card.data.attribute;
            }
            if card.current.location & location::GRAVE != 0
                && card.data.card_type & (card_type::SPELL | card_type::TRAP) != 0
            {
                return card.data.attribute;
            }
            if let Some(v) = card.scratch.attribute.in_progress() {
                return v as u32;
            }
        }
        let mut attr = self.card(ch).data.attribute;
        self.card_mut(ch).scratch.attribute = Computing::InProgress(i64::from(attr));
        let eset = self.merged_effects(
            ch,
            &[
                codes::ADD_ATTRIBUTE,
                codes::REMOVE_ATTRIBUTE,
                codes::CHANGE_ATTRIBUTE,
            ],
        );
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let v = self.effect_value_on(eh, ch) as u32;
            match code {
                codes::ADD_ATTRIBUTE => attr |= v,
                codes::REMOVE_ATTRIBUTE => attr &= !v,
                _ => attr = v,
            }
            self.card_mut(ch).scratch.attribute = Computing::InProgress(i64::from(attr));
        }
        self.card_mut(ch).scratch.attribute = Computing::Idle;
        attr
    }

    pub fn race(&mut self, ch: CardHandle) -> u32 {
        if let Some(v) = self.card(ch).assumed(Assume::Race) {
            return v;
        }
        {
            let card = self.card(ch);
            if card.current.location & (location::MZONE | location::GRAVE) == 0 {
                return card.data.race;
            }
            if card.current.location & location::GRAVE != 0
                && card.data.card_type & (card_type::SPELL | card_type::TRAP) != 0
            {
                return card.data.race;
            }
            if let Some(v) = card.scratch.race.in_progress() {
                return v as u32;
            }
        }
        let mut race = self.card(ch).data.race;
        self.card_mut(ch).scratch.race = Computing::InProgress(i64::from(race));
        let eset = self.merged_effects(
            ch,
            &[codes::ADD_RACE, codes::REMOVE_RACE, codes::CHANGE_RACE],
        );
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let v = self.effect_value_on(eh, ch) as u32;
            match code {
                codes::ADD_RACE => race |= v,
                codes::REMOVE_RACE => race &= !v,
                _ => race = v,
            }
            self.card_mut(ch).scratch.race = Computing::InProgress(i64::from(race));
        }
        self.card_mut(ch).scratch.race = Computing::Idle;
        race
    }

    // -- pendulum scales ---------------------------------------------------

    pub fn lscale(&mut self, ch: CardHandle) -> u32 {
        if self.card(ch).current.location & location::SZONE == 0 {
            return self.card(ch).data.lscale;
        }
        if let Some(v) = self.card(ch).scratch.lscale.in_progress() {
            return v as u32;
        }
        let mut scale = i64::from(self.card(ch).data.lscale);
        let mut up = 0i64;
        let mut upc = 0i64;
        self.card_mut(ch).scratch.lscale = Computing::InProgress(scale);
        let eset = self.merged_effects(ch, &[codes::UPDATE_LSCALE, codes::CHANGE_LSCALE]);
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let v = self.effect_value_on(eh, ch);
            if code == codes::UPDATE_LSCALE {
                if self.is_single_unranged(eh) {
                    up += v;
                } else {
                    upc += v;
                }
            } else {
                scale = v;
                up = 0;
            }
            self.card_mut(ch).scratch.lscale = Computing::InProgress(scale + up + upc);
        }
        scale += up + upc;
        self.card_mut(ch).scratch.lscale = Computing::Idle;
        scale as u32
    }

    pub fn rscale(&mut self, ch: CardHandle) -> u32 {
        if self.card(ch).current.location & location::SZONE == 0 {
            return self.card(ch).data.rscale;
        }
        if let Some(v) = self.card(ch).scratch.rscale.in_progress() {
            return v as u32;
        }
        let mut scale = i64::from(self.card(ch).data.rscale);
        let mut up = 0i64;
        let mut upc = 0i64;
        self.card_mut(ch).scratch.rscale = Computing::InProgress(scale);
        let eset = self.merged_effects(ch, &[codes::UPDATE_RSCALE, codes::CHANGE_RSCALE]);
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let v = self.effect_value_on(eh, ch);
            if code == codes::UPDATE_RSCALE {
                if self.is_single_unranged(eh) {
                    up += v;
                } else {
                    upc += v;
                }
            } else {
                scale = v;
                up = 0;
            }
            self.card_mut(ch).scratch.rscale = Computing::InProgress(scale + up + upc);
        }
        scale += up + upc;
        self.card_mut(ch).scratch.rscale = Computing::Idle;
        scale as u32
    }

    // -- attack / defence --------------------------------------------------

    pub fn attack(&mut self, ch: CardHandle) -> i32 {
        self.attack_internal(ch, false)
    }

    pub fn defence(&mut self, ch: CardHandle) -> i32 {
        self.defence_internal(ch, false)
    }

    pub fn base_attack(&mut self, ch: CardHandle) -> i32 {
        self.base_attack_internal(ch, false)
    }

    pub fn base_defence(&mut self, ch: CardHandle) -> i32 {
        self.base_defence_internal(ch, false)
    }

    pub(crate) fn base_attack_internal(&mut self, ch: CardHandle, swap: bool) -> i32 {
        {
            let card = self.card(ch);
            if card.current.location != location::MZONE {
                return card.data.attack;
            }
            if let Some(v) = card.scratch.base_attack.in_progress() {
                return v as i32;
            }
        }
        if !swap && self.is_affected_by(ch, codes::SWAP_BASE_AD).is_some() {
            return self.base_defence_internal(ch, true);
        }
        let mut batk = i64::from(self.card(ch).data.attack.max(0));
        self.card_mut(ch).scratch.base_attack = Computing::InProgress(batk);
        let eset = self.filter_effects(ch, codes::SET_BASE_ATTACK);
        for eh in eset {
            batk = self.effect_value_on(eh, ch).max(0);
            self.card_mut(ch).scratch.base_attack = Computing::InProgress(batk);
        }
        self.card_mut(ch).scratch.base_attack = Computing::Idle;
        batk as i32
    }

    pub(crate) fn base_defence_internal(&mut self, ch: CardHandle, swap: bool) -> i32 {
        {
            let card = self.card(ch);
            if card.current.location != location::MZONE {
                return card.data.defence;
            }
            if let Some(v) = card.scratch.base_defence.in_progress() {
                return v as i32;
            }
        }
        if !swap && self.is_affected_by(ch, codes::SWAP_BASE_AD).is_some() {
            return self.base_attack_internal(ch, true);
        }
        let mut bdef = i64::from(self.card(ch).data.defence.max(0));
        self.card_mut(ch).scratch.base_defence = Computing::InProgress(bdef);
        let eset = self.filter_effects(ch, codes::SET_BASE_DEFENCE);
        for eh in eset {
            bdef = self.effect_value_on(eh, ch).max(0);
            self.card_mut(ch).scratch.base_defence = Computing::InProgress(bdef);
        }
        self.card_mut(ch).scratch.base_defence = Computing::Idle;
        bdef as i32
    }

    pub(crate) fn attack_internal(&mut self, ch: CardHandle, swap: bool) -> i32 {
        if let Some(v) = self.card(ch).assumed(Assume::Attack) {
            return v as i32;
        }
        {
            let card = self.card(ch);
            if card.current.location != location::MZONE {
                return card.data.attack;
            }
            if let Some(v) = card.scratch.attack.in_progress() {
                return v as i32;
            }
        }
        if !swap && self.is_affected_by(ch, codes::SWAP_AD).is_some() {
            return self.defence_internal(ch, true);
        }
        self.stat_fold(
            ch,
            codes::UPDATE_ATTACK,
            codes::SET_ATTACK,
            codes::SET_ATTACK_FINAL,
            true,
        )
    }

    pub(crate) fn defence_internal(&mut self, ch: CardHandle, swap: bool) -> i32 {
        if let Some(v) = self.card(ch).assumed(Assume::Defence) {
            return v as i32;
        }
        {
            let card = self.card(ch);
            if card.current.location != location::MZONE {
                return card.data.defence;
            }
            if let Some(v) = card.scratch.defence.in_progress() {
                return v as i32;
            }
        }
        if !swap && self.is_affected_by(ch, codes::SWAP_AD).is_some() {
            return self.attack_internal(ch, true);
        }
        self.stat_fold(
            ch,
            codes::UPDATE_DEFENCE,
            codes::SET_DEFENCE,
            codes::SET_DEFENCE_FINAL,
            false,
        )
    }

    /// The shared attack/defence fold.
    ///
    /// Updates accumulate into two buckets (zone-wide singles in `up`,
    /// everything else in `upc`); a set restarts the base and drops the
    /// single bucket; a zone-wide set-final overrides everything so far.
    /// Ranged and projected set-finals are deferred past the whole fold,
    /// the repeatable ones replaying as the base whenever a later
    /// zone-wide update lands on top of them.
    fn stat_fold(
        &mut self,
        ch: CardHandle,
        update_code: u32,
        set_code: u32,
        final_code: u32,
        is_attack: bool,
    ) -> i32 {
        let base0 = if is_attack {
            self.base_attack_internal(ch, false)
        } else {
            self.base_defence_internal(ch, false)
        };
        let mut base = i64::from(base0);
        {
            let scratch = &mut self.card_mut(ch).scratch;
            if is_attack {
                scratch.base_attack = Computing::InProgress(base);
                scratch.attack = Computing::InProgress(base);
            } else {
                scratch.base_defence = Computing::InProgress(base);
                scratch.defence = Computing::InProgress(base);
            }
        }
        let rev = self.is_affected_by(ch, codes::REVERSE_UPDATE).is_some();
        let eset = self.merged_effects(ch, &[update_code, set_code, final_code]);
        let mut up = 0i64;
        let mut upc = 0i64;
        let mut deferred: EffectSet = SmallVec::new();
        let mut repeatable: EffectSet = SmallVec::new();
        for eh in eset {
            let Some(e) = self.effects.get(&eh) else {
                continue;
            };
            let code = e.code;
            let single = e.etype & etype::SINGLE != 0;
            let unranged = single && !e.is_flag(flag::SINGLE_RANGE);
            let repeat = e.is_flag(flag::REPEAT);
            if code == update_code {
                if unranged {
                    for &reh in &repeatable.clone() {
                        base = self.effect_value_on(reh, ch);
                        up = 0;
                        upc = 0;
                        self.set_stat_partial(ch, is_attack, base);
                    }
                    up += self.effect_value_on(eh, ch);
                } else {
                    upc += self.effect_value_on(eh, ch);
                }
            } else if code == set_code {
                base = self.effect_value_on(eh, ch);
                if !single {
                    up = 0;
                }
            } else if unranged {
                base = self.effect_value_on(eh, ch);
                up = 0;
                upc = 0;
            } else {
                deferred.push(eh);
                if repeat {
                    repeatable.push(eh);
                }
            }
            let partial = if rev { base - up - upc } else { base + up + upc };
            self.set_stat_partial(ch, is_attack, partial);
        }
        let mut value: i64 = -1;
        for eh in deferred {
            value = self.effect_value_on(eh, ch);
            self.set_stat_partial(ch, is_attack, value);
        }
        if value == -1 {
            value = if rev { base - up - upc } else { base + up + upc };
        }
        if value < 0 {
            value = 0;
        }
        {
            let scratch = &mut self.card_mut(ch).scratch;
            if is_attack {
                scratch.base_attack = Computing::Idle;
                scratch.attack = Computing::Idle;
            } else {
                scratch.base_defence = Computing::Idle;
                scratch.defence = Computing::Idle;
            }
        }
        value as i32
    }

    fn set_stat_partial(&mut self, ch: CardHandle, is_attack: bool, value: i64) {
        let scratch = &mut self.card_mut(ch).scratch;
        if is_attack {
            scratch.attack = Computing::InProgress(value);
        } else {
            scratch.defence = Computing::InProgress(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::PrintedData;
    use crate::core::consts::{position, status};
    use crate::effects::{Callable, ResolutionContext};

    fn fielded(duel: &mut Duel, data: PrintedData) -> CardHandle {
        let ch = duel.new_card(data, 0);
        let card = duel.card_mut(ch);
        card.current.controller = 0;
        card.current.location = location::MZONE;
        card.current.position = position::FACEUP_ATTACK;
        card.set_status(status::EFFECT_ENABLED, true);
        ch
    }

    fn attach_single(duel: &mut Duel, ch: CardHandle, code: u32, value: i64) {
        let e = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(code)
            .with_value(Callable::Constant(value));
        duel.attach(ch, e, &ResolutionContext::default()).unwrap();
    }

    #[test]
    fn test_updates_accumulate() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 500);
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, -300);
        assert_eq!(duel.attack(ch), 2000);
        assert_eq!(duel.base_attack(ch), 1800);
    }

    #[test]
    fn test_set_restarts_the_base_under_updates() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 500);
        attach_single(&mut duel, ch, codes::SET_ATTACK, 100);
        // The single set replaces the base; the update still applies.
        assert_eq!(duel.attack(ch), 600);
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 400);
        assert_eq!(duel.attack(ch), 1000);
    }

    #[test]
    fn test_final_set_drops_earlier_updates() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 300);
        attach_single(&mut duel, ch, codes::SET_ATTACK_FINAL, 0);
        // Attaching the final evicted the update outright.
        assert_eq!(duel.attack(ch), 0);
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 700);
        assert_eq!(duel.attack(ch), 700);
    }

    #[test]
    fn test_attack_clamps_at_zero() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1000, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, -1500);
        assert_eq!(duel.attack(ch), 0);
    }

    #[test]
    fn test_reverse_update_inverts_deltas() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1000, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 300);
        let rev = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::REVERSE_UPDATE);
        duel.attach(ch, rev, &ResolutionContext::default()).unwrap();
        assert_eq!(duel.attack(ch), 700);
    }

    #[test]
    fn test_swap_exchanges_attack_and_defence() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        let swap = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::SWAP_AD);
        duel.attach(ch, swap, &ResolutionContext::default()).unwrap();
        assert_eq!(duel.attack(ch), 1200);
        assert_eq!(duel.defence(ch), 1800);
    }

    #[test]
    fn test_base_set_feeds_updates() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::SET_BASE_ATTACK, 2500);
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 100);
        assert_eq!(duel.base_attack(ch), 2500);
        assert_eq!(duel.attack(ch), 2600);
    }

    #[test]
    fn test_printed_stats_off_the_field() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 500);
        duel.card_mut(ch).current.location = location::GRAVE;
        assert_eq!(duel.attack(ch), 1800);
    }

    #[test]
    fn test_level_change_drops_single_updates() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_LEVEL, 2);
        attach_single(&mut duel, ch, codes::CHANGE_LEVEL, 8);
        assert_eq!(duel.level(ch), 8);
        attach_single(&mut duel, ch, codes::UPDATE_LEVEL, 1);
        assert_eq!(duel.level(ch), 9);
    }

    #[test]
    fn test_level_floors_at_one_for_monsters() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_LEVEL, -9);
        assert_eq!(duel.level(ch), 1);
    }

    #[test]
    fn test_rank_only_for_xyz() {
        let mut duel = Duel::new();
        let data = PrintedData::monster(1, 4, 1800, 1200);
        let plain = fielded(&mut duel, data);
        assert_eq!(duel.rank(plain), 0);
        let xyz = fielded(
            &mut duel,
            PrintedData::monster(2, 4, 2000, 0).with_type(card_type::MONSTER | card_type::XYZ),
        );
        assert_eq!(duel.rank(xyz), 4);
        assert_eq!(duel.level(xyz), 0);
    }

    #[test]
    fn test_type_add_and_remove() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(
            &mut duel,
            ch,
            codes::ADD_TYPE,
            i64::from(card_type::TUNER),
        );
        assert_ne!(duel.card_type(ch) & card_type::TUNER, 0);
        attach_single(
            &mut duel,
            ch,
            codes::REMOVE_TYPE,
            i64::from(card_type::TUNER),
        );
        assert_eq!(duel.card_type(ch) & card_type::TUNER, 0);
    }

    #[test]
    fn test_code_collapses_to_alias() {
        let mut duel = Duel::new();
        let data = PrintedData::monster(500, 4, 1000, 1000).with_alias(400);
        let ch = fielded(&mut duel, data);
        assert_eq!(duel.code(ch), 400);
        attach_single(&mut duel, ch, codes::CHANGE_CODE, 777);
        assert_eq!(duel.code(ch), 777);
    }

    #[test]
    fn test_superseded_code_change_is_never_evaluated() {
        fn traced_code(
            duel: &mut Duel,
            _eh: crate::core::ids::EffectHandle,
            _params: &crate::effects::Params,
        ) -> i64 {
            duel.info.turn_id += 1;
            666
        }
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(500, 4, 1000, 1000));
        let old = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::CHANGE_CODE)
            .with_value(Callable::Native(traced_code));
        duel.attach(ch, old, &ResolutionContext::default()).unwrap();
        attach_single(&mut duel, ch, codes::CHANGE_CODE, 777);
        assert_eq!(duel.code(ch), 777);
        assert_eq!(duel.info.turn_id, 0);
    }

    #[test]
    fn test_another_code_from_add_code() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(500, 4, 1000, 1000));
        assert_eq!(duel.another_code(ch), 0);
        attach_single(&mut duel, ch, codes::ADD_CODE, 888);
        assert_eq!(duel.another_code(ch), 888);
    }

    #[test]
    fn test_assume_short_circuits() {
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        attach_single(&mut duel, ch, codes::UPDATE_ATTACK, 500);
        duel.card_mut(ch).set_assume(Assume::Attack, 100);
        assert_eq!(duel.attack(ch), 100);
        duel.card_mut(ch).clear_assume();
        assert_eq!(duel.attack(ch), 2300);
    }

    #[test]
    fn test_reentrant_value_sees_partial() {
        fn partial_plus_100(
            duel: &mut Duel,
            eh: crate::core::ids::EffectHandle,
            _params: &crate::effects::Params,
        ) -> i64 {
            let ch = duel.effect(eh).unwrap().handler;
            i64::from(duel.attack(ch)) + 100
        }
        let mut duel = Duel::new();
        let ch = fielded(&mut duel, PrintedData::monster(1, 4, 1800, 1200));
        let e = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(codes::UPDATE_ATTACK)
            .with_value(Callable::Native(partial_plus_100));
        duel.attach(ch, e, &ResolutionContext::default()).unwrap();
        // The nested read observes the fold-so-far (the base), not a
        // recursive full fold.
        assert_eq!(duel.attack(ch), 3700);
    }

    #[test]
    fn test_scales_update_in_pendulum_zone() {
        let mut duel = Duel::new();
        let data = PrintedData::monster(1, 4, 1000, 1000).with_scales(4, 7);
        let ch = duel.new_card(data, 0);
        {
            let card = duel.card_mut(ch);
            card.current.controller = 0;
            card.current.location = location::SZONE;
            card.current.sequence = 6;
            card.current.position = position::FACEUP_ATTACK;
            card.set_status(status::EFFECT_ENABLED, true);
        }
        assert_eq!(duel.lscale(ch), 4);
        attach_single(&mut duel, ch, codes::UPDATE_LSCALE, 2);
        assert_eq!(duel.lscale(ch), 6);
        attach_single(&mut duel, ch, codes::CHANGE_RSCALE, 1);
        assert_eq!(duel.rscale(ch), 1);
    }
}
