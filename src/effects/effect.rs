//! The modifier object and its lifecycle state machine.

use crate::core::ids::{CardHandle, EffectHandle, PLAYER_NONE};
use crate::effects::callable::Callable;
use crate::effects::codes;

/// Modifier type bits. `SINGLE`/`FIELD`/`EQUIP` pick the container;
/// the action bits mark chain-activated effects, which never take part
/// in passive resolution.
pub mod etype {
    pub const SINGLE: u32 = 0x1;
    pub const FIELD: u32 = 0x2;
    pub const EQUIP: u32 = 0x4;
    pub const ACTIVATE: u32 = 0x10;
    pub const FLIP: u32 = 0x20;
    pub const IGNITION: u32 = 0x40;
    pub const TRIGGER_O: u32 = 0x80;
    pub const QUICK_O: u32 = 0x100;
    pub const TRIGGER_F: u32 = 0x200;
    pub const QUICK_F: u32 = 0x400;
    pub const CONTINUOUS: u32 = 0x800;
    /// Any chain-activated action.
    pub const ACTIONS: u32 = 0x7f0;
}

/// Modifier behavior flags.
pub mod flag {
    /// Attached while the handler was initializing its printed effects.
    pub const INITIAL: u32 = 0x1;
    /// Carries a use-count budget recharged on turn boundaries.
    pub const COUNT_LIMIT: u32 = 0x2;
    /// Field effect with no handler card requirements.
    pub const FIELD_ONLY: u32 = 0x4;
    /// Field effect that targets regardless of zone range.
    pub const IGNORE_RANGE: u32 = 0x8;
    /// Ranges name absolute players, not handler-relative sides.
    pub const ABSOLUTE_TARGET: u32 = 0x10;
    /// Pierces immunity.
    pub const IGNORE_IMMUNE: u32 = 0x20;
    /// Applies even to facedown cards.
    pub const SET_AVAILABLE: u32 = 0x40;
    /// Survives the handler being disabled.
    pub const CANNOT_DISABLE: u32 = 0x80;
    /// Targets a player rather than cards.
    pub const PLAYER_TARGET: u32 = 0x100;
    /// Inherits the copy generation of the effect that registered it.
    pub const COPY_INHERIT: u32 = 0x200;
    /// Single effect active only in the given zone range.
    pub const SINGLE_RANGE: u32 = 0x400;
    /// Never picked up by effect copying.
    pub const UNCOPYABLE: u32 = 0x800;
    /// Oath effect bound to the activation that created it.
    pub const OATH: u32 = 0x1000;
    /// Set-final modifier reapplied on every later fold step.
    pub const REPEAT: u32 = 0x2000;
    /// Announce attach/detach to the client.
    pub const CLIENT_HINT: u32 = 0x4000;
    /// Dies with the owner's targeting relation.
    pub const OWNER_RELATE: u32 = 0x8000;
    /// Stays live on a battle-destroyed handler.
    pub const AVAILABLE_BD: u32 = 0x10000;
}

/// Reset cause bits. The low byte scopes phase resets to specific
/// phases; the upper half names event causes.
pub mod reset {
    pub const PHASE_DRAW: u32 = 0x01;
    pub const PHASE_STANDBY: u32 = 0x02;
    pub const PHASE_MAIN1: u32 = 0x04;
    pub const PHASE_BATTLE: u32 = 0x08;
    pub const PHASE_DAMAGE: u32 = 0x10;
    pub const PHASE_DAMAGE_CAL: u32 = 0x20;
    pub const PHASE_MAIN2: u32 = 0x40;
    pub const PHASE_END: u32 = 0x80;

    pub const EVENT: u32 = 0x1000;
    pub const CARD: u32 = 0x2000;
    pub const CODE: u32 = 0x4000;
    pub const COPY: u32 = 0x8000;

    pub const DISABLE: u32 = 0x10000;
    pub const TURN_SET: u32 = 0x20000;
    pub const TO_GRAVE: u32 = 0x40000;
    pub const REMOVE: u32 = 0x80000;
    pub const TEMP_REMOVE: u32 = 0x100000;
    pub const TO_HAND: u32 = 0x200000;
    pub const TO_DECK: u32 = 0x400000;
    pub const LEAVE: u32 = 0x800000;
    pub const TO_FIELD: u32 = 0x1000000;
    pub const CONTROL: u32 = 0x2000000;
    pub const OVERLAY: u32 = 0x4000000;
    pub const MSCHANGE: u32 = 0x8000000;

    pub const SELF_TURN: u32 = 0x10000000;
    pub const OPPO_TURN: u32 = 0x20000000;
    pub const PHASE: u32 = 0x40000000;
    pub const CHAIN: u32 = 0x80000000;
}

/// Runtime status bits on a modifier.
pub mod estatus {
    /// Condition held the last time availability was checked.
    pub const AVAILABLE: u32 = 0x1;
}

/// Which family of reset is being delivered to [`Effect::should_reset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetKind {
    /// A lifecycle event happened to the handler; cause carries
    /// `reset::*` event bits.
    Event,
    /// A phase boundary passed; cause carries phase bits.
    Phase,
    /// Strip single effects with this exact code.
    Code,
    /// Strip one copy generation; cause is the copy id.
    Copy,
    /// Strip everything a given printed card owns; cause is its code.
    CardCode,
}

/// A modifier. Owned by the duel arena and addressed by handle; the
/// containers on cards hold handles only.
#[derive(Clone, Debug)]
pub struct Effect {
    pub handle: EffectHandle,
    /// The card whose text this modifier is.
    pub owner: CardHandle,
    /// The card it is attached to. Equal to `owner` until attached
    /// elsewhere (copied or granted effects).
    pub handler: CardHandle,
    /// Player owning a handler-less field effect.
    pub effect_owner: u8,
    pub etype: u32,
    pub code: u32,
    pub flag: u32,
    /// Application order stamp. Fold order and last-writer-wins
    /// resolution both follow it.
    pub id: u32,
    pub copy_id: u32,
    /// Zone mask the handler must sit in for ranged effects.
    pub range: u32,
    /// Zone mask for targets on the handler's side.
    pub s_range: u32,
    /// Zone mask for targets on the opposing side.
    pub o_range: u32,
    pub reset_flag: u32,
    /// Remaining phase boundaries before a phase-scoped reset fires.
    pub reset_count: u8,
    /// Remaining uses this recharge window.
    pub count_limit: u8,
    pub count_limit_max: u8,
    pub status: u32,
    /// Type mask of the handler's print, stamped at attach.
    pub card_type: u32,
    /// Client-facing description id for hint messages.
    pub description: u32,
    pub label: i64,
    pub condition: Callable,
    pub cost: Callable,
    pub target: Callable,
    pub value: Callable,
}

impl Effect {
    #[must_use]
    pub fn new(handle: EffectHandle, owner: CardHandle) -> Self {
        Self {
            handle,
            owner,
            handler: owner,
            effect_owner: PLAYER_NONE,
            etype: 0,
            code: 0,
            flag: 0,
            id: 0,
            copy_id: 0,
            range: 0,
            s_range: 0,
            o_range: 0,
            reset_flag: 0,
            reset_count: 0,
            count_limit: 0,
            count_limit_max: 0,
            status: 0,
            card_type: 0,
            description: 0,
            label: 0,
            condition: Callable::None,
            cost: Callable::None,
            target: Callable::None,
            value: Callable::None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, etype: u32) -> Self {
        self.etype = etype;
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_flag(mut self, flag: u32) -> Self {
        self.flag = flag;
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: u32) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn with_target_range(mut self, s_range: u32, o_range: u32) -> Self {
        self.s_range = s_range;
        self.o_range = o_range;
        self
    }

    #[must_use]
    pub fn with_reset(mut self, reset_flag: u32, reset_count: u8) -> Self {
        self.reset_flag = reset_flag;
        self.reset_count = reset_count;
        self
    }

    #[must_use]
    pub fn with_count_limit(mut self, count: u8) -> Self {
        self.flag |= flag::COUNT_LIMIT;
        self.count_limit = count;
        self.count_limit_max = count;
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Callable) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Callable) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: Callable) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: Callable) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: u32) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn is_flag(&self, bits: u32) -> bool {
        self.flag & bits != 0
    }

    /// Whether attaching or detaching this modifier requires the disable
    /// status of affected cards to be rechecked.
    #[must_use]
    pub fn is_disable_related(&self) -> bool {
        self.code == codes::IMMUNE_EFFECT
            || self.code == codes::DISABLE
            || self.code == codes::CANNOT_DISABLE
    }

    /// Whether the handler's zone satisfies this modifier's range.
    #[must_use]
    pub fn in_range(&self, location: u32) -> bool {
        self.range & location != 0
    }

    /// Restore the use budget at a recharge boundary.
    pub fn recharge(&mut self) {
        if self.is_flag(flag::COUNT_LIMIT) {
            self.count_limit = self.count_limit_max;
        }
    }

    /// Spend one use of a count-limited modifier.
    pub fn dec_count(&mut self) {
        if !self.is_flag(flag::COUNT_LIMIT) {
            return;
        }
        self.count_limit = self.count_limit.saturating_sub(1);
    }

    /// Decide whether a reset destroys this modifier.
    ///
    /// Phase resets count down in place: the modifier dies on the phase
    /// boundary that brings its countdown to zero, scoped to the turns
    /// its reset flags name.
    pub fn should_reset(
        &mut self,
        cause: u32,
        kind: ResetKind,
        owner_code: u32,
        handler_player: u8,
        turn_player: u8,
    ) -> bool {
        match kind {
            ResetKind::Event => {
                if self.reset_flag & reset::EVENT == 0 {
                    return false;
                }
                let mut cause = cause;
                // Granted effects outlive the handler being disabled.
                if self.owner != self.handler {
                    cause &= !reset::DISABLE;
                }
                cause & 0xffff_0000 & self.reset_flag != 0
            }
            ResetKind::CardCode => owner_code == cause,
            ResetKind::Phase => {
                if self.reset_flag & reset::PHASE == 0 {
                    return false;
                }
                let own_turn =
                    self.reset_flag & reset::SELF_TURN != 0 && handler_player == turn_player;
                let oppo_turn =
                    self.reset_flag & reset::OPPO_TURN != 0 && handler_player != turn_player;
                if (own_turn || oppo_turn) && (cause & 0xff & self.reset_flag != 0) {
                    self.reset_count = self.reset_count.saturating_sub(1);
                }
                self.reset_count == 0
            }
            ResetKind::Code => {
                self.code == cause
                    && self.etype & etype::SINGLE != 0
                    && self.etype & etype::ACTIONS == 0
            }
            ResetKind::Copy => self.copy_id == cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_attack() -> Effect {
        Effect::new(EffectHandle(0), CardHandle(0))
            .with_type(etype::SINGLE)
            .with_code(codes::UPDATE_ATTACK)
            .with_value(Callable::Constant(500))
    }

    #[test]
    fn test_disable_related_codes() {
        let mut e = update_attack();
        assert!(!e.is_disable_related());
        e.code = codes::DISABLE;
        assert!(e.is_disable_related());
        e.code = codes::IMMUNE_EFFECT;
        assert!(e.is_disable_related());
        e.code = codes::CANNOT_DISABLE;
        assert!(e.is_disable_related());
    }

    #[test]
    fn test_event_reset_needs_matching_cause() {
        let mut e = update_attack().with_reset(reset::EVENT | reset::TO_GRAVE | reset::LEAVE, 0);
        assert!(e.should_reset(reset::TO_GRAVE, ResetKind::Event, 0, 0, 0));
        assert!(!e.should_reset(reset::TO_HAND, ResetKind::Event, 0, 0, 0));
    }

    #[test]
    fn test_granted_effect_ignores_disable_event() {
        let mut e = update_attack().with_reset(reset::EVENT | reset::DISABLE, 0);
        e.handler = CardHandle(7);
        assert!(!e.should_reset(reset::DISABLE, ResetKind::Event, 0, 0, 0));
        e.handler = e.owner;
        assert!(e.should_reset(reset::DISABLE, ResetKind::Event, 0, 0, 0));
    }

    #[test]
    fn test_phase_reset_counts_down_in_scope() {
        let mut e = update_attack().with_reset(
            reset::EVENT | reset::PHASE | reset::SELF_TURN | reset::PHASE_END,
            2,
        );
        // Opponent's end phase: out of scope, no countdown.
        assert!(!e.should_reset(reset::PHASE_END, ResetKind::Phase, 0, 0, 1));
        assert_eq!(e.reset_count, 2);
        // Own end phase twice.
        assert!(!e.should_reset(reset::PHASE_END, ResetKind::Phase, 0, 0, 0));
        assert!(e.should_reset(reset::PHASE_END, ResetKind::Phase, 0, 0, 0));
    }

    #[test]
    fn test_code_reset_only_hits_passive_singles() {
        let mut e = update_attack();
        assert!(e.should_reset(codes::UPDATE_ATTACK, ResetKind::Code, 0, 0, 0));
        e.etype = etype::SINGLE | etype::IGNITION;
        assert!(!e.should_reset(codes::UPDATE_ATTACK, ResetKind::Code, 0, 0, 0));
        e.etype = etype::FIELD;
        assert!(!e.should_reset(codes::UPDATE_ATTACK, ResetKind::Code, 0, 0, 0));
    }

    #[test]
    fn test_copy_reset_matches_generation() {
        let mut e = update_attack();
        e.copy_id = 3;
        assert!(e.should_reset(3, ResetKind::Copy, 0, 0, 0));
        assert!(!e.should_reset(2, ResetKind::Copy, 0, 0, 0));
    }

    #[test]
    fn test_recharge_restores_budget() {
        let mut e = update_attack().with_count_limit(1);
        e.dec_count();
        assert_eq!(e.count_limit, 0);
        e.recharge();
        assert_eq!(e.count_limit, 1);
    }
}
