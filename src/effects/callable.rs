//! Callable predicates and values on modifiers.
//!
//! The rules core never interprets scripts itself. A modifier's
//! condition, target filter, and value are [`Callable`]s: either inline
//! constants, native Rust functions, or references into a script engine
//! reached through the [`ScriptHost`] seam.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::ids::{CardHandle, EffectHandle};
use crate::duel::Duel;

/// Opaque reference to a function inside the embedding script engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptRef(pub u32);

/// One argument passed to a callable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    Card(CardHandle),
    Effect(EffectHandle),
    Player(u8),
    Int(i64),
}

/// Argument stack for one invocation.
pub type Params = SmallVec<[Param; 4]>;

/// A native callable. Receives the duel, the modifier being evaluated,
/// and the argument stack; re-entrant attribute reads are allowed.
pub type NativeFn = fn(&mut Duel, EffectHandle, &Params) -> i64;

/// A condition, target filter, or value attached to a modifier.
#[derive(Clone, Debug, Default)]
pub enum Callable {
    /// Absent. Conditions and target filters treat this as "always
    /// holds"; values evaluate to zero.
    #[default]
    None,
    Constant(i64),
    Native(NativeFn),
    Script(ScriptRef),
}

impl Callable {
    /// Whether evaluation can observe or mutate duel state.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Callable::Native(_) | Callable::Script(_))
    }

    /// The inline constant, if this callable is one.
    #[must_use]
    pub fn constant(&self) -> Option<i64> {
        match self {
            Callable::Constant(v) => Some(*v),
            _ => None,
        }
    }
}

/// Evaluator for [`Callable::Script`] references. Implemented by the
/// embedding engine; invocations may re-enter the duel.
pub trait ScriptHost {
    fn call(&self, duel: &mut Duel, script: ScriptRef, effect: EffectHandle, params: &Params)
        -> i64;
}

/// Why an attach or copy is happening. Threaded explicitly through the
/// registry entry points instead of living in duel-global scratch.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolutionContext {
    /// The effect whose resolution caused this mutation, if any.
    pub reason_effect: Option<EffectHandle>,
    /// The player responsible for the mutation.
    pub reason_player: u8,
}

impl ResolutionContext {
    #[must_use]
    pub fn from_effect(effect: EffectHandle, player: u8) -> Self {
        Self {
            reason_effect: Some(effect),
            reason_player: player,
        }
    }
}
