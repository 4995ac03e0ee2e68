//! # duelcore
//!
//! The rules core of a trading-card-game duel simulator: the authoritative
//! card arena, per-card modifier registry, link and counter bookkeeping,
//! layered attribute resolution, event-driven resets, and the delta-encoded
//! query wire format.
//!
//! ## Design Principles
//!
//! 1. **Arena + Handles**: the [`Duel`](duel::Duel) owns every card and
//!    modifier; all relations (equip, overlay, targeting) are stored as
//!    integer handles, never as owning references.
//!
//! 2. **Layered Resolution**: effective attributes are never stored; they
//!    are recomputed on demand by folding the attached and field-wide
//!    modifiers in attach order over the printed base.
//!
//! 3. **Scripts Behind a Seam**: modifier predicates and values are
//!    [`Callable`](effects::Callable)s evaluated through the
//!    [`ScriptHost`](effects::ScriptHost) trait; the evaluator itself lives
//!    outside this crate.
//!
//! ## Modules
//!
//! - `core`: handles, bitmask constants, outbound messages
//! - `cards`: printed data, mutable card state, the card object
//! - `effects`: the modifier object, semantic codes, callables
//! - `duel`: the arena plus registry, links, attribute, reset, and query
//!   engines

pub mod cards;
pub mod core;
pub mod duel;
pub mod effects;

// Re-export commonly used types
pub use crate::core::{CardHandle, EffectHandle, FieldPlace, HintKind, Message, PLAYER_NONE};

pub use crate::cards::{Card, CardReader, CardState, ComputeScratch, Computing, PrintedData};

pub use crate::effects::{
    Callable, Effect, Param, ResolutionContext, ScriptHost, ScriptRef,
};

pub use crate::duel::{Duel, DuelInfo, QueryMode, ResetKind};
