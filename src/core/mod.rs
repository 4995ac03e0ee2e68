//! Core building blocks: handles, bitmask constants, outbound messages.
//!
//! Everything here is value-level and duel-agnostic; the stateful arena
//! lives in [`crate::duel`].

pub mod consts;
pub mod ids;
pub mod message;

pub use ids::{CardHandle, EffectHandle, PLAYER_NONE};
pub use message::{FieldPlace, HintKind, Message};
