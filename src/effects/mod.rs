//! Modifier system: the effect object, semantic codes, and callables.
//!
//! A modifier ("effect") is a passive rule fragment attached to a card.
//! Its `code` names what it does, its type picks which container it
//! lives in, and its reset flags decide when it dies. Chain-activated
//! actions share the same object but are opaque to this crate; only
//! passive resolution happens here.

pub mod callable;
pub mod codes;
pub mod effect;

pub use callable::{Callable, NativeFn, Param, Params, ResolutionContext, ScriptHost, ScriptRef};
pub use effect::{estatus, etype, flag, reset, Effect, ResetKind};
