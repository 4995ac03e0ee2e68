//! Card system: printed data, state snapshots, and the card object.
//!
//! ## Key Types
//!
//! - `PrintedData`: Immutable printed face of a card
//! - `CardReader`: Lookup seam into an external card database
//! - `CardState`: Where a card is and why it got there
//! - `ComputeScratch`: Re-entrancy slots for attribute folds
//! - `Card`: The instance living in the duel arena

pub mod card;
pub mod printed;
pub mod state;

pub use card::{Card, ContainerKind, EffectSlot};
pub use printed::{CardReader, PrintedData};
pub use state::{Assume, CardState, ComputeScratch, Computing, QueryCache};
