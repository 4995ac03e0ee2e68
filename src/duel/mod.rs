//! The duel arena and its resolution engines.
//!
//! [`Duel`] owns every card and modifier in a duel and exposes the
//! passive rules surface: the modifier registry ([`registry`]), link and
//! counter bookkeeping ([`links`]), layered attribute resolution
//! ([`attrs`]), event-driven resets ([`reset`]), and the client query
//! serializer ([`query`]). The embedding scheduler drives moves, phases,
//! and chains; this crate answers what every card currently is.

pub mod attrs;
pub mod links;
pub mod query;
pub mod registry;
pub mod reset;

use std::cmp::Ordering;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::cards::card::EffectSlot;
use crate::cards::{Card, CardReader, ContainerKind, PrintedData};
use crate::core::consts::location;
use crate::core::ids::{CardHandle, EffectHandle, PLAYER_NONE};
use crate::core::message::{FieldPlace, Message};
use crate::effects::{flag, Effect, Param, Params, ScriptHost};

pub use crate::effects::ResetKind;
pub use query::{query_flag, QueryMode};

/// Filtered, id-sorted modifier set.
pub type EffectSet = SmallVec<[EffectHandle; 8]>;

/// Duel-wide counters and wells.
#[derive(Clone, Copy, Debug, Default)]
pub struct DuelInfo {
    pub turn_player: u8,
    pub turn_id: u32,
    /// Application-order well; every attach and re-availability stamps
    /// the next value.
    pub field_id: u32,
    /// Copy-generation well.
    pub copy_id: u32,
}

/// Reset metadata applied to effects registered inside a copy bracket.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct CopyScope {
    pub reset_flag: u32,
    pub reset_count: u8,
}

/// The arena. All cross-object references are handles into it.
pub struct Duel {
    pub(crate) cards: Vec<Card>,
    pub(crate) effects: FxHashMap<EffectHandle, Effect>,
    /// Where every attached modifier lives. Membership doubles as the
    /// duplicate-attach rejection test.
    pub(crate) indexer: FxHashMap<EffectHandle, (CardHandle, ContainerKind)>,
    /// Field-wide modifier pool, keyed by code. Card folds consult this
    /// after their own containers.
    pub(crate) aura: FxHashMap<u32, EffectSlot>,
    /// Oath effects mapped to the activation effect that created them.
    pub(crate) oath: FxHashMap<EffectHandle, Option<EffectHandle>>,
    pub(crate) phase_scoped: FxHashSet<EffectHandle>,
    pub(crate) chain_scoped: FxHashSet<EffectHandle>,
    pub(crate) rechargeable: FxHashSet<EffectHandle>,
    disable_check_list: Vec<CardHandle>,
    disable_check_set: FxHashSet<CardHandle>,
    /// One-per-side uniqueness registrations.
    pub(crate) unique_cards: [FxHashSet<CardHandle>; 2],
    pub(crate) messages: Vec<Message>,
    pub info: DuelInfo,
    /// Count of live brainwashing-removal field effects.
    pub(crate) remove_brainwashing: u32,
    pub(crate) copy_scope: Option<CopyScope>,
    script_host: Option<Rc<dyn ScriptHost>>,
    reader: Option<Rc<dyn CardReader>>,
    next_effect: u32,
}

impl Duel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            effects: FxHashMap::default(),
            indexer: FxHashMap::default(),
            aura: FxHashMap::default(),
            oath: FxHashMap::default(),
            phase_scoped: FxHashSet::default(),
            chain_scoped: FxHashSet::default(),
            rechargeable: FxHashSet::default(),
            disable_check_list: Vec::new(),
            disable_check_set: FxHashSet::default(),
            unique_cards: [FxHashSet::default(), FxHashSet::default()],
            messages: Vec::new(),
            // Copy generation 0 is "never copied"; the well starts past it.
            info: DuelInfo {
                copy_id: 1,
                ..DuelInfo::default()
            },
            remove_brainwashing: 0,
            copy_scope: None,
            script_host: None,
            reader: None,
            next_effect: 0,
        }
    }

    #[must_use]
    pub fn with_script_host(mut self, host: Rc<dyn ScriptHost>) -> Self {
        self.script_host = Some(host);
        self
    }

    #[must_use]
    pub fn with_reader(mut self, reader: Rc<dyn CardReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    // -- arena access ------------------------------------------------------

    /// Bring a new card into the duel.
    pub fn new_card(&mut self, data: PrintedData, owner: u8) -> CardHandle {
        let handle = CardHandle(self.cards.len() as u32);
        self.cards.push(Card::new(handle, data, owner));
        handle
    }

    /// Mint a modifier for configuration. It joins the arena when
    /// attached; an unattached modifier is just a value.
    #[must_use]
    pub fn alloc_effect(&mut self, owner: CardHandle) -> Effect {
        let handle = EffectHandle(self.next_effect);
        self.next_effect += 1;
        Effect::new(handle, owner)
    }

    #[must_use]
    pub fn card(&self, h: CardHandle) -> &Card {
        &self.cards[h.raw() as usize]
    }

    pub fn card_mut(&mut self, h: CardHandle) -> &mut Card {
        &mut self.cards[h.raw() as usize]
    }

    #[must_use]
    pub fn effect(&self, h: EffectHandle) -> Option<&Effect> {
        self.effects.get(&h)
    }

    pub fn effect_mut(&mut self, h: EffectHandle) -> Option<&mut Effect> {
        self.effects.get_mut(&h)
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub(crate) fn printed(&self, code: u32) -> Option<PrintedData> {
        self.reader.as_ref().and_then(|r| r.printed(code))
    }

    // -- messages ----------------------------------------------------------

    pub(crate) fn emit(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// Drain the outbound event buffer in emission order.
    pub fn drain_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// A card's place as clients see it. Overlay material reports its
    /// host's zone with the overlay bit, and its stack index.
    #[must_use]
    pub fn field_place(&self, h: CardHandle) -> FieldPlace {
        let card = self.card(h);
        if let Some(host) = card.overlay_target {
            let host = self.card(host);
            FieldPlace {
                controller: host.current.controller,
                location: host.current.location | location::OVERLAY,
                sequence: host.current.sequence,
                position: card.current.sequence,
            }
        } else {
            FieldPlace {
                controller: card.current.controller,
                location: card.current.location,
                sequence: card.current.sequence,
                position: card.current.position,
            }
        }
    }

    // -- disable recheck queue ---------------------------------------------

    /// Queue a card for a disable-status recheck. The scheduler drains
    /// the queue after the current mutation settles.
    pub fn add_to_disable_check_list(&mut self, h: CardHandle) {
        if self.disable_check_set.insert(h) {
            self.disable_check_list.push(h);
        }
    }

    pub fn drain_disable_checks(&mut self) -> Vec<CardHandle> {
        self.disable_check_set.clear();
        std::mem::take(&mut self.disable_check_list)
    }

    // -- callable evaluation -----------------------------------------------

    pub(crate) fn call(&mut self, eh: EffectHandle, which: Which, params: &Params) -> i64 {
        let callable = match self.effects.get(&eh) {
            Some(e) => match which {
                Which::Condition => e.condition.clone(),
                Which::Cost => e.cost.clone(),
                Which::Target => e.target.clone(),
                Which::Value => e.value.clone(),
            },
            None => return 0,
        };
        match callable {
            crate::effects::Callable::None => 0,
            crate::effects::Callable::Constant(v) => v,
            crate::effects::Callable::Native(f) => f(self, eh, params),
            crate::effects::Callable::Script(r) => match self.script_host.clone() {
                Some(host) => host.call(self, r, eh, params),
                None => 0,
            },
        }
    }

    /// Evaluate a modifier's value with no subject.
    pub fn effect_value_raw(&mut self, eh: EffectHandle) -> i64 {
        let params: Params = SmallVec::from_slice(&[Param::Effect(eh)]);
        self.call(eh, Which::Value, &params)
    }

    /// Evaluate a modifier's value against a subject card.
    pub fn effect_value_on(&mut self, eh: EffectHandle, subject: CardHandle) -> i64 {
        let params: Params = SmallVec::from_slice(&[Param::Card(subject), Param::Effect(eh)]);
        self.call(eh, Which::Value, &params)
    }

    /// Evaluate a modifier's value against another modifier (immunity
    /// predicates judge the incoming effect).
    pub fn effect_value_vs(&mut self, eh: EffectHandle, other: EffectHandle) -> i64 {
        let params: Params = SmallVec::from_slice(&[Param::Effect(other), Param::Effect(eh)]);
        self.call(eh, Which::Value, &params)
    }

    /// Check a modifier's condition. Absent conditions hold.
    pub fn effect_condition(&mut self, eh: EffectHandle) -> bool {
        match self.effects.get(&eh) {
            Some(e) if matches!(e.condition, crate::effects::Callable::None) => true,
            Some(_) => {
                let params: Params = SmallVec::from_slice(&[Param::Effect(eh)]);
                self.call(eh, Which::Condition, &params) != 0
            }
            None => false,
        }
    }

    /// Check whether a modifier's cost can be paid. Absent costs can.
    pub fn effect_cost_check(&mut self, eh: EffectHandle) -> bool {
        match self.effects.get(&eh) {
            Some(e) if matches!(e.cost, crate::effects::Callable::None) => true,
            Some(_) => {
                let params: Params = SmallVec::from_slice(&[Param::Effect(eh)]);
                self.call(eh, Which::Cost, &params) != 0
            }
            None => false,
        }
    }

    /// Check a modifier's target filter against a card. Absent filters
    /// accept everything.
    pub fn effect_target_check(&mut self, eh: EffectHandle, subject: CardHandle) -> bool {
        match self.effects.get(&eh) {
            Some(e) if matches!(e.target, crate::effects::Callable::None) => true,
            Some(_) => {
                let params: Params =
                    SmallVec::from_slice(&[Param::Effect(eh), Param::Card(subject)]);
                self.call(eh, Which::Target, &params) != 0
            }
            None => false,
        }
    }

    /// The player responsible for a modifier: its declared owner for
    /// handler-less field effects, otherwise whoever controls the
    /// handler.
    #[must_use]
    pub fn handler_player(&self, eh: EffectHandle) -> u8 {
        match self.effects.get(&eh) {
            Some(e) if e.is_flag(flag::FIELD_ONLY) => e.effect_owner,
            Some(e) => self.card(e.handler).current.controller,
            None => PLAYER_NONE,
        }
    }

    // -- ordering ----------------------------------------------------------

    /// Deterministic processing order for bulk card operations: turn
    /// player's cards first, unowned cards last, then by zone, then by
    /// slot (stack-like zones count from the top).
    #[must_use]
    pub fn operation_order(&self, a: CardHandle, b: CardHandle) -> Ordering {
        let ca = self.card(a);
        let cb = self.card(b);
        let cp1 = ca
            .overlay_target
            .map_or(ca.current.controller, |h| self.card(h).current.controller);
        let cp2 = cb
            .overlay_target
            .map_or(cb.current.controller, |h| self.card(h).current.controller);
        if cp1 != cp2 {
            if cp1 == PLAYER_NONE || cp2 == PLAYER_NONE {
                return cp1.cmp(&cp2);
            }
            return if self.info.turn_player == 0 {
                cp1.cmp(&cp2)
            } else {
                cp2.cmp(&cp1)
            };
        }
        if ca.current.location != cb.current.location {
            return ca.current.location.cmp(&cb.current.location);
        }
        if ca.current.location & location::OVERLAY != 0 {
            let sa = ca.overlay_target.map_or(0, |h| self.card(h).current.sequence);
            let sb = cb.overlay_target.map_or(0, |h| self.card(h).current.sequence);
            return sa.cmp(&sb).then(ca.current.sequence.cmp(&cb.current.sequence));
        }
        // Deck, grave, removed, and extra count from the top.
        const TOP_COUNTED: u32 =
            location::DECK | location::GRAVE | location::REMOVED | location::EXTRA;
        if ca.current.location & TOP_COUNTED != 0 {
            cb.current.sequence.cmp(&ca.current.sequence)
        } else {
            ca.current.sequence.cmp(&cb.current.sequence)
        }
    }

    /// Sort handles into operation order.
    pub fn sort_for_operation(&self, cards: &mut [CardHandle]) {
        cards.sort_by(|&a, &b| self.operation_order(a, b));
    }

    /// Sort a filtered modifier set into application-id order.
    pub(crate) fn sort_by_id(&self, set: &mut EffectSet) {
        set.sort_by_key(|h| self.effects.get(h).map_or(u32::MAX, |e| e.id));
    }
}

impl Default for Duel {
    fn default() -> Self {
        Self::new()
    }
}

/// Which callable on a modifier to invoke.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Which {
    Condition,
    Cost,
    Target,
    Value,
}
