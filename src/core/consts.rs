//! Bitmask constants shared by the whole rules core.
//!
//! These masks are part of the client wire contract (the query serializer
//! writes several of them verbatim), so their values are fixed and must not
//! be renumbered.

/// Zone/location masks. A card's `current.location` holds exactly one of
/// these, except `ONFIELD` which is a query convenience (mzone | szone).
pub mod location {
    pub const DECK: u32 = 0x01;
    pub const HAND: u32 = 0x02;
    pub const MZONE: u32 = 0x04;
    pub const SZONE: u32 = 0x08;
    pub const GRAVE: u32 = 0x10;
    pub const REMOVED: u32 = 0x20;
    pub const EXTRA: u32 = 0x40;
    /// Pseudo-zone for cards stacked under another card as material.
    pub const OVERLAY: u32 = 0x80;
    pub const ONFIELD: u32 = 0x0c;
}

/// Battle/face position masks.
pub mod position {
    pub const FACEUP_ATTACK: u32 = 0x1;
    pub const FACEDOWN_ATTACK: u32 = 0x2;
    pub const FACEUP_DEFENCE: u32 = 0x4;
    pub const FACEDOWN_DEFENCE: u32 = 0x8;
    pub const FACEUP: u32 = 0x5;
    pub const FACEDOWN: u32 = 0xa;
    pub const ATTACK: u32 = 0x3;
    pub const DEFENCE: u32 = 0xc;
}

/// Printed card type masks.
pub mod card_type {
    pub const MONSTER: u32 = 0x1;
    pub const SPELL: u32 = 0x2;
    pub const TRAP: u32 = 0x4;
    pub const NORMAL: u32 = 0x10;
    pub const EFFECT: u32 = 0x20;
    pub const FUSION: u32 = 0x40;
    pub const RITUAL: u32 = 0x80;
    pub const TRAPMONSTER: u32 = 0x100;
    pub const SPIRIT: u32 = 0x200;
    pub const UNION: u32 = 0x400;
    pub const DUAL: u32 = 0x800;
    pub const TUNER: u32 = 0x1000;
    pub const SYNCHRO: u32 = 0x2000;
    pub const TOKEN: u32 = 0x4000;
    pub const QUICKPLAY: u32 = 0x10000;
    pub const CONTINUOUS: u32 = 0x20000;
    pub const EQUIP: u32 = 0x40000;
    pub const FIELD: u32 = 0x80000;
    pub const COUNTER: u32 = 0x100000;
    pub const FLIP: u32 = 0x200000;
    pub const TOON: u32 = 0x400000;
    pub const XYZ: u32 = 0x800000;
    pub const PENDULUM: u32 = 0x1000000;
}

/// Monster attribute masks.
pub mod attribute {
    pub const EARTH: u32 = 0x01;
    pub const WATER: u32 = 0x02;
    pub const FIRE: u32 = 0x04;
    pub const WIND: u32 = 0x08;
    pub const LIGHT: u32 = 0x10;
    pub const DARK: u32 = 0x20;
    pub const DIVINE: u32 = 0x40;
}

/// Monster race masks.
pub mod race {
    pub const WARRIOR: u32 = 0x1;
    pub const SPELLCASTER: u32 = 0x2;
    pub const FAIRY: u32 = 0x4;
    pub const FIEND: u32 = 0x8;
    pub const ZOMBIE: u32 = 0x10;
    pub const MACHINE: u32 = 0x20;
    pub const AQUA: u32 = 0x40;
    pub const PYRO: u32 = 0x80;
    pub const ROCK: u32 = 0x100;
    pub const WINGED_BEAST: u32 = 0x200;
    pub const PLANT: u32 = 0x400;
    pub const INSECT: u32 = 0x800;
    pub const THUNDER: u32 = 0x1000;
    pub const DRAGON: u32 = 0x2000;
    pub const BEAST: u32 = 0x4000;
    pub const BEAST_WARRIOR: u32 = 0x8000;
    pub const DINOSAUR: u32 = 0x10000;
    pub const FISH: u32 = 0x20000;
    pub const SEA_SERPENT: u32 = 0x40000;
    pub const REPTILE: u32 = 0x80000;
    pub const PSYCHIC: u32 = 0x100000;
    pub const DIVINE_BEAST: u32 = 0x200000;
    pub const CREATOR_GOD: u32 = 0x400000;
    pub const WYRM: u32 = 0x800000;
}

/// Provenance masks recorded in `CardState::reason` and in relation maps.
pub mod reason {
    pub const DESTROY: u32 = 0x1;
    pub const RELEASE: u32 = 0x2;
    pub const TEMPORARY: u32 = 0x4;
    pub const MATERIAL: u32 = 0x8;
    pub const SUMMON: u32 = 0x10;
    pub const BATTLE: u32 = 0x20;
    pub const EFFECT: u32 = 0x40;
    pub const COST: u32 = 0x80;
    pub const ADJUST: u32 = 0x100;
    pub const LOST_TARGET: u32 = 0x200;
    pub const RULE: u32 = 0x400;
    pub const SPSUMMON: u32 = 0x800;
    pub const DISSUMMON: u32 = 0x1000;
    pub const FLIP: u32 = 0x2000;
    pub const DISCARD: u32 = 0x4000;
    pub const RETURN: u32 = 0x20000;
    pub const FUSION: u32 = 0x40000;
    pub const SYNCHRO: u32 = 0x80000;
    pub const RITUAL: u32 = 0x100000;
    pub const XYZ: u32 = 0x200000;
    pub const REPLACE: u32 = 0x1000000;
    pub const DRAW: u32 = 0x2000000;
    pub const REDIRECT: u32 = 0x4000000;
}

/// Per-card status bits, independent of zone.
pub mod status {
    pub const DISABLED: u32 = 0x0001;
    pub const TO_ENABLE: u32 = 0x0002;
    pub const TO_DISABLE: u32 = 0x0004;
    pub const PROC_COMPLETE: u32 = 0x0008;
    pub const SET_TURN: u32 = 0x0010;
    pub const FLIP_SUMMONED: u32 = 0x0020;
    pub const REVIVE_LIMIT: u32 = 0x0040;
    pub const ATTACKED: u32 = 0x0080;
    pub const FORM_CHANGED: u32 = 0x0100;
    pub const SUMMONING: u32 = 0x0200;
    pub const EFFECT_ENABLED: u32 = 0x0400;
    pub const SUMMON_TURN: u32 = 0x0800;
    pub const DESTROY_CONFIRMED: u32 = 0x1000;
    pub const LEAVE_CONFIRMED: u32 = 0x2000;
    pub const BATTLE_DESTROYED: u32 = 0x4000;
    pub const COPYING_EFFECT: u32 = 0x8000;
    pub const CHAINING: u32 = 0x10000;
    pub const SUMMON_DISABLED: u32 = 0x20000;
    pub const ACTIVATE_DISABLED: u32 = 0x40000;
    pub const UNSUMMONABLE_CARD: u32 = 0x80000;
    pub const UNION: u32 = 0x100000;
    pub const ATTACK_CANCELED: u32 = 0x200000;
    pub const INITIALIZING: u32 = 0x400000;
    pub const ACTIVATED: u32 = 0x800000;
    pub const JUST_POS: u32 = 0x1000000;
    pub const CONTINUOUS_POS: u32 = 0x2000000;
    pub const IS_PUBLIC: u32 = 0x4000000;
    pub const ACT_FROM_HAND: u32 = 0x8000000;
}

/// Counter-kind flag bits carried in the high bits of a counter type.
pub mod counter {
    /// The counter may only be placed while a matching permit modifier is
    /// attached; detaching the permit clears the counter.
    pub const NEED_PERMIT: u16 = 0x1000;
    /// The counter may only be placed while the card is not disabled; a
    /// disable reset strips it.
    pub const NEED_ENABLE: u16 = 0x2000;
}
