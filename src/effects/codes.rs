//! Semantic codes for modifiers.
//!
//! A modifier's code names what it does; the resolution engine and the
//! registry dispatch on these. Counter permits and limits are families:
//! the low 16 bits carry the counter kind, the high bits select the
//! family, so `code & 0xf0000` identifies a permit regardless of kind.

// Disable machinery.
pub const IMMUNE_EFFECT: u32 = 1;
pub const DISABLE: u32 = 2;
pub const CANNOT_DISABLE: u32 = 3;
pub const SET_CONTROL: u32 = 4;
pub const REMOVE_BRAINWASHING: u32 = 5;

// Identity.
pub const CHANGE_CODE: u32 = 10;
pub const ADD_CODE: u32 = 11;

// Type line.
pub const ADD_TYPE: u32 = 20;
pub const REMOVE_TYPE: u32 = 21;
pub const CHANGE_TYPE: u32 = 22;

// Attack and defence.
pub const UPDATE_ATTACK: u32 = 30;
pub const SET_ATTACK: u32 = 31;
pub const SET_ATTACK_FINAL: u32 = 32;
pub const SET_BASE_ATTACK: u32 = 33;
pub const UPDATE_DEFENCE: u32 = 34;
pub const SET_DEFENCE: u32 = 35;
pub const SET_DEFENCE_FINAL: u32 = 36;
pub const SET_BASE_DEFENCE: u32 = 37;
pub const REVERSE_UPDATE: u32 = 38;
pub const SWAP_AD: u32 = 39;
pub const SWAP_BASE_AD: u32 = 40;

// Level, rank, and material levels.
pub const UPDATE_LEVEL: u32 = 50;
pub const CHANGE_LEVEL: u32 = 51;
pub const UPDATE_RANK: u32 = 52;
pub const CHANGE_RANK: u32 = 53;
pub const SYNCHRO_LEVEL: u32 = 54;
pub const RITUAL_LEVEL: u32 = 55;
pub const XYZ_LEVEL: u32 = 56;

// Attribute and race.
pub const ADD_ATTRIBUTE: u32 = 60;
pub const REMOVE_ATTRIBUTE: u32 = 61;
pub const CHANGE_ATTRIBUTE: u32 = 62;
pub const ADD_RACE: u32 = 63;
pub const REMOVE_RACE: u32 = 64;
pub const CHANGE_RACE: u32 = 65;

// Pendulum scales.
pub const UPDATE_LSCALE: u32 = 70;
pub const CHANGE_LSCALE: u32 = 71;
pub const UPDATE_RSCALE: u32 = 72;
pub const CHANGE_RSCALE: u32 = 73;

// Field bookkeeping.
pub const UNIQUE_CHECK: u32 = 80;
pub const MATERIAL_CHECK: u32 = 81;
pub const DISABLE_FIELD: u32 = 82;
pub const USE_EXTRA_MZONE: u32 = 83;
pub const USE_EXTRA_SZONE: u32 = 84;

/// Counter permit family base; full code is `COUNTER_PERMIT | kind`.
pub const COUNTER_PERMIT: u32 = 0x10000;
/// Counter limit family base; full code is `COUNTER_LIMIT | kind`.
pub const COUNTER_LIMIT: u32 = 0x20000;

/// Mask isolating the family bits of a counter-permit code.
pub const COUNTER_FAMILY_MASK: u32 = 0xf0000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_permit_family_test() {
        let code = COUNTER_PERMIT | 0x1001;
        assert_eq!(code & COUNTER_FAMILY_MASK, COUNTER_PERMIT);
        assert_eq!(code & 0xffff, 0x1001);
        assert_ne!(COUNTER_LIMIT & COUNTER_FAMILY_MASK, COUNTER_PERMIT);
    }
}
