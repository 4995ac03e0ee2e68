//! Printed card data and the lookup seam for external card databases.

use serde::{Deserialize, Serialize};

/// The immutable printed face of a card. Everything a duel can observe
/// about a card derives from this plus the attached modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintedData {
    /// Passcode identifying the print.
    pub code: u32,
    /// Treated-as code (0 when the card is only ever itself).
    pub alias: u32,
    /// Up to four 16-bit archetype slots packed little-end first.
    pub setcode: u64,
    /// Type mask, see [`card_type`](crate::core::consts::card_type).
    pub card_type: u32,
    /// Printed level for levelled monsters, printed rank for xyz.
    pub level: u32,
    pub attribute: u32,
    pub race: u32,
    pub attack: i32,
    pub defence: i32,
    /// Pendulum scales; zero on non-pendulum prints.
    pub lscale: u32,
    pub rscale: u32,
}

impl PrintedData {
    /// Builder-style constructor for the common monster shape.
    #[must_use]
    pub fn monster(code: u32, level: u32, attack: i32, defence: i32) -> Self {
        Self {
            code,
            card_type: crate::core::consts::card_type::MONSTER,
            level,
            attack,
            defence,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: u32) -> Self {
        self.alias = alias;
        self
    }

    #[must_use]
    pub fn with_setcode(mut self, setcode: u64) -> Self {
        self.setcode = setcode;
        self
    }

    #[must_use]
    pub fn with_type(mut self, card_type: u32) -> Self {
        self.card_type = card_type;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: u32) -> Self {
        self.attribute = attribute;
        self
    }

    #[must_use]
    pub fn with_race(mut self, race: u32) -> Self {
        self.race = race;
        self
    }

    #[must_use]
    pub fn with_scales(mut self, lscale: u32, rscale: u32) -> Self {
        self.lscale = lscale;
        self.rscale = rscale;
        self
    }

    /// Walk the packed archetype slots against a queried set code.
    /// The low 12 bits of each slot name the archetype, the high 4 bits
    /// its sub-archetype; a query with sub-bits only matches slots that
    /// carry all of them.
    #[must_use]
    pub fn matches_setcode(&self, set_code: u32) -> bool {
        let settype = set_code as u64 & 0xfff;
        let setsubtype = set_code as u64 & 0xf000;
        let mut setcode = self.setcode;
        while setcode != 0 {
            if (setcode & 0xfff) == settype && (setcode & 0xf000 & setsubtype) == setsubtype {
                return true;
            }
            setcode >>= 16;
        }
        false
    }
}

/// Supplies printed data for arbitrary codes. Identity-changing modifiers
/// can turn a card into any print in the database, so code and archetype
/// resolution need a way back into it.
pub trait CardReader {
    /// Look up the printed data for `code`. `None` for unknown codes.
    fn printed(&self, code: u32) -> Option<PrintedData>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_setcode_walks_all_slots() {
        let data = PrintedData::monster(1000, 4, 1800, 1200).with_setcode(0x00aa_1046);
        assert!(data.matches_setcode(0x46));
        assert!(data.matches_setcode(0xaa));
        assert!(!data.matches_setcode(0xbb));
    }

    #[test]
    fn test_matches_setcode_subtype_bits() {
        // Slot 0x3046: archetype 0x046 with sub-bit 0x3000.
        let data = PrintedData::monster(1000, 4, 1800, 1200).with_setcode(0x3046);
        assert!(data.matches_setcode(0x46));
        assert!(data.matches_setcode(0x3046));
        // Requesting a sub-bit the slot lacks must not match.
        assert!(!data.matches_setcode(0x4046));
    }

    #[test]
    fn test_empty_setcode_matches_nothing() {
        let data = PrintedData::monster(1000, 4, 0, 0);
        assert!(!data.matches_setcode(0));
        assert!(!data.matches_setcode(0x46));
    }
}
