//! Client query serialization.
//!
//! [`Duel::write_query`] renders one card into the flat little-endian
//! block clients consume: a `u32` byte length, the echoed flag mask,
//! then the requested fields in ascending flag order. In
//! [`QueryMode::Delta`] most fields are compared against the card's
//! [`QueryCache`](crate::cards::QueryCache); unchanged fields are
//! skipped and their bit is cleared from the echoed mask, so a client
//! replaying deltas only ever parses fields that moved.

use crate::core::consts::status;
use crate::core::ids::CardHandle;
use crate::duel::Duel;

/// Field selector bits for [`Duel::write_query`]. The bit order is the
/// field order on the wire.
pub mod query_flag {
    pub const CODE: u32 = 0x1;
    pub const POSITION: u32 = 0x2;
    pub const ALIAS: u32 = 0x4;
    pub const TYPE: u32 = 0x8;
    pub const LEVEL: u32 = 0x10;
    pub const RANK: u32 = 0x20;
    pub const ATTRIBUTE: u32 = 0x40;
    pub const RACE: u32 = 0x80;
    pub const ATTACK: u32 = 0x100;
    pub const DEFENCE: u32 = 0x200;
    pub const BASE_ATTACK: u32 = 0x400;
    pub const BASE_DEFENCE: u32 = 0x800;
    pub const REASON: u32 = 0x1000;
    pub const REASON_CARD: u32 = 0x2000;
    pub const EQUIP_CARD: u32 = 0x4000;
    pub const TARGET_CARD: u32 = 0x8000;
    pub const OVERLAY_CARD: u32 = 0x10000;
    pub const COUNTERS: u32 = 0x20000;
    pub const OWNER: u32 = 0x40000;
    pub const IS_DISABLED: u32 = 0x80000;
    pub const IS_PUBLIC: u32 = 0x100000;
    pub const LSCALE: u32 = 0x200000;
    pub const RSCALE: u32 = 0x400000;

    pub const ALL: u32 = 0x7fffff;
}

/// Whether a query reuses the card's last-written snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    /// Write every requested field and refresh the snapshot.
    Full,
    /// Skip fields unchanged since the last snapshot.
    Delta,
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

impl Duel {
    /// Append one card's query block to `buf`. Returns the block's byte
    /// length (header included), which is also written as its first
    /// word.
    pub fn write_query(
        &mut self,
        ch: CardHandle,
        flags: u32,
        mode: QueryMode,
        buf: &mut Vec<u8>,
    ) -> usize {
        let start = buf.len();
        buf.extend_from_slice(&[0u8; 8]);
        let mut echoed = flags;
        let delta = mode == QueryMode::Delta;

        if flags & query_flag::CODE != 0 {
            push_u32(buf, self.card(ch).data.code);
        }
        if flags & query_flag::POSITION != 0 {
            push_u32(buf, self.field_place(ch).packed());
        }
        if flags & query_flag::ALIAS != 0 {
            let v = self.code(ch);
            if delta {
                if self.card(ch).query_cache.alias != v {
                    self.card_mut(ch).query_cache.alias = v;
                    push_u32(buf, v);
                } else {
                    echoed &= !query_flag::ALIAS;
                }
            } else {
                self.card_mut(ch).query_cache.code = v;
                push_u32(buf, v);
            }
        }
        if flags & query_flag::TYPE != 0 {
            let v = self.card_type(ch);
            if !delta || self.card(ch).query_cache.card_type != v {
                self.card_mut(ch).query_cache.card_type = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::TYPE;
            }
        }
        if flags & query_flag::LEVEL != 0 {
            let v = self.level(ch);
            if !delta || self.card(ch).query_cache.level != v {
                self.card_mut(ch).query_cache.level = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::LEVEL;
            }
        }
        if flags & query_flag::RANK != 0 {
            let v = self.rank(ch);
            if !delta || self.card(ch).query_cache.rank != v {
                self.card_mut(ch).query_cache.rank = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::RANK;
            }
        }
        if flags & query_flag::ATTRIBUTE != 0 {
            let v = self.attribute(ch);
            if !delta || self.card(ch).query_cache.attribute != v {
                self.card_mut(ch).query_cache.attribute = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::ATTRIBUTE;
            }
        }
        if flags & query_flag::RACE != 0 {
            let v = self.race(ch);
            if !delta || self.card(ch).query_cache.race != v {
                self.card_mut(ch).query_cache.race = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::RACE;
            }
        }
        if flags & query_flag::ATTACK != 0 {
            let v = self.attack(ch);
            if !delta || self.card(ch).query_cache.attack != v {
                self.card_mut(ch).query_cache.attack = v;
                push_i32(buf, v);
            } else {
                echoed &= !query_flag::ATTACK;
            }
        }
        if flags & query_flag::DEFENCE != 0 {
            let v = self.defence(ch);
            if !delta || self.card(ch).query_cache.defence != v {
                self.card_mut(ch).query_cache.defence = v;
                push_i32(buf, v);
            } else {
                echoed &= !query_flag::DEFENCE;
            }
        }
        if flags & query_flag::BASE_ATTACK != 0 {
            let v = self.base_attack(ch);
            if !delta || self.card(ch).query_cache.base_attack != v {
                self.card_mut(ch).query_cache.base_attack = v;
                push_i32(buf, v);
            } else {
                echoed &= !query_flag::BASE_ATTACK;
            }
        }
        if flags & query_flag::BASE_DEFENCE != 0 {
            let v = self.base_defence(ch);
            if !delta || self.card(ch).query_cache.base_defence != v {
                self.card_mut(ch).query_cache.base_defence = v;
                push_i32(buf, v);
            } else {
                echoed &= !query_flag::BASE_DEFENCE;
            }
        }
        if flags & query_flag::REASON != 0 {
            let v = self.card(ch).current.reason;
            if !delta || self.card(ch).query_cache.reason != v {
                self.card_mut(ch).query_cache.reason = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::REASON;
            }
        }
        if flags & query_flag::REASON_CARD != 0 {
            let v = self
                .card(ch)
                .current
                .reason_card
                .map_or(0, |rc| self.field_place(rc).packed());
            push_u32(buf, v);
        }
        if flags & query_flag::EQUIP_CARD != 0 {
            match self.card(ch).equip_target {
                Some(t) => push_u32(buf, self.field_place(t).packed()),
                None => echoed &= !query_flag::EQUIP_CARD,
            }
        }
        if flags & query_flag::TARGET_CARD != 0 {
            let mut targets: Vec<CardHandle> = self.card(ch).targeting.iter().copied().collect();
            targets.sort_by_key(|h| h.raw());
            push_u32(buf, targets.len() as u32);
            for t in targets {
                let v = self.field_place(t).packed();
                push_u32(buf, v);
            }
        }
        if flags & query_flag::OVERLAY_CARD != 0 {
            let materials = self.card(ch).overlay_materials.clone();
            push_u32(buf, materials.len() as u32);
            for m in materials {
                push_u32(buf, self.card(m).data.code);
            }
        }
        if flags & query_flag::COUNTERS != 0 {
            let counters: Vec<(u16, u16)> = self
                .card(ch)
                .counters
                .iter()
                .map(|(&k, &c)| (k, c))
                .collect();
            push_u32(buf, counters.len() as u32);
            for (kind, count) in counters {
                push_u32(buf, u32::from(kind) | u32::from(count) << 16);
            }
        }
        if flags & query_flag::OWNER != 0 {
            push_u32(buf, u32::from(self.card(ch).owner));
        }
        if flags & query_flag::IS_DISABLED != 0 {
            let v = u32::from(self.card(ch).is_status(status::DISABLED));
            if !delta || self.card(ch).query_cache.is_disabled != v {
                self.card_mut(ch).query_cache.is_disabled = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::IS_DISABLED;
            }
        }
        if flags & query_flag::IS_PUBLIC != 0 {
            push_u32(buf, u32::from(self.card(ch).is_status(status::IS_PUBLIC)));
        }
        if flags & query_flag::LSCALE != 0 {
            let v = self.lscale(ch);
            if !delta || self.card(ch).query_cache.lscale != v {
                self.card_mut(ch).query_cache.lscale = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::LSCALE;
            }
        }
        if flags & query_flag::RSCALE != 0 {
            let v = self.rscale(ch);
            if !delta || self.card(ch).query_cache.rscale != v {
                self.card_mut(ch).query_cache.rscale = v;
                push_u32(buf, v);
            } else {
                echoed &= !query_flag::RSCALE;
            }
        }

        let len = buf.len() - start;
        buf[start..start + 4].copy_from_slice(&(len as u32).to_le_bytes());
        buf[start + 4..start + 8].copy_from_slice(&echoed.to_le_bytes());
        len
    }

    /// Drop a card's query snapshot so the next delta rewrites
    /// everything. Used when a card changes zones or flips facedown.
    pub fn invalidate_query_cache(&mut self, ch: CardHandle) {
        self.card_mut(ch).query_cache = Default::default();
    }
}
