//! The query wire format across a sequence of state changes: a client
//! that applies a full snapshot and then replays deltas must end up
//! with the same view as one re-querying everything each time.

use duelcore::cards::PrintedData;
use duelcore::core::consts::{location, position, status};
use duelcore::duel::query_flag;
use duelcore::effects::{codes, etype, Callable, ResolutionContext};
use duelcore::{CardHandle, Duel, QueryMode};

fn summon(duel: &mut Duel, code: u32, atk: i32, def: i32) -> CardHandle {
    let ch = duel.new_card(PrintedData::monster(code, 4, atk, def), 0);
    let card = duel.card_mut(ch);
    card.current.controller = 0;
    card.current.location = location::MZONE;
    card.current.sequence = 0;
    card.current.position = position::FACEUP_ATTACK;
    card.set_status(status::EFFECT_ENABLED, true);
    ch
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
}

/// Parse one query block into (flag, value-words) pairs. Multi-word
/// sections are returned as their raw words in order.
fn parse(buf: &[u8]) -> (u32, Vec<(u32, Vec<u32>)>) {
    let len = read_u32(buf, 0) as usize;
    assert_eq!(len, buf.len());
    let flags = read_u32(buf, 4);
    let mut fields = Vec::new();
    let mut at = 8;
    let read = |at: &mut usize| {
        let v = read_u32(buf, *at);
        *at += 4;
        v
    };
    for bit in 0..23 {
        let flag = 1u32 << bit;
        if flags & flag == 0 {
            continue;
        }
        let words = match flag {
            query_flag::TARGET_CARD | query_flag::OVERLAY_CARD | query_flag::COUNTERS => {
                let n = read(&mut at);
                let mut words = vec![n];
                for _ in 0..n {
                    words.push(read(&mut at));
                }
                words
            }
            _ => vec![read(&mut at)],
        };
        fields.push((flag, words));
    }
    assert_eq!(at, len);
    (flags, fields)
}

#[test]
fn delta_replay_converges_to_full_snapshot() {
    let mut duel = Duel::new();
    let ch = summon(&mut duel, 1234, 1800, 1200);
    let flags = query_flag::CODE
        | query_flag::POSITION
        | query_flag::ALIAS
        | query_flag::TYPE
        | query_flag::LEVEL
        | query_flag::ATTACK
        | query_flag::DEFENCE
        | query_flag::BASE_ATTACK
        | query_flag::BASE_DEFENCE
        | query_flag::IS_DISABLED;

    let mut buf = Vec::new();
    duel.write_query(ch, flags, QueryMode::Full, &mut buf);
    let (_, full) = parse(&buf);
    let mut view: std::collections::HashMap<u32, Vec<u32>> = full.into_iter().collect();
    // Prime the delta snapshot.
    buf.clear();
    duel.write_query(ch, flags, QueryMode::Delta, &mut buf);

    // Mutate: boost attack, raise level.
    for (code, v) in [(codes::UPDATE_ATTACK, 500), (codes::UPDATE_LEVEL, 2)] {
        let e = duel
            .alloc_effect(ch)
            .with_type(etype::SINGLE)
            .with_code(code)
            .with_value(Callable::Constant(v));
        duel.attach(ch, e, &ResolutionContext::default()).unwrap();
    }

    buf.clear();
    duel.write_query(ch, flags, QueryMode::Delta, &mut buf);
    let (echoed, delta) = parse(&buf);
    assert_eq!(echoed, query_flag::CODE | query_flag::POSITION | query_flag::LEVEL | query_flag::ATTACK);
    for (flag, words) in delta {
        view.insert(flag, words);
    }

    buf.clear();
    duel.write_query(ch, flags, QueryMode::Full, &mut buf);
    let (_, full_again) = parse(&buf);
    for (flag, words) in full_again {
        assert_eq!(view.get(&flag), Some(&words), "flag {flag:#x} diverged");
    }
}

#[test]
fn unchanged_delta_is_header_only() {
    let mut duel = Duel::new();
    let ch = summon(&mut duel, 1, 1000, 1000);
    let cached = query_flag::TYPE | query_flag::LEVEL | query_flag::ATTACK | query_flag::LSCALE;
    let mut buf = Vec::new();
    duel.write_query(ch, cached, QueryMode::Delta, &mut buf);
    buf.clear();
    let len = duel.write_query(ch, cached, QueryMode::Delta, &mut buf);
    assert_eq!(len, 8);
    assert_eq!(read_u32(&buf, 0), 8);
    assert_eq!(read_u32(&buf, 4), 0);
}

#[test]
fn always_fresh_fields_survive_delta_pruning() {
    let mut duel = Duel::new();
    let ch = summon(&mut duel, 42, 1000, 1000);
    let flags = query_flag::CODE | query_flag::POSITION | query_flag::OWNER | query_flag::IS_PUBLIC;
    let mut buf = Vec::new();
    duel.write_query(ch, flags, QueryMode::Delta, &mut buf);
    buf.clear();
    let len = duel.write_query(ch, flags, QueryMode::Delta, &mut buf);
    assert_eq!(len, 8 + 16);
    assert_eq!(read_u32(&buf, 4), flags);
    assert_eq!(read_u32(&buf, 8), 42);
}

#[test]
fn target_and_counter_sections_carry_counts() {
    let mut duel = Duel::new();
    let a = summon(&mut duel, 1, 1000, 1000);
    let b = summon(&mut duel, 2, 1000, 1000);
    duel.card_mut(b).current.sequence = 1;
    duel.add_card_target(a, b);
    duel.add_counter(a, 0x9, 4);

    let mut buf = Vec::new();
    duel.write_query(
        a,
        query_flag::TARGET_CARD | query_flag::COUNTERS,
        QueryMode::Full,
        &mut buf,
    );
    let (_, fields) = parse(&buf);
    let targets = &fields[0].1;
    assert_eq!(targets[0], 1);
    assert_eq!(
        targets[1],
        (location::MZONE << 8) | (1 << 16) | (position::FACEUP_ATTACK << 24)
    );
    let counters = &fields[1].1;
    assert_eq!(counters[0], 1);
    assert_eq!(counters[1], 0x9 | (4 << 16));
}

#[test]
fn facedown_flip_redirties_via_invalidation() {
    let mut duel = Duel::new();
    let ch = summon(&mut duel, 1, 1700, 300);
    let flags = query_flag::ATTACK | query_flag::DEFENCE;
    let mut buf = Vec::new();
    duel.write_query(ch, flags, QueryMode::Delta, &mut buf);

    duel.card_mut(ch).current.position = position::FACEDOWN_DEFENCE;
    duel.invalidate_query_cache(ch);
    buf.clear();
    let len = duel.write_query(ch, flags, QueryMode::Delta, &mut buf);
    assert_eq!(len, 16);
    assert_eq!(read_u32(&buf, 8) as i32, 1700);
    assert_eq!(read_u32(&buf, 12) as i32, 300);
}
