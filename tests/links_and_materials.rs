//! Link bookkeeping under churn: overlay stacks, equips severed by
//! materialization, counters, and control holds.

use duelcore::cards::PrintedData;
use duelcore::core::consts::{counter, location, position, status};
use duelcore::effects::{codes, etype, Callable, ResolutionContext};
use duelcore::{CardHandle, Duel, Message, ResetKind};

use proptest::prelude::*;

fn summon(duel: &mut Duel, code: u32, controller: u8, seq: u32) -> CardHandle {
    let ch = duel.new_card(PrintedData::monster(code, 4, 1500, 1000), controller);
    let card = duel.card_mut(ch);
    card.current.controller = controller;
    card.current.location = location::MZONE;
    card.current.sequence = seq;
    card.current.position = position::FACEUP_ATTACK;
    card.set_status(status::EFFECT_ENABLED, true);
    ch
}

#[test]
fn overlay_emits_moves_and_orders_materials() {
    let mut duel = Duel::new();
    let host = summon(&mut duel, 10, 0, 0);
    let m1 = summon(&mut duel, 11, 0, 1);
    let m2 = summon(&mut duel, 12, 1, 0);
    duel.info.turn_player = 0;
    duel.overlay(host, &[m2, m1]);

    // Turn player's material stacks first.
    let mats = duel.card(host).overlay_materials.clone();
    assert_eq!(mats, vec![m1, m2]);
    let moves: Vec<_> = duel
        .messages()
        .iter()
        .filter(|m| matches!(m, Message::Move { .. }))
        .collect();
    assert_eq!(moves.len(), 2);
}

#[test]
fn restacking_between_hosts_keeps_both_contiguous() {
    let mut duel = Duel::new();
    let host_a = summon(&mut duel, 10, 0, 0);
    let host_b = summon(&mut duel, 20, 1, 0);
    let m1 = summon(&mut duel, 11, 0, 1);
    let m2 = summon(&mut duel, 12, 0, 2);
    duel.overlay(host_a, &[m1, m2]);

    let mut severed = Vec::new();
    duel.stack_material(host_b, m1, &mut severed);
    assert!(severed.is_empty());
    assert_eq!(duel.card(host_a).overlay_materials.clone(), vec![m2]);
    assert_eq!(duel.card(m2).current.sequence, 0);
    assert_eq!(duel.card(host_b).overlay_materials.clone(), vec![m1]);
    assert_eq!(duel.card(m1).overlay_target, Some(host_b));
}

#[test]
fn materials_lose_their_scoped_modifiers() {
    let mut duel = Duel::new();
    let host = summon(&mut duel, 10, 0, 0);
    let mat = summon(&mut duel, 11, 0, 1);
    let boost = duel
        .alloc_effect(mat)
        .with_type(etype::SINGLE)
        .with_code(codes::UPDATE_ATTACK)
        .with_reset(
            duelcore::effects::reset::EVENT | duelcore::effects::reset::OVERLAY,
            0,
        )
        .with_value(Callable::Constant(500));
    let eh = duel.attach(mat, boost, &ResolutionContext::default()).unwrap();

    duel.overlay(host, &[mat]);
    assert!(duel.effect(eh).is_none());
}

#[test]
fn summon_materials_record_their_consumer() {
    let mut duel = Duel::new();
    let summoned = summon(&mut duel, 10, 0, 0);
    let m1 = summon(&mut duel, 11, 0, 1);
    let m2 = summon(&mut duel, 12, 0, 2);
    let mats = [m1, m2].into_iter().collect();
    duel.set_materials(summoned, mats);
    assert_eq!(duel.card(m1).current.reason_card, Some(summoned));
    assert_eq!(duel.card(m2).current.reason_card, Some(summoned));
    assert_eq!(duel.card(summoned).summon_materials.len(), 2);
}

#[test]
fn counters_require_face_up_field_presence() {
    let mut duel = Duel::new();
    let ch = summon(&mut duel, 1, 0, 0);
    assert!(duel.can_add_counter(ch, 0x5, 1));

    duel.card_mut(ch).current.position = position::FACEDOWN_DEFENCE;
    assert!(!duel.can_add_counter(ch, 0x5, 1));

    duel.card_mut(ch).current.position = position::FACEUP_ATTACK;
    duel.card_mut(ch).current.location = location::GRAVE;
    assert!(!duel.can_add_counter(ch, 0x5, 1));
}

#[test]
fn enable_gated_counters_die_with_a_disable() {
    let mut duel = Duel::new();
    let ch = summon(&mut duel, 1, 0, 0);
    let kind = counter::NEED_ENABLE | 0x7;
    duel.add_counter(ch, kind, 3);
    assert_eq!(duel.card(ch).counter(kind), 3);

    duel.reset(ch, duelcore::effects::reset::DISABLE, ResetKind::Event);
    assert_eq!(duel.card(ch).counter(kind), 0);
}

#[test]
fn control_hold_expires_into_owner() {
    let mut duel = Duel::new();
    let ch = summon(&mut duel, 1, 0, 0);
    let grab = duel
        .alloc_effect(ch)
        .with_type(etype::SINGLE)
        .with_code(codes::SET_CONTROL)
        .with_reset(
            duelcore::effects::reset::EVENT | duelcore::effects::reset::CONTROL,
            0,
        )
        .with_value(Callable::Constant(1));
    duel.attach(ch, grab, &ResolutionContext::default()).unwrap();
    assert_eq!(duel.refresh_control_status(ch), 1);

    duel.reset(ch, duelcore::effects::reset::CONTROL, ResetKind::Event);
    assert_eq!(duel.refresh_control_status(ch), 0);
}

#[test]
fn union_count_tracks_equipped_unions() {
    use duelcore::core::consts::card_type;
    let mut duel = Duel::new();
    let wearer = summon(&mut duel, 1, 0, 0);
    let union = duel.new_card(
        PrintedData::monster(2, 4, 1000, 1000).with_type(card_type::MONSTER | card_type::UNION),
        0,
    );
    duel.card_mut(union).set_status(status::UNION, true);
    duel.equip(union, wearer, false);
    let plain = duel.new_card(PrintedData::monster(3, 4, 0, 0), 0);
    duel.equip(plain, wearer, false);

    assert_eq!(duel.union_count(wearer), 1);
}

proptest! {
    // Any interleaving of stacking and unstacking leaves every host's
    // material sequence numbers contiguous from zero and every
    // material's back-reference consistent.
    #[test]
    fn material_sequences_stay_contiguous(ops in proptest::collection::vec((0u8..2, 0usize..6), 1..40)) {
        let mut duel = Duel::new();
        let host_a = summon(&mut duel, 10, 0, 0);
        let host_b = summon(&mut duel, 20, 1, 0);
        let mats: Vec<CardHandle> = (0..6)
            .map(|i| summon(&mut duel, 100 + i, 0, i + 1))
            .collect();

        for (which, idx) in ops {
            let mat = mats[idx];
            match which {
                0 => {
                    let mut severed = Vec::new();
                    duel.stack_material(host_a, mat, &mut severed);
                }
                _ => {
                    let mut severed = Vec::new();
                    duel.stack_material(host_b, mat, &mut severed);
                }
            }
        }

        for host in [host_a, host_b] {
            let stack = duel.card(host).overlay_materials.clone();
            for (i, m) in stack.iter().enumerate() {
                prop_assert_eq!(duel.card(*m).current.sequence, i as u32);
                prop_assert_eq!(duel.card(*m).overlay_target, Some(host));
                prop_assert_eq!(duel.card(*m).current.location, location::OVERLAY);
            }
        }
    }
}
