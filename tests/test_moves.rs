use paipai::engine::moves::{self, MoveKind, MoveStatus, MoveWeights};

mod common;

#[test]
fn test_swap_metal_same_species_is_noop() {
    let mut s = common::sample_structure();
    let before = s.clone();
    // Atoms 0 and 1 are both Fe.
    assert_eq!(moves::swap_metal(&mut s, 0, 1), MoveStatus::NoOp);
    assert_eq!(s.atoms[0].species, before.atoms[0].species);
    assert_eq!(s.atoms[1].species, before.atoms[1].species);
    assert!(s.check_invariants());
}

#[test]
fn test_swap_metal_exchanges_species() {
    let mut s = common::sample_structure();
    assert_eq!(moves::swap_metal(&mut s, 0, 2), MoveStatus::Applied);
    assert_eq!(s.atoms[0].species, 1);
    assert_eq!(s.atoms[2].species, 0);
    // Counts are untouched: the species merely changed places.
    assert_eq!(s.metal.counts, vec![2, 2]);
    assert!(s.check_invariants());
}

#[test]
fn test_swap_metal_range_check() {
    let mut s = common::sample_structure();
    assert_eq!(moves::swap_metal(&mut s, 0, 99), MoveStatus::OutOfRange);
    assert_eq!(moves::swap_metal(&mut s, 99, 0), MoveStatus::OutOfRange);
    assert!(s.check_invariants());
}

#[test]
fn test_exchange_metal_adjusts_counts() {
    let mut s = common::sample_structure();
    assert_eq!(moves::exchange_metal(&mut s, 0, 1), MoveStatus::Applied);
    assert_eq!(s.metal.counts, vec![1, 3]);
    assert_eq!(s.metal.total(), 4);
    assert!(s.check_invariants());

    // Retyping to the current species is idempotent.
    assert_eq!(moves::exchange_metal(&mut s, 0, 1), MoveStatus::NoOp);
    assert_eq!(s.metal.counts, vec![1, 3]);

    assert_eq!(moves::exchange_metal(&mut s, 0, 5), MoveStatus::InvalidSpecies);
    assert_eq!(moves::exchange_metal(&mut s, 42, 0), MoveStatus::OutOfRange);
    assert!(s.check_invariants());
}

#[test]
fn test_swap_interstitial_moves_occupation() {
    let mut s = common::sample_structure();
    // Site 0 holds the carbon, site 1 is empty.
    assert_eq!(moves::swap_interstitial(&mut s, 0, 1), MoveStatus::Applied);
    assert_eq!(s.sites[0].occupation, None);
    assert_eq!(s.sites[1].occupation, Some(0));
    assert_eq!(s.inter.counts, vec![1]);
    assert!(s.check_invariants());

    // Both empty now.
    assert_eq!(moves::swap_interstitial(&mut s, 0, 2), MoveStatus::NoOp);
    assert_eq!(moves::swap_interstitial(&mut s, 0, 9), MoveStatus::OutOfRange);
    assert!(s.check_invariants());
}

#[test]
fn test_exchange_interstitial_counts() {
    let mut s = common::sample_structure();

    // Occupying an empty site increments the species count.
    assert_eq!(
        moves::exchange_interstitial(&mut s, 1, Some(0)),
        MoveStatus::Applied
    );
    assert_eq!(s.inter.counts, vec![2]);
    assert_eq!(s.sites[1].occupation, Some(0));
    assert!(s.check_invariants());

    // Emptying an occupied site decrements only.
    assert_eq!(moves::exchange_interstitial(&mut s, 0, None), MoveStatus::Applied);
    assert_eq!(s.inter.counts, vec![1]);
    assert_eq!(s.sites[0].occupation, None);
    assert!(s.check_invariants());

    // Emptying an empty site is the idempotent case.
    assert_eq!(moves::exchange_interstitial(&mut s, 0, None), MoveStatus::NoOp);
    assert_eq!(s.inter.counts, vec![1]);

    assert_eq!(
        moves::exchange_interstitial(&mut s, 0, Some(7)),
        MoveStatus::InvalidSpecies
    );
    assert_eq!(
        moves::exchange_interstitial(&mut s, 33, None),
        MoveStatus::OutOfRange
    );
    assert!(s.check_invariants());
}

#[test]
fn test_weight_sampling_respects_zeros() {
    let weights = MoveWeights {
        swap_metal: 70,
        swap_inter: 30,
        exch_metal: 0,
        exch_inter: 0,
    };
    let mut rng = common::rng(11);
    let mut seen_swap_metal = false;
    let mut seen_swap_inter = false;
    for _ in 0..1000 {
        match weights.sample(&mut rng) {
            MoveKind::SwapMetal => seen_swap_metal = true,
            MoveKind::SwapInter => seen_swap_inter = true,
            other => panic!("zero-weight kind {} drawn", other),
        }
    }
    assert!(seen_swap_metal && seen_swap_inter);

    let only_exchanges = MoveWeights {
        swap_metal: 0,
        swap_inter: 0,
        exch_metal: 5,
        exch_inter: 5,
    };
    for _ in 0..1000 {
        let kind = only_exchanges.sample(&mut rng);
        assert!(matches!(
            kind,
            MoveKind::ExchangeMetal | MoveKind::ExchangeInter
        ));
    }
}

#[test]
fn test_random_legal_moves_preserve_invariants() {
    let weights = MoveWeights {
        swap_metal: 40,
        swap_inter: 30,
        exch_metal: 20,
        exch_inter: 10,
    };
    let mut s = common::sample_structure();
    let mut rng = common::rng(99);

    for _ in 0..300 {
        let kind = weights.sample(&mut rng);
        // A structure can transiently lack viable operands for a kind (for
        // example no occupied interstitial site); that draw is just skipped.
        if moves::propose(&mut s, kind, &mut rng).is_some() {
            assert!(s.check_invariants());
        }
        assert_eq!(s.metal.total(), 4);
        assert_eq!(s.num_sites(), 3);
    }
}

#[test]
fn test_poscar_regroups_after_swap() {
    let mut s = common::sample_structure();
    let pos_atom2 = s.atoms[2].position;
    assert_eq!(moves::swap_metal(&mut s, 0, 2), MoveStatus::Applied);

    let text = paipai::io::poscar::render_poscar(&s);
    let lines: Vec<&str> = text.lines().collect();
    // The Fe block now leads with atom 1 followed by atom 2 (old positions,
    // new grouping); atom 0 moved into the Ni block.
    let first_fe = format!(
        "  {:>15.9} {:>15.9} {:>15.9}",
        s.atoms[1].position.x, s.atoms[1].position.y, s.atoms[1].position.z
    );
    let second_fe = format!(
        "  {:>15.9} {:>15.9} {:>15.9}",
        pos_atom2.x, pos_atom2.y, pos_atom2.z
    );
    assert_eq!(lines[8], first_fe);
    assert_eq!(lines[9], second_fe);
}
