use paipai::engine::metropolis;

mod common;

#[test]
fn test_downhill_always_accepts() {
    let mut rng = common::rng(1);
    for i in 0..100 {
        let e_old = -5.0 + i as f64 * 0.1;
        assert!(metropolis::accept(e_old, e_old - 1.0, 1e-3, &mut rng));
        assert!(metropolis::accept(e_old, e_old, 1e-3, &mut rng));
    }
}

#[test]
fn test_large_uphill_never_accepts() {
    // exp(-dE/T) underflows to zero here, so no draw can pass.
    let mut rng = common::rng(2);
    for _ in 0..100 {
        assert!(!metropolis::accept(-10.0, -9.0, 1e-9, &mut rng));
    }
}

#[test]
fn test_uphill_rate_matches_boltzmann_factor() {
    let mut rng = common::rng(42);
    let samples = 100_000;
    let mut accepted = 0;
    for _ in 0..samples {
        if metropolis::accept(0.0, 1.0, 1.0, &mut rng) {
            accepted += 1;
        }
    }
    let rate = accepted as f64 / samples as f64;
    let expected = (-1.0f64).exp();
    assert!(
        (rate - expected).abs() < 0.01,
        "accept rate {} vs expected {}",
        rate,
        expected
    );
}
