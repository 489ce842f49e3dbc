use rand::Rng;

/// Metropolis acceptance for a proposed energy change.
///
/// Downhill or equal moves are always taken; uphill moves are taken with
/// probability `exp(-dE / T)`. The temperature carries energy units, so no
/// Boltzmann constant is applied here.
pub fn accept<R: Rng + ?Sized>(e_old: f64, e_new: f64, temperature: f64, rng: &mut R) -> bool {
    if e_new <= e_old {
        return true;
    }
    if temperature <= 0.0 {
        return false; // Quench only
    }
    let prob = (-(e_new - e_old) / temperature).exp();
    rng.gen::<f64>() < prob
}
