use std::fmt;

use rand::Rng;

use crate::core::domain::Structure;

/// Outcome of a move operator.
///
/// `NoOp` covers the idempotence rule (both operands already carry the same
/// type), the range errors are kept distinct so callers can tell a bad index
/// from a bad species. No variant ever leaves the structure half-mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// Operands already equivalent; nothing changed.
    NoOp,
    /// Move applied.
    Applied,
    /// An atom or site index was out of range.
    OutOfRange,
    /// A target species index was out of range.
    InvalidSpecies,
}

/// The four configurational move kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    SwapMetal,
    SwapInter,
    ExchangeMetal,
    ExchangeInter,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MoveKind::SwapMetal => "swap_metal",
            MoveKind::SwapInter => "swap_interstitial",
            MoveKind::ExchangeMetal => "exchange_metal",
            MoveKind::ExchangeInter => "exchange_interstitial",
        };
        f.write_str(name)
    }
}

// --- Move operators ---

/// Exchanges the species of two metallic atoms.
pub fn swap_metal(s: &mut Structure, a: usize, b: usize) -> MoveStatus {
    let n = s.atoms.len();
    if a >= n || b >= n {
        return MoveStatus::OutOfRange;
    }
    if s.atoms[a].species == s.atoms[b].species {
        return MoveStatus::NoOp;
    }
    let tmp = s.atoms[a].species;
    s.atoms[a].species = s.atoms[b].species;
    s.atoms[b].species = tmp;
    MoveStatus::Applied
}

/// Retypes one metallic atom to `target`, adjusting both species counts.
pub fn exchange_metal(s: &mut Structure, a: usize, target: usize) -> MoveStatus {
    if a >= s.atoms.len() {
        return MoveStatus::OutOfRange;
    }
    if target >= s.metal.len() {
        return MoveStatus::InvalidSpecies;
    }
    let old = s.atoms[a].species;
    if old == target {
        return MoveStatus::NoOp;
    }
    s.metal.counts[old] -= 1;
    s.metal.counts[target] += 1;
    s.atoms[a].species = target;
    MoveStatus::Applied
}

/// Exchanges the occupations of two interstitial sites. Either side may be
/// empty; counts are untouched because occupation merely changes place.
pub fn swap_interstitial(s: &mut Structure, a: usize, b: usize) -> MoveStatus {
    let n = s.sites.len();
    if a >= n || b >= n {
        return MoveStatus::OutOfRange;
    }
    if s.sites[a].occupation == s.sites[b].occupation {
        return MoveStatus::NoOp;
    }
    let tmp = s.sites[a].occupation;
    s.sites[a].occupation = s.sites[b].occupation;
    s.sites[b].occupation = tmp;
    MoveStatus::Applied
}

/// Sets the occupation of one interstitial site to `target` (`None` empties
/// the site), adjusting the counts on both ends where a species is involved.
pub fn exchange_interstitial(s: &mut Structure, a: usize, target: Option<usize>) -> MoveStatus {
    if a >= s.sites.len() {
        return MoveStatus::OutOfRange;
    }
    if let Some(t) = target {
        if t >= s.inter.len() {
            return MoveStatus::InvalidSpecies;
        }
    }
    let old = s.sites[a].occupation;
    if old == target {
        return MoveStatus::NoOp;
    }
    if let Some(o) = old {
        s.inter.counts[o] -= 1;
    }
    if let Some(t) = target {
        s.inter.counts[t] += 1;
    }
    s.sites[a].occupation = target;
    MoveStatus::Applied
}

// --- Move selection ---

/// Categorical weights for the four move kinds. Selection draws
/// `r = uniform[0, sum)` and buckets by cumulative weight.
#[derive(Debug, Clone, Copy)]
pub struct MoveWeights {
    pub swap_metal: u32,
    pub swap_inter: u32,
    pub exch_metal: u32,
    pub exch_inter: u32,
}

impl MoveWeights {
    pub fn sum(&self) -> u32 {
        self.swap_metal + self.swap_inter + self.exch_metal + self.exch_inter
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> MoveKind {
        let r = rng.gen_range(0..self.sum());
        let mut edge = self.swap_metal;
        if r < edge {
            return MoveKind::SwapMetal;
        }
        edge += self.swap_inter;
        if r < edge {
            return MoveKind::SwapInter;
        }
        edge += self.exch_metal;
        if r < edge {
            return MoveKind::ExchangeMetal;
        }
        MoveKind::ExchangeInter
    }
}

impl Default for MoveWeights {
    fn default() -> Self {
        Self {
            swap_metal: 70,
            swap_inter: 30,
            exch_metal: 0,
            exch_inter: 0,
        }
    }
}

/// A move with concrete operands, as applied to a candidate structure.
/// Kept around for the dispatch log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    SwapMetal { a: usize, b: usize },
    SwapInter { a: usize, b: usize },
    ExchangeMetal { atom: usize, target: usize },
    ExchangeInter { site: usize, target: Option<usize> },
}

impl fmt::Display for Proposal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Proposal::SwapMetal { a, b } => write!(f, "swap_metal({}, {})", a, b),
            Proposal::SwapInter { a, b } => write!(f, "swap_interstitial({}, {})", a, b),
            Proposal::ExchangeMetal { atom, target } => {
                write!(f, "exchange_metal({}, {})", atom, target)
            }
            Proposal::ExchangeInter { site, target } => match target {
                Some(t) => write!(f, "exchange_interstitial({}, {})", site, t),
                None => write!(f, "exchange_interstitial({}, empty)", site),
            },
        }
    }
}

/// Operand draws per proposal before the structure is declared stuck for
/// that move kind.
const SAMPLE_ATTEMPTS: usize = 100;

/// Picks operands for `kind` by rejection sampling until the move's success
/// precondition holds, then applies it. Returns `None` when the structure
/// cannot support the move (single-species lattice, no occupied sites, ...)
/// within the attempt budget.
pub fn propose<R: Rng + ?Sized>(s: &mut Structure, kind: MoveKind, rng: &mut R) -> Option<Proposal> {
    match kind {
        MoveKind::SwapMetal => {
            let n = s.atoms.len();
            if n < 2 {
                return None;
            }
            for _ in 0..SAMPLE_ATTEMPTS {
                let a = rng.gen_range(0..n);
                let b = rng.gen_range(0..n);
                if s.atoms[a].species != s.atoms[b].species {
                    swap_metal(s, a, b);
                    return Some(Proposal::SwapMetal { a, b });
                }
            }
            None
        }
        MoveKind::SwapInter => {
            let n = s.sites.len();
            if n < 2 {
                return None;
            }
            for _ in 0..SAMPLE_ATTEMPTS {
                let a = rng.gen_range(0..n);
                if s.sites[a].occupation.is_none() {
                    continue;
                }
                let b = rng.gen_range(0..n);
                if s.sites[a].occupation != s.sites[b].occupation {
                    swap_interstitial(s, a, b);
                    return Some(Proposal::SwapInter { a, b });
                }
            }
            None
        }
        MoveKind::ExchangeMetal => {
            let n = s.atoms.len();
            let species = s.metal.len();
            if n == 0 || species < 2 {
                return None;
            }
            for _ in 0..SAMPLE_ATTEMPTS {
                let atom = rng.gen_range(0..n);
                let target = rng.gen_range(0..species);
                if s.atoms[atom].species != target {
                    exchange_metal(s, atom, target);
                    return Some(Proposal::ExchangeMetal { atom, target });
                }
            }
            None
        }
        MoveKind::ExchangeInter => {
            let n = s.sites.len();
            if n == 0 {
                return None;
            }
            // Target domain is the species list plus the empty state.
            let states = s.inter.len() + 1;
            if states < 2 {
                return None;
            }
            for _ in 0..SAMPLE_ATTEMPTS {
                let site = rng.gen_range(0..n);
                let draw = rng.gen_range(0..states);
                let target = if draw == 0 { None } else { Some(draw - 1) };
                if s.sites[site].occupation != target {
                    exchange_interstitial(s, site, target);
                    return Some(Proposal::ExchangeInter { site, target });
                }
            }
            None
        }
    }
}
