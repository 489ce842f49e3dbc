use nalgebra::{Matrix3, Point3, Vector3};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::elements;

// --- Physics Types ---

/// A triclinic simulation cell. Vectors are stored with the scale factor
/// already applied; columns are a1, a2, a3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub vectors: Matrix3<f64>,
}

impl Cell {
    pub fn new(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self {
            vectors: Matrix3::from_columns(&[a, b, c]),
        }
    }

    /// Maps fractional coordinates onto the Cartesian frame.
    pub fn to_cartesian(&self, frac: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.vectors * frac.coords)
    }

    /// The cell vector for axis 0, 1 or 2.
    pub fn vector(&self, axis: usize) -> Vector3<f64> {
        self.vectors.column(axis).into()
    }
}

/// An ordered species inventory: atomic numbers in display order, with the
/// per-species counts kept in lockstep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesInventory {
    pub elements: Vec<u8>,
    pub counts: Vec<usize>,
}

impl SpeciesInventory {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total atom count across all species.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Symbol of species `index`, falling back to "?" for an unknown atomic
    /// number (cannot happen for inventories built by the parser).
    pub fn symbol(&self, index: usize) -> &'static str {
        self.elements
            .get(index)
            .and_then(|&z| elements::symbol(z))
            .unwrap_or("?")
    }
}

/// A substitutional lattice atom. The position is a fixed identity; only the
/// species index changes under MC moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetalAtom {
    pub position: Point3<f64>,
    pub species: usize,
}

/// An interstitial lattice site. `occupation` is `None` while the site is
/// empty, otherwise an index into the interstitial inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterSite {
    pub position: Point3<f64>,
    pub occupation: Option<usize>,
}

// --- The Core Entity ---

/// A multi-species metallic lattice with an optional interstitial sublattice.
///
/// The cell and all positions are immutable after parse; MC moves mutate only
/// the per-atom species indices, the per-site occupations and the inventory
/// counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub cell: Cell,
    pub metal: SpeciesInventory,
    pub inter: SpeciesInventory,
    pub atoms: Vec<MetalAtom>,
    pub sites: Vec<InterSite>,
}

impl Structure {
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    /// Title line used by both emitters: the metallic symbols run together,
    /// a `+` separator, then the interstitial symbols.
    pub fn title(&self) -> String {
        let mut s = String::new();
        for i in 0..self.metal.len() {
            s.push_str(self.metal.symbol(i));
        }
        s.push('+');
        for i in 0..self.inter.len() {
            s.push_str(self.inter.symbol(i));
        }
        s
    }

    /// Sequential occupation fill: the first `counts[0]` sites take species
    /// 0, the next block species 1, and so on; the remainder stays empty.
    pub fn fill_occupations(&mut self) {
        for site in &mut self.sites {
            site.occupation = None;
        }
        let mut cursor = 0;
        for (species, &count) in self.inter.counts.iter().enumerate() {
            for site in self.sites.iter_mut().skip(cursor).take(count) {
                site.occupation = Some(species);
            }
            cursor += count;
        }
    }

    /// One-shot initial randomizer, run only when the input file requests it.
    ///
    /// Ten metallic swap attempts (uniform over pairs, duplicates permitted,
    /// same-species draws do nothing), then the occupations are re-dealt:
    /// every site is cleared and each interstitial species claims its count
    /// of empty sites uniformly at random.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.atoms.len();
        if n >= 2 {
            for _ in 0..10 {
                let a = rng.gen_range(0..n);
                let b = rng.gen_range(0..n);
                if self.atoms[a].species != self.atoms[b].species {
                    let tmp = self.atoms[a].species;
                    self.atoms[a].species = self.atoms[b].species;
                    self.atoms[b].species = tmp;
                }
            }
        }

        for site in &mut self.sites {
            site.occupation = None;
        }
        for species in 0..self.inter.len() {
            let count = self.inter.counts[species];
            let empties: Vec<usize> = self
                .sites
                .iter()
                .enumerate()
                .filter(|(_, s)| s.occupation.is_none())
                .map(|(i, _)| i)
                .collect();
            for &i in empties.choose_multiple(&mut *rng, count) {
                self.sites[i].occupation = Some(species);
            }
        }
    }

    /// Verifies the bookkeeping invariants: inventory counts match the
    /// actual species assignments and every stored index is in range.
    pub fn check_invariants(&self) -> bool {
        if self.metal.total() != self.atoms.len() {
            return false;
        }

        let mut metal_counts = vec![0usize; self.metal.len()];
        for atom in &self.atoms {
            if atom.species >= metal_counts.len() {
                return false;
            }
            metal_counts[atom.species] += 1;
        }
        if metal_counts != self.metal.counts {
            return false;
        }

        let mut inter_counts = vec![0usize; self.inter.len()];
        for site in &self.sites {
            if let Some(species) = site.occupation {
                if species >= inter_counts.len() {
                    return false;
                }
                inter_counts[species] += 1;
            }
        }
        inter_counts == self.inter.counts
    }
}
