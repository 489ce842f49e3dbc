use std::fs;

use anyhow::{Context, Result};
use log::{debug, warn};
use rand::Rng;

use crate::engine::moves::{self, MoveWeights};
use crate::io::{poscar, strfile};
use crate::solvers::store::StateStore;

/// Keeps K fast worker slots fed with candidate structures.
///
/// Slot `k` is busy while the sentinel `fast/.go_<k>` exists; the sentinel
/// is created here and removed by the worker once it has consumed the
/// candidate, so existence alone is the signal and the contents never
/// matter.
pub struct Dispatcher {
    slots: usize,
    weights: MoveWeights,
}

impl Dispatcher {
    pub fn new(slots: usize, weights: MoveWeights) -> Self {
        Self { slots, weights }
    }

    /// One scheduling pass over the slots in ascending order. Every free
    /// slot receives a fresh candidate derived from the current accepted
    /// state; busy slots are skipped, never waited on. Returns the number
    /// of slots fed.
    pub fn tick<R: Rng + ?Sized>(&self, store: &StateStore, rng: &mut R) -> Result<usize> {
        let fast = store.fast_dir();
        let mut fed = 0;

        for k in 1..=self.slots {
            let sentinel = fast.join(format!(".go_{}", k));
            if sentinel.exists() {
                continue;
            }

            // 1. Reload the accepted state into the scratch structure.
            let mut scratch = strfile::load(&store.save_path(), &mut *rng)
                .with_context(|| format!("reloading {}", store.save_path().display()))?;

            // 2. Pick a move kind, then operands that satisfy its
            //    precondition.
            let kind = self.weights.sample(&mut *rng);
            let proposal = match moves::propose(&mut scratch, kind, &mut *rng) {
                Some(p) => p,
                None => {
                    warn!("slot {}: no viable operands for {}", k, kind);
                    continue;
                }
            };

            // 3. Deposit the candidate, then arm the slot. Direct writes are
            //    fine here: the worker reads only after the sentinel appears.
            poscar::write_poscar(&scratch, &fast.join(format!("POSCAR{}", k)))?;
            poscar::write_save(&scratch, &fast.join(format!("SAVE{}", k)))?;
            fs::write(&sentinel, "")
                .with_context(|| format!("creating sentinel {}", sentinel.display()))?;

            debug!("slot {}: dispatched {}", k, proposal);
            fed += 1;
        }
        Ok(fed)
    }
}
