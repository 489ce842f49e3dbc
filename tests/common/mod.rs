#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use paipai::core::domain::Structure;
use paipai::io::{poscar, strfile};
use paipai::solvers::store::StateStore;

/// Deterministic RNG for everything random in the tests.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A 2 Fe + 2 Ni cubic lattice with a carbon interstitial sublattice of
/// three sites, one occupied.
pub fn sample_strfile() -> String {
    "\
Test lattice
1.0
  4.0 0.0 0.0
  0.0 4.0 0.0
  0.0 0.0 4.0

Fe Ni
2 2

C
1
3
No Shuffle
Cartesian
  0.0 0.0 0.0
  2.0 0.0 0.0
  0.0 2.0 0.0
  0.0 0.0 2.0
  1.0 1.0 1.0
  3.0 1.0 1.0
  1.0 3.0 1.0
"
    .to_string()
}

pub fn sample_structure() -> Structure {
    strfile::parse_str(&sample_strfile()).unwrap().structure
}

/// Prepares a run directory the way the binary does at startup: rendezvous
/// tree created, root SAVE/CONTCAR seeded from the sample structure.
pub fn init_run_dir(root: &Path) -> StateStore {
    let store = StateStore::new(root);
    store.prepare_tree().unwrap();
    store.seed_state(&sample_structure()).unwrap();
    store
}

/// JSON body of a successful worker report. Carries an extra field the
/// consumer must ignore.
pub fn report_json(task_id: &str, energy: f64) -> String {
    format!(
        r#"{{"status": "ok", "task_id": "{}", "energy_final": {}, "model": "mlip-v2"}}"#,
        task_id, energy
    )
}

pub fn write_report(root: &Path, name: &str, body: &str) {
    fs::write(root.join("reports").join(name), body).unwrap();
}

/// Builds a worker outbox with a parseable SAVE/CONTCAR pair. A trailing
/// marker line makes the artifacts distinguishable from the seeded root
/// state (the parser ignores lines past the declared site count).
pub fn make_outbox(root: &Path, task_id: &str) -> PathBuf {
    let structure = sample_structure();
    let dir = root.join("refine_outbox").join(task_id);
    fs::create_dir_all(&dir).unwrap();

    let mut save = poscar::render_save(&structure);
    save.push_str(&format!("outbox-marker {}\n", task_id));
    fs::write(dir.join("SAVE"), save).unwrap();

    let mut contcar = poscar::render_poscar(&structure);
    contcar.push_str(&format!("outbox-marker {}\n", task_id));
    fs::write(dir.join("CONTCAR"), contcar).unwrap();

    fs::write(
        dir.join("meta.json"),
        format!(r#"{{"task_id": "{}"}}"#, task_id),
    )
    .unwrap();
    dir
}
