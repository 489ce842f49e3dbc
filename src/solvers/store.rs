use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;

use crate::core::domain::Structure;
use crate::io::poscar;

/// Rendezvous directories shared with the worker pool. Only `fast/` is
/// coordinator-written; the rest exist so workers find them on first launch.
const WORKER_DIRS: [&str; 5] = [
    "fast",
    "reports",
    "refine_outbox",
    "waiting_pool",
    "waiting_work",
];

/// Owns every observable filesystem write of the coordinator: the root
/// SAVE/CONTCAR pair, the archive counter and the `mcprocess/` history.
///
/// State files that external readers may race against go through
/// write-then-rename so a partial write is never visible.
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fast_dir(&self) -> PathBuf {
        self.root.join("fast")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    pub fn outbox_dir(&self, task_id: &str) -> PathBuf {
        self.root.join("refine_outbox").join(task_id)
    }

    pub fn save_path(&self) -> PathBuf {
        self.root.join("SAVE")
    }

    pub fn contcar_path(&self) -> PathBuf {
        self.root.join("CONTCAR")
    }

    fn counter_path(&self) -> PathBuf {
        self.root.join("counters").join("mc_count")
    }

    /// Creates the on-disk rendezvous tree. Safe on an existing run
    /// directory.
    pub fn prepare_tree(&self) -> Result<()> {
        for dir in WORKER_DIRS {
            fs::create_dir_all(self.root.join(dir))
                .with_context(|| format!("creating {}", dir))?;
        }
        fs::create_dir_all(self.root.join("counters"))
            .context("creating counters")?;
        fs::create_dir_all(self.root.join("mcprocess"))
            .context("creating mcprocess")?;
        Ok(())
    }

    /// Writes `contents` so the file becomes externally visible only once
    /// complete: write to a sibling temp path, then rename over the target.
    pub fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming into {}", path.display()))?;
        Ok(())
    }

    /// Seeds the root state pair from a freshly parsed structure so workers
    /// see an initial state before any report has arrived.
    pub fn seed_state(&self, structure: &Structure) -> Result<()> {
        self.write_atomic(&self.save_path(), &poscar::render_save(structure))?;
        self.write_atomic(&self.contcar_path(), &poscar::render_poscar(structure))?;
        Ok(())
    }

    /// Copies the accepted state out of a worker outbox over the root pair.
    /// A missing artifact downgrades to a warning: the in-memory energy has
    /// already moved on and the stale file stays in place.
    pub fn promote(&self, outbox: &Path) {
        for name in ["SAVE", "CONTCAR"] {
            let src = outbox.join(name);
            if let Err(e) = fs::copy(&src, self.root.join(name)) {
                warn!("cannot promote {}: {}", src.display(), e);
            }
        }
    }

    /// Allocates the next archive index: reads `counters/mc_count`,
    /// increments and rewrites it. A missing or corrupt counter restarts
    /// the sequence rather than aborting the chain.
    pub fn next_archive_index(&self) -> Result<u64> {
        let path = self.counter_path();
        let last = match fs::read_to_string(&path) {
            Ok(text) => match text.trim().parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    warn!("corrupt archive counter {:?}, restarting at 0", text.trim());
                    0
                }
            },
            Err(_) => 0,
        };
        let next = last + 1;
        self.write_atomic(&path, &format!("{}\n", next))?;
        Ok(next)
    }

    /// Stores an accepted state under `mcprocess/<NNNNNN>/`: the outbox
    /// artifacts plus a small info record.
    pub fn archive(&self, index: u64, outbox: &Path, task_id: &str, energy: f64) -> Result<PathBuf> {
        let dir = self.root.join("mcprocess").join(format!("{:06}", index));
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        for name in ["CONTCAR", "SAVE", "meta.json"] {
            let src = outbox.join(name);
            if let Err(e) = fs::copy(&src, dir.join(name)) {
                warn!("archive {:06}: cannot copy {}: {}", index, src.display(), e);
            }
        }
        let info = format!("task_id = {}\nE_final = {:.11e}\n", task_id, energy);
        fs::write(dir.join("info.txt"), info)
            .with_context(|| format!("writing info.txt under {}", dir.display()))?;
        Ok(dir)
    }
}
