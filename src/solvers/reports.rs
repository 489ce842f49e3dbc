use std::fs;
use std::path::Path;

use anyhow::Result;
use log::warn;
use rand::Rng;
use serde::Deserialize;

use crate::engine::metropolis;
use crate::solvers::store::StateStore;
use crate::solvers::{McEvent, McState};

/// Consumer-visible fields of a worker report. Anything else in the JSON is
/// worker-internal and ignored.
#[derive(Debug, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub energy_final: Option<f64>,
}

/// Drains `reports/` and applies the Metropolis rule against the tracked
/// chain state. Every report file is deleted after handling, whatever the
/// outcome; a broken report never stops the chain.
pub struct ReportConsumer {
    temperature: f64,
}

impl ReportConsumer {
    pub fn new(temperature: f64) -> Self {
        Self { temperature }
    }

    /// Processes every report currently in `reports/` in sorted name order.
    /// Returns the number of report files handled plus the chain events
    /// they produced.
    pub fn drain<R: Rng + ?Sized>(
        &self,
        store: &StateStore,
        state: &mut McState,
        rng: &mut R,
    ) -> Result<(usize, Vec<McEvent>)> {
        let dir = store.reports_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) => {
                warn!("cannot read {}: {}", dir.display(), e);
                return Ok((0, Vec::new()));
            }
        };
        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().map_or(false, |x| x == "json"))
            .collect();
        paths.sort();

        let mut events = Vec::new();
        let mut handled = 0;
        for path in paths {
            handled += 1;
            if let Some(event) = self.consume(store, state, &mut *rng, &path) {
                events.push(event);
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!("cannot remove report {}: {}", path.display(), e);
            }
        }
        Ok((handled, events))
    }

    /// Handles one report file. `None` means the report was discarded
    /// without touching the chain.
    fn consume<R: Rng + ?Sized>(
        &self,
        store: &StateStore,
        state: &mut McState,
        rng: &mut R,
        path: &Path,
    ) -> Option<McEvent> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                warn!("unreadable report {}: {}", path.display(), e);
                return None;
            }
        };
        let report: Report = match serde_json::from_str(&text) {
            Ok(r) => r,
            Err(e) => {
                warn!("malformed report {}: {}", path.display(), e);
                return None;
            }
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let task_id = report.task_id.unwrap_or(stem);

        if report.status.as_deref() == Some("error") {
            let message = report
                .error
                .unwrap_or_else(|| "unspecified worker error".to_string());
            warn!("worker error for task {}: {}", task_id, message);
            return Some(McEvent::WorkerError { task_id, message });
        }

        let energy = match report.energy_final {
            Some(e) if e.is_finite() => e,
            other => {
                warn!("report {}: unusable energy_final {:?}", path.display(), other);
                return None;
            }
        };

        let outbox = store.outbox_dir(&task_id);

        // The first valid report seeds the chain unconditionally; it is not
        // an MC step and is not archived.
        let e_old = match state.current_energy {
            None => {
                state.current_energy = Some(energy);
                store.promote(&outbox);
                return Some(McEvent::InitialState { task_id, energy });
            }
            Some(e) => e,
        };

        state.mc_steps += 1;
        let accepted = metropolis::accept(e_old, energy, self.temperature, rng);
        let mut archive = None;
        if accepted {
            state.accept_count += 1;
            state.current_energy = Some(energy);
            store.promote(&outbox);
            match store.next_archive_index() {
                Ok(index) => {
                    if let Err(e) = store.archive(index, &outbox, &task_id, energy) {
                        warn!("archive {:06} failed: {}", index, e);
                    }
                    archive = Some(index);
                }
                Err(e) => warn!("cannot advance archive counter: {}", e),
            }
        }

        Some(McEvent::Step {
            step: state.mc_steps,
            task_id,
            e_new: energy,
            e_old,
            accepted,
            archive,
        })
    }
}
