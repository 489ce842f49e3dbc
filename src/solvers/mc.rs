use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::engine::moves::MoveWeights;
use crate::solvers::dispatch::Dispatcher;
use crate::solvers::reports::ReportConsumer;
use crate::solvers::store::StateStore;
use crate::solvers::{McEvent, McState};

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct McParams {
    pub steps: u64,
    pub temperature: f64,
    pub workers: usize,
    pub weights: MoveWeights,
}

/// Final chain statistics.
#[derive(Debug, Clone, Copy)]
pub struct McSummary {
    pub mc_steps: u64,
    pub accept_count: u64,
    pub final_energy: Option<f64>,
}

/// Backoff for a tick that processed no report, so an idle chain does not
/// busy-loop on the report directory.
const IDLE_SLEEP: Duration = Duration::from_millis(100);

/// Human-readable event log: one timestamped line per chain event,
/// append-mode so interrupted runs keep their history.
struct Logbook {
    file: File,
}

impl Logbook {
    fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        Ok(Self { file })
    }

    fn log(&mut self, line: &str) -> Result<()> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "[{}] {}", stamp, line)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TraceRow<'a> {
    step: u64,
    task_id: &'a str,
    e_new: f64,
    e_current: f64,
    accepted: bool,
}

/// Single-threaded, tick-driven MC coordinator: alternates feeding the fast
/// slots and draining worker reports until the step budget is exhausted.
///
/// In-flight candidates are not resynchronized when the accepted state
/// advances: a proposal generated from an older SAVE is still judged against
/// the energy current at consumption time. This trades strict detailed
/// balance for worker throughput.
pub struct McDriver {
    params: McParams,
    store: StateStore,
    dispatcher: Dispatcher,
    consumer: ReportConsumer,
    state: McState,
    rng: ChaCha8Rng,
    logbook: Logbook,
    trace: csv::Writer<File>,
}

impl McDriver {
    pub fn new(params: McParams, store: StateStore, rng: ChaCha8Rng) -> Result<Self> {
        let logbook = Logbook::open(&store.root().join("mc.log"))?;
        let trace_path = store.root().join("mc_trace.csv");
        let trace_file = File::create(&trace_path)
            .with_context(|| format!("creating {}", trace_path.display()))?;
        let trace = csv::Writer::from_writer(trace_file);
        let dispatcher = Dispatcher::new(params.workers, params.weights);
        let consumer = ReportConsumer::new(params.temperature);
        Ok(Self {
            params,
            store,
            dispatcher,
            consumer,
            state: McState::default(),
            rng,
            logbook,
            trace,
        })
    }

    pub fn state(&self) -> &McState {
        &self.state
    }

    /// Runs the chain until `mc_steps` reaches the step budget.
    pub fn run(&mut self) -> Result<McSummary> {
        self.logbook.log(&format!(
            "RUN_START steps={} temp={} workers={}",
            self.params.steps, self.params.temperature, self.params.workers
        ))?;

        while self.state.mc_steps < self.params.steps {
            self.dispatcher.tick(&self.store, &mut self.rng)?;
            let (handled, events) =
                self.consumer
                    .drain(&self.store, &mut self.state, &mut self.rng)?;
            for event in events {
                self.record(&event)?;
            }
            if handled == 0 {
                thread::sleep(IDLE_SLEEP);
            }
        }

        let summary = McSummary {
            mc_steps: self.state.mc_steps,
            accept_count: self.state.accept_count,
            final_energy: self.state.current_energy,
        };
        let ratio = if summary.mc_steps > 0 {
            summary.accept_count as f64 / summary.mc_steps as f64
        } else {
            0.0
        };
        self.logbook.log(&format!(
            "RUN_END steps={} accepted={} ratio={:.3}",
            summary.mc_steps, summary.accept_count, ratio
        ))?;
        self.trace.flush()?;
        Ok(summary)
    }

    fn record(&mut self, event: &McEvent) -> Result<()> {
        match event {
            McEvent::InitialState { task_id, energy } => {
                info!("initial state adopted from task {} at E={}", task_id, energy);
                self.logbook
                    .log(&format!("INITIAL_STATE task={} E={:.11e}", task_id, energy))?;
            }
            McEvent::Step {
                step,
                task_id,
                e_new,
                e_old,
                accepted,
                archive,
            } => {
                let verdict = if *accepted { "ACCEPT" } else { "REJECT" };
                let mut line = format!(
                    "STEP {} task={} E_new={:.11e} E_old={:.11e} {}",
                    step, task_id, e_new, e_old, verdict
                );
                if let Some(index) = archive {
                    line.push_str(&format!(" archive={:06}", index));
                }
                self.logbook.log(&line)?;

                self.trace.serialize(TraceRow {
                    step: *step,
                    task_id,
                    e_new: *e_new,
                    e_current: self.state.current_energy.unwrap_or(*e_old),
                    accepted: *accepted,
                })?;
                self.trace.flush()?;
            }
            McEvent::WorkerError { task_id, message } => {
                self.logbook
                    .log(&format!("WORKER_ERROR task={} msg={}", task_id, message))?;
            }
        }
        Ok(())
    }
}
