pub mod dispatch;
pub mod mc;
pub mod reports;
pub mod store;

/// Chain state threaded through the driver. Single writer, no locks: the
/// coordinator is one thread and the workers only ever see the files the
/// `StateStore` publishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct McState {
    /// Energy of the accepted state; `None` until the first report seeds
    /// the chain.
    pub current_energy: Option<f64>,
    pub mc_steps: u64,
    pub accept_count: u64,
}

/// Events produced by the report consumer for the driver to record.
#[derive(Debug, Clone)]
pub enum McEvent {
    /// First valid report, adopted unconditionally; not an MC step.
    InitialState { task_id: String, energy: f64 },

    /// One accept-or-reject decision of the chain.
    Step {
        step: u64,
        task_id: String,
        e_new: f64,
        e_old: f64,
        accepted: bool,
        /// Archive index allocated when the step was accepted.
        archive: Option<u64>,
    },

    /// A worker reported failure; the chain is unaffected.
    WorkerError { task_id: String, message: String },
}
