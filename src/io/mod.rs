//! Job transport boundary.
//!
//! [`JobSource`] and [`ProgressSink`] separate the solver from wherever
//! jobs come from and results go to. The file-based implementations are the
//! shipped transport; a queue transport would plug in behind the same
//! traits.

use std::fmt::Debug;

use anyhow::Result;

use crate::models::{Job, Progress, Solution};

mod file;

pub use file::{FileJobSource, FileProgressSink};

/// Hands out jobs and answers cancellation polls.
pub trait JobSource: Send + Sync + Debug {
    /// Next job, or `None` once the source is drained.
    fn receive(&mut self) -> Result<Option<Job>>;

    /// Polled between outer iterations, never mid-pass.
    fn is_cancelled(&self, job_id: &str) -> bool;
}

/// Receives per-iteration progress and the final result.
pub trait ProgressSink: Send + Sync + Debug {
    fn send_progress(&mut self, progress: &Progress) -> Result<()>;

    fn send_result(&mut self, job_id: &str, solution: &Solution) -> Result<()>;
}
