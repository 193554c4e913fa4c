//! Job and progress envelopes.

use serde::{Deserialize, Serialize};

use super::{ProblemInput, Solution};

/// One unit of work handed to the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    /// Wall-clock budget in seconds for the whole job.
    #[serde(default = "default_max_execution_time")]
    pub max_execution_time: u64,
    pub problem_data: ProblemInput,
}

impl Job {
    pub fn new(job_id: impl Into<String>, problem_data: ProblemInput) -> Self {
        Job {
            job_id: job_id.into(),
            max_execution_time: default_max_execution_time(),
            problem_data,
        }
    }

    pub fn with_max_execution_time(mut self, seconds: u64) -> Self {
        self.max_execution_time = seconds;
        self
    }
}

fn default_max_execution_time() -> u64 {
    300
}

/// Intermediate best-so-far report emitted once per iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub job_id: String,
    pub iteration: usize,
    pub best_solution: Solution,
}

impl Progress {
    pub fn new(job_id: impl Into<String>, iteration: usize, best_solution: Solution) -> Self {
        Progress {
            job_id: job_id.into(),
            iteration,
            best_solution,
        }
    }
}
