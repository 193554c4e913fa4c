//! Solver error types.
//!
//! One carrier struct with a closed kind enum, so callers can match on the
//! failure class without parsing messages. Soft constraint violations are
//! never errors: they flow into fitness penalties or get repaired.

use std::fmt;

/// Failure classes of the solver core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverErrorKind {
    /// The problem cannot be solved: enrollment exceeds subject capacity or
    /// there are more groups than (timeslot, room) cells. Checked once at
    /// model construction; not recoverable.
    InfeasibleProblem,
    /// A slot or relative-group index fell outside the gene layout.
    /// Programming error on the caller's side; never clamped.
    IndexOutOfRange,
    /// A driver operation was called before `init`. Recoverable by
    /// initializing first.
    NotInitialized,
}

/// Error carrier for solver operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverError {
    pub kind: SolverErrorKind,
    pub message: String,
}

impl SolverError {
    pub fn new(kind: SolverErrorKind, message: impl Into<String>) -> Self {
        SolverError {
            kind,
            message: message.into(),
        }
    }

    pub fn infeasible_problem(message: impl Into<String>) -> Self {
        SolverError::new(SolverErrorKind::InfeasibleProblem, message)
    }

    pub fn index_out_of_range(message: impl Into<String>) -> Self {
        SolverError::new(SolverErrorKind::IndexOutOfRange, message)
    }

    pub fn not_initialized(message: impl Into<String>) -> Self {
        SolverError::new(SolverErrorKind::NotInitialized, message)
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            SolverErrorKind::InfeasibleProblem => "infeasible problem",
            SolverErrorKind::IndexOutOfRange => "index out of range",
            SolverErrorKind::NotInitialized => "not initialized",
        };
        write!(f, "{}: {}", kind, self.message)
    }
}

impl std::error::Error for SolverError {}
