//! Timetabling wire models.
//!
//! Serde-derived shapes exchanged with the surrounding job infrastructure:
//! the constraint/preference input, the solution report, and the job and
//! progress envelopes. Field names follow the upstream JSON format and are
//! load-bearing; preference blocks are optional on input and default to
//! empty.

mod job;
mod problem;
mod solution;

pub use job::{Job, Progress};
pub use problem::{
    Constraints, ManagementPreferences, OverflowAllowance, Preferences, ProblemInput,
    RoomTimeslotPreference, StudentPreferences, TeacherPreferences,
};
pub use solution::Solution;
