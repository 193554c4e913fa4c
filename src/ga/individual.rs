//! Candidate-solution representation.

/// One candidate timetable: a fixed-length integer genotype plus a cached
/// fitness.
///
/// The cached fitness is valid only immediately after an evaluation; any
/// genotype mutation invalidates it until the next evaluate call. A search
/// driver exclusively owns the individuals in its population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Individual {
    pub genotype: Vec<usize>,
    pub fitness: f64,
}

impl Individual {
    pub fn new() -> Self {
        Individual::default()
    }
}
