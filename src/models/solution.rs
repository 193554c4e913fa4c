//! Solution report shape.

use serde::{Deserialize, Serialize};

/// Best timetable found for a job, in the upstream reporting format.
///
/// `by_student` and `by_group` are decoded views of the genotype:
/// per student the absolute group id chosen for each subject (in that
/// student's subject order), and per group its `[timeslot, room]` placement
/// in group-id order. The sector fitness fields carry the decomposed
/// preference satisfaction behind the scalar `fitness`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub genotype: Vec<usize>,
    pub fitness: f64,
    pub by_student: Vec<Vec<usize>>,
    pub by_group: Vec<[usize; 2]>,
    pub student_fitnesses: Vec<f64>,
    pub teacher_fitnesses: Vec<f64>,
    pub management_fitness: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_group_placements_as_pairs() {
        let solution = Solution {
            genotype: vec![0, 0, 1, 0, 2, 0],
            fitness: 0.5,
            by_student: vec![vec![0], vec![1]],
            by_group: vec![[1, 0], [2, 0]],
            student_fitnesses: vec![0.5, 0.5],
            teacher_fitnesses: vec![],
            management_fitness: 0.0,
        };

        let value = serde_json::to_value(&solution).unwrap();
        assert_eq!(value["by_group"][0][0], 1);
        assert_eq!(value["by_group"][0][1], 0);
        assert_eq!(value["by_student"][1][0], 1);
        assert_eq!(value["fitness"], 0.5);
    }

    #[test]
    fn test_round_trip() {
        let solution = Solution {
            genotype: vec![0, 1, 2],
            fitness: -1.25,
            by_student: vec![vec![0, 1]],
            by_group: vec![[0, 0]],
            student_fitnesses: vec![0.0],
            teacher_fitnesses: vec![1.0],
            management_fitness: -2.0,
        };

        let encoded = serde_json::to_string(&solution).unwrap();
        let decoded: Solution = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, solution);
    }
}
