//! Indexed problem model.
//!
//! [`ProblemModel`] normalizes a validated [`ProblemInput`] into
//! query-ready structure: cumulative group offsets, per-subject capacity
//! and enrollment totals, per-person preference-weight sums, and the slot
//! count that fixes the genotype layout. Everything is computed once at
//! construction; accessors are side-effect-free and the model is read-only
//! for its whole life.

use log::{debug, warn};

use crate::error::SolverError;
use crate::models::{ManagementPreferences, ProblemInput, StudentPreferences, TeacherPreferences};
use crate::validation::{validate_input, ValidationError};

/// Read-only indexed view of one timetabling instance.
#[derive(Debug, Clone)]
pub struct ProblemModel {
    input: ProblemInput,
    total_timeslots: usize,
    groups_total: usize,
    /// Prefix sums of `groups_per_subject`, length `subjects + 1`; maps a
    /// (subject, relative group) pair to an absolute group id.
    cumulative_group_offset: Vec<usize>,
    subject_total_capacity: Vec<usize>,
    subject_student_count: Vec<usize>,
    total_student_subject_slots: usize,
    student_weight_sum: Vec<f64>,
    teacher_weight_sum: Vec<f64>,
    feasible: bool,
}

impl ProblemModel {
    /// Validates the input and builds the indexed model.
    ///
    /// Structural defects (length mismatches, dangling references) are
    /// returned as the full list of validation errors. Feasibility problems
    /// are not errors here: the model is built and marked infeasible, and
    /// the evaluator refuses to work on it.
    pub fn new(input: ProblemInput) -> Result<Self, Vec<ValidationError>> {
        validate_input(&input)?;

        let constraints = &input.constraints;
        let total_timeslots: usize = constraints.timeslots_per_day.iter().sum();
        let subjects = constraints.groups_per_subject.len();
        let groups_total: usize = constraints.groups_per_subject.iter().sum();
        let rooms = constraints.rooms_unavailability_timeslots.len();

        let mut cumulative_group_offset = Vec::with_capacity(subjects + 1);
        cumulative_group_offset.push(0);
        for &count in &constraints.groups_per_subject {
            let last = cumulative_group_offset[cumulative_group_offset.len() - 1];
            cumulative_group_offset.push(last + count);
        }

        let mut subject_total_capacity = vec![0usize; subjects];
        for (subject, capacity) in subject_total_capacity.iter_mut().enumerate() {
            let start = cumulative_group_offset[subject];
            let end = cumulative_group_offset[subject + 1];
            *capacity = constraints.groups_soft_capacity[start..end].iter().sum();
        }

        let mut subject_student_count = vec![0usize; subjects];
        let mut total_student_subject_slots = 0;
        for taken in &constraints.students_subjects {
            total_student_subject_slots += taken.len();
            for &subject in taken {
                subject_student_count[subject] += 1;
            }
        }

        let student_weight_sum = constraints
            .students_subjects
            .iter()
            .enumerate()
            .map(|(student, _)| {
                input
                    .preferences
                    .students
                    .get(student)
                    .map_or(0.0, student_weight_total)
            })
            .collect();
        let teacher_weight_sum = constraints
            .teachers_groups
            .iter()
            .enumerate()
            .map(|(teacher, _)| {
                input
                    .preferences
                    .teachers
                    .get(teacher)
                    .map_or(0.0, teacher_weight_total)
            })
            .collect();

        let mut feasible = true;
        for subject in 0..subjects {
            if subject_student_count[subject] > subject_total_capacity[subject] {
                warn!(
                    "Subject {} enrollment {} exceeds total capacity {}",
                    subject, subject_student_count[subject], subject_total_capacity[subject]
                );
                feasible = false;
            }
        }
        if groups_total > total_timeslots * rooms {
            warn!(
                "Not enough room-timeslot cells: {} groups, {} cells",
                groups_total,
                total_timeslots * rooms
            );
            feasible = false;
        }

        debug!(
            "Problem indexed: {} students, {} teachers, {} subjects, {} groups, {} rooms, {} timeslots over {} days",
            constraints.students_subjects.len(),
            constraints.teachers_groups.len(),
            subjects,
            groups_total,
            rooms,
            total_timeslots,
            constraints.timeslots_per_day.len()
        );
        debug!(
            "Subject student counts: {:?}, capacities: {:?}",
            subject_student_count, subject_total_capacity
        );

        Ok(ProblemModel {
            input,
            total_timeslots,
            groups_total,
            cumulative_group_offset,
            subject_total_capacity,
            subject_student_count,
            total_student_subject_slots,
            student_weight_sum,
            teacher_weight_sum,
            feasible,
        })
    }

    // ======================== Dimensions ========================

    #[inline]
    pub fn days(&self) -> usize {
        self.input.constraints.timeslots_per_day.len()
    }

    #[inline]
    pub fn timeslots_per_day(&self) -> &[usize] {
        &self.input.constraints.timeslots_per_day
    }

    #[inline]
    pub fn total_timeslots(&self) -> usize {
        self.total_timeslots
    }

    #[inline]
    pub fn subjects(&self) -> usize {
        self.input.constraints.groups_per_subject.len()
    }

    #[inline]
    pub fn groups_per_subject(&self) -> &[usize] {
        &self.input.constraints.groups_per_subject
    }

    #[inline]
    pub fn groups_total(&self) -> usize {
        self.groups_total
    }

    #[inline]
    pub fn groups_soft_capacity(&self) -> &[usize] {
        &self.input.constraints.groups_soft_capacity
    }

    #[inline]
    pub fn rooms(&self) -> usize {
        self.input.constraints.rooms_unavailability_timeslots.len()
    }

    #[inline]
    pub fn teachers(&self) -> usize {
        self.input.constraints.teachers_groups.len()
    }

    #[inline]
    pub fn students(&self) -> usize {
        self.input.constraints.students_subjects.len()
    }

    /// The raw input this model was built from.
    #[inline]
    pub fn input(&self) -> &ProblemInput {
        &self.input
    }

    // ======================== Relations ========================

    pub fn student_subjects(&self, student: usize) -> &[usize] {
        &self.input.constraints.students_subjects[student]
    }

    pub fn teacher_groups(&self, teacher: usize) -> &[usize] {
        &self.input.constraints.teachers_groups[teacher]
    }

    pub fn room_unavailable_timeslots(&self, room: usize) -> &[usize] {
        &self.input.constraints.rooms_unavailability_timeslots[room]
    }

    pub fn is_room_unavailable(&self, room: usize, timeslot: usize) -> bool {
        self.input.constraints.rooms_unavailability_timeslots[room].contains(&timeslot)
    }

    /// Preferences of one student; `None` when the student declared none.
    pub fn student_preferences(&self, student: usize) -> Option<&StudentPreferences> {
        self.input.preferences.students.get(student)
    }

    pub fn teacher_preferences(&self, teacher: usize) -> Option<&TeacherPreferences> {
        self.input.preferences.teachers.get(teacher)
    }

    pub fn management_preferences(&self) -> &ManagementPreferences {
        &self.input.preferences.management
    }

    // ======================== Derived fields ========================

    #[inline]
    pub fn cumulative_group_offset(&self) -> &[usize] {
        &self.cumulative_group_offset
    }

    #[inline]
    pub fn subject_total_capacity(&self) -> &[usize] {
        &self.subject_total_capacity
    }

    #[inline]
    pub fn subject_student_count(&self) -> &[usize] {
        &self.subject_student_count
    }

    /// Sum over students of subjects taken; the length of the
    /// student-assignment region of a genotype.
    #[inline]
    pub fn total_student_subject_slots(&self) -> usize {
        self.total_student_subject_slots
    }

    /// Sum of every preference weight one student declared.
    #[inline]
    pub fn student_weight_sum(&self, student: usize) -> f64 {
        self.student_weight_sum[student]
    }

    #[inline]
    pub fn teacher_weight_sum(&self, teacher: usize) -> f64 {
        self.teacher_weight_sum[teacher]
    }

    /// Upfront capacity and room-timeslot feasibility verdict.
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    // ======================== Index mappings ========================

    /// Maps a flat student-subject slot and a subject-relative group choice
    /// to an absolute group id.
    ///
    /// Slot-to-subject resolution walks the per-student subject lists in
    /// student order, which is exactly the gene layout of the
    /// student-assignment region.
    pub fn absolute_group_index(
        &self,
        slot_index: usize,
        relative_group: usize,
    ) -> Result<usize, SolverError> {
        let mut remaining = slot_index;
        for taken in &self.input.constraints.students_subjects {
            if remaining < taken.len() {
                let subject = taken[remaining];
                if relative_group >= self.input.constraints.groups_per_subject[subject] {
                    return Err(SolverError::index_out_of_range(format!(
                        "relative group {} out of range for subject {} with {} groups",
                        relative_group, subject, self.input.constraints.groups_per_subject[subject]
                    )));
                }
                return Ok(self.cumulative_group_offset[subject] + relative_group);
            }
            remaining -= taken.len();
        }
        Err(SolverError::index_out_of_range(format!(
            "slot index {} out of range for {} student-subject slots",
            slot_index, self.total_student_subject_slots
        )))
    }

    /// Day owning a global timeslot id; `None` when out of range.
    pub fn day_of_timeslot(&self, timeslot: usize) -> Option<usize> {
        let mut remaining = timeslot;
        for (day, &count) in self.input.constraints.timeslots_per_day.iter().enumerate() {
            if remaining < count {
                return Some(day);
            }
            remaining -= count;
        }
        None
    }

    /// Subject owning an absolute group id; `None` when out of range.
    pub fn subject_of_group(&self, group: usize) -> Option<usize> {
        let mut remaining = group;
        for (subject, &count) in self.input.constraints.groups_per_subject.iter().enumerate() {
            if remaining < count {
                return Some(subject);
            }
            remaining -= count;
        }
        None
    }
}

/// Sum of every weight in one student's preference block: both day vectors,
/// the gaps weight, and all four preference maps.
fn student_weight_total(prefs: &StudentPreferences) -> f64 {
    prefs.free_days.iter().sum::<f64>()
        + prefs.busy_days.iter().sum::<f64>()
        + prefs.no_gaps
        + prefs.preferred_groups.values().sum::<f64>()
        + prefs.avoid_groups.values().sum::<f64>()
        + prefs.preferred_timeslots.values().sum::<f64>()
        + prefs.avoid_timeslots.values().sum::<f64>()
}

fn teacher_weight_total(prefs: &TeacherPreferences) -> f64 {
    prefs.free_days.iter().sum::<f64>()
        + prefs.busy_days.iter().sum::<f64>()
        + prefs.no_gaps
        + prefs.preferred_timeslots.values().sum::<f64>()
        + prefs.avoid_timeslots.values().sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverErrorKind;
    use crate::models::{Constraints, Preferences, StudentPreferences, TeacherPreferences};
    use crate::validation::ValidationErrorKind;

    fn sample_input() -> ProblemInput {
        // 2 subjects: subject 0 has groups 0-1, subject 1 has group 2.
        ProblemInput::new(Constraints {
            timeslots_per_day: vec![3, 3, 2],
            groups_per_subject: vec![2, 1],
            groups_soft_capacity: vec![10, 10, 15],
            students_subjects: vec![vec![0, 1], vec![1], vec![0]],
            teachers_groups: vec![vec![0, 1], vec![2]],
            rooms_unavailability_timeslots: vec![vec![5], vec![]],
        })
    }

    #[test]
    fn test_derived_fields() {
        let model = ProblemModel::new(sample_input()).unwrap();

        assert_eq!(model.days(), 3);
        assert_eq!(model.total_timeslots(), 8);
        assert_eq!(model.subjects(), 2);
        assert_eq!(model.groups_total(), 3);
        assert_eq!(model.rooms(), 2);
        assert_eq!(model.teachers(), 2);
        assert_eq!(model.students(), 3);
        assert_eq!(model.cumulative_group_offset(), &[0, 2, 3]);
        assert_eq!(model.subject_total_capacity(), &[20, 15]);
        assert_eq!(model.subject_student_count(), &[2, 2]);
        assert_eq!(model.total_student_subject_slots(), 4);
        assert!(model.is_feasible());
    }

    #[test]
    fn test_weight_sum_includes_every_preference_source() {
        let input = sample_input().with_preferences(
            Preferences::default()
                .with_student(
                    StudentPreferences::new()
                        .with_free_day(0, 1.0)
                        .with_free_day(2, 2.0)
                        .with_busy_day(1, 4.0)
                        .with_no_gaps(8.0)
                        .with_preferred_group(0, 16.0)
                        .with_avoid_group(2, 32.0)
                        .with_preferred_timeslot(3, 64.0)
                        .with_avoid_timeslot(7, 128.0),
                )
                .with_teacher(TeacherPreferences::new().with_no_gaps(5.0).with_busy_day(0, 6.0)),
        );
        let model = ProblemModel::new(input).unwrap();

        assert_eq!(model.student_weight_sum(0), 255.0);
        // Students and teachers without declared preferences weigh zero.
        assert_eq!(model.student_weight_sum(1), 0.0);
        assert_eq!(model.teacher_weight_sum(0), 11.0);
        assert_eq!(model.teacher_weight_sum(1), 0.0);
    }

    #[test]
    fn test_infeasible_when_enrollment_exceeds_capacity() {
        let mut input = sample_input();
        input.constraints.groups_soft_capacity = vec![1, 0, 1];

        let model = ProblemModel::new(input).unwrap();
        assert!(!model.is_feasible());
    }

    #[test]
    fn test_infeasible_when_groups_exceed_cells() {
        let mut input = sample_input();
        // 3 groups but a single room over 2 timeslots.
        input.constraints.timeslots_per_day = vec![2];
        input.constraints.rooms_unavailability_timeslots = vec![vec![]];

        let model = ProblemModel::new(input).unwrap();
        assert!(!model.is_feasible());
    }

    #[test]
    fn test_construction_rejects_invalid_input() {
        let mut input = sample_input();
        input.constraints.students_subjects[0].push(9);

        let errors = ProblemModel::new(input).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidSubjectReference));
    }

    #[test]
    fn test_absolute_group_index_round_trip() {
        let model = ProblemModel::new(sample_input()).unwrap();
        let offsets = model.cumulative_group_offset().to_vec();

        // Slot layout: student 0 -> subjects [0, 1], student 1 -> [1],
        // student 2 -> [0].
        let slot_subjects = [0, 1, 1, 0];
        for (slot, &subject) in slot_subjects.iter().enumerate() {
            for relative in 0..model.groups_per_subject()[subject] {
                let absolute = model.absolute_group_index(slot, relative).unwrap();
                assert!(absolute >= offsets[subject]);
                assert!(absolute < offsets[subject + 1]);
                assert_eq!(model.subject_of_group(absolute), Some(subject));
            }
        }

        assert_eq!(model.absolute_group_index(0, 1).unwrap(), 1);
        assert_eq!(model.absolute_group_index(1, 0).unwrap(), 2);
        assert_eq!(model.absolute_group_index(3, 0).unwrap(), 0);
    }

    #[test]
    fn test_absolute_group_index_errors() {
        let model = ProblemModel::new(sample_input()).unwrap();

        let err = model.absolute_group_index(4, 0).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::IndexOutOfRange);

        // Subject 1 has a single group, so relative index 1 is illegal.
        let err = model.absolute_group_index(1, 1).unwrap_err();
        assert_eq!(err.kind, SolverErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_day_of_timeslot() {
        let model = ProblemModel::new(sample_input()).unwrap();

        assert_eq!(model.day_of_timeslot(0), Some(0));
        assert_eq!(model.day_of_timeslot(2), Some(0));
        assert_eq!(model.day_of_timeslot(3), Some(1));
        assert_eq!(model.day_of_timeslot(7), Some(2));
        assert_eq!(model.day_of_timeslot(8), None);
    }

    #[test]
    fn test_subject_of_group() {
        let model = ProblemModel::new(sample_input()).unwrap();

        assert_eq!(model.subject_of_group(0), Some(0));
        assert_eq!(model.subject_of_group(1), Some(0));
        assert_eq!(model.subject_of_group(2), Some(1));
        assert_eq!(model.subject_of_group(3), None);
    }

    #[test]
    fn test_room_availability() {
        let model = ProblemModel::new(sample_input()).unwrap();

        assert!(model.is_room_unavailable(0, 5));
        assert!(!model.is_room_unavailable(0, 4));
        assert!(!model.is_room_unavailable(1, 5));
        assert_eq!(model.room_unavailable_timeslots(0), &[5]);
    }
}
