//! Structural input validation.
//!
//! Checks referential integrity of a [`ProblemInput`] before the indexed
//! model is built. Detects:
//! - Length mismatches between parallel arrays
//! - Out-of-range subject, group, room, and timeslot references
//! - Duplicate enrollments and teaching assignments
//!
//! Feasibility (enough capacity, enough room-timeslot cells) is not checked
//! here; that is a property of the indexed model, not of input shape.

use crate::models::ProblemInput;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two parallel arrays disagree about a dimension.
    LengthMismatch,
    /// A student enrollment names a subject that doesn't exist.
    InvalidSubjectReference,
    /// A teaching assignment or preference names a group that doesn't exist.
    InvalidGroupReference,
    /// A management preference names a room that doesn't exist.
    InvalidRoomReference,
    /// An unavailability entry or preference names a timeslot that doesn't
    /// exist.
    InvalidTimeslotReference,
    /// The same subject or group appears twice in one person's list.
    DuplicateReference,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a problem input.
///
/// Checks:
/// 1. `groups_soft_capacity` covers exactly the total group count
/// 2. Student subject lists reference existing subjects, without duplicates
/// 3. Teacher group lists reference existing groups, without duplicates
/// 4. Room unavailability entries reference existing timeslots
/// 5. Preference blocks do not outnumber the people they describe
/// 6. Day-indexed preference weights fit the week length
/// 7. Preference maps reference existing groups and timeslots
/// 8. Management room-timeslot preferences reference existing cells
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(input: &ProblemInput) -> ValidationResult {
    let mut errors = Vec::new();

    let constraints = &input.constraints;
    let days = constraints.timeslots_per_day.len();
    let total_timeslots: usize = constraints.timeslots_per_day.iter().sum();
    let subjects = constraints.groups_per_subject.len();
    let groups_total: usize = constraints.groups_per_subject.iter().sum();
    let rooms = constraints.rooms_unavailability_timeslots.len();

    if constraints.groups_soft_capacity.len() != groups_total {
        errors.push(ValidationError::new(
            ValidationErrorKind::LengthMismatch,
            format!(
                "groups_soft_capacity has {} entries but groups_per_subject sums to {}",
                constraints.groups_soft_capacity.len(),
                groups_total
            ),
        ));
    }

    for (student, taken) in constraints.students_subjects.iter().enumerate() {
        for (position, &subject) in taken.iter().enumerate() {
            if subject >= subjects {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidSubjectReference,
                    format!("Student {student} references unknown subject {subject}"),
                ));
            }
            if taken[..position].contains(&subject) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateReference,
                    format!("Student {student} lists subject {subject} twice"),
                ));
            }
        }
    }

    for (teacher, taught) in constraints.teachers_groups.iter().enumerate() {
        for (position, &group) in taught.iter().enumerate() {
            if group >= groups_total {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidGroupReference,
                    format!("Teacher {teacher} references unknown group {group}"),
                ));
            }
            if taught[..position].contains(&group) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateReference,
                    format!("Teacher {teacher} lists group {group} twice"),
                ));
            }
        }
    }

    for (room, unavailable) in constraints.rooms_unavailability_timeslots.iter().enumerate() {
        for &timeslot in unavailable {
            if timeslot >= total_timeslots {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTimeslotReference,
                    format!("Room {room} unavailability references unknown timeslot {timeslot}"),
                ));
            }
        }
    }

    let preferences = &input.preferences;
    if preferences.students.len() > constraints.students_subjects.len() {
        errors.push(ValidationError::new(
            ValidationErrorKind::LengthMismatch,
            format!(
                "{} student preference blocks for {} students",
                preferences.students.len(),
                constraints.students_subjects.len()
            ),
        ));
    }
    if preferences.teachers.len() > constraints.teachers_groups.len() {
        errors.push(ValidationError::new(
            ValidationErrorKind::LengthMismatch,
            format!(
                "{} teacher preference blocks for {} teachers",
                preferences.teachers.len(),
                constraints.teachers_groups.len()
            ),
        ));
    }

    for (student, prefs) in preferences.students.iter().enumerate() {
        let who = format!("Student {student}");
        check_day_vector(&mut errors, &who, "free_days", &prefs.free_days, days);
        check_day_vector(&mut errors, &who, "busy_days", &prefs.busy_days, days);
        check_group_keys(&mut errors, &who, prefs.preferred_groups.keys(), groups_total);
        check_group_keys(&mut errors, &who, prefs.avoid_groups.keys(), groups_total);
        check_timeslot_keys(
            &mut errors,
            &who,
            prefs.preferred_timeslots.keys(),
            total_timeslots,
        );
        check_timeslot_keys(
            &mut errors,
            &who,
            prefs.avoid_timeslots.keys(),
            total_timeslots,
        );
    }

    for (teacher, prefs) in preferences.teachers.iter().enumerate() {
        let who = format!("Teacher {teacher}");
        check_day_vector(&mut errors, &who, "free_days", &prefs.free_days, days);
        check_day_vector(&mut errors, &who, "busy_days", &prefs.busy_days, days);
        check_timeslot_keys(
            &mut errors,
            &who,
            prefs.preferred_timeslots.keys(),
            total_timeslots,
        );
        check_timeslot_keys(
            &mut errors,
            &who,
            prefs.avoid_timeslots.keys(),
            total_timeslots,
        );
    }

    let management = &preferences.management;
    for pref in management
        .preferred_room_timeslots
        .iter()
        .chain(management.avoid_room_timeslots.iter())
    {
        if pref.room >= rooms {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRoomReference,
                format!("Management preference references unknown room {}", pref.room),
            ));
        }
        if pref.timeslot >= total_timeslots {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeslotReference,
                format!(
                    "Management preference references unknown timeslot {}",
                    pref.timeslot
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_day_vector(
    errors: &mut Vec<ValidationError>,
    who: &str,
    field: &str,
    weights: &[f64],
    days: usize,
) {
    if weights.len() > days {
        errors.push(ValidationError::new(
            ValidationErrorKind::LengthMismatch,
            format!(
                "{who} {field} covers {} days but the week has {days}",
                weights.len()
            ),
        ));
    }
}

fn check_group_keys<'a>(
    errors: &mut Vec<ValidationError>,
    who: &str,
    keys: impl Iterator<Item = &'a usize>,
    groups_total: usize,
) {
    for &group in keys {
        if group >= groups_total {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidGroupReference,
                format!("{who} preference references unknown group {group}"),
            ));
        }
    }
}

fn check_timeslot_keys<'a>(
    errors: &mut Vec<ValidationError>,
    who: &str,
    keys: impl Iterator<Item = &'a usize>,
    total_timeslots: usize,
) {
    for &timeslot in keys {
        if timeslot >= total_timeslots {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeslotReference,
                format!("{who} preference references unknown timeslot {timeslot}"),
            ));
        }
    }
}
