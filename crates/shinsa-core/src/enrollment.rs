//! Enrolling students into exams.

use crate::error::EnrollError;
use crate::model::{Registration, RosterSnapshot};
use crate::rank::{suggest_target_rank, Rank, RankOrdering};
use crate::traits::IdGenerator;

/// Build a new registration for `student_id` in `exam_id`.
///
/// Without an explicit `target`, the student attempts the rank right above
/// their current one. A student already registered in the exam is refused;
/// the store enforces the same rule for concurrent enrollments.
pub fn enroll(
    snapshot: &RosterSnapshot,
    ranks: &RankOrdering,
    student_id: &str,
    exam_id: &str,
    target: Option<Rank>,
    ids: &dyn IdGenerator,
) -> Result<Registration, EnrollError> {
    let student = snapshot
        .student(student_id)
        .ok_or_else(|| EnrollError::UnknownStudent(student_id.to_string()))?;
    if snapshot.exam(exam_id).is_none() {
        return Err(EnrollError::UnknownExam(exam_id.to_string()));
    }
    if snapshot.is_enrolled(student_id, exam_id) {
        return Err(EnrollError::AlreadyEnrolled {
            student_id: student_id.to_string(),
            exam_id: exam_id.to_string(),
        });
    }

    let target_rank = target.unwrap_or_else(|| suggest_target_rank(ranks, student.current_rank));
    Ok(Registration::new(
        ids.generate_id(),
        student_id,
        exam_id,
        target_rank,
    ))
}
