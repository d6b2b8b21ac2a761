//! Mutations on an in-memory snapshot, shared by every gateway.
//!
//! These enforce the storage-side rules: unique ids, one registration per
//! (student, exam), referential checks on creation, and cascading student
//! deletes.

use shinsa_core::error::GatewayError;
use shinsa_core::model::{
    Exam, ExamPatch, Registration, RegistrationPatch, RosterSnapshot, Sensei, Student,
    StudentPatch,
};

pub(crate) fn create_sensei(
    snap: &mut RosterSnapshot,
    sensei: Sensei,
) -> Result<(), GatewayError> {
    if snap.sensei(&sensei.id).is_some() {
        return Err(GatewayError::Conflict(format!("sensei id {} exists", sensei.id)));
    }
    snap.senseis.push(sensei);
    Ok(())
}

pub(crate) fn create_student(
    snap: &mut RosterSnapshot,
    student: Student,
) -> Result<(), GatewayError> {
    if snap.student(&student.id).is_some() {
        return Err(GatewayError::Conflict(format!(
            "student id {} exists",
            student.id
        )));
    }
    snap.students.push(student);
    Ok(())
}

/// All students or none: the snapshot is untouched if any insert fails.
pub(crate) fn create_students_batch(
    snap: &mut RosterSnapshot,
    students: Vec<Student>,
) -> Result<(), GatewayError> {
    let mut staged = snap.clone();
    for student in students {
        create_student(&mut staged, student)?;
    }
    *snap = staged;
    Ok(())
}

pub(crate) fn update_student(
    snap: &mut RosterSnapshot,
    id: &str,
    patch: &StudentPatch,
) -> Result<(), GatewayError> {
    let student = snap
        .students
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| GatewayError::not_found("student", id))?;
    patch.apply_to(student);
    Ok(())
}

pub(crate) fn delete_student(snap: &mut RosterSnapshot, id: &str) -> Result<(), GatewayError> {
    let before = snap.students.len();
    snap.students.retain(|s| s.id != id);
    if snap.students.len() == before {
        return Err(GatewayError::not_found("student", id));
    }
    snap.registrations.retain(|r| r.student_id != id);
    Ok(())
}

pub(crate) fn create_exam(snap: &mut RosterSnapshot, exam: Exam) -> Result<(), GatewayError> {
    if snap.exam(&exam.id).is_some() {
        return Err(GatewayError::Conflict(format!("exam id {} exists", exam.id)));
    }
    snap.exams.push(exam);
    Ok(())
}

pub(crate) fn update_exam(
    snap: &mut RosterSnapshot,
    id: &str,
    patch: &ExamPatch,
) -> Result<(), GatewayError> {
    let exam = snap
        .exams
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| GatewayError::not_found("exam", id))?;
    patch.apply_to(exam);
    Ok(())
}

pub(crate) fn create_registration(
    snap: &mut RosterSnapshot,
    registration: Registration,
) -> Result<(), GatewayError> {
    if snap.student(&registration.student_id).is_none() {
        return Err(GatewayError::not_found("student", &registration.student_id));
    }
    if snap.exam(&registration.exam_id).is_none() {
        return Err(GatewayError::not_found("exam", &registration.exam_id));
    }
    if snap.registration(&registration.id).is_some() {
        return Err(GatewayError::Conflict(format!(
            "registration id {} exists",
            registration.id
        )));
    }
    if snap.is_enrolled(&registration.student_id, &registration.exam_id) {
        return Err(GatewayError::Conflict(format!(
            "student {} is already enrolled in exam {}",
            registration.student_id, registration.exam_id
        )));
    }
    snap.registrations.push(registration);
    Ok(())
}

pub(crate) fn update_registration(
    snap: &mut RosterSnapshot,
    id: &str,
    patch: &RegistrationPatch,
) -> Result<(), GatewayError> {
    let registration = snap
        .registrations
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| GatewayError::not_found("registration", id))?;
    patch.apply_to(registration);
    Ok(())
}

pub(crate) fn delete_registration(
    snap: &mut RosterSnapshot,
    id: &str,
) -> Result<(), GatewayError> {
    let before = snap.registrations.len();
    snap.registrations.retain(|r| r.id != id);
    if snap.registrations.len() == before {
        return Err(GatewayError::not_found("registration", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shinsa_core::Rank;

    fn seeded() -> RosterSnapshot {
        let mut snap = RosterSnapshot::default();
        create_student(&mut snap, Student::new("s1", "Ana", Rank::Branca)).unwrap();
        create_exam(
            &mut snap,
            Exam {
                id: "e1".into(),
                date: "2026-11-21".into(),
                time: String::new(),
                location: "Dojo".into(),
            },
        )
        .unwrap();
        snap
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let mut snap = seeded();
        let batch = vec![
            Student::new("s2", "Bia", Rank::Branca),
            Student::new("s1", "Duplicate", Rank::Branca),
        ];
        let err = create_students_batch(&mut snap, batch).unwrap_err();
        assert!(matches!(err, GatewayError::Conflict(_)));
        assert_eq!(snap.students.len(), 1);
    }

    #[test]
    fn duplicate_enrollment_conflicts() {
        let mut snap = seeded();
        create_registration(&mut snap, Registration::new("r1", "s1", "e1", Rank::Amarela))
            .unwrap();
        let second = Registration::new("r2", "s1", "e1", Rank::Amarela);
        let err = create_registration(&mut snap, second).unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(snap.registrations.len(), 1);
    }

    #[test]
    fn deleting_a_student_cascades() {
        let mut snap = seeded();
        create_registration(&mut snap, Registration::new("r1", "s1", "e1", Rank::Amarela))
            .unwrap();
        delete_student(&mut snap, "s1").unwrap();
        assert!(snap.students.is_empty());
        assert!(snap.registrations.is_empty());
        assert_eq!(
            delete_student(&mut snap, "s1").unwrap_err(),
            GatewayError::not_found("student", "s1")
        );
    }

    #[test]
    fn updates_need_an_existing_record() {
        let mut snap = seeded();
        let patch = ExamPatch {
            time: Some("14:00".into()),
            ..Default::default()
        };
        update_exam(&mut snap, "e1", &patch).unwrap();
        assert_eq!(snap.exam("e1").unwrap().time, "14:00");
        assert_eq!(snap.exam("e1").unwrap().date, "2026-11-21");

        assert_eq!(
            update_exam(&mut snap, "e2", &patch).unwrap_err(),
            GatewayError::not_found("exam", "e2")
        );
        assert_eq!(
            update_student(&mut snap, "s9", &StudentPatch::default()).unwrap_err(),
            GatewayError::not_found("student", "s9")
        );
    }

    #[test]
    fn registration_needs_existing_student_and_exam() {
        let mut snap = seeded();
        let orphan = Registration::new("r1", "s9", "e1", Rank::Amarela);
        let err = create_registration(&mut snap, orphan).unwrap_err();
        assert_eq!(err, GatewayError::not_found("student", "s9"));
    }
}
