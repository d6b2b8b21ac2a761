//! End-to-end tests of the grading service over the in-memory store.
//!
//! These cover the store interactions the CLI cannot easily provoke:
//! rejected batches, partial fan-out failures and refused score edits.

use std::sync::Arc;

use shinsa_core::error::{ExamError, GatewayError, ServiceError};
use shinsa_core::model::{
    Exam, ExamPatch, Registration, RosterSnapshot, Sensei, Student, StudentPatch,
};
use shinsa_core::query::{RegistrationQuery, RegistrationSortKey, RosterQueryEngine, SortSpec};
use shinsa_core::scoring::ScoreField;
use shinsa_core::service::{GradingService, ServiceConfig};
use shinsa_core::{Rank, RankOrdering};
use shinsa_store::{MemoryGateway, Operation};

const ROSTER: &str = "Name,CPF,Sex,BirthDate,Rank,Sensei\n\
                      Ana,1,F,01/02/2010,Verde,Miyagi\n\
                      Bia,2,F,03/04/2011,Amarela,\n";

fn seeded() -> RosterSnapshot {
    let mut ana = Student::new("s1", "Ana", Rank::Verde);
    ana.sensei_id = Some("k1".into());
    RosterSnapshot {
        senseis: vec![Sensei {
            id: "k1".into(),
            name: "Miyagi".into(),
        }],
        students: vec![
            ana,
            Student::new("s2", "Bia", Rank::Amarela),
            Student::new("s3", "Caio", Rank::Branca),
        ],
        exams: vec![Exam {
            id: "e1".into(),
            date: "2026-11-21".into(),
            time: "09:00".into(),
            location: "Dojo".into(),
        }],
        registrations: vec![
            Registration::new("r1", "s1", "e1", Rank::Roxa),
            Registration::new("r2", "s2", "e1", Rank::Vermelha),
            Registration::new("r3", "s3", "e1", Rank::Amarela),
        ],
    }
}

fn service(gateway: Arc<MemoryGateway>) -> GradingService {
    GradingService::new(
        gateway,
        RankOrdering::standard(),
        ServiceConfig { parallelism: 2 },
    )
}

#[tokio::test]
async fn import_stores_students_with_sensei() {
    let gateway = Arc::new(MemoryGateway::default().with_sequential_ids());
    let service = service(gateway.clone());
    service.add_sensei("Miyagi").await.unwrap();

    let outcome = service.import_roster(ROSTER).await.unwrap();
    assert_eq!(outcome.students.len(), 2);
    assert_eq!(outcome.skipped, 0);
    assert!(outcome.warnings.is_empty());

    let snap = gateway.snapshot();
    assert_eq!(snap.students.len(), 2);
    assert_eq!(snap.students[0].sensei_id.as_deref(), Some("id-1"));
    assert_eq!(snap.students[0].birth_date.as_deref(), Some("2010-02-01"));
    assert_eq!(snap.students[1].sensei_id, None);
}

#[tokio::test]
async fn rejected_import_stores_nothing() {
    let gateway = Arc::new(MemoryGateway::default());
    gateway.fail_operation(
        Operation::CreateStudentsBatch,
        GatewayError::Unavailable("offline".into()),
    );
    let service = service(gateway.clone());

    let err = service.import_roster(ROSTER).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Gateway(GatewayError::Unavailable(_))
    ));
    assert!(gateway.snapshot().students.is_empty());
}

#[tokio::test]
async fn mark_all_present_reports_partial_failures() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    gateway.fail_record(
        Operation::UpdateRegistration,
        "r2",
        GatewayError::Storage("disk full".into()),
    );
    let service = service(gateway.clone());
    let snap = service.load().await.unwrap();

    let outcome = service.mark_all_present(&snap, "e1").await;
    assert_eq!(outcome.succeeded, vec!["r1".to_string(), "r3".to_string()]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].id, "r2");
    assert!(!outcome.is_complete());

    let after = gateway.snapshot();
    assert!(after.registration("r1").unwrap().is_present());
    assert!(!after.registration("r2").unwrap().is_present());
    assert!(after.registration("r3").unwrap().is_present());
}

#[tokio::test]
async fn deleting_students_cascades_and_reports_missing() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());

    let outcome = service
        .delete_students(vec!["s1".into(), "ghost".into()])
        .await;
    assert_eq!(outcome.succeeded, vec!["s1".to_string()]);
    assert_eq!(
        outcome.failed[0].error,
        GatewayError::not_found("student", "ghost")
    );

    let snap = gateway.snapshot();
    assert!(snap.registration("r1").is_none());
    assert_eq!(snap.registrations.len(), 2);
}

#[tokio::test]
async fn delete_registrations_in_request_order() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());

    let outcome = service
        .delete_registrations(vec!["r3".into(), "r1".into()])
        .await;
    assert!(outcome.is_complete());
    assert_eq!(outcome.succeeded, vec!["r3".to_string(), "r1".to_string()]);
    assert_eq!(gateway.snapshot().registrations.len(), 1);
}

#[tokio::test]
async fn score_edits_persist_and_regrade() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());
    let snap = service.load().await.unwrap();
    let mut reg = snap.registration("r1").unwrap().clone();

    service
        .record_score(&mut reg, ScoreField::Kihon, "7")
        .await
        .unwrap();
    let grade = service
        .record_score(&mut reg, ScoreField::Kata1, "8")
        .await
        .unwrap();
    assert_eq!(grade.average, 7.5);
    assert!(grade.pass);

    let err = service
        .record_score(&mut reg, ScoreField::Kumite, "abc")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Score(_)));
    assert_eq!(reg.scores().kumite, None);

    let stored = gateway.snapshot();
    let stored = stored.registration("r1").unwrap();
    assert_eq!(stored.average(), Some(7.5));
    assert!(stored.passed());

    service.clear_scores(&mut reg).await.unwrap();
    assert_eq!(gateway.snapshot().registration("r1").unwrap().average(), None);
}

#[tokio::test]
async fn failed_score_write_keeps_local_copy() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    gateway.fail_operation(
        Operation::UpdateRegistration,
        GatewayError::Unavailable("offline".into()),
    );
    let service = service(gateway.clone());
    let mut reg = service.load().await.unwrap().registration("r1").unwrap().clone();

    assert!(service
        .record_score(&mut reg, ScoreField::Kihon, "9")
        .await
        .is_err());
    assert_eq!(reg.scores().kihon, None);
    assert_eq!(reg.average(), None);
}

#[tokio::test]
async fn duplicate_enrollment_is_refused() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());
    let snap = service.load().await.unwrap();

    let err = service.enroll(&snap, "s1", "e1", None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Enroll(_)));

    // A stale snapshot still cannot double-enroll: the store refuses it.
    let mut stale = snap.clone();
    stale.registrations.clear();
    let err = service.enroll(&stale, "s1", "e1", None).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Gateway(GatewayError::Conflict(_))
    ));
    assert_eq!(gateway.snapshot().registrations.len(), 3);
}

#[tokio::test]
async fn graded_view_sorts_after_scoring() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());
    let snap = service.load().await.unwrap();

    let mut bia = snap.registration("r2").unwrap().clone();
    service
        .record_score(&mut bia, ScoreField::Kihon, "9")
        .await
        .unwrap();
    let mut ana = snap.registration("r1").unwrap().clone();
    service
        .record_score(&mut ana, ScoreField::Kihon, "5")
        .await
        .unwrap();

    let snap = service.load().await.unwrap();
    let engine = RosterQueryEngine::new(&snap, service.ranks());
    let rows = engine.registrations(&RegistrationQuery {
        sort: SortSpec::descending(RegistrationSortKey::Average),
        ..Default::default()
    });
    let names: Vec<&str> = rows.iter().map(|r| r.student_name.as_str()).collect();
    assert_eq!(names, vec!["Bia", "Ana", "Caio"]);
    assert_eq!(rows[1].sensei_name.as_deref(), Some("Miyagi"));
    assert!(!rows[1].registration.passed());
}

#[tokio::test]
async fn exam_edits_normalize_and_keep_free_text_dates() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());

    let exam = service
        .edit_exam(
            "e1",
            ExamPatch {
                date: Some("5/12/26".into()),
                location: Some("  Ginásio  ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(exam.date, "2026-12-05");
    assert_eq!(exam.location, "Ginásio");
    assert_eq!(gateway.snapshot().exam("e1").unwrap(), &exam);

    let exam = service
        .edit_exam(
            "e1",
            ExamPatch {
                date: Some("first Saturday of December".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(exam.date, "first Saturday of December");

    let err = service
        .edit_exam(
            "e1",
            ExamPatch {
                location: Some(" ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Exam(ExamError::MissingLocation)));
    assert_eq!(gateway.snapshot().exam("e1").unwrap().location, "Ginásio");

    let err = service
        .edit_exam("e9", ExamPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { kind: "exam", .. }));
}

#[tokio::test]
async fn student_edits_are_checked_before_storing() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());

    let student = service
        .edit_student(
            "s2",
            StudentPatch {
                name: Some(" Bia Rocha ".into()),
                birth_date: Some("03/04/11".into()),
                sensei_id: Some(Some("k1".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(student.name, "Bia Rocha");
    assert_eq!(student.birth_date.as_deref(), Some("2011-04-03"));
    assert_eq!(
        gateway.snapshot().student("s2").unwrap().sensei_id.as_deref(),
        Some("k1")
    );

    let err = service
        .edit_student(
            "s2",
            StudentPatch {
                sensei_id: Some(Some("k9".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { kind: "sensei", .. }));

    let err = service
        .edit_student(
            "s2",
            StudentPatch {
                name: Some("   ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(gateway.snapshot().student("s2").unwrap().name, "Bia Rocha");

    let err = service
        .edit_student("ghost", StudentPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { kind: "student", .. }));
}

#[tokio::test]
async fn retarget_keeps_scores() {
    let gateway = Arc::new(MemoryGateway::new(seeded()));
    let service = service(gateway.clone());
    let mut reg = service.load().await.unwrap().registration("r1").unwrap().clone();
    service
        .record_score(&mut reg, ScoreField::Kihon, "8")
        .await
        .unwrap();

    service.retarget(&mut reg, Rank::Marrom).await.unwrap();
    assert_eq!(reg.target_rank, Rank::Marrom);

    let snap = gateway.snapshot();
    let stored = snap.registration("r1").unwrap();
    assert_eq!(stored.target_rank, Rank::Marrom);
    assert_eq!(stored.average(), Some(8.0));
}
