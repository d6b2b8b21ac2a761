//! JSON file gateway.
//!
//! The whole roster lives in one pretty-printed JSON document. Every
//! mutation reads the file, applies the change and writes it back under a
//! lock, so a rejected change never reaches disk.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use shinsa_core::error::GatewayError;
use shinsa_core::model::{
    Exam, ExamPatch, Registration, RegistrationPatch, RosterSnapshot, Sensei, Student,
    StudentPatch,
};
use shinsa_core::traits::{DataGateway, IdGenerator, UuidGenerator};

use crate::apply;

/// On-disk layout of the roster file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    snapshot: RosterSnapshot,
}

/// A gateway backed by a single JSON file.
pub struct JsonFileGateway {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<RosterSnapshot, GatewayError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet, starting empty", self.path.display());
                return Ok(RosterSnapshot::default());
            }
            Err(e) => {
                return Err(GatewayError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(RosterSnapshot::default());
        }
        let document: StoreDocument = serde_json::from_str(&content).map_err(|e| {
            GatewayError::Storage(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(document.snapshot)
    }

    async fn write(&self, snapshot: RosterSnapshot) -> Result<(), GatewayError> {
        let document = StoreDocument {
            saved_at: Some(Utc::now()),
            snapshot,
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| GatewayError::Storage(format!("failed to encode roster: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GatewayError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await.map_err(|e| {
            GatewayError::Storage(format!("failed to write {}: {e}", staging.display()))
        })?;
        tokio::fs::rename(&staging, &self.path).await.map_err(|e| {
            GatewayError::Storage(format!("failed to replace {}: {e}", self.path.display()))
        })
    }

    /// Read, mutate and write back while holding the lock.
    async fn mutate<F>(&self, op: F) -> Result<(), GatewayError>
    where
        F: FnOnce(&mut RosterSnapshot) -> Result<(), GatewayError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.read().await?;
        op(&mut snapshot)?;
        self.write(snapshot).await
    }
}

impl IdGenerator for JsonFileGateway {
    fn generate_id(&self) -> String {
        UuidGenerator.generate_id()
    }
}

#[async_trait]
impl DataGateway for JsonFileGateway {
    fn name(&self) -> &str {
        "json"
    }

    async fn load_all(&self) -> Result<RosterSnapshot, GatewayError> {
        let _guard = self.write_lock.lock().await;
        self.read().await
    }

    async fn create_sensei(&self, sensei: Sensei) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::create_sensei(snap, sensei)).await
    }

    async fn create_student(&self, student: Student) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::create_student(snap, student)).await
    }

    async fn create_students_batch(&self, students: Vec<Student>) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::create_students_batch(snap, students))
            .await
    }

    async fn update_student(&self, id: &str, patch: StudentPatch) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::update_student(snap, id, &patch))
            .await
    }

    async fn delete_student(&self, id: &str) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::delete_student(snap, id)).await
    }

    async fn create_exam(&self, exam: Exam) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::create_exam(snap, exam)).await
    }

    async fn update_exam(&self, id: &str, patch: ExamPatch) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::update_exam(snap, id, &patch)).await
    }

    async fn create_registration(&self, registration: Registration) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::create_registration(snap, registration))
            .await
    }

    async fn update_registration(
        &self,
        id: &str,
        patch: RegistrationPatch,
    ) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::update_registration(snap, id, &patch))
            .await
    }

    async fn delete_registration(&self, id: &str) -> Result<(), GatewayError> {
        self.mutate(|snap| apply::delete_registration(snap, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shinsa_core::scoring::ScoreField;
    use shinsa_core::Rank;

    fn exam() -> Exam {
        Exam {
            id: "e1".into(),
            date: "2026-11-21".into(),
            time: "09:00".into(),
            location: "Dojo Central".into(),
        }
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_roster() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = JsonFileGateway::new(dir.path().join("roster.json"));
        let snap = gateway.load_all().await.unwrap();
        assert_eq!(snap, RosterSnapshot::default());
    }

    #[tokio::test]
    async fn changes_survive_a_new_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("roster.json");

        let gateway = JsonFileGateway::new(&path);
        gateway
            .create_student(Student::new("s1", "Ana", Rank::Verde))
            .await
            .unwrap();
        gateway.create_exam(exam()).await.unwrap();
        let mut reg = Registration::new("r1", "s1", "e1", Rank::Roxa);
        gateway.create_registration(reg.clone()).await.unwrap();
        reg.set_score(ScoreField::Kihon, "8").unwrap();
        gateway
            .update_registration("r1", RegistrationPatch::grading(&reg))
            .await
            .unwrap();

        let reopened = JsonFileGateway::new(&path);
        let snap = reopened.load_all().await.unwrap();
        let stored = snap.registration("r1").unwrap();
        assert_eq!(stored.average(), Some(8.0));
        assert!(stored.passed());
        assert_eq!(snap.students[0].current_rank, Rank::Verde);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("saved_at"));
    }

    #[tokio::test]
    async fn student_and_exam_edits_survive_a_new_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");

        let gateway = JsonFileGateway::new(&path);
        gateway
            .create_student(Student::new("s1", "Ana", Rank::Verde))
            .await
            .unwrap();
        gateway.create_exam(exam()).await.unwrap();
        gateway
            .update_student(
                "s1",
                StudentPatch {
                    name: Some("Ana Souza".into()),
                    current_rank: Some(Rank::Roxa),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        gateway
            .update_exam(
                "e1",
                ExamPatch {
                    location: Some("Ginásio".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let snap = JsonFileGateway::new(&path).load_all().await.unwrap();
        let student = snap.student("s1").unwrap();
        assert_eq!(student.name, "Ana Souza");
        assert_eq!(student.current_rank, Rank::Roxa);
        let stored = snap.exam("e1").unwrap();
        assert_eq!(stored.location, "Ginásio");
        assert_eq!(stored.time, "09:00");

        let err = gateway
            .update_exam("e9", ExamPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::not_found("exam", "e9"));
    }

    #[tokio::test]
    async fn rejected_change_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        let gateway = JsonFileGateway::new(&path);
        gateway
            .create_student(Student::new("s1", "Ana", Rank::Verde))
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let batch = vec![
            Student::new("s2", "Bia", Rank::Branca),
            Student::new("s1", "Ana again", Rank::Branca),
        ];
        let err = gateway.create_students_batch(batch).await.unwrap_err();
        assert!(matches!(err, GatewayError::Conflict(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileGateway::new(&path).load_all().await.unwrap_err();
        assert!(matches!(err, GatewayError::Storage(_)));
    }
}
