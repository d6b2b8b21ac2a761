//! Grading service.
//!
//! Ties the pure components to a [`DataGateway`]: imports are submitted as
//! one batch, score edits are persisted one field at a time, and multi-record
//! operations fan out with bounded parallelism and report partial failures.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::enrollment;
use crate::error::{GatewayError, ServiceError};
use crate::importer::{ImportOutcome, RosterImporter};
use crate::model::{
    Exam, ExamPatch, Registration, RegistrationPatch, RosterSnapshot, Sensei, Student,
    StudentPatch,
};
use crate::normalize::normalize_date;
use crate::rank::{Rank, RankOrdering};
use crate::scoring::{Grade, ScoreField};
use crate::traits::{DataGateway, IdGenerator};

/// Configuration for the grading service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum concurrent gateway requests in a batch.
    pub parallelism: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Per-record results of a fanned-out batch, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

/// One record a batch could not process.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub id: String,
    pub error: GatewayError,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Lends the gateway's id generation to the pure components.
struct GatewayIds<'a>(&'a dyn DataGateway);

impl IdGenerator for GatewayIds<'_> {
    fn generate_id(&self) -> String {
        self.0.generate_id()
    }
}

fn warn_unless_calendar_date(exam: &Exam) {
    if !exam.has_calendar_date() {
        tracing::warn!(
            "exam {} date {:?} is not a YYYY-MM-DD calendar day",
            exam.id,
            exam.date
        );
    }
}

/// The grading service.
pub struct GradingService {
    gateway: Arc<dyn DataGateway>,
    ranks: RankOrdering,
    config: ServiceConfig,
}

impl GradingService {
    pub fn new(gateway: Arc<dyn DataGateway>, ranks: RankOrdering, config: ServiceConfig) -> Self {
        Self {
            gateway,
            ranks,
            config,
        }
    }

    pub fn ranks(&self) -> &RankOrdering {
        &self.ranks
    }

    pub async fn load(&self) -> Result<RosterSnapshot, ServiceError> {
        Ok(self.gateway.load_all().await?)
    }

    /// Parse a roster against the stored senseis and submit every produced
    /// student in one all-or-nothing batch.
    pub async fn import_roster(&self, text: &str) -> Result<ImportOutcome, ServiceError> {
        let snapshot = self.gateway.load_all().await?;
        let importer = RosterImporter::new(&snapshot.senseis, &self.ranks);
        let outcome = importer.import(text, &GatewayIds(self.gateway.as_ref()));

        if !outcome.students.is_empty() {
            if let Err(e) = self
                .gateway
                .create_students_batch(outcome.students.clone())
                .await
            {
                tracing::error!("roster batch rejected by {}: {e}", self.gateway.name());
                return Err(e.into());
            }
        }
        Ok(outcome)
    }

    pub async fn add_sensei(&self, name: &str) -> Result<Sensei, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("sensei name is required".into()));
        }
        let sensei = Sensei {
            id: self.gateway.generate_id(),
            name: name.to_string(),
        };
        self.gateway.create_sensei(sensei.clone()).await?;
        Ok(sensei)
    }

    /// Create an exam. `date` may be given as `dd/mm/yy[yy]`.
    pub async fn schedule_exam(
        &self,
        date: &str,
        time: &str,
        location: &str,
    ) -> Result<Exam, ServiceError> {
        let exam = Exam {
            id: self.gateway.generate_id(),
            date: normalize_date(date),
            time: time.trim().to_string(),
            location: location.trim().to_string(),
        };
        exam.validate()?;
        warn_unless_calendar_date(&exam);
        self.gateway.create_exam(exam.clone()).await?;
        Ok(exam)
    }

    /// Edit a stored exam. A new date is normalized like on creation and the
    /// edited exam must still have a date and a location.
    pub async fn edit_exam(&self, id: &str, mut patch: ExamPatch) -> Result<Exam, ServiceError> {
        let snapshot = self.gateway.load_all().await?;
        let mut exam = snapshot
            .exam(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                kind: "exam",
                id: id.to_string(),
            })?;

        if let Some(date) = patch.date.as_mut() {
            *date = normalize_date(date.as_str());
        }
        for text in [&mut patch.time, &mut patch.location].into_iter().flatten() {
            *text = text.trim().to_string();
        }
        patch.apply_to(&mut exam);
        exam.validate()?;
        warn_unless_calendar_date(&exam);

        self.gateway.update_exam(id, patch).await?;
        Ok(exam)
    }

    /// Edit a stored student. The name cannot be blanked, a birth date is
    /// normalized and a newly assigned sensei must exist.
    pub async fn edit_student(
        &self,
        id: &str,
        mut patch: StudentPatch,
    ) -> Result<Student, ServiceError> {
        let snapshot = self.gateway.load_all().await?;
        let mut student = snapshot
            .student(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                kind: "student",
                id: id.to_string(),
            })?;

        if let Some(name) = patch.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "student name cannot be empty".into(),
                ));
            }
        }
        if let Some(birth_date) = patch.birth_date.as_mut() {
            *birth_date = normalize_date(birth_date.as_str());
        }
        if let Some(Some(sensei_id)) = &patch.sensei_id {
            if snapshot.sensei(sensei_id).is_none() {
                return Err(ServiceError::NotFound {
                    kind: "sensei",
                    id: sensei_id.clone(),
                });
            }
        }
        patch.apply_to(&mut student);

        self.gateway.update_student(id, patch).await?;
        Ok(student)
    }

    pub async fn enroll(
        &self,
        snapshot: &RosterSnapshot,
        student_id: &str,
        exam_id: &str,
        target: Option<Rank>,
    ) -> Result<Registration, ServiceError> {
        let registration = enrollment::enroll(
            snapshot,
            &self.ranks,
            student_id,
            exam_id,
            target,
            &GatewayIds(self.gateway.as_ref()),
        )?;
        self.gateway
            .create_registration(registration.clone())
            .await?;
        Ok(registration)
    }

    /// Apply operator text to one score and persist it. On any error the
    /// caller's registration is left as it was.
    pub async fn record_score(
        &self,
        registration: &mut Registration,
        field: ScoreField,
        raw: &str,
    ) -> Result<Grade, ServiceError> {
        let mut updated = registration.clone();
        let grade = updated.set_score(field, raw)?;
        self.gateway
            .update_registration(&updated.id, RegistrationPatch::grading(&updated))
            .await?;
        *registration = updated;
        Ok(grade)
    }

    /// Clear all four scores of a registration and persist it.
    pub async fn clear_scores(&self, registration: &mut Registration) -> Result<(), ServiceError> {
        let mut updated = registration.clone();
        updated.clear_scores();
        self.gateway
            .update_registration(&updated.id, RegistrationPatch::grading(&updated))
            .await?;
        *registration = updated;
        Ok(())
    }

    /// Change the rank a registration is attempting. Scores are kept.
    pub async fn retarget(
        &self,
        registration: &mut Registration,
        target: Rank,
    ) -> Result<(), ServiceError> {
        self.gateway
            .update_registration(&registration.id, RegistrationPatch::target_rank(target))
            .await?;
        registration.target_rank = target;
        Ok(())
    }

    /// Mark every registration of an exam present.
    pub async fn mark_all_present(&self, snapshot: &RosterSnapshot, exam_id: &str) -> BatchOutcome {
        let ids = snapshot
            .registrations_for_exam(exam_id)
            .map(|r| r.id.clone())
            .collect();
        self.fan_out(ids, |gateway, id| async move {
            gateway
                .update_registration(&id, RegistrationPatch::attendance(true))
                .await
        })
        .await
    }

    pub async fn delete_registrations(&self, ids: Vec<String>) -> BatchOutcome {
        self.fan_out(ids, |gateway, id| async move {
            gateway.delete_registration(&id).await
        })
        .await
    }

    /// Delete students; the gateway removes their registrations too.
    pub async fn delete_students(&self, ids: Vec<String>) -> BatchOutcome {
        self.fan_out(ids, |gateway, id| async move {
            gateway.delete_student(&id).await
        })
        .await
    }

    async fn fan_out<F, Fut>(&self, ids: Vec<String>, op: F) -> BatchOutcome
    where
        F: Fn(Arc<dyn DataGateway>, String) -> Fut,
        Fut: Future<Output = Result<(), GatewayError>>,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for (idx, id) in ids.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let request = op(Arc::clone(&self.gateway), id.clone());
            futures.push(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => request.await,
                    Err(_) => Err(GatewayError::Unavailable("batch semaphore closed".into())),
                };
                (idx, id, result)
            });
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        while let Some((idx, id, result)) = futures.next().await {
            match result {
                Ok(()) => succeeded.push((idx, id)),
                Err(error) => {
                    tracing::warn!("batch request for {id} failed: {error}");
                    failed.push((idx, BatchFailure { id, error }));
                }
            }
        }

        succeeded.sort_by_key(|(idx, _)| *idx);
        failed.sort_by_key(|(idx, _)| *idx);
        BatchOutcome {
            succeeded: succeeded.into_iter().map(|(_, id)| id).collect(),
            failed: failed.into_iter().map(|(_, f)| f).collect(),
        }
    }
}
