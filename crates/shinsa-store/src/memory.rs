//! In-memory gateway.
//!
//! Useful for tests and for dry runs: it enforces the same storage rules as
//! the JSON store and can be told to fail specific operations.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use shinsa_core::error::GatewayError;
use shinsa_core::model::{
    Exam, ExamPatch, Registration, RegistrationPatch, RosterSnapshot, Sensei, Student,
    StudentPatch,
};
use shinsa_core::traits::{DataGateway, IdGenerator, UuidGenerator};

use crate::apply;

/// Gateway operations, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadAll,
    CreateSensei,
    CreateStudent,
    CreateStudentsBatch,
    UpdateStudent,
    DeleteStudent,
    CreateExam,
    UpdateExam,
    CreateRegistration,
    UpdateRegistration,
    DeleteRegistration,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    operation: Operation,
    /// Only fail for this record id; `None` fails every call.
    id: Option<String>,
    error: GatewayError,
}

/// A gateway that keeps the roster in memory.
pub struct MemoryGateway {
    snapshot: Mutex<RosterSnapshot>,
    failures: Mutex<Vec<InjectedFailure>>,
    call_count: AtomicU32,
    next_id: Option<AtomicU32>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new(RosterSnapshot::default())
    }
}

impl MemoryGateway {
    /// Start from an existing snapshot.
    pub fn new(snapshot: RosterSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            failures: Mutex::new(Vec::new()),
            call_count: AtomicU32::new(0),
            next_id: None,
        }
    }

    /// Hand out `id-1`, `id-2`, … instead of UUIDs.
    pub fn with_sequential_ids(mut self) -> Self {
        self.next_id = Some(AtomicU32::new(0));
        self
    }

    /// Make every call of `operation` fail with `error`.
    pub fn fail_operation(&self, operation: Operation, error: GatewayError) {
        self.push_failure(operation, None, error);
    }

    /// Make calls of `operation` on record `id` fail with `error`.
    pub fn fail_record(&self, operation: Operation, id: &str, error: GatewayError) {
        self.push_failure(operation, Some(id.to_string()), error);
    }

    fn push_failure(&self, operation: Operation, id: Option<String>, error: GatewayError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(InjectedFailure {
                operation,
                id,
                error,
            });
        }
    }

    /// Number of gateway calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RosterSnapshot>, GatewayError> {
        self.snapshot
            .lock()
            .map_err(|_| GatewayError::Storage("memory store lock poisoned".into()))
    }

    fn begin(&self, operation: Operation, id: Option<&str>) -> Result<(), GatewayError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        let failures = self
            .failures
            .lock()
            .map_err(|_| GatewayError::Storage("memory store lock poisoned".into()))?;
        let injected = failures.iter().find(|f| {
            f.operation == operation && (f.id.is_none() || f.id.as_deref() == id)
        });
        match injected {
            Some(f) => Err(f.error.clone()),
            None => Ok(()),
        }
    }
}

impl IdGenerator for MemoryGateway {
    fn generate_id(&self) -> String {
        match &self.next_id {
            Some(counter) => format!("id-{}", counter.fetch_add(1, Ordering::Relaxed) + 1),
            None => UuidGenerator.generate_id(),
        }
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_all(&self) -> Result<RosterSnapshot, GatewayError> {
        self.begin(Operation::LoadAll, None)?;
        Ok(self.lock()?.clone())
    }

    async fn create_sensei(&self, sensei: Sensei) -> Result<(), GatewayError> {
        self.begin(Operation::CreateSensei, Some(&sensei.id))?;
        apply::create_sensei(&mut *self.lock()?, sensei)
    }

    async fn create_student(&self, student: Student) -> Result<(), GatewayError> {
        self.begin(Operation::CreateStudent, Some(&student.id))?;
        apply::create_student(&mut *self.lock()?, student)
    }

    async fn create_students_batch(&self, students: Vec<Student>) -> Result<(), GatewayError> {
        self.begin(Operation::CreateStudentsBatch, None)?;
        apply::create_students_batch(&mut *self.lock()?, students)
    }

    async fn update_student(&self, id: &str, patch: StudentPatch) -> Result<(), GatewayError> {
        self.begin(Operation::UpdateStudent, Some(id))?;
        apply::update_student(&mut *self.lock()?, id, &patch)
    }

    async fn delete_student(&self, id: &str) -> Result<(), GatewayError> {
        self.begin(Operation::DeleteStudent, Some(id))?;
        apply::delete_student(&mut *self.lock()?, id)
    }

    async fn create_exam(&self, exam: Exam) -> Result<(), GatewayError> {
        self.begin(Operation::CreateExam, Some(&exam.id))?;
        apply::create_exam(&mut *self.lock()?, exam)
    }

    async fn update_exam(&self, id: &str, patch: ExamPatch) -> Result<(), GatewayError> {
        self.begin(Operation::UpdateExam, Some(id))?;
        apply::update_exam(&mut *self.lock()?, id, &patch)
    }

    async fn create_registration(&self, registration: Registration) -> Result<(), GatewayError> {
        self.begin(Operation::CreateRegistration, Some(&registration.id))?;
        apply::create_registration(&mut *self.lock()?, registration)
    }

    async fn update_registration(
        &self,
        id: &str,
        patch: RegistrationPatch,
    ) -> Result<(), GatewayError> {
        self.begin(Operation::UpdateRegistration, Some(id))?;
        apply::update_registration(&mut *self.lock()?, id, &patch)
    }

    async fn delete_registration(&self, id: &str) -> Result<(), GatewayError> {
        self.begin(Operation::DeleteRegistration, Some(id))?;
        apply::delete_registration(&mut *self.lock()?, id)
    }
}
