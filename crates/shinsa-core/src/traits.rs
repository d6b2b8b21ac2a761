//! Core trait definitions for persistence and id generation.
//!
//! The data gateway is implemented by the `shinsa-store` crate. Every call
//! reports failure as a [`GatewayError`] value; nothing panics across this
//! boundary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::model::{
    Exam, ExamPatch, Registration, RegistrationPatch, RosterSnapshot, Sensei, Student,
    StudentPatch,
};

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// Source of globally-unique opaque record ids.
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> String;
}

/// Random UUID v4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

// ---------------------------------------------------------------------------
// Data gateway trait
// ---------------------------------------------------------------------------

/// The persistence boundary.
///
/// Implementations must reject a second registration for the same
/// (student, exam) pair with [`GatewayError::Conflict`], and deleting a
/// student must delete its registrations.
#[async_trait]
pub trait DataGateway: IdGenerator {
    /// Human-readable backend name (e.g. "json").
    fn name(&self) -> &str;

    /// Load every collection.
    async fn load_all(&self) -> Result<RosterSnapshot, GatewayError>;

    async fn create_sensei(&self, sensei: Sensei) -> Result<(), GatewayError>;

    async fn create_student(&self, student: Student) -> Result<(), GatewayError>;

    /// Store all students or none of them.
    async fn create_students_batch(&self, students: Vec<Student>) -> Result<(), GatewayError>;

    async fn update_student(&self, id: &str, patch: StudentPatch) -> Result<(), GatewayError>;

    /// Delete a student and its registrations.
    async fn delete_student(&self, id: &str) -> Result<(), GatewayError>;

    async fn create_exam(&self, exam: Exam) -> Result<(), GatewayError>;

    async fn update_exam(&self, id: &str, patch: ExamPatch) -> Result<(), GatewayError>;

    async fn create_registration(&self, registration: Registration) -> Result<(), GatewayError>;

    async fn update_registration(
        &self,
        id: &str,
        patch: RegistrationPatch,
    ) -> Result<(), GatewayError>;

    async fn delete_registration(&self, id: &str) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        let ids = UuidGenerator;
        let a = ids.generate_id();
        let b = ids.generate_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
