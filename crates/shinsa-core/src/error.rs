//! Error types for the grading core.
//!
//! `GatewayError` is returned by every persistence call and carries the
//! boundary's message verbatim so the operator sees what the store reported.
//! The other enums describe updates the core itself refuses.

use thiserror::Error;

/// Failures reported by a [`DataGateway`](crate::traits::DataGateway).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A uniqueness constraint was violated (duplicate id or enrollment).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// The store is not reachable at the moment.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        GatewayError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns `true` if repeating the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            GatewayError::NotFound { .. } | GatewayError::Conflict(_)
        )
    }
}

/// A score edit that was refused; the registration is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("score is not a number: {0:?}")]
    NotNumeric(String),

    #[error("score {0} is outside 0-10")]
    OutOfRange(f64),

    #[error("unknown score field: {0} (expected kihon, kata1, kata2 or kumite)")]
    UnknownField(String),
}

/// Reasons an enrollment is refused before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollError {
    #[error("student not found: {0}")]
    UnknownStudent(String),

    #[error("exam not found: {0}")]
    UnknownExam(String),

    #[error("student {student_id} is already enrolled in exam {exam_id}")]
    AlreadyEnrolled { student_id: String, exam_id: String },
}

/// Exam fields that fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    #[error("exam date is required")]
    MissingDate,

    #[error("exam location is required")]
    MissingLocation,
}

/// Errors surfaced by [`GradingService`](crate::service::GradingService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Enroll(#[from] EnrollError),

    #[error(transparent)]
    Exam(#[from] ExamError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
