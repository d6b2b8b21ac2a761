//! Core data model types for shinsa.
//!
//! Senseis, students, exams and registrations, plus the partial-update
//! patches the data gateway applies to them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ExamError, ScoreError};
use crate::rank::Rank;
use crate::scoring::{self, Grade, ScoreField, ScoreInput, TestScores};

/// An instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensei {
    pub id: String,
    pub name: String,
}

/// Sex as recorded on the student file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "Other", alias = "O")]
    Other,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "M"),
            Sex::Female => write!(f, "F"),
            Sex::Other => write!(f, "Other"),
        }
    }
}

/// A student on the dojo roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// National id (CPF), kept as typed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// ISO `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    pub current_rank: Rank,
    /// Soft reference to a [`Sensei`]; dangling ids display as unassigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensei_id: Option<String>,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>, current_rank: Rank) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cpf: None,
            sex: None,
            birth_date: None,
            current_rank,
            sensei_id: None,
        }
    }
}

/// A scheduled promotion exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    /// Usually ISO `YYYY-MM-DD`; any non-empty text is kept.
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub location: String,
}

impl Exam {
    /// Date and location must be non-empty. The date is otherwise free text.
    pub fn validate(&self) -> Result<(), ExamError> {
        if self.date.trim().is_empty() {
            return Err(ExamError::MissingDate);
        }
        if self.location.trim().is_empty() {
            return Err(ExamError::MissingLocation);
        }
        Ok(())
    }

    /// Whether the date is a real `YYYY-MM-DD` calendar day.
    pub fn has_calendar_date(&self) -> bool {
        chrono::NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").is_ok()
    }
}

/// One student's attempt at a target rank in one exam.
///
/// `average` and `pass` are derived from the scores on every change and on
/// load; there is no way to set them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RegistrationRecord")]
pub struct Registration {
    pub id: String,
    pub student_id: String,
    pub exam_id: String,
    pub target_rank: Rank,
    #[serde(flatten)]
    scores: TestScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present: Option<bool>,
}

/// Wire shape of a stored registration. Any stored average or pass flag is
/// ignored and recomputed.
#[derive(Deserialize)]
struct RegistrationRecord {
    id: String,
    student_id: String,
    exam_id: String,
    target_rank: Rank,
    #[serde(flatten)]
    scores: TestScores,
    #[serde(default)]
    present: Option<bool>,
}

impl From<RegistrationRecord> for Registration {
    fn from(record: RegistrationRecord) -> Self {
        let mut registration = Registration {
            id: record.id,
            student_id: record.student_id,
            exam_id: record.exam_id,
            target_rank: record.target_rank,
            scores: record.scores,
            average: None,
            pass: None,
            present: record.present,
        };
        registration.regrade();
        registration
    }
}

impl Registration {
    pub fn new(
        id: impl Into<String>,
        student_id: impl Into<String>,
        exam_id: impl Into<String>,
        target_rank: Rank,
    ) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            exam_id: exam_id.into(),
            target_rank,
            scores: TestScores::default(),
            average: None,
            pass: None,
            present: None,
        }
    }

    pub fn scores(&self) -> &TestScores {
        &self.scores
    }

    pub fn average(&self) -> Option<f64> {
        self.average
    }

    pub fn passed(&self) -> bool {
        self.pass.unwrap_or(false)
    }

    pub fn is_present(&self) -> bool {
        self.present.unwrap_or(false)
    }

    /// At least one test has a score that counts.
    pub fn is_graded(&self) -> bool {
        self.average.is_some_and(|avg| avg > 0.0)
    }

    /// Apply an already-parsed score edit.
    pub fn apply_score(&mut self, field: ScoreField, input: ScoreInput) -> Grade {
        let (scores, grade) = scoring::apply_update(&self.scores, field, input);
        self.scores = scores;
        self.regrade();
        grade
    }

    /// Apply operator text to one field. Rejected text leaves the
    /// registration untouched.
    pub fn set_score(&mut self, field: ScoreField, raw: &str) -> Result<Grade, ScoreError> {
        let input = ScoreInput::parse(raw)?;
        Ok(self.apply_score(field, input))
    }

    /// Reset all four scores together with the derived average and pass.
    pub fn clear_scores(&mut self) {
        self.scores = TestScores::default();
        self.average = None;
        self.pass = None;
    }

    fn replace_scores(&mut self, scores: TestScores) {
        self.scores = scores;
        self.regrade();
    }

    fn regrade(&mut self) {
        if self.scores.is_blank() {
            self.average = None;
            self.pass = None;
        } else {
            let grade = scoring::grade(&self.scores);
            self.average = Some(grade.average);
            self.pass = Some(grade.pass);
        }
    }
}

/// Partial update of a student. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rank: Option<Rank>,
    /// `Some(None)` unassigns the sensei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensei_id: Option<Option<String>>,
}

impl StudentPatch {
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(name) = &self.name {
            student.name = name.clone();
        }
        if let Some(cpf) = &self.cpf {
            student.cpf = Some(cpf.clone());
        }
        if let Some(sex) = self.sex {
            student.sex = Some(sex);
        }
        if let Some(birth_date) = &self.birth_date {
            student.birth_date = Some(birth_date.clone());
        }
        if let Some(rank) = self.current_rank {
            student.current_rank = rank;
        }
        if let Some(sensei_id) = &self.sensei_id {
            student.sensei_id = sensei_id.clone();
        }
    }
}

/// Partial update of an exam.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ExamPatch {
    pub fn apply_to(&self, exam: &mut Exam) {
        if let Some(date) = &self.date {
            exam.date = date.clone();
        }
        if let Some(time) = &self.time {
            exam.time = time.clone();
        }
        if let Some(location) = &self.location {
            exam.location = location.clone();
        }
    }
}

/// Partial update of a registration.
///
/// Scores can only travel as a complete set taken from a registration, so the
/// store re-derives average and pass instead of trusting the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scores: Option<TestScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    present: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_rank: Option<Rank>,
}

impl RegistrationPatch {
    /// Carry the current scores of `registration`.
    pub fn grading(registration: &Registration) -> Self {
        Self {
            scores: Some(registration.scores),
            ..Self::default()
        }
    }

    pub fn attendance(present: bool) -> Self {
        Self {
            present: Some(present),
            ..Self::default()
        }
    }

    pub fn target_rank(rank: Rank) -> Self {
        Self {
            target_rank: Some(rank),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, registration: &mut Registration) {
        if let Some(scores) = self.scores {
            registration.replace_scores(scores);
        }
        if let Some(present) = self.present {
            registration.present = Some(present);
        }
        if let Some(rank) = self.target_rank {
            registration.target_rank = rank;
        }
    }
}

/// Everything the gateway holds, loaded into memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    #[serde(default)]
    pub senseis: Vec<Sensei>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub registrations: Vec<Registration>,
}

impl RosterSnapshot {
    pub fn sensei(&self, id: &str) -> Option<&Sensei> {
        self.senseis.iter().find(|s| s.id == id)
    }

    /// Case-insensitive, trimmed exact match on sensei name.
    pub fn sensei_by_name(&self, name: &str) -> Option<&Sensei> {
        find_sensei_by_name(&self.senseis, name)
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn exam(&self, id: &str) -> Option<&Exam> {
        self.exams.iter().find(|e| e.id == id)
    }

    pub fn registration(&self, id: &str) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.id == id)
    }

    pub fn registrations_for_exam<'a>(
        &'a self,
        exam_id: &'a str,
    ) -> impl Iterator<Item = &'a Registration> + 'a {
        self.registrations.iter().filter(move |r| r.exam_id == exam_id)
    }

    pub fn is_enrolled(&self, student_id: &str, exam_id: &str) -> bool {
        self.registrations
            .iter()
            .any(|r| r.student_id == student_id && r.exam_id == exam_id)
    }
}

pub(crate) fn find_sensei_by_name<'a>(senseis: &'a [Sensei], name: &str) -> Option<&'a Sensei> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    senseis
        .iter()
        .find(|s| s.name.trim().to_lowercase() == wanted)
}
