//! Filtering and ordering over a loaded roster.
//!
//! The engine borrows a [`RosterSnapshot`] and never mutates it, so running
//! the same query twice always yields the same rows in the same order.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Exam, Registration, RosterSnapshot, Sensei, Student};
use crate::normalize::collation_key;
use crate::rank::{Rank, RankOrdering};
use crate::scoring::round2;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Keys for the grading view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationSortKey {
    #[default]
    StudentName,
    TargetRank,
    Average,
}

impl FromStr for RegistrationSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "student" | "student_name" => Ok(RegistrationSortKey::StudentName),
            "rank" | "target" | "target_rank" => Ok(RegistrationSortKey::TargetRank),
            "average" | "avg" => Ok(RegistrationSortKey::Average),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Keys for the enrollment view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentSortKey {
    #[default]
    Name,
    CurrentRank,
}

impl FromStr for StudentSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(StudentSortKey::Name),
            "rank" | "current_rank" => Ok(StudentSortKey::CurrentRank),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// A sort key plus direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: Copy + PartialEq> SortSpec<K> {
    pub fn ascending(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: K) -> Self {
        Self {
            key,
            direction: SortDirection::Descending,
        }
    }

    /// Selecting the current key flips the direction; a different key starts
    /// ascending.
    pub fn toggle(self, key: K) -> Self {
        if key == self.key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self::ascending(key)
        }
    }
}

/// Filters and ordering for the grading view. All filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationQuery {
    pub exam_id: Option<String>,
    /// Matches the registration's target rank.
    pub rank: Option<Rank>,
    /// Matches the student's sensei.
    pub sensei_id: Option<String>,
    /// Case-insensitive substring of the student name.
    pub name_contains: Option<String>,
    pub sort: SortSpec<RegistrationSortKey>,
}

/// Filters and ordering for the enrollment view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentQuery {
    pub name_contains: Option<String>,
    pub sensei_id: Option<String>,
    /// Matches the student's current rank.
    pub rank: Option<Rank>,
    /// Only students without a registration in this exam.
    pub not_enrolled_in: Option<String>,
    pub sort: SortSpec<StudentSortKey>,
}

/// A registration joined with its student and sensei.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRow {
    pub registration: Registration,
    pub student_name: String,
    pub current_rank: Rank,
    /// `None` when the student has no sensei or the reference is dangling.
    pub sensei_name: Option<String>,
}

/// A student joined with its sensei.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub student: Student,
    pub sensei_name: Option<String>,
}

/// Headline numbers for one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub exam_id: String,
    pub enrolled: usize,
    pub present: usize,
    pub graded: usize,
    pub passed: usize,
    pub failed: usize,
    /// Mean of the non-zero averages, present or not, two decimals.
    pub mean_average: Option<f64>,
}

/// Locale-aware name order: folded text first, raw text as tie-break.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

/// Read-only query engine over one snapshot.
pub struct RosterQueryEngine<'a> {
    snapshot: &'a RosterSnapshot,
    ranks: &'a RankOrdering,
}

impl<'a> RosterQueryEngine<'a> {
    pub fn new(snapshot: &'a RosterSnapshot, ranks: &'a RankOrdering) -> Self {
        Self { snapshot, ranks }
    }

    fn sensei_name(&self, student: &Student) -> Option<String> {
        student
            .sensei_id
            .as_deref()
            .and_then(|id| self.snapshot.sensei(id))
            .map(|s| s.name.clone())
    }

    /// The grading view. Registrations whose student no longer exists are
    /// left out.
    pub fn registrations(&self, query: &RegistrationQuery) -> Vec<RegistrationRow> {
        let mut rows: Vec<RegistrationRow> = self
            .snapshot
            .registrations
            .iter()
            .filter(|r| query.exam_id.as_deref().is_none_or(|id| r.exam_id == id))
            .filter(|r| query.rank.is_none_or(|rank| r.target_rank == rank))
            .filter_map(|r| {
                let student = self.snapshot.student(&r.student_id)?;
                Some((r, student))
            })
            .filter(|(_, s)| {
                query
                    .sensei_id
                    .as_deref()
                    .is_none_or(|id| s.sensei_id.as_deref() == Some(id))
            })
            .filter(|(_, s)| {
                query
                    .name_contains
                    .as_deref()
                    .is_none_or(|needle| contains_ignore_case(&s.name, needle))
            })
            .map(|(r, s)| RegistrationRow {
                registration: r.clone(),
                student_name: s.name.clone(),
                current_rank: s.current_rank,
                sensei_name: self.sensei_name(s),
            })
            .collect();

        // Vec::sort_by is stable, so equal rows keep snapshot order.
        rows.sort_by(|a, b| self.compare_registrations(a, b, query.sort));
        rows
    }

    fn compare_registrations(
        &self,
        a: &RegistrationRow,
        b: &RegistrationRow,
        sort: SortSpec<RegistrationSortKey>,
    ) -> Ordering {
        let primary = match sort.key {
            RegistrationSortKey::StudentName => {
                return sort
                    .direction
                    .apply(compare_names(&a.student_name, &b.student_name));
            }
            RegistrationSortKey::TargetRank => sort.direction.apply(
                self.ranks
                    .compare(a.registration.target_rank, b.registration.target_rank),
            ),
            // Ungraded rows go last whichever way present averages run.
            RegistrationSortKey::Average => {
                match (a.registration.average(), b.registration.average()) {
                    (Some(x), Some(y)) => sort.direction.apply(x.total_cmp(&y)),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        };
        primary.then_with(|| compare_names(&a.student_name, &b.student_name))
    }

    /// The enrollment view.
    pub fn students(&self, query: &StudentQuery) -> Vec<StudentRow> {
        let mut rows: Vec<StudentRow> = self
            .snapshot
            .students
            .iter()
            .filter(|s| {
                query
                    .name_contains
                    .as_deref()
                    .is_none_or(|needle| contains_ignore_case(&s.name, needle))
            })
            .filter(|s| {
                query
                    .sensei_id
                    .as_deref()
                    .is_none_or(|id| s.sensei_id.as_deref() == Some(id))
            })
            .filter(|s| query.rank.is_none_or(|rank| s.current_rank == rank))
            .filter(|s| {
                query
                    .not_enrolled_in
                    .as_deref()
                    .is_none_or(|exam_id| !self.snapshot.is_enrolled(&s.id, exam_id))
            })
            .map(|s| StudentRow {
                student: s.clone(),
                sensei_name: self.sensei_name(s),
            })
            .collect();

        let sort = query.sort;
        rows.sort_by(|a, b| match sort.key {
            StudentSortKey::Name => sort
                .direction
                .apply(compare_names(&a.student.name, &b.student.name)),
            StudentSortKey::CurrentRank => sort
                .direction
                .apply(
                    self.ranks
                        .compare(a.student.current_rank, b.student.current_rank),
                )
                .then_with(|| compare_names(&a.student.name, &b.student.name)),
        });
        rows
    }

    /// Senseis in name order.
    pub fn senseis(&self) -> Vec<&'a Sensei> {
        let mut senseis: Vec<&Sensei> = self.snapshot.senseis.iter().collect();
        senseis.sort_by(|a, b| compare_names(&a.name, &b.name));
        senseis
    }

    /// Exams in date, then time, order.
    pub fn exams(&self) -> Vec<&'a Exam> {
        let mut exams: Vec<&Exam> = self.snapshot.exams.iter().collect();
        exams.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        exams
    }

    /// Counts for one exam, ignoring registrations of deleted students.
    pub fn summarize_exam(&self, exam_id: &str) -> ExamSummary {
        let regs: Vec<&Registration> = self
            .snapshot
            .registrations_for_exam(exam_id)
            .filter(|r| self.snapshot.student(&r.student_id).is_some())
            .collect();
        let graded: Vec<&Registration> = regs.iter().copied().filter(|r| r.is_graded()).collect();
        let passed = graded.iter().filter(|r| r.passed()).count();
        let mean_average = if graded.is_empty() {
            None
        } else {
            let total: f64 = graded.iter().filter_map(|r| r.average()).sum();
            Some(round2(total / graded.len() as f64))
        };

        ExamSummary {
            exam_id: exam_id.to_string(),
            enrolled: regs.len(),
            present: regs.iter().filter(|r| r.is_present()).count(),
            graded: graded.len(),
            passed,
            failed: graded.len() - passed,
            mean_average,
        }
    }
}
