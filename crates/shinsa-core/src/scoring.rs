//! Exam score averaging and pass/fail.
//!
//! Only scores strictly above zero count toward the average, so a test that
//! has not been graded yet (unset or zero) never drags a student down.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Minimum average needed to pass an exam.
pub const PASSING_AVERAGE: f64 = 6.0;

/// Highest score a single test can receive.
pub const MAX_SCORE: f64 = 10.0;

/// The four graded parts of a promotion exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreField {
    Kihon,
    Kata1,
    Kata2,
    Kumite,
}

impl ScoreField {
    pub const ALL: [ScoreField; 4] = [
        ScoreField::Kihon,
        ScoreField::Kata1,
        ScoreField::Kata2,
        ScoreField::Kumite,
    ];
}

impl fmt::Display for ScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreField::Kihon => write!(f, "kihon"),
            ScoreField::Kata1 => write!(f, "kata1"),
            ScoreField::Kata2 => write!(f, "kata2"),
            ScoreField::Kumite => write!(f, "kumite"),
        }
    }
}

impl FromStr for ScoreField {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kihon" => Ok(ScoreField::Kihon),
            "kata1" => Ok(ScoreField::Kata1),
            "kata2" => Ok(ScoreField::Kata2),
            "kumite" => Ok(ScoreField::Kumite),
            other => Err(ScoreError::UnknownField(other.to_string())),
        }
    }
}

/// A single score edit: a new value, or clearing the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreInput {
    Value(f64),
    Clear,
}

impl ScoreInput {
    /// Parse operator text. Empty text clears the field; anything that is not
    /// a finite number in `[0, 10]` is rejected.
    pub fn parse(raw: &str) -> Result<Self, ScoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(ScoreInput::Clear);
        }
        let value: f64 = trimmed
            .parse()
            .map_err(|_| ScoreError::NotNumeric(trimmed.to_string()))?;
        Self::value(value)
    }

    pub fn value(value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() || !(0.0..=MAX_SCORE).contains(&value) {
            return Err(ScoreError::OutOfRange(value));
        }
        Ok(ScoreInput::Value(value))
    }
}

/// Raw per-test scores of one registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TestScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kihon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kata1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kata2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kumite: Option<f64>,
}

impl TestScores {
    pub fn get(&self, field: ScoreField) -> Option<f64> {
        match field {
            ScoreField::Kihon => self.kihon,
            ScoreField::Kata1 => self.kata1,
            ScoreField::Kata2 => self.kata2,
            ScoreField::Kumite => self.kumite,
        }
    }

    fn slot(&mut self, field: ScoreField) -> &mut Option<f64> {
        match field {
            ScoreField::Kihon => &mut self.kihon,
            ScoreField::Kata1 => &mut self.kata1,
            ScoreField::Kata2 => &mut self.kata2,
            ScoreField::Kumite => &mut self.kumite,
        }
    }

    /// Copy of these scores with one field updated.
    pub fn with(mut self, field: ScoreField, input: ScoreInput) -> Self {
        *self.slot(field) = match input {
            ScoreInput::Value(v) => Some(v),
            ScoreInput::Clear => None,
        };
        self
    }

    /// True when no field holds a value at all.
    pub fn is_blank(&self) -> bool {
        ScoreField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Scores that count toward the average (strictly positive).
    pub fn counted(&self) -> Vec<f64> {
        ScoreField::ALL
            .iter()
            .filter_map(|f| self.get(*f))
            .filter(|v| *v > 0.0)
            .collect()
    }
}

/// Derived outcome of a set of scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub average: f64,
    pub pass: bool,
}

/// Compute the average (two decimals) and pass/fail of a score set.
pub fn grade(scores: &TestScores) -> Grade {
    let counted = scores.counted();
    let average = if counted.is_empty() {
        0.0
    } else {
        round2(counted.iter().sum::<f64>() / counted.len() as f64)
    };
    Grade {
        average,
        pass: average >= PASSING_AVERAGE,
    }
}

/// Apply one field update and grade the result.
pub fn apply_update(
    scores: &TestScores,
    field: ScoreField,
    input: ScoreInput,
) -> (TestScores, Grade) {
    let updated = scores.with(field, input);
    let graded = grade(&updated);
    (updated, graded)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
