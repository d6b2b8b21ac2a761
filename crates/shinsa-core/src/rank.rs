//! Belt ranks and their total order.
//!
//! Every component that compares or advances ranks goes through a single
//! [`RankOrdering`] value instead of indexing into its own copy of the list.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A belt grade, listed from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rank {
    Branca,
    Amarela,
    Vermelha,
    Laranja,
    Verde,
    Roxa,
    Marrom,
    Preta1Dan,
    Preta2Dan,
    Preta3Dan,
    Preta4Dan,
    Preta5Dan,
    Preta6Dan,
}

impl Rank {
    /// The canonical ladder, lowest first.
    pub const ALL: [Rank; 13] = [
        Rank::Branca,
        Rank::Amarela,
        Rank::Vermelha,
        Rank::Laranja,
        Rank::Verde,
        Rank::Roxa,
        Rank::Marrom,
        Rank::Preta1Dan,
        Rank::Preta2Dan,
        Rank::Preta3Dan,
        Rank::Preta4Dan,
        Rank::Preta5Dan,
        Rank::Preta6Dan,
    ];

    /// Display name, as it appears in roster files.
    pub fn name(self) -> &'static str {
        match self {
            Rank::Branca => "Branca",
            Rank::Amarela => "Amarela",
            Rank::Vermelha => "Vermelha",
            Rank::Laranja => "Laranja",
            Rank::Verde => "Verde",
            Rank::Roxa => "Roxa",
            Rank::Marrom => "Marrom",
            Rank::Preta1Dan => "Preta 1º Dan",
            Rank::Preta2Dan => "Preta 2º Dan",
            Rank::Preta3Dan => "Preta 3º Dan",
            Rank::Preta4Dan => "Preta 4º Dan",
            Rank::Preta5Dan => "Preta 5º Dan",
            Rank::Preta6Dan => "Preta 6º Dan",
        }
    }

    /// The lowest rank; the fallback for anything unrecognized.
    pub fn lowest() -> Rank {
        Rank::ALL[0]
    }

    /// Case-insensitive exact match against the display names.
    pub fn from_name(name: &str) -> Option<Rank> {
        let wanted = name.trim();
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Stored or imported rank names never fail to load: unknown text becomes the
// lowest rank.
impl From<String> for Rank {
    fn from(s: String) -> Self {
        Rank::from_name(&s).unwrap_or_else(Rank::lowest)
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.name().to_string()
    }
}

/// The total order over ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankOrdering {
    ladder: Vec<Rank>,
}

impl Default for RankOrdering {
    fn default() -> Self {
        Self::standard()
    }
}

impl RankOrdering {
    /// The school's canonical ladder.
    pub fn standard() -> Self {
        Self {
            ladder: Rank::ALL.to_vec(),
        }
    }

    /// Ranks from lowest to highest.
    pub fn ranks(&self) -> &[Rank] {
        &self.ladder
    }

    /// Position of `rank` in the ladder. Ranks missing from the ladder sit at
    /// the bottom.
    pub fn ordinal(&self, rank: Rank) -> usize {
        self.ladder.iter().position(|r| *r == rank).unwrap_or(0)
    }

    /// Ordinal of a textual rank name; unrecognized names map to 0.
    pub fn ordinal_of_name(&self, name: &str) -> usize {
        self.resolve(name).map(|r| self.ordinal(r)).unwrap_or(0)
    }

    pub fn compare(&self, a: Rank, b: Rank) -> Ordering {
        self.ordinal(a).cmp(&self.ordinal(b))
    }

    pub fn lowest(&self) -> Rank {
        self.ladder.first().copied().unwrap_or_else(Rank::lowest)
    }

    /// The rank one step above `rank`, capped at the top of the ladder.
    pub fn next(&self, rank: Rank) -> Rank {
        let idx = (self.ordinal(rank) + 1).min(self.ladder.len().saturating_sub(1));
        self.ladder.get(idx).copied().unwrap_or(rank)
    }

    /// Case-insensitive exact match of a rank name.
    pub fn resolve(&self, name: &str) -> Option<Rank> {
        Rank::from_name(name).filter(|r| self.ladder.contains(r))
    }

    pub fn resolve_or_lowest(&self, name: &str) -> Rank {
        self.resolve(name).unwrap_or_else(|| self.lowest())
    }
}

/// Default target rank for a student enrolling in an exam.
pub fn suggest_target_rank(ordering: &RankOrdering, current: Rank) -> Rank {
    ordering.next(current)
}
