//! Delimited roster importer.
//!
//! Turns an uploaded roster (comma- or semicolon-separated, one header line)
//! into student records. Rows are never fatal: a row either produces a
//! student or is counted as skipped.

use crate::model::{find_sensei_by_name, Sensei, Student};
use crate::normalize::{normalize_date, normalize_rank, normalize_sex};
use crate::rank::RankOrdering;
use crate::traits::IdGenerator;

/// Result of importing one roster text.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Students in file order, each with a fresh id.
    pub students: Vec<Student>,
    /// Data rows dropped because their name column was empty.
    pub skipped: usize,
    /// Values that were replaced by defaults.
    pub warnings: Vec<ImportWarning>,
}

/// A value in an imported row that fell back to a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    /// 1-based line number in the source text (the header is line 1).
    pub line: usize,
    pub message: String,
}

/// Where each field sits in a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// `Name, CPF, Sex, BirthDate, Rank, Sensei`
    Standard,
    /// `Name, Sensei, CPF, Sex, BirthDate, Rank`
    SenseiFirst,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    cpf: usize,
    sex: usize,
    birth_date: usize,
    rank: usize,
    sensei: usize,
}

impl ColumnLayout {
    fn columns(self) -> Columns {
        match self {
            ColumnLayout::Standard => Columns {
                cpf: 1,
                sex: 2,
                birth_date: 3,
                rank: 4,
                sensei: 5,
            },
            ColumnLayout::SenseiFirst => Columns {
                sensei: 1,
                cpf: 2,
                sex: 3,
                birth_date: 4,
                rank: 5,
            },
        }
    }
}

/// A layout considered for one row, with how well the row fits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutCandidate {
    pub layout: ColumnLayout,
    pub score: u8,
}

/// Score both layouts for a row. The standard layout always fits; the
/// sensei-first layout only fits when column 1 is exactly a known sensei
/// name, and then it outranks the standard one.
pub fn layout_candidates(fields: &[String], senseis: &[Sensei]) -> [LayoutCandidate; 2] {
    let column_one = fields.get(1).map(String::as_str).unwrap_or("");
    let shifted_score = if find_sensei_by_name(senseis, column_one).is_some() {
        2
    } else {
        0
    };
    [
        LayoutCandidate {
            layout: ColumnLayout::Standard,
            score: 1,
        },
        LayoutCandidate {
            layout: ColumnLayout::SenseiFirst,
            score: shifted_score,
        },
    ]
}

/// Pick the best-fitting layout for a row.
pub fn detect_layout(fields: &[String], senseis: &[Sensei]) -> ColumnLayout {
    layout_candidates(fields, senseis)
        .into_iter()
        .max_by_key(|c| c.score)
        .map(|c| c.layout)
        .unwrap_or(ColumnLayout::Standard)
}

/// `;` when the line contains one, `,` otherwise.
pub fn detect_delimiter(line: &str) -> char {
    if line.contains(';') {
        ';'
    } else {
        ','
    }
}

/// Split a line into cleaned fields.
///
/// A double quote toggles quoted mode, in which the delimiter is literal.
/// Quote characters are dropped. There is no escaped-quote support.
pub fn split_fields(line: &str) -> Vec<String> {
    let delimiter = detect_delimiter(line);
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            fields.push(clean_field(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    fields.push(clean_field(&current));
    fields
}

/// Trim and drop one leading and one trailing quote character.
fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix(['"', '\'']).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(['"', '\'']).unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// Imports roster text against the currently known senseis.
pub struct RosterImporter<'a> {
    senseis: &'a [Sensei],
    ranks: &'a RankOrdering,
}

enum RowOutcome {
    Student(Student, Vec<String>),
    Skipped,
}

impl<'a> RosterImporter<'a> {
    pub fn new(senseis: &'a [Sensei], ranks: &'a RankOrdering) -> Self {
        Self { senseis, ranks }
    }

    /// Parse `text`, discarding its first line as a header.
    pub fn import(&self, text: &str, ids: &dyn IdGenerator) -> ImportOutcome {
        let mut outcome = ImportOutcome::default();

        for (idx, line) in text.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            match self.parse_row(line, ids) {
                RowOutcome::Student(student, notes) => {
                    outcome
                        .warnings
                        .extend(notes.into_iter().map(|message| ImportWarning {
                            line: line_no,
                            message,
                        }));
                    outcome.students.push(student);
                }
                RowOutcome::Skipped => {
                    tracing::debug!(line = line_no, "skipping roster row with empty name");
                    outcome.skipped += 1;
                }
            }
        }

        tracing::info!(
            imported = outcome.students.len(),
            skipped = outcome.skipped,
            warnings = outcome.warnings.len(),
            "parsed roster"
        );
        outcome
    }

    fn parse_row(&self, line: &str, ids: &dyn IdGenerator) -> RowOutcome {
        let fields = split_fields(line);
        let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");

        let name = field(0);
        if name.is_empty() {
            return RowOutcome::Skipped;
        }

        let layout = detect_layout(&fields, self.senseis);
        let cols = layout.columns();
        let mut notes = Vec::new();

        let sensei_name = field(cols.sensei);
        let sensei_id = match find_sensei_by_name(self.senseis, sensei_name) {
            Some(sensei) => Some(sensei.id.clone()),
            None => {
                if !sensei_name.is_empty() {
                    notes.push(format!("unknown sensei {sensei_name:?}, left unassigned"));
                }
                None
            }
        };

        let rank_name = field(cols.rank);
        if !rank_name.is_empty() && self.ranks.resolve(rank_name).is_none() {
            notes.push(format!(
                "unknown rank {rank_name:?}, defaulted to {}",
                self.ranks.lowest()
            ));
        }

        let cpf = field(cols.cpf);
        let birth_date = normalize_date(field(cols.birth_date));

        let student = Student {
            id: ids.generate_id(),
            name: name.to_string(),
            cpf: (!cpf.is_empty()).then(|| cpf.to_string()),
            sex: Some(normalize_sex(field(cols.sex))),
            birth_date: (!birth_date.is_empty()).then_some(birth_date),
            current_rank: normalize_rank(self.ranks, rank_name),
            sensei_id,
        };
        RowOutcome::Student(student, notes)
    }
}
