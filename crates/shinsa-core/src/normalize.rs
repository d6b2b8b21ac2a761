//! Field normalization for raw roster text.
//!
//! Every function here is total: bad input degrades to a default instead of
//! failing.

use crate::model::Sex;
use crate::rank::{Rank, RankOrdering};

/// Two-digit years below this pivot belong to the 2000s, the rest to the 1900s.
const CENTURY_PIVOT: u32 = 30;

/// Normalize a free-text date to `YYYY-MM-DD`.
///
/// - `day/month/year` input is reordered and zero-padded; two-digit years
///   00–29 become 2000–2029 and 30–99 become 1930–1999.
/// - Input without `/` is assumed to be canonical already and is returned
///   trimmed.
/// - Empty input stays empty.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains('/') {
        return trimmed.to_string();
    }

    let parts: Vec<&str> = trimmed.split('/').map(str::trim).collect();
    let [day, month, year] = parts.as_slice() else {
        return trimmed.to_string();
    };
    let (Ok(d), Ok(m), Ok(y)) = (
        day.parse::<u32>(),
        month.parse::<u32>(),
        year.parse::<u32>(),
    ) else {
        return trimmed.to_string();
    };

    let year = if year.len() <= 2 { expand_year(y) } else { y };
    format!("{year:04}-{m:02}-{d:02}")
}

fn expand_year(two_digit: u32) -> u32 {
    if two_digit < CENTURY_PIVOT {
        2000 + two_digit
    } else {
        1900 + two_digit
    }
}

/// Case-insensitive sex code: `M…` is male, `F…` is female, anything else
/// (including empty) is other.
pub fn normalize_sex(raw: &str) -> Sex {
    match raw.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('M') => Sex::Male,
        Some('F') => Sex::Female,
        _ => Sex::Other,
    }
}

/// Resolve a rank name; unmatched names fall back to the lowest rank.
pub fn normalize_rank(ordering: &RankOrdering, raw: &str) -> Rank {
    ordering.resolve_or_lowest(raw)
}

/// Fold a name for locale-aware comparison: lowercase with common Latin
/// diacritics removed.
pub fn collation_key(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_with_slashes_are_reordered() {
        assert_eq!(normalize_date("15/03/90"), "1990-03-15");
        assert_eq!(normalize_date("01/01/05"), "2005-01-01");
        assert_eq!(normalize_date("1/2/1987"), "1987-02-01");
        assert_eq!(normalize_date(" 31/12/29 "), "2029-12-31");
        assert_eq!(normalize_date("01/01/30"), "1930-01-01");
    }

    #[test]
    fn dates_without_slashes_pass_through() {
        assert_eq!(normalize_date("2021-07-04"), "2021-07-04");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
    }

    #[test]
    fn malformed_slash_dates_pass_through() {
        assert_eq!(normalize_date("ab/cd/ef"), "ab/cd/ef");
        assert_eq!(normalize_date("12/2020"), "12/2020");
    }

    #[test]
    fn sex_codes() {
        assert_eq!(normalize_sex("masculino"), Sex::Male);
        assert_eq!(normalize_sex("M"), Sex::Male);
        assert_eq!(normalize_sex("m"), Sex::Male);
        assert_eq!(normalize_sex("Feminino"), Sex::Female);
        assert_eq!(normalize_sex("f"), Sex::Female);
        assert_eq!(normalize_sex("x"), Sex::Other);
        assert_eq!(normalize_sex(""), Sex::Other);
    }

    #[test]
    fn rank_names_fall_back_to_lowest() {
        let ordering = RankOrdering::standard();
        assert_eq!(normalize_rank(&ordering, "verde"), Rank::Verde);
        assert_eq!(normalize_rank(&ordering, "faixa verde"), Rank::Branca);
    }

    #[test]
    fn collation_folds_case_and_accents() {
        assert_eq!(collation_key("Ângela"), "angela");
        assert_eq!(collation_key("JOÃO Conceição"), "joao conceicao");
    }
}
