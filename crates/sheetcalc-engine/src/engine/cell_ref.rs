//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed column/row coordinates.
//!
//! Columns use bijective base-26 (A..Z, AA..AZ, BA..), so there is no zero digit
//! and every column index has exactly one spelling. Rows are 1-based in the
//! string form and 0-based inside [`CellRef`].
//!
//! # Examples
//!
//! ```
//! use sheetcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::parse("B3").unwrap();
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::EvalError;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "AA10").
    ///
    /// Only uppercase column letters are accepted. Row `0` and rows with leading
    /// zeros (`A01`) are rejected, so each cell has exactly one spelling.
    pub fn parse(name: &str) -> Result<CellRef, EvalError> {
        let (col, row) = decode(name)?;
        Ok(CellRef::new(col, row - 1))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Convert spreadsheet-style letters back to a column index (A -> 0, AA -> 26).
    ///
    /// Returns `None` for an empty string, non-uppercase input, or overflow.
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut col_acc = 0usize;
        for c in letters.bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        col_acc.checked_sub(1)
    }
}

/// Encode a column index and a 1-based row number as a reference string.
pub fn encode(col: usize, row: usize) -> String {
    debug_assert!(row >= 1, "rows are 1-based in reference strings");
    format!("{}{}", CellRef::col_to_letters(col), row)
}

/// Decode a reference string into a column index and a 1-based row number.
pub fn decode(reference: &str) -> Result<(usize, usize), EvalError> {
    let invalid = || EvalError::InvalidReference(reference.to_string());

    let caps = a1_re().captures(reference).ok_or_else(invalid)?;
    let col = CellRef::letters_to_col(&caps["letters"]).ok_or_else(invalid)?;
    // The pattern rules out row 0 and leading zeros.
    let row = caps["numbers"].parse::<usize>().map_err(|_| invalid())?;

    Ok((col, row))
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Z]+)(?<numbers>[1-9][0-9]*)$")
            .expect("cell reference regex must compile")
    })
}

impl std::str::FromStr for CellRef {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_a1_overflow_is_rejected() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::parse(&huge).is_err());

        let huge_row = format!("A{}", "9".repeat(40));
        assert!(CellRef::parse(&huge_row).is_err());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_encode_boundaries() {
        assert_eq!(encode(0, 1), "A1");
        assert_eq!(encode(25, 1), "Z1");
        assert_eq!(encode(26, 7), "AA7");
        assert_eq!(encode(51, 10), "AZ10");
        assert_eq!(encode(52, 10), "BA10");
        assert_eq!(encode(701, 3), "ZZ3");
        assert_eq!(encode(702, 3), "AAA3");
    }

    #[test]
    fn test_decode_reports_invalid_reference() {
        for bad in ["", "A", "12", "a1", "A0", "A01", "B007", "1A", "A1B", "A 1", "$A$1"] {
            assert_eq!(
                decode(bad),
                Err(EvalError::InvalidReference(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_keeps_external_row() {
        assert_eq!(decode("C12"), Ok((2, 12)));
        assert_eq!(CellRef::parse("C12").unwrap(), CellRef::new(2, 11));
    }

    #[test]
    fn test_encode_is_injective_over_two_letter_columns() {
        let names: HashSet<String> = (0..702).map(|col| encode(col, 1)).collect();
        assert_eq!(names.len(), 702);
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(col in 0usize..701, row in 1usize..=999_999) {
            prop_assert_eq!(decode(&encode(col, row)), Ok((col, row)));
        }

        #[test]
        fn prop_distinct_coordinates_encode_distinctly(
            a in (0usize..701, 1usize..=999_999),
            b in (0usize..701, 1usize..=999_999),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(encode(a.0, a.1), encode(b.0, b.1));
        }
    }
}
