//! A1-style cell and range references.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, XlsxError};

/// Largest zero-based column index in an `.xlsx` sheet (`XFD`).
pub const MAX_COL: u32 = 16_383;
/// Largest zero-based row index in an `.xlsx` sheet.
pub const MAX_ROW: u32 = 1_048_575;

/// Zero-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parses `"B7"` or `"$B$7"`.
    pub fn parse(a1: &str) -> Result<Self> {
        let invalid = || XlsxError::InvalidReference(a1.to_string());
        let trimmed = a1.trim().replace('$', "");
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = trimmed.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        let col = column_index(letters).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 || row - 1 > MAX_ROW {
            return Err(invalid());
        }
        Ok(Self::new(row - 1, col))
    }

    pub fn to_a1(self) -> String {
        format!("{}{}", column_name(self.col), self.row + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

impl FromStr for CellRef {
    type Err = XlsxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Inclusive rectangular range, as used by `<mergeCell ref="A1:B2"/>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(start: CellRef, end: CellRef) -> Self {
        Self {
            start: CellRef::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellRef::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    pub fn parse(a1: &str) -> Result<Self> {
        match a1.split_once(':') {
            Some((start, end)) => Ok(Self::new(CellRef::parse(start)?, CellRef::parse(end)?)),
            None => {
                let cell = CellRef::parse(a1)?;
                Ok(Self::new(cell, cell))
            }
        }
    }

    /// The top-left cell, which holds the merged value.
    pub fn anchor(&self) -> CellRef {
        self.start
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// True for cells inside the range other than the anchor.
    pub fn is_member(&self, cell: CellRef) -> bool {
        cell != self.start && self.contains(cell)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// `"A"` -> 0, `"AA"` -> 26.
pub fn column_index(letters: &str) -> Option<u32> {
    let mut index: u32 = 0;
    for c in letters.chars() {
        let digit = u32::from(c.to_ascii_uppercase()).checked_sub(u32::from('A'))? + 1;
        if digit > 26 {
            return None;
        }
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    let index = index.checked_sub(1)?;
    (index <= MAX_COL).then_some(index)
}

/// 0 -> `"A"`, 26 -> `"AA"`.
pub fn column_name(index: u32) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a1_references() {
        assert_eq!(CellRef::parse("A1").expect("A1"), CellRef::new(0, 0));
        assert_eq!(CellRef::parse("$AB$12").expect("AB12"), CellRef::new(11, 27));
        assert_eq!(CellRef::parse("xfd1").expect("XFD1").col, MAX_COL);
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("XFE1").is_err());
        assert!(CellRef::parse("12").is_err());
        assert!(CellRef::parse("A1B").is_err());
    }

    #[test]
    fn column_names_round_trip() {
        for index in [0, 25, 26, 51, 701, 702, MAX_COL] {
            assert_eq!(column_index(&column_name(index)), Some(index));
        }
        assert_eq!(column_name(27), "AB");
    }

    #[test]
    fn ranges_know_their_members() {
        let range = CellRange::parse("B2:C3").expect("range");
        assert_eq!(range.anchor(), CellRef::new(1, 1));
        assert!(!range.is_member(CellRef::new(1, 1)));
        assert!(range.is_member(CellRef::new(2, 2)));
        assert!(!range.contains(CellRef::new(3, 1)));
        assert_eq!(range.to_string(), "B2:C3");
    }
}
