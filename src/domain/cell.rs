//! A1-style cell references and sheet limits

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use umya_spreadsheet::helper::coordinate::{coordinate_from_index, index_from_coordinate};

/// Last addressable row of an xlsx worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Last addressable column of an xlsx worksheet (XFD)
pub const MAX_COLS: u32 = 16_384;

/// Maximum number of characters a single cell can hold
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, Error, PartialEq)]
pub enum CellRefError {
    #[error("Invalid cell reference '{0}': expected A1 notation like 'B5'")]
    Syntax(String),

    #[error("Cell reference '{0}' is outside the sheet bounds (max XFD1048576)")]
    OutOfRange(String),
}

/// A 1-based (column, row) cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&coordinate_from_index(&self.col, &self.row))
    }
}

impl FromStr for CellRef {
    type Err = CellRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_uppercase();
        let split = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| CellRefError::Syntax(s.to_string()))?;
        let (letters, digits) = text.split_at(split);

        let well_formed = !letters.is_empty()
            && letters.len() <= 3
            && letters.chars().all(|c| c.is_ascii_uppercase())
            && digits.chars().all(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(CellRefError::Syntax(s.to_string()));
        }

        match index_from_coordinate(&text) {
            (Some(col), Some(row), _, _) if (1..=MAX_COLS).contains(&col) && (1..=MAX_ROWS).contains(&row) => {
                Ok(CellRef::new(col, row))
            }
            (Some(_), Some(_), _, _) => Err(CellRefError::OutOfRange(s.to_string())),
            _ => Err(CellRefError::Syntax(s.to_string())),
        }
    }
}

impl TryFrom<String> for CellRef {
    type Error = CellRefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CellRef> for String {
    fn from(cell: CellRef) -> Self {
        cell.to_string()
    }
}

impl Default for CellRef {
    fn default() -> Self {
        CellRef::new(1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let cell: CellRef = "B5".parse().unwrap();
        assert_eq!(cell, CellRef::new(2, 5));
        assert_eq!(cell.to_string(), "B5");

        let wide: CellRef = "AA10".parse().unwrap();
        assert_eq!(wide, CellRef::new(27, 10));
    }

    #[test]
    fn parse_is_case_insensitive() {
        let cell: CellRef = " c12 ".parse().unwrap();
        assert_eq!(cell, CellRef::new(3, 12));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!("".parse::<CellRef>(), Err(CellRefError::Syntax(_))));
        assert!(matches!("12".parse::<CellRef>(), Err(CellRefError::Syntax(_))));
        assert!(matches!("B".parse::<CellRef>(), Err(CellRefError::Syntax(_))));
        assert!(matches!("B5C".parse::<CellRef>(), Err(CellRefError::Syntax(_))));
        assert!(matches!("A0".parse::<CellRef>(), Err(_)));
    }

    #[test]
    fn parse_rejects_out_of_range() {
        assert!("XFD1048576".parse::<CellRef>().is_ok());
        assert!("A1048577".parse::<CellRef>().is_err());
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&CellRef::new(1, 7)).unwrap();
        assert_eq!(json, "\"A7\"");

        let cell: CellRef = serde_json::from_str("\"D3\"").unwrap();
        assert_eq!(cell, CellRef::new(4, 3));

        assert!(serde_json::from_str::<CellRef>("\"nope\"").is_err());
    }
}
