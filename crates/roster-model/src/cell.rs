//! Spreadsheet cell values as seen by the mapping engine.

use serde::{Deserialize, Serialize};

/// The value stored in one worksheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Error literal such as `#N/A`.
    Error(String),
    /// A formula with the value the producing application cached for it.
    Formula {
        formula: String,
        cached: Option<Box<CellValue>>,
    },
}

impl CellValue {
    /// Returns the text of a literal string cell. Formula results are not text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Self::Formula { .. })
    }

    /// Renders the value the way a spreadsheet would display it without formatting.
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) | Self::Error(text) => text.clone(),
            Self::Number(number) => format_number(*number),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Formula { cached, .. } => cached
                .as_deref()
                .map(Self::display_text)
                .unwrap_or_default(),
        }
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{number:.0}")
    } else {
        number.to_string()
    }
}
