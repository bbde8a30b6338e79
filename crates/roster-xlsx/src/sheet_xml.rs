//! Low-level helpers shared by the worksheet reader and the styled writer.

use quick_xml::events::BytesStart;

use crate::error::{Result, XlsxError};
use crate::reference::CellRef;

/// Strips a namespace prefix: `x:c` -> `c`.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Returns the unescaped value of the attribute whose local name is `key`.
pub(crate) fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if local_name(attr.key.as_ref()) == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

pub(crate) fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Tracks cell positions while streaming `<sheetData>`.
///
/// Producers may omit `r` on rows and cells; positions then follow on from
/// the previous row or cell.
#[derive(Debug, Default)]
pub(crate) struct CellCursor {
    row: Option<u32>,
    next_col: u32,
}

impl CellCursor {
    /// Enters a `<row>` element and returns its zero-based index.
    pub(crate) fn enter_row(&mut self, row: &BytesStart<'_>) -> Result<u32> {
        let index = match attr_value(row, b"r")? {
            Some(r) => {
                let number: u32 = r
                    .trim()
                    .parse()
                    .map_err(|_| XlsxError::Invalid(format!("invalid row number '{r}'")))?;
                number
                    .checked_sub(1)
                    .ok_or_else(|| XlsxError::Invalid("row number 0".to_string()))?
            }
            None => self.row.map_or(0, |row| row + 1),
        };
        self.row = Some(index);
        self.next_col = 0;
        Ok(index)
    }

    /// Resolves a `<c>` element's position and advances the cursor past it.
    pub(crate) fn cell(&mut self, cell: &BytesStart<'_>) -> Result<CellRef> {
        let reference = match attr_value(cell, b"r")? {
            Some(r) => CellRef::parse(&r)?,
            None => CellRef::new(self.row.unwrap_or(0), self.next_col),
        };
        self.next_col = reference.col + 1;
        Ok(reference)
    }
}
