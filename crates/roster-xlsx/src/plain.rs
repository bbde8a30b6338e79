//! Plain output: values only, no formatting.

use rust_xlsxwriter::{Workbook as PlainWorkbook, Worksheet as PlainWorksheet};

use roster_model::CellValue;

use crate::error::{Result, XlsxError};
use crate::transform::SheetTransform;

/// Writes one sheet per processed sheet, in order, with the same names.
pub(crate) fn write_plain(sheets: &[SheetTransform]) -> Result<Vec<u8>> {
    let mut workbook = PlainWorkbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for cell in &sheet.cells {
            let col = u16::try_from(cell.reference.col)
                .map_err(|_| XlsxError::InvalidReference(cell.reference.to_a1()))?;
            write_value(worksheet, cell.reference.row, col, &cell.transformed)?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn write_value(worksheet: &mut PlainWorksheet, row: u32, col: u16, value: &CellValue) -> Result<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(text) if text.is_empty() => {}
        CellValue::Text(text) | CellValue::Error(text) => {
            worksheet.write_string(row, col, text)?;
        }
        CellValue::Number(number) => {
            worksheet.write_number(row, col, *number)?;
        }
        CellValue::Bool(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        CellValue::Formula { cached, .. } => {
            if let Some(cached) = cached {
                write_value(worksheet, row, col, cached)?;
            }
        }
    }
    Ok(())
}
