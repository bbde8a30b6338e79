//! Integration tests for workbook transformation.

use std::time::{Duration, Instant};

use rust_xlsxwriter::{Color as XlsxColor, Format, Workbook as XlsxBuilder, XlsxError as BuildError};

use roster_map::{CodeMatcher, StaticTables};
use roster_model::{CellCategory, CellValue, MappingTable, TransformOptions, UnmappedPolicy};
use roster_xlsx::{
    OutputMode, TransformRequest, Workbook, WorkbookTransformer, XlsxError, transform_station,
};

fn fixture(build: impl FnOnce(&mut XlsxBuilder) -> Result<(), BuildError>) -> Workbook {
    let mut builder = XlsxBuilder::new();
    build(&mut builder).unwrap();
    let bytes = builder.save_to_buffer().unwrap();
    Workbook::from_bytes(&bytes).unwrap()
}

fn station_table() -> MappingTable {
    MappingTable::from_pairs("S1", [("B1", "NP"), ("B2", "SB"), ("OT", "")])
}

fn matcher() -> CodeMatcher {
    CodeMatcher::new(&station_table()).unwrap()
}

fn roster_fixture() -> Workbook {
    fixture(|wb| {
        let highlight = Format::new()
            .set_bold()
            .set_background_color(XlsxColor::RGB(0xFFFF00));
        let sheet = wb.add_worksheet();
        sheet.set_name("Roster")?;
        sheet.write_string(0, 0, "Name")?;
        sheet.write_string(0, 1, "Mon")?;
        sheet.write_string(0, 2, "Tue")?;
        sheet.write_string(1, 0, "Alice")?;
        sheet.write_string_with_format(1, 1, "B1", &highlight)?;
        sheet.write_string(1, 2, "B1/XX")?;
        sheet.write_string(2, 0, "Bob")?;
        sheet.write_string(2, 1, "OT")?;
        sheet.write_string(2, 2, "B2")?;
        sheet.write_number(3, 1, 8.0)?;
        sheet.write_string_with_format(3, 2, "XX", &highlight)?;
        sheet.set_column_width(0, 24)?;
        sheet.set_row_height(1, 30)?;
        Ok(())
    })
}

fn styled_output(source: &Workbook, options: TransformOptions) -> Workbook {
    let matcher = matcher();
    let output = WorkbookTransformer::new(&matcher, options)
        .transform(source, &TransformRequest::all_sheets())
        .unwrap();
    Workbook::from_bytes(output.styled.as_deref().unwrap()).unwrap()
}

#[test]
fn test_mapped_cell_keeps_fill_and_font() {
    let source = roster_fixture();
    let output = styled_output(&source, TransformOptions::default());

    let before = source.worksheet("Roster").unwrap();
    let after = output.worksheet("Roster").unwrap();
    let original = before.cell_a1("B2").unwrap();
    let mapped = after.cell_a1("B2").unwrap();

    assert_eq!(mapped.value, CellValue::Text("NP".to_string()));
    assert_eq!(mapped.style, original.style);

    let style = output.style(mapped.style).unwrap();
    assert!(style.font.bold);
    assert_eq!(style.fill.pattern.as_deref(), Some("solid"));
    assert_eq!(Some(style), source.style(original.style));
}

#[test]
fn test_column_widths_and_row_heights_survive() {
    let source = roster_fixture();
    let output = styled_output(&source, TransformOptions::default());

    let before = source.worksheet("Roster").unwrap();
    let after = output.worksheet("Roster").unwrap();

    assert!(!before.column_widths.is_empty());
    assert_eq!(after.column_widths, before.column_widths);
    assert_eq!(after.row_heights.get(&1), Some(&30.0));
    assert_eq!(after.row_heights, before.row_heights);
}

#[test]
fn test_preserve_policy_keeps_unknown_tokens() {
    let source = roster_fixture();
    let matcher = matcher();
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();
    let sheet = &output.sheets[0];

    assert_eq!(
        sheet.cell("C2").unwrap().transformed,
        CellValue::Text("NP/XX".to_string())
    );
    assert_eq!(sheet.cell("C2").unwrap().category, Some(CellCategory::Mapped));
    assert_eq!(sheet.cell("B3").unwrap().transformed, CellValue::Text(String::new()));
    assert_eq!(sheet.cell("B3").unwrap().category, Some(CellCategory::Empty));
    assert_eq!(sheet.cell("A2").unwrap().category, Some(CellCategory::Unchanged));
    assert_eq!(sheet.cell("B4").unwrap().category, Some(CellCategory::Untouched));
}

#[test]
fn test_delete_policy_drops_unknown_tokens() {
    let source = roster_fixture();
    let matcher = matcher();
    let options = TransformOptions::new().with_unmapped_policy(UnmappedPolicy::Delete);
    let output = WorkbookTransformer::new(&matcher, options)
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();
    let sheet = &output.sheets[0];

    assert_eq!(
        sheet.cell("C2").unwrap().transformed,
        CellValue::Text("NP/".to_string())
    );
    // Names are unmapped tokens too.
    assert_eq!(sheet.cell("A2").unwrap().transformed, CellValue::Text(String::new()));
    assert_eq!(sheet.cell("A2").unwrap().category, Some(CellCategory::Empty));
}

#[test]
fn test_emptied_cell_keeps_its_style() {
    let source = roster_fixture();
    let output = styled_output(&source, TransformOptions::default());

    let before = source.worksheet("Roster").unwrap();
    let after = output.worksheet("Roster").unwrap();
    let emptied = after.cell_a1("B3").unwrap();

    assert!(emptied.value.is_empty());
    assert_eq!(emptied.style, before.cell_a1("B3").unwrap().style);
}

#[test]
fn test_unmapped_cell_keeps_its_style() {
    let source = roster_fixture();
    let output = styled_output(&source, TransformOptions::default());

    let original = source.worksheet("Roster").unwrap().cell_a1("C4").unwrap().clone();
    let kept = output.worksheet("Roster").unwrap().cell_a1("C4").unwrap().clone();

    assert_eq!(kept.value, CellValue::Text("XX".to_string()));
    assert_eq!(kept.style, original.style);
    let style = output.style(kept.style).unwrap();
    assert!(style.font.bold);
    assert_eq!(style.fill.pattern.as_deref(), Some("solid"));
    assert_eq!(Some(style), source.style(original.style));
}

#[test]
fn test_stats_per_sheet_and_totals() {
    let source = roster_fixture();
    let matcher = matcher();
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();
    let counts = output.stats.sheet("Roster").unwrap().counts;

    assert_eq!(counts.total_cells, 11);
    assert_eq!(counts.mapped_cells, 3);
    assert_eq!(counts.empty_cells, 1);
    assert_eq!(counts.unchanged_cells, 6);
    assert_eq!(counts.untouched_cells, 1);
    assert_eq!(output.stats.totals, counts);
}

#[test]
fn test_cell_grid_snapshot() {
    let source = roster_fixture();
    let matcher = matcher();
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();

    let grid = output.sheets[0]
        .cells
        .iter()
        .map(|cell| {
            format!(
                "{} {:?} -> {:?}",
                cell.reference,
                cell.original.display_text(),
                cell.transformed.display_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(grid, @r#"
    A1 "Name" -> "Name"
    B1 "Mon" -> "Mon"
    C1 "Tue" -> "Tue"
    A2 "Alice" -> "Alice"
    B2 "B1" -> "NP"
    C2 "B1/XX" -> "NP/XX"
    A3 "Bob" -> "Bob"
    B3 "OT" -> ""
    C3 "B2" -> "SB"
    B4 "8" -> "8"
    C4 "XX" -> "XX"
    "#);
}

#[test]
fn test_merged_range_reproduced() {
    let source = fixture(|wb| {
        let sheet = wb.add_worksheet();
        sheet.set_name("Week")?;
        sheet.merge_range(0, 0, 0, 2, "B2", &Format::new().set_bold())?;
        sheet.write_string(1, 0, "B1")?;
        Ok(())
    });
    let matcher = matcher();
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();

    let counts = output.stats.sheet("Week").unwrap().counts;
    assert_eq!(counts.total_cells, 2);
    assert_eq!(counts.mapped_cells, 2);

    let styled = Workbook::from_bytes(output.styled.as_deref().unwrap()).unwrap();
    let sheet = styled.worksheet("Week").unwrap();
    assert_eq!(sheet.merges.len(), 1);
    assert_eq!(sheet.merges[0].to_string(), "A1:C1");
    assert_eq!(
        sheet.cell_a1("A1").unwrap().value,
        CellValue::Text("SB".to_string())
    );
}

#[test]
fn test_formulas_are_untouched() {
    let source = fixture(|wb| {
        let sheet = wb.add_worksheet();
        sheet.write_string(0, 0, "B1")?;
        sheet.write_formula(0, 1, "=A1")?;
        Ok(())
    });
    let matcher = matcher();
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();
    let sheet = &output.sheets[0];
    let formula = sheet.cell("B1").unwrap();

    assert!(formula.original.is_formula());
    assert_eq!(formula.transformed, formula.original);
    assert_eq!(formula.category, Some(CellCategory::Untouched));

    let styled = Workbook::from_bytes(output.styled.as_deref().unwrap()).unwrap();
    let cell = styled.worksheet("Sheet1").unwrap();
    assert!(cell.cell_a1("B1").unwrap().value.is_formula());
    assert_eq!(
        cell.cell_a1("A1").unwrap().value,
        CellValue::Text("NP".to_string())
    );
}

fn two_sheet_fixture() -> Workbook {
    fixture(|wb| {
        let first = wb.add_worksheet();
        first.set_name("First")?;
        first.write_string(0, 0, "B1")?;
        let second = wb.add_worksheet();
        second.set_name("Second")?;
        second.write_string(0, 0, "B2")?;
        let third = wb.add_worksheet();
        third.set_name("Third")?;
        third.write_string(0, 0, "B1")?;
        Ok(())
    })
}

#[test]
fn test_selected_sheets_follow_workbook_order() {
    let source = two_sheet_fixture();
    let matcher = matcher();
    let request = TransformRequest::all_sheets().with_sheets(["Third", "First"]);
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &request)
        .unwrap();

    let names: Vec<&str> = output.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Third"]);

    let plain = Workbook::from_bytes(output.plain.as_deref().unwrap()).unwrap();
    assert_eq!(plain.sheet_names(), vec!["First", "Third"]);

    // The styled package keeps every sheet; unprocessed ones are copied as-is.
    let styled = Workbook::from_bytes(output.styled.as_deref().unwrap()).unwrap();
    assert_eq!(styled.sheet_names(), vec!["First", "Second", "Third"]);
    let second = source.sheet("Second").unwrap();
    assert_eq!(styled.part(&second.part), source.part(&second.part));
    assert_eq!(
        styled.worksheet("Second").unwrap().cell_a1("A1").unwrap().value,
        CellValue::Text("B2".to_string())
    );
}

#[test]
fn test_missing_sheet_produces_no_output() {
    let source = two_sheet_fixture();
    let matcher = matcher();
    let request = TransformRequest::all_sheets().with_sheets(["First", "Missing"]);
    let err = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &request)
        .unwrap_err();

    match err {
        XlsxError::SheetNotFound { name, available } => {
            assert_eq!(name, "Missing");
            assert_eq!(available, vec!["First", "Second", "Third"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_plain_mode_writes_values_only() {
    let source = roster_fixture();
    let matcher = matcher();
    let request = TransformRequest::all_sheets().with_mode(OutputMode::Plain);
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &request)
        .unwrap();

    assert!(output.styled.is_none());
    let plain = Workbook::from_bytes(output.plain.as_deref().unwrap()).unwrap();
    let sheet = plain.worksheet("Roster").unwrap();
    let mapped = sheet.cell_a1("B2").unwrap();
    assert_eq!(mapped.value, CellValue::Text("NP".to_string()));
    assert_eq!(mapped.style, 0);
    assert!(sheet.cell_a1("B3").is_none_or(|cell| cell.value.is_empty()));
    assert_eq!(sheet.cell_a1("B4").unwrap().value, CellValue::Number(8.0));
}

#[test]
fn test_transform_station_uses_provider() {
    let source = roster_fixture();
    let tables = StaticTables::new().with_table(station_table()).unwrap();
    let output = transform_station(
        &source,
        "s1",
        &tables,
        &TransformRequest::all_sheets().with_mode(OutputMode::Styled),
        TransformOptions::default(),
    )
    .unwrap();

    assert!(output.plain.is_none());
    assert_eq!(output.stats.totals.mapped_cells, 3);
}

#[test]
fn test_transform_station_checks_sheets_first() {
    let source = roster_fixture();
    let err = transform_station(
        &source,
        "bad station!",
        &StaticTables::new(),
        &TransformRequest::all_sheets().with_sheets(["Nope"]),
        TransformOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, XlsxError::SheetNotFound { .. }));
    assert!(err.is_input_error());
}

#[test]
fn test_write_to_names_outputs() {
    let source = roster_fixture();
    let matcher = matcher();
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let written = output.write_to(dir.path(), "week42").unwrap();

    assert_eq!(
        written,
        vec![
            dir.path().join("week42_mapped.xlsx"),
            dir.path().join("week42_mapped_plain.xlsx"),
        ]
    );
    let reopened = Workbook::open(&written[0]).unwrap();
    assert_eq!(reopened.sheet_names(), vec!["Roster"]);
}

#[test]
fn test_rejects_non_zip_input() {
    let err = Workbook::from_bytes(b"Name,Mon\nAlice,B1\n").unwrap_err();
    assert!(matches!(err, XlsxError::UnsupportedFormat(_)));
}

#[test]
fn test_large_sheet_finishes_quickly() {
    let source = fixture(|wb| {
        let sheet = wb.add_worksheet();
        for row in 0..400u32 {
            for col in 0..40u16 {
                let value = match (row + u32::from(col)) % 4 {
                    0 => "B1",
                    1 => "B2/OT",
                    2 => "XX",
                    _ => "B1, B2",
                };
                sheet.write_string(row, col, value)?;
            }
        }
        Ok(())
    });
    let matcher = matcher();
    let start = Instant::now();
    let output = WorkbookTransformer::new(&matcher, TransformOptions::default())
        .transform(&source, &TransformRequest::all_sheets())
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(output.stats.totals.total_cells, 16_000);
    assert_eq!(output.stats.totals.unchanged_cells, 4_000);
}
