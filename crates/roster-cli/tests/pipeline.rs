//! Integration tests for the command runners.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook as XlsxBuilder};
use tempfile::TempDir;

use roster_cli::cli::{ImportArgs, LookupArgs, MapArgs, ModeArg, SheetsArgs, UnmappedArg};
use roster_cli::commands::{run_import, run_lookup, run_map, run_sheets, run_stations};
use roster_map::MatchKind;
use roster_model::{CellCategory, CellValue};
use roster_xlsx::Workbook;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn mapping_dir(&self) -> PathBuf {
        self.dir.path().join("mappings")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_roster(&self, name: &str) -> PathBuf {
        let mut workbook = XlsxBuilder::new();
        let bold = Format::new().set_bold();
        let week = workbook.add_worksheet();
        week.set_name("Week 42").unwrap();
        week.write_string_with_format(0, 0, "Name", &bold).unwrap();
        week.write_string_with_format(0, 1, "Mon", &bold).unwrap();
        week.write_string(1, 0, "Alice").unwrap();
        week.write_string(1, 1, "B1/OT").unwrap();
        week.write_string(2, 0, "Bob").unwrap();
        week.write_string(2, 1, "B19").unwrap();
        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "B1").unwrap();

        let path = self.path(name);
        workbook.save(&path).unwrap();
        path
    }

    fn import(&self, station: &str, csv: &str) {
        let path = self.path(&format!("{station}.csv"));
        fs::write(&path, csv).unwrap();
        let args = ImportArgs {
            input: path,
            station: station.to_string(),
            replace: false,
            created_by: Some("tests".to_string()),
        };
        run_import(&args, &self.mapping_dir()).unwrap();
    }
}

fn map_args(input: &Path, output_dir: &Path) -> MapArgs {
    MapArgs {
        input: input.to_path_buf(),
        station: "han".to_string(),
        sheets: Vec::new(),
        output_dir: Some(output_dir.to_path_buf()),
        mode: ModeArg::Both,
        unmapped: UnmappedArg::Preserve,
        separators: None,
    }
}

#[test]
fn test_import_then_map_writes_both_outputs() {
    let fixture = Fixture::new();
    fixture.import("HAN", "code,replacement\nB1,NP\nB19,TR\nOT,\n");
    let input = fixture.write_roster("roster.xlsx");
    let out = fixture.path("out");

    let result = run_map(&map_args(&input, &out), &fixture.mapping_dir()).unwrap();

    assert_eq!(result.station, "HAN");
    assert_eq!(
        result.outputs,
        vec![
            out.join("roster_mapped.xlsx"),
            out.join("roster_mapped_plain.xlsx")
        ]
    );
    assert_eq!(result.stats.sheet_count(), 2);
    assert_eq!(result.stats.totals.mapped_cells, 3);

    let styled = Workbook::open(&result.outputs[0]).unwrap();
    let week = styled.worksheet("Week 42").unwrap();
    assert_eq!(
        week.cell_a1("B2").unwrap().value,
        CellValue::Text("NP/".to_string())
    );
    assert_eq!(
        week.cell_a1("B3").unwrap().value,
        CellValue::Text("TR".to_string())
    );
    assert!(styled.style(week.cell_a1("A1").unwrap().style).unwrap().font.bold);
}

#[test]
fn test_map_selected_sheet_with_delete_policy() {
    let fixture = Fixture::new();
    fixture.import("HAN", "B1,NP\n");
    let input = fixture.write_roster("roster.xlsx");
    let out = fixture.path("out");
    let args = MapArgs {
        sheets: vec!["Week 42".to_string()],
        mode: ModeArg::Plain,
        unmapped: UnmappedArg::Delete,
        ..map_args(&input, &out)
    };

    let result = run_map(&args, &fixture.mapping_dir()).unwrap();

    assert_eq!(result.outputs, vec![out.join("roster_mapped_plain.xlsx")]);
    let plain = Workbook::open(&result.outputs[0]).unwrap();
    assert_eq!(plain.sheet_names(), vec!["Week 42"]);
    let week = plain.worksheet("Week 42").unwrap();
    assert_eq!(
        week.cell_a1("B2").unwrap().value,
        CellValue::Text("NP/".to_string())
    );
    assert!(week.cell_a1("A2").is_none());
}

#[test]
fn test_unknown_sheet_writes_nothing() {
    let fixture = Fixture::new();
    let input = fixture.write_roster("roster.xlsx");
    let out = fixture.path("out");
    let args = MapArgs {
        sheets: vec!["Week 43".to_string()],
        ..map_args(&input, &out)
    };

    let err = run_map(&args, &fixture.mapping_dir()).unwrap_err();

    assert!(format!("{err:#}").contains("sheet 'Week 43' not found"));
    assert!(!out.exists());
}

#[test]
fn test_global_table_applies_to_unknown_station() {
    let fixture = Fixture::new();
    fixture.import("global", "B1,NP\n");
    let input = fixture.write_roster("roster.xlsx");
    let out = fixture.path("out");
    let args = MapArgs {
        station: "SGN".to_string(),
        ..map_args(&input, &out)
    };

    let result = run_map(&args, &fixture.mapping_dir()).unwrap();

    assert_eq!(result.station, "SGN");
    assert_eq!(result.stats.totals.mapped_cells, 2);
}

#[test]
fn test_invalid_separators_are_rejected() {
    let fixture = Fixture::new();
    let input = fixture.write_roster("roster.xlsx");
    let out = fixture.path("out");
    let args = MapArgs {
        separators: Some(String::new()),
        ..map_args(&input, &out)
    };

    assert!(run_map(&args, &fixture.mapping_dir()).is_err());
}

#[test]
fn test_sheets_lists_workbook_order() {
    let fixture = Fixture::new();
    let input = fixture.write_roster("roster.xlsx");

    let sheets = run_sheets(&SheetsArgs { input }).unwrap();

    let names: Vec<&str> = sheets.iter().map(|sheet| sheet.name.as_str()).collect();
    assert_eq!(names, vec!["Week 42", "Notes"]);
    assert_eq!(sheets[0].populated_cells, 6);
    assert!(!sheets[1].hidden);
}

#[test]
fn test_lookup_explains_rules() {
    let fixture = Fixture::new();
    fixture.import("HAN", "B1,NP\nB1*,TR\n");
    let args = LookupArgs {
        station: "HAN".to_string(),
        unmapped: UnmappedArg::Preserve,
        codes: vec!["b1".to_string(), "B19".to_string(), "XX".to_string()],
    };

    let rows = run_lookup(&args, &fixture.mapping_dir()).unwrap();

    assert_eq!(rows[0].rule, Some((MatchKind::Exact, "B1".to_string())));
    assert_eq!(rows[0].output, "NP");
    assert_eq!(rows[1].rule, Some((MatchKind::Pattern, "B1*".to_string())));
    assert_eq!(rows[1].output, "TR");
    assert_eq!(rows[2].rule, None);
    assert_eq!(rows[2].output, "XX");
    assert_eq!(rows[2].category, CellCategory::Unchanged);
}

#[test]
fn test_import_merges_and_stations_lists() {
    let fixture = Fixture::new();
    fixture.import("HAN", "B1,NP\n");
    fixture.import("HAN", "B2,SB\n");
    fixture.import("SGN", "B1,NP\n");

    let stations = run_stations(&fixture.mapping_dir()).unwrap();

    let summary: Vec<(&str, usize)> = stations
        .iter()
        .map(|station| (station.station.as_str(), station.entry_count))
        .collect();
    assert_eq!(summary, vec![("HAN", 2), ("SGN", 1)]);
}

#[test]
fn test_import_mapping_workbook() {
    let fixture = Fixture::new();
    let mut workbook = XlsxBuilder::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "from").unwrap();
    sheet.write_string(0, 1, "to").unwrap();
    sheet.write_string(1, 0, "B1").unwrap();
    sheet.write_string(1, 1, "NP").unwrap();
    sheet.write_string(2, 0, "B19").unwrap();
    sheet.write_string(2, 1, "TR").unwrap();
    sheet.write_string(3, 0, "OT").unwrap();
    let input = fixture.path("han_codes.xlsx");
    workbook.save(&input).unwrap();
    let args = ImportArgs {
        input,
        station: "HAN".to_string(),
        replace: false,
        created_by: None,
    };

    let meta = run_import(&args, &fixture.mapping_dir()).unwrap();

    assert_eq!(meta.entry_count, 3);
    let rows = run_lookup(
        &LookupArgs {
            station: "HAN".to_string(),
            unmapped: UnmappedArg::Preserve,
            codes: vec!["from".to_string(), "B19".to_string(), "OT".to_string()],
        },
        &fixture.mapping_dir(),
    )
    .unwrap();
    assert_eq!(rows[0].rule, None);
    assert_eq!(rows[1].output, "TR");
    assert_eq!(rows[2].output, "");
}
