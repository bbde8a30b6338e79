use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use roster_map::{MappingMeta, MatchKind, StationSummary};
use roster_model::{CellCategory, TransformCounts};
use roster_cli::types::{LookupRow, MapResult, SheetSummary};

pub fn print_map_summary(result: &MapResult) {
    println!("Input: {}", result.input.display());
    println!("Station: {}", result.station);
    println!("Mode: {}", result.mode.as_str());
    for path in &result.outputs {
        println!("Output: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Cells"),
        header_cell("Mapped"),
        header_cell("Unchanged"),
        header_cell("Emptied"),
        header_cell("Untouched"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for sheet in &result.stats.sheets {
        table.add_row(count_row(Cell::new(&sheet.sheet_name), &sheet.counts));
    }
    let totals = result.stats.totals;
    table.add_row(
        count_row(
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            &totals,
        )
        .into_iter()
        .map(|cell| cell.add_attribute(Attribute::Bold))
        .collect::<Vec<_>>(),
    );
    println!("{table}");
}

pub fn print_sheets(input: &Path, sheets: &[SheetSummary]) {
    println!("Workbook: {}", input.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Sheet"),
        header_cell("Cells"),
        header_cell("Merges"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (position, sheet) in sheets.iter().enumerate() {
        let name = if sheet.hidden {
            dim_cell(format!("{} (hidden)", sheet.name))
        } else {
            Cell::new(&sheet.name)
        };
        table.add_row(vec![
            Cell::new(position + 1),
            name,
            Cell::new(sheet.populated_cells),
            Cell::new(sheet.merges),
        ]);
    }
    println!("{table}");
}

pub fn print_lookup(station: &str, rows: &[LookupRow]) {
    println!("Station: {station}");
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Input"),
        header_cell("Rule"),
        header_cell("Result"),
        header_cell("Category"),
    ]);
    apply_table_style(&mut table);
    for row in rows {
        let rule = match &row.rule {
            Some((MatchKind::Exact, key)) => Cell::new(key),
            Some((MatchKind::Pattern, key)) => Cell::new(format!("{key} (pattern)")),
            None => dim_cell("-"),
        };
        let output = if row.output.is_empty() {
            dim_cell("(empty)")
        } else {
            Cell::new(&row.output)
        };
        table.add_row(vec![
            Cell::new(&row.input),
            rule,
            output,
            category_cell(row.category),
        ]);
    }
    println!("{table}");
}

pub fn print_import(meta: &MappingMeta) {
    println!(
        "Saved {} mappings for station {} as version {}",
        meta.entry_count, meta.station, meta.version
    );
}

pub fn print_stations(stations: &[StationSummary]) {
    if stations.is_empty() {
        println!("No stations have mappings yet.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Station"),
        header_cell("Version"),
        header_cell("Entries"),
        header_cell("Created"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for station in stations {
        table.add_row(vec![
            Cell::new(&station.station)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            optional_cell(station.version.as_deref()),
            Cell::new(station.entry_count),
            optional_cell(station.created_at.as_deref()),
        ]);
    }
    println!("{table}");
}

fn count_row(label: Cell, counts: &TransformCounts) -> Vec<Cell> {
    vec![
        label,
        Cell::new(counts.total_cells),
        count_cell(counts.mapped_cells, Color::Green),
        Cell::new(counts.unchanged_cells),
        count_cell(counts.empty_cells, Color::Yellow),
        dim_cell(counts.untouched_cells),
    ]
}

fn category_cell(category: CellCategory) -> Cell {
    match category {
        CellCategory::Mapped => Cell::new("mapped").fg(Color::Green),
        CellCategory::Empty => Cell::new("empty").fg(Color::Yellow),
        CellCategory::Unchanged => Cell::new("unchanged"),
        CellCategory::Untouched => dim_cell("untouched"),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        dim_cell(count)
    } else {
        Cell::new(count).fg(color)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
