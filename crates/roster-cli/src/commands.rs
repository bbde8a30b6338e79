use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use roster_map::{
    CellMapper, MappingMeta, MappingRepository, MatcherProvider, StationSummary, import_file,
    normalize_station,
};
use roster_model::{Separators, TransformOptions};
use roster_xlsx::{TransformRequest, Workbook, transform_station};

use crate::cli::{ImportArgs, LookupArgs, MapArgs, SheetsArgs};
use crate::import::{import_workbook, is_workbook};
use crate::types::{LookupRow, MapResult, SheetSummary};

pub fn run_map(args: &MapArgs, mapping_dir: &Path) -> Result<MapResult> {
    let span = info_span!("map", input = %args.input.display(), station = %args.station);
    let _guard = span.enter();
    let start = Instant::now();

    let mut options = TransformOptions::new().with_unmapped_policy(args.unmapped.into());
    if let Some(raw) = &args.separators {
        let separators = Separators::parse(raw).context("parse --separators")?;
        options = options.with_separators(separators);
    }

    let workbook = Workbook::open(&args.input)
        .with_context(|| format!("read workbook {}", args.input.display()))?;
    let repository = MappingRepository::new(mapping_dir)
        .with_context(|| format!("open mapping directory {}", mapping_dir.display()))?;
    let request = TransformRequest::all_sheets()
        .with_sheets(args.sheets.iter().cloned())
        .with_mode(args.mode.into());

    let output = transform_station(&workbook, &args.station, &repository, &request, options)
        .with_context(|| format!("map {}", args.input.display()))?;

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => default_output_dir(&args.input),
    };
    let stem = file_stem(&args.input)?;
    let outputs = output
        .write_to(&output_dir, &stem)
        .with_context(|| format!("write outputs to {}", output_dir.display()))?;

    info!(
        outputs = outputs.len(),
        mapped_cells = output.stats.totals.mapped_cells,
        duration_ms = start.elapsed().as_millis(),
        "map complete"
    );

    Ok(MapResult {
        input: args.input.clone(),
        station: normalize_station(&args.station)?,
        mode: request.mode,
        outputs,
        stats: output.stats,
    })
}

pub fn run_sheets(args: &SheetsArgs) -> Result<Vec<SheetSummary>> {
    let workbook = Workbook::open(&args.input)
        .with_context(|| format!("read workbook {}", args.input.display()))?;
    workbook
        .sheets()
        .iter()
        .map(|info| {
            let worksheet = workbook
                .worksheet(&info.name)
                .with_context(|| format!("read sheet '{}'", info.name))?;
            Ok(SheetSummary {
                name: info.name.clone(),
                populated_cells: worksheet.populated_cells().count(),
                merges: worksheet.merges.len(),
                hidden: info.state.is_some(),
            })
        })
        .collect()
}

pub fn run_lookup(args: &LookupArgs, mapping_dir: &Path) -> Result<Vec<LookupRow>> {
    let repository = MappingRepository::new(mapping_dir)
        .with_context(|| format!("open mapping directory {}", mapping_dir.display()))?;
    let matcher = repository
        .matcher_for(&args.station)
        .with_context(|| format!("load mappings for station {}", args.station))?;
    let options = TransformOptions::new().with_unmapped_policy(args.unmapped.into());
    let mapper = CellMapper::new(&matcher, &options);

    Ok(args
        .codes
        .iter()
        .map(|code| {
            let outcome = mapper.map_text(code);
            LookupRow {
                input: code.clone(),
                rule: matcher
                    .explain(code)
                    .map(|found| (found.kind, found.key.to_string())),
                output: outcome.value,
                category: outcome.category,
            }
        })
        .collect())
}

pub fn run_import(args: &ImportArgs, mapping_dir: &Path) -> Result<MappingMeta> {
    let table = if is_workbook(&args.input) {
        import_workbook(&args.input, &args.station)?
    } else {
        import_file(&args.input, &args.station)
            .with_context(|| format!("import {}", args.input.display()))?
    };
    let repository = MappingRepository::new(mapping_dir)
        .with_context(|| format!("open mapping directory {}", mapping_dir.display()))?;
    let meta = repository
        .save(&table, args.replace, args.created_by.as_deref())
        .with_context(|| format!("save mappings for station {}", table.station_code()))?;
    info!(
        station = %meta.station,
        version = %meta.version,
        imported = table.entry_count(),
        entry_count = meta.entry_count,
        "import complete"
    );
    Ok(meta)
}

pub fn run_stations(mapping_dir: &Path) -> Result<Vec<StationSummary>> {
    let repository = MappingRepository::new(mapping_dir)
        .with_context(|| format!("open mapping directory {}", mapping_dir.display()))?;
    Ok(repository.list_stations()?)
}

fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn file_stem(input: &Path) -> Result<String> {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("input path has no file name: {}", input.display()))
}
