//! Lays the extracted header block and measurement series out on the sheets
//! of the template workbook.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cmm::report::config::TransformConfig;
use crate::cmm::report::extract::{Extraction, HeaderBlock, MeasurementSeries};
use crate::cmm::report::model::{CellRange, CellRef, CellValue, Fill, Region, Sheet, Workbook};

/// First template row of the header and series regions.
pub const FIRST_ROW: u32 = 8;
/// Last template row of the header and series regions.
pub const LAST_ROW: u32 = 27;
/// Columns A–E hold the header block.
pub const HEADER_FIRST_COLUMN: u16 = 1;
pub const HEADER_LAST_COLUMN: u16 = 5;
/// Columns F–Y hold the packed series.
pub const SERIES_FIRST_COLUMN: u16 = 6;
pub const SERIES_LAST_COLUMN: u16 = 25;
/// Series slots on one template sheet.
pub const SERIES_PER_SHEET: usize = 20;
/// Text some templates use to mark an unused F8.
pub const EMPTY_SENTINEL: &str = "###EMPTY###";
/// Cell checked to decide whether a template sheet received data.
pub const PRUNE_CELL: CellRef = CellRef::new(FIRST_ROW, SERIES_FIRST_COLUMN);

/// A8:E27.
pub const HEADER_RANGE: CellRange = CellRange::new(
    CellRef::new(FIRST_ROW, HEADER_FIRST_COLUMN),
    CellRef::new(LAST_ROW, HEADER_LAST_COLUMN),
);
/// F8:Y27.
pub const SERIES_RANGE: CellRange = CellRange::new(
    CellRef::new(FIRST_ROW, SERIES_FIRST_COLUMN),
    CellRef::new(LAST_ROW, SERIES_LAST_COLUMN),
);

const SLOT_ROWS: usize = (LAST_ROW - FIRST_ROW + 1) as usize;

/// Template sheet and column a series lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub sheet_index: usize,
    pub column: u16,
}

/// Slot for the `index`-th series (0-based).
pub fn placement(index: usize) -> Placement {
    Placement {
        sheet_index: index / SERIES_PER_SHEET,
        column: (index % SERIES_PER_SHEET) as u16 + SERIES_FIRST_COLUMN,
    }
}

/// Counts produced by [`write_series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeriesOutcome {
    pub placed: usize,
    pub dropped: usize,
    pub highlighted: usize,
}

/// Result of [`prune_empty_sheets`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PruneOutcome {
    /// Sheets whose F8 was empty.
    pub empty: Vec<String>,
    /// False when removing `empty` would have left no sheet.
    pub deleted: bool,
}

/// Everything [`distribute`] did to the template.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DistributionSummary {
    pub series: SeriesOutcome,
    pub pruning: PruneOutcome,
    pub date_stamp: Option<String>,
}

/// Cells [`distribute`] may change: the header and series ranges of every
/// sheet, plus the date stamp cell of the main sheet.
pub fn managed_regions(config: &TransformConfig) -> Vec<Region> {
    let mut regions = vec![
        Region {
            sheet: None,
            range: HEADER_RANGE,
        },
        Region {
            sheet: None,
            range: SERIES_RANGE,
        },
    ];
    if let Some(cell) = config.date_stamp_cell {
        regions.push(Region {
            sheet: Some(config.target_sheet.clone()),
            range: CellRange::single(cell),
        });
    }
    regions
}

/// Runs header write, series write with highlighting, pruning, and the date
/// stamp, in that order.
#[instrument(level = "info", skip_all, fields(sheets = target.sheet_count()))]
pub fn distribute(
    target: &mut Workbook,
    extraction: &Extraction,
    config: &TransformConfig,
    today: NaiveDate,
) -> DistributionSummary {
    write_header(target, &extraction.header);
    info!("header block written to A8:E27");

    let series = write_series(target, &extraction.series);
    info!(
        placed = series.placed,
        dropped = series.dropped,
        highlighted = series.highlighted,
        "series written to F8:Y27"
    );

    let pruning = prune_empty_sheets(target);

    let date_stamp = config.date_stamp_cell.and_then(|cell| {
        let text = today.format(&config.date_format).to_string();
        stamp_date(target, &config.target_sheet, cell, &text).then_some(text)
    });

    DistributionSummary {
        series,
        pruning,
        date_stamp,
    }
}

/// Clears A8:E27 on every sheet and writes the header block there.
pub fn write_header(target: &mut Workbook, header: &HeaderBlock) {
    for sheet in target.sheets_mut() {
        sheet.clear_range(HEADER_RANGE);
        for (index, row) in header.rows.iter().enumerate() {
            let target_row = FIRST_ROW + index as u32;
            for (offset, field) in row.fields().into_iter().enumerate() {
                if !field.is_empty() {
                    sheet.set_value(target_row, HEADER_FIRST_COLUMN + offset as u16, field.clone());
                }
            }
        }
    }
}

/// Clears F8:Y27 on every sheet, then packs the series twenty to a sheet.
///
/// Series that do not fit on the available sheets are dropped.
pub fn write_series(target: &mut Workbook, series: &[MeasurementSeries]) -> SeriesOutcome {
    for sheet in target.sheets_mut() {
        sheet.clear_range(SERIES_RANGE);
    }

    let mut outcome = SeriesOutcome::default();
    for (index, entry) in series.iter().enumerate() {
        let slot = placement(index);
        match target.sheet_at_mut(slot.sheet_index) {
            Some(sheet) => {
                outcome.highlighted += place_series(sheet, slot.column, entry);
                outcome.placed += 1;
            }
            None => {
                debug!(sheet = %entry.sheet_name, index, "no template sheet left, series dropped");
                outcome.dropped += 1;
            }
        }
    }

    if outcome.dropped > 0 {
        warn!(
            dropped = outcome.dropped,
            capacity = target.sheet_count() * SERIES_PER_SHEET,
            "more series than template slots"
        );
    }
    outcome
}

fn place_series(sheet: &mut Sheet, column: u16, entry: &MeasurementSeries) -> usize {
    let mut highlighted = 0;
    for (index, value) in entry.values.iter().take(SLOT_ROWS).enumerate() {
        let row = FIRST_ROW + index as u32;
        sheet.set_value(row, column, value.clone());
        if entry.tolerances.row(index).is_out_of_tolerance() {
            sheet.set_fill(row, column, Some(Fill::OUT_OF_TOLERANCE));
            highlighted += 1;
        }
    }
    highlighted
}

/// True when F8 of `sheet` carries no measurement.
pub fn is_empty_result(sheet: &Sheet) -> bool {
    match sheet.value_at(PRUNE_CELL) {
        CellValue::Text(text) => text.is_empty() || text == EMPTY_SENTINEL,
        value => value.is_empty(),
    }
}

/// Deletes every sheet without data in F8, unless that would delete them all.
pub fn prune_empty_sheets(target: &mut Workbook) -> PruneOutcome {
    let empty: Vec<String> = target
        .sheets()
        .iter()
        .filter(|sheet| is_empty_result(sheet))
        .map(|sheet| sheet.name().to_string())
        .collect();

    if empty.is_empty() {
        return PruneOutcome::default();
    }

    if empty.len() >= target.sheet_count() {
        warn!("every sheet has an empty F8, keeping all sheets");
        return PruneOutcome {
            empty,
            deleted: false,
        };
    }

    for name in &empty {
        target.remove_sheet(name);
    }
    info!(sheets = ?empty, "empty sheets deleted");
    PruneOutcome {
        empty,
        deleted: true,
    }
}

/// Writes `text` into `cell` of `sheet_name`. Returns false when the sheet no
/// longer exists.
pub fn stamp_date(target: &mut Workbook, sheet_name: &str, cell: CellRef, text: &str) -> bool {
    match target.sheet_mut(sheet_name) {
        Some(sheet) => {
            sheet.set_value_at(cell, text);
            info!(sheet = sheet_name, %cell, date = text, "date stamped");
            true
        }
        None => {
            warn!(sheet = sheet_name, "sheet gone after pruning, date not stamped");
            false
        }
    }
}
