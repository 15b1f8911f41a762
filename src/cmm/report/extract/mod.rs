//! Reads the PCDmis report sheets of an origin workbook into a header block
//! and one measurement series per sheet.

use tracing::{debug, info, instrument, warn};

use crate::cmm::report::config::TransformConfig;
use crate::cmm::report::error::Result;
use crate::cmm::report::model::{CellValue, Sheet, Workbook, parse_optional_number};

/// Rows read from every report sheet.
pub const ROW_CAP: usize = 20;
/// Literal written into the method column of rows carrying a lower tolerance.
pub const METHOD_MARKER: &str = "CMM";

const COLUMN_A: u16 = 1;
const COLUMN_C: u16 = 3;
const COLUMN_D: u16 = 4;
const COLUMN_F: u16 = 6;
const COLUMN_G: u16 = 7;
const COLUMN_H: u16 = 8;
const COLUMN_I: u16 = 9;

/// One row of the header block written to columns A–E of the template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderRow {
    pub label: CellValue,
    pub value: CellValue,
    pub tolerance_plus: CellValue,
    pub tolerance_minus: CellValue,
    pub method_marker: CellValue,
}

impl HeaderRow {
    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|field| field.is_empty())
    }

    /// Fields in template column order.
    pub fn fields(&self) -> [&CellValue; 5] {
        [
            &self.label,
            &self.value,
            &self.tolerance_plus,
            &self.tolerance_minus,
            &self.method_marker,
        ]
    }
}

/// The fixed 20-row header block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderBlock {
    pub rows: [HeaderRow; ROW_CAP],
}

/// Which of the two measurement columns a sheet records its values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataColumn {
    H,
    I,
}

impl DataColumn {
    pub fn column(self) -> u16 {
        match self {
            DataColumn::H => COLUMN_H,
            DataColumn::I => COLUMN_I,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            DataColumn::H => "H",
            DataColumn::I => "I",
        }
    }
}

/// Tolerance inputs of one origin row. Missing or non-numeric cells are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToleranceRow {
    pub upper_bound: Option<f64>,
    pub lower_bound: Option<f64>,
    pub check_value: Option<f64>,
}

impl ToleranceRow {
    /// Out-of-tolerance test applied to a placed measurement.
    ///
    /// Each comparison is gated on the presence of the opposite bound, and an
    /// absent bound compares as `0.0`.
    pub fn is_out_of_tolerance(&self) -> bool {
        let Some(check) = self.check_value else {
            return false;
        };
        let upper = self.upper_bound.unwrap_or(0.0);
        let lower = self.lower_bound.unwrap_or(0.0);
        (self.lower_bound.is_some() && check > upper)
            || (self.upper_bound.is_some() && check < lower)
    }
}

/// Tolerance rows 1–20 of the origin sheet a series came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToleranceSpec {
    pub rows: [ToleranceRow; ROW_CAP],
}

impl ToleranceSpec {
    /// Tolerance for the 0-based series position `index`.
    pub fn row(&self, index: usize) -> ToleranceRow {
        self.rows.get(index).copied().unwrap_or_default()
    }
}

/// Measurements of one origin sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries {
    pub sheet_name: String,
    pub column: DataColumn,
    pub values: Vec<CellValue>,
    pub tolerances: ToleranceSpec,
}

impl MeasurementSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything read from the origin workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub header: HeaderBlock,
    /// Series in origin sheet order; sheets without data are absent.
    pub series: Vec<MeasurementSeries>,
    /// Number of prefixed sheets looked at, after the scan cap.
    pub sheets_scanned: usize,
}

impl Extraction {
    pub fn series_for(&self, sheet_name: &str) -> Option<&MeasurementSeries> {
        self.series
            .iter()
            .find(|series| series.sheet_name == sheet_name)
    }
}

/// Builds the header block and all measurement series from `origin`.
///
/// Fails only when the header sheet is missing.
#[instrument(level = "info", skip_all)]
pub fn extract(origin: &Workbook, config: &TransformConfig) -> Result<Extraction> {
    let header_sheet = origin.require_sheet("origin", &config.header_sheet)?;
    let header = build_header(header_sheet);
    info!(sheet = %config.header_sheet, "header block read");

    let report_sheets: Vec<&Sheet> = origin
        .sheets()
        .iter()
        .filter(|sheet| sheet.name().starts_with(&config.sheet_prefix))
        .take(config.max_report_sheets)
        .collect();
    info!(count = report_sheets.len(), prefix = %config.sheet_prefix, "report sheets found");

    let mut series = Vec::with_capacity(report_sheets.len());
    for sheet in &report_sheets {
        match read_series(sheet) {
            Some(entry) => {
                info!(
                    sheet = sheet.name(),
                    rows = entry.len(),
                    column = entry.column.letter(),
                    "series read"
                );
                series.push(entry);
            }
            None => debug!(sheet = sheet.name(), "no measurements, sheet skipped"),
        }
    }

    Ok(Extraction {
        header,
        series,
        sheets_scanned: report_sheets.len(),
    })
}

/// Reads the header block from rows 1–20 of `sheet`.
pub fn build_header(sheet: &Sheet) -> HeaderBlock {
    let mut block = HeaderBlock::default();
    for (index, slot) in block.rows.iter_mut().enumerate() {
        let row = index as u32 + 1;
        let a = sheet.value(row, COLUMN_A);
        let c = sheet.value(row, COLUMN_C);
        let d = sheet.value(row, COLUMN_D);
        let f = sheet.value(row, COLUMN_F);
        let g = sheet.value(row, COLUMN_G);

        if [a, c, d, f, g].iter().all(|value| value.is_empty()) {
            continue;
        }

        let nominal = match parse_optional_number(d) {
            Some(number) if number != 0.0 => d,
            _ => a,
        };

        *slot = HeaderRow {
            label: c.clone(),
            value: nominal.clone(),
            tolerance_plus: f.clone(),
            tolerance_minus: g.clone(),
            method_marker: if g.is_blank() {
                CellValue::Empty
            } else {
                CellValue::from(METHOD_MARKER)
            },
        };
    }
    block
}

/// Extracts the series of one report sheet, `None` when columns H and I are
/// both empty over rows 1–20.
pub fn read_series(sheet: &Sheet) -> Option<MeasurementSeries> {
    let row_count = series_length(sheet);
    if row_count == 0 {
        return None;
    }

    let column = select_data_column(sheet);
    let values = sheet
        .column_values(column.column(), 1..=row_count)
        .into_iter()
        .cloned()
        .collect();

    Some(MeasurementSeries {
        sheet_name: sheet.name().to_string(),
        column,
        values,
        tolerances: read_tolerances(sheet),
    })
}

/// Largest 1-based row, over columns H and I, holding a non-blank value.
pub fn series_length(sheet: &Sheet) -> u32 {
    last_filled_row(sheet, COLUMN_H).max(last_filled_row(sheet, COLUMN_I))
}

fn last_filled_row(sheet: &Sheet, column: u16) -> u32 {
    (1..=ROW_CAP as u32)
        .rev()
        .find(|row| !sheet.value(*row, column).is_blank())
        .unwrap_or(0)
}

/// Column H unless its numeric values sum to exactly zero, then column I.
pub fn select_data_column(sheet: &Sheet) -> DataColumn {
    if column_sum(sheet, COLUMN_H) == 0.0 {
        DataColumn::I
    } else {
        DataColumn::H
    }
}

fn column_sum(sheet: &Sheet, column: u16) -> f64 {
    let mut sum = 0.0;
    for row in 1..=ROW_CAP as u32 {
        let value = sheet.value(row, column);
        if value.is_blank() {
            continue;
        }
        match parse_optional_number(value) {
            Some(number) => sum += number,
            None => warn!(
                sheet = sheet.name(),
                row,
                value = %value,
                "non-numeric value ignored in column sum"
            ),
        }
    }
    sum
}

/// Reads upper bound (F), lower bound (G) and check value (I) of rows 1–20.
pub fn read_tolerances(sheet: &Sheet) -> ToleranceSpec {
    let mut spec = ToleranceSpec::default();
    for (index, slot) in spec.rows.iter_mut().enumerate() {
        let row = index as u32 + 1;
        *slot = ToleranceRow {
            upper_bound: parse_optional_number(sheet.value(row, COLUMN_F)),
            lower_bound: parse_optional_number(sheet.value(row, COLUMN_G)),
            check_value: parse_optional_number(sheet.value(row, COLUMN_I)),
        };
    }
    spec
}
