use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx};
use tracing::{debug, instrument};

use crate::cmm::report::error::{ReportError, Result};
use crate::cmm::report::model::{CellValue, Sheet, Workbook};

/// Loads every sheet of an `.xlsx` file into memory, in tab order.
///
/// Only cached values are read: a formula cell yields the result Excel last
/// computed for it, never its source.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn open_workbook(path: &Path) -> Result<Workbook> {
    if !path.exists() {
        return Err(ReportError::MissingInput(path.to_path_buf()));
    }

    let mut reader: Xlsx<_> = calamine::open_workbook(path)?;
    let names = reader.sheet_names().to_vec();
    let mut workbook = Workbook::new();

    for name in names {
        let mut sheet = Sheet::new(name.clone());
        if let Some(range) = reader.worksheet_range(&name) {
            ingest_values(&range?, &mut sheet);
        }
        debug!(sheet = %name, "sheet loaded");
        workbook.push_sheet(sheet)?;
    }

    Ok(workbook)
}

fn ingest_values(range: &Range<DataType>, sheet: &mut Sheet) {
    let (row_origin, col_origin) = range.start().unwrap_or((0, 0));
    for (row, col, cell) in range.cells() {
        let value = cell_to_value(cell);
        if value.is_empty() {
            continue;
        }
        let row = row_origin + row as u32 + 1;
        let column = (col_origin as usize + col + 1) as u16;
        sheet.set_value(row, column, value);
    }
}

fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Empty,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::DateTime(serial) => CellValue::Number(*serial),
        other => CellValue::Text(other.to_string()),
    }
}
