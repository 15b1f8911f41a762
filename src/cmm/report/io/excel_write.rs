use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use umya_spreadsheet::{Fill as FillStyle, Spreadsheet, Worksheet};

use crate::cmm::report::error::{ReportError, Result};
use crate::cmm::report::model::{CellRef, CellValue, Fill, Region, Sheet, Workbook};

/// The template file as an editable document. Everything outside the regions
/// handed to [`apply_regions`] is written back exactly as it was read: number
/// formats, borders, merges, widths, print setup and formulas.
pub struct TemplateDocument {
    book: Spreadsheet,
}

impl TemplateDocument {
    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect()
    }
}

/// Opens `path` for in-place editing.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn open_template(path: &Path) -> Result<TemplateDocument> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|error| ReportError::Template(error.to_string()))?;
    Ok(TemplateDocument { book })
}

/// Copies the cells of `result` inside `regions` onto the document and removes
/// the sheets `result` no longer has.
///
/// Styles of the touched cells are kept; only an out-of-tolerance fill is
/// added or taken away.
pub fn apply_regions(
    document: &mut TemplateDocument,
    result: &Workbook,
    regions: &[Region],
) -> Result<()> {
    for name in document.sheet_names() {
        let Some(sheet) = result.sheet(&name) else {
            document
                .book
                .remove_sheet_by_name(&name)
                .map_err(|error| ReportError::Template(error.to_string()))?;
            debug!(sheet = %name, "sheet removed");
            continue;
        };

        let worksheet = document
            .book
            .get_sheet_by_name_mut(&name)
            .ok_or_else(|| ReportError::missing_sheet("template", &name))?;
        for region in regions.iter().filter(|region| region.applies_to(&name)) {
            for cell in region.range.cells() {
                patch_cell(worksheet, sheet, cell);
            }
        }
        debug!(sheet = %name, "sheet patched");
    }
    Ok(())
}

fn patch_cell(worksheet: &mut Worksheet, sheet: &Sheet, reference: CellRef) {
    let coordinate = (u32::from(reference.column), reference.row);
    let value = sheet.value_at(reference);
    let fill = sheet.fill(reference.row, reference.column);

    if value.is_empty() && fill.is_none() {
        // Cells never created by the template stay absent.
        let Some(existing) = worksheet.get_cell(coordinate) else {
            return;
        };
        if existing.get_value().is_empty()
            && existing.get_formula().is_empty()
            && !has_highlight(existing)
        {
            return;
        }
    }

    let target = worksheet.get_cell_mut(coordinate);
    match value {
        CellValue::Empty => {
            target.set_blank();
        }
        CellValue::Text(text) => {
            target.set_value_string(text.clone());
        }
        CellValue::Number(number) => {
            target.set_value_number(*number);
        }
        CellValue::Boolean(flag) => {
            target.set_value_bool(*flag);
        }
    }

    match fill {
        Some(Fill::Solid { rgb }) => {
            target.get_style_mut().set_background_color(argb(rgb));
        }
        None if has_highlight(target) => {
            target.get_style_mut().set_fill(FillStyle::default());
        }
        None => {}
    }
}

fn argb(rgb: u32) -> String {
    format!("FF{rgb:06X}")
}

fn has_highlight(cell: &umya_spreadsheet::Cell) -> bool {
    let Fill::Solid { rgb } = Fill::OUT_OF_TOLERANCE;
    cell.get_style()
        .get_background_color()
        .is_some_and(|color| color.get_argb().eq_ignore_ascii_case(&argb(rgb)))
}

/// Writes the document to `path`, replacing any existing file.
///
/// The file is first written next to the destination and then renamed over
/// it, so a failed save leaves the previous file intact.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn save_workbook(document: &TemplateDocument, path: &Path) -> Result<()> {
    if document.book.get_sheet_collection().is_empty() {
        return Err(ReportError::InvalidWorkbook(
            "cannot save a workbook without sheets".into(),
        ));
    }

    let staging = staging_path(path);
    umya_spreadsheet::writer::xlsx::write(&document.book, &staging)
        .map_err(|error| ReportError::Template(error.to_string()))?;
    fs::rename(&staging, path)?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
