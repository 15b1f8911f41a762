use crate::cmm::report::model::CellRef;

/// Inspectors allowed to sign off a report by default.
pub const DEFAULT_INSPECTORS: [&str; 2] = ["李春宁", "刘文"];

/// Tunables for one origin → template transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    /// Prefix selecting the measurement sheets of the origin workbook.
    pub sheet_prefix: String,
    /// Origin sheet the header block is read from.
    pub header_sheet: String,
    /// Upper bound on the number of measurement sheets scanned.
    pub max_report_sheets: usize,
    /// Sheet every template must contain.
    pub target_sheet: String,
    /// Cell of `target_sheet` carrying the inspector's name.
    pub inspector_cell: CellRef,
    /// Accepted inspector names. `None` disables the check.
    pub allowed_inspectors: Option<Vec<String>>,
    /// Where the run date goes on `target_sheet`, if anywhere.
    pub date_stamp_cell: Option<CellRef>,
    /// `chrono` format string for the date stamp.
    pub date_format: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            sheet_prefix: "PCDmisExcel".to_string(),
            header_sheet: "PCDmisExcel1".to_string(),
            max_report_sheets: 200,
            target_sheet: "Sheet1".to_string(),
            inspector_cell: CellRef::new(29, 6),
            allowed_inspectors: Some(
                DEFAULT_INSPECTORS
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            ),
            date_stamp_cell: Some(CellRef::new(4, 3)),
            date_format: "%Y.%m.%d".to_string(),
        }
    }
}
