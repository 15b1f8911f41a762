use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use crate::cmm::report::error::{ReportError, Result};

static EMPTY_VALUE: CellValue = CellValue::Empty;

/// Value held by a single worksheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Nothing stored in the cell.
    #[default]
    Empty,
    /// Plain text.
    Text(String),
    /// Numeric literal. Integers read from disk are widened to `f64`.
    Number(f64),
    /// Boolean literal.
    Boolean(bool),
}

impl CellValue {
    /// True when no value is stored at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// True when the cell is absent or holds the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => write!(f, "{text}"),
            CellValue::Number(number) => write!(f, "{number}"),
            CellValue::Boolean(flag) => write!(f, "{}", if *flag { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

/// Reads a cell as a number, accepting numeric text. Anything that cannot be
/// interpreted as a number yields `None`.
pub fn parse_optional_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(number) => Some(*number),
        CellValue::Boolean(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        CellValue::Text(text) => text.trim().parse::<f64>().ok(),
        CellValue::Empty => None,
    }
}

/// Background fill applied to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Opaque single-colour fill, `0xRRGGBB`.
    Solid { rgb: u32 },
}

impl Fill {
    /// Solid red marking a measurement outside its tolerance band.
    pub const OUT_OF_TOLERANCE: Fill = Fill::Solid { rgb: 0xFF0000 };
}

/// A cell: its value plus an optional highlight.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub fill: Option<Fill>,
}

impl Cell {
    fn is_vacant(&self) -> bool {
        self.value.is_empty() && self.fill.is_none()
    }
}

/// 1-based cell coordinate, printable and parseable in `A1` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub column: u16,
}

impl CellRef {
    pub const fn new(row: u32, column: u16) -> Self {
        Self { row, column }
    }

    /// Parses references such as `F29` or `aa3`.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        let split = reference.find(|ch: char| ch.is_ascii_digit())?;
        let (letters, digits) = reference.split_at(split);
        let column = column_number(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self { row, column })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl CellRange {
    pub const fn new(first: CellRef, last: CellRef) -> Self {
        Self { first, last }
    }

    pub const fn single(cell: CellRef) -> Self {
        Self {
            first: cell,
            last: cell,
        }
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.first.row..=self.last.row).contains(&cell.row)
            && (self.first.column..=self.last.column).contains(&cell.column)
    }

    /// Every cell of the rectangle, row by row.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + use<> {
        let columns = self.first.column..=self.last.column;
        (self.first.row..=self.last.row).flat_map(move |row| {
            columns
                .clone()
                .map(move |column| CellRef::new(row, column))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

/// A range owned by the transform, on one named sheet or on every sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// `None` applies the range to every sheet.
    pub sheet: Option<String>,
    pub range: CellRange,
}

impl Region {
    pub fn applies_to(&self, sheet_name: &str) -> bool {
        self.sheet.as_deref().is_none_or(|name| name == sheet_name)
    }
}

/// Converts column letters (`A`, `Z`, `AA`) to a 1-based column number.
pub fn column_number(letters: &str) -> Option<u16> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut number: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        number = number * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    u16::try_from(number).ok()
}

/// Converts a 1-based column number into its letters.
pub fn column_letters(mut column: u16) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let remainder = (column - 1) % 26;
        letters.push((b'A' + remainder as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A named worksheet holding a sparse map of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<CellRef, Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, row: u32, column: u16) -> Option<&Cell> {
        self.cells.get(&CellRef::new(row, column))
    }

    /// Value at the coordinate, `Empty` when nothing is stored.
    pub fn value(&self, row: u32, column: u16) -> &CellValue {
        self.cell(row, column)
            .map(|cell| &cell.value)
            .unwrap_or(&EMPTY_VALUE)
    }

    pub fn value_at(&self, reference: CellRef) -> &CellValue {
        self.value(reference.row, reference.column)
    }

    pub fn fill(&self, row: u32, column: u16) -> Option<Fill> {
        self.cell(row, column).and_then(|cell| cell.fill)
    }

    pub fn set_value(&mut self, row: u32, column: u16, value: impl Into<CellValue>) {
        let key = CellRef::new(row, column);
        let cell = self.cells.entry(key).or_default();
        cell.value = value.into();
        if cell.is_vacant() {
            self.cells.remove(&key);
        }
    }

    pub fn set_value_at(&mut self, reference: CellRef, value: impl Into<CellValue>) {
        self.set_value(reference.row, reference.column, value);
    }

    pub fn set_fill(&mut self, row: u32, column: u16, fill: Option<Fill>) {
        let key = CellRef::new(row, column);
        let cell = self.cells.entry(key).or_default();
        cell.fill = fill;
        if cell.is_vacant() {
            self.cells.remove(&key);
        }
    }

    /// Removes value and highlight from every cell of the rectangle.
    pub fn clear_range(&mut self, range: CellRange) {
        self.cells.retain(|key, _| !range.contains(*key));
    }

    /// Values of one column over the given rows, empty cells included.
    pub fn column_values(&self, column: u16, rows: RangeInclusive<u32>) -> Vec<&CellValue> {
        rows.map(|row| self.value(row, column)).collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &Cell)> {
        self.cells.iter().map(|(key, cell)| (*key, cell))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Ordered collection of sheets; sheet order matches the file's tab order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new empty sheet and returns it for population.
    pub fn add_sheet(&mut self, name: impl Into<String>) -> Result<&mut Sheet> {
        let name = name.into();
        if self.contains_sheet(&name) {
            return Err(ReportError::DuplicateSheet(name));
        }
        self.sheets.push(Sheet::new(name));
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    pub fn push_sheet(&mut self, sheet: Sheet) -> Result<()> {
        if self.contains_sheet(sheet.name()) {
            return Err(ReportError::DuplicateSheet(sheet.name().to_string()));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(Sheet::name)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn contains_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|sheet| sheet.name() == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.name() == name)
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut [Sheet] {
        &mut self.sheets
    }

    pub fn remove_sheet(&mut self, name: &str) -> Option<Sheet> {
        let index = self.sheets.iter().position(|sheet| sheet.name() == name)?;
        Some(self.sheets.remove(index))
    }

    /// Looks up a sheet that must exist; `label` names the workbook in the error.
    pub fn require_sheet(&self, label: &str, name: &str) -> Result<&Sheet> {
        self.sheet(name)
            .ok_or_else(|| ReportError::missing_sheet(label, name))
    }
}
