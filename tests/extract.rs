use cmm_report_tools::ReportError;
use cmm_report_tools::config::TransformConfig;
use cmm_report_tools::extract::{
    self, DataColumn, METHOD_MARKER, ToleranceRow, build_header, read_series, select_data_column,
    series_length,
};
use cmm_report_tools::model::{CellValue, Sheet, Workbook};

const H: u16 = 8;
const I: u16 = 9;

fn sheet_with_column(name: &str, column: u16, values: &[f64]) -> Sheet {
    let mut sheet = Sheet::new(name);
    for (index, value) in values.iter().enumerate() {
        sheet.set_value(index as u32 + 1, column, *value);
    }
    sheet
}

#[test]
fn nonzero_sum_in_column_h_selects_h() {
    let mut values = vec![1.0, 2.0];
    values.resize(20, 0.0);
    let sheet = sheet_with_column("PCDmisExcel1", H, &values);

    assert_eq!(select_data_column(&sheet), DataColumn::H);
}

#[test]
fn zero_sum_in_column_h_selects_i() {
    let sheet = sheet_with_column("PCDmisExcel1", H, &[0.0; 20]);
    assert_eq!(select_data_column(&sheet), DataColumn::I);

    let empty = Sheet::new("PCDmisExcel2");
    assert_eq!(select_data_column(&empty), DataColumn::I);

    let mut cancelling = sheet_with_column("PCDmisExcel3", H, &[1.5, -1.5]);
    cancelling.set_value(3, H, "OK");
    assert_eq!(select_data_column(&cancelling), DataColumn::I);
}

#[test]
fn series_from_column_i_when_h_is_empty() {
    let sheet = sheet_with_column("PCDmisExcel4", I, &[10.1, 10.2, 10.3, 10.4, 10.5]);

    let series = read_series(&sheet).expect("series present");

    assert_eq!(series.column, DataColumn::I);
    assert_eq!(series.len(), 5);
    assert_eq!(series.values[4], CellValue::Number(10.5));
}

#[test]
fn series_length_is_the_longer_of_h_and_i() {
    let mut sheet = sheet_with_column("PCDmisExcel1", H, &[1.0, 2.0, 3.0]);
    sheet.set_value(7, I, 4.0);

    assert_eq!(series_length(&sheet), 7);
    let series = read_series(&sheet).expect("series present");
    assert_eq!(series.column, DataColumn::H);
    assert_eq!(series.len(), 7);
    assert_eq!(series.values[2], CellValue::Number(3.0));
    assert!(series.values[6].is_empty());
}

#[test]
fn values_below_row_twenty_are_ignored() {
    let mut sheet = Sheet::new("PCDmisExcel1");
    sheet.set_value(21, H, 9.0);
    sheet.set_value(30, I, 9.0);

    assert_eq!(series_length(&sheet), 0);
    assert!(read_series(&sheet).is_none());
}

#[test]
fn header_value_falls_back_to_a_when_d_is_zero() {
    let mut sheet = Sheet::new("PCDmisExcel1");
    sheet.set_value(1, 1, "12.3");
    sheet.set_value(1, 3, "L1");
    sheet.set_value(1, 4, 0.0);
    sheet.set_value(1, 6, "+0.1");
    sheet.set_value(1, 7, "-0.1");

    sheet.set_value(2, 1, 1.0);
    sheet.set_value(2, 3, "L2");
    sheet.set_value(2, 4, 25.4);

    sheet.set_value(3, 3, "L3");
    sheet.set_value(3, 4, "n/a");
    sheet.set_value(3, 1, 7.0);

    let header = build_header(&sheet);

    let first = &header.rows[0];
    assert_eq!(first.label, CellValue::from("L1"));
    assert_eq!(first.value, CellValue::from("12.3"));
    assert_eq!(first.tolerance_plus, CellValue::from("+0.1"));
    assert_eq!(first.tolerance_minus, CellValue::from("-0.1"));
    assert_eq!(first.method_marker, CellValue::from(METHOD_MARKER));

    let second = &header.rows[1];
    assert_eq!(second.value, CellValue::Number(25.4));
    assert!(second.method_marker.is_empty());

    assert_eq!(header.rows[2].value, CellValue::Number(7.0));
}

#[test]
fn header_row_is_blank_only_when_all_sources_are_empty() {
    let mut sheet = Sheet::new("PCDmisExcel1");
    sheet.set_value(5, 6, 0.05);
    // Column B and E are not header sources.
    sheet.set_value(6, 2, "ignored");
    sheet.set_value(6, 5, "ignored");

    let header = build_header(&sheet);

    assert!(header.rows[0].is_blank());
    assert!(!header.rows[4].is_blank());
    assert_eq!(header.rows[4].tolerance_plus, CellValue::Number(0.05));
    assert!(header.rows[5].is_blank());
}

#[test]
fn extraction_follows_sheet_order_prefix_and_cap() {
    let mut origin = Workbook::new();
    origin
        .push_sheet(sheet_with_column("PCDmisExcel1", H, &[1.0]))
        .expect("sheet");
    origin
        .push_sheet(sheet_with_column("Summary", H, &[1.0]))
        .expect("sheet");
    origin.push_sheet(Sheet::new("PCDmisExcel2")).expect("sheet");
    origin
        .push_sheet(sheet_with_column("PCDmisExcel3", I, &[3.0, 3.1]))
        .expect("sheet");
    origin
        .push_sheet(sheet_with_column("PCDmisExcel4", H, &[4.0]))
        .expect("sheet");

    let config = TransformConfig {
        max_report_sheets: 3,
        ..TransformConfig::default()
    };
    let extraction = extract::extract(&origin, &config).expect("extraction");

    assert_eq!(extraction.sheets_scanned, 3);
    let names: Vec<&str> = extraction
        .series
        .iter()
        .map(|series| series.sheet_name.as_str())
        .collect();
    assert_eq!(names, ["PCDmisExcel1", "PCDmisExcel3"]);
    assert_eq!(
        extraction.series_for("PCDmisExcel3").map(|series| series.len()),
        Some(2)
    );
}

#[test]
fn extraction_requires_the_header_sheet() {
    let mut origin = Workbook::new();
    origin
        .push_sheet(sheet_with_column("PCDmisExcel2", H, &[1.0]))
        .expect("sheet");

    let result = extract::extract(&origin, &TransformConfig::default());

    assert!(matches!(
        result,
        Err(ReportError::MissingSheet { sheet, .. }) if sheet == "PCDmisExcel1"
    ));
}

#[test]
fn tolerances_default_to_none_for_non_numeric_cells() {
    let mut sheet = sheet_with_column("PCDmisExcel1", I, &[5.0, 0.0]);
    sheet.set_value(1, 6, 3.0);
    sheet.set_value(1, 7, "-3");
    sheet.set_value(2, 6, "OUT");

    let spec = extract::read_tolerances(&sheet);

    assert_eq!(
        spec.row(0),
        ToleranceRow {
            upper_bound: Some(3.0),
            lower_bound: Some(-3.0),
            check_value: Some(5.0),
        }
    );
    assert_eq!(spec.row(1).upper_bound, None);
    assert_eq!(spec.row(19), ToleranceRow::default());
    assert_eq!(spec.row(40), ToleranceRow::default());
}
