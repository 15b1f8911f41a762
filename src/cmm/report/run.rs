use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::cmm::report::config::TransformConfig;
use crate::cmm::report::distribute::{self, DistributionSummary};
use crate::cmm::report::error::{ReportError, Result};
use crate::cmm::report::extract::{self, Extraction};
use crate::cmm::report::io::{apply_regions, open_template, open_workbook, save_workbook};
use crate::cmm::report::model::Workbook;

/// Files taking part in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Workbook holding the PCDmis report sheets.
    pub origin: PathBuf,
    /// Template workbook to populate.
    pub template: PathBuf,
    /// Where to save the result; the template itself when `None`.
    pub output: Option<PathBuf>,
}

impl RunRequest {
    pub fn destination(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.template)
    }
}

/// Per-sheet line of the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesReport {
    pub sheet: String,
    pub rows: usize,
    pub column: String,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub destination: PathBuf,
    pub sheets_scanned: usize,
    pub series: Vec<SeriesReport>,
    pub distribution: DistributionSummary,
}

/// Runs the transform with today's local date.
pub fn process(request: &RunRequest, config: &TransformConfig) -> Result<RunSummary> {
    process_on(request, config, Local::now().date_naive())
}

/// Opens both workbooks, checks the preconditions, transforms the template
/// and saves it. Nothing is written when a precondition fails.
///
/// The template file is edited in place: only the header and series ranges,
/// their highlights, the date stamp and the pruned sheets change.
#[instrument(
    level = "info",
    skip_all,
    fields(origin = %request.origin.display(), template = %request.template.display())
)]
pub fn process_on(
    request: &RunRequest,
    config: &TransformConfig,
    today: NaiveDate,
) -> Result<RunSummary> {
    let mut target = open_workbook(&request.template)
        .inspect_err(|error| error!(%error, "cannot read template"))?;
    let origin =
        open_workbook(&request.origin).inspect_err(|error| error!(%error, "cannot read origin"))?;
    let mut document = open_template(&request.template)?;

    let (extraction, distribution) = transform(&mut target, &origin, config, today)
        .inspect_err(|error| error!(%error, "run aborted"))?;

    apply_regions(&mut document, &target, &distribute::managed_regions(config))?;
    let destination = request.destination().to_path_buf();
    save_workbook(&document, &destination)?;
    info!(
        destination = %destination.display(),
        sheets = extraction.sheets_scanned,
        "report saved"
    );

    Ok(RunSummary {
        destination,
        sheets_scanned: extraction.sheets_scanned,
        series: extraction
            .series
            .iter()
            .map(|series| SeriesReport {
                sheet: series.sheet_name.clone(),
                rows: series.len(),
                column: series.column.letter().to_string(),
            })
            .collect(),
        distribution,
    })
}

/// In-memory core of a run. The target is only touched once every
/// precondition has passed.
pub fn transform(
    target: &mut Workbook,
    origin: &Workbook,
    config: &TransformConfig,
    today: NaiveDate,
) -> Result<(Extraction, DistributionSummary)> {
    check_target(target, config)?;
    let extraction = extract::extract(origin, config)?;
    let distribution = distribute::distribute(target, &extraction, config, today);
    Ok((extraction, distribution))
}

/// Verifies the template has its main sheet and, when configured, that the
/// inspector cell names an accepted inspector.
pub fn check_target(target: &Workbook, config: &TransformConfig) -> Result<()> {
    let sheet = target.require_sheet("template", &config.target_sheet)?;

    let Some(allowed) = &config.allowed_inspectors else {
        return Ok(());
    };

    // Exact match: surrounding whitespace or a numeric cell fails the check.
    let found = sheet.value_at(config.inspector_cell);
    match found.as_text() {
        Some(name) if allowed.iter().any(|allowed| allowed == name) => {
            info!(inspector = name, "inspector check passed");
            Ok(())
        }
        _ => Err(ReportError::InspectorNotAllowed {
            cell: config.inspector_cell.to_string(),
            found: found.to_string(),
        }),
    }
}
