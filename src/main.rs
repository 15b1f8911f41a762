use std::path::PathBuf;

use clap::Parser;
use cmm_report_tools::config::TransformConfig;
use cmm_report_tools::run::{self, RunRequest};
use cmm_report_tools::{Result, logging};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = logging::init(Some(&cli.log_file)) {
        eprintln!("error: {error}");
    }
    if let Err(error) = execute(cli) {
        error!(%error, "run failed, template left unchanged");
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    info!("=== run started ===");
    let config = cli.config();
    let request = RunRequest {
        origin: cli.origin,
        template: cli.template,
        output: cli.output,
    };

    let summary = run::process(&request, &config)?;
    if cli.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    info!(
        sheets = summary.sheets_scanned,
        "processing complete for {} PCDmisExcel sheets",
        summary.sheets_scanned
    );
    info!("=== run finished ===");
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Fill a CMM inspection report template from a PCDmis Excel export."
)]
struct Cli {
    /// Workbook exported by PCDmis (the PCDmisExcel* sheets).
    #[arg(long)]
    origin: PathBuf,

    /// Report template to populate. Overwritten unless --output is given.
    #[arg(long)]
    template: PathBuf,

    /// Write the filled report here and leave the template untouched.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Accepted inspector name in Sheet1!F29. Repeat for several names.
    #[arg(long = "inspector", value_name = "NAME")]
    inspectors: Vec<String>,

    /// Skip the inspector check.
    #[arg(long, conflicts_with = "inspectors")]
    any_inspector: bool,

    /// Do not write the run date into Sheet1!C4.
    #[arg(long)]
    no_date_stamp: bool,

    /// Maximum number of PCDmisExcel sheets to read.
    #[arg(long, default_value_t = 200)]
    max_sheets: usize,

    /// File the run log is appended to.
    #[arg(long, default_value = "process.log")]
    log_file: PathBuf,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    summary_json: bool,
}

impl Cli {
    fn config(&self) -> TransformConfig {
        let mut config = TransformConfig {
            max_report_sheets: self.max_sheets,
            ..TransformConfig::default()
        };
        if self.any_inspector {
            config.allowed_inspectors = None;
        } else if !self.inspectors.is_empty() {
            config.allowed_inspectors = Some(self.inspectors.clone());
        }
        if self.no_date_stamp {
            config.date_stamp_cell = None;
        }
        config
    }
}
