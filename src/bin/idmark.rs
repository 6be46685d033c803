//! idmark - highlight spreadsheet identifiers inside a PDF
//!
//! Reads identifiers from the first column of a spreadsheet or CSV file, marks
//! every occurrence in the PDF, and writes only the pages that matched.
//!
//! Usage:
//!   idmark statement.pdf ids.xlsx
//!   idmark statement.pdf ids.csv --policy row --full-width --out-dir out
//!   idmark statement.pdf ids.csv --phrase "EMPLOYEES PROVIDENT FUND" --json
//!
//! Outputs, inside the output directory:
//!   highlighted_<document name>   annotated document
//!   Data_Not_Found.csv            identifiers never found (only when non-empty)

use clap::{ArgAction, Parser, ValueEnum};
use pdf_idmark::config::DEFAULT_FULL_WIDTH_MARGIN;
use pdf_idmark::identifiers::load_identifiers_from_path;
use pdf_idmark::{unmatched_report, Engine, HighlightPolicy, IdmarkConfig, PdfDocument, Result, RowSpan};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Name of the unmatched report file.
const REPORT_FILE: &str = "Data_Not_Found.csv";

/// Extent of each highlight.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Only the matched token
    Token,
    /// The whole text row of the matched token
    Row,
}

impl From<PolicyArg> for HighlightPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Token => HighlightPolicy::TokenBound,
            PolicyArg::Row => HighlightPolicy::RowBound,
        }
    }
}

/// Highlight identifiers from a spreadsheet inside a PDF and keep only the
/// pages that matched.
#[derive(Parser, Debug)]
#[command(name = "idmark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PDF document to search
    document: PathBuf,

    /// Identifier source (xlsx, xls, xlsb, ods or delimited text)
    identifiers: PathBuf,

    /// Directory for the annotated document and the report
    #[arg(short = 'o', long = "out-dir", default_value = "results")]
    out_dir: PathBuf,

    /// Highlight extent (overrides the config file)
    #[arg(short = 'p', long, value_enum)]
    policy: Option<PolicyArg>,

    /// Stretch row highlights across the page width
    #[arg(long = "full-width", action = ArgAction::SetTrue)]
    full_width: bool,

    /// Vertical tolerance for row grouping, in points
    #[arg(long = "row-tolerance")]
    row_tolerance: Option<f32>,

    /// Structural phrase to always highlight (repeatable)
    #[arg(long = "phrase", action = ArgAction::Append)]
    phrases: Vec<String>,

    /// The identifier source starts with a header row
    #[arg(long, action = ArgAction::SetTrue)]
    header: bool,

    /// Worksheet to read instead of the first one
    #[arg(long)]
    sheet: Option<String>,

    /// JSON configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print the run result as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

impl Args {
    /// Configuration file (or defaults) with command line overrides applied.
    fn resolve_config(&self) -> Result<IdmarkConfig> {
        let mut config = match &self.config {
            Some(path) => IdmarkConfig::from_json_file(path)?,
            None => IdmarkConfig::default(),
        };

        if let Some(policy) = self.policy {
            config.engine.policy = policy.into();
        }
        if self.full_width {
            config.engine.rows.span = RowSpan::FullWidth {
                margin: DEFAULT_FULL_WIDTH_MARGIN,
            };
        }
        if let Some(tolerance) = self.row_tolerance {
            config.engine.rows.tolerance = tolerance;
        }
        config.engine.fixed_phrases.extend(self.phrases.iter().cloned());
        if self.header {
            config.loader.has_header = true;
        }
        if let Some(sheet) = &self.sheet {
            config.loader.sheet = Some(sheet.clone());
        }

        config.engine.validate()?;
        Ok(config)
    }
}

fn output_name(document: &Path) -> String {
    let name = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    format!("highlighted_{}", name)
}

fn run(args: &Args) -> Result<()> {
    let config = args.resolve_config()?;
    let identifiers = load_identifiers_from_path(&args.identifiers, &config.loader)?;
    let mut doc = PdfDocument::open(&args.document)?;
    let engine = Engine::new(config.engine.clone())?;

    fs::create_dir_all(&args.out_dir)?;
    let output_path = args.out_dir.join(output_name(&args.document));
    let mut out = BufWriter::new(File::create(&output_path)?);
    let result = engine.run_to_writer(&mut doc, &identifiers, &mut out)?;
    out.flush()?;
    log::info!("Wrote {}", output_path.display());

    let report_path = args.out_dir.join(REPORT_FILE);
    match unmatched_report(&result.unmatched_identifiers, &config.report_column)? {
        Some(bytes) => {
            fs::write(&report_path, bytes)?;
            log::info!("Wrote {}", report_path.display());
        },
        None => log::info!("Every identifier was found, no report written"),
    }

    if args.json {
        println!("{}", result.to_json()?);
    } else {
        println!("Output:      {}", output_path.display());
        println!("Pages kept:  {}", result.output_pages.len());
        println!("Highlights:  {}", result.total_highlights);
        println!(
            "Found:       {} of {} identifiers",
            result.found_identifiers.len(),
            identifiers.len()
        );
        if !result.unmatched_identifiers.is_empty() {
            println!(
                "Not found:   {} (see {})",
                result.unmatched_identifiers.len(),
                report_path.display()
            );
        }
        let failed = result.failed_pages();
        if !failed.is_empty() {
            println!("Unreadable pages: {:?}", failed);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
