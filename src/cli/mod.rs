//! # Command-line runner
//!
//! Runs a collection file from CI: `apitest run collection.json --env prod`.
//! The exit code tells the pipeline whether every case passed, and the JSON
//! summary can be written to a report file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::collections::Collection;
use crate::config::EngineConfig;
use crate::domain::{stringify, RunSummary};
use crate::engine::runner::Runner;
use crate::error::EngineError;

#[derive(Debug, Parser)]
#[command(name = "apitest", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the test cases of a collection file
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Collection file (JSON)
    pub collection: PathBuf,

    /// Environment to resolve relative URLs against
    #[arg(short, long)]
    pub env: Option<String>,

    /// Only run the named case; repeat to select several
    #[arg(long = "case")]
    pub cases: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the JSON summary to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Engine settings (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Output format for CLI reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Execute the parsed command. `Ok(true)` means every selected case passed.
pub async fn execute(cli: Cli) -> Result<bool, EngineError> {
    match cli.command {
        Command::Run(args) => run(args).await,
    }
}

pub async fn run(args: RunArgs) -> Result<bool, EngineError> {
    let config = EngineConfig::load(args.config.as_deref())?;
    let collection = Collection::load(&args.collection)?;
    let environment = args
        .env
        .as_deref()
        .map(|name| collection.environment(name))
        .transpose()?;

    tracing::info!(
        service = %config.service_name,
        collection = %args.collection.display(),
        environment = args.env.as_deref().unwrap_or("-"),
        "starting run"
    );

    let runner = Runner::from_config(&config)?;
    let summary = runner
        .run_collection(&collection, environment, &args.cases)
        .await;

    let rendered = match args.format {
        OutputFormat::Text => render_text(&summary),
        OutputFormat::Json => render_json(&summary)?,
    };
    println!("{rendered}");

    if let Some(path) = &args.report {
        write_report(path, &summary)?;
    }

    Ok(summary.all_passed())
}

pub fn render_json(summary: &RunSummary) -> Result<String, EngineError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// One line per case, plus one indented line per failing rule.
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = String::new();

    for report in &summary.reports {
        let verdict = if report.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "{verdict}  {}  [{}] {:.0}ms",
            report.name,
            report.result.status_code,
            report.result.duration * 1000.0
        );

        if let Some(error) = &report.result.error {
            let _ = writeln!(out, "      request error: {error}");
        }

        for outcome in report.assertions.iter().filter(|outcome| !outcome.passed) {
            let rule = &outcome.rule;
            let target = match &rule.expression {
                Some(expression) => format!("{} {expression}", rule.source.as_str()),
                None => rule.source.as_str().to_string(),
            };
            let detail = match &outcome.error {
                Some(error) => error.clone(),
                None => format!("actual {}", stringify(&outcome.actual_value)),
            };
            let _ = writeln!(
                out,
                "      {target} {} {}: {detail}",
                rule.operator.as_str(),
                rule.value
            );
        }
    }

    let _ = write!(
        out,
        "{}: {} passed, {} failed, {} total ({:.2}s)",
        summary.name, summary.passed, summary.failed, summary.total, summary.duration
    );
    out
}

pub fn write_report(path: &Path, summary: &RunSummary) -> Result<(), EngineError> {
    let raw = render_json(summary)?;
    fs::write(path, raw).map_err(|source| EngineError::File {
        path: path.to_path_buf(),
        source,
    })
}
