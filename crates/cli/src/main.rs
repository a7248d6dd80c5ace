//! # sheetmerge-cli
//!
//! Command-line interface for merging spreadsheets into a per-session table.

mod store;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use sheetmerge_sheet::{
    BatchReport, FailedFile, FailureReason, Session, SessionId, SessionStore, Table,
    TemplateConfig, UploadedFile,
};
use std::path::{Path, PathBuf};
use store::FileStore;
use tracing_subscriber::EnvFilter;

/// sheetmerge - merge spreadsheets that share a column layout
#[derive(Parser)]
#[command(name = "sheetmerge")]
#[command(author, version, about = "Merge spreadsheets into one table", long_about = None)]
struct Cli {
    /// Session whose table and template config are used
    #[arg(short = 's', long = "session", default_value = "default", global = true)]
    session: String,

    /// State file holding all sessions
    #[arg(long = "state", value_name = "PATH", global = true)]
    state: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge spreadsheets sharing one header into the session table
    Upload {
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,
    },
    /// Flatten template spreadsheets with the session config and merge them
    Template {
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,
    },
    /// Show or change the template config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the session table
    Show {
        /// Output format (table, json)
        #[arg(short = 'f', long = "format", default_value = "table")]
        format: OutputFormat,
    },
    /// Replace the session table with an edited JSON payload
    Edit {
        #[arg(value_name = "JSON")]
        file: PathBuf,
    },
    /// Write the session table to an xlsx file
    Export {
        #[arg(short = 'o', long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Drop the session table
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current config
    Show,
    /// Change individual fields; the rest keep their current value
    Set(ConfigArgs),
    /// Replace the config with a JSON file
    Load {
        #[arg(value_name = "JSON")]
        file: PathBuf,
    },
    /// Restore the default geometry
    Reset,
}

/// Template geometry overrides, all 0-based.
#[derive(Args, Default)]
struct ConfigArgs {
    #[arg(long)]
    company_row: Option<usize>,
    #[arg(long)]
    company_col: Option<usize>,
    #[arg(long)]
    code_row: Option<usize>,
    #[arg(long)]
    code_col: Option<usize>,
    #[arg(long)]
    data_start_row: Option<usize>,
    #[arg(long)]
    left_table_start_col: Option<usize>,
    #[arg(long)]
    right_table_start_col: Option<usize>,
    #[arg(long)]
    col_count: Option<usize>,
}

impl ConfigArgs {
    fn apply(&self, base: TemplateConfig) -> TemplateConfig {
        TemplateConfig {
            company_row: self.company_row.unwrap_or(base.company_row),
            company_col: self.company_col.unwrap_or(base.company_col),
            code_row: self.code_row.unwrap_or(base.code_row),
            code_col: self.code_col.unwrap_or(base.code_col),
            data_start_row: self.data_start_row.unwrap_or(base.data_start_row),
            left_table_start_col: self.left_table_start_col.unwrap_or(base.left_table_start_col),
            right_table_start_col: self
                .right_table_start_col
                .unwrap_or(base.right_table_start_col),
            col_count: self.col_count.unwrap_or(base.col_count),
        }
    }
}

/// Output format for `show`.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// Tab-separated rows (default)
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Body of an edit: the full replacement header and rows.
#[derive(Debug, Deserialize)]
struct EditPayload {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let state_path = cli.state.unwrap_or_else(default_state_path);
    let mut store = FileStore::open(&state_path)?;

    let changed = {
        let mut session = Session::new(&mut store, SessionId::new(cli.session));
        run(cli.command, &mut session)?
    };

    if changed {
        store.save()?;
    }

    Ok(())
}

/// Default state file under the platform data directory.
fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("sheetmerge").join("state.json"))
        .unwrap_or_else(|| PathBuf::from(".sheetmerge-state.json"))
}

/// Run one command. Returns whether session state changed.
fn run<S: SessionStore>(command: Command, session: &mut Session<'_, S>) -> Result<bool> {
    match command {
        Command::Upload { files } => {
            let report = upload_batch(session, &files, false)?;
            print_report(&report);
            Ok(report.succeeded > 0)
        }
        Command::Template { files } => {
            let report = upload_batch(session, &files, true)?;
            print_report(&report);
            Ok(report.succeeded > 0)
        }
        Command::Config { action } => run_config(action, session),
        Command::Show { format } => {
            print_table(&session.table(), format)?;
            Ok(false)
        }
        Command::Edit { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let payload = parse_edit_payload(&text)?;
            let table = session.update(payload.headers, payload.rows);
            println!("{} {} rows", "Saved:".green().bold(), table.row_count());
            Ok(true)
        }
        Command::Export { output } => {
            let export = session.export()?;
            let path = output.unwrap_or_else(|| PathBuf::from(export.file_name));
            std::fs::write(&path, &export.bytes)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            println!(
                "{} {} ({} bytes)",
                "Exported:".green().bold(),
                path.display(),
                export.bytes.len()
            );
            Ok(false)
        }
        Command::Clear => {
            session.clear();
            println!("{}", "Table cleared".green());
            Ok(true)
        }
    }
}

fn run_config<S: SessionStore>(action: ConfigAction, session: &mut Session<'_, S>) -> Result<bool> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&session.config())?);
            Ok(false)
        }
        ConfigAction::Set(args) => {
            let config = args.apply(session.config());
            session.save_config(config)?;
            println!("{}", "Template config saved".green());
            Ok(true)
        }
        ConfigAction::Load { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let config: TemplateConfig = serde_json::from_str(&text)
                .with_context(|| format!("Invalid template config: {}", file.display()))?;
            session.save_config(config)?;
            println!("{}", "Template config saved".green());
            Ok(true)
        }
        ConfigAction::Reset => {
            session.reset_config();
            println!("{}", "Template config reset to defaults".green());
            Ok(true)
        }
    }
}

/// Read every path and run one batch. Files that cannot be read are
/// reported as failed alongside the ones the batch rejects.
fn upload_batch<S: SessionStore>(
    session: &mut Session<'_, S>,
    paths: &[PathBuf],
    templates: bool,
) -> Result<BatchReport> {
    let (files, unreadable) = read_files(paths);

    let mut report = if files.is_empty() && !unreadable.is_empty() {
        BatchReport {
            total_rows: session.table().row_count(),
            ..BatchReport::default()
        }
    } else if templates {
        session.upload_templates(&files)?
    } else {
        session.upload(&files)?
    };

    report.failed.splice(0..0, unreadable);
    Ok(report)
}

fn read_files(paths: &[PathBuf]) -> (Vec<UploadedFile>, Vec<FailedFile>) {
    let mut files = Vec::new();
    let mut unreadable = Vec::new();
    for path in paths {
        match UploadedFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
                unreadable.push(FailedFile {
                    name: display_name(path),
                    reason: FailureReason::Unreadable,
                });
            }
        }
    }
    (files, unreadable)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn parse_edit_payload(text: &str) -> Result<EditPayload> {
    serde_json::from_str(text).context("Edit payload must be {\"headers\": [...], \"rows\": [[...]]}")
}

fn print_report(report: &BatchReport) {
    println!("{} {}", "Done:".green().bold(), report);
    for failed in &report.failed {
        println!("  {} {}", "failed".yellow(), failed);
    }
}

fn print_table(table: &Table, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(table)?),
        OutputFormat::Table => {
            if !table.has_headers() {
                println!("{}", "No data".yellow());
                return Ok(());
            }
            println!("{}", table.headers().join("\t").bold());
            for row in table.rows() {
                println!("{}", row.join("\t"));
            }
            println!(
                "{} {} rows from {}",
                "Total:".cyan(),
                table.row_count(),
                table.source_name()
            );
        }
    }
    Ok(())
}
