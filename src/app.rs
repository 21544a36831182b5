use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    local_logger::{ACCENT_U8_COLOR_CODE, init_local_logger},
    prelude::*,
    provider::{FileProvider, ProviderError, RawTextProvider, WmicProvider, dump_raw_text},
    settings::{FileSettingsStore, load_settings},
};
use clap::{
    Parser,
    builder::{Styles, styling},
};
use wmic_parser::{ParseDiagnostic, SerializationError};

/// Exit codes reported to the shell.
pub mod exit_codes {
    pub const TOOL_FAILED: i32 = 101;
    pub const TOOL_NOT_FOUND: i32 = 102;
    pub const TOOL_ERROR: i32 = 103;
    pub const SERIALIZATION_FAILED: i32 = 104;
    pub const UNEXPECTED: i32 = 105;
}

fn create_styles() -> Styles {
    styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::Ansi256Color(ACCENT_U8_COLOR_CODE).on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "List running processes with WMIC and print them as JSON",
    styles = create_styles()
)]
pub struct Cli {
    /// File to write the JSON document to (defaults to standard output)
    pub output_file: Option<PathBuf>,

    /// Parse a previously captured `wmic process get ... /FORMAT:LIST` dump instead of running wmic
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Path to the settings file
    /// If not provided, settings.json, settings.yaml or settings.yml is looked up in the
    /// current directory.
    #[arg(long, env = "WMIC_JSON_SETTINGS", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Save the decoded raw output to FILE before parsing it
    #[arg(long, value_name = "FILE")]
    pub dump_raw: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_local_logger()?;
    let current_dir = std::env::current_dir().context("Failed to get the current directory")?;
    execute(&cli, &current_dir)
}

/// Collect, parse and emit the process list as described by `cli`.
pub fn execute(cli: &Cli, current_dir: &Path) -> Result<()> {
    let settings_store = FileSettingsStore::new(cli.settings.as_deref(), current_dir);
    let settings = load_settings(&settings_store).settings;

    let provider: Box<dyn RawTextProvider> = match &cli.input {
        Some(path) => Box::new(FileProvider::new(path)),
        None => Box::new(WmicProvider::default()),
    };
    let raw_text = provider.fetch()?;

    if let Some(dump_path) = &cli.dump_raw {
        dump_raw_text(&raw_text, dump_path)?;
    }

    let report = wmic_parser::parse_report(&raw_text);
    log_diagnostics(&report.diagnostics);
    debug!(
        "Parsed {} processes from {}",
        report.records.len(),
        provider.describe()
    );

    let document = wmic_parser::assemble(&report.records, &settings)?;
    write_output(&document, cli.output_file.as_deref(), &mut std::io::stdout().lock())
}

fn write_output<W: Write>(
    document: &str,
    output_file: Option<&Path>,
    stdout: &mut W,
) -> Result<()> {
    match output_file {
        Some(path) => {
            std::fs::write(path, document)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Output written to {}", path.display());
        }
        None => {
            writeln!(stdout, "{document}")
                .and_then(|()| stdout.flush())
                .context("Failed to write output to stdout")?;
        }
    }
    Ok(())
}

fn log_diagnostics(diagnostics: &[ParseDiagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic {
            ParseDiagnostic::TruncatedBlock { .. } => warn!("{diagnostic}"),
            _ => debug!("{diagnostic}"),
        }
    }
}

/// Map a failed run to the exit code reported to the shell.
pub fn exit_code(error: &Error) -> i32 {
    if let Some(error) = error.downcast_ref::<ProviderError>() {
        return match error {
            ProviderError::ToolFailed { .. } => exit_codes::TOOL_FAILED,
            ProviderError::ToolNotFound { .. } => exit_codes::TOOL_NOT_FOUND,
            ProviderError::Spawn { .. } => exit_codes::TOOL_ERROR,
            ProviderError::Read { .. } => exit_codes::UNEXPECTED,
        };
    }
    if error.downcast_ref::<SerializationError>().is_some() {
        return exit_codes::SERIALIZATION_FAILED;
    }
    exit_codes::UNEXPECTED
}
