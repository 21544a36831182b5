use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use crate::prelude::*;

mod encoding;
mod file;
mod wmic;

pub use encoding::{DecodedText, decode_output};
pub use file::FileProvider;
pub use wmic::WmicProvider;

/// Supplies the `Key=Value` dump as text, with any encoding concerns already handled.
pub trait RawTextProvider {
    /// Human-readable origin of the text, for logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<String>;
}

/// Failures while acquiring the raw text, kept typed so the CLI can pick an exit code.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("`{program}` was not found, it is only available on Windows")]
    ToolNotFound { program: String },
    #[error("`{program}` failed with {status}{}", format_stderr(.stderr))]
    ToolFailed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read process list from {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Shape of a raw dump, logged when inspecting what the utility returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTextStats {
    pub lines: usize,
    pub blank_lines: usize,
    pub key_value_lines: usize,
}

impl RawTextStats {
    pub fn of(text: &str) -> Self {
        let normalized = wmic_parser::normalize_line_endings(text);
        let (blank_lines, key_value_lines) = normalized
            .split('\n')
            .map(str::trim)
            .fold((0, 0), |(blank, key_value), line| {
                (
                    blank + usize::from(line.is_empty()),
                    key_value + usize::from(line.contains('=')),
                )
            });
        Self {
            lines: normalized.split('\n').count(),
            blank_lines,
            key_value_lines,
        }
    }
}

/// Save the decoded raw text and log its shape, to debug what the utility actually printed.
pub fn dump_raw_text(text: &str, path: &std::path::Path) -> Result<()> {
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write raw output to {}", path.display()))?;
    info!("Raw output saved to {}", path.display());

    let stats = RawTextStats::of(text);
    debug!(
        "Raw output: {} lines, {} blank, {} key/value",
        stats.lines, stats.blank_lines, stats.key_value_lines
    );
    let preview = wmic_parser::normalize_line_endings(text)
        .split('\n')
        .take(20)
        .enumerate()
        .map(|(index, line)| format!("{:>4}: {line:?}", index + 1))
        .join("\n");
    trace!("First lines of raw output:\n{preview}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_raw_text_stats() {
        let stats = RawTextStats::of("\r\r\nCaption=a\r\r\nProcessId=1\r\r\n\r\r\nnoise");
        assert_eq!(
            stats,
            RawTextStats {
                lines: 9,
                blank_lines: 6,
                key_value_lines: 2,
            }
        );
    }

    #[test]
    fn test_dump_raw_text() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wmic_raw_output.txt");
        dump_raw_text("Caption=a\r\nProcessId=1\r\n", &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Caption=a\r\nProcessId=1\r\n"
        );
    }

    #[test]
    fn test_dump_raw_text_to_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("raw.txt");
        assert!(dump_raw_text("", &path).is_err());
    }

    #[test]
    fn test_tool_failed_message() {
        let error = ProviderError::ToolNotFound {
            program: "wmic".into(),
        };
        assert_eq!(
            error.to_string(),
            "`wmic` was not found, it is only available on Windows"
        );
    }
}
