//! Groups the flat `Key=Value` lines of a `/FORMAT:LIST` dump into process records.
//!
//! Field assignment and block completion are kept apart: [`Line::classify`] decides what a
//! line means, and [`BlockState`] decides when a record is complete. The only transition
//! that completes a record is a `ProcessId` line; blank lines never close a block.

use crate::record::{PendingRecord, ProcessRecord};

/// Key whose line terminates a record block.
pub const SENTINEL_KEY: &str = "ProcessId";

/// A line-level anomaly that was tolerated while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDiagnostic {
    /// Non-blank line without any `=`.
    MissingSeparator { line: usize },
    /// `Key=Value` line whose key is not one of the collected properties.
    UnknownKey { line: usize, key: String },
    /// `ProcessId` value that is not an integer; the record keeps no value.
    InvalidProcessId { line: usize, value: String },
    /// Fields accumulated after the last `ProcessId` line, dropped at end of input.
    TruncatedBlock { first_line: usize, field_count: usize },
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseDiagnostic::MissingSeparator { line } => {
                write!(f, "line {line}: no '=' separator, ignored")
            }
            ParseDiagnostic::UnknownKey { line, key } => {
                write!(f, "line {line}: unknown key {key:?}, ignored")
            }
            ParseDiagnostic::InvalidProcessId { line, value } => {
                write!(f, "line {line}: invalid process id {value:?}, stored as null")
            }
            ParseDiagnostic::TruncatedBlock {
                first_line,
                field_count,
            } => write!(
                f,
                "block starting at line {first_line} has {field_count} field(s) but no {SENTINEL_KEY} line, discarded"
            ),
        }
    }
}

/// Records in completion order, plus every anomaly that was skipped over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub records: Vec<ProcessRecord>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Rewrite `\r\n` and lone `\r` line endings as `\n`.
pub fn normalize_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

/// Parse a WMIC list dump into process records.
pub fn parse(raw: &str) -> Vec<ProcessRecord> {
    parse_report(raw).records
}

/// Parse a WMIC list dump, keeping the diagnostics for every tolerated anomaly.
pub fn parse_report(raw: &str) -> ParseReport {
    let normalized = normalize_line_endings(raw);
    let mut report = ParseReport::default();
    let mut state = BlockState::JustFinalized;

    for (index, line) in normalized.split('\n').enumerate() {
        let line_number = index + 1;
        match Line::classify(line) {
            Line::Blank => {}
            Line::MissingSeparator => report
                .diagnostics
                .push(ParseDiagnostic::MissingSeparator { line: line_number }),
            Line::Unknown { key } => report.diagnostics.push(ParseDiagnostic::UnknownKey {
                line: line_number,
                key: key.to_string(),
            }),
            Line::Field(field) => state.apply(field, line_number),
            Line::Sentinel { value } => {
                let process_id = parse_process_id(value);
                if process_id.is_none() {
                    report.diagnostics.push(ParseDiagnostic::InvalidProcessId {
                        line: line_number,
                        value: value.to_string(),
                    });
                }
                report.records.push(state.finalize(process_id));
            }
        }
    }

    if let BlockState::Accumulating {
        pending,
        first_line,
    } = state
    {
        report.diagnostics.push(ParseDiagnostic::TruncatedBlock {
            first_line,
            field_count: pending.field_count(),
        });
    }

    report
}

/// Integer value of a `ProcessId` line: optional sign, decimal digits, and single `_`
/// separators between digit groups (`1_000`).
fn parse_process_id(value: &str) -> Option<i64> {
    if let Ok(process_id) = value.parse::<i64>() {
        return Some(process_id);
    }
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    let grouped = digits.contains('_')
        && digits
            .split('_')
            .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()));
    if !grouped {
        return None;
    }
    value.replace('_', "").parse::<i64>().ok()
}

/// A recognized non-sentinel field line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field<'a> {
    Caption(&'a str),
    Name(&'a str),
    CommandLine(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    MissingSeparator,
    Unknown { key: &'a str },
    Field(Field<'a>),
    Sentinel { value: &'a str },
}

impl<'a> Line<'a> {
    fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Line::Blank;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Line::MissingSeparator;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "Caption" => Line::Field(Field::Caption(value)),
            "Name" => Line::Field(Field::Name(value)),
            "CommandLine" => Line::Field(Field::CommandLine(value)),
            SENTINEL_KEY => Line::Sentinel { value },
            _ => Line::Unknown { key },
        }
    }
}

/// Completion state of the block being read.
#[derive(Debug)]
enum BlockState {
    /// No field has been seen since the last `ProcessId` line (or since the start).
    JustFinalized,
    /// At least one field belongs to a block that has not been terminated yet.
    Accumulating {
        pending: PendingRecord,
        first_line: usize,
    },
}

impl BlockState {
    fn apply(&mut self, field: Field<'_>, line_number: usize) {
        let (mut pending, first_line) = match std::mem::replace(self, BlockState::JustFinalized) {
            BlockState::JustFinalized => (PendingRecord::default(), line_number),
            BlockState::Accumulating {
                pending,
                first_line,
            } => (pending, first_line),
        };

        match field {
            Field::Caption(value) => pending.set_caption(value),
            Field::Name(value) => pending.set_name(value),
            Field::CommandLine(value) => pending.set_command_line(value),
        }

        *self = BlockState::Accumulating {
            pending,
            first_line,
        };
    }

    fn finalize(&mut self, process_id: Option<i64>) -> ProcessRecord {
        let pending = match std::mem::replace(self, BlockState::JustFinalized) {
            BlockState::JustFinalized => PendingRecord::default(),
            BlockState::Accumulating { pending, .. } => pending,
        };
        pending.finish(process_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TWO_PROCESSES: &str = "Caption=notepad.exe
CommandLine=C:\\Windows\\System32\\notepad.exe
Name=notepad.exe
ProcessId=1234

Caption=explorer.exe
CommandLine=C:\\Windows\\explorer.exe
Name=explorer.exe
ProcessId=5678";

    fn notepad() -> ProcessRecord {
        ProcessRecord {
            caption: Some("notepad.exe".into()),
            name: Some("notepad.exe".into()),
            process_id: Some(1234),
            command_line: Some(r#""C:\Windows\System32\notepad.exe""#.into()),
            executable_path: Some(r"C:\Windows\System32\notepad.exe".into()),
            executable_name: Some("notepad.exe".into()),
        }
    }

    #[test]
    fn test_parse_quoted_command_line() {
        let raw = "Caption=notepad.exe\n\
                   CommandLine=\"C:\\Windows\\System32\\notepad.exe\"\n\
                   Name=notepad.exe\n\
                   ProcessId=1234\n";
        assert_eq!(parse(raw), vec![notepad()]);
    }

    #[test]
    fn test_parse_unquoted_command_line() {
        let records = parse("CommandLine=C:\\Windows\\explorer.exe\nProcessId=5678\n");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].executable_path.as_deref(),
            Some(r"C:\Windows\explorer.exe")
        );
        assert_eq!(records[0].executable_name.as_deref(), Some("explorer.exe"));
        assert_eq!(records[0].process_id, Some(5678));
    }

    #[rstest]
    #[case::lf("\n")]
    #[case::crlf("\r\n")]
    #[case::cr("\r")]
    #[case::wmic_double_cr("\r\r\n")]
    fn test_line_endings_yield_same_records(#[case] ending: &str) {
        let expected = parse(TWO_PROCESSES);
        assert_eq!(expected.len(), 2);
        assert_eq!(parse(&TWO_PROCESSES.replace('\n', ending)), expected);
    }

    #[test]
    fn test_mixed_line_endings() {
        let mixed = TWO_PROCESSES
            .replacen('\n', "\r\n", 1)
            .replacen('\n', "\r", 1);
        assert_eq!(parse(&mixed), parse(TWO_PROCESSES));
    }

    #[test]
    fn test_normalize_line_endings_is_idempotent() {
        let once = normalize_line_endings("a\r\nb\rc\nd\r\r\n");
        assert_eq!(once, "a\nb\nc\nd\n\n");
        assert_eq!(normalize_line_endings(&once), once);
    }

    #[test]
    fn test_trailing_block_without_process_id_is_dropped() {
        let report = parse_report("Caption=a.exe\nProcessId=1\n\nCaption=foo.exe");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].caption.as_deref(), Some("a.exe"));
        assert_eq!(
            report.diagnostics,
            vec![ParseDiagnostic::TruncatedBlock {
                first_line: 4,
                field_count: 1
            }]
        );
    }

    #[test]
    fn test_empty_process_id_still_emits_record() {
        let report = parse_report("Caption=System Idle Process\nProcessId=\n");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].process_id, None);
        assert_eq!(
            report.records[0].caption.as_deref(),
            Some("System Idle Process")
        );
        assert_eq!(
            report.diagnostics,
            vec![ParseDiagnostic::InvalidProcessId {
                line: 2,
                value: String::new()
            }]
        );
    }

    #[rstest]
    #[case("abc")]
    #[case("12.5")]
    #[case("1__000")]
    #[case("_1000")]
    #[case("1000_")]
    #[case("-")]
    fn test_unparseable_process_id_is_no_value(#[case] value: &str) {
        let records = parse(&format!("Name=x.exe\nProcessId={value}\n"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].process_id, None);
        assert_eq!(records[0].name.as_deref(), Some("x.exe"));
    }

    #[rstest]
    #[case("-1", -1)]
    #[case("4294967296", 4_294_967_296)]
    #[case("+5", 5)]
    #[case("1_000", 1000)]
    #[case("-2_147_483_648", -2_147_483_648)]
    fn test_process_id_accepts_any_integer(#[case] value: &str, #[case] expected: i64) {
        let report = parse_report(&format!("Name=x.exe\nProcessId={value}\n"));
        assert_eq!(report.records[0].process_id, Some(expected));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_blank_lines_do_not_close_blocks() {
        let records = parse("Caption=a.exe\n\n\n\nName=a.exe\n\nProcessId=7\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].caption.as_deref(), Some("a.exe"));
        assert_eq!(records[0].name.as_deref(), Some("a.exe"));
        assert_eq!(records[0].process_id, Some(7));
    }

    #[test]
    fn test_field_order_is_irrelevant() {
        let records = parse(
            "Name=notepad.exe\n\
             CommandLine=\"C:\\Windows\\System32\\notepad.exe\"\n\
             Caption=notepad.exe\n\
             ProcessId=1234\n",
        );
        assert_eq!(records, vec![notepad()]);
    }

    #[test]
    fn test_value_keeps_later_equal_signs() {
        let records = parse("CommandLine=app.exe --opt=a=b\nProcessId=3\n");
        assert_eq!(
            records[0].command_line.as_deref(),
            Some("app.exe --opt=a=b")
        );
        assert_eq!(records[0].executable_path.as_deref(), Some("app.exe"));
    }

    #[test]
    fn test_keys_and_values_are_trimmed() {
        let records = parse("  Caption =  a.exe  \n\tProcessId = 42 \n");
        assert_eq!(records[0].caption.as_deref(), Some("a.exe"));
        assert_eq!(records[0].process_id, Some(42));
    }

    #[test]
    fn test_anomalous_lines_are_reported_and_ignored() {
        let report = parse_report("garbage\nHandleCount=12\nName=a.exe\n===\nProcessId=9\n");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].name.as_deref(), Some("a.exe"));
        insta::assert_debug_snapshot!(report.diagnostics, @r###"
        [
            MissingSeparator {
                line: 1,
            },
            UnknownKey {
                line: 2,
                key: "HandleCount",
            },
            UnknownKey {
                line: 4,
                key: "",
            },
        ]
        "###);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let report = parse_report("caption=a.exe\nprocessid=1\n");
        assert!(report.records.is_empty());
        assert_eq!(report.diagnostics.len(), 2);
    }

    #[test]
    fn test_consecutive_sentinels_emit_bare_records() {
        let records = parse("ProcessId=0\nProcessId=4\n");
        assert_eq!(
            records.iter().map(|r| r.process_id).collect::<Vec<_>>(),
            vec![Some(0), Some(4)]
        );
        assert!(records.iter().all(|r| r.caption.is_none() && r.name.is_none()));
    }

    #[test]
    fn test_records_keep_source_order() {
        let records = parse("ProcessId=30\nName=b\nProcessId=10\nName=c\nProcessId=20\n");
        assert_eq!(
            records.iter().map(|r| r.process_id).collect::<Vec<_>>(),
            vec![Some(30), Some(10), Some(20)]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_report(""), ParseReport::default());
        assert_eq!(parse_report("\r\n\r\n  \n"), ParseReport::default());
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = ParseDiagnostic::TruncatedBlock {
            first_line: 12,
            field_count: 2,
        };
        assert_eq!(
            diagnostic.to_string(),
            "block starting at line 12 has 2 field(s) but no ProcessId line, discarded"
        );
    }
}
