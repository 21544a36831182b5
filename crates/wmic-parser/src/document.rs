use std::io::Write;

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::clock::{Clock, SystemClock};
use crate::error::SerializationError;
use crate::record::ProcessRecord;
use crate::settings::Settings;

/// Root object of the emitted JSON.
#[derive(Debug, Serialize)]
pub struct OutputDocument<'a> {
    pub execution_time: String,
    pub processes: &'a [ProcessRecord],
}

impl<'a> OutputDocument<'a> {
    pub fn new(processes: &'a [ProcessRecord], clock: &dyn Clock) -> Self {
        Self {
            execution_time: clock.now().to_rfc3339_opts(SecondsFormat::Micros, true),
            processes,
        }
    }
}

/// Serialize `records` into the output document, stamped with the current time.
pub fn assemble(
    records: &[ProcessRecord],
    settings: &Settings,
) -> Result<String, SerializationError> {
    assemble_with_clock(records, settings, &SystemClock)
}

pub fn assemble_with_clock(
    records: &[ProcessRecord],
    settings: &Settings,
    clock: &dyn Clock,
) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    write_document(&mut buffer, &OutputDocument::new(records, clock), settings)?;
    Ok(String::from_utf8(buffer)?)
}

/// Pretty-print `document` into `writer` using the configured indentation.
///
/// Non-ASCII text is written as-is; only the characters JSON requires are escaped.
pub fn write_document<W: Write>(
    writer: W,
    document: &OutputDocument<'_>,
    settings: &Settings,
) -> Result<(), SerializationError> {
    let indent = " ".repeat(settings.indent);
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    document.serialize(&mut serializer)?;
    Ok(())
}
