//! Parser and JSON assembler for `wmic process get ... /FORMAT:LIST` dumps.
//!
//! The crate is free of I/O: callers hand it decoded text and settings, and get back records,
//! diagnostics and the serialized document.

pub mod clock;
pub mod command_line;
pub mod document;
pub mod error;
pub mod parser;
pub mod record;
pub mod settings;

pub use clock::{Clock, FixedClock, SystemClock};
pub use command_line::{ExecutableFields, extract};
pub use document::{OutputDocument, assemble, assemble_with_clock, write_document};
pub use error::SerializationError;
pub use parser::{
    ParseDiagnostic, ParseReport, SENTINEL_KEY, normalize_line_endings, parse, parse_report,
};
pub use record::ProcessRecord;
pub use settings::{ResolvedSettings, Settings, SettingsNotice, SettingsStore, resolve};
