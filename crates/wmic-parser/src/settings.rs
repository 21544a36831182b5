use serde_json::{Map, Value};

pub const DEFAULT_INDENT: usize = 2;

/// Output formatting settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Spaces per nesting level in the emitted JSON.
    pub indent: usize,
    /// Keys this version does not interpret, kept as read.
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            extra: Map::new(),
        }
    }
}

/// Source of user settings, such as a file in the working directory.
pub trait SettingsStore {
    /// Where the settings come from, for diagnostics.
    fn describe(&self) -> String;

    /// Read the raw settings map. `Ok(None)` means the store has no settings source.
    fn read(&self) -> anyhow::Result<Option<Map<String, Value>>>;
}

/// Why resolution did not simply use the stored settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsNotice {
    /// No settings source exists; every key has its default value.
    DefaultsInEffect,
    /// The source exists but could not be read or parsed.
    ReadFailed { source: String, reason: String },
    /// `indent` is not a non-negative integer; the default is kept.
    InvalidIndent { value: Value },
}

impl std::fmt::Display for SettingsNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsNotice::DefaultsInEffect => {
                write!(f, "No settings found, using defaults (indent: {DEFAULT_INDENT})")
            }
            SettingsNotice::ReadFailed { source, reason } => {
                write!(f, "Failed to read settings from {source}, using defaults: {reason}")
            }
            SettingsNotice::InvalidIndent { value } => write!(
                f,
                "Invalid indent {value}, expected a non-negative integer; using {DEFAULT_INDENT}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub notices: Vec<SettingsNotice>,
}

/// Resolve settings from an optional store, falling back to defaults for anything missing.
///
/// Never fails: unreadable or absent sources produce defaults and a notice.
pub fn resolve(store: Option<&dyn SettingsStore>) -> ResolvedSettings {
    let source = match store.map(|store| (store.describe(), store.read())) {
        None | Some((_, Ok(None))) => {
            return ResolvedSettings {
                settings: Settings::default(),
                notices: vec![SettingsNotice::DefaultsInEffect],
            };
        }
        Some((description, Err(error))) => {
            return ResolvedSettings {
                settings: Settings::default(),
                notices: vec![SettingsNotice::ReadFailed {
                    source: description,
                    reason: format!("{error:#}"),
                }],
            };
        }
        Some((_, Ok(Some(source)))) => source,
    };

    let mut settings = Settings::default();
    let mut notices = Vec::new();
    for (key, value) in source {
        if key != "indent" {
            settings.extra.insert(key, value);
            continue;
        }
        match value.as_u64().and_then(|indent| usize::try_from(indent).ok()) {
            Some(indent) => settings.indent = indent,
            None => notices.push(SettingsNotice::InvalidIndent { value }),
        }
    }

    ResolvedSettings { settings, notices }
}
