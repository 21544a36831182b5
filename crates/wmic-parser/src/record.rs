use serde::{Deserialize, Serialize};

use crate::command_line::{self, ExecutableFields};

/// One process as reported by a `ProcessId`-terminated block.
///
/// `process_id` is `None` when the block carried a `ProcessId` line whose value could not be
/// parsed. A record without any `ProcessId` line is never built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub caption: Option<String>,
    pub name: Option<String>,
    pub process_id: Option<i64>,
    pub command_line: Option<String>,
    pub executable_path: Option<String>,
    pub executable_name: Option<String>,
}

/// Fields accumulated for the block in progress, before its `ProcessId` line is seen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct PendingRecord {
    caption: Option<String>,
    name: Option<String>,
    command_line: Option<String>,
    executable: ExecutableFields,
    field_count: usize,
}

impl PendingRecord {
    pub fn set_caption(&mut self, value: &str) {
        self.caption = Some(value.to_string());
        self.field_count += 1;
    }

    pub fn set_name(&mut self, value: &str) {
        self.name = Some(value.to_string());
        self.field_count += 1;
    }

    pub fn set_command_line(&mut self, value: &str) {
        self.command_line = Some(value.to_string());
        self.executable = command_line::extract(Some(value));
        self.field_count += 1;
    }

    /// Number of recognized field lines applied so far, repeated keys included.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn finish(self, process_id: Option<i64>) -> ProcessRecord {
        ProcessRecord {
            caption: self.caption,
            name: self.name,
            process_id,
            command_line: self.command_line,
            executable_path: self.executable.path,
            executable_name: self.executable.name,
        }
    }
}
