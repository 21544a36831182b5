use std::ffi::OsString;
use std::process::Command;

use super::{ProviderError, RawTextProvider, decode_output};
use crate::local_logger::{finish_spinner, start_spinner};
use crate::prelude::*;

const WMIC_PROGRAM: &str = "wmic";
const WMIC_ARGS: &[&str] = &[
    "process",
    "get",
    "Caption,Name,ProcessId,CommandLine",
    "/FORMAT:LIST",
];

/// Runs `wmic process get ... /FORMAT:LIST` and decodes its standard output.
#[derive(Debug, Clone)]
pub struct WmicProvider {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for WmicProvider {
    fn default() -> Self {
        Self::with_command(WMIC_PROGRAM, WMIC_ARGS)
    }
}

impl WmicProvider {
    pub fn with_command<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn run(&self) -> Result<Vec<u8>, ProviderError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => ProviderError::ToolNotFound {
                    program: self.program_name(),
                },
                _ => ProviderError::Spawn {
                    program: self.program_name(),
                    source,
                },
            })?;

        if !output.status.success() {
            return Err(ProviderError::ToolFailed {
                program: self.program_name(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output.stdout)
    }
}

impl RawTextProvider for WmicProvider {
    fn describe(&self) -> String {
        std::iter::once(self.program_name())
            .chain(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn fetch(&self) -> Result<String> {
        debug!("Running `{}`", self.describe());
        start_spinner("Collecting processes");
        let stdout = self.run();
        finish_spinner();

        let stdout = stdout?;
        debug!("Captured {} bytes of output", stdout.len());
        Ok(decode_output(&stdout).into_logged_text(&self.describe()))
    }
}
