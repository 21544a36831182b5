use std::{
    env,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::prelude::*;
use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};
use lazy_static::lazy_static;
use log::Log;
use simplelog::{CombinedLogger, SharedLogger};
use std::io::Write;

pub const LOG_LEVEL_ENV: &str = "WMIC_JSON_LOG";
pub const ACCENT_U8_COLOR_CODE: u8 = 39; // #00AFFF

lazy_static! {
    pub static ref SPINNER: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    pub static ref IS_TTY: bool = std::io::IsTerminal::is_terminal(&std::io::stderr());
}

/// Hide the spinner temporarily, execute `f`, then redraw the spinner.
///
/// If stderr is not a TTY, `f` will be executed without hiding anything.
pub fn suspend_progress_bar<F: FnOnce() -> R, R>(f: F) -> R {
    if *IS_TTY {
        if let Ok(mut spinner) = SPINNER.lock() {
            if let Some(spinner) = spinner.as_mut() {
                return spinner.suspend(f);
            }
        }
    }

    f()
}

/// Show a spinner with `message` on stderr until [`finish_spinner`] is called.
pub fn start_spinner(message: &str) {
    if !*IS_TTY {
        debug!("{message}...");
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template(&format!(
        "  {{spinner:>.{ACCENT_U8_COLOR_CODE}}} {{wide_msg:.{ACCENT_U8_COLOR_CODE}.bold}}"
    )) {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(format!("{message}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    if let Ok(mut current) = SPINNER.lock() {
        current.replace(spinner);
    }
}

pub fn finish_spinner() {
    if let Ok(mut spinner) = SPINNER.lock() {
        if let Some(spinner) = spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Read the log level from `WMIC_JSON_LOG`, defaulting to `info`.
pub fn log_level_from_env() -> log::LevelFilter {
    env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|log_level| log_level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info)
}

/// Writes every record to stderr: stdout is reserved for the JSON document.
pub struct LocalLogger {
    log_level: log::LevelFilter,
}

impl LocalLogger {
    pub fn new() -> Self {
        LocalLogger {
            log_level: log_level_from_env(),
        }
    }
}

impl Default for LocalLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for LocalLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.log_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        suspend_progress_bar(|| print_record(record));
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Print a log record to stderr with the appropriate style
fn print_record(record: &log::Record) {
    let error_style = Style::new().for_stderr().red();
    let info_style = Style::new().for_stderr().white();
    let warn_style = Style::new().for_stderr().yellow();
    let debug_style = Style::new().for_stderr().blue().dim();
    let trace_style = Style::new().for_stderr().black().dim();

    match record.level() {
        log::Level::Error => eprintln!(
            "{} {}",
            style("error:").for_stderr().red().bold(),
            error_style.apply_to(record.args())
        ),
        log::Level::Warn => eprintln!("{}", warn_style.apply_to(record.args())),
        log::Level::Info => eprintln!("{}", info_style.apply_to(record.args())),
        log::Level::Debug => eprintln!(
            "{}",
            debug_style.apply_to(format!("[DEBUG::{}] {}", record.target(), record.args())),
        ),
        log::Level::Trace => eprintln!(
            "{}",
            trace_style.apply_to(format!("[TRACE::{}] {}", record.target(), record.args()))
        ),
    }
}

impl SharedLogger for LocalLogger {
    fn level(&self) -> log::LevelFilter {
        self.log_level
    }

    fn config(&self) -> Option<&simplelog::Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

pub fn get_local_logger() -> Box<dyn SharedLogger> {
    Box::new(LocalLogger::new())
}

pub fn init_local_logger() -> Result<()> {
    let logger = get_local_logger();
    CombinedLogger::init(vec![logger]).context("Failed to init logger")?;
    Ok(())
}

pub fn clean_logger() {
    finish_spinner();
    log::logger().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_to_info() {
        temp_env::with_var_unset(LOG_LEVEL_ENV, || {
            assert_eq!(log_level_from_env(), log::LevelFilter::Info);
        });
    }

    #[test]
    fn test_log_level_from_env() {
        temp_env::with_var(LOG_LEVEL_ENV, Some("debug"), || {
            assert_eq!(log_level_from_env(), log::LevelFilter::Debug);
        });
        temp_env::with_var(LOG_LEVEL_ENV, Some("TRACE"), || {
            assert_eq!(log_level_from_env(), log::LevelFilter::Trace);
        });
    }

    #[test]
    fn test_invalid_log_level_falls_back_to_info() {
        temp_env::with_var(LOG_LEVEL_ENV, Some("verbose"), || {
            assert_eq!(log_level_from_env(), log::LevelFilter::Info);
        });
    }

    #[test]
    fn test_logger_respects_level() {
        let logger = LocalLogger {
            log_level: log::LevelFilter::Warn,
        };
        let warn = log::Metadata::builder().level(log::Level::Warn).build();
        let info = log::Metadata::builder().level(log::Level::Info).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&info));
    }
}
