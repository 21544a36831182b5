use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUOTED_PATH_REGEX: Regex = Regex::new(r#"^"([^"]+)""#).unwrap();
}

/// Executable location derived from a process command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutableFields {
    pub path: Option<String>,
    pub name: Option<String>,
}

/// Extract the executable path and bare executable name from a command line.
///
/// A leading quoted section (`"C:\Program Files\app.exe" --flag`) is taken as the path.
/// Anything else, including an unterminated leading quote, falls back to the first
/// whitespace-delimited token.
pub fn extract(command_line: Option<&str>) -> ExecutableFields {
    let Some(command_line) = command_line else {
        return ExecutableFields::default();
    };

    let path = match QUOTED_PATH_REGEX.captures(command_line) {
        Some(captures) => captures.get(1).map(|m| m.as_str()),
        None => command_line.split_whitespace().next(),
    };

    match path {
        Some(path) => ExecutableFields {
            path: Some(path.to_string()),
            name: Some(executable_name(path).to_string()),
        },
        None => ExecutableFields::default(),
    }
}

fn executable_name(path: &str) -> &str {
    match path.rsplit_once('\\') {
        Some((_, name)) => name,
        None => path,
    }
}
