use std::path::{Path, PathBuf};

use super::{ProviderError, RawTextProvider, decode_output};
use crate::prelude::*;

/// Reads a process list previously captured from `wmic`, for offline parsing.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RawTextProvider for FileProvider {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<String> {
        let bytes = std::fs::read(&self.path).map_err(|source| ProviderError::Read {
            path: self.path.clone(),
            source,
        })?;
        info!("Loaded {}", self.path.display());
        Ok(decode_output(&bytes).into_logged_text(&self.describe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_utf16_capture() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("capture.txt");
        let text = "\r\nCaption=秀丸.exe\r\nProcessId=42\r\n";
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
        std::fs::write(&path, bytes).unwrap();

        let fetched = FileProvider::new(&path).fetch().unwrap();
        assert_eq!(fetched, text);
    }

    #[test]
    fn test_fetch_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let error = FileProvider::new(temp_dir.path().join("missing.txt"))
            .fetch()
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ProviderError>(),
            Some(ProviderError::Read { .. })
        ));
        assert!(error.to_string().contains("missing.txt"));
    }
}
