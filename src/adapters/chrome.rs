use crate::utils::error::{PdfError, Result};
use std::path::{Path, PathBuf};

const EXECUTABLES: [&str; 6] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "headless_shell",
];

/// Locations used by serverless Chromium layers and container images that
/// are usually not on `PATH`.
const WELL_KNOWN_PATHS: [&str; 3] = [
    "/opt/chromium",
    "/opt/chrome/chrome",
    "/tmp/chromium",
];

/// Resolves the browser executable: an explicit path wins, then `PATH`, then
/// the well-known install locations.
pub fn discover(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        // A bare name like "chromium" is looked up on PATH.
        if let Ok(found) = which::which(path) {
            return Ok(found);
        }
        tracing::warn!("Configured Chrome path {} does not exist", path.display());
        return Err(PdfError::BrowserNotFound);
    }

    for exe in EXECUTABLES {
        if let Ok(path) = which::which(exe) {
            tracing::debug!(chrome = %path.display(), "Discovered Chrome executable on PATH");
            return Ok(path);
        }
    }
    tracing::debug!("Chrome executable not found in PATH");

    WELL_KNOWN_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .ok_or(PdfError::BrowserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_path_is_not_found() {
        let result = discover(Some(Path::new("/nonexistent/dir/chromium-binary")));
        assert!(matches!(result, Err(PdfError::BrowserNotFound)));
    }

    #[test]
    fn test_explicit_existing_file_is_used() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let found = discover(Some(file.path())).unwrap();
        assert_eq!(found, file.path());
    }
}
