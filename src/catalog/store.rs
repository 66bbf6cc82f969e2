use super::types::OilRecord;
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load the oil catalog from a JSON file
///
/// If the file doesn't exist, returns an empty catalog.
/// If the file exists but cannot be read or parsed, returns an error.
pub fn load_catalog(path: &Path) -> Result<Vec<OilRecord>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "catalog file not found, using an empty catalog");
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open catalog file at {}", path.display()))?;

    let oils: Vec<OilRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse catalog JSON in {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = oils.len(), "catalog loaded");
    Ok(oils)
}

/// Load the catalog for the dashboard, degrading to an empty catalog on any error
pub fn load_catalog_or_empty(path: &Path) -> Vec<OilRecord> {
    match load_catalog(path) {
        Ok(oils) => oils,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "catalog unavailable, serving empty catalog");
            Vec::new()
        }
    }
}

/// Save the catalog to a JSON file atomically
pub fn save_catalog(path: &Path, oils: &[OilRecord]) -> Result<()> {
    save_json(path, oils).context("Failed to save catalog")
}

/// Write any serializable value as pretty JSON, atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, value).context("Failed to serialize JSON")?;

    file.commit()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
