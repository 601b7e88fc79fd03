//! Filesystem utilities

use std::fs;
use std::path::Path;

/// Create a directory and all parent directories if they don't exist
pub fn create_dir_all(path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
