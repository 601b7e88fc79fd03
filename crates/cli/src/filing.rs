//! Where raw forecast files land on disk.

use std::path::{Path, PathBuf};

/// Resolve the directory raw forecasts are written under. A non-empty
/// region becomes a subdirectory of the data directory.
pub fn make_file_path(data_dir: &Path, region: &str) -> PathBuf {
    if region.is_empty() {
        data_dir.to_path_buf()
    } else {
        data_dir.join(region)
    }
}
