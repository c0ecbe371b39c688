// Utilities Module
//
// Path resolution, case conversion and file persistence helpers shared by the
// extraction engine and the CLI.

/// File utilities
pub mod file_utils {
    use crate::{Error, Result};
    use std::fs;
    use std::path::Path;

    /// Persist `contents` at `path`, creating missing parent directories
    pub fn write_creating_dirs(path: &Path, contents: &str) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(path, contents).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
    }

}

/// Kebab-case key derivation
pub mod case;

/// Project root / source directory resolution and relative paths
pub mod paths;
