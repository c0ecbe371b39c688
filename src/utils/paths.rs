// Path Resolution Utilities
//
// Locates the project root and source directory used by the `[path]`
// placeholder, and converts paths to relative Unix-style strings.

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::debug;

/// File whose presence marks a project root
pub const PROJECT_MARKER: &str = "package.json";

/// Conventional source directories, probed in order under the project root
pub const SOURCE_DIR_CANDIDATES: [&str; 4] = ["src/app", "app/src", "src", "app"];

/// Upper bound on directories visited while walking towards the filesystem root
pub const MAX_ROOT_WALK_DEPTH: usize = 256;

/// Make `path` absolute without requiring it to exist
///
/// Existing paths are canonicalized (resolves symlinks such as
/// /var -> /private/var on macOS); others are joined onto the current
/// directory.
pub fn absolutize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return strip_unc_prefix(&canonical);
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Walk upward from `start` and return the first directory containing
/// [`PROJECT_MARKER`]
///
/// Stops at the filesystem root (`parent == current`) or after
/// [`MAX_ROOT_WALK_DEPTH`] levels.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = absolutize(start);

    for _ in 0..MAX_ROOT_WALK_DEPTH {
        if current.join(PROJECT_MARKER).is_file() {
            debug!("Project root: {}", current.display());
            return Some(current);
        }
        match current.parent() {
            Some(parent) if parent != current && !parent.as_os_str().is_empty() => {
                current = parent.to_path_buf();
            }
            _ => return None,
        }
    }

    debug!(
        "Gave up looking for {} above {} after {} levels",
        PROJECT_MARKER,
        start.display(),
        MAX_ROOT_WALK_DEPTH
    );
    None
}

/// Pick the source directory under a resolved project root
///
/// Returns the first existing [`SOURCE_DIR_CANDIDATES`] entry, else the root
/// itself, else `None` when there is no root.
pub fn resolve_source_dir(root: Option<&Path>) -> Option<PathBuf> {
    let root = root?;
    SOURCE_DIR_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|attempt| attempt.exists())
        .or_else(|| Some(root.to_path_buf()))
}

/// Directory of `file` relative to `source_dir`, Unix-style
///
/// Empty when either side is unavailable or when the file sits directly in
/// `source_dir`.
pub fn relative_path_segment(source_dir: Option<&Path>, file: &str) -> String {
    let Some(source_dir) = source_dir else {
        return String::new();
    };
    if file.is_empty() {
        return String::new();
    }

    let file = absolutize(Path::new(file));
    let Some(dir) = file.parent() else {
        return String::new();
    };
    // The file itself may not exist yet; its directory usually does
    to_relative_unix_style(&absolutize(dir), &absolutize(source_dir))
}

/// Convert `target` to a path relative to `base` with `/` separators
///
/// Unlike a plain prefix strip, targets outside `base` are expressed with
/// `..` segments. Both paths must be absolute for a meaningful result.
pub fn to_relative_unix_style(target: &Path, base: &Path) -> String {
    let target = normalize(&strip_unc_prefix(target));
    let base = normalize(&strip_unc_prefix(base));

    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        segments.push("..".to_string());
    }
    for part in &target_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }

    let joined = segments.join("/");
    // Component names never contain '/', but they may contain '\' on Windows
    if MAIN_SEPARATOR == '\\' {
        joined.replace('\\', "/")
    } else {
        joined
    }
}

/// Resolve `.` and `..` lexically
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

// Canonicalized Windows paths get a \\?\ prefix; non-canonical ones don't,
// which breaks component comparison between the two
#[cfg(windows)]
fn strip_unc_prefix(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    match path_str.strip_prefix(r"\\?\") {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

#[cfg(not(windows))]
fn strip_unc_prefix(path: &Path) -> PathBuf {
    path.to_path_buf()
}
