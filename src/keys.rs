//! Mapping between local paths and object keys.
//!
//! Uploads keep the file's position below the upload root:
//! `object_key("snap", "/data", "/data/sub/b.txt") == "snap/sub/b.txt"`.
//! Downloads keep only the last key segment:
//! `download_path("/out", "snap/sub/b.txt") == "/out/b.txt"`.

use crate::error::StoreError;
use std::path::{Component, Path, PathBuf};

/// Computes the key for `file`, a path located under `root`.
///
/// Both paths are made absolute and lexically normalized, then `root` is
/// removed component by component. A root name that happens to recur
/// further down the path (`/data` and `/data/x/data/f.txt`) is only ever
/// stripped once, from the front.
pub fn object_key(prefix: &str, root: &Path, file: &Path) -> Result<String, StoreError> {
    let root = absolute(root)?;
    let file = absolute(file)?;

    let relative = file
        .strip_prefix(&root)
        .map_err(|_| StoreError::OutsideRoot {
            path: file.clone(),
            root: root.clone(),
        })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(segment) => segments.push(segment),
            None => {
                return Err(StoreError::InvalidKey(format!(
                    "{} is not valid UTF-8",
                    file.display()
                )))
            }
        }
    }

    // A single file given as the root is stored under its own name.
    if segments.is_empty() {
        match file.file_name().and_then(|name| name.to_str()) {
            Some(name) => segments.push(name),
            None => {
                return Err(StoreError::InvalidKey(format!(
                    "{} has no usable file name",
                    file.display()
                )))
            }
        }
    }

    Ok(join_key(prefix, &segments.join("/")))
}

/// Joins key fragments with `/`, dropping empty and `.` segments and
/// resolving `..` the way `path.Join` does for URL-style paths.
///
/// A leading `/` on `prefix` is kept.
pub fn join_key(prefix: &str, relative: &str) -> String {
    let rooted = prefix.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in prefix.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Local destination for downloading `key` into `root`.
///
/// Only the last `/`-separated segment of the key is used; the rest of the
/// key hierarchy is not recreated.
pub fn download_path(root: &Path, key: &str) -> Result<PathBuf, StoreError> {
    let name = key.rsplit('/').next().unwrap_or(key);

    // `\` is a separator only on Windows; elsewhere it is part of the name.
    let has_separator = cfg!(windows) && name.contains('\\');
    if name.is_empty() || name == "." || name == ".." || has_separator {
        return Err(StoreError::InvalidKey(format!(
            "{:?} does not end in a file name",
            key
        )));
    }

    Ok(root.join(name))
}

/// Absolute, lexically normalized form of `path` (no filesystem access).
fn absolute(path: &Path) -> Result<PathBuf, StoreError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| StoreError::io(path, e))?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
