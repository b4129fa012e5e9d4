//! Content-type inference from file extensions.

use std::collections::HashMap;
use std::path::Path;

/// Extensions recognized out of the box.
const DEFAULT_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("tsv", "text/tsv"),
    ("html", "text/html"),
    ("json", "application/json"),
    ("xml", "application/xml"),
];

/// Maps file extensions to content types.
///
/// Unknown extensions map to nothing: the object is stored without a
/// content type rather than with a generic fallback. Extensions are matched
/// without the leading dot and case-insensitively.
///
/// # Example
///
/// ```
/// use s3kit::ContentTypes;
/// use std::path::Path;
///
/// let types = ContentTypes::default().with("parquet", "application/vnd.apache.parquet");
/// assert_eq!(types.for_path(Path::new("a/b.JSON")), Some("application/json"));
/// assert_eq!(types.for_path(Path::new("t.parquet")), Some("application/vnd.apache.parquet"));
/// assert_eq!(types.for_path(Path::new("bin.dat")), None);
/// ```
#[derive(Debug, Clone)]
pub struct ContentTypes {
    by_extension: HashMap<String, String>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        DEFAULT_TYPES
            .iter()
            .fold(Self::empty(), |types, (ext, mime)| types.with(ext, mime))
    }
}

impl ContentTypes {
    /// A table with no entries.
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Adds or replaces the content type for `extension`.
    pub fn with(mut self, extension: &str, content_type: &str) -> Self {
        self.insert(extension, content_type);
        self
    }

    pub fn insert(&mut self, extension: &str, content_type: &str) {
        self.by_extension
            .insert(normalize(extension), content_type.to_string());
    }

    /// Content type registered for `extension`.
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.by_extension
            .get(&normalize(extension))
            .map(String::as_str)
    }

    /// Content type for the extension of `path`, if it has a known one.
    pub fn for_path(&self, path: &Path) -> Option<&str> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get(ext))
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let types = ContentTypes::default();
        assert_eq!(types.get("txt"), Some("text/plain"));
        assert_eq!(types.get("csv"), Some("text/csv"));
        assert_eq!(types.get("tsv"), Some("text/tsv"));
        assert_eq!(types.get("html"), Some("text/html"));
        assert_eq!(types.get(".json"), Some("application/json"));
        assert_eq!(types.get("xml"), Some("application/xml"));
    }

    #[test]
    fn test_unknown_extension_has_no_type() {
        let types = ContentTypes::default();
        assert_eq!(types.for_path(Path::new("archive.tar.gz")), None);
        assert_eq!(types.for_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_override_and_extend() {
        let types = ContentTypes::default()
            .with("html", "text/html; charset=utf-8")
            .with(".md", "text/markdown");
        assert_eq!(types.get("html"), Some("text/html; charset=utf-8"));
        assert_eq!(types.for_path(Path::new("README.md")), Some("text/markdown"));
        assert_eq!(ContentTypes::empty().get("txt"), None);
    }
}
