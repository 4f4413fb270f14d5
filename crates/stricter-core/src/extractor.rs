//! Import extraction capability.
//!
//! `ImportExtractor` is the extension point for teaching the graph builder a
//! new source language. Implementations live outside this crate (see
//! `stricter-js`); the builder only needs the raw specifier strings.

use std::path::{Path, PathBuf};

/// A specifier found in a source file, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    /// The raw string written in the import statement.
    pub specifier: String,
    /// File the import statement was found in.
    pub source_file: PathBuf,
}

/// Extracts import specifiers from source text.
pub trait ImportExtractor: Send + Sync {
    /// Language identifier (e.g., `"javascript"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this extractor handles (e.g., `&[".js", ".jsx"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Returns the specifiers imported by `source`, in source order.
    fn extract_imports(&self, source: &str) -> Vec<String>;

    /// Whether this extractor handles `path`.
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.strip_prefix('.') == Some(ext))
            })
    }
}

/// Type alias for boxed extractor trait objects.
pub type ExtractorBox = Box<dyn ImportExtractor>;
