//! Module-path resolution for import specifiers.
//!
//! Relative and absolute specifiers are resolved against the importing
//! file's directory (exact path, then extension variants, then directory
//! entry points). Bare specifiers are looked up in `node_modules`
//! directories, walking upward from the importing file.
//!
//! Resolution never fails: when nothing matches, the specifier itself is
//! returned so external packages still show up as graph leaves.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use path_clean::PathClean;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Extensions tried, in order, when a specifier has no exact match.
pub const EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".json"];

/// Directory holding installed packages.
const PACKAGES_DIR: &str = "node_modules";

/// Manifest consulted when a specifier resolves to a directory.
const MANIFEST: &str = "package.json";

static GLOBAL_CACHE: Lazy<Arc<ResolutionCache>> = Lazy::new(|| Arc::new(ResolutionCache::new()));

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Canonical path of the target file.
    File(PathBuf),
    /// Nothing matched; the specifier is kept as written.
    Unresolved(String),
}

impl Resolution {
    /// Whether a file was found.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// The target path, or the specifier as a path when unresolved.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        match self {
            Self::File(path) => path,
            Self::Unresolved(specifier) => PathBuf::from(specifier),
        }
    }
}

/// Cache of `(source file, specifier) -> resolution`.
///
/// Filling the same key twice is harmless: resolution is a pure function of
/// its inputs and the filesystem.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<(PathBuf, String), Resolution>,
}

impl ResolutionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by runs that do not inject their own.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Looks up a previous resolution.
    #[must_use]
    pub fn get(&self, source_file: &Path, specifier: &str) -> Option<Resolution> {
        self.entries
            .get(&(source_file.to_path_buf(), specifier.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Records a resolution.
    pub fn set(&self, source_file: &Path, specifier: &str, resolved: Resolution) {
        self.entries
            .insert((source_file.to_path_buf(), specifier.to_string()), resolved);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached resolutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Resolves import specifiers to file paths, memoizing through a [`ResolutionCache`].
#[derive(Debug, Clone)]
pub struct Resolver {
    cache: Arc<ResolutionCache>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Arc::new(ResolutionCache::new()))
    }
}

impl Resolver {
    /// Creates a resolver backed by `cache`.
    #[must_use]
    pub fn new(cache: Arc<ResolutionCache>) -> Self {
        Self { cache }
    }

    /// The cache this resolver fills.
    #[must_use]
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Resolves `specifier` as written inside `from_file`.
    ///
    /// Returns the canonical path of the target file, or `specifier`
    /// unchanged when it cannot be resolved.
    #[must_use]
    pub fn resolve(&self, specifier: &str, from_file: &Path) -> PathBuf {
        self.resolve_reference(specifier, from_file).into_path()
    }

    /// Like [`Resolver::resolve`], but tells resolved files from fallbacks.
    #[must_use]
    pub fn resolve_reference(&self, specifier: &str, from_file: &Path) -> Resolution {
        if let Some(hit) = self.cache.get(from_file, specifier) {
            return hit;
        }

        let resolved = match resolve_uncached(specifier, from_file) {
            Some(path) => Resolution::File(path),
            None => {
                trace!("Unresolved {specifier:?} from {}", from_file.display());
                Resolution::Unresolved(specifier.to_string())
            }
        };
        self.cache.set(from_file, specifier, resolved.clone());
        resolved
    }
}

fn resolve_uncached(specifier: &str, from_file: &Path) -> Option<PathBuf> {
    if specifier.is_empty() {
        return None;
    }
    let dir = from_file.parent()?;

    let found = if is_path_specifier(specifier) {
        let target = Path::new(specifier);
        let candidate = if target.is_absolute() {
            target.to_path_buf()
        } else {
            dir.join(target)
        };
        resolve_target(&candidate.clean())
    } else {
        resolve_package(specifier, dir)
    }?;

    Some(std::fs::canonicalize(&found).unwrap_or(found))
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

fn resolve_target(candidate: &Path) -> Option<PathBuf> {
    resolve_as_file(candidate).or_else(|| resolve_as_directory(candidate))
}

fn resolve_package(specifier: &str, dir: &Path) -> Option<PathBuf> {
    for ancestor in dir.ancestors() {
        if ancestor.file_name().is_some_and(|name| name == PACKAGES_DIR) {
            continue;
        }
        let packages = ancestor.join(PACKAGES_DIR);
        if !packages.is_dir() {
            continue;
        }
        if let Some(found) = resolve_target(&packages.join(specifier).clean()) {
            return Some(found);
        }
    }
    None
}

fn resolve_as_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    EXTENSIONS
        .iter()
        .map(|ext| with_suffix(path, ext))
        .find(|p| p.is_file())
}

fn resolve_as_directory(path: &Path) -> Option<PathBuf> {
    if !path.is_dir() {
        return None;
    }

    if let Some(main) = read_main(&path.join(MANIFEST)) {
        let entry = path.join(main).clean();
        if let Some(found) = resolve_as_file(&entry).or_else(|| resolve_index(&entry)) {
            return Some(found);
        }
    }

    resolve_index(path)
}

fn resolve_index(dir: &Path) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("index{ext}")))
        .find(|p| p.is_file())
}

fn read_main(manifest: &Path) -> Option<String> {
    let content = std::fs::read_to_string(manifest).ok()?;
    serde_json::from_str::<PackageManifest>(&content)
        .ok()?
        .main
        .filter(|m| !m.is_empty())
}

/// Appends `suffix` to the final path component (`foo.config` -> `foo.config.js`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
