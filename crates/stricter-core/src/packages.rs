//! Package discovery.
//!
//! A package is a directory under the analysis root that carries a
//! `package.json`. Without patterns, the first-level directories of the root
//! are candidates; with patterns, each root-relative glob contributes its
//! matches in order.

use crate::graph::PackageDescriptor;
use std::path::{Component, Path};
use tracing::debug;

/// Files that mark a directory as a package.
pub const ENTRY_FILES: &[&str] = &["package.json"];

/// Errors from package discovery.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// A `packages` pattern is not a valid glob.
    #[error("invalid package pattern `{pattern}`: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        source: glob::PatternError,
    },

    /// The root directory could not be listed.
    #[error("failed to list {path}: {source}")]
    Io {
        /// Directory that failed.
        path: std::path::PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Discovers packages under `root`, optionally narrowed by glob `patterns`.
///
/// # Errors
///
/// Returns an error if a pattern is invalid or the root cannot be listed.
pub fn discover_packages(
    root: &Path,
    patterns: Option<&[String]>,
) -> Result<Vec<PackageDescriptor>, PackageError> {
    let packages = match patterns {
        Some(patterns) => discover_matching(root, patterns)?,
        None => discover_default(root)?,
    };
    debug!("Discovered {} package(s) under {}", packages.len(), root.display());
    Ok(packages)
}

fn discover_default(root: &Path) -> Result<Vec<PackageDescriptor>, PackageError> {
    let entries = std::fs::read_dir(root).map_err(|source| PackageError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut dirs: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| is_package_dir(p))
        .collect();
    dirs.sort();

    Ok(dirs
        .into_iter()
        .filter_map(|path| descriptor(root, &path))
        .collect())
}

fn discover_matching(
    root: &Path,
    patterns: &[String],
) -> Result<Vec<PackageDescriptor>, PackageError> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let mut packages: Vec<PackageDescriptor> = Vec::new();

    for pattern in patterns {
        let full = format!("{base}/{}", pattern.trim_start_matches("./"));
        let matches = glob::glob(&full).map_err(|source| PackageError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        for path in matches.filter_map(Result::ok) {
            if !is_package_dir(&path) {
                continue;
            }
            if let Some(pkg) = descriptor(root, &path) {
                if !packages.contains(&pkg) {
                    packages.push(pkg);
                }
            }
        }
    }

    Ok(packages)
}

fn is_package_dir(path: &Path) -> bool {
    path.is_dir() && ENTRY_FILES.iter().any(|f| path.join(f).is_file())
}

fn descriptor(root: &Path, path: &Path) -> Option<PackageDescriptor> {
    let relative = path.strip_prefix(root).ok()?;
    let name = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    if name.is_empty() {
        return None;
    }
    Some(PackageDescriptor {
        name,
        path: path.to_path_buf(),
    })
}
