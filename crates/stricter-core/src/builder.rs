//! Project graph construction.

use crate::extractor::{ExtractorBox, ImportExtractor, ImportReference};
use crate::graph::ProjectGraph;
use crate::packages::{discover_packages, PackageError};
use crate::resolver::{Resolution, Resolver};

use regex::Regex;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Errors that abort graph construction.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The analysis root does not exist or cannot be canonicalized.
    #[error("invalid analysis root {path}: {source}")]
    Root {
        /// Root as configured.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Package discovery failed.
    #[error(transparent)]
    Packages(#[from] PackageError),
}

/// Builder for a [`ProjectGraph`].
pub struct GraphBuilder {
    root: PathBuf,
    exclude: Vec<Regex>,
    package_patterns: Option<Vec<String>>,
    extractors: Vec<ExtractorBox>,
    resolver: Resolver,
}

impl GraphBuilder {
    /// Creates a builder for the tree rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: Vec::new(),
            package_patterns: None,
            extractors: Vec::new(),
            resolver: Resolver::default(),
        }
    }

    /// Adds an exclude pattern, matched against full path strings.
    #[must_use]
    pub fn exclude(mut self, pattern: Regex) -> Self {
        self.exclude.push(pattern);
        self
    }

    /// Adds multiple exclude patterns.
    #[must_use]
    pub fn excludes(mut self, patterns: impl IntoIterator<Item = Regex>) -> Self {
        self.exclude.extend(patterns);
        self
    }

    /// Narrows package discovery to directories matching these globs.
    #[must_use]
    pub fn packages(mut self, patterns: Option<Vec<String>>) -> Self {
        self.package_patterns = patterns;
        self
    }

    /// Registers an import extractor.
    #[must_use]
    pub fn extractor<E: ImportExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Registers a boxed import extractor.
    #[must_use]
    pub fn extractor_box(mut self, extractor: ExtractorBox) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Uses `resolver` (and its cache) for specifier resolution.
    #[must_use]
    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Walks the root and builds the graph.
    ///
    /// Unreadable files and directories are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is invalid or package discovery fails.
    pub fn build(self) -> Result<ProjectGraph, GraphError> {
        let root = std::fs::canonicalize(&self.root).map_err(|source| GraphError::Root {
            path: self.root.clone(),
            source,
        })?;
        info!("Building project graph at {}", root.display());

        let mut graph = ProjectGraph::new(&root);
        let walker = WalkDir::new(&root)
            .sort_by(dirs_first)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            self.visit(&mut graph, entry.into_path());
        }

        let packages = discover_packages(&root, self.package_patterns.as_deref())?;
        graph.set_packages(packages);

        info!(
            "Project graph: {} node(s), {} walked file(s), {} package(s)",
            graph.len(),
            graph.files().count(),
            graph.packages().len()
        );
        Ok(graph)
    }

    fn visit(&self, graph: &mut ProjectGraph, path: PathBuf) {
        let id = graph.ensure_node(path.clone());
        graph.mark_walked(id);

        let Some(extractor) = self.extractor_for(&path) else {
            return;
        };
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to read {}: {e}", path.display());
                return;
            }
        };

        let imports = extractor.extract_imports(&source);
        debug!("{}: {} import(s)", path.display(), imports.len());

        for specifier in imports {
            let reference = ImportReference {
                specifier,
                source_file: path.clone(),
            };
            let target = match self
                .resolver
                .resolve_reference(&reference.specifier, &reference.source_file)
            {
                Resolution::File(resolved) => graph.ensure_node(resolved),
                Resolution::Unresolved(specifier) => graph.ensure_external(specifier),
            };
            graph.add_edge(id, target);
        }
    }

    fn extractor_for(&self, path: &Path) -> Option<&dyn ImportExtractor> {
        self.extractors
            .iter()
            .find(|e| e.handles(path))
            .map(|e| &**e)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|re| re.is_match(&path_str))
    }
}

/// Subdirectories before files, each group in lexical order.
fn dirs_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}
