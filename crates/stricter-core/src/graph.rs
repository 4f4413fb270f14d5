//! Project dependency graph.
//!
//! The graph is built once per run by [`GraphBuilder`](crate::GraphBuilder)
//! and handed to rule hooks for read-only traversal. Node ids follow creation
//! order; [`ProjectGraph::files`] follows walk order, which is what rules
//! iterate by default.

use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Index of a node inside its [`ProjectGraph`].
pub type NodeId = usize;

/// A file (or unresolved specifier) in the project graph.
#[derive(Debug, Clone)]
pub struct FileNode {
    id: NodeId,
    path: PathBuf,
    dependencies: Vec<NodeId>,
    walk_index: Option<usize>,
    external: bool,
}

impl FileNode {
    /// Position of this node in creation order.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Canonical absolute path, or the raw specifier when resolution failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids of resolved dependencies, deduplicated, in first-seen order.
    #[must_use]
    pub fn dependency_ids(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// Whether the builder visited this file during the walk.
    ///
    /// Nodes that were only referenced (outside the root, excluded, or
    /// unresolved) are leaves with no outgoing edges.
    #[must_use]
    pub fn is_walked(&self) -> bool {
        self.walk_index.is_some()
    }

    /// Position in walk order, for walked files.
    #[must_use]
    pub fn walk_index(&self) -> Option<usize> {
        self.walk_index
    }

    /// Whether this node stands for a specifier that did not resolve to a file.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.external
    }
}

/// A logical subdivision of the project, used by dynamic rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    /// Root-relative directory, `/`-separated (e.g., `foo` or `packages/ui`).
    pub name: String,
    /// Absolute directory path.
    pub path: PathBuf,
}

/// Directed graph of files and their resolved import edges.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    root: PathBuf,
    nodes: IndexMap<PathBuf, FileNode>,
    walk_order: Vec<NodeId>,
    packages: Vec<PackageDescriptor>,
}

impl ProjectGraph {
    /// Creates an empty graph rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            nodes: IndexMap::new(),
            walk_order: Vec::new(),
            packages: Vec::new(),
        }
    }

    /// Analysis root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discovered packages, in discovery order.
    #[must_use]
    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.packages
    }

    /// Names of the discovered packages.
    #[must_use]
    pub fn package_names(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.name.clone()).collect()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.values()
    }

    /// Nodes visited by the walk, in walk order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.walk_order.iter().filter_map(|id| self.get(*id))
    }

    /// Looks up a node by path.
    #[must_use]
    pub fn node(&self, path: &Path) -> Option<&FileNode> {
        self.nodes.get(path)
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&FileNode> {
        self.nodes.get_index(id).map(|(_, node)| node)
    }

    /// Resolved dependencies of `node`, in edge order.
    pub fn dependencies<'a>(&'a self, node: &'a FileNode) -> impl Iterator<Item = &'a FileNode> {
        node.dependencies.iter().filter_map(move |id| self.get(*id))
    }

    /// Nodes with an edge to `node`, in creation order.
    #[must_use]
    pub fn dependents(&self, node: &FileNode) -> Vec<&FileNode> {
        self.nodes
            .values()
            .filter(|n| n.dependencies.contains(&node.id))
            .collect()
    }

    /// Returns the id for `path`, creating a leaf node on first reference.
    pub fn ensure_node(&mut self, path: PathBuf) -> NodeId {
        self.insert_node(path, false)
    }

    /// Returns the id for an unresolved specifier, creating an external leaf
    /// on first reference.
    pub fn ensure_external(&mut self, specifier: impl Into<PathBuf>) -> NodeId {
        self.insert_node(specifier.into(), true)
    }

    fn insert_node(&mut self, path: PathBuf, external: bool) -> NodeId {
        if let Some(id) = self.nodes.get_index_of(&path) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.insert(
            path.clone(),
            FileNode {
                id,
                path,
                dependencies: Vec::new(),
                walk_index: None,
                external,
            },
        );
        id
    }

    /// Marks a node as visited by the walk, appending it to walk order.
    pub fn mark_walked(&mut self, id: NodeId) {
        let position = self.walk_order.len();
        if let Some((_, node)) = self.nodes.get_index_mut(id) {
            if node.walk_index.is_none() {
                node.walk_index = Some(position);
                self.walk_order.push(id);
            }
        }
    }

    /// Appends an edge, ignoring duplicates so first-seen order is kept.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if let Some((_, node)) = self.nodes.get_index_mut(from) {
            if !node.dependencies.contains(&to) {
                node.dependencies.push(to);
            }
        }
    }

    pub(crate) fn set_packages(&mut self, packages: Vec<PackageDescriptor>) {
        self.packages = packages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProjectGraph {
        let mut graph = ProjectGraph::new("/p");
        let index = graph.ensure_node(PathBuf::from("/p/index.js"));
        let foo = graph.ensure_node(PathBuf::from("/p/foo.js"));
        let react = graph.ensure_external("react");
        graph.mark_walked(index);
        graph.mark_walked(foo);
        graph.add_edge(index, foo);
        graph.add_edge(index, react);
        graph.add_edge(index, foo);
        graph
    }

    #[test]
    fn ensure_node_is_idempotent() {
        let mut graph = sample();
        let before = graph.len();
        let id = graph.ensure_node(PathBuf::from("/p/foo.js"));
        assert_eq!(id, 1);
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let graph = sample();
        let index = graph.node(Path::new("/p/index.js")).unwrap();
        assert_eq!(index.dependency_ids(), &[1, 2]);
    }

    #[test]
    fn files_skips_referenced_only_nodes() {
        let graph = sample();
        let files: Vec<_> = graph.files().map(FileNode::path).collect();
        assert_eq!(files, vec![Path::new("/p/index.js"), Path::new("/p/foo.js")]);
        assert!(graph.node(Path::new("react")).unwrap().is_external());
    }

    #[test]
    fn files_follow_walk_order_not_creation_order() {
        let mut graph = ProjectGraph::new("/p");
        let x = graph.ensure_node(PathBuf::from("/p/lib/x.js"));
        graph.mark_walked(x);
        let zzz = graph.ensure_node(PathBuf::from("/p/zzz.js"));
        graph.add_edge(x, zzz);
        let aaa = graph.ensure_node(PathBuf::from("/p/aaa.js"));
        graph.mark_walked(aaa);
        graph.mark_walked(zzz);
        graph.mark_walked(aaa);

        let files: Vec<_> = graph.files().map(FileNode::id).collect();
        assert_eq!(files, vec![x, aaa, zzz]);
        assert_eq!(graph.get(zzz).unwrap().walk_index(), Some(2));
    }

    #[test]
    fn walked_paths_are_not_external() {
        let graph = sample();
        assert!(!graph.node(Path::new("/p/foo.js")).unwrap().is_external());
    }

    #[test]
    fn dependents_are_reverse_edges() {
        let graph = sample();
        let foo = graph.node(Path::new("/p/foo.js")).unwrap();
        let dependents: Vec<_> = graph.dependents(foo).iter().map(|n| n.id()).collect();
        assert_eq!(dependents, vec![0]);
    }

    #[test]
    fn dependencies_resolve_ids() {
        let graph = sample();
        let index = graph.node(Path::new("/p/index.js")).unwrap();
        let deps: Vec<_> = graph.dependencies(index).map(FileNode::path).collect();
        assert_eq!(deps, vec![Path::new("/p/foo.js"), Path::new("react")]);
    }
}
