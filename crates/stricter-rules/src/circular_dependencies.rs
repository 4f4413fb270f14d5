//! Rule reporting import cycles.
//!
//! Each cycle (strongly connected component) is reported once, on the file
//! of the component that comes first in walk order. The message shows one
//! concrete loop through that file, with root-relative paths.

use std::collections::VecDeque;
use std::path::Path;
use stricter_core::{FileNode, NodeId, ProjectGraph, Rule, RuleContext, RuleError, Violation};

/// Rule name for circular-dependencies.
pub const NAME: &str = "stricter/circular-dependencies";

/// Reports dependency cycles between files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularDependencies;

impl CircularDependencies {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for CircularDependencies {
    fn description(&self) -> &str {
        "Reports circular imports between files"
    }

    fn on_project(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>, RuleError> {
        let graph = ctx.graph;
        let mut cycles: Vec<Vec<NodeId>> = strongly_connected(graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || has_self_edge(graph, scc[0]))
            .collect();
        let position = |id: NodeId| (graph.get(id).and_then(FileNode::walk_index), id);
        for scc in &mut cycles {
            scc.sort_unstable_by_key(|&id| position(id));
        }
        cycles.sort_by_key(|scc| position(scc[0]));

        Ok(cycles
            .iter()
            .filter_map(|scc| {
                let head = graph.get(scc[0])?;
                let path = loop_through(graph, scc);
                let rendered = path
                    .iter()
                    .filter_map(|id| graph.get(*id))
                    .map(|n| relative(graph.root(), n.path()))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                Some(Violation::new(
                    head.path(),
                    format!("Circular dependency: {rendered}"),
                ))
            })
            .collect())
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn has_self_edge(graph: &ProjectGraph, id: NodeId) -> bool {
    graph
        .get(id)
        .is_some_and(|n| n.dependency_ids().contains(&id))
}

/// Shortest loop from the first member of `scc` back to itself.
fn loop_through(graph: &ProjectGraph, scc: &[NodeId]) -> Vec<NodeId> {
    let start = scc[0];
    let mut parent: Vec<Option<NodeId>> = vec![None; graph.len()];
    let mut queue = VecDeque::from([start]);
    let mut member = vec![false; graph.len()];
    for &id in scc {
        member[id] = true;
    }
    let mut visited = vec![false; graph.len()];
    visited[start] = true;

    while let Some(id) = queue.pop_front() {
        let Some(node) = graph.get(id) else {
            continue;
        };
        for &dep in node.dependency_ids() {
            if dep == start {
                let mut path = vec![start, id];
                let mut cursor = id;
                while let Some(prev) = parent[cursor] {
                    if prev == start {
                        break;
                    }
                    path.insert(1, prev);
                    cursor = prev;
                }
                if id == start {
                    path.truncate(1);
                }
                path.push(start);
                return path;
            }
            if !visited[dep] && member[dep] {
                visited[dep] = true;
                parent[dep] = Some(id);
                queue.push_back(dep);
            }
        }
    }
    vec![start]
}

/// Tarjan's algorithm, iterative.
fn strongly_connected(graph: &ProjectGraph) -> Vec<Vec<NodeId>> {
    let n = graph.len();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<NodeId> = Vec::new();
    let mut next_index = 0;
    let mut components = Vec::new();

    for start in 0..n {
        if index[start].is_some() {
            continue;
        }
        index[start] = Some(next_index);
        low[start] = next_index;
        next_index += 1;
        stack.push(start);
        on_stack[start] = true;

        let mut frames: Vec<(NodeId, usize)> = vec![(start, 0)];
        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            let deps = graph.get(v).map_or(&[][..], |node| node.dependency_ids());

            if frame.1 < deps.len() {
                let w = deps[frame.1];
                frame.1 += 1;
                match index[w] {
                    None => {
                        index[w] = Some(next_index);
                        low[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        frames.push((w, 0));
                    }
                    Some(w_index) if on_stack[w] => low[v] = low[v].min(w_index),
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                low[parent] = low[parent].min(low[v]);
            }
            if Some(low[v]) == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}
