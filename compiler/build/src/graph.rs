//! The per-library build graph.
//!
//! Nodes are library source files; an edge `imports(A, B)` records that
//! A's elaboration consumed B's exports. Nodes transition forward through
//! the compile states and reset to `Fresh` when their file changes or any
//! upstream node resets.

use std::path::{Path, PathBuf};
use utility::{cycle::find_cycles, HashMap, HashSet};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompileState {
    Fresh,
    Parsed,
    Resolved,
    TypeChecked,
    Failed,
}

struct Node {
    state: CompileState,
    imports: HashSet<PathBuf>,
    dependents: HashSet<PathBuf>,
}

impl Node {
    fn new() -> Self {
        Self {
            state: CompileState::Fresh,
            imports: HashSet::default(),
            dependents: HashSet::default(),
        }
    }
}

#[derive(Default)]
pub struct BuildGraph {
    nodes: HashMap<PathBuf, Node>,
}

impl BuildGraph {
    /// Register a node. Existing nodes keep their state and edges.
    pub fn insert(&mut self, path: PathBuf) {
        self.nodes.entry(path).or_insert_with(Node::new);
    }

    pub fn remove(&mut self, path: &Path) {
        let Some(node) = self.nodes.remove(path) else {
            return;
        };

        for import in node.imports {
            if let Some(import) = self.nodes.get_mut(&import) {
                import.dependents.remove(path);
            }
        }
        for dependent in node.dependents {
            if let Some(dependent) = self.nodes.get_mut(&dependent) {
                dependent.imports.remove(path);
            }
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn state(&self, path: &Path) -> Option<CompileState> {
        self.nodes.get(path).map(|node| node.state)
    }

    pub fn set_state(&mut self, path: &Path, state: CompileState) {
        if let Some(node) = self.nodes.get_mut(path) {
            node.state = state;
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&Path, CompileState)> {
        self.nodes.iter().map(|(path, node)| (&**path, node.state))
    }

    /// Replace a node's import edges. Only edges to nodes of this graph are
    /// recorded; imports of other libraries are not tracked here.
    pub fn set_imports(&mut self, path: &Path, imports: Vec<PathBuf>) {
        let old: Vec<_> = match self.nodes.get_mut(path) {
            Some(node) => node.imports.drain().collect(),
            None => return,
        };

        for import in old {
            if let Some(import) = self.nodes.get_mut(&import) {
                import.dependents.remove(path);
            }
        }

        for import in imports {
            if import == *path || !self.nodes.contains_key(&import) {
                continue;
            }
            self.nodes
                .get_mut(&import)
                .unwrap()
                .dependents
                .insert(path.to_owned());
            self.nodes
                .get_mut(path)
                .unwrap()
                .imports
                .insert(import);
        }
    }

    pub fn dependents(&self, path: &Path) -> Vec<PathBuf> {
        let mut dependents: Vec<_> = self
            .nodes
            .get(path)
            .map(|node| node.dependents.iter().cloned().collect())
            .unwrap_or_default();
        dependents.sort();
        dependents
    }

    pub fn imports(&self, path: &Path) -> impl Iterator<Item = &Path> {
        self.nodes
            .get(path)
            .into_iter()
            .flat_map(|node| node.imports.iter().map(|path| &**path))
    }

    /// Reset the node and all its transitive dependents to `Fresh`.
    ///
    /// Returns the affected set, the node itself first.
    pub fn mark_fresh(&mut self, path: &Path) -> Vec<PathBuf> {
        if !self.nodes.contains_key(path) {
            return Vec::new();
        }

        let mut affected = vec![path.to_owned()];
        let mut index = 0;

        while index < affected.len() {
            let current = affected[index].clone();
            index += 1;

            let node = self.nodes.get_mut(&current).unwrap();
            node.state = CompileState::Fresh;

            let mut dependents: Vec<_> = node.dependents.iter().cloned().collect();
            dependents.sort();
            for dependent in dependents {
                if !affected.contains(&dependent) {
                    affected.push(dependent);
                }
            }
        }

        affected
    }

    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let adjacency: HashMap<PathBuf, Vec<PathBuf>> = self
            .nodes
            .iter()
            .map(|(path, node)| (path.clone(), node.imports.iter().cloned().collect()))
            .collect();

        find_cycles(&adjacency)
    }

    /// A deterministic topological order, imports first.
    ///
    /// Nodes on import cycles are left out; the caller is expected to have
    /// reported them.
    pub fn compilation_order(&self) -> Vec<PathBuf> {
        let mut in_degree: HashMap<PathBuf, usize> = self
            .nodes
            .iter()
            .map(|(path, node)| (path.clone(), node.imports.len()))
            .collect();

        let mut ready: Vec<PathBuf> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(path, _)| path.clone())
            .collect();
        ready.sort();
        ready.reverse();

        let mut order = Vec::new();

        while let Some(path) = ready.pop() {
            let mut unblocked = Vec::new();
            for dependent in &self.nodes[&path].dependents {
                let degree = in_degree.get_mut(dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    unblocked.push(dependent.clone());
                }
            }
            order.push(path);

            ready.extend(unblocked);
            // keep the stack sorted descending so ties resolve by path
            ready.sort();
            ready.reverse();
        }

        order
    }
}

#[cfg(test)]
mod test {
    use super::{BuildGraph, CompileState};
    use std::path::PathBuf;

    fn path(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    fn graph(edges: &[(&str, &[&str])]) -> BuildGraph {
        let mut graph = BuildGraph::default();
        for (node, _) in edges {
            graph.insert(path(node));
        }
        for (node, imports) in edges {
            graph.set_imports(&path(node), imports.iter().map(|name| path(name)).collect());
        }
        graph
    }

    #[test]
    fn marking_fresh_propagates_to_transitive_dependents() {
        let mut graph = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[]), ("d", &[])]);
        for node in ["a", "b", "c", "d"] {
            graph.set_state(&path(node), CompileState::TypeChecked);
        }

        let affected = graph.mark_fresh(&path("c"));

        assert_eq!(affected, [path("c"), path("b"), path("a")]);
        assert_eq!(graph.state(&path("a")), Some(CompileState::Fresh));
        assert_eq!(graph.state(&path("d")), Some(CompileState::TypeChecked));
    }

    #[test]
    fn compilation_order_puts_imports_first() {
        let graph = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);

        assert_eq!(
            graph.compilation_order(),
            [path("c"), path("b"), path("a")]
        );
    }

    #[test]
    fn cycles_are_detected_and_skipped() {
        let graph = graph(&[("a", &["b"]), ("b", &["a"]), ("c", &[])]);

        assert_eq!(graph.cycles().len(), 1);
        assert_eq!(graph.compilation_order(), [path("c")]);
    }

    #[test]
    fn removal_unlinks_edges() {
        let mut graph = graph(&[("a", &["b"]), ("b", &[])]);
        graph.remove(&path("b"));

        assert!(!graph.contains(&path("b")));
        assert_eq!(graph.imports(&path("a")).count(), 0);
    }
}
