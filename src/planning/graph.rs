//! Arena-backed dependency graph over the entries of one tool chain
//!
//! Every chain position gets its own node, so duplicate tool names stay
//! distinct entries. Edges are node indices.
//!
//! Readiness is decided by name: an entry is ready once every tool it depends
//! on has at least one entry in the order built so far.

use crate::tools::catalog::DependencyMap;
use crate::tools::types::ToolName;
use std::collections::{HashMap, HashSet};

/// Index of a node in the graph arena
pub type NodeIndex = usize;

/// One chain entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNode {
    /// Tool name
    pub name: ToolName,

    /// Declared dependencies of this tool (names)
    pub depends_on: Vec<ToolName>,

    /// Nodes carrying a dependency name
    pub edges: Vec<NodeIndex>,

    /// Dependencies that do not appear anywhere in the chain
    pub missing: Vec<ToolName>,
}

/// Breadth-first layering of a chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
    /// Waves of mutually independent entries, in admission order
    pub waves: Vec<Vec<NodeIndex>>,

    /// Entries that could never become ready, in chain order
    pub stalled: Vec<NodeIndex>,
}

impl Layering {
    /// Whether every entry was admitted
    pub fn is_complete(&self) -> bool {
        self.stalled.is_empty()
    }
}

/// Dependency graph for one chain
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<ToolNode>,
}

impl DependencyGraph {
    /// Build the graph for `chain` using the declared `dependencies`
    pub fn build(chain: &[ToolName], dependencies: &DependencyMap) -> Self {
        let mut by_name: HashMap<&str, Vec<NodeIndex>> = HashMap::new();
        for (index, name) in chain.iter().enumerate() {
            by_name.entry(name.as_str()).or_default().push(index);
        }

        let nodes = chain
            .iter()
            .map(|name| {
                let depends_on = dependencies.get(name).cloned().unwrap_or_default();
                let mut edges = Vec::new();
                let mut missing = Vec::new();
                for dep in &depends_on {
                    match by_name.get(dep.as_str()) {
                        Some(indices) => edges.extend(indices.iter().copied()),
                        None => missing.push(dep.clone()),
                    }
                }
                ToolNode {
                    name: name.clone(),
                    depends_on,
                    edges,
                    missing,
                }
            })
            .collect();

        Self { nodes }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by index
    pub fn node(&self, index: NodeIndex) -> Option<&ToolNode> {
        self.nodes.get(index)
    }

    /// Names for a list of node indices
    pub fn names(&self, indices: &[NodeIndex]) -> Vec<ToolName> {
        indices.iter().map(|&i| self.nodes[i].name.clone()).collect()
    }

    /// Dependency names not present in the chain, deduplicated in first-seen order
    pub fn missing_dependencies(&self) -> Vec<ToolName> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .flat_map(|node| node.missing.iter())
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// Layer the chain into waves
    ///
    /// Each pass admits every remaining entry whose dependencies already have
    /// an admitted entry, keeping relative chain order. Entries admitted in
    /// the same pass do not satisfy each other. The loop stops when a pass
    /// admits nothing.
    pub fn waves(&self) -> Layering {
        let mut admitted: HashSet<&str> = HashSet::new();
        let mut remaining: Vec<NodeIndex> = (0..self.nodes.len()).collect();
        let mut layering = Layering::default();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<NodeIndex>, Vec<NodeIndex>) =
                remaining.iter().partition(|&&i| {
                    self.nodes[i]
                        .depends_on
                        .iter()
                        .all(|dep| admitted.contains(dep.as_str()))
                });

            if ready.is_empty() {
                layering.stalled = blocked;
                break;
            }

            admitted.extend(ready.iter().map(|&i| self.nodes[i].name.as_str()));
            layering.waves.push(ready);
            remaining = blocked;
        }

        layering
    }

    /// Find a dependency cycle among tools present in the chain
    ///
    /// Returns the tool names along the first cycle found, with the starting
    /// tool repeated at the end (`a -> b -> a`). The search visits tools in
    /// chain order and dependencies in declared order, so the answer is
    /// deterministic.
    pub fn detect_cycle(&self) -> Option<Vec<ToolName>> {
        // Collapse duplicate entries: one vertex per distinct name.
        let mut order: Vec<&str> = Vec::new();
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for node in &self.nodes {
            if adjacency.contains_key(node.name.as_str()) {
                continue;
            }
            order.push(node.name.as_str());
            let present: Vec<&str> = node
                .depends_on
                .iter()
                .map(String::as_str)
                .filter(|dep| !node.missing.iter().any(|m| m == dep))
                .collect();
            adjacency.insert(node.name.as_str(), present);
        }

        let mut colour: HashMap<&str, Colour> =
            order.iter().map(|&name| (name, Colour::White)).collect();
        let mut path: Vec<&str> = Vec::new();

        for &start in &order {
            if colour[start] == Colour::White {
                if let Some(cycle) = visit(start, &adjacency, &mut colour, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

fn visit<'a>(
    name: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    colour: &mut HashMap<&'a str, Colour>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<ToolName>> {
    colour.insert(name, Colour::Grey);
    path.push(name);

    if let Some(deps) = adjacency.get(name) {
        for &dep in deps {
            match colour.get(dep).copied() {
                Some(Colour::Grey) => {
                    let start = path.iter().position(|&p| p == dep).unwrap_or(0);
                    let mut cycle: Vec<ToolName> =
                        path[start..].iter().map(|s| s.to_string()).collect();
                    cycle.push(dep.to_string());
                    return Some(cycle);
                }
                Some(Colour::White) => {
                    if let Some(cycle) = visit(dep, adjacency, colour, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }
    }

    path.pop();
    colour.insert(name, Colour::Black);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(names: &[&str]) -> Vec<ToolName> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn deps(pairs: &[(&str, &[&str])]) -> DependencyMap {
        pairs
            .iter()
            .map(|(tool, on)| (tool.to_string(), on.iter().map(|d| d.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_edges_point_at_every_duplicate() {
        let graph = DependencyGraph::build(&chain(&["a", "b", "a"]), &deps(&[("b", &["a"])]));
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node(1).unwrap().edges, vec![0, 2]);
    }

    #[test]
    fn test_waves_group_independent_tools() {
        let graph = DependencyGraph::build(
            &chain(&["send_message", "create_workflow", "store_document"]),
            &deps(&[("send_message", &["create_workflow"])]),
        );
        let layering = graph.waves();

        assert!(layering.is_complete());
        assert_eq!(layering.waves, vec![vec![1, 2], vec![0]]);
    }

    #[test]
    fn test_same_wave_does_not_satisfy_dependency() {
        // c depends on b, b has no dependencies: b and c cannot share a wave.
        let graph = DependencyGraph::build(&chain(&["b", "c"]), &deps(&[("c", &["b"])]));
        assert_eq!(graph.waves().waves, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_missing_dependency_stalls() {
        let graph = DependencyGraph::build(
            &chain(&["a", "b", "c"]),
            &deps(&[("b", &["ghost"]), ("c", &["b"])]),
        );
        let layering = graph.waves();

        assert_eq!(layering.waves, vec![vec![0]]);
        assert_eq!(layering.stalled, vec![1, 2]);
        assert_eq!(graph.missing_dependencies(), vec!["ghost".to_string()]);
        assert!(graph.detect_cycle().is_none());
    }

    #[test]
    fn test_detect_cycle() {
        let graph = DependencyGraph::build(
            &chain(&["x", "a", "b"]),
            &deps(&[("a", &["b"]), ("b", &["a"])]),
        );
        assert_eq!(graph.detect_cycle(), Some(chain(&["a", "b", "a"])));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let graph = DependencyGraph::build(&chain(&["a"]), &deps(&[("a", &["a"])]));
        assert_eq!(graph.detect_cycle(), Some(chain(&["a", "a"])));
        assert_eq!(graph.waves().stalled, vec![0]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(&[], &DependencyMap::new());
        assert!(graph.is_empty());
        assert_eq!(graph.waves(), Layering::default());
        assert!(graph.detect_cycle().is_none());
    }
}
