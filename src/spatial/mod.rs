//! Zone adjacency graph.
//!
//! Built once from the definition's adjacency declarations; edges are
//! symmetric. Conditions query direct adjacency and reachability, the
//! latter via breadth-first search.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

/// Symmetric adjacency between shared zones.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    edges: FxHashMap<String, Vec<String>>,
}

impl AdjacencyGraph {
    /// Build a graph from symmetric edge declarations.
    #[must_use]
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut graph = Self::default();
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }

    /// Add a symmetric edge.
    pub fn add_edge(&mut self, a: &str, b: &str) {
        let fwd = self.edges.entry(a.to_string()).or_default();
        if !fwd.iter().any(|n| n == b) {
            fwd.push(b.to_string());
        }
        let rev = self.edges.entry(b.to_string()).or_default();
        if !rev.iter().any(|n| n == a) {
            rev.push(a.to_string());
        }
    }

    /// Neighbors of a zone, in declaration order.
    #[must_use]
    pub fn neighbors(&self, zone: &str) -> &[String] {
        self.edges.get(zone).map_or(&[], Vec::as_slice)
    }

    /// True if the zones share an edge.
    #[must_use]
    pub fn adjacent(&self, a: &str, b: &str) -> bool {
        self.neighbors(a).iter().any(|n| n == b)
    }

    /// True if any path connects the zones. A zone is connected to
    /// itself.
    #[must_use]
    pub fn connected(&self, a: &str, b: &str) -> bool {
        self.distance(a, b).is_some()
    }

    /// Edge count of the shortest path between two zones, if any.
    #[must_use]
    pub fn distance(&self, a: &str, b: &str) -> Option<usize> {
        if a == b {
            return Some(0);
        }
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(a);
        queue.push_back((a, 0usize));
        while let Some((zone, dist)) = queue.pop_front() {
            for neighbor in self.neighbors(zone) {
                if neighbor == b {
                    return Some(dist + 1);
                }
                if seen.insert(neighbor) {
                    queue.push_back((neighbor, dist + 1));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> AdjacencyGraph {
        AdjacencyGraph::from_edges([("a", "b"), ("b", "c"), ("c", "d")])
    }

    #[test]
    fn test_adjacency_symmetric() {
        let g = line();
        assert!(g.adjacent("a", "b"));
        assert!(g.adjacent("b", "a"));
        assert!(!g.adjacent("a", "c"));
    }

    #[test]
    fn test_distance() {
        let g = line();
        assert_eq!(g.distance("a", "a"), Some(0));
        assert_eq!(g.distance("a", "b"), Some(1));
        assert_eq!(g.distance("a", "d"), Some(3));
        assert_eq!(g.distance("a", "island"), None);
    }

    #[test]
    fn test_connected_components() {
        let mut g = line();
        g.add_edge("x", "y");
        assert!(g.connected("a", "d"));
        assert!(g.connected("x", "y"));
        assert!(!g.connected("a", "x"));
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let g = AdjacencyGraph::from_edges([("a", "b"), ("a", "b"), ("b", "a")]);
        assert_eq!(g.neighbors("a").len(), 1);
        assert_eq!(g.neighbors("b").len(), 1);
    }
}
