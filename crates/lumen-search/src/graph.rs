//! Unweighted and weighted directed graphs keyed by [`NodeId`].
//!
//! Both graph types are plain adjacency lists. [`GridLayout`] maps between
//! grid coordinates and node ids for the 4-connected grids that tile-based
//! games search over.

use serde::{Deserialize, Serialize};

/// Identifies a node by its position in the graph's node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Directed graph without edge weights.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: Vec<Vec<NodeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph with `count` nodes and no edges.
    pub fn with_nodes(count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); count],
        }
    }

    pub fn add_node(&mut self) -> NodeId {
        self.adjacency.push(Vec::new());
        NodeId(self.adjacency.len() - 1)
    }

    /// Add a directed edge. Both endpoints must exist.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        assert!(to.0 < self.adjacency.len(), "edge target {to:?} out of range");
        self.adjacency[from.0].push(to);
    }

    pub fn add_undirected(&mut self, a: NodeId, b: NodeId) {
        self.add_edge(a, b);
        self.add_edge(b, a);
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node.0).map_or(&[], Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// A 4-connected grid. Blocked cells exist as nodes but have no edges.
    pub fn grid(layout: GridLayout, blocked: impl Fn(usize, usize) -> bool) -> Self {
        let mut graph = Self::with_nodes(layout.node_count());
        for (from, to) in layout.open_links(&blocked) {
            graph.add_edge(from, to);
        }
        graph
    }
}

// ---------------------------------------------------------------------------
// WeightedGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f32,
}

/// Directed graph with non-negative edge weights.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    edges: Vec<Vec<WeightedEdge>>,
}

impl WeightedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(count: usize) -> Self {
        Self {
            edges: vec![Vec::new(); count],
        }
    }

    pub fn add_node(&mut self) -> NodeId {
        self.edges.push(Vec::new());
        NodeId(self.edges.len() - 1)
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: f32) {
        assert!(to.0 < self.edges.len(), "edge target {to:?} out of range");
        debug_assert!(weight >= 0.0, "negative edge weight {weight}");
        self.edges[from.0].push(WeightedEdge { from, to, weight });
    }

    pub fn add_undirected(&mut self, a: NodeId, b: NodeId, weight: f32) {
        self.add_edge(a, b, weight);
        self.add_edge(b, a, weight);
    }

    pub fn edges(&self, node: NodeId) -> &[WeightedEdge] {
        self.edges.get(node.0).map_or(&[], Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// A 4-connected grid with every edge weighing `1.0`.
    pub fn grid(layout: GridLayout, blocked: impl Fn(usize, usize) -> bool) -> Self {
        let mut graph = Self::with_nodes(layout.node_count());
        for (from, to) in layout.open_links(&blocked) {
            graph.add_edge(from, to, 1.0);
        }
        graph
    }
}

// ---------------------------------------------------------------------------
// GridLayout
// ---------------------------------------------------------------------------

/// Row-major mapping between `(x, y)` cells and node ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub width: usize,
    pub height: usize,
}

impl GridLayout {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn node_count(&self) -> usize {
        self.width * self.height
    }

    pub fn node(&self, x: usize, y: usize) -> NodeId {
        debug_assert!(x < self.width && y < self.height);
        NodeId(y * self.width + x)
    }

    pub fn coords(&self, node: NodeId) -> (usize, usize) {
        (node.0 % self.width, node.0 / self.width)
    }

    /// Manhattan distance between two cells.
    pub fn manhattan(&self, a: NodeId, b: NodeId) -> f32 {
        let (ax, ay) = self.coords(a);
        let (bx, by) = self.coords(b);
        (ax.abs_diff(bx) + ay.abs_diff(by)) as f32
    }

    /// Directed links between orthogonally adjacent open cells, emitted per
    /// cell in up, down, left, right order.
    fn open_links(&self, blocked: &impl Fn(usize, usize) -> bool) -> Vec<(NodeId, NodeId)> {
        let mut links = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if blocked(x, y) {
                    continue;
                }
                let from = self.node(x, y);
                let mut link = |nx: usize, ny: usize| {
                    if !blocked(nx, ny) {
                        links.push((from, self.node(nx, ny)));
                    }
                };
                if y > 0 {
                    link(x, y - 1);
                }
                if y + 1 < self.height {
                    link(x, y + 1);
                }
                if x > 0 {
                    link(x - 1, y);
                }
                if x + 1 < self.width {
                    link(x + 1, y);
                }
            }
        }
        links
    }
}
