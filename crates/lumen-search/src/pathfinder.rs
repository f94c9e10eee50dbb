//! Single-source graph searches: BFS, greedy best-first, A* and Dijkstra.
//!
//! BFS records a parent map. The weighted searches record a [`Scratch`]
//! entry per discovered node (parent edge, heuristic, cost from start, open
//! and closed membership) in a [`SearchMap`], and pick the next node to close
//! by scanning the open set for the minimum key:
//!
//! | search   | key                  | stops when              |
//! |----------|----------------------|-------------------------|
//! | GBFS     | heuristic            | goal closed / open empty |
//! | A*       | heuristic + cost     | goal closed / open empty |
//! | Dijkstra | cost                 | open empty              |
//!
//! Ties go to the node that entered the open set first.
//!
//! # Example
//!
//! ```
//! use lumen_search::prelude::*;
//!
//! let layout = GridLayout::new(4, 4);
//! let graph = WeightedGraph::grid(layout, |x, y| x == 1 && y < 3);
//! let start = layout.node(0, 0);
//! let goal = layout.node(3, 0);
//! let map = astar(&graph, start, goal, |a: NodeId, b: NodeId| layout.manhattan(a, b));
//! assert!(map.found);
//! assert_eq!(map.cost_to(goal), Some(9.0));
//! ```

use std::collections::{HashMap, VecDeque};

use crate::graph::{Graph, NodeId, WeightedEdge, WeightedGraph};

// ---------------------------------------------------------------------------
// Heuristic
// ---------------------------------------------------------------------------

/// Estimated remaining cost between two nodes.
pub trait Heuristic {
    fn estimate(&self, from: NodeId, to: NodeId) -> f32;
}

impl<F> Heuristic for F
where
    F: Fn(NodeId, NodeId) -> f32,
{
    fn estimate(&self, from: NodeId, to: NodeId) -> f32 {
        self(from, to)
    }
}

/// Always estimates zero. Admissible for any graph.
pub fn zero_heuristic(_from: NodeId, _to: NodeId) -> f32 {
    0.0
}

// ---------------------------------------------------------------------------
// BFS
// ---------------------------------------------------------------------------

/// Result of [`bfs`]: whether the goal was reached and the parent of every
/// discovered node.
#[derive(Debug, Clone, Default)]
pub struct BfsResult {
    pub found: bool,
    pub parents: HashMap<NodeId, NodeId>,
}

impl BfsResult {
    /// Nodes from `start` to `goal` inclusive, if the goal was reached.
    pub fn path_to(&self, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
        if start == goal {
            return Some(vec![start]);
        }
        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            current = *self.parents.get(&current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}

/// Breadth-first search from `start` until `goal` is dequeued.
pub fn bfs(graph: &Graph, start: NodeId, goal: NodeId) -> BfsResult {
    let mut result = BfsResult::default();
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        if current == goal {
            result.found = true;
            break;
        }
        for &next in graph.neighbors(current) {
            if next != start && !result.parents.contains_key(&next) {
                result.parents.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    tracing::trace!(?start, ?goal, found = result.found, "bfs finished");
    result
}

// ---------------------------------------------------------------------------
// Weighted searches
// ---------------------------------------------------------------------------

/// Per-node bookkeeping of a weighted search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scratch {
    pub parent_edge: Option<WeightedEdge>,
    pub heuristic: f32,
    pub cost_from_start: f32,
    pub in_open_set: bool,
    pub in_closed_set: bool,
}

/// Scratch entries of every node a weighted search touched.
#[derive(Debug, Clone, Default)]
pub struct SearchMap {
    /// Goal-directed searches: the goal was closed. Dijkstra: always `true`.
    pub found: bool,
    nodes: HashMap<NodeId, Scratch>,
}

impl SearchMap {
    pub fn get(&self, node: NodeId) -> Option<&Scratch> {
        self.nodes.get(&node)
    }

    /// Cost of the best known path to `node`. For GBFS this is the cost of
    /// the path it happened to find, not necessarily the cheapest.
    pub fn cost_to(&self, node: NodeId) -> Option<f32> {
        self.nodes
            .get(&node)
            .filter(|s| s.in_closed_set || s.in_open_set)
            .map(|s| s.cost_from_start)
    }

    /// Follow parent edges back from `goal` to `start`.
    pub fn path_to(&self, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            let edge = self.nodes.get(&current)?.parent_edge?;
            current = edge.from;
            path.push(current);
            if path.len() > self.nodes.len() + 1 {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    pub fn visited(&self) -> usize {
        self.nodes.len()
    }

    fn entry(&mut self, node: NodeId) -> &mut Scratch {
        self.nodes.entry(node).or_default()
    }

    fn close(&mut self, node: NodeId) {
        let scratch = self.entry(node);
        scratch.in_open_set = false;
        scratch.in_closed_set = true;
    }
}

/// Remove and return the open node with the smallest key. First wins ties.
fn pop_min(open: &mut Vec<NodeId>, key: impl Fn(NodeId) -> f32) -> Option<NodeId> {
    let (index, _) = open
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| key(**a).total_cmp(&key(**b)))?;
    Some(open.remove(index))
}

/// Greedy best-first search: always expands the node that looks closest to
/// the goal. Fast, but the path is not guaranteed to be the cheapest.
pub fn gbfs(
    graph: &WeightedGraph,
    start: NodeId,
    goal: NodeId,
    heuristic: impl Heuristic,
) -> SearchMap {
    let mut map = SearchMap::default();
    map.close(start);
    let mut open: Vec<NodeId> = Vec::new();
    let mut current = start;

    while current != goal {
        let cost = map.entry(current).cost_from_start;
        for edge in graph.edges(current) {
            let scratch = map.entry(edge.to);
            if scratch.in_closed_set {
                continue;
            }
            scratch.parent_edge = Some(*edge);
            scratch.cost_from_start = cost + edge.weight;
            if !scratch.in_open_set {
                scratch.heuristic = heuristic.estimate(edge.to, goal);
                scratch.in_open_set = true;
                open.push(edge.to);
            }
        }

        let Some(next) = pop_min(&mut open, |n| map.nodes[&n].heuristic) else {
            break;
        };
        map.close(next);
        current = next;
    }

    map.found = current == goal;
    tracing::trace!(?start, ?goal, found = map.found, visited = map.visited(), "gbfs finished");
    map
}

/// A* search: expands by heuristic plus cost so far, re-parenting open nodes
/// when a cheaper route turns up. Optimal with an admissible heuristic.
pub fn astar(
    graph: &WeightedGraph,
    start: NodeId,
    goal: NodeId,
    heuristic: impl Heuristic,
) -> SearchMap {
    let mut map = best_first(graph, start, Some(goal), heuristic);
    map.found = map.get(goal).is_some_and(|s| s.in_closed_set);
    tracing::trace!(?start, ?goal, found = map.found, visited = map.visited(), "astar finished");
    map
}

/// Dijkstra: cheapest cost from `start` to every reachable node.
pub fn dijkstra(graph: &WeightedGraph, start: NodeId) -> SearchMap {
    let mut map = best_first(graph, start, None, zero_heuristic);
    map.found = true;
    tracing::trace!(?start, visited = map.visited(), "dijkstra finished");
    map
}

fn best_first(
    graph: &WeightedGraph,
    start: NodeId,
    goal: Option<NodeId>,
    heuristic: impl Heuristic,
) -> SearchMap {
    let mut map = SearchMap::default();
    map.close(start);
    let mut open: Vec<NodeId> = Vec::new();
    let mut current = start;

    while Some(current) != goal {
        let cost = map.entry(current).cost_from_start;
        for edge in graph.edges(current) {
            let new_cost = cost + edge.weight;
            let scratch = map.entry(edge.to);
            if scratch.in_closed_set {
                continue;
            }
            if !scratch.in_open_set {
                scratch.parent_edge = Some(*edge);
                scratch.heuristic = goal.map_or(0.0, |g| heuristic.estimate(edge.to, g));
                scratch.cost_from_start = new_cost;
                scratch.in_open_set = true;
                open.push(edge.to);
            } else if new_cost < scratch.cost_from_start {
                scratch.parent_edge = Some(*edge);
                scratch.cost_from_start = new_cost;
            }
        }

        let Some(next) = pop_min(&mut open, |n| {
            let s = &map.nodes[&n];
            s.heuristic + s.cost_from_start
        }) else {
            break;
        };
        map.close(next);
        current = next;
    }
    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GridLayout;

    /// Two routes from 0 to 3: 0-1-3 costs 10, 0-2-3 costs 4.
    fn diamond() -> WeightedGraph {
        let mut g = WeightedGraph::with_nodes(4);
        g.add_edge(NodeId(0), NodeId(1), 1.0);
        g.add_edge(NodeId(1), NodeId(3), 9.0);
        g.add_edge(NodeId(0), NodeId(2), 2.0);
        g.add_edge(NodeId(2), NodeId(3), 2.0);
        g
    }

    #[test]
    fn bfs_finds_shortest_hop_path() {
        let layout = GridLayout::new(3, 3);
        let graph = Graph::grid(layout, |_, _| false);
        let start = layout.node(0, 0);
        let goal = layout.node(2, 2);
        let result = bfs(&graph, start, goal);
        assert!(result.found);
        let path = result.path_to(start, goal).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
    }

    #[test]
    fn bfs_reports_unreachable_goal() {
        let mut graph = Graph::with_nodes(3);
        graph.add_edge(NodeId(0), NodeId(1));
        let result = bfs(&graph, NodeId(0), NodeId(2));
        assert!(!result.found);
        assert!(result.path_to(NodeId(0), NodeId(2)).is_none());
    }

    #[test]
    fn astar_prefers_the_cheaper_route() {
        let map = astar(&diamond(), NodeId(0), NodeId(3), zero_heuristic);
        assert!(map.found);
        assert_eq!(map.cost_to(NodeId(3)), Some(4.0));
        assert_eq!(
            map.path_to(NodeId(0), NodeId(3)).unwrap(),
            [NodeId(0), NodeId(2), NodeId(3)]
        );
    }

    #[test]
    fn astar_reparents_open_nodes() {
        // 0->1 is expensive directly but cheap through 2.
        let mut g = WeightedGraph::with_nodes(4);
        g.add_edge(NodeId(0), NodeId(1), 10.0);
        g.add_edge(NodeId(0), NodeId(2), 1.0);
        g.add_edge(NodeId(2), NodeId(1), 1.0);
        g.add_edge(NodeId(1), NodeId(3), 1.0);
        let map = astar(&g, NodeId(0), NodeId(3), zero_heuristic);
        assert_eq!(map.cost_to(NodeId(3)), Some(3.0));
        assert_eq!(map.get(NodeId(1)).unwrap().parent_edge.unwrap().from, NodeId(2));
    }

    #[test]
    fn gbfs_follows_the_heuristic() {
        // Heuristic lies: it makes node 1 look as close as the goal, so GBFS
        // takes the expensive route.
        let h = |n: NodeId, _goal: NodeId| match n {
            NodeId(1) | NodeId(3) => 0.0,
            _ => 5.0,
        };
        let map = gbfs(&diamond(), NodeId(0), NodeId(3), h);
        assert!(map.found);
        assert_eq!(
            map.path_to(NodeId(0), NodeId(3)).unwrap(),
            [NodeId(0), NodeId(1), NodeId(3)]
        );
    }

    #[test]
    fn start_equal_to_goal_succeeds_immediately() {
        let graph = diamond();
        for map in [
            gbfs(&graph, NodeId(2), NodeId(2), zero_heuristic),
            astar(&graph, NodeId(2), NodeId(2), zero_heuristic),
        ] {
            assert!(map.found);
            assert_eq!(map.visited(), 1);
            assert_eq!(map.path_to(NodeId(2), NodeId(2)).unwrap(), [NodeId(2)]);
        }
    }

    #[test]
    fn searches_fail_cleanly_without_a_path() {
        let graph = diamond();
        assert!(!gbfs(&graph, NodeId(3), NodeId(0), zero_heuristic).found);
        assert!(!astar(&graph, NodeId(3), NodeId(0), zero_heuristic).found);
    }

    #[test]
    fn dijkstra_covers_every_reachable_node() {
        let map = dijkstra(&diamond(), NodeId(0));
        assert_eq!(map.cost_to(NodeId(0)), Some(0.0));
        assert_eq!(map.cost_to(NodeId(1)), Some(1.0));
        assert_eq!(map.cost_to(NodeId(2)), Some(2.0));
        assert_eq!(map.cost_to(NodeId(3)), Some(4.0));
        assert!(map.get(NodeId(3)).unwrap().in_closed_set);
    }
}
