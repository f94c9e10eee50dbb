//! Lumen Search -- graph search and two-player game-tree search.
//!
//! - [`pathfinder`]: BFS, greedy best-first, A* and Dijkstra over the graphs
//!   in [`graph`].
//! - [`game_tree`]: minimax and alpha-beta, over a generated tree or
//!   depth-limited over any [`GameState`](game_tree::GameState).
//! - [`tic_tac_toe`] and [`connect_four`]: complete game states for the
//!   adversarial searches.

#![deny(unsafe_code)]

pub mod connect_four;
pub mod game_tree;
pub mod graph;
pub mod pathfinder;
pub mod tic_tac_toe;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::connect_four::{ConnectFour, Disc};
    pub use crate::game_tree::{
        alpha_beta_decide, alpha_beta_decide_limit, minimax_decide, minimax_decide_limit,
        GameState, GameTreeNode,
    };
    pub use crate::graph::{Graph, GridLayout, NodeId, WeightedEdge, WeightedGraph};
    pub use crate::pathfinder::{
        astar, bfs, dijkstra, gbfs, zero_heuristic, BfsResult, Heuristic, Scratch, SearchMap,
    };
    pub use crate::tic_tac_toe::{Square, TicTacToe};
}
