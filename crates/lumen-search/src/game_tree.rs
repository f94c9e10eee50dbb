//! Two-player adversarial search: minimax and alpha-beta.
//!
//! The max player moves first. Two flavors are provided:
//!
//! - over a fully generated [`GameTreeNode`] tree, where leaves are scored;
//! - depth-limited and tree-free, expanding [`GameState::possible_moves`] on
//!   the fly and scoring a state when it is terminal or the depth runs out.
//!
//! Alpha-beta returns the same value as minimax; it only skips subtrees that
//! cannot change the decision.

/// A position in a two-player, perfect-information game.
pub trait GameState: Clone {
    /// Every state reachable by one move of the max (`true`) or min player.
    fn possible_moves(&self, max_player: bool) -> Vec<Self>;

    fn is_terminal(&self) -> bool;

    /// Positive favors the max player.
    fn score(&self) -> f32;
}

// ---------------------------------------------------------------------------
// Full game tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GameTreeNode<S> {
    pub state: S,
    pub children: Vec<GameTreeNode<S>>,
}

impl<S: GameState> GameTreeNode<S> {
    /// Expand every line of play from `state`, `max_player` moving first.
    pub fn generate(state: S, max_player: bool) -> Self {
        let children = if state.is_terminal() {
            Vec::new()
        } else {
            state
                .possible_moves(max_player)
                .into_iter()
                .map(|child| Self::generate(child, !max_player))
                .collect()
        };
        Self { state, children }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }
}

/// Value of `node` with the max player to move.
pub fn max_player_value<S: GameState>(node: &GameTreeNode<S>) -> f32 {
    if node.is_leaf() {
        return node.state.score();
    }
    node.children
        .iter()
        .map(min_player_value)
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Value of `node` with the min player to move.
pub fn min_player_value<S: GameState>(node: &GameTreeNode<S>) -> f32 {
    if node.is_leaf() {
        return node.state.score();
    }
    node.children
        .iter()
        .map(max_player_value)
        .fold(f32::INFINITY, f32::min)
}

/// The child of `root` the max player should move to. The first of equally
/// good children wins.
pub fn minimax_decide<S: GameState>(root: &GameTreeNode<S>) -> Option<&GameTreeNode<S>> {
    let mut choice = None;
    let mut best = f32::NEG_INFINITY;
    for child in &root.children {
        let value = min_player_value(child);
        if choice.is_none() || value > best {
            best = value;
            choice = Some(child);
        }
    }
    choice
}

fn alpha_beta_max<S: GameState>(node: &GameTreeNode<S>, mut alpha: f32, beta: f32) -> f32 {
    if node.is_leaf() {
        return node.state.score();
    }
    let mut max_value = f32::NEG_INFINITY;
    for child in &node.children {
        max_value = max_value.max(alpha_beta_min(child, alpha, beta));
        if max_value >= beta {
            return max_value;
        }
        alpha = alpha.max(max_value);
    }
    max_value
}

fn alpha_beta_min<S: GameState>(node: &GameTreeNode<S>, alpha: f32, mut beta: f32) -> f32 {
    if node.is_leaf() {
        return node.state.score();
    }
    let mut min_value = f32::INFINITY;
    for child in &node.children {
        min_value = min_value.min(alpha_beta_max(child, alpha, beta));
        if min_value <= alpha {
            return min_value;
        }
        beta = beta.min(min_value);
    }
    min_value
}

/// Same decision value as [`minimax_decide`], pruning hopeless subtrees.
pub fn alpha_beta_decide<S: GameState>(root: &GameTreeNode<S>) -> Option<&GameTreeNode<S>> {
    let mut choice = None;
    let mut best = f32::NEG_INFINITY;
    for child in &root.children {
        let value = alpha_beta_min(child, best, f32::INFINITY);
        if choice.is_none() || value > best {
            best = value;
            choice = Some(child);
        }
    }
    choice
}

// ---------------------------------------------------------------------------
// Depth-limited, tree-free
// ---------------------------------------------------------------------------

/// Depth-limited value with the max player to move.
pub fn max_player_value_limit<S: GameState>(state: &S, depth: u32) -> f32 {
    if depth == 0 || state.is_terminal() {
        return state.score();
    }
    let moves = state.possible_moves(true);
    if moves.is_empty() {
        return state.score();
    }
    moves
        .iter()
        .map(|child| min_player_value_limit(child, depth - 1))
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Depth-limited value with the min player to move.
pub fn min_player_value_limit<S: GameState>(state: &S, depth: u32) -> f32 {
    if depth == 0 || state.is_terminal() {
        return state.score();
    }
    let moves = state.possible_moves(false);
    if moves.is_empty() {
        return state.score();
    }
    moves
        .iter()
        .map(|child| max_player_value_limit(child, depth - 1))
        .fold(f32::INFINITY, f32::min)
}

/// Best move for the max player, looking `max_depth` plies ahead.
pub fn minimax_decide_limit<S: GameState>(state: &S, max_depth: u32) -> Option<S> {
    let mut choice = None;
    let mut best = f32::NEG_INFINITY;
    for child in state.possible_moves(true) {
        let value = min_player_value_limit(&child, max_depth.saturating_sub(1));
        if choice.is_none() || value > best {
            best = value;
            choice = Some(child);
        }
    }
    choice
}

fn alpha_beta_max_limit<S: GameState>(state: &S, depth: u32, mut alpha: f32, beta: f32) -> f32 {
    if depth == 0 || state.is_terminal() {
        return state.score();
    }
    let moves = state.possible_moves(true);
    if moves.is_empty() {
        return state.score();
    }
    let mut max_value = f32::NEG_INFINITY;
    for child in &moves {
        max_value = max_value.max(alpha_beta_min_limit(child, depth - 1, alpha, beta));
        if max_value >= beta {
            return max_value;
        }
        alpha = alpha.max(max_value);
    }
    max_value
}

fn alpha_beta_min_limit<S: GameState>(state: &S, depth: u32, alpha: f32, mut beta: f32) -> f32 {
    if depth == 0 || state.is_terminal() {
        return state.score();
    }
    let moves = state.possible_moves(false);
    if moves.is_empty() {
        return state.score();
    }
    let mut min_value = f32::INFINITY;
    for child in &moves {
        min_value = min_value.min(alpha_beta_max_limit(child, depth - 1, alpha, beta));
        if min_value <= alpha {
            return min_value;
        }
        beta = beta.min(min_value);
    }
    min_value
}

/// Alpha-beta counterpart of [`minimax_decide_limit`].
pub fn alpha_beta_decide_limit<S: GameState>(state: &S, max_depth: u32) -> Option<S> {
    let mut choice = None;
    let mut best = f32::NEG_INFINITY;
    for child in state.possible_moves(true) {
        let value = alpha_beta_min_limit(&child, max_depth.saturating_sub(1), best, f32::INFINITY);
        if choice.is_none() || value > best {
            best = value;
            choice = Some(child);
        }
    }
    choice
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
