use std::time::Instant;

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::board::{Board, Fingerprint, Move, Player, NUM_PIECES};
use crate::cache::TranspositionCache;
use crate::config::{CacheScope, EngineConfig};
use crate::eval::Evaluator;
use crate::ordering::order_moves;

const INF: i32 = i32::MAX;

/// Decides whether a position ends the game. Win and draw rules belong to
/// the rules engine; the search only asks.
pub trait TerminalTest {
    fn is_terminal(&self, board: &Board) -> bool;
}

/// Treats no position as decided, so only depth stops the search.
pub struct NeverTerminal;

impl TerminalTest for NeverTerminal {
    fn is_terminal(&self, _board: &Board) -> bool {
        false
    }
}

impl<F: Fn(&Board) -> bool> TerminalTest for F {
    fn is_terminal(&self, board: &Board) -> bool {
        self(board)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub depth: u32,
    pub nodes: u64,
    pub evaluations: u64,
    pub cache_hits: u64,
    pub cutoffs: u64,
    pub time_ms: u64,
}

pub struct Engine {
    player: Player,
    config: EngineConfig,
    evaluator: Evaluator,
    cache: TranspositionCache,
    terminal: Box<dyn TerminalTest>,
    rng: StdRng,
    stats: SearchStats,
}

impl Engine {
    pub fn new(player: Player, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            player,
            evaluator: Evaluator::new(player, &config),
            config,
            cache: TranspositionCache::new(),
            terminal: Box::new(NeverTerminal),
            rng,
            stats: SearchStats::default(),
        }
    }

    pub fn with_terminal_test(mut self, terminal: impl TerminalTest + 'static) -> Self {
        self.terminal = Box::new(terminal);
        self
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Statistics of the last `select_move` call.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Forgets everything learned during the current game.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.stats = SearchStats::default();
    }

    /// Shallow while fewer than half of our own pieces are down, deep after.
    pub fn search_depth(&self, board: &Board) -> u32 {
        if board.pieces_placed(self.player) < NUM_PIECES / 2 {
            self.config.shallow_depth
        } else {
            self.config.deep_depth
        }
    }

    /// Picks a move for `board.current_player`, or `None` when there is no
    /// legal move at all.
    pub fn select_move(&mut self, board: &Board) -> Option<Move> {
        if board.current_player != self.player {
            warn!("engine plays {} but {} is to move", self.player, board.current_player);
        }
        if self.config.cache_scope == CacheScope::Move {
            self.cache.clear();
        }

        let start = Instant::now();
        let depth = self.search_depth(board);
        self.stats = SearchStats { depth, ..SearchStats::default() };

        let moves = board.legal_moves();
        if moves.is_empty() {
            info!("no legal moves for {}", board.current_player);
            return None;
        }

        let (best_move, best_value) = self.search_root(board, &moves, depth);
        self.stats.time_ms = start.elapsed().as_millis() as u64;
        debug!("search stats: {:?}, cache size {}", self.stats, self.cache.len());

        match best_move {
            Some(move_) => {
                info!("{} plays {} (score {}, depth {})", board.current_player, move_, best_value, depth);
                Some(move_)
            },
            None => {
                let move_ = moves.choose(&mut self.rng).copied();
                info!("no candidate beat -inf, falling back to random move {:?}", move_);
                move_
            },
        }
    }

    /// Scores every root candidate on its own copy of `board`. Only a
    /// strictly better value replaces the current best, so ties keep the
    /// earliest candidate in move order.
    pub fn search_root(&mut self, board: &Board, moves: &[Move], depth: u32) -> (Option<Move>, i32) {
        let mut best_move = None;
        let mut best_value = -INF;

        for move_ in order_moves(moves.to_vec()) {
            let child = board.make_move(move_);
            let value = self.minimax(&child, depth, -INF, INF, false);
            debug!("candidate {} -> {}", move_, value);
            if value > best_value {
                best_value = value;
                best_move = Some(move_);
            }
        }

        (best_move, best_value)
    }

    fn minimax(&mut self, board: &Board, depth: u32, mut alpha: i32, mut beta: i32, maximizing: bool) -> i32 {
        self.stats.nodes += 1;

        // keyed on the grid alone, whatever the remaining depth
        let fingerprint = board.fingerprint();
        if self.config.use_cache {
            if let Some(score) = self.cache.get(&fingerprint) {
                self.stats.cache_hits += 1;
                return score;
            }
        }

        if depth == 0 || self.terminal.is_terminal(board) {
            self.stats.evaluations += 1;
            let score = self.evaluator.evaluate(board);
            self.store(fingerprint, score);
            return score;
        }

        let mut best = if maximizing { -INF } else { INF };
        for move_ in board.legal_moves() {
            let child = board.make_move(move_);
            let score = self.minimax(&child, depth - 1, alpha, beta, !maximizing);
            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if beta <= alpha {
                self.stats.cutoffs += 1;
                break;
            }
        }

        self.store(fingerprint, best);
        best
    }

    fn store(&mut self, fingerprint: Fingerprint, score: i32) {
        if self.config.use_cache {
            self.cache.put(fingerprint, score);
        }
    }
}
