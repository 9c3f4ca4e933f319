//! Move selection for a two-phase placement/movement game on an 8x8 grid.
//!
//! Each side first drops its pieces on empty cells, then relocates them. The
//! [`Engine`] runs a depth-limited minimax with alpha-beta pruning over
//! [`Board`] snapshots, memoizing scores by grid contents.
//!
//! ```
//! use push_battle::{Board, Engine, EngineConfig, Player};
//!
//! let mut engine = Engine::new(Player::Player1, EngineConfig::default().with_fixed_depth(1));
//! let chosen = engine.select_move(&Board::new());
//! assert!(chosen.is_some());
//! ```

pub mod board;
pub mod cache;
pub mod config;
pub mod engine;
pub mod eval;
pub mod ordering;

pub use board::{Board, Cell, Move, Player, BOARD_SIZE, NUM_PIECES};
pub use config::{CacheScope, EngineConfig};
pub use engine::{Engine, NeverTerminal, SearchStats, TerminalTest};
