use std::cmp::Reverse;

use crate::board::{Move, BOARD_SIZE};

const CENTER: (usize, usize) = (BOARD_SIZE / 2, BOARD_SIZE / 2);
const CORNERS: [(usize, usize); 4] = [
    (0, 0),
    (0, BOARD_SIZE - 1),
    (BOARD_SIZE - 1, 0),
    (BOARD_SIZE - 1, BOARD_SIZE - 1),
];

/// Stable sort putting the center first, then the corners. Only placements
/// are cells, so relocations keep their generated order.
pub fn order_moves(mut moves: Vec<Move>) -> Vec<Move> {
    moves.sort_by_key(|move_| {
        let cell = match *move_ {
            Move::Placement { row, col } => Some((row, col)),
            Move::Relocation { .. } => None,
        };
        Reverse((cell == Some(CENTER), cell.is_some_and(|c| CORNERS.contains(&c))))
    });
    moves
}
