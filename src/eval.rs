use lazy_static::lazy_static;

use crate::board::{BitArr2D, BitBoard, Board, Player, BOARD_SIZE};
use crate::config::EngineConfig;

const LINE_LENGTH: usize = 3;
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

struct Line {
    anchor: u64,
    mask: u64,
}

lazy_static! {
    // every run of 3 consecutive in-bounds cells, once per anchor and direction
    static ref LINES: Vec<Line> = {
        let mut lines = Vec::<Line>::new();
        for (dr, dc) in DIRECTIONS {
            for row in 0..BOARD_SIZE {
                for col in 0..BOARD_SIZE {
                    let cells: Option<Vec<(usize, usize)>> = (0..LINE_LENGTH as isize).map(|i| {
                        let r = row.checked_add_signed(i * dr)?;
                        let c = col.checked_add_signed(i * dc)?;
                        (r < BOARD_SIZE && c < BOARD_SIZE).then_some((r, c))
                    }).collect();
                    if let Some(cells) = cells {
                        let mut mask = BitBoard::empty();
                        for (r, c) in cells {
                            mask.set_point(r, c, true);
                        }
                        let anchor = BitBoard::from_point(row, col).raw_u64();
                        lines.push(Line { anchor, mask: mask.raw_u64() });
                    }
                }
            }
        }
        lines
    };
}

/// Positional score of a board, always from the point of view of the player
/// the evaluator was built for.
pub struct Evaluator {
    player: Player,
    line_weight: i32,
    threat_weight: i32,
}

impl Evaluator {
    pub fn new(player: Player, config: &EngineConfig) -> Self {
        Self {
            player,
            line_weight: config.line_weight,
            threat_weight: config.threat_weight,
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn evaluate(&self, board: &Board) -> i32 {
        self.line_score(board) + self.threat_score(board)
    }

    /// Two of ours and a gap scores `+line_weight`, two of theirs and a gap
    /// `-line_weight`, anything else nothing.
    pub fn line_score(&self, board: &Board) -> i32 {
        let my_squares = board.squares(self.player).raw_u64();
        let opp_squares = board.squares(self.player.opponent()).raw_u64();
        LINES.iter().map(|line| {
            let mine = (line.mask & my_squares).count_ones();
            let theirs = (line.mask & opp_squares).count_ones();
            match (mine, theirs) {
                (2, 0) => self.line_weight,
                (0, 2) => -self.line_weight,
                _ => 0,
            }
        }).sum()
    }

    /// Opponent two-with-a-gap lines probed from each opponent piece. Lines
    /// cut short by the edge never qualify, so only lines whose anchor is an
    /// opponent piece need checking.
    pub fn threat_score(&self, board: &Board) -> i32 {
        let opp_squares = board.squares(self.player.opponent()).raw_u64();
        let empty_squares = board.empty_squares().raw_u64();
        LINES.iter()
            .filter(|line| line.anchor & opp_squares != 0)
            .filter(|line| {
                (line.mask & opp_squares).count_ones() == 2 && (line.mask & empty_squares).count_ones() == 1
            })
            .map(|_| self.threat_weight)
            .sum()
    }
}
