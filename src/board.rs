use std::fmt;

use bitvec::{prelude::*, slice::IterOnes};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeStruct, Serializer};

pub const BOARD_SIZE: usize = 8;
pub const NUM_PIECES: u8 = 8;
const B: usize = BOARD_SIZE * BOARD_SIZE;
pub type BitBoard = BitArr!(for B, in u8, Lsb0);
// row-major, one bit per cell: index = row * BOARD_SIZE + col

pub trait BitArr2D {
    fn empty() -> Self;
    fn get_point(&self, row: usize, col: usize) -> bool;
    fn set_point(&mut self, row: usize, col: usize, value: bool);
    fn from_point(row: usize, col: usize) -> Self;
    type IterPoints<'a>: Iterator<Item=(usize, usize)> + 'a where Self: 'a;
    fn iter_set_points(&'_ self) -> Self::IterPoints<'_>;
    fn raw_u64(&self) -> u64;
}

impl BitArr2D for BitBoard {
    fn empty() -> Self {
        bitarr!(u8, Lsb0; 0; B)
    }

    fn get_point(&self, row: usize, col: usize) -> bool {
        self[row * BOARD_SIZE + col]
    }

    fn set_point(&mut self, row: usize, col: usize, value: bool) {
        self.set(row * BOARD_SIZE + col, value);
    }

    fn from_point(row: usize, col: usize) -> Self {
        let mut square: BitBoard = BitBoard::empty();
        square.set_point(row, col, true);
        square
    }

    type IterPoints<'a> = std::iter::Map<IterOnes<'a, u8, Lsb0>, fn(usize) -> (usize, usize)>;

    fn iter_set_points(&'_ self) -> Self::IterPoints<'_> {
        self.iter_ones().map(|idx| (idx / BOARD_SIZE, idx % BOARD_SIZE))
    }

    fn raw_u64(&self) -> u64 {
        self.as_raw_slice().iter().rev().fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Player {
    Player1,
    Player2,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Player1 => Player::Player2,
            Player::Player2 => Player::Player1,
        }
    }

    fn index(self) -> usize {
        match self {
            Player::Player1 => 0,
            Player::Player2 => 1,
        }
    }

    fn code(self) -> i8 {
        match self {
            Player::Player1 => 1,
            Player::Player2 => -1,
        }
    }

    fn from_code(code: i8) -> Option<Self> {
        match code {
            1 => Some(Player::Player1),
            -1 => Some(Player::Player2),
            _ => None,
        }
    }
}

impl Serialize for Player {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_i8(self.code())
    }
}

impl<'de> Deserialize<'de> for Player {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let code = i8::deserialize(deserializer)?;
        Player::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid player {}, expected 1 or -1", code)))
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Player1 => write!(f, "PLAYER1"),
            Player::Player2 => write!(f, "PLAYER2"),
        }
    }
}

/// Contents of one cell: `None` is empty.
pub type Cell = Option<Player>;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    Placement { row: usize, col: usize },
    Relocation { from_row: usize, from_col: usize, to_row: usize, to_col: usize },
}

impl Move {
    /// Destination cell of the move.
    pub fn target(&self) -> (usize, usize) {
        match *self {
            Move::Placement { row, col } => (row, col),
            Move::Relocation { to_row, to_col, .. } => (to_row, to_col),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Placement { row, col } => write!(f, "place ({}, {})", row, col),
            Move::Relocation { from_row, from_col, to_row, to_col } =>
                write!(f, "move ({}, {}) -> ({}, {})", from_row, from_col, to_row, to_col),
        }
    }
}

/// Cache key derived from the grid alone. Whose turn it is and the piece
/// counters do not take part.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Fingerprint(u64, u64);

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Board {
    player1_squares: BitBoard,
    player2_squares: BitBoard,
    pieces_placed: [u8; 2],
    pub current_player: Player,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            player1_squares: BitBoard::empty(),
            player2_squares: BitBoard::empty(),
            pieces_placed: [0, 0],
            current_player: Player::Player1,
        }
    }

    /// Builds a board from raw cells. Nothing is validated: the caller owns
    /// the consistency of cells and counters.
    pub fn from_cells(cells: &[[Cell; BOARD_SIZE]; BOARD_SIZE], current_player: Player, pieces_placed: [u8; 2]) -> Self {
        let mut board = Self { current_player, pieces_placed, ..Self::new() };
        for (row, line) in cells.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                if let Some(player) = cell {
                    board.squares_mut(*player).set_point(row, col, true);
                }
            }
        }
        board
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        if self.player1_squares.get_point(row, col) {
            Some(Player::Player1)
        } else if self.player2_squares.get_point(row, col) {
            Some(Player::Player2)
        } else {
            None
        }
    }

    pub fn cells(&self) -> [[Cell; BOARD_SIZE]; BOARD_SIZE] {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for (row, line) in cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                *cell = self.cell(row, col);
            }
        }
        cells
    }

    pub fn squares(&self, player: Player) -> &BitBoard {
        match player {
            Player::Player1 => &self.player1_squares,
            Player::Player2 => &self.player2_squares,
        }
    }

    fn squares_mut(&mut self, player: Player) -> &mut BitBoard {
        match player {
            Player::Player1 => &mut self.player1_squares,
            Player::Player2 => &mut self.player2_squares,
        }
    }

    pub fn empty_squares(&self) -> BitBoard {
        !(self.player1_squares | self.player2_squares)
    }

    pub fn pieces_placed(&self, player: Player) -> u8 {
        self.pieces_placed[player.index()]
    }

    pub fn pieces_on_board(&self) -> usize {
        self.player1_squares.count_ones() + self.player2_squares.count_ones()
    }

    pub fn is_placement_phase(&self, player: Player) -> bool {
        self.pieces_placed(player) < NUM_PIECES
    }

    pub fn is_movement_phase(&self, player: Player) -> bool {
        !self.is_placement_phase(player)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(self.player1_squares.raw_u64(), self.player2_squares.raw_u64())
    }

    /// Every structurally legal move for `current_player`, row-major. During
    /// movement any own piece may go to any empty cell.
    pub fn legal_moves(&self) -> Vec<Move> {
        let empty_squares = self.empty_squares();

        if self.is_placement_phase(self.current_player) {
            empty_squares.iter_set_points()
                .map(|(row, col)| Move::Placement { row, col })
                .collect()
        } else {
            self.squares(self.current_player).iter_set_points().flat_map(|(from_row, from_col)| {
                empty_squares.iter_set_points().map(move |(to_row, to_col)| Move::Relocation {
                    from_row,
                    from_col,
                    to_row,
                    to_col,
                })
            }).collect()
        }
    }

    /// Applies a generated move and hands the turn over. Moves that did not
    /// come from `legal_moves` leave the result unspecified.
    pub fn make_move(&self, move_: Move) -> Self {
        let mut board = self.clone();
        let mover = self.current_player;
        let (to_row, to_col) = move_.target();
        debug_assert!(self.cell(to_row, to_col).is_none(), "illegal move {}", move_);

        match move_ {
            Move::Placement { row, col } => {
                board.squares_mut(mover).set_point(row, col, true);
                board.pieces_placed[mover.index()] += 1;
            },
            Move::Relocation { from_row, from_col, to_row, to_col } => {
                let my_squares = board.squares_mut(mover);
                my_squares.set_point(from_row, from_col, false);
                my_squares.set_point(to_row, to_col, true);
            },
        }

        board.current_player = mover.opponent();
        board
    }

    /// Same position with the two sides exchanged.
    pub fn swap_players(&self) -> Self {
        Self {
            player1_squares: self.player2_squares,
            player2_squares: self.player1_squares,
            pieces_placed: [self.pieces_placed[1], self.pieces_placed[0]],
            current_player: self.current_player.opponent(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let symbol = match self.cell(row, col) {
                    Some(Player::Player1) => 'X',
                    Some(Player::Player2) => 'O',
                    None => '.',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "to move: {}, placed: {}/{}", self.current_player, self.pieces_placed[0], self.pieces_placed[1])
    }
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        let grid: Vec<Vec<i8>> = self.cells().iter()
            .map(|line| line.iter().map(|cell| cell.map_or(0, Player::code)).collect())
            .collect();

        let mut s = serializer.serialize_struct("Board", 4)?;
        s.serialize_field("board", &grid)?;
        s.serialize_field("current_player", &self.current_player)?;
        s.serialize_field("p1_pieces", &self.pieces_placed[0])?;
        s.serialize_field("p2_pieces", &self.pieces_placed[1])?;
        s.end()
    }
}

const BOARD_FIELDS: &[&str] = &["board", "current_player", "p1_pieces", "p2_pieces"];

struct BoardVisitor;
impl<'de> Visitor<'de> for BoardVisitor {
    type Value = Board;
    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object for Board")
    }
    fn visit_map<V>(self, mut map: V) -> Result<Board, V::Error> where V: MapAccess<'de> {
        let mut grid: Option<Vec<Vec<i8>>> = None;
        let mut current_player = None;
        let mut p1_pieces = None;
        let mut p2_pieces = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "board" => grid = Some(map.next_value()?),
                "current_player" => current_player = Some(map.next_value()?),
                "p1_pieces" => p1_pieces = Some(map.next_value()?),
                "p2_pieces" => p2_pieces = Some(map.next_value()?),
                _ => { return Err(serde::de::Error::unknown_field(&key, BOARD_FIELDS)); }
            }
        }
        let grid = grid.ok_or_else(|| serde::de::Error::missing_field("board"))?;
        let current_player = current_player.ok_or_else(|| serde::de::Error::missing_field("current_player"))?;
        let p1_pieces = p1_pieces.ok_or_else(|| serde::de::Error::missing_field("p1_pieces"))?;
        let p2_pieces = p2_pieces.ok_or_else(|| serde::de::Error::missing_field("p2_pieces"))?;

        if grid.len() != BOARD_SIZE || grid.iter().any(|line| line.len() != BOARD_SIZE) {
            return Err(serde::de::Error::custom(format!("board must be {0}x{0}", BOARD_SIZE)));
        }
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for (row, line) in grid.iter().enumerate() {
            for (col, &code) in line.iter().enumerate() {
                cells[row][col] = match code {
                    0 => None,
                    _ => Some(Player::from_code(code).ok_or_else(|| serde::de::Error::custom(
                        format!("invalid cell value {} at ({}, {})", code, row, col)
                    ))?),
                };
            }
        }
        Ok(Board::from_cells(&cells, current_player, [p1_pieces, p2_pieces]))
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        deserializer.deserialize_map(BoardVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    fn empty_count(board: &Board) -> usize {
        board.empty_squares().count_ones()
    }

    #[test]
    fn placement_moves_cover_every_empty_cell() {
        let board = Board::new()
            .make_move(Move::Placement { row: 0, col: 0 })
            .make_move(Move::Placement { row: 3, col: 5 });
        let moves = board.legal_moves();
        assert_eq!(moves.len(), empty_count(&board));
        assert_eq!(moves.len(), B - 2);
        assert_eq!(moves[0], Move::Placement { row: 0, col: 1 });
        assert!(moves.iter().all(|m| matches!(m, Move::Placement { .. })));
    }

    #[test]
    fn movement_moves_are_own_pieces_times_empty_cells() {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for col in 0..BOARD_SIZE {
            cells[0][col] = Some(Player::Player1);
            cells[7][col] = Some(Player::Player2);
        }
        let board = Board::from_cells(&cells, Player::Player1, [NUM_PIECES, NUM_PIECES]);
        let moves = board.legal_moves();
        assert_eq!(moves.len(), 8 * empty_count(&board));
        assert_eq!(moves[0], Move::Relocation { from_row: 0, from_col: 0, to_row: 1, to_col: 0 });
        assert_eq!(moves[1], Move::Relocation { from_row: 0, from_col: 0, to_row: 1, to_col: 1 });
    }

    #[test]
    fn phases_are_tracked_per_player() {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        for col in 0..BOARD_SIZE {
            cells[2][col] = Some(Player::Player1);
        }
        cells[5][5] = Some(Player::Player2);
        let board = Board::from_cells(&cells, Player::Player2, [NUM_PIECES, 1]);
        assert!(board.is_movement_phase(Player::Player1));
        assert!(board.is_placement_phase(Player::Player2));
        assert!(matches!(board.legal_moves()[0], Move::Placement { .. }));
    }

    #[test]
    fn no_moves_when_board_is_full() {
        let mut cells = [[Some(Player::Player2); BOARD_SIZE]; BOARD_SIZE];
        cells[0][0] = Some(Player::Player1);
        let board = Board::from_cells(&cells, Player::Player1, [NUM_PIECES, NUM_PIECES]);
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn make_move_does_not_touch_the_original() {
        let board = Board::new().make_move(Move::Placement { row: 4, col: 4 });
        let before = board.clone();
        let after = board.make_move(Move::Placement { row: 1, col: 2 });
        assert_eq!(board, before);
        assert_eq!(after.cell(1, 2), Some(Player::Player2));
        assert_eq!(after.current_player, Player::Player1);
        assert_eq!(after.pieces_placed(Player::Player2), 1);
    }

    #[test]
    fn relocation_moves_the_piece_and_keeps_counts() {
        let mut cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        cells[3][3] = Some(Player::Player1);
        let board = Board::from_cells(&cells, Player::Player1, [NUM_PIECES, 0]);
        let after = board.make_move(Move::Relocation { from_row: 3, from_col: 3, to_row: 6, to_col: 1 });
        assert_eq!(after.cell(3, 3), None);
        assert_eq!(after.cell(6, 1), Some(Player::Player1));
        assert_eq!(after.pieces_placed(Player::Player1), NUM_PIECES);
        assert_eq!(after.current_player, Player::Player2);
    }

    #[test]
    fn counters_match_occupied_cells_over_random_games() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut board = Board::new();
            for _ in 0..40 {
                let moves = board.legal_moves();
                let Some(&move_) = moves.choose(&mut rng) else { break };
                board = board.make_move(move_);
                let placed = board.pieces_placed(Player::Player1) + board.pieces_placed(Player::Player2);
                assert_eq!(usize::from(placed), board.pieces_on_board());
            }
        }
    }

    #[test]
    fn fingerprint_ignores_turn_and_counters() {
        let board = Board::new().make_move(Move::Placement { row: 2, col: 2 });
        let mut other = Board::from_cells(&board.cells(), Player::Player1, [NUM_PIECES, 3]);
        assert_eq!(board.fingerprint(), other.fingerprint());
        other = other.swap_players();
        assert_ne!(board.fingerprint(), other.fingerprint());
    }

    #[test]
    fn json_snapshot_round_trips() {
        let board = Board::new()
            .make_move(Move::Placement { row: 0, col: 7 })
            .make_move(Move::Placement { row: 7, col: 0 });
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["board"][0][7], 1);
        assert_eq!(json["board"][7][0], -1);
        assert_eq!(json["current_player"], 1);
        let parsed: Board = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, board);
    }

    #[test]
    fn json_snapshot_rejects_bad_cells() {
        let mut grid = vec![vec![0i8; BOARD_SIZE]; BOARD_SIZE];
        grid[1][1] = 2;
        let json = serde_json::json!({ "board": grid, "current_player": 1, "p1_pieces": 0, "p2_pieces": 0 });
        assert!(serde_json::from_value::<Board>(json).is_err());

        let json = serde_json::json!({ "board": [[0, 0]], "current_player": 1, "p1_pieces": 0, "p2_pieces": 0 });
        assert!(serde_json::from_value::<Board>(json).is_err());
    }

    #[test]
    fn move_serializes_as_tagged_object() {
        let json = serde_json::to_value(Move::Placement { row: 1, col: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "placement", "row": 1, "col": 2 }));
    }
}
