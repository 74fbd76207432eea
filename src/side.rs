use crate::board::Board;
use crate::types::{Cell, Color, Piece, PieceKind};

/// One player's view of the game.
///
/// `move_direction` is the row delta a pawn of this side advances by in the
/// current orientation: -1 for white when unflipped. The live pieces are not
/// stored here; they are read from the board by color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Side {
    pub color: Color,
    pub move_direction: i8,
    /// Kinds this side has captured, in capture order.
    pub captured: Vec<PieceKind>,
}

impl Side {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            move_direction: Self::home_direction(color),
            captured: Vec::new(),
        }
    }

    /// Pawn direction in the unflipped orientation.
    pub fn home_direction(color: Color) -> i8 {
        match color {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.move_direction != Self::home_direction(self.color)
    }

    /// Row a pawn of this side may double-step from.
    pub fn pawn_start_row(&self) -> u8 {
        if self.move_direction < 0 { 6 } else { 1 }
    }

    /// Row on which a pawn of this side promotes.
    pub fn promotion_row(&self) -> u8 {
        if self.move_direction < 0 { 0 } else { 7 }
    }

    /// Live pieces of this side on `board`.
    pub fn pieces<'a>(&self, board: &'a Board) -> impl Iterator<Item = (Cell, Piece)> + use<'a> {
        board.pieces_of(self.color)
    }

    /// Square of this side's king, absent only on hand-built positions.
    pub fn king_cell(&self, board: &Board) -> Option<Cell> {
        board.king_cell(self.color)
    }

    pub fn record_capture(&mut self, kind: PieceKind) -> usize {
        self.captured.push(kind);
        self.captured.len() - 1
    }
}
