use crate::board::Board;
use crate::error::ChessError;
use crate::movement::{self, en_passant_victim};
use crate::rules;
use crate::side::Side;
use crate::types::{Cell, Color, Outcome, Piece, PieceKind};

/// A piece taken by a move and where its token goes in the captured row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub cell: Cell,
    pub piece: Piece,
    pub slot: usize,
}

/// Everything a completed `apply_move` changed, for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: Cell,
    pub to: Cell,
    pub piece: Piece,
    pub captured: Option<Capture>,
    /// Rook relocation `(from, to)` when the move castled.
    pub rook: Option<(Cell, Cell)>,
    pub promotion_pending: bool,
}

/// The full rule-relevant game state. All rule functions read it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub sides: [Side; 2],
    pub current: Color,
    pub en_passant: Option<Cell>,
    pub promotion_pending: Option<Cell>,
    pub outcome: Option<Outcome>,
}

impl GameState {
    pub fn new() -> Self {
        Self::from_board(Board::starting(), Color::White)
    }

    /// Arbitrary position in the unflipped orientation.
    pub fn from_board(board: Board, current: Color) -> Self {
        Self {
            board,
            sides: [Side::new(Color::White), Side::new(Color::Black)],
            current,
            en_passant: None,
            promotion_pending: None,
            outcome: None,
        }
    }

    pub fn side(&self, color: Color) -> &Side {
        &self.sides[color.index()]
    }

    pub fn side_mut(&mut self, color: Color) -> &mut Side {
        &mut self.sides[color.index()]
    }

    pub fn is_flipped(&self) -> bool {
        self.side(Color::White).is_flipped()
    }

    /// Full legality for the side to move, castling and king safety included.
    pub fn can_move_to(&self, from: Cell, to: Cell) -> bool {
        movement::can_move_to(self, from, to, true, true)
    }

    pub fn king_in_check(&self, color: Color) -> bool {
        self.side(color)
            .king_cell(&self.board)
            .is_some_and(|king| rules::in_check(self, king, color))
    }

    /// Executes a legal move of the side to move.
    ///
    /// A pawn reaching the far rank leaves `promotion_pending` set; the turn
    /// is then not advanced until `promote` is called.
    pub fn apply_move(&mut self, from: Cell, to: Cell) -> Result<MoveRecord, ChessError> {
        if self.promotion_pending.is_some() {
            return Err(ChessError::PromotionPending);
        }
        if self.outcome.is_some() {
            return Err(ChessError::GameOver);
        }
        let piece = match self.board.get(from) {
            Some(piece) if piece.color == self.current && self.can_move_to(from, to) => piece,
            _ => return Err(ChessError::InvalidMove { from, to }),
        };
        let (dx, dy) = from.delta_to(to);

        let victim_cell = en_passant_victim(&self.board, self, from, to).unwrap_or(to);
        let captured = match self.board.get(victim_cell) {
            Some(victim) if victim.color != piece.color => {
                self.board.remove(victim_cell);
                let slot = self.side_mut(piece.color).record_capture(victim.kind);
                Some(Capture {
                    cell: victim_cell,
                    piece: victim,
                    slot,
                })
            }
            _ => None,
        };

        let rook = if piece.kind == PieceKind::King && dx.abs() == 2 {
            let rook_from = rules::castling_rook(&self.board, from, piece.color, dx)?;
            let rook_to = Cell {
                col: (from.col + to.col) / 2,
                row: rook_from.row,
            };
            self.board.relocate(rook_from, rook_to);
            self.board.mark_moved(rook_to);
            Some((rook_from, rook_to))
        } else {
            None
        };

        self.board.relocate(from, to);
        self.board.mark_moved(to);

        if self.en_passant != Some(to) {
            self.en_passant = None;
        }

        let mut promotion_pending = false;
        if piece.kind == PieceKind::Pawn {
            if dy.abs() == 2 {
                self.en_passant = from.offset(0, dy / 2);
            }
            if to.row == self.side(piece.color).promotion_row() {
                self.promotion_pending = Some(to);
                promotion_pending = true;
            }
        }

        Ok(MoveRecord {
            from,
            to,
            piece,
            captured,
            rook,
            promotion_pending,
        })
    }

    /// Replaces the pending pawn with a piece of `kind`.
    pub fn promote(&mut self, kind: PieceKind) -> Result<Cell, ChessError> {
        let cell = self
            .promotion_pending
            .ok_or(ChessError::NoPromotionPending)?;
        if !kind.can_promote_to() {
            return Err(ChessError::InvalidPromotion(kind));
        }
        let pawn = self
            .board
            .remove(cell)
            .ok_or(ChessError::NoPromotionPending)?;
        let mut promoted = Piece::new(kind, pawn.color);
        promoted.has_moved = true;
        self.board.place(cell, promoted);
        self.promotion_pending = None;
        Ok(cell)
    }

    /// Hands the move to the other side and decides whether the game ended.
    pub fn advance_turn(&mut self) -> Option<Outcome> {
        self.current = !self.current;
        self.outcome = if rules::end_game_check(self) {
            if self.king_in_check(self.current) {
                Some(Outcome::Checkmate {
                    winner: !self.current,
                })
            } else {
                Some(Outcome::Stalemate)
            }
        } else if Color::ALL
            .iter()
            .all(|color| rules::insufficient_material(self, *color))
        {
            Some(Outcome::InsufficientMaterial)
        } else {
            None
        };
        self.outcome
    }

    /// Perspective swap: every cell goes to `(7 - col, 7 - row)` and both
    /// pawn directions change sign. Legality is unaffected.
    pub fn flip(&mut self) {
        self.board = self.board.flipped();
        self.en_passant = self.en_passant.map(Cell::flipped);
        self.promotion_pending = self.promotion_pending.map(Cell::flipped);
        for side in &mut self.sides {
            side.move_direction = -side.move_direction;
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
