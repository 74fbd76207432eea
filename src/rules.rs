//! Check, castling and end-of-game predicates built on the shape rules.

use tracing::trace;

use crate::board::Board;
use crate::error::ChessError;
use crate::movement::{can_move_to, reaches};
use crate::state::GameState;
use crate::types::{Cell, Color, Piece, PieceKind};

const INSUFFICIENT_MATERIAL: [&[PieceKind]; 3] = [
    &[PieceKind::King],
    &[PieceKind::King, PieceKind::Knight],
    &[PieceKind::King, PieceKind::Bishop],
];

/// True iff a piece of the side opposing `color` attacks `cell`.
pub fn in_check(state: &GameState, cell: Cell, color: Color) -> bool {
    is_attacked(state, &state.board, cell, color)
}

/// `in_check` evaluated against an arbitrary board, typically a scratch copy.
pub(crate) fn is_attacked(state: &GameState, board: &Board, cell: Cell, color: Color) -> bool {
    state
        .side(!color)
        .pieces(board)
        .any(|(from, piece)| attacks(state, board, from, piece, cell))
}

fn attacks(state: &GameState, board: &Board, from: Cell, piece: Piece, target: Cell) -> bool {
    if from == target {
        return false;
    }
    if piece.kind == PieceKind::Pawn {
        // Pawns only ever threaten their two forward diagonals.
        let (dx, dy) = from.delta_to(target);
        return dx.abs() == 1 && dy == state.side(piece.color).move_direction as i32;
    }
    reaches(state, board, from, piece, target, false)
}

/// Unmoved rook on the back-rank corner the king is castling toward.
pub fn castling_rook(board: &Board, king: Cell, color: Color, dx: i32) -> Result<Cell, ChessError> {
    let corner = Cell {
        col: if dx > 0 { 7 } else { 0 },
        row: king.row,
    };
    match board.get(corner) {
        Some(rook) if rook.kind == PieceKind::Rook && rook.color == color && !rook.has_moved => {
            Ok(corner)
        }
        _ => Err(ChessError::MissingCastlingRook(corner)),
    }
}

/// Castling legality for a king on `from` moving `dx` (= +-2) columns.
pub fn can_castle(state: &GameState, from: Cell, king: Piece, dx: i32) -> bool {
    if king.has_moved {
        return false;
    }
    let rook = match castling_rook(&state.board, from, king.color, dx) {
        Ok(rook) => rook,
        Err(err) => {
            trace!(%err, "castling rejected");
            return false;
        }
    };

    let step = dx.signum();
    let crosses_attack = (1..=dx.abs()).any(|i| {
        from.offset(step * i, 0)
            .is_none_or(|cell| in_check(state, cell, king.color))
    });
    if crosses_attack {
        return false;
    }

    let (rook_dx, _) = from.delta_to(rook);
    state.board.path_is_clear(from, rook_dx, 0) && !in_check(state, from, king.color)
}

/// Whether any piece of `color` has at least one fully legal move.
pub fn has_any_legal_move(state: &GameState, color: Color) -> bool {
    state
        .side(color)
        .pieces(&state.board)
        .any(|(from, _)| Cell::all().any(|to| can_move_to(state, from, to, true, true)))
}

/// True iff the side to move has no legal move anywhere. The caller tells
/// checkmate from stalemate by looking at whether its king is in check.
pub fn end_game_check(state: &GameState) -> bool {
    !has_any_legal_move(state, state.current)
}

/// True iff the opponent of `color` cannot deliver mate: its remaining kinds
/// fit inside {King}, {King, Knight} or {King, Bishop}.
pub fn insufficient_material(state: &GameState, color: Color) -> bool {
    let kinds: Vec<PieceKind> = state
        .side(!color)
        .pieces(&state.board)
        .map(|(_, piece)| piece.kind)
        .collect();
    INSUFFICIENT_MATERIAL
        .iter()
        .any(|allowed| kinds.iter().all(|kind| allowed.contains(kind)))
}

/// All cells the piece on `from` may legally move to.
pub fn legal_targets(state: &GameState, from: Cell) -> Vec<Cell> {
    Cell::all()
        .filter(|to| can_move_to(state, from, *to, true, true))
        .collect()
}
