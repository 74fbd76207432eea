//! Per-kind shape rules and the full `can_move_to` legality test.

use crate::board::{Board, is_line};
use crate::rules;
use crate::state::GameState;
use crate::types::{Cell, Piece, PieceKind};

/// Whether the piece on `from` may move to `to`.
///
/// `check_king_safety` rejects moves that leave the mover's own king attacked.
/// `allow_castling` enables the two-column king move. Attack tests pass
/// `false` for both so that they never recurse.
pub fn can_move_to(
    state: &GameState,
    from: Cell,
    to: Cell,
    check_king_safety: bool,
    allow_castling: bool,
) -> bool {
    let Some(piece) = state.board.get(from) else {
        return false;
    };
    if from == to {
        return false;
    }
    if state
        .board
        .get(to)
        .is_some_and(|target| target.color == piece.color)
    {
        return false;
    }
    if !reaches(state, &state.board, from, piece, to, allow_castling) {
        return false;
    }
    if check_king_safety && exposes_king(state, from, piece, to) {
        return false;
    }
    true
}

/// Shape rule plus path blocking, evaluated against `board`.
pub(crate) fn reaches(
    state: &GameState,
    board: &Board,
    from: Cell,
    piece: Piece,
    to: Cell,
    allow_castling: bool,
) -> bool {
    let (dx, dy) = from.delta_to(to);
    if !shape_allows(state, board, from, piece, to, allow_castling) {
        return false;
    }
    // Applies to every line-shaped move, including one-square king steps
    // and pawn advances, where a single step has nothing to block it.
    !is_line(dx, dy) || board.path_is_clear(from, dx, dy)
}

fn shape_allows(
    state: &GameState,
    board: &Board,
    from: Cell,
    piece: Piece,
    to: Cell,
    allow_castling: bool,
) -> bool {
    let (dx, dy) = from.delta_to(to);
    match piece.kind {
        PieceKind::Rook => (dx == 0) ^ (dy == 0),
        PieceKind::Bishop => dx.abs() == dy.abs(),
        PieceKind::Queen => is_line(dx, dy),
        PieceKind::Knight => matches!((dx.abs(), dy.abs()), (1, 2) | (2, 1)),
        PieceKind::King => {
            let step = dx.abs() <= 1 && dy.abs() <= 1;
            let castle = allow_castling
                && dx.abs() == 2
                && dy == 0
                && rules::can_castle(state, from, piece, dx);
            step || castle
        }
        PieceKind::Pawn => {
            let side = state.side(piece.color);
            let dir = side.move_direction as i32;
            let occupied = board.is_occupied(to) || state.en_passant == Some(to);
            if occupied {
                dx.abs() == 1 && dy == dir
            } else {
                dx == 0 && (dy == dir || (dy == 2 * dir && from.row == side.pawn_start_row()))
            }
        }
    }
}

/// Cell of the pawn taken by an en-passant capture from `from` to `to`.
pub(crate) fn en_passant_victim(
    board: &Board,
    state: &GameState,
    from: Cell,
    to: Cell,
) -> Option<Cell> {
    let piece = board.get(from)?;
    if piece.kind != PieceKind::Pawn
        || state.en_passant != Some(to)
        || board.is_occupied(to)
        || from.col == to.col
    {
        return None;
    }
    Some(Cell {
        col: to.col,
        row: from.row,
    })
}

/// Plays the move on a scratch copy of the board and looks for an attack on
/// the mover's king. The live board is never touched.
fn exposes_king(state: &GameState, from: Cell, piece: Piece, to: Cell) -> bool {
    let mut scratch = state.board;
    if let Some(victim) = en_passant_victim(&scratch, state, from, to) {
        scratch.remove(victim);
    }
    scratch.relocate(from, to);

    match state.side(piece.color).king_cell(&scratch) {
        Some(king) => rules::is_attacked(state, &scratch, king, piece.color),
        None => false,
    }
}
