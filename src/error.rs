use thiserror::Error;

use crate::types::{Cell, PieceKind};

/// Expected failures of game flow. None of these are fatal; callers
/// flash, ignore, or report them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("illegal move from {from} to {to}")]
    InvalidMove { from: Cell, to: Cell },

    #[error("no pawn is awaiting promotion")]
    NoPromotionPending,

    #[error("a pawn is awaiting promotion")]
    PromotionPending,

    #[error("cannot promote to {0:?}")]
    InvalidPromotion(PieceKind),

    #[error("position ({col}, {row}) is outside the board")]
    OutOfBounds { col: i32, row: i32 },

    #[error("no unmoved castling rook at {0}")]
    MissingCastlingRook(Cell),

    #[error("game is already over")]
    GameOver,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("history index {index} out of range (len {len})")]
    HistoryIndexOutOfRange { index: usize, len: usize },

    #[error("invalid save data: {0}")]
    InvalidSave(String),
}
