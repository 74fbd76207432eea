use once_cell::sync::Lazy;

use crate::types::{BOARD_WIDTH, Cell, Color, Piece, PieceKind};

const NUM_SQUARES: usize = BOARD_WIDTH as usize * BOARD_WIDTH as usize;
const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

static STARTING_BOARD: Lazy<Board> = Lazy::new(|| {
    let mut board = Board::empty();
    for (col, kind) in BACK_RANK.iter().enumerate() {
        let col = col as u8;
        let pawn = PieceKind::Pawn;
        board.place(Cell { col, row: 0 }, Piece::new(*kind, Color::Black));
        board.place(Cell { col, row: 1 }, Piece::new(pawn, Color::Black));
        board.place(Cell { col, row: 6 }, Piece::new(pawn, Color::White));
        board.place(Cell { col, row: 7 }, Piece::new(*kind, Color::White));
    }
    board
});

/// Mapping from cell to at most one piece.
///
/// The cell a piece sits on is only ever stored as its key here, so moving a
/// piece is a single `relocate` and the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; NUM_SQUARES],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [None; NUM_SQUARES],
        }
    }

    /// Standard initial position, black on rows 0-1 and white on rows 6-7.
    pub fn starting() -> Self {
        *STARTING_BOARD
    }

    pub fn get(&self, cell: Cell) -> Option<Piece> {
        self.squares[cell.index()]
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.get(cell).is_some()
    }

    /// Puts a piece on an empty cell.
    pub fn place(&mut self, cell: Cell, piece: Piece) {
        debug_assert!(
            self.squares[cell.index()].is_none(),
            "two pieces claim cell {cell}"
        );
        self.squares[cell.index()] = Some(piece);
    }

    pub fn remove(&mut self, cell: Cell) -> Option<Piece> {
        self.squares[cell.index()].take()
    }

    /// Moves the piece on `from` to `to`, returning whatever stood on `to`.
    pub fn relocate(&mut self, from: Cell, to: Cell) -> Option<Piece> {
        let piece = self.squares[from.index()].take();
        debug_assert!(piece.is_some(), "relocating from empty cell {from}");
        let displaced = self.squares[to.index()].take();
        self.squares[to.index()] = piece;
        displaced
    }

    pub fn mark_moved(&mut self, cell: Cell) {
        if let Some(piece) = self.squares[cell.index()].as_mut() {
            piece.has_moved = true;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(index, square)| Some((Cell::from_index(index)?, (*square)?)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Cell, Piece)> + '_ {
        self.iter().filter(move |(_, piece)| piece.color == color)
    }

    pub fn king_cell(&self, color: Color) -> Option<Cell> {
        self.pieces_of(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(cell, _)| cell)
    }

    /// Every piece moved to `(7 - col, 7 - row)`.
    pub fn flipped(&self) -> Self {
        let mut out = Self::empty();
        for (cell, piece) in self.iter() {
            out.place(cell.flipped(), piece);
        }
        out
    }

    /// True when every cell strictly between `from` and `from + (dx, dy)` is
    /// empty. Length-one steps have no intermediate cells and always pass.
    pub fn path_is_clear(&self, from: Cell, dx: i32, dy: i32) -> bool {
        let length = if dx != 0 { dx.abs() } else { dy.abs() };
        let (step_x, step_y) = (dx.signum(), dy.signum());
        (1..length).all(|i| match from.offset(step_x * i, step_y * i) {
            Some(cell) => !self.is_occupied(cell),
            None => false,
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting()
    }
}

/// Straight line or diagonal displacement.
pub fn is_line(dx: i32, dy: i32) -> bool {
    dx.abs() == dy.abs() || ((dx == 0) ^ (dy == 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(name: &str) -> Cell {
        Cell::from_algebraic(name).unwrap()
    }

    #[test]
    fn starting_board_has_thirty_two_pieces_and_both_kings() {
        let board = Board::starting();

        assert_eq!(board.iter().count(), 32);
        assert_eq!(board.pieces_of(Color::White).count(), 16);
        assert_eq!(board.king_cell(Color::White), Some(cell("e1")));
        assert_eq!(board.king_cell(Color::Black), Some(cell("e8")));
        assert_eq!(
            board.get(cell("d1")).map(|p| p.kind),
            Some(PieceKind::Queen)
        );
    }

    #[test]
    fn relocate_returns_displaced_piece_and_keeps_single_entry() {
        let mut board = Board::starting();

        let displaced = board.relocate(cell("a2"), cell("a7"));

        assert_eq!(displaced, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert!(!board.is_occupied(cell("a2")));
        assert_eq!(board.get(cell("a7")).map(|p| p.color), Some(Color::White));
        assert_eq!(board.iter().count(), 31);
    }

    #[test]
    fn path_is_clear_checks_only_intermediate_cells() {
        let board = Board::starting();

        // Rook a1 -> a3 is blocked by the a2 pawn; the king step is vacuous.
        assert!(!board.path_is_clear(cell("a1"), 0, -2));
        assert!(board.path_is_clear(cell("e1"), 0, -1));
        // Pawn a2 -> a4 passes over empty a3.
        assert!(board.path_is_clear(cell("a2"), 0, -2));
        // Bishop c1 -> h6 diagonal is blocked by d2.
        assert!(!board.path_is_clear(cell("c1"), 5, -5));
    }

    #[test]
    fn is_line_accepts_straight_and_diagonal_only() {
        assert!(is_line(0, 3));
        assert!(is_line(-4, 0));
        assert!(is_line(2, -2));
        assert!(!is_line(1, 2));
        assert!(is_line(0, 0));
    }

    #[test]
    fn flipped_board_mirrors_cells() {
        let board = Board::starting();
        let flipped = board.flipped();

        assert_eq!(flipped.king_cell(Color::White), Some(cell("e1").flipped()));
        assert_eq!(flipped.flipped(), board);
    }
}
