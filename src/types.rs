use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

pub const BOARD_WIDTH: u8 = 8;

/// Side color. White moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::White => "White",
            Color::Black => "Black",
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Maps a promotion key to the chosen kind.
    /// `k` selects the knight; the king is never a promotion target.
    pub fn from_promotion_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::Knight),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            _ => None,
        }
    }

    pub fn can_promote_to(self) -> bool {
        matches!(
            self,
            PieceKind::Queen | PieceKind::Knight | PieceKind::Rook | PieceKind::Bishop
        )
    }

    pub(crate) fn code(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

/// A board coordinate: `col` and `row` both in `0..8`.
/// Row 0 is the top of the board as currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: u8,
    pub row: u8,
}

impl Cell {
    pub fn new(col: i32, row: i32) -> Option<Self> {
        if in_bounds(col, row) {
            Some(Self {
                col: col as u8,
                row: row as u8,
            })
        } else {
            None
        }
    }

    /// Parses `a1`..`h8` in the unflipped orientation (white at the bottom).
    pub fn from_algebraic(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Some(Self {
            col: file as u8 - b'a',
            row: BOARD_WIDTH - (rank as u8 - b'0'),
        })
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index < (BOARD_WIDTH as usize * BOARD_WIDTH as usize) {
            Some(Self {
                col: (index % BOARD_WIDTH as usize) as u8,
                row: (index / BOARD_WIDTH as usize) as u8,
            })
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.row as usize * BOARD_WIDTH as usize + self.col as usize
    }

    /// 180 degree relabeling: `(7 - col, 7 - row)`.
    pub fn flipped(self) -> Self {
        Self {
            col: BOARD_WIDTH - 1 - self.col,
            row: BOARD_WIDTH - 1 - self.row,
        }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Self::new(self.col as i32 + dx, self.row as i32 + dy)
    }

    /// Displacement `(dx, dy)` from `self` to `target`.
    pub fn delta_to(self, target: Cell) -> (i32, i32) {
        (
            target.col as i32 - self.col as i32,
            target.row as i32 - self.row as i32,
        )
    }

    /// All 64 cells in row-major order.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..(BOARD_WIDTH as usize * BOARD_WIDTH as usize)).filter_map(Cell::from_index)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

pub(crate) fn in_bounds(col: i32, row: i32) -> bool {
    (0..BOARD_WIDTH as i32).contains(&col) && (0..BOARD_WIDTH as i32).contains(&row)
}

/// A live piece. Its cell is the board key it is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub has_moved: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self {
            kind,
            color,
            has_moved: false,
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    Timeout { winner: Color },
}

impl Outcome {
    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } | Outcome::Timeout { winner } => Some(winner),
            Outcome::Stalemate | Outcome::InsufficientMaterial => None,
        }
    }

    /// Title shown under the board once the game is over.
    pub fn title(self) -> String {
        match self {
            Outcome::Checkmate { winner } | Outcome::Timeout { winner } => {
                format!("{} wins", winner.name())
            }
            Outcome::Stalemate => "Stalemate".to_string(),
            Outcome::InsufficientMaterial => "Draw".to_string(),
        }
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            Outcome::Checkmate {
                winner: Color::White,
            } => 1,
            Outcome::Checkmate {
                winner: Color::Black,
            } => 2,
            Outcome::Stalemate => 3,
            Outcome::InsufficientMaterial => 4,
            Outcome::Timeout {
                winner: Color::White,
            } => 5,
            Outcome::Timeout {
                winner: Color::Black,
            } => 6,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Outcome::Checkmate {
                winner: Color::White,
            }),
            2 => Some(Outcome::Checkmate {
                winner: Color::Black,
            }),
            3 => Some(Outcome::Stalemate),
            4 => Some(Outcome::InsufficientMaterial),
            5 => Some(Outcome::Timeout {
                winner: Color::White,
            }),
            6 => Some(Outcome::Timeout {
                winner: Color::Black,
            }),
            _ => None,
        }
    }
}

/// Input phase of the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingSelection,
    PieceSelected,
    PromotionPending,
    GameOver,
}

/// A piece as seen by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacedPiece {
    pub cell: Cell,
    pub kind: PieceKind,
    pub color: Color,
}

/// Public game state returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub pieces: Vec<PlacedPiece>,
    pub current_side: Color,
    pub phase: Phase,
    pub selected: Option<Cell>,
    pub flipped: bool,
    /// Kinds captured by white and by black, in capture order.
    pub captured: [Vec<PieceKind>; 2],
    pub outcome: Option<Outcome>,
    pub in_check: bool,
    pub clock: ClockView,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockView {
    pub remaining: [u32; 2],
    pub display: [String; 2],
    pub enforced: bool,
    pub timed_out: Option<Color>,
}
