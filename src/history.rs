use std::collections::{BTreeMap, BTreeSet};

use crate::board::Board;
use crate::error::ChessError;
use crate::state::GameState;
use crate::types::{Cell, Color, Outcome, Piece, PieceKind};

/// Immutable record of a reached position.
///
/// Cells are always stored in the unflipped orientation and kept ordered, so
/// the same position compares equal whichever way the board was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub positions: BTreeMap<(Color, PieceKind), BTreeSet<Cell>>,
    pub moved: BTreeSet<Cell>,
    /// Kinds captured by white and by black.
    pub captured: [Vec<PieceKind>; 2],
    pub current: Color,
    pub outcome: Option<Outcome>,
    pub promotion_pending: Option<Cell>,
    pub en_passant: Option<Cell>,
}

impl HistorySnapshot {
    pub fn capture(state: &GameState) -> Self {
        let flipped = state.is_flipped();
        let normalize = |cell: Cell| if flipped { cell.flipped() } else { cell };

        let mut positions: BTreeMap<(Color, PieceKind), BTreeSet<Cell>> = BTreeMap::new();
        let mut moved = BTreeSet::new();
        for (cell, piece) in state.board.iter() {
            let cell = normalize(cell);
            positions
                .entry((piece.color, piece.kind))
                .or_default()
                .insert(cell);
            if piece.has_moved {
                moved.insert(cell);
            }
        }

        Self {
            positions,
            moved,
            captured: [
                state.side(Color::White).captured.clone(),
                state.side(Color::Black).captured.clone(),
            ],
            current: state.current,
            outcome: state.outcome,
            promotion_pending: state.promotion_pending.map(normalize),
            en_passant: state.en_passant.map(normalize),
        }
    }

    /// Rebuilds `state` from this snapshot, keeping its current orientation.
    pub fn restore_into(&self, state: &mut GameState) {
        let flipped = state.is_flipped();
        let orient = |cell: Cell| if flipped { cell.flipped() } else { cell };

        let mut board = Board::empty();
        for ((color, kind), cells) in &self.positions {
            for cell in cells {
                let mut piece = Piece::new(*kind, *color);
                piece.has_moved = self.moved.contains(cell);
                board.place(orient(*cell), piece);
            }
        }

        state.board = board;
        for color in Color::ALL {
            state.side_mut(color).captured = self.captured[color.index()].clone();
        }
        state.current = self.current;
        state.outcome = self.outcome;
        state.promotion_pending = self.promotion_pending.map(orient);
        state.en_passant = self.en_passant.map(orient);
    }
}

impl GameState {
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::capture(self)
    }

    pub fn restore(&mut self, snapshot: &HistorySnapshot) {
        snapshot.restore_into(self);
    }
}

/// Newest-first list of snapshots with a cursor; index 0 is the latest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistorySnapshot>,
    cursor: usize,
}

impl History {
    pub fn new(initial: HistorySnapshot) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub(crate) fn from_parts(
        entries: Vec<HistorySnapshot>,
        cursor: usize,
    ) -> Result<Self, ChessError> {
        if cursor >= entries.len() {
            return Err(ChessError::HistoryIndexOutOfRange {
                index: cursor,
                len: entries.len(),
            });
        }
        Ok(Self { entries, cursor })
    }

    /// Pushes a new latest state. Entries newer than the cursor are dropped
    /// first, so moving from an undone position starts a new branch.
    pub fn record(&mut self, snapshot: HistorySnapshot) {
        self.entries.drain(..self.cursor);
        self.entries.insert(0, snapshot);
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistorySnapshot] {
        &self.entries
    }

    pub fn current(&self) -> &HistorySnapshot {
        &self.entries[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor > 0
    }

    /// Moves the cursor without recording anything.
    pub fn seek(&mut self, index: usize) -> Result<&HistorySnapshot, ChessError> {
        if index >= self.entries.len() {
            return Err(ChessError::HistoryIndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.cursor = index;
        Ok(&self.entries[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(name: &str) -> Cell {
        Cell::from_algebraic(name).unwrap()
    }

    fn play(state: &mut GameState, history: &mut History, from: &str, to: &str) {
        state.apply_move(cell(from), cell(to)).unwrap();
        state.advance_turn();
        history.record(state.snapshot());
    }

    #[test]
    fn restore_right_after_record_is_identity() {
        let mut state = GameState::new();
        let mut history = History::new(state.snapshot());
        play(&mut state, &mut history, "e2", "e4");
        let before = state.clone();

        let snapshot = history.seek(history.cursor()).unwrap().clone();
        state.restore(&snapshot);
        state.restore(&snapshot);

        assert_eq!(state, before);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn undo_then_redo_returns_exact_state_with_captures() {
        let mut state = GameState::new();
        let mut history = History::new(state.snapshot());
        play(&mut state, &mut history, "e2", "e4");
        play(&mut state, &mut history, "d7", "d5");
        play(&mut state, &mut history, "e4", "d5");
        let latest = state.clone();
        assert_eq!(state.side(Color::White).captured, vec![PieceKind::Pawn]);

        let older = history.seek(1).unwrap().clone();
        state.restore(&older);
        assert!(state.side(Color::White).captured.is_empty());
        assert_eq!(state.current, Color::White);
        assert!(history.can_redo());

        let newer = history.seek(0).unwrap().clone();
        state.restore(&newer);
        assert_eq!(state, latest);
    }

    #[test]
    fn recording_from_undone_position_truncates_redo_branch() {
        let mut state = GameState::new();
        let mut history = History::new(state.snapshot());
        play(&mut state, &mut history, "e2", "e4");
        play(&mut state, &mut history, "e7", "e5");

        let snapshot = history.seek(1).unwrap().clone();
        state.restore(&snapshot);
        play(&mut state, &mut history, "c7", "c5");

        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 0);
        assert!(!history.can_redo());
        assert!(state.board.is_occupied(cell("c5")));
        assert!(!state.board.is_occupied(cell("e5")));
    }

    #[test]
    fn snapshots_are_orientation_independent() {
        let mut state = GameState::new();
        let mut history = History::new(state.snapshot());
        play(&mut state, &mut history, "e2", "e4");
        let unflipped = history.current().clone();

        state.flip();
        assert_eq!(state.snapshot(), unflipped);

        let initial = history.seek(1).unwrap().clone();
        state.restore(&initial);
        assert!(state.is_flipped());
        assert_eq!(
            state.board.king_cell(Color::White),
            Some(cell("e1").flipped())
        );
        assert!(!state.board.get(cell("e2").flipped()).unwrap().has_moved);
    }

    #[test]
    fn seek_rejects_out_of_range_index() {
        let mut history = History::new(GameState::new().snapshot());

        assert_eq!(
            history.seek(1).unwrap_err(),
            ChessError::HistoryIndexOutOfRange { index: 1, len: 1 }
        );
        assert!(!history.can_undo());
    }
}
