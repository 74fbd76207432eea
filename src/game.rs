use tracing::{debug, info, warn};
use web_time::Instant;

use crate::clock::{Clock, ClockEvent};
use crate::config::GameConfig;
use crate::error::ChessError;
use crate::history::History;
use crate::persist;
use crate::render::{Renderer, TextStyle, side_rgb};
use crate::rules;
use crate::state::{GameState, MoveRecord};
use crate::types::{Cell, ClockView, Color, GameView, Outcome, Phase, PieceKind, PlacedPiece};

const PROMOTION_HINT: &str = "Type Q, K, R, or B to promote your pawn (Queen, Knight, Rook, Bishop)";
const TIMEOUT_HINT: &str = "Disable the clock if you wish to continue";
const FLIP_KEY: char = ' ';

/// Result of a board click that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    Selected(Cell),
    Moved {
        from: Cell,
        to: Cell,
        outcome: Option<Outcome>,
    },
    AwaitingPromotion(Cell),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Flipped,
    Promoted {
        kind: PieceKind,
        outcome: Option<Outcome>,
    },
}

/// One same-screen session: rule state, history, clock and selection, drawn
/// through `R`.
pub struct GameInstance<R: Renderer> {
    state: GameState,
    history: History,
    clock: Clock,
    selected: Option<Cell>,
    config: GameConfig,
    renderer: R,
}

impl<R: Renderer> GameInstance<R> {
    pub fn new(config: GameConfig, renderer: R, now: Instant) -> Self {
        let state = GameState::new();
        let history = History::new(state.snapshot());
        let mut game = Self {
            state,
            history,
            clock: Clock::new(config.clock_seconds, config.clock_enforced, now),
            selected: None,
            config,
            renderer,
        };
        game.redraw();
        game
    }

    /// Back to the initial position with an empty history and a full clock.
    pub fn restart(&mut self, now: Instant) {
        self.state = GameState::new();
        self.history = History::new(self.state.snapshot());
        self.clock.reset(now);
        self.selected = None;
        info!("game restarted");
        self.redraw();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn selected(&self) -> Option<Cell> {
        self.selected
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Rule-based result, or an enforced clock timeout.
    pub fn outcome(&self) -> Option<Outcome> {
        self.state.outcome.or_else(|| self.timeout_outcome())
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn phase(&self) -> Phase {
        if self.is_game_over() {
            Phase::GameOver
        } else if self.state.promotion_pending.is_some() {
            Phase::PromotionPending
        } else if self.selected.is_some() {
            Phase::PieceSelected
        } else {
            Phase::AwaitingSelection
        }
    }

    pub fn can_undo(&self) -> bool {
        self.state.promotion_pending.is_some() || self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn legal_targets(&self, cell: Cell) -> Vec<Cell> {
        if self.is_game_over() || self.state.promotion_pending.is_some() {
            return Vec::new();
        }
        match self.state.board.get(cell) {
            Some(piece) if piece.color == self.state.current => {
                rules::legal_targets(&self.state, cell)
            }
            _ => Vec::new(),
        }
    }

    /// Primary-button click on a board cell.
    ///
    /// Clicking an own piece (re)selects it. With a selection, a legal target
    /// plays the move; an illegal one flashes and keeps the selection.
    pub fn click(&mut self, cell: Cell) -> Result<ClickOutcome, ChessError> {
        if self.is_game_over() {
            debug!(%cell, "click ignored: game over");
            return Err(ChessError::GameOver);
        }
        if self.state.promotion_pending.is_some() {
            debug!(%cell, "click ignored: promotion pending");
            return Err(ChessError::PromotionPending);
        }

        if self
            .state
            .board
            .get(cell)
            .is_some_and(|piece| piece.color == self.state.current)
        {
            self.selected = Some(cell);
            self.renderer.select(Some(cell));
            debug!(%cell, "piece selected");
            return Ok(ClickOutcome::Selected(cell));
        }

        let Some(from) = self.selected else {
            return Ok(ClickOutcome::Ignored);
        };

        if !self.state.can_move_to(from, cell) {
            self.renderer.flash_invalid(cell);
            debug!(%from, to = %cell, "illegal move");
            return Err(ChessError::InvalidMove { from, to: cell });
        }

        let record = self.state.apply_move(from, cell)?;
        self.selected = None;
        self.renderer.select(None);
        self.render_move(&record);
        info!(
            from = %record.from,
            to = %record.to,
            kind = ?record.piece.kind,
            color = ?record.piece.color,
            "move played"
        );

        if record.promotion_pending {
            self.refresh_status();
            return Ok(ClickOutcome::AwaitingPromotion(cell));
        }

        let outcome = self.finish_turn();
        Ok(ClickOutcome::Moved {
            from,
            to: cell,
            outcome,
        })
    }

    /// Click in window pixels.
    pub fn click_pixel(&mut self, x: f32, y: f32) -> Result<ClickOutcome, ChessError> {
        let cell = self.config.layout.pixel_to_cell(x, y).ok_or_else(|| {
            let (col, row) = self.config.layout.pixel_to_grid(x, y);
            ChessError::OutOfBounds { col, row }
        })?;
        self.click(cell)
    }

    /// Space flips the board at any time; Q, K, R, B choose a promotion.
    pub fn key(&mut self, key: char) -> Result<KeyOutcome, ChessError> {
        if key == FLIP_KEY {
            self.flip();
            return Ok(KeyOutcome::Flipped);
        }
        if self.is_game_over() {
            return Err(ChessError::GameOver);
        }
        match PieceKind::from_promotion_key(key) {
            Some(kind) => {
                let outcome = self.promote(kind)?;
                Ok(KeyOutcome::Promoted { kind, outcome })
            }
            None => Ok(KeyOutcome::Ignored),
        }
    }

    pub fn promote(&mut self, kind: PieceKind) -> Result<Option<Outcome>, ChessError> {
        if self.is_game_over() {
            return Err(ChessError::GameOver);
        }
        let cell = self.state.promote(kind)?;
        let color = self.state.current;
        self.renderer.remove_token(cell);
        self.renderer.place_token(kind, color, cell);
        info!(%cell, ?kind, "pawn promoted");
        Ok(self.finish_turn())
    }

    pub fn flip(&mut self) {
        self.state.flip();
        self.selected = self.selected.map(Cell::flipped);
        debug!(flipped = self.state.is_flipped(), "board flipped");
        self.redraw();
    }

    /// Steps one snapshot back. With a promotion pending this instead drops
    /// the unfinished pawn move.
    pub fn undo(&mut self) -> Result<(), ChessError> {
        if self.state.promotion_pending.is_some() {
            return self.goto(self.history.cursor());
        }
        if !self.history.can_undo() {
            return Err(ChessError::NothingToUndo);
        }
        self.goto(self.history.cursor() + 1)
    }

    pub fn redo(&mut self) -> Result<(), ChessError> {
        if !self.history.can_redo() {
            return Err(ChessError::NothingToRedo);
        }
        self.goto(self.history.cursor() - 1)
    }

    /// Replaces the live state with `history[index]`.
    pub fn goto(&mut self, index: usize) -> Result<(), ChessError> {
        let snapshot = self.history.seek(index)?;
        snapshot.restore_into(&mut self.state);
        self.selected = None;
        debug!(index, "history restored");
        self.redraw();
        Ok(())
    }

    pub fn toggle_clock(&mut self) {
        let enforced = !self.clock.is_enforced();
        self.clock.set_enforced(enforced);
        info!(enforced, "clock enforcement toggled");
        self.refresh_status();
    }

    /// Per-frame poll. Charges elapsed seconds to the side to move.
    pub fn tick(&mut self, now: Instant) {
        if self.is_game_over() {
            self.clock.hold(now);
            return;
        }
        if let Some(ClockEvent::TimedOut(color)) = self.clock.tick(self.state.current, now) {
            if self.clock.is_enforced() {
                info!(?color, outcome = ?self.outcome(), "clock ran out");
                self.selected = None;
                self.renderer.select(None);
            } else {
                debug!(?color, "clock ran out while not enforced");
            }
            self.refresh_status();
        }
    }

    pub fn save(&self) -> Vec<u8> {
        persist::encode(&self.history)
    }

    pub fn load(&mut self, data: &[u8]) -> Result<(), ChessError> {
        let history = persist::decode(data).inspect_err(|err| {
            warn!(%err, "rejected save data");
        })?;
        let cursor = history.cursor();
        self.history = history;
        self.goto(cursor)
    }

    pub fn view(&self) -> GameView {
        GameView {
            pieces: self
                .state
                .board
                .iter()
                .map(|(cell, piece)| PlacedPiece {
                    cell,
                    kind: piece.kind,
                    color: piece.color,
                })
                .collect(),
            current_side: self.state.current,
            phase: self.phase(),
            selected: self.selected,
            flipped: self.state.is_flipped(),
            captured: [
                self.state.side(Color::White).captured.clone(),
                self.state.side(Color::Black).captured.clone(),
            ],
            outcome: self.outcome(),
            in_check: self.state.king_in_check(self.state.current),
            clock: ClockView {
                remaining: [
                    self.clock.remaining(Color::White),
                    self.clock.remaining(Color::Black),
                ],
                display: [
                    self.clock.display(Color::White),
                    self.clock.display(Color::Black),
                ],
                enforced: self.clock.is_enforced(),
                timed_out: self.clock.timed_out(),
            },
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    fn timeout_outcome(&self) -> Option<Outcome> {
        let loser = self.clock.timed_out()?;
        if !self.clock.is_enforced() {
            return None;
        }
        if rules::insufficient_material(&self.state, loser) {
            Some(Outcome::InsufficientMaterial)
        } else {
            Some(Outcome::Timeout { winner: !loser })
        }
    }

    fn finish_turn(&mut self) -> Option<Outcome> {
        let outcome = self.state.advance_turn();
        self.history.record(self.state.snapshot());
        if let Some(outcome) = outcome {
            info!(?outcome, "game over");
        }
        self.renderer.set_background(side_rgb(self.state.current));
        self.refresh_status();
        outcome
    }

    fn render_move(&mut self, record: &MoveRecord) {
        if let Some(capture) = record.captured {
            self.renderer.remove_token(capture.cell);
            self.renderer
                .show_captured(capture.piece.kind, capture.piece.color, capture.slot);
        }
        if let Some((rook_from, rook_to)) = record.rook {
            self.renderer.move_token(rook_from, rook_to);
        }
        self.renderer.move_token(record.from, record.to);
    }

    fn redraw(&mut self) {
        self.renderer.clear_board();
        for (cell, piece) in self.state.board.iter() {
            self.renderer.place_token(piece.kind, piece.color, cell);
        }
        self.renderer.clear_captured();
        for side in &self.state.sides {
            for (slot, kind) in side.captured.iter().enumerate() {
                self.renderer.show_captured(*kind, !side.color, slot);
            }
        }
        self.renderer.select(self.selected);
        self.renderer.set_background(side_rgb(self.state.current));
        self.refresh_status();
    }

    /// Bottom text: result, promotion prompt, or the captured-piece rows.
    fn refresh_status(&mut self) {
        self.renderer.clear_text();
        if let Some(outcome) = self.outcome() {
            self.renderer.render_text(&outcome.title(), TextStyle::Title);
            if self.state.outcome.is_none() {
                self.renderer.render_text(TIMEOUT_HINT, TextStyle::Subtitle);
            }
            self.renderer.set_captured_visible(false);
        } else if self.state.promotion_pending.is_some() {
            self.renderer.render_text(PROMOTION_HINT, TextStyle::Hint);
            self.renderer.set_captured_visible(false);
        } else {
            self.renderer.set_captured_visible(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;
    use crate::board::Board;
    use crate::render::{CommandBuffer, RenderCommand};
    use crate::types::Piece;

    fn cell(name: &str) -> Cell {
        Cell::from_algebraic(name).unwrap()
    }

    fn new_game() -> (GameInstance<CommandBuffer>, Instant) {
        let now = Instant::now();
        let config = GameConfig::default();
        (
            GameInstance::new(config, CommandBuffer::new(config.layout), now),
            now,
        )
    }

    fn play(game: &mut GameInstance<CommandBuffer>, from: &str, to: &str) -> ClickOutcome {
        game.click(cell(from)).unwrap();
        game.click(cell(to)).unwrap()
    }

    fn set_position(
        game: &mut GameInstance<CommandBuffer>,
        pieces: &[(&str, PieceKind, Color)],
        current: Color,
    ) {
        let mut board = Board::empty();
        for (name, kind, color) in pieces {
            board.place(cell(name), Piece::new(*kind, *color));
        }
        game.state = GameState::from_board(board, current);
        game.history = History::new(game.state.snapshot());
    }

    #[test]
    fn initial_state_is_correct() {
        let (game, _) = new_game();
        let view = game.view();

        assert_eq!(view.pieces.len(), 32);
        assert_eq!(view.current_side, Color::White);
        assert_eq!(view.phase, Phase::AwaitingSelection);
        assert_eq!(
            view.clock.display,
            ["30:00".to_string(), "30:00".to_string()]
        );
        assert!(!view.can_undo);
        assert!(!view.can_redo);
        assert!(view.outcome.is_none());
    }

    #[test]
    fn select_then_move_advances_turn_and_records_history() {
        let (mut game, _) = new_game();

        assert_eq!(
            game.click(cell("e2")),
            Ok(ClickOutcome::Selected(cell("e2")))
        );
        assert_eq!(game.phase(), Phase::PieceSelected);
        assert_eq!(
            game.click(cell("e4")),
            Ok(ClickOutcome::Moved {
                from: cell("e2"),
                to: cell("e4"),
                outcome: None
            })
        );

        assert_eq!(game.state().current, Color::Black);
        assert_eq!(game.selected(), None);
        assert_eq!(game.history().len(), 2);
        assert!(game.can_undo());
    }

    #[test]
    fn illegal_target_flashes_and_keeps_selection() {
        let (mut game, _) = new_game();
        game.click(cell("e2")).unwrap();
        game.renderer_mut().drain();

        assert_eq!(
            game.click(cell("e5")),
            Err(ChessError::InvalidMove {
                from: cell("e2"),
                to: cell("e5")
            })
        );
        assert_eq!(game.selected(), Some(cell("e2")));
        assert!(matches!(
            game.renderer().commands(),
            [RenderCommand::FlashInvalid { .. }]
        ));
    }

    #[test]
    fn clicking_elsewhere_without_selection_is_ignored() {
        let (mut game, _) = new_game();

        assert_eq!(game.click(cell("e4")), Ok(ClickOutcome::Ignored));
        assert_eq!(game.click(cell("e7")), Ok(ClickOutcome::Ignored));
        assert_eq!(
            game.click_pixel(10.0, 10.0),
            Err(ChessError::OutOfBounds { col: -1, row: -1 })
        );
    }

    #[test]
    fn reselecting_own_piece_moves_selection() {
        let (mut game, _) = new_game();
        game.click(cell("e2")).unwrap();

        assert_eq!(
            game.click(cell("g1")),
            Ok(ClickOutcome::Selected(cell("g1")))
        );
        assert_eq!(game.selected(), Some(cell("g1")));
    }

    #[test]
    fn undo_redo_and_branch_truncation() {
        let (mut game, _) = new_game();
        play(&mut game, "e2", "e4");
        play(&mut game, "e7", "e5");
        let after_two = game.state().clone();

        game.undo().unwrap();
        assert_eq!(game.state().current, Color::Black);
        assert!(!game.state().board.is_occupied(cell("e5")));
        game.redo().unwrap();
        assert_eq!(game.state(), &after_two);

        game.undo().unwrap();
        play(&mut game, "c7", "c5");
        assert!(!game.can_redo());
        assert_eq!(game.redo(), Err(ChessError::NothingToRedo));
        assert_eq!(game.history().len(), 3);

        game.undo().unwrap();
        game.undo().unwrap();
        assert_eq!(game.undo(), Err(ChessError::NothingToUndo));
    }

    #[test]
    fn promotion_blocks_input_until_kind_key() {
        let (mut game, _) = new_game();
        set_position(
            &mut game,
            &[
                ("a1", PieceKind::King, Color::White),
                ("h8", PieceKind::King, Color::Black),
                ("c7", PieceKind::Pawn, Color::White),
                ("h5", PieceKind::Pawn, Color::Black),
            ],
            Color::White,
        );

        assert_eq!(
            play(&mut game, "c7", "c8"),
            ClickOutcome::AwaitingPromotion(cell("c8"))
        );
        assert_eq!(game.phase(), Phase::PromotionPending);
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.click(cell("a1")), Err(ChessError::PromotionPending));
        assert_eq!(game.key('x'), Ok(KeyOutcome::Ignored));
        assert_eq!(game.key(' '), Ok(KeyOutcome::Flipped));

        assert_eq!(
            game.key('r'),
            Ok(KeyOutcome::Promoted {
                kind: PieceKind::Rook,
                outcome: None
            })
        );
        assert_eq!(game.history().len(), 2);
        assert_eq!(game.state().current, Color::Black);
        let promoted = game.state().board.get(cell("c8").flipped()).unwrap();
        assert_eq!(promoted.kind, PieceKind::Rook);
        assert_eq!(game.key('q'), Err(ChessError::NoPromotionPending));
    }

    #[test]
    fn undo_during_promotion_drops_the_pawn_move() {
        let (mut game, _) = new_game();
        set_position(
            &mut game,
            &[
                ("a1", PieceKind::King, Color::White),
                ("h8", PieceKind::King, Color::Black),
                ("c7", PieceKind::Pawn, Color::White),
            ],
            Color::White,
        );
        play(&mut game, "c7", "c8");

        game.undo().unwrap();

        assert_eq!(game.phase(), Phase::AwaitingSelection);
        assert!(game.state().board.is_occupied(cell("c7")));
        assert!(!game.state().board.is_occupied(cell("c8")));
    }

    #[test]
    fn checkmate_freezes_board_but_allows_undo() {
        let (mut game, _) = new_game();
        play(&mut game, "f2", "f3");
        play(&mut game, "e7", "e5");
        play(&mut game, "g2", "g4");
        let outcome = play(&mut game, "d8", "h4");

        assert_eq!(
            outcome,
            ClickOutcome::Moved {
                from: cell("d8"),
                to: cell("h4"),
                outcome: Some(Outcome::Checkmate {
                    winner: Color::Black
                })
            }
        );
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.click(cell("a2")), Err(ChessError::GameOver));
        assert!(game.renderer().commands().contains(&RenderCommand::Text {
            text: "Black wins".to_string(),
            style: TextStyle::Title,
        }));

        game.undo().unwrap();
        assert!(!game.is_game_over());
    }

    #[test]
    fn enforced_timeout_ends_game_and_toggle_reverses_it() {
        let now = Instant::now();
        let config = GameConfig {
            clock_seconds: 3,
            ..GameConfig::default()
        };
        let mut game = GameInstance::new(config, CommandBuffer::new(config.layout), now);

        game.tick(now + Duration::from_secs(3));
        assert_eq!(
            game.outcome(),
            Some(Outcome::Timeout {
                winner: Color::Black
            })
        );
        assert_eq!(game.click(cell("e2")), Err(ChessError::GameOver));

        game.toggle_clock();
        assert!(!game.is_game_over());
        assert!(game.clock().has_latent_timeout());
        assert!(game.click(cell("e2")).is_ok());

        game.toggle_clock();
        assert!(game.is_game_over());
    }

    #[test]
    fn timeout_against_bare_material_is_a_draw() {
        let (mut game, now) = new_game();
        set_position(
            &mut game,
            &[
                ("e1", PieceKind::King, Color::White),
                ("e8", PieceKind::King, Color::Black),
                ("c8", PieceKind::Bishop, Color::Black),
                ("a2", PieceKind::Pawn, Color::White),
            ],
            Color::White,
        );

        game.tick(now + Duration::from_secs(1800));

        assert_eq!(game.clock().timed_out(), Some(Color::White));
        assert_eq!(game.outcome(), Some(Outcome::InsufficientMaterial));
    }

    #[test]
    fn clock_does_not_run_after_game_over() {
        let (mut game, now) = new_game();
        play(&mut game, "f2", "f3");
        play(&mut game, "e7", "e5");
        play(&mut game, "g2", "g4");
        play(&mut game, "d8", "h4");

        game.tick(now + Duration::from_secs(10));
        assert_eq!(game.clock().remaining(Color::White), 1800);
    }

    #[test]
    fn flip_remaps_selection_and_keeps_history_valid() {
        let (mut game, _) = new_game();
        play(&mut game, "e2", "e4");
        game.click(cell("d7")).unwrap();

        game.key(' ').unwrap();
        assert_eq!(game.selected(), Some(cell("d7").flipped()));
        assert!(game.view().flipped);

        game.undo().unwrap();
        assert!(game.state().is_flipped());
        assert_eq!(
            game.state().board.get(cell("e2").flipped()).map(|p| p.kind),
            Some(PieceKind::Pawn)
        );

        game.flip();
        game.redo().unwrap();
        assert!(game.state().board.is_occupied(cell("e4")));
    }

    #[test]
    fn save_and_load_restores_position() {
        let (mut game, now) = new_game();
        play(&mut game, "e2", "e4");
        play(&mut game, "d7", "d5");
        let saved = game.save();
        let expected = game.state().clone();

        game.restart(now);
        assert_eq!(game.history().len(), 1);
        game.load(&saved).unwrap();

        assert_eq!(game.state(), &expected);
        assert_eq!(game.history().len(), 3);
        assert!(matches!(
            game.load(&[1, 2, 3]),
            Err(ChessError::InvalidSave(_))
        ));
    }
}
