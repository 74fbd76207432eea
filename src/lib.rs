use wasm_bindgen::prelude::*;
use web_time::Instant;

pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod history;
pub mod layout;
pub mod movement;
pub mod persist;
pub mod render;
pub mod rules;
pub mod side;
pub mod state;
pub mod types;

pub use config::GameConfig;
pub use error::ChessError;
pub use game::{ClickOutcome, GameInstance, KeyOutcome};
pub use render::{CommandBuffer, RenderCommand, Renderer};
pub use state::GameState;
pub use types::{Cell, Color, Outcome, Piece, PieceKind};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}

/// Browser-facing session. Each call mutates the game and queues render
/// commands that the page collects with `drain_commands`.
#[wasm_bindgen]
pub struct WasmGame {
    inner: GameInstance<CommandBuffer>,
}

#[wasm_bindgen]
impl WasmGame {
    /// `config` may be `undefined` or a partial `GameConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmGame, JsError> {
        let config: GameConfig = if config.is_undefined() || config.is_null() {
            GameConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let renderer = CommandBuffer::new(config.layout);
        Ok(Self {
            inner: GameInstance::new(config, renderer, Instant::now()),
        })
    }

    /// Returns whether the click changed selection or played a move.
    pub fn click(&mut self, col: i32, row: i32) -> bool {
        let result = Cell::new(col, row)
            .ok_or(ChessError::OutOfBounds { col, row })
            .and_then(|cell| self.inner.click(cell));
        accepted(result)
    }

    pub fn click_pixel(&mut self, x: f32, y: f32) -> bool {
        accepted(self.inner.click_pixel(x, y))
    }

    /// Handles the first character of `key`.
    pub fn key(&mut self, key: &str) -> bool {
        match key.chars().next() {
            Some(key) => matches!(
                self.inner.key(key),
                Ok(KeyOutcome::Flipped | KeyOutcome::Promoted { .. })
            ),
            None => false,
        }
    }

    pub fn flip(&mut self) {
        self.inner.flip();
    }

    pub fn undo(&mut self) -> bool {
        self.inner.undo().is_ok()
    }

    pub fn redo(&mut self) -> bool {
        self.inner.redo().is_ok()
    }

    pub fn restart(&mut self) {
        self.inner.restart(Instant::now());
    }

    pub fn toggle_clock(&mut self) {
        self.inner.toggle_clock();
    }

    /// Call once per animation frame.
    pub fn tick(&mut self) {
        self.inner.tick(Instant::now());
    }

    pub fn legal_targets(&self, col: i32, row: i32) -> Result<JsValue, JsError> {
        let targets = Cell::new(col, row)
            .map(|cell| self.inner.legal_targets(cell))
            .unwrap_or_default();
        Ok(serde_wasm_bindgen::to_value(&targets)?)
    }

    pub fn state(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.inner.view())?)
    }

    pub fn drain_commands(&mut self) -> Result<JsValue, JsError> {
        let commands = self.inner.renderer_mut().drain();
        Ok(serde_wasm_bindgen::to_value(&commands)?)
    }

    pub fn save(&self) -> Vec<u8> {
        self.inner.save()
    }

    pub fn load(&mut self, data: &[u8]) -> Result<(), JsError> {
        self.inner.load(data)?;
        Ok(())
    }
}

fn accepted(result: Result<ClickOutcome, ChessError>) -> bool {
    match result {
        Ok(ClickOutcome::Ignored) => false,
        Ok(_) => true,
        Err(err) => {
            tracing::debug!(%err, "input rejected");
            false
        }
    }
}
