use serde::Deserialize;

use crate::types::{BOARD_WIDTH, Cell, Color};

/// Pixel geometry of the window, the board and the captured-piece rows.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub window: (f32, f32),
    pub board_offset: (f32, f32),
    pub board_size: (f32, f32),
    pub captured_padding: f32,
    pub captured_row_spacing: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            window: (700.0, 750.0),
            board_offset: (50.0, 50.0),
            board_size: (600.0, 600.0),
            captured_padding: 5.0,
            captured_row_spacing: 8.0,
        }
    }
}

impl Layout {
    /// Board cell under a pixel, or `None` outside the 8x8 grid.
    pub fn pixel_to_cell(&self, x: f32, y: f32) -> Option<Cell> {
        let (col, row) = self.pixel_to_grid(x, y);
        Cell::new(col, row)
    }

    /// Unbounded grid coordinates of a pixel; may fall outside `0..8`.
    pub fn pixel_to_grid(&self, x: f32, y: f32) -> (i32, i32) {
        let width = BOARD_WIDTH as f32;
        let col = ((x - self.board_offset.0) / self.board_size.0 * width).floor();
        let row = ((y - self.board_offset.1) / self.board_size.1 * width).floor();
        // Saturating float casts turn NaN into 0, so reject non-finite input.
        if !col.is_finite() || !row.is_finite() {
            return (-1, -1);
        }
        (col as i32, row as i32)
    }

    /// Top-left pixel of a cell.
    pub fn cell_to_pixel(&self, cell: Cell) -> (f32, f32) {
        let width = BOARD_WIDTH as f32;
        (
            cell.col as f32 / width * self.board_size.0 + self.board_offset.0,
            cell.row as f32 / width * self.board_size.1 + self.board_offset.1,
        )
    }

    pub fn square_size(&self) -> (f32, f32) {
        let width = BOARD_WIDTH as f32;
        (
            (self.board_size.0 / width).floor(),
            (self.board_size.1 / width).floor(),
        )
    }

    pub fn captured_square_size(&self) -> f32 {
        (self.window.0 / 16.0).floor() - self.captured_padding
    }

    /// Top-left pixel of the `slot`-th captured piece of `captured` color.
    /// White pieces go in the upper row, black pieces in the lower one.
    pub fn captured_slot(&self, captured: Color, slot: usize) -> (f32, f32) {
        let size = self.captured_square_size();
        let midpoint = (self.board_size.1 + self.window.1 + self.board_offset.1) / 2.0;
        let y = match captured {
            Color::White => midpoint - self.captured_row_spacing / 2.0 - size,
            Color::Black => midpoint + self.captured_row_spacing / 2.0,
        };
        (slot as f32 * size + self.captured_padding, y)
    }
}
