use serde::Serialize;

use crate::layout::Layout;
use crate::types::{Cell, Color, PieceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Title,
    Subtitle,
    Hint,
}

/// Background tint for the side to move.
pub fn side_rgb(color: Color) -> [u8; 3] {
    match color {
        Color::White => [248, 188, 58],
        Color::Black => [140, 91, 62],
    }
}

/// What the session needs from the drawing layer. Tokens are addressed by
/// the cell they stand on, which is unique.
pub trait Renderer {
    fn place_token(&mut self, kind: PieceKind, color: Color, cell: Cell);
    fn remove_token(&mut self, cell: Cell);
    fn move_token(&mut self, from: Cell, to: Cell);
    fn clear_board(&mut self);
    /// `color` is the color of the captured piece, which picks its row.
    fn show_captured(&mut self, kind: PieceKind, color: Color, slot: usize);
    fn clear_captured(&mut self);
    fn set_captured_visible(&mut self, visible: bool);
    fn select(&mut self, cell: Option<Cell>);
    fn render_text(&mut self, text: &str, style: TextStyle);
    fn clear_text(&mut self);
    fn flash_invalid(&mut self, cell: Cell);
    fn set_background(&mut self, rgb: [u8; 3]);
}

/// Serializable drawing instruction handed to the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    PlaceToken {
        kind: PieceKind,
        color: Color,
        cell: Cell,
        x: f32,
        y: f32,
    },
    RemoveToken {
        cell: Cell,
    },
    MoveToken {
        from: Cell,
        to: Cell,
        x: f32,
        y: f32,
    },
    ClearBoard,
    ShowCaptured {
        kind: PieceKind,
        color: Color,
        slot: usize,
        x: f32,
        y: f32,
        size: f32,
    },
    ClearCaptured,
    SetCapturedVisible {
        visible: bool,
    },
    Select {
        cell: Option<Cell>,
    },
    Text {
        text: String,
        style: TextStyle,
    },
    ClearText,
    FlashInvalid {
        cell: Cell,
        x: f32,
        y: f32,
    },
    Background {
        rgb: [u8; 3],
    },
}

/// Renderer that queues commands with pixel positions resolved.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    layout: Layout,
    commands: Vec<RenderCommand>,
}

impl CommandBuffer {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Renderer for CommandBuffer {
    fn place_token(&mut self, kind: PieceKind, color: Color, cell: Cell) {
        let (x, y) = self.layout.cell_to_pixel(cell);
        self.commands.push(RenderCommand::PlaceToken {
            kind,
            color,
            cell,
            x,
            y,
        });
    }

    fn remove_token(&mut self, cell: Cell) {
        self.commands.push(RenderCommand::RemoveToken { cell });
    }

    fn move_token(&mut self, from: Cell, to: Cell) {
        let (x, y) = self.layout.cell_to_pixel(to);
        self.commands.push(RenderCommand::MoveToken { from, to, x, y });
    }

    fn clear_board(&mut self) {
        self.commands.push(RenderCommand::ClearBoard);
    }

    fn show_captured(&mut self, kind: PieceKind, color: Color, slot: usize) {
        let (x, y) = self.layout.captured_slot(color, slot);
        let size = self.layout.captured_square_size();
        self.commands.push(RenderCommand::ShowCaptured {
            kind,
            color,
            slot,
            x,
            y,
            size,
        });
    }

    fn clear_captured(&mut self) {
        self.commands.push(RenderCommand::ClearCaptured);
    }

    fn set_captured_visible(&mut self, visible: bool) {
        self.commands
            .push(RenderCommand::SetCapturedVisible { visible });
    }

    fn select(&mut self, cell: Option<Cell>) {
        self.commands.push(RenderCommand::Select { cell });
    }

    fn render_text(&mut self, text: &str, style: TextStyle) {
        self.commands.push(RenderCommand::Text {
            text: text.to_string(),
            style,
        });
    }

    fn clear_text(&mut self) {
        self.commands.push(RenderCommand::ClearText);
    }

    fn flash_invalid(&mut self, cell: Cell) {
        let (x, y) = self.layout.cell_to_pixel(cell);
        self.commands
            .push(RenderCommand::FlashInvalid { cell, x, y });
    }

    fn set_background(&mut self, rgb: [u8; 3]) {
        self.commands.push(RenderCommand::Background { rgb });
    }
}
