//! Binary save format for a whole history.
//!
//! Header (20 bytes, little endian): magic `CHSV`, version, snapshot count,
//! CRC32 of the payload, cursor. The payload holds the snapshots newest
//! first, each as:
//!
//! - piece count, then `cell, color, kind, moved` per piece
//! - white captures: count, kinds; black captures: count, kinds
//! - side to move, outcome (0 = none), promotion cell, en-passant cell
//!
//! Cells are `row * 8 + col` in the unflipped orientation, `0xFF` for none.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ChessError;
use crate::history::{History, HistorySnapshot};
use crate::types::{Cell, Color, Outcome, PieceKind};

const MAGIC: &[u8; 4] = b"CHSV";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;
const NO_CELL: u8 = 0xFF;

pub fn encode(history: &History) -> Vec<u8> {
    let mut payload = Vec::new();
    for snapshot in history.entries() {
        encode_snapshot(snapshot, &mut payload);
    }

    let crc = crc32fast::hash(&payload);
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(history.len() as u32).to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(history.cursor() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

pub fn decode(data: &[u8]) -> Result<History, ChessError> {
    if data.len() < HEADER_SIZE {
        return Err(invalid(format!(
            "save data too short: expected at least {HEADER_SIZE} bytes, got {}",
            data.len()
        )));
    }
    if &data[0..4] != MAGIC {
        return Err(invalid("invalid save magic (expected CHSV)".to_string()));
    }

    let version = read_u32_le(data, 4)?;
    if version != VERSION {
        return Err(invalid(format!(
            "unsupported save version: expected {VERSION}, got {version}"
        )));
    }

    let count = read_u32_le(data, 8)? as usize;
    let expected_crc = read_u32_le(data, 12)?;
    let cursor = read_u32_le(data, 16)? as usize;
    let payload = &data[HEADER_SIZE..];

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(invalid(format!(
            "CRC32 mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"
        )));
    }
    if count == 0 {
        return Err(invalid("save holds no snapshots".to_string()));
    }

    let mut reader = Reader {
        data: payload,
        offset: 0,
    };
    let mut entries = Vec::with_capacity(count.min(payload.len()));
    for index in 0..count {
        entries.push(decode_snapshot(&mut reader, index)?);
    }
    if reader.offset != payload.len() {
        return Err(invalid("save payload has trailing bytes".to_string()));
    }

    History::from_parts(entries, cursor)
}

fn encode_snapshot(snapshot: &HistorySnapshot, out: &mut Vec<u8>) {
    let pieces: Vec<(Cell, Color, PieceKind)> = snapshot
        .positions
        .iter()
        .flat_map(|((color, kind), cells)| cells.iter().map(move |cell| (*cell, *color, *kind)))
        .collect();

    out.push(pieces.len() as u8);
    for (cell, color, kind) in pieces {
        out.push(cell.index() as u8);
        out.push(color.index() as u8);
        out.push(kind.code());
        out.push(u8::from(snapshot.moved.contains(&cell)));
    }
    for captured in &snapshot.captured {
        out.push(captured.len() as u8);
        out.extend(captured.iter().map(|kind| kind.code()));
    }
    out.push(snapshot.current.index() as u8);
    out.push(snapshot.outcome.map_or(0, Outcome::code));
    out.push(cell_code(snapshot.promotion_pending));
    out.push(cell_code(snapshot.en_passant));
}

fn decode_snapshot(reader: &mut Reader<'_>, index: usize) -> Result<HistorySnapshot, ChessError> {
    let mut positions: BTreeMap<(Color, PieceKind), BTreeSet<Cell>> = BTreeMap::new();
    let mut moved = BTreeSet::new();
    let mut occupied = BTreeSet::new();

    let piece_count = reader.u8()?;
    for _ in 0..piece_count {
        let cell = reader.cell()?.ok_or_else(|| {
            invalid(format!("snapshot #{index} has a piece without a cell"))
        })?;
        let color = reader.color()?;
        let kind = PieceKind::from_code(reader.u8()?)
            .ok_or_else(|| invalid(format!("snapshot #{index} has an unknown piece kind")))?;
        let has_moved = reader.u8()? != 0;

        if !occupied.insert(cell) {
            return Err(invalid(format!(
                "snapshot #{index} places two pieces on {cell}"
            )));
        }
        positions.entry((color, kind)).or_default().insert(cell);
        if has_moved {
            moved.insert(cell);
        }
    }

    let mut captured: [Vec<PieceKind>; 2] = [Vec::new(), Vec::new()];
    for side in &mut captured {
        let len = reader.u8()?;
        for _ in 0..len {
            let kind = PieceKind::from_code(reader.u8()?).ok_or_else(|| {
                invalid(format!("snapshot #{index} has an unknown captured kind"))
            })?;
            side.push(kind);
        }
    }

    let current = reader.color()?;
    let outcome = match reader.u8()? {
        0 => None,
        code => Some(Outcome::from_code(code).ok_or_else(|| {
            invalid(format!("snapshot #{index} has an unknown outcome {code}"))
        })?),
    };
    let promotion_pending = reader.cell()?;
    if let Some(cell) = promotion_pending {
        let holds_pawn = positions
            .get(&(current, PieceKind::Pawn))
            .is_some_and(|cells| cells.contains(&cell));
        if !holds_pawn {
            return Err(invalid(format!(
                "snapshot #{index} awaits promotion on {cell} without a pawn to promote"
            )));
        }
    }
    let en_passant = reader.cell()?;

    Ok(HistorySnapshot {
        positions,
        moved,
        captured,
        current,
        outcome,
        promotion_pending,
        en_passant,
    })
}

fn cell_code(cell: Option<Cell>) -> u8 {
    cell.map_or(NO_CELL, |cell| cell.index() as u8)
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn u8(&mut self) -> Result<u8, ChessError> {
        let byte = *self
            .data
            .get(self.offset)
            .ok_or_else(|| invalid("unexpected EOF while reading snapshot".to_string()))?;
        self.offset += 1;
        Ok(byte)
    }

    fn cell(&mut self) -> Result<Option<Cell>, ChessError> {
        match self.u8()? {
            NO_CELL => Ok(None),
            code => Cell::from_index(code as usize)
                .map(Some)
                .ok_or_else(|| invalid(format!("cell index {code} out of range"))),
        }
    }

    fn color(&mut self) -> Result<Color, ChessError> {
        match self.u8()? {
            0 => Ok(Color::White),
            1 => Ok(Color::Black),
            other => Err(invalid(format!("unknown color {other}"))),
        }
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, ChessError> {
    if offset + 4 > data.len() {
        return Err(invalid("unexpected EOF while reading u32".to_string()));
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    Ok(u32::from_le_bytes(bytes))
}

fn invalid(message: String) -> ChessError {
    ChessError::InvalidSave(message)
}
