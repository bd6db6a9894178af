//! # Query Utilities
//!
//! Stateless "what's here" helpers shared by the passes.
//!
//! All of them go through [`Chunk::get`], so probing past a chunk edge reads
//! air instead of failing.

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, NO_SURFACE};
use crate::context::GenerationContext;
use crate::tile::TileLayer;

/// Free-space envelope around a candidate cell.
///
/// Counts are in tiles. With `diagonal` the whole rectangle must be empty,
/// otherwise only the horizontal and vertical arms through the cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    /// Cells to the left.
    pub left: u8,
    /// Cells to the right.
    pub right: u8,
    /// Cells above.
    pub above: u8,
    /// Cells below.
    pub below: u8,
    /// Also require the corner cells.
    pub diagonal: bool,
}

impl Envelope {
    /// One free cell on every side, corners included.
    pub const SNUG: Self = Self {
        left: 1,
        right: 1,
        above: 1,
        below: 0,
        diagonal: true,
    };
}

/// Topmost walkable row in a column restricted to the given layers.
#[must_use]
pub fn highest_walkable_in_layers(chunk: &Chunk, x: i32, layers: &[TileLayer]) -> i32 {
    (0..chunk.height() as i32)
        .rev()
        .find(|&y| {
            let tile = chunk.get(x, y);
            tile.is_walkable() && layers.contains(&tile.layer)
        })
        .unwrap_or(NO_SURFACE)
}

/// Returns true if any cell of the column is an explicit gap.
#[must_use]
pub fn column_has_gap(chunk: &Chunk, x: i32) -> bool {
    (0..chunk.height() as i32).any(|y| chunk.get(x, y).is_gap())
}

/// Tile-scanned surface of a column that may lie in a neighbour chunk.
///
/// Negative columns read the left neighbour, columns past the width read
/// the right neighbour. Returns `None` when the column is missing, has no
/// surface, or is itself a gap column.
#[must_use]
pub fn resolve_column_surface(chunk: &Chunk, ctx: &GenerationContext, x: i32) -> Option<i32> {
    let width = chunk.width() as i32;
    let (source, local) = if x < 0 {
        (ctx.left_neighbor()?, x + width)
    } else if x >= width {
        (ctx.right_neighbor()?, x - width)
    } else {
        (chunk, x)
    };

    if column_has_gap(source, local) {
        return None;
    }
    let height = source.scan_surface_height(local);
    (height != NO_SURFACE).then_some(height)
}

/// Returns true if `(x, y)` and its envelope are all empty.
#[must_use]
pub fn is_envelope_clear(chunk: &Chunk, x: i32, y: i32, envelope: Envelope) -> bool {
    let x0 = x - i32::from(envelope.left);
    let x1 = x + i32::from(envelope.right);
    let y0 = y - i32::from(envelope.below);
    let y1 = y + i32::from(envelope.above);

    if envelope.diagonal {
        return (x0..=x1).all(|cx| (y0..=y1).all(|cy| chunk.get(cx, cy).is_empty()));
    }

    (x0..=x1).all(|cx| chunk.get(cx, y).is_empty()) && (y0..=y1).all(|cy| chunk.get(x, cy).is_empty())
}

/// Returns true if something can stand at `(x, y)`: the cell is empty and
/// the cell beneath is walkable.
#[must_use]
pub fn is_standable(chunk: &Chunk, x: i32, y: i32) -> bool {
    chunk.get(x, y).is_empty() && chunk.get(x, y - 1).is_walkable()
}

/// Returns true if every column within `radius` of `x` shares its surface
/// height and none of them is a gap.
#[must_use]
pub fn is_flat(chunk: &Chunk, x: i32, radius: i32) -> bool {
    let height = chunk.surface_height(x);
    if height == NO_SURFACE {
        return false;
    }
    (x - radius..=x + radius).all(|cx| {
        cx >= 0
            && cx < chunk.width() as i32
            && chunk.surface_height(cx) == height
            && !chunk.get(cx, height).is_ramp()
    })
}
