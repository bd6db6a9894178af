//! # Ramp Pass
//!
//! Smooths single-step height changes into slopes.
//!
//! Walking left to right, a column one step higher than its left neighbour
//! gets a [`TileKind::RampUp`](crate::tile::TileKind) on its surface tile;
//! a column one step lower turns the neighbour's surface tile into a
//! `RampDown`. Steps taller than `max_step` stay vertical walls.
//!
//! Column 0 compares against the left neighbour chunk but never edits it,
//! so a falling step across the boundary is left as is.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::Pass;
use crate::query::column_has_gap;
use crate::tile::{Tile, TileKind, TileLayer};

/// Ramp pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Largest height difference that gets a ramp.
    pub max_step: i32,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_step: 1,
        }
    }
}

/// Single-step slope smoothing. Stateless across chunks.
#[derive(Clone, Debug, Default)]
pub struct RampPass {
    /// Parameters.
    config: RampConfig,
}

impl RampPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: RampConfig) -> Self {
        Self { config }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &RampConfig {
        &self.config
    }

    /// Turns the surface tile of column `x` into a ramp if it is plain,
    /// unprotected ground. Returns true on success.
    fn place(chunk: &mut Chunk, x: i32, y: i32, kind: TileKind) -> bool {
        let tile = chunk.get(x, y);
        if tile.kind != TileKind::Solid || tile.layer != TileLayer::Ground || tile.is_protected() {
            return false;
        }
        let ramp = match kind {
            TileKind::RampUp => Tile::ramp_up(),
            _ => Tile::ramp_down(),
        };
        chunk.set(x, y, ramp.with_flags(tile.flags).with_height_level(tile.height_level))
    }

    /// Height of the column left of `x`, reading the neighbour chunk at 0.
    fn previous_height(chunk: &Chunk, ctx: &GenerationContext, x: i32) -> Option<(i32, bool)> {
        let (height, is_gap) = if x == 0 {
            let left = ctx.left_neighbor()?;
            let last = left.width() as i32 - 1;
            (left.scan_surface_height(last), column_has_gap(left, last))
        } else {
            (chunk.surface_height(x - 1), column_has_gap(chunk, x - 1))
        };
        (height != NO_SURFACE).then_some((height, is_gap))
    }
}

impl Pass for RampPass {
    fn name(&self) -> &'static str {
        "ramp"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        let max_step = self.config.max_step.max(1);
        let mut placed = 0_u32;

        for x in 0..chunk.width() as i32 {
            let height = chunk.surface_height(x);
            if height == NO_SURFACE || ctx.scratch.is_gap_column(x) || column_has_gap(chunk, x) {
                continue;
            }
            let Some((prev, prev_is_gap)) = Self::previous_height(chunk, ctx, x) else {
                continue;
            };
            if prev_is_gap {
                continue;
            }

            let diff = height - prev;
            if (1..=max_step).contains(&diff) {
                placed += u32::from(Self::place(chunk, x, height, TileKind::RampUp));
            } else if (-max_step..=-1).contains(&diff) && x > 0 && !chunk.get(x - 1, prev).is_ramp() {
                placed += u32::from(Self::place(chunk, x - 1, prev, TileKind::RampDown));
            }
        }

        trace!(chunk = chunk.index(), placed, "ramps placed");
    }
}
