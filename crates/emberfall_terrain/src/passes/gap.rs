//! # Gap Pass
//!
//! Cuts pits into the ground in two sweeps.
//!
//! **Cut**: left to right, once past the safe-start zone and outside the
//! spacing cooldown, each column rolls to open a gap of
//! `min_gap_width..=max_gap_width` columns. Ground from `bottom_offset` up
//! to the surface becomes [`TileKind::ExplicitGap`](crate::tile::TileKind).
//! A run that reaches the right chunk edge is finished from column 0 of
//! the next chunk, so every pit has its full rolled width.
//!
//! **Backdrop**: once every span is known, each span gets background fill
//! up to the lower of its two bordering surfaces (tile-scanned, neighbour
//! chunks included) plus `background_y_offset`. Capping by the lower side
//! keeps the backdrop from rising above either edge of the pit.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::Chunk;
use crate::context::{GapSpan, GenerationContext};
use crate::pass::{salt, Pass};
use crate::passes::{roll_between, roll_chance};
use crate::query::resolve_column_surface;
use crate::tile::Tile;

/// Gap pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Chance per eligible column to open a gap.
    pub probability: f64,
    /// Narrowest gap, in columns.
    pub min_gap_width: i32,
    /// Widest gap, in columns.
    pub max_gap_width: i32,
    /// Columns that must separate two gaps.
    pub min_spacing: i32,
    /// World columns from the origin that never get a gap.
    pub safe_start_columns: i32,
    /// First row converted to gap.
    pub bottom_offset: i32,
    /// Added to the lower bordering surface to cap the gap backdrop.
    pub background_y_offset: i32,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 0.05,
            min_gap_width: 2,
            max_gap_width: 4,
            min_spacing: 12,
            safe_start_columns: 30,
            bottom_offset: 0,
            background_y_offset: 0,
        }
    }
}

/// A gap run cut short by the right chunk edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenRun {
    /// Columns still to cut.
    remaining: i32,
    /// Surface of the run's left bank, if it has one.
    left_bank: Option<i32>,
}

/// Two-sweep pit cutting.
#[derive(Clone, Debug)]
pub struct GapPass {
    /// Parameters.
    config: GapConfig,
    /// Columns since the last gap ended. Carries across chunks.
    columns_since_gap: i32,
    /// Unfinished run from the previous chunk.
    open_run: Option<OpenRun>,
}

impl GapPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: GapConfig) -> Self {
        let columns_since_gap = config.min_spacing;
        Self {
            config,
            columns_since_gap,
            open_run: None,
        }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    /// Converts one column to gap from `bottom_offset` up to its surface.
    /// Protected rows stay solid and become the pit floor.
    fn cut_column(&self, chunk: &mut Chunk, x: i32) {
        let top = chunk.surface_height(x);
        for y in self.config.bottom_offset.max(0)..=top {
            let tile = chunk.get(x, y);
            if tile.is_walkable() && !tile.is_protected() {
                chunk.set(x, y, Tile::gap().with_height_level(top as i16));
            }
        }
        chunk.refresh_surface_height(x);
    }

    /// Cuts `x..x + run_width`, clipped to the chunk. Records the overflow
    /// as an open run. Returns the span and the next column to visit.
    fn cut_run(&mut self, chunk: &mut Chunk, x: i32, run_width: i32, left_bank: Option<i32>) -> (GapSpan, i32) {
        let width = chunk.width() as i32;
        let end = (x + run_width - 1).min(width - 1);
        for gx in x..=end {
            self.cut_column(chunk, gx);
        }

        let remaining = x + run_width - 1 - end;
        self.open_run = (remaining > 0).then_some(OpenRun { remaining, left_bank });
        self.columns_since_gap = 0;
        (GapSpan { start: x, end }, end + 1)
    }

    /// First sweep: finishes the previous chunk's open run, opens new gaps,
    /// and returns the spans plus the carried left bank of the continued run.
    fn cut_gaps(&mut self, chunk: &mut Chunk, ctx: &GenerationContext) -> (Vec<GapSpan>, Option<i32>) {
        let cfg = self.config.clone();
        let width = chunk.width() as i32;
        let mut rng = ctx.rng(salt::GAP);
        let mut spans = Vec::new();

        let mut x = 0;
        let mut carried_bank = None;
        if let Some(run) = self.open_run.take() {
            let (span, next) = self.cut_run(chunk, 0, run.remaining, run.left_bank);
            spans.push(span);
            x = next;
            carried_bank = run.left_bank;
        }

        while x < width {
            let eligible = chunk.world_x(x) >= cfg.safe_start_columns
                && self.columns_since_gap >= cfg.min_spacing;

            if !eligible || !roll_chance(&mut rng, cfg.probability) {
                self.columns_since_gap += 1;
                x += 1;
                continue;
            }

            let gap_width = roll_between(&mut rng, cfg.min_gap_width, cfg.max_gap_width).max(1);
            let left_bank = resolve_column_surface(chunk, ctx, x - 1);
            let (span, next) = self.cut_run(chunk, x, gap_width, left_bank);
            spans.push(span);
            x = next;
        }

        (spans, carried_bank)
    }

    /// Second sweep for one span: fills its backdrop up to the capped height.
    ///
    /// Returns the top backdrop row, or `None` when neither side has a
    /// surface to cap against.
    pub fn fill_span_background(
        &self,
        chunk: &mut Chunk,
        ctx: &GenerationContext,
        span: GapSpan,
    ) -> Option<i32> {
        self.fill_span_with_bank(chunk, ctx, span, None)
    }

    /// [`Self::fill_span_background`] with a known left bank for spans whose
    /// left side lies in an earlier chunk's part of the same pit.
    fn fill_span_with_bank(
        &self,
        chunk: &mut Chunk,
        ctx: &GenerationContext,
        span: GapSpan,
        known_left: Option<i32>,
    ) -> Option<i32> {
        let left = resolve_column_surface(chunk, ctx, span.start - 1).or(known_left);
        let right = resolve_column_surface(chunk, ctx, span.end + 1);

        let cap = match (left, right) {
            (Some(l), Some(r)) => l.min(r),
            (Some(h), None) | (None, Some(h)) => h,
            (None, None) => return None,
        };
        let top = (cap + self.config.background_y_offset).min(chunk.height() as i32 - 1);

        for x in span.start..=span.end {
            for y in self.config.bottom_offset.max(0)..=top {
                chunk.set_background(x, y, Tile::backdrop());
            }
        }
        Some(top)
    }
}

impl Default for GapPass {
    fn default() -> Self {
        Self::new(GapConfig::default())
    }
}

impl Pass for GapPass {
    fn name(&self) -> &'static str {
        "gap"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        let (spans, carried_bank) = self.cut_gaps(chunk, ctx);

        for &span in &spans {
            let known_left = if span.start == 0 { carried_bank } else { None };
            let top = self.fill_span_with_bank(chunk, ctx, span, known_left);
            trace!(chunk = chunk.index(), start = span.start, end = span.end, backdrop_top = ?top, "gap cut");
        }

        ctx.scratch.gap_spans.extend(spans);
    }

    fn reset(&mut self) {
        self.columns_since_gap = self.config.min_spacing;
        self.open_run = None;
    }
}
