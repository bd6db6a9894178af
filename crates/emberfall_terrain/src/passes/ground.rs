//! # Ground Pass
//!
//! Synthesizes the height field and fills the terrain mass.
//!
//! Walking columns left to right:
//! 1. While a plateau is active, repeat the previous height.
//! 2. Otherwise sample fractal noise at the world column, map it into
//!    `[min_height, max_height]` and clamp it to within
//!    `max_slope_per_column` of the previous column.
//! 3. Occasionally start a new plateau.
//!
//! The walk starts from the left neighbour's recorded right-edge height, so
//! consecutive chunks meet without a seam. With no left neighbour the first
//! column is pinned to `base_height`.
//!
//! This is the only pass allowed to initialize the surface height cache.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::{salt, Pass};
use crate::passes::{roll_between, roll_chance};
use crate::tile::{Tile, TileFlags};

/// Ground pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Base noise frequency in cycles per tile.
    pub frequency: f64,
    /// Fractal octaves.
    pub octaves: u32,
    /// Selects an independent noise stream.
    pub seed_offset: f64,
    /// Lowest surface row.
    pub min_height: i32,
    /// Highest surface row.
    pub max_height: i32,
    /// Surface row of the very first column when there is no left neighbour.
    pub base_height: i32,
    /// Largest height change between adjacent columns.
    pub max_slope_per_column: i32,
    /// Chance per noise-driven column to start a plateau.
    pub plateau_chance: f64,
    /// Shortest plateau, in columns.
    pub plateau_min_length: i32,
    /// Longest plateau, in columns.
    pub plateau_max_length: i32,
    /// Bottom rows flagged protected.
    pub protected_rows: i32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: 0.04,
            octaves: 4,
            seed_offset: 0.0,
            min_height: 2,
            max_height: 12,
            base_height: 3,
            max_slope_per_column: 2,
            plateau_chance: 0.08,
            plateau_min_length: 3,
            plateau_max_length: 8,
            protected_rows: 1,
        }
    }
}

/// Height field synthesis.
#[derive(Clone, Debug, Default)]
pub struct GroundPass {
    /// Parameters.
    config: GroundConfig,
    /// Columns left in the current plateau. Carries across chunks.
    plateau_remaining: i32,
}

impl GroundPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: GroundConfig) -> Self {
        Self {
            config,
            plateau_remaining: 0,
        }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &GroundConfig {
        &self.config
    }

    /// Columns left in the plateau in progress.
    #[must_use]
    pub fn plateau_remaining(&self) -> i32 {
        self.plateau_remaining
    }

    /// Valid surface rows for a chunk of the given height.
    fn height_bounds(&self, chunk_height: usize) -> (i32, i32) {
        let hi = self.config.max_height.min(chunk_height as i32 - 1).max(0);
        let lo = self.config.min_height.clamp(0, hi);
        (lo, hi)
    }

    /// Computes the surface row of every column.
    fn synthesize_heights(&mut self, chunk: &Chunk, ctx: &GenerationContext) -> Vec<i32> {
        let cfg = &self.config;
        let width = chunk.width();
        let (lo, hi) = self.height_bounds(chunk.height());
        let slope = cfg.max_slope_per_column.max(0);
        let mut rng = ctx.rng(salt::GROUND);

        let mut heights = Vec::with_capacity(width);
        let inherited = ctx
            .left_neighbor()
            .map(|left| left.metadata.right_edge_height)
            .filter(|&h| h != NO_SURFACE);

        let mut prev = match inherited {
            Some(edge) => edge.clamp(lo, hi),
            None => {
                let pinned = cfg.base_height.clamp(lo, hi);
                heights.push(pinned);
                pinned
            }
        };

        let span = f64::from(hi - lo);
        for x in heights.len()..width {
            let height = if self.plateau_remaining > 0 {
                self.plateau_remaining -= 1;
                prev
            } else {
                let world_x = f64::from(chunk.world_x(x as i32));
                let n = ctx.fractal_noise_1d(world_x, cfg.frequency, cfg.octaves, cfg.seed_offset);
                let target = lo + (n * span).round() as i32;

                if roll_chance(&mut rng, cfg.plateau_chance) {
                    self.plateau_remaining =
                        roll_between(&mut rng, cfg.plateau_min_length, cfg.plateau_max_length).max(0);
                }
                target.clamp(prev - slope, prev + slope)
            };

            let height = height.clamp(lo, hi);
            heights.push(height);
            prev = height;
        }

        heights
    }
}

impl Pass for GroundPass {
    fn name(&self) -> &'static str {
        "ground"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        if chunk.width() == 0 || chunk.height() == 0 {
            chunk.metadata.ground_generated = true;
            return;
        }

        let heights = self.synthesize_heights(chunk, ctx);
        let left_of_chunk = ctx
            .left_neighbor()
            .map_or(NO_SURFACE, |left| left.metadata.right_edge_height);

        for (x, &top) in heights.iter().enumerate() {
            let left_height = if x == 0 { left_of_chunk } else { heights[x - 1] };
            let right_height = heights.get(x + 1).copied();

            for y in 0..=top {
                let mut flags = TileFlags::NONE;
                if y < self.config.protected_rows {
                    flags |= TileFlags::PROTECTED;
                }
                if y == top {
                    flags |= TileFlags::EDGE_TOP;
                }
                if left_height != NO_SURFACE && y > left_height {
                    flags |= TileFlags::EDGE_LEFT;
                }
                if right_height.is_some_and(|h| y > h) {
                    flags |= TileFlags::EDGE_RIGHT;
                }
                let tile = Tile::ground()
                    .with_height_level(top as i16)
                    .with_flags(flags);
                chunk.set(x as i32, y, tile);
            }
        }

        let meta = &mut chunk.metadata;
        meta.left_edge_height = heights[0];
        meta.right_edge_height = heights[heights.len() - 1];
        meta.surface_heights = heights;
        meta.ground_generated = true;

        trace!(
            chunk = chunk.index(),
            left_edge = chunk.metadata.left_edge_height,
            right_edge = chunk.metadata.right_edge_height,
            plateau_remaining = self.plateau_remaining,
            "ground synthesized"
        );
    }

    fn reset(&mut self) {
        self.plateau_remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::context;
    use std::sync::Arc;

    fn run(
        pass: &mut GroundPass,
        ctx: &mut GenerationContext,
        index: i32,
        left: Option<Arc<Chunk>>,
    ) -> Chunk {
        let mut chunk = Chunk::new(index, ctx.chunk_width(), ctx.chunk_height());
        ctx.begin_chunk(index, left, None);
        pass.execute(&mut chunk, ctx);
        ctx.end_chunk();
        chunk
    }

    #[test]
    fn test_first_chunk_starts_at_base_height() {
        let mut ctx = context(42, 20, 25);
        let mut pass = GroundPass::new(GroundConfig::default());
        let chunk = run(&mut pass, &mut ctx, 0, None);

        assert_eq!(chunk.metadata.surface_heights[0], 3);
        assert_eq!(chunk.metadata.left_edge_height, 3);
        assert!(chunk.metadata.ground_generated);
    }

    #[test]
    fn test_slope_bound_holds() {
        let mut ctx = context(7, 32, 40);
        let config = GroundConfig {
            frequency: 0.3,
            max_height: 35,
            max_slope_per_column: 1,
            ..GroundConfig::default()
        };
        let mut pass = GroundPass::new(config);
        let mut left = None;

        for index in 0..20 {
            let chunk = Arc::new(run(&mut pass, &mut ctx, index, left.take()));
            let h = &chunk.metadata.surface_heights;
            for pair in h.windows(2) {
                assert!((pair[1] - pair[0]).abs() <= 1, "slope broken in chunk {index}: {h:?}");
            }
            left = Some(chunk);
        }
    }

    #[test]
    fn test_edge_continuity() {
        let mut ctx = context(99, 16, 30);
        let mut pass = GroundPass::new(GroundConfig::default());
        let first = Arc::new(run(&mut pass, &mut ctx, 0, None));
        let right_edge = first.metadata.right_edge_height;
        let second = run(&mut pass, &mut ctx, 1, Some(first));

        let step = (second.metadata.surface_heights[0] - right_edge).abs();
        assert!(step <= pass.config().max_slope_per_column, "seam of {step} rows");
    }

    #[test]
    fn test_columns_are_filled_and_flagged() {
        let mut ctx = context(5, 20, 25);
        let mut pass = GroundPass::new(GroundConfig::default());
        let chunk = run(&mut pass, &mut ctx, 0, None);

        for x in 0..20 {
            let top = chunk.surface_height(x);
            for y in 0..=top {
                assert!(chunk.get(x, y).is_solid());
            }
            assert!(chunk.get(x, top + 1).is_empty());
            assert!(chunk.get(x, top).flags.contains(TileFlags::EDGE_TOP));
            assert!(chunk.get(x, 0).is_protected());
            assert_eq!(chunk.scan_surface_height(x), top);
        }
    }

    #[test]
    fn test_exposed_faces_are_flagged() {
        let mut ctx = context(11, 20, 25);
        let mut pass = GroundPass::new(GroundConfig {
            frequency: 0.5,
            plateau_chance: 0.0,
            ..GroundConfig::default()
        });
        let chunk = run(&mut pass, &mut ctx, 0, None);
        let h = &chunk.metadata.surface_heights;

        for x in 1..20usize {
            if h[x] > h[x - 1] {
                let tile = chunk.get(x as i32, h[x]);
                assert!(tile.flags.contains(TileFlags::EDGE_LEFT));
            }
            if h[x - 1] > h[x] {
                let tile = chunk.get(x as i32 - 1, h[x - 1]);
                assert!(tile.flags.contains(TileFlags::EDGE_RIGHT));
            }
        }
    }

    #[test]
    fn test_plateau_state_carries_and_resets() {
        let mut ctx = context(3, 20, 25);
        let mut pass = GroundPass::new(GroundConfig {
            plateau_chance: 1.0,
            plateau_min_length: 50,
            plateau_max_length: 50,
            ..GroundConfig::default()
        });
        let first = run(&mut pass, &mut ctx, 0, None);
        assert!(pass.plateau_remaining() > 0, "a 50-column plateau outlives a 20-column chunk");

        let plateau_height = first.metadata.right_edge_height;
        let second = run(&mut pass, &mut ctx, 1, Some(Arc::new(first)));
        assert!(second.metadata.surface_heights.iter().all(|&h| h == plateau_height));

        pass.reset();
        assert_eq!(pass.plateau_remaining(), 0);
    }

    #[test]
    fn test_determinism_for_same_left_edge() {
        let mut ctx_a = context(42, 20, 25);
        let mut ctx_b = context(42, 20, 25);
        let mut a = GroundPass::new(GroundConfig::default());
        let mut b = GroundPass::new(GroundConfig::default());

        let left_a = Arc::new(run(&mut a, &mut ctx_a, 0, None));
        let left_b = Arc::new(run(&mut b, &mut ctx_b, 0, None));
        let chunk_a = run(&mut a, &mut ctx_a, 1, Some(left_a));
        let chunk_b = run(&mut b, &mut ctx_b, 1, Some(left_b));

        assert_eq!(chunk_a, chunk_b);
    }

    #[test]
    fn test_heights_stay_in_bounds() {
        let mut ctx = context(8, 20, 10);
        let mut pass = GroundPass::new(GroundConfig {
            min_height: 2,
            max_height: 50,
            ..GroundConfig::default()
        });
        let chunk = run(&mut pass, &mut ctx, 0, None);
        assert!(chunk.metadata.surface_heights.iter().all(|&h| (2..=9).contains(&h)));
    }
}
