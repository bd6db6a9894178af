//! # Cave Pass
//!
//! Carves tunnels out of the ground mass with 2D fractal noise, then prunes
//! every pocket the player could never reach.
//!
//! ## Carve band
//!
//! Per column, rows `bottom_margin..=surface - crust_thickness`. The crust
//! keeps the surface row and the rows right under it intact, so carving
//! never moves a column's surface height. Protected tiles are never carved.
//!
//! ## Pruning
//!
//! A 4-directional flood fill over carved cells starts from:
//! - the topmost band cell of each column (the surface entrance)
//! - carved cells on the right chunk edge
//! - carved cells on the left chunk edge, when the left neighbour is
//!   missing or open at the bordering cell
//! - carved cells beside open air outside the band, such as the side wall
//!   of a lower neighbouring column or of a gap column
//!
//! Carved cells the fill does not reach are restored to their original
//! tile. A right-edge opening later sealed by the next chunk is accepted;
//! finished chunks are never revisited.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::Pass;
use crate::tile::{Tile, TileKind, TileLayer};

/// Cave pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Noise frequency per tile.
    pub frequency: f64,
    /// fBm octaves.
    pub octaves: u32,
    /// Independent noise stream for this pass.
    pub seed_offset: f64,
    /// Cells scoring below this (in `[0, 1]`) are carved.
    pub threshold: f64,
    /// Rows kept solid at the top of each column, surface included.
    pub crust_thickness: i32,
    /// Rows kept solid at the bottom of the world.
    pub bottom_margin: i32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: 0.12,
            octaves: 3,
            seed_offset: 7.0,
            threshold: 0.32,
            crust_thickness: 2,
            bottom_margin: 1,
        }
    }
}

/// Noise carving with connectivity pruning. Stateless across chunks.
#[derive(Clone, Debug, Default)]
pub struct CavePass {
    /// Parameters.
    config: CaveConfig,
}

/// Cells carved in one chunk, with the tiles they replaced.
struct Carving {
    width: i32,
    /// Row-major carved mask.
    mask: Vec<bool>,
    /// Top band row per column, or [`NO_SURFACE`] for columns without a band.
    ceilings: Vec<i32>,
    /// Original tiles, restored for unreachable cells.
    originals: Vec<(i32, i32, Tile)>,
}

impl Carving {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width: width as i32,
            mask: vec![false; width * height],
            ceilings: vec![NO_SURFACE; width],
            originals: Vec::new(),
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn is_carved(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && self.mask.get(self.index(x, y)).copied().unwrap_or(false)
    }

    fn carve(&mut self, chunk: &mut Chunk, x: i32, y: i32) {
        let i = self.index(x, y);
        self.mask[i] = true;
        self.originals.push((x, y, chunk.get(x, y)));
        chunk.set(x, y, Tile::EMPTY);
    }
}

impl CavePass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: CaveConfig) -> Self {
        Self { config }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Top band row of a column, or [`NO_SURFACE`] when it has no band.
    #[must_use]
    pub fn band_ceiling(&self, surface: i32) -> i32 {
        if surface == NO_SURFACE {
            return NO_SURFACE;
        }
        let ceiling = surface - self.config.crust_thickness.max(1);
        if ceiling < self.config.bottom_margin.max(0) {
            NO_SURFACE
        } else {
            ceiling
        }
    }

    fn carve(&self, chunk: &mut Chunk, ctx: &GenerationContext) -> Carving {
        let cfg = &self.config;
        let mut carving = Carving::new(chunk.width(), chunk.height());

        for x in 0..chunk.width() as i32 {
            if ctx.scratch.is_gap_column(x) {
                continue;
            }
            let ceiling = self.band_ceiling(chunk.surface_height(x));
            carving.ceilings[x as usize] = ceiling;
            if ceiling == NO_SURFACE {
                continue;
            }

            let world_x = f64::from(chunk.world_x(x));
            for y in cfg.bottom_margin.max(0)..=ceiling {
                let tile = chunk.get(x, y);
                if tile.kind != TileKind::Solid || tile.layer != TileLayer::Ground || tile.is_protected() {
                    continue;
                }
                let n = ctx.fractal_noise_2d(world_x, f64::from(y), cfg.frequency, cfg.octaves, cfg.seed_offset);
                if n < cfg.threshold {
                    carving.carve(chunk, x, y);
                }
            }
        }

        carving
    }
}

/// Returns true if a carved left-edge cell opens into the left neighbour.
fn left_edge_is_exit(ctx: &GenerationContext, y: i32) -> bool {
    ctx.left_neighbor()
        .map_or(true, |left| left.get(left.width() as i32 - 1, y).is_empty())
}

/// Returns true if a carved cell touches empty space the carve did not make.
fn opens_to_air(chunk: &Chunk, carving: &Carving, x: i32, y: i32) -> bool {
    let (width, height) = (carving.width, chunk.height() as i32);
    [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
        .into_iter()
        .filter(|&(nx, ny)| nx >= 0 && nx < width && ny >= 0 && ny < height)
        .any(|(nx, ny)| !carving.is_carved(nx, ny) && chunk.get(nx, ny).is_empty())
}

/// Restores every carved cell the flood fill cannot reach. Returns the
/// number of restored cells.
fn prune(chunk: &mut Chunk, ctx: &GenerationContext, carving: &Carving) -> usize {
    let width = carving.width;
    let mut reached = vec![false; carving.mask.len()];
    let mut queue = VecDeque::new();

    let seed = |x: i32, y: i32, reached: &mut [bool], queue: &mut VecDeque<(i32, i32)>| {
        if carving.is_carved(x, y) {
            let i = carving.index(x, y);
            if !reached[i] {
                reached[i] = true;
                queue.push_back((x, y));
            }
        }
    };

    for x in 0..width {
        let ceiling = carving.ceilings[x as usize];
        if ceiling != NO_SURFACE {
            seed(x, ceiling, &mut reached, &mut queue);
        }
    }
    for y in 0..chunk.height() as i32 {
        seed(width - 1, y, &mut reached, &mut queue);
        if left_edge_is_exit(ctx, y) {
            seed(0, y, &mut reached, &mut queue);
        }
    }
    for &(x, y, _) in &carving.originals {
        if opens_to_air(chunk, carving, x, y) {
            seed(x, y, &mut reached, &mut queue);
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
            seed(nx, ny, &mut reached, &mut queue);
        }
    }

    let mut restored = 0;
    for &(x, y, original) in &carving.originals {
        if !reached[carving.index(x, y)] {
            chunk.set(x, y, original);
            restored += 1;
        }
    }
    restored
}

impl Pass for CavePass {
    fn name(&self) -> &'static str {
        "cave"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        let carving = self.carve(chunk, ctx);
        let carved = carving.originals.len();
        let restored = prune(chunk, ctx, &carving);
        trace!(chunk = chunk.index(), carved, restored, "caves carved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::{chunk_with_heights, context};
    use crate::passes::{GroundConfig, GroundPass};
    use std::sync::Arc;

    /// Chunk with a flat surface at row 10 and a hand-made carving.
    fn hand_carved(cells: &[(i32, i32)]) -> (Chunk, Carving) {
        let mut chunk = chunk_with_heights(0, &[10; 8], 14);
        let pass = CavePass::new(CaveConfig::default());
        let mut carving = Carving::new(8, 14);
        for x in 0..8 {
            carving.ceilings[x] = pass.band_ceiling(10);
        }
        for &(x, y) in cells {
            carving.carve(&mut chunk, x, y);
        }
        (chunk, carving)
    }

    fn reachable_from_exits(chunk: &Chunk, ctx: &GenerationContext, pass: &CavePass) -> bool {
        let width = chunk.width() as i32;
        let height = chunk.height() as i32;
        let in_band = |x: i32, y: i32| {
            let ceiling = pass.band_ceiling(chunk.surface_height(x));
            ceiling != NO_SURFACE && y >= pass.config.bottom_margin && y <= ceiling
        };
        let open = |x: i32, y: i32| x >= 0 && x < width && in_band(x, y) && chunk.get(x, y).is_empty();

        let mut reached = vec![false; (width * height) as usize];
        let mut queue = VecDeque::new();
        for x in 0..width {
            for y in 0..height {
                let entrance = in_band(x, y) && y == pass.band_ceiling(chunk.surface_height(x));
                let edge = x == width - 1 || (x == 0 && left_edge_is_exit(ctx, y));
                let side = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)].into_iter().any(|(nx, ny)| {
                    nx >= 0 && nx < width && ny >= 0 && ny < height && !in_band(nx, ny) && chunk.get(nx, ny).is_empty()
                });
                if open(x, y) && (entrance || edge || side) {
                    reached[(y * width + x) as usize] = true;
                    queue.push_back((x, y));
                }
            }
        }
        while let Some((x, y)) = queue.pop_front() {
            for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                if open(nx, ny) && !reached[(ny * width + nx) as usize] {
                    reached[(ny * width + nx) as usize] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        (0..width).all(|x| (0..height).all(|y| !open(x, y) || reached[(y * width + x) as usize]))
    }

    #[test]
    fn test_isolated_pocket_is_restored() {
        let (mut chunk, carving) = hand_carved(&[(3, 4), (4, 4), (3, 5)]);
        let ctx = context(1, 8, 14);

        assert_eq!(prune(&mut chunk, &ctx, &carving), 3);
        assert!(chunk.get(3, 4).is_solid());
        assert!(chunk.get(3, 5).is_solid());
    }

    #[test]
    fn test_tunnel_from_entrance_survives() {
        // ceiling is row 8; a shaft down from it plus a side tunnel
        let (mut chunk, carving) = hand_carved(&[(4, 8), (4, 7), (4, 6), (5, 6), (6, 6)]);
        let ctx = context(1, 8, 14);

        assert_eq!(prune(&mut chunk, &ctx, &carving), 0);
        assert!(chunk.get(6, 6).is_empty());
    }

    #[test]
    fn test_right_edge_is_always_an_exit() {
        let (mut chunk, carving) = hand_carved(&[(7, 3), (6, 3)]);
        let ctx = context(1, 8, 14);

        assert_eq!(prune(&mut chunk, &ctx, &carving), 0);
    }

    #[test]
    fn test_left_edge_exit_depends_on_neighbour() {
        let (mut open_world, carving) = hand_carved(&[(0, 3), (1, 3)]);
        let ctx = context(1, 8, 14);
        assert_eq!(prune(&mut open_world, &ctx, &carving), 0, "no neighbour: edge is an exit");

        let mut sealed_ctx = context(1, 8, 14);
        sealed_ctx.begin_chunk(1, Some(Arc::new(chunk_with_heights(0, &[10; 8], 14))), None);
        let (mut sealed, carving) = hand_carved(&[(0, 3), (1, 3)]);
        assert_eq!(prune(&mut sealed, &sealed_ctx, &carving), 2, "solid neighbour seals the edge");

        let mut neighbour = chunk_with_heights(0, &[10; 8], 14);
        neighbour.set(7, 3, Tile::EMPTY);
        let mut open_ctx = context(1, 8, 14);
        open_ctx.begin_chunk(1, Some(Arc::new(neighbour)), None);
        let (mut joined, carving) = hand_carved(&[(0, 3), (1, 3)]);
        assert_eq!(prune(&mut joined, &open_ctx, &carving), 0, "open neighbour cell joins the tunnel");
    }

    #[test]
    fn test_pocket_beside_lower_column_survives() {
        // column 5 drops to row 3, leaving air beside column 4 from row 4 up
        let mut chunk = chunk_with_heights(0, &[10, 10, 10, 10, 10, 3, 10, 10], 14);
        let pass = CavePass::new(CaveConfig::default());
        let mut carving = Carving::new(8, 14);
        for x in 0..8 {
            carving.ceilings[x] = pass.band_ceiling(chunk.surface_height(x as i32));
        }
        for (x, y) in [(3, 5), (4, 5)] {
            carving.carve(&mut chunk, x, y);
        }
        let ctx = context(1, 8, 14);

        assert_eq!(prune(&mut chunk, &ctx, &carving), 0);
        assert!(chunk.get(3, 5).is_empty());
        assert!(reachable_from_exits(&chunk, &ctx, &pass));
    }

    #[test]
    fn test_pocket_beside_gap_column_survives() {
        let mut chunk = chunk_with_heights(0, &[10; 8], 14);
        for y in 0..14 {
            chunk.set(2, y, Tile::EMPTY);
        }
        let (_, mut carving) = hand_carved(&[]);
        carving.ceilings[2] = NO_SURFACE;
        for (x, y) in [(3, 4), (4, 4)] {
            carving.carve(&mut chunk, x, y);
        }
        let ctx = context(1, 8, 14);

        assert_eq!(prune(&mut chunk, &ctx, &carving), 0);
        assert!(chunk.get(4, 4).is_empty());
    }

    #[test]
    fn test_surface_and_protected_rows_untouched() {
        let ground = GroundConfig {
            protected_rows: 1,
            ..GroundConfig::default()
        };
        let mut pass = CavePass::new(CaveConfig {
            threshold: 1.1,
            ..CaveConfig::default()
        });

        let mut ctx = context(42, 20, 25);
        let mut chunk = Chunk::new(0, 20, 25);
        GroundPass::new(ground).execute(&mut chunk, &mut ctx);
        let surfaces = chunk.metadata.surface_heights.clone();
        pass.execute(&mut chunk, &mut ctx);

        for x in 0..20 {
            let surface = surfaces[x as usize];
            assert_eq!(chunk.scan_surface_height(x), surface);
            assert!(chunk.get(x, 0).is_solid(), "protected row carved at column {x}");
            for y in (surface - 1).max(0)..=surface {
                assert!(chunk.get(x, y).is_solid(), "crust carved at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_zero_threshold_carves_nothing() {
        let mut ctx = context(5, 20, 25);
        let mut chunk = Chunk::new(0, 20, 25);
        GroundPass::new(GroundConfig::default()).execute(&mut chunk, &mut ctx);
        let before = chunk.clone();

        let mut pass = CavePass::new(CaveConfig {
            threshold: 0.0,
            ..CaveConfig::default()
        });
        pass.execute(&mut chunk, &mut ctx);

        assert_eq!(chunk, before);
    }

    #[test]
    fn test_every_cave_cell_is_reachable() {
        let ground = GroundConfig {
            min_height: 8,
            max_height: 20,
            base_height: 14,
            ..GroundConfig::default()
        };
        let mut pass = CavePass::new(CaveConfig {
            threshold: 0.55,
            ..CaveConfig::default()
        });

        for seed in [1_u64, 42, 777, 9001] {
            let mut ground_pass = GroundPass::new(ground.clone());
            let mut left: Option<Arc<Chunk>> = None;
            for index in 0..4 {
                let mut ctx = context(seed, 20, 25);
                ctx.begin_chunk(index, left.clone(), None);
                let mut chunk = Chunk::new(index, 20, 25);
                ground_pass.execute(&mut chunk, &mut ctx);
                pass.execute(&mut chunk, &mut ctx);

                assert!(
                    reachable_from_exits(&chunk, &ctx, &pass),
                    "unreachable pocket in chunk {index} for seed {seed}"
                );
                left = Some(Arc::new(chunk));
            }
        }
    }
}
