//! # Generation Context
//!
//! Per-session state shared by every pass:
//! - the global seed and the noise functions derived from it
//! - chunk dimensions and the grid-to-world cell scale
//! - the neighbours of the chunk being generated
//! - a typed scratch area passes use to talk to later passes
//!
//! The context outlives chunks. Neighbour references and scratch data are
//! scoped to one chunk generation by [`GenerationContext::begin_chunk`] and
//! [`GenerationContext::end_chunk`].

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chunk::Chunk;
use crate::noise::{PerlinNoise, WorldSeed};

/// Distance in noise space between two seed offsets.
///
/// Large and non-integral so offset streams never share lattice cells.
const SEED_OFFSET_STRIDE: f64 = 1013.37;

/// A run of explicit-gap columns, local and inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GapSpan {
    /// First gap column.
    pub start: i32,
    /// Last gap column.
    pub end: i32,
}

impl GapSpan {
    /// Returns true if `x` is inside the span.
    #[inline]
    #[must_use]
    pub const fn contains(self, x: i32) -> bool {
        x >= self.start && x <= self.end
    }

    /// Number of columns in the span.
    #[inline]
    #[must_use]
    pub const fn width(self) -> i32 {
        self.end - self.start + 1
    }
}

/// Cross-pass signals for the chunk currently being generated.
#[derive(Clone, Debug, Default)]
pub struct PassScratch {
    /// World cells already holding a spawned entity.
    pub occupied_cells: HashSet<(i32, i32)>,
    /// World columns reserved whole (e.g. by a trap).
    pub occupied_columns: HashSet<i32>,
    /// Gap spans cut by the gap pass.
    pub gap_spans: Vec<GapSpan>,
    /// Highest platform top row per local column, written by the platform pass.
    pub platform_tops: BTreeMap<i32, i32>,
}

impl PassScratch {
    /// Returns true if the world cell is taken by a cell or column reservation.
    #[must_use]
    pub fn is_occupied(&self, world_x: i32, world_y: i32) -> bool {
        self.occupied_columns.contains(&world_x) || self.occupied_cells.contains(&(world_x, world_y))
    }

    /// Reserves a world cell. Returns false if it was already taken.
    pub fn occupy(&mut self, world_x: i32, world_y: i32) -> bool {
        if self.is_occupied(world_x, world_y) {
            return false;
        }
        self.occupied_cells.insert((world_x, world_y))
    }

    /// Reserves a whole world column.
    pub fn occupy_column(&mut self, world_x: i32) {
        self.occupied_columns.insert(world_x);
    }

    /// Returns true if a local column lies inside a recorded gap span.
    #[must_use]
    pub fn is_gap_column(&self, local_x: i32) -> bool {
        self.gap_spans.iter().any(|span| span.contains(local_x))
    }

    fn clear(&mut self) {
        self.occupied_cells.clear();
        self.occupied_columns.clear();
        self.gap_spans.clear();
        self.platform_tops.clear();
    }
}

/// Shared per-session generation state.
#[derive(Clone)]
pub struct GenerationContext {
    /// Global seed.
    seed: WorldSeed,
    /// Noise derived from `seed`.
    noise: PerlinNoise,
    /// Chunk width in tiles.
    chunk_width: usize,
    /// Chunk height in tiles.
    chunk_height: usize,
    /// World units per tile.
    cell_size: f32,
    /// Chunk currently being generated.
    chunk_index: i32,
    /// Completed chunk at `chunk_index - 1`, if cached.
    left: Option<Arc<Chunk>>,
    /// Completed chunk at `chunk_index + 1`, if cached.
    right: Option<Arc<Chunk>>,
    /// Cross-pass signals, cleared per chunk.
    pub scratch: PassScratch,
}

impl GenerationContext {
    /// Creates a context for a world session.
    #[must_use]
    pub fn new(seed: WorldSeed, chunk_width: usize, chunk_height: usize, cell_size: f32) -> Self {
        Self {
            seed,
            noise: PerlinNoise::new(seed),
            chunk_width,
            chunk_height,
            cell_size,
            chunk_index: 0,
            left: None,
            right: None,
            scratch: PassScratch::default(),
        }
    }

    /// Global seed.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Chunk width in tiles.
    #[inline]
    #[must_use]
    pub const fn chunk_width(&self) -> usize {
        self.chunk_width
    }

    /// Chunk height in tiles.
    #[inline]
    #[must_use]
    pub const fn chunk_height(&self) -> usize {
        self.chunk_height
    }

    /// World units per tile.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Index of the chunk being generated.
    #[inline]
    #[must_use]
    pub const fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    /// Left neighbour of the chunk being generated.
    #[inline]
    #[must_use]
    pub fn left_neighbor(&self) -> Option<&Chunk> {
        self.left.as_deref()
    }

    /// Right neighbour of the chunk being generated.
    #[inline]
    #[must_use]
    pub fn right_neighbor(&self) -> Option<&Chunk> {
        self.right.as_deref()
    }

    /// Distance traveled, in world units, at a world column.
    #[inline]
    #[must_use]
    pub fn world_distance(&self, world_x: i32) -> f32 {
        world_x as f32 * self.cell_size
    }

    /// Opens the scope for one chunk generation.
    pub fn begin_chunk(&mut self, index: i32, left: Option<Arc<Chunk>>, right: Option<Arc<Chunk>>) {
        self.chunk_index = index;
        self.left = left;
        self.right = right;
        self.scratch.clear();
    }

    /// Closes the chunk scope and releases neighbour references.
    pub fn end_chunk(&mut self) {
        self.left = None;
        self.right = None;
    }

    /// Full-world reset. The seed is preserved.
    pub fn reset(&mut self) {
        self.chunk_index = 0;
        self.end_chunk();
        self.scratch.clear();
    }

    /// Deterministic RNG for one pass in the current chunk.
    ///
    /// Streams differ per `salt` and per chunk index, so a chunk's rolls
    /// never depend on how many rolls another chunk consumed.
    #[must_use]
    pub fn rng(&self, salt: u64) -> ChaCha8Rng {
        let seed = self
            .seed
            .derive(salt)
            .derive(u64::from(self.chunk_index as u32));
        ChaCha8Rng::seed_from_u64(seed.value())
    }

    /// One Perlin sample mapped to `[0, 1]`.
    #[must_use]
    pub fn noise_1d(&self, x: f64, frequency: f64, seed_offset: f64) -> f64 {
        let v = self.noise.sample_1d(x * frequency + seed_offset * SEED_OFFSET_STRIDE);
        to_unit(v)
    }

    /// Fractal (fBm) 1D noise mapped to `[0, 1]`.
    ///
    /// Persistence 0.5, lacunarity 2.
    #[must_use]
    pub fn fractal_noise_1d(&self, x: f64, frequency: f64, octaves: u32, seed_offset: f64) -> f64 {
        let v = self
            .noise
            .fbm_1d(x * frequency + seed_offset * SEED_OFFSET_STRIDE, octaves, 0.5, 2.0);
        to_unit(v)
    }

    /// Fractal (fBm) 2D noise mapped to `[0, 1]`.
    #[must_use]
    pub fn fractal_noise_2d(
        &self,
        x: f64,
        y: f64,
        frequency: f64,
        octaves: u32,
        seed_offset: f64,
    ) -> f64 {
        let shift = seed_offset * SEED_OFFSET_STRIDE;
        let v = self
            .noise
            .fbm_2d(x * frequency + shift, y * frequency + shift, octaves, 0.5, 2.0);
        to_unit(v)
    }
}

impl std::fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationContext")
            .field("seed", &self.seed)
            .field("chunk_width", &self.chunk_width)
            .field("chunk_height", &self.chunk_height)
            .field("cell_size", &self.cell_size)
            .field("chunk_index", &self.chunk_index)
            .field("has_left", &self.left.is_some())
            .field("has_right", &self.right.is_some())
            .finish_non_exhaustive()
    }
}

#[inline]
fn to_unit(v: f64) -> f64 {
    ((v + 1.0) * 0.5).clamp(0.0, 1.0)
}
