//! # Terrain Streamer
//!
//! Keeps a window of generated chunks around the player.
//!
//! ## Lifecycle
//!
//! ```text
//! Ungenerated -> Generating -> Complete (cached) -> Cleared
//! ```
//!
//! Each [`TerrainStreamer::tick`]:
//! 1. Runs a pending debounced regeneration once its countdown expires.
//! 2. Generates chunks from the rightmost generated index up to
//!    `player_chunk + ahead_chunks`, strictly in increasing order and at
//!    most `max_chunks_per_tick` of them.
//! 3. Discards cached chunks below `player_chunk - behind_chunks`, leftmost
//!    first.
//!
//! Chunk `i` is always generated with chunk `i - 1` (and `i + 1`, if
//! cached) as its neighbours.
//!
//! ## Runtime Edits
//!
//! [`TerrainStreamer::update_tile`] is the only way to change a finished
//! chunk. Damage and explosions go through [`TerrainStreamer::damage_tile`]
//! and [`TerrainStreamer::explode`], which destroy tiles via the same path.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::chunk::{Chunk, NO_SURFACE};
use crate::config::{TerrainConfig, WorldConfig};
use crate::context::GenerationContext;
use crate::error::{TerrainError, TerrainResult};
use crate::health::{DamageOutcome, HealthTable, TileHealthRegistry};
use crate::noise::WorldSeed;
use crate::pipeline::TerrainPipeline;
use crate::render::ChunkRenderer;
use crate::tile::{Tile, TileFlags};

/// Where a chunk index is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Never generated this session.
    Ungenerated,
    /// Passes are running.
    Generating,
    /// Generated and cached.
    Complete,
    /// Generated, then discarded.
    Cleared,
}

/// Streaming counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Chunks generated since the streamer was created.
    pub generated_this_session: u64,
    /// Chunks discarded since the streamer was created.
    pub cleared_this_session: u64,
    /// Chunks currently cached.
    pub cached_chunks: usize,
    /// Chunks generated by the last tick.
    pub generated_last_tick: usize,
    /// Full regenerations performed.
    pub regenerations: u64,
}

/// Debug view of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileInfo {
    /// Primary tile.
    pub tile: Tile,
    /// Background tile.
    pub background: Tile,
    /// Chunk holding the cell.
    pub chunk_index: i32,
    /// Column inside the chunk.
    pub local_x: i32,
    /// Row inside the chunk.
    pub local_y: i32,
    /// Surface height of the column, or [`NO_SURFACE`].
    pub surface_height: i32,
    /// Whether the backdrop covers the cell.
    pub background_filled: bool,
}

/// Streams chunks around the player.
pub struct TerrainStreamer {
    world: WorldConfig,
    ctx: GenerationContext,
    pipeline: TerrainPipeline,
    chunks: BTreeMap<i32, Arc<Chunk>>,
    /// First index generated this session.
    first_index: Option<i32>,
    /// Next index to generate.
    next_index: Option<i32>,
    /// Index whose passes are running.
    generating: Option<i32>,
    renderer: Option<Box<dyn ChunkRenderer>>,
    health: TileHealthRegistry,
    /// Ticks left before a requested regeneration runs.
    regenerate_in: Option<u32>,
    /// Player position from the last tick, in world units.
    player_x: f32,
    stats: StreamStats,
}

impl TerrainStreamer {
    /// Creates a streamer from a validated config.
    ///
    /// A seed of `0` is replaced by a random one.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the config is rejected.
    pub fn new(config: &TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;
        let seed = WorldSeed::from_config(config.world.seed);
        let pipeline = config.build_pipeline()?;
        Ok(Self::with_pipeline(config.world.clone(), seed, pipeline))
    }

    /// Creates a streamer around an already built pipeline.
    #[must_use]
    pub fn with_pipeline(world: WorldConfig, seed: WorldSeed, pipeline: TerrainPipeline) -> Self {
        let ctx = GenerationContext::new(seed, world.chunk_width, world.chunk_height, world.cell_size);
        info!(
            seed = seed.value(),
            width = world.chunk_width,
            height = world.chunk_height,
            passes = ?pipeline.pass_names(),
            "terrain streamer ready"
        );
        Self {
            world,
            ctx,
            pipeline,
            chunks: BTreeMap::new(),
            first_index: None,
            next_index: None,
            generating: None,
            renderer: None,
            health: TileHealthRegistry::new(HealthTable::default()),
            regenerate_in: None,
            player_x: 0.0,
            stats: StreamStats::default(),
        }
    }

    /// Global seed of this session.
    #[must_use]
    pub fn seed(&self) -> WorldSeed {
        self.ctx.seed()
    }

    /// World parameters.
    #[must_use]
    pub fn world(&self) -> &WorldConfig {
        &self.world
    }

    /// Attaches a renderer. Already cached chunks are announced to it.
    pub fn set_renderer(&mut self, mut renderer: Box<dyn ChunkRenderer>) {
        for chunk in self.chunks.values() {
            renderer.chunk_ready(chunk);
        }
        self.renderer = Some(renderer);
    }

    /// Detaches and returns the renderer.
    pub fn take_renderer(&mut self) -> Option<Box<dyn ChunkRenderer>> {
        self.renderer.take()
    }

    /// Replaces the tile health table.
    pub fn set_health_table(&mut self, table: HealthTable) {
        self.health = TileHealthRegistry::new(table);
    }

    /// Runtime damage records.
    #[must_use]
    pub fn health(&self) -> &TileHealthRegistry {
        &self.health
    }

    /// Chunk index containing a world-unit position.
    #[must_use]
    pub fn chunk_index_at(&self, world_x: f32) -> i32 {
        let cell = (world_x / self.world.cell_size).floor() as i32;
        cell.div_euclid(self.chunk_width())
    }

    fn chunk_width(&self) -> i32 {
        self.world.chunk_width as i32
    }

    /// Splits a world cell column into `(chunk index, local column)`.
    fn split(&self, world_x: i32) -> (i32, i32) {
        let width = self.chunk_width();
        (world_x.div_euclid(width), world_x.rem_euclid(width))
    }

    /// Advances streaming for a player at `player_x` world units.
    ///
    /// Returns the number of chunks generated.
    pub fn tick(&mut self, player_x: f32) -> usize {
        self.player_x = player_x;

        if let Some(ticks) = self.regenerate_in {
            if ticks == 0 {
                self.regenerate_in = None;
                self.regenerate_all();
            } else {
                self.regenerate_in = Some(ticks - 1);
            }
        }

        let player_chunk = self.chunk_index_at(player_x);
        let budget = match self.world.max_chunks_per_tick {
            0 => usize::MAX,
            n => n,
        };
        let generated = self.generate_up_to(player_chunk + self.world.ahead_chunks, player_chunk, budget);
        self.evict_below(player_chunk - self.world.behind_chunks);

        self.stats.generated_last_tick = generated;
        self.stats.cached_chunks = self.chunks.len();
        generated
    }

    /// Generates in order until `target` is cached or `budget` runs out.
    fn generate_up_to(&mut self, target: i32, player_chunk: i32, budget: usize) -> usize {
        let mut next = self
            .next_index
            .unwrap_or_else(|| (player_chunk - self.world.behind_chunks).max(0));
        let mut generated = 0;
        while next <= target && generated < budget {
            self.generate_chunk(next);
            next += 1;
            generated += 1;
        }
        generated
    }

    #[instrument(skip(self))]
    fn generate_chunk(&mut self, index: i32) {
        if let Some(expected) = self.next_index {
            debug_assert_eq!(index, expected, "chunks must be generated in increasing index order");
        }

        let left = self.chunks.get(&(index - 1)).cloned();
        let right = self.chunks.get(&(index + 1)).cloned();

        self.generating = Some(index);
        let chunk = Arc::new(self.pipeline.generate(&mut self.ctx, index, left, right));
        self.generating = None;

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.chunk_ready(&chunk);
        }
        self.chunks.insert(index, chunk);
        self.first_index.get_or_insert(index);
        self.next_index = Some(index + 1);
        self.stats.generated_this_session += 1;
    }

    /// Discards cached chunks below `min_index`, leftmost first.
    fn evict_below(&mut self, min_index: i32) {
        while let Some((&index, _)) = self.chunks.first_key_value() {
            if index >= min_index {
                break;
            }
            self.chunks.remove(&index);
            let origin = index * self.chunk_width();
            self.health.clear_columns(origin, origin + self.chunk_width());
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.chunk_cleared(index);
            }
            self.stats.cleared_this_session += 1;
            debug!(chunk = index, "chunk cleared");
        }
    }

    /// Clears everything and regenerates the window around the last
    /// player position. The seed is kept. Ignores the per-tick budget.
    pub fn regenerate_all(&mut self) {
        let indices: Vec<i32> = self.chunks.keys().copied().collect();
        self.chunks.clear();
        if let Some(renderer) = self.renderer.as_mut() {
            for index in indices {
                renderer.chunk_cleared(index);
            }
        }

        self.health.clear();
        self.pipeline.reset();
        self.ctx.reset();
        self.first_index = None;
        self.next_index = None;
        self.regenerate_in = None;
        self.stats.regenerations += 1;

        let player_chunk = self.chunk_index_at(self.player_x);
        let generated = self.generate_up_to(player_chunk + self.world.ahead_chunks, player_chunk, usize::MAX);
        self.stats.cached_chunks = self.chunks.len();
        info!(seed = self.seed().value(), generated, "terrain regenerated");
    }

    /// Schedules a regeneration `regenerate_debounce_ticks` ticks from now.
    /// Repeated requests restart the countdown.
    pub fn request_regeneration(&mut self) {
        self.regenerate_in = Some(self.world.regenerate_debounce_ticks);
        trace!(ticks = self.world.regenerate_debounce_ticks, "regeneration requested");
    }

    /// Returns true if a debounced regeneration is pending.
    #[must_use]
    pub fn regeneration_pending(&self) -> bool {
        self.regenerate_in.is_some()
    }

    /// Enables or disables a pass by name. Returns false if no such pass.
    ///
    /// Takes effect for chunks generated afterwards; pair with
    /// [`Self::request_regeneration`] to see it everywhere.
    pub fn set_pass_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let found = self.pipeline.set_enabled(name, enabled);
        if found {
            info!(pass = name, enabled, "pass toggled");
        }
        found
    }

    /// The pass pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &TerrainPipeline {
        &self.pipeline
    }

    /// Lifecycle state of a chunk index.
    #[must_use]
    pub fn chunk_state(&self, index: i32) -> ChunkState {
        if self.generating == Some(index) {
            return ChunkState::Generating;
        }
        if self.chunks.contains_key(&index) {
            return ChunkState::Complete;
        }
        match (self.first_index, self.next_index) {
            (Some(first), Some(next)) if index >= first && index < next => ChunkState::Cleared,
            _ => ChunkState::Ungenerated,
        }
    }

    /// Cached chunk by index.
    #[must_use]
    pub fn chunk(&self, index: i32) -> Option<&Chunk> {
        self.chunks.get(&index).map(AsRef::as_ref)
    }

    /// Cached chunk indices, ascending.
    pub fn loaded_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.chunks.keys().copied()
    }

    /// Number of cached chunks.
    #[must_use]
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Streaming counters.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Primary tile at a world cell, if its chunk is cached.
    #[must_use]
    pub fn tile_at(&self, world_x: i32, world_y: i32) -> Option<Tile> {
        let (index, local) = self.split(world_x);
        self.chunks.get(&index).map(|chunk| chunk.get(local, world_y))
    }

    /// Surface height of a world cell column, if cached and not empty.
    #[must_use]
    pub fn surface_height_at_world_x(&self, world_x: i32) -> Option<i32> {
        let (index, local) = self.split(world_x);
        let height = column_surface(self.chunks.get(&index)?, local);
        (height != NO_SURFACE).then_some(height)
    }

    /// Debug view of the cell at a world-unit position.
    #[must_use]
    pub fn tile_info_at(&self, world_x: f32, world_y: f32) -> Option<TileInfo> {
        let cell_x = (world_x / self.world.cell_size).floor() as i32;
        let cell_y = (world_y / self.world.cell_size).floor() as i32;
        let (index, local_x) = self.split(cell_x);
        let chunk = self.chunks.get(&index)?;
        if !chunk.contains(local_x, cell_y) {
            return None;
        }

        let background = chunk.background(local_x, cell_y);
        Some(TileInfo {
            tile: chunk.get(local_x, cell_y),
            background,
            chunk_index: index,
            local_x,
            local_y: cell_y,
            surface_height: column_surface(chunk, local_x),
            background_filled: !background.is_empty(),
        })
    }

    /// Writes a tile into a cached chunk at a world cell.
    ///
    /// The tile is marked modified, the column's surface height is
    /// refreshed when walkability changes, and the renderer resyncs the
    /// cell and the chunk's collision. Returns false if the row is outside
    /// the chunk (the write is dropped).
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ChunkNotLoaded`] if the chunk is not cached.
    pub fn update_tile(&mut self, world_x: i32, world_y: i32, tile: Tile) -> TerrainResult<bool> {
        let (index, local) = self.split(world_x);
        let slot = self.chunks.get_mut(&index).ok_or(TerrainError::ChunkNotLoaded(index))?;
        if !slot.contains(local, world_y) {
            return Ok(false);
        }

        let chunk = Arc::make_mut(slot);
        let old = chunk.get(local, world_y);
        chunk.set(local, world_y, tile.with_flags(TileFlags::MODIFIED));
        if old.is_walkable() != tile.is_walkable() {
            chunk.refresh_surface_height(local);
        }

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.refresh_cell(chunk, local, world_y);
            renderer.refresh_collision(chunk);
        }
        trace!(chunk = index, x = local, y = world_y, "tile updated");
        Ok(true)
    }

    /// Damages the tile at a world cell, destroying it at zero health.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ChunkNotLoaded`] if the chunk is not cached.
    pub fn damage_tile(&mut self, world_x: i32, world_y: i32, amount: u32) -> TerrainResult<DamageOutcome> {
        let (index, _) = self.split(world_x);
        let tile = self.tile_at(world_x, world_y).ok_or(TerrainError::ChunkNotLoaded(index))?;

        let outcome = self.health.apply(world_x, world_y, tile, amount);
        if outcome == DamageOutcome::Destroyed {
            self.update_tile(world_x, world_y, Tile::EMPTY)?;
        }
        Ok(outcome)
    }

    /// Damages every cell within `radius` of a world cell. Cells in
    /// uncached chunks are skipped. Returns the destroyed cells.
    pub fn explode(&mut self, center_x: i32, center_y: i32, radius: i32, damage: u32) -> Vec<(i32, i32)> {
        let radius = radius.max(0);
        let mut destroyed = Vec::new();
        for y in center_y - radius..=center_y + radius {
            for x in center_x - radius..=center_x + radius {
                let (dx, dy) = (x - center_x, y - center_y);
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                if let Ok(DamageOutcome::Destroyed) = self.damage_tile(x, y, damage) {
                    destroyed.push((x, y));
                }
            }
        }
        debug!(x = center_x, y = center_y, radius, destroyed = destroyed.len(), "explosion");
        destroyed
    }
}

/// Cached surface height, or [`NO_SURFACE`] for chunks the ground pass skipped.
fn column_surface(chunk: &Chunk, local_x: i32) -> i32 {
    if chunk.metadata.ground_generated {
        chunk.surface_height(local_x)
    } else {
        NO_SURFACE
    }
}

impl std::fmt::Debug for TerrainStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainStreamer")
            .field("seed", &self.seed())
            .field("cached", &self.chunks.keys().collect::<Vec<_>>())
            .field("next_index", &self.next_index)
            .field("has_renderer", &self.renderer.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
