//! # Chunk System
//!
//! The level is a strip of fixed-width chunks along the scroll axis:
//! - Generated just ahead of the player
//! - Discarded once far enough behind
//! - Immutable after generation except for runtime tile edits
//!
//! ## Layout
//!
//! Each chunk owns two matrices of identical size, indexed `[y][x]` with
//! `y = 0` at the bottom of the world:
//! - the primary matrix (ground, platforms, foreground)
//! - the background matrix (purely decorative, no collision)
//!
//! Coordinates are signed so passes can read past the edges. Reads outside
//! the matrix return [`Tile::EMPTY`]; writes outside it are dropped.

use crate::tile::Tile;

/// Surface height of a column that contains no walkable tile.
pub const NO_SURFACE: i32 = -1;

/// Per-chunk derived data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Topmost walkable row per column, or [`NO_SURFACE`].
    pub surface_heights: Vec<i32>,
    /// Surface height of column 0 as produced by the ground pass.
    pub left_edge_height: i32,
    /// Surface height of the last column as produced by the ground pass.
    /// The next chunk starts its height walk from here.
    pub right_edge_height: i32,
    /// Set once every pass has run.
    pub is_complete: bool,
    /// Set by the ground pass. Surface heights are undefined before this.
    pub ground_generated: bool,
}

/// Kind of entity a spawn pass placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    /// Hostile creature.
    Enemy,
    /// Collectible emerald.
    Emerald,
    /// Static hazard.
    Trap,
}

/// A spawn decision recorded on the chunk for the entity instantiator.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySpawn {
    /// Which pass placed it.
    pub category: EntityCategory,
    /// Name of the spawn table entry that won the roll.
    pub entry: String,
    /// World cell column.
    pub world_x: i32,
    /// World cell row.
    pub world_y: i32,
}

/// A fixed-size slice of the level.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    /// Position along the scroll axis, in chunk units.
    index: i32,
    /// Width in tiles.
    width: usize,
    /// Height in tiles.
    height: usize,
    /// Primary matrix, row-major `[y * width + x]`.
    tiles: Vec<Tile>,
    /// Background matrix, same layout as `tiles`.
    background: Vec<Tile>,
    /// Derived per-chunk data.
    pub metadata: ChunkMetadata,
    /// Entities the spawn passes decided to place.
    pub spawns: Vec<EntitySpawn>,
}

impl Chunk {
    /// Creates an empty chunk.
    #[must_use]
    pub fn new(index: i32, width: usize, height: usize) -> Self {
        Self {
            index,
            width,
            height,
            tiles: vec![Tile::EMPTY; width * height],
            background: vec![Tile::EMPTY; width * height],
            metadata: ChunkMetadata {
                surface_heights: vec![NO_SURFACE; width],
                left_edge_height: NO_SURFACE,
                right_edge_height: NO_SURFACE,
                is_complete: false,
                ground_generated: false,
            },
            spawns: Vec::new(),
        }
    }

    /// Chunk index along the scroll axis.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> i32 {
        self.index
    }

    /// Width in tiles.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// World column of a local column.
    #[inline]
    #[must_use]
    pub const fn world_x(&self, local_x: i32) -> i32 {
        self.index * self.width as i32 + local_x
    }

    /// World column of this chunk's first column.
    #[inline]
    #[must_use]
    pub const fn origin_x(&self) -> i32 {
        self.world_x(0)
    }

    /// Returns true if `(x, y)` lies inside the matrix.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if self.contains(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Gets a primary tile. Out of range reads return [`Tile::EMPTY`].
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Tile {
        self.offset(x, y).map_or(Tile::EMPTY, |i| self.tiles[i])
    }

    /// Sets a primary tile. Out of range writes are dropped.
    ///
    /// Returns true if the tile was written.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Gets a background tile. Out of range reads return [`Tile::EMPTY`].
    #[inline]
    #[must_use]
    pub fn background(&self, x: i32, y: i32) -> Tile {
        self.offset(x, y).map_or(Tile::EMPTY, |i| self.background[i])
    }

    /// Sets a background tile. Out of range writes are dropped.
    #[inline]
    pub fn set_background(&mut self, x: i32, y: i32, tile: Tile) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.background[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Cached surface height of a column.
    ///
    /// Only meaningful after the ground pass has run for this chunk.
    /// Columns outside the chunk report [`NO_SURFACE`].
    #[inline]
    #[must_use]
    pub fn surface_height(&self, x: i32) -> i32 {
        debug_assert!(
            self.metadata.ground_generated,
            "surface heights of chunk {} read before the ground pass ran",
            self.index
        );
        if x < 0 {
            return NO_SURFACE;
        }
        self.metadata
            .surface_heights
            .get(x as usize)
            .copied()
            .unwrap_or(NO_SURFACE)
    }

    /// Topmost walkable row of a column found by scanning tiles.
    ///
    /// Ignores the cache, so it is valid at any point in the pipeline.
    #[must_use]
    pub fn scan_surface_height(&self, x: i32) -> i32 {
        if x < 0 || x as usize >= self.width {
            return NO_SURFACE;
        }
        (0..self.height as i32)
            .rev()
            .find(|&y| self.get(x, y).is_walkable())
            .unwrap_or(NO_SURFACE)
    }

    /// Rescans one column into the surface cache.
    pub fn refresh_surface_height(&mut self, x: i32) {
        if x >= 0 && (x as usize) < self.width {
            self.metadata.surface_heights[x as usize] = self.scan_surface_height(x);
        }
    }

    /// Rescans every column into the surface cache.
    pub fn refresh_surface_heights(&mut self) {
        for x in 0..self.width as i32 {
            self.refresh_surface_height(x);
        }
    }

    /// Iterates `(x, y, tile)` over the primary matrix, bottom row first.
    pub fn tiles(&self) -> impl Iterator<Item = (i32, i32, Tile)> + '_ {
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            ((i % self.width) as i32, (i / self.width) as i32, *tile)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKind;

    #[test]
    fn test_out_of_range_reads_are_empty() {
        let chunk = Chunk::new(0, 8, 6);
        assert_eq!(chunk.get(-1, 0), Tile::EMPTY);
        assert_eq!(chunk.get(0, -1), Tile::EMPTY);
        assert_eq!(chunk.get(8, 0), Tile::EMPTY);
        assert_eq!(chunk.get(0, 6), Tile::EMPTY);
        assert_eq!(chunk.background(100, 100), Tile::EMPTY);
    }

    #[test]
    fn test_out_of_range_writes_are_dropped() {
        let mut chunk = Chunk::new(0, 8, 6);
        let before = chunk.clone();

        assert!(!chunk.set(-1, 2, Tile::ground()));
        assert!(!chunk.set(8, 2, Tile::ground()));
        assert!(!chunk.set_background(3, 6, Tile::backdrop()));

        assert_eq!(chunk, before);
    }

    #[test]
    fn test_primary_and_background_are_independent() {
        let mut chunk = Chunk::new(0, 4, 4);
        chunk.set_background(1, 1, Tile::backdrop());

        assert!(chunk.get(1, 1).is_empty());
        assert_eq!(chunk.background(1, 1).kind, TileKind::Solid);
    }

    #[test]
    fn test_world_x() {
        let chunk = Chunk::new(3, 20, 10);
        assert_eq!(chunk.origin_x(), 60);
        assert_eq!(chunk.world_x(5), 65);

        let negative = Chunk::new(-2, 20, 10);
        assert_eq!(negative.origin_x(), -40);
    }

    #[test]
    fn test_scan_and_refresh_surface() {
        let mut chunk = Chunk::new(0, 4, 10);
        chunk.metadata.ground_generated = true;
        for y in 0..=4 {
            chunk.set(2, y, Tile::ground());
        }
        chunk.set(2, 5, Tile::ramp_up());

        assert_eq!(chunk.scan_surface_height(2), 5);
        assert_eq!(chunk.scan_surface_height(1), NO_SURFACE);
        assert_eq!(chunk.surface_height(2), NO_SURFACE, "cache is stale until refreshed");

        chunk.refresh_surface_heights();
        assert_eq!(chunk.surface_height(2), 5);
        assert_eq!(chunk.surface_height(-1), NO_SURFACE);
        assert_eq!(chunk.surface_height(4), NO_SURFACE);
    }

    #[test]
    #[should_panic(expected = "before the ground pass")]
    fn test_surface_read_before_ground_is_caught() {
        let chunk = Chunk::new(0, 4, 4);
        let _ = chunk.surface_height(0);
    }

    #[test]
    fn test_tile_iterator_covers_matrix() {
        let mut chunk = Chunk::new(0, 3, 2);
        chunk.set(2, 1, Tile::platform());

        let all: Vec<_> = chunk.tiles().collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[5], (2, 1, Tile::platform()));
    }
}
