//! # ASCII Renderer
//!
//! Renders chunks as rows of characters, top row first.
//!
//! ```text
//! #  ground      =  platform   /  ramp up    \  ramp down
//! :  backdrop    .  air        E  enemy      *  emerald    ^  trap
//! ```
//!
//! Gap columns show their backdrop (`:`) down to the pit floor.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use emberfall_terrain::{Chunk, ChunkRenderer, EntityCategory, TileKind};
use tracing::debug;

/// Glyph for one cell.
fn glyph(chunk: &Chunk, x: i32, y: i32, spawns: &HashMap<(i32, i32), EntityCategory>) -> char {
    if let Some(category) = spawns.get(&(chunk.world_x(x), y)) {
        return match category {
            EntityCategory::Enemy => 'E',
            EntityCategory::Emerald => '*',
            EntityCategory::Trap => '^',
        };
    }
    match chunk.get(x, y).kind {
        TileKind::Solid => '#',
        TileKind::PlatformSolid => '=',
        TileKind::RampUp => '/',
        TileKind::RampDown => '\\',
        TileKind::Empty | TileKind::ExplicitGap => {
            if chunk.background(x, y).is_empty() {
                '.'
            } else {
                ':'
            }
        }
    }
}

/// Renders a chunk as newline-separated rows, top row first.
#[must_use]
pub fn render_chunk(chunk: &Chunk) -> String {
    let spawns: HashMap<(i32, i32), EntityCategory> = chunk
        .spawns
        .iter()
        .map(|s| ((s.world_x, s.world_y), s.category))
        .collect();

    let width = chunk.width() as i32;
    let mut out = String::with_capacity((chunk.width() + 1) * chunk.height());
    for y in (0..chunk.height() as i32).rev() {
        out.extend((0..width).map(|x| glyph(chunk, x, y, &spawns)));
        out.push('\n');
    }
    out
}

/// Counters shared between a renderer and whoever installed it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderCounters {
    /// Chunks drawn.
    pub drawn: u64,
    /// Chunks released.
    pub released: u64,
    /// Single-cell refreshes.
    pub cell_refreshes: u64,
    /// Collision rebuilds.
    pub collision_rebuilds: u64,
}

/// Writes every ready chunk to a sink as ASCII.
pub struct AsciiRenderer<W: Write + Send> {
    out: W,
    counters: Arc<Mutex<RenderCounters>>,
}

impl<W: Write + Send> AsciiRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            counters: Arc::new(Mutex::new(RenderCounters::default())),
        }
    }

    /// Handle to the counters, readable after the renderer is boxed away.
    #[must_use]
    pub fn counters(&self) -> Arc<Mutex<RenderCounters>> {
        Arc::clone(&self.counters)
    }

    fn bump(&self, update: impl FnOnce(&mut RenderCounters)) {
        if let Ok(mut counters) = self.counters.lock() {
            update(&mut counters);
        }
    }
}

impl<W: Write + Send> ChunkRenderer for AsciiRenderer<W> {
    fn chunk_ready(&mut self, chunk: &Chunk) {
        let header = format!(
            "--- chunk {} (x {}..{}) spawns {} ---\n",
            chunk.index(),
            chunk.origin_x(),
            chunk.origin_x() + chunk.width() as i32 - 1,
            chunk.spawns.len()
        );
        let body = render_chunk(chunk);
        if let Err(err) = self.out.write_all(header.as_bytes()).and_then(|()| self.out.write_all(body.as_bytes())) {
            debug!(%err, chunk = chunk.index(), "failed to draw chunk");
        }
        self.bump(|c| c.drawn += 1);
    }

    fn chunk_cleared(&mut self, _index: i32) {
        self.bump(|c| c.released += 1);
    }

    fn refresh_cell(&mut self, _chunk: &Chunk, _local_x: i32, _local_y: i32) {
        self.bump(|c| c.cell_refreshes += 1);
    }

    fn refresh_collision(&mut self, _chunk: &Chunk) {
        self.bump(|c| c.collision_rebuilds += 1);
    }
}
