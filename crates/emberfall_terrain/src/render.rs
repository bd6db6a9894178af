//! # Renderer Interface
//!
//! The streamer's only view of whatever turns tiles into visuals and
//! colliders. A renderer is optional; without one the streamer still
//! generates, caches and edits chunks.

use crate::chunk::Chunk;

/// Consumer of finished chunks and runtime edits.
pub trait ChunkRenderer: Send {
    /// A chunk finished generation and entered the cache.
    fn chunk_ready(&mut self, chunk: &Chunk);

    /// A chunk left the cache. Its visuals should be released.
    fn chunk_cleared(&mut self, index: i32);

    /// One cell of a cached chunk changed after generation.
    fn refresh_cell(&mut self, chunk: &Chunk, local_x: i32, local_y: i32);

    /// Collision for a chunk must be rebuilt after an edit.
    fn refresh_collision(&mut self, chunk: &Chunk);
}
