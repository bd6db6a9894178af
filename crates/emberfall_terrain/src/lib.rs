//! # EMBERFALL Terrain
//!
//! Streaming, seed-deterministic level generation for a 2D side-scroller.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and the same generation order always
//!    produce the same chunks
//! 2. **Chunked**: The world is a row of fixed-width tile matrices
//! 3. **Streamable**: Chunks are generated ahead of the player and
//!    discarded behind, strictly left to right
//! 4. **Composable**: Every feature is an independently switchable pass
//!
//! ## Core Components
//!
//! - `Tile` / `Chunk`: Tile model, matrices and surface metadata
//! - `PerlinNoise`: Seeded 1D/2D gradient noise
//! - `GenerationContext`: Seed, noise, neighbours and per-chunk scratch
//! - `Pass` / `TerrainPipeline`: Ordered generation passes
//! - `SpawnCurve`: Distance-based spawn weights
//! - `TerrainStreamer`: Chunk lifecycle around the player
//! - `TerrainConfig`: TOML configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use emberfall_terrain::{TerrainConfig, TerrainStreamer};
//!
//! let mut config = TerrainConfig::default();
//! config.world.seed = 42;
//! let mut streamer = TerrainStreamer::new(&config)?;
//!
//! // Player at x = 10 world units
//! streamer.tick(10.0);
//!
//! // First column starts at the base height
//! assert_eq!(streamer.surface_height_at_world_x(0), Some(3));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod chunk;
pub mod config;
pub mod context;
pub mod distribution;
pub mod error;
pub mod health;
pub mod noise;
pub mod pass;
pub mod passes;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod stream;
pub mod tile;

pub use chunk::{Chunk, ChunkMetadata, EntityCategory, EntitySpawn, NO_SURFACE};
pub use config::{PassConfig, TerrainConfig, WorldConfig};
pub use context::{GapSpan, GenerationContext, PassScratch};
pub use distribution::{choose_weighted, CurveKey, SpawnCurve};
pub use error::{TerrainError, TerrainResult};
pub use health::{DamageOutcome, HealthTable, TileHealthRegistry};
pub use noise::{PerlinNoise, WorldSeed};
pub use pass::Pass;
pub use pipeline::{validate_order, TerrainPipeline};
pub use query::Envelope;
pub use render::ChunkRenderer;
pub use stream::{ChunkState, StreamStats, TerrainStreamer, TileInfo};
pub use tile::{Tile, TileFlags, TileKind, TileLayer};
