//! # Background Pass
//!
//! Per column, fills the background matrix from row 0 up to just under the
//! highest walkable tile of the ground and platform layers, so everything
//! solid has an opaque backdrop beneath it.
//!
//! Gap columns keep the capped backdrop the gap pass gave them.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::Pass;
use crate::query::highest_walkable_in_layers;
use crate::tile::{Tile, TileLayer};

/// Background pass parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Run this pass.
    pub enabled: bool,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Backdrop fill under ground and platforms. Stateless across chunks.
#[derive(Clone, Debug, Default)]
pub struct BackgroundPass {
    /// Parameters.
    config: BackgroundConfig,
}

impl BackgroundPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: BackgroundConfig) -> Self {
        Self { config }
    }
}

impl Pass for BackgroundPass {
    fn name(&self) -> &'static str {
        "background"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        let mut filled = 0_usize;
        for x in 0..chunk.width() as i32 {
            if ctx.scratch.is_gap_column(x) {
                continue;
            }
            let highest = highest_walkable_in_layers(chunk, x, &[TileLayer::Ground, TileLayer::Platform]);
            if highest == NO_SURFACE {
                continue;
            }
            for y in 0..highest {
                chunk.set_background(x, y, Tile::backdrop());
            }
            filled += highest as usize;
        }
        trace!(chunk = chunk.index(), filled, "backdrop filled");
    }
}
