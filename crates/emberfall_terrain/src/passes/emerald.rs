//! # Emerald Pass
//!
//! Places collectible emeralds above the final surface. Each candidate
//! hovers a random `0..=max_hover` rows above the standing cell; the
//! column between the surface and the emerald must be open.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, EntityCategory, EntitySpawn, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::{salt, Pass};
use crate::passes::spawn::{SpawnEntry, SpawnRules, SpawnState};
use crate::query::is_standable;

/// Emerald pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmeraldConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Highest hover above the standing cell, in rows.
    pub max_hover: i32,
    /// Spawn rules and entries.
    pub rules: SpawnRules,
}

impl Default for EmeraldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_hover: 2,
            rules: SpawnRules {
                safe_start_columns: 8,
                spawn_chance: 0.15,
                entries: vec![
                    SpawnEntry::gaussian("emerald", 250.0, 200.0, 4),
                    SpawnEntry::gaussian("emerald_cluster", 900.0, 500.0, 16),
                ],
                ..SpawnRules::default()
            },
        }
    }
}

/// Collectible placement.
#[derive(Clone, Debug, Default)]
pub struct EmeraldPass {
    /// Parameters.
    config: EmeraldConfig,
    /// Per-entry spacing, carried across chunks.
    state: SpawnState,
}

impl EmeraldPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: EmeraldConfig) -> Self {
        Self {
            config,
            state: SpawnState::default(),
        }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &EmeraldConfig {
        &self.config
    }
}

impl Pass for EmeraldPass {
    fn name(&self) -> &'static str {
        "emerald"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        let rules = &self.config.rules;
        if rules.entries.is_empty() {
            return;
        }
        let max_hover = self.config.max_hover.max(0);
        let mut rng = ctx.rng(salt::EMERALD);
        let before = chunk.spawns.len();

        for x in 0..chunk.width() as i32 {
            let surface = chunk.surface_height(x);
            if surface == NO_SURFACE || !is_standable(chunk, x, surface + 1) {
                continue;
            }
            let y = surface + 1 + rng.gen_range(0..=max_hover);
            if y >= chunk.height() as i32 || !(surface + 1..=y).all(|cy| chunk.get(x, cy).is_empty()) {
                continue;
            }
            if let Some(entry) = rules.try_spawn(&mut self.state, chunk, ctx, x, y, &mut rng) {
                chunk.spawns.push(EntitySpawn {
                    category: EntityCategory::Emerald,
                    entry: rules.entries[entry].name.clone(),
                    world_x: chunk.world_x(x),
                    world_y: y,
                });
            }
        }

        trace!(chunk = chunk.index(), placed = chunk.spawns.len() - before, "emeralds placed");
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}
