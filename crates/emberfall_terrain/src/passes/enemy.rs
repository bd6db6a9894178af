//! # Enemy Pass
//!
//! Places enemies standing on the final surface of each column.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, EntityCategory, EntitySpawn, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::{salt, Pass};
use crate::passes::spawn::{SpawnEntry, SpawnRules, SpawnState};
use crate::query::is_standable;

/// Enemy pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Spawn rules and entries.
    pub rules: SpawnRules,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: SpawnRules {
                safe_start_columns: 24,
                spawn_chance: 0.12,
                entries: vec![
                    SpawnEntry::gaussian("slime", 100.0, 300.0, 6),
                    SpawnEntry::gaussian("bat", 600.0, 400.0, 10),
                    SpawnEntry::gaussian("golem", 1500.0, 600.0, 24),
                ],
                ..SpawnRules::default()
            },
        }
    }
}

/// Surface enemy placement.
#[derive(Clone, Debug, Default)]
pub struct EnemyPass {
    /// Parameters.
    config: EnemyConfig,
    /// Per-entry spacing, carried across chunks.
    state: SpawnState,
}

impl EnemyPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: EnemyConfig) -> Self {
        Self {
            config,
            state: SpawnState::default(),
        }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &EnemyConfig {
        &self.config
    }
}

impl Pass for EnemyPass {
    fn name(&self) -> &'static str {
        "enemy"
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
        let mut rng = ctx.rng(salt::ENEMY);

        for x in 0..chunk.width() as i32 {
            let surface = chunk.surface_height(x);
            if surface == NO_SURFACE {
                continue;
            }
            let y = surface + 1;
            if !is_standable(chunk, x, y) {
                continue;
            }
            if let Some(entry) = rules.try_spawn(&mut self.state, chunk, ctx, x, y, &mut rng) {
                chunk.spawns.push(EntitySpawn {
                    category: EntityCategory::Enemy,
                    entry: rules.entries[entry].name.clone(),
                    world_x: chunk.world_x(x),
                    world_y: y,
                });
            }
        }

        trace!(chunk = chunk.index(), total = chunk.spawns.len(), "enemies placed");
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}
