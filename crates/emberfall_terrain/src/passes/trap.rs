//! # Trap Pass
//!
//! Places static hazards on flat ground. A candidate needs `flat_radius`
//! level, ramp-free columns on each side. With `reserve_column` set, a
//! placed trap claims its whole world column so later spawn passes keep
//! clear of it.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, EntityCategory, EntitySpawn, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::{salt, Pass};
use crate::passes::spawn::{SpawnEntry, SpawnRules, SpawnState};
use crate::query::{is_flat, is_standable};

/// Trap pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Level columns required on each side.
    pub flat_radius: i32,
    /// Claim the whole column on success.
    pub reserve_column: bool,
    /// Spawn rules and entries.
    pub rules: SpawnRules,
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flat_radius: 1,
            reserve_column: true,
            rules: SpawnRules {
                safe_start_columns: 40,
                spawn_chance: 0.06,
                entries: vec![
                    SpawnEntry::gaussian("spikes", 300.0, 400.0, 12),
                    SpawnEntry::gaussian("saw", 1200.0, 600.0, 30),
                ],
                ..SpawnRules::default()
            },
        }
    }
}

/// Hazard placement.
#[derive(Clone, Debug, Default)]
pub struct TrapPass {
    /// Parameters.
    config: TrapConfig,
    /// Per-entry spacing, carried across chunks.
    state: SpawnState,
}

impl TrapPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: TrapConfig) -> Self {
        Self {
            config,
            state: SpawnState::default(),
        }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &TrapConfig {
        &self.config
    }
}

impl Pass for TrapPass {
    fn name(&self) -> &'static str {
        "trap"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        let cfg = &self.config;
        if cfg.rules.entries.is_empty() {
            return;
        }
        let mut rng = ctx.rng(salt::TRAP);
        let before = chunk.spawns.len();

        for x in 0..chunk.width() as i32 {
            let surface = chunk.surface_height(x);
            if surface == NO_SURFACE {
                continue;
            }
            let y = surface + 1;
            if !is_standable(chunk, x, y) || !is_flat(chunk, x, cfg.flat_radius.max(0)) {
                continue;
            }
            let Some(entry) = cfg.rules.try_spawn(&mut self.state, chunk, ctx, x, y, &mut rng) else {
                continue;
            };

            let world_x = chunk.world_x(x);
            if cfg.reserve_column {
                ctx.scratch.occupy_column(world_x);
            }
            chunk.spawns.push(EntitySpawn {
                category: EntityCategory::Trap,
                entry: cfg.rules.entries[entry].name.clone(),
                world_x,
                world_y: y,
            });
        }

        trace!(chunk = chunk.index(), placed = chunk.spawns.len() - before, "traps placed");
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::SpawnCurve;
    use crate::passes::test_support::{chunk_with_heights, context};
    use crate::query::Envelope;

    fn eager(reserve_column: bool) -> TrapConfig {
        TrapConfig {
            enabled: true,
            flat_radius: 1,
            reserve_column,
            rules: SpawnRules {
                safe_start_columns: 0,
                spawn_chance: 1.0,
                envelope: Envelope::default(),
                entries: vec![SpawnEntry {
                    name: "spikes".to_owned(),
                    curve: SpawnCurve::Custom {
                        keys: Vec::new(),
                        min_weight: 1.0,
                    },
                    min_spacing: 1,
                }],
            },
        }
    }

    #[test]
    fn test_traps_only_on_flat_ground() {
        let heights = [3, 3, 3, 4, 4, 4, 4, 5];
        let mut chunk = chunk_with_heights(0, &heights, 10);
        let mut ctx = context(1, heights.len(), 10);
        TrapPass::new(eager(false)).execute(&mut chunk, &mut ctx);

        let columns: Vec<i32> = chunk.spawns.iter().map(|s| s.world_x).collect();
        assert_eq!(columns, vec![1, 4, 5]);
        assert!(chunk.spawns.iter().all(|s| s.category == EntityCategory::Trap));
    }

    #[test]
    fn test_reserved_column_blocks_later_spawns() {
        let mut chunk = chunk_with_heights(0, &[3; 5], 10);
        let mut ctx = context(1, 5, 10);
        TrapPass::new(eager(true)).execute(&mut chunk, &mut ctx);

        for spawn in &chunk.spawns {
            assert!(ctx.scratch.is_occupied(spawn.world_x, spawn.world_y + 3));
            assert!(!ctx.scratch.occupy(spawn.world_x, 7));
        }
        assert!(!chunk.spawns.is_empty());
    }
}
