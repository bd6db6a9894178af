//! # Spawn Machinery
//!
//! The column-by-column decision shared by the enemy, emerald and trap
//! passes.
//!
//! ## Per candidate cell
//!
//! 1. Skip the safe-start zone and gap columns.
//! 2. Skip cells another spawn already occupies.
//! 3. Keep entries whose own spacing cooldown has elapsed.
//! 4. Pick one of them by weight at the column's world distance.
//! 5. Roll the picked weight (times `spawn_chance`).
//! 6. Require the free-space envelope around the cell.
//! 7. Mark the cell occupied and remember the column for spacing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::context::GenerationContext;
use crate::distribution::{choose_weighted, SpawnCurve};
use crate::passes::roll_chance;
use crate::query::{is_envelope_clear, Envelope};

/// One spawnable entity type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnEntry {
    /// Entity name handed to the instantiator.
    pub name: String,
    /// Weight by distance traveled.
    pub curve: SpawnCurve,
    /// World columns between two spawns of this entry.
    pub min_spacing: i32,
}

impl Default for SpawnEntry {
    fn default() -> Self {
        Self {
            name: "entity".to_owned(),
            curve: SpawnCurve::default(),
            min_spacing: 8,
        }
    }
}

impl SpawnEntry {
    /// Entry with a gaussian curve.
    #[must_use]
    pub fn gaussian(name: &str, peak_distance: f64, spread: f64, min_spacing: i32) -> Self {
        Self {
            name: name.to_owned(),
            curve: SpawnCurve::Gaussian {
                peak_distance,
                spread,
                max_weight: 1.0,
                min_weight: 0.05,
            },
            min_spacing,
        }
    }
}

/// Shared spawn parameters of one spawn pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnRules {
    /// World columns from the origin that never spawn.
    pub safe_start_columns: i32,
    /// Multiplier on the picked entry's weight before the roll.
    pub spawn_chance: f64,
    /// Free space required around the spawn cell.
    pub envelope: Envelope,
    /// Candidate entries. Empty makes the pass a no-op.
    pub entries: Vec<SpawnEntry>,
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self {
            safe_start_columns: 20,
            spawn_chance: 0.1,
            envelope: Envelope::SNUG,
            entries: Vec::new(),
        }
    }
}

/// Cross-chunk spawn state: last world column each entry spawned at.
#[derive(Clone, Debug, Default)]
pub(crate) struct SpawnState {
    last_spawn: Vec<Option<i32>>,
}

impl SpawnState {
    pub(crate) fn reset(&mut self) {
        self.last_spawn.clear();
    }

    fn spacing_elapsed(&self, entry: usize, world_x: i32, min_spacing: i32) -> bool {
        match self.last_spawn.get(entry).copied().flatten() {
            Some(last) => world_x - last >= min_spacing,
            None => true,
        }
    }

    fn record(&mut self, entry: usize, world_x: i32) {
        if self.last_spawn.len() <= entry {
            self.last_spawn.resize(entry + 1, None);
        }
        self.last_spawn[entry] = Some(world_x);
    }
}

impl SpawnRules {
    /// Runs the spawn decision for local cell `(x, y)`.
    ///
    /// On success the cell is marked occupied in the context scratch and
    /// the winning entry index is returned.
    pub(crate) fn try_spawn<R: Rng>(
        &self,
        state: &mut SpawnState,
        chunk: &Chunk,
        ctx: &mut GenerationContext,
        x: i32,
        y: i32,
        rng: &mut R,
    ) -> Option<usize> {
        let world_x = chunk.world_x(x);
        if world_x < self.safe_start_columns || ctx.scratch.is_gap_column(x) {
            return None;
        }
        if ctx.scratch.is_occupied(world_x, y) {
            return None;
        }

        let eligible: Vec<usize> = (0..self.entries.len())
            .filter(|&i| state.spacing_elapsed(i, world_x, self.entries[i].min_spacing))
            .collect();
        if eligible.is_empty() {
            return None;
        }

        let distance = f64::from(ctx.world_distance(world_x));
        let weights: Vec<f64> = eligible
            .iter()
            .map(|&i| self.entries[i].curve.evaluate(distance))
            .collect();
        let pick = choose_weighted(&weights, rng)?;

        if !roll_chance(rng, weights[pick] * self.spawn_chance) {
            return None;
        }
        if !is_envelope_clear(chunk, x, y, self.envelope) {
            return None;
        }
        if !ctx.scratch.occupy(world_x, y) {
            return None;
        }

        let entry = eligible[pick];
        state.record(entry, world_x);
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::{chunk_with_heights, context};
    use crate::context::GapSpan;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn certain(entries: Vec<SpawnEntry>) -> SpawnRules {
        SpawnRules {
            safe_start_columns: 0,
            spawn_chance: 1.0,
            envelope: Envelope::default(),
            entries,
        }
    }

    fn flat_entry(name: &str, min_spacing: i32) -> SpawnEntry {
        SpawnEntry {
            name: name.to_owned(),
            curve: SpawnCurve::Custom {
                keys: Vec::new(),
                min_weight: 1.0,
            },
            min_spacing,
        }
    }

    #[test]
    fn test_spawn_marks_cell_occupied() {
        let chunk = chunk_with_heights(0, &[3; 8], 12);
        let mut ctx = context(1, 8, 12);
        let rules = certain(vec![flat_entry("slime", 0)]);
        let mut state = SpawnState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 2, 4, &mut rng), Some(0));
        assert!(ctx.scratch.is_occupied(2, 4));
        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 2, 4, &mut rng), None);
    }

    #[test]
    fn test_safe_start_and_gap_columns_refused() {
        let chunk = chunk_with_heights(0, &[3; 8], 12);
        let mut ctx = context(1, 8, 12);
        ctx.scratch.gap_spans.push(GapSpan { start: 5, end: 6 });
        let rules = SpawnRules {
            safe_start_columns: 3,
            ..certain(vec![flat_entry("slime", 0)])
        };
        let mut state = SpawnState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 1, 4, &mut rng), None);
        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 5, 4, &mut rng), None);
        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 3, 4, &mut rng), Some(0));
    }

    #[test]
    fn test_spacing_is_per_entry() {
        let chunk = chunk_with_heights(0, &[3; 16], 12);
        let mut ctx = context(1, 16, 12);
        let rules = certain(vec![flat_entry("slime", 5), flat_entry("bat", 5)]);
        let mut state = SpawnState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let first = rules.try_spawn(&mut state, &chunk, &mut ctx, 0, 4, &mut rng).unwrap();
        let second = rules.try_spawn(&mut state, &chunk, &mut ctx, 1, 4, &mut rng).unwrap();
        assert_ne!(first, second, "the cooling entry is excluded");
        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 2, 4, &mut rng), None);
        assert!(rules.try_spawn(&mut state, &chunk, &mut ctx, 5, 4, &mut rng).is_some());
    }

    #[test]
    fn test_envelope_blocks_spawn() {
        let mut chunk = chunk_with_heights(0, &[3; 8], 12);
        chunk.set(3, 5, crate::tile::Tile::platform());
        let mut ctx = context(1, 8, 12);
        let rules = SpawnRules {
            envelope: Envelope::SNUG,
            ..certain(vec![flat_entry("slime", 0)])
        };
        let mut state = SpawnState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 2, 4, &mut rng), None);
        assert!(!ctx.scratch.is_occupied(2, 4));
        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 6, 4, &mut rng), Some(0));
    }

    #[test]
    fn test_no_entries_is_a_no_op() {
        let chunk = chunk_with_heights(0, &[3; 8], 12);
        let mut ctx = context(1, 8, 12);
        let rules = certain(Vec::new());
        let mut state = SpawnState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(rules.try_spawn(&mut state, &chunk, &mut ctx, 2, 4, &mut rng), None);
    }

    #[test]
    fn test_reset_clears_spacing() {
        let mut state = SpawnState::default();
        state.record(1, 40);
        assert!(!state.spacing_elapsed(1, 42, 5));
        state.reset();
        assert!(state.spacing_elapsed(1, 42, 5));
    }
}
