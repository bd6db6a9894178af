//! # Tile Health
//!
//! Runtime damage bookkeeping for mining and explosions.
//!
//! Damage accumulates per world cell until it reaches the tile's max
//! health. The registry only decides; the streamer applies destruction
//! through its tile-update path. Protected tiles, air and gaps are never
//! damaged.

use std::collections::HashMap;

use crate::tile::{Tile, TileKind};

/// Result of applying damage to one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The cell cannot be damaged.
    Ignored,
    /// The cell took damage and survives.
    Damaged {
        /// Health left.
        remaining: u32,
    },
    /// The cell reached zero health.
    Destroyed,
}

/// Max health per tile kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthTable {
    /// Ground tiles.
    pub solid: u32,
    /// Ramp tiles.
    pub ramp: u32,
    /// Platform tiles.
    pub platform: u32,
}

impl Default for HealthTable {
    fn default() -> Self {
        Self {
            solid: 30,
            ramp: 20,
            platform: 15,
        }
    }
}

/// Accumulated damage per world cell.
#[derive(Clone, Debug, Default)]
pub struct TileHealthRegistry {
    table: HealthTable,
    damage: HashMap<(i32, i32), u32>,
}

impl TileHealthRegistry {
    /// Creates a registry with the given health table.
    #[must_use]
    pub fn new(table: HealthTable) -> Self {
        Self {
            table,
            damage: HashMap::new(),
        }
    }

    /// Max health of a tile, or `None` if it cannot be damaged.
    #[must_use]
    pub fn max_health(&self, tile: Tile) -> Option<u32> {
        if tile.is_protected() {
            return None;
        }
        match tile.kind {
            TileKind::Solid => Some(self.table.solid),
            TileKind::RampUp | TileKind::RampDown => Some(self.table.ramp),
            TileKind::PlatformSolid => Some(self.table.platform),
            TileKind::Empty | TileKind::ExplicitGap => None,
        }
    }

    /// Damage accumulated on a cell so far.
    #[must_use]
    pub fn damage_at(&self, world_x: i32, world_y: i32) -> u32 {
        self.damage.get(&(world_x, world_y)).copied().unwrap_or(0)
    }

    /// Adds `amount` damage to the cell holding `tile`.
    ///
    /// A destroyed cell's record is dropped.
    pub fn apply(&mut self, world_x: i32, world_y: i32, tile: Tile, amount: u32) -> DamageOutcome {
        let Some(max) = self.max_health(tile) else {
            return DamageOutcome::Ignored;
        };
        if amount == 0 {
            return DamageOutcome::Damaged {
                remaining: max.saturating_sub(self.damage_at(world_x, world_y)),
            };
        }

        let total = self.damage_at(world_x, world_y).saturating_add(amount);
        if total >= max {
            self.damage.remove(&(world_x, world_y));
            DamageOutcome::Destroyed
        } else {
            self.damage.insert((world_x, world_y), total);
            DamageOutcome::Damaged { remaining: max - total }
        }
    }

    /// Drops damage records for world columns in `start..end`.
    pub fn clear_columns(&mut self, start: i32, end: i32) {
        self.damage.retain(|&(x, _), _| x < start || x >= end);
    }

    /// Drops every damage record.
    pub fn clear(&mut self) {
        self.damage.clear();
    }

    /// Number of damaged cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.damage.len()
    }

    /// Returns true if no cell is damaged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.damage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileFlags;

    #[test]
    fn test_damage_accumulates_until_destroyed() {
        let mut registry = TileHealthRegistry::default();
        let tile = Tile::ground();

        assert_eq!(registry.apply(3, 4, tile, 10), DamageOutcome::Damaged { remaining: 20 });
        assert_eq!(registry.apply(3, 4, tile, 10), DamageOutcome::Damaged { remaining: 10 });
        assert_eq!(registry.apply(3, 4, tile, 15), DamageOutcome::Destroyed);
        assert_eq!(registry.damage_at(3, 4), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_protected_air_and_gaps_are_ignored() {
        let mut registry = TileHealthRegistry::default();
        let bedrock = Tile::ground().with_flags(TileFlags::PROTECTED);

        assert_eq!(registry.apply(0, 0, bedrock, 1000), DamageOutcome::Ignored);
        assert_eq!(registry.apply(0, 1, Tile::EMPTY, 5), DamageOutcome::Ignored);
        assert_eq!(registry.apply(0, 2, Tile::gap(), 5), DamageOutcome::Ignored);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_per_kind_health() {
        let registry = TileHealthRegistry::new(HealthTable {
            solid: 5,
            ramp: 3,
            platform: 1,
        });
        assert_eq!(registry.max_health(Tile::ground()), Some(5));
        assert_eq!(registry.max_health(Tile::ramp_down()), Some(3));
        assert_eq!(registry.max_health(Tile::platform()), Some(1));
    }

    #[test]
    fn test_clear_columns() {
        let mut registry = TileHealthRegistry::default();
        registry.apply(5, 1, Tile::ground(), 1);
        registry.apply(25, 1, Tile::ground(), 1);
        registry.clear_columns(0, 20);

        assert_eq!(registry.damage_at(5, 1), 0);
        assert_eq!(registry.damage_at(25, 1), 1);
        assert_eq!(registry.len(), 1);
    }
}
