//! # Generation Passes
//!
//! Every stage of the pipeline, in the order the default configuration
//! runs them:
//!
//! | Pass | Reads | Writes |
//! |------|-------|--------|
//! | [`GroundPass`] | left neighbour edge | ground tiles, surface heights, edge heights |
//! | [`GapPass`] | surface heights | gap tiles, gap backdrop, gap spans |
//! | [`CavePass`] | surface heights | carved cells |
//! | [`RampPass`] | surface heights | ramp tiles |
//! | [`PlatformPass`] | surface heights | platform tiles |
//! | [`BackgroundPass`] | ground + platform tiles | backdrop |
//! | [`TrapPass`], [`EnemyPass`], [`EmeraldPass`] | final terrain, occupancy | spawns, occupancy |

pub mod background;
pub mod cave;
pub mod emerald;
pub mod enemy;
pub mod gap;
pub mod ground;
pub mod platform;
pub mod ramp;
pub mod spawn;
pub mod trap;

pub use background::{BackgroundConfig, BackgroundPass};
pub use cave::{CaveConfig, CavePass};
pub use emerald::{EmeraldConfig, EmeraldPass};
pub use enemy::{EnemyConfig, EnemyPass};
pub use gap::{GapConfig, GapPass};
pub use ground::{GroundConfig, GroundPass};
pub use platform::{PlatformConfig, PlatformLayerConfig, PlatformPass, PlatformReference};
pub use ramp::{RampConfig, RampPass};
pub use spawn::{SpawnEntry, SpawnRules};
pub use trap::{TrapConfig, TrapPass};

use rand::Rng;

/// Uniform roll in `lo..=hi` that tolerates swapped bounds.
pub(crate) fn roll_between<R: Rng>(rng: &mut R, lo: i32, hi: i32) -> i32 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    rng.gen_range(lo..=hi)
}

/// Bernoulli roll that tolerates probabilities outside `[0, 1]`.
pub(crate) fn roll_chance<R: Rng>(rng: &mut R, probability: f64) -> bool {
    if probability.is_nan() {
        return false;
    }
    rng.gen_bool(probability.clamp(0.0, 1.0))
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roll_helpers_tolerate_bad_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let v = roll_between(&mut rng, 5, 2);
            assert!((2..=5).contains(&v));
        }
        assert!(!roll_chance(&mut rng, -1.0));
        assert!(roll_chance(&mut rng, 2.0));
        assert!(!roll_chance(&mut rng, f64::NAN));
    }
}
