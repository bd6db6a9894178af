//! # Terrain Configuration
//!
//! Everything a world session is built from, loaded once at startup from
//! TOML:
//!
//! ```toml
//! [world]
//! chunk_width = 20
//! chunk_height = 25
//! seed = 0            # 0 picks a random seed
//!
//! [[passes]]
//! kind = "ground"
//! max_slope_per_column = 2
//!
//! [[passes]]
//! kind = "cave"
//! threshold = 0.3
//! ```
//!
//! Every table is `#[serde(default)]`, so a config only lists what it
//! changes. The order of `[[passes]]` is the execution order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::distribution::SpawnCurve;
use crate::error::{TerrainError, TerrainResult};
use crate::pass::Pass;
use crate::passes::{
    BackgroundConfig, BackgroundPass, CaveConfig, CavePass, EmeraldConfig, EmeraldPass, EnemyConfig, EnemyPass,
    GapConfig, GapPass, GroundConfig, GroundPass, PlatformConfig, PlatformPass, RampConfig, RampPass, SpawnRules,
    TrapConfig, TrapPass,
};
use crate::pipeline::{validate_order, TerrainPipeline};

/// World dimensions and streaming parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Chunk width in tiles.
    pub chunk_width: usize,
    /// Chunk height in tiles.
    pub chunk_height: usize,
    /// World units per tile.
    pub cell_size: f32,
    /// Chunks kept generated ahead of the player.
    pub ahead_chunks: i32,
    /// Chunks kept cached behind the player.
    pub behind_chunks: i32,
    /// Global seed. `0` picks a random seed at startup.
    pub seed: u64,
    /// Chunk generations per tick. `0` means unbounded.
    pub max_chunks_per_tick: usize,
    /// Ticks between a regeneration request and the regeneration.
    pub regenerate_debounce_ticks: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_width: 20,
            chunk_height: 25,
            cell_size: 1.0,
            ahead_chunks: 3,
            behind_chunks: 2,
            seed: 0,
            max_chunks_per_tick: 0,
            regenerate_debounce_ticks: 10,
        }
    }
}

/// One pass and its parameters, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassConfig {
    /// Height field.
    Ground(GroundConfig),
    /// Pits.
    Gap(GapConfig),
    /// Tunnels.
    Cave(CaveConfig),
    /// Slopes.
    Ramp(RampConfig),
    /// Floating platforms.
    Platform(PlatformConfig),
    /// Backdrop.
    Background(BackgroundConfig),
    /// Enemies.
    Enemy(EnemyConfig),
    /// Collectibles.
    Emerald(EmeraldConfig),
    /// Hazards.
    Trap(TrapConfig),
}

impl PassConfig {
    /// Name of the pass this config builds.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ground(_) => "ground",
            Self::Gap(_) => "gap",
            Self::Cave(_) => "cave",
            Self::Ramp(_) => "ramp",
            Self::Platform(_) => "platform",
            Self::Background(_) => "background",
            Self::Enemy(_) => "enemy",
            Self::Emerald(_) => "emerald",
            Self::Trap(_) => "trap",
        }
    }

    /// Builds the pass.
    #[must_use]
    pub fn build(&self) -> Box<dyn Pass> {
        match self.clone() {
            Self::Ground(c) => Box::new(GroundPass::new(c)),
            Self::Gap(c) => Box::new(GapPass::new(c)),
            Self::Cave(c) => Box::new(CavePass::new(c)),
            Self::Ramp(c) => Box::new(RampPass::new(c)),
            Self::Platform(c) => Box::new(PlatformPass::new(c)),
            Self::Background(c) => Box::new(BackgroundPass::new(c)),
            Self::Enemy(c) => Box::new(EnemyPass::new(c)),
            Self::Emerald(c) => Box::new(EmeraldPass::new(c)),
            Self::Trap(c) => Box::new(TrapPass::new(c)),
        }
    }

    /// Returns true if the pass starts enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        match self {
            Self::Ground(c) => c.enabled,
            Self::Gap(c) => c.enabled,
            Self::Cave(c) => c.enabled,
            Self::Ramp(c) => c.enabled,
            Self::Platform(c) => c.enabled,
            Self::Background(c) => c.enabled,
            Self::Enemy(c) => c.enabled,
            Self::Emerald(c) => c.enabled,
            Self::Trap(c) => c.enabled,
        }
    }
}

/// Complete terrain configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// World dimensions and streaming.
    pub world: WorldConfig,
    /// Passes in execution order.
    pub passes: Vec<PassConfig>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            passes: vec![
                PassConfig::Ground(GroundConfig::default()),
                PassConfig::Gap(GapConfig::default()),
                PassConfig::Cave(CaveConfig::default()),
                PassConfig::Ramp(RampConfig::default()),
                PassConfig::Platform(PlatformConfig::default()),
                PassConfig::Background(BackgroundConfig::default()),
                PassConfig::Trap(TrapConfig::default()),
                PassConfig::Enemy(EnemyConfig::default()),
                PassConfig::Emerald(EmeraldConfig::default()),
            ],
        }
    }
}

fn invalid(message: impl Into<String>) -> TerrainError {
    TerrainError::InvalidConfig(message.into())
}

fn check_range(what: &str, lo: i32, hi: i32) -> TerrainResult<()> {
    if lo > hi {
        return Err(invalid(format!("{what}: minimum {lo} exceeds maximum {hi}")));
    }
    Ok(())
}

fn check_probability(what: &str, p: f64) -> TerrainResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(format!("{what}: probability {p} is outside [0, 1]")));
    }
    Ok(())
}

fn check_curve(what: &str, curve: &SpawnCurve) -> TerrainResult<()> {
    let floor = curve.min_weight();
    if !floor.is_finite() || floor <= 0.0 {
        return Err(invalid(format!("{what}: min_weight must be positive, got {floor}")));
    }
    match curve {
        SpawnCurve::Gaussian { spread, .. } if *spread < 0.0 => {
            Err(invalid(format!("{what}: spread must not be negative")))
        }
        SpawnCurve::Custom { keys, .. } if keys.windows(2).any(|k| k[1].distance < k[0].distance) => {
            Err(invalid(format!("{what}: curve keys must be sorted by distance")))
        }
        _ => Ok(()),
    }
}

fn check_rules(pass: &str, rules: &SpawnRules) -> TerrainResult<()> {
    check_probability(&format!("{pass}.spawn_chance"), rules.spawn_chance)?;
    for entry in &rules.entries {
        let what = format!("{pass}.{}", entry.name);
        check_curve(&what, &entry.curve)?;
        if entry.min_spacing < 0 {
            return Err(invalid(format!("{what}: min_spacing must not be negative")));
        }
    }
    Ok(())
}

impl TerrainConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ConfigParse`] for malformed TOML.
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ConfigIo`] if the file cannot be read and
    /// [`TerrainError::ConfigParse`] if it is not valid.
    pub fn from_path(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TerrainError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "config loaded");
        Self::from_toml_str(&text)
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::ConfigSerialize`] if serialization fails.
    pub fn to_toml_string(&self) -> TerrainResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks dimensions, ranges, probabilities and pass order.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] for a bad value and
    /// [`TerrainError::PassOrder`] for a broken pass dependency.
    pub fn validate(&self) -> TerrainResult<()> {
        let result = self.validate_inner();
        if let Err(err) = &result {
            warn!(error = %err, "config rejected");
        }
        result
    }

    fn validate_inner(&self) -> TerrainResult<()> {
        let w = &self.world;
        if w.chunk_width < 2 || w.chunk_height < 4 {
            return Err(invalid(format!(
                "chunk must be at least 2x4 tiles, got {}x{}",
                w.chunk_width, w.chunk_height
            )));
        }
        if i32::try_from(w.chunk_width).is_err() || i32::try_from(w.chunk_height).is_err() {
            return Err(invalid("chunk dimensions do not fit in i32"));
        }
        if !(w.cell_size.is_finite() && w.cell_size > 0.0) {
            return Err(invalid(format!("cell_size must be positive, got {}", w.cell_size)));
        }
        if w.ahead_chunks < 0 || w.behind_chunks < 0 {
            return Err(invalid("ahead_chunks and behind_chunks must not be negative"));
        }

        for pass in &self.passes {
            self.validate_pass(pass)?;
        }

        let names: Vec<&str> = self.passes.iter().map(PassConfig::name).collect();
        validate_order(&names)
    }

    fn validate_pass(&self, pass: &PassConfig) -> TerrainResult<()> {
        let height = self.world.chunk_height as i32;
        match pass {
            PassConfig::Ground(c) => {
                check_range("ground.height", c.min_height, c.max_height)?;
                if c.max_height >= height {
                    return Err(invalid(format!(
                        "ground.max_height {} does not fit in chunk height {height}",
                        c.max_height
                    )));
                }
                if c.min_height < 0 || c.max_slope_per_column < 0 || c.protected_rows < 0 {
                    return Err(invalid("ground heights, slope and protected rows must not be negative"));
                }
                check_range("ground.plateau_length", c.plateau_min_length, c.plateau_max_length)?;
                check_probability("ground.plateau_chance", c.plateau_chance)
            }
            PassConfig::Gap(c) => {
                check_probability("gap.probability", c.probability)?;
                if c.min_gap_width < 1 {
                    return Err(invalid("gap.min_gap_width must be at least 1"));
                }
                check_range("gap.width", c.min_gap_width, c.max_gap_width)?;
                if c.bottom_offset < 0 || c.min_spacing < 0 {
                    return Err(invalid("gap.bottom_offset and gap.min_spacing must not be negative"));
                }
                Ok(())
            }
            PassConfig::Cave(c) => {
                if c.crust_thickness < 1 || c.bottom_margin < 0 {
                    return Err(invalid("cave.crust_thickness must be at least 1 and bottom_margin non-negative"));
                }
                Ok(())
            }
            PassConfig::Ramp(c) => {
                if c.max_step < 1 {
                    return Err(invalid("ramp.max_step must be at least 1"));
                }
                Ok(())
            }
            PassConfig::Platform(c) => {
                for layer in &c.layers {
                    let what = format!("platform.{}", layer.name);
                    check_probability(&what, layer.probability)?;
                    check_range(&format!("{what}.length"), layer.min_length, layer.max_length)?;
                    check_range(&format!("{what}.thickness"), layer.min_thickness, layer.max_thickness)?;
                    if layer.min_length < 1 || layer.min_thickness < 1 || layer.clearance < 1 {
                        return Err(invalid(format!("{what}: length, thickness and clearance must be at least 1")));
                    }
                }
                Ok(())
            }
            PassConfig::Background(_) => Ok(()),
            PassConfig::Enemy(c) => check_rules("enemy", &c.rules),
            PassConfig::Emerald(c) => {
                if c.max_hover < 0 {
                    return Err(invalid("emerald.max_hover must not be negative"));
                }
                check_rules("emerald", &c.rules)
            }
            PassConfig::Trap(c) => {
                if c.flat_radius < 0 {
                    return Err(invalid("trap.flat_radius must not be negative"));
                }
                check_rules("trap", &c.rules)
            }
        }
    }

    /// Builds the pipeline described by `passes`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::PassOrder`] if the order breaks a dependency.
    pub fn build_pipeline(&self) -> TerrainResult<TerrainPipeline> {
        TerrainPipeline::new(self.passes.iter().map(PassConfig::build).collect())
    }
}
