//! # Platform Pass
//!
//! Floating platforms, one optional run per configured layer per chunk.
//!
//! ## Shape
//!
//! Each placed platform spans `length` columns and is `thickness` tiles
//! thick. Its underside follows a gentle curve: a per-layer fBm stream
//! scaled to `curve_amplitude` tiles. The curve is shifted so its lowest
//! point sits exactly `clearance` rows above the highest reference surface
//! under the span.
//!
//! ## Layers
//!
//! Layers are placed in configuration order. A layer references either the
//! ground or the platforms placed so far (falling back to ground where none
//! exist), so stacking `lower` then `upper` keeps the upper run clear of
//! the lower one.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chunk::{Chunk, NO_SURFACE};
use crate::context::GenerationContext;
use crate::pass::{salt, Pass};
use crate::passes::{roll_between, roll_chance};
use crate::query::highest_walkable_in_layers;
use crate::tile::{Tile, TileFlags, TileLayer};

/// Surface a platform layer is placed above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformReference {
    /// Ground layer surface.
    #[default]
    Ground,
    /// Tops of platforms placed by earlier layers.
    LayerBelow,
}

/// One platform layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformLayerConfig {
    /// Name used in logs.
    pub name: String,
    /// Chance per chunk to place a platform on this layer.
    pub probability: f64,
    /// Shortest platform, in columns.
    pub min_length: i32,
    /// Longest platform, in columns.
    pub max_length: i32,
    /// Thinnest platform, in rows.
    pub min_thickness: i32,
    /// Thickest platform, in rows.
    pub max_thickness: i32,
    /// Rows between the reference surface and the platform's lowest point.
    pub clearance: i32,
    /// Height variation of the curve, in tiles.
    pub curve_amplitude: f64,
    /// Curve noise frequency per column.
    pub frequency: f64,
    /// Curve fBm octaves.
    pub octaves: u32,
    /// Independent curve stream for this layer.
    pub seed_offset: f64,
    /// Surface the clearance is measured from.
    pub reference: PlatformReference,
}

impl Default for PlatformLayerConfig {
    fn default() -> Self {
        Self {
            name: "lower".to_owned(),
            probability: 0.4,
            min_length: 4,
            max_length: 9,
            min_thickness: 1,
            max_thickness: 1,
            clearance: 4,
            curve_amplitude: 2.0,
            frequency: 0.3,
            octaves: 2,
            seed_offset: 11.0,
            reference: PlatformReference::Ground,
        }
    }
}

/// Platform pass parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Run this pass.
    pub enabled: bool,
    /// Layers, placed in order.
    pub layers: Vec<PlatformLayerConfig>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            layers: vec![
                PlatformLayerConfig::default(),
                PlatformLayerConfig {
                    name: "upper".to_owned(),
                    probability: 0.25,
                    min_length: 3,
                    max_length: 6,
                    clearance: 4,
                    seed_offset: 23.0,
                    reference: PlatformReference::LayerBelow,
                    ..PlatformLayerConfig::default()
                },
            ],
        }
    }
}

/// Where one platform landed.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Placement {
    /// First local column.
    start: i32,
    /// Bottom row per column of the span.
    bottoms: Vec<i32>,
    /// Top row per column of the span.
    tops: Vec<i32>,
}

/// Curve-shaped floating platforms. Stateless across chunks.
#[derive(Clone, Debug, Default)]
pub struct PlatformPass {
    /// Parameters.
    config: PlatformConfig,
}

impl PlatformPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    /// Parameters.
    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Reference row of a column for a layer, or [`NO_SURFACE`].
    fn reference_height(chunk: &Chunk, ctx: &GenerationContext, x: i32, reference: PlatformReference) -> i32 {
        let ground = highest_walkable_in_layers(chunk, x, &[TileLayer::Ground]);
        match reference {
            PlatformReference::Ground => ground,
            PlatformReference::LayerBelow => ctx
                .scratch
                .platform_tops
                .get(&x)
                .copied()
                .map_or(ground, |top| top.max(ground)),
        }
    }

    /// Places one platform for `layer`. `None` if the roll fails or the
    /// platform would not fit under the chunk ceiling.
    fn place_layer<R: Rng>(
        chunk: &mut Chunk,
        ctx: &mut GenerationContext,
        layer: &PlatformLayerConfig,
        rng: &mut R,
    ) -> Option<Placement> {
        if !roll_chance(rng, layer.probability) {
            return None;
        }

        let width = chunk.width() as i32;
        let length = roll_between(rng, layer.min_length, layer.max_length).clamp(1, width);
        let thickness = roll_between(rng, layer.min_thickness, layer.max_thickness).max(1);
        let start = rng.gen_range(0..=width - length);
        let columns = start..start + length;

        let curve: Vec<i32> = columns
            .clone()
            .map(|x| {
                let world_x = f64::from(chunk.world_x(x));
                let n = ctx.fractal_noise_1d(world_x, layer.frequency, layer.octaves, layer.seed_offset);
                (n * layer.curve_amplitude.max(0.0)).round() as i32
            })
            .collect();
        let lowest = curve.iter().copied().min().unwrap_or(0);

        let reference = columns
            .clone()
            .map(|x| Self::reference_height(chunk, ctx, x, layer.reference))
            .max()
            .unwrap_or(NO_SURFACE)
            .max(0);
        let base = reference + layer.clearance.max(1);

        let bottoms: Vec<i32> = curve.iter().map(|&c| base + c - lowest).collect();
        let tops: Vec<i32> = bottoms.iter().map(|&b| b + thickness - 1).collect();

        let ceiling = chunk.height() as i32 - 1;
        if tops.iter().any(|&top| top > ceiling) {
            trace!(chunk = chunk.index(), layer = %layer.name, "platform does not fit");
            return None;
        }

        for (i, x) in columns.enumerate() {
            for y in bottoms[i]..=tops[i] {
                let tile = Tile::platform().with_height_level(tops[i] as i16);
                let tile = if y == tops[i] {
                    tile.with_flags(TileFlags::EDGE_TOP)
                } else {
                    tile
                };
                chunk.set(x, y, tile);
            }
            let top = ctx.scratch.platform_tops.entry(x).or_insert(tops[i]);
            *top = (*top).max(tops[i]);
        }

        Some(Placement { start, bottoms, tops })
    }
}

impl Pass for PlatformPass {
    fn name(&self) -> &'static str {
        "platform"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    fn execute(&mut self, chunk: &mut Chunk, ctx: &mut GenerationContext) {
        let mut rng = ctx.rng(salt::PLATFORM);

        for layer in &self.config.layers {
            if let Some(placed) = Self::place_layer(chunk, ctx, layer, &mut rng) {
                trace!(
                    chunk = chunk.index(),
                    layer = %layer.name,
                    start = placed.start,
                    length = placed.tops.len(),
                    lowest = ?placed.bottoms.iter().min(),
                    "platform placed"
                );
            }
        }

        chunk.refresh_surface_heights();
    }
}
