//! # Gradient Noise Implementation
//!
//! Seeded Perlin noise in one and two dimensions plus fractal sums.
//!
//! ## Determinism Guarantee
//!
//! Given the same [`WorldSeed`], every function here returns **exactly**
//! the same value for the same coordinate on any platform, any time.
//! Nothing is cached between calls and nothing depends on call order,
//! which is what lets chunk `i` be regenerated in isolation and still
//! meet chunk `i - 1` without a seam.

use rand::Rng;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Resolves a configured seed. `0` means "pick one at startup".
    #[must_use]
    pub fn from_config(raw: u64) -> Self {
        if raw != 0 {
            return Self(raw);
        }
        let picked = rand::thread_rng().gen_range(1..=u64::MAX);
        tracing::info!(seed = picked, "no seed configured, picked a random one");
        Self(picked)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., one pass).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Pre-computed permutation table for noise.
///
/// This is computed once from the seed and reused.
#[derive(Clone)]
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// Gradient directions for 2D noise (axis and diagonal unit steps).
    const GRAD_2D: [[i8; 2]; 8] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
    ];

    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle driven by xorshift64; the state must never be zero
        let mut rng_state = seed.derive(0x5EED).value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state as usize) % (i + 1);
            perm.swap(i, j);
        }

        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }

    /// Hashes a lattice coordinate.
    #[inline]
    fn hash1(&self, x: i32) -> u8 {
        self.get((x & 255) as usize)
    }

    /// Hashes a 2D lattice coordinate.
    #[inline]
    fn hash2(&self, x: i32, y: i32) -> u8 {
        self.get(self.hash1(x) as usize + (y & 255) as usize)
    }
}

/// Seeded Perlin noise generator.
///
/// Raw samples lie in `[-1, 1]` and are exactly `0` on lattice points.
///
/// # Example
///
/// ```rust,ignore
/// let noise = PerlinNoise::new(WorldSeed::new(42));
///
/// let height = noise.fbm_1d(x * 0.05, 4, 0.5, 2.0);
/// assert!((-1.0..=1.0).contains(&height));
/// ```
#[derive(Clone)]
pub struct PerlinNoise {
    /// The permutation table.
    perm_table: PermutationTable,
}

impl PerlinNoise {
    /// Brings the 1D gradient sum (slopes up to 8) into `[-1, 1]`.
    const SCALE_1D: f64 = 0.25;

    /// Creates a new noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 1D noise. Returns a value in `[-1, 1]`.
    #[must_use]
    pub fn sample_1d(&self, x: f64) -> f64 {
        let xi = fast_floor(x);
        let xf = x - f64::from(xi);

        let g0 = grad_1d(self.perm_table.hash1(xi), xf);
        let g1 = grad_1d(self.perm_table.hash1(xi.wrapping_add(1)), xf - 1.0);

        (lerp(g0, g1, fade(xf)) * Self::SCALE_1D).clamp(-1.0, 1.0)
    }

    /// Samples 2D noise. Returns a value in `[-1, 1]`.
    #[must_use]
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        let xi = fast_floor(x);
        let yi = fast_floor(y);
        let xf = x - f64::from(xi);
        let yf = y - f64::from(yi);
        let x1 = xi.wrapping_add(1);
        let y1 = yi.wrapping_add(1);

        let aa = self.corner(self.perm_table.hash2(xi, yi), xf, yf);
        let ba = self.corner(self.perm_table.hash2(x1, yi), xf - 1.0, yf);
        let ab = self.corner(self.perm_table.hash2(xi, y1), xf, yf - 1.0);
        let bb = self.corner(self.perm_table.hash2(x1, y1), xf - 1.0, yf - 1.0);

        let u = fade(xf);
        let v = fade(yf);
        lerp(lerp(aa, ba, u), lerp(ab, bb, u), v).clamp(-1.0, 1.0)
    }

    /// Dot product of a corner gradient with the offset to that corner.
    #[inline]
    fn corner(&self, hash: u8, x: f64, y: f64) -> f64 {
        let grad = PermutationTable::GRAD_2D[(hash & 7) as usize];
        x * f64::from(grad[0]) + y * f64::from(grad[1])
    }

    /// Generates octaved (fractal) 1D noise.
    ///
    /// # Arguments
    ///
    /// * `x` - Coordinate, already scaled by the base frequency
    /// * `octaves` - Number of noise layers
    /// * `persistence` - Amplitude decay per octave (typically 0.5)
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    ///
    /// # Returns
    ///
    /// A value in `[-1, 1]`, normalized by the summed amplitudes.
    #[must_use]
    pub fn fbm_1d(&self, x: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample_1d(x * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }

    /// Generates octaved (fractal) 2D noise.
    ///
    /// Same construction as [`Self::fbm_1d`] over two axes.
    #[must_use]
    pub fn fbm_2d(
        &self,
        x: f64,
        y: f64,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample_2d(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }
}

/// 1D gradient: slope in `±[1, 8]` picked by the hash.
#[inline]
fn grad_1d(hash: u8, x: f64) -> f64 {
    let slope = 1.0 + f64::from(hash & 7);
    if hash & 8 == 0 {
        slope * x
    } else {
        -slope * x
    }
}

/// Quintic smoothstep `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Fast floor function.
///
/// Faster than `f64::floor()` for our use case.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) { xi - 1 } else { xi }
}
