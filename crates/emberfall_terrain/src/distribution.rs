//! # Distance-Weighted Spawn Distribution
//!
//! Maps "distance traveled" to a relative spawn weight.
//!
//! ## Curves
//!
//! - **Gaussian**: a bell centred on `peak_distance` with width `spread`,
//!   blended from `min_weight` (far tails) to `max_weight` (at the peak).
//! - **Custom**: piecewise-linear keys, held flat past either end.
//!
//! Both are clamped to `min_weight`, so an entry never becomes impossible
//! at any distance.
//!
//! ## Selection
//!
//! [`choose_weighted`] picks among candidates proportionally to their
//! weights at the current distance.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One key of a custom curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Distance in world units.
    pub distance: f64,
    /// Weight at that distance.
    pub weight: f64,
}

/// Weight as a function of distance traveled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SpawnCurve {
    /// Bell curve with a floor.
    Gaussian {
        /// Distance of maximum weight.
        peak_distance: f64,
        /// Standard deviation, in world units.
        spread: f64,
        /// Weight at the peak.
        max_weight: f64,
        /// Floor weight.
        min_weight: f64,
    },
    /// Piecewise-linear curve with a floor. Keys sorted by distance.
    Custom {
        /// Curve keys.
        keys: Vec<CurveKey>,
        /// Floor weight.
        min_weight: f64,
    },
}

impl Default for SpawnCurve {
    fn default() -> Self {
        Self::Gaussian {
            peak_distance: 250.0,
            spread: 200.0,
            max_weight: 1.0,
            min_weight: 0.05,
        }
    }
}

impl SpawnCurve {
    /// The floor this curve never drops below.
    #[must_use]
    pub fn min_weight(&self) -> f64 {
        match self {
            Self::Gaussian { min_weight, .. } | Self::Custom { min_weight, .. } => *min_weight,
        }
    }

    /// Weight at `distance`. Always `>= min_weight`.
    #[must_use]
    pub fn evaluate(&self, distance: f64) -> f64 {
        let raw = match self {
            Self::Gaussian {
                peak_distance,
                spread,
                max_weight,
                min_weight,
            } => {
                let g = gaussian(distance, *peak_distance, *spread);
                max_weight * g + min_weight * (1.0 - g)
            }
            Self::Custom { keys, .. } => piecewise_linear(keys, distance).unwrap_or(0.0),
        };

        let floor = self.min_weight();
        if raw.is_nan() {
            floor
        } else {
            raw.max(floor)
        }
    }
}

/// Unnormalized bell, 1 at the peak.
#[inline]
fn gaussian(x: f64, peak: f64, spread: f64) -> f64 {
    if spread <= 0.0 {
        return if x == peak { 1.0 } else { 0.0 };
    }
    let d = x - peak;
    (-(d * d) / (2.0 * spread * spread)).exp()
}

fn piecewise_linear(keys: &[CurveKey], x: f64) -> Option<f64> {
    let first = keys.first()?;
    let last = keys.last()?;
    if x <= first.distance {
        return Some(first.weight);
    }
    if x >= last.distance {
        return Some(last.weight);
    }

    keys.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        if x < a.distance || x > b.distance {
            return None;
        }
        let span = b.distance - a.distance;
        if span <= 0.0 {
            return Some(b.weight);
        }
        let t = (x - a.distance) / span;
        Some(a.weight + (b.weight - a.weight) * t)
    })
}

/// Picks an index with probability proportional to `weights[i]`.
///
/// Negative and non-finite weights count as zero. Returns `None` when no
/// weight is positive.
pub fn choose_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let sanitized = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
    let total: f64 = weights.iter().copied().map(sanitized).sum();
    if total <= 0.0 {
        return None;
    }

    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, &w) in weights.iter().enumerate() {
        let w = sanitized(w);
        if w == 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = Some(i);
        if draw < cumulative {
            return Some(i);
        }
    }
    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn example_curve() -> SpawnCurve {
        SpawnCurve::Gaussian {
            peak_distance: 250.0,
            spread: 200.0,
            max_weight: 1.0,
            min_weight: 0.05,
        }
    }

    #[test]
    fn test_gaussian_peak_is_exact() {
        assert_eq!(example_curve().evaluate(250.0), 1.0);
    }

    #[test]
    fn test_gaussian_tail_approaches_floor() {
        let curve = example_curve();
        let far = curve.evaluate(100_000.0);
        assert!(far >= 0.05);
        assert!(far - 0.05 < 1e-9);

        let mut prev = curve.evaluate(250.0);
        for d in [400.0, 800.0, 1600.0, 3200.0] {
            let w = curve.evaluate(d);
            assert!(w <= prev);
            prev = w;
        }
    }

    #[test]
    fn test_weight_floor_holds_everywhere() {
        let curves = [
            example_curve(),
            SpawnCurve::Gaussian {
                peak_distance: 0.0,
                spread: 0.0,
                max_weight: 0.0,
                min_weight: 0.2,
            },
            SpawnCurve::Custom {
                keys: vec![
                    CurveKey { distance: 0.0, weight: 0.0 },
                    CurveKey { distance: 500.0, weight: 2.0 },
                    CurveKey { distance: 900.0, weight: -1.0 },
                ],
                min_weight: 0.1,
            },
            SpawnCurve::Custom {
                keys: Vec::new(),
                min_weight: 0.3,
            },
        ];

        for curve in &curves {
            for i in -50..2000 {
                let d = f64::from(i) * 37.5;
                assert!(curve.evaluate(d) >= curve.min_weight(), "{curve:?} at {d}");
            }
        }
    }

    #[test]
    fn test_custom_curve_interpolates_and_holds() {
        let curve = SpawnCurve::Custom {
            keys: vec![
                CurveKey { distance: 100.0, weight: 0.5 },
                CurveKey { distance: 300.0, weight: 1.5 },
            ],
            min_weight: 0.1,
        };
        assert_eq!(curve.evaluate(0.0), 0.5);
        assert_eq!(curve.evaluate(200.0), 1.0);
        assert_eq!(curve.evaluate(10_000.0), 1.5);
    }

    #[test]
    fn test_choose_weighted_is_proportional() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let weights = [1.0, 3.0];
        let draws = 20_000;
        let second = (0..draws)
            .filter(|_| choose_weighted(&weights, &mut rng) == Some(1))
            .count();

        let share = second as f64 / f64::from(draws);
        assert!((share - 0.75).abs() < 0.02, "share {share}");
    }

    #[test]
    fn test_choose_weighted_skips_unusable_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let pick = choose_weighted(&[0.0, f64::NAN, 2.0, -1.0], &mut rng);
            assert_eq!(pick, Some(2));
        }
        assert_eq!(choose_weighted(&[0.0, -3.0], &mut rng), None);
        assert_eq!(choose_weighted(&[], &mut rng), None);
    }

    #[test]
    fn test_curve_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            curve: SpawnCurve,
        }

        let gaussian: Holder = toml::from_str(
            r#"
            [curve]
            shape = "gaussian"
            peak_distance = 250.0
            spread = 200.0
            max_weight = 1.0
            min_weight = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(gaussian.curve, example_curve());

        let custom: Holder = toml::from_str(
            r#"
            [curve]
            shape = "custom"
            min_weight = 0.1
            keys = [{ distance = 0.0, weight = 0.2 }, { distance = 50.0, weight = 0.9 }]
            "#,
        )
        .unwrap();
        assert!(matches!(custom.curve, SpawnCurve::Custom { ref keys, .. } if keys.len() == 2));
    }
}
