//! Weight vector operations for the genetic algorithm.
//!
//! A weight vector is a plain `[f32]`, one coefficient per board feature in feature order.
//! Every coefficient of a live individual is finite and lies in `[-range, range]`, where
//! `range` is the configured `weight_range`; [`validate`] checks this and [`repair`]
//! restores it.
//!
//! # Operations
//!
//! - **Initialization**: [`random`] draws every coefficient uniformly from the range
//! - **Crossover**: [`CrossoverPolicy`] selects [`single_point`], [`average`] or
//!   [`blx_alpha`]
//! - **Mutation**: [`Mutation`] perturbs coefficients with a bounded Gaussian delta
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg64Mcg;
//! use tetro_training::weights::{self, CrossoverPolicy, Mutation};
//!
//! let mut rng = Pcg64Mcg::seed_from_u64(7);
//! let p1 = weights::random(&mut rng, 1.0, 4);
//! let p2 = weights::random(&mut rng, 1.0, 4);
//!
//! let mut child = CrossoverPolicy::SinglePoint.combine(&p1, &p2, 0.5, 1.0, &mut rng);
//! Mutation::new(0.5, 0.2, 0.5, 1.0)?.apply(&mut child, &mut rng);
//!
//! assert!(weights::validate(&child, 1.0).is_ok());
//! # Ok::<(), tetro_training::config::ConfigError>(())
//! ```

use std::iter;

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Largest accepted `weight_range`; wider ranges overflow the sampling interval.
pub const MAX_WEIGHT_RANGE: f32 = 1.0e6;
/// Largest accepted BLX-α `blend_alpha`.
pub const MAX_BLEND_ALPHA: f32 = 10.0;

/// A coefficient that is not finite or lies outside the weight range.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display("weight #{index} is {value}, outside [-{range}, {range}]")]
pub struct CorruptWeightVector {
    pub index: usize,
    pub value: f32,
    pub range: f32,
}

/// Creates a weight vector by applying a function to each index.
///
/// ```
/// use tetro_training::weights;
///
/// let weights = weights::from_fn(|i| if i % 2 == 0 { 0.5 } else { -0.5 }, 4);
/// assert_eq!(weights, [0.5, -0.5, 0.5, -0.5]);
/// ```
pub fn from_fn<F>(f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    (0..len).map(f).collect()
}

/// Generates a weight vector with every coefficient uniform in `[-range, range]`.
pub fn random<R>(rng: &mut R, range: f32, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(-range..=range), len)
}

/// Checks that every coefficient is finite and within `[-range, range]`.
pub fn validate(weights: &[f32], range: f32) -> Result<(), CorruptWeightVector> {
    match weights
        .iter()
        .position(|w| !w.is_finite() || w.abs() > range)
    {
        Some(index) => Err(CorruptWeightVector {
            index,
            value: weights[index],
            range,
        }),
        None => Ok(()),
    }
}

/// Replaces non-finite coefficients with zero and clamps the rest into `[-range, range]`.
pub fn repair(weights: &mut [f32], range: f32) {
    for w in weights {
        *w = if w.is_finite() {
            w.clamp(-range, range)
        } else {
            0.0
        };
    }
}

/// How two parents are combined into a child.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum CrossoverPolicy {
    /// Prefix of the first parent followed by the suffix of the second, cut at a random index.
    #[default]
    #[display("single-point")]
    SinglePoint,
    /// Per-coefficient mean of both parents.
    #[display("average")]
    Average,
    /// BLX-α: each coefficient drawn from the parents' interval widened by `alpha` on both
    /// sides.
    #[display("blend")]
    Blend,
}

impl CrossoverPolicy {
    /// Produces one child of `p1` and `p2`.
    ///
    /// `blend_alpha` is only used by [`CrossoverPolicy::Blend`].
    pub fn combine<R>(
        self,
        p1: &[f32],
        p2: &[f32],
        blend_alpha: f32,
        range: f32,
        rng: &mut R,
    ) -> Vec<f32>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::SinglePoint => single_point(p1, p2, rng),
            Self::Average => average(p1, p2),
            Self::Blend => blx_alpha(p1, p2, blend_alpha, range, rng),
        }
    }
}

/// Single-point crossover.
///
/// The cut index is uniform in `1..len`, so both parents contribute at least one
/// coefficient. Vectors shorter than two are copied from `p1`.
///
/// # Panics
///
/// Panics if parent vectors have different lengths.
pub fn single_point<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    if p1.len() < 2 {
        return p1.to_vec();
    }
    let cut = rng.random_range(1..p1.len());
    p1[..cut].iter().chain(&p2[cut..]).copied().collect()
}

/// Per-coefficient average of both parents.
///
/// # Panics
///
/// Panics if parent vectors have different lengths.
#[must_use]
pub fn average(p1: &[f32], p2: &[f32]) -> Vec<f32> {
    assert_eq!(p1.len(), p2.len());
    iter::zip(p1, p2).map(|(a, b)| (a + b) / 2.0).collect()
}

/// BLX-α (Blend Crossover) between two parents.
///
/// For parents `x1` and `x2` at position `i`:
///
/// 1. Compute `d = |x2 - x1|`
/// 2. Expand the interval to `[min - α·d, max + α·d]` and intersect it with
///    `[-range, range]`
/// 3. Sample the child uniformly from the result
///
/// Parents must lie within `[-range, range]`.
///
/// # Panics
///
/// Panics if parent vectors have different lengths.
pub fn blx_alpha<R>(p1: &[f32], p2: &[f32], alpha: f32, range: f32, rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    iter::zip(p1, p2)
        .map(|(&x1, &x2)| {
            let min = f32::min(x1, x2);
            let max = f32::max(x1, x2);
            let spread = f32::min(alpha * (max - min), 2.0 * range);
            let lower = f32::max(min - spread, -range);
            let upper = f32::min(max + spread, range);
            rng.random_range(lower..=upper)
        })
        .collect()
}

/// Gaussian mutation with a bounded step.
///
/// Each coefficient is mutated independently with probability `rate`. A mutated
/// coefficient moves by a delta drawn from `N(0, sigma)` and clamped to
/// `[-max_delta, max_delta]`; the result is clamped to `[-range, range]`. A non-finite
/// result is re-drawn a few times and otherwise the coefficient is left as it was.
#[derive(Debug, Clone, Copy)]
pub struct Mutation {
    rate: f64,
    delta: Normal<f32>,
    max_delta: f32,
    range: f32,
}

impl Mutation {
    const MAX_REDRAWS: usize = 8;

    pub fn new(rate: f32, sigma: f32, max_delta: f32, range: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::invalid("mutation_rate", "must be within [0, 1]"));
        }
        if !(sigma.is_finite() && sigma >= 0.0) {
            return Err(sigma_error());
        }
        if !(max_delta.is_finite() && max_delta > 0.0) {
            return Err(ConfigError::invalid(
                "max_mutation_delta",
                "must be a positive number",
            ));
        }
        if !(range > 0.0 && range <= MAX_WEIGHT_RANGE) {
            return Err(ConfigError::invalid(
                "weight_range",
                format!("must be within (0, {MAX_WEIGHT_RANGE}]"),
            ));
        }
        let delta = Normal::new(0.0, sigma).map_err(|_| sigma_error())?;
        Ok(Self {
            rate: rate.into(),
            delta,
            max_delta,
            range,
        })
    }

    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Mutates `weights` in place.
    pub fn apply<R>(&self, weights: &mut [f32], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for w in weights {
            if rng.random_bool(self.rate) {
                *w = self.perturb(*w, rng);
            }
        }
    }

    fn perturb<R>(&self, w: f32, rng: &mut R) -> f32
    where
        R: Rng + ?Sized,
    {
        for _ in 0..Self::MAX_REDRAWS {
            let delta = self
                .delta
                .sample(rng)
                .clamp(-self.max_delta, self.max_delta);
            let value = w + delta;
            if value.is_finite() {
                return value.clamp(-self.range, self.range);
            }
        }
        tracing::debug!(weight = w, "mutation kept the coefficient unchanged");
        w
    }
}

fn sigma_error() -> ConfigError {
    ConfigError::invalid("mutation_sigma", "must be a non-negative number")
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn rng() -> Pcg64Mcg {
        Pcg64Mcg::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_random_within_range() {
        let mut rng = rng();
        for _ in 0..100 {
            let weights = random(&mut rng, 0.25, 4);
            assert_eq!(weights.len(), 4);
            assert!(weights.iter().all(|w| (-0.25..=0.25).contains(w)));
        }
    }

    #[test]
    fn test_validate_reports_first_bad_coefficient() {
        assert!(validate(&[-1.0, 0.0, 1.0], 1.0).is_ok());
        let err = validate(&[0.0, 1.5, f32::NAN], 1.0).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.value, 1.5);
        let err = validate(&[0.0, f32::INFINITY], 1.0).unwrap_err();
        assert_eq!(err.index, 1);
    }

    #[test]
    fn test_repair() {
        let mut weights = [f32::NAN, 3.0, -2.0, 0.25, f32::NEG_INFINITY];
        repair(&mut weights, 1.0);
        assert_eq!(weights, [0.0, 1.0, -1.0, 0.25, 0.0]);
    }

    #[test]
    fn test_single_point_takes_prefix_and_suffix() {
        let p1 = [1.0; 6];
        let p2 = [-1.0; 6];
        let mut rng = rng();
        for _ in 0..50 {
            let child = single_point(&p1, &p2, &mut rng);
            let cut = child.iter().position(|&w| w < 0.0).unwrap();
            assert!((1..6).contains(&cut));
            assert!(child[..cut].iter().all(|&w| w == 1.0));
            assert!(child[cut..].iter().all(|&w| w == -1.0));
        }
        assert_eq!(single_point(&[0.5], &[-0.5], &mut rng), [0.5]);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[1.0, -0.5, 0.0], &[0.0, 0.5, 0.5]), [0.5, 0.0, 0.25]);
    }

    #[test]
    fn test_blx_alpha_stays_in_widened_interval() {
        let mut rng = rng();
        for _ in 0..100 {
            let child = blx_alpha(&[0.0, 0.9], &[0.2, 0.9], 0.5, 1.0, &mut rng);
            assert!((-0.101..=0.301).contains(&child[0]));
            assert!((child[1] - 0.9).abs() < f32::EPSILON);
        }
        let child = blx_alpha(&[-1.0], &[1.0], 1.0, 1.0, &mut rng);
        assert!((-1.0..=1.0).contains(&child[0]));
    }

    #[test]
    fn test_blx_alpha_with_overflowing_alpha() {
        let mut rng = rng();
        for alpha in [1e38, f32::MAX, f32::INFINITY] {
            let child = blx_alpha(&[-1.0, 0.5], &[1.0, 0.5], alpha, 1.0, &mut rng);
            assert!(validate(&child, 1.0).is_ok(), "{alpha}: {child:?}");
        }
    }

    #[test]
    fn test_weight_range_bound() {
        assert!(Mutation::new(0.1, 0.2, 0.5, MAX_WEIGHT_RANGE).is_ok());
        for range in [1e38, f32::INFINITY, f32::NAN, 0.0] {
            assert!(Mutation::new(0.1, 0.2, 0.5, range).is_err(), "{range}");
        }
        let weights = random(&mut rng(), MAX_WEIGHT_RANGE, 16);
        assert!(validate(&weights, MAX_WEIGHT_RANGE).is_ok());
    }

    #[test]
    fn test_zero_rate_mutation_is_identity() {
        let mutation = Mutation::new(0.0, 1.0, 1.0, 1.0).unwrap();
        let mut weights = vec![0.1, -0.2, 0.3, -0.4];
        mutation.apply(&mut weights, &mut rng());
        assert_eq!(weights, [0.1, -0.2, 0.3, -0.4]);
    }

    #[test]
    fn test_mutation_step_is_bounded() {
        let mutation = Mutation::new(1.0, 10.0, 0.05, 1.0).unwrap();
        let mut rng = rng();
        let before = vec![0.0; 16];
        let mut after = before.clone();
        mutation.apply(&mut after, &mut rng);
        assert!(iter::zip(&before, &after).all(|(b, a)| (a - b).abs() <= 0.05));
        assert_ne!(before, after);
    }

    #[test]
    fn test_invalid_mutation_parameters() {
        assert!(Mutation::new(1.5, 0.1, 0.1, 1.0).is_err());
        assert!(Mutation::new(0.5, -0.1, 0.1, 1.0).is_err());
        assert!(Mutation::new(0.5, f32::NAN, 0.1, 1.0).is_err());
        assert!(Mutation::new(0.5, 0.1, 0.0, 1.0).is_err());
        assert!(Mutation::new(0.5, 0.1, 0.1, f32::INFINITY).is_err());
    }

    #[test]
    fn test_crossover_policy_names() {
        assert_eq!(CrossoverPolicy::default(), CrossoverPolicy::SinglePoint);
        assert_eq!(CrossoverPolicy::Blend.to_string(), "blend");
        let policy: CrossoverPolicy = serde_json::from_str("\"single-point\"").unwrap();
        assert_eq!(policy, CrossoverPolicy::SinglePoint);
    }
}
