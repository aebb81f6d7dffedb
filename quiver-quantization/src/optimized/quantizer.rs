/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use quiver_vector::{
    interval::{grid_points, quantize_loss, quantize_with_interval, GridPoints},
    norm::is_unit_vector,
    stats::{center_and_stats_dot_product, center_and_stats_euclidean, CenteredStats},
};

use crate::num::Lambda;

/// Similarity measure the quantization should preserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMetric {
    /// Squared Euclidean distance.
    Euclidean,

    /// Dot product over unit-normalized vectors. Covers cosine similarity as
    /// well: once inputs are normalized upstream the two coincide.
    ///
    /// Normalization is a caller contract, checked only in debug builds.
    /// Feeding non-normalized vectors in release builds degrades accuracy
    /// silently rather than failing.
    DotProduct,
}

/// A quantization interval: the affine range `[lower, upper]` mapped onto the
/// `2^bits` discrete code levels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Interval {
    pub lower: f32,
    pub upper: f32,
}

impl Interval {
    /// Near-optimal starting interval for roughly Gaussian component
    /// distributions: the minimum-MSE grid entry for `bits`, scaled to the
    /// vector's standard deviation and mean, and clamped to the observed
    /// component range.
    ///
    /// Because this start is already close to optimal for well-behaved
    /// vectors, the descent in [`OptimizedScalarQuantizer`] typically
    /// converges within a couple of rounds or not at all.
    pub fn initial(bits: u8, stats: &CenteredStats) -> Self {
        debug_assert!((1..=8).contains(&bits), "bits must be in [1, 8]");

        let std = stats.variance.sqrt();
        let row = &MINIMUM_MSE_GRID[usize::from(bits) - 1];
        Self {
            lower: clamp(row[0] * std + stats.mean, stats.min, stats.max),
            upper: clamp(row[1] * std + stats.mean, stats.min, stats.max),
        }
    }
}

// The initial interval is set to the minimum MSE grid for each number of bits.
// These starting points are derived from the optimal MSE grid for a uniform
// distribution.
const MINIMUM_MSE_GRID: [[f32; 2]; 8] = [
    [-0.798, 0.798],
    [-1.493, 1.493],
    [-2.051, 2.051],
    [-2.514, 2.514],
    [-2.916, 2.916],
    [-3.278, 3.278],
    [-3.611, 3.611],
    [-3.922, 3.922],
];

/// Two refined bounds closer than this to the current ones count as converged.
const CONVERGENCE_THRESHOLD: f32 = 1e-8;

// Not `f32::clamp`, which panics when `min > max` (degenerate statistics from
// an empty vector).
#[inline]
fn clamp(x: f32, min: f32, max: f32) -> f32 {
    x.max(min).min(max)
}

/// How interval refinement ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntervalOutcome {
    /// The descent ran to completion: the iteration budget was exhausted, the
    /// candidate interval converged, or the last candidate regressed the loss
    /// and was discarded in favor of the current interval.
    Converged(Interval),

    /// The input admits no refinement: the vector norm is zero (the descent
    /// scale factor is non-finite) or the normal equations went singular. The
    /// carried interval is whatever the descent held when it stopped, which
    /// is never worse than the initial one.
    Unoptimizable(Interval),
}

impl IntervalOutcome {
    /// The interval to quantize with, regardless of how the descent ended.
    pub fn interval(self) -> Interval {
        match self {
            Self::Converged(interval) | Self::Unoptimizable(interval) => interval,
        }
    }
}

/// Output record for one vector at one bit width.
///
/// Everything a caller needs to turn code-level arithmetic against a query
/// back into an approximate similarity: the interval defining the affine
/// code map, the metric-specific correction scalar, and the precomputed code
/// sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizationResult {
    /// Final (refined or initial) quantization interval.
    pub interval: Interval,

    /// Correction scalar for similarity reconstruction: the squared norm of
    /// the centered vector for [`SimilarityMetric::Euclidean`], the raw
    /// vector/centroid dot product for [`SimilarityMetric::DotProduct`].
    pub additional_correction: f32,

    /// Sum of all emitted codes, used as a precomputed partial term when
    /// scoring against a query.
    pub component_sum: u32,
}

/// Scalar quantizer that optimizes its interval per vector.
///
/// One instance is configured per similarity metric and reused for a stream
/// of vectors. The instance owns scratch state that is mutated in place on
/// every call, so a single instance must not be shared across threads; pool
/// one per worker instead.
#[derive(Debug)]
pub struct OptimizedScalarQuantizer {
    metric: SimilarityMetric,
    lambda: f32,
    max_iters: usize,

    // Scratch reused across calls; entry points take `&mut self` and results
    // are copied out, so none of this escapes the instance.
    stats: CenteredStats,
    grid: GridPoints,
    interval: Interval,
}

impl OptimizedScalarQuantizer {
    /// Default damping weight balancing the dot-product-preserving error term
    /// against the isotropic reconstruction error.
    //
    // SAFETY: 0.1 lies in [0, 1].
    pub const DEFAULT_LAMBDA: Lambda = unsafe { Lambda::new_unchecked(0.1) };

    /// Default number of coordinate-descent rounds.
    pub const DEFAULT_ITERS: usize = 5;

    /// Instantiate a quantizer for `metric` with the default damping weight
    /// and iteration budget.
    pub fn new(metric: SimilarityMetric) -> Self {
        Self::with_parameters(metric, Self::DEFAULT_LAMBDA, Self::DEFAULT_ITERS)
    }

    /// Instantiate a quantizer with explicit parameters.
    ///
    /// `max_iters` bounds the descent; `0` keeps the initial interval
    /// untouched.
    pub fn with_parameters(metric: SimilarityMetric, lambda: Lambda, max_iters: usize) -> Self {
        Self {
            metric,
            lambda: lambda.into_inner(),
            max_iters,
            stats: CenteredStats::default(),
            grid: GridPoints::default(),
            interval: Interval::default(),
        }
    }

    /// The similarity metric this quantizer preserves.
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// The damping weight in use.
    pub fn lambda(&self) -> f32 {
        self.lambda
    }

    /// The iteration budget of the descent.
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Quantize `vector` against `centroid` at `bits` bits per component.
    ///
    /// The vector is centered in place as the first step; on return it holds
    /// the centered components. Codes land in `codes[..vector.len()]`, each
    /// in `[0, 2^bits - 1]`.
    ///
    /// Degenerate numerics (zero-norm vectors, singular refinement systems)
    /// are not errors: the initial interval is used as-is and the call
    /// completes normally.
    ///
    /// # Preconditions (debug assertions only)
    ///
    /// * `1 <= bits <= 8`
    /// * `vector.len() == centroid.len()` and `codes.len() >= vector.len()`
    /// * for [`SimilarityMetric::DotProduct`], both `vector` and `centroid`
    ///   are unit-normalized
    pub fn quantize(
        &mut self,
        vector: &mut [f32],
        centroid: &[f32],
        bits: u8,
        codes: &mut [u8],
    ) -> QuantizationResult {
        self.debug_assert_inputs(vector, centroid);

        self.stats = match self.metric {
            SimilarityMetric::Euclidean => center_and_stats_euclidean(vector, centroid),
            SimilarityMetric::DotProduct => center_and_stats_dot_product(vector, centroid),
        };
        self.quantize_centered(vector, bits, codes)
    }

    /// Quantize `vector` at several bit widths in one call.
    ///
    /// Centering and statistics run once; the interval
    /// initialization/refinement/quantization sequence then runs
    /// independently per entry of `bits`, writing into the matching buffer of
    /// `codes`. One result is returned per requested width, in order. A
    /// single-element `bits` produces exactly the result of [`Self::quantize`].
    pub fn quantize_multi(
        &mut self,
        vector: &mut [f32],
        centroid: &[f32],
        bits: &[u8],
        codes: &mut [&mut [u8]],
    ) -> Vec<QuantizationResult> {
        debug_assert_eq!(
            bits.len(),
            codes.len(),
            "one code buffer is required per requested bit width"
        );
        self.debug_assert_inputs(vector, centroid);

        self.stats = match self.metric {
            SimilarityMetric::Euclidean => center_and_stats_euclidean(vector, centroid),
            SimilarityMetric::DotProduct => center_and_stats_dot_product(vector, centroid),
        };

        let vector = &*vector;
        bits.iter()
            .zip(codes.iter_mut())
            .map(|(&bits, codes)| self.quantize_centered(vector, bits, codes))
            .collect()
    }

    /// The init/refine/quantize sequence over an already-centered vector,
    /// with `self.stats` describing it.
    fn quantize_centered(
        &mut self,
        vector: &[f32],
        bits: u8,
        codes: &mut [u8],
    ) -> QuantizationResult {
        debug_assert!((1..=8).contains(&bits), "bits must be in [1, 8]");
        debug_assert!(
            codes.len() >= vector.len(),
            "code buffer shorter than vector"
        );

        let points = 1u32 << bits;
        self.interval = Interval::initial(bits, &self.stats);
        let interval = self.optimize_interval(vector, codes, points).interval();
        let component_sum =
            quantize_with_interval(vector, codes, interval.lower, interval.upper, bits);

        QuantizationResult {
            interval,
            additional_correction: match self.metric {
                SimilarityMetric::Euclidean => self.stats.norm_squared,
                SimilarityMetric::DotProduct => self.stats.centroid_dot,
            },
            component_sum,
        }
    }

    /// Refine `self.interval` by coordinate descent on the quantization loss.
    ///
    /// Each round accumulates the grid moments for the current code
    /// assignment, solves the 2x2 normal equations for candidate bounds, and
    /// accepts the candidate only if it does not regress the loss. `codes` is
    /// used as scratch by the fused loss evaluations; its contents are
    /// unspecified afterwards, and callers re-quantize with the returned
    /// interval.
    fn optimize_interval(
        &mut self,
        vector: &[f32],
        codes: &mut [u8],
        points: u32,
    ) -> IntervalOutcome {
        let norm_squared = self.stats.norm_squared;
        let scale = (1.0 - self.lambda) / norm_squared;
        if !scale.is_finite() {
            return IntervalOutcome::Unoptimizable(self.interval);
        }

        let mut loss = quantize_loss(
            vector,
            codes,
            self.interval.lower,
            self.interval.upper,
            points,
            norm_squared,
            self.lambda,
        );

        for _ in 0..self.max_iters {
            self.grid = grid_points(vector, codes, points);
            let GridPoints {
                daa,
                dab,
                dbb,
                dax,
                dbx,
            } = self.grid;

            let m0 = scale * dax * dax + self.lambda * daa;
            let m1 = scale * dax * dbx + self.lambda * dab;
            let m2 = scale * dbx * dbx + self.lambda * dbb;
            let det = f64::from(m0) * f64::from(m2) - f64::from(m1) * f64::from(m1);
            // A singular system has no unique improved interval.
            if det == 0.0 {
                return IntervalOutcome::Unoptimizable(self.interval);
            }

            let lower =
                ((f64::from(m2) * f64::from(dax) - f64::from(m1) * f64::from(dbx)) / det) as f32;
            let upper =
                ((f64::from(m0) * f64::from(dbx) - f64::from(m1) * f64::from(dax)) / det) as f32;

            if (self.interval.lower - lower).abs() < CONVERGENCE_THRESHOLD
                && (self.interval.upper - upper).abs() < CONVERGENCE_THRESHOLD
            {
                return IntervalOutcome::Converged(self.interval);
            }

            let candidate_loss = quantize_loss(
                vector,
                codes,
                lower,
                upper,
                points,
                norm_squared,
                self.lambda,
            );
            // This descent, unlike k-means, is not guaranteed to improve the
            // loss every round. Keep the last good interval rather than
            // backtracking.
            if candidate_loss > loss {
                return IntervalOutcome::Converged(self.interval);
            }

            self.interval = Interval { lower, upper };
            loss = candidate_loss;
        }

        IntervalOutcome::Converged(self.interval)
    }

    fn debug_assert_inputs(&self, vector: &[f32], centroid: &[f32]) {
        debug_assert_eq!(
            vector.len(),
            centroid.len(),
            "vector and centroid dimensions differ"
        );
        debug_assert!(
            self.metric != SimilarityMetric::DotProduct || is_unit_vector(vector),
            "dot-product quantization expects a unit-normalized vector"
        );
        debug_assert!(
            self.metric != SimilarityMetric::DotProduct || is_unit_vector(centroid),
            "dot-product quantization expects a unit-normalized centroid"
        );
    }
}

///////////
// Tests //
///////////
