/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! One-pass centering and statistics kernels.
//!
//! Quantizing a vector against a centroid starts by subtracting the centroid
//! (reducing the dynamic range the interval has to cover) and collecting the
//! scalar statistics the interval construction needs. Both happen in a single
//! pass here, with the centered components written back over the input.
//!
//! The mean and variance use Welford's online update so the pass stays
//! numerically stable for long vectors.

/// Per-vector statistics produced by the centering kernels.
///
/// All fields describe the *centered* vector, except [`centroid_dot`], which
/// is accumulated against the raw input before centering and is only populated
/// by [`center_and_stats_dot_product`].
///
/// [`centroid_dot`]: CenteredStats::centroid_dot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CenteredStats {
    /// Mean of the centered components.
    pub mean: f32,

    /// Population variance of the centered components.
    pub variance: f32,

    /// Squared L2 norm of the centered vector.
    pub norm_squared: f32,

    /// Smallest centered component.
    pub min: f32,

    /// Largest centered component.
    pub max: f32,

    /// Dot product between the raw vector and the centroid. Zero when
    /// produced by the Euclidean kernel, which has no use for it.
    pub centroid_dot: f32,
}

/// Center `vector` against `centroid` in place and collect the statistics
/// needed to quantize it for Euclidean distance.
///
/// The vector and centroid must have the same length; this is a caller
/// contract checked only in debug builds.
#[inline]
pub fn center_and_stats_euclidean(vector: &mut [f32], centroid: &[f32]) -> CenteredStats {
    debug_assert_eq!(
        vector.len(),
        centroid.len(),
        "vector and centroid dimensions differ"
    );

    let dim = vector.len();
    let mut mean = 0.0f32;
    let mut var_sum = 0.0f32;
    let mut norm_squared = 0.0f32;
    let mut min = f32::MAX;
    let mut max = f32::MIN;

    for (i, (x, c)) in vector.iter_mut().zip(centroid.iter()).enumerate() {
        let centered = *x - *c;
        *x = centered;
        min = min.min(centered);
        max = max.max(centered);
        norm_squared += centered * centered;
        let delta = centered - mean;
        mean += delta / (i + 1) as f32;
        var_sum += delta * (centered - mean);
    }

    CenteredStats {
        mean,
        variance: var_sum / dim as f32,
        norm_squared,
        min,
        max,
        centroid_dot: 0.0,
    }
}

/// Center `vector` against `centroid` in place and collect the statistics
/// needed to quantize it for dot-product style similarities.
///
/// Identical to [`center_and_stats_euclidean`] except that the dot product
/// between the raw vector and the centroid is accumulated as well; callers
/// need it to reconstruct the true similarity from codes computed against the
/// centered vector.
#[inline]
pub fn center_and_stats_dot_product(vector: &mut [f32], centroid: &[f32]) -> CenteredStats {
    debug_assert_eq!(
        vector.len(),
        centroid.len(),
        "vector and centroid dimensions differ"
    );

    let dim = vector.len();
    let mut mean = 0.0f32;
    let mut var_sum = 0.0f32;
    let mut norm_squared = 0.0f32;
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    let mut centroid_dot = 0.0f32;

    for (i, (x, c)) in vector.iter_mut().zip(centroid.iter()).enumerate() {
        centroid_dot += *x * *c;
        let centered = *x - *c;
        *x = centered;
        min = min.min(centered);
        max = max.max(centered);
        norm_squared += centered * centered;
        let delta = centered - mean;
        mean += delta / (i + 1) as f32;
        var_sum += delta * (centered - mean);
    }

    CenteredStats {
        mean,
        variance: var_sum / dim as f32,
        norm_squared,
        min,
        max,
        centroid_dot,
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    use super::*;

    // Two-pass reference statistics over an already-centered vector.
    fn reference_stats(centered: &[f32]) -> CenteredStats {
        let dim = centered.len() as f32;
        let mean = centered.iter().sum::<f32>() / dim;
        let variance = centered.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / dim;
        let norm_squared = centered.iter().map(|x| x * x).sum::<f32>();
        let min = centered.iter().copied().fold(f32::MAX, f32::min);
        let max = centered.iter().copied().fold(f32::MIN, f32::max);
        CenteredStats {
            mean,
            variance,
            norm_squared,
            min,
            max,
            centroid_dot: 0.0,
        }
    }

    cfg_if::cfg_if! {
        if #[cfg(miri)] {
            const NUM_TRIALS: usize = 1;
            const MAX_DIM: usize = 16;
        } else {
            const NUM_TRIALS: usize = 8;
            const MAX_DIM: usize = 192;
        }
    }

    #[test]
    fn test_euclidean_against_reference() {
        let mut rng = StdRng::seed_from_u64(0x1be5021ac8d00f37);
        let dist = Normal::<f32>::new(0.25, 1.0).unwrap();

        for dim in 1..MAX_DIM {
            for _ in 0..NUM_TRIALS {
                let raw: Vec<f32> = (0..dim).map(|_| dist.sample(&mut rng)).collect();
                let centroid: Vec<f32> = (0..dim).map(|_| dist.sample(&mut rng)).collect();

                let mut vector = raw.clone();
                let stats = center_and_stats_euclidean(&mut vector, &centroid);

                // The vector is centered in place.
                for ((v, r), c) in vector.iter().zip(raw.iter()).zip(centroid.iter()) {
                    assert_eq!(*v, r - c);
                }

                let expected = reference_stats(&vector);
                assert_relative_eq!(stats.mean, expected.mean, epsilon = 1e-5);
                assert_relative_eq!(
                    stats.variance,
                    expected.variance,
                    epsilon = 1e-5,
                    max_relative = 1e-4
                );
                assert_relative_eq!(
                    stats.norm_squared,
                    expected.norm_squared,
                    max_relative = 1e-5
                );
                assert_eq!(stats.min, expected.min, "dim {}: {:?}", dim, vector);
                assert_eq!(stats.max, expected.max, "dim {}: {:?}", dim, vector);
                assert_eq!(stats.centroid_dot, 0.0);
            }
        }
    }

    #[test]
    fn test_dot_product_cross_term() {
        let mut rng = StdRng::seed_from_u64(0xe90d6f41b2a3875c);
        let dist = Normal::<f32>::new(0.0, 1.0).unwrap();

        for dim in 1..MAX_DIM {
            for _ in 0..NUM_TRIALS {
                let raw: Vec<f32> = (0..dim).map(|_| dist.sample(&mut rng)).collect();
                let centroid: Vec<f32> = (0..dim).map(|_| dist.sample(&mut rng)).collect();

                let expected_dot: f32 = raw.iter().zip(centroid.iter()).map(|(a, b)| a * b).sum();

                let mut vector = raw.clone();
                let stats = center_and_stats_dot_product(&mut vector, &centroid);
                assert_relative_eq!(stats.centroid_dot, expected_dot, epsilon = 1e-4);

                // Everything else agrees with the Euclidean kernel.
                let mut vector_euclidean = raw.clone();
                let euclidean = center_and_stats_euclidean(&mut vector_euclidean, &centroid);
                assert_eq!(vector, vector_euclidean);
                assert_eq!(stats.mean, euclidean.mean);
                assert_eq!(stats.variance, euclidean.variance);
                assert_eq!(stats.norm_squared, euclidean.norm_squared);
                assert_eq!(stats.min, euclidean.min);
                assert_eq!(stats.max, euclidean.max);
            }
        }
    }

    #[test]
    fn test_constant_vector() {
        let mut vector = vec![2.5f32; 17];
        let centroid = vec![1.0f32; 17];
        let stats = center_and_stats_euclidean(&mut vector, &centroid);

        assert_eq!(stats.mean, 1.5);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.min, 1.5);
        assert_eq!(stats.max, 1.5);
        assert_relative_eq!(stats.norm_squared, 17.0 * 1.5 * 1.5, max_relative = 1e-6);
    }

    #[test]
    fn test_zero_vector() {
        let mut vector = vec![0.0f32; 8];
        let centroid = vec![0.0f32; 8];
        let stats = center_and_stats_euclidean(&mut vector, &centroid);

        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.norm_squared, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
    }
}
