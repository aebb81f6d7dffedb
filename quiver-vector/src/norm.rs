/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! L2 norm helpers.

/// Tolerance on the squared norm when deciding whether a vector is unit length.
const UNIT_NORM_EPSILON: f32 = 1e-4;

/// Evaluate the square of the L2 norm of `v`.
#[inline]
pub fn l2_norm_squared(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum()
}

/// Returns `true` if `v` has unit L2 norm, within a small tolerance on the
/// squared norm.
///
/// Dot-product style quantization assumes its inputs were normalized upstream;
/// this check backs the debug assertions guarding that contract.
#[inline]
pub fn is_unit_vector(v: &[f32]) -> bool {
    (l2_norm_squared(v) - 1.0).abs() <= UNIT_NORM_EPSILON
}

///////////
// Tests //
///////////
