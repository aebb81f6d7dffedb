/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Interval-based quantization kernels.
//!
//! A quantization interval `[lower, upper]` maps each component onto one of
//! `points = 2^bits` levels:
//! ```math
//! code_i = round((clamp(x_i, lower, upper) - lower) / step)
//! step   = (upper - lower) / (points - 1)
//! ```
//! and the de-quantized value is `lower + step * code_i`.
//!
//! Three kernels operate on that map:
//!
//! * [`quantize_with_interval`]: emit codes and their sum.
//! * [`quantize_loss`]: emit codes and evaluate the anisotropic quantization
//!   loss in the same pass.
//! * [`grid_points`]: accumulate the five second moments of the
//!   down-projected grid coordinates that interval refinement needs to solve
//!   its 2x2 system.

/// Second-moment accumulators of the down-projected grid coordinates against
/// the raw component values.
///
/// With `s_i = code_i / (points - 1)` in `[0, 1]`, a de-quantized component is
/// the convex combination `lower * (1 - s_i) + upper * s_i`. Refining the
/// interval bounds therefore needs the moments of `(1 - s_i)` and `s_i`
/// against themselves and against the raw values `x_i`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridPoints {
    /// `sum (1 - s_i)^2`
    pub daa: f32,
    /// `sum (1 - s_i) * s_i`
    pub dab: f32,
    /// `sum s_i^2`
    pub dbb: f32,
    /// `sum (1 - s_i) * x_i`
    pub dax: f32,
    /// `sum s_i * x_i`
    pub dbx: f32,
}

/// Accumulate the [`GridPoints`] of `vector` against the codes currently in
/// `codes`, for a quantization grid of `points` levels.
#[inline]
pub fn grid_points(vector: &[f32], codes: &[u8], points: u32) -> GridPoints {
    debug_assert!(
        codes.len() >= vector.len(),
        "code buffer shorter than vector"
    );

    let steps = (points - 1) as f32;
    let mut g = GridPoints::default();
    for (&x, &code) in vector.iter().zip(codes.iter()) {
        let s = f32::from(code) / steps;
        let ms = 1.0 - s;
        g.daa = ms.mul_add(ms, g.daa);
        g.dab = ms.mul_add(s, g.dab);
        g.dbb = s.mul_add(s, g.dbb);
        g.dax = ms.mul_add(x, g.dax);
        g.dbx = s.mul_add(x, g.dbx);
    }
    g
}

/// Quantize `vector` into `codes` using the affine map defined by
/// `[lower, upper]` and `bits` bits per component. Returns the sum of the
/// emitted codes.
///
/// Codes land in `[0, 2^bits - 1]`. A degenerate interval (`lower == upper`)
/// collapses every component to code 0.
#[inline]
pub fn quantize_with_interval(
    vector: &[f32],
    codes: &mut [u8],
    lower: f32,
    upper: f32,
    bits: u8,
) -> u32 {
    debug_assert!((1..=8).contains(&bits), "bits must be in [1, 8]");
    debug_assert!(
        codes.len() >= vector.len(),
        "code buffer shorter than vector"
    );

    let steps = ((1u32 << bits) - 1) as f32;
    let step = (upper - lower) / steps;
    let inv_step = 1.0 / step;
    let mut sum = 0u32;
    for (&x, code) in vector.iter().zip(codes.iter_mut()) {
        let clamped = x.max(lower).min(upper);
        // A degenerate interval makes this NaN; the saturating cast turns
        // that into code 0.
        let assignment = ((clamped - lower) * inv_step).round() as u8;
        sum += u32::from(assignment);
        *code = assignment;
    }
    sum
}

/// Quantize-and-dequantize `vector` against `[lower, upper]` and evaluate the
/// anisotropic quantization loss
/// ```math
/// (1 - lambda) * (sum x_i * (x_i - xq_i))^2 / norm_squared
///     + lambda * sum (x_i - xq_i)^2
/// ```
/// where `xq_i` is the de-quantized value of component `i`. The first term
/// penalizes error parallel to the vector (what a dot product against it
/// sees); the second is the plain squared reconstruction error.
///
/// The codes derived along the way are written into `codes`; callers that
/// need codes for a *final* interval should re-quantize explicitly with
/// [`quantize_with_interval`].
#[inline]
pub fn quantize_loss(
    vector: &[f32],
    codes: &mut [u8],
    lower: f32,
    upper: f32,
    points: u32,
    norm_squared: f32,
    lambda: f32,
) -> f32 {
    debug_assert!(
        codes.len() >= vector.len(),
        "code buffer shorter than vector"
    );

    let step = (upper - lower) / (points - 1) as f32;
    let inv_step = 1.0 / step;
    let mut xe = 0.0f32;
    let mut e = 0.0f32;
    for (&x, code) in vector.iter().zip(codes.iter_mut()) {
        let clamped = x.max(lower).min(upper);
        let assignment = ((clamped - lower) * inv_step).round() as u8;
        *code = assignment;
        let xq = step.mul_add(f32::from(assignment), lower);
        let diff = x - xq;
        xe = x.mul_add(diff, xe);
        e = diff.mul_add(diff, e);
    }
    (1.0 - lambda) * xe * xe / norm_squared + lambda * e
}

///////////
// Tests //
///////////
