/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! # vector
//!
//! Scalar numeric kernels for operating on embedding vectors: norms, one-pass
//! centering statistics, and interval-based quantization primitives. These are
//! the building blocks consumed by the quantizers in `quiver-quantization`.
//!
//! Everything in this crate is a pure function over caller-supplied buffers:
//! no allocation, no retained state, a single pass over the data wherever the
//! math allows it. This is also the crate where SIMD specializations of these
//! kernels would live; the scalar forms here define the reference semantics.
#![cfg_attr(
    not(test),
    warn(clippy::panic, clippy::unwrap_used, clippy::expect_used)
)]

pub mod interval;
pub mod norm;
pub mod stats;

pub use interval::{grid_points, quantize_loss, quantize_with_interval, GridPoints};
pub use stats::{center_and_stats_dot_product, center_and_stats_euclidean, CenteredStats};
