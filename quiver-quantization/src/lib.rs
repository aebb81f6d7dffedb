/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Quantizers for compressing embedding vectors while preserving the
//! geometry that approximate nearest-neighbor search cares about.
//!
//! # Quantizers
//!
//! * [Optimized scalar](crate::optimized): per-vector scalar quantization to
//!   1-8 bits per component, with the quantization interval refined by
//!   coordinate descent to minimize an anisotropic loss. This is the encoding
//!   used on the indexing and query hot paths.
//!
//! The numeric kernels backing the quantizers (centering statistics, interval
//! quantization, loss evaluation) live in `quiver-vector` and are treated
//! here as pure functions over buffers; SIMD specializations slot in there
//! without this crate changing.
#![cfg_attr(
    not(test),
    warn(clippy::panic, clippy::unwrap_used, clippy::expect_used)
)]

pub mod num;
pub mod optimized;
