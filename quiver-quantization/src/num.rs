/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Number types with limited dynamic range.

use thiserror::Error;

/// A weight constrained to the unit interval `[0, 1]`.
///
/// The optimized scalar quantizer uses this to blend the two terms of its
/// loss: `0` weighs the dot-product-preserving error term exclusively, `1`
/// the plain squared reconstruction error.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Lambda(f32);

#[derive(Debug, Clone, Copy, Error)]
#[error("value {0:?} is outside the unit interval [0, 1]")]
pub struct NotUnitIntervalError(f32);

impl Lambda {
    /// Create a new `Lambda` if the given value lies in `[0, 1]`.
    ///
    /// NaN is rejected.
    pub fn new(value: f32) -> Result<Self, NotUnitIntervalError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(NotUnitIntervalError(value))
        }
    }

    /// Create a new `Lambda` without checking that the value lies in `[0, 1]`.
    ///
    /// # Safety
    ///
    /// The value must lie in `[0, 1]`.
    pub const unsafe fn new_unchecked(value: f32) -> Self {
        Self(value)
    }

    /// Consume `self` and return the inner value.
    pub fn into_inner(self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambda() {
        for value in [0.0, 0.1, 0.5, 1.0] {
            let x = Lambda::new(value);
            assert!(x.is_ok(), "rejected {}", value);
            assert_eq!(x.unwrap().into_inner(), value);
        }

        for value in [-0.001, 1.001, -1.0, f32::NAN, f32::INFINITY] {
            let x = Lambda::new(value);
            assert!(x.is_err(), "accepted {}", value);
            assert_eq!(
                x.unwrap_err().to_string(),
                format!("value {:?} is outside the unit interval [0, 1]", value)
            );
        }

        // SAFETY: 0.25 lies in [0, 1].
        let x = unsafe { Lambda::new_unchecked(0.25) };
        assert_eq!(x.into_inner(), 0.25);
    }
}
