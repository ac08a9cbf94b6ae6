//! Scalar capability layer: the front and dense kernel are generic over this
//! trait rather than hard-coded to `f64`, so the same code services both the
//! real and complex instantiations (REDESIGN FLAGS: scalar genericity).

use num_complex::Complex64;
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Capability set required of a frontal-matrix entry type: addition,
/// multiplication, conjugation and a norm. `Trans::C` (conjugate transpose)
/// degenerates to a plain transpose when [`Scalar::conj`] is the identity.
pub trait Scalar:
    Copy
    + Clone
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + Sum
    + Send
    + Sync
    + 'static
{
    /// Additive identity.
    fn zero() -> Self;
    /// Multiplicative identity.
    fn one() -> Self;
    /// Complex conjugate (identity for real scalars).
    fn conj(self) -> Self;
    /// Absolute value / modulus, as an `f64` for tolerance comparisons.
    fn norm(self) -> f64;
    /// Construct from a real `f64` (used by the RNG and by test fixtures).
    fn from_f64(v: f64) -> Self;
    /// Reciprocal, used by the hand-rolled LU elimination in `DenseHss`.
    fn recip(self) -> Self {
        Self::one() / self
    }
}

impl Scalar for f64 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn conj(self) -> Self {
        self
    }
    fn norm(self) -> f64 {
        self.abs()
    }
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Scalar for Complex64 {
    fn zero() -> Self {
        Complex64::new(0.0, 0.0)
    }
    fn one() -> Self {
        Complex64::new(1.0, 0.0)
    }
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }
    fn norm(self) -> f64 {
        Complex64::norm(self)
    }
    fn from_f64(v: f64) -> Self {
        Complex64::new(v, 0.0)
    }
}
