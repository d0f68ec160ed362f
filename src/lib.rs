//! This crate provides efficient Modular arithmetic operations
//! for various integer types, including primitive integers and
//! `num-bigint`. The latter option is enabled optionally.
//!
//! Beyond the plain `ModularOps`/`ModularInteger` surface (kept for
//! interoperability with existing callers), the crate exposes a
//! range-specialized Montgomery-form engine: [`MontgomeryForm`] parametric
//! over a host integer type and one of four modulus-range variants
//! ([`FullRange`], [`HalfRange`], [`QuarterRange`], [`SixthRange`]), plus
//! windowed 2^k-ary exponentiation ([`pow::scalar`], [`pow::array`],
//! [`pow::partial`]). See `DESIGN.md` for how this maps onto the original
//! single-width `Montgomery`/`MontgomeryInt` implementation.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

use core::ops::{Add, Mul, Neg, Sub};

/// This trait describes modular arithmetic operations
pub trait ModularOps<Rhs = Self, Modulus = Self> {
    type Output;

    /// Return (self + rhs) % m
    fn addm(self, rhs: Rhs, m: Modulus) -> Self::Output;

    /// Return (self + rhs) % m
    fn subm(self, rhs: Rhs, m: Modulus) -> Self::Output;

    /// Return (self * rhs) % m
    fn mulm(self, rhs: Rhs, m: Modulus) -> Self::Output;

    /// Return (self ^ exp) % m
    fn powm(self, exp: Rhs, m: Modulus) -> Self::Output;

    /// Return (-self) % m and make sure the result is normalized in range [0,m)
    fn negm(self, m: Modulus) -> Self::Output;

    /// Calculate modular inverse (x such that self*x = 1 mod m).
    ///
    /// This operation is only available for integer that is coprime to `m`
    fn invm(self, m: Modulus) -> Option<Self::Output>
    where
        Self: Sized;

    /// Calculate Jacobi Symbol (a|n), where a is self
    ///
    /// Note that we don't provide Legendre symbol function
    /// here, as it depends on primality test. However, if
    /// n is surely a prime, this function can be directly used as
    /// Legendre symbol.
    ///
    /// # Panics
    /// if n is negative or even
    fn jacobi(self, n: Modulus) -> i8;

    /// Calculate Kronecker Symbol (a|n), where a is self
    fn kronecker(self, n: Modulus) -> i8;

    // TODO: ModularOps sqrt aka Quadratic residue
    // fn sqrtm(self, m: Modulus);
}

/// Represents an number defined in a modulo ring ℤ/nℤ
///
/// The operators should panic if the modulus of two number
/// are not the same.
pub trait ModularInteger:
    Sized
    + PartialEq
    + Add<Self, Output = Self>
    + Sub<Self, Output = Self>
    + Neg<Output = Self>
    + Mul<Self, Output = Self>
    // TODO: impl Pow
{
    /// The underlying representation type of the integer
    type Base;

    /// Return the modulus of the ring
    fn modulus(&self) -> &Self::Base;

    /// Return the normalized residue of this integer in the ring
    fn residue(&self) -> Self::Base;

    /// Convert an normal integer into the same ring.
    ///
    /// This method should be perferred over the static
    /// constructor to prevent unnecessary overhead of pre-computation.
    fn new(&self, n: Self::Base) -> Self;
}

mod error;
mod form;
mod monty;
mod pow;
mod prim;
mod redc;
mod variant;
mod word;

pub use error::ContractViolation;
pub use form::{CanonicalValue, FusingValue, MontgomeryForm, MontgomeryValue};
pub use monty::MontgomeryInt;
pub use pow::array::ArrayKaryPow;
pub use pow::partial::PartialArrayKaryPow;
pub use pow::scalar::{KaryPow, MultiTableKaryPow, ScalarPow, SquaringValue};
pub use pow::MAX_WINDOW_BITS;
pub use variant::{ChainSquaringVariant, FullRange, HalfRange, QuarterRange, SixthRange, Variant};
pub use word::{Cmov, LowLatency, LowUops, Masked, PerformanceTag, SelectStrategy, WideArith};

#[cfg(feature = "num-bigint")]
mod bigint;
