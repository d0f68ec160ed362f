//! The four modulus-range variants.
//!
//! Each variant is a zero-sized tag type. Rather than the source's
//! curiously-recurring-template "base class calls into derived class"
//! shape, dispatch is a plain trait resolved at compile time via
//! monomorphization - the redesign the source notes call for (see
//! `DESIGN.md`, "Deep class hierarchy -> variant tag + interface").

use crate::word::{SelectStrategy, WideArith};

/// Per-variant hooks: permitted modulus bound, REDC finalization, and the
/// modular add/subtract/canonicalization that differ by representative
/// range.
///
/// Every hook is generic over a [`SelectStrategy`] `S` so that the
/// performance tag chosen at the [`crate::form::MontgomeryForm`] call site
/// (`LowLatency` -> masked blend, `LowUops` -> cmov) picks the branchless
/// primitive used throughout, without any runtime branch on the tag
/// itself.
pub trait Variant: Copy + Clone + Default + 'static {
    /// `1` for Full/Half (`[0, n)` internal range), `2` for Quarter/Sixth
    /// (`[0, 2n)`).
    const RANGE_MULTIPLIER: u32;

    /// Whether `famul`'s `x + canonical_y` can be formed directly in `T`
    /// and fed to a multiply without an intervening modular reduction.
    /// Derived per variant (see `DESIGN.md`); true only for Half and
    /// Sixth - Quarter's wider internal range defeats the multiply
    /// precondition even though the raw sum still fits in `T`.
    const FAMUL_DIRECT_SUM: bool;

    /// Largest odd modulus this variant accepts.
    fn max_modulus<T: WideArith>() -> T;

    /// `1 < n <= max_modulus(Self)` and `n` odd.
    fn check_modulus<T: WideArith>(n: T) -> bool {
        n > T::ONE && (n & T::ONE) == T::ONE && n <= Self::max_modulus::<T>()
    }

    /// Bring a raw `REDC` result (always produced in `[0, 2n)` by
    /// [`crate::redc::redc_core`]) into this variant's internal
    /// representative range.
    fn finalize_redc<T: WideArith, S: SelectStrategy>(t: T, n: T) -> T;

    /// Map an internal-range value to the unique representative in
    /// `[0, n)`.
    fn canonicalize<T: WideArith, S: SelectStrategy>(x: T, n: T) -> T;

    /// Modular add of two internal-range values, result in the same
    /// internal range.
    fn add<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T;

    /// Modular subtract of two internal-range values, result in the same
    /// internal range.
    fn subtract<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T;
}

/// Variants for which a loosely-reduced `[0, 2n)` value can be squared
/// repeatedly via `redc_core` without finalizing in between.
///
/// `redc_core` requires `a^2 < n*R`; a chained squaring step's input is
/// itself in `[0, 2n)` (the previous step's un-finalized output), so the
/// bound that must hold every step is `(2n)^2 < n*R`, i.e. `4n <= R`. That
/// is true unconditionally for Quarter (`n < R/4`) and Sixth (`n < R/6`),
/// but not for Full (`n < R`) or Half (`n < R/2`) - those only guarantee the
/// bound for a *single* square of an already-canonical (`< n`) value, not
/// for a second squaring of the resulting `[0, 2n)` residue. Only Quarter
/// and Sixth implement this marker, so [`crate::pow::scalar::SquaringValue`]
/// is unusable for Full/Half at compile time instead of silently producing
/// a wrong residue for large moduli.
pub trait ChainSquaringVariant: Variant {}

impl ChainSquaringVariant for QuarterRange {}
impl ChainSquaringVariant for SixthRange {}

/// Branchless `(x + y) mod modulus`, valid whenever `x, y < modulus` and
/// `x + y` does not need more than one subtraction of `modulus` to reduce
/// (guaranteed here since `x + y < 2 * modulus <= 2 * T::MAX`).
#[inline]
pub(crate) fn add_mod<T: WideArith, S: SelectStrategy>(x: T, y: T, modulus: T) -> T {
    let (s, carry) = x.overflowing_add(y);
    // `s.wrapping_sub(modulus)` is correct even when `carry` is set: the
    // true sum is `s + R`, and `R` is congruent to 0 mod `2^BITS`, so
    // subtracting `modulus` from the wrapped `s` lands on the same value
    // as subtracting it from the true sum.
    let reduced = s.wrapping_sub(modulus);
    S::select(carry | (s >= modulus), reduced, s)
}

/// Branchless `(x - y) mod modulus`, valid whenever `x, y < modulus`.
#[inline]
pub(crate) fn sub_mod<T: WideArith, S: SelectStrategy>(x: T, y: T, modulus: T) -> T {
    let (d, borrow) = x.overflowing_sub(y);
    let corrected = d.wrapping_add(modulus);
    S::select(borrow, corrected, d)
}

/// `n` doubled; safe from overflow for every modulus this crate accepts
/// (Quarter/Sixth bound `n` well below `T::MAX / 2`).
#[inline]
fn doubled<T: WideArith>(n: T) -> T {
    n.wrapping_add(n)
}

/// `n` any odd, representative range `[0, n)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FullRange;

impl Variant for FullRange {
    const RANGE_MULTIPLIER: u32 = 1;
    const FAMUL_DIRECT_SUM: bool = false;

    #[inline]
    fn max_modulus<T: WideArith>() -> T {
        // R - 1 is always odd, so every odd modulus below R is permitted.
        !T::ZERO
    }

    #[inline]
    fn finalize_redc<T: WideArith, S: SelectStrategy>(t: T, n: T) -> T {
        S::select(t >= n, t.wrapping_sub(n), t)
    }

    #[inline]
    fn canonicalize<T: WideArith, S: SelectStrategy>(x: T, _n: T) -> T {
        x
    }

    #[inline]
    fn add<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        add_mod::<T, S>(x, y, n)
    }

    #[inline]
    fn subtract<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        sub_mod::<T, S>(x, y, n)
    }
}

/// `n < R/2`, representative range `[0, n)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalfRange;

impl Variant for HalfRange {
    const RANGE_MULTIPLIER: u32 = 1;
    const FAMUL_DIRECT_SUM: bool = true;

    #[inline]
    fn max_modulus<T: WideArith>() -> T {
        (!T::ZERO).shr(1)
    }

    #[inline]
    fn finalize_redc<T: WideArith, S: SelectStrategy>(t: T, n: T) -> T {
        S::select(t >= n, t.wrapping_sub(n), t)
    }

    #[inline]
    fn canonicalize<T: WideArith, S: SelectStrategy>(x: T, _n: T) -> T {
        x
    }

    #[inline]
    fn add<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        add_mod::<T, S>(x, y, n)
    }

    #[inline]
    fn subtract<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        sub_mod::<T, S>(x, y, n)
    }
}

/// `n < R/4`, representative range `[0, 2n)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuarterRange;

impl Variant for QuarterRange {
    const RANGE_MULTIPLIER: u32 = 2;
    const FAMUL_DIRECT_SUM: bool = false;

    #[inline]
    fn max_modulus<T: WideArith>() -> T {
        (!T::ZERO).shr(2)
    }

    #[inline]
    fn finalize_redc<T: WideArith, S: SelectStrategy>(t: T, _n: T) -> T {
        // redc_core already produces a value in [0, 2n); nothing to do.
        t
    }

    #[inline]
    fn canonicalize<T: WideArith, S: SelectStrategy>(x: T, n: T) -> T {
        S::select(x >= n, x.wrapping_sub(n), x)
    }

    #[inline]
    fn add<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        add_mod::<T, S>(x, y, doubled(n))
    }

    #[inline]
    fn subtract<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        sub_mod::<T, S>(x, y, doubled(n))
    }
}

/// `n < R/6`, representative range `[0, 2n)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SixthRange;

impl Variant for SixthRange {
    const RANGE_MULTIPLIER: u32 = 2;
    const FAMUL_DIRECT_SUM: bool = true;

    #[inline]
    fn max_modulus<T: WideArith>() -> T {
        (!T::ZERO).div_small(6).wrapping_sub(T::ONE)
    }

    #[inline]
    fn finalize_redc<T: WideArith, S: SelectStrategy>(t: T, _n: T) -> T {
        t
    }

    #[inline]
    fn canonicalize<T: WideArith, S: SelectStrategy>(x: T, n: T) -> T {
        S::select(x >= n, x.wrapping_sub(n), x)
    }

    #[inline]
    fn add<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        add_mod::<T, S>(x, y, doubled(n))
    }

    #[inline]
    fn subtract<T: WideArith, S: SelectStrategy>(x: T, y: T, n: T) -> T {
        sub_mod::<T, S>(x, y, doubled(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Masked;

    #[test]
    fn max_modulus_bounds() {
        assert_eq!(FullRange::max_modulus::<u8>(), 255);
        assert_eq!(HalfRange::max_modulus::<u8>(), 127);
        assert_eq!(QuarterRange::max_modulus::<u8>(), 63);
        assert_eq!(SixthRange::max_modulus::<u8>(), 41);

        assert_eq!(FullRange::max_modulus::<u32>(), u32::MAX);
        assert_eq!(HalfRange::max_modulus::<u32>(), u32::MAX / 2);
        assert_eq!(QuarterRange::max_modulus::<u32>(), u32::MAX / 4);
    }

    #[test]
    fn check_modulus_rejects_even_and_out_of_range() {
        assert!(FullRange::check_modulus::<u8>(5));
        assert!(!FullRange::check_modulus::<u8>(4));
        assert!(!FullRange::check_modulus::<u8>(1));
        assert!(HalfRange::check_modulus::<u8>(127));
        assert!(!HalfRange::check_modulus::<u8>(129));
    }

    #[test]
    fn add_sub_mod_roundtrip() {
        let n: u32 = 97;
        for x in 0..n {
            for y in 0..n {
                let s = add_mod::<u32, Masked>(x, y, n);
                assert_eq!(s, (x + y) % n);
                let d = sub_mod::<u32, Masked>(x, y, n);
                assert_eq!(d, (x + n - y) % n);
            }
        }
    }

    #[test]
    fn quarter_canonicalize_matches_definition() {
        let n: u32 = 17;
        for x in 0..(2 * n) {
            let c = QuarterRange::canonicalize::<u32, Masked>(x, n);
            assert_eq!(c, x % n);
            assert!(c < n);
        }
    }
}
