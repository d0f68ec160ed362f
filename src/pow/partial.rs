//! Partial-array exponentiation: one shared modulus and exponent, `N`
//! independent bases. Since the exponent is shared, every lane skips the
//! same window positions, so (unlike [`crate::pow::array`]) the sliding
//! window optimization is sound here.

use core::array;

use crate::form::{MontgomeryForm, MontgomeryValue};
use crate::pow::{
    bit_length, build_half_window_table, build_window_table, half_table_lookup, MAX_WINDOW_BITS,
};
use crate::variant::Variant;
use crate::word::{PerformanceTag, WideArith};

/// Windowed 2^k-ary exponentiation over `N` bases sharing one modulus and
/// one exponent. The shared exponent lets every lane use the same skip
/// schedule, so `sliding` behaves exactly as it does in
/// [`crate::pow::scalar::KaryPow`]: zero windows are skipped for every lane
/// at once.
#[derive(Debug, Clone, Copy)]
pub struct PartialArrayKaryPow {
    window_bits: u32,
    sliding: bool,
}

impl PartialArrayKaryPow {
    /// `window_bits` must be in `1..=MAX_WINDOW_BITS`.
    pub fn new(window_bits: u32, sliding: bool) -> Self {
        assert!(
            window_bits >= 1 && window_bits <= MAX_WINDOW_BITS,
            "window_bits out of range"
        );
        PartialArrayKaryPow {
            window_bits,
            sliding,
        }
    }

    /// `x_i^e (mod n)` for every lane `i`, under one shared
    /// [`MontgomeryForm`] and exponent `e`. Builds a full table per lane.
    pub fn pow<T, V, P, E, const N: usize>(
        &self,
        form: &MontgomeryForm<T, V>,
        bases: [MontgomeryValue<T>; N],
        e: E,
    ) -> [MontgomeryValue<T>; N]
    where
        T: WideArith,
        V: Variant,
        P: PerformanceTag,
        E: WideArith,
    {
        let mask_bits = self.window_bits;
        let table_len = 1usize << mask_bits;
        let tables = array::from_fn(|i| build_window_table::<T, V, P>(form, bases[i], mask_bits));

        let numbits = bit_length(e);
        if numbits == 0 {
            return array::from_fn(|_| form.unity());
        }
        if numbits <= mask_bits {
            let idx = e.low_word(mask_bits) as usize;
            return array::from_fn(|i| tables[i][idx & (table_len - 1)]);
        }

        let mut shift = numbits - mask_bits;
        let first_idx = e.shr(shift).low_word(mask_bits) as usize & (table_len - 1);
        let mut result: [MontgomeryValue<T>; N] = array::from_fn(|i| tables[i][first_idx]);

        while shift >= mask_bits {
            if self.sliding {
                while shift > mask_bits && (e.shr(shift - 1) & E::ONE) == E::ZERO {
                    for i in 0..N {
                        result[i] = form.square::<P>(result[i]);
                    }
                    shift -= 1;
                }
            }
            for _ in 0..mask_bits {
                for i in 0..N {
                    result[i] = form.square::<P>(result[i]);
                }
            }
            shift -= mask_bits;
            let idx = e.shr(shift).low_word(mask_bits) as usize & (table_len - 1);
            for i in 0..N {
                result[i] = form.multiply::<P>(result[i], tables[i][idx]);
            }
        }

        if shift > 0 {
            for _ in 0..shift {
                for i in 0..N {
                    result[i] = form.square::<P>(result[i]);
                }
            }
            let idx = e.low_word(shift) as usize & (table_len - 1);
            for i in 0..N {
                result[i] = form.multiply::<P>(result[i], tables[i][idx]);
            }
        }

        result
    }

    /// As [`Self::pow`], but each lane's table stores only its low half
    /// (`T[0..2^(window_bits-1))`) plus one boundary entry, reconstructing
    /// upper-half lookups as `T[idx - half] * T[half]` via
    /// [`half_table_lookup`]. Halves per-lane table memory at the cost of
    /// one extra multiply per upper-half window - worthwhile when `N` is
    /// large enough that table storage, not multiplies, is the binding
    /// constraint.
    pub fn pow_half_table<T, V, P, E, const N: usize>(
        &self,
        form: &MontgomeryForm<T, V>,
        bases: [MontgomeryValue<T>; N],
        e: E,
    ) -> [MontgomeryValue<T>; N]
    where
        T: WideArith,
        V: Variant,
        P: PerformanceTag,
        E: WideArith,
    {
        let mask_bits = self.window_bits;
        let table_len = 1usize << mask_bits;
        let half_len = table_len / 2;
        let half_tables = array::from_fn(|i| build_half_window_table::<T, V, P>(form, bases[i], mask_bits));

        let lookup = |i: usize, idx: usize| -> MontgomeryValue<T> {
            let (low, high_base) = &half_tables[i];
            half_table_lookup::<T, V, P>(form, low, half_len, *high_base, idx)
        };

        let numbits = bit_length(e);
        if numbits == 0 {
            return array::from_fn(|_| form.unity());
        }
        if numbits <= mask_bits {
            let idx = e.low_word(mask_bits) as usize;
            return array::from_fn(|i| lookup(i, idx & (table_len - 1)));
        }

        let mut shift = numbits - mask_bits;
        let first_idx = e.shr(shift).low_word(mask_bits) as usize & (table_len - 1);
        let mut result: [MontgomeryValue<T>; N] = array::from_fn(|i| lookup(i, first_idx));

        while shift >= mask_bits {
            for _ in 0..mask_bits {
                for i in 0..N {
                    result[i] = form.square::<P>(result[i]);
                }
            }
            shift -= mask_bits;
            let idx = e.shr(shift).low_word(mask_bits) as usize & (table_len - 1);
            for i in 0..N {
                result[i] = form.multiply::<P>(result[i], lookup(i, idx));
            }
        }
        if shift > 0 {
            for _ in 0..shift {
                for i in 0..N {
                    result[i] = form.square::<P>(result[i]);
                }
            }
            let idx = e.low_word(shift) as usize & (table_len - 1);
            for i in 0..N {
                result[i] = form.multiply::<P>(result[i], lookup(i, idx));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::FullRange;
    use crate::word::LowLatency;

    fn naive_powmod(mut base: u64, mut exp: u64, m: u64) -> u64 {
        let mut result = 1u64 % m;
        base %= m;
        while exp > 0 {
            if exp & 1 == 1 {
                result = (result * base) % m;
            }
            base = (base * base) % m;
            exp >>= 1;
        }
        result
    }

    #[test]
    fn partial_pow_matches_scalar_across_sliding_and_window_sizes() {
        const N: usize = 3;
        let n: u64 = 1_000_000_007;
        let form = MontgomeryForm::<u64, FullRange>::new(n);
        let raw_bases: [u64; N] = [2, 123456789, 999999937 % n];
        let e: u64 = 0xABCDEF1234;

        let bases: [MontgomeryValue<u64>; N] =
            array::from_fn(|i| form.convert_in::<LowLatency>(raw_bases[i] % n));

        for window_bits in 2..=5u32 {
            for sliding in [false, true] {
                let kary = PartialArrayKaryPow::new(window_bits, sliding);
                let results = kary.pow::<u64, FullRange, LowLatency, u64, N>(&form, bases, e);
                for i in 0..N {
                    let got = form.convert_out::<LowLatency>(results[i]).into_raw();
                    let expect = naive_powmod(raw_bases[i], e, n);
                    assert_eq!(got, expect, "window_bits={window_bits} sliding={sliding} lane={i}");
                }
            }
        }
    }

    #[test]
    fn partial_pow_zero_exponent_is_all_unity() {
        const N: usize = 2;
        let n: u64 = 97;
        let form = MontgomeryForm::<u64, FullRange>::new(n);
        let bases: [MontgomeryValue<u64>; N] =
            array::from_fn(|_| form.convert_in::<LowLatency>(5));
        let kary = PartialArrayKaryPow::new(3, true);
        let results = kary.pow::<u64, FullRange, LowLatency, u64, N>(&form, bases, 0u64);
        for r in results {
            assert_eq!(form.convert_out::<LowLatency>(r).into_raw(), 1);
        }
    }

    #[test]
    fn half_table_variant_matches_full_table_variant() {
        const N: usize = 3;
        let n: u64 = 97;
        let form = MontgomeryForm::<u64, FullRange>::new(n);
        let raw_bases: [u64; N] = [2, 5, 96];
        let e: u64 = 137;
        let bases: [MontgomeryValue<u64>; N] =
            array::from_fn(|i| form.convert_in::<LowLatency>(raw_bases[i] % n));

        for window_bits in 2..=4u32 {
            let kary = PartialArrayKaryPow::new(window_bits, false);
            let full = kary.pow::<u64, FullRange, LowLatency, u64, N>(&form, bases, e);
            let half = kary.pow_half_table::<u64, FullRange, LowLatency, u64, N>(&form, bases, e);
            for i in 0..N {
                assert_eq!(
                    form.convert_out::<LowLatency>(full[i]).into_raw(),
                    form.convert_out::<LowLatency>(half[i]).into_raw(),
                    "window_bits={window_bits} lane={i}"
                );
            }
        }
    }
}
