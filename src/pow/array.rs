//! Array exponentiation: `N` independent `(modulus, base, exponent)`
//! triples run through the windowed loop in lockstep, so the squarings and
//! multiplies of lane `i` can overlap lane `j`'s in the pipeline instead of
//! executing one lane at a time. Each lane keeps its own
//! [`MontgomeryForm`], since nothing requires the moduli to match.

use core::array;

use crate::form::{MontgomeryForm, MontgomeryValue};
use crate::pow::{bit_length, build_window_table, MAX_WINDOW_BITS};
use crate::variant::Variant;
use crate::word::{PerformanceTag, WideArith};

/// Windowed 2^k-ary exponentiation over `N` independent lanes.
///
/// Unlike [`crate::pow::scalar::KaryPow`], the sliding-window optimization
/// is not offered here: each lane's exponent independently decides which
/// window bits are zero, so there is no single skip schedule that keeps
/// every lane doing the same number of squarings per iteration - and
/// lockstep squaring count is the entire point of running lanes together.
#[derive(Debug, Clone, Copy)]
pub struct ArrayKaryPow {
    window_bits: u32,
}

impl ArrayKaryPow {
    /// `window_bits` must be in `1..=MAX_WINDOW_BITS`.
    pub fn new(window_bits: u32) -> Self {
        assert!(
            window_bits >= 1 && window_bits <= MAX_WINDOW_BITS,
            "window_bits out of range"
        );
        ArrayKaryPow { window_bits }
    }

    /// `x_i^(e_i) (mod n_i)` for every lane `i`, each under its own
    /// [`MontgomeryForm`]. Iteration count is driven by the widest exponent
    /// (`max(bit_length(e_i))`); lanes whose exponent is narrower simply
    /// read `0` out of their own high bits, which indexes `table[0] =
    /// unity` and so contributes a harmless identity multiply - exactly the
    /// "lanes absorb 0-window multiplies" behavior the design calls for.
    pub fn pow<T, V, P, E, const N: usize>(
        &self,
        forms: &[MontgomeryForm<T, V>; N],
        bases: [MontgomeryValue<T>; N],
        exponents: [E; N],
    ) -> [MontgomeryValue<T>; N]
    where
        T: WideArith,
        V: Variant,
        P: PerformanceTag,
        E: WideArith,
    {
        let mask_bits = self.window_bits;
        let table_len = 1usize << mask_bits;
        let tables = array::from_fn(|i| build_window_table::<T, V, P>(&forms[i], bases[i], mask_bits));

        let max_bits = exponents.iter().copied().map(bit_length).max().unwrap_or(0);
        if max_bits == 0 {
            return array::from_fn(|i| forms[i].unity());
        }

        if max_bits <= mask_bits {
            return array::from_fn(|i| {
                let idx = exponents[i].low_word(mask_bits) as usize;
                tables[i][idx & (table_len - 1)]
            });
        }

        let mut shift = max_bits - mask_bits;
        let mut result: [MontgomeryValue<T>; N] = array::from_fn(|i| {
            let idx = exponents[i].shr(shift).low_word(mask_bits) as usize;
            tables[i][idx & (table_len - 1)]
        });

        while shift >= mask_bits {
            for _ in 0..mask_bits {
                for i in 0..N {
                    result[i] = forms[i].square::<P>(result[i]);
                }
            }
            shift -= mask_bits;
            for i in 0..N {
                let idx = exponents[i].shr(shift).low_word(mask_bits) as usize;
                result[i] = forms[i].multiply::<P>(result[i], tables[i][idx & (table_len - 1)]);
            }
        }

        if shift > 0 {
            for _ in 0..shift {
                for i in 0..N {
                    result[i] = forms[i].square::<P>(result[i]);
                }
            }
            for i in 0..N {
                let idx = exponents[i].low_word(shift) as usize;
                result[i] = forms[i].multiply::<P>(result[i], tables[i][idx & (table_len - 1)]);
            }
        }

        result
    }
}
