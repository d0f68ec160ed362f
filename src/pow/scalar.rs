//! Scalar windowed 2^k-ary modular exponentiation.
//!
//! [`ScalarPow`] is the plain left-to-right binary case (`window_bits ==
//! 1`, plain square-and-multiply); [`KaryPow`] generalizes it to arbitrary
//! window sizes with an optional sliding window and an optional
//! squaring-value chain. Both share the table builder in `super`.

use crate::form::{MontgomeryForm, MontgomeryValue};
use crate::pow::{bit_length, build_window_table, MAX_TABLES, MAX_WINDOW_BITS, WINDOW_TABLE_CAP};
use crate::variant::{ChainSquaringVariant, Variant};
use crate::word::{PerformanceTag, WideArith};

/// Plain square-and-multiply: `window_bits == 1`, no table beyond
/// `{unity, x}`, no sliding window. Kept distinct from `KaryPow` because it
/// is the cheapest-to-set-up variant for one-off exponentiations where
/// table construction wouldn't pay for itself.
pub struct ScalarPow;

impl ScalarPow {
    /// `x^e (mod n)`, `x` already in Montgomery form.
    pub fn pow<T, V, P, E>(form: &MontgomeryForm<T, V>, x: MontgomeryValue<T>, e: E) -> MontgomeryValue<T>
    where
        T: WideArith,
        V: Variant,
        P: PerformanceTag,
        E: WideArith,
    {
        let len = bit_length(e);
        if len == 0 {
            return form.unity();
        }
        let mut result = x;
        for i in (0..len - 1).rev() {
            result = form.square::<P>(result);
            if (e.shr(i) & E::ONE) == E::ONE {
                result = form.multiply::<P>(result, x);
            }
        }
        result
    }
}

/// Windowed 2^k-ary exponentiation with a precomputed odd/even table,
/// optional sliding window, and optional squaring-value chain.
#[derive(Debug, Clone, Copy)]
pub struct KaryPow {
    window_bits: u32,
    sliding: bool,
}

impl KaryPow {
    /// `window_bits` must be in `1..=MAX_WINDOW_BITS`; typical window sizes
    /// are 2-5. `sliding` enables the sliding-window optimization
    /// (skip leading zero window bits via extra squarings rather than a
    /// wasted full window).
    pub fn new(window_bits: u32, sliding: bool) -> Self {
        assert!(
            window_bits >= 1 && window_bits <= MAX_WINDOW_BITS,
            "window_bits out of range"
        );
        KaryPow {
            window_bits,
            sliding,
        }
    }

    /// `x^e (mod n)`, `x` already in Montgomery form. `E` may be a wider
    /// (or narrower) unsigned type than `T`; the two widths are entirely
    /// independent since only bit-extraction operations are performed on
    /// `e`.
    pub fn pow<T, V, P, E>(&self, form: &MontgomeryForm<T, V>, x: MontgomeryValue<T>, e: E) -> MontgomeryValue<T>
    where
        T: WideArith,
        V: Variant,
        P: PerformanceTag,
        E: WideArith,
    {
        let table = build_window_table::<T, V, P>(form, x, self.window_bits);
        let table_len = 1usize << self.window_bits;
        let mask_bits = self.window_bits;

        let numbits = bit_length(e);
        if numbits == 0 {
            return form.unity();
        }
        // Fast path: e fits entirely in one window.
        if numbits <= mask_bits {
            let idx = e.low_word(mask_bits) as usize;
            return table[idx & (table_len - 1)];
        }

        let mut shift = numbits - mask_bits;
        let top_idx = e.shr(shift).low_word(mask_bits) as usize;
        let mut result = table[top_idx & (table_len - 1)];

        while shift >= mask_bits {
            if self.sliding {
                while shift > mask_bits && (e.shr(shift - 1) & E::ONE) == E::ZERO {
                    result = form.square::<P>(result);
                    shift -= 1;
                }
            }
            for _ in 0..mask_bits {
                result = form.square::<P>(result);
            }
            shift -= mask_bits;
            let idx = e.shr(shift).low_word(mask_bits) as usize;
            result = form.multiply::<P>(result, table[idx & (table_len - 1)]);
        }

        if shift > 0 {
            for _ in 0..shift {
                result = form.square::<P>(result);
            }
            let idx = e.low_word(shift) as usize;
            result = form.multiply::<P>(result, table[idx & (table_len - 1)]);
        }

        result
    }
}

/// Multi-table ("multi-segment") windowed exponentiation.
///
/// Splits the exponent into `K`-window (`K * window_bits`-bit) chunks from
/// the top down. Table `0` is the usual odd/even window table for `x`;
/// table `t` (`t = 1..K`) holds `T_t[i] = x^(i * 2^(t*window_bits))`,
/// built by squaring every entry of table `t-1` `window_bits` times. Within
/// one chunk, the sub-window at position `t` is looked up in table `t`, and
/// the `K` lookups are multiplied together *before* the chunk is folded
/// into the running result - `T[chunk] = prod_t T_t[w_t] = x^(chunk)`,
/// since each `T_t` already bakes in that sub-window's place value. This
/// amortizes one multiply per chunk (`K` multiplies to combine the
/// sub-windows plus one to fold in the result) against `K` full table
/// lookups' worth of squarings, at the cost of `K` tables' memory instead
/// of one.
///
/// No sliding window here: the point of building `K` place-value tables is
/// that every chunk is full width, so there is nothing to skip.
#[derive(Debug, Clone, Copy)]
pub struct MultiTableKaryPow {
    window_bits: u32,
    num_tables: usize,
}

impl MultiTableKaryPow {
    /// `window_bits` in `1..=MAX_WINDOW_BITS`, `num_tables` (`K`) in
    /// `1..=MAX_TABLES`. `num_tables == 1` degenerates to plain
    /// [`KaryPow`] without sliding.
    pub fn new(window_bits: u32, num_tables: usize) -> Self {
        assert!(
            window_bits >= 1 && window_bits <= MAX_WINDOW_BITS,
            "window_bits out of range"
        );
        assert!(
            num_tables >= 1 && num_tables <= MAX_TABLES,
            "num_tables out of range"
        );
        MultiTableKaryPow {
            window_bits,
            num_tables,
        }
    }

    /// `x^e (mod n)`, `x` already in Montgomery form.
    pub fn pow<T, V, P, E>(&self, form: &MontgomeryForm<T, V>, x: MontgomeryValue<T>, e: E) -> MontgomeryValue<T>
    where
        T: WideArith,
        V: Variant,
        P: PerformanceTag,
        E: WideArith,
    {
        let mask_bits = self.window_bits;
        let table_len = 1usize << mask_bits;
        let k = self.num_tables;
        let chunk_bits = mask_bits * k as u32;

        let mut tables = [[form.unity(); WINDOW_TABLE_CAP]; MAX_TABLES];
        tables[0] = build_window_table::<T, V, P>(form, x, mask_bits);
        for t in 1..k {
            for i in 0..table_len {
                let mut v = tables[t - 1][i];
                for _ in 0..mask_bits {
                    v = form.square::<P>(v);
                }
                tables[t][i] = v;
            }
        }

        let numbits = bit_length(e);
        if numbits == 0 {
            return form.unity();
        }

        let tables_for_bits = |bits: u32| -> usize { ((bits + mask_bits - 1) / mask_bits) as usize };

        let rem = numbits % chunk_bits;
        let first_chunk_bits = if rem == 0 { chunk_bits } else { rem };
        let mut shift = numbits - first_chunk_bits;

        let first_k = tables_for_bits(first_chunk_bits);
        let mut result = form.unity();
        for (t, table) in tables.iter().enumerate().take(first_k) {
            let w_shift = shift + (t as u32) * mask_bits;
            let idx = e.shr(w_shift).low_word(mask_bits) as usize & (table_len - 1);
            result = form.multiply::<P>(result, table[idx]);
        }

        while shift > 0 {
            shift -= chunk_bits;
            for _ in 0..chunk_bits {
                result = form.square::<P>(result);
            }
            let mut chunk_product = form.unity();
            for (t, table) in tables.iter().enumerate().take(k) {
                let w_shift = shift + (t as u32) * mask_bits;
                let idx = e.shr(w_shift).low_word(mask_bits) as usize & (table_len - 1);
                chunk_product = form.multiply::<P>(chunk_product, table[idx]);
            }
            result = form.multiply::<P>(result, chunk_product);
        }

        result
    }
}

/// A loosely-reduced Montgomery value mid-chain: the raw `REDC` output
/// before [`Variant::finalize_redc`] has collapsed it into the variant's
/// usual representative range. `square_sv` keeps values in this looser
/// form across a run of consecutive squarings, saving one conditional
/// subtract per step; [`SquaringValue::finalize`] pays it once at the end.
///
/// Chaining requires `(2n)^2 < n*R` (`4n <= R`) at every step, since each
/// step's input is itself the previous step's un-finalized `[0, 2n)`
/// output. That bound only holds unconditionally for Quarter (`n < R/4`)
/// and Sixth (`n < R/6`) - Full (`n < R`) and Half (`n < R/2`) satisfy it
/// only for a single square of an already-canonical value, not for a
/// second squaring of the `[0, 2n)` result. `square_sv`/`finalize` are
/// accordingly bound to [`crate::variant::ChainSquaringVariant`] rather
/// than every `Variant`, so this type is simply unavailable for Full/Half
/// at compile time; those variants get the same chained-squaring effect
/// soundly through repeated [`MontgomeryForm::square`] calls, which
/// finalize back into range after every step.
#[derive(Debug, Clone, Copy)]
pub struct SquaringValue<T>(T);

impl<T: WideArith> SquaringValue<T> {
    pub fn from_montgomery(v: MontgomeryValue<T>) -> Self {
        SquaringValue(v.into_raw())
    }

    /// One squaring step without finalizing into the variant's
    /// representative range.
    pub fn square_sv<V, P>(self, form: &MontgomeryForm<T, V>) -> Self
    where
        V: ChainSquaringVariant,
        P: PerformanceTag,
    {
        SquaringValue(form.square_raw::<P>(self.0))
    }

    /// Collapse back into a proper [`MontgomeryValue`], paying the
    /// deferred `finalize_redc` once.
    pub fn finalize<V, P>(self, form: &MontgomeryForm<T, V>) -> MontgomeryValue<T>
    where
        V: ChainSquaringVariant,
        P: PerformanceTag,
    {
        form.finalize_raw::<P>(self.0)
    }
}
