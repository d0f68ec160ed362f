//! Shared window-table construction for 2^k-ary modular exponentiation.
//!
//! Window size is a runtime parameter (`window_bits`) rather than a const
//! generic: Rust's const generics can't yet size an array as `1 << P` for a
//! generic `P` on stable, so every pow variant allocates a fixed-capacity
//! stack array (`WINDOW_TABLE_CAP` entries, enough for window sizes up to
//! [`MAX_WINDOW_BITS`]) and only uses its first `1 << window_bits` slots.
//! This mirrors the corpus's general preference for stack/inline storage
//! over heap allocation in hot numeric paths while staying on stable Rust.

pub mod array;
pub mod partial;
pub mod scalar;

use crate::form::{MontgomeryForm, MontgomeryValue};
use crate::variant::Variant;
use crate::word::{PerformanceTag, WideArith};

/// Largest window size this crate builds a table for. Typical window sizes
/// are 2-5; 8 gives headroom for callers who want to trade table setup cost
/// for fewer loop iterations without forcing every table to pay for it
/// (only `1 << window_bits` of the capacity is ever touched).
pub const MAX_WINDOW_BITS: u32 = 8;

/// Stack capacity every window table is allocated with.
pub const WINDOW_TABLE_CAP: usize = 1 << MAX_WINDOW_BITS;

/// Largest `K` the multi-table ("multi-segment") variant supports. `K` is
/// unbounded in principle; fixed here (rather than taken as a heap-sized
/// `Vec`) so the per-table storage stays a compile-time-sized stack array,
/// consistent with every other table in this module.
pub const MAX_TABLES: usize = 4;

/// Build the odd/even window table `T[0..2^window_bits)` for base `x`:
/// `T[0] = unity`, `T[1] = x`, and for `i = 2, 4, ...`,
/// `T[i] = square(T[i/2])`, `T[i+1] = multiply(T[i/2+1], T[i/2])`. Avoids
/// branching on the parity of `i` during table construction, per the
/// `2^k`-ary preprocessing recurrence.
pub(crate) fn build_window_table<T, V, P>(
    form: &MontgomeryForm<T, V>,
    x: MontgomeryValue<T>,
    window_bits: u32,
) -> [MontgomeryValue<T>; WINDOW_TABLE_CAP]
where
    T: WideArith,
    V: Variant,
    P: PerformanceTag,
{
    debug_assert!(
        window_bits >= 1 && window_bits <= MAX_WINDOW_BITS,
        "window_bits must be in 1..=MAX_WINDOW_BITS"
    );
    let table_len = 1usize << window_bits;
    let mut table = [form.unity(); WINDOW_TABLE_CAP];
    if table_len > 1 {
        table[1] = x;
    }
    let mut i = 2usize;
    while i < table_len {
        table[i] = form.square::<P>(table[i / 2]);
        if i + 1 < table_len {
            table[i + 1] = form.multiply::<P>(table[i / 2 + 1], table[i / 2]);
        }
        i += 2;
    }
    table
}

/// Highest set bit index of `e` plus one (the bit-length), i.e. `0` for
/// `e == 0`. Shared by every pow variant to locate the first window.
pub(crate) fn bit_length<E: WideArith>(e: E) -> u32 {
    if e == E::ZERO {
        0
    } else {
        E::BITS - e.leading_zeros()
    }
}

/// Half of [`WINDOW_TABLE_CAP`]: the stack capacity the memory-optimized
/// partial-array table builder allocates.
pub const HALF_WINDOW_TABLE_CAP: usize = WINDOW_TABLE_CAP / 2;

/// Build only the low half `T[0..2^(window_bits-1))` of the window table
/// explicitly, plus the single boundary entry `T[2^(window_bits-1)]`. Any
/// other entry `T[i]` for `i` in the upper half is recoverable on demand as
/// `T[i - half] * T[half]` (exponents add), via [`half_table_lookup`] - the
/// "advanced partial-array variant" memory optimization: half the table
/// storage per base, at the cost of one extra multiply for upper-half
/// lookups instead of a free array read.
pub(crate) fn build_half_window_table<T, V, P>(
    form: &MontgomeryForm<T, V>,
    x: MontgomeryValue<T>,
    window_bits: u32,
) -> ([MontgomeryValue<T>; HALF_WINDOW_TABLE_CAP], MontgomeryValue<T>)
where
    T: WideArith,
    V: Variant,
    P: PerformanceTag,
{
    debug_assert!(
        window_bits >= 1 && window_bits <= MAX_WINDOW_BITS,
        "window_bits must be in 1..=MAX_WINDOW_BITS"
    );
    let half_len = 1usize << (window_bits - 1);
    let mut low = [form.unity(); HALF_WINDOW_TABLE_CAP];
    if half_len > 1 {
        low[1] = x;
    }
    let mut i = 2usize;
    while i < half_len {
        low[i] = form.square::<P>(low[i / 2]);
        if i + 1 < half_len {
            low[i + 1] = form.multiply::<P>(low[i / 2 + 1], low[i / 2]);
        }
        i += 2;
    }
    // T[half_len] = square(T[half_len / 2]), the same recurrence one more
    // step out; window_bits == 1 is the degenerate case where half_len == 1
    // and T[1] is just x itself (not derivable by squaring T[0] = unity).
    let high_base = if window_bits == 1 {
        x
    } else {
        form.square::<P>(low[half_len / 2])
    };
    (low, high_base)
}

/// Look up `T[idx]` in a table built by [`build_half_window_table`].
/// `idx < half_len` reads the stored entry directly; `idx >= half_len`
/// reconstructs it as `T[idx - half_len] * high_base`. The reconstruction
/// multiply is always performed regardless of which half `idx` falls in -
/// only the choice of *which result to keep* is a plain conditional here,
/// since `MontgomeryValue` is opaque data rather than a [`WideArith`]
/// primitive and has no branchless select of its own.
#[inline]
pub(crate) fn half_table_lookup<T, V, P>(
    form: &MontgomeryForm<T, V>,
    low: &[MontgomeryValue<T>],
    half_len: usize,
    high_base: MontgomeryValue<T>,
    idx: usize,
) -> MontgomeryValue<T>
where
    T: WideArith,
    V: Variant,
    P: PerformanceTag,
{
    let j = idx & (half_len - 1);
    let stored = low[j];
    let reconstructed = form.multiply::<P>(stored, high_base);
    if idx < half_len {
        stored
    } else {
        reconstructed
    }
}
