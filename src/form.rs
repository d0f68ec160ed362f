//! [`MontgomeryForm`]: the per-instance façade binding a modulus, its
//! variant tag, and the precomputed constants together, plus the value
//! newtypes it operates on.
//!
//! Values are plain, `Copy`, `Rc`-free structs rather than
//! reference-counted wrappers around shared modulus state - there is no
//! shared-ownership requirement here, just a modulus and its derived
//! constants living as long as the caller needs them. See `DESIGN.md`,
//! "Rc-based modulus sharing -> plain struct + lifetime-free value types".

use core::marker::PhantomData;

use crate::error::ContractViolation;
use crate::redc::{redc_core, MontyConstants};
use crate::variant::Variant;
use crate::word::{LowLatency, PerformanceTag, WideArith};

/// A value known to be in Montgomery form, tagged with the variant (and
/// therefore the representative range) it was produced under. Carries no
/// reference to the owning [`MontgomeryForm`] - callers are responsible for
/// only combining values produced under the same modulus. [`crate::monty::MontgomeryInt`]
/// enforces this at runtime via an explicit modulus check; here it is
/// enforced by construction discipline instead (see `DESIGN.md`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontgomeryValue<T>(pub(crate) T);

/// A value known to be the unique representative in `[0, n)` - the result
/// of [`MontgomeryForm::convert_out`] or [`MontgomeryValue::canonicalize`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalValue<T>(pub(crate) T);

/// A value guaranteed fit for the fused multiply-add family
/// (`famul`/`fmadd`/`fmsub`) without an intervening canonicalization step.
/// Distinct from [`MontgomeryValue`] because not every operation produces
/// one: only a prior `canonicalize` or a value already known to be
/// canonical.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusingValue<T>(pub(crate) T);

impl<T: WideArith> MontgomeryValue<T> {
    /// Bring this value to its unique `[0, n)` representative under `form`.
    pub fn canonicalize<V: Variant>(self, form: &MontgomeryForm<T, V>) -> CanonicalValue<T> {
        CanonicalValue(V::canonicalize::<T, <LowLatency as PerformanceTag>::Select>(
            self.0,
            form.constants.n,
        ))
    }

    /// Raw internal-range representation, for callers that need to inspect
    /// bit patterns (serialization, hashing) and understand the variant's
    /// range is not `[0, n)`.
    pub fn into_raw(self) -> T {
        self.0
    }
}

impl<T: WideArith> CanonicalValue<T> {
    pub fn into_raw(self) -> T {
        self.0
    }

    /// A canonical value is always fit for fused operations.
    pub fn into_fusing(self) -> FusingValue<T> {
        FusingValue(self.0)
    }
}

impl<T: WideArith> FusingValue<T> {
    pub fn into_raw(self) -> T {
        self.0
    }
}

/// A modulus bound to a range [`Variant`], with its Montgomery constants
/// precomputed once at construction time.
///
/// `T` is the host unsigned integer type values are packed into; `V`
/// selects which of the four representative ranges (and therefore which
/// `REDC` finalization, add/subtract, and canonicalization) this instance
/// uses. Constructing one checks the modulus is odd and within `V`'s
/// `max_modulus`; every other method trusts its inputs came from this same
/// instance and only asserts that in debug builds.
#[derive(Debug, Clone, Copy)]
pub struct MontgomeryForm<T, V> {
    constants: MontyConstants<T>,
    _variant: PhantomData<V>,
}

impl<T: WideArith, V: Variant> MontgomeryForm<T, V> {
    /// Construct a new instance for modulus `n`.
    ///
    /// # Panics
    ///
    /// In debug builds, if `n` is even or outside `1 < n <= V::max_modulus()`
    /// ([`ContractViolation::Construction`]).
    pub fn new(n: T) -> Self {
        debug_assert!(
            V::check_modulus::<T>(n),
            "{}",
            ContractViolation::Construction
        );
        MontgomeryForm {
            constants: MontyConstants::new(n),
            _variant: PhantomData,
        }
    }

    /// The bound modulus.
    pub fn modulus(&self) -> T {
        self.constants.n
    }

    /// The largest modulus `V` accepts for this `T`.
    pub fn max_modulus() -> T {
        V::max_modulus::<T>()
    }

    /// Montgomery form of `1`, i.e. `R mod n`.
    pub fn unity(&self) -> MontgomeryValue<T> {
        MontgomeryValue(self.constants.r_mod_n)
    }

    /// Montgomery form of `0`, which is `0` in every variant.
    pub fn zero(&self) -> MontgomeryValue<T> {
        MontgomeryValue(T::ZERO)
    }

    /// Montgomery form of `n - 1`.
    pub fn negative_one<P: PerformanceTag>(&self) -> MontgomeryValue<T> {
        self.negate::<P>(self.unity())
    }

    /// Convert an ordinary integer `a` (`0 <= a < n`) into Montgomery form.
    pub fn convert_in<P: PerformanceTag>(&self, a: T) -> MontgomeryValue<T> {
        debug_assert!(a < self.constants.n, "{}", ContractViolation::Domain);
        let (hi, lo) = a.wide_mul(self.constants.r_squared_mod_n);
        let t = redc_core::<T, P::Select>(hi, lo, self.constants.n, self.constants.neg_inv_n);
        MontgomeryValue(V::finalize_redc::<T, P::Select>(t, self.constants.n))
    }

    /// Recover the ordinary integer a Montgomery value represents.
    pub fn convert_out<P: PerformanceTag>(&self, a: MontgomeryValue<T>) -> CanonicalValue<T> {
        let t = redc_core::<T, P::Select>(T::ZERO, a.0, self.constants.n, self.constants.neg_inv_n);
        CanonicalValue(V::canonicalize::<T, P::Select>(t, self.constants.n))
    }

    /// `a + b`, both and the result in Montgomery form.
    pub fn add<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        MontgomeryValue(V::add::<T, P::Select>(a.0, b.0, self.constants.n))
    }

    /// `a - b`, both and the result in Montgomery form.
    pub fn subtract<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        MontgomeryValue(V::subtract::<T, P::Select>(a.0, b.0, self.constants.n))
    }

    /// `b - a`, i.e. [`Self::subtract`] with operands swapped. Named
    /// separately because callers computing a running difference often
    /// want this order without re-deriving it at the call site.
    pub fn unordered_subtract<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        self.subtract::<P>(b, a)
    }

    /// `-a`.
    pub fn negate<P: PerformanceTag>(&self, a: MontgomeryValue<T>) -> MontgomeryValue<T> {
        self.subtract::<P>(self.zero(), a)
    }

    /// `a * b`.
    pub fn multiply<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        let (hi, lo) = a.0.wide_mul(b.0);
        let t = redc_core::<T, P::Select>(hi, lo, self.constants.n, self.constants.neg_inv_n);
        MontgomeryValue(V::finalize_redc::<T, P::Select>(t, self.constants.n))
    }

    /// `a^2`, using the double-width squaring fast path when `T` offers
    /// one.
    pub fn square<P: PerformanceTag>(&self, a: MontgomeryValue<T>) -> MontgomeryValue<T> {
        MontgomeryValue(V::finalize_redc::<T, P::Select>(
            self.square_raw::<P>(a.0),
            self.constants.n,
        ))
    }

    /// Square `a` (given as a raw internal-range limb) and reduce via
    /// `REDC`, but skip the variant's `finalize_redc` step. The result is
    /// only guaranteed to lie in `[0, 2n)`, not the variant's usual
    /// representative range. A single call is sound for every variant,
    /// since each variant's own representative range already satisfies
    /// `a^2 < n * R` (`a < n` for Full/Half, `a < 2n` with `n < R/4` for
    /// Quarter/Sixth). Chaining repeated calls on the `[0, 2n)` output -
    /// what [`crate::pow::scalar::SquaringValue`] does - additionally needs
    /// `(2n)^2 < n * R`, i.e. `4n <= R`, which only Quarter and Sixth
    /// guarantee unconditionally; `SquaringValue` is therefore restricted
    /// to [`crate::variant::ChainSquaringVariant`] rather than every
    /// `Variant`.
    pub(crate) fn square_raw<P: PerformanceTag>(&self, a: T) -> T {
        let (hi, lo) = a.wide_square();
        redc_core::<T, P::Select>(hi, lo, self.constants.n, self.constants.neg_inv_n)
    }

    /// Bring a raw internal-range limb (e.g. the output of a
    /// [`Self::square_raw`] chain) into the variant's representative
    /// range.
    pub(crate) fn finalize_raw<P: PerformanceTag>(&self, t: T) -> MontgomeryValue<T> {
        MontgomeryValue(V::finalize_redc::<T, P::Select>(t, self.constants.n))
    }

    /// `a * b + c`.
    pub fn fmadd<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
        c: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        self.add::<P>(self.multiply::<P>(a, b), c)
    }

    /// `a * b - c`.
    pub fn fmsub<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
        c: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        self.subtract::<P>(self.multiply::<P>(a, b), c)
    }

    /// `a^2 + b`.
    pub fn fused_square_add<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        self.add::<P>(self.square::<P>(a), b)
    }

    /// `a^2 - b`.
    pub fn fused_square_sub<P: PerformanceTag>(
        &self,
        a: MontgomeryValue<T>,
        b: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        self.subtract::<P>(self.square::<P>(a), b)
    }

    /// Fused add-then-multiply: `(x + y) * z`, where `y` is already
    /// canonical. When `V::FAMUL_DIRECT_SUM` holds, `x + y` is formed
    /// directly in `T` and fed straight to `multiply` without a modular
    /// reduction in between - the saving this primitive exists for. For
    /// Quarter, where that shortcut is unsound (see `DESIGN.md`), this
    /// falls back to a canonicalizing add first.
    pub fn famul<P: PerformanceTag>(
        &self,
        x: MontgomeryValue<T>,
        y: FusingValue<T>,
        z: MontgomeryValue<T>,
    ) -> MontgomeryValue<T> {
        let sum = if V::FAMUL_DIRECT_SUM {
            MontgomeryValue(x.0.wrapping_add(y.0))
        } else {
            self.add::<P>(x, MontgomeryValue(y.0))
        };
        self.multiply::<P>(sum, z)
    }

    /// `gcd(a, n)` via the binary GCD algorithm, operating on the raw
    /// (non-Montgomery) representative `a` supplies after conversion out.
    /// Returns `n` itself when `a` is `0`, the usual `gcd(0, n) = n`
    /// convention.
    pub fn gcd_with_modulus(&self, a: CanonicalValue<T>) -> T {
        let mut u = a.0;
        let mut v = self.constants.n;
        if u == T::ZERO {
            return v;
        }

        let mut common_twos = 0u32;
        while (u & T::ONE) == T::ZERO && (v & T::ONE) == T::ZERO {
            u = u.shr(1);
            v = v.shr(1);
            common_twos += 1;
        }
        while (u & T::ONE) == T::ZERO {
            u = u.shr(1);
        }
        while v != T::ZERO {
            while (v & T::ONE) == T::ZERO {
                v = v.shr(1);
            }
            if u > v {
                core::mem::swap(&mut u, &mut v);
            }
            v = v.wrapping_sub(u);
        }
        u.shl(common_twos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{FullRange, HalfRange, QuarterRange, SixthRange};
    use crate::word::LowUops;

    fn naive_mulmod(a: u32, b: u32, n: u32) -> u32 {
        ((a as u64 * b as u64) % n as u64) as u32
    }

    #[test]
    fn full_range_roundtrip_and_multiply() {
        let n: u32 = 0xFFFF_FFFB; // largest prime below 2^32
        let form = MontgomeryForm::<u32, FullRange>::new(n);
        for a in [0u32, 1, 2, n - 1, 12345, 0xDEAD_BEEF % n] {
            let mont = form.convert_in::<LowLatency>(a);
            let back = form.convert_out::<LowLatency>(mont);
            assert_eq!(back.into_raw(), a, "roundtrip failed for a={a}");
        }

        let a = 123456789u32 % n;
        let b = 987654321u32 % n;
        let ma = form.convert_in::<LowLatency>(a);
        let mb = form.convert_in::<LowLatency>(b);
        let mc = form.multiply::<LowLatency>(ma, mb);
        let c = form.convert_out::<LowLatency>(mc).into_raw();
        assert_eq!(c, naive_mulmod(a, b, n));
    }

    #[test]
    fn low_latency_and_low_uops_agree() {
        let n: u32 = 1_000_003;
        let form = MontgomeryForm::<u32, HalfRange>::new(n / 2 | 1);
        let n = form.modulus();
        for (a, b) in [(3u32, 5u32), (n - 1, 2), (777, n - 2)] {
            let ma1 = form.convert_in::<LowLatency>(a % n);
            let mb1 = form.convert_in::<LowLatency>(b % n);
            let ma2 = form.convert_in::<LowUops>(a % n);
            let mb2 = form.convert_in::<LowUops>(b % n);
            let c1 = form.convert_out::<LowLatency>(form.multiply::<LowLatency>(ma1, mb1));
            let c2 = form.convert_out::<LowUops>(form.multiply::<LowUops>(ma2, mb2));
            assert_eq!(c1.into_raw(), c2.into_raw());
        }
    }

    #[test]
    fn quarter_and_sixth_multiply_matches_naive() {
        let qn: u32 = (u32::MAX / 4) | 1;
        let qform = MontgomeryForm::<u32, QuarterRange>::new(qn);
        let a = 999983u32 % qn;
        let b = 314159u32 % qn;
        let ma = qform.convert_in::<LowLatency>(a);
        let mb = qform.convert_in::<LowLatency>(b);
        let c = qform
            .convert_out::<LowLatency>(qform.multiply::<LowLatency>(ma, mb))
            .into_raw();
        assert_eq!(c, naive_mulmod(a, b, qn));

        let sn: u32 = (u32::MAX / 6 - 1) | 1;
        let sform = MontgomeryForm::<u32, SixthRange>::new(sn);
        let a = 271828u32 % sn;
        let b = 161803u32 % sn;
        let ma = sform.convert_in::<LowLatency>(a);
        let mb = sform.convert_in::<LowLatency>(b);
        let c = sform
            .convert_out::<LowLatency>(sform.multiply::<LowLatency>(ma, mb))
            .into_raw();
        assert_eq!(c, naive_mulmod(a, b, sn));
    }

    #[test]
    fn negate_and_add_cancel() {
        let n: u32 = 97;
        let form = MontgomeryForm::<u32, FullRange>::new(n);
        let a = form.convert_in::<LowLatency>(42);
        let neg_a = form.negate::<LowLatency>(a);
        let sum = form.add::<LowLatency>(a, neg_a);
        assert_eq!(form.convert_out::<LowLatency>(sum).into_raw(), 0);
    }

    #[test]
    fn famul_matches_separate_add_then_multiply() {
        let n: u32 = (u32::MAX / 2) | 1; // Half range
        let form = MontgomeryForm::<u32, HalfRange>::new(n);
        let x = form.convert_in::<LowLatency>(1234);
        let y_canon = form.convert_out::<LowLatency>(form.convert_in::<LowLatency>(5678));
        let z = form.convert_in::<LowLatency>(91011);

        let fused = form.famul::<LowLatency>(x, y_canon.into_fusing(), z);
        let separate = form.multiply::<LowLatency>(form.add::<LowLatency>(x, MontgomeryValue(y_canon.into_raw())), z);
        assert_eq!(fused, separate);
    }

    #[test]
    fn gcd_with_modulus_matches_euclid() {
        fn euclid(mut a: u32, mut b: u32) -> u32 {
            while b != 0 {
                let t = b;
                b = a % b;
                a = t;
            }
            a
        }
        let n: u32 = (97 * 101) | 1;
        let form = MontgomeryForm::<u32, FullRange>::new(n);
        for a in [0u32, 1, 6, 35, 97, 909] {
            let g = form.gcd_with_modulus(CanonicalValue(a % n));
            assert_eq!(g, euclid(a % n, n));
        }
    }
}

/// Randomized property checks: round-trip, constants, ring laws, and fused
/// equivalences, across random `(n, a, b)` triples for every variant.
/// Hand-rolled `rand` loops in the style of this crate's other randomized
/// tests, rather than `proptest`/`quickcheck`.
#[cfg(test)]
mod proptest_like {
    use super::*;
    use crate::variant::{FullRange, HalfRange, QuarterRange, SixthRange};
    use crate::word::LowLatency;
    use rand::Rng;

    const TRIALS: usize = 200;

    fn random_odd_modulus<V: Variant>(rng: &mut impl Rng) -> u32 {
        let max = V::max_modulus::<u32>();
        rng.gen_range(1..=max / 2) * 2 + 1
    }

    fn check_variant<V: Variant>(rng: &mut impl Rng) {
        for _ in 0..TRIALS {
            let n = random_odd_modulus::<V>(rng);
            let form = MontgomeryForm::<u32, V>::new(n);
            let a = rng.gen_range(0..n);
            let b = rng.gen_range(0..n);
            let c = rng.gen_range(0..n);

            // Round-trip.
            let ma = form.convert_in::<LowLatency>(a);
            assert_eq!(form.convert_out::<LowLatency>(ma).into_raw(), a, "n={n} a={a}");

            // Constants.
            assert_eq!(form.convert_out::<LowLatency>(form.unity()).into_raw(), 1 % n);
            assert_eq!(form.convert_out::<LowLatency>(form.zero()).into_raw(), 0);
            assert_eq!(
                form.convert_out::<LowLatency>(form.negative_one::<LowLatency>())
                    .into_raw(),
                n - 1
            );

            let mb = form.convert_in::<LowLatency>(b);
            let mc = form.convert_in::<LowLatency>(c);
            let canon = |v: MontgomeryValue<u32>| form.convert_out::<LowLatency>(v).into_raw();

            // Ring laws, compared via canonical representative.
            assert_eq!(
                canon(form.add::<LowLatency>(ma, mb)),
                canon(form.add::<LowLatency>(mb, ma)),
                "commutative add n={n} a={a} b={b}"
            );
            assert_eq!(
                canon(form.multiply::<LowLatency>(ma, mb)),
                canon(form.multiply::<LowLatency>(mb, ma)),
                "commutative mul n={n} a={a} b={b}"
            );
            assert_eq!(
                canon(form.add::<LowLatency>(form.add::<LowLatency>(ma, mb), mc)),
                canon(form.add::<LowLatency>(ma, form.add::<LowLatency>(mb, mc))),
                "associative add"
            );
            assert_eq!(
                canon(form.multiply::<LowLatency>(form.multiply::<LowLatency>(ma, mb), mc)),
                canon(form.multiply::<LowLatency>(ma, form.multiply::<LowLatency>(mb, mc))),
                "associative mul"
            );
            assert_eq!(
                canon(form.multiply::<LowLatency>(form.add::<LowLatency>(ma, mb), mc)),
                canon(form.add::<LowLatency>(
                    form.multiply::<LowLatency>(ma, mc),
                    form.multiply::<LowLatency>(mb, mc)
                )),
                "distributive"
            );
            assert_eq!(canon(form.add::<LowLatency>(ma, form.zero())), canon(ma), "add identity");
            assert_eq!(
                canon(form.multiply::<LowLatency>(ma, form.unity())),
                canon(ma),
                "mul identity"
            );
            assert_eq!(
                canon(form.add::<LowLatency>(ma, form.negate::<LowLatency>(ma))),
                0,
                "negation"
            );

            // Fused equivalences.
            let c_canon = form.convert_out::<LowLatency>(mc).into_fusing();
            assert_eq!(
                canon(form.fmadd::<LowLatency>(ma, mb, mc)),
                canon(form.add::<LowLatency>(form.multiply::<LowLatency>(ma, mb), mc)),
                "fmadd"
            );
            assert_eq!(
                canon(form.fmsub::<LowLatency>(ma, mb, mc)),
                canon(form.subtract::<LowLatency>(form.multiply::<LowLatency>(ma, mb), mc)),
                "fmsub"
            );
            assert_eq!(
                canon(form.famul::<LowLatency>(ma, c_canon, mb)),
                canon(form.multiply::<LowLatency>(
                    form.add::<LowLatency>(ma, MontgomeryValue(c_canon.into_raw())),
                    mb
                )),
                "famul"
            );
            assert_eq!(
                canon(form.square::<LowLatency>(ma)),
                canon(form.multiply::<LowLatency>(ma, ma)),
                "square"
            );

            // Range invariant: canonical value is always < n.
            assert!(form.convert_out::<LowLatency>(ma).into_raw() < n);
        }
    }

    #[test]
    fn full_range_properties() {
        let mut rng = rand::thread_rng();
        check_variant::<FullRange>(&mut rng);
    }

    #[test]
    fn half_range_properties() {
        let mut rng = rand::thread_rng();
        check_variant::<HalfRange>(&mut rng);
    }

    #[test]
    fn quarter_range_properties() {
        let mut rng = rand::thread_rng();
        check_variant::<QuarterRange>(&mut rng);
    }

    #[test]
    fn sixth_range_properties() {
        let mut rng = rand::thread_rng();
        check_variant::<SixthRange>(&mut rng);
    }
}
