//! [`ModularOps`] for [`BigUint`], gated behind the `num-bigint` feature.
//!
//! Unlike [`crate::prim`]'s [`crate::word::WideArith`]-bounded primitives,
//! `BigUint` already has real division, so `invm` goes through
//! [`num_integer::Integer::extended_gcd`] (promoting to [`BigInt`] for the
//! signed Bezout coefficients) rather than the binary-shift inverse
//! `prim.rs` needs to avoid division entirely.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::ModularOps;

fn negm_raw(a: &BigUint, m: &BigUint) -> BigUint {
    let r = a % m;
    if r.is_zero() {
        BigUint::zero()
    } else {
        m - r
    }
}

fn powm_raw(base: &BigUint, exp: &BigUint, m: &BigUint) -> BigUint {
    let mut result = BigUint::one() % m;
    let mut base = base % m;
    let mut exp = exp.clone();
    let two = BigUint::from(2u8);
    while !exp.is_zero() {
        if exp.is_odd() {
            result = (&result * &base) % m;
        }
        base = (&base * &base) % m;
        exp = exp / &two;
    }
    result
}

fn invm_raw(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m <= &BigUint::one() {
        return None;
    }
    let a_int = BigInt::from_biguint(Sign::Plus, a % m);
    let m_int = BigInt::from_biguint(Sign::Plus, m.clone());
    let egcd = a_int.extended_gcd(&m_int);
    if egcd.gcd != BigInt::one() {
        return None;
    }
    let x = egcd.x.mod_floor(&m_int);
    x.to_biguint()
}

/// Jacobi symbol `(a|n)` for odd `n`, BigUint analogue of
/// [`crate::prim::jacobi_symbol`] - same recurrence, but using real
/// division (`%`) instead of binary long division since it's available.
fn jacobi_symbol(a: &BigUint, n: &BigUint) -> i8 {
    debug_assert!(n.is_odd(), "jacobi requires an odd modulus");
    let mut a = a % n;
    let mut n = n.clone();
    let mut t = 1i8;
    let eight = BigUint::from(8u8);
    while !a.is_zero() {
        while a.is_even() {
            a = a >> 1u32;
            let r = (&n % &eight).to_u8().unwrap_or(0);
            if r == 3 || r == 5 {
                t = -t;
            }
        }
        core::mem::swap(&mut a, &mut n);
        let four = BigUint::from(4u8);
        if (&a % &four) == BigUint::from(3u8) && (&n % &four) == BigUint::from(3u8) {
            t = -t;
        }
        a = &a % &n;
    }
    if n == BigUint::one() {
        t
    } else {
        0
    }
}

/// Kronecker symbol `(a|n)`, BigUint analogue of
/// [`crate::prim::kronecker_symbol`].
fn kronecker_symbol(a: &BigUint, n: &BigUint) -> i8 {
    if n.is_zero() {
        return if a == &BigUint::one() { 1 } else { 0 };
    }
    if a.is_even() && n.is_even() {
        return 0;
    }

    let mut n_odd = n.clone();
    let mut twos = 0u32;
    while n_odd.is_even() {
        n_odd = n_odd >> 1u32;
        twos += 1;
    }

    let a_mod8 = (a % &BigUint::from(8u8)).to_u8().unwrap_or(0);
    let kron_two = match a_mod8 {
        1 | 7 => 1i8,
        3 | 5 => -1i8,
        _ => 0i8,
    };
    let two_factor = if twos == 0 {
        1
    } else if kron_two == 0 {
        0
    } else if twos % 2 == 0 {
        1
    } else {
        kron_two
    };

    if two_factor == 0 {
        return 0;
    }
    two_factor * jacobi_symbol(a, &n_odd)
}

impl<'a> ModularOps<&'a BigUint, &'a BigUint> for &'a BigUint {
    type Output = BigUint;

    fn addm(self, rhs: &'a BigUint, m: &'a BigUint) -> BigUint {
        (self + rhs) % m
    }

    fn subm(self, rhs: &'a BigUint, m: &'a BigUint) -> BigUint {
        let a = self % m;
        let b = rhs % m;
        if a >= b {
            a - b
        } else {
            m - (b - a)
        }
    }

    fn mulm(self, rhs: &'a BigUint, m: &'a BigUint) -> BigUint {
        (self * rhs) % m
    }

    fn powm(self, exp: &'a BigUint, m: &'a BigUint) -> BigUint {
        powm_raw(self, exp, m)
    }

    fn negm(self, m: &'a BigUint) -> BigUint {
        negm_raw(self, m)
    }

    fn invm(self, m: &'a BigUint) -> Option<BigUint> {
        invm_raw(self, m)
    }

    fn jacobi(self, n: &'a BigUint) -> i8 {
        jacobi_symbol(self, n)
    }

    fn kronecker(self, n: &'a BigUint) -> i8 {
        kronecker_symbol(self, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addm_subm_mulm_match_u64_reference() {
        let m = BigUint::from(97u64);
        let x = BigUint::from(250u64);
        let y = BigUint::from(80u64);
        assert_eq!(ModularOps::addm(&x, &y, &m), BigUint::from((250u64 + 80) % 97));
        assert_eq!(ModularOps::mulm(&x, &y, &m), BigUint::from((250u64 * 80) % 97));
        let sub = ModularOps::subm(&x, &y, &m);
        assert_eq!(sub, BigUint::from((250u64 + 97 - 80) % 97));
    }

    #[test]
    fn invm_matches_known_vectors() {
        let cases: [(u64, u64, u64); 5] = [
            (5, 11, 9),
            (8, 11, 7),
            (3, 5000, 1667),
            (1667, 5000, 3),
            (999, 5000, 3999),
        ];
        for (a, m, x) in cases {
            let a = BigUint::from(a);
            let m = BigUint::from(m);
            assert_eq!(ModularOps::invm(&a, &m), Some(BigUint::from(x)));
        }
    }

    #[test]
    fn jacobi_and_kronecker_match_primitive_vectors() {
        let cases: [(u8, u8, i8); 6] = [
            (2, 3, -1),
            (29, 9, 1),
            (17, 11, -1),
            (11, 33, 0),
            (15, 37, -1),
            (29, 59, 1),
        ];
        for (a, n, expect) in cases {
            let ba = BigUint::from(a);
            let bn = BigUint::from(n);
            assert_eq!(ModularOps::jacobi(&ba, &bn), expect, "a={a} n={n}");
        }

        let kron_cases: [(u8, u8, i8); 4] = [(0, 15, 0), (7, 15, -1), (9, 14, 1), (10, 11, -1)];
        for (a, n, expect) in kron_cases {
            let ba = BigUint::from(a);
            let bn = BigUint::from(n);
            assert_eq!(ModularOps::kronecker(&ba, &bn), expect, "a={a} n={n}");
        }
    }
}
