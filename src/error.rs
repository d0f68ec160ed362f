//! Precondition-violation taxonomy.
//!
//! Every operation in this crate is a pure function of its inputs and the
//! owning [`crate::form::MontgomeryForm`]'s constants; there are no
//! recoverable runtime failures. The variants below exist purely to give
//! panic messages and documentation a common vocabulary - they are never
//! returned from a public function, only formatted into `assert!`/
//! `debug_assert!` messages at the violated call site.

use core::fmt;

/// A named precondition violation.
///
/// Checked builds turn these into panics (`debug_assert!`); release builds
/// rely on the precondition having been upheld and the behavior is
/// otherwise unspecified: an assertion trap in checked builds, undefined
/// behavior in release.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// Modulus was outside `1 < n <= max_modulus(variant)`, or (for
    /// non-wrapper variants) even.
    Construction,
    /// A value parameter fell outside its variant's representative range.
    Domain,
    /// A negative exponent was supplied.
    Exponent,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ContractViolation::Construction => {
                "modulus must be odd and satisfy 1 < n <= max_modulus(variant)"
            }
            ContractViolation::Domain => "value outside the variant's representative range",
            ContractViolation::Exponent => "exponent must be non-negative",
        };
        f.write_str(msg)
    }
}
