//! Fixed-point math utilities for deterministic decisions.
//!
//! Every resource quantity the engine reasons about (cell resource,
//! cargo, costs, forecast yields) is a fixed-point number so that two
//! runs over the same snapshot make bit-identical choices on any CPU.

use fixed::types::I32F32;

/// Fixed-point number type for all resource math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Largest whole quantity a [`Fixed`] can hold.
///
/// Configuration and snapshot amounts above this are rejected at the
/// boundary; [`amount`] and [`percent`] saturate rather than panic.
pub const MAX_AMOUNT: u32 = i32::MAX as u32;

/// Convert an integer percentage into a fixed-point fraction (25 -> 0.25).
#[must_use]
pub fn percent(value: u32) -> Fixed {
    amount(value) / Fixed::from_num(100)
}

/// Raise `base` to a non-negative integer power by repeated multiplication.
///
/// Saturates instead of overflowing; exponents in this engine stay small
/// (bounded by the radar horizon).
#[must_use]
pub fn powi(base: Fixed, exp: u32) -> Fixed {
    let mut result = Fixed::ONE;
    for _ in 0..exp {
        result = result.saturating_mul(base);
    }
    result
}

/// Widen an integer quantity from configuration into a fixed-point amount.
#[must_use]
pub fn amount(value: u32) -> Fixed {
    Fixed::saturating_from_num(value)
}
