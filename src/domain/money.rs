//! Monetary types for price and stake representation.

use rust_decimal::Decimal;

/// Decimal odds represented as a Decimal for precision.
pub type Price = Decimal;

/// Stake limit represented as a Decimal for precision.
pub type Volume = Decimal;
