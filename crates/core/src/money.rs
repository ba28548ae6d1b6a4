//! Monetary amounts in minor currency units.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A monetary amount in the smallest currency unit (e.g. cents), tagged with
/// an ISO currency code.
///
/// Arithmetic is checked; mixing currencies is an invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    minor_units: u64,
    currency: String,
}

impl Money {
    pub fn new(minor_units: u64, currency: impl Into<String>) -> Self {
        Self {
            minor_units,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0, currency)
    }

    pub fn minor_units(&self) -> u64 {
        self.minor_units
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    pub fn checked_add(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let minor_units = self
            .minor_units
            .checked_add(other.minor_units)
            .ok_or_else(|| DomainError::invariant("monetary amount overflow"))?;
        Ok(Money {
            minor_units,
            currency: self.currency.clone(),
        })
    }

    pub fn saturating_sub(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Money {
            minor_units: self.minor_units.saturating_sub(other.minor_units),
            currency: self.currency.clone(),
        })
    }

    fn ensure_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::invariant(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency,
            self.minor_units / 100,
            self.minor_units % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_same_currency() {
        let a = Money::new(150, "USD");
        let b = Money::new(50, "USD");
        assert_eq!(a.checked_add(&b).unwrap(), Money::new(200, "USD"));
    }

    #[test]
    fn checked_add_rejects_currency_mismatch() {
        let a = Money::new(150, "USD");
        let b = Money::new(50, "EUR");
        match a.checked_add(&b).unwrap_err() {
            DomainError::InvariantViolation(msg) if msg.contains("currency mismatch") => {}
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = Money::new(50, "USD");
        let b = Money::new(150, "USD");
        assert!(a.saturating_sub(&b).unwrap().is_zero());
    }

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::new(130000, "USD").to_string(), "USD 1300.00");
        assert_eq!(Money::new(105, "EUR").to_string(), "EUR 1.05");
    }
}
