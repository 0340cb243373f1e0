use crate::error::PayRequestError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits a requested amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest requestable amount in minor units (9 999 999 999 999.99). Fifteen
/// significant digits survive a trip through a JSON number unchanged.
pub const MAX_AMOUNT_MINOR_UNITS: i64 = 999_999_999_999_999;

/// A positive amount of money to request, always carried with 2 decimal places.
///
/// Construction goes through [`Amount::parse`] or `TryFrom<Decimal>`, so an
/// `Amount` held anywhere in the crate has already passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

/// An account balance as reported by the wallet backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PayRequestError> {
        if value <= Decimal::ZERO {
            return Err(PayRequestError::InvalidAmount(
                "amount must be greater than 0".to_string(),
            ));
        }
        if value.scale() > AMOUNT_SCALE {
            return Err(PayRequestError::InvalidAmount(format!(
                "amount {} has more than {} decimal places",
                value, AMOUNT_SCALE
            )));
        }

        if value > Self::max_value() {
            return Err(PayRequestError::InvalidAmount(format!(
                "amount {} exceeds the maximum of {}",
                value,
                Self::max_value()
            )));
        }

        let mut quantized = value;
        quantized.rescale(AMOUNT_SCALE);
        if quantized.scale() != AMOUNT_SCALE {
            return Err(PayRequestError::InvalidAmount(format!(
                "amount {} cannot carry {} decimal places",
                value, AMOUNT_SCALE
            )));
        }
        Ok(Self(quantized))
    }

    pub fn max_value() -> Decimal {
        Decimal::new(MAX_AMOUNT_MINOR_UNITS, AMOUNT_SCALE)
    }

    /// Parses user input the way the request form accepts it: plain digits,
    /// an optional point and at most two fractional digits.
    pub fn parse(input: &str) -> Result<Self, PayRequestError> {
        let trimmed = input.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        let well_formed = !trimmed.is_empty()
            && trimmed != "."
            && whole.chars().all(|c| c.is_ascii_digit())
            && fraction.chars().all(|c| c.is_ascii_digit())
            && fraction.len() <= AMOUNT_SCALE as usize;
        if !well_formed {
            return Err(PayRequestError::InvalidAmount(format!(
                "'{}' is not a number with at most {} decimal places",
                input, AMOUNT_SCALE
            )));
        }

        // "5." and ".5" are accepted by the form, Decimal wants digits on both sides
        let normalized = format!(
            "{}.{}",
            if whole.is_empty() { "0" } else { whole },
            if fraction.is_empty() { "0" } else { fraction }
        );
        let value = Decimal::from_str(&normalized)
            .map_err(|e| PayRequestError::InvalidAmount(format!("'{}': {}", input, e)))?;

        Self::new(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PayRequestError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Amount {
    type Err = PayRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const MAX: Self = Self(Decimal::MAX);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The balance the account must reach for a request of `amount` made
    /// against this baseline to count as paid. `None` when the sum is not
    /// representable.
    pub fn target_for(&self, amount: Amount) -> Option<Balance> {
        self.0.checked_add(amount.0).map(Balance)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_accepts_form_input() {
        assert_eq!(Amount::parse("50").unwrap().value(), dec!(50.00));
        assert_eq!(Amount::parse("50.5").unwrap().value(), dec!(50.50));
        assert_eq!(Amount::parse(" 0.01 ").unwrap().value(), dec!(0.01));
        assert_eq!(Amount::parse(".75").unwrap().value(), dec!(0.75));
        assert_eq!(Amount::parse("12.").unwrap().value(), dec!(12.00));
    }

    #[test]
    fn test_parse_always_carries_two_places() {
        assert_eq!(Amount::parse("7").unwrap().to_string(), "7.00");
        assert_eq!(Amount::parse("7.1").unwrap().to_string(), "7.10");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in ["", ".", "abc", "-5", "1.234", "1,50", "1e3", "0", "0.00", "+3"] {
            assert!(
                matches!(Amount::parse(input), Err(PayRequestError::InvalidAmount(_))),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(PayRequestError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(PayRequestError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(dec!(1.001)),
            Err(PayRequestError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_amount_deserialize_validates() {
        let ok: Amount = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(ok.value(), dec!(19.99));
        assert!(serde_json::from_str::<Amount>("\"-2\"").is_err());
    }

    #[test]
    fn test_target_balance() {
        let baseline = Balance::new(dec!(200.00));
        let amount = Amount::parse("50.00").unwrap();
        assert_eq!(baseline.target_for(amount), Some(Balance::new(dec!(250.00))));
        assert!(Some(Balance::new(dec!(249.99))) < baseline.target_for(amount));
    }

    #[test]
    fn test_amount_is_bounded() {
        assert_eq!(
            Amount::parse("9999999999999.99").unwrap().value(),
            dec!(9999999999999.99)
        );
        for input in ["10000000000000", "79228162514264337593543950335"] {
            assert!(
                matches!(Amount::parse(input), Err(PayRequestError::InvalidAmount(_))),
                "expected '{}' to be rejected",
                input
            );
        }
        assert!(Amount::new(Decimal::MAX).is_err());
    }

    #[test]
    fn test_target_overflow_is_not_a_panic() {
        let amount = Amount::parse("1.00").unwrap();
        assert_eq!(Balance::MAX.target_for(amount), None);
    }
}
