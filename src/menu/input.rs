//! Typed parsing of raw menu input

use rust_decimal::Decimal;
use thiserror::Error;

/// Raw text that could not be turned into the value a prompt asked for.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// The text was not a number.
    #[error("{field} must be a number, got {input:?}")]
    InvalidNumber {
        /// Which value was being read
        field: &'static str,
        /// What was typed
        input: String,
    },
}

/// Parse a price such as `3.50`.
///
/// # Errors
///
/// Returns [`InputError::InvalidNumber`] if the text is not a decimal number.
pub fn parse_price(input: &str) -> Result<Decimal, InputError> {
    input
        .trim()
        .parse()
        .map_err(|_err| invalid_number("price", input))
}

/// Parse a whole-number quantity.
///
/// Range checks are left to the cart so that it can report them.
///
/// # Errors
///
/// Returns [`InputError::InvalidNumber`] if the text is not an integer.
pub fn parse_quantity(input: &str) -> Result<i64, InputError> {
    input
        .trim()
        .parse()
        .map_err(|_err| invalid_number("quantity", input))
}

/// Parse a 1-based item number.
///
/// Negative numbers parse; they are simply never in range.
///
/// # Errors
///
/// Returns [`InputError::InvalidNumber`] if the text is not an integer.
pub fn parse_index(input: &str) -> Result<i64, InputError> {
    input
        .trim()
        .parse()
        .map_err(|_err| invalid_number("item number", input))
}

fn invalid_number(field: &'static str, input: &str) -> InputError {
    InputError::InvalidNumber {
        field,
        input: input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_trims_whitespace() -> TestResult {
        assert_eq!(parse_price(" 3.50 ")?, Decimal::new(350, 2));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_text() {
        assert_eq!(
            parse_price("three"),
            Err(InputError::InvalidNumber {
                field: "price",
                input: "three".to_string(),
            })
        );
    }

    #[test]
    fn parse_quantity_rejects_fractions() {
        assert!(parse_quantity("1.5").is_err());
    }

    #[test]
    fn parse_quantity_keeps_sign_for_the_cart_to_judge() -> TestResult {
        assert_eq!(parse_quantity("-2")?, -2);

        Ok(())
    }

    #[test]
    fn parse_index_accepts_integers() -> TestResult {
        assert_eq!(parse_index("2\n")?, 2);
        assert!(parse_index("").is_err());

        Ok(())
    }
}
