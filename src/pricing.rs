//! Pricing

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{discounts::DiscountCode, items::LineItem};

/// Errors that can occur while calculating prices.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A calculation overflowed the minor unit range.
    #[error("price calculation overflowed")]
    Overflow,

    /// A decimal amount could not be represented in minor units.
    #[error("amount {0} cannot be represented in minor units")]
    OutOfRange(Decimal),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Tax and discount rates applied to a cart.
#[derive(Clone, Debug, PartialEq)]
pub struct PricingPolicy {
    tax_rate: Percentage,
    discount: DiscountCode,
}

impl PricingPolicy {
    /// Create a new pricing policy.
    pub fn new(tax_rate: Percentage, discount: DiscountCode) -> Self {
        Self { tax_rate, discount }
    }

    /// Tax rate applied at checkout
    pub fn tax_rate(&self) -> Percentage {
        self.tax_rate
    }

    /// The discount code accepted by carts using this policy
    pub fn discount(&self) -> &DiscountCode {
        &self.discount
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Percentage::from(Decimal::new(95, 3)),
            discount: DiscountCode::default(),
        }
    }
}

/// Calculates tax on an amount.
///
/// No rounding is applied; callers round when presenting money.
pub fn compute_tax(amount: Decimal, rate: Percentage) -> Decimal {
    percent_of(amount, rate)
}

/// Applies a percentage to an amount.
pub fn percent_of(amount: Decimal, rate: Percentage) -> Decimal {
    percentage_value(rate) * amount
}

/// Returns the fractional value of a percentage (e.g. `0.095` for 9.5%).
pub fn percentage_value(rate: Percentage) -> Decimal {
    // decimal_percentage doesn't expose the underlying Decimal
    rate * Decimal::ONE
}

/// Converts money into an exact decimal amount in major units.
pub fn to_decimal(money: &Money<'_, Currency>) -> Decimal {
    Decimal::new(money.to_minor_units(), money.currency().exponent)
}

/// Converts a decimal amount into money, rounding half away from zero to the minor unit.
///
/// # Errors
///
/// Returns [`PricingError::OutOfRange`] if the amount does not fit in minor units.
pub fn to_money(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let scale = 10_u64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .ok_or(PricingError::OutOfRange(amount))?;

    let minor = amount
        .round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(scale)
        .and_then(|value| value.to_i64())
        .ok_or(PricingError::OutOfRange(amount))?;

    Ok(Money::from_minor(minor, currency))
}

/// Calculates the total price of a list of line items.
///
/// An empty list totals zero in the given currency.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: a line total does not fit in minor units.
/// - [`PricingError::Money`]: wrapped money arithmetic or currency mismatch error.
pub fn total_price(
    items: &[LineItem],
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    items
        .iter()
        .try_fold(
            Money::from_minor(0, currency),
            |acc, item| -> Result<_, PricingError> { Ok(acc.add(item.line_total()?)?) },
        )
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    #[test]
    fn compute_tax_is_exact() {
        let tax = compute_tax(dec("9.25"), Percentage::from(dec("0.095")));

        assert_eq!(tax, dec("0.87875"));
    }

    #[test]
    fn compute_tax_on_zero_is_zero() {
        let tax = compute_tax(Decimal::ZERO, Percentage::from(dec("0.095")));

        assert_eq!(tax, Decimal::ZERO);
    }

    #[test]
    fn to_money_rounds_half_away_from_zero() -> TestResult {
        assert_eq!(to_money(dec("10.12875"), USD)?, Money::from_minor(1013, USD));
        assert_eq!(to_money(dec("0.925"), USD)?, Money::from_minor(93, USD));
        assert_eq!(to_money(dec("0.924"), USD)?, Money::from_minor(92, USD));

        Ok(())
    }

    #[test]
    fn to_decimal_uses_currency_exponent() {
        assert_eq!(to_decimal(&Money::from_minor(925, USD)), dec("9.25"));
    }

    #[test]
    fn total_price_sums_line_totals() -> TestResult {
        let items = [
            LineItem::new("Coffee", dec("3.50"), 2, USD)?,
            LineItem::new("Muffin", dec("2.25"), 1, USD)?,
        ];

        assert_eq!(total_price(&items, USD)?, Money::from_minor(925, USD));

        Ok(())
    }

    #[test]
    fn total_price_empty_is_zero() -> TestResult {
        assert_eq!(total_price(&[], GBP)?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn total_price_rejects_mixed_currencies() -> TestResult {
        let items = [
            LineItem::new("Coffee", dec("3.50"), 1, USD)?,
            LineItem::new("Tea", dec("2.00"), 1, GBP)?,
        ];

        assert!(matches!(
            total_price(&items, USD),
            Err(PricingError::Money(MoneyError::CurrencyMismatch { .. }))
        ));

        Ok(())
    }

    #[test]
    fn default_policy_matches_campus_cafe() {
        let policy = PricingPolicy::default();

        assert_eq!(percentage_value(policy.tax_rate()), dec("0.095"));
        assert_eq!(policy.discount().code(), "STUDENT10");
    }
}
