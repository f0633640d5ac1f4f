//! Items

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::pricing::{PricingError, to_money};

/// Reasons a line item is rejected at construction.
#[derive(Debug, Error, PartialEq)]
pub enum LineItemError {
    /// The item name was empty.
    #[error("item name cannot be empty")]
    EmptyName,

    /// The unit price was below zero.
    #[error("item price must not be negative, got {0}")]
    NegativePrice(Decimal),

    /// The quantity was zero or negative.
    #[error("item quantity must be at least 1, got {0}")]
    NonPositiveQuantity(i64),

    /// The quantity does not fit in a line item.
    #[error("item quantity {0} is too large")]
    QuantityTooLarge(i64),

    /// The unit price cannot be represented in minor units.
    #[error("item price {0} is out of range")]
    PriceOutOfRange(Decimal),
}

/// One purchased product line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    name: String,
    unit_price: Money<'static, Currency>,
    quantity: u32,
}

impl LineItem {
    /// Validate and create a new line item.
    ///
    /// The unit price is rounded half away from zero to the currency's minor unit.
    ///
    /// # Errors
    ///
    /// Returns a [`LineItemError`] naming the first field that failed validation.
    pub fn new(
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: i64,
        currency: &'static Currency,
    ) -> Result<Self, LineItemError> {
        let name = name.into();

        if name.is_empty() {
            return Err(LineItemError::EmptyName);
        }

        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(LineItemError::NegativePrice(unit_price));
        }

        if quantity <= 0 {
            return Err(LineItemError::NonPositiveQuantity(quantity));
        }

        let quantity =
            u32::try_from(quantity).map_err(|_err| LineItemError::QuantityTooLarge(quantity))?;

        let unit_price = to_money(unit_price, currency)
            .map_err(|_err| LineItemError::PriceOutOfRange(unit_price))?;

        Ok(Self {
            name,
            unit_price,
            quantity,
        })
    }

    /// Item name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price of a single unit
    pub fn unit_price(&self) -> &Money<'static, Currency> {
        &self.unit_price
    }

    /// Number of units on this line
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price multiplied by quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the product does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, PricingError> {
        self.unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .map(|minor| Money::from_minor(minor, self.unit_price.currency()))
            .ok_or(PricingError::Overflow)
    }
}

/// Returns the item with the strictly greatest unit price.
///
/// Ties go to the earliest item.
pub fn most_expensive_item(items: &[LineItem]) -> Option<&LineItem> {
    items.iter().reduce(|best, item| {
        if item.unit_price().to_minor_units() > best.unit_price().to_minor_units() {
            item
        } else {
            best
        }
    })
}
