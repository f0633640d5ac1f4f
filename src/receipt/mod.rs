//! Receipt

use std::{fmt, io};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::{CartError, CartStore},
    pricing::{PricingError, compute_tax, to_decimal, to_money},
};

/// Errors that can occur when writing a receipt or report.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error calculating totals for the cart.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wrapper for pricing errors.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// Final receipt for a checked out cart.
///
/// Amounts are computed exactly and each one is rounded to the minor unit on its own,
/// so the printed lines may not add up to the printed total by a cent.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Total cost before any discount or tax
    subtotal: Money<'static, Currency>,

    /// Discount taken off the subtotal, if a code was applied
    discount: Option<Money<'static, Currency>>,

    /// Tax on the discounted subtotal
    tax: Money<'static, Currency>,

    /// Amount to pay
    total: Money<'static, Currency>,
}

impl Receipt {
    /// Create a new receipt with the given details.
    pub fn new(
        subtotal: Money<'static, Currency>,
        discount: Option<Money<'static, Currency>>,
        tax: Money<'static, Currency>,
        total: Money<'static, Currency>,
    ) -> Self {
        Self {
            subtotal,
            discount,
            tax,
            total,
        }
    }

    /// Build a receipt from the cart's current items and discount flag.
    ///
    /// The discount is recomputed from the current subtotal rather than remembered from
    /// when the code was entered.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::Pricing`] if totals cannot be calculated.
    pub fn for_cart(store: &CartStore) -> Result<Self, CartError> {
        let currency = store.currency();
        let subtotal = store.compute_subtotal()?;
        let discount = store.discount_amount()?;

        let taxable = to_decimal(&subtotal) - discount;
        let tax = store.tax_on(taxable);
        let total = taxable + tax;

        let discount = if discount > Decimal::ZERO {
            Some(to_money(discount, currency)?)
        } else {
            None
        };

        Ok(Self {
            subtotal,
            discount,
            tax: to_money(tax, currency)?,
            total: to_money(total, currency)?,
        })
    }

    /// Total cost before any discount or tax
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Discount taken off, if any
    pub fn discount(&self) -> Option<Money<'static, Currency>> {
        self.discount
    }

    /// Tax charged
    pub fn tax(&self) -> Money<'static, Currency> {
        self.tax
    }

    /// Amount to pay
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Writes the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(amount_row("Subtotal", self.subtotal));

        if let Some(discount) = self.discount {
            builder.push_record(amount_row("Discount", format!("-{discount}")));
        }

        builder.push_record(amount_row("Tax", self.tax));
        builder.push_record(amount_row("TOTAL", self.total));

        writeln!(out, "\n--- RECEIPT ---")?;
        write_amounts_table(&mut out, builder)?;

        Ok(())
    }
}

/// What the cart would cost with a freshly applied discount.
///
/// Display only: checkout recomputes the discount itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountPreview {
    saved: Money<'static, Currency>,
    new_subtotal: Money<'static, Currency>,
    tax: Money<'static, Currency>,
    total: Money<'static, Currency>,
}

impl DiscountPreview {
    /// Preview the totals for `subtotal` less `discount`.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if an amount cannot be represented as money.
    pub fn new(
        subtotal: Decimal,
        discount: Decimal,
        tax_rate: Percentage,
        currency: &'static Currency,
    ) -> Result<Self, PricingError> {
        let new_subtotal = subtotal - discount;
        let tax = compute_tax(new_subtotal, tax_rate);

        Ok(Self {
            saved: to_money(discount, currency)?,
            new_subtotal: to_money(new_subtotal, currency)?,
            tax: to_money(tax, currency)?,
            total: to_money(new_subtotal + tax, currency)?,
        })
    }

    /// Amount saved
    pub fn saved(&self) -> Money<'static, Currency> {
        self.saved
    }

    /// Subtotal after the discount
    pub fn new_subtotal(&self) -> Money<'static, Currency> {
        self.new_subtotal
    }

    /// Estimated tax on the new subtotal
    pub fn tax(&self) -> Money<'static, Currency> {
        self.tax
    }

    /// Estimated total
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Writes the preview.
    ///
    /// # Errors
    ///
    /// Returns an error if the preview cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(amount_row("You saved", self.saved));
        builder.push_record(amount_row("New Subtotal", self.new_subtotal));
        builder.push_record(amount_row("Estimated Tax", self.tax));
        builder.push_record(amount_row("Estimated Total", self.total));

        writeln!(out, "\n--- Discount Preview ---")?;
        write_amounts_table(&mut out, builder)?;

        Ok(())
    }
}

/// A label and a formatted amount.
pub(crate) fn amount_row(label: &str, amount: impl fmt::Display) -> [String; 2] {
    [label.to_string(), amount.to_string()]
}

/// Writes a two column label/amount table with the amounts right aligned.
pub(crate) fn write_amounts_table(
    out: &mut impl io::Write,
    builder: Builder,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(1..), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::pricing::PricingPolicy;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    fn cafe_order() -> Result<CartStore, CartError> {
        let mut store = CartStore::new(PricingPolicy::default(), USD);

        store.add_item("Coffee", dec("3.50"), 2)?;
        store.add_item("Muffin", dec("2.25"), 1)?;

        Ok(store)
    }

    #[test]
    fn for_cart_without_discount() -> TestResult {
        let receipt = Receipt::for_cart(&cafe_order()?)?;

        assert_eq!(receipt.subtotal(), Money::from_minor(925, USD));
        assert_eq!(receipt.discount(), None);
        assert_eq!(receipt.tax(), Money::from_minor(88, USD));
        assert_eq!(receipt.total(), Money::from_minor(1013, USD));

        Ok(())
    }

    #[test]
    fn for_cart_taxes_discounted_subtotal() -> TestResult {
        let mut store = cafe_order()?;
        store.apply_discount("STUDENT10")?;

        let receipt = Receipt::for_cart(&store)?;

        // 9.25 - 0.925 = 8.325, tax 0.790875, total 9.115875
        assert_eq!(receipt.subtotal(), Money::from_minor(925, USD));
        assert_eq!(receipt.discount(), Some(Money::from_minor(93, USD)));
        assert_eq!(receipt.tax(), Money::from_minor(79, USD));
        assert_eq!(receipt.total(), Money::from_minor(912, USD));

        Ok(())
    }

    #[test]
    fn for_cart_recomputes_discount_after_changes() -> TestResult {
        let mut store = cafe_order()?;
        store.apply_discount("STUDENT10")?;
        store.remove_item(2)?;

        let receipt = Receipt::for_cart(&store)?;

        assert_eq!(receipt.discount(), Some(Money::from_minor(70, USD)));

        Ok(())
    }

    #[test]
    fn write_to_lists_discount_only_when_applied() -> TestResult {
        let mut store = cafe_order()?;

        let mut plain = Vec::new();
        Receipt::for_cart(&store)?.write_to(&mut plain)?;
        let plain = String::from_utf8(plain)?;

        store.apply_discount("STUDENT10")?;

        let mut discounted = Vec::new();
        Receipt::for_cart(&store)?.write_to(&mut discounted)?;
        let discounted = String::from_utf8(discounted)?;

        assert!(plain.contains("RECEIPT"), "missing heading: {plain}");
        assert!(plain.contains("10.13"), "missing total: {plain}");
        assert!(!plain.contains("Discount"), "unexpected discount: {plain}");
        assert!(discounted.contains("Discount"), "missing discount: {discounted}");
        assert!(discounted.contains("0.93"), "missing amount: {discounted}");

        Ok(())
    }

    #[test]
    fn preview_matches_checkout_for_same_subtotal() -> TestResult {
        let mut store = cafe_order()?;
        let outcome = store.apply_discount("STUDENT10")?;

        let preview = DiscountPreview::new(
            dec("9.25"),
            outcome.amount(),
            store.policy().tax_rate(),
            USD,
        )?;
        let receipt = store.checkout()?;

        assert_eq!(preview.saved(), Money::from_minor(93, USD));
        assert_eq!(preview.new_subtotal(), Money::from_minor(833, USD));
        assert_eq!(preview.total(), receipt.total());

        Ok(())
    }
}
