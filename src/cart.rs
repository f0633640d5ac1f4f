//! Cart

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::CafeSettings,
    discounts::DiscountOutcome,
    items::{LineItem, LineItemError},
    pricing::{PricingError, PricingPolicy, compute_tax, to_decimal, total_price},
    receipt::Receipt,
    summary::CartSummary,
};

/// Errors related to cart mutations and reports.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The item failed validation.
    #[error(transparent)]
    InvalidItem(#[from] LineItemError),

    /// A 1-based item index was outside the cart.
    #[error("item {index} is not in the cart (1..={len})")]
    IndexOutOfRange {
        /// Requested 1-based index
        index: usize,
        /// Number of items in the cart
        len: usize,
    },

    /// The operation needs at least one item.
    #[error("the cart is empty")]
    EmptyCart,

    /// Errors bubbled up from price calculations.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Line items plus the per-cart discount flag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    items: Vec<LineItem>,
    discount_used: bool,
}

impl Cart {
    /// Items in insertion order
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether a discount code has been applied to this cart
    pub fn discount_used(&self) -> bool {
        self.discount_used
    }
}

/// Owns a cart and the pricing rules it is checked out under.
#[derive(Debug)]
pub struct CartStore {
    cart: Cart,
    policy: PricingPolicy,
    currency: &'static Currency,
}

impl CartStore {
    /// Create an empty cart store.
    pub fn new(policy: PricingPolicy, currency: &'static Currency) -> Self {
        Self {
            cart: Cart::default(),
            policy,
            currency,
        }
    }

    /// Create an empty cart store using the café's configured policy and currency.
    pub fn from_settings(settings: &CafeSettings) -> Self {
        Self::new(settings.policy().clone(), settings.currency())
    }

    /// Validate and append an item to the end of the cart, returning a copy of it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidItem`] if the name, price or quantity is invalid.
    /// The cart is unchanged on error.
    pub fn add_item(
        &mut self,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: i64,
    ) -> Result<LineItem, CartError> {
        let item = LineItem::new(name, unit_price, quantity, self.currency)?;

        debug!(
            name = item.name(),
            unit_price = %item.unit_price(),
            quantity = item.quantity(),
            "added item"
        );

        self.cart.items.push(item.clone());

        Ok(item)
    }

    /// Remove an item by its 1-based position.
    ///
    /// Items after it move up one position.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::IndexOutOfRange`] if there is no item at `index`.
    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, CartError> {
        let len = self.cart.items.len();

        if index == 0 || index > len {
            return Err(CartError::IndexOutOfRange { index, len });
        }

        let removed = self.cart.items.remove(index - 1);

        debug!(index, name = removed.name(), "removed item");

        Ok(removed)
    }

    /// Remove every item and forget any applied discount.
    pub fn clear_cart(&mut self) {
        self.cart = Cart::default();

        debug!("cleared cart");
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the total overflows.
    pub fn compute_subtotal(&self) -> Result<Money<'static, Currency>, PricingError> {
        total_price(&self.cart.items, self.currency)
    }

    /// Tax on an amount at this cart's tax rate.
    pub fn tax_on(&self, amount: Decimal) -> Decimal {
        compute_tax(amount, self.policy.tax_rate())
    }

    /// Try a discount code against the current subtotal.
    ///
    /// A successful application marks the cart's discount as used; every later attempt
    /// returns zero until the cart is cleared or reloaded.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the subtotal cannot be calculated.
    pub fn apply_discount(&mut self, code: &str) -> Result<DiscountOutcome, PricingError> {
        let subtotal = to_decimal(&self.compute_subtotal()?);
        let outcome = self
            .policy
            .discount()
            .evaluate(code, subtotal, self.cart.discount_used);

        if outcome.is_applied() {
            self.cart.discount_used = true;

            info!(amount = %outcome.amount(), %subtotal, "applied discount");
        } else {
            debug!(?outcome, "discount not applied");
        }

        Ok(outcome)
    }

    /// Discount owed at checkout, recomputed from the current subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the subtotal cannot be calculated.
    pub fn discount_amount(&self) -> Result<Decimal, PricingError> {
        if !self.cart.discount_used {
            return Ok(Decimal::ZERO);
        }

        let subtotal = to_decimal(&self.compute_subtotal()?);

        Ok(self.policy.discount().amount_off(subtotal))
    }

    /// Build the receipt for the current cart.
    ///
    /// The cart and its discount flag are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptyCart`] if there is nothing to check out.
    pub fn checkout(&self) -> Result<Receipt, CartError> {
        if self.is_empty() {
            return Err(CartError::EmptyCart);
        }

        Receipt::for_cart(self)
    }

    /// Build the cart view report.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::Pricing`] if totals cannot be calculated.
    pub fn summary(&self) -> Result<CartSummary, CartError> {
        CartSummary::for_cart(self)
    }

    /// Replace the cart contents wholesale.
    pub(crate) fn restore(&mut self, items: Vec<LineItem>, discount_used: bool) {
        self.cart = Cart {
            items,
            discount_used,
        };
    }

    /// The cart
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Items in insertion order
    pub fn items(&self) -> &[LineItem] {
        &self.cart.items
    }

    /// Iterate over the items in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.cart.items.iter()
    }

    /// Number of line items
    pub fn len(&self) -> usize {
        self.cart.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.cart.items.is_empty()
    }

    /// Whether a discount code has been applied to this cart
    pub fn discount_used(&self) -> bool {
        self.cart.discount_used
    }

    /// Pricing policy
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Currency of every item in the cart
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    fn store() -> CartStore {
        CartStore::new(PricingPolicy::default(), USD)
    }

    fn names(store: &CartStore) -> Vec<&str> {
        store.iter().map(LineItem::name).collect()
    }

    #[test]
    fn add_item_appends_in_order() -> TestResult {
        let mut store = store();

        store.add_item("Coffee", dec("3.50"), 2)?;
        store.add_item("Muffin", dec("2.25"), 1)?;

        assert_eq!(names(&store), ["Coffee", "Muffin"]);

        Ok(())
    }

    #[test]
    fn add_item_returns_the_stored_item() -> TestResult {
        let mut store = store();

        let added = store.add_item("Latte", dec("4.125"), 3)?;

        assert_eq!(store.items().last(), Some(&added));
        assert_eq!(added.unit_price(), &Money::from_minor(413, USD));

        Ok(())
    }

    #[test]
    fn add_item_rejections_leave_cart_untouched() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 2)?;

        let rejected = [
            store.add_item("", dec("1.00"), 1).map(|_| ()),
            store.add_item("Tea", dec("-1.00"), 1).map(|_| ()),
            store.add_item("Tea", dec("1.00"), 0).map(|_| ()),
        ];

        assert!(rejected.iter().all(Result::is_err));
        assert_eq!(store.len(), 1);

        Ok(())
    }

    #[test]
    fn add_item_reports_which_field_failed() {
        let mut store = store();

        assert_eq!(
            store.add_item("Tea", dec("1.00"), -1).map(|_| ()),
            Err(CartError::InvalidItem(LineItemError::NonPositiveQuantity(-1)))
        );
    }

    #[test]
    fn remove_same_index_twice_removes_both_items() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 2)?;
        store.add_item("Muffin", dec("2.25"), 1)?;

        let first = store.remove_item(1)?;
        let second = store.remove_item(1)?;

        assert_eq!(first.name(), "Coffee");
        assert_eq!(second.name(), "Muffin");
        assert!(store.is_empty());

        Ok(())
    }

    #[test]
    fn remove_renumbers_later_items() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 1)?;
        store.add_item("Muffin", dec("2.25"), 1)?;
        store.add_item("Bagel", dec("2.75"), 1)?;

        store.remove_item(2)?;

        assert_eq!(names(&store), ["Coffee", "Bagel"]);
        assert_eq!(store.remove_item(2)?.name(), "Bagel");

        Ok(())
    }

    #[test]
    fn remove_out_of_range_is_rejected() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 1)?;

        assert_eq!(
            store.remove_item(0),
            Err(CartError::IndexOutOfRange { index: 0, len: 1 })
        );
        assert_eq!(
            store.remove_item(2),
            Err(CartError::IndexOutOfRange { index: 2, len: 1 })
        );
        assert_eq!(store.len(), 1);

        Ok(())
    }

    #[test]
    fn subtotal_is_independent_of_insertion_order() -> TestResult {
        let mut forwards = store();
        let mut backwards = store();
        let lines = [("Coffee", "3.50", 2), ("Muffin", "2.25", 1), ("Tea", "1.80", 3)];

        for (name, price, qty) in lines {
            forwards.add_item(name, dec(price), qty)?;
        }

        for (name, price, qty) in lines.iter().rev() {
            backwards.add_item(*name, dec(price), *qty)?;
        }

        assert_eq!(forwards.compute_subtotal()?, Money::from_minor(1465, USD));
        assert_eq!(forwards.compute_subtotal()?, backwards.compute_subtotal()?);

        Ok(())
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() -> TestResult {
        assert_eq!(store().compute_subtotal()?, Money::from_minor(0, USD));

        Ok(())
    }

    #[test]
    fn tax_uses_policy_rate() {
        assert_eq!(store().tax_on(dec("9.25")), dec("0.87875"));
    }

    #[test]
    fn discount_applies_once_per_cart() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 2)?;
        store.add_item("Muffin", dec("2.25"), 1)?;

        let first = store.apply_discount("STUDENT10")?;
        let again = store.apply_discount("STUDENT10")?;

        assert_eq!(first.amount(), dec("0.925"));
        assert_eq!(again, DiscountOutcome::AlreadyUsed);
        assert_eq!(again.amount(), Decimal::ZERO);
        assert!(store.discount_used());

        Ok(())
    }

    #[test]
    fn clear_cart_resets_discount() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 2)?;
        store.apply_discount("STUDENT10")?;

        store.clear_cart();
        store.add_item("Coffee", dec("3.50"), 2)?;

        assert!(!store.discount_used());
        assert_eq!(store.apply_discount("STUDENT10")?.amount(), dec("0.70"));

        Ok(())
    }

    #[test]
    fn wrong_code_does_not_use_up_discount() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 2)?;

        assert_eq!(store.apply_discount("FREE")?, DiscountOutcome::InvalidCode);
        assert!(!store.discount_used());

        Ok(())
    }

    #[test]
    fn discount_amount_follows_current_subtotal() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 2)?;
        store.apply_discount("STUDENT10")?;
        store.add_item("Muffin", dec("2.25"), 1)?;

        assert_eq!(store.discount_amount()?, dec("0.925"));

        Ok(())
    }

    #[test]
    fn checkout_of_empty_cart_is_rejected() {
        assert!(matches!(store().checkout(), Err(CartError::EmptyCart)));
    }

    #[test]
    fn checkout_leaves_cart_and_discount_in_place() -> TestResult {
        let mut store = store();
        store.add_item("Coffee", dec("3.50"), 2)?;
        store.apply_discount("STUDENT10")?;

        store.checkout()?;

        assert_eq!(store.len(), 1);
        assert!(store.discount_used());

        Ok(())
    }
}
