//! Discounts
//!
//! A cart accepts a single configured discount code, at most once per cart lifetime.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

use crate::pricing::percent_of;

/// The code to type at the till and the share of the subtotal it takes off.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscountCode {
    code: String,
    rate: Percentage,
}

impl DiscountCode {
    /// Create a new discount code.
    pub fn new(code: impl Into<String>, rate: Percentage) -> Self {
        Self {
            code: code.into(),
            rate,
        }
    }

    /// The code text
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Share of the subtotal taken off
    pub fn rate(&self) -> Percentage {
        self.rate
    }

    /// Check a candidate against this code. Matching is exact.
    pub fn matches(&self, candidate: &str) -> bool {
        self.code == candidate
    }

    /// Discount amount this code takes off a subtotal.
    pub fn amount_off(&self, subtotal: Decimal) -> Decimal {
        percent_of(subtotal, self.rate)
    }

    /// Evaluate a candidate code against the subtotal and whether a discount has been used.
    ///
    /// Pure: marking the discount as used is left to the cart.
    pub fn evaluate(&self, candidate: &str, subtotal: Decimal, used: bool) -> DiscountOutcome {
        if candidate.trim().is_empty() {
            return DiscountOutcome::NoCode;
        }

        if !self.matches(candidate) {
            return DiscountOutcome::InvalidCode;
        }

        if used {
            return DiscountOutcome::AlreadyUsed;
        }

        DiscountOutcome::Applied {
            amount: self.amount_off(subtotal),
        }
    }
}

impl Default for DiscountCode {
    fn default() -> Self {
        Self::new("STUDENT10", Percentage::from(Decimal::new(10, 2)))
    }
}

/// Result of trying a discount code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscountOutcome {
    /// The code was accepted; `amount` is taken off the subtotal.
    Applied {
        /// Exact discount amount, before any rounding to money
        amount: Decimal,
    },

    /// The code matched, but this cart has already used its discount.
    AlreadyUsed,

    /// The code did not match.
    InvalidCode,

    /// No code was entered.
    NoCode,
}

impl DiscountOutcome {
    /// Discount amount, zero unless the code was applied.
    pub fn amount(&self) -> Decimal {
        match self {
            DiscountOutcome::Applied { amount } => *amount,
            DiscountOutcome::AlreadyUsed
            | DiscountOutcome::InvalidCode
            | DiscountOutcome::NoCode => Decimal::ZERO,
        }
    }

    /// Whether the code was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, DiscountOutcome::Applied { .. })
    }
}
