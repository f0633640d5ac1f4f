//! Café cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartStore},
    config::{CafeSettings, ConfigError},
    discounts::{DiscountCode, DiscountOutcome},
    items::{LineItem, LineItemError},
    menu::{Menu, MenuError, Reporting},
    pricing::{PricingError, PricingPolicy},
    receipt::{DiscountPreview, Receipt, ReceiptError},
    storage::{CartFiles, LoadOutcome, SaveOutcome, StorageError},
    summary::{CartSummary, SummaryLine},
};
