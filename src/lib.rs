//! Café cart
//!
//! Cart manager for a small café point of sale: line items, exact tax and discount
//! arithmetic, receipts, and a saved cart that survives restarts.

pub mod cart;
pub mod cli;
pub mod config;
pub mod discounts;
pub mod items;
pub mod logging;
pub mod menu;
pub mod prelude;
pub mod pricing;
pub mod receipt;
pub mod storage;
pub mod summary;
