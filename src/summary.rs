//! Cart view report

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

use crate::{
    cart::{CartError, CartStore},
    items::most_expensive_item,
    pricing::{to_decimal, to_money},
    receipt::{ReceiptError, amount_row, write_amounts_table},
};

/// One row of the cart view.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    /// 1-based position, the number used to remove the item
    pub position: usize,
    /// Item name
    pub name: String,
    /// Price of one unit
    pub unit_price: Money<'static, Currency>,
    /// Units on this line
    pub quantity: u32,
    /// Unit price times quantity
    pub line_total: Money<'static, Currency>,
}

/// The most expensive item by unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct MostExpensive {
    /// Item name
    pub name: String,
    /// Its unit price
    pub unit_price: Money<'static, Currency>,
}

/// Snapshot of the cart for display: lines, estimated totals and a couple of stats.
///
/// The estimate ignores any applied discount; checkout accounts for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    lines: Vec<SummaryLine>,
    subtotal: Money<'static, Currency>,
    tax: Money<'static, Currency>,
    estimated_total: Money<'static, Currency>,
    average_line_total: Option<Money<'static, Currency>>,
    most_expensive: Option<MostExpensive>,
}

impl CartSummary {
    /// Build the summary for a cart.
    ///
    /// Average line total and most expensive item are only reported when the subtotal is
    /// above zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError::Pricing`] if totals cannot be calculated.
    pub fn for_cart(store: &CartStore) -> Result<Self, CartError> {
        let currency = store.currency();

        let lines = store
            .iter()
            .enumerate()
            .map(|(idx, item)| -> Result<SummaryLine, CartError> {
                Ok(SummaryLine {
                    position: idx + 1,
                    name: item.name().to_string(),
                    unit_price: *item.unit_price(),
                    quantity: item.quantity(),
                    line_total: item.line_total()?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let subtotal = store.compute_subtotal()?;
        let subtotal_dec = to_decimal(&subtotal);
        let tax = store.tax_on(subtotal_dec);

        let (average_line_total, most_expensive) = if subtotal_dec > Decimal::ZERO {
            let count = Decimal::from(store.len());
            let average = to_money(subtotal_dec / count, currency)?;

            let most_expensive = most_expensive_item(store.items()).map(|item| MostExpensive {
                name: item.name().to_string(),
                unit_price: *item.unit_price(),
            });

            (Some(average), most_expensive)
        } else {
            (None, None)
        };

        Ok(Self {
            lines,
            subtotal,
            tax: to_money(tax, currency)?,
            estimated_total: to_money(subtotal_dec + tax, currency)?,
            average_line_total,
            most_expensive,
        })
    }

    /// Rows in cart order
    pub fn lines(&self) -> &[SummaryLine] {
        &self.lines
    }

    /// Subtotal
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Tax on the undiscounted subtotal
    pub fn tax(&self) -> Money<'static, Currency> {
        self.tax
    }

    /// Subtotal plus tax
    pub fn estimated_total(&self) -> Money<'static, Currency> {
        self.estimated_total
    }

    /// Subtotal divided by the number of lines
    pub fn average_line_total(&self) -> Option<Money<'static, Currency>> {
        self.average_line_total
    }

    /// Line with the highest unit price
    pub fn most_expensive(&self) -> Option<&MostExpensive> {
        self.most_expensive.as_ref()
    }

    /// Writes the cart view.
    ///
    /// # Errors
    ///
    /// Returns an error if the view cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        writeln!(out, "\n--- Current Cart ---")?;

        if self.lines.is_empty() {
            writeln!(out, "Your cart is empty.")?;
            return Ok(());
        }

        let mut builder = Builder::default();

        builder.push_record(["No.", "Item", "Price", "Qty", "Total"]);

        for line in &self.lines {
            builder.push_record([
                line.position.to_string(),
                line.name.clone(),
                line.unit_price.to_string(),
                line.quantity.to_string(),
                line.line_total.to_string(),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.modify(Columns::new(2..), Alignment::right());

        writeln!(out, "{table}")?;

        let mut totals = Builder::default();
        totals.push_record(amount_row("Subtotal", self.subtotal));
        totals.push_record(amount_row("Tax", self.tax));
        totals.push_record(amount_row("Estimated Total", self.estimated_total));

        write_amounts_table(&mut out, totals)?;

        if let Some(average) = self.average_line_total {
            writeln!(out, "\nAverage Line Total: {average}")?;
        }

        if let Some(most_expensive) = &self.most_expensive {
            writeln!(
                out,
                "Most Expensive Item: {} @ {}",
                most_expensive.name, most_expensive.unit_price
            )?;
        }

        Ok(())
    }
}
