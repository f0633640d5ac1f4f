//! Interactive text menu
//!
//! A thin shell over [`CartStore`]: it prompts, parses raw text into typed values and
//! renders results. It works over any reader and writer, so it can be driven from tests.

use std::io::{self, BufRead, Write};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::{
    cart::{CartError, CartStore},
    config::CafeSettings,
    discounts::DiscountOutcome,
    pricing::{percentage_value, to_decimal},
    receipt::{DiscountPreview, ReceiptError},
    storage::{LoadOutcome, StorageError},
};

pub mod input;

/// Menu failures. Cart rejections are shown to the user instead.
#[derive(Debug, Error)]
pub enum MenuError {
    /// Reading input or writing output failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A receipt or report could not be rendered.
    #[error(transparent)]
    Render(#[from] ReceiptError),
}

/// Whether status messages are written for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reporting {
    /// Write status messages.
    Verbose,

    /// Only log; write nothing.
    Quiet,
}

/// What the loop does after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// The interactive cart menu.
#[derive(Debug)]
pub struct Menu<R, W> {
    store: CartStore,
    settings: CafeSettings,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    /// Create a menu over a cart store.
    pub fn new(store: CartStore, settings: CafeSettings, input: R, output: W) -> Self {
        Self {
            store,
            settings,
            input,
            output,
        }
    }

    /// The cart being edited
    pub fn store(&self) -> &CartStore {
        &self.store
    }

    /// Give back the cart store.
    pub fn into_store(self) -> CartStore {
        self.store
    }

    /// Show the banner and handle choices until checkout, quit, or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn run(&mut self) -> Result<(), MenuError> {
        self.show_banner()?;

        loop {
            self.show_options()?;

            let Some(choice) = self.prompt("Choose: ")? else {
                break;
            };

            let flow = match choice.trim() {
                "1" => self.add_item()?,
                "2" => self.view_cart()?,
                "3" => self.remove_item()?,
                "4" => self.apply_discount()?,
                "5" => self.clear_cart()?,
                "6" => self.checkout()?,
                "7" => self.quit()?,
                "8" => self.save()?,
                "9" => self.load(Reporting::Verbose)?,
                _ => {
                    self.say("Invalid choice. Please enter a number from 1 to 9.")?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        Ok(())
    }

    /// Replace the cart with the saved one.
    ///
    /// # Errors
    ///
    /// Returns an error if a status message cannot be written.
    pub fn load_saved(&mut self, reporting: Reporting) -> Result<(), MenuError> {
        self.load(reporting).map(|_flow| ())
    }

    fn show_banner(&mut self) -> Result<(), MenuError> {
        let rule = "=".repeat(40);
        let tax_rate = percentage_value(self.settings.policy().tax_rate());

        writeln!(self.output, "{rule}")?;
        writeln!(
            self.output,
            "{} - Tax Rate: {tax_rate:.3}",
            self.settings.name()
        )?;
        writeln!(self.output, "{rule}")?;

        Ok(())
    }

    fn show_options(&mut self) -> Result<(), MenuError> {
        writeln!(
            self.output,
            "\n1) Add item\n2) View cart\n3) Remove item\n4) Apply discount\n5) Clear cart\n\
             6) Checkout\n7) Quit\n8) Save cart\n9) Load cart"
        )?;

        Ok(())
    }

    fn add_item(&mut self) -> Result<Flow, MenuError> {
        let Some(name) = self.prompt("Item name: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(price) = self.prompt("Item price: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = self.prompt("Quantity: ")? else {
            return Ok(Flow::Exit);
        };

        let parsed = input::parse_price(&price)
            .and_then(|price| Ok((price, input::parse_quantity(&quantity)?)));

        let Ok((price, quantity)) = parsed else {
            self.say("Invalid input. Price and quantity must be numbers.")?;
            return Ok(Flow::Continue);
        };

        match self.store.add_item(name, price, quantity) {
            Ok(item) => {
                let message = format!(
                    "Added {} x {} @ {}",
                    item.name(),
                    item.quantity(),
                    item.unit_price()
                );
                self.say(&message)?;
            }
            Err(err) => self.say(&format!("Error: {err}"))?,
        }

        Ok(Flow::Continue)
    }

    fn view_cart(&mut self) -> Result<Flow, MenuError> {
        let summary = self.store.summary().map_err(ReceiptError::from)?;

        summary.write_to(&mut self.output)?;

        Ok(Flow::Continue)
    }

    fn remove_item(&mut self) -> Result<Flow, MenuError> {
        if self.store.is_empty() {
            self.say("Your cart is empty. Nothing to remove.")?;
            return Ok(Flow::Continue);
        }

        let Some(raw) = self.prompt("Enter item number to remove: ")? else {
            return Ok(Flow::Exit);
        };

        let Ok(index) = input::parse_index(&raw) else {
            self.say("Invalid input. Please enter a valid number.")?;
            return Ok(Flow::Continue);
        };

        let removed = usize::try_from(index)
            .map_err(|_err| CartError::IndexOutOfRange {
                index: 0,
                len: self.store.len(),
            })
            .and_then(|index| self.store.remove_item(index));

        match removed {
            Ok(item) => self.say(&format!("Removed '{}' from the cart.", item.name()))?,
            Err(_) => self.say("Error: Invalid item index.")?,
        }

        Ok(Flow::Continue)
    }

    fn apply_discount(&mut self) -> Result<Flow, MenuError> {
        if self.store.is_empty() {
            self.say("Your cart is empty. Add items before applying a discount.")?;
            return Ok(Flow::Continue);
        }

        if self.store.discount_used() {
            self.say("A discount has already been applied to this order.")?;
            return Ok(Flow::Continue);
        }

        let Some(code) = self.prompt("Enter discount code: ")? else {
            return Ok(Flow::Exit);
        };

        let subtotal = self
            .store
            .compute_subtotal()
            .map(|subtotal| to_decimal(&subtotal))
            .map_err(ReceiptError::from)?;

        let outcome = self
            .store
            .apply_discount(&code)
            .map_err(ReceiptError::from)?;

        match outcome {
            DiscountOutcome::Applied { amount } => {
                let discount = self.store.policy().discount();
                let points = (percentage_value(discount.rate()) * Decimal::ONE_HUNDRED).normalize();
                let message = format!("{} discount applied! You saved {points}%.", discount.code());
                self.say(&message)?;

                DiscountPreview::new(
                    subtotal,
                    amount,
                    self.store.policy().tax_rate(),
                    self.store.currency(),
                )
                .map_err(ReceiptError::from)?
                .write_to(&mut self.output)?;
            }
            DiscountOutcome::AlreadyUsed => {
                self.say("Discount code has already been used for this cart.")?;
            }
            DiscountOutcome::InvalidCode => self.say("Error: Invalid discount code.")?,
            DiscountOutcome::NoCode => {}
        }

        Ok(Flow::Continue)
    }

    fn clear_cart(&mut self) -> Result<Flow, MenuError> {
        self.store.clear_cart();
        self.say("\nYour cart has been cleared.")?;

        Ok(Flow::Continue)
    }

    fn checkout(&mut self) -> Result<Flow, MenuError> {
        let receipt = match self.store.checkout() {
            Ok(receipt) => receipt,
            Err(CartError::EmptyCart) => {
                self.say("Cannot check out, your cart is empty.")?;
                return Ok(Flow::Continue);
            }
            Err(err) => return Err(ReceiptError::from(err).into()),
        };

        self.say("\nCHECKOUT")?;
        receipt.write_to(&mut self.output)?;

        let message = format!("\nThank you for visiting {}!", self.settings.name());
        self.say(&message)?;

        Ok(Flow::Exit)
    }

    fn quit(&mut self) -> Result<Flow, MenuError> {
        let message = format!(
            "Goodbye! Thank you for using the {} manager.",
            self.settings.name()
        );
        self.say(&message)?;

        Ok(Flow::Exit)
    }

    fn save(&mut self) -> Result<Flow, MenuError> {
        let files = self.settings.files();

        let message = match self.store.save(files) {
            Ok(outcome) => format!(
                "\nCart saved to {} ({} items) and discount status saved.",
                files.cart().display(),
                outcome.items
            ),
            Err(StorageError::EmptyCart) => "Cannot save: the cart is empty.".to_string(),
            Err(err) => {
                warn!(error = %err, "failed to save cart");
                format!("\nError saving cart: {err}")
            }
        };

        self.say(&message)?;

        Ok(Flow::Continue)
    }

    fn load(&mut self, reporting: Reporting) -> Result<Flow, MenuError> {
        let message = match self.store.load(self.settings.files()) {
            Ok(LoadOutcome::NotFound) => "\nNo saved cart found.".to_string(),
            Ok(LoadOutcome::Restored { items, .. }) => {
                format!("\nCart loaded. {items} items restored.")
            }
            Err(err @ StorageError::Corrupt { .. }) => {
                warn!(error = %err, "saved cart is corrupt");
                format!("\nError loading cart. Data may be corrupt: {err}")
            }
            Err(err) => {
                warn!(error = %err, "failed to load cart");
                format!("\nError loading cart: {err}")
            }
        };

        if reporting == Reporting::Verbose {
            self.say(&message)?;
        }

        Ok(Flow::Continue)
    }

    fn say(&mut self, message: &str) -> Result<(), MenuError> {
        writeln!(self.output, "{message}")?;

        Ok(())
    }

    /// Writes a prompt and reads one line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>, MenuError> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();

        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
