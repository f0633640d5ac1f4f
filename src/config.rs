//! Café settings
//!
//! Settings are read from an optional YAML file. Every key may be omitted:
//!
//! ```yaml
//! name: Campus Café
//! currency: USD
//! tax_rate: 9.5%
//! discount:
//!   code: STUDENT10
//!   rate: "0.10"
//! cart_file: cart.csv
//! discount_status_file: discount_status.txt
//! ```

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::iso::{Currency, EUR, GBP, USD};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    discounts::DiscountCode,
    pricing::{PricingPolicy, percentage_value},
    storage::{CartFiles, DEFAULT_CART_FILE, DEFAULT_STATUS_FILE},
};

/// Name shown in the banner and on receipts when none is configured.
pub const DEFAULT_CAFE_NAME: &str = "Campus Café";

/// Settings errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the settings file
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid percentage format
    #[error("invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// The discount code was blank
    #[error("discount code cannot be empty")]
    EmptyDiscountCode,

    /// A discount cannot take off more than the whole subtotal
    #[error("discount rate {0} is above 100%")]
    DiscountRateTooHigh(Decimal),
}

/// Everything the café is configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct CafeSettings {
    name: String,
    currency: &'static Currency,
    policy: PricingPolicy,
    files: CartFiles,
}

impl CafeSettings {
    /// Create settings from their parts.
    pub fn new(
        name: impl Into<String>,
        currency: &'static Currency,
        policy: PricingPolicy,
        files: CartFiles,
    ) -> Self {
        Self {
            name: name.into(),
            currency,
            policy,
            files,
        }
    }

    /// Parse settings from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a value is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let fixture: SettingsFixture = serde_norway::from_str(yaml)?;

        fixture.try_into()
    }

    /// Read settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Replace where the cart is saved.
    #[must_use]
    pub fn with_files(mut self, files: CartFiles) -> Self {
        self.files = files;
        self
    }

    /// Café name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Currency for prices
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Tax and discount rules
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Where the cart is saved
    pub fn files(&self) -> &CartFiles {
        &self.files
    }
}

impl Default for CafeSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_CAFE_NAME,
            USD,
            PricingPolicy::default(),
            CartFiles::default(),
        )
    }
}

/// Settings file as written
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFixture {
    name: Option<String>,
    currency: Option<String>,
    tax_rate: Option<RateFixture>,
    discount: Option<DiscountFixture>,
    cart_file: Option<String>,
    discount_status_file: Option<String>,
}

/// Discount section of the settings file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DiscountFixture {
    code: Option<String>,
    rate: Option<RateFixture>,
}

/// A rate written either as text ("9.5%", "0.095") or as a bare number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RateFixture {
    Text(String),
    Number(f64),
}

impl RateFixture {
    fn to_percentage(&self) -> Result<Percentage, ConfigError> {
        match self {
            RateFixture::Text(text) => parse_percentage(text),
            RateFixture::Number(value) => Decimal::from_f64(*value)
                .ok_or_else(|| ConfigError::InvalidPercentage(value.to_string()))
                .and_then(|value| parse_percentage(&value.to_string())),
        }
    }
}

impl TryFrom<SettingsFixture> for CafeSettings {
    type Error = ConfigError;

    fn try_from(fixture: SettingsFixture) -> Result<Self, Self::Error> {
        let defaults = PricingPolicy::default();

        let currency = fixture
            .currency
            .as_deref()
            .map_or(Ok(USD), parse_currency)?;

        let tax_rate = fixture
            .tax_rate
            .as_ref()
            .map_or(Ok(defaults.tax_rate()), RateFixture::to_percentage)?;

        let discount = match fixture.discount {
            Some(discount) => {
                let code = discount
                    .code
                    .unwrap_or_else(|| defaults.discount().code().to_string());

                if code.trim().is_empty() {
                    return Err(ConfigError::EmptyDiscountCode);
                }

                let rate = discount
                    .rate
                    .as_ref()
                    .map_or(Ok(defaults.discount().rate()), RateFixture::to_percentage)?;

                if percentage_value(rate) > Decimal::ONE {
                    return Err(ConfigError::DiscountRateTooHigh(percentage_value(rate)));
                }

                DiscountCode::new(code, rate)
            }
            None => defaults.discount().clone(),
        };

        let cart_file = fixture
            .cart_file
            .unwrap_or_else(|| DEFAULT_CART_FILE.to_string());

        let files = match fixture.discount_status_file {
            Some(status) => CartFiles::new(cart_file, status),
            None if cart_file == DEFAULT_CART_FILE => {
                CartFiles::new(cart_file, DEFAULT_STATUS_FILE)
            }
            None => CartFiles::alongside(cart_file),
        };

        Ok(Self {
            name: fixture
                .name
                .unwrap_or_else(|| DEFAULT_CAFE_NAME.to_string()),
            currency,
            policy: PricingPolicy::new(tax_rate, discount),
            files,
        })
    }
}

/// Parse a currency code (e.g. "GBP").
///
/// # Errors
///
/// Returns an error if the currency code is not recognized.
pub fn parse_currency(code: &str) -> Result<&'static Currency, ConfigError> {
    match code.trim() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(ConfigError::UnknownCurrency(other.to_string())),
    }
}

/// Parse percentage string (e.g., "9.5%" or "0.095") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or is negative.
pub fn parse_percentage(s: &str) -> Result<Percentage, ConfigError> {
    let trimmed = s.trim();

    let value = if let Some(percent_str) = trimmed.strip_suffix('%') {
        percent_str
            .trim()
            .parse::<Decimal>()
            .map(|points| points / Decimal::ONE_HUNDRED)
    } else {
        trimmed.parse::<Decimal>()
    }
    .map_err(|_err| ConfigError::InvalidPercentage(s.to_string()))?;

    if value.is_sign_negative() {
        return Err(ConfigError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(value))
}
