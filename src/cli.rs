//! Command line configuration

use std::path::PathBuf;

use clap::Parser;

use crate::{
    config::{CafeSettings, ConfigError},
    logging::LoggingConfig,
    storage::CartFiles,
};

/// Café cart manager
#[derive(Debug, Parser)]
#[command(name = "cafe-cart", about = "Café point-of-sale cart manager", long_about = None)]
pub struct Cli {
    /// YAML settings file
    #[arg(short, long, env = "CAFE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where the cart is saved (the discount status is kept alongside it)
    #[arg(long, env = "CAFE_CART_FILE")]
    pub cart_file: Option<PathBuf>,

    /// Where the discount status is saved
    #[arg(long, env = "CAFE_STATUS_FILE")]
    pub status_file: Option<PathBuf>,

    /// Start with an empty cart instead of loading the saved one
    #[arg(long)]
    pub no_autoload: bool,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Cli {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Settings from the settings file (or defaults) with file locations from the command line
    /// taking precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed.
    pub fn settings(&self) -> Result<CafeSettings, ConfigError> {
        let settings = match &self.config {
            Some(path) => CafeSettings::from_yaml_file(path)?,
            None => CafeSettings::default(),
        };

        let files = match (&self.cart_file, &self.status_file) {
            (Some(cart), Some(status)) => CartFiles::new(cart, status),
            (Some(cart), None) => CartFiles::alongside(cart),
            (None, Some(status)) => CartFiles::new(settings.files().cart(), status),
            (None, None) => return Ok(settings),
        };

        Ok(settings.with_files(files))
    }
}
