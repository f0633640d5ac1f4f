//! Cart persistence
//!
//! A cart is stored as two files: a comma separated item list with a `Name,Price,Quantity`
//! header, and a discount-status file holding `True` or `False`. Names are written
//! unquoted, so a name containing a comma will not survive a round trip.

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{cart::CartStore, items::LineItem, pricing::to_decimal};

/// Header row of the cart file.
pub const CART_HEADER: &str = "Name,Price,Quantity";

/// Default cart file name.
pub const DEFAULT_CART_FILE: &str = "cart.csv";

/// Default discount-status file name.
pub const DEFAULT_STATUS_FILE: &str = "discount_status.txt";

/// Errors raised while saving or loading a cart.
#[derive(Debug, Error)]
pub enum StorageError {
    /// There was nothing to save.
    #[error("cannot save: the cart is empty")]
    EmptyCart,

    /// A file could not be read or written.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// A saved file could not be parsed.
    #[error("corrupt data in {} line {line}: {reason}", path.display())]
    Corrupt {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },
}

/// Locations of the two files that make up a saved cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartFiles {
    cart: PathBuf,
    discount_status: PathBuf,
}

impl CartFiles {
    /// Use explicit paths for both files.
    pub fn new(cart: impl Into<PathBuf>, discount_status: impl Into<PathBuf>) -> Self {
        Self {
            cart: cart.into(),
            discount_status: discount_status.into(),
        }
    }

    /// Use `cart` and keep the discount-status file in the same directory.
    pub fn alongside(cart: impl Into<PathBuf>) -> Self {
        let cart = cart.into();
        let discount_status = cart.with_file_name(DEFAULT_STATUS_FILE);

        Self {
            cart,
            discount_status,
        }
    }

    /// Use the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();

        Self::new(dir.join(DEFAULT_CART_FILE), dir.join(DEFAULT_STATUS_FILE))
    }

    /// Cart file path
    pub fn cart(&self) -> &Path {
        &self.cart
    }

    /// Discount-status file path
    pub fn discount_status(&self) -> &Path {
        &self.discount_status
    }
}

impl Default for CartFiles {
    fn default() -> Self {
        Self::new(DEFAULT_CART_FILE, DEFAULT_STATUS_FILE)
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Number of item rows written
    pub items: usize,
}

/// Result of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No saved cart exists; the cart was left empty.
    NotFound,

    /// The saved cart replaced the current one.
    Restored {
        /// Number of items restored
        items: usize,
        /// Restored discount flag
        discount_used: bool,
    },
}

impl CartStore {
    /// Save the cart and its discount flag.
    ///
    /// Both files are written to temporary siblings first and only moved into place once
    /// both writes have succeeded. A failed write leaves the previous save untouched.
    ///
    /// # Errors
    ///
    /// - [`StorageError::EmptyCart`]: there are no items; nothing is written.
    /// - [`StorageError::Io`]: a file could not be written.
    #[tracing::instrument(skip_all, fields(cart = %files.cart().display()))]
    pub fn save(&self, files: &CartFiles) -> Result<SaveOutcome, StorageError> {
        if self.is_empty() {
            return Err(StorageError::EmptyCart);
        }

        let cart = Staged::write(files.cart(), |out| write_cart(out, self.items()))?;
        let status = Staged::write(files.discount_status(), |out| {
            out.write_all(format_discount_status(self.discount_used()).as_bytes())
        })
        .inspect_err(|_err| cart.discard())?;

        cart.commit().inspect_err(|_err| status.discard())?;
        status.commit()?;

        info!(items = self.len(), discount_used = self.discount_used(), "saved cart");

        Ok(SaveOutcome { items: self.len() })
    }

    /// Replace the cart with the saved one.
    ///
    /// The cart is always cleared first. A missing cart file is not an error. Rows without
    /// exactly three fields are skipped. Any unparseable or invalid row aborts the load and
    /// leaves the cart empty.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`]: a file exists but could not be read.
    /// - [`StorageError::Corrupt`]: a row or the discount status could not be parsed.
    #[tracing::instrument(skip_all, fields(cart = %files.cart().display()))]
    pub fn load(&mut self, files: &CartFiles) -> Result<LoadOutcome, StorageError> {
        self.clear_cart();

        let file = match File::open(files.cart()) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no saved cart");
                return Ok(LoadOutcome::NotFound);
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: files.cart().to_path_buf(),
                    source,
                });
            }
        };

        let items = parse_cart(BufReader::new(file), files.cart(), self.currency())?;
        let discount_used = read_discount_status(files.discount_status())?;
        let count = items.len();

        self.restore(items, discount_used);

        info!(items = count, discount_used, "loaded cart");

        Ok(LoadOutcome::Restored {
            items: count,
            discount_used,
        })
    }
}

/// Text stored in the discount-status file.
pub fn format_discount_status(used: bool) -> &'static str {
    if used { "True" } else { "False" }
}

/// Parses the discount-status text, ignoring case and surrounding whitespace.
pub fn parse_discount_status(text: &str) -> Option<bool> {
    let text = text.trim();

    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn write_cart(mut out: impl Write, items: &[LineItem]) -> io::Result<()> {
    writeln!(out, "{CART_HEADER}")?;

    for item in items {
        writeln!(
            out,
            "{},{},{}",
            item.name(),
            to_decimal(item.unit_price()),
            item.quantity()
        )?;
    }

    Ok(())
}

/// Parses every row before returning, so a bad row yields no items at all.
fn parse_cart(
    reader: impl BufRead,
    path: &Path,
    currency: &'static Currency,
) -> Result<Vec<LineItem>, StorageError> {
    let corrupt = |line: usize, reason: String| StorageError::Corrupt {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut items = Vec::new();

    // Header is line 1 and is never interpreted.
    for (line_no, line) in (1..).zip(reader.lines()).skip(1) {
        let line = line.map_err(|source| {
            if source.kind() == io::ErrorKind::InvalidData {
                corrupt(line_no, source.to_string())
            } else {
                StorageError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let row = line.strip_suffix('\r').unwrap_or(&line);
        let fields: Vec<&str> = row.split(',').collect();

        let [name, price, quantity] = fields.as_slice() else {
            if !row.trim().is_empty() {
                warn!(line = line_no, fields = fields.len(), "skipping malformed row");
            }
            continue;
        };

        let price: Decimal = price
            .trim()
            .parse()
            .map_err(|err| corrupt(line_no, format!("invalid price {price:?}: {err}")))?;

        let quantity: i64 = quantity
            .trim()
            .parse()
            .map_err(|err| corrupt(line_no, format!("invalid quantity {quantity:?}: {err}")))?;

        let item = LineItem::new(*name, price, quantity, currency)
            .map_err(|err| corrupt(line_no, err.to_string()))?;

        items.push(item);
    }

    Ok(items)
}

fn read_discount_status(path: &Path) -> Result<bool, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    parse_discount_status(&text).ok_or_else(|| StorageError::Corrupt {
        path: path.to_path_buf(),
        line: 1,
        reason: format!("expected True or False, got {:?}", text.trim()),
    })
}

/// A fully written temporary file waiting to replace its target.
#[derive(Debug)]
struct Staged {
    tmp: PathBuf,
    path: PathBuf,
}

impl Staged {
    fn write(
        path: &Path,
        write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    ) -> Result<Self, StorageError> {
        let staged = Self {
            tmp: temp_path(path),
            path: path.to_path_buf(),
        };

        let result = File::create(&staged.tmp).and_then(|file| {
            let mut out = BufWriter::new(file);
            write(&mut out)?;
            out.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()
        });

        match result {
            Ok(()) => Ok(staged),
            Err(source) => {
                staged.discard();
                Err(staged.io_error(source))
            }
        }
    }

    fn commit(&self) -> Result<(), StorageError> {
        fs::rename(&self.tmp, &self.path).map_err(|source| {
            self.discard();
            self.io_error(source)
        })
    }

    fn discard(&self) {
        if let Err(err) = fs::remove_file(&self.tmp)
            && err.kind() != io::ErrorKind::NotFound
        {
            debug!(path = %self.tmp.display(), error = %err, "failed to remove temporary file");
        }
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(DEFAULT_CART_FILE));
    name.push(".tmp");

    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn parse(text: &str) -> Result<Vec<LineItem>, StorageError> {
        parse_cart(text.as_bytes(), Path::new("cart.csv"), USD)
    }

    #[test]
    fn write_cart_emits_header_and_rows() -> TestResult {
        let items = [
            LineItem::new("Coffee", "3.5".parse()?, 2, USD)?,
            LineItem::new("Muffin", "2.25".parse()?, 1, USD)?,
        ];

        let mut out = Vec::new();
        write_cart(&mut out, &items)?;

        assert_eq!(
            String::from_utf8(out)?,
            "Name,Price,Quantity\nCoffee,3.50,2\nMuffin,2.25,1\n"
        );

        Ok(())
    }

    #[test]
    fn parse_cart_skips_header_and_odd_rows() -> TestResult {
        let items = parse("Name,Price,Quantity\nCoffee,3.5,2\nbad row\nLatte, with milk,4.00,1\n\nTea,1.80,3\r\n")?;

        let names: Vec<&str> = items.iter().map(LineItem::name).collect();

        assert_eq!(names, ["Coffee", "Tea"]);

        Ok(())
    }

    #[test]
    fn parse_cart_never_reads_header_as_item() -> TestResult {
        assert!(parse("Coffee,3.50,2\n")?.is_empty());
        assert!(parse("")?.is_empty());

        Ok(())
    }

    #[test]
    fn parse_cart_rejects_bad_price() {
        let result = parse("Name,Price,Quantity\nCoffee,3.50,2\nTea,abc,2\n");

        assert!(matches!(result, Err(StorageError::Corrupt { line: 3, .. })));
    }

    #[test]
    fn parse_cart_rejects_bad_quantity() {
        let result = parse("Name,Price,Quantity\nTea,1.80,two\n");

        assert!(matches!(result, Err(StorageError::Corrupt { line: 2, .. })));
    }

    #[test]
    fn parse_cart_rejects_invalid_items() {
        let result = parse("Name,Price,Quantity\n,1.80,1\n");

        assert!(matches!(result, Err(StorageError::Corrupt { line: 2, .. })));
    }

    #[test]
    fn parse_cart_reports_invalid_utf8_as_corrupt() {
        let bytes: &[u8] = b"Name,Price,Quantity\nTea,1.80,1\n\xff\xfe,1.00,1\n";

        let result = parse_cart(bytes, Path::new("cart.csv"), USD);

        assert!(matches!(result, Err(StorageError::Corrupt { line: 3, .. })));
    }

    #[test]
    fn discount_status_round_trips_text() {
        assert_eq!(parse_discount_status(format_discount_status(true)), Some(true));
        assert_eq!(parse_discount_status(format_discount_status(false)), Some(false));
        assert_eq!(parse_discount_status(" false\n"), Some(false));
        assert_eq!(parse_discount_status("TRUE"), Some(true));
        assert_eq!(parse_discount_status("yes"), None);
    }

    #[test]
    fn alongside_keeps_status_next_to_cart() {
        let files = CartFiles::alongside("/var/cafe/order.csv");

        assert_eq!(
            files.discount_status(),
            Path::new("/var/cafe/discount_status.txt")
        );
    }

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path(Path::new("/var/cafe/cart.csv")),
            PathBuf::from("/var/cafe/cart.csv.tmp")
        );
    }
}
