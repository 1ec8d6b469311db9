//! Session-scoped collection of invoice line items.
//!
//! The ledger is append-only: items are validated on entry, keep their
//! insertion order in storage, and totals are recomputed from the stored items
//! on every query.

use std::fmt;
use std::str::FromStr;

use log::debug;
use rust_decimal::Decimal;

use crate::error::{Field, ValidationError};
use crate::money::{GST_RATE, MAX_UNIT_PRICE};

/// Identifier of a line item, unique within its ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u64);

impl ItemId {
    /// Returns the raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single product entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    id: ItemId,
    name: String,
    unit_price: Decimal,
    quantity: u32,
}

impl LineItem {
    /// Returns the identifier assigned by the ledger.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unit price.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price multiplied by quantity.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Display order of the item listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// A to Z.
    #[default]
    Ascending,
    /// Z to A.
    Descending,
}

impl SortOrder {
    /// Returns the opposite order.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Subtotal, tax and grand total of a ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of all line totals.
    pub subtotal: Decimal,
    /// GST on the subtotal.
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
}

impl Totals {
    /// Derives tax and total from a subtotal.
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let tax = subtotal * GST_RATE;
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// Frozen view of a ledger handed to the invoice renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceSnapshot {
    items: Vec<LineItem>,
    totals: Totals,
}

impl InvoiceSnapshot {
    /// Builds a snapshot from items in display order, computing the totals.
    pub fn new(items: Vec<LineItem>) -> Self {
        let subtotal = items.iter().map(LineItem::line_total).sum();
        Self {
            items,
            totals: Totals::from_subtotal(subtotal),
        }
    }

    /// Returns the items in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the totals computed when the snapshot was taken.
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Returns whether the snapshot has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Append-only collection of line items.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    items: Vec<LineItem>,
    next_id: u64,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the raw form values and appends a new item.
    ///
    /// Blank fields are reported before any parsing is attempted, so an empty
    /// name is always reported as [`ValidationError::EmptyField`] even when the
    /// price or quantity is malformed.
    pub fn add_item(
        &mut self,
        name: &str,
        price_text: &str,
        quantity_text: &str,
    ) -> Result<LineItem, ValidationError> {
        let name = required(name, Field::Name)?;
        let price_text = required(price_text, Field::Price)?;
        let quantity_text = required(quantity_text, Field::Quantity)?;

        let unit_price = parse_price(price_text)?;
        let quantity = parse_quantity(quantity_text)?;

        self.next_id += 1;
        let item = LineItem {
            id: ItemId(self.next_id),
            name: name.to_owned(),
            unit_price,
            quantity,
        };
        debug!(
            "ledger: added item {} '{}' ({} x {})",
            item.id, item.name, item.unit_price, item.quantity
        );
        self.items.push(item.clone());
        Ok(item)
    }

    /// Returns the items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the ledger holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the items sorted by name.
    ///
    /// Names compare case-sensitively; items with equal names keep their
    /// insertion order for both directions.
    pub fn list_items(&self, order: SortOrder) -> Vec<LineItem> {
        let mut items = self.items.clone();
        match order {
            SortOrder::Ascending => items.sort_by(|a, b| a.name.cmp(&b.name)),
            SortOrder::Descending => items.sort_by(|a, b| b.name.cmp(&a.name)),
        }
        items
    }

    /// Sum of all line totals; zero for an empty ledger.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// GST on the subtotal.
    pub fn tax(&self) -> Decimal {
        self.totals().tax
    }

    /// Subtotal plus tax.
    pub fn total(&self) -> Decimal {
        self.totals().total
    }

    /// All three totals at once.
    pub fn totals(&self) -> Totals {
        Totals::from_subtotal(self.subtotal())
    }

    /// Captures the current items in the given order together with their totals.
    pub fn snapshot(&self, order: SortOrder) -> InvoiceSnapshot {
        InvoiceSnapshot::new(self.list_items(order))
    }
}

fn required(text: &str, field: Field) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed)
    }
}

fn parse_price(text: &str) -> Result<Decimal, ValidationError> {
    let price = Decimal::from_str(text).map_err(|_| ValidationError::NotANumber(Field::Price))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::Negative(Field::Price));
    }
    if price > MAX_UNIT_PRICE {
        return Err(ValidationError::OutOfRange(Field::Price));
    }
    Ok(price.abs())
}

fn parse_quantity(text: &str) -> Result<u32, ValidationError> {
    match text.parse::<u32>() {
        Ok(quantity) => Ok(quantity),
        Err(_) => match text.parse::<i64>() {
            Ok(value) if value < 0 => Err(ValidationError::Negative(Field::Quantity)),
            Ok(_) => Err(ValidationError::OutOfRange(Field::Quantity)),
            Err(_) => Err(ValidationError::NotANumber(Field::Quantity)),
        },
    }
}
