//! # Invoice Model
//!
//! The mutable record assembled by the wizard. It holds the scalar answers
//! keyed by field name, the repeating collection of line items, and the two
//! invoice-level adjustments (discount and taxes).
//!
//! The aggregate is owned by exactly one wizard session. Every mutation goes
//! through the [`binder`](crate::binder), one discrete edit at a time, so
//! the mutators here are crate-private.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product or service. Affects presentation only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemKind {
    #[default]
    Product,
    Service,
}

/// A tax rate attached to a line item. Stored for display; totals do not
/// derive anything from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRate {
    pub rate: Decimal,
    pub description: String,
}

/// One billable row. Identified only by its position in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_discount: Decimal,
    pub tax_rates: Vec<TaxRate>,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            kind: LineItemKind::Product,
            description: String::new(),
            quantity: 1,
            unit_price: Decimal::ZERO,
            line_discount: Decimal::ZERO,
            tax_rates: Vec::new(),
        }
    }
}

impl LineItem {
    /// Create a product row with the given quantity and unit price.
    pub fn product(description: &str, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            description: description.to_string(),
            quantity,
            unit_price,
            ..Default::default()
        }
    }

    /// Create a service row with the given quantity and unit price.
    pub fn service(description: &str, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            kind: LineItemKind::Service,
            ..Self::product(description, quantity, unit_price)
        }
    }
}

/// A number typed into a numeric field: the raw text, plus its parsed value.
///
/// `value` is `None` when the text did not parse. Numeric consumers read that
/// as zero; the raw text is kept so the field still shows what was typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberInput {
    pub raw: String,
    pub value: Option<Decimal>,
}

impl NumberInput {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: parse_decimal(raw),
        }
    }

    /// The parsed value, or zero for not-a-number.
    pub fn or_zero(&self) -> Decimal {
        self.value.unwrap_or(Decimal::ZERO)
    }
}

/// A scalar answer, tagged by the kind of field that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(NumberInput),
    Date(String),
}

impl FieldValue {
    /// The value as it is shown in the form and on the document.
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) | FieldValue::Date(s) => s,
            FieldValue::Number(n) => &n.raw,
        }
    }

    /// The value read as a number. Anything non-numeric is zero.
    pub fn as_number(&self) -> Decimal {
        match self {
            FieldValue::Number(n) => n.or_zero(),
            FieldValue::Text(s) | FieldValue::Date(s) => parse_decimal(s).unwrap_or(Decimal::ZERO),
        }
    }
}

/// Parse user-typed numeric text. Accepts plain and scientific notation.
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// The invoice record being assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceAggregate {
    extension_fields: BTreeMap<String, FieldValue>,
    items: Vec<LineItem>,
    invoice_discount: Decimal,
    invoice_taxes: Decimal,
}

impl InvoiceAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.extension_fields.get(name)
    }

    /// The text of a scalar field, treating an empty answer as missing.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name)
            .map(FieldValue::as_text)
            .filter(|s| !s.is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.extension_fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn invoice_discount(&self) -> Decimal {
        self.invoice_discount
    }

    pub fn invoice_taxes(&self) -> Decimal {
        self.invoice_taxes
    }

    /// The free-text currency marker, `$` when unset.
    pub fn currency_marker(&self) -> &str {
        self.text("currency").unwrap_or("$")
    }

    pub fn invoice_number(&self) -> Option<&str> {
        self.text("invoiceNumber")
    }

    // ── Mutators (binder only) ──────────────────────────────────

    pub(crate) fn set_field(&mut self, name: &str, value: FieldValue) {
        self.extension_fields.insert(name.to_string(), value);
    }

    pub(crate) fn set_invoice_discount(&mut self, value: Decimal) {
        self.invoice_discount = value;
    }

    pub(crate) fn set_invoice_taxes(&mut self, value: Decimal) {
        self.invoice_taxes = value;
    }

    pub(crate) fn push_item(&mut self, item: LineItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    pub(crate) fn remove_item(&mut self, index: usize) -> Option<LineItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub(crate) fn item_mut(&mut self, index: usize) -> Option<&mut LineItem> {
        self.items.get_mut(index)
    }

    /// Discard everything, returning to an empty record.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
