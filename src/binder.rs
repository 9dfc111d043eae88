//! # Field Binder
//!
//! Connects a [`FieldDescriptor`] to the [`InvoiceAggregate`]: what the field
//! shows, and how typed input is stored. Writes are total. Nothing typed is
//! ever rejected; `required` is a label hint only.
//!
//! Coercion by kind:
//! - text, date: stored verbatim
//! - number: parsed; unparseable text is kept as not-a-number (reads as 0)
//! - line items: edited through [`Binder::add_item`], [`Binder::remove_item`]
//!   and [`Binder::update_item`], never through [`Binder::write`]

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::compute;
use crate::model::{
    parse_decimal, FieldValue, InvoiceAggregate, LineItem, LineItemKind, NumberInput, TaxRate,
};
use crate::schema::{FieldDescriptor, FieldKind};

/// Number field whose value is the invoice-level discount.
pub const DISCOUNT_FIELD: &str = "discount";
/// Number field whose value is the invoice-level taxes.
pub const TAXES_FIELD: &str = "taxes";

/// A single edit to one line item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    Kind(LineItemKind),
    Description(String),
    Quantity(String),
    UnitPrice(String),
    LineDiscount(String),
    AddTaxRate,
    RemoveTaxRate(usize),
    TaxRate { index: usize, rate: String },
    TaxDescription { index: usize, description: String },
}

pub struct Binder;

impl Binder {
    /// What the field shows: the stored answer, else the schema default, else empty.
    /// The line-item field shows the running total.
    pub fn display_value(descriptor: &FieldDescriptor, aggregate: &InvoiceAggregate) -> String {
        match descriptor.kind {
            FieldKind::LineItems => compute::display_total(aggregate),
            FieldKind::Text | FieldKind::Number | FieldKind::Date => aggregate
                .field(&descriptor.name)
                .map(|v| v.as_text().to_string())
                .or_else(|| descriptor.default.clone())
                .unwrap_or_default(),
        }
    }

    /// Store typed input for a scalar field, replacing any earlier value.
    /// Returns `false` only for the line-item field, which has no scalar value.
    pub fn write(descriptor: &FieldDescriptor, aggregate: &mut InvoiceAggregate, input: &str) -> bool {
        let value = match descriptor.kind {
            FieldKind::Text => FieldValue::Text(input.to_string()),
            FieldKind::Date => FieldValue::Date(input.to_string()),
            FieldKind::Number => {
                let number = NumberInput::parse(input);
                if number.value.is_none() {
                    debug!(field = %descriptor.name, input, "non-numeric input stored as not-a-number");
                }
                match descriptor.name.as_str() {
                    DISCOUNT_FIELD => aggregate.set_invoice_discount(number.or_zero()),
                    TAXES_FIELD => aggregate.set_invoice_taxes(number.or_zero()),
                    _ => {}
                }
                FieldValue::Number(number)
            }
            FieldKind::LineItems => {
                debug!(field = %descriptor.name, "scalar write to line-item field ignored");
                return false;
            }
        };
        aggregate.set_field(&descriptor.name, value);
        true
    }

    /// Append a default product row and return its index.
    pub fn add_item(aggregate: &mut InvoiceAggregate) -> usize {
        Self::add_item_of_kind(aggregate, LineItemKind::Product)
    }

    pub fn add_item_of_kind(aggregate: &mut InvoiceAggregate, kind: LineItemKind) -> usize {
        let index = aggregate.push_item(LineItem {
            kind,
            ..Default::default()
        });
        debug!(index, ?kind, "line item added");
        index
    }

    /// Remove the row at `index`. Later rows shift down by one.
    pub fn remove_item(aggregate: &mut InvoiceAggregate, index: usize) -> bool {
        let removed = aggregate.remove_item(index).is_some();
        debug!(index, removed, "line item remove");
        removed
    }

    /// Apply one edit to the row at `index`. Out-of-range rows and tax rates
    /// are ignored and reported as `false`.
    pub fn update_item(aggregate: &mut InvoiceAggregate, index: usize, edit: ItemEdit) -> bool {
        let Some(item) = aggregate.item_mut(index) else {
            debug!(index, "edit to missing line item ignored");
            return false;
        };

        match edit {
            ItemEdit::Kind(kind) => item.kind = kind,
            ItemEdit::Description(text) => item.description = text,
            ItemEdit::Quantity(input) => item.quantity = coerce_quantity(&input),
            ItemEdit::UnitPrice(input) => {
                item.unit_price = coerce_or_zero(&input).max(Decimal::ZERO)
            }
            ItemEdit::LineDiscount(input) => item.line_discount = coerce_or_zero(&input),
            ItemEdit::AddTaxRate => item.tax_rates.push(TaxRate::default()),
            ItemEdit::RemoveTaxRate(tax) => {
                if tax >= item.tax_rates.len() {
                    return false;
                }
                item.tax_rates.remove(tax);
            }
            ItemEdit::TaxRate { index: tax, rate } => match item.tax_rates.get_mut(tax) {
                Some(t) => t.rate = coerce_or_zero(&rate),
                None => return false,
            },
            ItemEdit::TaxDescription {
                index: tax,
                description,
            } => match item.tax_rates.get_mut(tax) {
                Some(t) => t.description = description,
                None => return false,
            },
        }
        true
    }
}

fn coerce_or_zero(input: &str) -> Decimal {
    parse_decimal(input).unwrap_or(Decimal::ZERO)
}

/// Whole, non-negative units. Fractions truncate toward zero; anything
/// unparseable or negative is zero.
fn coerce_quantity(input: &str) -> u32 {
    let value = coerce_or_zero(input).trunc();
    if value <= Decimal::ZERO {
        0
    } else {
        value.to_u32().unwrap_or(u32::MAX)
    }
}
