//! # Computation Engine
//!
//! Every total on screen and on paper comes from here. Nothing is cached:
//! each call walks the aggregate as it is right now.
//!
//! Arithmetic saturates at [`Decimal::MAX`] / [`Decimal::MIN`]. Any amount a
//! user can type still produces a total, clamped at the representable range.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::model::{InvoiceAggregate, LineItem};

/// `quantity × unit price − line discount`. Negative results are kept.
pub fn line_total(item: &LineItem) -> Decimal {
    Decimal::from(item.quantity)
        .saturating_mul(item.unit_price)
        .saturating_sub(item.line_discount)
}

/// Sum of every line total. Zero for an empty collection.
pub fn invoice_subtotal(aggregate: &InvoiceAggregate) -> Decimal {
    aggregate
        .items()
        .iter()
        .map(line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// The running total shown while items are being entered, e.g. `$125.00`.
pub fn display_total(aggregate: &InvoiceAggregate) -> String {
    format_money(aggregate.currency_marker(), invoice_subtotal(aggregate))
}

/// The figures printed at the bottom of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub taxes: Decimal,
    /// `subtotal − discount + taxes`
    pub total: Decimal,
}

impl Totals {
    pub fn of(aggregate: &InvoiceAggregate) -> Self {
        let subtotal = invoice_subtotal(aggregate);
        let discount = aggregate.invoice_discount();
        let taxes = aggregate.invoice_taxes();
        Self {
            subtotal,
            discount,
            taxes,
            total: subtotal.saturating_sub(discount).saturating_add(taxes),
        }
    }
}

/// Format an amount to exactly two decimal places behind a currency marker.
/// Midpoints round away from zero.
pub fn format_money(marker: &str, value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{}{:.2}", marker, rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Binder, ItemEdit};
    use crate::schema::{FieldDescriptor, FieldKind};
    use rust_decimal_macros::dec;

    fn item(quantity: u32, unit_price: Decimal, line_discount: Decimal) -> LineItem {
        LineItem {
            quantity,
            unit_price,
            line_discount,
            ..Default::default()
        }
    }

    #[test]
    fn line_total_subtracts_discount() {
        assert_eq!(line_total(&item(3, dec!(10), dec!(5))), dec!(25));
    }

    #[test]
    fn line_total_can_go_negative() {
        assert_eq!(line_total(&item(1, dec!(2), dec!(5))), dec!(-3));
    }

    #[test]
    fn empty_subtotal_is_zero() {
        let agg = InvoiceAggregate::new();
        assert_eq!(invoice_subtotal(&agg), Decimal::ZERO);
        assert_eq!(display_total(&agg), "$0.00");
    }

    #[test]
    fn totals_combine_discount_and_taxes() {
        let mut agg = InvoiceAggregate::new();
        let idx = Binder::add_item(&mut agg);
        Binder::update_item(&mut agg, idx, ItemEdit::Quantity("2".into()));
        Binder::update_item(&mut agg, idx, ItemEdit::UnitPrice("50".into()));
        Binder::write(
            &FieldDescriptor::new("discount", "Discount", FieldKind::Number),
            &mut agg,
            "10",
        );
        Binder::write(
            &FieldDescriptor::new("taxes", "Taxes", FieldKind::Number),
            &mut agg,
            "5",
        );

        let totals = Totals::of(&agg);
        assert_eq!(totals.subtotal, dec!(100));
        assert_eq!(totals.discount, dec!(10));
        assert_eq!(totals.taxes, dec!(5));
        assert_eq!(totals.total, dec!(95));
        assert_eq!(format_money("$", totals.total), "$95.00");
    }

    #[test]
    fn display_total_uses_currency_field() {
        let mut agg = InvoiceAggregate::new();
        let idx = Binder::add_item(&mut agg);
        Binder::update_item(&mut agg, idx, ItemEdit::UnitPrice("19.999".into()));
        Binder::write(
            &FieldDescriptor::new("currency", "Currency", FieldKind::Text),
            &mut agg,
            "€",
        );
        assert_eq!(display_total(&agg), "€20.00");
    }

    #[test]
    fn oversized_amounts_saturate() {
        let mut agg = InvoiceAggregate::new();
        let idx = Binder::add_item(&mut agg);
        Binder::update_item(&mut agg, idx, ItemEdit::Quantity("1e20".into()));
        Binder::update_item(&mut agg, idx, ItemEdit::UnitPrice("100000000000000000000".into()));
        assert_eq!(agg.items()[0].quantity, u32::MAX);
        assert_eq!(line_total(&agg.items()[0]), Decimal::MAX);

        for _ in 0..2 {
            let idx = Binder::add_item(&mut agg);
            Binder::update_item(
                &mut agg,
                idx,
                ItemEdit::UnitPrice("50000000000000000000000000000".into()),
            );
        }
        assert_eq!(invoice_subtotal(&agg), Decimal::MAX);
        assert!(display_total(&agg).starts_with("$79228162514264337593543950335"));

        Binder::write(
            &FieldDescriptor::new("taxes", "Taxes", FieldKind::Number),
            &mut agg,
            "1",
        );
        assert_eq!(Totals::of(&agg).total, Decimal::MAX);
    }

    #[test]
    fn large_negative_discount_saturates() {
        let big = item(u32::MAX, Decimal::MAX, Decimal::MIN);
        assert_eq!(line_total(&big), Decimal::MAX);
        let low = item(0, Decimal::ZERO, Decimal::MAX);
        assert_eq!(line_total(&low), -Decimal::MAX);
    }

    #[test]
    fn format_money_rounds_and_pads() {
        assert_eq!(format_money("$", dec!(1.005)), "$1.01");
        assert_eq!(format_money("$", dec!(-2.5)), "$-2.50");
        assert_eq!(format_money("$", dec!(7)), "$7.00");
        assert_eq!(format_money("", dec!(1234.5)), "1234.50");
    }
}
