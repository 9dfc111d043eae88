//! Integration tests for the invoicer pipeline.
//!
//! These tests exercise the full path from schema and answers to PDF output.
//! They verify:
//! - Both schema JSON shapes load and drive the wizard
//! - Totals stay in step with the line items through any edit sequence
//! - Long item lists paginate with the header repeated on every page
//! - Layout is deterministic
//! - PDF output is structurally valid

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use invoicer::binder::ItemEdit;
use invoicer::compute::{self, Totals};
use invoicer::layout::{DrawInstruction, LayoutConfig, TABLE_HEADER};
use invoicer::schema::FieldKind;
use invoicer::wizard::{Transition, WizardState};
use invoicer::{Answers, InvoiceSession, Schema};

// ─── Helpers ────────────────────────────────────────────────────

fn session() -> InvoiceSession {
    InvoiceSession::new(Schema::default_invoice())
}

fn finish(session: &mut InvoiceSession) {
    while !session.wizard().is_completed() {
        session.next();
    }
}

fn add_item(session: &mut InvoiceSession, description: &str, quantity: &str, price: &str) -> usize {
    let index = session.add_item();
    session.update_item(index, ItemEdit::Description(description.to_string()));
    session.update_item(index, ItemEdit::Quantity(quantity.to_string()));
    session.update_item(index, ItemEdit::UnitPrice(price.to_string()));
    index
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "Missing PDF header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "Missing %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "Missing xref table");
    assert!(
        bytes.windows(7).any(|w| w == b"trailer"),
        "Missing trailer"
    );
}

// ─── End-to-end ─────────────────────────────────────────────────

#[test]
fn test_worked_example_totals_95() {
    let mut s = session();
    add_item(&mut s, "Consulting", "2", "50");
    s.edit_field("discount", "10");
    s.edit_field("taxes", "5");

    assert_eq!(compute::invoice_subtotal(s.aggregate()), dec!(100));
    assert_eq!(Totals::of(s.aggregate()).total, dec!(95));

    finish(&mut s);
    let doc = s.submit().expect("completed wizard submits");
    assert!(doc.contains_text("Subtotal: $100.00"));
    assert!(doc.contains_text("Total Amount: $95.00"));

    let pdf = invoicer::render_pdf(&doc);
    assert_valid_pdf(&pdf);
}

#[test]
fn test_running_total_shown_on_items_field() {
    let mut s = session();
    assert_eq!(s.display_value("items").as_deref(), Some("$0.00"));
    add_item(&mut s, "A", "3", "10");
    assert_eq!(s.display_value("items").as_deref(), Some("$30.00"));
    s.edit_field("currency", "€");
    assert_eq!(s.display_value("items").as_deref(), Some("€30.00"));
}

#[test]
fn test_non_numeric_number_field() {
    let mut s = session();
    s.edit_field("discount", "abc");
    assert_eq!(s.display_value("discount").as_deref(), Some("abc"));
    assert_eq!(s.aggregate().invoice_discount(), Decimal::ZERO);
}

#[test]
fn test_remove_shifts_later_items() {
    let mut s = session();
    add_item(&mut s, "first", "1", "1");
    add_item(&mut s, "second", "2", "2");
    add_item(&mut s, "third", "3", "3");
    let before = compute::line_total(&s.aggregate().items()[2]);

    assert!(s.remove_item(1));
    let items = s.aggregate().items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].description, "third");
    assert_eq!(compute::line_total(&items[1]), before);
    assert!(!s.remove_item(5));
}

#[test]
fn test_oversized_amounts_still_render() {
    let mut s = session();
    add_item(&mut s, "Huge", "1e20", "100000000000000000000");
    add_item(&mut s, "Big", "1", "50000000000000000000000000000");
    s.edit_field("taxes", "50000000000000000000000000000");

    assert_eq!(compute::invoice_subtotal(s.aggregate()), Decimal::MAX);
    assert_eq!(Totals::of(s.aggregate()).total, Decimal::MAX);
    assert!(s.display_value("items").unwrap().starts_with("$79228162514264337593543950335"));

    finish(&mut s);
    let doc = s.submit().expect("completed wizard submits");
    assert!(doc.contains_text("Total Amount: $79228162514264337593543950335.00"));
    assert_valid_pdf(&invoicer::render_pdf(&doc));
}

#[test]
fn test_thirteen_digit_price_keeps_every_digit() {
    let mut s = session();
    add_item(&mut s, "Licence", "1", "1234567890123");
    let doc = invoicer::finalize(s.aggregate());
    let table = doc.pages[0].tables().next().unwrap();
    assert_eq!(table.rows[0][2], "$1234567890123.00");
    assert_eq!(table.rows[0][3], "$1234567890123.00");
}

// ─── Wizard ─────────────────────────────────────────────────────

#[test]
fn test_wizard_completes_on_nth_next() {
    let mut s = session();
    let n = s.schema().len();
    assert_eq!(s.prev(), Transition::Ignored);
    for i in 1..n {
        assert_eq!(s.next(), Transition::Advanced(i));
        assert!(!s.wizard().is_completed());
    }
    assert_eq!(s.next(), Transition::Finished);
    assert_eq!(s.wizard().state(), WizardState::Completed);
    assert_eq!(s.next(), Transition::Ignored);
}

#[test]
fn test_reset_leaves_aggregate_untouched() {
    let mut s = session();
    s.edit_field("buyerName", "Contoso");
    add_item(&mut s, "Widget", "1", "9.99");
    finish(&mut s);
    let before = s.aggregate().clone();

    s.reset();
    assert_eq!(s.wizard().state(), WizardState::InProgress(0));
    assert_eq!(s.aggregate(), &before);
}

#[test]
fn test_forward_labels_follow_step_flags() {
    let mut s = session();
    let mut labels = Vec::new();
    while !s.wizard().is_completed() {
        labels.push(s.forward_label().as_str());
        s.next();
    }
    assert_eq!(labels.last(), Some(&"Finish"));
    assert!(labels.contains(&"Skip"));
    assert_eq!(labels[0], "Next");
}

// ─── Schema shapes ──────────────────────────────────────────────

#[test]
fn test_wrapped_schema_drives_session() {
    let json = r#"{
        "invoiceCreationFlow": {
            "steps": [
                { "stepId": "who", "title": "Who",
                  "fields": [{ "name": "buyerName", "label": "Buyer", "type": "string", "required": true }] },
                { "stepId": "what",
                  "fields": [{ "name": "lineItems", "type": "array" }] }
            ]
        }
    }"#;
    let schema = Schema::from_json(json).unwrap();
    assert_eq!(schema.len(), 2);
    assert_eq!(schema.steps()[1].fields[0].kind, FieldKind::LineItems);

    let answers = Answers::from_json(
        r#"{ "fields": { "buyerName": "Fabrikam" },
             "items": [{ "description": "Bolt", "quantity": 4, "unitPrice": 0.25 }] }"#,
    )
    .unwrap();
    let mut s = InvoiceSession::new(schema);
    s.apply_answers(&answers);
    let doc = s.submit().unwrap();
    assert!(doc.contains_text("Fabrikam"));
    assert!(doc.contains_text("Total Amount: $1.00"));
    assert_eq!(doc.filename, "Invoice-draft");
}

#[test]
fn test_empty_schema_rejected() {
    assert!(Schema::from_json(r#"{ "steps": [] }"#).is_err());
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn test_long_item_list_spans_pages_with_headers() {
    let mut s = session();
    for i in 0..120 {
        add_item(&mut s, &format!("Item {}", i), "1", "2");
    }
    finish(&mut s);
    let doc = s.submit().unwrap();
    let config = LayoutConfig::default();

    assert!(
        doc.page_count() >= 2,
        "120 items should span multiple pages, got {}",
        doc.page_count()
    );

    let mut rows = 0;
    for (i, page) in doc.pages.iter().enumerate() {
        for table in page.tables() {
            assert_eq!(table.header, TABLE_HEADER.to_vec());
            assert!(table.y + table.height() <= config.bottom_limit() + 1e-9);
            rows += table.rows.len();
            if i > 0 {
                assert!(matches!(page.instructions.first(), Some(DrawInstruction::Table(_))));
            }
        }
    }
    assert_eq!(rows, 120);
    assert!(doc
        .pages
        .last()
        .unwrap()
        .texts()
        .any(|t| t.text == "Total Amount: $240.00"));

    assert_valid_pdf(&invoicer::render_pdf(&doc));
}

#[test]
fn test_finalize_is_idempotent() {
    let mut s = session();
    s.edit_field("invoiceNumber", "INV-1");
    s.edit_field("notes", "one\ntwo");
    for i in 0..50 {
        add_item(&mut s, &format!("Row {}", i), "2", "3.5");
    }
    let first = invoicer::finalize(s.aggregate());
    let second = invoicer::finalize(s.aggregate());
    assert_eq!(first, second);
    assert_eq!(
        invoicer::render_pdf(&first),
        invoicer::render_pdf(&second)
    );
}

#[test]
fn test_letter_page_config() {
    let config = LayoutConfig::from_json(r#"{ "pageSize": "Letter" }"#).unwrap();
    let doc = invoicer::finalize_with(session().aggregate(), config);
    assert_eq!(doc.pages[0].width, 215.9);
    let pdf = String::from_utf8_lossy(&invoicer::render_pdf(&doc)).into_owned();
    assert!(pdf.contains("/MediaBox [0 0 612.00 792.00]"));
}

// ─── Properties ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Add,
    Remove(usize),
    Quantity(usize, u32),
    Price(usize, u32),
    Discount(usize, u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add),
        (0usize..8).prop_map(Op::Remove),
        (0usize..8, 0u32..50).prop_map(|(i, q)| Op::Quantity(i, q)),
        (0usize..8, 0u32..100_000).prop_map(|(i, p)| Op::Price(i, p)),
        (0usize..8, 0u32..10_000).prop_map(|(i, d)| Op::Discount(i, d)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Property: after every add, edit or remove, the subtotal is the sum of
    /// the current line totals, and the document agrees with it.
    #[test]
    fn subtotal_never_stale(ops in prop::collection::vec(op(), 1..40)) {
        let mut s = session();
        for op in ops {
            match op {
                Op::Add => { s.add_item(); }
                Op::Remove(i) => { s.remove_item(i); }
                Op::Quantity(i, q) => { s.update_item(i, ItemEdit::Quantity(q.to_string())); }
                Op::Price(i, cents) => {
                    let price = Decimal::new(cents as i64, 2);
                    s.update_item(i, ItemEdit::UnitPrice(price.to_string()));
                }
                Op::Discount(i, cents) => {
                    let discount = Decimal::new(cents as i64, 2);
                    s.update_item(i, ItemEdit::LineDiscount(discount.to_string()));
                }
            }

            let expected: Decimal = s.aggregate().items().iter().map(compute::line_total).sum();
            prop_assert_eq!(compute::invoice_subtotal(s.aggregate()), expected);
            prop_assert_eq!(
                s.display_value("items"),
                Some(compute::format_money("$", expected))
            );
        }

        let doc = invoicer::finalize(s.aggregate());
        let subtotal = compute::invoice_subtotal(s.aggregate());
        let line = format!("Subtotal: {}", compute::format_money("$", subtotal));
        prop_assert!(doc.contains_text(&line));
    }
}
