//! # Page-Aware Invoice Layout
//!
//! Turns a finished [`InvoiceAggregate`] into a [`LayoutDocument`]: pages of
//! absolutely positioned draw instructions. The engine never lays out onto
//! an infinite canvas and slices afterwards. A single cursor walks down the
//! current page, and before anything is placed it asks whether it fits:
//!
//! 1. Text lines advance the cursor by a fixed line height, with larger jumps
//!    between sections. A line that would cross the page foot opens a new page.
//! 2. The line-item table is placed in fragments. Each fragment carries its
//!    own header row, so every page holding rows starts its table with the
//!    header. A header never sits alone at a page foot and rows are never split.
//!
//! Section order is fixed: title, metadata, rule, seller, buyer, items,
//! totals, notes, terms. Missing scalars print as `N/A`; only notes and terms
//! are left out when empty.
//!
//! The output depends on nothing but the aggregate and the config, so two
//! runs over the same input are deep-equal.

pub mod config;
pub mod page_break;

use serde::Serialize;
use tracing::debug;

use crate::compute::{self, format_money, Totals};
use crate::font::{self, FontWeight};
use crate::model::InvoiceAggregate;

pub use config::{Color, Edges, LayoutConfig, PageSize, PT_PER_MM};
use page_break::{decide_break, BreakDecision};

/// Column titles of the line-item table.
pub const TABLE_HEADER: [&str; 4] = ["Item", "Quantity", "Price", "Total"];

/// Placeholder for a missing scalar.
pub const MISSING: &str = "N/A";

const EPSILON: f64 = 1e-6;

/// Horizontal anchoring of a text run relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// A single line of text. `y` is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: f64,
    pub weight: FontWeight,
    pub align: TextAlign,
}

/// A straight stroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub color: Color,
}

/// One page's fragment of the line-item table. `y` is the top edge of the
/// header row; body rows follow at `row_height` intervals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    pub x: f64,
    pub y: f64,
    pub column_widths: Vec<f64>,
    pub row_height: f64,
    pub font_size: f64,
    pub cell_padding: f64,
    pub header_fill: Color,
    pub grid_color: Color,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Header plus body height.
    pub fn height(&self) -> f64 {
        self.row_height * (self.rows.len() + 1) as f64
    }

    pub fn width(&self) -> f64 {
        self.column_widths.iter().sum()
    }

    /// Top edge of body row `i`.
    pub fn row_top(&self, i: usize) -> f64 {
        self.y + self.row_height * (i + 1) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DrawInstruction {
    Text(TextRun),
    Line(Rule),
    Table(TableBlock),
}

/// A fixed-size page of draw instructions, in paint order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub instructions: Vec<DrawInstruction>,
}

impl Page {
    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.instructions.iter().filter_map(|i| match i {
            DrawInstruction::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.instructions.iter().filter_map(|i| match i {
            DrawInstruction::Text(t) => Some(t),
            _ => None,
        })
    }
}

/// The laid-out invoice. Built fresh on every render call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutDocument {
    /// Suggested download name, without extension.
    pub filename: String,
    /// Document title for metadata.
    pub title: String,
    pub pages: Vec<Page>,
}

impl LayoutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any text run on any page reads exactly `text`.
    pub fn contains_text(&self, text: &str) -> bool {
        self.pages
            .iter()
            .flat_map(Page::texts)
            .any(|run| run.text == text)
    }
}

/// Tracks where we are on the current page during layout.
#[derive(Debug)]
struct PageCursor {
    y: f64,
    instructions: Vec<DrawInstruction>,
}

impl PageCursor {
    fn new(config: &LayoutConfig) -> Self {
        Self {
            y: config.margin.top,
            instructions: Vec::new(),
        }
    }

    fn at_top(&self, config: &LayoutConfig) -> bool {
        (self.y - config.margin.top).abs() < EPSILON
    }
}

/// One layout pass: the finished pages plus the cursor on the open one.
struct Flow<'a> {
    config: &'a LayoutConfig,
    pages: Vec<Page>,
    cursor: PageCursor,
}

impl<'a> Flow<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            cursor: PageCursor::new(config),
        }
    }

    fn break_page(&mut self) {
        let cursor = std::mem::replace(&mut self.cursor, PageCursor::new(self.config));
        self.pages.push(Page {
            width: self.config.page_width(),
            height: self.config.page_height(),
            instructions: cursor.instructions,
        });
        debug!(page = self.pages.len() + 1, "page break");
    }

    /// Move down by `advance` and make sure a baseline at the new position is
    /// still on the page.
    fn advance_line(&mut self, advance: f64) {
        self.cursor.y += advance;
        if self.cursor.y > self.config.bottom_limit() + EPSILON {
            self.break_page();
        }
    }

    fn text(&mut self, advance: f64, text: &str, weight: FontWeight, align: TextAlign, x: f64) {
        self.advance_line(advance);
        self.cursor.instructions.push(DrawInstruction::Text(TextRun {
            x,
            y: self.cursor.y,
            text: text.to_string(),
            font_size: self.config.body_size,
            weight,
            align,
        }));
    }

    fn left(&mut self, advance: f64, text: &str, weight: FontWeight) {
        let x = self.config.margin.left;
        self.text(advance, text, weight, TextAlign::Left, x);
    }

    fn rule(&mut self, advance: f64) {
        self.advance_line(advance);
        let c = self.config;
        self.cursor.instructions.push(DrawInstruction::Line(Rule {
            x1: c.margin.left,
            y1: self.cursor.y,
            x2: c.page_width() - c.margin.right,
            y2: self.cursor.y,
            width: c.rule_width,
            color: c.rule_color,
        }));
    }

    fn finish(mut self) -> Vec<Page> {
        self.break_page();
        self.pages
    }
}

/// Which aggregate fields make up a party block.
struct PartyFields {
    heading: &'static str,
    name: &'static str,
    street: &'static str,
    city: &'static str,
    state: &'static str,
    zip: &'static str,
    country: &'static str,
    phone: &'static str,
    email: &'static str,
}

const SELLER: PartyFields = PartyFields {
    heading: "From:",
    name: "sellerCompanyName",
    street: "sellerStreet",
    city: "sellerCity",
    state: "sellerState",
    zip: "sellerZipCode",
    country: "sellerCountry",
    phone: "sellerPhone",
    email: "sellerEmail",
};

const BUYER: PartyFields = PartyFields {
    heading: "To:",
    name: "buyerName",
    street: "buyerStreet",
    city: "buyerCity",
    state: "buyerState",
    zip: "buyerZipCode",
    country: "buyerCountry",
    phone: "buyerPhone",
    email: "buyerEmail",
};

/// The layout engine. Holds only configuration, so one engine can render
/// any number of invoices.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Main entry point: lay out an invoice into pages.
    pub fn layout(&self, aggregate: &InvoiceAggregate) -> LayoutDocument {
        let c = &self.config;
        let mut flow = Flow::new(c);

        // Title
        flow.cursor.instructions.push(DrawInstruction::Text(TextRun {
            x: c.page_width() / 2.0,
            y: flow.cursor.y,
            text: "INVOICE".to_string(),
            font_size: c.title_size,
            weight: FontWeight::Bold,
            align: TextAlign::Center,
        }));

        // Metadata
        let number = aggregate.invoice_number();
        flow.left(
            c.title_gap,
            &format!("Invoice Number: {}", number.unwrap_or(MISSING)),
            FontWeight::Regular,
        );
        flow.left(
            c.line_height,
            &format!("Issue Date: {}", or_missing(aggregate, "issueDate")),
            FontWeight::Regular,
        );
        flow.left(
            c.line_height,
            &format!("Due Date: {}", or_missing(aggregate, "dueDate")),
            FontWeight::Regular,
        );

        flow.rule(c.section_gap);

        self.layout_party(&mut flow, aggregate, &SELLER, c.section_gap);
        self.layout_party(&mut flow, aggregate, &BUYER, c.section_gap);

        flow.cursor.y += c.section_gap;
        self.layout_items_table(&mut flow, aggregate);

        self.layout_totals(&mut flow, aggregate);

        if let Some(notes) = aggregate.text("notes") {
            self.layout_free_text(&mut flow, "Notes:", notes);
        }
        if let Some(terms) = aggregate.text("termsAndConditions") {
            self.layout_free_text(&mut flow, "Terms and Conditions:", terms);
        }

        let pages = flow.finish();
        debug!(
            pages = pages.len(),
            items = aggregate.items().len(),
            "invoice laid out"
        );

        LayoutDocument {
            filename: format!("Invoice-{}", number.unwrap_or("draft")),
            title: format!("Invoice {}", number.unwrap_or("draft")),
            pages,
        }
    }

    fn layout_party(
        &self,
        flow: &mut Flow,
        aggregate: &InvoiceAggregate,
        party: &PartyFields,
        advance: f64,
    ) {
        let lh = self.config.line_height;
        flow.left(advance, party.heading, FontWeight::Bold);
        flow.left(lh, or_missing(aggregate, party.name), FontWeight::Regular);
        flow.left(lh, or_missing(aggregate, party.street), FontWeight::Regular);
        let locality = format!(
            "{}, {} {}",
            aggregate.text(party.city).unwrap_or(""),
            aggregate.text(party.state).unwrap_or(""),
            aggregate.text(party.zip).unwrap_or("")
        );
        flow.left(lh, &locality, FontWeight::Regular);
        flow.left(lh, or_missing(aggregate, party.country), FontWeight::Regular);
        flow.left(
            lh,
            &format!("Phone: {}", or_missing(aggregate, party.phone)),
            FontWeight::Regular,
        );
        flow.left(
            lh,
            &format!("Email: {}", or_missing(aggregate, party.email)),
            FontWeight::Regular,
        );
    }

    /// Place the line-item table starting at the cursor, splitting it into
    /// one fragment per page.
    fn layout_items_table(&self, flow: &mut Flow, aggregate: &InvoiceAggregate) {
        let c = &self.config;
        let widths = c.column_widths();
        let marker = aggregate.currency_marker();

        let header: Vec<String> = TABLE_HEADER
            .iter()
            .zip(&widths)
            .map(|(title, w)| self.fit_cell(title, *w, FontWeight::Bold))
            .collect();

        let rows: Vec<Vec<String>> = aggregate
            .items()
            .iter()
            .map(|item| {
                let description = if item.description.is_empty() {
                    MISSING
                } else {
                    item.description.as_str()
                };
                // Only the description is clipped. Figures are never
                // shortened, even when wider than their column.
                vec![
                    self.fit_cell(description, widths[0], FontWeight::Regular),
                    item.quantity.to_string(),
                    format_money(marker, item.unit_price),
                    format_money(marker, compute::line_total(item)),
                ]
            })
            .collect();

        let mut pending: &[Vec<String>] = &rows;
        loop {
            let remaining = c.bottom_limit() - flow.cursor.y;
            let heights = vec![c.row_height; pending.len()];
            let decision = decide_break(
                remaining,
                c.row_height,
                &heights,
                c.min_orphan_rows,
                c.min_widow_rows,
            );

            let take = match decision {
                BreakDecision::Place => pending.len(),
                BreakDecision::Split {
                    rows_on_current_page,
                } => rows_on_current_page,
                BreakDecision::MoveToNextPage if !flow.cursor.at_top(c) => {
                    flow.break_page();
                    continue;
                }
                // Even an empty page is too short: place one row anyway so
                // the table always makes progress.
                BreakDecision::MoveToNextPage => pending.len().min(1),
            };

            let block = TableBlock {
                x: c.margin.left,
                y: flow.cursor.y,
                column_widths: widths.clone(),
                row_height: c.row_height,
                font_size: c.table_size,
                cell_padding: c.cell_padding,
                header_fill: c.header_fill,
                grid_color: c.grid_color,
                header: header.clone(),
                rows: pending[..take].to_vec(),
            };
            flow.cursor.y += block.height();
            flow.cursor.instructions.push(DrawInstruction::Table(block));

            pending = &pending[take..];
            if pending.is_empty() {
                break;
            }
            debug!(carried = pending.len(), "table continues on next page");
            flow.break_page();
        }
    }

    fn layout_totals(&self, flow: &mut Flow, aggregate: &InvoiceAggregate) {
        let c = &self.config;
        let totals = Totals::of(aggregate);
        let marker = aggregate.currency_marker();
        let x = c.page_width() - c.amount_inset;

        let lines = [
            ("Subtotal", totals.subtotal, FontWeight::Regular),
            ("Discount", totals.discount, FontWeight::Regular),
            ("Taxes", totals.taxes, FontWeight::Regular),
            ("Total Amount", totals.total, FontWeight::Bold),
        ];
        for (i, (label, amount, weight)) in lines.iter().enumerate() {
            let advance = if i == 0 { c.section_gap } else { c.line_height };
            flow.text(
                advance,
                &format!("{}: {}", label, format_money(marker, *amount)),
                *weight,
                TextAlign::Right,
                x,
            );
        }
    }

    fn layout_free_text(&self, flow: &mut Flow, heading: &str, body: &str) {
        let c = &self.config;
        flow.left(c.section_gap, heading, FontWeight::Bold);
        for line in body.lines() {
            flow.left(c.line_height, line, FontWeight::Regular);
        }
    }

    /// Clip `text` with an ellipsis so it fits inside a column.
    fn fit_cell(&self, text: &str, column_width: f64, weight: FontWeight) -> String {
        let c = &self.config;
        let available = (column_width - 2.0 * c.cell_padding) * PT_PER_MM;
        let size = c.table_size;
        if font::measure_string(text, weight, size) <= available {
            return text.to_string();
        }

        let metrics = weight.standard_font().metrics();
        let ellipsis = "...";
        let budget = available - font::measure_string(ellipsis, weight, size);
        let mut width = 0.0;
        let mut clipped = String::new();
        for ch in text.chars() {
            let w = metrics.char_width(ch, size);
            if width + w > budget {
                break;
            }
            width += w;
            clipped.push(ch);
        }
        clipped.push_str(ellipsis);
        clipped
    }
}

fn or_missing<'a>(aggregate: &'a InvoiceAggregate, name: &str) -> &'a str {
    aggregate.text(name).unwrap_or(MISSING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{Binder, ItemEdit};
    use crate::schema::{FieldDescriptor, FieldKind};

    fn set(agg: &mut InvoiceAggregate, name: &str, value: &str) {
        Binder::write(&FieldDescriptor::new(name, name, FieldKind::Text), agg, value);
    }

    fn add_items(agg: &mut InvoiceAggregate, n: usize) {
        for i in 0..n {
            let idx = Binder::add_item(agg);
            Binder::update_item(agg, idx, ItemEdit::Description(format!("Item {i}")));
            Binder::update_item(agg, idx, ItemEdit::UnitPrice("1".into()));
        }
    }

    fn first_page_texts(doc: &LayoutDocument) -> Vec<&str> {
        doc.pages[0].texts().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn empty_invoice_renders_placeholders() {
        let doc = LayoutEngine::default().layout(&InvoiceAggregate::new());
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.filename, "Invoice-draft");
        assert!(doc.contains_text("Invoice Number: N/A"));
        assert!(doc.contains_text("Issue Date: N/A"));
        assert!(doc.contains_text("Phone: N/A"));
        assert!(doc.contains_text(",  "));
        assert!(doc.contains_text("Total Amount: $0.00"));
        assert!(!doc.contains_text("Notes:"));
        assert!(!doc.contains_text("Terms and Conditions:"));
    }

    #[test]
    fn sections_in_fixed_order() {
        let mut agg = InvoiceAggregate::new();
        set(&mut agg, "notes", "Thanks");
        set(&mut agg, "termsAndConditions", "Net 30");
        add_items(&mut agg, 1);
        let doc = LayoutEngine::default().layout(&agg);

        let texts = first_page_texts(&doc);
        let pos = |s: &str| texts.iter().position(|t| *t == s).unwrap();
        assert_eq!(texts[0], "INVOICE");
        assert!(pos("Invoice Number: N/A") < pos("From:"));
        assert!(pos("From:") < pos("To:"));
        assert!(pos("To:") < pos("Total Amount: $1.00"));
        assert!(pos("Total Amount: $1.00") < pos("Notes:"));
        assert!(pos("Notes:") < pos("Terms and Conditions:"));

        // the table sits between the buyer block and the totals
        let kinds: Vec<&str> = doc.pages[0]
            .instructions
            .iter()
            .map(|i| match i {
                DrawInstruction::Text(_) => "text",
                DrawInstruction::Line(_) => "line",
                DrawInstruction::Table(_) => "table",
            })
            .collect();
        let table = kinds.iter().position(|k| *k == "table").unwrap();
        let line = kinds.iter().position(|k| *k == "line").unwrap();
        assert!(line < table);
    }

    #[test]
    fn cursor_geometry_follows_line_metrics() {
        let doc = LayoutEngine::default().layout(&InvoiceAggregate::new());
        let texts: Vec<&TextRun> = doc.pages[0].texts().collect();
        assert_eq!(texts[0].y, 20.0);
        assert_eq!(texts[0].align, TextAlign::Center);
        assert_eq!(texts[0].x, 105.0);
        assert_eq!(texts[1].y, 35.0);
        assert_eq!(texts[2].y, 41.0);
        assert_eq!(texts[3].y, 47.0);

        let rule = doc.pages[0]
            .instructions
            .iter()
            .find_map(|i| match i {
                DrawInstruction::Line(r) => Some(r),
                _ => None,
            })
            .unwrap();
        assert_eq!((rule.x1, rule.y1, rule.x2), (20.0, 57.0, 190.0));
        // "From:" sits a section below the rule
        assert_eq!(texts[4].text, "From:");
        assert_eq!(texts[4].y, 67.0);
    }

    #[test]
    fn totals_are_right_aligned() {
        let doc = LayoutEngine::default().layout(&InvoiceAggregate::new());
        let total = doc.pages[0]
            .texts()
            .find(|t| t.text.starts_with("Total Amount"))
            .unwrap();
        assert_eq!(total.align, TextAlign::Right);
        assert_eq!(total.x, 180.0);
        assert_eq!(total.weight, FontWeight::Bold);
    }

    #[test]
    fn notes_split_into_lines() {
        let mut agg = InvoiceAggregate::new();
        set(&mut agg, "notes", "first\nsecond");
        let doc = LayoutEngine::default().layout(&agg);
        assert!(doc.contains_text("first"));
        assert!(doc.contains_text("second"));
    }

    #[test]
    fn long_table_paginates_with_repeated_header() {
        let mut agg = InvoiceAggregate::new();
        add_items(&mut agg, 80);
        let engine = LayoutEngine::default();
        let doc = engine.layout(&agg);
        assert!(doc.page_count() >= 2);

        let mut seen = 0;
        for (i, page) in doc.pages.iter().enumerate() {
            for table in page.tables() {
                assert_eq!(table.header, TABLE_HEADER.to_vec());
                assert!(!table.rows.is_empty());
                assert!(table.y + table.height() <= engine.config().bottom_limit() + 1e-9);
                if i > 0 {
                    assert_eq!(table.y, engine.config().margin.top);
                    // the header opens the page
                    assert!(matches!(page.instructions[0], DrawInstruction::Table(_)));
                }
                seen += table.rows.len();
            }
        }
        assert_eq!(seen, 80);
    }

    #[test]
    fn overflowing_text_moves_to_new_page() {
        let mut agg = InvoiceAggregate::new();
        add_items(&mut agg, 20);
        set(&mut agg, "notes", &vec!["line"; 40].join("\n"));
        let engine = LayoutEngine::default();
        let doc = engine.layout(&agg);
        assert!(doc.page_count() >= 2);
        for page in &doc.pages {
            for t in page.texts() {
                assert!(t.y <= engine.config().bottom_limit() + 1e-9);
            }
        }
    }

    #[test]
    fn long_descriptions_are_clipped() {
        let mut agg = InvoiceAggregate::new();
        let idx = Binder::add_item(&mut agg);
        Binder::update_item(&mut agg, idx, ItemEdit::Description("W".repeat(200)));
        let doc = LayoutEngine::default().layout(&agg);
        let table = doc.pages[0].tables().next().unwrap();
        let cell = &table.rows[0][0];
        assert!(cell.ends_with("..."));
        assert!(cell.len() < 200);
    }

    #[test]
    fn figures_are_never_clipped() {
        let mut agg = InvoiceAggregate::new();
        let idx = Binder::add_item(&mut agg);
        Binder::update_item(&mut agg, idx, ItemEdit::Description("Licence".into()));
        Binder::update_item(&mut agg, idx, ItemEdit::UnitPrice("1234567890123".into()));
        Binder::update_item(&mut agg, idx, ItemEdit::Quantity("4000000000".into()));
        let doc = LayoutEngine::default().layout(&agg);
        let table = doc.pages[0].tables().next().unwrap();
        assert_eq!(table.rows[0][1], "4000000000");
        assert_eq!(table.rows[0][2], "$1234567890123.00");
        assert_eq!(table.rows[0][3], "$4938271560492000000000.00");
    }

    #[test]
    fn table_and_totals_use_currency_marker() {
        let mut agg = InvoiceAggregate::new();
        set(&mut agg, "currency", "€");
        add_items(&mut agg, 1);
        let doc = LayoutEngine::default().layout(&agg);
        let table = doc.pages[0].tables().next().unwrap();
        assert_eq!(table.rows[0][2], "€1.00");
        assert!(doc.contains_text("Total Amount: €1.00"));
    }

    #[test]
    fn empty_items_render_header_only() {
        let doc = LayoutEngine::default().layout(&InvoiceAggregate::new());
        let table = doc.pages[0].tables().next().unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.height(), 8.0);
    }

    #[test]
    fn tiny_page_still_makes_progress() {
        let config = LayoutConfig {
            page_size: PageSize::Custom {
                width: 210.0,
                height: 45.0,
            },
            ..Default::default()
        };
        let mut agg = InvoiceAggregate::new();
        add_items(&mut agg, 3);
        let doc = LayoutEngine::new(config).layout(&agg);
        let rows: usize = doc
            .pages
            .iter()
            .flat_map(Page::tables)
            .map(|t| t.rows.len())
            .sum();
        assert_eq!(rows, 3);
    }
}
