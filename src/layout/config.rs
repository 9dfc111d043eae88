//! Page geometry and typography for the invoice layout.
//!
//! All lengths are millimetres. Font sizes are points, as in every PDF
//! toolkit. The defaults reproduce the classic single-column invoice: A4
//! portrait, 20 mm margins, 6 mm lines, 10 mm between sections.

use serde::{Deserialize, Serialize};

use crate::error::InvoiceError;

/// Points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// An RGB colour with channels in 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    /// Build from 0-255 channels.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    pub fn gray8(v: u8) -> Self {
        Self::rgb8(v, v, v)
    }
}

/// Standard page sizes, portrait, in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in millimetres.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

/// Everything the layout engine needs to know about the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    pub margin: Edges,
    /// Baseline advance between consecutive lines of a block.
    pub line_height: f64,
    /// Extra advance between blocks.
    pub section_gap: f64,
    /// Advance from the title to the first metadata line.
    pub title_gap: f64,
    /// Height of one table row, header included.
    pub row_height: f64,
    /// Horizontal padding inside table cells.
    pub cell_padding: f64,
    /// Right-aligned amounts are anchored this far in from the right page edge.
    pub amount_inset: f64,
    pub title_size: f64,
    pub body_size: f64,
    pub table_size: f64,
    /// Relative widths of the item, quantity, price and total columns.
    pub columns: [f64; 4],
    /// Never leave fewer than this many rows under a header at a page foot.
    pub min_orphan_rows: usize,
    /// Never carry fewer than this many rows onto the next page.
    pub min_widow_rows: usize,
    pub rule_color: Color,
    pub rule_width: f64,
    pub header_fill: Color,
    pub grid_color: Color,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: Edges::uniform(20.0),
            line_height: 6.0,
            section_gap: 10.0,
            title_gap: 15.0,
            row_height: 8.0,
            cell_padding: 1.8,
            amount_inset: 30.0,
            title_size: 20.0,
            body_size: 11.0,
            table_size: 10.0,
            columns: [0.4, 0.15, 0.2, 0.25],
            min_orphan_rows: 1,
            min_widow_rows: 1,
            rule_color: Color::gray8(200),
            rule_width: 0.5,
            header_fill: Color::rgb8(60, 141, 188),
            grid_color: Color::gray8(200),
        }
    }
}

impl LayoutConfig {
    /// Parse a config from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, InvoiceError> {
        serde_json::from_str(json).map_err(InvoiceError::config)
    }

    pub fn page_width(&self) -> f64 {
        self.page_size.dimensions().0
    }

    pub fn page_height(&self) -> f64 {
        self.page_size.dimensions().1
    }

    /// The lowest y any content may reach.
    pub fn bottom_limit(&self) -> f64 {
        self.page_height() - self.margin.bottom
    }

    pub fn content_width(&self) -> f64 {
        self.page_width() - self.margin.horizontal()
    }

    /// Column widths in millimetres, scaled to the content width.
    pub fn column_widths(&self) -> Vec<f64> {
        let sum: f64 = self.columns.iter().sum();
        let sum = if sum > 0.0 { sum } else { 1.0 };
        self.columns
            .iter()
            .map(|f| f / sum * self.content_width())
            .collect()
    }
}
