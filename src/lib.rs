//! # Invoicer
//!
//! A schema-driven invoice wizard with a page-native document renderer.
//!
//! A JSON schema describes a sequence of steps, each a handful of typed
//! fields. The wizard walks those steps one at a time while user input is
//! bound into a single invoice record. When the last step is finished the
//! record is laid out onto fixed-size pages and can be written as a PDF.
//!
//! Layout is page-aware from the start: the line-item table flows *into*
//! pages and repeats its header wherever it continues, instead of being
//! drawn on a tall canvas and cut up afterwards.
//!
//! ## Architecture
//!
//! ```text
//! Schema JSON
//!       ↓
//!   [schema]   — Steps and typed field descriptors
//!       ↓
//!   [wizard]   — Step cursor: next / prev / reset
//!   [binder]   — Field input → aggregate, with coercion
//!       ↓
//!   [model]    — The invoice aggregate
//!   [compute]  — Line totals, subtotal, display total
//!       ↓
//!   [layout]   — Page-aware document layout
//!       ↓
//!   [pdf]      — Serialize to PDF bytes
//! ```
//!
//! [`session::InvoiceSession`] ties the pieces together for one wizard run.

pub mod binder;
pub mod compute;
pub mod error;
pub mod font;
pub mod layout;
pub mod logging;
pub mod model;
pub mod pdf;
pub mod schema;
pub mod session;
pub mod wizard;

pub use error::InvoiceError;
pub use layout::{LayoutConfig, LayoutDocument, LayoutEngine};
pub use model::InvoiceAggregate;
pub use schema::Schema;
pub use session::{Answers, InvoiceSession};

use pdf::PdfWriter;

/// Lay out a finished invoice with the default page setup.
///
/// This is the submission boundary: it reads the aggregate as it stands
/// and returns a fresh document every time.
pub fn finalize(aggregate: &InvoiceAggregate) -> LayoutDocument {
    finalize_with(aggregate, LayoutConfig::default())
}

pub fn finalize_with(aggregate: &InvoiceAggregate, config: LayoutConfig) -> LayoutDocument {
    LayoutEngine::new(config).layout(aggregate)
}

/// Serialize a laid-out document to PDF bytes.
pub fn render_pdf(document: &LayoutDocument) -> Vec<u8> {
    PdfWriter::new().write(document)
}
