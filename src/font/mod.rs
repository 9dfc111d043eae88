//! # Fonts
//!
//! The document uses the two standard PDF Helvetica faces, which need no
//! embedding. Their metrics let the layout clip table cells and let the PDF
//! writer resolve centred and right-aligned text.

pub mod metrics;

use serde::{Deserialize, Serialize};

pub use metrics::StandardFontMetrics;

/// Text weight used by draw instructions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    pub fn standard_font(&self) -> StandardFont {
        match self {
            FontWeight::Regular => StandardFont::Helvetica,
            FontWeight::Bold => StandardFont::HelveticaBold,
        }
    }
}

/// The standard PDF fonts this crate draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }
}

/// Width of `text` in points.
pub fn measure_string(text: &str, weight: FontWeight, font_size: f64) -> f64 {
    weight
        .standard_font()
        .metrics()
        .measure_string(text, font_size)
}
