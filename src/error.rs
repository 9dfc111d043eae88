//! Structured error types for the invoicer.
//!
//! Editing an invoice never fails: bad input is coerced, missing data is
//! rendered as a placeholder and impossible navigation is ignored. Errors only
//! come from loading external input (schemas, answer sheets, layout config).

use thiserror::Error;

/// The unified error type returned by the public loading functions.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Schema JSON failed to parse.
    #[error("Failed to parse schema: {source}{}", hint_suffix(.hint))]
    SchemaParse {
        source: serde_json::Error,
        hint: String,
    },
    /// Schema parsed but describes an unusable itinerary.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Answer sheet JSON failed to parse.
    #[error("Failed to parse answers: {source}{}", hint_suffix(.hint))]
    AnswersParse {
        source: serde_json::Error,
        hint: String,
    },
    /// Layout configuration JSON failed to parse.
    #[error("Failed to parse layout config: {source}{}", hint_suffix(.hint))]
    ConfigParse {
        source: serde_json::Error,
        hint: String,
    },
}

impl InvoiceError {
    pub(crate) fn schema(e: serde_json::Error) -> Self {
        let hint = hint_for(&e);
        InvoiceError::SchemaParse { source: e, hint }
    }

    pub(crate) fn answers(e: serde_json::Error) -> Self {
        let hint = hint_for(&e);
        InvoiceError::AnswersParse { source: e, hint }
    }

    pub(crate) fn config(e: serde_json::Error) -> Self {
        let hint = hint_for(&e);
        InvoiceError::ConfigParse { source: e, hint }
    }
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

fn hint_for(e: &serde_json::Error) -> String {
    match e.classify() {
        serde_json::error::Category::Syntax => {
            "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
        }
        serde_json::error::Category::Data => {
            "The JSON is valid but doesn't match the expected shape. Check field names and types."
                .to_string()
        }
        serde_json::error::Category::Eof => {
            "Unexpected end of input, is the JSON truncated?".to_string()
        }
        serde_json::error::Category::Io => String::new(),
    }
}
