//! # Schema Model
//!
//! The static description of the wizard: an ordered list of steps, each with
//! an ordered list of fields. A schema is loaded once and never mutated.
//!
//! Two JSON shapes are accepted: a bare `{ "steps": [...] }` object, and the
//! `{ "invoiceCreationFlow": { "steps": [...] } }` wrapper produced by the
//! form-authoring tools. Field `type` is one of `string`, `number`, `date` or
//! `array`. An `array` field named `items` (or `lineItems`) is the line-item
//! collection; any other array field binds as plain text.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::InvoiceError;

/// Field names recognised as the repeating line-item collection.
pub const LINE_ITEM_FIELD_NAMES: [&str; 2] = ["items", "lineItems"];

/// The closed set of field kinds the binder knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    LineItems,
}

/// One input on a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Unique within its step; also the key in the aggregate.
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Presentation hint only. Never blocks a write or a transition.
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// The label as shown next to the input, with a marker for required fields.
    pub fn label_text(&self) -> String {
        if self.required {
            format!("{} *", self.label)
        } else {
            self.label.clone()
        }
    }
}

/// One page of the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub step_id: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<FieldDescriptor>,
    /// Optional steps present "Skip" instead of "Next". Transitions are identical.
    #[serde(default)]
    pub optional: bool,
}

impl StepDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_line_items(&self) -> bool {
        self.fields.iter().any(|f| f.kind == FieldKind::LineItems)
    }
}

/// The wizard's fixed itinerary. Always holds at least one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    steps: Vec<StepDescriptor>,
}

impl Schema {
    /// Build a schema from already-typed steps, checking structural invariants.
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, InvoiceError> {
        if steps.is_empty() {
            return Err(InvoiceError::InvalidSchema(
                "a schema needs at least one step".to_string(),
            ));
        }

        let mut step_ids = HashSet::new();
        for step in &steps {
            if !step_ids.insert(step.step_id.as_str()) {
                return Err(InvoiceError::InvalidSchema(format!(
                    "duplicate step id '{}'",
                    step.step_id
                )));
            }
            let mut names = HashSet::new();
            for field in &step.fields {
                if !names.insert(field.name.as_str()) {
                    return Err(InvoiceError::InvalidSchema(format!(
                        "duplicate field '{}' in step '{}'",
                        field.name, step.step_id
                    )));
                }
            }
        }

        Ok(Self { steps })
    }

    /// Parse a schema from JSON in either accepted shape.
    pub fn from_json(json: &str) -> Result<Self, InvoiceError> {
        let doc: SchemaDocument = serde_json::from_str(json).map_err(InvoiceError::schema)?;
        let flow = match doc {
            SchemaDocument::Wrapped { flow } => flow,
            SchemaDocument::Bare(flow) => flow,
        };
        let steps = flow
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, raw)| raw.into_descriptor(i))
            .collect();
        Self::new(steps)
    }

    /// The schema bundled with the crate: basic info, seller, buyer, items,
    /// adjustments and notes.
    pub fn default_invoice() -> Self {
        Self::from_json(DEFAULT_SCHEMA_JSON).expect("bundled schema must be valid")
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    /// Find a field by name anywhere in the itinerary (first match wins).
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.steps.iter().find_map(|s| s.field(name))
    }
}

// ── Wire shapes ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Wrapped {
        #[serde(rename = "invoiceCreationFlow")]
        flow: RawFlow,
    },
    Bare(RawFlow),
}

#[derive(Deserialize)]
struct RawFlow {
    steps: Vec<RawStep>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    step_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    optional: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type")]
    field_type: RawFieldType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default_value: Option<serde_json::Value>,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum RawFieldType {
    String,
    Number,
    Date,
    Array,
}

impl RawStep {
    fn into_descriptor(self, index: usize) -> StepDescriptor {
        let title = if self.title.is_empty() {
            format!("Step {}", index + 1)
        } else {
            self.title
        };
        StepDescriptor {
            step_id: self.step_id,
            title,
            description: self.description,
            fields: self.fields.into_iter().map(RawField::into_descriptor).collect(),
            optional: self.optional,
        }
    }
}

impl RawField {
    fn into_descriptor(self) -> FieldDescriptor {
        let kind = match self.field_type {
            RawFieldType::String => FieldKind::Text,
            RawFieldType::Number => FieldKind::Number,
            RawFieldType::Date => FieldKind::Date,
            RawFieldType::Array if LINE_ITEM_FIELD_NAMES.contains(&self.name.as_str()) => {
                FieldKind::LineItems
            }
            RawFieldType::Array => FieldKind::Text,
        };
        let default = self.default_value.and_then(|v| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        FieldDescriptor {
            label: self.label.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            kind,
            required: self.required,
            default,
        }
    }
}

/// The bundled invoice schema, in the wrapped authoring shape.
pub const DEFAULT_SCHEMA_JSON: &str = r##"{
  "invoiceCreationFlow": {
    "steps": [
      {
        "stepId": "basic-info",
        "title": "Basic Invoice Info",
        "description": "Number, dates and currency of the invoice.",
        "fields": [
          { "name": "invoiceNumber", "label": "Invoice Number", "type": "string", "required": true },
          { "name": "issueDate", "label": "Issue Date", "type": "date", "required": true },
          { "name": "dueDate", "label": "Due Date", "type": "date", "required": false },
          { "name": "currency", "label": "Currency", "type": "string", "required": false, "defaultValue": "$" }
        ]
      },
      {
        "stepId": "seller-info",
        "title": "Seller Information",
        "description": "Who is issuing the invoice.",
        "fields": [
          { "name": "sellerCompanyName", "label": "Company Name", "type": "string", "required": true },
          { "name": "sellerStreet", "label": "Street", "type": "string", "required": false },
          { "name": "sellerCity", "label": "City", "type": "string", "required": false },
          { "name": "sellerState", "label": "State", "type": "string", "required": false },
          { "name": "sellerZipCode", "label": "Zip Code", "type": "string", "required": false },
          { "name": "sellerCountry", "label": "Country", "type": "string", "required": false },
          { "name": "sellerPhone", "label": "Phone", "type": "string", "required": false },
          { "name": "sellerEmail", "label": "Email", "type": "string", "required": false }
        ]
      },
      {
        "stepId": "buyer-info",
        "title": "Buyer Information",
        "description": "Who is being billed.",
        "fields": [
          { "name": "buyerName", "label": "Name", "type": "string", "required": true },
          { "name": "buyerStreet", "label": "Street", "type": "string", "required": false },
          { "name": "buyerCity", "label": "City", "type": "string", "required": false },
          { "name": "buyerState", "label": "State", "type": "string", "required": false },
          { "name": "buyerZipCode", "label": "Zip Code", "type": "string", "required": false },
          { "name": "buyerCountry", "label": "Country", "type": "string", "required": false },
          { "name": "buyerPhone", "label": "Phone", "type": "string", "required": false },
          { "name": "buyerEmail", "label": "Email", "type": "string", "required": false }
        ]
      },
      {
        "stepId": "line-items",
        "title": "Line Items",
        "description": "Products and services being billed.",
        "fields": [
          { "name": "items", "label": "Items", "type": "array", "required": true }
        ]
      },
      {
        "stepId": "adjustments",
        "title": "Discount and Taxes",
        "description": "Invoice-level amounts added to or taken off the subtotal.",
        "optional": true,
        "fields": [
          { "name": "discount", "label": "Discount", "type": "number", "required": false, "defaultValue": "0" },
          { "name": "taxes", "label": "Taxes", "type": "number", "required": false, "defaultValue": "0" }
        ]
      },
      {
        "stepId": "notes",
        "title": "Notes and Terms",
        "description": "Anything else the buyer should read.",
        "optional": true,
        "fields": [
          { "name": "notes", "label": "Notes", "type": "string", "required": false },
          { "name": "termsAndConditions", "label": "Terms and Conditions", "type": "string", "required": false }
        ]
      }
    ]
  }
}
"##;
