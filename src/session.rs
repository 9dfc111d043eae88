//! # Invoice Session
//!
//! One wizard run: the schema being walked, the wizard position and the
//! aggregate being filled in. The session is the only owner of the
//! aggregate, and it hands out a [`LayoutDocument`] only once the wizard has
//! been finished.
//!
//! Recorded answer sheets ([`Answers`]) can be replayed through a session,
//! which is how the CLI drives a non-interactive run.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::binder::{Binder, ItemEdit};
use crate::error::InvoiceError;
use crate::layout::{LayoutConfig, LayoutDocument, LayoutEngine};
use crate::model::{InvoiceAggregate, LineItemKind};
use crate::schema::{FieldKind, Schema, StepDescriptor};
use crate::wizard::{ForwardLabel, Transition, WizardEngine};

pub struct InvoiceSession {
    schema: Schema,
    wizard: WizardEngine,
    aggregate: InvoiceAggregate,
    engine: LayoutEngine,
}

impl InvoiceSession {
    pub fn new(schema: Schema) -> Self {
        Self::with_layout(schema, LayoutConfig::default())
    }

    pub fn with_layout(schema: Schema, config: LayoutConfig) -> Self {
        let wizard = WizardEngine::new(&schema);
        Self {
            schema,
            wizard,
            aggregate: InvoiceAggregate::new(),
            engine: LayoutEngine::new(config),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn wizard(&self) -> &WizardEngine {
        &self.wizard
    }

    pub fn aggregate(&self) -> &InvoiceAggregate {
        &self.aggregate
    }

    pub fn current_step(&self) -> Option<&StepDescriptor> {
        self.wizard.current_step(&self.schema)
    }

    /// Input labels for the active step, in schema order. Empty once completed.
    pub fn current_labels(&self) -> Vec<String> {
        self.current_step()
            .map(|step| step.fields.iter().map(|f| f.label_text()).collect())
            .unwrap_or_default()
    }

    pub fn forward_label(&self) -> ForwardLabel {
        self.wizard.forward_label()
    }

    /// What the named field currently shows, or `None` for an unknown field.
    pub fn display_value(&self, name: &str) -> Option<String> {
        self.schema
            .find_field(name)
            .map(|descriptor| Binder::display_value(descriptor, &self.aggregate))
    }

    /// Write user input to a scalar field. Unknown fields and the line-item
    /// field are left alone and reported as `false`.
    pub fn edit_field(&mut self, name: &str, input: &str) -> bool {
        match self.schema.find_field(name) {
            Some(descriptor) => Binder::write(descriptor, &mut self.aggregate, input),
            None => {
                debug!(field = name, "edit to unknown field ignored");
                false
            }
        }
    }

    pub fn add_item(&mut self) -> usize {
        Binder::add_item(&mut self.aggregate)
    }

    pub fn add_item_of_kind(&mut self, kind: LineItemKind) -> usize {
        Binder::add_item_of_kind(&mut self.aggregate, kind)
    }

    pub fn remove_item(&mut self, index: usize) -> bool {
        Binder::remove_item(&mut self.aggregate, index)
    }

    pub fn update_item(&mut self, index: usize, edit: ItemEdit) -> bool {
        Binder::update_item(&mut self.aggregate, index, edit)
    }

    pub fn next(&mut self) -> Transition {
        self.wizard.next()
    }

    pub fn prev(&mut self) -> Transition {
        self.wizard.prev()
    }

    /// Back to the first step. Answers are kept; see [`clear`](Self::clear).
    pub fn reset(&mut self) -> Transition {
        self.wizard.reset()
    }

    /// Drop every answer and line item.
    pub fn clear(&mut self) {
        self.aggregate.clear();
        debug!("aggregate cleared");
    }

    /// The finished document, once the wizard is completed.
    pub fn submit(&self) -> Option<LayoutDocument> {
        if !self.wizard.is_completed() {
            debug!(state = ?self.wizard.state(), "submit before completion ignored");
            return None;
        }
        info!(
            invoice = self.aggregate.invoice_number().unwrap_or("draft"),
            items = self.aggregate.items().len(),
            "invoice submitted"
        );
        Some(self.engine.layout(&self.aggregate))
    }

    /// Walk the wizard from the first step to completion, entering the
    /// recorded answers for each step's fields as it goes.
    pub fn apply_answers(&mut self, answers: &Answers) {
        for name in answers.fields.keys() {
            if self.schema.find_field(name).is_none() {
                warn!(field = %name, "answer for a field the schema does not define");
            }
        }

        self.wizard.reset();
        while let Some(index) = self.wizard.current_index() {
            let Some(step) = self.schema.step(index) else {
                break;
            };

            let wants_items = step.has_line_items();
            let mut edits: Vec<(String, String)> = Vec::new();
            for field in &step.fields {
                if field.kind == FieldKind::LineItems {
                    continue;
                }
                match answers.fields.get(&field.name) {
                    Some(value) => edits.push((field.name.clone(), value.as_input())),
                    None if field.required => {
                        debug!(field = %field.label_text(), "required field has no recorded answer")
                    }
                    None => {}
                }
            }

            for (name, input) in edits {
                self.edit_field(&name, &input);
            }
            if wants_items {
                for item in &answers.items {
                    self.replay_item(item);
                }
            }

            self.wizard.next();
        }
    }

    fn replay_item(&mut self, answer: &AnswerItem) {
        let index = self.add_item_of_kind(answer.kind);
        let mut edits = vec![ItemEdit::Description(answer.description.clone())];
        if let Some(q) = &answer.quantity {
            edits.push(ItemEdit::Quantity(q.as_input()));
        }
        if let Some(p) = &answer.unit_price {
            edits.push(ItemEdit::UnitPrice(p.as_input()));
        }
        if let Some(d) = &answer.line_discount {
            edits.push(ItemEdit::LineDiscount(d.as_input()));
        }
        for (tax, rate) in answer.tax_rates.iter().enumerate() {
            edits.push(ItemEdit::AddTaxRate);
            if let Some(r) = &rate.rate {
                edits.push(ItemEdit::TaxRate {
                    index: tax,
                    rate: r.as_input(),
                });
            }
            edits.push(ItemEdit::TaxDescription {
                index: tax,
                description: rate.description.clone(),
            });
        }
        for edit in edits {
            self.update_item(index, edit);
        }
    }
}

/// A recorded answer: JSON strings and numbers are both accepted and
/// entered as the text a user would have typed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Number(serde_json::Number),
}

impl AnswerValue {
    pub fn as_input(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerTaxRate {
    pub rate: Option<AnswerValue>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerItem {
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: Option<AnswerValue>,
    pub unit_price: Option<AnswerValue>,
    pub line_discount: Option<AnswerValue>,
    pub tax_rates: Vec<AnswerTaxRate>,
}

/// A recorded answer sheet for one invoice.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Answers {
    pub fields: BTreeMap<String, AnswerValue>,
    pub items: Vec<AnswerItem>,
}

impl Answers {
    pub fn from_json(json: &str) -> Result<Self, InvoiceError> {
        serde_json::from_str(json).map_err(InvoiceError::answers)
    }
}
