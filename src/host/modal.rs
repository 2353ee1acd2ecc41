// Modal dialogs
//
// A modal is a one-shot form the host shows on top of the message. Pages
// describe it with ModalSpec and get back either the submitted values or a
// timeout.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single text field inside a modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub id: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub required: bool,
    pub max_length: Option<u16>,
}

/// Description of a modal the host should open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSpec {
    pub title: String,
    pub fields: Vec<TextInput>,
}

impl ModalSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: TextInput) -> Self {
        self.fields.push(field);
        self
    }
}

/// How a modal ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalOutcome {
    /// The user submitted the form; values keyed by field id
    Submitted(HashMap<String, String>),
    /// The modal went inactive without a submission
    TimedOut,
}

impl ModalOutcome {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, ModalOutcome::TimedOut)
    }
}
