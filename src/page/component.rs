//! Interactive components a page renders into its message
//!
//! Components are plain data: the host renders them and reports which one
//! was used by its [`ComponentId`]. Callbacks live next to them in
//! [`PageCore`](super::PageCore), not inside the component.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Unique identifier of a component within one page
///
/// The host echoes it back with every interaction, so it must be stable for
/// the lifetime of the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(Cow<'static, str>);

impl ComponentId {
    /// Create an id from a static string (no allocation)
    pub const fn new(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ComponentId {
    fn from(id: &'static str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual style of a button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    #[default]
    Secondary,
    Success,
    Danger,
}

/// One entry of a select menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    /// Value reported back by the host when this option is chosen
    pub value: String,
    pub description: Option<String>,
    pub emoji: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
            emoji: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }
}

/// What kind of control a component is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Button {
        label: String,
        style: ButtonStyle,
        emoji: Option<String>,
    },
    Select {
        placeholder: Option<String>,
        options: Vec<SelectOption>,
    },
}

/// A component as rendered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub kind: ComponentKind,
    /// Explicit row (0-based); `None` lets the layout pick the first row with room
    pub row: Option<u8>,
    pub disabled: bool,
}

impl Component {
    /// A secondary-style button
    pub fn button(id: impl Into<ComponentId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ComponentKind::Button {
                label: label.into(),
                style: ButtonStyle::default(),
                emoji: None,
            },
            row: None,
            disabled: false,
        }
    }

    /// A single-choice select menu
    pub fn select(id: impl Into<ComponentId>, options: Vec<SelectOption>) -> Self {
        Self {
            id: id.into(),
            kind: ComponentKind::Select {
                placeholder: None,
                options,
            },
            row: None,
            disabled: false,
        }
    }

    pub fn row(mut self, row: u8) -> Self {
        self.row = Some(row);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Set the button style. No effect on selects.
    pub fn style(mut self, new_style: ButtonStyle) -> Self {
        if let ComponentKind::Button { style, .. } = &mut self.kind {
            *style = new_style;
        }
        self
    }

    /// Set the select placeholder. No effect on buttons.
    pub fn placeholder(mut self, text: Option<impl Into<String>>) -> Self {
        if let ComponentKind::Select { placeholder, .. } = &mut self.kind {
            *placeholder = text.map(Into::into);
        }
        self
    }

    /// Row capacity this component consumes
    pub fn width(&self) -> usize {
        match self.kind {
            ComponentKind::Button { .. } => 1,
            ComponentKind::Select { .. } => super::layout::ROW_WIDTH,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.kind {
            ComponentKind::Button { label, .. } => Some(label),
            ComponentKind::Select { .. } => None,
        }
    }
}
