//! Host platform boundary
//!
//! The host owns the real message, renders components, and delivers
//! interactions. Pages only see it through the [`Host`] trait and the
//! per-interaction [`Context`].
//!
//! ```text
//! Host ──Interaction──▶ Surface::dispatch ──▶ active page callback
//!  ▲                                                │
//!  └──────────── edit_message / defer / modal ◀─────┘
//! ```

mod modal;
mod surface;

pub use modal::{ModalOutcome, ModalSpec, TextInput};
pub use surface::{RenderTarget, Surface};

use crate::error::PageResult;
use crate::page::{Component, ComponentId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reference to the single persistent message pages render into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// Identity of the user who triggered an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One field of an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich content payload carried alongside the components
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }
}

/// What happens to the plain-text content of the message on edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentEdit {
    /// Leave whatever text the message has
    Keep,
    /// Remove the text, leaving only embed and components
    Clear,
}

/// A full re-render of the bound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdit {
    pub content: ContentEdit,
    pub embed: Option<Embed>,
    pub components: Vec<Component>,
}

/// An interaction event delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    /// Host-assigned id, used for responses
    pub id: u64,
    pub user: UserId,
    /// Component that raised the event
    pub component: ComponentId,
    /// Selected values (select menus only)
    pub values: Vec<String>,
}

impl Interaction {
    /// A button press
    pub fn press(id: u64, user: UserId, component: impl Into<ComponentId>) -> Self {
        Self {
            id,
            user,
            component: component.into(),
            values: Vec::new(),
        }
    }

    /// A select-menu choice
    pub fn select(
        id: u64,
        user: UserId,
        component: impl Into<ComponentId>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user,
            component: component.into(),
            values: vec![value.into()],
        }
    }
}

/// Host platform API used by pages
///
/// Implementations must serialise edits per message and report modal
/// timeouts as [`ModalOutcome::TimedOut`] rather than as errors.
#[async_trait]
pub trait Host: Send + Sync {
    /// Replace the message's embed and components
    async fn edit_message(&self, message: MessageRef, edit: MessageEdit) -> PageResult<()>;

    /// Acknowledge an interaction without sending anything
    async fn defer(&self, interaction: &Interaction) -> PageResult<()>;

    /// Answer an interaction with a new message
    async fn send_message(
        &self,
        interaction: &Interaction,
        text: &str,
        ephemeral: bool,
    ) -> PageResult<()>;

    /// Send a message after the interaction was already answered
    async fn followup(&self, interaction: &Interaction, text: &str, ephemeral: bool)
        -> PageResult<()>;

    /// Open a modal and wait until it is submitted or times out
    async fn open_modal(&self, interaction: &Interaction, modal: ModalSpec)
        -> PageResult<ModalOutcome>;
}

/// Everything a callback needs to answer the interaction that triggered it
#[derive(Clone)]
pub struct Context {
    interaction: Interaction,
    host: Arc<dyn Host>,
}

impl Context {
    pub fn new(interaction: Interaction, host: Arc<dyn Host>) -> Self {
        Self { interaction, host }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn user(&self) -> UserId {
        self.interaction.user
    }

    pub fn values(&self) -> &[String] {
        &self.interaction.values
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub async fn defer(&self) -> PageResult<()> {
        self.host.defer(&self.interaction).await
    }

    /// Answer with a message only the triggering user can see
    pub async fn respond_ephemeral(&self, text: &str) -> PageResult<()> {
        self.host.send_message(&self.interaction, text, true).await
    }

    pub async fn followup_ephemeral(&self, text: &str) -> PageResult<()> {
        self.host.followup(&self.interaction, text, true).await
    }

    pub async fn open_modal(&self, modal: ModalSpec) -> PageResult<ModalOutcome> {
        self.host.open_modal(&self.interaction, modal).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("interaction", &self.interaction)
            .finish_non_exhaustive()
    }
}
