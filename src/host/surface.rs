//! The shared message surface and interaction routing
//!
//! A [`Surface`] is one persistent message on the host. Exactly one page is
//! active on it at a time: whichever page rendered last. Interactions are
//! routed to that page and each callback runs as its own task, so a callback
//! waiting on a modal or a switch never blocks the next event.

use super::{Context, Embed, Host, Interaction, MessageEdit, MessageRef};
use crate::error::PageResult;
use crate::page::{self, lifecycle, Page};
use crate::util::lock;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Ephemeral notice for users interacting with a page they don't own
pub const NOT_OWNER_MESSAGE: &str = "This editor belongs to someone else.";

/// One host message that pages take turns rendering into
pub struct Surface {
    host: Arc<dyn Host>,
    message: MessageRef,
    /// Weak so the surface never keeps a finished page alive
    active: Mutex<Option<Weak<dyn Page>>>,
}

impl Surface {
    pub fn new(host: Arc<dyn Host>, message: MessageRef) -> Arc<Self> {
        Arc::new(Self {
            host,
            message,
            active: Mutex::new(None),
        })
    }

    pub fn message(&self) -> MessageRef {
        self.message
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// The page currently holding this surface, if it is still alive
    pub fn active(&self) -> Option<Arc<dyn Page>> {
        lock(&self.active).as_ref().and_then(Weak::upgrade)
    }

    /// Hand the surface to `page`
    pub(crate) fn bind(&self, page: &Arc<dyn Page>) {
        let mut active = lock(&self.active);
        let previous = active.replace(Arc::downgrade(page));
        if previous.is_some_and(|prev| !Weak::ptr_eq(&prev, &Arc::downgrade(page))) {
            debug!(page = page.core().kind(), "surface rebound");
        }
    }

    pub(crate) async fn edit(&self, edit: MessageEdit) -> PageResult<()> {
        self.host.edit_message(self.message, edit).await
    }

    /// Route an interaction to the active page.
    ///
    /// Returns the handle of the spawned callback task, or `None` when the
    /// event was dropped: no active page, the page already stopped, or the
    /// component is unknown or disabled.
    pub fn dispatch(&self, interaction: Interaction) -> Option<JoinHandle<PageResult<()>>> {
        let Some(page) = self.active() else {
            warn!(
                message = ?self.message,
                component = %interaction.component,
                "interaction for a surface without an active page"
            );
            return None;
        };

        let core = page.core();
        if core.is_stopped() {
            warn!(page = core.kind(), component = %interaction.component, "interaction for a stopped page");
            return None;
        }

        let ctx = Context::new(interaction, self.host.clone());

        if let Some(owner) = core.owner() {
            if owner != ctx.user() {
                debug!(page = core.kind(), user = %ctx.user(), %owner, "rejected interaction from non-owner");
                return Some(tokio::spawn(async move {
                    ctx.respond_ephemeral(NOT_OWNER_MESSAGE).await
                }));
            }
        }

        let component = ctx.interaction().component.clone();
        let Some(callback) = core.callback(&component) else {
            warn!(page = core.kind(), %component, "interaction for an unknown component");
            return None;
        };
        // The host may still show a component the page just disabled
        if core.component(&component).is_some_and(|c| c.disabled) {
            warn!(page = core.kind(), %component, "interaction for a disabled component");
            return None;
        }

        lifecycle::touch_lineage(&page);

        Some(tokio::spawn(async move {
            let kind = page.core().kind();
            let result = page::invoke(page, callback, ctx).await;
            if let Err(error) = &result {
                error!(page = kind, %component, %error, "component callback failed");
            }
            result
        }))
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// The (surface, embed) pair a page renders into
///
/// Cloning copies the embed; the surface itself is shared.
#[derive(Clone)]
pub struct RenderTarget {
    surface: Arc<Surface>,
    pub embed: Option<Embed>,
}

impl RenderTarget {
    pub fn new(surface: Arc<Surface>, embed: Option<Embed>) -> Self {
        Self { surface, embed }
    }

    pub fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    pub fn message(&self) -> MessageRef {
        self.surface.message
    }
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("message", &self.surface.message)
            .field("embed", &self.embed)
            .finish()
    }
}
