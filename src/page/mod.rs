//! Pages: the navigable units of UI state
//!
//! A page owns a render target, a list of components, and a lifecycle. The
//! richer page kinds are capabilities attached to that core rather than
//! layers of a class chain:
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!                    │           PageCore           │
//!                    │ target · components · hooks  │
//!                    │ lifecycle · parent link      │
//!                    └──────────────────────────────┘
//!                                   │
//!        ┌──────────────┬───────────┼─────────────┬──────────────┐
//!        ▼              ▼           ▼             ▼              ▼
//!   Switchable     ParentPage   ChildPage     MenuPage       Closable
//!   (switch_to)    (Children)   (parent())   (select +      (close button,
//!                                             Submenu)       Ending)
//! ```
//!
//! # Two-phase refresh
//!
//! Callbacks registered through [`PageBuilder`] are wrapped when
//! [`PageBuilder::build`] runs: after the callback succeeds, the page's
//! [`Page::update`] runs, then [`Page::update_message`]. Either phase can be
//! skipped per callback with [`CallbackOptions`]. Components added to the
//! core afterwards via [`PageCore::add_component`] are not wrapped.
//!
//! # Construction
//!
//! Pages are built inside [`Arc::new_cyclic`] so callbacks and hooks can
//! hold a weak link back to the page:
//!
//! ```ignore
//! impl FromTarget for Profile {
//!     fn from_target(target: Option<RenderTarget>) -> Arc<Self> {
//!         Arc::new_cyclic(|me| Self {
//!             core: PageBuilder::new(me, target)
//!                 .component(Component::button("rename", "Rename"), |page: Arc<Self>, ctx| async move {
//!                     page.rename(&ctx).await
//!                 })
//!                 .closable()
//!                 .build(),
//!         })
//!     }
//! }
//! ```

mod base;
mod closable;
mod component;
mod confirm;
mod hierarchy;
pub mod layout;
pub mod lifecycle;
mod menu;
mod processing;
mod switch;

pub use base::{CallbackOptions, PageBuilder, PageConfig, PageCore};
pub use closable::{Closable, Ending, CLOSE, DEFAULT_CLOSE_TIMEOUT_MESSAGE};
pub use component::{ButtonStyle, Component, ComponentId, ComponentKind, SelectOption};
pub use confirm::{ConfirmationPage, CANCEL, CONFIRM};
pub use hierarchy::{ChildPage, ChildSpec, Children, MenuEntry, ParentPage};
pub use menu::{MenuPage, Submenu, BACK, BACK_TO_TOP, MENU_SELECT};
pub use processing::{processing, ProcessingGuard};
pub use switch::{switch_new, switch_to, Switchable};

pub(crate) use base::invoke;

use crate::error::{PageError, PageResult};
use crate::host::RenderTarget;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// Inactivity timeout used when a page type doesn't choose one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Upcast support so `Arc<dyn Page>` can be turned back into a concrete page
pub trait AsAny: Any + Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A single navigable page
///
/// Only [`Page::core`] is required. The async hooks are override points;
/// their defaults do nothing ([`Page::update`], [`Page::on_timeout`]) or
/// push the current state to the host ([`Page::update_message`]).
#[async_trait]
pub trait Page: AsAny {
    fn core(&self) -> &PageCore;

    /// Refresh internal state and derived content.
    ///
    /// Runs after every wrapped callback, before `update_message`.
    async fn update(&self) -> PageResult<()> {
        Ok(())
    }

    /// Push embed and component state to the bound render target.
    ///
    /// Logs a warning and does nothing when no target is bound. May run
    /// more often than once per interaction (the processing guard calls it
    /// on entry and exit).
    async fn update_message(&self) -> PageResult<()> {
        self.core().render().await
    }

    /// Set every component's disabled flag (`true` disables all), then
    /// `update_message`.
    async fn set_component_state(&self, disabled: bool) -> PageResult<()> {
        self.core().set_all_disabled(disabled);
        self.update_message().await
    }

    /// Called when the page went inactive past its timeout, after the
    /// core's timeout hooks and before the page is stopped.
    async fn on_timeout(&self) -> PageResult<()> {
        Ok(())
    }

    /// End the page: runs the stop hooks, then wakes everyone waiting on it.
    ///
    /// Overrides must still call `self.core().stop()`.
    fn stop(&self) {
        self.core().stop();
    }
}

/// Type-level configuration of a concrete page
///
/// These are associated consts so every instance of a type shares them.
pub trait PageKind: Page + Sized {
    /// Inactivity timeout; `None` disables it
    const TIMEOUT: Option<Duration> = Some(DEFAULT_TIMEOUT);

    /// Clear the message's plain-text content on every render
    const RESETS_CONTENT: bool = false;
}

/// Pages that can be constructed from nothing but a render target
pub trait FromTarget: PageKind {
    fn from_target(target: Option<RenderTarget>) -> Arc<Self>;
}

/// Recover the concrete type behind a page reference
pub fn downcast<P: Page>(page: Arc<dyn Page>) -> PageResult<Arc<P>> {
    let found = page.core().kind();
    page.into_any()
        .downcast::<P>()
        .map_err(|_| PageError::TypeMismatch {
            expected: crate::util::short_type_name::<P>(),
            found,
        })
}
