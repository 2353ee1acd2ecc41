//! Closable pages
//!
//! A closable page carries a "Close" button that asks for confirmation in a
//! modal, and an [`Ending`]: the handle of its `on_end` task, started once
//! when the page stops or times out.
//!
//! ```text
//!            Close pressed
//! Open ─────────────────────▶ Closing (modal open)
//!  ▲                              │            │
//!  └──────── modal timed out ─────┘            │ submitted
//!            (one ephemeral notice)            ▼
//!                                   on_close ─▶ stop ─▶ on_end task ─▶ Ended
//!
//! Open ── page timeout ──▶ on_end task (awaited) ─▶ on_timeout ─▶ stop ─▶ Ended
//! ```
//!
//! Awaiting [`Closable::ended`] before the page has stopped resolves
//! immediately; there is no task to wait for yet.

use super::base::{CallbackOptions, PageBuilder};
use super::component::{ButtonStyle, Component, ComponentId};
use super::layout::MAX_ROWS;
use super::PageKind;
use crate::error::PageResult;
use crate::host::{Context, ModalOutcome, ModalSpec, TextInput};
use crate::util::lock;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

pub const CLOSE: ComponentId = ComponentId::new("closable:close");

pub const DEFAULT_CLOSE_TIMEOUT_MESSAGE: &str = ":sleeping: Modal timed out";

/// A page with a confirmed Close action and an awaitable end
pub trait Closable: PageKind {
    /// Ephemeral notice sent when the close modal times out
    const CLOSE_TIMEOUT_MESSAGE: &'static str = DEFAULT_CLOSE_TIMEOUT_MESSAGE;

    fn ending(&self) -> &Ending;

    /// Runs after the close was confirmed, before the page stops.
    fn on_close(&self, _ctx: &Context) -> impl Future<Output = PageResult<()>> + Send {
        async { Ok(()) }
    }

    /// Runs as its own task once the page ends, closed or timed out.
    fn on_end(self: Arc<Self>) -> impl Future<Output = ()> + Send + 'static {
        async {}
    }

    /// Wait for the `on_end` task. Resolves immediately if it never started.
    fn ended(&self) -> impl Future<Output = ()> + Send + 'static {
        self.ending().wait()
    }
}

/// Slot holding the `on_end` task of a closable page
#[derive(Default)]
pub struct Ending {
    task: Mutex<Option<Shared<BoxFuture<'static, ()>>>>,
}

impl Ending {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` and record it. Returns `false` if a task was already
    /// recorded; an ending is never restarted.
    pub fn start<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.task);
        if slot.is_some() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("cannot start on_end outside of a tokio runtime");
            return false;
        };

        let handle = runtime.spawn(task);
        let joined = async move {
            if let Err(e) = handle.await {
                error!(error = %e, "on_end task failed");
            }
        };
        *slot = Some(joined.boxed().shared());
        true
    }

    pub fn is_started(&self) -> bool {
        lock(&self.task).is_some()
    }

    /// Resolves when the recorded task finishes, or right away if none is
    /// recorded.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let task = lock(&self.task).clone();
        async move {
            if let Some(task) = task {
                task.await;
            }
        }
    }
}

impl fmt::Debug for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ending")
            .field("started", &self.is_started())
            .finish()
    }
}

fn begin_ending<P: Closable>(page: Arc<P>) {
    if page.ending().is_started() {
        return;
    }
    let task = Arc::clone(&page).on_end();
    if page.ending().start(task) {
        debug!(page = page.core().kind(), "on_end started");
    }
}

impl<P: Closable> PageBuilder<P> {
    /// Add the Close button and tie `on_end` to stop and timeout.
    pub fn closable(self) -> Self {
        self.component_with(
            Component::button(CLOSE, "Close")
                .style(ButtonStyle::Danger)
                .row((MAX_ROWS - 1) as u8),
            // A refresh could clobber whatever on_close rendered
            CallbackOptions::new().skip_refresh(),
            |page: Arc<P>, ctx| async move { close(page, ctx).await },
        )
        .on_stop(begin_ending::<P>)
        .on_timeout(|page: Arc<P>| async move {
            begin_ending(Arc::clone(&page));
            page.ended().await;
        })
    }
}

fn close_modal() -> ModalSpec {
    ModalSpec::new("Close this editor?").field(TextInput {
        id: "dummy".into(),
        label: "Ignore me".into(),
        placeholder: Some("Leave an emoji, if you wish :wink:".into()),
        required: false,
        max_length: Some(30),
    })
}

async fn close<P: Closable>(page: Arc<P>, ctx: Context) -> PageResult<()> {
    match ctx.open_modal(close_modal()).await? {
        ModalOutcome::TimedOut => {
            debug!(page = page.core().kind(), "close modal timed out");
            ctx.followup_ephemeral(P::CLOSE_TIMEOUT_MESSAGE).await
        }
        ModalOutcome::Submitted(_) => {
            info!(page = page.core().kind(), user = %ctx.user(), "page closed");
            page.on_close(&ctx).await?;
            page.stop();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Interaction, RenderTarget};
    use crate::page::{lifecycle, Page};
    use crate::testing::{mock_surface, Editor, USER};
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn test_close_confirmed_orders_on_close_before_on_end() {
        let (host, surface) = mock_surface();
        host.queue_modal(ModalOutcome::Submitted(HashMap::new()));
        let editor = Editor::new(Some(RenderTarget::new(surface.clone(), None)));
        editor.update_message().await.unwrap();

        let handle = surface
            .dispatch(Interaction::press(1, USER, CLOSE))
            .expect("dispatched");
        handle.await.unwrap().unwrap();
        assert!(editor.core().is_stopped());

        editor.ended().await;
        editor.record("resumed");

        assert_eq!(
            editor.events(),
            vec!["on_close:start", "on_close:end", "on_end:start", "on_end:end", "resumed"]
        );
        let modal = &host.modals()[0];
        assert_eq!(modal.title, "Close this editor?");
        assert!(!modal.fields[0].required);
    }

    #[tokio::test]
    async fn test_close_modal_timeout_leaves_page_open() {
        let (host, surface) = mock_surface();
        host.queue_modal(ModalOutcome::TimedOut);
        let editor = Editor::new(Some(RenderTarget::new(surface.clone(), None)));
        editor.update_message().await.unwrap();
        let edits = host.edits().len();
        let components = editor.core().components();

        let handle = surface
            .dispatch(Interaction::press(1, USER, CLOSE))
            .expect("dispatched");
        handle.await.unwrap().unwrap();

        let followups = host.followups();
        assert_eq!(followups.len(), 1);
        assert_eq!(followups[0].text, DEFAULT_CLOSE_TIMEOUT_MESSAGE);
        assert!(followups[0].ephemeral);
        assert!(editor.events().is_empty());
        assert!(!editor.core().is_stopped());
        assert!(!editor.ending().is_started());
        assert_eq!(editor.core().components(), components);
        assert_eq!(host.edits().len(), edits);
    }

    #[tokio::test]
    async fn test_ended_before_stop_resolves_immediately() {
        let editor = Editor::new(None);
        tokio::time::timeout(Duration::from_millis(100), editor.ended())
            .await
            .expect("resolves without a recorded task");
        assert!(!editor.core().is_stopped());
    }

    #[tokio::test]
    async fn test_timeout_awaits_on_end_before_stop() {
        let editor = Editor::new(None);
        let page: Arc<dyn Page> = editor.clone();

        lifecycle::time_out(page).await;

        assert!(editor.core().is_stopped());
        // on_end finished inside the timeout path, before the stop hook
        assert_eq!(editor.events(), vec!["on_end:start", "on_end:end"]);
    }

    #[tokio::test]
    async fn test_ending_is_never_restarted() {
        let editor = Editor::new(None);
        editor.stop();
        editor.stop();
        editor.ended().await;

        assert!(!editor.ending().start(async {}));
        assert_eq!(editor.events(), vec!["on_end:start", "on_end:end"]);
    }
}
