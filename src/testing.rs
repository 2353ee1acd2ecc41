//! Test doubles: a recording host and a small tree of sample pages
//!
//! ```text
//! Root (menu)
//! ├── SubA "Section A" (menu, submenu)
//! │   └── SubB (menu, submenu)
//! │       └── SubC (submenu)
//! └── Leaf (submenu)
//!
//! Stray: claims Root as parent but is not declared
//! Counter, Probe, Editor: standalone pages
//! ```

use crate::error::{PageError, PageResult};
use crate::host::{
    Host, Interaction, MessageEdit, MessageRef, ModalOutcome, ModalSpec, Surface, UserId,
};
use crate::logging::{CaptureLayer, LogBuffer};
use crate::page::{
    CallbackOptions, ChildPage, ChildSpec, Children, Closable, Component, Ending, MenuPage, Page,
    PageBuilder, PageCore, PageKind, ParentPage, Submenu,
};
use crate::host::{Context, RenderTarget};
use crate::util::lock;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;

pub const USER: UserId = UserId(1);
pub const OTHER_USER: UserId = UserId(2);

// ─────────────────────────────────────────────────────────────────────────────
// MockHost
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub interaction: u64,
    pub text: String,
    pub ephemeral: bool,
}

/// Host that records every call and answers modals from a queue
#[derive(Default)]
pub struct MockHost {
    edits: Mutex<Vec<MessageEdit>>,
    defers: Mutex<Vec<u64>>,
    messages: Mutex<Vec<SentMessage>>,
    followups: Mutex<Vec<SentMessage>>,
    modals: Mutex<Vec<ModalSpec>>,
    modal_outcomes: Mutex<VecDeque<ModalOutcome>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Outcome for the next modal; an empty submission when the queue is empty
    pub fn queue_modal(&self, outcome: ModalOutcome) {
        lock(&self.modal_outcomes).push_back(outcome);
    }

    pub fn edits(&self) -> Vec<MessageEdit> {
        lock(&self.edits).clone()
    }

    pub fn last_edit(&self) -> Option<MessageEdit> {
        lock(&self.edits).last().cloned()
    }

    pub fn defers(&self) -> Vec<u64> {
        lock(&self.defers).clone()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        lock(&self.messages).clone()
    }

    pub fn followups(&self) -> Vec<SentMessage> {
        lock(&self.followups).clone()
    }

    pub fn modals(&self) -> Vec<ModalSpec> {
        lock(&self.modals).clone()
    }
}

#[async_trait]
impl Host for MockHost {
    async fn edit_message(&self, _message: MessageRef, edit: MessageEdit) -> PageResult<()> {
        lock(&self.edits).push(edit);
        Ok(())
    }

    async fn defer(&self, interaction: &Interaction) -> PageResult<()> {
        lock(&self.defers).push(interaction.id);
        Ok(())
    }

    async fn send_message(
        &self,
        interaction: &Interaction,
        text: &str,
        ephemeral: bool,
    ) -> PageResult<()> {
        lock(&self.messages).push(SentMessage {
            interaction: interaction.id,
            text: text.to_string(),
            ephemeral,
        });
        Ok(())
    }

    async fn followup(
        &self,
        interaction: &Interaction,
        text: &str,
        ephemeral: bool,
    ) -> PageResult<()> {
        lock(&self.followups).push(SentMessage {
            interaction: interaction.id,
            text: text.to_string(),
            ephemeral,
        });
        Ok(())
    }

    async fn open_modal(
        &self,
        _interaction: &Interaction,
        modal: ModalSpec,
    ) -> PageResult<ModalOutcome> {
        lock(&self.modals).push(modal);
        let outcome = lock(&self.modal_outcomes).pop_front();
        Ok(outcome.unwrap_or_else(|| ModalOutcome::Submitted(Default::default())))
    }
}

pub fn mock_surface() -> (Arc<MockHost>, Arc<Surface>) {
    let host = MockHost::new();
    let surface = Surface::new(
        host.clone(),
        MessageRef {
            channel_id: 10,
            message_id: 20,
        },
    );
    (host, surface)
}

/// Yield to spawned tasks until `cond` holds
pub async fn wait_for(cond: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Capture log events on this thread until the guard drops
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::new();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(buffer.clone()));
    (buffer, tracing::subscriber::set_default(subscriber))
}

#[derive(Default)]
pub struct Events(Mutex<Vec<String>>);

impl Events {
    pub fn record(&self, event: impl Into<String>) {
        lock(&self.0).push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

/// Page impl with an `update` that records itself
macro_rules! recording_page {
    ($page:ty) => {
        #[async_trait]
        impl Page for $page {
            fn core(&self) -> &PageCore {
                &self.core
            }

            async fn update(&self) -> PageResult<()> {
                self.events.record("update");
                Ok(())
            }
        }

        #[allow(dead_code)]
        impl $page {
            pub fn events(&self) -> Vec<String> {
                self.events.all()
            }

            pub fn record(&self, event: impl Into<String>) {
                self.events.record(event);
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Standalone pages
// ─────────────────────────────────────────────────────────────────────────────

pub struct Counter {
    core: PageCore,
    count: AtomicUsize,
    events: Events,
}

impl Counter {
    pub const INCREMENT: &'static str = "counter:increment";
    pub const QUIET: &'static str = "counter:quiet";
    pub const FAIL: &'static str = "counter:fail";
    pub const SLOW: &'static str = "counter:slow";

    pub fn new(target: Option<RenderTarget>) -> Arc<Self> {
        Self::build(target, None)
    }

    pub fn owned(target: Option<RenderTarget>, owner: UserId) -> Arc<Self> {
        Self::build(target, Some(owner))
    }

    fn build(target: Option<RenderTarget>, owner: Option<UserId>) -> Arc<Self> {
        Arc::new_cyclic(|me| {
            let mut builder = PageBuilder::new(me, target);
            if let Some(owner) = owner {
                builder = builder.owned_by(owner);
            }
            Self {
                core: builder
                    .component(Component::button(Self::INCREMENT, "+1"), |page: Arc<Self>, _ctx| async move {
                        page.count.fetch_add(1, Ordering::SeqCst);
                        page.record("increment");
                        Ok(())
                    })
                    .component_with(
                        Component::button(Self::QUIET, "Quiet"),
                        CallbackOptions::new().skip_refresh(),
                        |page: Arc<Self>, _ctx| async move {
                            page.record("quiet");
                            Ok(())
                        },
                    )
                    .component(Component::button(Self::FAIL, "Fail"), |page: Arc<Self>, _ctx| async move {
                        page.record("fail");
                        Err(PageError::Host("refused".into()))
                    })
                    .component_with(
                        Component::button(Self::SLOW, "Slow"),
                        CallbackOptions::new().disable_while_processing(),
                        |page: Arc<Self>, _ctx| async move {
                            tokio::task::yield_now().await;
                            page.record("slow");
                            Ok(())
                        },
                    )
                    .build(),
                count: AtomicUsize::new(0),
                events: Events::default(),
            }
        })
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

recording_page!(Counter);
impl PageKind for Counter {}

/// Page with a short timeout that records its timeout path
pub struct Probe {
    core: PageCore,
    timeouts: AtomicUsize,
    stop_hook_runs: AtomicUsize,
    events: Events,
}

impl Probe {
    pub const IDLE: Duration = Duration::from_secs(10);
    pub const PING: &'static str = "probe:ping";

    pub fn new(target: Option<RenderTarget>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target)
                .component_with(
                    Component::button(Self::PING, "Ping"),
                    CallbackOptions::new().skip_update(),
                    |_page: Arc<Self>, _ctx| async { Ok(()) },
                )
                .on_timeout(|page: Arc<Self>| async move {
                    page.events.record("timeout-hook");
                })
                .on_stop(|page: Arc<Self>| {
                    page.stop_hook_runs.fetch_add(1, Ordering::SeqCst);
                    page.events.record("stop-hook");
                })
                .build(),
            timeouts: AtomicUsize::new(0),
            stop_hook_runs: AtomicUsize::new(0),
            events: Events::default(),
        })
    }

    pub fn timeouts(&self) -> usize {
        self.timeouts.load(Ordering::SeqCst)
    }

    pub fn stop_hook_runs(&self) -> usize {
        self.stop_hook_runs.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.all()
    }
}

#[async_trait]
impl Page for Probe {
    fn core(&self) -> &PageCore {
        &self.core
    }

    async fn on_timeout(&self) -> PageResult<()> {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
        self.events.record("on_timeout");
        Ok(())
    }
}

impl PageKind for Probe {
    const TIMEOUT: Option<Duration> = Some(Self::IDLE);
}

/// Closable page logging its close and end handlers
pub struct Editor {
    core: PageCore,
    ending: Ending,
    events: Events,
}

impl Editor {
    pub fn new(target: Option<RenderTarget>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target).closable().build(),
            ending: Ending::new(),
            events: Events::default(),
        })
    }
}

recording_page!(Editor);
impl PageKind for Editor {}

impl Closable for Editor {
    fn ending(&self) -> &Ending {
        &self.ending
    }

    fn on_close(&self, _ctx: &Context) -> impl Future<Output = PageResult<()>> + Send {
        async move {
            self.record("on_close:start");
            tokio::task::yield_now().await;
            self.record("on_close:end");
            Ok(())
        }
    }

    fn on_end(self: Arc<Self>) -> impl Future<Output = ()> + Send + 'static {
        async move {
            self.record("on_end:start");
            tokio::task::yield_now().await;
            self.record("on_end:end");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Menu tree
// ─────────────────────────────────────────────────────────────────────────────

pub struct Root {
    core: PageCore,
    children: Children<Root>,
    events: Events,
}

impl Root {
    pub fn new(target: Option<RenderTarget>) -> Arc<Self> {
        let page = Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target).build(),
            children: Children::new(),
            events: Events::default(),
        });
        page.attach_menu();
        page
    }
}

recording_page!(Root);
impl PageKind for Root {}

impl ParentPage for Root {
    fn children(&self) -> &Children<Self> {
        &self.children
    }

    fn declared_children() -> Vec<ChildSpec<Self>> {
        vec![ChildSpec::of::<SubA>(), ChildSpec::of::<Leaf>()]
    }
}

impl MenuPage for Root {
    const PLACEHOLDER: Option<&'static str> = Some("Pick a section");
}

/// Declare a submenu type: struct, page impls and its `ChildPage` impl
macro_rules! submenu {
    ($name:ident, parent = $parent:ty, children = [$($child:ty),*] $(, label = $label:expr, emoji = $emoji:expr)?) => {
        pub struct $name {
            core: PageCore,
            children: Children<$name>,
            events: Events,
        }

        recording_page!($name);
        impl PageKind for $name {}
        impl Submenu for $name {}

        impl ChildPage for $name {
            type Parent = $parent;
            $(
                const NAME: Option<&'static str> = Some($label);
                const EMOJI: Option<&'static str> = Some($emoji);
            )?

            fn new_child(parent: &Arc<$parent>, target: Option<RenderTarget>) -> Arc<Self> {
                let page = Arc::new_cyclic(|me| Self {
                    core: PageBuilder::new(me, target).child_of(parent).submenu().build(),
                    children: Children::new(),
                    events: Events::default(),
                });
                if !Self::declared_children().is_empty() {
                    page.attach_menu();
                }
                page
            }
        }

        impl ParentPage for $name {
            fn children(&self) -> &Children<Self> {
                &self.children
            }

            fn declared_children() -> Vec<ChildSpec<Self>> {
                vec![$(ChildSpec::of::<$child>()),*]
            }
        }

        impl MenuPage for $name {}
    };
}

submenu!(SubA, parent = Root, children = [SubB], label = "Section A", emoji = "🅰");
submenu!(SubB, parent = SubA, children = [SubC]);
submenu!(SubC, parent = SubB, children = []);
submenu!(Leaf, parent = Root, children = []);

/// Claims `Root` as parent without being declared by it
pub struct Stray {
    core: PageCore,
    events: Events,
}

recording_page!(Stray);
impl PageKind for Stray {}

impl ChildPage for Stray {
    type Parent = Root;

    fn new_child(parent: &Arc<Root>, target: Option<RenderTarget>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target).child_of(parent).build(),
            events: Events::default(),
        })
    }
}
