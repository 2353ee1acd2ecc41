// Page core and builder
//
// PageCore is the state every page carries: render target, components with
// their callbacks, stop/timeout hooks and the lifecycle. PageBuilder collects
// all of it while the page is being constructed inside Arc::new_cyclic, so
// callbacks can hold a weak link to the finished page.

use super::component::{Component, ComponentId};
use super::lifecycle::{self, Lifecycle};
use super::{downcast, layout, processing, Page, PageKind};
use crate::error::{PageError, PageResult};
use crate::host::{ContentEdit, Context, Embed, MessageEdit, RenderTarget, UserId};
use crate::util::{lock, short_type_name};
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Callbacks
// ─────────────────────────────────────────────────────────────────────────────

/// Which refresh phases run after a wrapped callback
///
/// The flags are independent. The default runs `update` and then
/// `update_message`, without the processing guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackOptions {
    pub skip_update: bool,
    pub skip_message_update: bool,
    pub disable_while_processing: bool,
}

impl CallbackOptions {
    pub const fn new() -> Self {
        Self {
            skip_update: false,
            skip_message_update: false,
            disable_while_processing: false,
        }
    }

    pub const fn skip_update(mut self) -> Self {
        self.skip_update = true;
        self
    }

    pub const fn skip_message_update(mut self) -> Self {
        self.skip_message_update = true;
        self
    }

    /// Skip both refresh phases
    pub const fn skip_refresh(self) -> Self {
        self.skip_update().skip_message_update()
    }

    /// Run the callback under the processing guard
    pub const fn disable_while_processing(mut self) -> Self {
        self.disable_while_processing = true;
        self
    }
}

type Handler = Arc<dyn Fn(Context) -> BoxFuture<'static, PageResult<()>> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct Callback {
    run: Handler,
    pub(crate) options: CallbackOptions,
    /// Set for callbacks registered before `build()`
    pub(crate) wrapped: bool,
}

struct Entry {
    component: Component,
    callback: Callback,
}

/// Turn a typed handler into one that resolves the page from a weak link
fn erase<P, F, Fut>(me: Weak<dyn Page>, kind: &'static str, handler: F) -> Handler
where
    P: Page,
    F: Fn(Arc<P>, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PageResult<()>> + Send + 'static,
{
    Arc::new(move |ctx: Context| {
        let Some(page) = me.upgrade() else {
            return future::ready(Err(PageError::Gone(kind))).boxed();
        };
        match downcast::<P>(page) {
            Ok(page) => handler(page, ctx).boxed(),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    })
}

/// Run a callback for `page`, then its refresh phases if it is wrapped.
///
/// An error from the callback skips both phases.
pub(crate) async fn invoke(
    page: Arc<dyn Page>,
    callback: Callback,
    ctx: Context,
) -> PageResult<()> {
    let run = &*callback.run;
    if callback.options.disable_while_processing {
        processing(&*page, run(ctx)).await?;
    } else {
        run(ctx).await?;
    }

    if callback.wrapped {
        if !callback.options.skip_update {
            page.update().await?;
        }
        if !callback.options.skip_message_update {
            page.update_message().await?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// PageCore
// ─────────────────────────────────────────────────────────────────────────────

/// Per-type settings copied from [`PageKind`] at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    pub timeout: Option<Duration>,
    pub resets_content: bool,
}

struct ParentLink {
    page: Weak<dyn Page>,
    kind: &'static str,
}

type StopHook = Box<dyn Fn() + Send + Sync>;
type TimeoutHook = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// State shared by every page
pub struct PageCore {
    kind: &'static str,
    config: PageConfig,
    me: Weak<dyn Page>,
    parent: Option<ParentLink>,
    owner: Option<UserId>,
    target: Mutex<Option<RenderTarget>>,
    entries: Mutex<Vec<Entry>>,
    stop_hooks: Vec<StopHook>,
    timeout_hooks: Vec<TimeoutHook>,
    stopping: AtomicBool,
    lifecycle: Lifecycle,
}

impl PageCore {
    /// Short type name of the page, used in logs and errors
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn config(&self) -> PageConfig {
        self.config
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }

    pub fn resets_content(&self) -> bool {
        self.config.resets_content
    }

    /// The page owning this core, unless it is being dropped
    pub fn this(&self) -> Option<Arc<dyn Page>> {
        self.me.upgrade()
    }

    /// The owning page as its concrete type
    pub fn upgrade<P: Page>(&self) -> PageResult<Arc<P>> {
        let page = self.this().ok_or(PageError::Gone(self.kind))?;
        downcast(page)
    }

    /// The page this one was built as a child of.
    ///
    /// `Ok(None)` for pages without a parent link.
    pub fn parent(&self) -> PageResult<Option<Arc<dyn Page>>> {
        match &self.parent {
            None => Ok(None),
            Some(link) => link.page.upgrade().map(Some).ok_or(PageError::Gone(link.kind)),
        }
    }

    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    // ─────────────────────────────────────────────────────────────────────
    // Render target
    // ─────────────────────────────────────────────────────────────────────

    pub fn target(&self) -> Option<RenderTarget> {
        lock(&self.target).clone()
    }

    pub fn set_target(&self, target: Option<RenderTarget>) {
        *lock(&self.target) = target;
    }

    /// Modify the embed in place, creating an empty one if needed.
    ///
    /// Returns `false` when no target is bound.
    pub fn edit_embed(&self, f: impl FnOnce(&mut Embed)) -> bool {
        let mut target = lock(&self.target);
        match target.as_mut() {
            Some(target) => {
                f(target.embed.get_or_insert_with(Embed::default));
                true
            }
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Components
    // ─────────────────────────────────────────────────────────────────────

    pub fn components(&self) -> Vec<Component> {
        lock(&self.entries)
            .iter()
            .map(|entry| entry.component.clone())
            .collect()
    }

    pub fn component(&self, id: &ComponentId) -> Option<Component> {
        lock(&self.entries)
            .iter()
            .find(|entry| &entry.component.id == id)
            .map(|entry| entry.component.clone())
    }

    /// Returns `false` if no component has that id
    pub fn set_disabled(&self, id: &ComponentId, disabled: bool) -> bool {
        let mut entries = lock(&self.entries);
        match entries.iter_mut().find(|entry| &entry.component.id == id) {
            Some(entry) => {
                entry.component.disabled = disabled;
                true
            }
            None => false,
        }
    }

    pub fn set_all_disabled(&self, disabled: bool) {
        for entry in lock(&self.entries).iter_mut() {
            entry.component.disabled = disabled;
        }
    }

    /// Disable every enabled component and return their ids
    pub(crate) fn disable_enabled(&self) -> Vec<ComponentId> {
        lock(&self.entries)
            .iter_mut()
            .filter(|entry| !entry.component.disabled)
            .map(|entry| {
                entry.component.disabled = true;
                entry.component.id.clone()
            })
            .collect()
    }

    pub(crate) fn enable(&self, ids: &[ComponentId]) {
        for entry in lock(&self.entries).iter_mut() {
            if ids.contains(&entry.component.id) {
                entry.component.disabled = false;
            }
        }
    }

    /// Add a component after construction.
    ///
    /// The callback is not wrapped: neither `update` nor `update_message`
    /// runs after it. A component with the same id is replaced.
    pub fn add_component<P, F, Fut>(&self, component: Component, options: CallbackOptions, handler: F)
    where
        P: Page,
        F: Fn(Arc<P>, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PageResult<()>> + Send + 'static,
    {
        let entry = Entry {
            component,
            callback: Callback {
                run: erase(self.me.clone(), self.kind, handler),
                options,
                wrapped: false,
            },
        };

        let mut entries = lock(&self.entries);
        match entries.iter_mut().find(|e| e.component.id == entry.component.id) {
            Some(existing) => {
                debug!(page = self.kind, component = %entry.component.id, "replacing component");
                *existing = entry;
            }
            None => entries.push(entry),
        }
    }

    pub(crate) fn callback(&self, id: &ComponentId) -> Option<Callback> {
        lock(&self.entries)
            .iter()
            .find(|entry| &entry.component.id == id)
            .map(|entry| entry.callback.clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn is_stopped(&self) -> bool {
        self.lifecycle.is_stopped()
    }

    /// Resolves once the page has stopped
    pub async fn stopped(&self) {
        self.lifecycle.stopped().await
    }

    /// Run the stop hooks, then mark the page stopped.
    ///
    /// Only the first call has any effect.
    pub fn stop(&self) {
        if self.stopping.swap(true, Ordering::AcqRel) {
            return;
        }
        for hook in &self.stop_hooks {
            hook();
        }
        self.lifecycle.finish();
        debug!(page = self.kind, "page stopped");
    }

    pub(crate) async fn run_timeout_hooks(&self) {
        for hook in &self.timeout_hooks {
            hook().await;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    /// Push the embed and components to the bound target.
    ///
    /// Binds the surface to this page and arms the inactivity timer on the
    /// first render. Without a target this only logs a warning.
    pub async fn render(&self) -> PageResult<()> {
        let Some(target) = self.target() else {
            warn!(page = self.kind, "update_message called without a bound message");
            return Ok(());
        };

        let components = {
            let entries = lock(&self.entries);
            let components: Vec<Component> =
                entries.iter().map(|entry| entry.component.clone()).collect();
            layout::arrange(&components)?
                .into_iter()
                .enumerate()
                .flat_map(|(row, placed)| {
                    placed.into_iter().map(move |c| {
                        let mut c = c.clone();
                        c.row = u8::try_from(row).ok();
                        c
                    })
                })
                .collect::<Vec<_>>()
        };

        let edit = MessageEdit {
            content: if self.config.resets_content {
                ContentEdit::Clear
            } else {
                ContentEdit::Keep
            },
            embed: target.embed.clone(),
            components,
        };

        if let Some(me) = self.this() {
            target.surface().bind(&me);
            lifecycle::arm(&me);
        }
        target.surface().edit(edit).await
    }
}

impl fmt::Debug for PageCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCore")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("owner", &self.owner)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PageBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Collects components and hooks while a page is under construction
pub struct PageBuilder<P: PageKind> {
    me: Weak<P>,
    target: Option<RenderTarget>,
    parent: Option<ParentLink>,
    owner: Option<UserId>,
    entries: Vec<Entry>,
    stop_hooks: Vec<StopHook>,
    timeout_hooks: Vec<TimeoutHook>,
}

impl<P: PageKind> PageBuilder<P> {
    pub fn new(me: &Weak<P>, target: Option<RenderTarget>) -> Self {
        Self {
            me: me.clone(),
            target,
            parent: None,
            owner: None,
            entries: Vec::new(),
            stop_hooks: Vec::new(),
            timeout_hooks: Vec::new(),
        }
    }

    /// Record `parent` as this page's parent. The link is weak.
    ///
    /// The child inherits the parent's owner unless one was already set.
    pub fn child_of<Q: Page>(mut self, parent: &Arc<Q>) -> Self {
        let page: Weak<dyn Page> = Arc::downgrade(parent) as Weak<dyn Page>;
        self.parent = Some(ParentLink {
            page,
            kind: parent.core().kind(),
        });
        if self.owner.is_none() {
            self.owner = parent.core().owner();
        }
        self
    }

    /// Only `user` may interact with the page
    pub fn owned_by(mut self, user: UserId) -> Self {
        self.owner = Some(user);
        self
    }

    pub fn component<F, Fut>(self, component: Component, handler: F) -> Self
    where
        F: Fn(Arc<P>, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PageResult<()>> + Send + 'static,
    {
        self.component_with(component, CallbackOptions::default(), handler)
    }

    pub fn component_with<F, Fut>(
        mut self,
        component: Component,
        options: CallbackOptions,
        handler: F,
    ) -> Self
    where
        F: Fn(Arc<P>, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PageResult<()>> + Send + 'static,
    {
        let me: Weak<dyn Page> = self.me.clone();
        self.entries.push(Entry {
            component,
            callback: Callback {
                run: erase(me, short_type_name::<P>(), handler),
                options,
                wrapped: false,
            },
        });
        self
    }

    /// Run `hook` when the page stops, before waiters are woken
    pub fn on_stop(mut self, hook: impl Fn(Arc<P>) + Send + Sync + 'static) -> Self {
        let me = self.me.clone();
        self.stop_hooks.push(Box::new(move || {
            if let Some(page) = me.upgrade() {
                hook(page);
            }
        }));
        self
    }

    /// Run `hook` when the page times out, before `Page::on_timeout`
    pub fn on_timeout<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let me = self.me.clone();
        self.timeout_hooks.push(Box::new(move || match me.upgrade() {
            Some(page) => hook(page).boxed(),
            None => future::ready(()).boxed(),
        }));
        self
    }

    /// Finish construction, wrapping every registered callback.
    pub fn build(self) -> PageCore {
        let kind = short_type_name::<P>();
        let entries = self
            .entries
            .into_iter()
            .map(|mut entry| {
                entry.callback.wrapped = true;
                entry
            })
            .collect();
        let me: Weak<dyn Page> = self.me;

        PageCore {
            kind,
            config: PageConfig {
                timeout: P::TIMEOUT,
                resets_content: P::RESETS_CONTENT,
            },
            me,
            parent: self.parent,
            owner: self.owner,
            target: Mutex::new(self.target),
            entries: Mutex::new(entries),
            stop_hooks: self.stop_hooks,
            timeout_hooks: self.timeout_hooks,
            stopping: AtomicBool::new(false),
            lifecycle: Lifecycle::new(),
        }
    }
}
