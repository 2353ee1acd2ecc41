//! Typed parent/child page hierarchy
//!
//! A [`ParentPage`] declares the child types it can navigate to. Children
//! are built lazily on first access, on a copy of the parent's render
//! target, and cached: at most one instance per declared type for the
//! lifetime of the parent.
//!
//! ```text
//! ParentPage ── Children ──┬── ChildSpec<A> ──▶ cache[TypeId(A)] = Arc<A>
//!     ▲                    └── ChildSpec<B> ──▶ (built on first get_child)
//!     │ weak link in PageCore
//! ChildPage::parent()
//! ```

use super::switch::switch_to;
use super::{downcast, Page, PageKind};
use crate::error::{PageError, PageResult};
use crate::host::RenderTarget;
use crate::util::{lock, short_type_name};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Display metadata of a child, as shown in a parent's menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub emoji: Option<&'static str>,
}

impl MenuEntry {
    /// Metadata of `C`; the name falls back to the type name.
    pub fn of<C: ChildPage>() -> Self {
        Self {
            name: C::NAME.unwrap_or_else(short_type_name::<C>),
            description: C::DESCRIPTION,
            emoji: C::EMOJI,
        }
    }
}

/// One declared child type of `P`
pub struct ChildSpec<P> {
    type_id: TypeId,
    type_name: &'static str,
    entry: MenuEntry,
    build: fn(&Arc<P>, Option<RenderTarget>) -> Arc<dyn Page>,
}

impl<P: ParentPage> ChildSpec<P> {
    pub fn of<C: ChildPage<Parent = P>>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: short_type_name::<C>(),
            entry: MenuEntry::of::<C>(),
            build: build_child::<C>,
        }
    }
}

impl<P> ChildSpec<P> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn entry(&self) -> &MenuEntry {
        &self.entry
    }
}

impl<P> fmt::Debug for ChildSpec<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildSpec")
            .field("type_name", &self.type_name)
            .field("entry", &self.entry)
            .finish()
    }
}

fn build_child<C: ChildPage>(parent: &Arc<C::Parent>, target: Option<RenderTarget>) -> Arc<dyn Page> {
    C::new_child(parent, target)
}

/// Declared children of `P` and the cache of built instances
pub struct Children<P> {
    declared: Vec<ChildSpec<P>>,
    cache: Mutex<HashMap<TypeId, Arc<dyn Page>>>,
}

impl<P: ParentPage> Children<P> {
    pub fn new() -> Self {
        Self {
            declared: P::declared_children(),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<P: ParentPage> Default for Children<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Children<P> {
    pub fn declared(&self) -> &[ChildSpec<P>] {
        &self.declared
    }

    pub fn position(&self, type_id: TypeId) -> Option<usize> {
        self.declared.iter().position(|spec| spec.type_id == type_id)
    }

    pub fn cached_count(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn is_cached<C: 'static>(&self) -> bool {
        lock(&self.cache).contains_key(&TypeId::of::<C>())
    }
}

impl<P: ParentPage> Children<P> {
    /// Cached child at `index`, built on first use.
    ///
    /// The cache stays locked while a child is built, so a child
    /// constructor must not resolve siblings through the same parent.
    fn resolve(&self, parent: &Arc<P>, index: usize) -> Option<Arc<dyn Page>> {
        let spec = self.declared.get(index)?;
        let mut cache = lock(&self.cache);
        if let Some(child) = cache.get(&spec.type_id) {
            debug!(parent = parent.core().kind(), child = spec.type_name, "child cache hit");
            return Some(child.clone());
        }

        let child = (spec.build)(parent, parent.core().target());
        debug!(parent = parent.core().kind(), child = spec.type_name, "child built");
        cache.insert(spec.type_id, child.clone());
        Some(child)
    }
}

impl<P> fmt::Debug for Children<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Children")
            .field("declared", &self.declared)
            .field("cached", &self.cached_count())
            .finish()
    }
}

/// A page with a fixed set of child page types
pub trait ParentPage: PageKind {
    fn children(&self) -> &Children<Self>;

    /// The child types, in menu order. Called once per instance.
    fn declared_children() -> Vec<ChildSpec<Self>>;

    /// The cached `C`, building it on first access.
    ///
    /// Fails with [`PageError::UndeclaredChild`] for a type missing from
    /// [`ParentPage::declared_children`]; the cache is left untouched.
    fn get_child<C: ChildPage<Parent = Self>>(&self) -> PageResult<Arc<C>> {
        let index = self
            .children()
            .position(TypeId::of::<C>())
            .ok_or(PageError::UndeclaredChild {
                parent: self.core().kind(),
                child: short_type_name::<C>(),
            })?;
        let parent = self.core().upgrade::<Self>()?;
        let child = self
            .children()
            .resolve(&parent, index)
            .ok_or(PageError::Gone(short_type_name::<C>()))?;
        downcast(child)
    }

    /// The child declared at `index`, if there is one
    fn get_child_at(&self, index: usize) -> PageResult<Option<Arc<dyn Page>>> {
        if index >= self.children().declared().len() {
            return Ok(None);
        }
        let parent = self.core().upgrade::<Self>()?;
        Ok(self.children().resolve(&parent, index))
    }

    /// `get_child`, then switch to it. Returns once the child stops.
    fn switch_to_child<C: ChildPage<Parent = Self>>(
        &self,
    ) -> impl Future<Output = PageResult<Arc<C>>> + Send {
        async move {
            let child = self.get_child::<C>()?;
            switch_to(child).await
        }
    }
}

/// A page built as the child of a [`ParentPage`]
pub trait ChildPage: PageKind {
    type Parent: ParentPage;

    /// Menu label; the type name when unset
    const NAME: Option<&'static str> = None;
    const DESCRIPTION: Option<&'static str> = None;
    const EMOJI: Option<&'static str> = None;

    /// Build the child. Implementations pass `parent` to
    /// [`PageBuilder::child_of`](super::PageBuilder::child_of).
    fn new_child(parent: &Arc<Self::Parent>, target: Option<RenderTarget>) -> Arc<Self>;

    fn parent(&self) -> PageResult<Arc<Self::Parent>> {
        let parent = self
            .core()
            .parent()?
            .ok_or(PageError::Detached(self.core().kind()))?;
        downcast(parent)
    }

    /// Switch back to the parent. Returns once the parent stops.
    fn switch_to_parent(&self) -> impl Future<Output = PageResult<Arc<Self::Parent>>> + Send {
        async move { switch_to(self.parent()?).await }
    }
}
