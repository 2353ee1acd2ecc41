// Switching between pages
//
// A switch hands the render target to another page, renders it, and then
// waits until that page stops. Nested switches form a chain of suspended
// awaits, one per level of navigation depth.

use super::{FromTarget, Page};
use crate::error::{PageError, PageResult};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error};

/// Render `target` and wait until it stops. Returns the stopped page.
///
/// A page that already stopped is not rendered again.
pub async fn switch_to<T: Page + ?Sized>(target: Arc<T>) -> PageResult<Arc<T>> {
    let core = target.core();
    if core.is_stopped() {
        error!(page = core.kind(), "cannot switch to a stopped page");
        return Err(PageError::Stopped(core.kind()));
    }
    debug!(page = core.kind(), "switching");
    target.update().await?;
    target.update_message().await?;
    core.stopped().await;
    debug!(page = core.kind(), "switched page ended");
    Ok(target)
}

/// Build a `T` on a copy of `from`'s render target and switch to it.
pub async fn switch_new<T, P>(from: &P) -> PageResult<Arc<T>>
where
    T: FromTarget,
    P: Page + ?Sized,
{
    let page = T::from_target(from.core().target());
    switch_to(page).await
}

/// Method-call form of [`switch_to`] and [`switch_new`]
pub trait Switchable: Page {
    fn switch_to<T: Page + ?Sized>(
        &self,
        target: Arc<T>,
    ) -> impl Future<Output = PageResult<Arc<T>>> + Send {
        switch_to(target)
    }

    fn switch_new<T: FromTarget>(&self) -> impl Future<Output = PageResult<Arc<T>>> + Send {
        switch_new::<T, Self>(self)
    }
}

impl<P: Page + ?Sized> Switchable for P {}
