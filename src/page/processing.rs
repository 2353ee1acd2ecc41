// Processing guard
//
// Disables every enabled component of a page for the duration of a
// long-running operation and restores exactly that subset afterwards, so
// components that were already disabled stay disabled.

use super::component::ComponentId;
use super::Page;
use crate::error::PageResult;
use std::future::Future;
use std::mem;
use tracing::{debug, warn};

/// Scoped disable-and-restore of a page's components
///
/// Prefer [`processing`], which always releases. A guard dropped without
/// [`ProcessingGuard::release`] still re-enables its components but cannot
/// re-render.
pub struct ProcessingGuard<'a, P: Page + ?Sized> {
    page: &'a P,
    disabled: Vec<ComponentId>,
}

impl<'a, P: Page + ?Sized> ProcessingGuard<'a, P> {
    /// Disable all enabled components and render once.
    pub async fn acquire(page: &'a P) -> PageResult<Self> {
        let disabled = page.core().disable_enabled();
        debug!(page = page.core().kind(), count = disabled.len(), "processing started");
        let guard = Self { page, disabled };
        // On error the guard drops here and re-enables
        guard.page.update_message().await?;
        Ok(guard)
    }

    /// Ids of the components this guard disabled
    pub fn disabled(&self) -> &[ComponentId] {
        &self.disabled
    }

    /// Re-enable the remembered components and render once more.
    pub async fn release(mut self) -> PageResult<()> {
        let ids = mem::take(&mut self.disabled);
        self.page.core().enable(&ids);
        debug!(page = self.page.core().kind(), count = ids.len(), "processing finished");
        self.page.update_message().await
    }
}

impl<P: Page + ?Sized> Drop for ProcessingGuard<'_, P> {
    fn drop(&mut self) {
        if !self.disabled.is_empty() {
            warn!(page = self.page.core().kind(), "processing guard dropped without release");
            self.page.core().enable(&self.disabled);
        }
    }
}

/// Run `operation` with the page's components disabled.
///
/// The components are restored whether or not the operation fails. An
/// operation error takes precedence over a failed restoring render.
pub async fn processing<P, T, F>(page: &P, operation: F) -> PageResult<T>
where
    P: Page + ?Sized,
    F: Future<Output = PageResult<T>>,
{
    let guard = ProcessingGuard::acquire(page).await?;
    let result = operation.await;
    let released = guard.release().await;
    let value = result?;
    released?;
    Ok(value)
}
