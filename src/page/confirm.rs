// Confirmation page
//
// Two buttons, Confirm and Cancel. Awaiting outcome() yields the answer,
// or a timeout error if the page went inactive first.

use super::base::{CallbackOptions, PageBuilder, PageCore};
use super::component::{ButtonStyle, Component, ComponentId};
use super::layout::MAX_ROWS;
use super::{FromTarget, Page, PageKind};
use crate::error::{PageError, PageResult};
use crate::host::RenderTarget;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub const CONFIRM: ComponentId = ComponentId::new("confirm:yes");
pub const CANCEL: ComponentId = ComponentId::new("confirm:no");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Pending,
    Answered(bool),
    TimedOut,
}

pub struct ConfirmationPage {
    core: PageCore,
    decision: watch::Sender<Decision>,
}

impl ConfirmationPage {
    pub fn new(target: Option<RenderTarget>) -> Arc<Self> {
        Self::with_styles(target, ButtonStyle::Success, ButtonStyle::Danger)
    }

    pub fn with_styles(
        target: Option<RenderTarget>,
        confirm_style: ButtonStyle,
        cancel_style: ButtonStyle,
    ) -> Arc<Self> {
        let row = (MAX_ROWS - 1) as u8;
        Arc::new_cyclic(|me| Self {
            core: PageBuilder::new(me, target)
                .component_with(
                    Component::button(CONFIRM, "Confirm").style(confirm_style).row(row),
                    CallbackOptions::new().skip_refresh(),
                    |page: Arc<Self>, ctx| async move {
                        ctx.defer().await?;
                        page.answer(true);
                        Ok(())
                    },
                )
                .component_with(
                    Component::button(CANCEL, "Cancel").style(cancel_style).row(row),
                    CallbackOptions::new().skip_refresh(),
                    |page: Arc<Self>, ctx| async move {
                        ctx.defer().await?;
                        page.answer(false);
                        Ok(())
                    },
                )
                .on_timeout(|page: Arc<Self>| async move {
                    page.settle(Decision::TimedOut);
                })
                // Stopped from outside without an answer counts as cancel
                .on_stop(|page: Arc<Self>| {
                    page.settle(Decision::Answered(false));
                })
                .build(),
            decision: watch::channel(Decision::Pending).0,
        })
    }

    fn settle(&self, decision: Decision) -> bool {
        self.decision.send_if_modified(|current| {
            if *current == Decision::Pending {
                *current = decision;
                true
            } else {
                false
            }
        })
    }

    fn answer(&self, confirmed: bool) {
        if self.settle(Decision::Answered(confirmed)) {
            debug!(confirmed, "confirmation answered");
        }
        self.stop();
    }

    pub fn is_answered(&self) -> bool {
        *self.decision.borrow() != Decision::Pending
    }

    /// Wait for the user's answer.
    ///
    /// `Ok(true)` for Confirm, `Ok(false)` for Cancel, and
    /// [`PageError::TimedOut`] if the page timed out unanswered.
    pub async fn outcome(&self) -> PageResult<bool> {
        let mut rx = self.decision.subscribe();
        let decision = rx
            .wait_for(|d| *d != Decision::Pending)
            .await
            .map(|d| *d)
            .unwrap_or(Decision::TimedOut);

        match decision {
            Decision::Answered(confirmed) => Ok(confirmed),
            Decision::TimedOut | Decision::Pending => Err(PageError::TimedOut(self.core.kind())),
        }
    }
}

#[async_trait]
impl Page for ConfirmationPage {
    fn core(&self) -> &PageCore {
        &self.core
    }
}

impl PageKind for ConfirmationPage {}

impl FromTarget for ConfirmationPage {
    fn from_target(target: Option<RenderTarget>) -> Arc<Self> {
        Self::new(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Interaction;
    use crate::page::{lifecycle, ComponentKind};
    use crate::testing::{mock_surface, USER};

    #[tokio::test]
    async fn test_confirm_and_cancel() {
        for (button, expected) in [(CONFIRM, true), (CANCEL, false)] {
            let (host, surface) = mock_surface();
            let page = ConfirmationPage::new(Some(RenderTarget::new(surface.clone(), None)));
            page.update_message().await.unwrap();

            let handle = surface
                .dispatch(Interaction::press(1, USER, button))
                .expect("dispatched");
            handle.await.unwrap().unwrap();

            assert_eq!(page.outcome().await.unwrap(), expected);
            assert!(page.core().is_stopped());
            assert_eq!(host.defers().len(), 1);
            // No refresh after answering
            assert_eq!(host.edits().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let page = ConfirmationPage::new(None);
        let dyn_page: Arc<dyn Page> = page.clone();

        lifecycle::time_out(dyn_page).await;

        assert!(matches!(
            page.outcome().await,
            Err(PageError::TimedOut("ConfirmationPage"))
        ));
    }

    #[tokio::test]
    async fn test_outcome_waits_for_answer() {
        let page = ConfirmationPage::new(None);
        let waiter = {
            let page = page.clone();
            tokio::spawn(async move { page.outcome().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        page.answer(true);
        assert!(waiter.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_custom_styles() {
        let page = ConfirmationPage::with_styles(None, ButtonStyle::Primary, ButtonStyle::Secondary);
        let confirm = page.core().component(&CONFIRM).unwrap();
        assert!(matches!(
            confirm.kind,
            ComponentKind::Button {
                style: ButtonStyle::Primary,
                ..
            }
        ));
    }
}
