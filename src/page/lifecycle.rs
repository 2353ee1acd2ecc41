//! Page lifecycle and the inactivity watchdog
//!
//! Every page tracks two things: whether it has stopped, and when it last
//! saw activity. The watchdog is armed on the first render of a page whose
//! type has a timeout and keeps only a weak link, so it never keeps a page
//! alive:
//!
//! ```text
//! render ──arm──▶ watchdog ──(idle ≥ TIMEOUT)──▶ time_out(page)
//!                    ▲                             │ timeout hooks
//!   dispatch ─touch──┘                             │ Page::on_timeout
//!                                                  ▼ Page::stop
//! ```
//!
//! Activity on a child also counts for its ancestors, so a parent suspended
//! under a child in use keeps running.

use super::Page;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Stop flag and activity clock of one page
#[derive(Debug)]
pub struct Lifecycle {
    stopped: watch::Sender<bool>,
    activity: watch::Sender<Instant>,
    armed: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        let (activity, _) = watch::channel(Instant::now());
        Self {
            stopped,
            activity,
            armed: AtomicBool::new(false),
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Mark the page stopped. Returns `false` if it already was.
    pub(crate) fn finish(&self) -> bool {
        self.stopped.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub async fn stopped(&self) {
        let mut rx = self.stopped.subscribe();
        until_stopped(&mut rx).await;
    }

    /// Record activity, pushing the inactivity deadline back
    pub fn touch(&self) {
        self.activity.send_replace(Instant::now());
    }

    pub fn last_activity(&self) -> Instant {
        *self.activity.borrow()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

async fn until_stopped(rx: &mut watch::Receiver<bool>) {
    // Err only when the sender is gone, which also means the page is gone
    let _ = rx.wait_for(|stopped| *stopped).await;
}

enum Wake {
    Deadline,
    Activity,
    Finished,
}

/// Record activity on `page` and every parent above it.
pub(crate) fn touch_lineage(page: &Arc<dyn Page>) {
    page.core().lifecycle().touch();
    let mut next = page.core().parent().ok().flatten();
    while let Some(parent) = next {
        parent.core().lifecycle().touch();
        next = parent.core().parent().ok().flatten();
    }
}

/// Record activity and start the watchdog if it isn't running yet.
pub(crate) fn arm(page: &Arc<dyn Page>) {
    let core = page.core();
    let lifecycle = core.lifecycle();
    lifecycle.touch();

    let Some(timeout) = core.timeout() else {
        return;
    };
    if lifecycle.is_stopped() || lifecycle.armed.swap(true, Ordering::AcqRel) {
        return;
    }

    let kind = core.kind();
    let weak = Arc::downgrade(page);
    let mut activity = lifecycle.activity.subscribe();
    let mut stopped = lifecycle.stopped.subscribe();
    debug!(page = kind, ?timeout, "watchdog armed");

    tokio::spawn(async move {
        loop {
            let deadline = *activity.borrow_and_update() + timeout;
            let wake = tokio::select! {
                _ = tokio::time::sleep_until(deadline) => Wake::Deadline,
                changed = activity.changed() => match changed {
                    Ok(()) => Wake::Activity,
                    Err(_) => Wake::Finished,
                },
                _ = until_stopped(&mut stopped) => Wake::Finished,
            };

            match wake {
                Wake::Deadline if activity.has_changed().unwrap_or(false) => continue,
                Wake::Deadline => break,
                Wake::Activity => continue,
                Wake::Finished => return,
            }
        }

        if let Some(page) = weak.upgrade() {
            time_out(page).await;
        } else {
            debug!(page = kind, "watchdog expired after page was dropped");
        }
    });
}

/// End `page` because it went inactive.
///
/// Runs the timeout hooks registered on the core, then
/// [`Page::on_timeout`], then stops the page. Hosts that track inactivity
/// themselves call this directly. Does nothing for a stopped page.
pub async fn time_out(page: Arc<dyn Page>) {
    let core = page.core();
    if core.is_stopped() {
        return;
    }
    info!(page = core.kind(), "page timed out");

    core.run_timeout_hooks().await;
    if let Err(error) = page.on_timeout().await {
        warn!(page = core.kind(), %error, "timeout handler failed");
    }
    page.stop();
}
