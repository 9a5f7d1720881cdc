//! services/reader/src/session/scroll.rs
//!
//! The scroll-and-highlight controller: turns a `ScrollTo` side effect into
//! viewport work. It waits for the target element to render, scrolls it into
//! a centered position, pulses a transient emphasis and clears it again.
//!
//! Each request supersedes the previous one via a `CancellationToken`. While
//! a programmatic scroll is in flight the controller's gate is up, and the
//! session drops scroll samples so the synchronizer only ever sees
//! user-driven scrolling.

use quran_reader_core::ports::{ScrollTarget, Viewport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How often and how long to poll for a target that has not rendered yet.
const ELEMENT_RETRY_LIMIT: u32 = 10;
const ELEMENT_RETRY_DELAY: Duration = Duration::from_millis(100);
/// How long the smooth scroll is given to settle before samples flow again.
const SCROLL_SETTLE: Duration = Duration::from_millis(400);
const EMPHASIS_DURATION: Duration = Duration::from_secs(2);

pub struct ScrollController {
    viewport: Arc<dyn Viewport>,
    /// Count of gated scroll phases in flight. Non-zero means "we are
    /// scrolling the page", as opposed to the user.
    in_flight: Arc<AtomicUsize>,
    active: Option<CancellationToken>,
}

impl ScrollController {
    pub fn new(viewport: Arc<dyn Viewport>) -> Self {
        Self {
            viewport,
            in_flight: Arc::new(AtomicUsize::new(0)),
            active: None,
        }
    }

    /// Whether a programmatic scroll is currently in flight.
    pub fn is_programmatic(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Queue a scroll to `target`, superseding any request still running.
    pub fn request(&mut self, target: ScrollTarget) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        self.active = Some(token.clone());

        // Raised here, synchronously, so samples arriving before the task is
        // polled are already suppressed.
        let gate = GateGuard::raise(&self.in_flight);
        let viewport = self.viewport.clone();
        tokio::spawn(drive(viewport, target, token, gate));
    }
}

async fn drive(
    viewport: Arc<dyn Viewport>,
    target: ScrollTarget,
    token: CancellationToken,
    gate: GateGuard,
) {
    let scrolled = tokio::select! {
        _ = token.cancelled() => {
            // May have been cancelled mid-pulse; clearing is idempotent.
            viewport.set_emphasis(target, false).await;
            false
        }
        scrolled = scroll_phase(viewport.as_ref(), target) => scrolled,
    };
    drop(gate);
    if !scrolled {
        return;
    }

    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(EMPHASIS_DURATION) => {}
    }
    viewport.set_emphasis(target, false).await;
}

/// The gated part: locate, scroll, emphasize, settle. Returns `false` when
/// the target never rendered (content still fetching, or gone for good);
/// abandoned silently per the error policy.
async fn scroll_phase(viewport: &dyn Viewport, target: ScrollTarget) -> bool {
    let mut attempts = 0;
    while !viewport.is_rendered(target).await {
        attempts += 1;
        if attempts > ELEMENT_RETRY_LIMIT {
            debug!(?target, "scroll target never rendered, giving up");
            return false;
        }
        tokio::time::sleep(ELEMENT_RETRY_DELAY).await;
    }

    viewport.scroll_into_view(target).await;
    viewport.set_emphasis(target, true).await;
    tokio::time::sleep(SCROLL_SETTLE).await;
    true
}

/// Keeps the in-flight count honest whichever way the gated phase exits.
struct GateGuard(Arc<AtomicUsize>);

impl GateGuard {
    fn raise(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count.clone())
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
