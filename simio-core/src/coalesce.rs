use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::frontend::FrontEnd;

/// Batches outbound text for an interactive front end.
///
/// Deliveries are spaced at least `interval` apart; anything arriving in
/// between is held in `pending` and goes out with the next delivery. The
/// first window opens with the first chunk, so a burst at program start is
/// batched as well.
#[derive(Debug)]
pub struct OutputCoalescer {
    pending: String,
    next_flush: Option<Instant>,
    interval: Duration,
}

impl OutputCoalescer {
    pub fn new(interval: Duration) -> Self {
        OutputCoalescer {
            pending: String::new(),
            next_flush: None,
            interval,
        }
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn push(&mut self, chunk: &str) -> Option<String> {
        self.push_at(chunk, Instant::now())
    }

    /// Accept `chunk` at `now`; returns the text to deliver, if any.
    ///
    /// The first chunk of a session is held, not delivered immediately: it
    /// opens the first window.
    pub fn push_at(&mut self, chunk: &str, now: Instant) -> Option<String> {
        let next = *self.next_flush.get_or_insert(now + self.interval);
        if now < next {
            self.pending.push_str(chunk);
            crate::trace::coalesce(format_args!("held {} bytes, {} pending", chunk.len(), self.pending.len()));
            return None;
        }

        let mut out = mem::take(&mut self.pending);
        out.push_str(chunk);
        self.next_flush = Some(now + self.interval);
        Some(out)
    }

    pub fn flush(&mut self, force: bool) -> Option<String> {
        self.flush_at(force, Instant::now())
    }

    /// Release pending text if forced or if the window has elapsed.
    pub fn flush_at(&mut self, force: bool, now: Instant) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        if !force && self.next_flush.is_some_and(|next| now < next) {
            return None;
        }

        self.next_flush = Some(now + self.interval);
        crate::trace::coalesce(format_args!("flush {} bytes (force={})", self.pending.len(), force));
        Some(mem::take(&mut self.pending))
    }

    /// Drop pending text and reopen the first window.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.next_flush = None;
    }
}

/// Run `op` on the coalescer and post whatever it releases.
///
/// The lock is held across the post so two deliveries can never overtake
/// each other.
pub(crate) fn deliver(
    coalescer: &Mutex<OutputCoalescer>,
    sink: &dyn FrontEnd,
    op: impl FnOnce(&mut OutputCoalescer) -> Option<String>,
) {
    let mut guard = coalescer.lock();
    if let Some(text) = op(&mut guard) {
        sink.post_output(&text);
    }
}

/// Thread-safe flush access for a host thread (e.g. a UI timer).
#[derive(Clone)]
pub struct CoalescerHandle {
    pub(crate) coalescer: Arc<Mutex<OutputCoalescer>>,
    pub(crate) sink: Arc<dyn FrontEnd>,
}

impl CoalescerHandle {
    pub fn flush(&self, force: bool) {
        deliver(&self.coalescer, self.sink.as_ref(), |c| c.flush(force));
    }
}
