//! Single-slot "latest value" channel between the tick loop and the renderer.
//!
//! Publishing replaces whatever the slot holds, so a slow consumer skips
//! frames instead of building a backlog. Receiving blocks on a condition
//! variable until a value arrives or every sender is gone.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use crossbeam_channel::{RecvTimeoutError, TryRecvError};
use famiview_core::{FrameSnapshot, SnapshotSink};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

struct Slot<T> {
    value: Option<T>,
    senders: usize,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

/// Creates a connected sender/receiver pair with an empty slot.
pub fn mailbox<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            value: None,
            senders: 1,
        }),
        ready: Condvar::new(),
    });
    (
        MailboxSender {
            shared: Arc::clone(&shared),
        },
        MailboxReceiver { shared },
    )
}

pub struct MailboxSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> MailboxSender<T> {
    /// Stores `value`, replacing any unread value. Returns `true` when an
    /// unread value was discarded.
    pub fn publish(&self, value: T) -> bool {
        let mut slot = self.shared.slot.lock();
        let displaced = slot.value.replace(value).is_some();
        drop(slot);
        self.shared.ready.notify_one();
        displaced
    }
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        self.shared.slot.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for MailboxSender<T> {
    fn drop(&mut self) {
        let mut slot = self.shared.slot.lock();
        slot.senders -= 1;
        if slot.senders == 0 {
            drop(slot);
            self.shared.ready.notify_all();
        }
    }
}

impl SnapshotSink for MailboxSender<Arc<FrameSnapshot>> {
    fn publish(&self, snapshot: Arc<FrameSnapshot>) {
        let frame = snapshot.frame();
        if MailboxSender::publish(self, snapshot) {
            trace!(frame, "replaced unconsumed snapshot");
        }
    }
}

pub struct MailboxReceiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> MailboxReceiver<T> {
    /// Blocks until a value is available. Returns `None` once the slot is
    /// empty and every sender has been dropped.
    pub fn recv(&self) -> Option<T> {
        let mut slot = self.shared.slot.lock();
        loop {
            if let Some(value) = slot.value.take() {
                return Some(value);
            }
            if slot.senders == 0 {
                return None;
            }
            self.shared.ready.wait(&mut slot);
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.slot.lock();
        loop {
            if let Some(value) = slot.value.take() {
                return Ok(value);
            }
            if slot.senders == 0 {
                return Err(RecvTimeoutError::Disconnected);
            }
            if self.shared.ready.wait_until(&mut slot, deadline).timed_out() {
                return slot.value.take().ok_or(RecvTimeoutError::Timeout);
            }
        }
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut slot = self.shared.slot.lock();
        match slot.value.take() {
            Some(value) => Ok(value),
            None if slot.senders == 0 => Err(TryRecvError::Disconnected),
            None => Err(TryRecvError::Empty),
        }
    }
}
