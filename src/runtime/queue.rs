use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

/// Unbounded async FIFO queue.
///
/// Unlike a tokio mpsc channel, the queue itself is shared: a respawned
/// worker picks up exactly where its predecessor left off, and producers
/// never hold a receiver half.  Single-consumer semantics are by
/// convention, matching the runtime's one-worker-per-agent model.
pub struct Queue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.notify.notify_one();
    }

    /// Await the next item.
    pub async fn pop(&self) -> T {
        loop {
            if let Some(item) = self.lock().pop_front() {
                return item;
            }
            self.notify.notified().await;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discard all queued items, returning how many were dropped.
    pub fn drain(&self) -> usize {
        let mut items = self.lock();
        let count = items.len();
        items.clear();
        count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<T>> {
        // A poisoned queue mutex only happens if a push/pop panicked while
        // holding it, which no code path does; recover rather than poison
        // every later caller.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
