// kestrel_core/src/measurement/queue.rs

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Default number of updates a queue holds before it starts evicting the oldest one.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<T>,
    /// 0 means unbounded.
    capacity: usize,
    dropped: u64,
}

/// A FIFO buffer of updates waiting for the next processing tick.
///
/// Cloning a queue yields another handle to the same buffer, so producers on
/// other threads can push while the tick loop drains. When `capacity` is
/// reached the oldest update is evicted to make room: a push never fails.
#[derive(Debug)]
pub struct PendingQueue<T> {
    label: Arc<str>,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for PendingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PendingQueue<T> {
    pub fn new(label: &str, capacity: usize) -> Self {
        Self {
            label: Arc::from(label),
            inner: Arc::new(Mutex::new(Inner {
                items: VecDeque::new(),
                capacity,
                dropped: 0,
            })),
        }
    }

    /// Appends `item`. Returns the evicted update if the queue was full.
    pub fn push(&self, item: T) -> Option<T> {
        let mut inner = self.inner.lock();
        let evicted = if inner.capacity > 0 && inner.items.len() >= inner.capacity {
            inner.dropped += 1;
            inner.items.pop_front()
        } else {
            None
        };
        inner.items.push_back(item);

        if evicted.is_some() {
            debug!(
                queue = %self.label,
                capacity = inner.capacity,
                "pending queue full, dropped the oldest update"
            );
        }
        evicted
    }

    /// Removes and returns every queued item in arrival order.
    pub fn drain(&self) -> Vec<T> {
        self.inner.lock().items.drain(..).collect()
    }

    pub fn clear(&self) {
        self.inner.lock().items.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Changes the bound; if the queue is over the new bound, the oldest items go.
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.inner.lock();
        inner.capacity = capacity;
        if capacity > 0 {
            while inner.items.len() > capacity {
                inner.items.pop_front();
                inner.dropped += 1;
            }
        }
    }

    /// Total number of updates evicted because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }
}

/// A producer handle for one measurement's queue.
///
/// Cheap to clone and safe to move to sensor threads.
#[derive(Debug)]
pub struct UpdateSender<T> {
    queue: PendingQueue<T>,
}

impl<T> Clone for UpdateSender<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
        }
    }
}

impl<T> UpdateSender<T> {
    pub(crate) fn new(queue: PendingQueue<T>) -> Self {
        Self { queue }
    }

    pub fn send(&self, update: T) {
        self.queue.push(update);
    }
}
