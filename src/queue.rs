use crossbeam::queue::SegQueue;

/// The external MPMC queue collaborator. Push/pop must be lock-free (or at
/// least non-blocking) since the scheduler polls these every loop
/// iteration.
pub trait Queue<T>: Send + Sync {
    fn push(&self, item: T);
    fn pop(&self) -> Option<T>;
}

/// Reference implementation backed by a lock-free Michael-Scott queue.
pub struct SegQueueAdapter<T> {
    inner: SegQueue<T>,
}

impl<T> Default for SegQueueAdapter<T> {
    fn default() -> Self {
        Self {
            inner: SegQueue::new(),
        }
    }
}

impl<T: Send + Sync> Queue<T> for SegQueueAdapter<T> {
    fn push(&self, item: T) {
        self.inner.push(item);
    }

    fn pop(&self) -> Option<T> {
        self.inner.pop()
    }
}
