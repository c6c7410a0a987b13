//! Bounded, closable FIFO shared by the worker threads.

use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Multi-producer multi-consumer queue with a fixed capacity.
///
/// Closing the queue wakes every blocked caller: `pop` then returns `None`
/// and `push` hands the item back, even if items are still buffered.
#[derive(Debug)]
pub struct TaskQueue<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> TaskQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");

        TaskQueue {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    // The lock is never held across user code, so a poisoned lock still
    // guards a consistent deque.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item`, blocking while the queue is full.
    /// Returns the item back if the queue has been closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut inner = self.lock();
        while inner.items.len() >= self.capacity && !inner.closed {
            inner = self
                .not_full
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if inner.closed {
            return Err(item);
        }

        inner.items.push_back(item);
        drop(inner);
        self.not_empty.notify_one();

        Ok(())
    }

    /// Takes the oldest item, blocking while the queue is empty.
    /// Returns `None` once the queue has been closed.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.lock();
        loop {
            if inner.closed {
                return None;
            }

            if let Some(item) = inner.items.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Some(item);
            }

            inner = self
                .not_empty
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Closes the queue and drops any buffered items.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.items.clear();
        drop(inner);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;

    #[test]
    fn fifo_order() {
        let queue = TaskQueue::new(4);
        for i in 0..4 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.len(), 4);

        let popped: Vec<_> = (0..4).map(|_| queue.pop().unwrap()).collect();
        assert_eq!(popped, vec![0, 1, 2, 3]);
    }

    #[test]
    fn close_rejects_push_and_discards_items() {
        let queue = TaskQueue::new(2);
        queue.push(1).unwrap();
        queue.close();

        assert_eq!(queue.push(2), Err(2));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn close_wakes_blocked_consumers() {
        let queue = Arc::new(TaskQueue::<u32>::new(1));

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.close();

        for consumer in consumers {
            assert_eq!(consumer.join().unwrap(), None);
        }
    }

    #[test]
    fn full_queue_blocks_until_pop() {
        let queue = Arc::new(TaskQueue::new(1));
        queue.push(1).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(1));

        producer.join().unwrap().unwrap();
        assert_eq!(queue.pop(), Some(2));
    }
}
