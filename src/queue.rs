use std::collections::VecDeque;
use std::sync::Mutex;

/// FIFO dispatch order for submitted tasks.
///
/// The queue carries ids only; the registry holds the task data. Keeping
/// dispatch order in its own structure makes the ordering explicit instead of
/// depending on map iteration order.
#[derive(Debug, Default)]
pub struct DispatchQueue {
    ids: Mutex<VecDeque<u64>>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` to the tail.
    pub fn enqueue(&self, id: u64) {
        self.ids.lock().unwrap().push_back(id);
    }

    /// Remove and return the head, oldest submission first.
    pub fn dequeue(&self) -> Option<u64> {
        self.ids.lock().unwrap().pop_front()
    }

    /// Number of ids waiting for the worker.
    pub fn len(&self) -> usize {
        self.ids.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dequeue_returns_ids_in_submission_order() {
        let queue = DispatchQueue::new();
        queue.enqueue(3);
        queue.enqueue(1);
        queue.enqueue(2);

        assert_eq!(queue.dequeue(), Some(3));
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(2));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn len_tracks_enqueued_ids() {
        let queue = DispatchQueue::new();
        assert!(queue.is_empty());
        queue.enqueue(1);
        queue.enqueue(2);
        assert_eq!(queue.len(), 2);
        queue.dequeue();
        assert_eq!(queue.len(), 1);
    }
}
