//! Binary min-heap keyed by a float priority
//!
//! Unlike `std::collections::BinaryHeap` this needs no `Ord` on the item and
//! takes the priority as a plain `f32`. There is no decrease-key: callers
//! re-enqueue with the new priority and skip stale entries on dequeue.

use thiserror::Error;

/// Returned when dequeuing from an empty queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("priority queue is empty")]
pub struct EmptyQueueError;

/// A min-priority queue over `(item, priority)` pairs.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    heap: Vec<(T, f32)>,
}

impl<T> PriorityQueue<T> {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Create an empty queue with room for `capacity` entries
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries, duplicates included
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Insert `item` with `priority`. O(log n).
    pub fn enqueue(&mut self, item: T, priority: f32) {
        self.heap.push((item, priority));
        self.sift_up(self.heap.len() - 1);
    }

    /// Remove and return the lowest-priority item. O(log n).
    ///
    /// # Errors
    ///
    /// Returns [`EmptyQueueError`] when the queue has no entries.
    pub fn dequeue(&mut self) -> Result<T, EmptyQueueError> {
        if self.heap.is_empty() {
            return Err(EmptyQueueError);
        }

        let (item, _) = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok(item)
    }

    /// Lowest priority currently queued
    #[must_use]
    pub fn peek_priority(&self) -> Option<f32> {
        self.heap.first().map(|(_, priority)| *priority)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.heap[idx].1 >= self.heap[parent].1 {
                break;
            }
            self.heap.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.heap.len();

        loop {
            let left = idx * 2 + 1;
            let right = left + 1;

            if left >= len {
                break;
            }

            let smallest = if right < len && self.heap[right].1 < self.heap[left].1 {
                right
            } else {
                left
            };

            if self.heap[idx].1 <= self.heap[smallest].1 {
                break;
            }

            self.heap.swap(idx, smallest);
            idx = smallest;
        }
    }
}

impl<T: PartialEq> PriorityQueue<T> {
    /// Linear scan for `item`. O(n); keep a side set when that matters.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.heap.iter().any(|(queued, _)| queued == item)
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dequeue_returns_minimum() {
        let mut queue = PriorityQueue::new();
        for (item, priority) in [("e", 5.0), ("b", 2.0), ("d", 4.0), ("a", 1.0), ("c", 3.0)] {
            queue.enqueue(item, priority);
        }
        assert_eq!(queue.len(), 5);

        let drained: Vec<_> = std::iter::from_fn(|| queue.dequeue().ok()).collect();
        assert_eq!(drained, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_empty_dequeue_fails() {
        let mut queue: PriorityQueue<u32> = PriorityQueue::new();
        assert_eq!(queue.dequeue(), Err(EmptyQueueError));

        queue.enqueue(7, 1.0);
        assert_eq!(queue.dequeue(), Ok(7));
        assert_eq!(queue.dequeue(), Err(EmptyQueueError));
    }

    #[test]
    fn test_interleaved_operations_keep_heap_order() {
        let mut queue = PriorityQueue::new();
        let mut reference: Vec<f32> = Vec::new();

        // Deterministic pseudo-random priorities
        let mut seed = 17_u32;
        for step in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let priority = (seed >> 16) as f32 / 100.0;

            if step % 3 == 2 {
                let popped = queue.dequeue().unwrap();
                reference.sort_by(f32::total_cmp);
                let expected = reference.remove(0);
                assert_eq!(popped, expected);
            } else {
                queue.enqueue(priority, priority);
                reference.push(priority);
            }
            assert_eq!(queue.len(), reference.len());
        }
    }

    #[test]
    fn test_duplicates_allowed() {
        let mut queue = PriorityQueue::new();
        queue.enqueue(1, 10.0);
        queue.enqueue(1, 3.0);

        assert_eq!(queue.len(), 2);
        assert!(queue.contains(&1));
        assert!(!queue.contains(&2));
        assert_eq!(queue.peek_priority(), Some(3.0));
    }
}
