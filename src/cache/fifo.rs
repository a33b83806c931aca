//! FIFO Queue Module
//!
//! Tracks first-insertion order for cache eviction.

use std::collections::VecDeque;

// == FIFO Queue ==
/// Keys in the order they were first inserted.
///
/// - Front = oldest insertion
/// - Back = newest insertion
///
/// Unlike an LRU tracker, nothing ever moves a key once queued: reads and
/// re-insertions leave positions untouched.
#[derive(Debug, Default, Clone)]
pub struct FifoQueue {
    order: VecDeque<String>,
}

impl FifoQueue {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push Back ==
    /// Appends a newly inserted key at the tail.
    ///
    /// The caller guarantees `key` is not already queued.
    pub fn push_back(&mut self, key: impl Into<String>) {
        self.order.push_back(key.into());
    }

    // == Pop Front ==
    /// Removes and returns the oldest key.
    pub fn pop_front(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Peek Front ==
    /// Returns the oldest key without removing it.
    pub fn peek_front(&self) -> Option<&String> {
        self.order.front()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Iter ==
    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
}

impl FromIterator<String> for FifoQueue {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            order: iter.into_iter().collect(),
        }
    }
}
