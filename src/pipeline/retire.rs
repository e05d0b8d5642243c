//! Deferred release of superseded buffer sets.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Holds superseded values until their grace period ends.
///
/// Values are reference counted: releasing an entry only drops the
/// queue's own reference, so consumers still holding an `Arc` keep the
/// data alive for as long as they need it.
#[derive(Debug)]
pub struct RetirementQueue<T> {
    entries: VecDeque<(Instant, Arc<T>)>,
}

impl<T> Default for RetirementQueue<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T> RetirementQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `value` to be released at `deadline`.
    pub fn schedule(&mut self, value: Arc<T>, deadline: Instant) {
        self.entries.push_back((deadline, value));
    }

    /// Releases every entry whose deadline has passed. Returns how many were released.
    pub fn collect(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(deadline, _)| *deadline > now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|(deadline, _)| *deadline).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_collect_releases_expired_only() {
        let now = Instant::now();
        let mut queue = RetirementQueue::new();
        queue.schedule(Arc::new(1), now + Duration::from_secs(1));
        queue.schedule(Arc::new(2), now + Duration::from_secs(3));

        assert_eq!(queue.collect(now), 0);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next_deadline(), Some(now + Duration::from_secs(1)));

        assert_eq!(queue.collect(now + Duration::from_secs(2)), 1);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.collect(now + Duration::from_secs(5)), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn test_held_values_outlive_release() {
        let now = Instant::now();
        let mut queue = RetirementQueue::new();
        let value = Arc::new(vec![1u8, 2, 3]);
        let consumer = Arc::clone(&value);
        queue.schedule(value, now);

        assert_eq!(Arc::strong_count(&consumer), 2);
        queue.collect(now + Duration::from_millis(1));
        assert_eq!(Arc::strong_count(&consumer), 1);
        assert_eq!(*consumer, vec![1, 2, 3]);
    }
}
