//! Fixed-capacity sliding window of recent triples for live display.
//!
//! Backed by a single `VecDeque` preallocated to capacity. When the window is
//! full, each push evicts exactly one element from the front, so the length
//! never exceeds capacity and a push costs O(1).

use crate::types::Triple;
use std::collections::VecDeque;

/// Default number of triples kept for display.
pub const CAPACITY: usize = 120;

/// Sliding window over the most recent triples, oldest first.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    points: VecDeque<Triple>,
    capacity: usize,
}

impl WindowBuffer {
    /// Create a window holding [`CAPACITY`] triples.
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY)
    }

    /// Create a window holding `capacity` triples (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a triple, evicting the oldest one if the window is full.
    #[inline]
    pub fn push(&mut self, triple: Triple) {
        self.points.push_back(triple);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Owned copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Triple> {
        self.points.iter().copied().collect()
    }

    /// One axis (0 = x, 1 = y, 2 = z) of the current contents, oldest first.
    ///
    /// Axis indices above 2 yield the z axis.
    pub fn axis(&self, axis: usize) -> Vec<f64> {
        self.points
            .iter()
            .map(|&(x, y, z)| match axis {
                0 => x,
                1 => y,
                _ => z,
            })
            .collect()
    }

    /// Iterate over the contents without copying, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.points.iter()
    }

    /// Most recent triple.
    pub fn latest(&self) -> Option<Triple> {
        self.points.back().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.points.len() == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all contents, keeping the allocation.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for WindowBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<Triple> for WindowBuffer {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.push(triple);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(v: f64) -> Triple {
        (v, v * 10.0, v * 100.0)
    }

    #[test]
    fn test_push_below_capacity_keeps_order() {
        let mut window = WindowBuffer::new();
        for i in 0..5 {
            window.push(t(i as f64));
        }
        assert_eq!(window.len(), 5);
        assert!(!window.is_full());
        assert_eq!(
            window.snapshot(),
            vec![t(0.0), t(1.0), t(2.0), t(3.0), t(4.0)]
        );
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut window = WindowBuffer::new();
        for i in 1..=130 {
            window.push(t(i as f64));
        }
        assert_eq!(window.len(), CAPACITY);
        assert!(window.is_full());
        let xs = window.axis(0);
        let expected: Vec<f64> = (11..=130).map(|i| i as f64).collect();
        assert_eq!(xs, expected);
    }

    #[test]
    fn test_snapshot_idempotent() {
        let mut window = WindowBuffer::with_capacity(3);
        window.extend([t(1.0), t(2.0)]);
        assert_eq!(window.snapshot(), window.snapshot());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut window = WindowBuffer::with_capacity(3);
        window.push(t(1.0));
        let before = window.snapshot();
        window.push(t(2.0));
        assert_eq!(before, vec![t(1.0)]);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut window = WindowBuffer::with_capacity(0);
        assert_eq!(window.capacity(), 1);
        window.push(t(1.0));
        window.push(t(2.0));
        assert_eq!(window.snapshot(), vec![t(2.0)]);
    }

    #[test]
    fn test_axis_projection() {
        let mut window = WindowBuffer::with_capacity(4);
        window.push((1.0, 2.0, 3.0));
        window.push((4.0, 5.0, 6.0));
        assert_eq!(window.axis(0), vec![1.0, 4.0]);
        assert_eq!(window.axis(1), vec![2.0, 5.0]);
        assert_eq!(window.axis(2), vec![3.0, 6.0]);
    }

    #[test]
    fn test_latest_and_clear() {
        let mut window = WindowBuffer::new();
        assert_eq!(window.latest(), None);
        window.push(t(7.0));
        assert_eq!(window.latest(), Some(t(7.0)));
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), CAPACITY);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_window_holds_last_pushes(
            values in prop::collection::vec(-1000.0f64..1000.0, 0..400),
            capacity in 1usize..200
        ) {
            let mut window = WindowBuffer::with_capacity(capacity);
            for &v in &values {
                window.push((v, 0.0, 0.0));
                // Property: length never exceeds capacity
                prop_assert!(window.len() <= capacity);
            }
            let start = values.len().saturating_sub(capacity);
            prop_assert_eq!(window.axis(0), values[start..].to_vec());
        }
    }
}
