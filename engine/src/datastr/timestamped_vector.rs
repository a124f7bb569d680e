//! A fast resettable vector based on timestamps.
//!
//! Used for the per query scratch state of the searches (distances, settled marks),
//! so starting a new query does not have to touch every node.

use std::ops::{Index, IndexMut};

/// A fast resettable vector based on 32bit timestamps.
/// The elements can be modified through the index traits.
/// Other modifications are not permitted.
#[derive(Debug, Clone)]
pub struct TimestampedVector<T> {
    data: Vec<T>,
    // timestamp for current iteration. Up to date values will have this one
    current: u32,
    // current timestamp for each entry.
    timestamps: Vec<u32>,
    default: T,
}

impl<T: Clone> TimestampedVector<T> {
    /// Create a new `TimestampedVector` with `size` elements of the default
    pub fn new(size: usize, default: T) -> TimestampedVector<T> {
        TimestampedVector {
            data: vec![default.clone(); size],
            current: 0,
            timestamps: vec![0; size],
            default,
        }
    }

    /// Reset all elements to the default.
    /// Amortized O(1).
    pub fn reset(&mut self) {
        let (new, overflow) = self.current.overflowing_add(1);
        self.current = new;

        // on overflow old timestamps may become valid again
        if overflow {
            for element in &mut self.data {
                *element = self.default.clone();
            }
            for timestamp in &mut self.timestamps {
                *timestamp = new;
            }
        }
    }

    /// Update an individual element.
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
        self.timestamps[index] = self.current;
    }

    /// Number of elements in the data structure
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Are there no elements in the data structure
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Index<usize> for TimestampedVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        if self.timestamps[index] == self.current {
            &self.data[index]
        } else {
            &self.default
        }
    }
}

impl<T: Clone> IndexMut<usize> for TimestampedVector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        if self.timestamps[index] != self.current {
            self.set(index, self.default.clone());
        }
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_defaults() {
        let mut v = TimestampedVector::new(4, u32::MAX);
        v.set(1, 5);
        v[3] = 7;
        assert_eq!((v[0], v[1], v[3]), (u32::MAX, 5, 7));
        v.reset();
        assert!((0..4).all(|i| v[i] == u32::MAX));
        v[1] += 0;
        assert_eq!(v[1], u32::MAX);
    }

    #[test]
    fn survives_timestamp_overflow() {
        let mut v = TimestampedVector::new(2, false);
        v.set(0, true);
        v.current = u32::MAX;
        v.set(1, true);
        v.reset();
        assert!(!v[0]);
        assert!(!v[1]);
    }
}
