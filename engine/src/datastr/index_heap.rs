//! A priority queue implemented with a binary heap.
//!
//! Insertion and popping the minimal element have `O(log n)` time complexity.
//! Checking the minimal element is `O(1)`. Keys of elements in the heap can
//! be decreased in `O(log n)`, the position of each element is tracked in an index.
//!
//! # Examples
//!
//! ```
//! use p2p_router::datastr::index_heap::{Indexing, IndexdMinHeap};
//!
//! #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
//! pub struct State {
//!     pub distance: usize,
//!     pub node: usize,
//! }
//!
//! // The `Indexing` traits needs to be implemented as well, so we can find elements to decrease their key.
//! impl Indexing for State {
//!     fn as_index(&self) -> usize {
//!         self.node as usize
//!     }
//! }
//!
//! let mut heap = IndexdMinHeap::new(3);
//! heap.push(State { node: 0, distance: 42 });
//! heap.push(State { node: 1, distance: 23 });
//! heap.push(State { node: 2, distance: 50000 });
//! assert_eq!(heap.peek().cloned(), Some(State { node: 1, distance: 23 }));
//! heap.decrease_key(State { node: 0, distance: 1 });
//! assert_eq!(heap.pop(), Some(State { node: 0, distance: 1 }));
//! ```

/// A trait to map elements in a heap to a unique index.
/// The element type of the `IndexdMinHeap` has to implement this trait.
pub trait Indexing {
    /// This method has to map a heap element to a unique `usize` index.
    fn as_index(&self) -> usize;
}

/// A priority queue where the elements are IDs from 0 to id_count-1 where id_count is a number that is set in the constructor.
/// The elements are sorted ascending by the ordering defined by the `Ord` trait.
/// The interface mirros the standard library BinaryHeap (except for the reversed order).
/// Ties between equal elements are broken arbitrarily.
#[derive(Debug, Clone)]
pub struct IndexdMinHeap<T> {
    positions: Vec<usize>,
    data: Vec<T>,
}

const TREE_ARITY: usize = 2;
const INVALID_POSITION: usize = std::usize::MAX;

impl<T: Ord + Indexing> IndexdMinHeap<T> {
    /// Creates an empty `IndexdMinHeap` as a min-heap.
    /// The indices (as defined by the `Indexing` trait) of all inserted elements
    /// will have to be between in `[0, max_index)`
    pub fn new(max_id: usize) -> IndexdMinHeap<T> {
        IndexdMinHeap {
            positions: vec![INVALID_POSITION; max_id],
            data: Vec::new(),
        }
    }

    /// Build a heap from arbitrary elements in linear time.
    /// Panics if two elements share an index.
    pub fn from_entries(max_id: usize, entries: impl IntoIterator<Item = T>) -> IndexdMinHeap<T> {
        let data: Vec<T> = entries.into_iter().collect();
        let mut positions = vec![INVALID_POSITION; max_id];
        for (position, element) in data.iter().enumerate() {
            assert_eq!(positions[element.as_index()], INVALID_POSITION, "duplicate heap index");
            positions[element.as_index()] = position;
        }

        let mut heap = IndexdMinHeap { positions, data };
        // sift down every inner node, starting with the last one
        if heap.len() > 1 {
            for position in (0..=(heap.len() - 2) / TREE_ARITY).rev() {
                heap.move_down_in_tree(position);
            }
        }
        heap
    }

    /// Returns the length of the binary heap.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if the binary heap is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the heap already contains an element mapped to the given index
    pub fn contains_index(&self, id: usize) -> bool {
        self.positions[id] != INVALID_POSITION
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.data.get(self.positions[id])
    }

    /// Drops all items from the heap.
    pub fn clear(&mut self) {
        for element in &self.data {
            self.positions[element.as_index()] = INVALID_POSITION;
        }
        self.data.clear();
    }

    /// Returns a reference to the smallest item in the heap, or None if it is empty.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Removes the smallest item from the binary heap and returns it, or None if it is empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let last = self.len() - 1;
        self.swap_elements(0, last);
        let item = self.data.pop()?;
        self.positions[item.as_index()] = INVALID_POSITION;
        if !self.is_empty() {
            self.move_down_in_tree(0);
        }
        Some(item)
    }

    /// Pushes an item onto the binary heap.
    /// Panics if an element with the same index already exists.
    pub fn push(&mut self, element: T) {
        assert!(!self.contains_index(element.as_index()));
        let insert_position = self.len();
        self.positions[element.as_index()] = insert_position;
        self.data.push(element);
        self.move_up_in_tree(insert_position);
    }

    /// Updates the key of an element already contained in the heap.
    /// Panics if the element is not contained or the new key is larger than the old one.
    pub fn decrease_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        assert_ne!(position, INVALID_POSITION, "decrease_key on element not in heap");
        assert!(element <= self.data[position], "decrease_key with larger key");
        self.data[position] = element;
        self.move_up_in_tree(position);
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        self.positions.swap(self.data[a].as_index(), self.data[b].as_index());
        self.data.swap(a, b);
    }

    fn move_up_in_tree(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / TREE_ARITY;

            if self.data[parent] <= self.data[position] {
                break;
            }

            self.swap_elements(parent, position);
            position = parent;
        }
    }

    fn move_down_in_tree(&mut self, mut position: usize) {
        let heap_size = self.len();
        loop {
            let first_child = TREE_ARITY * position + 1;
            let last_child = std::cmp::min(first_child + TREE_ARITY, heap_size);
            let smallest_child = match (first_child..last_child).min_by(|&a, &b| self.data[a].cmp(&self.data[b])) {
                Some(child) => child,
                None => return, // no children at all
            };

            if self.data[smallest_child] >= self.data[position] {
                return; // no child is smaller
            }

            self.swap_elements(smallest_child, position);
            position = smallest_child;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
    struct State {
        distance: u32,
        node: usize,
    }

    impl Indexing for State {
        fn as_index(&self) -> usize {
            self.node
        }
    }

    fn drain(heap: &mut IndexdMinHeap<State>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(State { distance, .. }) = heap.pop() {
            out.push(distance);
        }
        out
    }

    #[test]
    fn pops_in_ascending_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys: Vec<u32> = (0..200).map(|_| rng.gen_range(0..50)).collect();
        let mut heap = IndexdMinHeap::new(keys.len());
        for (node, &distance) in keys.iter().enumerate() {
            heap.push(State { distance, node });
        }
        assert_eq!(heap.len(), 200);

        let mut expected = keys;
        expected.sort_unstable();
        assert_eq!(drain(&mut heap), expected);
        assert!(heap.is_empty());
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn heapify_and_decrease_key() {
        let entries = [(0, 17), (1, 3), (2, 99), (3, 8), (4, 3), (5, 41)];
        let mut heap = IndexdMinHeap::from_entries(8, entries.iter().map(|&(node, distance)| State { distance, node }));
        assert_eq!(heap.peek().map(|s| s.distance), Some(3));
        assert!(heap.contains_index(5));
        assert!(!heap.contains_index(6));

        heap.decrease_key(State { distance: 1, node: 2 });
        heap.decrease_key(State { distance: 7, node: 5 });
        assert_eq!(heap.pop(), Some(State { distance: 1, node: 2 }));
        assert!(!heap.contains_index(2));
        assert_eq!(drain(&mut heap), vec![3, 3, 7, 8, 17]);
    }

    #[test]
    fn clear_resets_positions() {
        let mut heap = IndexdMinHeap::new(4);
        heap.push(State { distance: 5, node: 1 });
        heap.push(State { distance: 2, node: 3 });
        heap.clear();
        assert!(heap.is_empty());
        assert!(!heap.contains_index(1));
        heap.push(State { distance: 9, node: 1 });
        assert_eq!(heap.get(1), Some(&State { distance: 9, node: 1 }));
    }

    #[test]
    #[should_panic]
    fn decrease_key_rejects_larger_keys() {
        let mut heap = IndexdMinHeap::new(2);
        heap.push(State { distance: 5, node: 0 });
        heap.decrease_key(State { distance: 6, node: 0 });
    }
}
