//! Fixed-capacity circular buffers.
//!
//! [`RingBuffer`] is the raw container: O(1) push, O(1) indexed access
//! counting back from the newest element, O(len) snapshot. [`SumBuffer`]
//! wraps it with an incrementally maintained running sum/average and a
//! 3-point peak detector, unifying what the reference implementation split
//! across three near-identical hand-rolled buffers.

use crate::error::{Error, Result};

/// A fixed-capacity circular sequence of `T`, newest-first indexable.
///
/// Empty state is the sentinel `head = tail = None`. The first push sets
/// both to slot 0. Every later push advances `head` by one slot modulo
/// capacity; if the buffer was already full, `tail` advances too, dropping
/// the oldest element.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    values: Vec<Option<T>>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a buffer with the given capacity. Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be at least 1");
        Self {
            values: vec![None; capacity],
            head: None,
            tail: None,
        }
    }

    /// Buffer capacity (fixed for the lifetime of the buffer).
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Number of logically valid elements currently stored.
    pub fn len(&self) -> usize {
        match (self.head, self.tail) {
            (None, None) => 0,
            (Some(h), Some(t)) if h == t => 1,
            (Some(h), Some(t)) if h > t => h - t + 1,
            (Some(h), Some(t)) => (h + 1) + (self.values.len() - t),
            _ => unreachable!("head/tail sentinels must both be set or both unset"),
        }
    }

    /// True iff no element has ever been pushed (or the buffer was reset).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push a new newest element, evicting the oldest if the buffer is full.
    pub fn push(&mut self, x: T) {
        let capacity = self.values.len();
        match (self.head, self.tail) {
            (None, None) => {
                self.head = Some(0);
                self.tail = Some(0);
                self.values[0] = Some(x);
            }
            (Some(h), Some(t)) => {
                let new_head = (h + 1) % capacity;
                if t == new_head {
                    self.tail = Some((new_head + 1) % capacity);
                }
                self.values[new_head] = Some(x);
                self.head = Some(new_head);
            }
            _ => unreachable!("head/tail sentinels must both be set or both unset"),
        }
    }

    /// Read the `index`-th newest element, `index = 0` being the most
    /// recently pushed. Returns [`Error::IndexOutOfBounds`] if
    /// `index >= len()`.
    pub fn at(&self, index: usize) -> Result<T> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let capacity = self.values.len();
        let head = self.head.expect("len() > 0 implies head is set");
        let pos = (head + capacity - index) % capacity;
        Ok(self.values[pos].expect("logically valid slot must hold a value"))
    }

    /// Discard all stored elements, returning the buffer to its empty state.
    pub fn reset(&mut self) {
        self.head = None;
        self.tail = None;
    }

    /// Snapshot the logical contents, oldest first, newest last. O(len).
    pub fn data(&self) -> Vec<T> {
        let (Some(head), Some(tail)) = (self.head, self.tail) else {
            return Vec::new();
        };
        let capacity = self.values.len();
        if head >= tail {
            self.values[tail..=head]
                .iter()
                .map(|v| v.expect("logically valid slot must hold a value"))
                .collect()
        } else {
            let mut out = Vec::with_capacity(self.len());
            out.extend(
                self.values[tail..capacity]
                    .iter()
                    .map(|v| v.expect("logically valid slot must hold a value")),
            );
            out.extend(
                self.values[0..=head]
                    .iter()
                    .map(|v| v.expect("logically valid slot must hold a value")),
            );
            out
        }
    }
}

/// A [`RingBuffer<f64>`] that incrementally tracks its running sum/average
/// and exposes a 3-point peak test over its newest elements.
#[derive(Debug, Clone)]
pub struct SumBuffer {
    ring: RingBuffer<f64>,
    sum: f64,
}

impl SumBuffer {
    /// Create a summing buffer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            sum: 0.0,
        }
    }

    /// Push a new value, updating the running sum in O(1).
    ///
    /// When the buffer is not yet full, `sum += x`. When full, the push
    /// evicts the oldest element first; `sum += x - evicted`.
    pub fn push(&mut self, x: f64) {
        let evicted = if self.ring.len() == self.ring.capacity() {
            Some(self.ring.at(self.ring.len() - 1).expect("buffer is full"))
        } else {
            None
        };
        self.ring.push(x);
        self.sum += x - evicted.unwrap_or(0.0);
    }

    /// Number of logically valid elements currently stored.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// True iff no element has ever been pushed (or the buffer was reset).
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Current running sum of all logically valid elements.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Current running average, or 0.0 when empty.
    pub fn avg(&self) -> f64 {
        if self.ring.is_empty() {
            0.0
        } else {
            self.sum / self.ring.len() as f64
        }
    }

    /// Read the `index`-th newest element. See [`RingBuffer::at`].
    pub fn at(&self, index: usize) -> Result<f64> {
        self.ring.at(index)
    }

    /// Discard all stored elements and reset the running sum to zero.
    pub fn reset(&mut self) {
        self.ring.reset();
        self.sum = 0.0;
    }

    /// Snapshot the logical contents, oldest first. O(len).
    pub fn data(&self) -> Vec<f64> {
        self.ring.data()
    }

    /// Three-point peak test over the newest elements.
    ///
    /// Let `a, b, c` be the three newest values in oldest→newest logical
    /// order (`a` = 2 frames ago, `b` = 1 frame ago, `c` = newest). Returns
    /// `b` iff `a < b && b > c`; otherwise (including when `len() < 3`)
    /// returns 0.0.
    pub fn peak(&self) -> f64 {
        if self.ring.len() < 3 {
            return 0.0;
        }
        let c = self.ring.at(0).expect("len >= 3");
        let b = self.ring.at(1).expect("len >= 3");
        let a = self.ring.at(2).expect("len >= 3");
        if a < b && b > c { b } else { 0.0 }
    }
}
