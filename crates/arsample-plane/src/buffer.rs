/// Reusable scratch storage whose capacity only ever doubles.
///
/// The logical capacity is tracked separately from the backing `Vec` so the
/// growth schedule is exact: starting from the initial capacity, it doubles
/// until the requested length fits and is never reduced.
#[derive(Clone, Debug)]
pub struct DoublingBuffer<T> {
    data: Vec<T>,
    capacity: usize,
}

impl<T> DoublingBuffer<T> {
    /// Create a buffer with `initial` elements of capacity (at least 1).
    pub fn with_capacity(initial: usize) -> Self {
        let capacity = initial.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Empty the buffer and make room for `required` elements.
    ///
    /// Returns `true` when the storage had to be reallocated.
    pub fn reset_for(&mut self, required: usize) -> bool {
        self.data.clear();
        if required <= self.capacity {
            return false;
        }
        let mut capacity = self.capacity;
        while capacity < required {
            capacity = capacity.checked_mul(2).unwrap_or(required);
        }
        self.data = Vec::with_capacity(capacity);
        self.capacity = capacity;
        true
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        debug_assert!(self.data.len() < self.capacity, "push past reserved capacity");
        self.data.push(value);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}
