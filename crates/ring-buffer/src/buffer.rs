//! Fixed-Capacity Byte Ring Implementation

/// Default buffer capacity (bytes)
pub const DEFAULT_CAPACITY: usize = 256;

/// Fixed-capacity FIFO of bytes that evicts the oldest byte on overflow.
///
/// The ring is not synchronized. Producer and consumer share it behind a
/// single lock owned by the caller.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// Pre-allocated storage
    storage: Box<[u8]>,
    /// Index of the oldest byte
    head: usize,
    /// Number of buffered bytes
    len: usize,
    /// Total bytes pushed since creation or the last `clear`
    total_written: usize,
}

impl RingBuffer {
    /// Create a new ring buffer with given capacity
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be > 0");
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Create a buffer with default capacity (256 bytes)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push a byte into the buffer (overwrites oldest if full)
    pub fn push(&mut self, byte: u8) {
        let capacity = self.capacity();
        let tail = (self.head + self.len) % capacity;
        self.storage[tail] = byte;

        if self.len == capacity {
            // Full: the slot just written held the oldest byte
            self.head = (self.head + 1) % capacity;
        } else {
            self.len += 1;
        }
        self.total_written += 1;
    }

    /// Push every byte of a slice, in order
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Get the number of bytes currently in the buffer
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Iterate buffered bytes oldest first without consuming them
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len).map(move |i| self.storage[(self.head + i) % self.capacity()])
    }

    /// Remove and return every buffered byte, oldest first
    pub fn drain_all(&mut self) -> Vec<u8> {
        let bytes: Vec<u8> = self.iter().collect();
        self.head = 0;
        self.len = 0;
        bytes
    }

    /// Get total bytes written (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Clear the buffer and its statistics
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.total_written = 0;
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
