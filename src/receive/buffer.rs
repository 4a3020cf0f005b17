use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Fixed-capacity byte ring holding PCM ready for immediate output.
///
/// Both halves of the ring live together because every access already
/// happens under the jitter buffer's lock. Writing into a full ring and
/// reading from an empty one are byte counts, never errors.
pub struct RingStore {
    // we could ask the ring for its capacity, but keeping it here makes
    // accidental reallocation obvious in review
    capacity: usize,
    prod: HeapProducer<u8>,
    cons: HeapConsumer<u8>,
}

impl RingStore {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring store capacity must be non-zero");

        let (prod, cons) = HeapRb::<u8>::new(capacity).split();
        RingStore { capacity, prod, cons }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.cons.len()
    }

    /// Appends as much of `data` as fits, returning the number of bytes
    /// written. Bytes that do not fit are discarded by the caller.
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.prod.push_slice(data)
    }

    /// Drains up to `out.len()` bytes, returning how many were copied.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        self.cons.pop_slice(out)
    }

    pub fn clear(&mut self) {
        let len = self.cons.len();
        self.cons.skip(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around() {
        let mut ring = RingStore::with_capacity(4);
        let mut out = [0u8; 3];

        assert_eq!(ring.write(&[1, 2, 3]), 3);
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(out, [1, 2, 3]);

        assert_eq!(ring.write(&[4, 5, 6]), 3);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.read(&mut out), 3);
        assert_eq!(out, [4, 5, 6]);
    }

    #[test]
    fn overflow_and_underflow_are_counts() {
        let mut ring = RingStore::with_capacity(4);
        assert_eq!(ring.write(&[1, 2, 3, 4, 5, 6]), 4);

        let mut out = [0u8; 6];
        assert_eq!(ring.read(&mut out), 4);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
        assert_eq!(ring.read(&mut out), 0);
    }

    #[test]
    fn clear_discards_pending_bytes() {
        let mut ring = RingStore::with_capacity(8);
        ring.write(&[1, 2, 3]);
        ring.clear();
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.capacity(), 8);
    }
}
