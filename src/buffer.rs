use std::fmt::Debug;
use std::ops::Deref;

/// Fixed-capacity byte buffer that is filled incrementally, then frozen
/// into a [`Segment`].
pub struct ByteBuffer {
    alloc: Box<[u8]>,
    length: usize,
}

impl ByteBuffer {
    pub fn allocate(capacity: usize) -> Self {
        let alloc = bytemuck::allocation::zeroed_slice_box(capacity);
        ByteBuffer { alloc, length: 0 }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.alloc.len()
    }

    pub fn full(&self) -> bool {
        self.length == self.capacity()
    }

    /// Appends as much of `data` as fits, returning the number of bytes taken.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let free = self.capacity() - self.length;
        let copy_len = std::cmp::min(free, data.len());
        self.alloc[self.length..][..copy_len].copy_from_slice(&data[..copy_len]);
        self.length += copy_len;
        copy_len
    }

    /// Zero-fills the unwritten tail and freezes the whole capacity into a
    /// segment.
    pub fn freeze_padded(mut self) -> Segment {
        let length = self.length;
        self.alloc[length..].fill(0);
        Segment(self.alloc)
    }
}

impl Debug for ByteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.deref().fmt(f)
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.alloc[0..self.length]
    }
}

/// One fixed-length interval of decoded PCM. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Segment(Box<[u8]>);

impl Segment {
    pub fn silence(len: usize) -> Self {
        Segment(bytemuck::allocation::zeroed_slice_box(len))
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Segment(bytes.into())
    }

    pub fn is_silent(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl From<Vec<u8>> for Segment {
    fn from(bytes: Vec<u8>) -> Self {
        Segment(bytes.into_boxed_slice())
    }
}

impl Deref for Segment {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("len", &self.0.len())
            .field("silent", &self.is_silent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_stops_at_capacity() {
        let mut buffer = ByteBuffer::allocate(4);
        assert_eq!(buffer.write(&[1, 2, 3]), 3);
        assert!(!buffer.full());
        assert_eq!(buffer.write(&[4, 5, 6]), 1);
        assert!(buffer.full());
        assert_eq!(&buffer[..], &[1, 2, 3, 4]);
    }

    #[test]
    fn freeze_pads_tail_with_zeroes() {
        let mut buffer = ByteBuffer::allocate(4);
        buffer.write(&[7]);

        let segment = buffer.freeze_padded();
        assert_eq!(&segment[..], &[7, 0, 0, 0]);
        assert!(!segment.is_silent());
        assert!(Segment::silence(8).is_silent());
    }
}
