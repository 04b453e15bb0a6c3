//! Per-encoder position counters and the diagnostic edge counter.
//!
//! Every counter is its own atomic word, so the decode path and the
//! read/reset path never wait on each other. A [`Snapshot`] copies the
//! counters one word at a time.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicI32, AtomicU32, Ordering};

/// Position counters for N encoders plus a raw edge counter.
///
/// # Example
///
/// ```rust
/// use rs_encoders::store::CountStore;
///
/// let store = CountStore::new(2);
/// store.add(0, 3);
/// store.add(1, -1);
/// store.record_edge();
///
/// let snap = store.snapshot();
/// assert_eq!(snap.counts, vec![3, -1]);
/// assert_eq!(snap.edges, 1);
///
/// store.reset();
/// assert_eq!(store.snapshot().counts, vec![0, 0]);
/// assert_eq!(store.edges(), 1);
/// ```
#[derive(Debug)]
pub struct CountStore {
    counts: Box<[AtomicI32]>,
    edges: AtomicU32,
}

impl CountStore {
    /// Creates a store with `encoders` zeroed counters.
    pub fn new(encoders: usize) -> Self {
        Self {
            counts: (0..encoders).map(|_| AtomicI32::new(0)).collect(),
            edges: AtomicU32::new(0),
        }
    }

    /// Number of counters.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if the store has no counters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Adds `delta` to counter `encoder`. Out-of-range indices are ignored.
    #[inline]
    pub fn add(&self, encoder: usize, delta: i32) {
        if let Some(count) = self.counts.get(encoder) {
            count.fetch_add(delta, Ordering::AcqRel);
        }
    }

    /// Bumps the diagnostic edge counter (wrapping).
    #[inline]
    pub fn record_edge(&self) {
        self.edges.fetch_add(1, Ordering::Relaxed);
    }

    /// Edges observed since the store was created.
    #[inline]
    pub fn edges(&self) -> u32 {
        self.edges.load(Ordering::Relaxed)
    }

    /// Current value of one counter.
    pub fn get(&self, encoder: usize) -> Option<i32> {
        self.counts.get(encoder).map(|c| c.load(Ordering::Acquire))
    }

    /// Copies every counter and the edge count without modifying them.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            edges: self.edges(),
            counts: self.counts.iter().map(|c| c.load(Ordering::Acquire)).collect(),
        }
    }

    /// Zeroes every position counter. The edge counter is kept.
    pub fn reset(&self) {
        for count in self.counts.iter() {
            count.store(0, Ordering::Release);
        }
    }
}

/// Point-in-time copy of a [`CountStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Raw edge notifications seen since start.
    pub edges: u32,
    /// Position counters, index = encoder id.
    pub counts: Vec<i32>,
}

impl Snapshot {
    /// Size of the binary encoding in bytes.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.counts.len() * core::mem::size_of::<i32>()
    }

    /// Writes the counters as little-endian `i32`s into the front of `buf`.
    ///
    /// Returns the number of bytes written, or `None` if `buf` is shorter
    /// than [`encoded_len`](Self::encoded_len). Nothing is written on failure.
    pub fn encode_into(&self, buf: &mut [u8]) -> Option<usize> {
        let len = self.encoded_len();
        let out = buf.get_mut(..len)?;
        for (chunk, count) in out.chunks_exact_mut(4).zip(&self.counts) {
            chunk.copy_from_slice(&count.to_le_bytes());
        }
        Some(len)
    }

    /// Binary encoding as an owned buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.counts.iter().flat_map(|c| c.to_le_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_zeroed() {
        let store = CountStore::new(3);
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());
        assert_eq!(
            store.snapshot(),
            Snapshot {
                edges: 0,
                counts: alloc::vec![0, 0, 0]
            }
        );
    }

    #[test]
    fn add_out_of_range_is_ignored() {
        let store = CountStore::new(1);
        store.add(5, 1);
        assert_eq!(store.get(0), Some(0));
        assert_eq!(store.get(5), None);
    }

    #[test]
    fn reset_keeps_edge_count() {
        let store = CountStore::new(2);
        store.add(0, 5);
        store.add(1, -3);
        store.record_edge();
        store.record_edge();

        store.reset();

        let snap = store.snapshot();
        assert_eq!(snap.counts, alloc::vec![0, 0]);
        assert_eq!(snap.edges, 2);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let store = CountStore::new(1);
        store.add(0, 7);
        let _ = store.snapshot();
        assert_eq!(store.get(0), Some(7));
    }

    #[test]
    fn encode_is_little_endian() {
        let snap = Snapshot {
            edges: 0,
            counts: alloc::vec![1, -1],
        };
        assert_eq!(snap.to_bytes(), alloc::vec![1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);

        let mut buf = [0u8; 10];
        assert_eq!(snap.encode_into(&mut buf), Some(8));
        assert_eq!(&buf[..8], snap.to_bytes().as_slice());
        assert_eq!(&buf[8..], &[0, 0]);
    }

    #[test]
    fn encode_into_short_buffer_writes_nothing() {
        let snap = Snapshot {
            edges: 0,
            counts: alloc::vec![5, 6],
        };
        let mut buf = [0xAAu8; 7];
        assert_eq!(snap.encode_into(&mut buf), None);
        assert_eq!(buf, [0xAA; 7]);
    }
}
