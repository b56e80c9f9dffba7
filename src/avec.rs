use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use once_cell::sync::OnceCell;

/// An index-addressed vector whose slots never move.
///
/// Storage is split into fixed-size chunks. A chunk is allocated whole the
/// first time an index inside it is reserved and is published exactly once,
/// so readers can index into it without any lock while a writer keeps growing
/// the vector.
///
/// Growth (`reserve`) must be serialized by the caller; `get` and `len` may be
/// called from any thread at any time.
pub struct AtomicVec<T> {
    chunks: Box<[OnceCell<Box<[T]>>]>,
    chunk_shift: u32,
    len: AtomicUsize,
    reserving: AtomicBool,
}

impl<T: Default> AtomicVec<T> {
    pub fn new(chunk_size: usize, max_chunks: usize) -> AtomicVec<T> {
        assert!(
            chunk_size.is_power_of_two(),
            "AtomicVec chunk size must be a power of two, got {chunk_size}"
        );

        AtomicVec {
            chunks: (0..max_chunks).map(|_| OnceCell::new()).collect(),
            chunk_shift: chunk_size.trailing_zeros(),
            len: AtomicUsize::new(0),
            reserving: AtomicBool::new(false),
        }
    }

    pub fn chunk_size(&self) -> usize {
        1 << self.chunk_shift
    }

    pub fn capacity(&self) -> usize {
        self.chunks.len() << self.chunk_shift
    }

    /// Number of reserved slots.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn allocated_chunks(&self) -> usize {
        self.chunks.iter().take_while(|c| c.get().is_some()).count()
    }

    /// Reserves `count` consecutive slots and returns the first index.
    ///
    /// Callers must not reserve from two threads at once. Running past the
    /// capacity chosen at construction is fatal.
    pub fn reserve(&self, count: usize) -> usize {
        let was_reserving = self.reserving.swap(true, Ordering::Acquire);
        assert!(!was_reserving, "AtomicVec::reserve entered concurrently");

        let start = self.len.load(Ordering::Relaxed);
        let end = start
            .checked_add(count)
            .filter(|&end| end <= self.capacity())
            .unwrap_or_else(|| {
                tracing::error!(
                    start,
                    count,
                    capacity = self.capacity(),
                    "entry table capacity exhausted"
                );
                panic!(
                    "Exceeded AtomicVec capacity of {} slots (needed {})",
                    self.capacity(),
                    start.saturating_add(count)
                )
            });

        if end > start {
            let first_chunk = start >> self.chunk_shift;
            let last_chunk = (end - 1) >> self.chunk_shift;

            for chunk in first_chunk..=last_chunk {
                self.touch(chunk);
            }
        }

        self.len.store(end, Ordering::Release);
        self.reserving.store(false, Ordering::Release);

        start
    }

    fn touch(&self, chunk: usize) -> &[T] {
        self.chunks[chunk].get_or_init(|| {
            tracing::debug!(chunk, size = self.chunk_size(), "allocating entry table chunk");
            (0..self.chunk_size()).map(|_| T::default()).collect()
        })
    }

    /// The slot at `idx`, if it has been reserved.
    pub fn get(&self, idx: usize) -> Option<&T> {
        if idx >= self.len() {
            return None;
        }

        let chunk = self.chunks.get(idx >> self.chunk_shift)?.get()?;
        chunk.get(idx & (self.chunk_size() - 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len()).filter_map(move |idx| self.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn reserve_allocates_whole_chunks() {
        let v: AtomicVec<AtomicU32> = AtomicVec::new(4, 8);
        assert_eq!(v.capacity(), 32);
        assert!(v.get(0).is_none());

        assert_eq!(v.reserve(1), 0);
        assert_eq!(v.allocated_chunks(), 1);

        assert_eq!(v.reserve(6), 1);
        assert_eq!(v.len(), 7);
        assert_eq!(v.allocated_chunks(), 2);

        assert!(v.get(6).is_some());
        assert!(v.get(7).is_none());
    }

    #[test]
    fn slots_keep_their_address_across_growth() {
        let v: AtomicVec<AtomicU32> = AtomicVec::new(2, 64);
        v.reserve(1);

        let first = v.get(0).unwrap() as *const AtomicU32;
        v.get(0).unwrap().store(42, Ordering::Relaxed);

        for _ in 0..100 {
            v.reserve(1);
        }

        assert_eq!(first, v.get(0).unwrap() as *const AtomicU32);
        assert_eq!(v.get(0).unwrap().load(Ordering::Relaxed), 42);
    }

    #[test]
    #[should_panic(expected = "Exceeded AtomicVec capacity")]
    fn exhausting_capacity_is_fatal() {
        let v: AtomicVec<AtomicU32> = AtomicVec::new(2, 2);
        v.reserve(4);
        v.reserve(1);
    }

    #[test]
    #[should_panic(expected = "entered concurrently")]
    fn overlapping_reserve_is_fatal() {
        let v: AtomicVec<AtomicU32> = AtomicVec::new(4, 4);
        // as if another writer were still inside reserve
        v.reserving.store(true, Ordering::Release);
        v.reserve(1);
    }

    #[test]
    fn iter_walks_reserved_slots_in_order() {
        let v: AtomicVec<AtomicU32> = AtomicVec::new(2, 8);
        for i in 0..5 {
            let idx = v.reserve(1);
            v.get(idx).unwrap().store(i * 10, Ordering::Relaxed);
        }

        let values: Vec<u32> = v.iter().map(|slot| slot.load(Ordering::Relaxed)).collect();
        assert_eq!(values, [0, 10, 20, 30, 40]);
    }

    #[test]
    fn readers_see_reserved_slots_while_growing() {
        let v: AtomicVec<AtomicU32> = AtomicVec::new(16, 256);

        crossbeam::thread::scope(|s| {
            s.spawn(|_| {
                for i in 0..2000u32 {
                    let idx = v.reserve(1);
                    v.get(idx).unwrap().store(i + 1, Ordering::Release);
                }
            });

            for _ in 0..4 {
                s.spawn(|_| {
                    for _ in 0..200 {
                        let len = v.len();
                        for idx in 0..len {
                            let value = v.get(idx).unwrap().load(Ordering::Acquire);
                            assert!(value == 0 || value == idx as u32 + 1);
                        }
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(v.len(), 2000);
    }
}
