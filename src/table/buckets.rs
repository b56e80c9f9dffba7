//! Hash chains over the entry table.
//!
//! Each bucket is the head of a singly linked, append-only chain of entry ids.
//! The links live next to the entries (`EntrySlot::hash_next`) so the chain is
//! addressed purely by id. Every link is written exactly once, from "empty" to
//! an id, with a compare-and-swap; a reader walking a chain sees either the end
//! of the chain or a fully published entry.

use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::OnceCell;

use crate::avec::AtomicVec;
use crate::entry::EntryRecord;
use crate::name::NameEntryId;

/// Terminates a chain. Never a valid id, the config keeps ids below it.
const CHAIN_END: u32 = u32::MAX;

/// One id's worth of storage in the entry table.
pub(crate) struct EntrySlot {
    pub record: OnceCell<EntryRecord>,
    hash_next: AtomicU32,
}

impl Default for EntrySlot {
    fn default() -> Self {
        EntrySlot {
            record: OnceCell::new(),
            hash_next: AtomicU32::new(CHAIN_END),
        }
    }
}

impl EntrySlot {
    fn next(&self) -> Option<NameEntryId> {
        match self.hash_next.load(Ordering::Acquire) {
            CHAIN_END => None,
            raw => Some(NameEntryId::from_raw(raw)),
        }
    }
}

struct Bucket {
    head: AtomicU32,
    // only touched with the writer lock held
    tail: AtomicU32,
}

pub(crate) struct HashBuckets {
    buckets: Box<[Bucket]>,
    mask: u32,
}

impl HashBuckets {
    pub fn new(count: usize) -> HashBuckets {
        assert!(count.is_power_of_two(), "bucket count must be a power of two");

        HashBuckets {
            buckets: (0..count)
                .map(|_| Bucket {
                    head: AtomicU32::new(CHAIN_END),
                    tail: AtomicU32::new(CHAIN_END),
                })
                .collect(),
            mask: (count - 1) as u32,
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    fn bucket(&self, hash: u32) -> &Bucket {
        &self.buckets[(hash & self.mask) as usize]
    }

    /// Walks the chain for `hash` without taking any lock.
    pub fn chain<'a>(
        &'a self,
        hash: u32,
        entries: &'a AtomicVec<EntrySlot>,
    ) -> Chain<'a> {
        self.chain_at((hash & self.mask) as usize, entries)
    }

    pub fn chain_at<'a>(&'a self, bucket: usize, entries: &'a AtomicVec<EntrySlot>) -> Chain<'a> {
        let next = match self.buckets[bucket].head.load(Ordering::Acquire) {
            CHAIN_END => None,
            raw => Some(NameEntryId::from_raw(raw)),
        };

        Chain { entries, next }
    }

    /// Appends `id` to the tail of its chain.
    ///
    /// The writer lock must be held, and the entry's record must already be
    /// published so that readers following the new link find it complete.
    pub fn link(&self, hash: u32, id: NameEntryId, entries: &AtomicVec<EntrySlot>) {
        let bucket = self.bucket(hash);
        let tail = bucket.tail.load(Ordering::Relaxed);

        let link = match tail {
            CHAIN_END => &bucket.head,
            tail => {
                &entries
                    .get(tail as usize)
                    .unwrap_or_else(|| panic!("bucket tail {tail} is not a reserved entry"))
                    .hash_next
            }
        };

        if let Err(found) =
            link.compare_exchange(CHAIN_END, id.raw(), Ordering::AcqRel, Ordering::Acquire)
        {
            panic!("hash chain link already set to {found} while appending {id}");
        }

        bucket.tail.store(id.raw(), Ordering::Relaxed);
    }
}

pub(crate) struct Chain<'a> {
    entries: &'a AtomicVec<EntrySlot>,
    next: Option<NameEntryId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (NameEntryId, &'a EntryRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;

        let slot = self
            .entries
            .get(id.index())
            .unwrap_or_else(|| panic!("hash chain points at unreserved entry {id}"));
        let record = slot
            .record
            .get()
            .unwrap_or_else(|| panic!("hash chain points at unpublished entry {id}"));

        self.next = slot.next();
        Some((id, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::EntryAllocator;
    use crate::entry::Encoding;

    fn publish(
        entries: &AtomicVec<EntrySlot>,
        alloc: &mut EntryAllocator,
        text: &str,
    ) -> NameEntryId {
        let idx = entries.reserve(1);
        let record = EntryRecord::new(alloc.alloc_str(text), Encoding::of(text));
        assert!(entries.get(idx).unwrap().record.set(record).is_ok());
        NameEntryId::from_raw(idx as u32)
    }

    fn texts(buckets: &HashBuckets, hash: u32, entries: &AtomicVec<EntrySlot>) -> Vec<String> {
        buckets
            .chain(hash, entries)
            .map(|(_, record)| record.text().to_owned())
            .collect()
    }

    #[test]
    fn chains_keep_insertion_order() {
        let entries = AtomicVec::new(4, 4);
        let mut alloc = EntryAllocator::new(64);
        let buckets = HashBuckets::new(4);

        // 1 and 5 share bucket 1, 2 is alone in bucket 2
        for (text, hash) in [("one", 1), ("two", 2), ("five", 5), ("nine", 9)] {
            let id = publish(&entries, &mut alloc, text);
            buckets.link(hash, id, &entries);
        }

        assert_eq!(texts(&buckets, 1, &entries), ["one", "five", "nine"]);
        assert_eq!(texts(&buckets, 2, &entries), ["two"]);
        assert!(texts(&buckets, 3, &entries).is_empty());

        let ids: Vec<u32> = buckets.chain(13, &entries).map(|(id, _)| id.raw()).collect();
        assert_eq!(ids, [0, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "already set")]
    fn relinking_an_entry_is_rejected() {
        let entries = AtomicVec::new(4, 4);
        let mut alloc = EntryAllocator::new(64);
        let buckets = HashBuckets::new(2);

        let a = publish(&entries, &mut alloc, "a");
        let b = publish(&entries, &mut alloc, "b");
        buckets.link(0, a, &entries);
        buckets.link(0, b, &entries);

        // forge a stale tail: appending after `a` again would overwrite its link
        buckets.buckets[0].tail.store(a.raw(), Ordering::Relaxed);
        buckets.link(0, b, &entries);
    }
}
