//! Bump allocator for entry payloads.
//!
//! Payload bytes are appended to large `String` slabs. A slab is never grown
//! past the capacity it was created with, so text already handed out never
//! moves; a full slab is parked and a fresh one started. Nothing is freed
//! until the allocator itself is dropped. The allocator is only ever reached
//! through `&mut`, so callers serialize on whatever owns it (the name table's
//! writer mutex).

use std::mem;

pub(crate) struct EntryAllocator {
    slab_size: usize,
    current: String,
    full: Vec<String>,
    used_bytes: usize,
    reserved_bytes: usize,
}

impl EntryAllocator {
    pub fn new(slab_size: usize) -> EntryAllocator {
        EntryAllocator {
            slab_size,
            current: String::new(),
            full: Vec::new(),
            used_bytes: 0,
            reserved_bytes: 0,
        }
    }

    /// Copies `text` into the current slab, starting a new one when it doesn't fit.
    ///
    /// The returned str is not really `'static`: it lives as long as the
    /// allocator. Owners must not let it escape past that.
    pub fn alloc_str(&mut self, text: &str) -> &'static str {
        debug_assert!(!text.is_empty(), "empty names never reach the allocator");

        if self.current.capacity() - self.current.len() < text.len() {
            self.start_slab(text.len());
        }

        let interned = {
            let start = self.current.len();
            self.current.push_str(text);
            &self.current[start..]
        };
        self.used_bytes += text.len();

        // SAFETY: the slab had room for `text`, so push_str did not reallocate,
        // and slabs are only dropped together with the allocator
        unsafe { &*(interned as *const str) }
    }

    fn start_slab(&mut self, at_least: usize) {
        let slab = String::with_capacity(self.slab_size.max(at_least));

        tracing::debug!(
            capacity = slab.capacity(),
            slabs = self.slab_count() + 1,
            "allocating name entry slab"
        );

        self.reserved_bytes += slab.capacity();
        let old = mem::replace(&mut self.current, slab);
        if old.capacity() > 0 {
            self.full.push(old);
        }
    }

    pub fn slab_count(&self) -> usize {
        self.full.len() + (self.current.capacity() > 0) as usize
    }

    /// Bytes handed out to entries.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Bytes reserved in slabs, used or not.
    pub fn reserved_bytes(&self) -> usize {
        self.reserved_bytes
    }
}
