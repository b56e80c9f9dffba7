//! The interned name table.
//!
//! Lookups walk lock-free hash chains; only a true miss takes the writer lock,
//! re-checks, and publishes a new entry. Entries are never changed or removed
//! once published, so any id handed out stays valid for the table's lifetime.

pub(crate) mod buckets;

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use parking_lot::Mutex;

use crate::alloc::EntryAllocator;
use crate::avec::AtomicVec;
use crate::config::NameTableConfig;
use crate::ename;
use crate::entry::{
    case_insensitive_hash, case_sensitive_hash, cmp_ignore_case, CaseMode, Encoding, EntryRecord,
    NameEntry,
};
use crate::errors::Result;
use crate::name::{Name, NameEntryId, NAME_NO_NUMBER};
use crate::split::split_number;

use buckets::{EntrySlot, HashBuckets};

/// Interned in place of names longer than the configured limit.
pub const NAME_SIZE_EXCEEDED: &str = "ERROR_NAME_SIZE_EXCEEDED";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FindMode {
    Find,
    Create,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NameTableStats {
    pub entries: usize,
    pub narrow_entries: usize,
    pub wide_entries: usize,
    /// Bytes of character data stored for all entries.
    pub payload_bytes: usize,
    pub slabs: usize,
    pub slab_bytes: usize,
    pub allocated_chunks: usize,
}

/// Distribution of one hash index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketReport {
    pub mode: CaseMode,
    pub bucket_count: usize,
    pub used_buckets: usize,
    pub longest_chain: usize,
    pub entries: usize,
}

#[derive(Default)]
struct Counters {
    narrow: AtomicUsize,
    wide: AtomicUsize,
    payload_bytes: AtomicUsize,
    slabs: AtomicUsize,
    slab_bytes: AtomicUsize,
}

pub struct NameTable {
    config: NameTableConfig,
    entries: AtomicVec<EntrySlot>,
    comparison_index: HashBuckets,
    display_index: Option<HashBuckets>,
    writer: Mutex<EntryAllocator>,
    counters: Counters,
}

impl NameTable {
    /// Builds a table and registers the well-known names.
    pub fn new(config: NameTableConfig) -> Result<NameTable> {
        Self::with_bootstrap(config, &ename::bootstrap_names())
    }

    /// Builds a table whose first entries are `bootstrap`, in order, with
    /// `bootstrap[0]` expected to be `None`.
    pub(crate) fn with_bootstrap(
        config: NameTableConfig,
        bootstrap: &[&'static str],
    ) -> Result<NameTable> {
        config.validate()?;
        Ok(Self::from_validated(config, bootstrap))
    }

    fn from_validated(config: NameTableConfig, bootstrap: &[&'static str]) -> NameTable {
        let table = NameTable {
            entries: AtomicVec::new(config.chunk_size as usize, config.max_chunks as usize),
            comparison_index: HashBuckets::new(config.bucket_count),
            display_index: config
                .case_preserving
                .then(|| HashBuckets::new(config.bucket_count)),
            writer: Mutex::new(EntryAllocator::new(config.slab_size)),
            counters: Counters::default(),
            config,
        };

        tracing::info!(
            bucket_count = table.config.bucket_count,
            max_ids = table.config.max_ids(),
            case_preserving = table.config.case_preserving,
            "initializing name table"
        );

        ename::register_bootstrap_names(&table, bootstrap);

        table
    }

    pub fn config(&self) -> &NameTableConfig {
        &self.config
    }

    pub fn is_case_preserving(&self) -> bool {
        self.config.case_preserving
    }

    /// Number of ids handed out so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interns `text`, splitting a trailing `_N` into the number.
    pub fn name(&self, text: &str) -> Name {
        self.make(text, None, FindMode::Create)
    }

    /// Interns `text` verbatim with the given internal number.
    pub fn name_with_number(&self, text: &str, number: u32) -> Name {
        self.make(text, Some(number), FindMode::Create)
    }

    /// Like [`name`](Self::name) but never creates an entry; unknown text
    /// gives [`Name::NONE`].
    pub fn find(&self, text: &str) -> Name {
        self.make(text, None, FindMode::Find)
    }

    pub fn find_with_number(&self, text: &str, number: u32) -> Name {
        self.make(text, Some(number), FindMode::Find)
    }

    fn make(&self, text: &str, explicit_number: Option<u32>, mode: FindMode) -> Name {
        // an explicit number means the caller already split, never split twice
        let (plain, number) = match explicit_number {
            Some(number) => (text, number),
            None => split_number(text).unwrap_or((text, NAME_NO_NUMBER)),
        };

        if plain.is_empty() {
            return Name::NONE.with_number(number);
        }

        let len = plain.chars().count();
        if len > self.config.max_name_len {
            tracing::error!(
                len,
                max = self.config.max_name_len,
                "name too long, substituting {NAME_SIZE_EXCEEDED}"
            );
            return self.resolve(
                NAME_SIZE_EXCEEDED,
                NAME_NO_NUMBER,
                case_insensitive_hash(NAME_SIZE_EXCEEDED),
                None,
                mode,
            );
        }

        self.resolve(plain, number, case_insensitive_hash(plain), None, mode)
    }

    /// Finds or creates the comparison entry for `plain`, then the display
    /// entry when its casing differs and the table preserves case.
    pub(crate) fn resolve(
        &self,
        plain: &str,
        number: u32,
        comparison_hash: u32,
        display_hash: Option<u32>,
        mode: FindMode,
    ) -> Name {
        let insensitive = CaseMode::Insensitive;
        let comparison = match mode {
            FindMode::Create => self.find_or_insert_hashed(plain, comparison_hash, insensitive),
            FindMode::Find => match self.find_entry_hashed(plain, comparison_hash, insensitive) {
                Some(id) => id,
                None => return Name::NONE,
            },
        };

        if !self.config.case_preserving || self.entry_text(comparison) == plain {
            return Name::from_ids(comparison, comparison, number);
        }

        let display_hash = display_hash.unwrap_or_else(|| case_sensitive_hash(plain));
        let display = match mode {
            FindMode::Create => self.find_or_insert_hashed(plain, display_hash, CaseMode::Sensitive),
            FindMode::Find => self
                .find_entry_hashed(plain, display_hash, CaseMode::Sensitive)
                .unwrap_or(comparison),
        };

        Name::from_ids(comparison, display, number)
    }

    fn index(&self, mode: CaseMode) -> Option<&HashBuckets> {
        match mode {
            CaseMode::Insensitive => Some(&self.comparison_index),
            CaseMode::Sensitive => self.display_index.as_ref(),
        }
    }

    /// Tables without case preservation keep no case-sensitive index; those
    /// lookups go to the comparison index instead.
    fn effective_mode(&self, mode: CaseMode) -> CaseMode {
        match self.display_index {
            Some(_) => mode,
            None => CaseMode::Insensitive,
        }
    }

    /// Lock-free lookup of the entry spelled `text` under `mode`, taken
    /// verbatim (no number splitting). The empty text is always entry 0.
    pub fn find_entry(&self, text: &str, mode: CaseMode) -> Option<NameEntryId> {
        if text.is_empty() {
            return Some(NameEntryId::NONE);
        }

        let mode = self.effective_mode(mode);
        self.find_entry_hashed(text, mode.hash(text), mode)
    }

    /// Like [`find_entry`](Self::find_entry), creating the entry on a miss.
    pub fn find_or_insert(&self, text: &str, mode: CaseMode) -> NameEntryId {
        if text.is_empty() {
            return NameEntryId::NONE;
        }

        let mode = self.effective_mode(mode);
        self.find_or_insert_hashed(text, mode.hash(text), mode)
    }

    /// `hash` must be `mode.hash(text)`, or at least agree with it on the
    /// bucket bits, or the entry lands in a chain nobody else searches.
    pub(crate) fn find_entry_hashed(
        &self,
        text: &str,
        hash: u32,
        mode: CaseMode,
    ) -> Option<NameEntryId> {
        self.index(mode)?
            .chain(hash, &self.entries)
            .find(|(_, record)| mode.matches(record.text(), text))
            .map(|(id, _)| id)
    }

    pub(crate) fn find_or_insert_hashed(
        &self,
        text: &str,
        hash: u32,
        mode: CaseMode,
    ) -> NameEntryId {
        self.find_or_insert_reporting(text, hash, mode).0
    }

    /// Returns the id and whether this call created it.
    pub(crate) fn find_or_insert_reporting(
        &self,
        text: &str,
        hash: u32,
        mode: CaseMode,
    ) -> (NameEntryId, bool) {
        debug_assert!(!text.is_empty(), "the empty name is always entry 0");

        if let Some(id) = self.find_entry_hashed(text, hash, mode) {
            return (id, false);
        }

        let mut allocator = self.writer.lock();

        // someone may have inserted the same text between our lookup and the lock
        if let Some(id) = self.find_entry_hashed(text, hash, mode) {
            return (id, false);
        }

        let index = self
            .index(mode)
            .unwrap_or_else(|| panic!("{mode} lookups need a case preserving table"));

        let idx = self.entries.reserve(1);
        let id = NameEntryId::from_raw(idx as u32);

        let encoding = Encoding::of(text);
        let record = EntryRecord::new(allocator.alloc_str(text), encoding);

        let slot = self
            .entries
            .get(idx)
            .unwrap_or_else(|| panic!("freshly reserved entry {id} is missing"));
        if slot.record.set(record).is_err() {
            panic!("entry {id} was published twice");
        }

        index.link(hash, id, &self.entries);

        let counter = match encoding {
            Encoding::Narrow => &self.counters.narrow,
            Encoding::Wide => &self.counters.wide,
        };
        counter.fetch_add(1, AtomicOrdering::Relaxed);
        self.counters
            .payload_bytes
            .store(allocator.used_bytes(), AtomicOrdering::Relaxed);
        self.counters
            .slabs
            .store(allocator.slab_count(), AtomicOrdering::Relaxed);
        self.counters
            .slab_bytes
            .store(allocator.reserved_bytes(), AtomicOrdering::Relaxed);

        drop(allocator);

        tracing::trace!(%id, %mode, text, "interned new name entry");

        (id, true)
    }

    pub fn entry(&self, id: NameEntryId) -> Option<NameEntry<'_>> {
        let record = self.entries.get(id.index())?.record.get()?;
        Some(NameEntry::new(id, record.text(), record.encoding()))
    }

    /// All published entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = NameEntry<'_>> + '_ {
        self.entries.iter().enumerate().filter_map(|(idx, slot)| {
            let record = slot.record.get()?;
            let id = NameEntryId::from_raw(idx as u32);
            Some(NameEntry::new(id, record.text(), record.encoding()))
        })
    }

    fn entry_text(&self, id: NameEntryId) -> &str {
        match self.entry(id) {
            Some(entry) => entry.as_str(),
            None => panic!("name entry {id} does not exist in this table"),
        }
    }

    /// Display text without the number, or `None` for ids this table never issued.
    pub fn try_plain_str(&self, name: Name) -> Option<&str> {
        self.entry(name.display_id()).map(|e| e.as_str())
    }

    /// Display text without the number.
    pub fn plain_str(&self, name: Name) -> &str {
        self.entry_text(name.display_id())
    }

    /// Text of the comparison entry, which carries the first casing ever interned.
    pub fn comparison_str(&self, name: Name) -> &str {
        self.entry_text(name.comparison_id())
    }

    pub fn append_text(&self, name: Name, out: &mut String) {
        out.push_str(self.plain_str(name));
        if let Some(n) = name.external_number() {
            out.push('_');
            out.push_str(&n.to_string());
        }
    }

    pub fn to_text(&self, name: Name) -> String {
        let mut out = String::new();
        self.append_text(name, &mut out);
        out
    }

    /// Writes the text of `name`, or a placeholder for ids this table never issued.
    pub fn write_name<W: fmt::Write>(&self, out: &mut W, name: Name) -> fmt::Result {
        match self.try_plain_str(name) {
            Some(plain) => out.write_str(plain)?,
            None => write!(out, "<unresolved name {}>", name.display_id())?,
        }

        match name.external_number() {
            Some(n) => write!(out, "_{n}"),
            None => Ok(()),
        }
    }

    /// Stable ordering: case-insensitive text first, then number.
    pub fn compare(&self, a: Name, b: Name) -> Ordering {
        if a.comparison_id() != b.comparison_id() {
            let by_text = cmp_ignore_case(self.comparison_str(a), self.comparison_str(b));
            if by_text != Ordering::Equal {
                return by_text;
            }
        }

        a.number().cmp(&b.number())
    }

    pub fn stats(&self) -> NameTableStats {
        NameTableStats {
            entries: self.entries.len(),
            narrow_entries: self.counters.narrow.load(AtomicOrdering::Relaxed),
            wide_entries: self.counters.wide.load(AtomicOrdering::Relaxed),
            payload_bytes: self.counters.payload_bytes.load(AtomicOrdering::Relaxed),
            slabs: self.counters.slabs.load(AtomicOrdering::Relaxed),
            slab_bytes: self.counters.slab_bytes.load(AtomicOrdering::Relaxed),
            allocated_chunks: self.entries.allocated_chunks(),
        }
    }

    /// Walks every chain of one index. `None` if the table keeps no such index.
    pub fn bucket_report(&self, mode: CaseMode) -> Option<BucketReport> {
        let index = self.index(mode)?;

        let mut report = BucketReport {
            mode,
            bucket_count: index.len(),
            used_buckets: 0,
            longest_chain: 0,
            entries: 0,
        };

        for bucket in 0..index.len() {
            let chain = index.chain_at(bucket, &self.entries).count();
            if chain > 0 {
                report.used_buckets += 1;
                report.entries += chain;
                report.longest_chain = report.longest_chain.max(chain);
            }
        }

        tracing::debug!(
            %mode,
            used = report.used_buckets,
            entries = report.entries,
            longest = report.longest_chain,
            "name hash distribution"
        );

        Some(report)
    }

    /// Ids of every entry in one chain of the comparison index.
    pub(crate) fn comparison_chain(&self, bucket: usize) -> impl Iterator<Item = NameEntryId> + '_ {
        self.comparison_index
            .chain_at(bucket, &self.entries)
            .map(|(id, _)| id)
    }

    pub(crate) fn comparison_bucket_count(&self) -> usize {
        self.comparison_index.len()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        NameTable::from_validated(NameTableConfig::default(), &ename::bootstrap_names())
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
