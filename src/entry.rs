//! Entry records and the text rules shared by lookups and hashing.

use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::name::NameEntryId;

/// Storage width of an entry's code units.
///
/// `Narrow` text is pure ASCII and serializes one byte per character; anything
/// else is `Wide` and serializes as UTF-16.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
pub enum Encoding {
    Narrow,
    Wide,
}

impl Encoding {
    pub fn of(text: &str) -> Encoding {
        if text.is_ascii() {
            Encoding::Narrow
        } else {
            Encoding::Wide
        }
    }
}

/// Which equality rule a lookup uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter)]
pub enum CaseMode {
    /// Comparison entries: spellings differing only in case are the same name.
    Insensitive,
    /// Display entries: exact casing.
    Sensitive,
}

impl CaseMode {
    pub fn matches(self, stored: &str, probe: &str) -> bool {
        match self {
            CaseMode::Sensitive => stored == probe,
            CaseMode::Insensitive => eq_ignore_case(stored, probe),
        }
    }

    pub fn hash(self, text: &str) -> u32 {
        match self {
            CaseMode::Sensitive => case_sensitive_hash(text),
            CaseMode::Insensitive => case_insensitive_hash(text),
        }
    }
}

/// Simple one-to-one case folding; characters whose lowercase form expands to
/// several characters fold to themselves.
pub fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }

    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.chars().map(fold_char).eq(b.chars().map(fold_char))
    }
}

pub fn cmp_ignore_case(a: &str, b: &str) -> std::cmp::Ordering {
    a.chars().map(fold_char).cmp(b.chars().map(fold_char))
}

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

// FNV-1a keeps hashes identical across platforms and runs, which serialized
// name maps rely on.
fn fnv1a(mut hash: u32, bytes: &[u8]) -> u32 {
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn case_sensitive_hash(text: &str) -> u32 {
    fnv1a(FNV_OFFSET, text.as_bytes())
}

pub fn case_insensitive_hash(text: &str) -> u32 {
    let mut hash = FNV_OFFSET;
    let mut buf = [0u8; 4];
    for c in text.chars() {
        hash = fnv1a(hash, fold_char(c).encode_utf8(&mut buf).as_bytes());
    }
    hash
}

/// The immutable part of a published entry.
#[derive(Clone, Copy)]
pub(crate) struct EntryRecord {
    // points into the owning table's allocator, never handed out past it
    text: &'static str,
    encoding: Encoding,
}

impl EntryRecord {
    pub fn new(text: &'static str, encoding: Encoding) -> EntryRecord {
        EntryRecord { text, encoding }
    }

    pub fn text(&self) -> &str {
        self.text
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

/// Character data of an entry, tagged with its storage width.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NamePayload<'t> {
    Narrow(&'t str),
    Wide(&'t str),
}

impl<'t> NamePayload<'t> {
    pub fn as_str(&self) -> &'t str {
        match self {
            NamePayload::Narrow(s) | NamePayload::Wide(s) => s,
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            NamePayload::Narrow(_) => Encoding::Narrow,
            NamePayload::Wide(_) => Encoding::Wide,
        }
    }

    /// Length in serialized code units (bytes for narrow, UTF-16 units for wide).
    pub fn code_units(&self) -> usize {
        match self {
            NamePayload::Narrow(s) => s.len(),
            NamePayload::Wide(s) => s.encode_utf16().count(),
        }
    }
}

/// A borrowed view of one interned entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NameEntry<'t> {
    pub id: NameEntryId,
    pub payload: NamePayload<'t>,
}

impl<'t> NameEntry<'t> {
    pub(crate) fn new(id: NameEntryId, text: &'t str, encoding: Encoding) -> NameEntry<'t> {
        let payload = match encoding {
            Encoding::Narrow => NamePayload::Narrow(text),
            Encoding::Wide => NamePayload::Wide(text),
        };

        NameEntry { id, payload }
    }

    pub fn as_str(&self) -> &'t str {
        self.payload.as_str()
    }

    pub fn case_insensitive_hash(&self) -> u32 {
        case_insensitive_hash(self.as_str())
    }

    pub fn case_sensitive_hash(&self) -> u32 {
        case_sensitive_hash(self.as_str())
    }
}
