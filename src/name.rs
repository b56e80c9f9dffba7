use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

use crate::ename::EName;
use crate::global::names;

/// Internal number meaning "no numeric suffix".
pub const NAME_NO_NUMBER: u32 = 0;

/// Converts a suffix as written in text (`Foo_3` -> 3) to the stored number.
pub const fn name_external_to_internal(external: u32) -> u32 {
    external.wrapping_add(1)
}

pub const fn name_internal_to_external(internal: u32) -> Option<u32> {
    match internal {
        NAME_NO_NUMBER => None,
        n => Some(n - 1),
    }
}

/// Index of an entry in the name table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameEntryId(u32);

impl NameEntryId {
    /// The entry of the empty / "None" name.
    pub const NONE: NameEntryId = NameEntryId(0);

    pub const fn from_raw(raw: u32) -> NameEntryId {
        NameEntryId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NameEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A cheap, copyable handle to an interned name plus an instance number.
///
/// Equality and hashing only look at the comparison entry and the number, so
/// `Foo` and `foo` are the same name. The display entry only decides which
/// casing comes back out when converting to text.
///
/// Handles are plain ids: the convenience constructors and `Display` go through
/// the process-wide table from [`names()`]; handles made by a private
/// [`NameTable`](crate::NameTable) must be resolved through that table.
#[derive(Copy, Clone, Default)]
pub struct Name {
    comparison: NameEntryId,
    display: NameEntryId,
    number: u32,
}

static_assertions::assert_eq_size!(Name, [u32; 3]);

impl Name {
    pub const NONE: Name = Name::from_ids(NameEntryId::NONE, NameEntryId::NONE, NAME_NO_NUMBER);

    pub(crate) const fn from_ids(comparison: NameEntryId, display: NameEntryId, number: u32) -> Name {
        Name {
            comparison,
            display,
            number,
        }
    }

    /// Interns `text` in the process-wide table, splitting a `_N` suffix.
    pub fn new(text: &str) -> Name {
        names().name(text)
    }

    /// Interns `text` verbatim with an internal `number`.
    pub fn with_explicit_number(text: &str, number: u32) -> Name {
        names().name_with_number(text, number)
    }

    /// Looks `text` up in the process-wide table without creating it.
    pub fn find(text: &str) -> Name {
        names().find(text)
    }

    pub const fn comparison_id(&self) -> NameEntryId {
        self.comparison
    }

    pub const fn display_id(&self) -> NameEntryId {
        self.display
    }

    /// The internal number, `NAME_NO_NUMBER` when there is no suffix.
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// The suffix as it appears in text.
    pub const fn external_number(&self) -> Option<u32> {
        name_internal_to_external(self.number)
    }

    /// The same name with another internal number.
    pub const fn with_number(self, number: u32) -> Name {
        Name { number, ..self }
    }

    pub const fn is_none(&self) -> bool {
        self.comparison.is_none() && self.number == NAME_NO_NUMBER
    }

    /// `comparison + number`, usable as a cheap bucket key.
    pub const fn type_hash(&self) -> u32 {
        self.comparison.raw().wrapping_add(self.number)
    }

    /// Orders by ids. Fast, but depends on interning order.
    pub fn fast_cmp(&self, other: &Name) -> Ordering {
        self.comparison
            .cmp(&other.comparison)
            .then(self.number.cmp(&other.number))
    }

    /// Orders by case-insensitive text, then number, via the process-wide table.
    pub fn lexical_cmp(&self, other: &Name) -> Ordering {
        names().compare(*self, *other)
    }

    /// Display text without the number, from the process-wide table.
    pub fn plain_str(&self) -> &'static str {
        names().plain_str(*self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.comparison == other.comparison && self.number == other.number
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.comparison.hash(state);
        self.number.hash(state);
    }
}

impl PartialEq<EName> for Name {
    fn eq(&self, other: &EName) -> bool {
        *self == Name::from(*other)
    }
}

impl From<EName> for Name {
    fn from(e: EName) -> Self {
        let id = e.entry_id();
        Name::from_ids(id, id, NAME_NO_NUMBER)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        names().write_name(f, *self)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Name");
        s.field("comparison", &self.comparison.raw());
        if self.display != self.comparison {
            s.field("display", &self.display.raw());
        }
        s.field("number", &self.number).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn id(raw: u32) -> NameEntryId {
        NameEntryId::from_raw(raw)
    }

    #[test]
    fn number_offset() {
        assert_eq!(name_external_to_internal(0), 1);
        assert_eq!(name_external_to_internal(17), 18);
        assert_eq!(name_internal_to_external(18), Some(17));
        assert_eq!(name_internal_to_external(NAME_NO_NUMBER), None);
    }

    #[test]
    fn display_id_does_not_take_part_in_equality() {
        let a = Name::from_ids(id(7), id(7), 0);
        let b = Name::from_ids(id(7), id(9), 0);
        assert_eq!(a, b);

        let mut set = FxHashSet::default();
        set.insert(a);
        assert!(set.contains(&b));

        assert_ne!(a, a.with_number(1));
        assert_eq!(a.with_number(3).external_number(), Some(2));
    }

    #[test]
    fn none_handle() {
        assert!(Name::NONE.is_none());
        assert!(Name::default().is_none());
        assert!(!Name::NONE.with_number(1).is_none());
        assert_eq!(Name::from(EName::None), Name::NONE);
        assert!(Name::NONE == EName::None);
    }

    #[test]
    fn fast_order_and_type_hash() {
        let a = Name::from_ids(id(3), id(3), 5);
        let b = Name::from_ids(id(4), id(4), 0);
        assert_eq!(a.fast_cmp(&b), Ordering::Less);
        assert_eq!(a.fast_cmp(&a.with_number(6)), Ordering::Less);
        assert_eq!(a.type_hash(), 8);
    }

    #[test]
    fn debug_shows_ids() {
        let n = Name::from_ids(id(3), id(5), 2);
        assert_eq!(format!("{n:?}"), "Name { comparison: 3, display: 5, number: 2 }");
        let n = Name::from_ids(id(3), id(3), 0);
        assert_eq!(format!("{n:?}"), "Name { comparison: 3, number: 0 }");
    }
}
